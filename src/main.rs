//! RAX Chat - Entry Point
//!
//! Terminal front-end for the chat server and client. All output goes
//! through the event channel and is printed by a single task.

use clap::Parser;
use log::{debug, info};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

use rax_chat::error::handlers::handle_error;
use rax_chat::error::ChatError;
use rax_chat::utils::logging::setup_logging;
use rax_chat::{ChatClient, ChatConfig, ChatEvent, Notifier, Server};

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = match ChatConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            handle_error(&e.into());
            std::process::exit(1);
        }
    };

    let (notifier, events) = Notifier::channel();
    let printer = tokio::spawn(print_events(events));

    let result = match cli.command {
        Commands::Server { port } => {
            let port = port.unwrap_or(config.server.port);
            run_server(config, port, notifier).await
        }
        Commands::Client { server, name } => {
            run_client(config, &server, &name.unwrap_or_default(), notifier).await
        }
    };

    // Let the printer drain whatever is still queued
    let _ = tokio::time::timeout(Duration::from_millis(200), printer).await;

    if let Err(e) = result {
        handle_error(&e);
        std::process::exit(1);
    }
}

async fn run_server(config: ChatConfig, port: u16, notifier: Notifier) -> Result<(), ChatError> {
    info!("Launching chat server...");
    let server = Server::new(config.server, notifier);
    server.start(port).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/start" => {
                if let Err(e) = server.start(port).await {
                    handle_error(&e.into());
                }
            }
            "/stop" => {
                server.stop().await;
            }
            "/quit" => break,
            text => server.send_broadcast(text).await,
        }
    }

    if server.is_running().await {
        server.stop().await;
    }
    Ok(())
}

async fn run_client(
    config: ChatConfig,
    server_address: &str,
    name: &str,
    notifier: Notifier,
) -> Result<(), ChatError> {
    let client = ChatClient::new(config.client, notifier);
    let mut session = client.connect(server_address, name);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            outcome = &mut session => {
                return match outcome {
                    Ok(err) => Err(err.into()),
                    Err(join_err) => Err(io::Error::other(join_err).into()),
                };
            }
            line = lines.next_line() => match line? {
                // failures are already reported through the event channel
                Some(text) => { let _ = client.send(&text).await; }
                None => break,
            },
        }
    }

    session.abort();
    Ok(())
}

async fn print_events(mut events: UnboundedReceiver<ChatEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            ChatEvent::LogLine(line) => println!("{}", line),
            ChatEvent::State(state) => debug!("Session state: {}", state),
        }
    }
}
