//! Network utilities
//!
//! Provides address validation and reachability probing for the client.

use log::debug;
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::SessionError;

/// Parses four dot-separated decimal octets, each 1-3 digits and at most 255.
pub fn parse_ipv4(addr: &str) -> Result<Ipv4Addr, SessionError> {
    let invalid = || SessionError::Validation(addr.to_string());

    let mut octets = [0u8; 4];
    let mut parts = addr.split('.');
    for octet in octets.iter_mut() {
        let part = parts.next().ok_or_else(invalid)?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        *octet = part.parse::<u8>().map_err(|_| invalid())?;
    }

    if parts.next().is_some() {
        return Err(invalid());
    }

    Ok(Ipv4Addr::from(octets))
}

/// Checks that `ip` answers at all within `limit`.
///
/// Loopback is always reachable. Otherwise a TCP connect to `probe_port` is
/// attempted: an accepted or refused connection both prove the host is up.
pub async fn check_reachable(
    ip: Ipv4Addr,
    probe_port: u16,
    limit: Duration,
) -> Result<(), SessionError> {
    if ip.is_loopback() {
        return Ok(());
    }

    if answers(SocketAddr::from((ip, probe_port)), limit).await {
        Ok(())
    } else {
        Err(SessionError::Reachability(ip))
    }
}

async fn answers(target: SocketAddr, limit: Duration) -> bool {
    match timeout(limit, TcpStream::connect(target)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => true,
        Ok(Err(e)) => {
            debug!("Reachability probe to {} failed: {}", target, e);
            false
        }
        Err(_) => {
            debug!("Reachability probe to {} timed out", target);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::{TcpListener, TcpSocket};

    #[test]
    fn test_valid_addresses() {
        assert!(parse_ipv4("127.0.0.1").is_ok());
        assert!(parse_ipv4("10.0.0.1").is_ok());
        assert!(parse_ipv4("255.255.255.255").is_ok());
        assert_eq!(parse_ipv4("010.0.0.1").unwrap(), Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn test_invalid_addresses() {
        for addr in [
            "256.1.1.1",
            "1.2.3",
            "abc.def.gh.i",
            "",
            "1.2.3.4.5",
            "1..2.3",
            "+1.2.3.4",
            "1.2.3.4 ",
            "1000.1.1.1",
            "localhost",
        ] {
            assert!(parse_ipv4(addr).is_err(), "{} should be rejected", addr);
        }
    }

    #[test]
    fn test_validation_error_carries_input() {
        match parse_ipv4("1.2.3") {
            Err(SessionError::Validation(addr)) => assert_eq!(addr, "1.2.3"),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_loopback_is_always_reachable() {
        // nothing listens on the probe port, loopback is still reachable
        let limit = Duration::from_millis(1);
        assert!(check_reachable(Ipv4Addr::new(127, 0, 0, 1), 1, limit).await.is_ok());
        assert!(check_reachable(Ipv4Addr::new(127, 1, 2, 3), 1, limit).await.is_ok());
    }

    #[tokio::test]
    async fn test_accepted_and_refused_both_count_as_up() {
        let limit = Duration::from_secs(2);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open = listener.local_addr().unwrap();
        assert!(answers(open, limit).await);

        drop(listener);
        assert!(answers(open, limit).await);
    }

    #[tokio::test]
    async fn test_unanswered_connect_times_out() {
        // a full accept queue makes the kernel drop further SYNs
        let socket = TcpSocket::new_v4().unwrap();
        socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let listener = socket.listen(0).unwrap();
        let target = listener.local_addr().unwrap();
        let mut queued = Vec::new();
        for _ in 0..4 {
            if let Ok(Ok(stream)) =
                timeout(Duration::from_millis(100), TcpStream::connect(target)).await
            {
                queued.push(stream);
            }
        }

        assert!(!answers(target, Duration::from_millis(200)).await);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_reported() {
        // TEST-NET-1 is never assigned, so the check fails one way or another
        let ip = Ipv4Addr::new(192, 0, 2, 1);
        match check_reachable(ip, 7, Duration::from_millis(200)).await {
            Err(SessionError::Reachability(addr)) => assert_eq!(addr, ip),
            other => panic!("expected Reachability, got {:?}", other),
        }
    }
}
