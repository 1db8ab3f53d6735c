//! Content filter and auto-responder applied to chat messages on the server.

use crate::error::ProtocolViolation;

/// Literal (any casing) a client sends to leave gracefully.
pub const EXIT_COMMAND: &str = "exit";

pub fn is_exit(message: &str) -> bool {
    message.eq_ignore_ascii_case(EXIT_COMMAND)
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

/// Accepts non-empty messages made only of ASCII letters, digits and whitespace.
pub fn check_content(message: &str) -> Result<(), ProtocolViolation> {
    if !message.is_empty() && message.chars().all(is_allowed_char) {
        Ok(())
    } else {
        Err(ProtocolViolation(message.to_string()))
    }
}

/// Keyword reply for `message`, first match wins.
pub fn auto_response(message: &str, name: &str) -> Option<String> {
    let lowered = message.to_lowercase();

    if lowered.contains("hi") || lowered.contains("hello") {
        Some(format!("Hello {}!", name))
    } else if lowered.contains("how are you") {
        Some("I'm a server, always running!".to_string())
    } else if lowered.contains("thanks") || lowered.contains("thank you") {
        Some("You're welcome.".to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_plain_text() {
        assert!(check_content("hello world 123").is_ok());
        assert!(check_content("tabs\tand\nlines").is_ok());
    }

    #[test]
    fn test_filter_rejects_symbols_and_non_ascii() {
        assert_eq!(check_content("hi!"), Err(ProtocolViolation("hi!".into())));
        assert!(check_content("café").is_err());
        assert!(check_content("a,b").is_err());
        assert!(check_content("").is_err());
    }

    #[test]
    fn test_exit_is_case_insensitive() {
        assert!(is_exit("exit"));
        assert!(is_exit("EXIT"));
        assert!(is_exit("ExIt"));
        assert!(!is_exit("exit now"));
    }

    #[test]
    fn test_auto_response_priority() {
        assert_eq!(
            auto_response("Hi there", "ana").as_deref(),
            Some("Hello ana!")
        );
        assert_eq!(
            auto_response("how are you today", "ana").as_deref(),
            Some("I'm a server, always running!")
        );
        assert_eq!(
            auto_response("THANK YOU", "ana").as_deref(),
            Some("You're welcome.")
        );
        // greeting outranks gratitude
        assert_eq!(
            auto_response("hello and thanks", "ana").as_deref(),
            Some("Hello ana!")
        );
        assert_eq!(auto_response("no keyword here", "ana"), None);
    }
}
