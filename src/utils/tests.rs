use super::error::MessagingError;
use super::logging;
use tracing::Level;

#[test]
fn logging_init_accepts_levels() {
    // Should not panic
    logging::init("info");
    logging::init("debug");
    logging::init("warn");
}

#[test]
fn test_parse_level() {
    assert_eq!(logging::parse_level("ERROR"), Level::ERROR);
    assert_eq!(logging::parse_level("warning"), Level::WARN);
    assert_eq!(logging::parse_level("debug"), Level::DEBUG);
    assert_eq!(logging::parse_level("trace"), Level::TRACE);
    assert_eq!(logging::parse_level("verbose"), Level::INFO);
}

#[test]
fn test_only_connect_failures_are_retryable() {
    let connect = MessagingError::connect_failed("localhost:61613", "connection refused");
    assert!(connect.is_retryable());
    assert_eq!(
        connect.to_string(),
        "could not connect to broker at localhost:61613: connection refused"
    );

    let protocol = MessagingError::Protocol("bad frame".to_string());
    assert!(!protocol.is_retryable());

    let exhausted = MessagingError::RetriesExhausted {
        attempts: 3,
        last: Box::new(connect),
    };
    assert!(!exhausted.is_retryable());
    assert!(exhausted.to_string().contains("connection refused"));
}
