use thiserror::Error;

/// Shared error taxonomy for addressing, codec, and wire handling.
///
/// `Reject` and `NotAvailable` status codes are ordinary control flow and are
/// deliberately *not* represented here. Every variant below is scoped: the
/// widest blast radius of any error is the current connection, never the
/// process.
#[derive(Debug, Error)]
pub enum Error {
    /// An unrecognized status or tag byte was seen. Fatal to the current
    /// connection only.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// A malformed payload (bad RLE stream, length mismatch). Fatal to the
    /// current payload only.
    #[error("format error: {0}")]
    Format(String),

    /// A short read terminated by end-of-stream, a reset connection, or a
    /// timeout. Fatal to the current request; the caller's outer loop decides
    /// whether to retry on its next cycle.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Invalid configuration or chunk address (e.g. a zero subdivision
    /// level).
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_to_transport() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: Error = io.into();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn error_messages_name_their_category() {
        let err = Error::Format("run length mismatch".to_string());
        assert_eq!(err.to_string(), "format error: run length mismatch");
    }
}
