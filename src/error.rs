use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DemuxError {
    #[error("codec error: {0}")]
    Codec(String),

    #[error("parser error: {0}")]
    Parser(String),

    #[error("TS packet did not start with 0x47")]
    SyncByte,

    #[error("AAC PES did not start with ADTS header,offset:{0}")]
    AdtsMisaligned(usize),

    #[error("no ADTS header found in AAC PES")]
    AdtsMissing,

    #[error("invalid ADTS sampling index:{0}")]
    InvalidSamplingIndex(u8),

    #[error("truncated PES on PID {pid}: {received} bytes buffered")]
    TruncatedPes { pid: u16, received: usize },

    #[error("sample decryption failed: {0}")]
    Decrypt(String),
}

pub type Result<T> = std::result::Result<T, DemuxError>;

/// Category of a reported parse problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The fragment being demuxed contains malformed or unexpected data.
    FragParsing,
    /// The external sample decrypter failed.
    FragDecrypt,
}

/// A parse problem surfaced to the caller.
///
/// Fatal events abort only the current sample or frame; the demuxer stays
/// usable for the next chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    pub kind: ErrorKind,
    pub fatal: bool,
    pub error: DemuxError,
}

impl ErrorEvent {
    pub fn parsing(error: DemuxError, fatal: bool) -> Self {
        Self {
            kind: ErrorKind::FragParsing,
            fatal,
            error,
        }
    }

    pub fn decrypt(error: DemuxError) -> Self {
        Self {
            kind: ErrorKind::FragDecrypt,
            fatal: true,
            error,
        }
    }

    /// Human readable reason, as shown to users.
    pub fn reason(&self) -> String {
        self.error.to_string()
    }
}

/// Receives parse errors emitted while demuxing.
pub trait ErrorSink: Send {
    fn report(&mut self, event: ErrorEvent);
}

/// Default sink: forwards every event to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn report(&mut self, event: ErrorEvent) {
        if event.fatal {
            log::error!("{:?} (fatal): {}", event.kind, event.reason());
        } else {
            log::warn!("{:?}: {}", event.kind, event.reason());
        }
    }
}

impl ErrorSink for tokio::sync::mpsc::UnboundedSender<ErrorEvent> {
    fn report(&mut self, event: ErrorEvent) {
        if let Err(e) = self.send(event) {
            log::debug!("error sink closed, dropping event: {}", e.0.reason());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_matches_display() {
        let event = ErrorEvent::parsing(DemuxError::AdtsMisaligned(12), false);
        assert_eq!(event.kind, ErrorKind::FragParsing);
        assert_eq!(event.reason(), "AAC PES did not start with ADTS header,offset:12");
    }

    #[test]
    fn test_channel_sink() {
        let (mut tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.report(ErrorEvent::parsing(DemuxError::SyncByte, false));
        let event = rx.try_recv().unwrap();
        assert!(!event.fatal);
        assert_eq!(event.error, DemuxError::SyncByte);
    }
}
