use thiserror::Error;

/// Failures talking to the recognition service. A face that is simply not
/// recognized is NOT an error; it comes back as an empty match list.
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// Transport-level failure: unreachable host, timeout, bad TLS.
    #[error("recognition service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("recognition service returned {status}: {body}")]
    Service { status: u16, body: String },
}
