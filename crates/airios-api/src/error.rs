use thiserror::Error;

/// Top-level error type for the `airios-api` crate.
///
/// Covers connection-level failures only: the link to the bridge dropped,
/// a request timed out, or a response could not be decoded. A property a
/// device does not support, or a value that does not decode, is never an
/// error -- it is an absent value inside a
/// [`PropertyResult`](crate::model::PropertyResult).
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Serial line or socket I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport reported a failure that is not a plain I/O error
    /// (e.g. serial port configuration, Modbus exception response).
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// A request did not complete within the connection's timeout.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The connection has been closed; no further requests are possible.
    #[error("Connection closed")]
    Closed,

    // ── Protocol ────────────────────────────────────────────────────
    /// The bridge answered with a frame that could not be decoded.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// The addressed node does not implement the operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying on the
    /// next poll cycle.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Transport { .. } | Self::Timeout { .. } | Self::Protocol { .. }
        )
    }

    /// Returns `true` if the connection can no longer be used.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
