//! Crate-wide error taxonomy, matching the RESP-visible error contract.

use thiserror::Error;

/// Errors produced anywhere in the data plane.
///
/// The `Display` text of the per-request variants is exactly the RESP error
/// body a client should see (sans the leading `-` and trailing CRLF, which
/// the codec adds).
#[derive(Debug, Error)]
pub enum PicoError {
    #[error("Protocol error")]
    Protocol,

    #[error("ERR unknown command")]
    UnknownCommand,

    #[error("ERR wrong number of arguments for '{name}' command")]
    WrongArity { name: String },

    #[error("WRONGTYPE operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR value is not an integer or out of range")]
    NotInteger,

    #[error("ERR MULTI calls can't be nested")]
    MultiNested,

    #[error("ERR EXEC without MULTI")]
    ExecWithoutMulti,

    #[error("ERR DISCARD without MULTI")]
    DiscardWithoutMulti,

    #[error("ERR invalid DB index")]
    InvalidDbIndex,

    #[error("persistence engine failure: {0}")]
    Persistence(#[from] sled::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PicoResult<T> = Result<T, PicoError>;

impl PicoError {
    /// Whether this error should tear down the process (persistence open or
    /// sync-write failure) rather than just being surfaced to the client.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PicoError::Persistence(_))
    }
}
