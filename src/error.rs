//! Errors surfaced across the crate's public API.
//!
//! Per the crate's error model, construction failures other than a malformed
//! dynamic pattern degrade to an *empty* object instead of an `Err`; reads
//! and scans degrade to "absent" (`None`/empty `Vec`) rather than erroring.
//! [`PatternError`] is therefore the only error type most callers will ever
//! see.

/// A dynamic pattern's text failed to parse.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PatternError {
    /// The pattern text contained no tokens at all.
    #[error("pattern text is empty")]
    Empty,
    /// A token was not exactly two characters from `[0-9a-fA-F?]`.
    #[error("invalid token {token:?} at position {index}")]
    InvalidToken { index: usize, token: String },
}
