use thiserror::Error;

/// Requests that can't be carried out as asked. Storage and I/O failures are reported through
/// `anyhow` instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("rating must be between 1 and 5, given {0}")]
    InvalidRating(u8),

    #[error("card {0} not found")]
    CardNotFound(u64),

    #[error("deck {0} not found")]
    DeckNotFound(u64),

    #[error("deck name can't be empty")]
    EmptyDeckName,

    #[error("front of card can't be empty")]
    EmptyFront,
}
