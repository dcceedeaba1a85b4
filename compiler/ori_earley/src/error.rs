//! Parser errors.
//!
//! A failed recognition is not an error: it is reported through
//! [`Recognition`](crate::Recognition). Errors cover misuse only.

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("grammar has no start rule")]
    NoStartRule,

    #[error("parser already consumed its input; call `reset` first")]
    AlreadyRun,

    #[error("state {state} does not exist (parser has {count} states)")]
    NoSuchState { state: usize, count: usize },
}

pub type ParseResult<T> = Result<T, ParseError>;
