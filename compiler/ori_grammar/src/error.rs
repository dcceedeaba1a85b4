//! Grammar-definition errors.
//!
//! These are raised synchronously while a grammar is being built and abort
//! that construction step. Nothing is partially applied when one is returned.

use crate::{GroupId, RuleId, SetId, Symbol};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    /// A named rule was defined twice.
    #[error("rule `{name}` is already defined")]
    DuplicateRule { name: String },

    /// `max` is meaningful (non-zero) but smaller than `min`.
    #[error("invalid repetition bounds {{{min},{max}}}: max is smaller than min")]
    InvalidGroupBounds { min: u32, max: u32 },

    #[error("terminal text must not be empty")]
    EmptyTerminal,

    #[error("unknown rule {0:?}")]
    UnknownRule(RuleId),

    #[error("unknown group {0:?}")]
    UnknownGroup(GroupId),

    #[error("unknown set {0:?}")]
    UnknownSet(SetId),

    /// Sets hold terminals, `any` and classes only.
    #[error("{0:?} cannot be a member of a terminal set")]
    InvalidSetMember(Symbol),

    #[error("terminal sets must have at least one member")]
    EmptySet,

    /// An id table ran out of `u32` ids.
    #[error("{table} table is full ({count} entries)")]
    TableOverflow { table: &'static str, count: usize },
}

pub type GrammarResult<T> = Result<T, GrammarError>;
