//! Ori Grammar - grammar model for the Earley engine.
//!
//! This crate owns everything about a grammar that exists before parsing:
//! - Terminals, rules, productions, repetition groups and terminal sets
//! - Nullability analysis (needed for Aycock/Horspool prediction)
//! - Fault-tolerant rewriting of terminal usages into penalized rules
//! - Immutable snapshots handed to the recognizer
//!
//! # Design Philosophy
//!
//! - **Ids everywhere**: rules, groups, sets and terminals are `u32` handles
//!   that stay valid for the lifetime of the grammar.
//! - **Concurrent construction**: registration takes `&self` and converges on
//!   one id when callers race on the same name or text.
//! - **Recovery in the grammar**: error tolerance is a grammar rewrite, not a
//!   recognizer feature.

mod display;
mod error;
mod grammar;
mod ids;
mod nullable;
mod snapshot;
mod symbol;
mod tolerant;

pub use display::{GrammarDump, SymbolWriter};
pub use error::{GrammarError, GrammarResult};
pub use grammar::{
    Grammar, GrammarOptions, GroupDef, Production, RuleDef, UserData, UserKey,
};
pub use ids::{GroupId, RuleId, SetId, TerminalId};
pub use snapshot::GrammarSnapshot;
pub use symbol::{CharClass, SetMember, Symbol};
