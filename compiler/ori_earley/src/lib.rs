//! Ori Earley - recognizer and forest builder.
//!
//! Parses token streams against an [`ori_grammar::Grammar`]:
//! - [`Parser::run`] builds Earley states from a [`TokenSource`]
//! - [`Parser::best_tree`] returns the cheapest parse tree
//! - [`Parser::forest`] returns every parse tree within a penalty budget
//!
//! Grammars built with fault tolerance (the default) accept any input that
//! can be repaired by skipping or inserting tokens. Each repair costs a
//! penalty, and the trees are ranked by total penalty, so the best tree of a
//! well-formed input has penalty 0.
//!
//! # Debug Environment Variables
//!
//! - `RUST_LOG=ori_earley=debug`: one line per recognition and forest.
//! - `RUST_LOG=ori_earley=trace`: every item as it is added.
//! - `ORI_EARLEY_MAX_PENALTY`, `ORI_EARLEY_MAX_TREES`: read by
//!   [`ParserConfig::from_env`].

mod config;
mod error;
mod forest;
mod item;
mod recognizer;
mod stack;
mod state;
mod token;
mod tree;

pub use config::{ParserConfig, MAX_PENALTY_ENV, MAX_TREES_ENV};
pub use error::{ParseError, ParseResult};
pub use item::{Child, EarleyItem, ItemRef, Link, NullTarget, Operation, Owner};
pub use recognizer::{Parser, Recognition};
pub use state::EarleyState;
pub use token::{FnSource, Token, TokenList, TokenSource};
pub use tree::{Insertion, Leaf, NodeKind, ParseNode, ParseTree, Span};

use std::sync::Once;

/// Environment variable holding the log filter, e.g. `ori_earley=trace`.
/// Falls back to `RUST_LOG`.
pub const LOG_ENV: &str = "ORI_EARLEY_LOG";

static TRACING_INIT: Once = Once::new();

/// Install a formatting subscriber for the recognizer and tree builder logs.
///
/// Safe to call multiple times. Does nothing unless [`LOG_ENV`] or
/// `RUST_LOG` is set, and leaves an already installed global subscriber in
/// place.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = [LOG_ENV, "RUST_LOG"]
            .into_iter()
            .find_map(|var| std::env::var(var).ok())
            .and_then(|directives| EnvFilter::try_new(directives).ok());
        if let Some(filter) = filter {
            let installed = tracing_subscriber::registry()
                .with(fmt::layer().with_target(false).with_level(true))
                .with(filter)
                .try_init()
                .is_ok();
            tracing::debug!(installed, "earley tracing initialized");
        }
    });
}
