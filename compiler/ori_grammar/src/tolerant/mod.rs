//! Fault-tolerant rewriting.
//!
//! Every terminal usage in an authored production is replaced by a
//! synthesized rule with three alternatives:
//!
//! ```text
//! %'x' ::= 'x'                  // exact match, no penalty
//!        | %penalty 'x'         // skip tokens first, 1 per token
//!        | %penalty-empty       // pretend 'x' was there, 1
//! ```
//!
//! Error recovery therefore lives in the grammar: the recognizer can always
//! make progress and the forest builder ranks the results by penalty.
//! Wrappers are created on first use and cached by the usage symbol, so all
//! productions mentioning `'x'` share one wrapper.

use crate::grammar::{Production, RuleDef};
use crate::{Grammar, GrammarResult, RuleId, Symbol};
use tracing::trace;

/// Rewrite a production, substituting wrappers for terminal usages.
pub(crate) fn rewrite(grammar: &Grammar, symbols: &[Symbol]) -> GrammarResult<Production> {
    symbols
        .iter()
        .map(|&symbol| {
            if symbol.is_terminal_like() {
                tolerant_rule(grammar, symbol).map(Symbol::Rule)
            } else {
                Ok(symbol)
            }
        })
        .collect()
}

/// The wrapper rule for one terminal usage.
pub(crate) fn tolerant_rule(grammar: &Grammar, usage: Symbol) -> GrammarResult<RuleId> {
    debug_assert!(usage.is_terminal_like());

    if let Some(rule) = grammar.tolerant.get(&usage) {
        return Ok(*rule);
    }

    let rule = grammar.tolerant.entry(usage).or_try_insert_with(|| {
        let productions = vec![
            Production::from([usage]),
            Production::from([Symbol::Rule(grammar.penalty_rule()), usage]),
            Production::from([Symbol::Rule(grammar.penalty_empty_rule())]),
        ];
        let mut def = RuleDef::internal(&wrapper_name(grammar, usage), productions, 0);
        def.tolerant_for = Some(usage);
        let rule = grammar.push_rule(def)?;
        trace!(?usage, ?rule, "synthesized tolerant rule");
        Ok(rule)
    })?;
    Ok(*rule)
}

fn wrapper_name(grammar: &Grammar, usage: Symbol) -> String {
    match usage {
        Symbol::Terminal(id) => match grammar.terminal_text(id) {
            Some(text) => format!("%'{text}'"),
            None => format!("%{id:?}"),
        },
        Symbol::Any => "%any".to_string(),
        Symbol::Class(class) => format!("%{class}"),
        Symbol::Set(set) => format!("%set{}", set.raw()),
        Symbol::Empty | Symbol::Rule(_) | Symbol::Group(_) => {
            unreachable!("only terminal usages get tolerant wrappers, got {usage:?}")
        }
    }
}
