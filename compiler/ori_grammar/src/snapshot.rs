//! Immutable view of a grammar for the duration of a parse.
//!
//! A parser reads rule, group and set tables on every predict and scan.
//! Copying them out once keeps the hot path lock-free and makes "the grammar
//! is read-only while parsing" hold by construction.

use crate::grammar::{GroupDef, RuleDef};
use crate::nullable;
use crate::{GroupId, RuleId, SetId, SetMember, Symbol, TerminalId};

#[derive(Clone, Debug)]
pub struct GrammarSnapshot {
    rules: Vec<RuleDef>,
    groups: Vec<GroupDef>,
    sets: Vec<Box<[SetMember]>>,
    start: Option<RuleId>,
    penalty: RuleId,
    penalty_empty: RuleId,
}

impl GrammarSnapshot {
    pub(crate) fn new(
        rules: Vec<RuleDef>,
        groups: Vec<GroupDef>,
        sets: Vec<Box<[SetMember]>>,
        start: Option<RuleId>,
        penalty: RuleId,
        penalty_empty: RuleId,
    ) -> Self {
        GrammarSnapshot {
            rules,
            groups,
            sets,
            start,
            penalty,
            penalty_empty,
        }
    }

    /// # Panics
    /// Panics if `rule` did not come from the snapshotted grammar.
    #[inline]
    pub fn rule(&self, rule: RuleId) -> &RuleDef {
        &self.rules[rule.index()]
    }

    /// # Panics
    /// Panics if `group` did not come from the snapshotted grammar.
    #[inline]
    pub fn group(&self, group: GroupId) -> &GroupDef {
        &self.groups[group.index()]
    }

    /// # Panics
    /// Panics if `set` did not come from the snapshotted grammar.
    #[inline]
    pub fn set(&self, set: SetId) -> &[SetMember] {
        &self.sets[set.index()]
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn start(&self) -> Option<RuleId> {
        self.start
    }

    pub fn penalty_rule(&self) -> RuleId {
        self.penalty
    }

    pub fn penalty_empty_rule(&self) -> RuleId {
        self.penalty_empty
    }

    /// Whether a set accepts a token.
    pub fn set_matches(&self, set: SetId, id: TerminalId, ch: Option<char>) -> bool {
        self.set(set).iter().any(|member| member.matches(id, ch))
    }

    pub fn is_production_nullable(&self, symbols: &[Symbol]) -> bool {
        self.production_null_penalty(symbols).is_some()
    }

    /// Cheapest empty derivation of a symbol sequence.
    pub fn production_null_penalty(&self, symbols: &[Symbol]) -> Option<u32> {
        nullable::production_penalty(symbols, &self.rules, &self.groups)
    }

    /// Cheapest empty derivation of a symbol, `None` if it cannot be empty.
    pub fn null_penalty(&self, symbol: Symbol) -> Option<u32> {
        nullable::symbol_penalty(symbol, &self.rules, &self.groups)
    }
}
