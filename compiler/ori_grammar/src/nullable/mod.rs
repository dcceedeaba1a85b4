//! Nullability analysis.
//!
//! Earley recognition with Aycock/Horspool prediction advances over nullable
//! symbols eagerly, so every rule and group must know whether it can derive
//! the empty string before parsing starts.
//!
//! The analysis is a least fixed point: every rule starts out "not nullable"
//! and is promoted only when one of its productions is nullable under the
//! current assignment. Alongside the flag it computes the cheapest penalty
//! of an empty derivation, which the forest builder uses to rank
//! error-recovered parses.
//!
//! Conventions:
//! - a rule with no productions is nullable (at its own penalty)
//! - a group is nullable when `min == 0` or its sub-production is nullable

use crate::grammar::{GroupDef, RuleDef};
use crate::Symbol;
use tracing::debug;

/// Cheapest empty derivation of one symbol, `None` when it cannot be empty.
pub(crate) fn symbol_penalty(
    symbol: Symbol,
    rules: &[RuleDef],
    groups: &[GroupDef],
) -> Option<u32> {
    match symbol {
        Symbol::Empty => Some(0),
        Symbol::Rule(rule) => rules.get(rule.index()).and_then(|def| def.null_penalty),
        Symbol::Group(group) => groups.get(group.index()).and_then(|def| def.null_penalty),
        Symbol::Terminal(_) | Symbol::Any | Symbol::Class(_) | Symbol::Set(_) => None,
    }
}

/// Cheapest empty derivation of a whole production: every item must be
/// nullable.
pub(crate) fn production_penalty(
    symbols: &[Symbol],
    rules: &[RuleDef],
    groups: &[GroupDef],
) -> Option<u32> {
    symbols.iter().try_fold(0u32, |acc, &symbol| {
        symbol_penalty(symbol, rules, groups).map(|cost| acc.saturating_add(cost))
    })
}

fn rule_penalty(def: &RuleDef, rules: &[RuleDef], groups: &[GroupDef]) -> Option<u32> {
    if def.productions.is_empty() {
        return Some(def.penalty);
    }
    def.productions
        .iter()
        .filter_map(|production| production_penalty(production, rules, groups))
        .min()
        .map(|cost| cost.saturating_add(def.penalty))
}

fn group_penalty(def: &GroupDef, rules: &[RuleDef], groups: &[GroupDef]) -> Option<u32> {
    if def.min == 0 {
        return Some(0);
    }
    production_penalty(&def.production, rules, groups).map(|cost| cost.saturating_mul(def.min))
}

/// `new` is a strictly cheaper empty derivation than `old`.
fn improves(new: Option<u32>, old: Option<u32>) -> bool {
    match (new, old) {
        (Some(new), Some(old)) => new < old,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Recompute nullability for every rule and group.
///
/// Returns the number of rule and group flags that differ from the previous
/// assignment.
pub(crate) fn analyze(rules: &mut [RuleDef], groups: &mut [GroupDef]) -> usize {
    let before: Vec<bool> = rules
        .iter()
        .map(|def| def.nullable)
        .chain(groups.iter().map(|def| def.nullable))
        .collect();

    for def in rules.iter_mut() {
        def.null_penalty = None;
    }
    for def in groups.iter_mut() {
        def.null_penalty = None;
    }

    // Costs only ever decrease and are bounded below, so this terminates.
    let mut passes = 0usize;
    loop {
        passes += 1;
        let mut changed = false;

        for index in 0..rules.len() {
            let cost = rule_penalty(&rules[index], rules, groups);
            if improves(cost, rules[index].null_penalty) {
                rules[index].null_penalty = cost;
                changed = true;
            }
        }

        for index in 0..groups.len() {
            let cost = group_penalty(&groups[index], rules, groups);
            if improves(cost, groups[index].null_penalty) {
                groups[index].null_penalty = cost;
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    for def in rules.iter_mut() {
        def.nullable = def.null_penalty.is_some();
    }
    for index in 0..groups.len() {
        let instance = production_penalty(&groups[index].production, rules, groups);
        let def = &mut groups[index];
        def.production_nullable = instance.is_some();
        def.nullable = def.null_penalty.is_some();
    }

    let changed = rules
        .iter()
        .map(|def| def.nullable)
        .chain(groups.iter().map(|def| def.nullable))
        .zip(before.iter().copied())
        .filter(|(now, was)| now != was)
        .count();

    debug!(
        rules = rules.len(),
        groups = groups.len(),
        passes,
        changed,
        "nullability analysis"
    );
    changed
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
