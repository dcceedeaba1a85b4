//! The grammar model and its construction API.
//!
//! A [`Grammar`] is built up incrementally: terminals are registered by text
//! or codepoint, rules are created by name (or anonymously) and productions
//! are appended to them over time. Every construction method takes `&self`,
//! so several threads may build the same grammar at once.
//!
//! # Concurrency
//!
//! Lookup maps (name → rule, text → terminal, set content → set, tolerant
//! usage → rule) are `DashMap`s and use `entry().or_try_insert_with()`, so two
//! callers racing to register the same key converge on a single id. The
//! id-indexed tables are `parking_lot::RwLock<Vec<_>>`.
//!
//! Lock order: a map shard may be held while a table lock is taken, never the
//! other way around. Table locks are taken rules → groups → sets.

use crate::nullable;
use crate::tolerant;
use crate::{
    CharClass, GrammarError, GrammarResult, GrammarSnapshot, GroupId, RuleId, SetId, SetMember,
    Symbol, TerminalId,
};
use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, trace};

type FxDashMap<K, V> = DashMap<K, V, FxBuildHasher>;

/// Opaque data a grammar author attaches to a terminal or rule.
pub type UserData = Arc<dyn Any + Send + Sync>;

/// A production as stored: the ordered items after rewriting.
pub type Production = Box<[Symbol]>;

/// Grammar construction options.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GrammarOptions {
    /// Rewrite every terminal usage into a penalized, error-tolerant rule.
    pub fault_tolerant: bool,
}

impl Default for GrammarOptions {
    fn default() -> Self {
        GrammarOptions {
            fault_tolerant: true,
        }
    }
}

impl GrammarOptions {
    /// Options for a grammar that matches input exactly.
    pub fn strict() -> Self {
        GrammarOptions {
            fault_tolerant: false,
        }
    }
}

/// Key for user data lookups.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UserKey {
    Terminal(TerminalId),
    Rule(RuleId),
}

/// A non-terminal and everything the analyzers computed about it.
#[derive(Clone, Debug)]
pub struct RuleDef {
    pub(crate) name: Option<Box<str>>,
    pub(crate) productions: Vec<Production>,
    pub(crate) nullable: bool,
    pub(crate) null_penalty: Option<u32>,
    pub(crate) penalty: u32,
    pub(crate) defined: bool,
    pub(crate) internal: bool,
    pub(crate) tolerant_for: Option<Symbol>,
}

impl RuleDef {
    fn new(name: Option<Box<str>>) -> Self {
        RuleDef {
            name,
            productions: Vec::new(),
            nullable: true,
            null_penalty: Some(0),
            penalty: 0,
            defined: false,
            internal: false,
            tolerant_for: None,
        }
    }

    pub(crate) fn internal(name: &str, productions: Vec<Production>, penalty: u32) -> Self {
        RuleDef {
            productions,
            penalty,
            defined: true,
            internal: true,
            ..RuleDef::new(Some(name.into()))
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Lowest penalty of any empty derivation, `None` if not nullable.
    pub fn null_penalty(&self) -> Option<u32> {
        self.null_penalty
    }

    /// Penalty charged for every tree node built from this rule.
    pub fn penalty(&self) -> u32 {
        self.penalty
    }

    /// Synthesized by the grammar rather than written by its author.
    pub fn is_internal(&self) -> bool {
        self.internal
    }

    /// For a fault-tolerant wrapper, the terminal usage it stands for.
    pub fn tolerant_for(&self) -> Option<Symbol> {
        self.tolerant_for
    }
}

/// A bounded repetition of a sub-production.
#[derive(Clone, Debug)]
pub struct GroupDef {
    pub(crate) production: Production,
    pub(crate) min: u32,
    pub(crate) max: u32,
    pub(crate) nullable: bool,
    pub(crate) null_penalty: Option<u32>,
    pub(crate) production_nullable: bool,
}

impl GroupDef {
    pub fn production(&self) -> &[Symbol] {
        &self.production
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    /// Upper bound; `0` means unbounded.
    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_unbounded(&self) -> bool {
        self.max == 0
    }

    /// Whether one more instance may follow `count` matched instances.
    #[inline]
    pub fn can_repeat(&self, count: u32) -> bool {
        self.is_unbounded() || count < self.max
    }

    #[inline]
    pub fn is_satisfied(&self, count: u32) -> bool {
        count >= self.min
    }

    /// Canonical count after one more instance. Unbounded groups saturate
    /// once every further count behaves the same.
    #[inline]
    pub fn next_count(&self, count: u32) -> u32 {
        let next = count.saturating_add(1);
        if self.is_unbounded() {
            next.min(self.min.max(1))
        } else {
            next
        }
    }

    /// The group as a whole can match nothing.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// A single instance can match nothing.
    pub fn is_production_nullable(&self) -> bool {
        self.production_nullable
    }

    pub fn null_penalty(&self) -> Option<u32> {
        self.null_penalty
    }
}

/// Converts a table length into the next dense id.
fn next_index(table: &'static str, len: usize) -> GrammarResult<u32> {
    u32::try_from(len).map_err(|_| GrammarError::TableOverflow { table, count: len })
}

/// A context-free grammar.
pub struct Grammar {
    options: GrammarOptions,
    rules: RwLock<Vec<RuleDef>>,
    groups: RwLock<Vec<GroupDef>>,
    sets: RwLock<Vec<Box<[SetMember]>>>,
    /// Text of registered multi-character terminals, indexed from
    /// `TerminalId::FIRST_SYMBOL`.
    symbols: RwLock<Vec<Box<str>>>,
    rule_names: FxDashMap<Box<str>, RuleId>,
    terminals: FxDashMap<Box<str>, TerminalId>,
    set_index: FxDashMap<Box<[SetMember]>, SetId>,
    pub(crate) tolerant: FxDashMap<Symbol, RuleId>,
    user_data: FxDashMap<UserKey, UserData>,
    start: RwLock<Option<RuleId>>,
    penalty: RuleId,
    penalty_empty: RuleId,
}

impl Grammar {
    /// Create a fault-tolerant grammar.
    pub fn new() -> Self {
        Self::with_options(GrammarOptions::default())
    }

    pub fn with_options(options: GrammarOptions) -> Self {
        // The penalty rules exist in every grammar so their ids are fixed.
        let penalty = RuleId::new(0);
        let penalty_empty = RuleId::new(1);
        let rules = vec![
            RuleDef::internal(
                "%penalty",
                vec![
                    Production::from([Symbol::Any]),
                    Production::from([Symbol::Rule(penalty), Symbol::Any]),
                ],
                1,
            ),
            RuleDef::internal("%penalty-empty", vec![Production::from([Symbol::Empty])], 1),
        ];

        let grammar = Grammar {
            options,
            rules: RwLock::new(rules),
            groups: RwLock::new(Vec::new()),
            sets: RwLock::new(Vec::new()),
            symbols: RwLock::new(Vec::new()),
            rule_names: FxDashMap::default(),
            terminals: FxDashMap::default(),
            set_index: FxDashMap::default(),
            tolerant: FxDashMap::default(),
            user_data: FxDashMap::default(),
            start: RwLock::new(None),
            penalty,
            penalty_empty,
        };
        grammar.analyze_nullability();
        grammar
    }

    pub fn options(&self) -> GrammarOptions {
        self.options
    }

    /// The shared rule that skips one or more tokens at a cost of 1 each.
    pub fn penalty_rule(&self) -> RuleId {
        self.penalty
    }

    /// The shared rule that matches nothing at a cost of 1.
    pub fn penalty_empty_rule(&self) -> RuleId {
        self.penalty_empty
    }

    // -- Terminals --

    /// Register (or look up) a terminal by its text.
    ///
    /// Single-codepoint text maps straight to the codepoint id without
    /// touching any table.
    pub fn terminal(&self, text: &str) -> GrammarResult<TerminalId> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Err(GrammarError::EmptyTerminal),
            (Some(c), None) => Ok(TerminalId::from_char(c)),
            _ => self.symbol_terminal(text),
        }
    }

    pub fn char_terminal(&self, c: char) -> TerminalId {
        TerminalId::from_char(c)
    }

    fn symbol_terminal(&self, text: &str) -> GrammarResult<TerminalId> {
        // Fast path: already registered
        if let Some(id) = self.terminals.get(text) {
            return Ok(*id);
        }

        let id = self.terminals.entry(text.into()).or_try_insert_with(|| {
            let mut symbols = self.symbols.write();
            let index = next_index("terminal", symbols.len())?
                .checked_add(TerminalId::FIRST_SYMBOL)
                .ok_or(GrammarError::TableOverflow {
                    table: "terminal",
                    count: symbols.len(),
                })?;
            let id = TerminalId::new(index);
            symbols.push(text.into());
            trace!(?id, text, "registered terminal");
            Ok(id)
        })?;
        Ok(*id)
    }

    /// Look up a terminal without registering it.
    pub fn lookup_terminal(&self, text: &str) -> Option<TerminalId> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (None, _) => None,
            (Some(c), None) => Some(TerminalId::from_char(c)),
            _ => self.terminals.get(text).map(|id| *id),
        }
    }

    /// Text of a terminal, for codepoint and registered terminals alike.
    pub fn terminal_text(&self, id: TerminalId) -> Option<String> {
        if let Some(c) = id.as_char() {
            return Some(c.to_string());
        }
        let index = id.raw().checked_sub(TerminalId::FIRST_SYMBOL)?;
        self.symbols
            .read()
            .get(index as usize)
            .map(|text| text.to_string())
    }

    // -- Rules --

    /// Get or create the rule with this name. Used for references, which may
    /// precede the definition.
    pub fn rule(&self, name: &str) -> GrammarResult<RuleId> {
        if let Some(id) = self.rule_names.get(name) {
            return Ok(*id);
        }

        let id = self
            .rule_names
            .entry(name.into())
            .or_try_insert_with(|| self.push_rule(RuleDef::new(Some(name.into()))))?;
        Ok(*id)
    }

    /// Claim the rule with this name for definition.
    ///
    /// A grammar may not redefine a named rule: the second definition fails
    /// with [`GrammarError::DuplicateRule`], whichever thread makes it.
    pub fn define_rule(&self, name: &str) -> GrammarResult<RuleId> {
        let id = self.rule(name)?;
        let mut rules = self.rules.write();
        let def = &mut rules[id.index()];
        if def.defined {
            return Err(GrammarError::DuplicateRule {
                name: name.to_string(),
            });
        }
        def.defined = true;
        debug!(?id, name, "defined rule");
        Ok(id)
    }

    /// Create a rule with no name. Anonymous rules are never shared.
    pub fn anonymous_rule(&self) -> GrammarResult<RuleId> {
        let mut def = RuleDef::new(None);
        def.defined = true;
        self.push_rule(def)
    }

    pub fn lookup_rule(&self, name: &str) -> Option<RuleId> {
        self.rule_names.get(name).map(|id| *id)
    }

    pub(crate) fn push_rule(&self, def: RuleDef) -> GrammarResult<RuleId> {
        let mut rules = self.rules.write();
        let id = RuleId::new(next_index("rule", rules.len())?);
        trace!(?id, name = def.name.as_deref(), "created rule");
        rules.push(def);
        Ok(id)
    }

    /// Append a production to a rule.
    ///
    /// Terminal usages are rewritten into fault-tolerant rules first (unless
    /// the grammar is strict), then nullability is recomputed for the whole
    /// grammar, since a new production can change earlier answers.
    pub fn add_production(
        &self,
        rule: RuleId,
        symbols: impl IntoIterator<Item = Symbol>,
    ) -> GrammarResult<()> {
        self.check_rule(rule)?;
        let symbols: Vec<Symbol> = symbols.into_iter().collect();
        self.validate(&symbols)?;
        let production = self.rewrite(symbols)?;

        {
            let mut rules = self.rules.write();
            rules[rule.index()].productions.push(production);
        }
        self.analyze_nullability();
        Ok(())
    }

    /// Set the penalty charged for every tree node built from `rule`.
    pub fn set_rule_penalty(&self, rule: RuleId, penalty: u32) -> GrammarResult<()> {
        self.check_rule(rule)?;
        self.rules.write()[rule.index()].penalty = penalty;
        self.analyze_nullability();
        Ok(())
    }

    pub fn rule_name(&self, rule: RuleId) -> Option<String> {
        self.rules
            .read()
            .get(rule.index())
            .and_then(|def| def.name.as_deref().map(str::to_string))
    }

    pub fn rule_count(&self) -> usize {
        self.rules.read().len()
    }

    pub fn productions(&self, rule: RuleId) -> GrammarResult<Vec<Production>> {
        self.rules
            .read()
            .get(rule.index())
            .map(|def| def.productions.clone())
            .ok_or(GrammarError::UnknownRule(rule))
    }

    pub fn is_nullable(&self, rule: RuleId) -> GrammarResult<bool> {
        self.rules
            .read()
            .get(rule.index())
            .map(|def| def.nullable)
            .ok_or(GrammarError::UnknownRule(rule))
    }

    /// Whether a production could derive the empty string, given the
    /// current analysis.
    pub fn is_production_nullable(&self, symbols: &[Symbol]) -> bool {
        let rules = self.rules.read();
        let groups = self.groups.read();
        nullable::production_penalty(symbols, &rules, &groups).is_some()
    }

    /// For a fault-tolerant wrapper rule, the usage it wraps.
    pub fn tolerant_symbol(&self, rule: RuleId) -> Option<Symbol> {
        self.rules
            .read()
            .get(rule.index())
            .and_then(|def| def.tolerant_for)
    }

    pub fn set_start(&self, rule: RuleId) -> GrammarResult<()> {
        self.check_rule(rule)?;
        *self.start.write() = Some(rule);
        Ok(())
    }

    pub fn start(&self) -> Option<RuleId> {
        *self.start.read()
    }

    // -- Groups --

    /// Create a repetition group over `symbols` matching between `min` and
    /// `max` instances. `max == 0` means unbounded.
    pub fn group(
        &self,
        symbols: impl IntoIterator<Item = Symbol>,
        min: u32,
        max: u32,
    ) -> GrammarResult<GroupId> {
        if max != 0 && max < min {
            return Err(GrammarError::InvalidGroupBounds { min, max });
        }
        let symbols: Vec<Symbol> = symbols.into_iter().collect();
        self.validate(&symbols)?;
        let production = self.rewrite(symbols)?;

        let id = {
            let mut groups = self.groups.write();
            let id = GroupId::new(next_index("group", groups.len())?);
            groups.push(GroupDef {
                production,
                min,
                max,
                nullable: min == 0,
                null_penalty: (min == 0).then_some(0),
                production_nullable: false,
            });
            id
        };
        trace!(?id, min, max, "created group");
        self.analyze_nullability();
        Ok(id)
    }

    /// `symbols?`
    pub fn optional(&self, symbols: impl IntoIterator<Item = Symbol>) -> GrammarResult<GroupId> {
        self.group(symbols, 0, 1)
    }

    /// `symbols*`
    pub fn star(&self, symbols: impl IntoIterator<Item = Symbol>) -> GrammarResult<GroupId> {
        self.group(symbols, 0, 0)
    }

    /// `symbols+`
    pub fn plus(&self, symbols: impl IntoIterator<Item = Symbol>) -> GrammarResult<GroupId> {
        self.group(symbols, 1, 0)
    }

    pub fn group_def(&self, group: GroupId) -> GrammarResult<GroupDef> {
        self.groups
            .read()
            .get(group.index())
            .cloned()
            .ok_or(GrammarError::UnknownGroup(group))
    }

    // -- Sets --

    /// Create (or reuse) a terminal set. Member order and duplicates do not
    /// matter: equal sets share one id.
    pub fn set(&self, members: impl IntoIterator<Item = Symbol>) -> GrammarResult<SetId> {
        let mut content = members
            .into_iter()
            .map(|symbol| SetMember::try_from(symbol).map_err(GrammarError::InvalidSetMember))
            .collect::<GrammarResult<Vec<SetMember>>>()?;
        if content.is_empty() {
            return Err(GrammarError::EmptySet);
        }
        content.sort_unstable();
        content.dedup();
        let content = content.into_boxed_slice();

        if let Some(id) = self.set_index.get(&content) {
            return Ok(*id);
        }

        let id = self.set_index.entry(content.clone()).or_try_insert_with(|| {
            let mut sets = self.sets.write();
            let id = SetId::new(next_index("set", sets.len())?);
            sets.push(content);
            Ok(id)
        })?;
        Ok(*id)
    }

    pub fn set_members(&self, set: SetId) -> GrammarResult<Vec<SetMember>> {
        self.sets
            .read()
            .get(set.index())
            .map(|members| members.to_vec())
            .ok_or(GrammarError::UnknownSet(set))
    }

    /// A set of character classes, handy for identifier-like tokens.
    pub fn class_set(&self, classes: &[CharClass]) -> GrammarResult<SetId> {
        self.set(classes.iter().copied().map(Symbol::Class))
    }

    // -- User data --

    /// Attach data to a terminal or rule, returning what was there before.
    pub fn set_user_data(&self, key: UserKey, data: UserData) -> Option<UserData> {
        self.user_data.insert(key, data)
    }

    pub fn user_data(&self, key: UserKey) -> Option<UserData> {
        self.user_data.get(&key).map(|data| Arc::clone(data.value()))
    }

    /// Typed access to attached data.
    pub fn user_data_as<T: Any + Send + Sync>(&self, key: UserKey) -> Option<Arc<T>> {
        self.user_data(key).and_then(|data| data.downcast::<T>().ok())
    }

    // -- Analysis --

    /// Recompute nullability for every rule and group.
    ///
    /// Returns how many rule or group flags changed; re-running without new
    /// productions returns 0.
    pub fn analyze_nullability(&self) -> usize {
        let mut rules = self.rules.write();
        let mut groups = self.groups.write();
        nullable::analyze(&mut rules, &mut groups)
    }

    /// Copy the tables into an immutable snapshot for parsing.
    pub fn snapshot(&self) -> GrammarSnapshot {
        let rules = self.rules.read();
        let groups = self.groups.read();
        let sets = self.sets.read();
        GrammarSnapshot::new(
            rules.clone(),
            groups.clone(),
            sets.clone(),
            self.start(),
            self.penalty,
            self.penalty_empty,
        )
    }

    // -- Validation --

    fn check_rule(&self, rule: RuleId) -> GrammarResult<()> {
        if rule.index() < self.rules.read().len() {
            Ok(())
        } else {
            Err(GrammarError::UnknownRule(rule))
        }
    }

    fn validate(&self, symbols: &[Symbol]) -> GrammarResult<()> {
        let rule_count = self.rules.read().len();
        let group_count = self.groups.read().len();
        let set_count = self.sets.read().len();
        for &symbol in symbols {
            match symbol {
                Symbol::Rule(rule) if rule.index() >= rule_count => {
                    return Err(GrammarError::UnknownRule(rule));
                }
                Symbol::Group(group) if group.index() >= group_count => {
                    return Err(GrammarError::UnknownGroup(group));
                }
                Symbol::Set(set) if set.index() >= set_count => {
                    return Err(GrammarError::UnknownSet(set));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn rewrite(&self, symbols: Vec<Symbol>) -> GrammarResult<Production> {
        if self.options.fault_tolerant {
            tolerant::rewrite(self, &symbols)
        } else {
            Ok(symbols.into_boxed_slice())
        }
    }

    /// Read access for the dump and the analyzers.
    pub(crate) fn with_tables<R>(
        &self,
        f: impl FnOnce(&[RuleDef], &[GroupDef], &[Box<[SetMember]>]) -> R,
    ) -> R {
        let rules = self.rules.read();
        let groups = self.groups.read();
        let sets = self.sets.read();
        f(&rules, &groups, &sets)
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
