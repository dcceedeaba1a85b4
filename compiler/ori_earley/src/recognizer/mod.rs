//! The Earley recognizer.
//!
//! One [`EarleyState`] per input position. Each state is closed under
//! prediction and completion with a worklist, then the pending scanners are
//! matched against the next token to seed the following state.
//!
//! Prediction follows Aycock and Horspool: when the predicted rule or group
//! is nullable, the predicting item is advanced over it on the spot. That
//! makes completions of zero-width items redundant, so the completer skips
//! them and the order in which items of one state are processed no longer
//! matters.

mod dump;

use crate::config::ParserConfig;
use crate::error::{ParseError, ParseResult};
use crate::forest::ForestBuilder;
use crate::item::{Child, EarleyItem, ItemKey, ItemRef, Link, NullTarget, Operation, Owner};
use crate::state::{EarleyState, Waiting};
use crate::token::{Token, TokenList, TokenSource};
use crate::tree::ParseTree;
use ori_grammar::{Grammar, GrammarSnapshot, GroupId, RuleId, Symbol, TerminalId};
use smallvec::SmallVec;
use tracing::{debug, trace};

/// Outcome of one recognition run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Recognition {
    /// A complete start item spans the whole input.
    pub accepted: bool,
    /// Tokens successfully scanned.
    pub tokens: usize,
    /// States built, including the initial one.
    pub states: usize,
    /// The state whose scanners rejected the next token.
    pub failed_at: Option<usize>,
}

/// An Earley parser over a snapshot of a [`Grammar`].
///
/// The snapshot is taken at construction and on every [`reset`](Self::reset),
/// so the grammar may be extended between parses.
pub struct Parser<'g> {
    grammar: &'g Grammar,
    snapshot: GrammarSnapshot,
    config: ParserConfig,
    states: Vec<EarleyState>,
    outcome: Option<Recognition>,
}

impl<'g> Parser<'g> {
    pub fn new(grammar: &'g Grammar, config: ParserConfig) -> Self {
        Parser {
            grammar,
            snapshot: grammar.snapshot(),
            config,
            states: Vec::new(),
            outcome: None,
        }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn snapshot(&self) -> &GrammarSnapshot {
        &self.snapshot
    }

    pub fn config(&self) -> ParserConfig {
        self.config
    }

    pub fn set_config(&mut self, config: ParserConfig) {
        self.config = config;
    }

    /// Drop all states and re-read the grammar.
    pub fn reset(&mut self) {
        self.states.clear();
        self.outcome = None;
        self.snapshot = self.grammar.snapshot();
    }

    /// Recognize tokens until end of input or until no item accepts the
    /// next token.
    ///
    /// # Errors
    /// [`ParseError::NoStartRule`] when the grammar has no start rule, and
    /// [`ParseError::AlreadyRun`] when called twice without a reset.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&mut self, source: &mut dyn TokenSource) -> ParseResult<Recognition> {
        if !self.states.is_empty() {
            return Err(ParseError::AlreadyRun);
        }
        let start = self.snapshot.start().ok_or(ParseError::NoStartRule)?;

        self.states.push(EarleyState::new(None));
        let productions = self.snapshot.rule(start).productions().len();
        for production in 0..productions {
            let owner = Owner::Rule {
                rule: start,
                production: to_u32(production),
            };
            let key = self.key(owner, 0, 0, 0);
            self.add(0, key, 0, None, None, None);
        }

        let mut current = 0;
        let mut failed_at = None;
        loop {
            self.process(current);
            let token = source.next_token();
            if token.is_end() {
                break;
            }
            if !self.scan(current, token) {
                failed_at = Some(current);
                break;
            }
            current += 1;
        }

        let outcome = Recognition {
            accepted: failed_at.is_none()
                && (!self.accepting_items(start).is_empty() || self.empty_start().is_some()),
            tokens: current,
            states: self.states.len(),
            failed_at,
        };
        self.outcome = Some(outcome);

        debug!(
            tokens = outcome.tokens,
            states = outcome.states,
            accepted = outcome.accepted,
            failed_at = ?outcome.failed_at,
            "recognition finished"
        );
        Ok(outcome)
    }

    /// Reset, then recognize one token per codepoint of `text`.
    ///
    /// # Errors
    /// See [`run`](Self::run).
    pub fn parse_str(&mut self, text: &str) -> ParseResult<Recognition> {
        self.reset();
        self.run(&mut TokenList::from_chars(text))
    }

    /// The outcome of the last run, if any.
    pub fn recognition(&self) -> Option<Recognition> {
        self.outcome
    }

    /// The whole input was consumed and derives the start rule.
    pub fn has_parse(&self) -> bool {
        self.outcome.is_some_and(|outcome| outcome.accepted)
    }

    /// Cheapest tree of the input, ties going to the first derivation found.
    pub fn best_tree(&self) -> Option<ParseTree> {
        self.trees(1).into_iter().next()
    }

    /// Distinct trees of the input within `max_penalty`, cheapest first, at
    /// most `max_trees` of them.
    pub fn forest(&self) -> Vec<ParseTree> {
        self.trees(self.config.max_trees)
    }

    fn trees(&self, limit: usize) -> Vec<ParseTree> {
        if !self.has_parse() {
            return Vec::new();
        }
        let builder = ForestBuilder::new(self, limit);
        match self.empty_start() {
            Some(start) => builder.empty(start),
            None => builder.roots(&self.accepting()),
        }
    }

    pub fn states(&self) -> &[EarleyState] {
        &self.states
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// # Errors
    /// [`ParseError::NoSuchState`] when `index` is past the last state.
    pub fn state(&self, index: usize) -> ParseResult<&EarleyState> {
        self.states.get(index).ok_or(ParseError::NoSuchState {
            state: index,
            count: self.states.len(),
        })
    }

    pub fn item(&self, at: ItemRef) -> Option<&EarleyItem> {
        self.states.get(at.state())?.items.get(at.index())
    }

    /// Terminal-like symbols the scanners of a state were waiting for,
    /// leaving out the skip rule every tolerant grammar carries.
    ///
    /// # Errors
    /// [`ParseError::NoSuchState`] when `index` is past the last state.
    pub fn expected(&self, index: usize) -> ParseResult<Vec<Symbol>> {
        let state = self.state(index)?;
        let skip = self.snapshot.penalty_rule();
        let mut symbols: Vec<Symbol> = state
            .scanners
            .iter()
            .filter_map(|&i| {
                let item = &state.items[i as usize];
                if matches!(item.owner, Owner::Rule { rule, .. } if rule == skip) {
                    return None;
                }
                match item.op {
                    Operation::ScanToken(id) => Some(Symbol::Terminal(id)),
                    Operation::ScanAny => Some(Symbol::Any),
                    Operation::ScanClass(class) => Some(Symbol::Class(class)),
                    Operation::ScanSet(set) => Some(Symbol::Set(set)),
                    _ => None,
                }
            })
            .collect();
        symbols.sort_unstable();
        symbols.dedup();
        Ok(symbols)
    }

    /// Complete start items spanning the whole input.
    pub(crate) fn accepting(&self) -> Vec<ItemRef> {
        match (self.snapshot.start(), self.outcome) {
            (Some(start), Some(outcome)) if outcome.accepted => self.accepting_items(start),
            _ => Vec::new(),
        }
    }

    /// A start rule with no productions derives the empty input and
    /// nothing else; no item stands for it.
    fn empty_start(&self) -> Option<RuleId> {
        let start = self.snapshot.start()?;
        let empty = self.states.len() == 1 && self.snapshot.rule(start).productions().is_empty();
        empty.then_some(start)
    }

    fn accepting_items(&self, start: RuleId) -> Vec<ItemRef> {
        let Some(last) = self.states.len().checked_sub(1) else {
            return Vec::new();
        };
        self.states[last]
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                item.origin == 0 && item.op == Operation::CompleteNonTerminal(start)
            })
            .map(|(i, _)| ItemRef::new(to_u32(last), to_u32(i)))
            .collect()
    }

    /// Close state `j` under prediction and completion.
    fn process(&mut self, j: usize) {
        let mut cursor = 0;
        while cursor < self.states[j].items.len() {
            let at = ItemRef::new(to_u32(j), to_u32(cursor));
            let op = self.states[j].items[cursor].op;
            match op {
                Operation::PredictNonTerminal(rule) => self.predict_rule(at, rule),
                Operation::PredictGroup(group) => self.predict_group(at, group),
                Operation::PredictGroupItem(group) => self.predict_instance(at, group),
                Operation::ScanNull => {
                    self.advance(j, at, Child::Empty, 0);
                }
                Operation::ScanToken(_)
                | Operation::ScanAny
                | Operation::ScanClass(_)
                | Operation::ScanSet(_) => {}
                Operation::CompleteNonTerminal(rule) => {
                    let penalty = self.snapshot.rule(rule).penalty();
                    self.complete(at, Waiting::Rule(rule), penalty);
                }
                Operation::CompleteItem(group) => self.complete(at, Waiting::Instance(group), 0),
                Operation::CompleteGroup(group) => self.complete(at, Waiting::Group(group), 0),
            }
            cursor += 1;
        }
        trace!(state = j, items = self.states[j].items.len(), "state closed");
    }

    fn predict_rule(&mut self, at: ItemRef, rule: RuleId) {
        let j = at.state();
        let def = self.snapshot.rule(rule);
        let (productions, null) = (def.productions().len(), def.null_penalty());
        for production in 0..productions {
            let owner = Owner::Rule {
                rule,
                production: to_u32(production),
            };
            let key = self.key(owner, 0, to_u32(j), 0);
            let child = self.add(j, key, 0, None, None, Some(at));
            push_unique(&mut self.item_mut(at).predicted, child);
        }
        if let Some(penalty) = null {
            self.advance(j, at, Child::Null(NullTarget::Rule(rule)), penalty);
        }
    }

    fn predict_group(&mut self, at: ItemRef, group: GroupId) {
        let j = at.state();
        let def = self.snapshot.group(group);
        let (repeat, done, null) = (def.can_repeat(0), def.is_satisfied(0), def.null_penalty());
        let origin = to_u32(j);
        let mut wrappers: SmallVec<[Operation; 2]> = SmallVec::new();
        if repeat {
            wrappers.push(Operation::PredictGroupItem(group));
        }
        if done {
            wrappers.push(Operation::CompleteGroup(group));
        }
        for op in wrappers {
            let key = ItemKey {
                owner: Owner::Group(group),
                dot: 0,
                origin,
                count: 0,
                op,
            };
            let wrapper = self.add(j, key, 0, None, None, Some(at));
            push_unique(&mut self.item_mut(at).predicted, wrapper);
        }
        if let Some(penalty) = null {
            self.advance(j, at, Child::Null(NullTarget::Group(group)), penalty);
        }
    }

    /// `at` is a group wrapper that may take another instance.
    fn predict_instance(&mut self, at: ItemRef, group: GroupId) {
        let j = at.state();
        let owner = Owner::Instance(group);
        let key = self.key(owner, 0, to_u32(j), 0);
        let instance = self.add(j, key, 0, None, None, Some(at));
        push_unique(&mut self.item_mut(at).predicted, instance);

        let null = self
            .snapshot
            .production_null_penalty(self.snapshot.group(group).production());
        if let Some(penalty) = null {
            self.advance(j, at, Child::Null(NullTarget::Instance(group)), penalty);
        }
    }

    /// Advance everything in the origin state that waits on what `at`
    /// completed.
    fn complete(&mut self, at: ItemRef, waiting: Waiting, own_penalty: u32) {
        let j = at.state();
        let item = &self.states[j].items[at.index()];
        let origin = item.origin();
        if origin == j {
            return;
        }
        let penalty = item.penalty.saturating_add(own_penalty);
        for waiter in self.states[origin].waiters(waiting) {
            let from = ItemRef::new(to_u32(origin), waiter);
            let advanced = self.advance(j, from, Child::Completed(at), penalty);
            let completed = &mut self.item_mut(at).completed;
            for next in advanced {
                push_unique(completed, next);
            }
        }
    }

    /// Match the scanners of state `j` against `token`. Returns `false`, and
    /// leaves no new state behind, when nothing accepts it.
    fn scan(&mut self, j: usize, token: Token) -> bool {
        let next = j + 1;
        let scanners = self.states[j].scanners.clone();
        let accepted: Vec<ItemRef> = scanners
            .into_iter()
            .map(|i| ItemRef::new(to_u32(j), i))
            .filter(|&at| self.matches(self.states[j].items[at.index()].op, &token))
            .collect();
        if accepted.is_empty() {
            debug!(state = j, token = ?token, "no scanner accepts token");
            return false;
        }
        self.states.push(EarleyState::new(Some(token)));
        for at in accepted {
            self.advance(next, at, Child::Token, 0);
        }
        true
    }

    fn matches(&self, op: Operation, token: &Token) -> bool {
        let id = token.id();
        match op {
            Operation::ScanToken(expected) => id != TerminalId::UNKNOWN && id == expected,
            Operation::ScanAny => !token.is_end(),
            Operation::ScanClass(class) => token.ch().is_some_and(|c| class.matches(c)),
            Operation::ScanSet(set) => self.snapshot.set_matches(set, id, token.ch()),
            _ => false,
        }
    }

    /// Move `from` past its next symbol into state `into`.
    ///
    /// Rule and instance items step their dot. Group wrappers count one more
    /// instance, which yields a wrapper that may repeat, one that may
    /// complete, or both.
    fn advance(
        &mut self,
        into: usize,
        from: ItemRef,
        child: Child,
        child_penalty: u32,
    ) -> SmallVec<[ItemRef; 2]> {
        let item = &self.states[from.state()].items[from.index()];
        let (owner, dot, origin, count, start) =
            (item.owner, item.dot, item.origin, item.count, item.start);
        let penalty = item.penalty.saturating_add(child_penalty);
        let link = Link { prev: from, child };

        let mut advanced = SmallVec::new();
        match owner {
            Owner::Group(group) => {
                let def = self.snapshot.group(group);
                let next = def.next_count(count);
                // A saturated wrapper advancing over an empty instance would
                // link to itself.
                if next == count && into == from.state() {
                    return advanced;
                }
                let mut wrappers: SmallVec<[Operation; 2]> = SmallVec::new();
                if def.can_repeat(next) {
                    wrappers.push(Operation::PredictGroupItem(group));
                }
                if def.is_satisfied(next) {
                    wrappers.push(Operation::CompleteGroup(group));
                }
                for op in wrappers {
                    let key = ItemKey {
                        owner,
                        dot: 0,
                        origin,
                        count: next,
                        op,
                    };
                    advanced.push(self.add(into, key, penalty, Some(start), Some(link), None));
                }
            }
            Owner::Rule { .. } | Owner::Instance(_) => {
                let key = self.key(owner, dot + 1, origin, count);
                advanced.push(self.add(into, key, penalty, Some(start), Some(link), None));
            }
        }
        advanced
    }

    /// Insert an item into state `into`, or merge the link and predictor
    /// into the existing item with the same key.
    fn add(
        &mut self,
        into: usize,
        key: ItemKey,
        penalty: u32,
        start: Option<ItemRef>,
        link: Option<Link>,
        predictor: Option<ItemRef>,
    ) -> ItemRef {
        let state = &mut self.states[into];
        if let Some(&index) = state.index.get(&key) {
            let item = &mut state.items[index as usize];
            if let Some(link) = link {
                if !item.links.contains(&link) {
                    item.links.push(link);
                    item.penalty = item.penalty.min(penalty);
                }
            }
            if let Some(predictor) = predictor {
                push_unique(&mut item.predictors, predictor);
            }
            return ItemRef::new(to_u32(into), index);
        }

        let index = to_u32(state.items.len());
        let at = ItemRef::new(to_u32(into), index);
        state.items.push(EarleyItem {
            owner: key.owner,
            dot: key.dot,
            origin: key.origin,
            count: key.count,
            op: key.op,
            penalty,
            start: start.unwrap_or(at),
            predictors: predictor.into_iter().collect(),
            predicted: SmallVec::new(),
            completed: SmallVec::new(),
            links: link.into_iter().collect(),
        });
        state.index.insert(key, index);
        match key.op {
            Operation::PredictNonTerminal(rule) => {
                state.waiting.entry(Waiting::Rule(rule)).or_default().push(index);
            }
            Operation::PredictGroup(group) => {
                state.waiting.entry(Waiting::Group(group)).or_default().push(index);
            }
            Operation::PredictGroupItem(group) => {
                state.waiting.entry(Waiting::Instance(group)).or_default().push(index);
            }
            op if op.is_scan() => state.scanners.push(index),
            _ => {}
        }
        trace!(item = ?at, owner = ?key.owner, dot = key.dot, origin = key.origin, op = key.op.name(), "item added");
        at
    }

    /// Key of a rule or instance item, with its operation derived from the
    /// symbol after the dot.
    fn key(&self, owner: Owner, dot: u32, origin: u32, count: u32) -> ItemKey {
        let op = match owner {
            Owner::Rule { rule, production } => classify(
                self.snapshot
                    .rule(rule)
                    .productions()
                    .get(production as usize)
                    .and_then(|symbols| symbols.get(dot as usize))
                    .copied(),
                Operation::CompleteNonTerminal(rule),
            ),
            Owner::Instance(group) => classify(
                self.snapshot.group(group).production().get(dot as usize).copied(),
                Operation::CompleteItem(group),
            ),
            // Wrappers name their operation explicitly.
            Owner::Group(group) => Operation::PredictGroupItem(group),
        };
        ItemKey {
            owner,
            dot,
            origin,
            count,
            op,
        }
    }

    fn item_mut(&mut self, at: ItemRef) -> &mut EarleyItem {
        &mut self.states[at.state()].items[at.index()]
    }
}

/// The operation for the symbol after the dot; `complete` at the end.
fn classify(symbol: Option<Symbol>, complete: Operation) -> Operation {
    match symbol {
        None => complete,
        Some(Symbol::Empty) => Operation::ScanNull,
        Some(Symbol::Rule(rule)) => Operation::PredictNonTerminal(rule),
        Some(Symbol::Group(group)) => Operation::PredictGroup(group),
        Some(Symbol::Terminal(id)) => Operation::ScanToken(id),
        Some(Symbol::Any) => Operation::ScanAny,
        Some(Symbol::Class(class)) => Operation::ScanClass(class),
        Some(Symbol::Set(set)) => Operation::ScanSet(set),
    }
}

fn push_unique<A: smallvec::Array<Item = ItemRef>>(list: &mut SmallVec<A>, at: ItemRef) {
    if !list.contains(&at) {
        list.push(at);
    }
}

pub(crate) fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or_else(|_| panic!("earley table exceeded {} entries", u32::MAX))
}
