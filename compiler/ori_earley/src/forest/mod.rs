//! Tree construction.
//!
//! Walks links backward from the accepting items. A completed item becomes
//! one node per derivation; its derivations are the ways of reaching it,
//! each a derivation of the link's predecessor extended by the link's child.
//!
//! Every result is capped at `limit` candidates, cheapest first. Since a
//! node's penalty is the sum of its parts, the cheapest `limit` trees only
//! ever use the cheapest `limit` alternatives of each part, so capping early
//! loses nothing. Extending a prefix by a child merges the two sorted lists
//! best-first and stops after `limit` pairs. `limit == 1` yields the single
//! best tree.
//!
//! Results are memoized per state. Grammars with cycles (`A ::= A | 'a'`)
//! reach a key that is still being computed; that branch is cut, and any
//! result that depended on a cut made on behalf of an enclosing key is not
//! cached, since it is only partial from that key's point of view.

use crate::item::{Child, ItemRef, NullTarget, Operation, Owner};
use crate::recognizer::{to_u32, Parser};
use crate::stack::ensure_sufficient_stack;
use crate::tree::{NodeKind, ParseNode, ParseTree, Span};
use ori_grammar::RuleId;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::rc::Rc;
use tracing::debug;

type Nodes = Rc<[Rc<ParseNode>]>;

/// Children collected so far, newest first.
struct Cons {
    node: Rc<ParseNode>,
    rest: Option<Rc<Cons>>,
}

/// One derivation of an item's prefix.
#[derive(Clone)]
struct Partial {
    penalty: u32,
    children: Option<Rc<Cons>>,
}

impl Partial {
    const EMPTY: Partial = Partial {
        penalty: 0,
        children: None,
    };

    fn with(&self, node: &Rc<ParseNode>) -> Partial {
        Partial {
            penalty: self.penalty.saturating_add(node.penalty()),
            children: Some(Rc::new(Cons {
                node: Rc::clone(node),
                rest: self.children.clone(),
            })),
        }
    }

    fn children(&self) -> Vec<Rc<ParseNode>> {
        let mut children = Vec::new();
        let mut cursor = self.children.as_deref();
        while let Some(cons) = cursor {
            children.push(Rc::clone(&cons.node));
            cursor = cons.rest.as_deref();
        }
        children.reverse();
        children
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
enum Key {
    Partial(ItemRef),
    Complete(ItemRef),
    Null(usize, NullTarget),
}

#[derive(Default)]
struct StateCache {
    leaf: Option<Rc<ParseNode>>,
    partials: FxHashMap<usize, Rc<[Partial]>>,
    trees: FxHashMap<usize, Nodes>,
    nulls: FxHashMap<NullTarget, Nodes>,
}

/// A result together with the shallowest in-progress key it was cut at.
type Cut<T> = (T, Option<usize>);

pub(crate) struct ForestBuilder<'p, 'g> {
    parser: &'p Parser<'g>,
    limit: usize,
    max_penalty: u32,
    caches: Vec<StateCache>,
    active: FxHashMap<Key, usize>,
}

impl<'p, 'g> ForestBuilder<'p, 'g> {
    pub(crate) fn new(parser: &'p Parser<'g>, limit: usize) -> Self {
        ForestBuilder {
            parser,
            limit: limit.max(1),
            max_penalty: parser.config().max_penalty,
            caches: (0..parser.state_count()).map(|_| StateCache::default()).collect(),
            active: FxHashMap::default(),
        }
    }

    /// Trees of all `roots`, cheapest first.
    pub(crate) fn roots(mut self, roots: &[ItemRef]) -> Vec<ParseTree> {
        let mut nodes = Vec::new();
        for &root in roots {
            let (trees, _) = self.trees(root);
            nodes.extend(trees.iter().cloned());
        }
        self.finish(&mut nodes);
        debug!(roots = roots.len(), trees = nodes.len(), limit = self.limit, "forest built");
        self.wrap(nodes)
    }

    /// Trees of the empty input for a start rule without productions.
    pub(crate) fn empty(mut self, start: RuleId) -> Vec<ParseTree> {
        let (nodes, _) = self.nulls(0, NullTarget::Rule(start));
        debug!(?start, trees = nodes.len(), "empty forest built");
        self.wrap(nodes.to_vec())
    }

    fn wrap(&self, nodes: Vec<Rc<ParseNode>>) -> Vec<ParseTree> {
        let snapshot = self.parser.snapshot();
        let (skip, insert) = (snapshot.penalty_rule(), snapshot.penalty_empty_rule());
        nodes
            .into_iter()
            .map(|node| ParseTree::new(node, skip, insert))
            .collect()
    }

    /// Nodes for a completed item, one per derivation.
    fn trees(&mut self, at: ItemRef) -> Cut<Nodes> {
        if let Some(hit) = self.caches[at.state()].trees.get(&at.index()) {
            return (Rc::clone(hit), None);
        }
        let key = Key::Complete(at);
        let depth = match self.enter(key) {
            Ok(depth) => depth,
            Err(cut) => return (Rc::from([]), Some(cut)),
        };

        let (partials, cut) = ensure_sufficient_stack(|| self.partials(at));
        let parser = self.parser;
        let mut nodes = Vec::new();
        if let Some(item) = parser.item(at) {
            let span = Span::new(item.origin(), at.state());
            let (kind, own) = match item.owner() {
                Owner::Rule { rule, production } => (
                    NodeKind::Rule {
                        rule,
                        production: Some(production),
                    },
                    parser.snapshot().rule(rule).penalty(),
                ),
                Owner::Group(group) => (NodeKind::Group(group), 0),
                Owner::Instance(group) => (NodeKind::Instance(group), 0),
            };
            for partial in partials.iter() {
                let penalty = partial.penalty.saturating_add(own);
                if penalty <= self.max_penalty {
                    nodes.push(Rc::new(ParseNode::interior(
                        kind.clone(),
                        span,
                        penalty,
                        partial.children(),
                    )));
                }
            }
        }
        self.finish(&mut nodes);

        let nodes: Nodes = nodes.into();
        let cut = self.leave(key, depth, cut);
        if cut.is_none() {
            self.caches[at.state()]
                .trees
                .insert(at.index(), Rc::clone(&nodes));
        }
        (nodes, cut)
    }

    /// Derivations of everything before an item's dot.
    fn partials(&mut self, at: ItemRef) -> Cut<Rc<[Partial]>> {
        if let Some(hit) = self.caches[at.state()].partials.get(&at.index()) {
            return (Rc::clone(hit), None);
        }
        let parser = self.parser;
        let Some(item) = parser.item(at) else {
            return (Rc::from([]), None);
        };
        if item.links().is_empty() {
            let start: Rc<[Partial]> = Rc::from([Partial::EMPTY]);
            self.caches[at.state()]
                .partials
                .insert(at.index(), Rc::clone(&start));
            return (start, None);
        }

        let key = Key::Partial(at);
        let depth = match self.enter(key) {
            Ok(depth) => depth,
            Err(cut) => return (Rc::from([]), Some(cut)),
        };

        let mut out: Vec<Partial> = Vec::new();
        let mut cut = None;
        for link in item.links() {
            let (prefixes, prefix_cut) = ensure_sufficient_stack(|| self.partials(link.prev));
            cut = shallowest(cut, prefix_cut);
            if prefixes.is_empty() {
                continue;
            }
            let (children, child_cut): Cut<Nodes> = match link.child {
                Child::Empty => {
                    out.extend(prefixes.iter().cloned());
                    continue;
                }
                Child::Token => match self.leaf(at.state()) {
                    Some(leaf) => (Rc::from([leaf]), None),
                    None => continue,
                },
                Child::Completed(child) => ensure_sufficient_stack(|| self.trees(child)),
                Child::Null(target) => ensure_sufficient_stack(|| self.nulls(at.state(), target)),
            };
            cut = shallowest(cut, child_cut);
            out.extend(extend(&prefixes, &children, self.limit, self.max_penalty));
        }
        out.sort_by_key(|partial| partial.penalty);
        out.truncate(self.limit);

        let out: Rc<[Partial]> = out.into();
        let cut = self.leave(key, depth, cut);
        if cut.is_none() {
            self.caches[at.state()]
                .partials
                .insert(at.index(), Rc::clone(&out));
        }
        (out, cut)
    }

    /// Empty derivations of a nullable symbol at state `state`: the
    /// zero-width completed items for it there.
    fn nulls(&mut self, state: usize, target: NullTarget) -> Cut<Nodes> {
        if let Some(hit) = self.caches[state].nulls.get(&target) {
            return (Rc::clone(hit), None);
        }
        let key = Key::Null(state, target);
        let depth = match self.enter(key) {
            Ok(depth) => depth,
            Err(cut) => return (Rc::from([]), Some(cut)),
        };

        let parser = self.parser;
        let complete = match target {
            NullTarget::Rule(rule) => Operation::CompleteNonTerminal(rule),
            NullTarget::Group(group) => Operation::CompleteGroup(group),
            NullTarget::Instance(group) => Operation::CompleteItem(group),
        };
        let mut nodes = Vec::new();
        let mut cut = None;
        if let Some(items) = parser.states().get(state).map(|s| s.items()) {
            for (index, item) in items.iter().enumerate() {
                if item.operation() != complete || item.origin() != state {
                    continue;
                }
                let at = ItemRef::new(to_u32(state), to_u32(index));
                let (trees, tree_cut) = self.trees(at);
                cut = shallowest(cut, tree_cut);
                nodes.extend(trees.iter().cloned());
            }
        }
        if let NullTarget::Rule(rule) = target {
            let def = parser.snapshot().rule(rule);
            if def.productions().is_empty() && def.penalty() <= self.max_penalty {
                nodes.push(Rc::new(ParseNode::interior(
                    NodeKind::Rule {
                        rule,
                        production: None,
                    },
                    Span::new(state, state),
                    def.penalty(),
                    Vec::new(),
                )));
            }
        }
        self.finish(&mut nodes);

        let nodes: Nodes = nodes.into();
        let cut = self.leave(key, depth, cut);
        if cut.is_none() {
            self.caches[state].nulls.insert(target, Rc::clone(&nodes));
        }
        (nodes, cut)
    }

    /// The token leaf consumed into `state`, shared by every link to it.
    fn leaf(&mut self, state: usize) -> Option<Rc<ParseNode>> {
        let parser = self.parser;
        let token = parser.states().get(state)?.token()?;
        let cache = &mut self.caches[state];
        let leaf = cache
            .leaf
            .get_or_insert_with(|| Rc::new(ParseNode::token(token.clone(), state - 1)));
        Some(Rc::clone(leaf))
    }

    fn finish(&self, nodes: &mut Vec<Rc<ParseNode>>) {
        nodes.sort_by_key(|node| node.penalty());
        nodes.truncate(self.limit);
    }

    /// Mark `key` in progress. `Err` carries the depth of the copy of `key`
    /// already on the stack.
    fn enter(&mut self, key: Key) -> Result<usize, usize> {
        if let Some(&depth) = self.active.get(&key) {
            return Err(depth);
        }
        let depth = self.active.len();
        self.active.insert(key, depth);
        Ok(depth)
    }

    /// Pop `key`; cuts made on its own behalf are resolved here.
    fn leave(&mut self, key: Key, depth: usize, cut: Option<usize>) -> Option<usize> {
        self.active.remove(&key);
        cut.filter(|&at| at < depth)
    }
}

/// The cheapest `limit` pairings of `prefixes` with `children`, cheapest
/// first, ties in prefix-major order. Both inputs are sorted by penalty, so
/// the grid is walked outward from its cheapest corner and only pairs that
/// make the cut are built.
fn extend(
    prefixes: &[Partial],
    children: &[Rc<ParseNode>],
    limit: usize,
    max_penalty: u32,
) -> Vec<Partial> {
    let mut out = Vec::new();
    if prefixes.is_empty() || children.is_empty() {
        return out;
    }
    let cost = |i: usize, j: usize| prefixes[i].penalty.saturating_add(children[j].penalty());

    let mut frontier = BinaryHeap::new();
    let mut seen = FxHashSet::default();
    frontier.push(Reverse((cost(0, 0), 0, 0)));
    seen.insert((0, 0));
    while let Some(Reverse((penalty, i, j))) = frontier.pop() {
        if penalty > max_penalty || out.len() >= limit {
            break;
        }
        out.push(prefixes[i].with(&children[j]));
        for (i, j) in [(i + 1, j), (i, j + 1)] {
            if i < prefixes.len() && j < children.len() && seen.insert((i, j)) {
                frontier.push(Reverse((cost(i, j), i, j)));
            }
        }
    }
    out
}

fn shallowest(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}
