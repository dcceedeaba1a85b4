//! Earley items.
//!
//! Items live in per-state vectors and refer to each other through
//! [`ItemRef`] handles, never through owning pointers. An item is only
//! extended while its own state is being processed, so once a later state
//! references it, it no longer changes.

use ori_grammar::{CharClass, GroupId, RuleId, SetId, TerminalId};
use smallvec::SmallVec;
use std::fmt;

/// Handle to an item: state index plus position in that state's item list.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ItemRef {
    state: u32,
    index: u32,
}

impl ItemRef {
    #[inline]
    pub const fn new(state: u32, index: u32) -> Self {
        ItemRef { state, index }
    }

    #[inline]
    pub const fn state(self) -> usize {
        self.state as usize
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Debug for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}#{}", self.state, self.index)
    }
}

/// What an item is recognizing. This is also the subtree boundary the forest
/// builder uses: one node per completed rule, group or instance.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Owner {
    /// A production of a rule; `dot` walks its symbols.
    Rule { rule: RuleId, production: u32 },
    /// The repetition wrapper of a group; `count` tracks matched instances.
    Group(GroupId),
    /// One instance of a group's sub-production; `dot` walks its symbols.
    Instance(GroupId),
}

/// The operation an item performs, fixed when the item is created.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Operation {
    PredictNonTerminal(RuleId),
    PredictGroup(GroupId),
    /// A group wrapper that may start another instance.
    PredictGroupItem(GroupId),
    ScanNull,
    ScanToken(TerminalId),
    ScanAny,
    ScanClass(CharClass),
    ScanSet(SetId),
    CompleteNonTerminal(RuleId),
    /// An instance of a group's sub-production reached its end.
    CompleteItem(GroupId),
    /// A group wrapper holding at least `min` instances.
    CompleteGroup(GroupId),
}

impl Operation {
    #[inline]
    pub const fn is_scan(self) -> bool {
        matches!(
            self,
            Operation::ScanToken(_)
                | Operation::ScanAny
                | Operation::ScanClass(_)
                | Operation::ScanSet(_)
        )
    }

    #[inline]
    pub const fn is_complete(self) -> bool {
        matches!(
            self,
            Operation::CompleteNonTerminal(_)
                | Operation::CompleteItem(_)
                | Operation::CompleteGroup(_)
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            Operation::PredictNonTerminal(_) => "predict-nt",
            Operation::PredictGroup(_) => "predict-group",
            Operation::PredictGroupItem(_) => "predict-item",
            Operation::ScanNull => "scan-null",
            Operation::ScanToken(_) => "scan-token",
            Operation::ScanAny => "scan-any",
            Operation::ScanClass(_) => "scan-class",
            Operation::ScanSet(_) => "scan-set",
            Operation::CompleteNonTerminal(_) => "complete-nt",
            Operation::CompleteItem(_) => "complete-item",
            Operation::CompleteGroup(_) => "complete-group",
        }
    }
}

/// A symbol advanced over by prediction because it can match nothing.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NullTarget {
    Rule(RuleId),
    Group(GroupId),
    Instance(GroupId),
}

/// What the step from `prev` to this item consumed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Child {
    /// The token that led into this item's state.
    Token,
    /// An explicit epsilon.
    Empty,
    /// A nullable symbol, resolved to its empty derivations when trees are
    /// built.
    Null(NullTarget),
    /// A completed item of the symbol before the cursor.
    Completed(ItemRef),
}

/// One way of reaching an item. Several links on one item mean ambiguity.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Link {
    pub prev: ItemRef,
    pub child: Child,
}

/// Identity of an item within a state.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub(crate) struct ItemKey {
    pub owner: Owner,
    pub dot: u32,
    pub origin: u32,
    pub count: u32,
    pub op: Operation,
}

#[derive(Clone, Debug)]
pub struct EarleyItem {
    pub(crate) owner: Owner,
    pub(crate) dot: u32,
    pub(crate) origin: u32,
    pub(crate) count: u32,
    pub(crate) op: Operation,
    /// Lowest penalty among the links seen so far. Later improvements are
    /// not pushed to items already derived from this one.
    pub(crate) penalty: u32,
    /// The first item of this derivation (dot 0 / count 0).
    pub(crate) start: ItemRef,
    pub(crate) predictors: SmallVec<[ItemRef; 2]>,
    pub(crate) predicted: SmallVec<[ItemRef; 4]>,
    pub(crate) completed: SmallVec<[ItemRef; 2]>,
    pub(crate) links: SmallVec<[Link; 1]>,
}

impl EarleyItem {
    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn dot(&self) -> u32 {
        self.dot
    }

    pub fn origin(&self) -> usize {
        self.origin as usize
    }

    /// Matched instances, for group wrappers.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn operation(&self) -> Operation {
        self.op
    }

    pub fn penalty(&self) -> u32 {
        self.penalty
    }

    pub fn start(&self) -> ItemRef {
        self.start
    }

    /// Items whose prediction produced this one.
    pub fn predictors(&self) -> &[ItemRef] {
        &self.predictors
    }

    /// Items this one predicted.
    pub fn predicted(&self) -> &[ItemRef] {
        &self.predicted
    }

    /// Items this one advanced by completing.
    pub fn completed(&self) -> &[ItemRef] {
        &self.completed
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }
}
