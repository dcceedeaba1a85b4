//! Earley states.

use crate::item::{EarleyItem, ItemKey};
use crate::token::Token;
use ori_grammar::{GroupId, RuleId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// What a waiting item's cursor sits before.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub(crate) enum Waiting {
    Rule(RuleId),
    Group(GroupId),
    Instance(GroupId),
}

/// All items valid after consuming a prefix of the input.
#[derive(Debug, Default)]
pub struct EarleyState {
    /// The token consumed to reach this state; `None` for the first state.
    token: Option<Token>,
    pub(crate) items: Vec<EarleyItem>,
    pub(crate) index: FxHashMap<ItemKey, u32>,
    pub(crate) waiting: FxHashMap<Waiting, SmallVec<[u32; 4]>>,
    pub(crate) scanners: Vec<u32>,
}

impl EarleyState {
    pub(crate) fn new(token: Option<Token>) -> Self {
        EarleyState {
            token,
            ..EarleyState::default()
        }
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn items(&self) -> &[EarleyItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items waiting on `waiting`, in creation order.
    pub(crate) fn waiters(&self, waiting: Waiting) -> SmallVec<[u32; 4]> {
        self.waiting.get(&waiting).cloned().unwrap_or_default()
    }
}
