//! Parse trees.
//!
//! Trees share subtrees through `Rc`: a forest of ambiguous parses holds each
//! common subtree once. Repairs made by the fault-tolerant grammar stay
//! visible: skipped tokens sit under the skip rule and synthesized tokens are
//! wrapper nodes that matched nothing.

use crate::token::Token;
use ori_grammar::{Grammar, GroupId, RuleId, Symbol, UserData, UserKey};
use std::fmt::{self, Write};
use std::rc::Rc;

/// Half-open token range `[start, end)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    /// A consumed token.
    Token(Token),
    /// A rule derivation. `production` is `None` only for rules that have no
    /// productions and therefore match nothing.
    Rule {
        rule: RuleId,
        production: Option<u32>,
    },
    /// A whole group; children are its instances.
    Group(GroupId),
    /// One repetition of a group's sub-production.
    Instance(GroupId),
}

#[derive(Clone, Debug)]
pub struct ParseNode {
    kind: NodeKind,
    span: Span,
    penalty: u32,
    children: Vec<Rc<ParseNode>>,
}

impl ParseNode {
    pub(crate) fn token(token: Token, index: usize) -> Self {
        ParseNode {
            kind: NodeKind::Token(token),
            span: Span::new(index, index + 1),
            penalty: 0,
            children: Vec::new(),
        }
    }

    pub(crate) fn interior(
        kind: NodeKind,
        span: Span,
        penalty: u32,
        children: Vec<Rc<ParseNode>>,
    ) -> Self {
        ParseNode {
            kind,
            span,
            penalty,
            children,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Penalty of this subtree: the node's own rule penalty plus its
    /// children's.
    pub fn penalty(&self) -> u32 {
        self.penalty
    }

    pub fn children(&self) -> &[Rc<ParseNode>] {
        &self.children
    }

    pub fn as_token(&self) -> Option<&Token> {
        match &self.kind {
            NodeKind::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn rule(&self) -> Option<RuleId> {
        match self.kind {
            NodeKind::Rule { rule, .. } => Some(rule),
            _ => None,
        }
    }

    /// Key under which a grammar stores user data for this node.
    pub fn user_key(&self) -> Option<UserKey> {
        match &self.kind {
            NodeKind::Token(token) => Some(UserKey::Terminal(token.id())),
            NodeKind::Rule { rule, .. } => Some(UserKey::Rule(*rule)),
            NodeKind::Group(_) | NodeKind::Instance(_) => None,
        }
    }

    /// Data attached to this node's rule or terminal.
    pub fn user_data(&self, grammar: &Grammar) -> Option<UserData> {
        grammar.user_data(self.user_key()?)
    }

    /// Token leaves, left to right.
    pub fn leaves(&self) -> Vec<&ParseNode> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.as_token().is_some() {
                leaves.push(node);
            }
            stack.extend(node.children.iter().rev().map(|child| &**child));
        }
        leaves
    }
}

/// A token of the input as it appears in a tree.
#[derive(Clone, Debug)]
pub struct Leaf {
    pub token: Token,
    pub index: usize,
    /// The token was consumed by the skip rule rather than by the grammar.
    pub skipped: bool,
}

/// A token the fault-tolerant grammar synthesized.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Insertion {
    /// Token index the missing symbol was assumed at.
    pub position: usize,
    pub symbol: Symbol,
}

/// A complete parse of the input.
#[derive(Clone, Debug)]
pub struct ParseTree {
    root: Rc<ParseNode>,
    skip_rule: RuleId,
    insert_rule: RuleId,
}

impl ParseTree {
    pub(crate) fn new(root: Rc<ParseNode>, skip_rule: RuleId, insert_rule: RuleId) -> Self {
        ParseTree {
            root,
            skip_rule,
            insert_rule,
        }
    }

    pub fn root(&self) -> &ParseNode {
        &self.root
    }

    pub fn penalty(&self) -> u32 {
        self.root.penalty
    }

    pub fn span(&self) -> Span {
        self.root.span
    }

    /// Every consumed token in input order, flagged when it was skipped.
    pub fn tokens(&self) -> Vec<Leaf> {
        let mut leaves = Vec::new();
        let mut stack = vec![(&*self.root, false)];
        while let Some((node, skipped)) = stack.pop() {
            if let NodeKind::Token(token) = &node.kind {
                leaves.push(Leaf {
                    token: token.clone(),
                    index: node.span.start,
                    skipped,
                });
                continue;
            }
            let skipped = skipped || node.rule() == Some(self.skip_rule);
            stack.extend(node.children.iter().rev().map(|child| (&**child, skipped)));
        }
        leaves
    }

    /// Tokens the grammar consumed, skipping repairs.
    pub fn matched_tokens(&self) -> Vec<Token> {
        self.tokens()
            .into_iter()
            .filter(|leaf| !leaf.skipped)
            .map(|leaf| leaf.token)
            .collect()
    }

    /// Symbols assumed present though the input lacked them.
    pub fn insertions(&self, grammar: &Grammar) -> Vec<Insertion> {
        let mut insertions = Vec::new();
        let mut stack = vec![&*self.root];
        while let Some(node) = stack.pop() {
            if let Some(rule) = node.rule() {
                let synthesized = node
                    .children
                    .iter()
                    .any(|child| child.rule() == Some(self.insert_rule));
                if synthesized {
                    if let Some(symbol) = grammar.tolerant_symbol(rule) {
                        insertions.push(Insertion {
                            position: node.span.start,
                            symbol,
                        });
                    }
                }
            }
            stack.extend(node.children.iter().rev().map(|child| &**child));
        }
        insertions
    }

    /// Indented rendering, one node per line.
    pub fn dump(&self, grammar: &Grammar) -> String {
        let mut out = String::new();
        grammar.with_symbol_writer(|writer| {
            let mut stack = vec![(&*self.root, 0usize)];
            while let Some((node, depth)) = stack.pop() {
                let _ = write!(out, "{:indent$}", "", indent = depth * 2);
                let _ = match &node.kind {
                    NodeKind::Token(token) => match token.id().as_char() {
                        Some(c) => write!(out, "{c:?}"),
                        None => writer.symbol(&mut out, Symbol::Terminal(token.id())),
                    },
                    NodeKind::Rule { rule, .. } => out.write_str(&writer.rule_name(rule.index())),
                    NodeKind::Group(group) => writer.symbol(&mut out, Symbol::Group(*group)),
                    NodeKind::Instance(group) => write!(out, "{group:?} item"),
                };
                let _ = write!(out, " {}", node.span);
                if node.penalty > 0 {
                    let _ = write!(out, " penalty {}", node.penalty);
                }
                out.push('\n');
                stack.extend(node.children.iter().rev().map(|child| (&**child, depth + 1)));
            }
        });
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
