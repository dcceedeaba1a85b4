//! Production items.

use crate::{GroupId, RuleId, SetId, TerminalId};
use std::fmt;

/// Builtin character classes.
///
/// Classes match against the codepoint a token was read from, so they also
/// match `UNKNOWN` tokens that carry their source character.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum CharClass {
    Digit,
    HexDigit,
    Lower,
    Upper,
    Alpha,
    Alnum,
    /// Identifier start: alphabetic or `_`.
    IdStart,
    /// Identifier continuation: alphanumeric or `_`.
    IdContinue,
    Whitespace,
    Punctuation,
}

impl CharClass {
    pub fn matches(self, c: char) -> bool {
        match self {
            CharClass::Digit => c.is_ascii_digit(),
            CharClass::HexDigit => c.is_ascii_hexdigit(),
            CharClass::Lower => c.is_lowercase(),
            CharClass::Upper => c.is_uppercase(),
            CharClass::Alpha => c.is_alphabetic(),
            CharClass::Alnum => c.is_alphanumeric(),
            CharClass::IdStart => c == '_' || c.is_alphabetic(),
            CharClass::IdContinue => c == '_' || c.is_alphanumeric(),
            CharClass::Whitespace => c.is_whitespace(),
            CharClass::Punctuation => c.is_ascii_punctuation(),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            CharClass::Digit => "digit",
            CharClass::HexDigit => "hexdigit",
            CharClass::Lower => "lower",
            CharClass::Upper => "upper",
            CharClass::Alpha => "alpha",
            CharClass::Alnum => "alnum",
            CharClass::IdStart => "idstart",
            CharClass::IdContinue => "idcontinue",
            CharClass::Whitespace => "whitespace",
            CharClass::Punctuation => "punct",
        }
    }
}

/// One item of a production.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Symbol {
    /// Explicit epsilon.
    Empty,
    Rule(RuleId),
    Terminal(TerminalId),
    /// Any single token except end of input.
    Any,
    Class(CharClass),
    Set(SetId),
    Group(GroupId),
}

impl Symbol {
    /// Symbols that consume exactly one token. These are the usages the
    /// fault-tolerant rewriter wraps.
    #[inline]
    pub const fn is_terminal_like(self) -> bool {
        matches!(
            self,
            Symbol::Terminal(_) | Symbol::Any | Symbol::Class(_) | Symbol::Set(_)
        )
    }
}

impl From<RuleId> for Symbol {
    fn from(rule: RuleId) -> Self {
        Symbol::Rule(rule)
    }
}

impl From<TerminalId> for Symbol {
    fn from(terminal: TerminalId) -> Self {
        Symbol::Terminal(terminal)
    }
}

impl From<GroupId> for Symbol {
    fn from(group: GroupId) -> Self {
        Symbol::Group(group)
    }
}

impl From<CharClass> for Symbol {
    fn from(class: CharClass) -> Self {
        Symbol::Class(class)
    }
}

impl From<char> for Symbol {
    fn from(c: char) -> Self {
        Symbol::Terminal(TerminalId::from_char(c))
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name())
    }
}

/// A member of a terminal set.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum SetMember {
    Terminal(TerminalId),
    Any,
    Class(CharClass),
}

impl SetMember {
    /// Whether this member accepts a token with the given id and source
    /// character.
    pub fn matches(self, id: TerminalId, ch: Option<char>) -> bool {
        if id == TerminalId::END {
            return false;
        }
        match self {
            SetMember::Terminal(t) => t == id,
            SetMember::Any => true,
            SetMember::Class(class) => ch.is_some_and(|c| class.matches(c)),
        }
    }
}

impl TryFrom<Symbol> for SetMember {
    type Error = Symbol;

    fn try_from(symbol: Symbol) -> Result<Self, Symbol> {
        match symbol {
            Symbol::Terminal(t) => Ok(SetMember::Terminal(t)),
            Symbol::Any => Ok(SetMember::Any),
            Symbol::Class(class) => Ok(SetMember::Class(class)),
            other => Err(other),
        }
    }
}
