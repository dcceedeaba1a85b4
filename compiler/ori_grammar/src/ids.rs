//! Compact identifiers for grammar entities.
//!
//! Every entity a grammar owns is addressed by a `u32` newtype. Ids are
//! assigned once and never reused, so downstream caches may key on them for
//! the lifetime of the grammar.

use std::fmt;

/// Defines a dense index newtype with the usual accessors.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            /// Index into the owning table.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }
    };
}

define_id!(
    /// Non-terminal (ruleset) identifier.
    RuleId,
    "RuleId"
);

define_id!(
    /// Bounded-repetition group identifier.
    GroupId,
    "GroupId"
);

define_id!(
    /// Terminal set identifier. Sets are content-addressed, so equal member
    /// lists always share one id.
    SetId,
    "SetId"
);

/// Terminal identifier.
///
/// # Layout
/// - `0..=0x10_FFFF`: single-codepoint terminals, the id *is* the codepoint
/// - `FIRST_SYMBOL..`: registered multi-character symbols
/// - `UNKNOWN`, `END`: reserved sentinels produced by token sources
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct TerminalId(u32);

impl TerminalId {
    /// First id handed out to registered text symbols.
    pub const FIRST_SYMBOL: u32 = 0x11_0000;

    /// Token the tokenizer could not classify. Only `any`, classes and sets
    /// can match it.
    pub const UNKNOWN: TerminalId = TerminalId(u32::MAX - 1);

    /// End of input.
    pub const END: TerminalId = TerminalId(u32::MAX);

    #[inline]
    pub const fn new(raw: u32) -> Self {
        TerminalId(raw)
    }

    #[inline]
    pub const fn from_char(c: char) -> Self {
        TerminalId(c as u32)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The codepoint this terminal stands for, if it is a codepoint terminal.
    #[inline]
    pub fn as_char(self) -> Option<char> {
        if self.0 < Self::FIRST_SYMBOL {
            char::from_u32(self.0)
        } else {
            None
        }
    }

    #[inline]
    pub const fn is_sentinel(self) -> bool {
        self.0 >= Self::UNKNOWN.0
    }
}

impl fmt::Debug for TerminalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::END => write!(f, "TerminalId::END"),
            Self::UNKNOWN => write!(f, "TerminalId::UNKNOWN"),
            id => match id.as_char() {
                Some(c) => write!(f, "TerminalId({c:?})"),
                None => write!(f, "TerminalId({})", id.0),
            },
        }
    }
}

#[cfg(test)]
mod tests;
