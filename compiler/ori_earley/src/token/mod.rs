//! Token sources.
//!
//! The recognizer pulls one [`Token`] per state from a [`TokenSource`]. Two
//! sources ship with the engine: [`FnSource`] wraps a tokenizer callback and
//! [`TokenList`] replays a pre-built list (typically one token per codepoint
//! of a string).

use ori_grammar::{Grammar, TerminalId, UserData};
use std::fmt;

/// One input token.
///
/// `ch` is the codepoint the token was read from, if any. Character classes
/// match against it, which lets an `UNKNOWN` token still satisfy `<digit>`.
#[derive(Clone)]
pub struct Token {
    id: TerminalId,
    ch: Option<char>,
    payload: Option<UserData>,
}

impl Token {
    /// End of input.
    pub const END: Token = Token {
        id: TerminalId::END,
        ch: None,
        payload: None,
    };

    /// A codepoint token.
    pub fn char(c: char) -> Self {
        Token {
            id: TerminalId::from_char(c),
            ch: Some(c),
            payload: None,
        }
    }

    /// A token for a registered terminal.
    pub fn symbol(id: TerminalId) -> Self {
        Token {
            id,
            ch: id.as_char(),
            payload: None,
        }
    }

    /// A token the tokenizer could not classify.
    pub fn unknown(ch: Option<char>) -> Self {
        Token {
            id: TerminalId::UNKNOWN,
            ch,
            payload: None,
        }
    }

    /// Attach an opaque payload, returned untouched in parse trees.
    #[must_use]
    pub fn with_payload(mut self, payload: UserData) -> Self {
        self.payload = Some(payload);
        self
    }

    #[inline]
    pub fn id(&self) -> TerminalId {
        self.id
    }

    #[inline]
    pub fn ch(&self) -> Option<char> {
        self.ch
    }

    pub fn payload(&self) -> Option<&UserData> {
        self.payload.as_ref()
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.id == TerminalId::END
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Token");
        s.field("id", &self.id);
        if self.ch.is_some() && self.ch != self.id.as_char() {
            s.field("ch", &self.ch);
        }
        if self.payload.is_some() {
            s.field("payload", &"..");
        }
        s.finish()
    }
}

/// Pull-based token supply. Returns [`Token::END`] once input is exhausted,
/// and keeps returning it.
pub trait TokenSource {
    fn next_token(&mut self) -> Token;
}

/// A token source backed by a tokenizer callback.
pub struct FnSource<F>(F);

impl<F: FnMut() -> Token> FnSource<F> {
    pub fn new(next: F) -> Self {
        FnSource(next)
    }
}

impl<F: FnMut() -> Token> TokenSource for FnSource<F> {
    fn next_token(&mut self) -> Token {
        (self.0)()
    }
}

/// A pre-materialized token list.
#[derive(Clone, Debug, Default)]
pub struct TokenList {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenList {
    pub fn new(tokens: Vec<Token>) -> Self {
        TokenList {
            tokens,
            position: 0,
        }
    }

    /// One token per codepoint.
    pub fn from_chars(text: &str) -> Self {
        text.chars().map(Token::char).collect()
    }

    /// One token per word. Words the grammar knows become their terminal,
    /// anything else becomes `UNKNOWN` (keeping its character when the word
    /// is a single codepoint).
    pub fn from_symbols<'a>(grammar: &Grammar, words: impl IntoIterator<Item = &'a str>) -> Self {
        words
            .into_iter()
            .map(|word| match grammar.lookup_terminal(word) {
                Some(id) => Token::symbol(id),
                None => {
                    let mut chars = word.chars();
                    let single = match (chars.next(), chars.next()) {
                        (Some(c), None) => Some(c),
                        _ => None,
                    };
                    Token::unknown(single)
                }
            })
            .collect()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Start over from the first token.
    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

impl FromIterator<Token> for TokenList {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        TokenList::new(iter.into_iter().collect())
    }
}

impl TokenSource for TokenList {
    fn next_token(&mut self) -> Token {
        match self.tokens.get(self.position) {
            Some(token) => {
                self.position += 1;
                token.clone()
            }
            None => Token::END,
        }
    }
}
