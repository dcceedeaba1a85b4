//! Property-based tests for recognition and tree building.
//!
//! 1. A strict grammar accepts exactly its language.
//! 2. A tolerant grammar accepts any input ending in a terminal it knows
//!    (stray tokens are skipped before a match, never after the last one),
//!    and its best tree still accounts for every input token, in order.
//! 3. Well-formed input always has a repair-free best tree.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(
    clippy::doc_markdown,
    clippy::uninlined_format_args,
    reason = "Proptest macros generate code with these patterns"
)]

use ori_earley::{Parser, ParserConfig};
use ori_grammar::{Grammar, GrammarOptions, Symbol};
use proptest::prelude::*;

/// `S ::= 'a' S 'b' | ε`
fn balanced(options: GrammarOptions) -> Grammar {
    let grammar = Grammar::with_options(options);
    let s = grammar.define_rule("S").unwrap();
    grammar
        .add_production(s, ['a'.into(), s.into(), 'b'.into()])
        .unwrap();
    grammar.add_production(s, [Symbol::Empty]).unwrap();
    grammar.set_start(s).unwrap();
    grammar
}

fn is_balanced(text: &str) -> bool {
    let n = text.len() / 2;
    text.len() % 2 == 0 && text[..n].bytes().all(|b| b == b'a') && text[n..].bytes().all(|b| b == b'b')
}

proptest! {
    #[test]
    fn strict_grammar_accepts_its_language(text in "[ab]{0,12}") {
        let grammar = balanced(GrammarOptions::strict());
        let mut parser = Parser::new(&grammar, ParserConfig::default());
        let outcome = parser.parse_str(&text).unwrap();
        prop_assert_eq!(outcome.accepted, is_balanced(&text));
        prop_assert_eq!(parser.best_tree().is_some(), outcome.accepted);
    }

    #[test]
    fn tolerant_best_tree_covers_the_input(text in "([abc]{0,7}[ab])?") {
        let grammar = balanced(GrammarOptions::default());
        let config = ParserConfig::default().with_max_penalty(u32::MAX);
        let mut parser = Parser::new(&grammar, config);
        prop_assert!(parser.parse_str(&text).unwrap().accepted);

        let tree = parser.best_tree().unwrap();
        let leaves = tree.tokens();
        let rebuilt: String = leaves.iter().filter_map(|leaf| leaf.token.ch()).collect();
        prop_assert_eq!(&rebuilt, &text);
        let indices: Vec<usize> = leaves.iter().map(|leaf| leaf.index).collect();
        prop_assert_eq!(indices, (0..text.len()).collect::<Vec<_>>());
        prop_assert_eq!(tree.penalty() == 0, is_balanced(&text));
    }

    #[test]
    fn well_formed_input_needs_no_repair(n in 0usize..10) {
        let text = format!("{}{}", "a".repeat(n), "b".repeat(n));
        let grammar = balanced(GrammarOptions::default());
        let mut parser = Parser::new(&grammar, ParserConfig::exact());
        parser.parse_str(&text).unwrap();
        let tree = parser.best_tree().unwrap();
        prop_assert_eq!(tree.penalty(), 0);
        prop_assert!(tree.insertions(&grammar).is_empty());
        prop_assert_eq!(parser.forest().len(), 1);
    }
}
