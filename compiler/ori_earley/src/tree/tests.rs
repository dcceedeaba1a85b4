use super::*;
use ori_grammar::TerminalId;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn leaf(c: char, index: usize) -> Rc<ParseNode> {
    Rc::new(ParseNode::token(Token::char(c), index))
}

fn rule(rule: RuleId, span: Span, penalty: u32, children: Vec<Rc<ParseNode>>) -> Rc<ParseNode> {
    Rc::new(ParseNode::interior(
        NodeKind::Rule {
            rule,
            production: Some(0),
        },
        span,
        penalty,
        children,
    ))
}

#[test]
fn test_span() {
    let span = Span::new(2, 5);
    assert_eq!(span.len(), 3);
    assert!(!span.is_empty());
    assert!(Span::new(4, 4).is_empty());
    assert_eq!(span.to_string(), "2..5");
}

#[test]
fn test_leaves_and_skipped_tokens() {
    let grammar = Grammar::new();
    let s = grammar.define_rule("S").unwrap();
    let skip = grammar.penalty_rule();

    let skipped = rule(skip, Span::new(1, 2), 1, vec![leaf('x', 1)]);
    let root = rule(s, Span::new(0, 3), 1, vec![leaf('a', 0), skipped, leaf('b', 2)]);
    let tree = ParseTree::new(root, skip, grammar.penalty_empty_rule());

    let leaves: Vec<(Option<char>, usize, bool)> = tree
        .tokens()
        .into_iter()
        .map(|leaf| (leaf.token.ch(), leaf.index, leaf.skipped))
        .collect();
    assert_eq!(
        leaves,
        vec![(Some('a'), 0, false), (Some('x'), 1, true), (Some('b'), 2, false)]
    );
    let matched: Vec<TerminalId> = tree.matched_tokens().iter().map(Token::id).collect();
    assert_eq!(
        matched,
        vec![TerminalId::from_char('a'), TerminalId::from_char('b')]
    );
    assert_eq!(tree.root().leaves().len(), 3);
    assert_eq!(tree.penalty(), 1);
}

#[test]
fn test_user_data_lookup() {
    let grammar = Grammar::new();
    let s = grammar.define_rule("S").unwrap();
    grammar.set_user_data(UserKey::Rule(s), Arc::new("statement"));
    grammar.set_user_data(UserKey::Terminal(TerminalId::from_char('a')), Arc::new(1u8));

    let token = leaf('a', 0);
    let node = rule(s, Span::new(0, 1), 0, vec![Rc::clone(&token)]);

    let data = node.user_data(&grammar).unwrap();
    assert_eq!(data.downcast_ref::<&str>(), Some(&"statement"));
    let data = token.user_data(&grammar).unwrap();
    assert_eq!(data.downcast_ref::<u8>(), Some(&1));

    let group = Rc::new(ParseNode::interior(
        NodeKind::Group(grammar.star(['a'.into()]).unwrap()),
        Span::new(0, 0),
        0,
        Vec::new(),
    ));
    assert!(group.user_key().is_none());
}

#[test]
fn test_dump() {
    let grammar = Grammar::new();
    let s = grammar.define_rule("S").unwrap();
    let root = rule(s, Span::new(0, 2), 0, vec![leaf('a', 0), leaf('b', 1)]);
    let tree = ParseTree::new(root, grammar.penalty_rule(), grammar.penalty_empty_rule());
    assert_eq!(tree.dump(&grammar), "S 0..2\n  'a' 0..1\n  'b' 1..2\n");
}
