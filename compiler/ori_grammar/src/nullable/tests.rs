use crate::{Grammar, GrammarOptions, Symbol};
use pretty_assertions::assert_eq;

fn strict() -> Grammar {
    Grammar::with_options(GrammarOptions::strict())
}

#[test]
fn test_explicit_empty_production_is_nullable() {
    let grammar = strict();
    let a = grammar.define_rule("A").unwrap();
    grammar.add_production(a, ['x'.into()]).unwrap();
    assert!(!grammar.is_nullable(a).unwrap());

    grammar.add_production(a, [Symbol::Empty]).unwrap();
    assert!(grammar.is_nullable(a).unwrap());
}

#[test]
fn test_zero_productions_is_nullable() {
    let grammar = strict();
    let a = grammar.rule("undefined").unwrap();
    assert!(grammar.is_nullable(a).unwrap());
}

#[test]
fn test_left_recursion_is_not_nullable() {
    // E ::= E '+' E | 'n'
    let grammar = strict();
    let e = grammar.define_rule("E").unwrap();
    grammar.add_production(e, [e.into(), '+'.into(), e.into()]).unwrap();
    grammar.add_production(e, ['n'.into()]).unwrap();
    assert!(!grammar.is_nullable(e).unwrap());
}

#[test]
fn test_mutual_recursion_without_base_is_not_nullable() {
    // A ::= B 'x'   B ::= A
    let grammar = strict();
    let a = grammar.define_rule("A").unwrap();
    let b = grammar.define_rule("B").unwrap();
    grammar.add_production(a, [b.into(), 'x'.into()]).unwrap();
    grammar.add_production(b, [a.into()]).unwrap();
    assert!(!grammar.is_nullable(a).unwrap());
    assert!(!grammar.is_nullable(b).unwrap());
}

#[test]
fn test_nullability_propagates_through_chains() {
    // A ::= B C   B ::= ε   C ::= B | 'c'
    let grammar = strict();
    let a = grammar.define_rule("A").unwrap();
    let b = grammar.define_rule("B").unwrap();
    let c = grammar.define_rule("C").unwrap();
    grammar.add_production(a, [b.into(), c.into()]).unwrap();
    grammar.add_production(c, ['c'.into()]).unwrap();
    grammar.add_production(b, ['b'.into()]).unwrap();
    assert!(!grammar.is_nullable(a).unwrap());

    // a later rule changes an earlier answer
    grammar.add_production(b, [Symbol::Empty]).unwrap();
    grammar.add_production(c, [b.into()]).unwrap();
    assert!(grammar.is_nullable(a).unwrap());
    assert!(grammar.is_production_nullable(&[b.into(), c.into()]));
    assert!(!grammar.is_production_nullable(&[b.into(), 'c'.into()]));
}

#[test]
fn test_groups() {
    let grammar = strict();
    let optional = grammar.optional(['x'.into()]).unwrap();
    let plus = grammar.plus(['x'.into()]).unwrap();
    let empty = grammar.define_rule("E").unwrap();
    grammar.add_production(empty, []).unwrap();
    let plus_empty = grammar.plus([empty.into()]).unwrap();

    assert!(grammar.group_def(optional).unwrap().is_nullable());
    assert!(!grammar.group_def(plus).unwrap().is_nullable());
    let def = grammar.group_def(plus_empty).unwrap();
    assert!(def.is_nullable());
    assert!(def.is_production_nullable());
}

#[test]
fn test_reanalysis_is_idempotent() {
    let grammar = strict();
    let a = grammar.define_rule("A").unwrap();
    let b = grammar.define_rule("B").unwrap();
    grammar.add_production(a, [a.into(), b.into()]).unwrap();
    grammar.add_production(b, [Symbol::Empty]).unwrap();

    let before: Vec<bool> = (0..grammar.rule_count())
        .map(|i| grammar.is_nullable(crate::RuleId::new(i as u32)).unwrap())
        .collect();
    assert_eq!(grammar.analyze_nullability(), 0);
    let after: Vec<bool> = (0..grammar.rule_count())
        .map(|i| grammar.is_nullable(crate::RuleId::new(i as u32)).unwrap())
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_null_penalty_of_tolerant_rule() {
    let grammar = Grammar::new();
    let a = grammar.define_rule("A").unwrap();
    grammar.add_production(a, ['x'.into(), 'y'.into()]).unwrap();

    // Both terminals can be synthesized, one point each.
    let snapshot = grammar.snapshot();
    assert!(grammar.is_nullable(a).unwrap());
    assert_eq!(snapshot.null_penalty(Symbol::Rule(a)), Some(2));
    assert_eq!(snapshot.null_penalty(Symbol::Rule(grammar.penalty_empty_rule())), Some(1));
    assert_eq!(snapshot.null_penalty(Symbol::Rule(grammar.penalty_rule())), None);
}

#[test]
fn test_rule_penalty_counts_towards_null_penalty() {
    let grammar = strict();
    let a = grammar.define_rule("A").unwrap();
    grammar.add_production(a, [Symbol::Empty]).unwrap();
    grammar.set_rule_penalty(a, 3).unwrap();
    assert_eq!(grammar.snapshot().null_penalty(Symbol::Rule(a)), Some(3));
}
