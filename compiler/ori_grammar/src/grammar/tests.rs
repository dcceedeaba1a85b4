use super::*;
use pretty_assertions::assert_eq;
use rayon::prelude::*;

#[test]
fn test_codepoint_terminals_need_no_registration() {
    let grammar = Grammar::new();
    assert_eq!(grammar.terminal("a").unwrap(), TerminalId::from_char('a'));
    assert_eq!(grammar.char_terminal('é'), TerminalId::from_char('é'));
    assert_eq!(grammar.terminal_text(TerminalId::from_char('a')).as_deref(), Some("a"));
}

#[test]
fn test_symbol_terminal_is_idempotent() {
    let grammar = Grammar::new();
    let first = grammar.terminal("if").unwrap();
    let second = grammar.terminal("if").unwrap();
    let other = grammar.terminal("else").unwrap();

    assert_eq!(first, second);
    assert_ne!(first, other);
    assert_eq!(first.raw(), TerminalId::FIRST_SYMBOL);
    assert_eq!(grammar.terminal_text(other).as_deref(), Some("else"));
    assert_eq!(grammar.lookup_terminal("if"), Some(first));
    assert_eq!(grammar.lookup_terminal("while"), None);
}

#[test]
fn test_empty_terminal_rejected() {
    let grammar = Grammar::new();
    assert_eq!(grammar.terminal(""), Err(GrammarError::EmptyTerminal));
}

#[test]
fn test_penalty_rules_exist_from_the_start() {
    let grammar = Grammar::new();
    assert_eq!(grammar.rule_count(), 2);
    assert!(!grammar.is_nullable(grammar.penalty_rule()).unwrap());
    assert!(grammar.is_nullable(grammar.penalty_empty_rule()).unwrap());
}

#[test]
fn test_rule_reference_then_definition() {
    let grammar = Grammar::new();
    let referenced = grammar.rule("expr").unwrap();
    let defined = grammar.define_rule("expr").unwrap();
    assert_eq!(referenced, defined);
    assert_eq!(grammar.lookup_rule("expr"), Some(defined));
    assert_eq!(grammar.rule_name(defined).as_deref(), Some("expr"));
}

#[test]
fn test_duplicate_named_rule_is_an_error() {
    let grammar = Grammar::new();
    grammar.define_rule("stmt").unwrap();
    assert_eq!(
        grammar.define_rule("stmt"),
        Err(GrammarError::DuplicateRule {
            name: "stmt".to_string()
        })
    );
}

#[test]
fn test_anonymous_rules_are_never_shared() {
    let grammar = Grammar::new();
    let a = grammar.anonymous_rule().unwrap();
    let b = grammar.anonymous_rule().unwrap();
    assert_ne!(a, b);
    assert_eq!(grammar.rule_name(a), None);
}

#[test]
fn test_add_production_rewrites_terminals() {
    let grammar = Grammar::new();
    let s = grammar.define_rule("S").unwrap();
    grammar.add_production(s, ['a'.into(), s.into()]).unwrap();

    let productions = grammar.productions(s).unwrap();
    let Symbol::Rule(wrapper) = productions[0][0] else {
        panic!("terminal was not rewritten: {:?}", productions[0]);
    };
    assert_eq!(productions[0][1], Symbol::Rule(s));
    assert_eq!(
        grammar.tolerant_symbol(wrapper),
        Some(Symbol::Terminal(TerminalId::from_char('a')))
    );

    let wrapper_productions = grammar.productions(wrapper).unwrap();
    assert_eq!(wrapper_productions.len(), 3);
    assert_eq!(&*wrapper_productions[0], &[Symbol::from('a')]);
    assert_eq!(
        &*wrapper_productions[1],
        &[Symbol::Rule(grammar.penalty_rule()), Symbol::from('a')]
    );
    assert_eq!(
        &*wrapper_productions[2],
        &[Symbol::Rule(grammar.penalty_empty_rule())]
    );
}

#[test]
fn test_strict_grammar_keeps_terminals() {
    let grammar = Grammar::with_options(GrammarOptions::strict());
    let s = grammar.define_rule("S").unwrap();
    grammar.add_production(s, ['a'.into()]).unwrap();
    assert_eq!(&*grammar.productions(s).unwrap()[0], &[Symbol::from('a')]);
}

#[test]
fn test_unknown_references_rejected() {
    let grammar = Grammar::new();
    let s = grammar.define_rule("S").unwrap();
    let bogus = RuleId::new(999);
    assert_eq!(
        grammar.add_production(s, [Symbol::Rule(bogus)]),
        Err(GrammarError::UnknownRule(bogus))
    );
    assert_eq!(
        grammar.add_production(bogus, []),
        Err(GrammarError::UnknownRule(bogus))
    );
    let group = GroupId::new(3);
    assert_eq!(
        grammar.add_production(s, [Symbol::Group(group)]),
        Err(GrammarError::UnknownGroup(group))
    );
    assert!(grammar.productions(s).unwrap().is_empty());
}

#[test]
fn test_group_bounds() {
    let grammar = Grammar::new();
    assert_eq!(
        grammar.group(['x'.into()], 3, 2).map(|_| ()),
        Err(GrammarError::InvalidGroupBounds { min: 3, max: 2 })
    );
    // max == 0 is "unbounded", not "smaller than min"
    let plus = grammar.group(['x'.into()], 5, 0).unwrap();
    let def = grammar.group_def(plus).unwrap();
    assert!(def.is_unbounded());
    assert!(def.can_repeat(100));
    assert_eq!(def.next_count(4), 5);
    assert_eq!(def.next_count(5), 5);

    let bounded = grammar.group(['x'.into()], 2, 3).unwrap();
    let def = grammar.group_def(bounded).unwrap();
    assert!(def.can_repeat(2));
    assert!(!def.can_repeat(3));
    assert!(!def.is_satisfied(1));
    assert!(def.is_satisfied(2));
}

#[test]
fn test_sets_are_content_addressed() {
    let grammar = Grammar::new();
    let a = grammar.set(['x'.into(), 'y'.into()]).unwrap();
    let b = grammar.set(['y'.into(), 'x'.into(), 'x'.into()]).unwrap();
    let c = grammar.set(['x'.into()]).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(grammar.set_members(a).unwrap().len(), 2);
    assert_eq!(grammar.set([]), Err(GrammarError::EmptySet));

    let rule = Symbol::Rule(grammar.penalty_rule());
    assert_eq!(grammar.set([rule]), Err(GrammarError::InvalidSetMember(rule)));
}

#[test]
fn test_user_data_roundtrip() {
    let grammar = Grammar::new();
    let expr = grammar.define_rule("expr").unwrap();
    let key = UserKey::Rule(expr);

    assert!(grammar.user_data(key).is_none());
    assert!(grammar.set_user_data(key, Arc::new(42u32)).is_none());
    assert_eq!(grammar.user_data_as::<u32>(key).as_deref(), Some(&42));
    assert!(grammar.user_data_as::<String>(key).is_none());

    let previous = grammar.set_user_data(key, Arc::new("node"));
    assert!(previous.is_some());
    assert_eq!(grammar.user_data_as::<&str>(key).as_deref(), Some(&"node"));
}

#[test]
fn test_start_rule() {
    let grammar = Grammar::new();
    assert_eq!(grammar.start(), None);
    let s = grammar.define_rule("S").unwrap();
    grammar.set_start(s).unwrap();
    assert_eq!(grammar.start(), Some(s));
    assert_eq!(grammar.snapshot().start(), Some(s));
}

#[test]
fn test_concurrent_terminal_registration_converges() {
    let grammar = Grammar::new();
    let ids: Vec<TerminalId> = (0..256)
        .into_par_iter()
        .map(|i| grammar.terminal(if i % 2 == 0 { "let" } else { "in" }).unwrap())
        .collect();

    let lets: Vec<_> = ids.iter().step_by(2).collect();
    let ins: Vec<_> = ids.iter().skip(1).step_by(2).collect();
    assert!(lets.iter().all(|id| **id == *lets[0]));
    assert!(ins.iter().all(|id| **id == *ins[0]));
    assert_ne!(lets[0], ins[0]);
}

#[test]
fn test_concurrent_rule_definition_has_one_winner() {
    let grammar = Grammar::new();
    let results: Vec<GrammarResult<RuleId>> = (0..64)
        .into_par_iter()
        .map(|_| grammar.define_rule("shared"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, GrammarError::DuplicateRule { .. })));
}

#[test]
fn test_concurrent_productions_share_tolerant_rules() {
    let grammar = Grammar::new();
    let rules: Vec<RuleId> = (0..32).map(|_| grammar.anonymous_rule().unwrap()).collect();
    rules.par_iter().for_each(|&rule| {
        grammar.add_production(rule, ['q'.into()]).unwrap();
    });

    let wrappers: Vec<Symbol> = rules
        .iter()
        .map(|&rule| grammar.productions(rule).unwrap()[0][0])
        .collect();
    assert!(wrappers.iter().all(|w| *w == wrappers[0]));
}

#[test]
fn test_next_index_within_range() {
    assert_eq!(next_index("rule", 0), Ok(0));
    assert_eq!(next_index("rule", 41), Ok(41));
}

#[cfg(target_pointer_width = "64")]
#[test]
fn test_next_index_overflow_is_an_error() {
    let count = usize::try_from(u32::MAX).unwrap() + 1;
    assert_eq!(
        next_index("group", count),
        Err(GrammarError::TableOverflow {
            table: "group",
            count,
        })
    );
    let err = next_index("set", count).unwrap_err();
    assert_eq!(err.to_string(), format!("set table is full ({count} entries)"));
}
