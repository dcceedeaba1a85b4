use super::*;

#[test]
fn test_codepoint_terminal_uses_codepoint() {
    let id = TerminalId::from_char('a');
    assert_eq!(id.raw(), 'a' as u32);
    assert_eq!(id.as_char(), Some('a'));
    assert!(!id.is_sentinel());
}

#[test]
fn test_symbol_terminal_has_no_char() {
    let id = TerminalId::new(TerminalId::FIRST_SYMBOL + 3);
    assert_eq!(id.as_char(), None);
    assert!(!id.is_sentinel());
}

#[test]
fn test_sentinels() {
    assert!(TerminalId::END.is_sentinel());
    assert!(TerminalId::UNKNOWN.is_sentinel());
    assert_ne!(TerminalId::END, TerminalId::UNKNOWN);
    assert_eq!(format!("{:?}", TerminalId::END), "TerminalId::END");
}

#[test]
fn test_rule_id_accessors() {
    let id = RuleId::new(7);
    assert_eq!(id.index(), 7);
    assert_eq!(id.raw(), 7);
    assert_eq!(format!("{id:?}"), "RuleId(7)");
    assert!(RuleId::new(1) < RuleId::new(2));
}
