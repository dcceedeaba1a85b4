//! Plain-text grammar dump for diagnostics.

use crate::grammar::{GroupDef, RuleDef};
use crate::{Grammar, SetMember, Symbol, TerminalId};
use std::fmt::{self, Write};

/// Renders a grammar as one line per production.
///
/// ```text
/// start: S
/// S ::= %'a' S %'b'
///     | ε
/// ```
pub struct GrammarDump<'g> {
    grammar: &'g Grammar,
    internal: bool,
}

impl<'g> GrammarDump<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        GrammarDump {
            grammar,
            internal: false,
        }
    }

    /// Also list synthesized rules (penalty and tolerant wrappers).
    #[must_use]
    pub fn with_internal(mut self, internal: bool) -> Self {
        self.internal = internal;
        self
    }
}

/// Writes symbols with names resolved against a grammar's tables.
pub struct SymbolWriter<'a> {
    grammar: &'a Grammar,
    rules: &'a [RuleDef],
    groups: &'a [GroupDef],
    sets: &'a [Box<[SetMember]>],
}

impl SymbolWriter<'_> {
    pub fn rule_name(&self, index: usize) -> String {
        match self.rules.get(index).and_then(RuleDef::name) {
            Some(name) => name.to_string(),
            None => format!("#{index}"),
        }
    }

    fn terminal(&self, out: &mut impl Write, id: TerminalId) -> fmt::Result {
        match self.grammar.terminal_text(id) {
            Some(text) => write!(out, "'{}'", text.escape_debug()),
            None => write!(out, "{id:?}"),
        }
    }

    pub fn symbol(&self, out: &mut impl Write, symbol: Symbol) -> fmt::Result {
        match symbol {
            Symbol::Empty => out.write_str("ε"),
            Symbol::Rule(rule) => out.write_str(&self.rule_name(rule.index())),
            Symbol::Terminal(id) => self.terminal(out, id),
            Symbol::Any => out.write_str("<any>"),
            Symbol::Class(class) => write!(out, "{class}"),
            Symbol::Set(set) => {
                out.write_char('[')?;
                let members = self.sets.get(set.index()).map(|members| members.iter());
                for (i, member) in members.into_iter().flatten().enumerate() {
                    if i > 0 {
                        out.write_char(' ')?;
                    }
                    match *member {
                        SetMember::Terminal(id) => self.terminal(out, id)?,
                        SetMember::Any => out.write_str("<any>")?,
                        SetMember::Class(class) => write!(out, "{class}")?,
                    }
                }
                out.write_char(']')
            }
            Symbol::Group(group) => {
                let Some(def) = self.groups.get(group.index()) else {
                    return write!(out, "{group:?}");
                };
                out.write_char('(')?;
                self.production(out, def.production())?;
                out.write_char(')')?;
                match (def.min(), def.max()) {
                    (0, 1) => out.write_char('?'),
                    (0, 0) => out.write_char('*'),
                    (1, 0) => out.write_char('+'),
                    (min, 0) => write!(out, "{{{min},}}"),
                    (min, max) => write!(out, "{{{min},{max}}}"),
                }
            }
        }
    }

    pub fn production(&self, out: &mut impl Write, symbols: &[Symbol]) -> fmt::Result {
        if symbols.is_empty() {
            return out.write_str("ε");
        }
        for (i, &symbol) in symbols.iter().enumerate() {
            if i > 0 {
                out.write_char(' ')?;
            }
            self.symbol(out, symbol)?;
        }
        Ok(())
    }
}

impl Grammar {
    /// Run `f` with a writer that can render this grammar's symbols.
    pub fn with_symbol_writer<R>(&self, f: impl FnOnce(&SymbolWriter<'_>) -> R) -> R {
        self.with_tables(|rules, groups, sets| {
            f(&SymbolWriter {
                grammar: self,
                rules,
                groups,
                sets,
            })
        })
    }

    /// Render one symbol.
    pub fn symbol_to_string(&self, symbol: Symbol) -> String {
        self.with_symbol_writer(|writer| {
            let mut out = String::new();
            // Writing into a String cannot fail.
            let _ = writer.symbol(&mut out, symbol);
            out
        })
    }
}

impl fmt::Display for GrammarDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.grammar.with_symbol_writer(|writer| {
            if let Some(start) = self.grammar.start() {
                writeln!(f, "start: {}", writer.rule_name(start.index()))?;
            }
            for (index, def) in writer.rules.iter().enumerate() {
                if def.is_internal() && !self.internal {
                    continue;
                }
                let name = writer.rule_name(index);
                write!(f, "{name}")?;
                if def.penalty() > 0 {
                    write!(f, " [penalty {}]", def.penalty())?;
                }
                f.write_str(" ::=")?;
                if def.productions().is_empty() {
                    f.write_str(" <no productions>")?;
                }
                let indent = " ".repeat(name.chars().count());
                for (i, production) in def.productions().iter().enumerate() {
                    if i > 0 {
                        write!(f, "\n{indent}   |")?;
                    }
                    f.write_char(' ')?;
                    writer.production(f, production)?;
                }
                f.write_char('\n')?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::GrammarOptions;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dump_strict_grammar() {
        let grammar = Grammar::with_options(GrammarOptions::strict());
        let s = grammar.define_rule("S").unwrap();
        grammar.add_production(s, ['a'.into(), s.into(), 'b'.into()]).unwrap();
        grammar.add_production(s, []).unwrap();
        grammar.set_start(s).unwrap();

        let dump = GrammarDump::new(&grammar).to_string();
        assert_eq!(dump, "start: S\nS ::= 'a' S 'b'\n    | ε\n");
    }

    #[test]
    fn test_dump_groups_and_sets() {
        let grammar = Grammar::with_options(GrammarOptions::strict());
        let digits = grammar.plus([crate::CharClass::Digit.into()]).unwrap();
        let sign = grammar.set(['+'.into(), '-'.into()]).unwrap();
        let num = grammar.define_rule("num").unwrap();
        grammar
            .add_production(num, [Symbol::Set(sign), Symbol::Group(digits)])
            .unwrap();

        let dump = GrammarDump::new(&grammar).to_string();
        assert_eq!(dump, "num ::= ['+' '-'] (<digit>)+\n");
    }

    #[test]
    fn test_dump_internal_rules() {
        let grammar = Grammar::new();
        let a = grammar.define_rule("A").unwrap();
        grammar.add_production(a, ['x'.into()]).unwrap();

        let dump = GrammarDump::new(&grammar).with_internal(true).to_string();
        assert!(dump.contains("%penalty [penalty 1] ::= <any>"));
        assert!(dump.contains("%'x' ::= 'x'"));
        assert!(dump.contains("A ::= %'x'"));
    }
}
