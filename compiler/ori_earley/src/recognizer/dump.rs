//! Human-readable state listings.

use super::Parser;
use crate::error::ParseResult;
use crate::item::{EarleyItem, Owner};
use ori_grammar::SymbolWriter;
use std::fmt::{self, Write};

impl Parser<'_> {
    /// One line per item of a state:
    ///
    /// ```text
    /// #2 S ::= 'a' • S 'b'  @0 predict-nt
    /// ```
    ///
    /// # Errors
    /// [`ParseError::NoSuchState`](crate::ParseError::NoSuchState) when
    /// `index` is past the last state.
    pub fn dump_state(&self, index: usize) -> ParseResult<String> {
        let state = self.state(index)?;
        let mut out = String::new();
        self.grammar().with_symbol_writer(|writer| {
            if let Some(token) = state.token() {
                // Writing into a String cannot fail.
                let _ = writeln!(out, "S{index} after {token:?}");
            } else {
                let _ = writeln!(out, "S{index}");
            }
            for (i, item) in state.items().iter().enumerate() {
                let _ = self.write_item(&mut out, writer, i, item);
            }
        });
        Ok(out)
    }

    fn write_item(
        &self,
        out: &mut String,
        writer: &SymbolWriter<'_>,
        index: usize,
        item: &EarleyItem,
    ) -> fmt::Result {
        let snapshot = self.snapshot();
        write!(out, "#{index} ")?;
        match item.owner() {
            Owner::Rule { rule, production } => {
                let symbols = snapshot
                    .rule(rule)
                    .productions()
                    .get(production as usize)
                    .map_or(&[][..], |symbols| &symbols[..]);
                write!(out, "{} ::=", writer.rule_name(rule.index()))?;
                write_dotted(out, writer, symbols, item.dot() as usize)?;
            }
            Owner::Instance(group) => {
                write!(out, "{group:?} item ::=")?;
                write_dotted(out, writer, snapshot.group(group).production(), item.dot() as usize)?;
            }
            Owner::Group(group) => {
                writer.symbol(out, group.into())?;
                write!(out, " [{}]", item.count())?;
            }
        }
        write!(out, "  @{} {}", item.origin(), item.operation().name())?;
        if item.penalty() > 0 {
            write!(out, " penalty {}", item.penalty())?;
        }
        if item.links().len() > 1 {
            write!(out, " ({} links)", item.links().len())?;
        }
        out.write_char('\n')
    }
}

fn write_dotted(
    out: &mut String,
    writer: &SymbolWriter<'_>,
    symbols: &[ori_grammar::Symbol],
    dot: usize,
) -> fmt::Result {
    for (i, &symbol) in symbols.iter().enumerate() {
        out.write_str(if i == dot { " • " } else { " " })?;
        writer.symbol(out, symbol)?;
    }
    if dot >= symbols.len() {
        out.write_str(" •")?;
    }
    Ok(())
}
