//! Text renderings of a tree: program source and parenthesised dumps.

use std::fmt::Write;

use crate::ast::{Node, OperatorKind, Tree};
use crate::symbols::SymbolTable;

const INDENT: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    /// `(op left right)`
    Prefix,
    /// `(left op right)`
    Infix,
    /// `(left right op)`
    Postfix,
}

/// Parenthesised dump of `node`. Absent children print as `nil`, variables by
/// name.
pub fn dump(node: &Node, symbols: &SymbolTable, notation: Notation) -> String {
    let mut out = String::new();
    DumpWriter {
        symbols,
        notation,
        out: &mut out,
    }
    .node(Some(node));
    out
}

struct DumpWriter<'a> {
    symbols: &'a SymbolTable,
    notation: Notation,
    out: &'a mut String,
}

impl DumpWriter<'_> {
    fn node(&mut self, node: Option<&Node>) {
        // Statement links are written in a loop; their closing parts are
        // appended once the chain tail is reached.
        let mut closers = 0;
        let mut cursor = node;
        loop {
            match cursor {
                Some(Node::Operator {
                    op: OperatorKind::InstrEnd,
                    left,
                    right,
                }) => {
                    self.open(OperatorKind::InstrEnd);
                    self.node(left.as_deref());
                    self.out.push(' ');
                    if self.notation == Notation::Infix {
                        self.out.push_str(OperatorKind::InstrEnd.symbol());
                        self.out.push(' ');
                    }
                    closers += 1;
                    cursor = right.as_deref();
                }
                Some(Node::Operator { op, left, right }) => {
                    self.open(*op);
                    self.node(left.as_deref());
                    self.out.push(' ');
                    if self.notation == Notation::Infix {
                        self.out.push_str(op.symbol());
                        self.out.push(' ');
                    }
                    self.node(right.as_deref());
                    self.close(*op);
                    break;
                }
                leaf => {
                    self.leaf(leaf);
                    break;
                }
            }
        }
        for _ in 0..closers {
            self.close(OperatorKind::InstrEnd);
        }
    }

    fn open(&mut self, op: OperatorKind) {
        self.out.push('(');
        if self.notation == Notation::Prefix {
            self.out.push_str(op.symbol());
            self.out.push(' ');
        }
    }

    fn close(&mut self, op: OperatorKind) {
        if self.notation == Notation::Postfix {
            self.out.push(' ');
            self.out.push_str(op.symbol());
        }
        self.out.push(')');
    }

    fn leaf(&mut self, node: Option<&Node>) {
        match node {
            Some(Node::Number(value)) => {
                let _ = write!(self.out, "{value}");
            }
            Some(Node::Variable(slot)) => self.out.push_str(&variable_name(self.symbols, *slot)),
            _ => self.out.push_str("nil"),
        }
    }
}

fn variable_name(symbols: &SymbolTable, slot: usize) -> String {
    symbols
        .name(slot)
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{slot}"))
}

/// Regenerates a program that parses back, against the same symbol table, to
/// the same tree. Expressions come out fully parenthesised.
///
/// Declarations leave only an empty statement behind, so each one is written
/// as `perem` of the next declared name in slot order, cycling when there are
/// more empty statements than names. The names are approximate: after a
/// redeclaration they no longer line up with the original `perem` lines.
/// Redeclaring is a no-op, which keeps the re-parsed tree identical.
pub fn to_source(tree: &Tree, symbols: &SymbolTable) -> String {
    let declared = symbols
        .iter()
        .filter(|(_, symbol)| symbol.declared)
        .map(|(_, symbol)| symbol.name.as_str())
        .collect::<Vec<_>>();
    let mut writer = SourceWriter {
        symbols,
        declared,
        declarations: 0,
        out: String::new(),
    };
    writer.statements(tree.root(), 0);
    writer.out
}

struct SourceWriter<'a> {
    symbols: &'a SymbolTable,
    declared: Vec<&'a str>,
    declarations: usize,
    out: String,
}

impl SourceWriter<'_> {
    fn statements(&mut self, node: &Node, depth: usize) {
        for statement in node.statements() {
            self.statement(statement, depth);
        }
    }

    fn statement(&mut self, node: &Node, depth: usize) {
        let end = OperatorKind::InstrEnd.keyword();
        match node {
            Node::Empty => {
                if self.declared.is_empty() {
                    return;
                }
                let name = self.declared[self.declarations % self.declared.len()];
                self.declarations += 1;
                self.line(depth, &format!("{} {name} {end}", OperatorKind::NewVar.keyword()));
            }
            Node::Operator {
                op: OperatorKind::InstrEnd,
                ..
            } => {
                self.line(depth, OperatorKind::OpenBlock.keyword());
                self.statements(node, depth + 1);
                self.line(depth, OperatorKind::CloseBlock.keyword());
            }
            Node::Operator {
                op: op @ (OperatorKind::If | OperatorKind::While),
                left,
                right,
            } => {
                let condition = left.as_deref().map(|c| self.condition(c)).unwrap_or_default();
                self.line(
                    depth,
                    &format!("{op} {condition} {}", OperatorKind::Then.keyword()),
                );
                if let Some(body) = right.as_deref() {
                    self.statement(body, depth + 1);
                }
            }
            Node::Operator {
                op: OperatorKind::Assign,
                left,
                right,
            } => {
                let value = self.optional_expression(left.as_deref());
                let target = self.optional_expression(right.as_deref());
                self.line(
                    depth,
                    &format!("{target} {} {value} {end}", OperatorKind::Assign),
                );
            }
            Node::Operator {
                op: op @ (OperatorKind::In | OperatorKind::Out),
                right,
                ..
            } => {
                let operand = self.optional_expression(right.as_deref());
                self.line(depth, &format!("{op} {operand} {end}"));
            }
            other => {
                let text = self.expression(other);
                self.line(depth, &text);
            }
        }
    }

    fn condition(&self, node: &Node) -> String {
        match node {
            Node::Operator {
                op,
                left: Some(left),
                right: Some(right),
            } if op.is_comparison() => {
                format!("{} {op} {}", self.expression(left), self.expression(right))
            }
            other => self.expression(other),
        }
    }

    fn optional_expression(&self, node: Option<&Node>) -> String {
        node.map(|node| self.expression(node)).unwrap_or_default()
    }

    fn expression(&self, node: &Node) -> String {
        match node {
            Node::Number(value) => format!("{value}"),
            Node::Variable(slot) => variable_name(self.symbols, *slot),
            Node::Empty => String::new(),
            Node::Operator {
                op: OperatorKind::Log,
                left,
                right,
            } => format!(
                "({} ({}) ({}))",
                OperatorKind::Log,
                self.optional_expression(left.as_deref()),
                self.optional_expression(right.as_deref())
            ),
            Node::Operator { op, right, .. } if op.is_unary_function() => {
                format!("({op} ({}))", self.optional_expression(right.as_deref()))
            }
            Node::Operator { op, left, right } => format!(
                "({} {op} {})",
                self.optional_expression(left.as_deref()),
                self.optional_expression(right.as_deref())
            ),
        }
    }

    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse_tokens;
    use indoc::indoc;

    fn parse(source: &str, symbols: &mut SymbolTable) -> Tree {
        let tokens = tokenize(source, symbols).expect("tokenize");
        parse_tokens(tokens, symbols).expect("parse")
    }

    #[test]
    fn dumps_in_three_notations() {
        let mut symbols = SymbolTable::new();
        let tree = parse("perem x; x prisvoy 1 + x * 2;", &mut symbols);
        let assign = tree.root().statements().nth(1).unwrap();

        assert_eq!(
            dump(assign, &symbols, Notation::Prefix),
            "(= (+ 1 (* x 2)) x)"
        );
        assert_eq!(
            dump(assign, &symbols, Notation::Infix),
            "((1 + (x * 2)) = x)"
        );
        assert_eq!(
            dump(assign, &symbols, Notation::Postfix),
            "((1 (x 2 *) +) x =)"
        );
    }

    #[test]
    fn dumps_mark_absent_children() {
        let mut symbols = SymbolTable::new();
        let tree = parse("vivedi sin(1);", &mut symbols);
        assert_eq!(
            dump(tree.root(), &symbols, Notation::Prefix),
            "(; (out nil (sin nil 1)) nil)"
        );
        assert_eq!(
            dump(tree.root(), &symbols, Notation::Infix),
            "((nil out (nil sin 1)) ; nil)"
        );
        assert_eq!(
            dump(tree.root(), &symbols, Notation::Postfix),
            "((nil (nil 1 sin) out) nil ;)"
        );
    }

    #[test]
    fn statement_chains_nest_in_dumps() {
        let mut symbols = SymbolTable::new();
        let tree = parse("vivedi 1; vivedi 2;", &mut symbols);
        assert_eq!(
            dump(tree.root(), &symbols, Notation::Prefix),
            "(; (out nil 1) (; (out nil 2) nil))"
        );
        assert_eq!(
            dump(tree.root(), &symbols, Notation::Postfix),
            "((nil 1 out) ((nil 2 out) nil ;) ;)"
        );
    }

    #[test]
    fn regenerated_source_reparses_to_the_same_tree() {
        let mut symbols = SymbolTable::new();
        let source = indoc! {"
            perem x;
            perem y;
            vvedi x;
            y prisvoy -x + 2 * (x - 3) ^ 2 / log 2 x;
            koli y menshe -1 togda vivedi sin y;
            pokuda x bolshe 0 togda {
                x prisvoy x - 1;
                koli x ravno 2 togda {
                    vivedi koreshok(x) + cos x;
                }
            }
        "};
        let tree = parse(source, &mut symbols);
        let regenerated = to_source(&tree, &symbols);
        let reparsed = parse(&regenerated, &mut symbols);
        assert_eq!(reparsed, tree, "regenerated:\n{regenerated}");
    }

    #[test]
    fn redeclarations_regenerate_with_cycled_names() {
        let mut symbols = SymbolTable::new();
        let tree = parse("perem x; perem x; perem y; vivedi x + y;", &mut symbols);
        let regenerated = to_source(&tree, &symbols);
        assert_eq!(
            regenerated,
            indoc! {"
                perem x slavsya_rus
                perem y slavsya_rus
                perem x slavsya_rus
                vivedi (x + y) slavsya_rus
            "}
        );
        assert_eq!(parse(&regenerated, &mut symbols), tree);
    }

    #[test]
    fn regenerated_source_layout() {
        let mut symbols = SymbolTable::new();
        let tree = parse(
            "perem i; pokuda i menshe 3 togda { vivedi i; i prisvoy i + 1; }",
            &mut symbols,
        );
        assert_eq!(
            to_source(&tree, &symbols),
            indoc! {"
                perem i slavsya_rus
                pokuda i menshe 3 togda
                    pole_polushko_nachnis
                        vivedi i slavsya_rus
                        i prisvoy (i + 1) slavsya_rus
                    pole_polushko_zakonchis
            "}
        );
    }
}
