//! Recursive-descent parser building the statement chain and expression trees.
//!
//! Each grammar production is one method advancing a shared cursor over the
//! token vector. Declarations are checked through the symbol table's
//! `declared` flag only: there is no scoping.

use tracing::debug;

use crate::ast::{Node, OperatorKind, Tree};
use crate::symbols::SymbolTable;
use crate::token::{Token, TokenKind};

pub mod error;

pub use error::{ParseError, ParseResult};

pub struct Parser<'s> {
    tokens: Vec<Token>,
    pos: usize,
    symbols: &'s mut SymbolTable,
}

impl<'s> Parser<'s> {
    /// A missing trailing [`TokenKind::End`] is appended at the last token's
    /// position.
    pub fn new(mut tokens: Vec<Token>, symbols: &'s mut SymbolTable) -> Self {
        if !matches!(tokens.last(), Some(token) if token.kind == TokenKind::End) {
            let span = tokens.last().map(|token| token.span).unwrap_or_default();
            tokens.push(Token::new(TokenKind::End, span));
        }
        Self {
            tokens,
            pos: 0,
            symbols,
        }
    }

    pub fn parse_program(mut self) -> ParseResult<Tree> {
        let root = self.parse_statement_list()?;
        if !matches!(self.kind(), TokenKind::End) {
            return Err(self.error("end of input"));
        }
        Ok(Tree::new(root))
    }

    /// Statements up to `End` or a closing block, linked through `InstrEnd`.
    fn parse_statement_list(&mut self) -> ParseResult<Node> {
        let mut statements = vec![self.parse_statement()?];
        while !self.at_list_end() {
            statements.push(self.parse_statement()?);
        }

        let chain = statements
            .into_iter()
            .rev()
            .fold(Node::Empty, |next, statement| Node::link(statement, next));
        Ok(chain)
    }

    fn at_list_end(&self) -> bool {
        let kind = self.kind();
        matches!(kind, TokenKind::End) || kind.is_operator(OperatorKind::CloseBlock)
    }

    fn parse_statement(&mut self) -> ParseResult<Node> {
        match self.kind() {
            TokenKind::Operator(OperatorKind::OpenBlock) => {
                self.advance();
                let block = self.parse_statement_list()?;
                self.expect_operator(OperatorKind::CloseBlock)?;
                Ok(block)
            }
            TokenKind::Operator(OperatorKind::NewVar) => self.parse_declaration(),
            TokenKind::Operator(op @ (OperatorKind::If | OperatorKind::While)) => {
                self.parse_conditional(op)
            }
            TokenKind::Operator(OperatorKind::In) => self.parse_input(),
            TokenKind::Operator(OperatorKind::Out) => self.parse_output(),
            TokenKind::Identifier(_) => self.parse_assignment(),
            _ => Err(self.error("statement")),
        }
    }

    fn parse_declaration(&mut self) -> ParseResult<Node> {
        self.expect_operator(OperatorKind::NewVar)?;
        let TokenKind::Identifier(slot) = self.kind() else {
            return Err(self.error("identifier"));
        };
        self.symbols.declare_slot(slot);
        self.advance();
        self.expect_operator(OperatorKind::InstrEnd)?;
        Ok(Node::Empty)
    }

    fn parse_conditional(&mut self, op: OperatorKind) -> ParseResult<Node> {
        self.advance();
        let condition = self.parse_condition()?;
        self.expect_operator(OperatorKind::Then)?;
        let body = self.parse_statement()?;
        Ok(Node::binary(op, condition, body))
    }

    fn parse_input(&mut self) -> ParseResult<Node> {
        self.expect_operator(OperatorKind::In)?;
        let target = self.parse_declared_variable()?;
        self.expect_operator(OperatorKind::InstrEnd)?;
        Ok(Node::unary(OperatorKind::In, target))
    }

    fn parse_output(&mut self) -> ParseResult<Node> {
        self.expect_operator(OperatorKind::Out)?;
        let value = self.parse_expression()?;
        self.expect_operator(OperatorKind::InstrEnd)?;
        Ok(Node::unary(OperatorKind::Out, value))
    }

    /// The expression goes left and the target variable right.
    fn parse_assignment(&mut self) -> ParseResult<Node> {
        let target = self.parse_declared_variable()?;
        self.expect_operator(OperatorKind::Assign)?;
        let value = self.parse_expression()?;
        self.expect_operator(OperatorKind::InstrEnd)?;
        Ok(Node::binary(OperatorKind::Assign, value, target))
    }

    fn parse_condition(&mut self) -> ParseResult<Node> {
        let left = self.parse_expression()?;
        match self.kind() {
            TokenKind::Operator(op) if op.is_comparison() => {
                self.advance();
                let right = self.parse_expression()?;
                Ok(Node::binary(op, left, right))
            }
            _ => Ok(left),
        }
    }

    fn parse_expression(&mut self) -> ParseResult<Node> {
        let mut expr = self.parse_term()?;
        while let TokenKind::Operator(op @ (OperatorKind::Add | OperatorKind::Sub)) =
            self.kind()
        {
            self.advance();
            let right = self.parse_term()?;
            expr = Node::binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> ParseResult<Node> {
        let mut expr = self.parse_power()?;
        while let TokenKind::Operator(op @ (OperatorKind::Mul | OperatorKind::Div)) =
            self.kind()
        {
            self.advance();
            let right = self.parse_power()?;
            expr = Node::binary(op, expr, right);
        }
        Ok(expr)
    }

    /// `^` takes a single exponent; `2 ^ 3 ^ 2` is rejected by the caller.
    fn parse_power(&mut self) -> ParseResult<Node> {
        let base = self.parse_unary()?;
        if self.kind().is_operator(OperatorKind::Pow) {
            self.advance();
            let exponent = self.parse_unary()?;
            return Ok(Node::binary(OperatorKind::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> ParseResult<Node> {
        match self.kind() {
            TokenKind::Operator(OperatorKind::LeftBracket) => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_operator(OperatorKind::RightBracket)?;
                Ok(expr)
            }
            TokenKind::Operator(OperatorKind::Log) => {
                self.advance();
                let base = self.parse_power()?;
                let argument = self.parse_power()?;
                Ok(Node::binary(OperatorKind::Log, base, argument))
            }
            TokenKind::Operator(op) if op.is_unary_function() => {
                self.advance();
                let operand = self.parse_power()?;
                Ok(Node::unary(op, operand))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Node> {
        match self.kind() {
            TokenKind::Number(value) => {
                self.advance();
                Ok(Node::number(value))
            }
            TokenKind::Identifier(_) => self.parse_declared_variable(),
            TokenKind::Operator(OperatorKind::Sub) => {
                self.advance();
                match self.parse_unary()? {
                    Node::Number(value) => Ok(Node::number(-value)),
                    operand => Ok(Node::binary(OperatorKind::Sub, Node::number(0.0), operand)),
                }
            }
            _ => Err(self.error("expression")),
        }
    }

    fn parse_declared_variable(&mut self) -> ParseResult<Node> {
        let token = self.current();
        let TokenKind::Identifier(slot) = token.kind else {
            return Err(self.error("identifier"));
        };
        if !self.symbols.is_declared(slot) {
            return Err(ParseError::UndeclaredVariable {
                name: self.symbols.name(slot).unwrap_or("?").to_string(),
                line: token.span.line,
                column: token.span.column,
            });
        }
        self.advance();
        Ok(Node::variable(slot))
    }

    fn expect_operator(&mut self, op: OperatorKind) -> ParseResult<()> {
        if self.kind().is_operator(op) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("'{}'", op.keyword())))
        }
    }

    fn current(&self) -> &Token {
        // `new` guarantees a trailing `End`, and `advance` never steps past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn describe(&self, token: &Token) -> String {
        match token.kind {
            TokenKind::Identifier(slot) => match self.symbols.name(slot) {
                Some(name) => format!("identifier '{name}'"),
                None => token.kind.to_string(),
            },
            _ => token.kind.to_string(),
        }
    }

    fn error(&self, expected: &str) -> ParseError {
        let token = self.current();
        ParseError::Syntax {
            line: token.span.line,
            column: token.span.column,
            expected: expected.to_string(),
            found: self.describe(token),
        }
    }
}

/// Parse a token stream produced by [`crate::lexer::tokenize`] against the same
/// symbol table. `perem` declarations mark their slots as they are parsed.
pub fn parse_tokens(tokens: Vec<Token>, symbols: &mut SymbolTable) -> ParseResult<Tree> {
    let tree = Parser::new(tokens, symbols).parse_program()?;
    debug!(nodes = tree.size(), "parsed program");
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use indoc::indoc;

    fn parse(source: &str, symbols: &mut SymbolTable) -> ParseResult<Tree> {
        let tokens = tokenize(source, symbols).expect("tokenize failed");
        parse_tokens(tokens, symbols)
    }

    fn statements(tree: &Tree) -> Vec<Node> {
        tree.root().statements().cloned().collect()
    }

    /// Parses `source` as the right-hand side of `x prisvoy ... ;` with `x`
    /// and `y` declared.
    fn expression(source: &str) -> Node {
        let mut symbols = SymbolTable::new();
        symbols.declare("x").unwrap();
        symbols.declare("y").unwrap();
        let tree = parse(&format!("x prisvoy {source};"), &mut symbols).expect("parse failed");
        let assignment = tree.root().statements().next().expect("one statement");
        assignment.left().expect("assigned expression").clone()
    }

    #[test]
    fn parses_simple_program() {
        let mut symbols = SymbolTable::new();
        let input = indoc! {"
            perem x;
            x prisvoy 2 plus 3 slavsya_rus
            vivedi x slavsya_rus
        "};
        let tree = parse(input, &mut symbols).expect("parse failed");

        let expected = vec![
            Node::Empty,
            Node::binary(
                OperatorKind::Assign,
                Node::binary(OperatorKind::Add, Node::number(2.0), Node::number(3.0)),
                Node::variable(0),
            ),
            Node::unary(OperatorKind::Out, Node::variable(0)),
        ];
        assert_eq!(statements(&tree), expected);
        assert!(symbols.is_declared(0));
    }

    #[test]
    fn statement_chain_is_right_leaning_and_ends_in_empty() {
        let mut symbols = SymbolTable::new();
        let tree = parse("perem x; vivedi x;", &mut symbols).unwrap();
        let root = tree.root();
        assert!(root.is_operator(OperatorKind::InstrEnd));
        assert_eq!(root.left(), Some(&Node::Empty));
        let second = root.right().expect("second link");
        assert!(second.is_operator(OperatorKind::InstrEnd));
        assert_eq!(second.right(), Some(&Node::Empty));
    }

    #[test]
    fn respects_arithmetic_precedence() {
        let expected = Node::binary(
            OperatorKind::Sub,
            Node::binary(
                OperatorKind::Add,
                Node::number(1.0),
                Node::binary(
                    OperatorKind::Mul,
                    Node::number(2.0),
                    Node::binary(OperatorKind::Pow, Node::variable(0), Node::number(2.0)),
                ),
            ),
            Node::binary(OperatorKind::Div, Node::variable(1), Node::number(4.0)),
        );
        assert_eq!(expression("1 + 2 * x ^ 2 - y / 4"), expected);
    }

    #[test]
    fn parentheses_override_precedence() {
        let expected = Node::binary(
            OperatorKind::Mul,
            Node::binary(OperatorKind::Add, Node::number(1.0), Node::number(2.0)),
            Node::variable(0),
        );
        assert_eq!(expression("(1 plus 2) umnozhit x"), expected);
    }

    #[test]
    fn unary_minus_folds_into_literal() {
        assert_eq!(expression("-5"), Node::number(-5.0));
        assert_eq!(
            expression("-x"),
            Node::binary(OperatorKind::Sub, Node::number(0.0), Node::variable(0))
        );
        assert_eq!(
            expression("-(1 + 2)"),
            Node::binary(
                OperatorKind::Sub,
                Node::number(0.0),
                Node::binary(OperatorKind::Add, Node::number(1.0), Node::number(2.0)),
            )
        );
    }

    #[test]
    fn functions_bind_one_power() {
        assert_eq!(
            expression("sin x ^ 2 + 1"),
            Node::binary(
                OperatorKind::Add,
                Node::unary(
                    OperatorKind::Sin,
                    Node::binary(OperatorKind::Pow, Node::variable(0), Node::number(2.0)),
                ),
                Node::number(1.0),
            )
        );
        assert_eq!(
            expression("log 2 8"),
            Node::binary(OperatorKind::Log, Node::number(2.0), Node::number(8.0))
        );
        assert_eq!(
            expression("koreshok (x + y)"),
            Node::unary(
                OperatorKind::Sqrt,
                Node::binary(OperatorKind::Add, Node::variable(0), Node::variable(1)),
            )
        );
    }

    #[test]
    fn parses_conditionals_and_blocks() {
        let mut symbols = SymbolTable::new();
        let input = indoc! {"
            perem i;
            vvedi i;
            pokuda i menshe 10 togda pole_polushko_nachnis
                i prisvoy i plus 1;
                vivedi i;
            pole_polushko_zakonchis
            koli i ravno 10 togda vivedi 1;
        "};
        let tree = parse(input, &mut symbols).expect("parse failed");
        let statements = statements(&tree);
        assert_eq!(statements.len(), 4);
        assert_eq!(statements[1], Node::unary(OperatorKind::In, Node::variable(0)));

        let while_node = &statements[2];
        assert!(while_node.is_operator(OperatorKind::While));
        assert_eq!(
            while_node.left(),
            Some(&Node::binary(
                OperatorKind::Below,
                Node::variable(0),
                Node::number(10.0)
            ))
        );
        let body = while_node.right().expect("loop body");
        assert_eq!(body.statements().count(), 2);

        let if_node = &statements[3];
        assert!(if_node.is_operator(OperatorKind::If));
        assert_eq!(
            if_node.right(),
            Some(&Node::unary(OperatorKind::Out, Node::number(1.0)))
        );
    }

    #[test]
    fn condition_without_comparison_is_plain_expression() {
        let mut symbols = SymbolTable::new();
        let tree = parse("perem x; koli x togda vivedi x;", &mut symbols).unwrap();
        let if_node = tree.root().statements().nth(1).unwrap().clone();
        assert_eq!(if_node.left(), Some(&Node::variable(0)));
    }

    #[test]
    fn rejects_use_before_declaration() {
        let mut symbols = SymbolTable::new();
        let err = parse("vivedi x;", &mut symbols).expect_err("x is undeclared");
        assert_eq!(
            err,
            ParseError::UndeclaredVariable {
                name: "x".to_string(),
                line: 1,
                column: 8
            }
        );

        let mut symbols = SymbolTable::new();
        assert!(parse("perem x; vivedi x;", &mut symbols).is_ok());
    }

    #[test]
    fn assignment_target_must_be_declared() {
        let mut symbols = SymbolTable::new();
        let err = parse("x prisvoy 1;", &mut symbols).expect_err("x is undeclared");
        assert!(matches!(err, ParseError::UndeclaredVariable { .. }));
    }

    #[test]
    fn reports_missing_terminator_with_position() {
        let mut symbols = SymbolTable::new();
        let err = parse("perem x;\nx prisvoy 1\nvivedi x;", &mut symbols).expect_err("missing ;");
        assert_eq!(
            err,
            ParseError::Syntax {
                line: 3,
                column: 1,
                expected: "'slavsya_rus'".to_string(),
                found: "'vivedi'".to_string(),
            }
        );
    }

    #[test]
    fn rejects_empty_program_and_empty_block() {
        let mut symbols = SymbolTable::new();
        let err = parse("", &mut symbols).expect_err("empty program");
        assert!(matches!(err, ParseError::Syntax { ref expected, .. } if expected == "statement"));

        let err = parse("{ }", &mut symbols).expect_err("empty block");
        assert!(matches!(err, ParseError::Syntax { ref found, .. } if found.contains("pole_polushko_zakonchis")));
    }

    #[test]
    fn parser_terminates_bare_token_streams() {
        let mut symbols = SymbolTable::new();
        let err = Parser::new(Vec::new(), &mut symbols)
            .parse_program()
            .expect_err("no tokens");
        assert!(matches!(err, ParseError::Syntax { ref expected, .. } if expected == "statement"));

        let mut tokens = tokenize("perem x;", &mut symbols).expect("tokenize failed");
        assert_eq!(tokens.pop().map(|token| token.kind), Some(TokenKind::End));
        let tree = Parser::new(tokens, &mut symbols)
            .parse_program()
            .expect("parse without End");
        assert_eq!(statements(&tree), vec![Node::Empty]);
    }

    #[test]
    fn rejects_stray_close_block() {
        let mut symbols = SymbolTable::new();
        let err = parse("perem x; }", &mut symbols).expect_err("stray }");
        assert!(
            matches!(err, ParseError::Syntax { ref expected, .. } if expected == "end of input")
        );
    }

    #[test]
    fn rejects_chained_power() {
        let mut symbols = SymbolTable::new();
        symbols.declare("x").unwrap();
        let err = parse("x prisvoy 2 ^ 3 ^ 2;", &mut symbols).expect_err("chained power");
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn redeclaration_is_accepted() {
        let mut symbols = SymbolTable::new();
        assert!(parse("perem x; perem x; vivedi x;", &mut symbols).is_ok());
        assert_eq!(symbols.len(), 1);
    }
}
