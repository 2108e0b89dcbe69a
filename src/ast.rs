//! Syntax tree shared by every stage after the parser.
//!
//! The parser builds a [`Tree`] once, the simplifier rewrites nodes in place and
//! the code generator only reads it. Statements form a right-leaning chain of
//! `InstrEnd` links: `left` holds the statement, `right` the next link or
//! [`Node::Empty`].

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Ln,
    Log,
    Sin,
    Cos,
    Sqrt,

    // Sequencing
    InstrEnd,

    // Control
    If,
    While,
    Then,
    Assign,

    // Comparison
    Below,
    Above,
    Equal,
    NotEqual,

    // I/O
    In,
    Out,

    // Scope
    OpenBlock,
    CloseBlock,

    // Declaration
    NewVar,

    // Grammar-only brackets, never stored in a tree
    LeftBracket,
    RightBracket,
}

impl OperatorKind {
    /// Canonical source spelling.
    pub fn keyword(self) -> &'static str {
        match self {
            OperatorKind::Add => "+",
            OperatorKind::Sub => "-",
            OperatorKind::Mul => "*",
            OperatorKind::Div => "/",
            OperatorKind::Pow => "^",
            OperatorKind::Ln => "ln",
            OperatorKind::Log => "log",
            OperatorKind::Sin => "sin",
            OperatorKind::Cos => "cos",
            OperatorKind::Sqrt => "koreshok",
            OperatorKind::InstrEnd => "slavsya_rus",
            OperatorKind::If => "koli",
            OperatorKind::While => "pokuda",
            OperatorKind::Then => "togda",
            OperatorKind::Assign => "prisvoy",
            OperatorKind::Below => "menshe",
            OperatorKind::Above => "bolshe",
            OperatorKind::Equal => "ravno",
            OperatorKind::NotEqual => "neravno",
            OperatorKind::In => "vvedi",
            OperatorKind::Out => "vivedi",
            OperatorKind::OpenBlock => "pole_polushko_nachnis",
            OperatorKind::CloseBlock => "pole_polushko_zakonchis",
            OperatorKind::NewVar => "perem",
            OperatorKind::LeftBracket => "(",
            OperatorKind::RightBracket => ")",
        }
    }

    /// Short name used by the tree dumps.
    pub fn symbol(self) -> &'static str {
        match self {
            OperatorKind::InstrEnd => ";",
            OperatorKind::If => "if",
            OperatorKind::While => "while",
            OperatorKind::Then => "then",
            OperatorKind::Assign => "=",
            OperatorKind::Below => "<",
            OperatorKind::Above => ">",
            OperatorKind::Equal => "==",
            OperatorKind::NotEqual => "!=",
            OperatorKind::In => "in",
            OperatorKind::Out => "out",
            OperatorKind::OpenBlock => "{",
            OperatorKind::CloseBlock => "}",
            OperatorKind::NewVar => "var",
            OperatorKind::Sqrt => "sqrt",
            other => other.keyword(),
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            OperatorKind::Add
                | OperatorKind::Sub
                | OperatorKind::Mul
                | OperatorKind::Div
                | OperatorKind::Pow
                | OperatorKind::Ln
                | OperatorKind::Log
                | OperatorKind::Sin
                | OperatorKind::Cos
                | OperatorKind::Sqrt
        )
    }

    /// Functions taking a single operand, stored in `right`.
    pub fn is_unary_function(self) -> bool {
        matches!(
            self,
            OperatorKind::Ln | OperatorKind::Sin | OperatorKind::Cos | OperatorKind::Sqrt
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            OperatorKind::Below | OperatorKind::Above | OperatorKind::Equal | OperatorKind::NotEqual
        )
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    Number(f64),
    /// Symbol table slot.
    Variable(usize),
    Operator {
        op: OperatorKind,
        left: Option<Box<Node>>,
        right: Option<Box<Node>>,
    },
    #[default]
    Empty,
}

impl Node {
    pub fn number(value: f64) -> Self {
        Node::Number(value)
    }

    pub fn variable(slot: usize) -> Self {
        Node::Variable(slot)
    }

    pub fn binary(op: OperatorKind, left: Node, right: Node) -> Self {
        Node::Operator {
            op,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    /// Unary operators keep their operand on the right.
    pub fn unary(op: OperatorKind, operand: Node) -> Self {
        Node::Operator {
            op,
            left: None,
            right: Some(Box::new(operand)),
        }
    }

    /// One `InstrEnd` link of a statement list.
    pub fn link(statement: Node, next: Node) -> Self {
        Node::binary(OperatorKind::InstrEnd, statement, next)
    }

    pub fn operator(&self) -> Option<OperatorKind> {
        match self {
            Node::Operator { op, .. } => Some(*op),
            _ => None,
        }
    }

    pub fn is_operator(&self, kind: OperatorKind) -> bool {
        self.operator() == Some(kind)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Node::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn left(&self) -> Option<&Node> {
        match self {
            Node::Operator { left, .. } => left.as_deref(),
            _ => None,
        }
    }

    pub fn right(&self) -> Option<&Node> {
        match self {
            Node::Operator { right, .. } => right.as_deref(),
            _ => None,
        }
    }

    /// Number of nodes in this subtree, `Empty` included.
    pub fn count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            if let Node::Operator { left, right, .. } = node {
                pending.extend(left.as_deref());
                pending.extend(right.as_deref());
            }
        }
        count
    }

    /// Statements of an `InstrEnd` chain, in order. A node that is not a link
    /// yields itself.
    pub fn statements(&self) -> Statements<'_> {
        Statements {
            cursor: Some(self),
        }
    }
}

pub struct Statements<'a> {
    cursor: Option<&'a Node>,
}

impl<'a> Iterator for Statements<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = self.cursor.take()?;
            match node {
                Node::Operator {
                    op: OperatorKind::InstrEnd,
                    left,
                    right,
                } => {
                    self.cursor = right.as_deref();
                    if let Some(statement) = left.as_deref() {
                        return Some(statement);
                    }
                }
                Node::Empty => return None,
                other => return Some(other),
            }
        }
    }
}

/// Program tree: root node plus its cached node count.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    root: Node,
    size: usize,
}

impl Tree {
    pub fn new(root: Node) -> Self {
        let size = root.count();
        Self { root, size }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn refresh_size(&mut self) {
        self.size = self.root.count();
    }

    pub fn into_root(mut self) -> Node {
        std::mem::take(&mut self.root)
    }
}

impl Drop for Tree {
    // Long statement chains would otherwise recurse once per link.
    fn drop(&mut self) {
        let mut pending = vec![std::mem::take(&mut self.root)];
        while let Some(mut node) = pending.pop() {
            if let Node::Operator { left, right, .. } = &mut node {
                pending.extend(left.take().map(|child| *child));
                pending.extend(right.take().map(|child| *child));
            }
        }
    }
}
