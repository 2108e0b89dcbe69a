//! Lowering of the simplified tree into stack-machine assembly.
//!
//! Control flow becomes labels and jumps. Each `koli` gets an `end_if_N`
//! label, each `pokuda` a `while_N`/`end_while_N` pair, with one counter per
//! construct kind for the whole program. Conditions leave a difference on the
//! stack; the branch compares it with a pushed `0`.

use std::fmt;
use std::io;

use tracing::debug;

use crate::ast::{Node, OperatorKind, Tree};
use crate::symbols::SymbolTable;

pub mod error;

pub use error::{CodegenError, CodegenResult};

/// One register per variable slot, `rax` through `rzx`.
pub const REGISTER_COUNT: usize = 26;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register(u8);

impl Register {
    pub fn for_slot(slot: usize) -> Option<Self> {
        (slot < REGISTER_COUNT).then(|| Register(slot as u8))
    }

    pub fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}x", (b'a' + self.0) as char)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    EndIf(usize),
    While(usize),
    EndWhile(usize),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::EndIf(n) => write!(f, "end_if_{n}"),
            Label::While(n) => write!(f, "while_{n}"),
            Label::EndWhile(n) => write!(f, "end_while_{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    PushNumber(f64),
    PushRegister(Register),
    Pop(Register),
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
    In,
    Out,
    Jmp(Label),
    /// Skip when the difference is non-zero.
    Jne(Label),
    Jae(Label),
    Jbe(Label),
    Label(Label),
    Hlt,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::PushNumber(value) => write!(f, "push {value}"),
            Instruction::PushRegister(register) => write!(f, "push {register}"),
            Instruction::Pop(register) => write!(f, "pop {register}"),
            Instruction::Add => f.write_str("add"),
            Instruction::Sub => f.write_str("sub"),
            Instruction::Mul => f.write_str("mul"),
            Instruction::Div => f.write_str("div"),
            Instruction::Pow => f.write_str("pow"),
            Instruction::Ln => f.write_str("ln"),
            Instruction::Log => f.write_str("log"),
            Instruction::Sin => f.write_str("sin"),
            Instruction::Cos => f.write_str("cos"),
            Instruction::Sqrt => f.write_str("sqrt"),
            Instruction::In => f.write_str("in"),
            Instruction::Out => f.write_str("out"),
            Instruction::Jmp(label) => write!(f, "jmp :{label}"),
            Instruction::Jne(label) => write!(f, "jne :{label}"),
            Instruction::Jae(label) => write!(f, "jae :{label}"),
            Instruction::Jbe(label) => write!(f, "jbe :{label}"),
            Instruction::Label(label) => write!(f, "{label}:"),
            Instruction::Hlt => f.write_str("hlt"),
        }
    }
}

/// Emitted program, one instruction per line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    instructions: Vec<Instruction>,
}

impl Assembly {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn write_to(&self, mut out: impl io::Write) -> io::Result<()> {
        for instruction in &self.instructions {
            writeln!(out, "{instruction}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}

/// Code generation context: output buffer plus the label counters.
pub struct CodeGenerator<'s> {
    symbols: &'s SymbolTable,
    code: Vec<Instruction>,
    if_labels: usize,
    while_labels: usize,
}

impl<'s> CodeGenerator<'s> {
    pub fn new(symbols: &'s SymbolTable) -> Self {
        Self {
            symbols,
            code: Vec::new(),
            if_labels: 0,
            while_labels: 0,
        }
    }

    /// Lowers a whole program and appends `hlt`.
    pub fn generate(mut self, tree: &Tree) -> CodegenResult<Assembly> {
        self.emit(tree.root())?;
        self.code.push(Instruction::Hlt);
        debug!(
            instructions = self.code.len(),
            if_labels = self.if_labels,
            while_labels = self.while_labels,
            "generated assembly"
        );
        Ok(Assembly {
            instructions: self.code,
        })
    }

    fn emit(&mut self, node: &Node) -> CodegenResult<()> {
        for statement in node.statements() {
            self.emit_node(statement)?;
        }
        Ok(())
    }

    fn emit_node(&mut self, node: &Node) -> CodegenResult<()> {
        match node {
            Node::Number(value) => self.code.push(Instruction::PushNumber(*value)),
            Node::Variable(slot) => {
                let register = self.register(*slot)?;
                self.code.push(Instruction::PushRegister(register));
            }
            Node::Empty => {}
            Node::Operator { op, left, right } => {
                self.emit_operator(*op, left.as_deref(), right.as_deref())?
            }
        }
        Ok(())
    }

    fn emit_operator(
        &mut self,
        op: OperatorKind,
        left: Option<&Node>,
        right: Option<&Node>,
    ) -> CodegenResult<()> {
        match op {
            OperatorKind::InstrEnd => {
                if let Some(statement) = left {
                    self.emit_node(statement)?;
                }
                if let Some(next) = right {
                    self.emit(next)?;
                }
            }
            OperatorKind::Add
            | OperatorKind::Sub
            | OperatorKind::Mul
            | OperatorKind::Div
            | OperatorKind::Pow
            | OperatorKind::Log => {
                let (left, right) = both(op, left, right)?;
                self.emit_node(left)?;
                self.emit_node(right)?;
                self.code.push(arithmetic(op));
            }
            OperatorKind::Ln | OperatorKind::Sin | OperatorKind::Cos | OperatorKind::Sqrt => {
                let operand = operand(op, right)?;
                self.emit_node(operand)?;
                self.code.push(arithmetic(op));
            }
            OperatorKind::Below | OperatorKind::Above | OperatorKind::Equal | OperatorKind::NotEqual => {
                let (left, right) = both(op, left, right)?;
                self.emit_node(left)?;
                self.emit_node(right)?;
                self.code.push(Instruction::Sub);
            }
            OperatorKind::Assign => {
                let (value, target) = both(op, left, right)?;
                let register = self.target(op, target)?;
                self.emit_node(value)?;
                self.code.push(Instruction::Pop(register));
            }
            OperatorKind::In => {
                let register = self.target(op, operand(op, right)?)?;
                self.code.push(Instruction::In);
                self.code.push(Instruction::Pop(register));
            }
            OperatorKind::Out => {
                self.emit_node(operand(op, right)?)?;
                self.code.push(Instruction::Out);
            }
            OperatorKind::If => {
                let (condition, body) = both(op, left, right)?;
                self.if_labels += 1;
                let end = Label::EndIf(self.if_labels);
                self.emit_condition(condition, end)?;
                self.emit(body)?;
                self.code.push(Instruction::Label(end));
            }
            OperatorKind::While => {
                let (condition, body) = both(op, left, right)?;
                self.while_labels += 1;
                let start = Label::While(self.while_labels);
                let end = Label::EndWhile(self.while_labels);
                self.code.push(Instruction::Label(start));
                self.emit_condition(condition, end)?;
                self.emit(body)?;
                self.code.push(Instruction::Jmp(start));
                self.code.push(Instruction::Label(end));
            }
            OperatorKind::Then
            | OperatorKind::OpenBlock
            | OperatorKind::CloseBlock
            | OperatorKind::NewVar
            | OperatorKind::LeftBracket
            | OperatorKind::RightBracket => return Err(CodegenError::UnsupportedOperator { op }),
        }
        Ok(())
    }

    /// Condition code, `push 0`, then a branch to `skip` taken when the
    /// condition does not hold.
    fn emit_condition(&mut self, condition: &Node, skip: Label) -> CodegenResult<()> {
        self.emit_node(condition)?;
        self.code.push(Instruction::PushNumber(0.0));
        let branch = match condition.operator() {
            Some(OperatorKind::Above) => Instruction::Jbe(skip),
            Some(OperatorKind::Below) => Instruction::Jae(skip),
            _ => Instruction::Jne(skip),
        };
        self.code.push(branch);
        Ok(())
    }

    fn target(&self, op: OperatorKind, node: &Node) -> CodegenResult<Register> {
        match node {
            Node::Variable(slot) => self.register(*slot),
            _ => Err(CodegenError::MalformedNode {
                op,
                detail: "target is not a variable",
            }),
        }
    }

    fn register(&self, slot: usize) -> CodegenResult<Register> {
        Register::for_slot(slot).ok_or_else(|| CodegenError::RegisterLimit {
            name: self.symbols.name(slot).unwrap_or("?").to_string(),
            slot,
        })
    }
}

fn both<'a>(
    op: OperatorKind,
    left: Option<&'a Node>,
    right: Option<&'a Node>,
) -> CodegenResult<(&'a Node, &'a Node)> {
    match (left, right) {
        (Some(left), Some(right)) => Ok((left, right)),
        _ => Err(CodegenError::MalformedNode {
            op,
            detail: "missing operand",
        }),
    }
}

fn operand(op: OperatorKind, right: Option<&Node>) -> CodegenResult<&Node> {
    right.ok_or(CodegenError::MalformedNode {
        op,
        detail: "missing operand",
    })
}

fn arithmetic(op: OperatorKind) -> Instruction {
    match op {
        OperatorKind::Add => Instruction::Add,
        OperatorKind::Sub => Instruction::Sub,
        OperatorKind::Mul => Instruction::Mul,
        OperatorKind::Div => Instruction::Div,
        OperatorKind::Pow => Instruction::Pow,
        OperatorKind::Ln => Instruction::Ln,
        OperatorKind::Log => Instruction::Log,
        OperatorKind::Sin => Instruction::Sin,
        OperatorKind::Cos => Instruction::Cos,
        _ => Instruction::Sqrt,
    }
}

/// Lowers `tree` into assembly ending in `hlt`.
pub fn generate(tree: &Tree, symbols: &SymbolTable) -> CodegenResult<Assembly> {
    CodeGenerator::new(symbols).generate(tree)
}
