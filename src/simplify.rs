//! Constant folding and algebraic identity elimination, run to a fixpoint.

use tracing::debug;

use crate::ast::{Node, OperatorKind, Tree};
use crate::eval::{EvalResult, approx_eq, evaluate, is_constant};
use crate::symbols::SymbolTable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimplifyReport {
    /// Subtrees replaced by their value.
    pub folded: usize,
    /// Identity and absorbing rewrites.
    pub reduced: usize,
    /// Full fold + identity rounds, including the final one that changed nothing.
    pub passes: usize,
}

impl SimplifyReport {
    pub fn rewrites(&self) -> usize {
        self.folded + self.reduced
    }
}

/// What an identity match keeps of a binary node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rewrite {
    KeepLeft,
    KeepRight,
    Zero,
}

pub struct Simplifier<'s> {
    symbols: &'s SymbolTable,
}

impl<'s> Simplifier<'s> {
    pub fn new(symbols: &'s SymbolTable) -> Self {
        Self { symbols }
    }

    /// Alternates both passes until a round applies no rewrite. A fold error
    /// stops the run and leaves the failing node as it was.
    pub fn run(&self, tree: &mut Tree) -> EvalResult<SimplifyReport> {
        let result = self.run_passes(tree.root_mut());
        tree.refresh_size();
        let report = result?;
        debug!(
            folded = report.folded,
            reduced = report.reduced,
            passes = report.passes,
            size = tree.size(),
            "simplified tree"
        );
        Ok(report)
    }

    fn run_passes(&self, root: &mut Node) -> EvalResult<SimplifyReport> {
        let mut report = SimplifyReport::default();
        loop {
            let folded = self.fold(root)?;
            let reduced = self.reduce(root);
            report.folded += folded;
            report.reduced += reduced;
            report.passes += 1;
            debug!(pass = report.passes, folded, reduced, "simplifier pass");
            if folded + reduced == 0 {
                return Ok(report);
            }
        }
    }

    /// Post-order constant folding. Statement links are followed with a loop so
    /// long programs do not recurse once per statement.
    pub fn fold(&self, node: &mut Node) -> EvalResult<usize> {
        let mut rewrites = 0;
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            cursor = match current {
                Node::Operator {
                    op: OperatorKind::InstrEnd,
                    left,
                    right,
                } => {
                    if let Some(statement) = left.as_deref_mut() {
                        rewrites += self.fold(statement)?;
                    }
                    right.as_deref_mut()
                }
                other => {
                    rewrites += self.fold_node(other)?;
                    None
                }
            };
        }
        Ok(rewrites)
    }

    fn fold_node(&self, node: &mut Node) -> EvalResult<usize> {
        let Node::Operator { op, left, right } = node else {
            return Ok(0);
        };
        let op = *op;

        let mut rewrites = 0;
        if let Some(child) = left.as_deref_mut() {
            rewrites += self.fold(child)?;
        }
        if let Some(child) = right.as_deref_mut() {
            rewrites += self.fold(child)?;
        }

        // Control, I/O and comparison nodes keep their shape even when constant.
        if op.is_arithmetic() && is_constant(node) {
            let value = evaluate(node, self.symbols)?;
            *node = Node::Number(value);
            rewrites += 1;
        }
        Ok(rewrites)
    }

    /// Pre-order identity elimination. A rewritten node is not revisited in the
    /// same pass.
    pub fn reduce(&self, node: &mut Node) -> usize {
        let mut rewrites = 0;
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            cursor = match current {
                Node::Operator {
                    op: OperatorKind::InstrEnd,
                    left,
                    right,
                } => {
                    if let Some(statement) = left.as_deref_mut() {
                        rewrites += self.reduce(statement);
                    }
                    right.as_deref_mut()
                }
                other => {
                    rewrites += self.reduce_node(other);
                    None
                }
            };
        }
        rewrites
    }

    fn reduce_node(&self, node: &mut Node) -> usize {
        if let Some(rewrite) = self.identity(node) {
            apply_rewrite(node, rewrite);
            return 1;
        }

        let mut rewrites = 0;
        if let Node::Operator { left, right, .. } = node {
            if let Some(child) = left.as_deref_mut() {
                rewrites += self.reduce(child);
            }
            if let Some(child) = right.as_deref_mut() {
                rewrites += self.reduce(child);
            }
        }
        rewrites
    }

    fn identity(&self, node: &Node) -> Option<Rewrite> {
        let Node::Operator {
            op,
            left: Some(left),
            right: Some(right),
        } = node
        else {
            return None;
        };
        let (left, right): (&Node, &Node) = (left, right);
        let is = |operand: &Node, target: f64| self.constant_equals(operand, target);

        match op {
            OperatorKind::Add if is(left, 0.0) => Some(Rewrite::KeepRight),
            OperatorKind::Add if is(right, 0.0) => Some(Rewrite::KeepLeft),
            OperatorKind::Sub if is(right, 0.0) => Some(Rewrite::KeepLeft),
            OperatorKind::Mul if is(left, 0.0) || is(right, 0.0) => Some(Rewrite::Zero),
            OperatorKind::Mul if is(left, 1.0) => Some(Rewrite::KeepRight),
            OperatorKind::Mul if is(right, 1.0) => Some(Rewrite::KeepLeft),
            OperatorKind::Div if is(left, 0.0) => Some(Rewrite::Zero),
            _ => None,
        }
    }

    fn constant_equals(&self, node: &Node, target: f64) -> bool {
        is_constant(node)
            && evaluate(node, self.symbols).is_ok_and(|value| approx_eq(value, target))
    }
}

fn apply_rewrite(node: &mut Node, rewrite: Rewrite) {
    let Node::Operator { left, right, .. } = node else {
        return;
    };
    let replacement = match rewrite {
        Rewrite::KeepLeft => left.take().map(|child| *child).unwrap_or_default(),
        Rewrite::KeepRight => right.take().map(|child| *child).unwrap_or_default(),
        Rewrite::Zero => Node::Number(0.0),
    };
    *node = replacement;
}

/// Simplifies `tree` in place using `symbols` for the evaluator.
pub fn simplify(tree: &mut Tree, symbols: &SymbolTable) -> EvalResult<SimplifyReport> {
    Simplifier::new(symbols).run(tree)
}
