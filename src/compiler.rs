use log::debug;

use crate::ast::{BinaryOp, Expr, Literal, Program, Stmt, UnaryOp};
use crate::error::Result;
use crate::plan::{Bytecode, CmpOp, Instruction, PhysicalOp, Plan, Scalar};

/// Lowers a parsed [Program] into an executable [Plan].
///
/// Each statement becomes one physical operator. `filter` statements are
/// first offered to the vectorization peephole; predicates it rejects are
/// compiled to stack bytecode and run row-at-a-time.
pub struct Compiler {
    vectorize: bool,
}

impl Compiler {
    /// Creates a compiler with the vectorized filter path enabled.
    pub fn new() -> Self {
        Self { vectorize: true }
    }

    /// Disables the vectorization peephole: every `filter` compiles to the
    /// scalar bytecode path. Both paths produce identical tables; this
    /// switch exists to observe (and test) exactly that.
    pub fn without_vectorization(mut self) -> Self {
        self.vectorize = false;
        self
    }

    /// Compiles a program into an execution plan.
    ///
    /// # Errors
    /// Currently infallible: all semantic checks (column names, operand
    /// types) are deferred to the VM. The `Result` is the reserved slot for
    /// plan-building diagnostics.
    pub fn compile(&self, program: &Program) -> Result<Plan> {
        let mut plan = Plan::default();
        for stmt in &program.statements {
            plan.operators.push(self.compile_stmt(stmt));
        }
        Ok(plan)
    }

    /// Compiles a single statement into a physical operator.
    fn compile_stmt(&self, stmt: &Stmt) -> PhysicalOp {
        match stmt {
            Stmt::From { path } => PhysicalOp::Scan { path: path.clone() },
            Stmt::Filter { condition } => {
                if self.vectorize {
                    if let Some(op) = try_vectorize(condition) {
                        debug!("filter vectorized: {condition}");
                        return op;
                    }
                }
                debug!("filter takes the scalar path: {condition}");
                PhysicalOp::Filter {
                    predicate: compile_expr(condition),
                }
            }
            Stmt::Select { columns } => PhysicalOp::Project {
                columns: columns.clone(),
            },
            Stmt::Write { path } => PhysicalOp::Write { path: path.clone() },
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Compiles an expression tree into postfix stack bytecode: left operand,
/// right operand, then the operator.
///
/// # Example
/// ```
/// # use sift::compiler::compile_expr;
/// # use sift::lexer::Lexer;
/// # use sift::parser::Parser;
/// # use sift::plan::Instruction;
/// # use sift::ast::Stmt;
/// let tokens = Lexer::new("from \"t.csv\" filter age > 30").tokenize();
/// let program = Parser::new(tokens).parse().unwrap();
/// let Stmt::Filter { condition } = &program.statements[1] else { unreachable!() };
///
/// let code = compile_expr(condition);
/// assert_eq!(
///     code.instructions,
///     vec![
///         Instruction::LoadColumn("age".into()),
///         Instruction::PushInt(30),
///         Instruction::Gt,
///     ]
/// );
/// ```
pub fn compile_expr(expr: &Expr) -> Bytecode {
    let mut code = Bytecode::default();
    emit(expr, &mut code.instructions);
    code
}

fn emit(expr: &Expr, out: &mut Vec<Instruction>) {
    match expr {
        Expr::Literal(lit) => out.push(match lit {
            Literal::Int(value) => Instruction::PushInt(*value),
            Literal::Double(value) => Instruction::PushDouble(*value),
            Literal::Text(value) => Instruction::PushText(value.clone()),
            Literal::Bool(value) => Instruction::PushBool(*value),
        }),
        Expr::Column(name) => out.push(Instruction::LoadColumn(name.clone())),
        Expr::Binary { op, left, right } => {
            emit(left, out);
            emit(right, out);
            out.push(binary_instruction(*op));
        }
        Expr::Unary { op, operand } => {
            emit(operand, out);
            out.push(match op {
                UnaryOp::Neg => Instruction::Neg,
                UnaryOp::Not => Instruction::Not,
            });
        }
    }
}

fn binary_instruction(op: BinaryOp) -> Instruction {
    match op {
        BinaryOp::Add => Instruction::Add,
        BinaryOp::Sub => Instruction::Sub,
        BinaryOp::Mul => Instruction::Mul,
        BinaryOp::Div => Instruction::Div,
        BinaryOp::Eq => Instruction::Eq,
        BinaryOp::Neq => Instruction::Neq,
        BinaryOp::Lt => Instruction::Lt,
        BinaryOp::Gt => Instruction::Gt,
        BinaryOp::Lte => Instruction::Lte,
        BinaryOp::Gte => Instruction::Gte,
    }
}

fn comparison_op(op: BinaryOp) -> Option<CmpOp> {
    match op {
        BinaryOp::Eq => Some(CmpOp::Eq),
        BinaryOp::Neq => Some(CmpOp::Neq),
        BinaryOp::Lt => Some(CmpOp::Lt),
        BinaryOp::Gt => Some(CmpOp::Gt),
        BinaryOp::Lte => Some(CmpOp::Lte),
        BinaryOp::Gte => Some(CmpOp::Gte),
        _ => None,
    }
}

fn scalar_literal(lit: &Literal) -> Option<Scalar> {
    match lit {
        Literal::Int(value) => Some(Scalar::Int(*value)),
        Literal::Double(value) => Some(Scalar::Double(*value)),
        Literal::Text(value) => Some(Scalar::Text(value.clone())),
        // No Bool kernel: such predicates stay on the scalar path
        Literal::Bool(_) => None,
    }
}

/// The vectorization peephole.
///
/// A predicate is vectorizable iff it is a single binary comparison whose
/// operands are, in some order, one column reference and one Int, Double, or
/// Text literal. With the literal on the left the operator is mirrored
/// (`30 < age` becomes `age > 30`). Anything else returns `None` and falls
/// back to bytecode, which the kernels must match result-for-result.
fn try_vectorize(condition: &Expr) -> Option<PhysicalOp> {
    let Expr::Binary { op, left, right } = condition else {
        return None;
    };
    let cmp = comparison_op(*op)?;

    match (left.as_ref(), right.as_ref()) {
        (Expr::Column(name), Expr::Literal(lit)) => Some(PhysicalOp::VectorizedFilter {
            column: name.clone(),
            op: cmp,
            value: scalar_literal(lit)?,
        }),
        (Expr::Literal(lit), Expr::Column(name)) => Some(PhysicalOp::VectorizedFilter {
            column: name.clone(),
            op: cmp.mirror(),
            value: scalar_literal(lit)?,
        }),
        _ => None,
    }
}
