use std::fmt;
use std::sync::Arc;

/// A literal value as written in the source, with its type tag.
///
/// Bool literals have no surface syntax (the language has no `true`/`false`
/// keywords); the variant exists so expression trees built programmatically
/// can carry them, and so the compiler can refuse to vectorize them.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Double(f64),
    Text(Arc<str>),
    Bool(bool),
}

/// Binary operators, in source notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `==`
    Eq,
    /// `!=`
    Neq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Lte,
    /// `>=`
    Gte,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Numeric negation `-x`
    Neg,
    /// Logical negation `not x`
    Not,
}

/// A node in the expression tree of a `filter` condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A constant value.
    Literal(Literal),
    /// A reference to a column of the current table, by name.
    Column(String),
    /// A binary operation on two sub-expressions.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// A unary operation on one sub-expression.
    Unary { op: UnaryOp, operand: Box<Expr> },
}

/// Represents the top-level statements of a pipeline program.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Load a CSV file as the current table.
    From { path: String },
    /// Keep only the rows for which the condition holds.
    Filter { condition: Expr },
    /// Keep only the named columns, in the given order.
    Select { columns: Vec<String> },
    /// Write the current table to a CSV file.
    Write { path: String },
}

/// An ordered sequence of statements; the first is always a [Stmt::From].
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl BinaryOp {
    /// The source spelling of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Lte => "<=",
            Self::Gte => ">=",
        }
    }
}

// The Display impls print canonical, re-parseable source: expressions are
// fully parenthesized and doubles always keep a decimal point, so
// parse(print(parse(s))) == parse(s).

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Double(d) => {
                if d.fract() == 0.0 && d.is_finite() {
                    write!(f, "{d:.1}")
                } else {
                    write!(f, "{d}")
                }
            }
            Self::Text(s) => write!(f, "\"{s}\""),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Column(name) => write!(f, "{name}"),
            Self::Binary { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            Self::Unary { op, operand } => match op {
                UnaryOp::Neg => write!(f, "(-{operand})"),
                UnaryOp::Not => write!(f, "(not {operand})"),
            },
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::From { path } => write!(f, "from \"{path}\""),
            Self::Filter { condition } => write!(f, "filter {condition}"),
            Self::Select { columns } => write!(f, "select {}", columns.join(", ")),
            Self::Write { path } => write!(f, "write \"{path}\""),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stmt) in self.statements.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{stmt}")?;
        }
        Ok(())
    }
}
