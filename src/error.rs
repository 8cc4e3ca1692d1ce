use thiserror::Error;

/// All failure modes of the pipeline, from source text to output file.
///
/// Each variant is one externally observable error kind: the CLI prints the
/// `Display` form and exits non-zero, tests match on the variant. Lexical
/// errors have no variant of their own; the lexer drops bad tokens and the
/// damage surfaces as a [Error::Parse] at the surrounding context.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// The source text does not match the grammar.
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        line: u32,
        column: u32,
        message: String,
    },

    /// Semantic failure while building the execution plan.
    ///
    /// Reserved: every check that could fail here is currently deferred to
    /// execution time (column names are resolved by the VM), so no code path
    /// constructs this variant yet.
    #[error("compile error: {0}")]
    Compile(String),

    /// Failure during plan execution: unknown column, type mismatch,
    /// division by zero, or a corrupted interpreter stack.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// Failure reading, parsing, or writing a CSV file or the script itself.
    #[error("io error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a [Error::Runtime] with a formatted message.
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }

    /// Shorthand for a [Error::Io] with a formatted message.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }
}
