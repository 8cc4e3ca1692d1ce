use log::debug;

use crate::csv;
use crate::error::{Error, Result};
use crate::kernels::{self, SelectionVector};
use crate::plan::{Bytecode, CmpOp, Instruction, PhysicalOp, Plan, Scalar};
use crate::table::Table;
use crate::value::Value;

/// The virtual machine: executes a [Plan] operator by operator over a single
/// owned table.
///
/// The machine starts with no table; only `Scan` is valid in that state.
/// Every subsequent operator consumes the current table and replaces it with
/// its result. The interpreter stack is owned here and reused across rows
/// (cleared before each evaluation).
pub struct Vm {
    current_table: Option<Table>,
    stack: Vec<Value>,
}

impl Vm {
    /// Creates a VM in the initial state (no table loaded).
    pub fn new() -> Self {
        Self {
            current_table: None,
            stack: Vec::new(),
        }
    }

    /// Creates a VM whose current table is already materialized, for running
    /// plans against in-memory data without a `Scan`.
    pub fn with_table(table: Table) -> Self {
        Self {
            current_table: Some(table),
            stack: Vec::new(),
        }
    }

    /// Executes every operator of the plan in order.
    ///
    /// # Errors
    /// Any operator failure aborts the pipeline and is returned as-is; the
    /// partially transformed table is discarded. A `write` that already
    /// happened is not rolled back.
    pub fn execute(&mut self, plan: &Plan) -> Result<()> {
        for op in &plan.operators {
            match op {
                PhysicalOp::Scan { path } => self.execute_scan(path)?,
                PhysicalOp::Filter { predicate } => self.execute_filter(predicate)?,
                PhysicalOp::VectorizedFilter { column, op, value } => {
                    self.execute_vectorized_filter(column, *op, value)?
                }
                PhysicalOp::Project { columns } => self.execute_project(columns)?,
                PhysicalOp::Write { path } => self.execute_write(path)?,
            }
        }
        Ok(())
    }

    /// The current table, if any operator has produced one.
    pub fn table(&self) -> Option<&Table> {
        self.current_table.as_ref()
    }

    /// Consumes the VM and returns the final table.
    pub fn into_table(self) -> Option<Table> {
        self.current_table
    }

    /// Takes the current table or reports that the pipeline has no input yet.
    fn take_table(&mut self, op_name: &str) -> Result<Table> {
        self.current_table.take().ok_or_else(|| {
            Error::runtime(format!(
                "'{op_name}' has no input table; a pipeline starts with 'from'"
            ))
        })
    }

    fn execute_scan(&mut self, path: &str) -> Result<()> {
        let table = csv::read_csv(path)?;
        debug!(
            "scan {path:?}: {} columns, {} rows",
            table.columns.len(),
            table.row_count
        );
        self.current_table = Some(table);
        Ok(())
    }

    /// Row-at-a-time filter: evaluates the predicate bytecode once per row
    /// and keeps the rows where the result is truthy.
    fn execute_filter(&mut self, predicate: &Bytecode) -> Result<()> {
        let table = self.take_table("filter")?;

        let mut selection = SelectionVector::with_capacity(table.row_count);
        for row_idx in 0..table.row_count {
            let value = eval_expr(&mut self.stack, &table, predicate, row_idx)?;
            selection.push(is_truthy(&value)?);
        }

        let result = table.filtered(&selection)?;
        debug!("filter: {} rows in, {} out", table.row_count, result.row_count);
        self.current_table = Some(result);
        Ok(())
    }

    /// Column-at-a-time filter: one kernel pass produces the selection
    /// vector, then rows are materialized exactly as the scalar filter does.
    fn execute_vectorized_filter(&mut self, column: &str, op: CmpOp, value: &Scalar) -> Result<()> {
        let table = self.take_table("filter")?;

        let col = table
            .get_col(column)
            .ok_or_else(|| Error::runtime(format!("Column not found: {column}")))?;

        if table.row_count == 0 {
            self.current_table = Some(table);
            return Ok(());
        }

        let selection = kernels::compare_column(col, op, value)?;
        let result = table.filtered(&selection)?;
        debug!(
            "vectorized filter on {column}: {} rows in, {} out",
            table.row_count, result.row_count
        );
        self.current_table = Some(result);
        Ok(())
    }

    fn execute_project(&mut self, columns: &[String]) -> Result<()> {
        let table = self.take_table("select")?;
        self.current_table = Some(table.project(columns)?);
        Ok(())
    }

    fn execute_write(&mut self, path: &str) -> Result<()> {
        let table = self.take_table("write")?;
        csv::write_csv(path, &table)?;
        debug!("write {path:?}: {} rows", table.row_count);
        self.current_table = Some(table);
        Ok(())
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

/// Interprets a truthiness check at the filter boundary: `Bool` is itself,
/// `Int` is non-zero, `Null` collapses to false (three-valued logic
/// flattened), anything else is an error.
fn is_truthy(value: &Value) -> Result<bool> {
    match value {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        Value::Int(i) => Ok(*i != 0),
        _ => Err(Error::runtime("Filter predicate must return boolean")),
    }
}

/// Evaluates predicate bytecode for one row on a stack machine.
///
/// The stack is cleared first; after the last instruction it must hold
/// exactly one value, which is the result. Numeric promotion and NULL
/// propagation follow SQL-flavored rules: `NULL` poisons arithmetic, turns
/// comparisons false, and `Int` pairs stay integral while mixed numeric
/// pairs are promoted to doubles.
fn eval_expr(
    stack: &mut Vec<Value>,
    table: &Table,
    code: &Bytecode,
    row_idx: usize,
) -> Result<Value> {
    stack.clear();

    for instr in &code.instructions {
        match instr {
            Instruction::PushInt(value) => stack.push(Value::Int(*value)),
            Instruction::PushDouble(value) => stack.push(Value::Double(*value)),
            Instruction::PushText(value) => stack.push(Value::Text(value.clone())),
            Instruction::PushBool(value) => stack.push(Value::Bool(*value)),

            Instruction::LoadColumn(name) => {
                let col = table
                    .get_col(name)
                    .ok_or_else(|| Error::runtime(format!("Column not found: {name}")))?;
                let value = col.get(row_idx).ok_or_else(|| {
                    Error::runtime(format!("Row {row_idx} out of range for column {name}"))
                })?;
                stack.push(value);
            }

            Instruction::Add => apply_arith(stack, "add", |x, y| x + y, |x, y| x + y)?,
            Instruction::Sub => apply_arith(stack, "subtract", |x, y| x - y, |x, y| x - y)?,
            Instruction::Mul => apply_arith(stack, "multiply", |x, y| x * y, |x, y| x * y)?,
            Instruction::Div => apply_div(stack)?,

            Instruction::Neg => {
                let a = pop(stack)?;
                match a {
                    Value::Null => stack.push(Value::Null),
                    Value::Int(x) => stack.push(Value::Int(-x)),
                    Value::Double(x) => stack.push(Value::Double(-x)),
                    _ => return Err(Error::runtime("Cannot negate non-numeric value")),
                }
            }

            Instruction::Eq => apply_cmp(stack, CmpOp::Eq)?,
            Instruction::Neq => apply_cmp(stack, CmpOp::Neq)?,
            Instruction::Lt => apply_cmp(stack, CmpOp::Lt)?,
            Instruction::Gt => apply_cmp(stack, CmpOp::Gt)?,
            Instruction::Lte => apply_cmp(stack, CmpOp::Lte)?,
            Instruction::Gte => apply_cmp(stack, CmpOp::Gte)?,

            Instruction::Not => {
                let a = pop(stack)?;
                match a {
                    Value::Null => stack.push(Value::Bool(false)),
                    Value::Bool(b) => stack.push(Value::Bool(!b)),
                    Value::Int(x) => stack.push(Value::Bool(x == 0)),
                    _ => return Err(Error::runtime("Cannot apply NOT to non-boolean value")),
                }
            }
        }
    }

    match stack.pop() {
        Some(value) if stack.is_empty() => Ok(value),
        _ => Err(Error::runtime(
            "Expression evaluation error: invalid stack state",
        )),
    }
}

fn pop(stack: &mut Vec<Value>) -> Result<Value> {
    stack.pop().ok_or_else(|| {
        Error::runtime("Expression evaluation error: invalid stack state")
    })
}

/// Pops right then left, applies NULL propagation and numeric promotion:
/// Int op Int stays Int, any other numeric pair is computed in doubles.
fn apply_arith(
    stack: &mut Vec<Value>,
    verb: &str,
    int_op: fn(i64, i64) -> i64,
    double_op: fn(f64, f64) -> f64,
) -> Result<()> {
    let b = pop(stack)?;
    let a = pop(stack)?;

    if a.is_null() || b.is_null() {
        stack.push(Value::Null);
        return Ok(());
    }

    if let (Value::Int(x), Value::Int(y)) = (&a, &b) {
        stack.push(Value::Int(int_op(*x, *y)));
        return Ok(());
    }

    match (a.as_double(), b.as_double()) {
        (Some(x), Some(y)) => {
            stack.push(Value::Double(double_op(x, y)));
            Ok(())
        }
        _ => Err(Error::runtime(format!("Cannot {verb} non-numeric types"))),
    }
}

/// Division follows the arithmetic rules plus a zero-divisor check on both
/// the integral and the double path.
fn apply_div(stack: &mut Vec<Value>) -> Result<()> {
    let b = pop(stack)?;
    let a = pop(stack)?;

    if a.is_null() || b.is_null() {
        stack.push(Value::Null);
        return Ok(());
    }

    if let (Value::Int(x), Value::Int(y)) = (&a, &b) {
        if *y == 0 {
            return Err(Error::runtime("Division by zero"));
        }
        stack.push(Value::Int(x / y));
        return Ok(());
    }

    match (a.as_double(), b.as_double()) {
        (Some(x), Some(y)) => {
            if y == 0.0 {
                return Err(Error::runtime("Division by zero"));
            }
            stack.push(Value::Double(x / y));
            Ok(())
        }
        _ => Err(Error::runtime("Cannot divide non-numeric types")),
    }
}

/// Pops right then left and pushes the boolean comparison result. A NULL on
/// either side compares false. Numeric pairs promote like arithmetic; text
/// compares lexicographically; booleans support only equality.
fn apply_cmp(stack: &mut Vec<Value>, op: CmpOp) -> Result<()> {
    let b = pop(stack)?;
    let a = pop(stack)?;

    if a.is_null() || b.is_null() {
        stack.push(Value::Bool(false));
        return Ok(());
    }

    let result = match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => cmp_int(op, *x, *y),
        (Value::Text(x), Value::Text(y)) => cmp_str(op, x, y),
        (Value::Bool(x), Value::Bool(y)) => match op {
            CmpOp::Eq => x == y,
            CmpOp::Neq => x != y,
            _ => return Err(Error::runtime("Cannot compare incompatible types")),
        },
        _ => match (a.as_double(), b.as_double()) {
            (Some(x), Some(y)) => cmp_double(op, x, y),
            _ => return Err(Error::runtime("Cannot compare incompatible types")),
        },
    };

    stack.push(Value::Bool(result));
    Ok(())
}

fn cmp_int(op: CmpOp, x: i64, y: i64) -> bool {
    match op {
        CmpOp::Eq => x == y,
        CmpOp::Neq => x != y,
        CmpOp::Lt => x < y,
        CmpOp::Gt => x > y,
        CmpOp::Lte => x <= y,
        CmpOp::Gte => x >= y,
    }
}

fn cmp_double(op: CmpOp, x: f64, y: f64) -> bool {
    match op {
        CmpOp::Eq => x == y,
        CmpOp::Neq => x != y,
        CmpOp::Lt => x < y,
        CmpOp::Gt => x > y,
        CmpOp::Lte => x <= y,
        CmpOp::Gte => x >= y,
    }
}

fn cmp_str(op: CmpOp, x: &str, y: &str) -> bool {
    match op {
        CmpOp::Eq => x == y,
        CmpOp::Neq => x != y,
        CmpOp::Lt => x < y,
        CmpOp::Gt => x > y,
        CmpOp::Lte => x <= y,
        CmpOp::Gte => x >= y,
    }
}
