use bitvec::slice::BitSlice;

use crate::column::Column;
use crate::error::{Error, Result};
use crate::value::Value;

/// An in-memory, column-major table.
///
/// All columns share the same length, which equals `row_count`. Column names
/// are looked up first-match; the pipeline operators treat the table as a
/// value that each operator consumes and replaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub row_count: usize,
}

impl Table {
    /// Creates a table from pre-built columns. The row count is taken from
    /// the first column (all columns are expected to have equal length).
    pub fn new(columns: Vec<Column>) -> Self {
        let row_count = columns.first().map(|c| c.len()).unwrap_or(0);
        Self { columns, row_count }
    }

    /// Retrieves a reference to a column by name. The first column with a
    /// matching name wins.
    pub fn get_col(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|col| col.name == name)
    }

    /// Creates an empty table with the same column names and types.
    pub fn empty_like(&self) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|col| Column::new(col.name.clone(), col.data_type))
            .collect();
        Table {
            columns,
            row_count: 0,
        }
    }

    /// Materializes a new table containing exactly the rows whose bit is set
    /// in `selection`, preserving column order, types, and NULLs.
    ///
    /// Both the scalar and the vectorized filter build their result through
    /// this single routine, so the two paths cannot diverge in layout.
    ///
    /// # Errors
    /// Returns an error if a selected value cannot be appended to the result
    /// column (an internal type invariant violation).
    pub fn filtered(&self, selection: &BitSlice) -> Result<Table> {
        let mut result = self.empty_like();

        for row_idx in selection.iter_ones() {
            for (src, dst) in self.columns.iter().zip(result.columns.iter_mut()) {
                dst.push(src.get(row_idx).unwrap_or(Value::Null))?;
            }
            result.row_count += 1;
        }

        Ok(result)
    }

    /// Rebuilds the table with the named columns, in the given order.
    ///
    /// The same source column may be named more than once; each mention is
    /// copied independently.
    ///
    /// # Errors
    /// Returns a runtime error if any name does not match a column.
    ///
    /// # Example
    /// ```
    /// # use sift::column::Column;
    /// # use sift::data_type::DataType;
    /// # use sift::table::Table;
    /// # use sift::value::Value;
    /// let mut a = Column::new("a".into(), DataType::Int);
    /// a.push(Value::Int(1)).unwrap();
    /// let mut b = Column::new("b".into(), DataType::Int);
    /// b.push(Value::Int(2)).unwrap();
    ///
    /// let table = Table::new(vec![a, b]);
    /// let projected = table.project(&["b".into(), "a".into()]).unwrap();
    /// assert_eq!(projected.columns[0].name, "b");
    /// assert_eq!(projected.columns[1].name, "a");
    /// ```
    pub fn project(&self, names: &[String]) -> Result<Table> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let col = self
                .get_col(name)
                .ok_or_else(|| Error::runtime(format!("Column not found: {name}")))?;
            columns.push(col.clone());
        }
        Ok(Table {
            columns,
            row_count: self.row_count,
        })
    }
}
