use crate::models::BigQueryError;
use crate::schema::Value;

/// Materialized query output: decoded rows plus the column names that label
/// them, in schema order.
///
/// Every row holds exactly one cell per column. The service does not
/// guarantee unique column names, so positional access is the primary
/// interface; name lookup resolves duplicates last-wins.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    column_names: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl ResultTable {
    /// Combines decoded rows with their column names, checking that every
    /// row's length matches the column count.
    pub fn assemble(
        rows: Vec<Vec<Value>>,
        column_names: Vec<String>,
    ) -> Result<Self, BigQueryError> {
        for row in &rows {
            if row.len() != column_names.len() {
                return Err(BigQueryError::RowShape {
                    expected: column_names.len(),
                    got: row.len(),
                });
            }
        }

        Ok(Self { column_names, rows })
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn num_columns(&self) -> usize {
        self.column_names.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row)?.get(column)
    }

    /// Position of the named column; with duplicate names the last
    /// occurrence wins.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().rposition(|n| n == name)
    }

    /// Cell lookup by column name, last-wins on duplicates.
    pub fn value_by_name(&self, row: usize, name: &str) -> Option<&Value> {
        self.value(row, self.column_index(name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_and_named_access() {
        let table = ResultTable::assemble(
            vec![
                vec![Value::Integer(1), Value::String("a".into())],
                vec![Value::Integer(2), Value::String("b".into())],
            ],
            vec!["id".into(), "name".into()],
        )
        .unwrap();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.value(1, 0), Some(&Value::Integer(2)));
        assert_eq!(table.value_by_name(0, "name"), Some(&Value::String("a".into())));
        assert_eq!(table.value_by_name(0, "missing"), None);
    }

    #[test]
    fn mismatched_row_is_rejected() {
        let err = ResultTable::assemble(
            vec![vec![Value::Integer(1)], vec![]],
            vec!["id".into()],
        )
        .unwrap_err();

        assert!(matches!(
            err,
            BigQueryError::RowShape {
                expected: 1,
                got: 0
            }
        ));
    }

    #[test]
    fn duplicate_column_names_resolve_last_wins() {
        let table = ResultTable::assemble(
            vec![vec![Value::Integer(1), Value::Integer(2)]],
            vec!["n".into(), "n".into()],
        )
        .unwrap();

        assert_eq!(table.column_index("n"), Some(1));
        assert_eq!(table.value_by_name(0, "n"), Some(&Value::Integer(2)));
    }

    #[test]
    fn empty_table_keeps_its_columns() {
        let table =
            ResultTable::assemble(vec![], vec!["id".into(), "name".into()]).unwrap();

        assert!(table.is_empty());
        assert_eq!(table.column_names(), ["id", "name"]);
    }
}
