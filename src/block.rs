use std::{collections::HashMap, sync::Arc};

use crate::column::Column;
use crate::error::{Error, Result};
use crate::value::Field;

/// One named column of a [Block].
#[derive(Debug, Clone)]
pub struct ColumnWithName {
    pub name: String,
    /// Shared so that storage reads can hand out columns without copying them.
    pub column: Arc<Column>,
}

/// An ordered group of named, equal-length columns.
///
/// A block is the unit of columnar interchange between the executor and the
/// storage engines.
#[derive(Debug, Clone, Default)]
pub struct Block {
    columns: Vec<ColumnWithName>,
    column_indices: HashMap<String, usize>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column.
    ///
    /// Adding a name that already exists keeps the earlier column in place and
    /// only rebinds the name lookup to the new one.
    pub fn add_column(&mut self, name: impl Into<String>, column: Arc<Column>) {
        let name = name.into();
        self.column_indices.insert(name.clone(), self.columns.len());
        self.columns.push(ColumnWithName { name, column });
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_at(&self, idx: usize) -> Option<&ColumnWithName> {
        self.columns.get(idx)
    }

    /// # Errors
    /// Returns [Error::ColumnNotFound] if no column has this name.
    pub fn column_by_name(&self, name: &str) -> Result<&ColumnWithName> {
        self.column_indices
            .get(name)
            .map(|&idx| &self.columns[idx])
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_indices.contains_key(name)
    }

    pub fn columns(&self) -> impl Iterator<Item = &ColumnWithName> {
        self.columns.iter()
    }

    /// Number of rows: 0 for a block without columns, else the first column's length.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.column.len())
    }

    /// Returns true iff every column has the same length.
    pub fn is_valid(&self) -> bool {
        let rows = self.row_count();
        self.columns.iter().all(|c| c.column.len() == rows)
    }

    /// Returns every value of row `row_idx`, in column order.
    pub fn row(&self, row_idx: usize) -> Option<Vec<Field>> {
        if row_idx >= self.row_count() {
            return None;
        }
        self.columns.iter().map(|c| c.column.get(row_idx)).collect()
    }

    pub fn clear(&mut self) {
        self.columns.clear();
        self.column_indices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::DataType;

    fn int_column(values: &[i32]) -> Arc<Column> {
        let column = Column::from_fields(
            Arc::new(DataType::Int32),
            values.iter().map(|v| Field::Int32(*v)),
        )
        .unwrap();
        Arc::new(column)
    }

    #[test]
    fn test_empty_block() {
        let block = Block::new();
        assert_eq!(block.column_count(), 0);
        assert_eq!(block.row_count(), 0);
        assert!(block.is_valid());
        assert!(block.row(0).is_none());
    }

    #[test]
    fn test_add_and_lookup() {
        let mut block = Block::new();
        block.add_column("a", int_column(&[1, 2]));
        block.add_column("b", int_column(&[3, 4]));

        assert_eq!(block.column_count(), 2);
        assert_eq!(block.row_count(), 2);
        assert!(block.is_valid());
        assert_eq!(block.column_at(1).unwrap().name, "b");
        assert_eq!(
            block.column_by_name("a").unwrap().column.get(1),
            Some(Field::Int32(2))
        );
        assert_eq!(block.row(0), Some(vec![Field::Int32(1), Field::Int32(3)]));
        assert_eq!(
            block.column_by_name("zzz").unwrap_err(),
            Error::ColumnNotFound("zzz".into())
        );
    }

    #[test]
    fn test_unequal_lengths_are_invalid() {
        let mut block = Block::new();
        block.add_column("a", int_column(&[1, 2]));
        block.add_column("b", int_column(&[1]));
        assert!(!block.is_valid());
    }

    #[test]
    fn test_duplicate_name_rebinds_lookup_only() {
        let mut block = Block::new();
        block.add_column("a", int_column(&[1]));
        block.add_column("a", int_column(&[2]));

        assert_eq!(block.column_count(), 2);
        assert_eq!(block.column_at(0).unwrap().column.get(0), Some(Field::Int32(1)));
        assert_eq!(
            block.column_by_name("a").unwrap().column.get(0),
            Some(Field::Int32(2))
        );
    }

    #[test]
    fn test_clone_shares_columns() {
        let mut block = Block::new();
        block.add_column("a", int_column(&[1]));
        let copy = block.clone();
        assert!(Arc::ptr_eq(
            &block.column_at(0).unwrap().column,
            &copy.column_at(0).unwrap().column
        ));
    }
}
