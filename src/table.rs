use std::{collections::HashMap, sync::Arc};

use crate::data_type::DataType;
use crate::error::{Error, Result};

/// Column definition in the schema
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: Arc<DataType>,
}

/// A table schema: ordered column definitions plus a name lookup.
#[derive(Debug, Clone, Default)]
pub struct TableStructure {
    columns: Vec<ColumnDef>,
    column_indices: HashMap<String, usize>,
}

impl TableStructure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column definition.
    ///
    /// # Errors
    /// Returns [Error::DuplicateColumn] if the name is already defined.
    pub fn add_column(&mut self, name: impl Into<String>, data_type: Arc<DataType>) -> Result<()> {
        let name = name.into();
        if self.column_indices.contains_key(&name) {
            return Err(Error::DuplicateColumn(name));
        }
        self.column_indices.insert(name.clone(), self.columns.len());
        self.columns.push(ColumnDef { name, data_type });
        Ok(())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_at(&self, idx: usize) -> Option<&ColumnDef> {
        self.columns.get(idx)
    }

    /// # Errors
    /// Returns [Error::ColumnNotFound] if no column has this name.
    pub fn column_by_name(&self, name: &str) -> Result<&ColumnDef> {
        self.position(name)
            .map(|idx| &self.columns[idx])
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_indices.contains_key(name)
    }

    /// Index of the named column in declaration order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.column_indices.get(name).copied()
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }
}

impl PartialEq for TableStructure {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}
