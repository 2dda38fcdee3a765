use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use log::{debug, info};

use crate::aggregate;
use crate::ast::{
    AggregateFunction, ColumnExpression, Command, CreateTable, Describe, DropTable, Insert,
    Select, SelectColumns,
};
use crate::block::Block;
use crate::column::Column;
use crate::data_type::{DataType, TypeFactory};
use crate::error::{Error, ErrorKind, Result};
use crate::storage::{MEMORY_ENGINE, StorageEngine, StorageFactory};
use crate::table::TableStructure;
use crate::value::Field;

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// Engine used by `CREATE TABLE` statements without an `ENGINE` clause.
    pub default_engine: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            default_engine: MEMORY_ENGINE.to_string(),
        }
    }
}

/// Outcome of one statement: an error, or a message plus result blocks.
#[derive(Debug, Clone)]
pub struct QueryResult {
    error: Option<Error>,
    message: String,
    blocks: Vec<Block>,
    column_names: Vec<String>,
}

impl QueryResult {
    /// A successful result without data.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            error: None,
            message: message.into(),
            blocks: Vec::new(),
            column_names: Vec::new(),
        }
    }

    /// A successful result carrying rows.
    pub fn with_data(blocks: Vec<Block>, column_names: Vec<String>) -> Self {
        Self {
            error: None,
            message: String::new(),
            blocks,
            column_names,
        }
    }

    pub fn failure(error: Error) -> Self {
        Self {
            message: error.to_string(),
            error: Some(error),
            blocks: Vec::new(),
            column_names: Vec::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    /// Informational message of a successful result (empty for data results).
    pub fn message(&self) -> &str {
        if self.success() { self.message.as_str() } else { "" }
    }

    /// Human-readable failure, empty on success.
    pub fn error_message(&self) -> &str {
        if self.success() { "" } else { self.message.as_str() }
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(Error::kind)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn row_count(&self) -> usize {
        self.blocks.iter().map(Block::row_count).sum()
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    /// All rows across blocks, in scan order.
    pub fn rows(&self) -> Vec<Vec<Field>> {
        self.blocks
            .iter()
            .flat_map(|block| (0..block.row_count()).filter_map(|row| block.row(row)))
            .collect()
    }
}

/// Interprets commands against the table registry.
///
/// Mutating commands need `&mut self`, so a single writer is enforced by the
/// borrow checker; read-only commands also run through [Executor::query].
#[derive(Debug, Default)]
pub struct Executor {
    tables: HashMap<String, Box<dyn StorageEngine>>,
    type_factory: TypeFactory,
    storage_factory: StorageFactory,
    config: DatabaseConfig,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DatabaseConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Registry of engines available to `CREATE TABLE ... ENGINE = name`.
    pub fn storage_factory_mut(&mut self) -> &mut StorageFactory {
        &mut self.storage_factory
    }

    pub fn table(&self, name: &str) -> Option<&dyn StorageEngine> {
        self.tables.get(name).map(|engine| engine.as_ref())
    }

    /// Registered table names, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Executes any command.
    pub fn execute(&mut self, command: Command) -> Result<QueryResult> {
        debug!("executing {} statement", command.name());
        match command {
            Command::CreateTable(create) => self.create_table(create),
            Command::Insert(insert) => self.insert(insert),
            Command::DropTable(drop) => self.drop_table(drop),
            read_only => self.query(&read_only),
        }
    }

    /// Executes a read-only command.
    ///
    /// # Errors
    /// Returns [Error::MutatingStatement] for commands that change the database.
    pub fn query(&self, command: &Command) -> Result<QueryResult> {
        match command {
            Command::Select(select) => self.select(select),
            Command::ShowTables => self.show_tables(),
            Command::Describe(describe) => self.describe(describe),
            other => Err(Error::MutatingStatement(other.name())),
        }
    }

    fn storage(&self, name: &str) -> Result<&dyn StorageEngine> {
        self.table(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    fn create_table(&mut self, create: CreateTable) -> Result<QueryResult> {
        if self.tables.contains_key(&create.name) {
            return Err(Error::TableAlreadyExists(create.name));
        }

        let mut structure = TableStructure::new();
        for column in create.columns {
            let data_type = self.type_factory.create(&column.type_name).map_err(|_| {
                Error::UnknownColumnType {
                    column: column.name.clone(),
                    type_name: column.type_name.clone(),
                }
            })?;
            structure.add_column(column.name, data_type)?;
        }

        let engine_name = create
            .engine
            .unwrap_or_else(|| self.config.default_engine.clone());
        let engine = self.storage_factory.create(&engine_name, structure)?;

        info!(
            "created table '{}' ({} columns, engine {})",
            create.name,
            engine.schema().column_count(),
            engine_name
        );
        let message = format!("Table '{}' created successfully", create.name);
        self.tables.insert(create.name, engine);
        Ok(QueryResult::with_message(message))
    }

    fn insert(&self, insert: Insert) -> Result<QueryResult> {
        let storage = self.storage(&insert.table)?;
        let schema = storage.schema();

        // schema positions the values of each row go to
        let targets: Vec<usize> = match &insert.columns {
            None => (0..schema.column_count()).collect(),
            Some(names) => {
                let mut seen = HashSet::new();
                names
                    .iter()
                    .map(|name| {
                        if !seen.insert(name.as_str()) {
                            return Err(Error::DuplicateColumn(name.clone()));
                        }
                        schema
                            .position(name)
                            .ok_or_else(|| Error::ColumnNotFound(name.clone()))
                    })
                    .collect::<Result<_>>()?
            }
        };

        if let Some(row) = insert.rows.iter().find(|row| row.len() != targets.len()) {
            return Err(Error::ValuesColumnsCountMismatch {
                expected: targets.len(),
                found: row.len(),
            });
        }

        let mut columns: Vec<Column> = schema
            .columns()
            .iter()
            .map(|def| Column::new(Arc::clone(&def.data_type)))
            .collect();

        for row in &insert.rows {
            let mut provided = vec![false; columns.len()];
            for (literal, &position) in row.iter().zip(&targets) {
                let def = &schema.columns()[position];
                let value = Field::from_literal(&literal.text, literal.quoted, &def.data_type)
                    .map_err(|reason| Error::ValueConversionError {
                        value: literal.text.clone(),
                        column: def.name.clone(),
                        reason,
                    })?;
                columns[position].push(value)?;
                provided[position] = true;
            }
            for (column, _) in columns.iter_mut().zip(&provided).filter(|(_, p)| !**p) {
                column.insert_default();
            }
        }

        let mut block = Block::new();
        for (def, column) in schema.columns().iter().zip(columns) {
            block.add_column(def.name.clone(), Arc::new(column));
        }
        storage.insert(block)?;

        debug!("inserted {} rows into '{}'", insert.rows.len(), insert.table);
        Ok(QueryResult::with_message(format!(
            "{} row(s) inserted successfully",
            insert.rows.len()
        )))
    }

    fn select(&self, select: &Select) -> Result<QueryResult> {
        let storage = self.storage(&select.table)?;
        let schema = storage.schema();

        if select.where_clause.is_some() || !select.group_by.is_empty() || !select.order_by.is_empty()
        {
            debug!("WHERE, GROUP BY and ORDER BY are accepted but not applied");
        }

        let expressions = match &select.columns {
            SelectColumns::Star => schema
                .columns()
                .iter()
                .map(|def| ColumnExpression::column(def.name.clone()))
                .collect(),
            SelectColumns::Expressions(expressions) => expressions.clone(),
        };

        if expressions.iter().any(|e| e.aggregate.is_some()) {
            self.select_aggregates(storage, &expressions)
        } else {
            self.select_columns(storage, &expressions, select.limit)
        }
    }

    fn select_aggregates(
        &self,
        storage: &dyn StorageEngine,
        expressions: &[ColumnExpression],
    ) -> Result<QueryResult> {
        let schema = storage.schema();
        let aggregates: Vec<(AggregateFunction, &ColumnExpression)> = expressions
            .iter()
            .filter_map(|e| e.aggregate.map(|function| (function, e)))
            .collect();
        if aggregates.len() < expressions.len() {
            debug!("dropping non-aggregate expressions from an aggregate query");
        }

        let mut needed: Vec<String> = Vec::new();
        for (function, expression) in &aggregates {
            if *function == AggregateFunction::Count && expression.column == "*" {
                continue;
            }
            schema.column_by_name(&expression.column)?;
            if !needed.contains(&expression.column) {
                needed.push(expression.column.clone());
            }
        }
        // any column works as a row-count proxy for COUNT(*)
        if needed.is_empty() {
            if let Some(first) = schema.column_at(0) {
                needed.push(first.name.clone());
            }
        }
        let blocks = storage.read(&needed)?;

        let mut result = Block::new();
        let mut names = Vec::with_capacity(aggregates.len());
        for (function, expression) in aggregates {
            let (value, data_type) = if expression.column == "*" {
                (
                    aggregate::count_rows(blocks.iter().map(Block::row_count)),
                    DataType::UInt64,
                )
            } else {
                let data_type = &schema.column_by_name(&expression.column)?.data_type;
                let chunks = blocks
                    .iter()
                    .map(|block| {
                        block
                            .column_by_name(&expression.column)
                            .map(|c| c.column.as_ref())
                    })
                    .collect::<Result<Vec<&Column>>>()?;
                (
                    aggregate::compute(function, &expression.column, data_type, &chunks)?,
                    aggregate::result_type(function, data_type)?,
                )
            };

            let name = expression.output_name();
            let column = Column::from_fields(Arc::new(data_type), [value])?;
            result.add_column(name.clone(), Arc::new(column));
            names.push(name);
        }

        Ok(QueryResult::with_data(vec![result], names))
    }

    fn select_columns(
        &self,
        storage: &dyn StorageEngine,
        expressions: &[ColumnExpression],
        limit: Option<usize>,
    ) -> Result<QueryResult> {
        let mut needed: Vec<String> = Vec::new();
        for expression in expressions {
            if !needed.contains(&expression.column) {
                needed.push(expression.column.clone());
            }
        }
        let stored = storage.read(&needed)?;

        let mut blocks = Vec::with_capacity(stored.len());
        for block in &stored {
            let mut projected = Block::new();
            for expression in expressions {
                let column = block.column_by_name(&expression.column)?;
                projected.add_column(expression.output_name(), Arc::clone(&column.column));
            }
            blocks.push(projected);
        }

        let blocks = match limit {
            Some(limit) if limit > 0 => apply_limit(blocks, limit),
            _ => blocks,
        };
        let names = expressions.iter().map(ColumnExpression::output_name).collect();
        Ok(QueryResult::with_data(blocks, names))
    }

    fn drop_table(&mut self, drop: DropTable) -> Result<QueryResult> {
        match self.tables.remove(&drop.name) {
            Some(_) => {
                info!("dropped table '{}'", drop.name);
                Ok(QueryResult::with_message(format!(
                    "Table '{}' dropped successfully",
                    drop.name
                )))
            }
            None if drop.if_exists => Ok(QueryResult::with_message(format!(
                "Table '{}' doesn't exist, nothing to drop",
                drop.name
            ))),
            None => Err(Error::TableNotFound(drop.name)),
        }
    }

    fn show_tables(&self) -> Result<QueryResult> {
        let column = string_column(self.table_names())?;
        let mut block = Block::new();
        block.add_column("table_name", Arc::new(column));
        Ok(QueryResult::with_data(
            vec![block],
            vec!["table_name".to_string()],
        ))
    }

    fn describe(&self, describe: &Describe) -> Result<QueryResult> {
        let schema = self.storage(&describe.name)?.schema();
        let names = string_column(schema.columns().iter().map(|def| def.name.clone()))?;
        let types = string_column(schema.columns().iter().map(|def| def.data_type.name()))?;

        let mut block = Block::new();
        block.add_column("column_name", Arc::new(names));
        block.add_column("type", Arc::new(types));
        Ok(QueryResult::with_data(
            vec![block],
            vec!["column_name".to_string(), "type".to_string()],
        ))
    }
}

fn string_column(values: impl IntoIterator<Item = String>) -> Result<Column> {
    Column::from_fields(
        Arc::new(DataType::String),
        values.into_iter().map(|value| Field::String(value.into())),
    )
}

/// Keeps the first `limit` rows in scan order.
///
/// Whole blocks are kept while they fit; the block straddling the limit is
/// cloned and trimmed from the back; later blocks are dropped.
fn apply_limit(blocks: Vec<Block>, limit: usize) -> Vec<Block> {
    let mut remaining = limit;
    let mut limited = Vec::new();

    for block in blocks {
        if remaining == 0 {
            break;
        }
        let rows = block.row_count();
        if rows <= remaining {
            remaining -= rows;
            limited.push(block);
            continue;
        }

        let mut trimmed = Block::new();
        for named in block.columns() {
            let mut column = named.column.as_ref().clone();
            while column.len() > remaining {
                column.pop_back();
            }
            trimmed.add_column(named.name.clone(), Arc::new(column));
        }
        limited.push(trimmed);
        remaining = 0;
    }

    limited
}
