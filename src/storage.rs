use std::{collections::HashMap, fmt, sync::Arc};

use log::debug;
use parking_lot::Mutex;

use crate::block::Block;
use crate::error::{Error, Result};
use crate::table::TableStructure;

/// Name of the built-in in-memory engine.
pub const MEMORY_ENGINE: &str = "Memory";

/// A backend owning the blocks of one table.
///
/// Implementations guard their own state, so every method takes `&self`.
pub trait StorageEngine: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn schema(&self) -> &TableStructure;

    /// Appends `block`.
    ///
    /// # Errors
    /// Returns [Error::SchemaMismatch] if the block's columns do not match the
    /// schema exactly; nothing is stored in that case.
    fn insert(&self, block: Block) -> Result<()>;

    /// Returns every stored block.
    fn read_all(&self) -> Vec<Block>;

    /// Returns, per stored block, a block holding only `column_names` in the
    /// requested order. Columns are shared with storage, not copied.
    ///
    /// # Errors
    /// Returns [Error::ColumnNotFound] if a name is not in the schema.
    fn read(&self, column_names: &[String]) -> Result<Vec<Block>>;

    fn total_rows(&self) -> usize {
        self.read_all().iter().map(Block::row_count).sum()
    }
}

/// Checks that `block` carries exactly the schema's columns with matching types.
pub fn validate_block(schema: &TableStructure, block: &Block) -> Result<()> {
    if block.column_count() != schema.column_count() {
        return Err(Error::SchemaMismatch(format!(
            "expected {} columns, found {}",
            schema.column_count(),
            block.column_count()
        )));
    }
    for column in block.columns() {
        let def = schema.column_by_name(&column.name).map_err(|_| {
            Error::SchemaMismatch(format!("unexpected column '{}'", column.name))
        })?;
        if def.data_type != *column.column.data_type() {
            return Err(Error::SchemaMismatch(format!(
                "column '{}' has type {}, expected {}",
                column.name,
                column.column.data_type(),
                def.data_type
            )));
        }
    }
    // every schema column must appear once; a repeated name would hide another column
    if schema.columns().iter().any(|def| !block.has_column(&def.name)) {
        return Err(Error::SchemaMismatch("missing columns".into()));
    }
    if !block.is_valid() {
        return Err(Error::SchemaMismatch("columns have different lengths".into()));
    }
    Ok(())
}

/// Keeps every inserted block in memory, behind one lock.
#[derive(Debug)]
pub struct MemoryStorage {
    schema: TableStructure,
    blocks: Mutex<Vec<Block>>,
}

impl MemoryStorage {
    pub fn new(schema: TableStructure) -> Self {
        Self {
            schema,
            blocks: Mutex::new(Vec::new()),
        }
    }
}

impl StorageEngine for MemoryStorage {
    fn name(&self) -> &str {
        MEMORY_ENGINE
    }

    fn schema(&self) -> &TableStructure {
        &self.schema
    }

    fn insert(&self, block: Block) -> Result<()> {
        validate_block(&self.schema, &block)?;
        debug!("memory storage: appending block of {} rows", block.row_count());
        self.blocks.lock().push(block);
        Ok(())
    }

    fn read_all(&self) -> Vec<Block> {
        self.blocks.lock().clone()
    }

    fn read(&self, column_names: &[String]) -> Result<Vec<Block>> {
        for name in column_names {
            self.schema.column_by_name(name)?;
        }
        let blocks = self.blocks.lock();
        blocks
            .iter()
            .map(|stored| {
                let mut block = Block::new();
                for name in column_names {
                    let column = stored.column_by_name(name)?;
                    block.add_column(name.clone(), Arc::clone(&column.column));
                }
                Ok(block)
            })
            .collect()
    }

    fn total_rows(&self) -> usize {
        self.blocks.lock().iter().map(Block::row_count).sum()
    }
}

/// Builds a storage engine for a schema.
pub type EngineConstructor = fn(TableStructure) -> Box<dyn StorageEngine>;

/// Registry of storage engines keyed by engine name.
#[derive(Debug, Clone)]
pub struct StorageFactory {
    constructors: HashMap<String, EngineConstructor>,
}

impl Default for StorageFactory {
    fn default() -> Self {
        let mut factory = Self {
            constructors: HashMap::new(),
        };
        factory.register(MEMORY_ENGINE, memory_engine);
        factory
    }
}

fn memory_engine(schema: TableStructure) -> Box<dyn StorageEngine> {
    Box::new(MemoryStorage::new(schema))
}

impl StorageFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the constructor for `name`.
    pub fn register(&mut self, name: impl Into<String>, constructor: EngineConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// # Errors
    /// Returns [Error::UnknownEngine] if no engine is registered under `name`.
    pub fn create(&self, name: &str, schema: TableStructure) -> Result<Box<dyn StorageEngine>> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| Error::UnknownEngine(name.to_string()))?;
        Ok(constructor(schema))
    }
}
