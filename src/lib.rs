pub mod aggregate;
pub mod ast;
pub mod block;
pub mod column;
pub mod data_type;
pub mod database;
pub mod error;
pub mod executor;
pub mod parser;
pub mod storage;
pub mod table;
pub mod tokenizer;
pub mod value;

pub use block::{Block, ColumnWithName};
pub use column::Column;
pub use data_type::{DataType, TypeFactory, TypeKind};
pub use database::{Database, SharedDatabase};
pub use error::{Error, ErrorKind, Result};
pub use executor::{DatabaseConfig, Executor, QueryResult};
pub use storage::{MemoryStorage, StorageEngine, StorageFactory};
pub use table::{ColumnDef, TableStructure};
pub use value::Field;
