/// Coarse classification of every failure the engine can report.
///
/// Callers branch on this instead of matching message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unsupported statement text.
    Parse,
    /// Unknown type, duplicate or missing table, missing column.
    Schema,
    /// Non-convertible literal, value/column count mismatch, wrong-kind reads.
    Value,
    /// Unsupported aggregate/type pairing, empty aggregate domain, overflow.
    Execution,
    /// Block rejected by a storage engine.
    Storage,
}

/// Every error raised while parsing or executing a statement.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unsupported SQL statement")]
    UnsupportedStatement,

    #[error("Invalid {statement} statement: {message}")]
    InvalidSyntax {
        statement: &'static str,
        message: String,
    },

    #[error("Unsupported aggregate function: {0}")]
    UnsupportedFunction(String),

    #[error("Unknown data type: {0}")]
    UnknownType(String),

    #[error("Error creating column '{column}': unknown data type: {type_name}")]
    UnknownColumnType { column: String, type_name: String },

    #[error("Unknown storage engine: {0}")]
    UnknownEngine(String),

    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Table '{0}' doesn't exist")]
    TableNotFound(String),

    #[error("Column '{0}' doesn't exist")]
    ColumnNotFound(String),

    #[error("Column '{0}' is specified more than once")]
    DuplicateColumn(String),

    #[error("Values count doesn't match columns count: expected {expected}, found {found}")]
    ValuesColumnsCountMismatch { expected: usize, found: usize },

    #[error("Error converting value '{value}' for column '{column}': {reason}")]
    ValueConversionError {
        value: String,
        column: String,
        reason: String,
    },

    #[error("Aggregate function {function} not supported for {type_name} type")]
    UnsupportedAggregateType {
        function: &'static str,
        type_name: String,
    },

    #[error("No non-NULL values found for {function} calculation on column '{column}'")]
    NoNonNullValues {
        function: &'static str,
        column: String,
    },

    #[error("Numeric overflow while computing {function} on column '{column}'")]
    AggregateOverflow {
        function: &'static str,
        column: String,
    },

    #[error("{0} statement modifies the database and needs exclusive access")]
    MutatingStatement(&'static str),

    #[error("Block structure doesn't match table structure: {0}")]
    SchemaMismatch(String),

    #[error("Not enough data for deserialization: needed {needed} bytes, got {available}")]
    TruncatedData { needed: usize, available: usize },

    #[error("Wrong value kind: expected {expected}, found {found}")]
    WrongKind { expected: String, found: String },

    #[error("Row index {index} is out of range for a column of {len} rows")]
    RowOutOfRange { index: usize, len: usize },
}

impl Error {
    /// Returns the taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedStatement | Self::InvalidSyntax { .. } | Self::UnsupportedFunction(_) => {
                ErrorKind::Parse
            }
            Self::UnknownType(_)
            | Self::UnknownColumnType { .. }
            | Self::UnknownEngine(_)
            | Self::TableAlreadyExists(_)
            | Self::TableNotFound(_)
            | Self::ColumnNotFound(_)
            | Self::DuplicateColumn(_) => ErrorKind::Schema,
            Self::ValuesColumnsCountMismatch { .. }
            | Self::ValueConversionError { .. }
            | Self::TruncatedData { .. }
            | Self::WrongKind { .. }
            | Self::RowOutOfRange { .. } => ErrorKind::Value,
            Self::UnsupportedAggregateType { .. }
            | Self::NoNonNullValues { .. }
            | Self::AggregateOverflow { .. }
            | Self::MutatingStatement(_) => ErrorKind::Execution,
            Self::SchemaMismatch(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn syntax(statement: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            statement,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_taxonomy() {
        assert_eq!(Error::UnsupportedStatement.kind(), ErrorKind::Parse);
        assert_eq!(Error::TableNotFound("t".into()).kind(), ErrorKind::Schema);
        assert_eq!(
            Error::ValuesColumnsCountMismatch {
                expected: 2,
                found: 3
            }
            .kind(),
            ErrorKind::Value
        );
        assert_eq!(
            Error::NoNonNullValues {
                function: "MIN",
                column: "x".into()
            }
            .kind(),
            ErrorKind::Execution
        );
        assert_eq!(
            Error::SchemaMismatch("x".into()).kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::TableNotFound("users".into()).to_string(),
            "Table 'users' doesn't exist"
        );
        assert_eq!(
            Error::syntax("SELECT", "missing FROM").to_string(),
            "Invalid SELECT statement: missing FROM"
        );
    }
}
