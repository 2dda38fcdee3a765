use std::fmt;

/// A parsed SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateTable(CreateTable),
    Insert(Insert),
    Select(Select),
    DropTable(DropTable),
    ShowTables,
    Describe(Describe),
}

impl Command {
    /// Returns true for statements that never change the table registry or data.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Select(_) | Self::ShowTables | Self::Describe(_))
    }

    /// Statement keyword(s), for messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateTable(_) => "CREATE TABLE",
            Self::Insert(_) => "INSERT",
            Self::Select(_) => "SELECT",
            Self::DropTable(_) => "DROP TABLE",
            Self::ShowTables => "SHOW TABLES",
            Self::Describe(_) => "DESCRIBE",
        }
    }
}

/// One `name Type` pair of a `CREATE TABLE` column list.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    /// Full type name, e.g. `Nullable(Int32)`.
    pub type_name: String,
    /// Numeric parenthesized suffix such as `(10, 2)`, kept as written and ignored.
    pub precision: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    /// `ENGINE = name` if present.
    pub engine: Option<String>,
}

/// A value as written in a `VALUES` tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    /// Text with quotes stripped and doubled quotes unescaped.
    pub text: String,
    pub quoted: bool,
}

impl Literal {
    pub fn bare(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: false,
        }
    }

    pub fn quoted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub columns: Option<Vec<String>>,
    pub rows: Vec<Vec<Literal>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    /// Case-insensitive lookup of a function name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "COUNT" => Some(Self::Count),
            "SUM" => Some(Self::Sum),
            "AVG" => Some(Self::Avg),
            "MIN" => Some(Self::Min),
            "MAX" => Some(Self::Max),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of a select list.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnExpression {
    /// Column name, `*` for `COUNT(*)`, or the raw text of an unrecognised expression.
    pub column: String,
    pub alias: Option<String>,
    pub aggregate: Option<AggregateFunction>,
}

impl ColumnExpression {
    pub fn column(name: impl Into<String>) -> Self {
        Self {
            column: name.into(),
            alias: None,
            aggregate: None,
        }
    }

    pub fn aggregate(function: AggregateFunction, column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            alias: None,
            aggregate: Some(function),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Name of the result column: the alias, `FUNC(column)` for aggregates, else the column.
    pub fn output_name(&self) -> String {
        match (&self.alias, self.aggregate) {
            (Some(alias), _) => alias.clone(),
            (None, Some(function)) => format!("{function}({})", self.column),
            (None, None) => self.column.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectColumns {
    Star,
    Expressions(Vec<ColumnExpression>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByClause {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub columns: SelectColumns,
    pub table: String,
    /// Condition text as written; it is not evaluated.
    pub where_clause: Option<String>,
    pub group_by: Vec<String>,
    pub order_by: Vec<OrderByClause>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTable {
    pub name: String,
    pub if_exists: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Describe {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_name() {
        assert_eq!(ColumnExpression::column("id").output_name(), "id");
        assert_eq!(
            ColumnExpression::aggregate(AggregateFunction::Count, "*").output_name(),
            "COUNT(*)"
        );
        assert_eq!(
            ColumnExpression::aggregate(AggregateFunction::Sum, "v")
                .with_alias("total")
                .output_name(),
            "total"
        );
    }

    #[test]
    fn test_function_names() {
        assert_eq!(AggregateFunction::from_name("avg"), Some(AggregateFunction::Avg));
        assert_eq!(AggregateFunction::from_name("median"), None);
        assert_eq!(AggregateFunction::Max.to_string(), "MAX");
    }

    #[test]
    fn test_read_only() {
        assert!(Command::ShowTables.is_read_only());
        assert!(
            !Command::DropTable(DropTable {
                name: "t".into(),
                if_exists: false
            })
            .is_read_only()
        );
    }
}
