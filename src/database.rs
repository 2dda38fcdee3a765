use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;

use crate::ast::Command;
use crate::error::Result;
use crate::executor::{DatabaseConfig, Executor, QueryResult};
use crate::parser::parse;

/// The main entry point for the in-memory database engine.
///
/// It owns one [Executor] and turns SQL text into [QueryResult]s; no error
/// escapes [Database::execute_query].
#[derive(Debug, Default)]
pub struct Database {
    executor: Executor,
}

impl Database {
    /// Creates a new, empty database instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DatabaseConfig) -> Self {
        Self {
            executor: Executor::with_config(config),
        }
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut Executor {
        &mut self.executor
    }

    /// Parses and executes one SQL statement.
    ///
    /// # Example
    /// ```
    /// use coldb::{Database, Field};
    ///
    /// let mut db = Database::new();
    /// db.execute_query("CREATE TABLE products (name String, price UInt32)");
    /// db.execute_query("INSERT INTO products VALUES ('Laptop', 1200), ('Mouse', 25)");
    ///
    /// let result = db.execute_query("SELECT name FROM products");
    /// assert!(result.success());
    /// assert_eq!(result.column_names(), ["name"]);
    /// assert_eq!(result.rows()[1][0], Field::String("Mouse".into()));
    ///
    /// let result = db.execute_query("SELECT price FROM nowhere");
    /// assert_eq!(result.error_message(), "Table 'nowhere' doesn't exist");
    /// ```
    pub fn execute_query(&mut self, sql: &str) -> QueryResult {
        debug!("query: {sql}");
        into_result(parse(sql).and_then(|command| self.executor.execute(command)))
    }

    /// Executes an already parsed command.
    pub fn execute_command(&mut self, command: Command) -> QueryResult {
        into_result(self.executor.execute(command))
    }

    /// Parses and executes a read-only statement (`SELECT`, `SHOW TABLES`, `DESCRIBE`).
    ///
    /// Other statements fail with [crate::Error::MutatingStatement].
    pub fn query(&self, sql: &str) -> QueryResult {
        debug!("read-only query: {sql}");
        into_result(parse(sql).and_then(|command| self.executor.query(&command)))
    }

    /// Renders a result as an ASCII table, `OK: <message>` or `Error: <message>`.
    ///
    /// # Example
    /// ```
    /// use coldb::Database;
    ///
    /// let mut db = Database::new();
    /// db.execute_query("CREATE TABLE t (id UInt8)");
    /// db.execute_query("INSERT INTO t VALUES (7)");
    ///
    /// let text = Database::format_query_result(&db.execute_query("SELECT id FROM t"));
    /// assert_eq!(text, "------\n| id |\n------\n| 7  |\n------\n1 row(s) in set\n");
    /// ```
    pub fn format_query_result(result: &QueryResult) -> String {
        if !result.success() {
            return format!("Error: {}\n", result.error_message());
        }
        if result.column_names().is_empty() {
            return format!("OK: {}\n", result.message());
        }

        let names = result.column_names();
        let rows: Vec<Vec<String>> = result
            .rows()
            .into_iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();

        // widths without the one-space margins
        let mut widths: Vec<usize> = names.iter().map(|n| n.chars().count()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let total_width = 1 + widths.iter().map(|w| w + 3).sum::<usize>();
        let rule = "-".repeat(total_width);

        let mut out = format!("{rule}\n");
        write_row(&mut out, names.iter().map(String::as_str), &widths);
        out.push_str(&format!("{rule}\n"));
        for row in &rows {
            write_row(&mut out, row.iter().map(String::as_str), &widths);
        }
        out.push_str(&format!("{rule}\n{} row(s) in set\n", result.row_count()));
        out
    }
}

fn write_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    out.push('|');
    for (cell, &width) in cells.zip(widths) {
        out.push_str(&format!(" {cell:<width$} |"));
    }
    out.push('\n');
}

fn into_result(outcome: Result<QueryResult>) -> QueryResult {
    outcome.unwrap_or_else(|error| {
        debug!("statement failed ({:?}): {error}", error.kind());
        QueryResult::failure(error)
    })
}

/// A cloneable, thread-safe handle to one [Database].
///
/// Read-only statements share a read lock; anything that changes the table
/// registry or table data takes the write lock.
#[derive(Debug, Clone, Default)]
pub struct SharedDatabase {
    inner: Arc<RwLock<Database>>,
}

impl SharedDatabase {
    pub fn new(database: Database) -> Self {
        Self {
            inner: Arc::new(RwLock::new(database)),
        }
    }

    pub fn execute_query(&self, sql: &str) -> QueryResult {
        let command = match parse(sql) {
            Ok(command) => command,
            Err(error) => return into_result(Err(error)),
        };
        if command.is_read_only() {
            into_result(self.inner.read().executor().query(&command))
        } else {
            self.inner.write().execute_command(command)
        }
    }

    pub fn table_names(&self) -> Vec<String> {
        self.inner.read().executor().table_names()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::error::ErrorKind;
    use crate::value::Field;

    // ─────────────────────────────────────────────────────────────
    // Test 1 : errors never escape
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_errors_become_results() {
        let mut db = Database::new();

        let result = db.execute_query("UPSERT stuff");
        assert!(!result.success());
        assert_eq!(result.error_message(), "Unsupported SQL statement");
        assert_eq!(result.error_kind(), Some(ErrorKind::Parse));

        let result = db.execute_query("SELECT * FROM ghost");
        assert_eq!(result.error_kind(), Some(ErrorKind::Schema));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 2 : formatting
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_format_messages() {
        let mut db = Database::new();
        let created = db.execute_query("CREATE TABLE t (id UInt32, name Nullable(String))");
        assert_eq!(
            Database::format_query_result(&created),
            "OK: Table 't' created successfully\n"
        );

        let failed = db.execute_query("DROP TABLE nope");
        assert_eq!(
            Database::format_query_result(&failed),
            "Error: Table 'nope' doesn't exist\n"
        );
    }

    #[test]
    fn test_format_table() {
        let mut db = Database::new();
        db.execute_query("CREATE TABLE t (id UInt32, name Nullable(String), v Float32)");
        db.execute_query("INSERT INTO t VALUES (1, 'alice', 0.5), (22, NULL, 2)");

        let text = Database::format_query_result(&db.execute_query("SELECT * FROM t"));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "| id | name  | v        |");
        assert_eq!(lines[3], "| 1  | alice | 0.500000 |");
        assert_eq!(lines[4], "| 22 | NULL  | 2.000000 |");
        assert_eq!(lines[0].len(), lines[1].len());
        assert_eq!(lines[5], lines[0]);
        assert_eq!(lines[6], "2 row(s) in set");
    }

    #[test]
    fn test_format_empty_select() {
        let mut db = Database::new();
        db.execute_query("CREATE TABLE t (id UInt32)");
        let text = Database::format_query_result(&db.execute_query("SELECT id FROM t"));
        assert_eq!(text, "------\n| id |\n------\n------\n0 row(s) in set\n");
    }

    // ─────────────────────────────────────────────────────────────
    // Test 3 : read-only entry point
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_query_rejects_mutations() {
        let mut db = Database::new();
        db.execute_query("CREATE TABLE t (id UInt32)");

        assert!(db.query("SHOW TABLES").success());
        let result = db.query("INSERT INTO t VALUES (1)");
        assert_eq!(result.error_kind(), Some(ErrorKind::Execution));
        assert_eq!(db.query("SELECT COUNT(*) FROM t").rows(), vec![vec![Field::UInt64(0)]]);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 4 : shared handle
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_shared_database_across_threads() {
        let db = SharedDatabase::default();
        assert!(db.execute_query("CREATE TABLE t (n UInt64)").success());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let db = db.clone();
                thread::spawn(move || {
                    for j in 0..25 {
                        let sql = format!("INSERT INTO t VALUES ({})", i * 100 + j);
                        assert!(db.execute_query(&sql).success());
                        assert!(db.execute_query("SELECT COUNT(*) FROM t").success());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let result = db.execute_query("SELECT COUNT(*), MAX(n) FROM t");
        assert_eq!(
            result.rows(),
            vec![vec![Field::UInt64(100), Field::UInt64(324)]]
        );
        assert_eq!(db.table_names(), vec!["t".to_string()]);
    }
}
