use coldb::{Database, ErrorKind, Field, QueryResult};

fn ok(db: &mut Database, sql: &str) -> QueryResult {
    let result = db.execute_query(sql);
    assert!(result.success(), "{sql}: {}", result.error_message());
    result
}

fn rendered_rows(result: &QueryResult) -> Vec<Vec<String>> {
    result
        .rows()
        .iter()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect()
}

// ─────────────────────────────────────────────────────────────
// Test 1 : the reference session
// ─────────────────────────────────────────────────────────────
#[test]
fn test_end_to_end_session() {
    let mut db = Database::new();
    ok(
        &mut db,
        "CREATE TABLE t (id UInt32, name String, value Float64) ENGINE = Memory",
    );
    ok(&mut db, "INSERT INTO t VALUES (1,'a',1.5), (2,'b',2.5)");

    let count = ok(&mut db, "SELECT COUNT(*) FROM t");
    assert_eq!(count.row_count(), 1);
    assert_eq!(count.rows(), vec![vec![Field::UInt64(2)]]);

    let sum = ok(&mut db, "SELECT SUM(value) FROM t");
    assert_eq!(rendered_rows(&sum), vec![vec!["4.000000".to_string()]]);

    let first = ok(&mut db, "SELECT * FROM t LIMIT 1");
    assert_eq!(
        rendered_rows(&first),
        vec![vec!["1".to_string(), "a".to_string(), "1.500000".to_string()]]
    );
}

// ─────────────────────────────────────────────────────────────
// Test 2 : every scalar kind renders back canonically
// ─────────────────────────────────────────────────────────────
#[test]
fn test_scalar_round_trip() {
    let cases = [
        ("Int8", "-128", "-128"),
        ("Int16", "32767", "32767"),
        ("Int32", "-7", "-7"),
        ("Int64", "9223372036854775807", "9223372036854775807"),
        ("UInt8", "255", "255"),
        ("UInt16", "65535", "65535"),
        ("UInt32", "4294967295", "4294967295"),
        ("UInt64", "18446744073709551615", "18446744073709551615"),
        ("Float32", "1.25", "1.250000"),
        ("Float64", "-0.5", "-0.500000"),
        ("String", "'hello world'", "hello world"),
        ("Nullable(Int32)", "NULL", "NULL"),
        ("Nullable(Float64)", "3", "3.000000"),
    ];

    let mut db = Database::new();
    for (i, (type_name, literal, expected)) in cases.iter().enumerate() {
        let table = format!("t{i}");
        ok(&mut db, &format!("CREATE TABLE {table} (v {type_name})"));
        ok(&mut db, &format!("INSERT INTO {table} VALUES ({literal})"));
        let result = ok(&mut db, &format!("SELECT v FROM {table}"));
        assert_eq!(
            rendered_rows(&result),
            vec![vec![expected.to_string()]],
            "{type_name}"
        );
    }
}

// ─────────────────────────────────────────────────────────────
// Test 3 : schema shape and duplicates
// ─────────────────────────────────────────────────────────────
#[test]
fn test_schema_is_declared_order() {
    let mut db = Database::new();
    ok(&mut db, "CREATE TABLE s (z Int8, a String, m Nullable(UInt16), b Float32)");

    let describe = ok(&mut db, "DESCRIBE s");
    assert_eq!(
        rendered_rows(&describe),
        vec![
            vec!["z".to_string(), "Int8".to_string()],
            vec!["a".to_string(), "String".to_string()],
            vec!["m".to_string(), "Nullable(UInt16)".to_string()],
            vec!["b".to_string(), "Float32".to_string()],
        ]
    );

    for _ in 0..3 {
        let result = db.execute_query("CREATE TABLE s (x Int8)");
        assert_eq!(result.error_message(), "Table 's' already exists");
        assert_eq!(result.error_kind(), Some(ErrorKind::Schema));
    }
}

#[test]
fn test_blocks_are_rectangular() {
    let mut db = Database::new();
    ok(&mut db, "CREATE TABLE r (a UInt8, b Nullable(String))");
    ok(&mut db, "INSERT INTO r (a) VALUES (1), (2)");
    ok(&mut db, "INSERT INTO r VALUES (3, 'x')");

    let result = ok(&mut db, "SELECT b, a, b FROM r");
    assert_eq!(result.blocks().len(), 2);
    assert!(result.blocks().iter().all(|block| block.is_valid()));
    assert_eq!(result.column_names(), ["b", "a", "b"]);
    assert_eq!(
        rendered_rows(&result),
        vec![
            vec!["NULL".to_string(), "1".to_string(), "NULL".to_string()],
            vec!["NULL".to_string(), "2".to_string(), "NULL".to_string()],
            vec!["x".to_string(), "3".to_string(), "x".to_string()],
        ]
    );
}

// ─────────────────────────────────────────────────────────────
// Test 4 : failed statements change nothing
// ─────────────────────────────────────────────────────────────
#[test]
fn test_failed_insert_leaves_tables_unmodified() {
    let mut db = Database::new();
    ok(&mut db, "CREATE TABLE keep (id UInt32)");
    ok(&mut db, "INSERT INTO keep VALUES (1), (2)");

    let missing = db.execute_query("INSERT INTO nowhere VALUES (1)");
    assert_eq!(missing.error_message(), "Table 'nowhere' doesn't exist");

    let bad_value = db.execute_query("INSERT INTO keep VALUES (3), (oops)");
    assert_eq!(bad_value.error_kind(), Some(ErrorKind::Value));

    let count = ok(&mut db, "SELECT COUNT(*) FROM keep");
    assert_eq!(count.rows(), vec![vec![Field::UInt64(2)]]);

    let tables = ok(&mut db, "SHOW TABLES");
    assert_eq!(rendered_rows(&tables), vec![vec!["keep".to_string()]]);
}

// ─────────────────────────────────────────────────────────────
// Test 5 : aggregates on empty and all-null columns
// ─────────────────────────────────────────────────────────────
#[test]
fn test_count_star() {
    let mut db = Database::new();
    ok(&mut db, "CREATE TABLE c (v Nullable(Int32))");

    let empty = ok(&mut db, "SELECT COUNT(*) FROM c");
    assert_eq!(empty.rows(), vec![vec![Field::UInt64(0)]]);

    for i in 0..5 {
        ok(&mut db, &format!("INSERT INTO c VALUES ({i})"));
    }
    ok(&mut db, "INSERT INTO c VALUES (NULL)");

    let result = ok(&mut db, "SELECT COUNT(*) AS total, COUNT(v) FROM c");
    assert_eq!(result.column_names(), ["total", "COUNT(v)"]);
    assert_eq!(
        result.rows(),
        vec![vec![Field::UInt64(6), Field::UInt64(5)]]
    );
}

#[test]
fn test_aggregates_without_values() {
    let mut db = Database::new();
    ok(&mut db, "CREATE TABLE n (v Nullable(Float32), w Int64)");

    for table_state in ["empty", "all null"] {
        for function in ["MIN", "MAX"] {
            let result = db.execute_query(&format!("SELECT {function}(v) FROM n"));
            assert!(!result.success(), "{table_state} {function}");
            assert_eq!(result.error_kind(), Some(ErrorKind::Execution));
        }
        let result = ok(&mut db, "SELECT SUM(v), AVG(v), SUM(w) FROM n");
        assert_eq!(
            result.rows(),
            vec![vec![
                Field::Float64(0.0),
                Field::Float64(0.0),
                Field::Int64(0)
            ]]
        );

        ok(&mut db, "INSERT INTO n (w) VALUES (0), (0)");
    }
}

#[test]
fn test_aggregate_on_text_is_rejected() {
    let mut db = Database::new();
    ok(&mut db, "CREATE TABLE s (name String)");
    ok(&mut db, "INSERT INTO s VALUES ('x')");

    let result = db.execute_query("SELECT AVG(name) FROM s");
    assert_eq!(
        result.error_message(),
        "Aggregate function AVG not supported for String type"
    );
    assert!(ok(&mut db, "SELECT COUNT(name) FROM s").success());
}

// ─────────────────────────────────────────────────────────────
// Test 6 : LIMIT keeps the scan-order prefix
// ─────────────────────────────────────────────────────────────
#[test]
fn test_limit_across_blocks() {
    let mut db = Database::new();
    ok(&mut db, "CREATE TABLE l (i Int32)");
    ok(&mut db, "INSERT INTO l VALUES (0), (1), (2)");
    ok(&mut db, "INSERT INTO l VALUES (3), (4)");
    ok(&mut db, "INSERT INTO l VALUES (5), (6), (7)");

    for n in 1..=8 {
        let result = ok(&mut db, &format!("SELECT i FROM l LIMIT {n}"));
        let expected: Vec<Vec<Field>> = (0..n).map(|i| vec![Field::Int32(i)]).collect();
        assert_eq!(result.rows(), expected, "LIMIT {n}");
    }

    let all = ok(&mut db, "SELECT i FROM l LIMIT 100");
    assert_eq!(all.row_count(), 8);
}

// ─────────────────────────────────────────────────────────────
// Test 7 : DROP TABLE
// ─────────────────────────────────────────────────────────────
#[test]
fn test_drop_then_select() {
    let mut db = Database::new();
    ok(&mut db, "CREATE TABLE d (x UInt8)");
    ok(&mut db, "DROP TABLE d");

    let result = db.execute_query("SELECT * FROM d");
    assert_eq!(result.error_message(), "Table 'd' doesn't exist");

    let result = ok(&mut db, "DROP TABLE IF EXISTS d");
    assert_eq!(result.message(), "Table 'd' doesn't exist, nothing to drop");

    // the name is free again
    ok(&mut db, "CREATE TABLE d (y String)");
}

// ─────────────────────────────────────────────────────────────
// Test 8 : clauses that are parsed but not applied
// ─────────────────────────────────────────────────────────────
#[test]
fn test_where_group_order_do_not_change_rows() {
    let mut db = Database::new();
    ok(&mut db, "CREATE TABLE w (k UInt8, v Int32)");
    ok(&mut db, "INSERT INTO w VALUES (2, 20), (1, 10), (2, 5)");

    let plain = ok(&mut db, "SELECT k, v FROM w");
    let decorated = ok(
        &mut db,
        "SELECT k, v FROM w WHERE v > 100 GROUP BY k ORDER BY v DESC",
    );
    assert_eq!(plain.rows(), decorated.rows());
}

// ─────────────────────────────────────────────────────────────
// Test 9 : binary codec of stored values
// ─────────────────────────────────────────────────────────────
#[test]
fn test_stored_values_survive_binary_codec() {
    let mut db = Database::new();
    ok(
        &mut db,
        "CREATE TABLE b (i Int16, u UInt64, f Float32, s String, n Nullable(Int8))",
    );
    ok(
        &mut db,
        "INSERT INTO b VALUES (-300, 7, 0.25, 'é''x', NULL), (1, 2, -1, '', -5)",
    );

    let table = db.executor().table("b").unwrap();
    let schema = table.schema();
    let mut buffer = Vec::new();
    let mut written = Vec::new();
    for block in table.read_all() {
        for row in 0..block.row_count() {
            for (position, value) in block.row(row).unwrap().into_iter().enumerate() {
                let data_type = &schema.column_at(position).unwrap().data_type;
                data_type.serialize_binary(&value, &mut buffer).unwrap();
                written.push((position, value));
            }
        }
    }

    let mut offset = 0;
    for (position, expected) in written {
        let data_type = &schema.column_at(position).unwrap().data_type;
        let (value, used) = data_type.deserialize_binary(&buffer[offset..]).unwrap();
        assert_eq!(value, expected);
        offset += used;
    }
    assert_eq!(offset, buffer.len());
    assert_eq!(
        db.execute_query("SELECT s FROM b LIMIT 1").rows(),
        vec![vec![Field::String("é'x".into())]]
    );
}

// ─────────────────────────────────────────────────────────────
// Test 10 : rendered output
// ─────────────────────────────────────────────────────────────
#[test]
fn test_formatted_session() {
    let mut db = Database::new();
    let outputs: Vec<String> = [
        "CREATE TABLE t (id UInt32, name String)",
        "INSERT INTO t VALUES (1, 'a'), (10, 'bob')",
        "SELECT COUNT(*) AS n FROM t",
        "SELECT * FROM t",
        "SELECT * FROM missing",
    ]
    .iter()
    .map(|sql| Database::format_query_result(&db.execute_query(sql)))
    .collect();

    assert_eq!(outputs[0], "OK: Table 't' created successfully\n");
    assert_eq!(outputs[1], "OK: 2 row(s) inserted successfully\n");
    assert_eq!(outputs[2], "-----\n| n |\n-----\n| 2 |\n-----\n1 row(s) in set\n");
    assert_eq!(
        outputs[3],
        "-------------\n\
         | id | name |\n\
         -------------\n\
         | 1  | a    |\n\
         | 10 | bob  |\n\
         -------------\n\
         2 row(s) in set\n"
    );
    assert_eq!(outputs[4], "Error: Table 'missing' doesn't exist\n");
}

// ─────────────────────────────────────────────────────────────
// Test 11 : names shaped like keywords or starting with digits
// ─────────────────────────────────────────────────────────────
#[test]
fn test_keyword_and_digit_leading_names() {
    let mut db = Database::new();
    ok(&mut db, "CREATE TABLE cars (engine String, year UInt16, desc String)");
    ok(&mut db, "INSERT INTO cars (engine, desc, year) VALUES ('V8', 'loud', 1969)");
    let result = ok(&mut db, "SELECT desc, engine FROM cars");
    assert_eq!(result.column_names(), ["desc", "engine"]);
    assert_eq!(
        rendered_rows(&result),
        vec![vec!["loud".to_string(), "V8".to_string()]]
    );

    ok(&mut db, "CREATE TABLE tables (show UInt8)");
    ok(&mut db, "CREATE TABLE 2024_sales (id UInt32)");
    ok(&mut db, "INSERT INTO 2024_sales VALUES (1), (2)");
    let count = ok(&mut db, "SELECT COUNT(*) FROM 2024_sales");
    assert_eq!(count.rows(), vec![vec![Field::UInt64(2)]]);

    let describe = ok(&mut db, "DESCRIBE tables");
    assert_eq!(
        rendered_rows(&describe),
        vec![vec!["show".to_string(), "UInt8".to_string()]]
    );
    let tables = ok(&mut db, "SHOW TABLES");
    assert_eq!(
        rendered_rows(&tables),
        vec![
            vec!["2024_sales".to_string()],
            vec!["cars".to_string()],
            vec!["tables".to_string()],
        ]
    );
}

// ─────────────────────────────────────────────────────────────
// Test 12 : float literals and NaN
// ─────────────────────────────────────────────────────────────
#[test]
fn test_leading_dot_literal() {
    let mut db = Database::new();
    ok(&mut db, "CREATE TABLE f (v Float64)");
    ok(&mut db, "INSERT INTO f VALUES (.5), (-.25)");
    let result = ok(&mut db, "SELECT v FROM f");
    assert_eq!(
        result.rows(),
        vec![vec![Field::Float64(0.5)], vec![Field::Float64(-0.25)]]
    );
}

#[test]
fn test_min_max_ignore_nan() {
    let mut db = Database::new();
    ok(&mut db, "CREATE TABLE f (v Float64)");
    ok(&mut db, "INSERT INTO f VALUES (NaN), (1.0), (-3)");
    let result = ok(&mut db, "SELECT MIN(v), MAX(v) FROM f");
    assert_eq!(
        result.rows(),
        vec![vec![Field::Float64(-3.0), Field::Float64(1.0)]]
    );
}
