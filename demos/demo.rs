use std::sync::Arc;

use coldb::*;

fn run(db: &mut Database, sql: &str) {
    println!("coldb> {sql}");
    print!("{}", Database::format_query_result(&db.execute_query(sql)));
    println!();
}

fn main() -> Result<()> {
    println!("In-Memory Columnar Database Demo\n");

    // Create DB
    let mut db = Database::new();

    run(
        &mut db,
        "CREATE TABLE users (id UInt32, name String, age Nullable(UInt8)) ENGINE = Memory",
    );
    run(
        &mut db,
        "INSERT INTO users VALUES (1, 'Alice', 30), (2, 'Bob', NULL), (3, 'Charlie', 25)",
    );
    run(&mut db, "SELECT * FROM users");
    run(&mut db, "SELECT name, age FROM users LIMIT 2");
    run(
        &mut db,
        "SELECT COUNT(*), COUNT(age) AS known_ages, AVG(age), MAX(name) FROM users",
    );
    run(
        &mut db,
        "SELECT COUNT(*), COUNT(age) AS known_ages, AVG(age), MIN(age) FROM users",
    );
    run(&mut db, "DESCRIBE users");
    run(&mut db, "SHOW TABLES");

    // Columns can also be built and inspected directly
    let age_type = TypeFactory::new().create("Nullable(UInt8)")?;
    let ages = Column::from_fields(age_type, [Field::UInt8(41), Field::Null])?;
    println!("Standalone column of {}:", ages.data_type());
    for row in 0..ages.len() {
        println!("  [{row}] = {}", ages.get(row).unwrap_or(Field::Null));
    }

    let mut block = Block::new();
    block.add_column("age", Arc::new(ages));
    println!("block has {} rows\n", block.row_count());

    run(&mut db, "DROP TABLE users");
    run(&mut db, "DROP TABLE IF EXISTS users");

    Ok(())
}
