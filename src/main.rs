//! Interactive SQL shell.
//!
//! Usage:
//!   coldb                      # read statements from stdin
//!   coldb -e "SHOW TABLES"     # run statements and exit

use std::io::{self, BufRead, Write};

use clap::Parser;

use coldb::{Database, DatabaseConfig};

#[derive(Parser, Debug)]
#[command(name = "coldb")]
#[command(about = "In-memory columnar SQL database shell")]
#[command(version)]
struct Args {
    /// Statement to run instead of starting the shell (repeatable)
    #[arg(short, long = "execute")]
    execute: Vec<String>,

    /// Engine used by CREATE TABLE without an ENGINE clause
    #[arg(long, default_value = "Memory")]
    default_engine: String,

    /// Prompt printed before each statement
    #[arg(long, default_value = "coldb> ")]
    prompt: String,
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let mut db = Database::with_config(DatabaseConfig {
        default_engine: args.default_engine,
    });

    if !args.execute.is_empty() {
        let mut failed = false;
        for sql in &args.execute {
            let result = db.execute_query(sql);
            failed |= !result.success();
            print!("{}", Database::format_query_result(&result));
        }
        if failed {
            std::process::exit(1);
        }
        return;
    }

    if let Err(e) = run_shell(&mut db, &args.prompt) {
        eprintln!("I/O error: {}", e);
        std::process::exit(1);
    }
}

fn run_shell(db: &mut Database, prompt: &str) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("In-memory columnar database shell");
    println!("Enter SQL statements, or 'exit' to quit.");

    let mut lines = stdin.lock().lines();
    loop {
        print!("\n{prompt}");
        stdout.flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let query = line?;
        let query = query.trim();

        if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            break;
        }
        if query.is_empty() {
            continue;
        }

        let result = db.execute_query(query);
        println!("{}", Database::format_query_result(&result));
    }

    println!("Bye!");
    Ok(())
}
