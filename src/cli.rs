//! The interactive shell: a `rustyline` REPL with a few dot-commands
//! layered over SQL, results rendered with `tabled`.

use crate::database::Database;
use crate::sql::dispatcher::{Dispatcher, ExecResult};
use crate::sql::parser;
use crate::value::Value;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tabled::builder::Builder;
use tabled::settings::Style;

const HELP: &str = "\
Commands:
  .help        show this message
  .tables      list tables
  .checkpoint  flush all dirty pages and fsync
  .exit        quit
Anything else is parsed as SQL: CREATE TABLE, BEGIN, INSERT, SELECT, DELETE, COMMIT, ROLLBACK.";

pub fn run(db: Database) {
    let mut dispatcher = Dispatcher::new(db);
    let mut rl = DefaultEditor::new().expect("failed to initialize line editor");

    loop {
        match rl.readline("tinydb> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line).ok();

                match line {
                    ".exit" => break,
                    ".help" => println!("{HELP}"),
                    ".tables" => {
                        for name in dispatcher.table_names() {
                            println!("{name}");
                        }
                    }
                    ".checkpoint" => match dispatcher.checkpoint() {
                        Ok(()) => println!("OK"),
                        Err(e) => println!("Error: {e}"),
                    },
                    _ => run_statement(&mut dispatcher, line),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Readline error: {err:?}");
                break;
            }
        }
    }

    if let Err(e) = dispatcher.checkpoint() {
        eprintln!("warning: checkpoint on exit failed: {e}");
    }
}

fn run_statement(dispatcher: &mut Dispatcher, line: &str) {
    let statement = match parser::parse(line) {
        Ok(s) => s,
        Err(e) => {
            println!("Parse error: {e}");
            return;
        }
    };

    match dispatcher.execute(statement) {
        Ok(ExecResult::Ok) => println!("OK"),
        Ok(ExecResult::Rows(rows)) => print_rows(rows),
        Err(e) => println!("Error: {e}"),
    }
}

fn print_rows(rows: Vec<Vec<Value>>) {
    if rows.is_empty() {
        println!("(0 rows)");
        return;
    }
    let mut builder = Builder::default();
    for row in &rows {
        builder.push_record(row.iter().map(|v| v.to_string()));
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    println!("{table}");
    println!("({} row{})", rows.len(), if rows.len() == 1 { "" } else { "s" });
}
