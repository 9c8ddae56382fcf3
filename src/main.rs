use std::path::PathBuf;
use tinydb::database::Database;

fn main() {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tinydb.db"));

    println!("tinydb (v0.1.0)");
    println!("data file: {}", path.display());
    println!("Type '.help' for commands.");

    let db = match Database::open(&path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("failed to open {}: {e}", path.display());
            std::process::exit(1);
        }
    };

    tinydb::cli::run(db);
}
