//! End-to-end scenarios exercising the full stack through the public
//! `Database` API (catalog, B+-tree, heap, MVCC together).

use tempfile::NamedTempFile;
use tinydb::database::Database;
use tinydb::error::DbError;
use tinydb::schema::{Column, TableSchema};
use tinydb::value::{ColumnType, Value};

fn users_schema() -> TableSchema {
    TableSchema::new(
        "users",
        vec![
            Column::new("id", ColumnType::Int32, true),
            Column::new("name", ColumnType::Varchar(50), false),
            Column::new("age", ColumnType::Int32, false),
        ],
    )
    .unwrap()
}

/// S1: durability across an explicit checkpoint and a reopen.
#[test]
fn durability_survives_checkpoint_and_reopen() {
    let tmp = NamedTempFile::new().unwrap();
    let path = tmp.path().to_path_buf();
    {
        let db = Database::open(&path).unwrap();
        db.create_table(users_schema()).unwrap();

        let txn = db.begin().unwrap();
        let users = db.table("users").unwrap();
        users
            .insert(txn, vec![Value::Int32(1), Value::Varchar("Alice".into()), Value::Int32(25)])
            .unwrap();
        users
            .insert(txn, vec![Value::Int32(2), Value::Varchar("Bob".into()), Value::Int32(30)])
            .unwrap();

        let row = users.select(txn, &Value::Int32(1)).unwrap().unwrap();
        assert_eq!(row, vec![Value::Int32(1), Value::Varchar("Alice".into()), Value::Int32(25)]);

        db.commit(txn).unwrap();
        db.checkpoint().unwrap();
    }

    let db = Database::open(&path).unwrap();
    let txn = db.begin().unwrap();
    let row = db.table("users").unwrap().select(txn, &Value::Int32(2)).unwrap().unwrap();
    assert_eq!(row, vec![Value::Int32(2), Value::Varchar("Bob".into()), Value::Int32(30)]);
}

/// S2: inserting 49 ascending keys splits the root at least once, and
/// every key is still reachable afterward.
#[test]
fn forty_nine_inserts_split_the_root_and_stay_reachable() {
    let tmp = NamedTempFile::new().unwrap();
    let db = Database::open(tmp.path()).unwrap();
    db.create_table(
        TableSchema::new("t", vec![Column::new("id", ColumnType::Int32, true)]).unwrap(),
    )
    .unwrap();

    let txn = db.begin().unwrap();
    let t = db.table("t").unwrap();
    for id in 0..49i32 {
        t.insert(txn, vec![Value::Int32(id)]).unwrap();
    }
    db.commit(txn).unwrap();

    let reader = db.begin().unwrap();
    let t = db.table("t").unwrap();
    for id in 0..49i32 {
        assert_eq!(
            t.select(reader, &Value::Int32(id)).unwrap(),
            Some(vec![Value::Int32(id)]),
            "id {id} should be reachable after the root split"
        );
    }
    assert_eq!(t.select_all(reader).unwrap().len(), 49);
}

/// S3: weaker-than-snapshot-isolation — a transaction that started before
/// another committed can still observe that commit mid-transaction.
#[test]
fn committed_writes_become_visible_mid_transaction() {
    let tmp = NamedTempFile::new().unwrap();
    let db = Database::open(tmp.path()).unwrap();
    db.create_table(
        TableSchema::new("t", vec![Column::new("id", ColumnType::Int32, true)]).unwrap(),
    )
    .unwrap();

    let t1 = db.begin().unwrap();
    db.table("t").unwrap().insert(t1, vec![Value::Int32(1)]).unwrap();

    let t2 = db.begin().unwrap();
    assert_eq!(db.table("t").unwrap().select(t2, &Value::Int32(1)).unwrap(), None);

    db.commit(t1).unwrap();

    assert_eq!(
        db.table("t").unwrap().select(t2, &Value::Int32(1)).unwrap(),
        Some(vec![Value::Int32(1)])
    );
}

/// S4: a rolled-back insert never becomes visible, even to later readers.
#[test]
fn rollback_hides_insert_from_all_future_readers() {
    let tmp = NamedTempFile::new().unwrap();
    let db = Database::open(tmp.path()).unwrap();
    db.create_table(
        TableSchema::new("t", vec![Column::new("id", ColumnType::Int32, true)]).unwrap(),
    )
    .unwrap();

    let t1 = db.begin().unwrap();
    db.table("t").unwrap().insert(t1, vec![Value::Int32(1)]).unwrap();
    db.abort(t1).unwrap();

    let t2 = db.begin().unwrap();
    assert_eq!(db.table("t").unwrap().select(t2, &Value::Int32(1)).unwrap(), None);
}

/// S5: a committed delete hides the row from later transactions.
#[test]
fn committed_delete_hides_row_from_later_readers() {
    let tmp = NamedTempFile::new().unwrap();
    let db = Database::open(tmp.path()).unwrap();
    db.create_table(
        TableSchema::new("t", vec![Column::new("id", ColumnType::Int32, true)]).unwrap(),
    )
    .unwrap();

    let insert_txn = db.begin().unwrap();
    db.table("t").unwrap().insert(insert_txn, vec![Value::Int32(1)]).unwrap();
    db.commit(insert_txn).unwrap();

    let delete_txn = db.begin().unwrap();
    db.table("t").unwrap().delete(delete_txn, &Value::Int32(1)).unwrap();
    db.commit(delete_txn).unwrap();

    let reader = db.begin().unwrap();
    assert_eq!(db.table("t").unwrap().select(reader, &Value::Int32(1)).unwrap(), None);
}

/// S6: inserting the same primary key twice within one transaction fails
/// on the second call.
#[test]
fn duplicate_primary_key_in_same_transaction_fails() {
    let tmp = NamedTempFile::new().unwrap();
    let db = Database::open(tmp.path()).unwrap();
    db.create_table(
        TableSchema::new("t", vec![Column::new("id", ColumnType::Int32, true)]).unwrap(),
    )
    .unwrap();

    let txn = db.begin().unwrap();
    let t = db.table("t").unwrap();
    t.insert(txn, vec![Value::Int32(1)]).unwrap();
    assert!(matches!(t.insert(txn, vec![Value::Int32(1)]), Err(DbError::DuplicateKey)));
}

/// End-to-end through the SQL surface: parse, dispatch, and render results
/// the way the shell does.
#[test]
fn sql_round_trip_through_dispatcher() {
    use tinydb::sql::dispatcher::{Dispatcher, ExecResult};
    use tinydb::sql::parser::parse;

    let tmp = NamedTempFile::new().unwrap();
    let db = Database::open(tmp.path()).unwrap();
    let mut dispatcher = Dispatcher::new(db);

    dispatcher
        .execute(parse("CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR(50))").unwrap())
        .unwrap();
    dispatcher.execute(parse("BEGIN").unwrap()).unwrap();
    dispatcher
        .execute(parse("INSERT INTO users VALUES (1, 'Alice')").unwrap())
        .unwrap();
    dispatcher.execute(parse("COMMIT").unwrap()).unwrap();

    match dispatcher
        .execute(parse("SELECT * FROM users WHERE id = 1").unwrap())
        .unwrap()
    {
        ExecResult::Rows(rows) => {
            assert_eq!(rows, vec![vec![Value::Int32(1), Value::Varchar("Alice".into())]]);
        }
        ExecResult::Ok => panic!("expected rows"),
    }
}
