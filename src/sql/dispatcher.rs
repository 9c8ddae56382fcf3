//! Executes one parsed [`Statement`] against a [`Database`], tracking the
//! session's current transaction the way a client driver would: every DML
//! statement requires an open transaction, and `BEGIN` while one is already
//! open is rejected rather than silently nested.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::sql::parser::Statement;
use crate::value::Value;

#[derive(Debug)]
pub enum ExecResult {
    Ok,
    Rows(Vec<Vec<Value>>),
}

pub struct Dispatcher {
    db: Database,
    current_txn: Option<u64>,
}

impl Dispatcher {
    pub fn new(db: Database) -> Self {
        Self { db, current_txn: None }
    }

    pub fn execute(&mut self, statement: Statement) -> DbResult<ExecResult> {
        match statement {
            Statement::Begin => {
                if self.current_txn.is_some() {
                    return Err(DbError::BadTransactionState);
                }
                self.current_txn = Some(self.db.begin()?);
                Ok(ExecResult::Ok)
            }
            Statement::Commit => {
                let txn = self.take_txn()?;
                self.db.commit(txn)?;
                Ok(ExecResult::Ok)
            }
            Statement::Rollback => {
                let txn = self.take_txn()?;
                self.db.abort(txn)?;
                Ok(ExecResult::Ok)
            }
            Statement::CreateTable { table, columns } => {
                let schema = crate::schema::TableSchema::new(table, columns)?;
                self.db.create_table(schema)?;
                Ok(ExecResult::Ok)
            }
            Statement::Insert { table, values } => self.run_statement(|db, txn| {
                db.table(&table)?.insert(txn, values)?;
                Ok(ExecResult::Ok)
            }),
            Statement::Select { table, filter } => self.run_statement(|db, txn| {
                let handle = db.table(&table)?;
                let rows = match filter {
                    Some(key) => handle.select(txn, &key)?.into_iter().collect(),
                    None => handle.select_all(txn)?,
                };
                Ok(ExecResult::Rows(rows))
            }),
            Statement::Delete { table, filter } => self.run_statement(|db, txn| {
                db.table(&table)?.delete(txn, &filter)?;
                Ok(ExecResult::Ok)
            }),
        }
    }

    /// Runs `f` under the session's open transaction if one is in progress;
    /// otherwise opens an implicit single-statement transaction, commits it
    /// once `f` succeeds, and aborts it if `f` fails — the "immediately
    /// committed" autocommit contract this module's doc comment promises.
    fn run_statement(
        &mut self,
        f: impl FnOnce(&Database, u64) -> DbResult<ExecResult>,
    ) -> DbResult<ExecResult> {
        if let Some(txn) = self.current_txn {
            return f(&self.db, txn);
        }

        let txn = self.db.begin()?;
        match f(&self.db, txn) {
            Ok(result) => {
                self.db.commit(txn)?;
                Ok(result)
            }
            Err(e) => {
                let _ = self.db.abort(txn);
                Err(e)
            }
        }
    }

    fn take_txn(&mut self) -> DbResult<u64> {
        self.current_txn.take().ok_or(DbError::NoActiveTransaction)
    }

    pub fn checkpoint(&self) -> DbResult<()> {
        self.db.checkpoint()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.db.table_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parser::parse;
    use tempfile::NamedTempFile;

    fn new_dispatcher() -> (Dispatcher, NamedTempFile) {
        let tmp = NamedTempFile::new().unwrap();
        let db = Database::open(tmp.path()).unwrap();
        (Dispatcher::new(db), tmp)
    }

    #[test]
    fn explicit_transaction_spans_statements() {
        let (mut dispatcher, _tmp) = new_dispatcher();
        dispatcher
            .execute(parse("CREATE TABLE t (id INT PRIMARY KEY)").unwrap())
            .unwrap();
        dispatcher.execute(parse("BEGIN").unwrap()).unwrap();
        dispatcher
            .execute(parse("INSERT INTO t VALUES (1)").unwrap())
            .unwrap();
        dispatcher.execute(parse("COMMIT").unwrap()).unwrap();

        match dispatcher.execute(parse("SELECT * FROM t WHERE id = 1").unwrap()).unwrap() {
            ExecResult::Rows(rows) => assert_eq!(rows.len(), 1),
            ExecResult::Ok => panic!("expected rows"),
        }
    }

    #[test]
    fn implicit_single_statement_transaction() {
        let (mut dispatcher, _tmp) = new_dispatcher();
        dispatcher
            .execute(parse("CREATE TABLE t (id INT PRIMARY KEY)").unwrap())
            .unwrap();
        dispatcher
            .execute(parse("INSERT INTO t VALUES (1)").unwrap())
            .unwrap();

        match dispatcher.execute(parse("SELECT * FROM t").unwrap()).unwrap() {
            ExecResult::Rows(rows) => assert_eq!(rows.len(), 1),
            ExecResult::Ok => panic!("expected rows"),
        }
    }

    #[test]
    fn commit_without_begin_is_rejected() {
        let (mut dispatcher, _tmp) = new_dispatcher();
        assert!(matches!(
            dispatcher.execute(parse("COMMIT").unwrap()),
            Err(DbError::NoActiveTransaction)
        ));
    }

    #[test]
    fn nested_begin_is_rejected() {
        let (mut dispatcher, _tmp) = new_dispatcher();
        dispatcher.execute(parse("BEGIN").unwrap()).unwrap();
        assert!(matches!(
            dispatcher.execute(parse("BEGIN").unwrap()),
            Err(DbError::BadTransactionState)
        ));
    }
}
