use std::{
    fmt::{self, Debug, Formatter},
    ops::Deref,
};

use crate::{Connection, Result, TransactionBehavior};

/// An in-progress database transaction or savepoint.
///
/// A transaction starts with a call to [`Connection::begin`] or [`Connection::begin_with`].
/// When a transaction is already open on the connection, a savepoint is created instead.
///
/// A transaction should end with a call to [`commit`] or [`rollback`]. If neither are called
/// before the transaction goes out-of-scope, [`rollback`] is called. In other words,
/// [`rollback`] is called on `drop` if the transaction is still in-progress.
///
/// [`commit`]: Self::commit()
/// [`rollback`]: Self::rollback()
pub struct Transaction<'c> {
    conn: &'c Connection,
    savepoint: Option<String>,
    open: bool,
}

impl<'c> Transaction<'c> {
    pub(crate) fn begin(conn: &'c Connection, behavior: TransactionBehavior) -> Result<Self> {
        let depth = conn.transaction_depth.get();
        let savepoint = if depth == 0 && conn.is_autocommit() {
            conn.exec(&format!("BEGIN {behavior}"))?;
            None
        } else {
            let name = format!("upsertlite_savepoint_{depth}");
            conn.exec(&format!("SAVEPOINT {name}"))?;
            Some(name)
        };
        conn.transaction_depth.set(depth + 1);
        Ok(Self {
            conn,
            savepoint,
            open: true,
        })
    }

    /// Commits this transaction or releases this savepoint.
    pub fn commit(mut self) -> Result<()> {
        let sql = match &self.savepoint {
            None => "COMMIT".to_string(),
            Some(name) => format!("RELEASE SAVEPOINT {name}"),
        };
        self.conn.exec(&sql)?;
        self.close();
        Ok(())
    }

    /// Aborts this transaction or rolls back to this savepoint.
    pub fn rollback(mut self) -> Result<()> {
        let result = self.rollback_inner();
        self.close();
        result
    }

    fn rollback_inner(&self) -> Result<()> {
        match &self.savepoint {
            None => self.conn.exec("ROLLBACK"),
            Some(name) => self
                .conn
                .exec(&format!("ROLLBACK TO SAVEPOINT {name}; RELEASE SAVEPOINT {name}")),
        }
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            let depth = self.conn.transaction_depth.get();
            self.conn.transaction_depth.set(depth.saturating_sub(1));
        }
    }

    /// `true` for a savepoint nested inside another transaction.
    pub fn is_savepoint(&self) -> bool {
        self.savepoint.is_some()
    }
}

impl Debug for Transaction<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("open", &self.open)
            .field("savepoint", &self.savepoint)
            .field("transaction_depth", &self.conn.transaction_depth.get())
            .finish()
    }
}

impl Deref for Transaction<'_> {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        self.conn
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.open {
            // A failed step may already have rolled the transaction back.
            if self.savepoint.is_some() || !self.conn.is_autocommit() {
                if let Err(e) = self.rollback_inner() {
                    tracing::warn!("rollback of dropped transaction failed: {e}");
                }
            }
            self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Connection, TransactionBehavior};

    fn count(conn: &Connection) -> i64 {
        let (n,): (i64,) = conn
            .prepare("SELECT count(*) FROM t")
            .unwrap()
            .fetch_one()
            .unwrap();
        n
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.exec("CREATE TABLE t (v INTEGER)").unwrap();
        conn
    }

    #[test]
    fn commit_persists() {
        let conn = setup();
        let tx = conn.begin_with(TransactionBehavior::Immediate).unwrap();
        assert!(!tx.is_autocommit());
        tx.exec("INSERT INTO t VALUES (1)").unwrap();
        tx.commit().unwrap();
        assert!(conn.is_autocommit());
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn drop_rolls_back() {
        let conn = setup();
        {
            let tx = conn.begin().unwrap();
            tx.exec("INSERT INTO t VALUES (1)").unwrap();
        }
        assert!(conn.is_autocommit());
        assert_eq!(count(&conn), 0);
    }

    #[test]
    fn nested_transactions_use_savepoints() {
        let conn = setup();
        let outer = conn.begin().unwrap();
        outer.exec("INSERT INTO t VALUES (1)").unwrap();

        let inner = outer.begin().unwrap();
        assert!(inner.is_savepoint());
        inner.exec("INSERT INTO t VALUES (2)").unwrap();
        inner.rollback().unwrap();
        assert_eq!(count(&conn), 1);

        let inner = outer.begin().unwrap();
        inner.exec("INSERT INTO t VALUES (3)").unwrap();
        inner.commit().unwrap();

        outer.commit().unwrap();
        assert_eq!(count(&conn), 2);
        assert_eq!(conn.transaction_depth.get(), 0);
    }

    #[test]
    fn begin_inside_manual_transaction_is_a_savepoint() {
        let conn = setup();
        conn.exec("BEGIN").unwrap();
        let tx = conn.begin().unwrap();
        assert!(tx.is_savepoint());
        tx.exec("INSERT INTO t VALUES (1)").unwrap();
        drop(tx);
        conn.exec("COMMIT").unwrap();
        assert_eq!(count(&conn), 0);
    }
}
