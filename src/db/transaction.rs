// Transaction Manager
// One per datasource node, bound to the node's pool at construction

use crate::db::traits::{ConnectionPool, DatabaseError, PooledGuard};
use std::sync::Arc;

/// Begins transactions on connections borrowed from a single pool
pub struct TransactionManager {
    pool: Arc<dyn ConnectionPool>,
}

impl TransactionManager {
    pub fn new(pool: Arc<dyn ConnectionPool>) -> Self {
        Self { pool }
    }

    /// The pool this manager is bound to
    pub fn pool(&self) -> &Arc<dyn ConnectionPool> {
        &self.pool
    }

    /// Borrow a connection and start a transaction on it
    pub async fn begin(&self) -> Result<Transaction, DatabaseError> {
        let mut conn = PooledGuard::acquire(Arc::clone(&self.pool)).await?;
        conn.execute_batch("BEGIN")
            .await
            .map_err(|e| DatabaseError::TransactionError(format!("begin failed: {}", e)))?;
        Ok(Transaction {
            conn,
            finished: false,
        })
    }
}

/// An open transaction holding its connection until commit or rollback
pub struct Transaction {
    conn: PooledGuard,
    finished: bool,
}

impl Transaction {
    /// Run statements inside the transaction
    pub async fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError> {
        self.conn.execute_batch(sql).await
    }

    pub fn url(&self) -> &str {
        self.conn.url()
    }

    pub async fn commit(mut self) -> Result<(), DatabaseError> {
        self.finish("COMMIT").await
    }

    pub async fn rollback(mut self) -> Result<(), DatabaseError> {
        self.finish("ROLLBACK").await
    }

    async fn finish(&mut self, statement: &str) -> Result<(), DatabaseError> {
        self.finished = true;
        self.conn
            .execute_batch(statement)
            .await
            .map_err(|e| DatabaseError::TransactionError(format!("{} failed: {}", statement, e)))
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(
                url = %self.conn.url(),
                "transaction dropped without commit or rollback"
            );
        }
    }
}
