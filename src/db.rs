//! Schema initialization for the ledger database.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error, client::create_client_table, expense::create_expense_tables, job::create_job_table,
    tenant::create_tenant_table, transaction::create_transaction_table,
};

/// Create all ledger tables and indexes.
///
/// Safe to call on an already-initialized database; every statement uses
/// `IF NOT EXISTS`. The whole sequence runs in one exclusive transaction so
/// a half-created schema is never left behind.
///
/// # Errors
/// Returns an [Error::SqlError] if a table cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Integrity between aggregates and their jobs is managed in application
    // code (deletions recompute or void the owning transaction and fall back
    // to remaining jobs), so foreign-key enforcement is left off — matching
    // the standard SQLite default. This also keeps a job reachable after its
    // owning transaction has gone missing, which the delete path handles
    // explicitly rather than cascading.
    connection.pragma_update(None, "foreign_keys", false)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_tenant_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_job_table(&transaction)?;
    create_client_table(&transaction)?;
    create_expense_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}
