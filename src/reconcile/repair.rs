//! Recovery pass that rebuilds every aggregate from the job table.
//!
//! The engine keeps aggregates consistent transactionally, but a store
//! restored from a partial backup (or written by an older, delta-based
//! implementation) can carry counters that have drifted from the job set.
//! This pass recomputes all of them from scratch.

use rusqlite::Connection;

use crate::{
    Error, client::recompute_rollup, database_id::TenantId, transaction::recompute_aggregates,
};

/// How much work a repair pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairSummary {
    /// The number of daily transactions recomputed.
    pub transactions: u32,
    /// The number of client rollups recomputed.
    pub clients: u32,
}

/// Recompute every daily transaction and client rollup of a tenant from the
/// underlying jobs.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn rebuild_aggregates(
    tenant: TenantId,
    connection: &Connection,
) -> Result<RepairSummary, Error> {
    let tx = connection.unchecked_transaction()?;

    let transaction_ids: Vec<i64> = tx
        .prepare("SELECT id FROM day_transaction WHERE tenant_id = :tenant_id")?
        .query_map(&[(":tenant_id", &tenant)], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    for &id in &transaction_ids {
        recompute_aggregates(id, &tx)?;
    }

    let client_names: Vec<String> = tx
        .prepare("SELECT name FROM client WHERE tenant_id = :tenant_id")?
        .query_map(&[(":tenant_id", &tenant)], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    for name in &client_names {
        recompute_rollup(tenant, name, &tx)?;
    }

    tx.commit()?;

    let summary = RepairSummary {
        transactions: transaction_ids.len() as u32,
        clients: client_names.len() as u32,
    };

    tracing::info!(
        tenant,
        transactions = summary.transactions,
        clients = summary.clients,
        "rebuilt aggregates from job scan"
    );

    Ok(summary)
}
