//! Defines the per-client rollup and its database queries.

use rusqlite::{Connection, Row, types::ToSql};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{ClientId, TenantId},
    pagination::{Page, PageRequest},
};

// ============================================================================
// MODELS
// ============================================================================

/// A tenant's customer, rolled up across all jobs ever recorded for them.
///
/// Clients are created lazily by the first job that names them and are never
/// deleted; the rollup shrinks when jobs are deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// The ID of the client.
    pub id: ClientId,
    /// The tenant this customer belongs to.
    pub tenant: TenantId,
    /// The customer name, unique per tenant.
    pub name: String,
    /// The number of jobs currently attributed to this customer.
    pub total_jobs: u32,
    /// The most recent service date among the customer's jobs, if any.
    pub last_job_date: Option<Date>,
    /// The sum of job amounts attributed to this customer.
    pub total_job_amount: f64,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the client table.
pub fn create_client_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS client (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tenant_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                total_jobs INTEGER NOT NULL,
                last_job_date TEXT,
                total_job_amount REAL NOT NULL,
                FOREIGN KEY(tenant_id) REFERENCES tenant(id) ON DELETE CASCADE,
                UNIQUE(tenant_id, name)
                )",
        (),
    )?;

    Ok(())
}

const CLIENT_COLUMNS: &str = "id, tenant_id, name, total_jobs, last_job_date, total_job_amount";

/// Fetch the rollup for `(tenant, name)`, creating a zero-initialized one if
/// this customer has not been seen before.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_or_create_client(
    tenant: TenantId,
    name: &str,
    connection: &Connection,
) -> Result<Client, Error> {
    match get_client_by_name(tenant, name, connection) {
        Ok(client) => Ok(client),
        Err(Error::NotFound) => {
            let client = connection
                .prepare(&format!(
                    "INSERT INTO client (tenant_id, name, total_jobs, last_job_date,
                                         total_job_amount)
                     VALUES (?1, ?2, 0, NULL, 0)
                     RETURNING {CLIENT_COLUMNS}"
                ))?
                .query_one((tenant, name), map_client_row)?;

            Ok(client)
        }
        Err(error) => Err(error),
    }
}

/// Retrieve the rollup for `(tenant, name)`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the tenant has no client with that name,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_client_by_name(
    tenant: TenantId,
    name: &str,
    connection: &Connection,
) -> Result<Client, Error> {
    let client = connection
        .prepare(&format!(
            "SELECT {CLIENT_COLUMNS} FROM client
             WHERE tenant_id = :tenant_id AND name = :name"
        ))?
        .query_one(
            &[(":tenant_id", &tenant as &dyn ToSql), (":name", &name)],
            map_client_row,
        )?;

    Ok(client)
}

/// Retrieve one page of a tenant's clients, alphabetically.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn list_clients(
    tenant: TenantId,
    request: PageRequest,
    connection: &Connection,
) -> Result<Page<Client>, Error> {
    let total_items = connection.query_row(
        "SELECT COUNT(id) FROM client WHERE tenant_id = :tenant_id",
        &[(":tenant_id", &tenant)],
        |row| row.get::<_, i64>(0),
    )? as u64;

    let items = connection
        .prepare(&format!(
            "SELECT {CLIENT_COLUMNS} FROM client
             WHERE tenant_id = :tenant_id
             ORDER BY name LIMIT :limit OFFSET :offset"
        ))?
        .query_map(
            &[
                (":tenant_id", &tenant as &dyn ToSql),
                (":limit", &(request.per_page as i64)),
                (":offset", &(request.offset() as i64)),
            ],
            map_client_row,
        )?
        .map(|maybe_client| maybe_client.map_err(Error::SqlError))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page::new(total_items, request, items))
}

/// Recompute a client's rollup from the jobs currently attributed to them.
///
/// `last_job_date` is taken as the maximum service date over the customer's
/// remaining jobs, never carried over from a deleted job; it becomes `None`
/// when no jobs remain.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the tenant has no client with that name,
/// - or [Error::SqlError] there is some other SQL error.
pub fn recompute_rollup(
    tenant: TenantId,
    name: &str,
    connection: &Connection,
) -> Result<Client, Error> {
    let (total_jobs, total_job_amount, last_job_date): (u32, f64, Option<Date>) = connection
        .query_row(
            "SELECT COUNT(*), COALESCE(SUM(amount), 0), MAX(created_at)
             FROM job WHERE tenant_id = :tenant_id AND customer_name = :name",
            &[(":tenant_id", &tenant as &dyn ToSql), (":name", &name)],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

    let client = connection
        .prepare(&format!(
            "UPDATE client SET total_jobs = ?1, last_job_date = ?2, total_job_amount = ?3
             WHERE tenant_id = ?4 AND name = ?5
             RETURNING {CLIENT_COLUMNS}"
        ))?
        .query_one(
            (total_jobs, last_job_date, total_job_amount, tenant, name),
            map_client_row,
        )?;

    Ok(client)
}

/// Map a database row to a [Client].
pub fn map_client_row(row: &Row) -> Result<Client, rusqlite::Error> {
    Ok(Client {
        id: row.get(0)?,
        tenant: row.get(1)?,
        name: row.get(2)?,
        total_jobs: row.get(3)?,
        last_job_date: row.get(4)?,
        total_job_amount: row.get(5)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
