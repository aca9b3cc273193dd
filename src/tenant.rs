//! Tenant accounts and their ledger settings.
//!
//! Every piece of data in the ledger is scoped by a tenant ID. The tenant
//! row also carries the two settings the report builder needs: the opening
//! balance folded into the dashboard's net amount, and the length of the
//! tenant's work week used to anchor weekly report windows.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::TenantId};

/// An individual business account. All jobs, aggregates and expenses belong
/// to exactly one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    /// The ID of the tenant.
    pub id: TenantId,
    /// The business name, unique across the ledger.
    pub name: String,
    /// Cash on hand before the first recorded day.
    pub opening_balance: f64,
    /// How many days the tenant works per week (5 or 6).
    pub working_days_per_week: u8,
}

/// Create the tenant table.
pub fn create_tenant_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS tenant (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                opening_balance REAL NOT NULL DEFAULT 0,
                working_days_per_week INTEGER NOT NULL DEFAULT 6
                )",
        (),
    )?;

    Ok(())
}

/// Create a new tenant with a zero opening balance and a six-day work week.
///
/// # Errors
/// Returns an [Error::SqlError] if the name already exists or there is some
/// other SQL error.
pub fn create_tenant(name: &str, connection: &Connection) -> Result<Tenant, Error> {
    let tenant = connection
        .prepare(
            "INSERT INTO tenant (name) VALUES (?1)
             RETURNING id, name, opening_balance, working_days_per_week",
        )?
        .query_one((name,), map_tenant_row)?;

    Ok(tenant)
}

/// Retrieve a tenant by its `id`.
///
/// # Errors
/// Returns [Error::UnknownTenant] if `id` does not refer to a tenant.
pub fn get_tenant(id: TenantId, connection: &Connection) -> Result<Tenant, Error> {
    connection
        .prepare(
            "SELECT id, name, opening_balance, working_days_per_week FROM tenant WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_tenant_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UnknownTenant(id),
            error => error.into(),
        })
}

/// Update a tenant's opening balance and work-week length.
///
/// # Errors
/// Returns [Error::UnknownTenant] if `id` does not refer to a tenant.
pub fn update_tenant_settings(
    id: TenantId,
    opening_balance: f64,
    working_days_per_week: u8,
    connection: &Connection,
) -> Result<Tenant, Error> {
    let rows_affected = connection.execute(
        "UPDATE tenant SET opening_balance = ?1, working_days_per_week = ?2 WHERE id = ?3",
        (opening_balance, working_days_per_week, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UnknownTenant(id));
    }

    get_tenant(id, connection)
}

fn map_tenant_row(row: &Row) -> Result<Tenant, rusqlite::Error> {
    Ok(Tenant {
        id: row.get(0)?,
        name: row.get(1)?,
        opening_balance: row.get(2)?,
        working_days_per_week: row.get(3)?,
    })
}
