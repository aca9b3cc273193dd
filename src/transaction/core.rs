//! Defines the daily transaction aggregate and its database queries.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{TenantId, TransactionId},
    pagination::{Page, PageRequest},
};

// ============================================================================
// MODELS
// ============================================================================

/// The settlement state of a whole day.
///
/// Derived from the owned job set: `paid` when every job is paid and at
/// least one exists, `void` when the day has no jobs left, `not-paid`
/// otherwise. `not-fully-paid` is accepted when reading legacy rows but is
/// never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentState {
    /// At least one owned job is unpaid, or the day is freshly created.
    NotPaid,
    /// Every owned job has been paid and there is at least one.
    Paid,
    /// Legacy in-between state; readable but never produced.
    NotFullyPaid,
    /// The day has no jobs left.
    Void,
}

impl PaymentState {
    /// The canonical string form stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentState::NotPaid => "not-paid",
            PaymentState::Paid => "paid",
            PaymentState::NotFullyPaid => "not-fully-paid",
            PaymentState::Void => "void",
        }
    }

    /// Parse the canonical string form.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "not-paid" => Some(PaymentState::NotPaid),
            "paid" => Some(PaymentState::Paid),
            "not-fully-paid" => Some(PaymentState::NotFullyPaid),
            "void" => Some(PaymentState::Void),
            _ => None,
        }
    }
}

impl ToSql for PaymentState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PaymentState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        PaymentState::parse(value.as_str()?).ok_or(FromSqlError::InvalidType)
    }
}

/// The running financial summary of one tenant's jobs for one calendar day.
///
/// At most one transaction exists per tenant per day; it is created lazily
/// by the first job of the day and becomes [PaymentState::Void], rather than
/// being deleted, when its last job is removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The tenant the day belongs to.
    pub tenant: TenantId,
    /// The calendar day this aggregate summarises.
    pub created_at: Date,
    /// The sum of all owned job amounts.
    pub total_job_amount: f64,
    /// The number of owned jobs.
    pub number_of_jobs: u32,
    /// The number of owned jobs that have been paid.
    pub number_of_paid_jobs: u32,
    /// The sum of amounts over paid jobs.
    pub total_amount_paid: f64,
    /// The settlement state of the day.
    pub payment_status: PaymentState,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the daily transaction table.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS day_transaction (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tenant_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                total_job_amount REAL NOT NULL,
                number_of_jobs INTEGER NOT NULL,
                number_of_paid_jobs INTEGER NOT NULL,
                total_amount_paid REAL NOT NULL,
                payment_status TEXT NOT NULL,
                FOREIGN KEY(tenant_id) REFERENCES tenant(id) ON DELETE CASCADE,
                UNIQUE(tenant_id, created_at)
                )",
        (),
    )?;

    Ok(())
}

const TRANSACTION_COLUMNS: &str = "id, tenant_id, created_at, total_job_amount, number_of_jobs,
                                   number_of_paid_jobs, total_amount_paid, payment_status";

/// Fetch the aggregate for `(tenant, day)`, creating a zero-initialized one
/// if the day has not been seen before.
///
/// This is the idempotent find-or-create every mutation path goes through;
/// callers are expected to hold the connection lock for the whole
/// reconciliation sequence so two writers cannot race the creation.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_or_create_for_day(
    tenant: TenantId,
    day: Date,
    connection: &Connection,
) -> Result<Transaction, Error> {
    match get_for_day(tenant, day, connection) {
        Ok(transaction) => Ok(transaction),
        Err(Error::NotFound) => {
            let transaction = connection
                .prepare(&format!(
                    "INSERT INTO day_transaction (tenant_id, created_at, total_job_amount,
                                                  number_of_jobs, number_of_paid_jobs,
                                                  total_amount_paid, payment_status)
                     VALUES (?1, ?2, 0, 0, 0, 0, ?3)
                     RETURNING {TRANSACTION_COLUMNS}"
                ))?
                .query_one((tenant, day, PaymentState::NotPaid), map_transaction_row)?;

            Ok(transaction)
        }
        Err(error) => Err(error),
    }
}

/// Retrieve the aggregate for `(tenant, day)`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the tenant has no transaction for that day,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_for_day(
    tenant: TenantId,
    day: Date,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM day_transaction
             WHERE tenant_id = :tenant_id AND created_at = :created_at"
        ))?
        .query_one(
            &[
                (":tenant_id", &tenant as &dyn ToSql),
                (":created_at", &day),
            ],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingTransaction] if `id` does not refer to a transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM day_transaction WHERE id = :id"
        ))?
        .query_one(&[(":id", &id)], map_transaction_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::MissingTransaction(id),
            error => error.into(),
        })
}

/// Retrieve the most recent transaction strictly before `day`, if any.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn latest_before(
    tenant: TenantId,
    day: Date,
    connection: &Connection,
) -> Result<Option<Transaction>, Error> {
    match connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM day_transaction
             WHERE tenant_id = :tenant_id AND created_at < :created_at
             ORDER BY created_at DESC LIMIT 1"
        ))?
        .query_one(
            &[
                (":tenant_id", &tenant as &dyn ToSql),
                (":created_at", &day),
            ],
            map_transaction_row,
        ) {
        Ok(transaction) => Ok(Some(transaction)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Retrieve a tenant's transactions whose day falls in `[start, end]`, in
/// chronological order.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn transactions_in_range(
    tenant: TenantId,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM day_transaction
             WHERE tenant_id = :tenant_id AND created_at BETWEEN :start AND :end
             ORDER BY created_at"
        ))?
        .query_map(
            &[
                (":tenant_id", &tenant as &dyn ToSql),
                (":start", &start),
                (":end", &end),
            ],
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
        .collect()
}

/// Retrieve one page of a tenant's transactions, newest day first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn list_transactions(
    tenant: TenantId,
    request: PageRequest,
    connection: &Connection,
) -> Result<Page<Transaction>, Error> {
    let total_items = connection.query_row(
        "SELECT COUNT(id) FROM day_transaction WHERE tenant_id = :tenant_id",
        &[(":tenant_id", &tenant)],
        |row| row.get::<_, i64>(0),
    )? as u64;

    let items = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM day_transaction
             WHERE tenant_id = :tenant_id
             ORDER BY created_at DESC LIMIT :limit OFFSET :offset"
        ))?
        .query_map(
            &[
                (":tenant_id", &tenant as &dyn ToSql),
                (":limit", &(request.per_page as i64)),
                (":offset", &(request.offset() as i64)),
            ],
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page::new(total_items, request, items))
}

/// Recompute a transaction's counters from its owned job set.
///
/// This is the single source of truth for the aggregate invariant: totals
/// and counts are summed over the jobs currently referencing the
/// transaction, and the settlement state follows from those counts. Every
/// mutation path funnels through here rather than applying deltas, so a
/// reordered or partially-applied update cannot leave the counters adrift.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingTransaction] if `id` does not refer to a transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn recompute_aggregates(
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let (number_of_jobs, total_job_amount, number_of_paid_jobs, total_amount_paid): (
        u32,
        f64,
        u32,
        f64,
    ) = connection.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(amount), 0),
                COALESCE(SUM(CASE WHEN payment_status = 'paid' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN payment_status = 'paid' THEN amount ELSE 0 END), 0)
         FROM job WHERE transaction_id = :id",
        &[(":id", &id)],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    )?;

    let payment_status = if number_of_jobs == 0 {
        PaymentState::Void
    } else if number_of_paid_jobs == number_of_jobs {
        PaymentState::Paid
    } else {
        PaymentState::NotPaid
    };

    let transaction = connection
        .prepare(&format!(
            "UPDATE day_transaction
             SET total_job_amount = ?1, number_of_jobs = ?2, number_of_paid_jobs = ?3,
                 total_amount_paid = ?4, payment_status = ?5
             WHERE id = ?6
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_one(
            (
                total_job_amount,
                number_of_jobs,
                number_of_paid_jobs,
                total_amount_paid,
                payment_status,
                id,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::MissingTransaction(id),
            error => error.into(),
        })?;

    Ok(transaction)
}

/// Map a database row to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        tenant: row.get(1)?,
        created_at: row.get(2)?,
        total_job_amount: row.get(3)?,
        number_of_jobs: row.get(4)?,
        number_of_paid_jobs: row.get(5)?,
        total_amount_paid: row.get(6)?,
        payment_status: row.get(7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
