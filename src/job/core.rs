//! Defines the core data model and database queries for delivery jobs.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{JobId, TenantId, TransactionId},
};

// ============================================================================
// MODELS
// ============================================================================

/// Who pays for a delivery job.
///
/// The three well-known parties are modelled as variants; anything else a
/// spreadsheet throws at us (e.g. "cash") is preserved as a lower-cased open
/// string rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Payer {
    /// The pick-up party pays.
    PickUp,
    /// The vendor pays.
    Vendor,
    /// The delivery recipient pays.
    Delivery,
    /// A payer outside the well-known set, stored verbatim.
    Other(String),
}

impl Payer {
    /// Map a free-form payer label onto the well-known variants.
    ///
    /// Substring matches are tried first ("Pick up at store" and
    /// "Main Vendor Co" both resolve), then the exact `pick-up` spelling;
    /// unmatched labels are lower-cased and kept as [Payer::Other].
    pub fn normalize(label: &str) -> Self {
        let lower = label.to_lowercase();

        if lower.contains("pick up") || lower.contains("pickup") {
            Payer::PickUp
        } else if lower.contains("vendor") {
            Payer::Vendor
        } else if lower.contains("delivery") {
            Payer::Delivery
        } else if lower == "pick-up" {
            Payer::PickUp
        } else {
            Payer::Other(lower)
        }
    }

    /// The canonical string form stored in the database.
    pub fn as_str(&self) -> &str {
        match self {
            Payer::PickUp => "pick-up",
            Payer::Vendor => "vendor",
            Payer::Delivery => "delivery",
            Payer::Other(label) => label,
        }
    }
}

impl From<String> for Payer {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pick-up" => Payer::PickUp,
            "vendor" => Payer::Vendor,
            "delivery" => Payer::Delivery,
            _ => Payer::Other(value),
        }
    }
}

impl From<Payer> for String {
    fn from(value: Payer) -> Self {
        value.as_str().to_owned()
    }
}

impl ToSql for Payer {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Payer {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(Payer::from(value.as_str()?.to_owned()))
    }
}

/// The work state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    /// The job has been recorded but not carried out.
    Pending,
    /// The delivery was completed.
    Done,
    /// The job was called off.
    Canceled,
    /// The job was pushed to the next day.
    NextDay,
}

impl JobStatus {
    /// The canonical string form stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Done => "done",
            JobStatus::Canceled => "canceled",
            JobStatus::NextDay => "next-day",
        }
    }

    /// Parse the canonical string form.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "pending" => Some(JobStatus::Pending),
            "done" => Some(JobStatus::Done),
            "canceled" => Some(JobStatus::Canceled),
            "next-day" => Some(JobStatus::NextDay),
            _ => None,
        }
    }
}

impl ToSql for JobStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for JobStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        JobStatus::parse(value.as_str()?).ok_or(FromSqlError::InvalidType)
    }
}

/// Whether a single job has been paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStatus {
    /// Payment is outstanding.
    NotPaid,
    /// The job no longer counts towards payment.
    Void,
    /// Payment has been received.
    Paid,
}

impl PaymentStatus {
    /// The canonical string form stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::NotPaid => "not-paid",
            PaymentStatus::Void => "void",
            PaymentStatus::Paid => "paid",
        }
    }

    /// Parse the canonical string form.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "not-paid" => Some(PaymentStatus::NotPaid),
            "void" => Some(PaymentStatus::Void),
            "paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

impl ToSql for PaymentStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PaymentStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        PaymentStatus::parse(value.as_str()?).ok_or(FromSqlError::InvalidType)
    }
}

/// One billable delivery, owned by exactly one daily transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// The ID of the job.
    pub id: JobId,
    /// The tenant the job belongs to.
    pub tenant: TenantId,
    /// The daily transaction that owns this job.
    pub transaction: TransactionId,
    /// The customer the job was carried out for.
    pub customer_name: String,
    /// Where the goods were picked up.
    pub pick_up: String,
    /// Where the goods were delivered.
    pub delivery: String,
    /// The amount billed for the job.
    pub amount: f64,
    /// Who pays for the job.
    pub payer: Payer,
    /// The work state of the job.
    pub job_status: JobStatus,
    /// Whether the job has been paid for.
    pub payment_status: PaymentStatus,
    /// The date of service. Immutable after creation.
    pub created_at: Date,
}

/// The fields required to record a new job.
///
/// New jobs always start out `pending` and `not-paid`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    /// The tenant the job belongs to.
    pub tenant: TenantId,
    /// The daily transaction that owns this job.
    pub transaction: TransactionId,
    /// The customer the job is carried out for.
    pub customer_name: String,
    /// Where the goods are picked up.
    pub pick_up: String,
    /// Where the goods are delivered.
    pub delivery: String,
    /// The amount billed for the job.
    pub amount: f64,
    /// Who pays for the job.
    pub payer: Payer,
    /// The date of service.
    pub created_at: Date,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the job table and its lookup indexes.
pub fn create_job_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS job (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tenant_id INTEGER NOT NULL,
                transaction_id INTEGER NOT NULL,
                customer_name TEXT NOT NULL,
                pick_up TEXT NOT NULL,
                delivery TEXT NOT NULL,
                amount REAL NOT NULL,
                payer TEXT NOT NULL,
                job_status TEXT NOT NULL,
                payment_status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(tenant_id) REFERENCES tenant(id) ON DELETE CASCADE,
                FOREIGN KEY(transaction_id) REFERENCES day_transaction(id) ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_job_transaction ON job(transaction_id)",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_job_tenant_date ON job(tenant_id, created_at)",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_job_tenant_customer ON job(tenant_id, customer_name)",
        (),
    )?;

    Ok(())
}

/// Persist a new job with `pending`/`not-paid` starting statuses.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn create_job(new_job: NewJob, connection: &Connection) -> Result<Job, Error> {
    let job = connection
        .prepare(
            "INSERT INTO job (tenant_id, transaction_id, customer_name, pick_up, delivery,
                              amount, payer, job_status, payment_status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             RETURNING id, tenant_id, transaction_id, customer_name, pick_up, delivery,
                       amount, payer, job_status, payment_status, created_at",
        )?
        .query_one(
            (
                new_job.tenant,
                new_job.transaction,
                new_job.customer_name,
                new_job.pick_up,
                new_job.delivery,
                new_job.amount,
                new_job.payer,
                JobStatus::Pending,
                PaymentStatus::NotPaid,
                new_job.created_at,
            ),
            map_job_row,
        )?;

    Ok(job)
}

/// Retrieve a job by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid job,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_job(id: JobId, connection: &Connection) -> Result<Job, Error> {
    let job = connection
        .prepare(
            "SELECT id, tenant_id, transaction_id, customer_name, pick_up, delivery,
                    amount, payer, job_status, payment_status, created_at
             FROM job WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_job_row)?;

    Ok(job)
}

/// Retrieve the jobs owned by a daily transaction, in insertion order.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn jobs_for_transaction(
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Vec<Job>, Error> {
    connection
        .prepare(
            "SELECT id, tenant_id, transaction_id, customer_name, pick_up, delivery,
                    amount, payer, job_status, payment_status, created_at
             FROM job WHERE transaction_id = :transaction_id ORDER BY id",
        )?
        .query_map(&[(":transaction_id", &transaction_id)], map_job_row)?
        .map(|maybe_job| maybe_job.map_err(Error::SqlError))
        .collect()
}

/// Retrieve a daily transaction's jobs, optionally filtered by work state.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn jobs_with_status(
    transaction_id: TransactionId,
    status: Option<JobStatus>,
    connection: &Connection,
) -> Result<Vec<Job>, Error> {
    match status {
        None => jobs_for_transaction(transaction_id, connection),
        Some(status) => connection
            .prepare(
                "SELECT id, tenant_id, transaction_id, customer_name, pick_up, delivery,
                        amount, payer, job_status, payment_status, created_at
                 FROM job
                 WHERE transaction_id = :transaction_id AND job_status = :job_status
                 ORDER BY id",
            )?
            .query_map(
                &[
                    (":transaction_id", &transaction_id as &dyn ToSql),
                    (":job_status", &status),
                ],
                map_job_row,
            )?
            .map(|maybe_job| maybe_job.map_err(Error::SqlError))
            .collect(),
    }
}

/// Write a job's mutable fields back to the database.
///
/// The customer attribution (`tenant`, `transaction`, `customer_name`) and
/// the service date are fixed at creation and are not written.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingJob] if the job is not in the database,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_job_row(job: &Job, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE job SET pick_up = ?1, delivery = ?2, amount = ?3, payer = ?4,
                        job_status = ?5, payment_status = ?6
         WHERE id = ?7",
        (
            &job.pick_up,
            &job.delivery,
            job.amount,
            &job.payer,
            job.job_status,
            job.payment_status,
            job.id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingJob);
    }

    Ok(())
}

/// Remove a job row.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingJob] if the job is not in the database,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_job_row(id: JobId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM job WHERE id = ?1", (id,))?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingJob);
    }

    Ok(())
}

/// Map a database row to a [Job].
pub fn map_job_row(row: &Row) -> Result<Job, rusqlite::Error> {
    Ok(Job {
        id: row.get(0)?,
        tenant: row.get(1)?,
        transaction: row.get(2)?,
        customer_name: row.get(3)?,
        pick_up: row.get(4)?,
        delivery: row.get(5)?,
        amount: row.get(6)?,
        payer: row.get(7)?,
        job_status: row.get(8)?,
        payment_status: row.get(9)?,
        created_at: row.get(10)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
