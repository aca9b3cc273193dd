//! Single-job updates and their aggregate reconciliation.

use rusqlite::Connection;

use crate::{
    Error,
    client::recompute_rollup,
    database_id::JobId,
    job::{Job, JobStatus, Payer, PaymentStatus, get_job, update_job_row},
    transaction::recompute_aggregates,
};

/// The changes to apply to a job. Fields left as `None` are untouched.
///
/// A job's customer attribution and service date are fixed at creation, so
/// neither appears here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    /// A corrected pick-up location.
    pub pick_up: Option<String>,
    /// A corrected delivery location.
    pub delivery: Option<String>,
    /// A corrected amount.
    pub amount: Option<f64>,
    /// A corrected payer.
    pub payer: Option<Payer>,
    /// A new work state.
    pub job_status: Option<JobStatus>,
    /// A new payment state.
    pub payment_status: Option<PaymentStatus>,
}

/// Apply `patch` to a job and bring the owning aggregates up to date.
///
/// The owning daily transaction is resolved through the job's stored
/// transaction reference and its counters are recomputed from the full job
/// set afterwards, so toggling a payment state twice in a row leaves the
/// same aggregate as toggling it once, and amount corrections are reflected
/// in `total_job_amount`/`total_amount_paid` as well.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingJob] if `job_id` does not refer to a job,
/// - [Error::InvalidAmount] if the patched amount is negative or not finite,
/// - or [Error::SqlError] if there is an SQL error.
pub fn update_job(job_id: JobId, patch: JobPatch, connection: &Connection) -> Result<Job, Error> {
    let mut job = get_job(job_id, connection).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingJob,
        error => error,
    })?;

    if let Some(amount) = patch.amount
        && (!amount.is_finite() || amount < 0.0)
    {
        return Err(Error::InvalidAmount(amount));
    }

    let tx = connection.unchecked_transaction()?;

    if let Some(pick_up) = patch.pick_up {
        job.pick_up = pick_up;
    }
    if let Some(delivery) = patch.delivery {
        job.delivery = delivery;
    }
    if let Some(amount) = patch.amount {
        job.amount = amount;
    }
    if let Some(payer) = patch.payer {
        job.payer = payer;
    }
    if let Some(job_status) = patch.job_status {
        job.job_status = job_status;
    }
    if let Some(payment_status) = patch.payment_status {
        job.payment_status = payment_status;
    }

    update_job_row(&job, &tx)?;
    recompute_aggregates(job.transaction, &tx)?;
    recompute_rollup(job.tenant, &job.customer_name, &tx)?;

    tx.commit()?;

    Ok(job)
}
