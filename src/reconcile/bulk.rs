//! Whole-day status changes: mark every job done and/or paid at once.

use rusqlite::Connection;

use crate::{
    Error,
    database_id::TransactionId,
    job::{JobStatus, PaymentStatus, jobs_for_transaction},
    transaction::{Transaction, get_transaction, recompute_aggregates},
};

/// Which statuses to apply across a day's jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BulkStatusUpdate {
    /// Set every job's work state to `done`.
    pub mark_done: bool,
    /// Set every job's payment state to `paid`.
    pub mark_paid: bool,
}

/// The result of a bulk status change.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkUpdateOutcome {
    /// Whether anything had to change. `false` means the short-circuit path
    /// was taken because every requested state was already satisfied.
    pub changed: bool,
    /// The transaction after the call.
    pub transaction: Transaction,
}

/// Apply the requested statuses to every job of a daily transaction.
///
/// Short-circuits without writing when all owned jobs already satisfy every
/// requested state, which makes the operation idempotent: a second call with
/// the same flags reports `changed: false` and leaves the aggregate
/// untouched. When work is needed, the aggregate is recomputed from the
/// updated job set rather than patched incrementally, so the outcome does
/// not depend on the order jobs were touched in.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingTransaction] if `transaction_id` does not refer to a
///   daily transaction,
/// - or [Error::SqlError] if there is an SQL error.
pub fn bulk_update_transaction_jobs(
    transaction_id: TransactionId,
    request: BulkStatusUpdate,
    connection: &Connection,
) -> Result<BulkUpdateOutcome, Error> {
    let transaction = get_transaction(transaction_id, connection)?;
    let jobs = jobs_for_transaction(transaction_id, connection)?;

    let needs_done = request.mark_done
        && jobs.iter().any(|job| job.job_status != JobStatus::Done);
    let needs_paid = request.mark_paid
        && jobs
            .iter()
            .any(|job| job.payment_status != PaymentStatus::Paid);

    if !needs_done && !needs_paid {
        return Ok(BulkUpdateOutcome {
            changed: false,
            transaction,
        });
    }

    let tx = connection.unchecked_transaction()?;

    if needs_done {
        tx.execute(
            "UPDATE job SET job_status = ?1 WHERE transaction_id = ?2 AND job_status <> ?1",
            (JobStatus::Done, transaction_id),
        )?;
    }

    if needs_paid {
        tx.execute(
            "UPDATE job SET payment_status = ?1
             WHERE transaction_id = ?2 AND payment_status <> ?1",
            (PaymentStatus::Paid, transaction_id),
        )?;
    }

    let transaction = recompute_aggregates(transaction_id, &tx)?;

    tx.commit()?;

    Ok(BulkUpdateOutcome {
        changed: true,
        transaction,
    })
}
