//! Job deletion and the aggregate cascade it triggers.

use rusqlite::Connection;

use crate::{
    Error,
    client::recompute_rollup,
    database_id::JobId,
    job::{Job, delete_job_row, get_job},
    transaction::recompute_aggregates,
};

/// Remove a job and bring the aggregates that referenced it up to date.
///
/// The owning daily transaction's counters are recomputed from the jobs
/// that remain; a day whose last job is removed becomes `void` rather than
/// being deleted. The owning client's rollup is likewise recomputed, so
/// `last_job_date` falls back to the most recent remaining job (or `None`)
/// instead of keeping the deleted job's date.
///
/// A job whose owning transaction has gone missing is still deleted; the
/// inconsistency is logged rather than surfaced.
///
/// Returns the deleted job.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingJob] if `job_id` does not refer to a job,
/// - or [Error::SqlError] if there is an SQL error.
pub fn delete_job(job_id: JobId, connection: &Connection) -> Result<Job, Error> {
    let job = get_job(job_id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissingJob,
        error => error,
    })?;

    let tx = connection.unchecked_transaction()?;

    delete_job_row(job.id, &tx)?;

    match recompute_aggregates(job.transaction, &tx) {
        Ok(_) => {}
        Err(Error::MissingTransaction(id)) => {
            tracing::warn!(
                job = job.id,
                transaction = id,
                "deleted a job whose owning transaction is missing"
            );
        }
        Err(error) => return Err(error),
    }

    recompute_rollup(job.tenant, &job.customer_name, &tx)?;

    tx.commit()?;

    Ok(job)
}

#[cfg(test)]
mod delete_job_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        client::get_client_by_name,
        database_id::{TenantId, TransactionId},
        db::initialize,
        job::{Payer, PaymentStatus, jobs_for_transaction},
        reconcile::{Delivery, JobPatch, NewDayJobs, create_jobs_for_day, delete_job, update_job},
        tenant::create_tenant,
        transaction::{PaymentState, get_transaction},
    };

    fn ledger_with_jobs(amounts: &[f64]) -> (Connection, TenantId, TransactionId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let tenant = create_tenant("Test Tenant", &conn).unwrap();

        let transaction_id = create_jobs_for_day(
            NewDayJobs {
                tenant: tenant.id,
                date: date!(2024 - 01 - 05),
                customer_name: "Kim".to_owned(),
                pick_up: "Lekki".to_owned(),
                deliveries: amounts
                    .iter()
                    .map(|&amount| Delivery {
                        location: "Ipaja".to_owned(),
                        amount,
                        payer: Payer::Vendor,
                    })
                    .collect(),
            },
            &conn,
        )
        .unwrap();

        (conn, tenant.id, transaction_id)
    }

    #[test]
    fn deleting_every_job_voids_the_day() {
        let amounts = [100.0, 250.0, 4000.0];
        let (conn, _, transaction_id) = ledger_with_jobs(&amounts);

        for job in jobs_for_transaction(transaction_id, &conn).unwrap() {
            delete_job(job.id, &conn).unwrap();
        }

        let transaction = get_transaction(transaction_id, &conn).unwrap();
        assert_eq!(transaction.number_of_jobs, 0);
        assert_eq!(transaction.total_job_amount, 0.0);
        assert_eq!(transaction.total_amount_paid, 0.0);
        assert_eq!(transaction.number_of_paid_jobs, 0);
        assert_eq!(transaction.payment_status, PaymentState::Void);
    }

    #[test]
    fn deleting_an_unpaid_job_leaves_paid_totals_alone() {
        let (conn, _, transaction_id) = ledger_with_jobs(&[1000.0, 2000.0]);
        let jobs = jobs_for_transaction(transaction_id, &conn).unwrap();
        update_job(
            jobs[0].id,
            JobPatch {
                payment_status: Some(PaymentStatus::Paid),
                ..JobPatch::default()
            },
            &conn,
        )
        .unwrap();

        delete_job(jobs[1].id, &conn).unwrap();

        let transaction = get_transaction(transaction_id, &conn).unwrap();
        assert_eq!(transaction.number_of_jobs, 1);
        assert_eq!(transaction.total_job_amount, 1000.0);
        assert_eq!(transaction.total_amount_paid, 1000.0);
        assert_eq!(transaction.payment_status, PaymentState::Paid);
    }

    #[test]
    fn deleting_a_paid_job_releases_its_payment() {
        let (conn, _, transaction_id) = ledger_with_jobs(&[1000.0, 2000.0]);
        let jobs = jobs_for_transaction(transaction_id, &conn).unwrap();
        update_job(
            jobs[0].id,
            JobPatch {
                payment_status: Some(PaymentStatus::Paid),
                ..JobPatch::default()
            },
            &conn,
        )
        .unwrap();

        delete_job(jobs[0].id, &conn).unwrap();

        let transaction = get_transaction(transaction_id, &conn).unwrap();
        assert_eq!(transaction.number_of_jobs, 1);
        assert_eq!(transaction.number_of_paid_jobs, 0);
        assert_eq!(transaction.total_amount_paid, 0.0);
        assert_eq!(transaction.payment_status, PaymentState::NotPaid);
    }

    #[test]
    fn client_date_falls_back_to_remaining_jobs() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let tenant = create_tenant("Test Tenant", &conn).unwrap();
        let entry = |date, amount| NewDayJobs {
            tenant: tenant.id,
            date,
            customer_name: "Kim".to_owned(),
            pick_up: "Lekki".to_owned(),
            deliveries: vec![Delivery {
                location: "Ipaja".to_owned(),
                amount,
                payer: Payer::Vendor,
            }],
        };
        create_jobs_for_day(entry(date!(2024 - 01 - 03), 100.0), &conn).unwrap();
        let late_id = create_jobs_for_day(entry(date!(2024 - 01 - 08), 200.0), &conn).unwrap();
        let late_job = jobs_for_transaction(late_id, &conn).unwrap().remove(0);

        delete_job(late_job.id, &conn).unwrap();

        let client = get_client_by_name(tenant.id, "Kim", &conn).unwrap();
        assert_eq!(client.last_job_date, Some(date!(2024 - 01 - 03)));
        assert_eq!(client.total_jobs, 1);
        assert_eq!(client.total_job_amount, 100.0);

        let remaining = jobs_for_transaction(late_id, &conn).unwrap();
        assert!(remaining.is_empty());
    }

    #[test]
    fn fails_on_missing_job() {
        let (conn, _, transaction_id) = ledger_with_jobs(&[100.0]);
        let job = jobs_for_transaction(transaction_id, &conn).unwrap().remove(0);

        assert_eq!(delete_job(job.id + 99, &conn), Err(Error::DeleteMissingJob));
    }

    #[test]
    fn survives_a_missing_owning_transaction() {
        let (conn, tenant, transaction_id) = ledger_with_jobs(&[100.0]);
        let job = jobs_for_transaction(transaction_id, &conn).unwrap().remove(0);
        conn.execute("DELETE FROM day_transaction WHERE id = ?1", (transaction_id,))
            .unwrap();

        let deleted = delete_job(job.id, &conn).unwrap();

        assert_eq!(deleted.id, job.id);
        let client = get_client_by_name(tenant, "Kim", &conn).unwrap();
        assert_eq!(client.total_jobs, 0);
        assert_eq!(client.last_job_date, None);
    }
}
