//! Job creation: one ledger entry covering several deliveries for a day.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    client::{get_or_create_client, recompute_rollup},
    database_id::{TenantId, TransactionId},
    job::{NewJob, Payer, create_job},
    transaction::{get_or_create_for_day, recompute_aggregates},
};

/// One delivery leg of a ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Where the goods go.
    pub location: String,
    /// The amount billed for this leg.
    pub amount: f64,
    /// Who pays for this leg.
    pub payer: Payer,
}

/// A day's worth of jobs for one customer, as handed over by the caller.
///
/// Rows extracted from an uploaded spreadsheet arrive through the same
/// struct: the sheet extractor normalizes each row into a [Delivery] and the
/// engine makes no distinction between the two sources.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDayJobs {
    /// The tenant recording the jobs.
    pub tenant: TenantId,
    /// The date of service.
    pub date: Date,
    /// The customer the jobs are carried out for.
    pub customer_name: String,
    /// Where the goods are picked up.
    pub pick_up: String,
    /// The delivery legs; must not be empty.
    pub deliveries: Vec<Delivery>,
}

/// Record a batch of jobs against the day's aggregate.
///
/// Finds or creates the daily transaction for `(tenant, date)` and the
/// client rollup for the customer, persists one job per delivery, and
/// brings both aggregates up to date. A new unpaid job always demotes a
/// previously fully-paid day back to `not-paid`.
///
/// The whole sequence runs in one SQL transaction; a failure part-way
/// through leaves no trace.
///
/// Returns the ID of the daily transaction the jobs were recorded under.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyDeliveryList] if `deliveries` is empty,
/// - [Error::InvalidAmount] if any amount is negative or not finite,
/// - or [Error::SqlError] if there is an SQL error.
pub fn create_jobs_for_day(
    new_jobs: NewDayJobs,
    connection: &Connection,
) -> Result<TransactionId, Error> {
    if new_jobs.deliveries.is_empty() {
        return Err(Error::EmptyDeliveryList);
    }

    for delivery in &new_jobs.deliveries {
        if !delivery.amount.is_finite() || delivery.amount < 0.0 {
            return Err(Error::InvalidAmount(delivery.amount));
        }
    }

    let tx = connection.unchecked_transaction()?;

    let transaction = get_or_create_for_day(new_jobs.tenant, new_jobs.date, &tx)?;
    get_or_create_client(new_jobs.tenant, &new_jobs.customer_name, &tx)?;

    for delivery in new_jobs.deliveries {
        create_job(
            NewJob {
                tenant: new_jobs.tenant,
                transaction: transaction.id,
                customer_name: new_jobs.customer_name.clone(),
                pick_up: new_jobs.pick_up.clone(),
                delivery: delivery.location,
                amount: delivery.amount,
                payer: delivery.payer,
                created_at: new_jobs.date,
            },
            &tx,
        )?;
    }

    recompute_aggregates(transaction.id, &tx)?;
    recompute_rollup(new_jobs.tenant, &new_jobs.customer_name, &tx)?;

    tx.commit()?;

    tracing::debug!(
        transaction = transaction.id,
        "recorded jobs for {}",
        new_jobs.customer_name
    );

    Ok(transaction.id)
}

#[cfg(test)]
mod create_jobs_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        client::get_client_by_name,
        database_id::TenantId,
        db::initialize,
        job::{Payer, PaymentStatus, jobs_for_transaction, update_job_row},
        reconcile::{Delivery, NewDayJobs, create_jobs_for_day},
        tenant::create_tenant,
        transaction::{PaymentState, get_transaction, recompute_aggregates},
    };

    fn get_test_connection() -> (Connection, TenantId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let tenant = create_tenant("Test Tenant", &conn).unwrap();

        (conn, tenant.id)
    }

    fn kim_entry(tenant: TenantId, deliveries: Vec<Delivery>) -> NewDayJobs {
        NewDayJobs {
            tenant,
            date: date!(2024 - 01 - 05),
            customer_name: "Kim".to_owned(),
            pick_up: "Lekki".to_owned(),
            deliveries,
        }
    }

    #[test]
    fn single_delivery_builds_both_aggregates() {
        let (conn, tenant) = get_test_connection();

        let transaction_id = create_jobs_for_day(
            kim_entry(
                tenant,
                vec![Delivery {
                    location: "Ipaja".to_owned(),
                    amount: 4000.0,
                    payer: Payer::Vendor,
                }],
            ),
            &conn,
        )
        .unwrap();

        let transaction = get_transaction(transaction_id, &conn).unwrap();
        assert_eq!(transaction.number_of_jobs, 1);
        assert_eq!(transaction.total_job_amount, 4000.0);
        assert_eq!(transaction.payment_status, PaymentState::NotPaid);

        let client = get_client_by_name(tenant, "Kim", &conn).unwrap();
        assert_eq!(client.total_jobs, 1);
        assert_eq!(client.total_job_amount, 4000.0);
        assert_eq!(client.last_job_date, Some(date!(2024 - 01 - 05)));
    }

    #[test]
    fn deliveries_share_one_daily_transaction() {
        let (conn, tenant) = get_test_connection();

        let first = create_jobs_for_day(
            kim_entry(
                tenant,
                vec![
                    Delivery {
                        location: "Ipaja".to_owned(),
                        amount: 4000.0,
                        payer: Payer::Vendor,
                    },
                    Delivery {
                        location: "Yaba".to_owned(),
                        amount: 1500.0,
                        payer: Payer::Delivery,
                    },
                ],
            ),
            &conn,
        )
        .unwrap();

        // A second entry on the same day lands on the same aggregate.
        let second = create_jobs_for_day(
            NewDayJobs {
                customer_name: "Zara Stores".to_owned(),
                ..kim_entry(
                    tenant,
                    vec![Delivery {
                        location: "Ikeja".to_owned(),
                        amount: 2000.0,
                        payer: Payer::PickUp,
                    }],
                )
            },
            &conn,
        )
        .unwrap();

        assert_eq!(first, second);

        let transaction = get_transaction(first, &conn).unwrap();
        assert_eq!(transaction.number_of_jobs, 3);
        assert_eq!(transaction.total_job_amount, 7500.0);

        let jobs = jobs_for_transaction(first, &conn).unwrap();
        assert_eq!(jobs.len(), 3);
        assert!(
            jobs.iter()
                .all(|job| job.payment_status == PaymentStatus::NotPaid)
        );
    }

    #[test]
    fn new_job_demotes_a_paid_day() {
        let (conn, tenant) = get_test_connection();
        let transaction_id = create_jobs_for_day(
            kim_entry(
                tenant,
                vec![Delivery {
                    location: "Ipaja".to_owned(),
                    amount: 4000.0,
                    payer: Payer::Vendor,
                }],
            ),
            &conn,
        )
        .unwrap();

        // Settle the day.
        let mut job = jobs_for_transaction(transaction_id, &conn)
            .unwrap()
            .remove(0);
        job.payment_status = PaymentStatus::Paid;
        update_job_row(&job, &conn).unwrap();
        let settled = recompute_aggregates(transaction_id, &conn).unwrap();
        assert_eq!(settled.payment_status, PaymentState::Paid);

        create_jobs_for_day(
            kim_entry(
                tenant,
                vec![Delivery {
                    location: "Yaba".to_owned(),
                    amount: 1000.0,
                    payer: Payer::Delivery,
                }],
            ),
            &conn,
        )
        .unwrap();

        let demoted = get_transaction(transaction_id, &conn).unwrap();
        assert_eq!(demoted.payment_status, PaymentState::NotPaid);
        assert_eq!(demoted.total_amount_paid, 4000.0);
        assert_eq!(demoted.number_of_paid_jobs, 1);
    }

    #[test]
    fn client_last_job_date_never_moves_backwards() {
        let (conn, tenant) = get_test_connection();
        let delivery = |amount| {
            vec![Delivery {
                location: "Ipaja".to_owned(),
                amount,
                payer: Payer::Vendor,
            }]
        };

        create_jobs_for_day(
            NewDayJobs {
                date: date!(2024 - 01 - 10),
                ..kim_entry(tenant, delivery(100.0))
            },
            &conn,
        )
        .unwrap();
        create_jobs_for_day(
            NewDayJobs {
                date: date!(2024 - 01 - 05),
                ..kim_entry(tenant, delivery(200.0))
            },
            &conn,
        )
        .unwrap();

        let client = get_client_by_name(tenant, "Kim", &conn).unwrap();
        assert_eq!(client.last_job_date, Some(date!(2024 - 01 - 10)));
        assert_eq!(client.total_jobs, 2);
        assert_eq!(client.total_job_amount, 300.0);
    }

    #[test]
    fn empty_delivery_list_is_rejected() {
        let (conn, tenant) = get_test_connection();

        let result = create_jobs_for_day(kim_entry(tenant, vec![]), &conn);

        assert_eq!(result, Err(Error::EmptyDeliveryList));
    }

    #[test]
    fn invalid_amount_rejects_the_whole_entry() {
        let (conn, tenant) = get_test_connection();

        let result = create_jobs_for_day(
            kim_entry(
                tenant,
                vec![
                    Delivery {
                        location: "Ipaja".to_owned(),
                        amount: 4000.0,
                        payer: Payer::Vendor,
                    },
                    Delivery {
                        location: "Yaba".to_owned(),
                        amount: f64::NAN,
                        payer: Payer::Delivery,
                    },
                ],
            ),
            &conn,
        );

        assert!(matches!(result, Err(Error::InvalidAmount(_))));
        // Validation failures never touch the store.
        assert_eq!(get_client_by_name(tenant, "Kim", &conn), Err(Error::NotFound));
        let job_count: u32 = conn
            .query_row("SELECT COUNT(*) FROM job", [], |row| row.get(0))
            .unwrap();
        assert_eq!(job_count, 0);
    }
}
