//! The daily report: today against the most recent working day before it.

use rand::Rng;
use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    database_id::TenantId,
    expense::expenses_total_for_date,
    report::phrases::{PhraseCategory, Sentiment, pick_phrase},
    transaction::{Transaction, get_for_day, latest_before},
};

/// One day's headline numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySnapshot {
    /// The day the numbers belong to.
    pub date: Date,
    /// The money received that day.
    pub returns: f64,
    /// The money spent that day.
    pub expenses: f64,
    /// The number of jobs handled that day.
    pub number_of_jobs: u32,
}

/// One narrative sentence per report axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonNote {
    /// The sentence about returns.
    pub returns: &'static str,
    /// The sentence about expenses.
    pub expenses: &'static str,
    /// The sentence about the number of jobs.
    pub number_of_jobs: &'static str,
}

/// The outcome of a daily report request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum DailyReport {
    /// Nothing was recorded for the day, so there is nothing to report.
    NoActivity,
    /// Jobs were recorded but nothing has been paid yet; the comparison
    /// would be meaningless.
    AwaitingPayment,
    /// The day has reportable numbers.
    Ready {
        /// Today's numbers.
        today: DaySnapshot,
        /// The most recent prior day's numbers, if the tenant has history.
        previous: Option<DaySnapshot>,
        /// The narrative comparison.
        note: ComparisonNote,
    },
}

impl DailyReport {
    /// The sentinel message for the non-reportable outcomes.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            DailyReport::NoActivity => Some("No report for the day"),
            DailyReport::AwaitingPayment => Some("Get paid before generating a report"),
            DailyReport::Ready { .. } => None,
        }
    }
}

/// Build the daily report for `today`.
///
/// Pairs today's transaction and expense record with the most recent
/// transaction before today (each tuple's expense total is the one logged
/// for that tuple's date), then phrases the three-axis comparison using the
/// caller's random source.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn daily_report(
    tenant: TenantId,
    today: Date,
    rng: &mut impl Rng,
    connection: &Connection,
) -> Result<DailyReport, Error> {
    let transaction = match get_for_day(tenant, today, connection) {
        Ok(transaction) => transaction,
        Err(Error::NotFound) => return Ok(DailyReport::NoActivity),
        Err(error) => return Err(error),
    };

    if transaction.number_of_jobs == 0 {
        return Ok(DailyReport::NoActivity);
    }

    if transaction.total_amount_paid == 0.0 {
        return Ok(DailyReport::AwaitingPayment);
    }

    let today_snapshot = snapshot(&transaction, connection)?;
    let previous = match latest_before(tenant, today, connection)? {
        Some(previous_transaction) => Some(snapshot(&previous_transaction, connection)?),
        None => None,
    };

    let note = comparison_note(&today_snapshot, previous.as_ref(), rng);

    Ok(DailyReport::Ready {
        today: today_snapshot,
        previous,
        note,
    })
}

/// Phrase the three-axis comparison between today and the prior day.
///
/// Higher returns and more jobs read as positive, higher expenses as
/// negative, equal values as neutral. Without a prior day every axis gets a
/// positive phrase.
pub fn comparison_note(
    today: &DaySnapshot,
    previous: Option<&DaySnapshot>,
    rng: &mut impl Rng,
) -> ComparisonNote {
    let Some(previous) = previous else {
        return ComparisonNote {
            returns: pick_phrase(PhraseCategory::Returns, Sentiment::Positive, rng),
            expenses: pick_phrase(PhraseCategory::Expenses, Sentiment::Positive, rng),
            number_of_jobs: pick_phrase(PhraseCategory::Jobs, Sentiment::Positive, rng),
        };
    };

    let returns_sentiment = if today.returns > previous.returns {
        Sentiment::Positive
    } else if today.returns == previous.returns {
        Sentiment::Neutral
    } else {
        Sentiment::Negative
    };

    let expenses_sentiment = if today.expenses > previous.expenses {
        Sentiment::Negative
    } else if today.expenses == previous.expenses {
        Sentiment::Neutral
    } else {
        Sentiment::Positive
    };

    let jobs_sentiment = if today.number_of_jobs > previous.number_of_jobs {
        Sentiment::Positive
    } else if today.number_of_jobs == previous.number_of_jobs {
        Sentiment::Neutral
    } else {
        Sentiment::Negative
    };

    ComparisonNote {
        returns: pick_phrase(PhraseCategory::Returns, returns_sentiment, rng),
        expenses: pick_phrase(PhraseCategory::Expenses, expenses_sentiment, rng),
        number_of_jobs: pick_phrase(PhraseCategory::Jobs, jobs_sentiment, rng),
    }
}

fn snapshot(transaction: &Transaction, connection: &Connection) -> Result<DaySnapshot, Error> {
    let expenses =
        expenses_total_for_date(transaction.tenant, transaction.created_at, connection)?;

    Ok(DaySnapshot {
        date: transaction.created_at,
        returns: transaction.total_amount_paid,
        expenses,
        number_of_jobs: transaction.number_of_jobs,
    })
}


#[cfg(test)]
mod daily_report_tests {
    use rand::{SeedableRng, rngs::SmallRng};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        database_id::TenantId,
        db::initialize,
        expense::{ExpenseItem, record_expenses},
        job::{Payer, jobs_for_transaction},
        reconcile::{
            BulkStatusUpdate, Delivery, NewDayJobs, bulk_update_transaction_jobs,
            create_jobs_for_day,
        },
        report::daily::{DailyReport, daily_report},
        tenant::create_tenant,
    };

    fn get_test_connection() -> (Connection, TenantId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let tenant = create_tenant("Test Tenant", &conn).unwrap();

        (conn, tenant.id)
    }

    fn record_paid_day(conn: &Connection, tenant: TenantId, date: time::Date, amount: f64) {
        let transaction_id = create_jobs_for_day(
            NewDayJobs {
                tenant,
                date,
                customer_name: "Kim".to_owned(),
                pick_up: "Lekki".to_owned(),
                deliveries: vec![Delivery {
                    location: "Ipaja".to_owned(),
                    amount,
                    payer: Payer::Vendor,
                }],
            },
            conn,
        )
        .unwrap();
        bulk_update_transaction_jobs(
            transaction_id,
            BulkStatusUpdate {
                mark_done: true,
                mark_paid: true,
            },
            conn,
        )
        .unwrap();
    }

    #[test]
    fn no_transaction_means_no_report() {
        let (conn, tenant) = get_test_connection();
        let mut rng = SmallRng::seed_from_u64(1);

        let report = daily_report(tenant, date!(2024 - 01 - 05), &mut rng, &conn).unwrap();

        assert_eq!(report, DailyReport::NoActivity);
        assert_eq!(report.message(), Some("No report for the day"));
    }

    #[test]
    fn unpaid_day_asks_for_payment_first() {
        let (conn, tenant) = get_test_connection();
        let today = date!(2024 - 01 - 05);
        create_jobs_for_day(
            NewDayJobs {
                tenant,
                date: today,
                customer_name: "Kim".to_owned(),
                pick_up: "Lekki".to_owned(),
                deliveries: vec![Delivery {
                    location: "Ipaja".to_owned(),
                    amount: 4000.0,
                    payer: Payer::Vendor,
                }],
            },
            &conn,
        )
        .unwrap();
        let mut rng = SmallRng::seed_from_u64(1);

        let report = daily_report(tenant, today, &mut rng, &conn).unwrap();

        assert_eq!(report, DailyReport::AwaitingPayment);
    }

    #[test]
    fn voided_day_means_no_report() {
        let (conn, tenant) = get_test_connection();
        let today = date!(2024 - 01 - 05);
        let transaction_id = create_jobs_for_day(
            NewDayJobs {
                tenant,
                date: today,
                customer_name: "Kim".to_owned(),
                pick_up: "Lekki".to_owned(),
                deliveries: vec![Delivery {
                    location: "Ipaja".to_owned(),
                    amount: 4000.0,
                    payer: Payer::Vendor,
                }],
            },
            &conn,
        )
        .unwrap();
        let job = jobs_for_transaction(transaction_id, &conn).unwrap().remove(0);
        crate::reconcile::delete_job(job.id, &conn).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);

        let report = daily_report(tenant, today, &mut rng, &conn).unwrap();

        assert_eq!(report, DailyReport::NoActivity);
    }

    #[test]
    fn paid_day_with_history_compares_both_days() {
        let (conn, tenant) = get_test_connection();
        let yesterday = date!(2024 - 01 - 04);
        let today = date!(2024 - 01 - 05);
        record_paid_day(&conn, tenant, yesterday, 3000.0);
        record_paid_day(&conn, tenant, today, 5000.0);
        record_expenses(
            tenant,
            today,
            &[ExpenseItem {
                label: "Fuel".to_owned(),
                amount: 700.0,
            }],
            &conn,
        )
        .unwrap();
        let mut rng = SmallRng::seed_from_u64(1);

        let report = daily_report(tenant, today, &mut rng, &conn).unwrap();

        let DailyReport::Ready {
            today: today_snapshot,
            previous,
            note: _,
        } = report
        else {
            panic!("expected a ready report");
        };
        assert_eq!(today_snapshot.returns, 5000.0);
        assert_eq!(today_snapshot.expenses, 700.0);
        assert_eq!(today_snapshot.number_of_jobs, 1);

        let previous = previous.expect("expected a prior day");
        assert_eq!(previous.date, yesterday);
        assert_eq!(previous.returns, 3000.0);
        assert_eq!(previous.expenses, 0.0);
    }

    #[test]
    fn first_paid_day_reports_without_history() {
        let (conn, tenant) = get_test_connection();
        let today = date!(2024 - 01 - 05);
        record_paid_day(&conn, tenant, today, 5000.0);
        let mut rng = SmallRng::seed_from_u64(1);

        let report = daily_report(tenant, today, &mut rng, &conn).unwrap();

        assert!(matches!(
            report,
            DailyReport::Ready { previous: None, .. }
        ));
    }
}
