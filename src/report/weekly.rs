//! Trailing-week summaries anchored to Mondays.

use rusqlite::Connection;
use serde::Serialize;
use time::{Date, Duration};

use crate::{
    Error, database_id::TenantId, expense::expenses_total_in_range,
    transaction::transactions_in_range,
};

/// How many trailing weeks the weekly report covers.
pub const TRAILING_WEEKS: u8 = 5;

/// One Monday-anchored report window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekWindow {
    /// 1 is the week containing the anchor date, 2 the week before, and so
    /// on.
    pub week: u8,
    /// The Monday the window starts on.
    pub start: Date,
    /// The last day of the window.
    pub end: Date,
}

/// The folded numbers for one week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekSummary {
    /// Which trailing week this is (1 = the current week).
    pub week: u8,
    /// The Monday the window starts on.
    pub start: Date,
    /// The last day of the window.
    pub end: Date,
    /// The money received inside the window.
    pub returns: f64,
    /// The number of jobs handled inside the window.
    pub number_of_jobs: u32,
    /// The money spent inside the window.
    pub expenses: f64,
}

/// Compute the trailing report windows ending at `today`.
///
/// Each window starts on the Monday of its week. A six-day work week closes
/// on Saturday; a five-day week keeps the full Monday-to-Sunday span so
/// weekend catch-up jobs still land somewhere.
pub fn week_windows(today: Date, working_days_per_week: u8, weeks: u8) -> Vec<WeekWindow> {
    let span_days = if working_days_per_week == 6 { 5 } else { 6 };

    let mut windows = Vec::with_capacity(weeks as usize);
    let mut cursor = today;

    for week in 1..=weeks {
        let start = cursor - Duration::days(cursor.weekday().number_days_from_monday() as i64);
        let end = start + Duration::days(span_days);

        windows.push(WeekWindow { week, start, end });

        cursor = end - Duration::days(7);
    }

    windows
}

/// Fold the trailing [TRAILING_WEEKS] weeks of activity, dropping weeks with
/// no jobs.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn weekly_report(
    tenant: TenantId,
    today: Date,
    working_days_per_week: u8,
    connection: &Connection,
) -> Result<Vec<WeekSummary>, Error> {
    let mut summaries = Vec::new();

    for window in week_windows(today, working_days_per_week, TRAILING_WEEKS) {
        let transactions = transactions_in_range(tenant, window.start, window.end, connection)?;

        let number_of_jobs: u32 = transactions
            .iter()
            .map(|transaction| transaction.number_of_jobs)
            .sum();

        if number_of_jobs == 0 {
            continue;
        }

        let returns: f64 = transactions
            .iter()
            .map(|transaction| transaction.total_amount_paid)
            .sum();
        let expenses = expenses_total_in_range(tenant, window.start, window.end, connection)?;

        summaries.push(WeekSummary {
            week: window.week,
            start: window.start,
            end: window.end,
            returns,
            number_of_jobs,
            expenses,
        });
    }

    Ok(summaries)
}

#[cfg(test)]
mod week_window_tests {
    use time::macros::date;

    use super::week_windows;

    #[test]
    fn windows_are_monday_anchored() {
        // 2024-01-10 is a Wednesday.
        let windows = week_windows(date!(2024 - 01 - 10), 6, 2);

        assert_eq!(windows[0].start, date!(2024 - 01 - 08));
        assert_eq!(windows[0].end, date!(2024 - 01 - 13));
        assert_eq!(windows[1].start, date!(2024 - 01 - 01));
        assert_eq!(windows[1].end, date!(2024 - 01 - 06));
    }

    #[test]
    fn five_day_week_spans_to_sunday() {
        let windows = week_windows(date!(2024 - 01 - 10), 5, 1);

        assert_eq!(windows[0].start, date!(2024 - 01 - 08));
        assert_eq!(windows[0].end, date!(2024 - 01 - 14));
    }

    #[test]
    fn a_monday_is_its_own_window_start() {
        let windows = week_windows(date!(2024 - 01 - 08), 6, 1);

        assert_eq!(windows[0].start, date!(2024 - 01 - 08));
    }
}

#[cfg(test)]
mod weekly_report_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        database_id::TenantId,
        db::initialize,
        expense::{ExpenseItem, record_expenses},
        job::Payer,
        reconcile::{
            BulkStatusUpdate, Delivery, NewDayJobs, bulk_update_transaction_jobs,
            create_jobs_for_day,
        },
        report::weekly::weekly_report,
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
    fn folds_activity_into_its_week() {
        let (conn, tenant) = get_test_connection();
        // Current week (anchor Wednesday 2024-01-10): two days of work.
        record_paid_day(&conn, tenant, date!(2024 - 01 - 08), 3000.0);
        record_paid_day(&conn, tenant, date!(2024 - 01 - 10), 2000.0);
        // Two weeks back.
        record_paid_day(&conn, tenant, date!(2023 - 12 - 27), 1000.0);
        record_expenses(
            tenant,
            date!(2024 - 01 - 09),
            &[ExpenseItem {
                label: "Fuel".to_owned(),
                amount: 450.0,
            }],
            &conn,
        )
        .unwrap();

        let report = weekly_report(tenant, date!(2024 - 01 - 10), 6, &conn).unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].week, 1);
        assert_eq!(report[0].returns, 5000.0);
        assert_eq!(report[0].number_of_jobs, 2);
        assert_eq!(report[0].expenses, 450.0);
        assert_eq!(report[1].week, 3);
        assert_eq!(report[1].returns, 1000.0);
    }

    #[test]
    fn weeks_without_jobs_are_dropped() {
        let (conn, tenant) = get_test_connection();

        let report = weekly_report(tenant, date!(2024 - 01 - 10), 6, &conn).unwrap();

        assert!(report.is_empty());
    }
}
