//! Calendar-month totals with best/worst day figures.

use rusqlite::Connection;
use serde::Serialize;
use time::{Date, Month};

use crate::{
    Error, database_id::TenantId, expense::expenses_total_in_range,
    transaction::transactions_in_range,
};

/// The folded numbers for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    /// The month number (1-12).
    pub month: u8,
    /// The calendar year.
    pub year: i32,
    /// The number of jobs handled in the month.
    pub total_jobs: u32,
    /// The amount billed across the month.
    pub total_job_amount: f64,
    /// The amount spent across the month.
    pub total_expenses: f64,
    /// How many days of the month saw no job activity.
    pub days_without_job: u8,
    /// The largest single-day billed amount, zero when the month is empty.
    pub highest_amount: f64,
    /// The smallest single-day billed amount, absent when the month is
    /// empty.
    pub lowest_amount: Option<f64>,
}

/// Fold a tenant's activity over one calendar month.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn monthly_report(
    tenant: TenantId,
    month: Month,
    year: i32,
    connection: &Connection,
) -> Result<MonthlyReport, Error> {
    let (start, end) = month_bounds(year, month);
    let transactions = transactions_in_range(tenant, start, end, connection)?;

    let mut total_jobs = 0u32;
    let mut total_job_amount = 0.0;
    let mut highest_amount = 0.0f64;
    let mut lowest_amount: Option<f64> = None;
    let mut active_days = 0u8;

    for transaction in &transactions {
        total_jobs += transaction.number_of_jobs;
        total_job_amount += transaction.total_job_amount;
        highest_amount = highest_amount.max(transaction.total_job_amount);
        lowest_amount = Some(match lowest_amount {
            Some(lowest) => lowest.min(transaction.total_job_amount),
            None => transaction.total_job_amount,
        });

        if transaction.number_of_jobs > 0 {
            active_days += 1;
        }
    }

    let total_expenses = expenses_total_in_range(tenant, start, end, connection)?;
    let days_in_month = time::util::days_in_year_month(year, month);

    Ok(MonthlyReport {
        month: month as u8,
        year,
        total_jobs,
        total_job_amount,
        total_expenses,
        days_without_job: days_in_month - active_days,
        highest_amount,
        lowest_amount,
    })
}

/// The first and last day of a calendar month.
pub(super) fn month_bounds(year: i32, month: Month) -> (Date, Date) {
    let start = Date::from_calendar_date(year, month, 1).expect("invalid month start date");
    let end = Date::from_calendar_date(year, month, time::util::days_in_year_month(year, month))
        .expect("invalid month end date");

    (start, end)
}
