//! Per-day activity for a month's calendar view.

use rusqlite::Connection;
use serde::Serialize;
use time::{Date, Month};

use crate::{
    Error, database_id::TenantId, report::monthly::month_bounds,
    transaction::transactions_in_range,
};

/// One calendar cell: the activity of a single day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    /// The day of the month this cell describes.
    pub date: Date,
    /// The number of jobs handled that day.
    pub number_of_jobs: u32,
    /// The money received that day.
    pub returns: f64,
}

/// Build one entry per day of the month, zero-filled for days without a
/// transaction.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn calendar_data(
    tenant: TenantId,
    month: Month,
    year: i32,
    connection: &Connection,
) -> Result<Vec<CalendarDay>, Error> {
    let (start, end) = month_bounds(year, month);
    let transactions = transactions_in_range(tenant, start, end, connection)?;

    let mut days: Vec<CalendarDay> = (1..=end.day())
        .map(|day| CalendarDay {
            date: Date::from_calendar_date(year, month, day).expect("invalid calendar date"),
            number_of_jobs: 0,
            returns: 0.0,
        })
        .collect();

    for transaction in transactions {
        let cell = &mut days[transaction.created_at.day() as usize - 1];
        cell.number_of_jobs = transaction.number_of_jobs;
        cell.returns = transaction.total_amount_paid;
    }

    Ok(days)
}
