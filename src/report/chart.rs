//! Per-month returns and expenses for a year's bar chart.

use rusqlite::Connection;
use serde::Serialize;
use time::Month;

use crate::{
    Error, database_id::TenantId, expense::expenses_total_in_range,
    report::monthly::month_bounds,
};

/// Twelve month buckets of returns and expenses, January first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChartData {
    /// The money received per month.
    pub returns: [f64; 12],
    /// The money spent per month.
    pub expenses: [f64; 12],
}

/// Fold a year of activity into month buckets.
///
/// Each month is an independent pair of range queries, so the buckets can
/// be filled in any order without affecting the result.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn bar_chart(
    tenant: TenantId,
    year: i32,
    connection: &Connection,
) -> Result<BarChartData, Error> {
    let mut chart = BarChartData {
        returns: [0.0; 12],
        expenses: [0.0; 12],
    };

    for month_index in 0..12u8 {
        let month = Month::try_from(month_index + 1).expect("invalid month number");
        let (start, end) = month_bounds(year, month);

        let returns: f64 = connection.query_row(
            "SELECT COALESCE(SUM(total_amount_paid), 0) FROM day_transaction
             WHERE tenant_id = :tenant_id AND created_at BETWEEN :start AND :end",
            &[
                (":tenant_id", &tenant as &dyn rusqlite::types::ToSql),
                (":start", &start),
                (":end", &end),
            ],
            |row| row.get(0),
        )?;

        chart.returns[month_index as usize] = returns;
        chart.expenses[month_index as usize] =
            expenses_total_in_range(tenant, start, end, connection)?;
    }

    Ok(chart)
}
