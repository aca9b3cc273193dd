//! Recurring pick-up detection over a trailing window.

use rusqlite::{Connection, types::ToSql};
use serde::Serialize;
use time::{Date, Duration};

use crate::{Error, database_id::TenantId};

/// The default trailing window, in days.
pub const DEFAULT_PICKUP_WINDOW_DAYS: u16 = 17;

/// The default number of jobs a route needs to count as frequent.
pub const DEFAULT_PICKUP_THRESHOLD: u32 = 10;

/// A customer/pick-up pair that keeps coming back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequentPickup {
    /// The customer the jobs were for.
    pub customer_name: String,
    /// The pick-up location they keep using.
    pub pick_up: String,
    /// How many jobs the pair produced inside the window.
    pub count: u32,
}

/// Group the trailing window's jobs by customer and pick-up location and
/// keep the groups with at least `threshold` jobs, busiest first.
///
/// The window covers `window_days` days ending at `today`, inclusive.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn frequent_pickups(
    tenant: TenantId,
    today: Date,
    window_days: u16,
    threshold: u32,
    connection: &Connection,
) -> Result<Vec<FrequentPickup>, Error> {
    let start = today - Duration::days(window_days as i64 - 1);

    connection
        .prepare(
            "SELECT customer_name, pick_up, COUNT(*) AS job_count
             FROM job
             WHERE tenant_id = :tenant_id AND created_at BETWEEN :start AND :end
             GROUP BY customer_name, pick_up
             HAVING job_count >= :threshold
             ORDER BY job_count DESC, customer_name",
        )?
        .query_map(
            &[
                (":tenant_id", &tenant as &dyn ToSql),
                (":start", &start),
                (":end", &today),
                (":threshold", &threshold),
            ],
            |row| {
                Ok(FrequentPickup {
                    customer_name: row.get(0)?,
                    pick_up: row.get(1)?,
                    count: row.get(2)?,
                })
            },
        )?
        .map(|maybe_pickup| maybe_pickup.map_err(Error::SqlError))
        .collect()
}
