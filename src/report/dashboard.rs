//! All-time totals for the dashboard.

use rusqlite::Connection;
use serde::Serialize;

use crate::{Error, database_id::TenantId, tenant::get_tenant};

/// A tenant's lifetime cash position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// All money ever received.
    pub total_returns: f64,
    /// All money ever spent.
    pub total_expenses: f64,
    /// `total_returns + opening balance - total_expenses`.
    pub net_amount: f64,
}

/// Fold a tenant's whole history into the dashboard numbers.
///
/// # Errors
/// This function will return a:
/// - [Error::UnknownTenant] if `tenant` does not refer to a tenant,
/// - or [Error::SqlError] there is some other SQL error.
pub fn dashboard(tenant: TenantId, connection: &Connection) -> Result<DashboardSummary, Error> {
    let tenant_record = get_tenant(tenant, connection)?;

    let total_returns: f64 = connection.query_row(
        "SELECT COALESCE(SUM(total_amount_paid), 0) FROM day_transaction
         WHERE tenant_id = :tenant_id",
        &[(":tenant_id", &tenant)],
        |row| row.get(0),
    )?;

    let total_expenses: f64 = connection.query_row(
        "SELECT COALESCE(SUM(total_amount), 0) FROM daily_expense WHERE tenant_id = :tenant_id",
        &[(":tenant_id", &tenant)],
        |row| row.get(0),
    )?;

    Ok(DashboardSummary {
        total_returns,
        total_expenses,
        net_amount: total_returns + tenant_record.opening_balance - total_expenses,
    })
}

#[cfg(test)]
mod dashboard_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        database_id::TenantId,
        db::initialize,
        expense::{ExpenseItem, record_expenses},
        job::Payer,
        reconcile::{
            BulkStatusUpdate, Delivery, NewDayJobs, bulk_update_transaction_jobs,
            create_jobs_for_day,
        },
        report::dashboard::dashboard,
        tenant::{create_tenant, update_tenant_settings},
    };

    fn get_test_connection() -> (Connection, TenantId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let tenant = create_tenant("Test Tenant", &conn).unwrap();

        (conn, tenant.id)
    }

    #[test]
    fn nets_returns_opening_balance_and_expenses() {
        let (conn, tenant) = get_test_connection();
        update_tenant_settings(tenant, 1000.0, 6, &conn).unwrap();

        let transaction_id = create_jobs_for_day(
            NewDayJobs {
                tenant,
                date: date!(2024 - 01 - 05),
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
        bulk_update_transaction_jobs(
            transaction_id,
            BulkStatusUpdate {
                mark_done: true,
                mark_paid: true,
            },
            &conn,
        )
        .unwrap();
        record_expenses(
            tenant,
            date!(2024 - 01 - 05),
            &[ExpenseItem {
                label: "Fuel".to_owned(),
                amount: 500.0,
            }],
            &conn,
        )
        .unwrap();

        let summary = dashboard(tenant, &conn).unwrap();

        assert_eq!(summary.total_returns, 4000.0);
        assert_eq!(summary.total_expenses, 500.0);
        assert_eq!(summary.net_amount, 4500.0);
    }

    #[test]
    fn unpaid_jobs_do_not_count_as_returns() {
        let (conn, tenant) = get_test_connection();
        create_jobs_for_day(
            NewDayJobs {
                tenant,
                date: date!(2024 - 01 - 05),
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

        let summary = dashboard(tenant, &conn).unwrap();

        assert_eq!(summary.total_returns, 0.0);
        assert_eq!(summary.net_amount, 0.0);
    }

    #[test]
    fn fails_on_unknown_tenant() {
        let (conn, tenant) = get_test_connection();

        let result = dashboard(tenant + 99, &conn);

        assert_eq!(result, Err(Error::UnknownTenant(tenant + 99)));
    }
}
