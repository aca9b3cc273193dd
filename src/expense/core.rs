//! Defines the daily expense record and its database queries.

use rusqlite::{Connection, Row, types::ToSql};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{ExpenseId, TenantId},
    pagination::{Page, PageRequest},
};

// ============================================================================
// MODELS
// ============================================================================

/// One logged expense line, e.g. fuel or a vehicle repair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseItem {
    /// What the money was spent on.
    pub label: String,
    /// The amount spent.
    pub amount: f64,
}

/// All expenses a tenant logged for one calendar day.
///
/// Logging more expenses on the same day appends to the existing record
/// rather than replacing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyExpense {
    /// The ID of the expense record.
    pub id: ExpenseId,
    /// The tenant the expenses belong to.
    pub tenant: TenantId,
    /// The day the expenses were incurred.
    pub date: Date,
    /// The sum of all line amounts.
    pub total_amount: f64,
    /// The number of logged lines.
    pub number_of_expenses: u32,
    /// The individual expense lines, in the order they were logged.
    pub items: Vec<ExpenseItem>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the daily expense tables.
pub fn create_expense_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS daily_expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tenant_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                total_amount REAL NOT NULL,
                number_of_expenses INTEGER NOT NULL,
                FOREIGN KEY(tenant_id) REFERENCES tenant(id) ON DELETE CASCADE,
                UNIQUE(tenant_id, date)
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense_item (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                expense_id INTEGER NOT NULL,
                label TEXT NOT NULL,
                amount REAL NOT NULL,
                FOREIGN KEY(expense_id) REFERENCES daily_expense(id) ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_item_expense ON expense_item(expense_id)",
        (),
    )?;

    Ok(())
}

/// Log expenses for a day, appending to the day's record if one exists.
///
/// The whole append runs in one SQL transaction: either all lines land and
/// the denormalized totals move with them, or nothing changes.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if any line amount is negative or not finite
///   (checked before anything is written),
/// - or [Error::SqlError] there is some other SQL error.
pub fn record_expenses(
    tenant: TenantId,
    date: Date,
    items: &[ExpenseItem],
    connection: &Connection,
) -> Result<DailyExpense, Error> {
    for item in items {
        if !item.amount.is_finite() || item.amount < 0.0 {
            return Err(Error::InvalidAmount(item.amount));
        }
    }

    let tx = connection.unchecked_transaction()?;

    let expense_id: ExpenseId = match tx.query_row(
        "SELECT id FROM daily_expense WHERE tenant_id = :tenant_id AND date = :date",
        &[(":tenant_id", &tenant as &dyn ToSql), (":date", &date)],
        |row| row.get(0),
    ) {
        Ok(id) => id,
        Err(rusqlite::Error::QueryReturnedNoRows) => tx.query_row(
            "INSERT INTO daily_expense (tenant_id, date, total_amount, number_of_expenses)
             VALUES (?1, ?2, 0, 0) RETURNING id",
            (tenant, date),
            |row| row.get(0),
        )?,
        Err(error) => return Err(error.into()),
    };

    let added_amount: f64 = items.iter().map(|item| item.amount).sum();

    let mut insert_item =
        tx.prepare("INSERT INTO expense_item (expense_id, label, amount) VALUES (?1, ?2, ?3)")?;
    for item in items {
        insert_item.execute((expense_id, &item.label, item.amount))?;
    }
    drop(insert_item);

    tx.execute(
        "UPDATE daily_expense
         SET total_amount = total_amount + ?1, number_of_expenses = number_of_expenses + ?2
         WHERE id = ?3",
        (added_amount, items.len() as u32, expense_id),
    )?;

    tx.commit()?;

    get_expense(expense_id, connection)
}

/// Retrieve a daily expense record with its lines.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense record,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_expense(id: ExpenseId, connection: &Connection) -> Result<DailyExpense, Error> {
    let mut expense = connection
        .prepare(
            "SELECT id, tenant_id, date, total_amount, number_of_expenses
             FROM daily_expense WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_expense_row)?;

    expense.items = items_for_expense(id, connection)?;

    Ok(expense)
}

/// Remove a day's expense record and all of its lines.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingExpense] if `id` does not refer to an expense
///   record,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_expense(id: ExpenseId, connection: &Connection) -> Result<(), Error> {
    let tx = connection.unchecked_transaction()?;

    tx.execute("DELETE FROM expense_item WHERE expense_id = ?1", (id,))?;
    let rows_affected = tx.execute("DELETE FROM daily_expense WHERE id = ?1", (id,))?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingExpense(id));
    }

    tx.commit()?;

    Ok(())
}

/// The total amount a tenant spent on `date`, zero when nothing was logged.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn expenses_total_for_date(
    tenant: TenantId,
    date: Date,
    connection: &Connection,
) -> Result<f64, Error> {
    let total = connection.query_row(
        "SELECT COALESCE(SUM(total_amount), 0) FROM daily_expense
         WHERE tenant_id = :tenant_id AND date = :date",
        &[(":tenant_id", &tenant as &dyn ToSql), (":date", &date)],
        |row| row.get(0),
    )?;

    Ok(total)
}

/// The total amount a tenant spent across `[start, end]`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn expenses_total_in_range(
    tenant: TenantId,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<f64, Error> {
    let total = connection.query_row(
        "SELECT COALESCE(SUM(total_amount), 0) FROM daily_expense
         WHERE tenant_id = :tenant_id AND date BETWEEN :start AND :end",
        &[
            (":tenant_id", &tenant as &dyn ToSql),
            (":start", &start),
            (":end", &end),
        ],
        |row| row.get(0),
    )?;

    Ok(total)
}

/// Retrieve one page of a tenant's expense records, newest day first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn list_expenses(
    tenant: TenantId,
    request: PageRequest,
    connection: &Connection,
) -> Result<Page<DailyExpense>, Error> {
    let total_items = connection.query_row(
        "SELECT COUNT(id) FROM daily_expense WHERE tenant_id = :tenant_id",
        &[(":tenant_id", &tenant)],
        |row| row.get::<_, i64>(0),
    )? as u64;

    let mut items = connection
        .prepare(
            "SELECT id, tenant_id, date, total_amount, number_of_expenses
             FROM daily_expense
             WHERE tenant_id = :tenant_id
             ORDER BY date DESC LIMIT :limit OFFSET :offset",
        )?
        .query_map(
            &[
                (":tenant_id", &tenant as &dyn ToSql),
                (":limit", &(request.per_page as i64)),
                (":offset", &(request.offset() as i64)),
            ],
            map_expense_row,
        )?
        .map(|maybe_expense| maybe_expense.map_err(Error::SqlError))
        .collect::<Result<Vec<_>, _>>()?;

    for expense in &mut items {
        expense.items = items_for_expense(expense.id, connection)?;
    }

    Ok(Page::new(total_items, request, items))
}

fn items_for_expense(
    id: ExpenseId,
    connection: &Connection,
) -> Result<Vec<ExpenseItem>, Error> {
    connection
        .prepare(
            "SELECT label, amount FROM expense_item WHERE expense_id = :expense_id ORDER BY id",
        )?
        .query_map(&[(":expense_id", &id)], |row| {
            Ok(ExpenseItem {
                label: row.get(0)?,
                amount: row.get(1)?,
            })
        })?
        .map(|maybe_item| maybe_item.map_err(Error::SqlError))
        .collect()
}

fn map_expense_row(row: &Row) -> Result<DailyExpense, rusqlite::Error> {
    Ok(DailyExpense {
        id: row.get(0)?,
        tenant: row.get(1)?,
        date: row.get(2)?,
        total_amount: row.get(3)?,
        number_of_expenses: row.get(4)?,
        items: Vec::new(),
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        database_id::TenantId,
        db::initialize,
        expense::{
            ExpenseItem, delete_expense, expenses_total_for_date, get_expense, list_expenses,
            record_expenses,
        },
        pagination::PageRequest,
        tenant::create_tenant,
    };

    fn get_test_connection() -> (Connection, TenantId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let tenant = create_tenant("Test Tenant", &conn).unwrap();

        (conn, tenant.id)
    }

    fn fuel_and_repairs() -> Vec<ExpenseItem> {
        vec![
            ExpenseItem {
                label: "Fuel".to_owned(),
                amount: 1500.0,
            },
            ExpenseItem {
                label: "Repairs".to_owned(),
                amount: 500.0,
            },
        ]
    }

    #[test]
    fn record_creates_a_day_record() {
        let (conn, tenant) = get_test_connection();

        let expense =
            record_expenses(tenant, date!(2024 - 01 - 05), &fuel_and_repairs(), &conn).unwrap();

        assert_eq!(expense.total_amount, 2000.0);
        assert_eq!(expense.number_of_expenses, 2);
        assert_eq!(expense.items.len(), 2);
    }

    #[test]
    fn same_day_logging_appends() {
        let (conn, tenant) = get_test_connection();
        let day = date!(2024 - 01 - 05);
        let first = record_expenses(tenant, day, &fuel_and_repairs(), &conn).unwrap();

        let second = record_expenses(
            tenant,
            day,
            &[ExpenseItem {
                label: "Tolls".to_owned(),
                amount: 300.0,
            }],
            &conn,
        )
        .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.total_amount, 2300.0);
        assert_eq!(second.number_of_expenses, 3);
        assert_eq!(second.items[2].label, "Tolls");
    }

    #[test]
    fn record_rejects_negative_amounts_before_writing() {
        let (conn, tenant) = get_test_connection();
        let day = date!(2024 - 01 - 05);

        let result = record_expenses(
            tenant,
            day,
            &[ExpenseItem {
                label: "Fuel".to_owned(),
                amount: -10.0,
            }],
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidAmount(-10.0)));
        assert_eq!(expenses_total_for_date(tenant, day, &conn).unwrap(), 0.0);
    }

    #[test]
    fn totals_default_to_zero() {
        let (conn, tenant) = get_test_connection();

        let total = expenses_total_for_date(tenant, date!(2024 - 01 - 05), &conn).unwrap();

        assert_eq!(total, 0.0);
    }

    #[test]
    fn delete_removes_record_and_lines() {
        let (conn, tenant) = get_test_connection();
        let expense =
            record_expenses(tenant, date!(2024 - 01 - 05), &fuel_and_repairs(), &conn).unwrap();

        delete_expense(expense.id, &conn).unwrap();

        assert_eq!(get_expense(expense.id, &conn), Err(Error::NotFound));
        assert_eq!(
            delete_expense(expense.id, &conn),
            Err(Error::DeleteMissingExpense(expense.id))
        );
        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM expense_item", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn listing_is_newest_first_with_lines() {
        let (conn, tenant) = get_test_connection();
        record_expenses(tenant, date!(2024 - 01 - 04), &fuel_and_repairs(), &conn).unwrap();
        record_expenses(
            tenant,
            date!(2024 - 01 - 05),
            &[ExpenseItem {
                label: "Tolls".to_owned(),
                amount: 300.0,
            }],
            &conn,
        )
        .unwrap();

        let page = list_expenses(tenant, PageRequest::default(), &conn).unwrap();

        assert_eq!(page.total_items, 2);
        assert_eq!(page.items[0].date, date!(2024 - 01 - 05));
        assert_eq!(page.items[1].items.len(), 2);
    }
}
