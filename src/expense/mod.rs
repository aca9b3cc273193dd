//! Daily operating expenses, one record per tenant per day.

mod core;

pub use core::{
    DailyExpense, ExpenseItem, create_expense_tables, delete_expense, expenses_total_for_date,
    expenses_total_in_range, get_expense, list_expenses, record_expenses,
};
