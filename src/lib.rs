//! Dispatch Ledger is a multi-tenant bookkeeping engine for delivery
//! businesses: it records daily delivery jobs, payments and expenses, keeps
//! denormalized per-day and per-client aggregates consistent with the
//! underlying job set, and folds those aggregates into daily, weekly,
//! monthly and yearly reports.
//!
//! The crate is organised around three layers:
//!
//! - the data model modules ([job], [transaction], [client], [expense],
//!   [tenant]) own their table schemas and query functions,
//! - the [reconcile] module mutates jobs while keeping the aggregates
//!   consistent,
//! - the [report] module is a pure read-side fold over the aggregates.
//!
//! [Ledger] wraps everything behind a shared SQLite connection and is the
//! entry point callers are expected to use.

#![warn(missing_docs)]

pub mod client;
pub mod database_id;
pub mod db;
pub mod expense;
pub mod job;
mod ledger;
pub mod pagination;
pub mod reconcile;
pub mod report;
pub mod sheet;
pub mod tenant;
pub mod transaction;

pub use db::initialize as initialize_db;
pub use ledger::Ledger;

use crate::database_id::{ExpenseId, TenantId, TransactionId};

/// The errors that may occur in the ledger.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A job-creation call was given an empty delivery list.
    ///
    /// Every ledger entry must carry at least one delivery, otherwise there
    /// is nothing to reconcile the day's aggregate against.
    #[error("at least one delivery is required")]
    EmptyDeliveryList,

    /// An amount was negative or not a finite number.
    #[error("{0} is not a valid non-negative amount")]
    InvalidAmount(f64),

    /// A spreadsheet was missing a required column, or a row left one of the
    /// required cells empty.
    ///
    /// The whole batch is rejected; no job from the sheet is persisted.
    #[error("spreadsheet rows must provide a non-empty \"{0}\" value")]
    MissingSheetColumn(&'static str),

    /// The spreadsheet could not be read as tabular data.
    #[error("could not read the spreadsheet: {0}")]
    InvalidSheet(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a job that does not exist.
    #[error("tried to update a job that is not in the ledger")]
    UpdateMissingJob,

    /// Tried to delete a job that does not exist.
    #[error("tried to delete a job that is not in the ledger")]
    DeleteMissingJob,

    /// Tried to delete a daily expense record that does not exist.
    #[error("tried to delete an expense record that is not in the ledger")]
    DeleteMissingExpense(ExpenseId),

    /// The referenced daily transaction does not exist.
    #[error("no daily transaction with the ID {0}")]
    MissingTransaction(TransactionId),

    /// The referenced tenant does not exist.
    #[error("no tenant with the ID {0}")]
    UnknownTenant(TenantId),

    /// Another writer held the database when this operation ran.
    ///
    /// The caller should retry the whole operation.
    #[error("the ledger is busy, retry the operation")]
    WriteConflict,

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.code == rusqlite::ErrorCode::DatabaseBusy
                    || sql_error.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                Error::WriteConflict
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
