//! Per-day financial aggregates.
//!
//! A transaction here is not a database transaction: it is the running
//! summary of one tenant's jobs for one calendar day. See the crate docs
//! for how the [reconcile](crate::reconcile) module keeps these aggregates
//! consistent with the underlying job set.

mod core;

pub use core::{
    PaymentState, Transaction, create_transaction_table, get_for_day, get_or_create_for_day,
    get_transaction, latest_before, list_transactions, map_transaction_row, recompute_aggregates,
    transactions_in_range,
};
