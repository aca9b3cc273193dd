//! The reconciliation engine.
//!
//! Every job mutation (creation, update, deletion, bulk status change) goes
//! through this module so that the per-day
//! [Transaction](crate::transaction::Transaction) and per-client
//! [Client](crate::client::Client) aggregates stay consistent with the
//! underlying job set. Each operation validates its input before touching
//! the store and runs its whole persistence sequence inside one SQL
//! transaction, then derives the aggregates by recomputing them from the
//! owned jobs.

mod bulk;
mod create;
mod delete;
mod repair;
mod update;

pub use bulk::{BulkStatusUpdate, BulkUpdateOutcome, bulk_update_transaction_jobs};
pub use create::{Delivery, NewDayJobs, create_jobs_for_day};
pub use delete::delete_job;
pub use repair::{RepairSummary, rebuild_aggregates};
pub use update::{JobPatch, update_job};
