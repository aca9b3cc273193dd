//! Individual billable delivery jobs, the atomic unit of work in the ledger.

mod core;

pub use core::{
    Job, JobStatus, NewJob, Payer, PaymentStatus, create_job, create_job_table, delete_job_row,
    get_job, jobs_for_transaction, jobs_with_status, map_job_row, update_job_row,
};
