//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The ID of a tenant (an individual business account).
pub type TenantId = i64;

/// The ID of a single delivery job.
pub type JobId = i64;

/// The ID of a daily transaction aggregate.
pub type TransactionId = i64;

/// The ID of a per-client rollup record.
pub type ClientId = i64;

/// The ID of a daily expense record.
pub type ExpenseId = i64;
