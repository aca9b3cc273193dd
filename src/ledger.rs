//! The shared-connection facade callers go through.

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use rand::{SeedableRng, rngs::SmallRng};
use rusqlite::Connection;
use time::{Date, Month};

use crate::{
    Error,
    client::{Client, list_clients},
    database_id::{ExpenseId, JobId, TenantId, TransactionId},
    db,
    expense::{DailyExpense, ExpenseItem, delete_expense, list_expenses, record_expenses},
    job::{Job, JobStatus, get_job, jobs_with_status},
    pagination::{Page, PageRequest},
    reconcile::{
        BulkStatusUpdate, BulkUpdateOutcome, JobPatch, NewDayJobs, RepairSummary,
        bulk_update_transaction_jobs, create_jobs_for_day, delete_job, rebuild_aggregates,
        update_job,
    },
    report::{
        BarChartData, CalendarDay, DEFAULT_PICKUP_THRESHOLD, DEFAULT_PICKUP_WINDOW_DAYS,
        DailyReport, DashboardSummary, FrequentPickup, MonthlyReport, WeekSummary, bar_chart,
        calendar_data, daily_report, dashboard, frequent_pickups, monthly_report, weekly_report,
    },
    sheet::read_job_rows,
    tenant::{Tenant, create_tenant, get_tenant, update_tenant_settings},
    transaction::{Transaction, get_transaction, list_transactions},
};

/// The ledger, backed by one SQLite database.
///
/// All operations go through a shared connection behind a mutex; a mutation
/// holds the lock for its whole reconciliation sequence, which serialises
/// writers per store and rules out interleaved find-or-create races on the
/// same day or client.
#[derive(Debug, Clone)]
pub struct Ledger {
    connection: Arc<Mutex<Connection>>,
}

impl Ledger {
    /// Open (or create) a ledger database at `path`.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the database cannot be opened or the
    /// schema cannot be created.
    pub fn open(path: &Path) -> Result<Self, Error> {
        Self::new(Connection::open(path)?)
    }

    /// Open an in-memory ledger, useful for tests and dry runs.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, Error> {
        Self::new(Connection::open_in_memory()?)
    }

    /// Wrap an existing connection, creating the schema if needed.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the schema cannot be created.
    pub fn new(connection: Connection) -> Result<Self, Error> {
        db::initialize(&connection)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|_| Error::DatabaseLock)
    }

    // ------------------------------------------------------------------
    // Tenants
    // ------------------------------------------------------------------

    /// Create a new tenant account.
    pub fn create_tenant(&self, name: &str) -> Result<Tenant, Error> {
        create_tenant(name, &*self.connection()?)
    }

    /// Retrieve a tenant account.
    pub fn tenant(&self, id: TenantId) -> Result<Tenant, Error> {
        get_tenant(id, &*self.connection()?)
    }

    /// Update a tenant's opening balance and work-week length.
    pub fn update_tenant_settings(
        &self,
        id: TenantId,
        opening_balance: f64,
        working_days_per_week: u8,
    ) -> Result<Tenant, Error> {
        update_tenant_settings(id, opening_balance, working_days_per_week, &*self.connection()?)
    }

    // ------------------------------------------------------------------
    // Reconciliation
    // ------------------------------------------------------------------

    /// Record a batch of jobs against the day's aggregate.
    ///
    /// See [crate::reconcile::create_jobs_for_day].
    pub fn create_jobs_for_day(&self, new_jobs: NewDayJobs) -> Result<TransactionId, Error> {
        create_jobs_for_day(new_jobs, &*self.connection()?)
    }

    /// Import jobs from an uploaded spreadsheet.
    ///
    /// The sheet is validated and normalized in full before anything is
    /// persisted; see [crate::sheet::read_job_rows].
    pub fn import_job_sheet<R: std::io::Read>(
        &self,
        tenant: TenantId,
        date: Date,
        customer_name: &str,
        pick_up: &str,
        reader: R,
    ) -> Result<TransactionId, Error> {
        let deliveries = read_job_rows(reader)?
            .into_iter()
            .map(Into::into)
            .collect();

        self.create_jobs_for_day(NewDayJobs {
            tenant,
            date,
            customer_name: customer_name.to_owned(),
            pick_up: pick_up.to_owned(),
            deliveries,
        })
    }

    /// Apply a patch to a job and reconcile the owning aggregates.
    pub fn update_job(&self, job_id: JobId, patch: JobPatch) -> Result<Job, Error> {
        update_job(job_id, patch, &*self.connection()?)
    }

    /// Delete a job and reconcile the aggregates that referenced it.
    pub fn delete_job(&self, job_id: JobId) -> Result<Job, Error> {
        delete_job(job_id, &*self.connection()?)
    }

    /// Mark every job of a daily transaction done and/or paid.
    pub fn bulk_update_transaction_jobs(
        &self,
        transaction_id: TransactionId,
        request: BulkStatusUpdate,
    ) -> Result<BulkUpdateOutcome, Error> {
        bulk_update_transaction_jobs(transaction_id, request, &*self.connection()?)
    }

    /// Log expenses for a day, appending to any existing record.
    pub fn record_expenses(
        &self,
        tenant: TenantId,
        date: Date,
        items: &[ExpenseItem],
    ) -> Result<DailyExpense, Error> {
        record_expenses(tenant, date, items, &*self.connection()?)
    }

    /// Remove a day's expense record.
    pub fn delete_expense(&self, id: ExpenseId) -> Result<(), Error> {
        delete_expense(id, &*self.connection()?)
    }

    /// Rebuild every aggregate of a tenant from the job table.
    pub fn rebuild_aggregates(&self, tenant: TenantId) -> Result<RepairSummary, Error> {
        rebuild_aggregates(tenant, &*self.connection()?)
    }

    // ------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------

    /// Build the daily report for `today`.
    pub fn daily_report(&self, tenant: TenantId, today: Date) -> Result<DailyReport, Error> {
        let mut rng = SmallRng::from_entropy();

        daily_report(tenant, today, &mut rng, &*self.connection()?)
    }

    /// Fold the trailing weeks of activity using the tenant's work-week
    /// setting.
    pub fn weekly_report(&self, tenant: TenantId, today: Date) -> Result<Vec<WeekSummary>, Error> {
        let connection = self.connection()?;
        let tenant_record = get_tenant(tenant, &connection)?;

        weekly_report(
            tenant,
            today,
            tenant_record.working_days_per_week,
            &connection,
        )
    }

    /// Fold a tenant's activity over one calendar month.
    pub fn monthly_report(
        &self,
        tenant: TenantId,
        month: Month,
        year: i32,
    ) -> Result<MonthlyReport, Error> {
        monthly_report(tenant, month, year, &*self.connection()?)
    }

    /// Fold a year of activity into per-month chart buckets.
    pub fn bar_chart(&self, tenant: TenantId, year: i32) -> Result<BarChartData, Error> {
        bar_chart(tenant, year, &*self.connection()?)
    }

    /// Fold a tenant's whole history into the dashboard numbers.
    pub fn dashboard(&self, tenant: TenantId) -> Result<DashboardSummary, Error> {
        dashboard(tenant, &*self.connection()?)
    }

    /// Find customer/pick-up pairs that kept coming back recently, using the
    /// default window and threshold.
    pub fn frequent_pickups(
        &self,
        tenant: TenantId,
        today: Date,
    ) -> Result<Vec<FrequentPickup>, Error> {
        frequent_pickups(
            tenant,
            today,
            DEFAULT_PICKUP_WINDOW_DAYS,
            DEFAULT_PICKUP_THRESHOLD,
            &*self.connection()?,
        )
    }

    /// Build the month's calendar cells.
    pub fn calendar_data(
        &self,
        tenant: TenantId,
        month: Month,
        year: i32,
    ) -> Result<Vec<CalendarDay>, Error> {
        calendar_data(tenant, month, year, &*self.connection()?)
    }

    // ------------------------------------------------------------------
    // Browsing
    // ------------------------------------------------------------------

    /// Retrieve a daily transaction.
    pub fn transaction(&self, id: TransactionId) -> Result<Transaction, Error> {
        get_transaction(id, &*self.connection()?)
    }

    /// Retrieve one page of a tenant's daily transactions, newest first.
    pub fn transactions(
        &self,
        tenant: TenantId,
        request: PageRequest,
    ) -> Result<Page<Transaction>, Error> {
        list_transactions(tenant, request, &*self.connection()?)
    }

    /// Retrieve a single job.
    pub fn job(&self, id: JobId) -> Result<Job, Error> {
        get_job(id, &*self.connection()?)
    }

    /// Retrieve a daily transaction's jobs, optionally filtered by work
    /// state.
    pub fn transaction_jobs(
        &self,
        transaction_id: TransactionId,
        status: Option<JobStatus>,
    ) -> Result<Vec<Job>, Error> {
        jobs_with_status(transaction_id, status, &*self.connection()?)
    }

    /// Retrieve one page of a tenant's clients.
    pub fn clients(
        &self,
        tenant: TenantId,
        request: PageRequest,
    ) -> Result<Page<Client>, Error> {
        list_clients(tenant, request, &*self.connection()?)
    }

    /// Retrieve one page of a tenant's expense records.
    pub fn expenses(
        &self,
        tenant: TenantId,
        request: PageRequest,
    ) -> Result<Page<DailyExpense>, Error> {
        list_expenses(tenant, request, &*self.connection()?)
    }
}
