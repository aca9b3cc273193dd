use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use time::{Date, Month, macros::format_description};
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use dispatch_ledger::{
    Ledger,
    expense::ExpenseItem,
    job::{JobStatus, Payer, PaymentStatus},
    pagination::PageRequest,
    reconcile::{BulkStatusUpdate, Delivery, JobPatch, NewDayJobs},
};

#[derive(Parser)]
#[command(name = "dispatch-ledger", version, about = "Job and expense ledger for delivery businesses")]
struct Cli {
    /// Path to the ledger database.
    #[arg(long, default_value = "dispatch-ledger.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the ledger database.
    Init,
    /// Create a tenant account.
    TenantAdd {
        name: String,
        #[arg(long, default_value_t = 0.0)]
        opening_balance: f64,
        #[arg(long, default_value_t = 6)]
        working_days: u8,
    },
    /// Record jobs for a customer on a given day.
    JobAdd {
        #[arg(long)]
        tenant: i64,
        #[arg(long, value_parser = parse_date)]
        date: Date,
        #[arg(long)]
        customer: String,
        #[arg(long)]
        pick_up: String,
        /// A delivery leg as LOCATION:AMOUNT:PAYER, repeatable.
        #[arg(long = "delivery", value_parser = parse_delivery, required = true)]
        deliveries: Vec<Delivery>,
    },
    /// Import jobs from a CSV sheet with Delivery, Payer and Amount columns.
    JobImport {
        #[arg(long)]
        tenant: i64,
        #[arg(long, value_parser = parse_date)]
        date: Date,
        #[arg(long)]
        customer: String,
        #[arg(long)]
        pick_up: String,
        file: PathBuf,
    },
    /// Update a single job.
    JobUpdate {
        job: i64,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long, value_parser = parse_job_status)]
        job_status: Option<JobStatus>,
        #[arg(long, value_parser = parse_payment_status)]
        payment_status: Option<PaymentStatus>,
    },
    /// Delete a job and reconcile its aggregates.
    JobDelete { job: i64 },
    /// Mark every job of a day done and/or paid.
    MarkDay {
        transaction: i64,
        #[arg(long)]
        done: bool,
        #[arg(long)]
        paid: bool,
    },
    /// Log expenses for a day.
    ExpenseAdd {
        #[arg(long)]
        tenant: i64,
        #[arg(long, value_parser = parse_date)]
        date: Date,
        /// An expense line as LABEL:AMOUNT, repeatable.
        #[arg(long = "item", value_parser = parse_expense_item, required = true)]
        items: Vec<ExpenseItem>,
    },
    /// List a tenant's daily transactions.
    Transactions {
        #[arg(long)]
        tenant: i64,
        #[arg(long, default_value_t = 1)]
        page: u64,
    },
    /// Rebuild every aggregate of a tenant from the job table.
    Repair {
        #[arg(long)]
        tenant: i64,
    },
    /// Build a report.
    Report {
        #[command(subcommand)]
        report: ReportCommand,
    },
}

#[derive(Subcommand)]
enum ReportCommand {
    /// Today against the most recent prior working day.
    Daily {
        #[arg(long)]
        tenant: i64,
        #[arg(long, value_parser = parse_date)]
        date: Date,
    },
    /// The trailing weeks, Monday-anchored.
    Weekly {
        #[arg(long)]
        tenant: i64,
        #[arg(long, value_parser = parse_date)]
        date: Date,
    },
    /// One calendar month of totals.
    Monthly {
        #[arg(long)]
        tenant: i64,
        #[arg(long, value_parser = parse_month)]
        month: Month,
        #[arg(long)]
        year: i32,
    },
    /// Per-month returns and expenses for a year.
    Chart {
        #[arg(long)]
        tenant: i64,
        #[arg(long)]
        year: i32,
    },
    /// All-time totals.
    Dashboard {
        #[arg(long)]
        tenant: i64,
    },
    /// Customer/pick-up pairs that keep coming back.
    Pickups {
        #[arg(long)]
        tenant: i64,
        #[arg(long, value_parser = parse_date)]
        date: Date,
    },
    /// Per-day activity for a month's calendar view.
    Calendar {
        #[arg(long)]
        tenant: i64,
        #[arg(long, value_parser = parse_month)]
        month: Month,
        #[arg(long)]
        year: i32,
    },
}

fn parse_date(text: &str) -> Result<Date, String> {
    Date::parse(text, &format_description!("[year]-[month]-[day]"))
        .map_err(|error| format!("expected YYYY-MM-DD: {error}"))
}

fn parse_month(text: &str) -> Result<Month, String> {
    let number: u8 = text.parse().map_err(|_| "expected a month number 1-12")?;

    Month::try_from(number).map_err(|error| error.to_string())
}

fn parse_delivery(text: &str) -> Result<Delivery, String> {
    let parts: Vec<&str> = text.splitn(3, ':').collect();
    let [location, amount, payer] = parts.as_slice() else {
        return Err("expected LOCATION:AMOUNT:PAYER".to_owned());
    };

    Ok(Delivery {
        location: (*location).to_owned(),
        amount: amount
            .parse()
            .map_err(|_| format!("\"{amount}\" is not a number"))?,
        payer: Payer::normalize(payer),
    })
}

fn parse_expense_item(text: &str) -> Result<ExpenseItem, String> {
    let parts: Vec<&str> = text.splitn(2, ':').collect();
    let [label, amount] = parts.as_slice() else {
        return Err("expected LABEL:AMOUNT".to_owned());
    };

    Ok(ExpenseItem {
        label: (*label).to_owned(),
        amount: amount
            .parse()
            .map_err(|_| format!("\"{amount}\" is not a number"))?,
    })
}

fn parse_job_status(text: &str) -> Result<JobStatus, String> {
    JobStatus::parse(text).ok_or_else(|| format!("unknown job status \"{text}\""))
}

fn parse_payment_status(text: &str) -> Result<PaymentStatus, String> {
    PaymentStatus::parse(text).ok_or_else(|| format!("unknown payment status \"{text}\""))
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("report types serialize to JSON")
    );
}

fn run(cli: Cli) -> Result<(), dispatch_ledger::Error> {
    let ledger = Ledger::open(&cli.db)?;

    match cli.command {
        Command::Init => {
            tracing::info!("ledger ready at {}", cli.db.display());
        }
        Command::TenantAdd {
            name,
            opening_balance,
            working_days,
        } => {
            let tenant = ledger.create_tenant(&name)?;
            let tenant =
                ledger.update_tenant_settings(tenant.id, opening_balance, working_days)?;
            print_json(&tenant);
        }
        Command::JobAdd {
            tenant,
            date,
            customer,
            pick_up,
            deliveries,
        } => {
            let transaction_id = ledger.create_jobs_for_day(NewDayJobs {
                tenant,
                date,
                customer_name: customer,
                pick_up,
                deliveries,
            })?;
            print_json(&ledger.transaction(transaction_id)?);
        }
        Command::JobImport {
            tenant,
            date,
            customer,
            pick_up,
            file,
        } => {
            let reader = std::fs::File::open(&file)
                .map_err(|error| dispatch_ledger::Error::InvalidSheet(error.to_string()))?;
            let transaction_id =
                ledger.import_job_sheet(tenant, date, &customer, &pick_up, reader)?;
            print_json(&ledger.transaction(transaction_id)?);
        }
        Command::JobUpdate {
            job,
            amount,
            job_status,
            payment_status,
        } => {
            let job = ledger.update_job(
                job,
                JobPatch {
                    amount,
                    job_status,
                    payment_status,
                    ..JobPatch::default()
                },
            )?;
            print_json(&job);
        }
        Command::JobDelete { job } => {
            let job = ledger.delete_job(job)?;
            print_json(&job);
        }
        Command::MarkDay {
            transaction,
            done,
            paid,
        } => {
            let outcome = ledger.bulk_update_transaction_jobs(
                transaction,
                BulkStatusUpdate {
                    mark_done: done,
                    mark_paid: paid,
                },
            )?;
            if !outcome.changed {
                tracing::info!("all jobs already satisfied the requested state");
            }
            print_json(&outcome.transaction);
        }
        Command::ExpenseAdd {
            tenant,
            date,
            items,
        } => {
            print_json(&ledger.record_expenses(tenant, date, &items)?);
        }
        Command::Transactions { tenant, page } => {
            print_json(&ledger.transactions(
                tenant,
                PageRequest {
                    page,
                    ..PageRequest::default()
                },
            )?);
        }
        Command::Repair { tenant } => {
            let summary = ledger.rebuild_aggregates(tenant)?;
            tracing::info!(
                "recomputed {} transactions and {} clients",
                summary.transactions,
                summary.clients
            );
        }
        Command::Report { report } => match report {
            ReportCommand::Daily { tenant, date } => {
                let report = ledger.daily_report(tenant, date)?;
                if let Some(message) = report.message() {
                    println!("{message}");
                } else {
                    print_json(&report);
                }
            }
            ReportCommand::Weekly { tenant, date } => {
                print_json(&ledger.weekly_report(tenant, date)?);
            }
            ReportCommand::Monthly {
                tenant,
                month,
                year,
            } => {
                print_json(&ledger.monthly_report(tenant, month, year)?);
            }
            ReportCommand::Chart { tenant, year } => {
                print_json(&ledger.bar_chart(tenant, year)?);
            }
            ReportCommand::Dashboard { tenant } => {
                print_json(&ledger.dashboard(tenant)?);
            }
            ReportCommand::Pickups { tenant, date } => {
                print_json(&ledger.frequent_pickups(tenant, date)?);
            }
            ReportCommand::Calendar {
                tenant,
                month,
                year,
            } => {
                print_json(&ledger.calendar_data(tenant, month, year)?);
            }
        },
    }

    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_filter(filter::LevelFilter::INFO),
        )
        .init();

    let cli = Cli::parse();

    if let Err(error) = run(cli) {
        tracing::error!("{error}");
        std::process::exit(1);
    }
}
