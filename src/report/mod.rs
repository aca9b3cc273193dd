//! The read-side report builder.
//!
//! Everything in this module folds existing aggregates into summary
//! structures; nothing here mutates the store. The write-side counterpart
//! lives in [crate::reconcile].

mod calendar;
mod chart;
mod daily;
mod dashboard;
mod monthly;
pub mod phrases;
mod pickups;
mod weekly;

pub use calendar::{CalendarDay, calendar_data};
pub use chart::{BarChartData, bar_chart};
pub use daily::{ComparisonNote, DailyReport, DaySnapshot, comparison_note, daily_report};
pub use dashboard::{DashboardSummary, dashboard};
pub use monthly::{MonthlyReport, monthly_report};
pub use pickups::{DEFAULT_PICKUP_THRESHOLD, DEFAULT_PICKUP_WINDOW_DAYS, FrequentPickup, frequent_pickups};
pub use weekly::{TRAILING_WEEKS, WeekSummary, WeekWindow, week_windows, weekly_report};
