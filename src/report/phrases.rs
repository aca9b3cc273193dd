//! Phrase pools for the daily report's comparison narrative.
//!
//! Selection is a pure function of the injected random source, so reports
//! are reproducible in tests by seeding the generator.

use rand::Rng;

/// The report axis a phrase talks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseCategory {
    /// Money received for the day.
    Returns,
    /// Money spent for the day.
    Expenses,
    /// How many jobs were handled.
    Jobs,
}

/// How the day compares to the previous one on an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    /// The day improved on this axis.
    Positive,
    /// No meaningful change.
    Neutral,
    /// The day fell behind on this axis.
    Negative,
}

pub(crate) const RETURNS_POSITIVE: [&str; 6] = [
    "Your returns are outstanding today!",
    "Impressive performance on your returns.",
    "Great job maximizing your returns.",
    "Your returns are higher than expected.",
    "Fantastic job managing your returns.",
    "You've achieved impressive returns today.",
];

pub(crate) const RETURNS_NEUTRAL: [&str; 6] = [
    "Steady returns today.",
    "Returns are consistent.",
    "No significant change in returns.",
    "Today's returns are stable.",
    "Returns are in line with expectations.",
    "Returns remain constant.",
];

pub(crate) const RETURNS_NEGATIVE: [&str; 6] = [
    "Returns today are below expectations.",
    "Let's work on improving your returns.",
    "There's room for improvement in returns.",
    "Your returns are lower than anticipated.",
    "Returns today are falling short.",
    "Financial returns could be improved.",
];

pub(crate) const EXPENSES_POSITIVE: [&str; 6] = [
    "You've managed expenses exceptionally well today!",
    "Impressive control over expenses.",
    "Great job optimizing your spending!",
    "Your expenses are lower than expected.",
    "Well done on optimizing your spending.",
    "Great job! Your spending is well-controlled.",
];

pub(crate) const EXPENSES_NEUTRAL: [&str; 6] = [
    "Steady expenses today.",
    "Expenses are consistent.",
    "No significant change in expenses.",
    "Today's expenses are stable.",
    "Spending is holding steady.",
    "Expenses remain constant.",
];

pub(crate) const EXPENSES_NEGATIVE: [&str; 6] = [
    "Expenses today are higher than expected.",
    "Let's review and optimize your expenses.",
    "Expense management needs attention today.",
    "Let's work on improving your spending.",
    "Your spending needs careful review.",
    "Spending today requires adjustment.",
];

pub(crate) const JOBS_POSITIVE: [&str; 6] = [
    "You've successfully handled multiple jobs today!",
    "Impressive number of jobs managed today.",
    "Great job on efficiently handling jobs!",
    "The number of jobs today exceeds expectations.",
    "Fantastic job in job management today.",
    "The number of jobs today is truly remarkable.",
];

pub(crate) const JOBS_NEUTRAL: [&str; 6] = [
    "Steady number of jobs today.",
    "The number of jobs is consistent.",
    "No significant change in the number of jobs.",
    "Today's number of jobs is stable.",
    "The number of jobs remains steady.",
    "The number of jobs remains constant.",
];

pub(crate) const JOBS_NEGATIVE: [&str; 6] = [
    "The number of jobs today is lower than expected.",
    "Let's focus on increasing the number of jobs.",
    "There's room for improvement in job management.",
    "Today's number of jobs needs attention.",
    "The number of jobs is lower than anticipated.",
    "Today's number of jobs could be improved.",
];

/// Pick one phrase for an axis and sentiment using the caller's random
/// source.
pub fn pick_phrase(
    category: PhraseCategory,
    sentiment: Sentiment,
    rng: &mut impl Rng,
) -> &'static str {
    let pool: &[&'static str] = match (category, sentiment) {
        (PhraseCategory::Returns, Sentiment::Positive) => &RETURNS_POSITIVE,
        (PhraseCategory::Returns, Sentiment::Neutral) => &RETURNS_NEUTRAL,
        (PhraseCategory::Returns, Sentiment::Negative) => &RETURNS_NEGATIVE,
        (PhraseCategory::Expenses, Sentiment::Positive) => &EXPENSES_POSITIVE,
        (PhraseCategory::Expenses, Sentiment::Neutral) => &EXPENSES_NEUTRAL,
        (PhraseCategory::Expenses, Sentiment::Negative) => &EXPENSES_NEGATIVE,
        (PhraseCategory::Jobs, Sentiment::Positive) => &JOBS_POSITIVE,
        (PhraseCategory::Jobs, Sentiment::Neutral) => &JOBS_NEUTRAL,
        (PhraseCategory::Jobs, Sentiment::Negative) => &JOBS_NEGATIVE,
    };

    pool[rng.gen_range(0..pool.len())]
}
