use crate::domain::issue::Issue;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Weight of one severity point in the priority score
pub const SEVERITY_WEIGHT: i64 = 10;

/// Whole days elapsed between `created_at` and `now`, truncated toward zero.
///
/// Negative when the issue was created after `now`.
pub fn days_since_created(issue: &Issue, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(issue.created_at).num_days()
}

/// Computes the priority score of an issue at the instant `now`.
///
/// `score = severity * 10 - days_since_created + rank`, where an unset rank
/// counts as 0. Higher scores are more urgent. The arithmetic saturates, so
/// extreme rank overrides clamp instead of overflowing.
///
/// # Examples
/// ```
/// use chrono::{Duration, Utc};
/// use issue_board_core::domain::issue::{Issue, IssueId, Severity};
/// use issue_board_core::domain::scoring::priority_score;
///
/// let now = Utc::now();
/// let issue = Issue::new(IssueId::new("1").unwrap(), "Crash".to_string(), Severity::new(5).unwrap())
///     .with_created_at(now);
/// assert_eq!(priority_score(&issue, now), 50);
///
/// let older = issue.clone().with_created_at(now - Duration::days(10));
/// assert_eq!(priority_score(&older, now), 40);
/// ```
pub fn priority_score(issue: &Issue, now: DateTime<Utc>) -> i64 {
    i64::from(issue.severity.get())
        .saturating_mul(SEVERITY_WEIGHT)
        .saturating_sub(days_since_created(issue, now))
        .saturating_add(issue.rank_or_default())
}

/// Scores an issue against the current wall clock.
///
/// Only meant for one-off displays; sorting must go through
/// [`sort_by_priority`] so every comparison shares one instant.
pub fn priority_score_now(issue: &Issue) -> i64 {
    priority_score(issue, Utc::now())
}

/// Orders two issues for display inside a board column.
///
/// Higher score first; on equal scores the more recently created issue
/// first; on equal creation instants ascending id (see [`compare_ids`]).
/// Both scores use the same `now`, which keeps the ordering transitive.
pub fn compare_by_priority(a: &Issue, b: &Issue, now: DateTime<Utc>) -> Ordering {
    let score_a = priority_score(a, now);
    let score_b = priority_score(b, now);

    score_b
        .cmp(&score_a)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| compare_ids(a.id.as_str(), b.id.as_str()))
}

/// Sorts issues in place, most urgent first.
///
/// `now` is captured by the caller once and shared by every comparison of
/// the pass. The sort is stable.
pub fn sort_by_priority(issues: &mut [Issue], now: DateTime<Utc>) {
    issues.sort_by(|a, b| compare_by_priority(a, b, now));
}

/// ASCII punctuation and symbols in root collation order
const PUNCTUATION_ORDER: &str = "_-,;:!?.'\"()[]{}@*/\\&#%`^+<=>|~$";

/// Primary collation weight of a character: its class, then its rank
/// inside the class.
///
/// Classes follow the root collation: whitespace, punctuation and ASCII
/// symbols, other symbols, digits, letters. Letters weigh by their
/// lowercase form.
fn primary_weight(c: char) -> (u8, u32) {
    if c.is_whitespace() {
        return (0, u32::from(c));
    }
    if let Some(rank) = PUNCTUATION_ORDER.find(c) {
        return (1, rank as u32);
    }
    if let Some(digit) = c.to_digit(10) {
        return (3, digit);
    }
    if c.is_numeric() {
        return (3, 10 + u32::from(c));
    }
    if c.is_alphabetic() {
        let lower = c.to_lowercase().next().unwrap_or(c);
        return (4, u32::from(lower));
    }
    (2, u32::from(c))
}

/// Locale-style string collation for ids.
///
/// Characters compare by [`primary_weight`] first, so punctuation sorts
/// before digits and digits before letters, ignoring case. Strings that
/// differ only in case put the lowercase form first; code point order
/// breaks any remaining tie so the result is total.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    let primary = a
        .chars()
        .map(primary_weight)
        .cmp(b.chars().map(primary_weight));

    primary.then_with(|| {
        a.chars()
            .zip(b.chars())
            .find(|(ca, cb)| ca != cb)
            .map(|(ca, cb)| match (ca.is_lowercase(), cb.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => ca.cmp(&cb),
            })
            .unwrap_or_else(|| a.len().cmp(&b.len()))
    })
}
