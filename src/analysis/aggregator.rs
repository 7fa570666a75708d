//! Attendance tallies, rates and award qualification.
//!
//! Rates are percentages in `0.0..=100.0` and are defined as 0 when nothing
//! was recorded.

use crate::models::{
    AttendanceLog, AttendanceStatus, DailyClassRecord, DayRecords, MonthRate, MonthlyTally,
    StudentRate, Tally,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Minimum recorded days before a student is eligible for any award.
pub const DEFAULT_MIN_DAYS: usize = 50;

/// `present / total * 100`, or 0 when `total` is 0.
pub fn attendance_rate(present: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        present as f64 / total as f64 * 100.0
    }
}

/// Count a single day's record by status. Unrecognized values are skipped.
pub fn tally_day(record: &DailyClassRecord) -> Tally {
    let mut tally = Tally::default();

    for (_, entry) in record.iter() {
        if let Some(status) = entry.status() {
            tally.add(status);
        }
    }

    tally
}

/// Counts for `class` over every recorded date in `(year, month)`.
pub fn monthly_tally(log: &AttendanceLog, class: &str, year: i32, month: u32) -> MonthlyTally {
    let mut counts = Tally::default();
    let mut days_recorded = 0;

    for (_, classes) in log.in_month(year, month) {
        if let Some(record) = classes.get(class) {
            counts.merge(&tally_day(record));
            days_recorded += 1;
        }
    }

    MonthlyTally {
        month,
        counts,
        rate: attendance_rate(counts.present, counts.total),
        days_recorded,
    }
}

/// Per-class counts for every class recorded in `(year, month)`.
pub fn class_tallies_for_month(
    log: &AttendanceLog,
    year: i32,
    month: u32,
) -> BTreeMap<String, Tally> {
    let mut summary: BTreeMap<String, Tally> = BTreeMap::new();

    for (_, classes) in log.in_month(year, month) {
        for (class, record) in classes {
            summary
                .entry(class.clone())
                .or_default()
                .merge(&tally_day(record));
        }
    }

    summary
}

/// Days a student was recorded, and marked present, across `days`.
///
/// A day counts toward `total_days` whenever the student has an entry in the
/// class record, whatever its status.
fn student_rate<'a, I>(days: I, class: &str, student: &str) -> StudentRate
where
    I: Iterator<Item = (NaiveDate, &'a DayRecords)>,
{
    let mut present_days = 0;
    let mut total_days = 0;

    for (_, classes) in days {
        let Some(entry) = classes.get(class).and_then(|record| record.get(student)) else {
            continue;
        };

        total_days += 1;
        if entry.status() == Some(AttendanceStatus::Present) {
            present_days += 1;
        }
    }

    StudentRate {
        present_days,
        total_days,
        rate: attendance_rate(present_days, total_days),
    }
}

/// A student's attendance in `class` over the whole of `year`.
pub fn annual_rate_for_student(
    log: &AttendanceLog,
    class: &str,
    student: &str,
    year: i32,
) -> StudentRate {
    student_rate(log.in_year(year), class, student)
}

/// A student's attendance in `class` over one month.
pub fn monthly_student_rate(
    log: &AttendanceLog,
    class: &str,
    student: &str,
    year: i32,
    month: u32,
) -> StudentRate {
    student_rate(log.in_month(year, month), class, student)
}

/// True when the student has at least `min_days` recorded and a rate at or
/// above `threshold`.
pub fn qualifies_for_award(rate: f64, total_days: usize, threshold: f64, min_days: usize) -> bool {
    total_days >= min_days && rate >= threshold
}

/// Highest and lowest rated months. Ties go to the earliest row.
pub fn best_and_worst_month(rows: &[MonthlyTally]) -> Option<(MonthRate, MonthRate)> {
    let first = rows.first()?;
    let mut best = first;
    let mut worst = first;

    for row in &rows[1..] {
        if row.rate > best.rate {
            best = row;
        }
        if row.rate < worst.rate {
            worst = row;
        }
    }

    Some((
        MonthRate {
            month: best.month,
            rate: best.rate,
        },
        MonthRate {
            month: worst.month,
            rate: worst.rate,
        },
    ))
}
