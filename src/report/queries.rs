//! Read-only report queries over a [`Ledger`].
//!
//! Each query builds its rows fresh from the current ledger state.

use crate::analysis::{
    annual_rate_for_student, attendance_rate, best_and_worst_month, class_tallies_for_month,
    monthly_student_rate, monthly_tally, qualifies_for_award, tally_day, DEFAULT_MIN_DAYS,
};
use crate::error::Result;
use crate::ledger::Ledger;
use crate::models::{AwardTier, MonthRate, MonthlyTally, StatusEntry, StudentRate, Tally};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One student's status in a daily listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentStatus {
    pub student: String,
    pub status: StatusEntry,
}

/// Every class recorded on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub classes: BTreeMap<String, Vec<StudentStatus>>,
}

/// One dated entry in a student's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedStatus {
    pub date: NaiveDate,
    pub status: StatusEntry,
}

/// A student's full history in one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentReport {
    pub class: String,
    pub student: String,
    pub records: Vec<DatedStatus>,
    pub counts: Tally,
    pub present_pct: f64,
    pub absent_pct: f64,
    pub late_pct: f64,
}

/// Per-class counts for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyClassSummary {
    pub year: i32,
    pub month: u32,
    pub classes: BTreeMap<String, Tally>,
}

/// Month-by-month counts for a class across a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAnalytics {
    pub class: String,
    pub year: i32,
    pub months: Vec<MonthlyTally>,
    pub best: Option<MonthRate>,
    pub worst: Option<MonthRate>,
}

/// A student's rate for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthProgress {
    pub month: u32,
    #[serde(flatten)]
    pub rate: StudentRate,
}

/// Month-by-month progress of one student across a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProgress {
    pub class: String,
    pub student: String,
    pub year: i32,
    pub months: Vec<MonthProgress>,
    /// Rate for the month of the `as_of` date, when it falls in `year` and has data.
    pub current_month_rate: Option<f64>,
    pub annual_rate: f64,
}

/// A student qualifying for an award tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardWinner {
    pub class: String,
    pub student: String,
    pub rate: f64,
    pub present_days: usize,
    pub total_days: usize,
}

/// Winners of one tier, highest rate first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardStanding {
    pub tier: AwardTier,
    pub label: String,
    pub winners: Vec<AwardWinner>,
}

/// All award tiers for a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearEndAwards {
    pub year: i32,
    pub min_days: usize,
    pub tiers: Vec<AwardStanding>,
}

/// Query surface for the presentation layer.
pub struct Reports<'a> {
    ledger: &'a Ledger,
    min_days: usize,
}

impl<'a> Reports<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self {
            ledger,
            min_days: DEFAULT_MIN_DAYS,
        }
    }

    /// Override the minimum recorded days for award eligibility.
    pub fn with_min_days(mut self, min_days: usize) -> Self {
        self.min_days = min_days;
        self
    }

    /// Statuses of every class recorded on `date`.
    ///
    /// Students are listed in roster order, followed by any entries for
    /// students no longer on the roster.
    pub fn daily_report(&self, date: NaiveDate) -> DailyReport {
        let records = self.ledger.records_on(date);
        let mut classes = BTreeMap::new();

        for (class, record) in &records {
            let roster = self.ledger.roster().students(class).unwrap_or_default();
            let mut rows: Vec<StudentStatus> = roster
                .iter()
                .filter_map(|student| {
                    record.get(student).map(|status| StudentStatus {
                        student: student.clone(),
                        status: status.clone(),
                    })
                })
                .collect();

            rows.extend(
                record
                    .iter()
                    .filter(|(student, _)| !roster.iter().any(|s| s == student))
                    .map(|(student, status)| StudentStatus {
                        student: student.to_string(),
                        status: status.clone(),
                    }),
            );

            classes.insert(class.clone(), rows);
        }

        DailyReport { date, classes }
    }

    /// Dated history of one student with summary percentages.
    pub fn student_report(&self, class: &str, student: &str) -> Result<StudentReport> {
        self.ledger.ensure_student(class, student)?;

        let mut records = Vec::new();
        let mut counts = Tally::default();

        for (date, classes) in self.ledger.log().dated() {
            let Some(entry) = classes.get(class).and_then(|record| record.get(student)) else {
                continue;
            };

            if let Some(status) = entry.status() {
                counts.add(status);
            }
            records.push(DatedStatus {
                date,
                status: entry.clone(),
            });
        }

        debug!("{} records for {} in {}", records.len(), student, class);

        Ok(StudentReport {
            class: class.to_string(),
            student: student.to_string(),
            records,
            counts,
            present_pct: attendance_rate(counts.present, counts.total),
            absent_pct: attendance_rate(counts.absent, counts.total),
            late_pct: attendance_rate(counts.late, counts.total),
        })
    }

    /// Per-class counts summed over every recorded day of the month.
    pub fn monthly_class_summary(&self, year: i32, month: u32) -> MonthlyClassSummary {
        MonthlyClassSummary {
            year,
            month,
            classes: class_tallies_for_month(self.ledger.log(), year, month),
        }
    }

    /// Month-by-month counts for a class, months without records omitted.
    pub fn monthly_analytics(&self, class: &str, year: i32) -> Result<MonthlyAnalytics> {
        self.ledger.ensure_class(class)?;

        let months: Vec<MonthlyTally> = (1..=12)
            .map(|month| monthly_tally(self.ledger.log(), class, year, month))
            .filter(|tally| tally.days_recorded > 0)
            .collect();

        let (best, worst) = match best_and_worst_month(&months) {
            Some((best, worst)) => (Some(best), Some(worst)),
            None => (None, None),
        };

        Ok(MonthlyAnalytics {
            class: class.to_string(),
            year,
            months,
            best,
            worst,
        })
    }

    /// Month-by-month rate of one student, with current-month and annual rates.
    pub fn student_progress(
        &self,
        class: &str,
        student: &str,
        year: i32,
        as_of: NaiveDate,
    ) -> Result<StudentProgress> {
        self.ledger.ensure_student(class, student)?;

        let months: Vec<MonthProgress> = (1..=12)
            .map(|month| MonthProgress {
                month,
                rate: monthly_student_rate(self.ledger.log(), class, student, year, month),
            })
            .filter(|row| row.rate.total_days > 0)
            .collect();

        let current_month_rate = if as_of.year() == year {
            months
                .iter()
                .find(|row| row.month == as_of.month())
                .map(|row| row.rate.rate)
        } else {
            None
        };

        let present: usize = months.iter().map(|row| row.rate.present_days).sum();
        let total: usize = months.iter().map(|row| row.rate.total_days).sum();

        Ok(StudentProgress {
            class: class.to_string(),
            student: student.to_string(),
            year,
            months,
            current_month_rate,
            annual_rate: attendance_rate(present, total),
        })
    }

    /// Award winners for every tier. A student can appear in several tiers.
    pub fn year_end_awards(&self, year: i32) -> YearEndAwards {
        let mut candidates = Vec::new();
        for (class, students) in self.ledger.roster().iter() {
            for student in students {
                let rate = annual_rate_for_student(self.ledger.log(), class, student, year);
                candidates.push(AwardWinner {
                    class: class.to_string(),
                    student: student.clone(),
                    rate: rate.rate,
                    present_days: rate.present_days,
                    total_days: rate.total_days,
                });
            }
        }

        let tiers = AwardTier::ALL
            .iter()
            .map(|tier| {
                let mut winners: Vec<AwardWinner> = candidates
                    .iter()
                    .filter(|c| {
                        qualifies_for_award(c.rate, c.total_days, tier.threshold(), self.min_days)
                    })
                    .cloned()
                    .collect();
                winners.sort_by(|a, b| {
                    b.rate
                        .partial_cmp(&a.rate)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });

                AwardStanding {
                    tier: *tier,
                    label: tier.label().to_string(),
                    winners,
                }
            })
            .collect();

        YearEndAwards {
            year,
            min_days: self.min_days,
            tiers,
        }
    }
}

/// Counts for a single recorded class day, used by the `mark` summary line.
pub fn day_summary(ledger: &Ledger, class: &str, date: NaiveDate) -> Option<Tally> {
    ledger.records_on(date).get(class).map(tally_day)
}
