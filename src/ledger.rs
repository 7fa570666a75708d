//! The attendance ledger.
//!
//! Owns the roster and attendance log for the lifetime of the process and
//! saves the log through the store after every mutation.

use crate::error::{AttendanceError, Result};
use crate::models::{
    AttendanceLog, AttendanceStatus, BulkFill, DailyClassRecord, DayRecords, Roster,
};
use crate::storage::JsonStore;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// In-memory roster and attendance log backed by a [`JsonStore`].
#[derive(Debug)]
pub struct Ledger {
    roster: Roster,
    log: AttendanceLog,
    store: JsonStore,
}

impl Ledger {
    /// Load both documents from `store`.
    ///
    /// Returns the ledger plus any missing-data warnings raised while loading.
    pub fn open(store: JsonStore) -> Result<(Self, Vec<String>)> {
        let roster = store.load_roster()?;
        let log = store.load_log()?;

        let warnings: Vec<String> = roster
            .warning
            .into_iter()
            .chain(log.warning)
            .collect();

        info!(
            "Loaded {} classes and {} attendance days",
            roster.data.len(),
            log.data.len()
        );

        Ok((Self::new(roster.data, log.data, store), warnings))
    }

    /// Build a ledger from already loaded data.
    pub fn new(roster: Roster, log: AttendanceLog, store: JsonStore) -> Self {
        Self { roster, log, store }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn log(&self) -> &AttendanceLog {
        &self.log
    }

    /// Record a class's statuses for a date, replacing any earlier record for
    /// the same date and class, then save the log.
    ///
    /// If the save fails the record stays applied in memory and the save error
    /// is returned.
    pub fn record_day(
        &mut self,
        class: &str,
        date: NaiveDate,
        statuses: BTreeMap<String, AttendanceStatus>,
    ) -> Result<()> {
        let roster_students = self.students_of(class)?;

        let orphaned = statuses
            .keys()
            .filter(|student| !roster_students.contains(*student))
            .count();
        if orphaned > 0 {
            debug!(
                "{} statuses for {} on {} name students outside the roster",
                orphaned, class, date
            );
        }

        self.log
            .insert(date, class, DailyClassRecord::from_statuses(statuses));
        info!("Recorded attendance for {} on {}", class, date);

        self.store.save_log(&self.log)
    }

    /// Class names in roster order.
    pub fn classes_of(&self) -> Vec<String> {
        self.roster.class_names().map(String::from).collect()
    }

    /// Students of a class in roster order.
    pub fn students_of(&self, class: &str) -> Result<&[String]> {
        self.roster
            .students(class)
            .ok_or_else(|| AttendanceError::UnknownClass(class.to_string()))
    }

    /// Records stored for a date; empty when nothing was recorded.
    pub fn records_on(&self, date: NaiveDate) -> DayRecords {
        self.log.day(date).cloned().unwrap_or_default()
    }

    /// Every well-formed date present in the log.
    pub fn all_dates(&self) -> BTreeSet<NaiveDate> {
        self.log.dates()
    }

    /// Fail with `UnknownClass` unless `class` is on the roster.
    pub fn ensure_class(&self, class: &str) -> Result<()> {
        self.students_of(class).map(|_| ())
    }

    /// Fail unless `student` is on the roster of `class`.
    pub fn ensure_student(&self, class: &str, student: &str) -> Result<()> {
        if self.students_of(class)?.iter().any(|s| s == student) {
            Ok(())
        } else {
            Err(AttendanceError::UnknownStudent {
                class: class.to_string(),
                student: student.to_string(),
            })
        }
    }

    /// Build the status map for [`Ledger::record_day`]: every roster student
    /// starts at the bulk-fill status, then `overrides` are applied.
    pub fn fill_statuses(
        &self,
        class: &str,
        fill: BulkFill,
        overrides: &[(String, AttendanceStatus)],
    ) -> Result<BTreeMap<String, AttendanceStatus>> {
        let initial = fill.initial_status();
        let mut statuses: BTreeMap<String, AttendanceStatus> = self
            .students_of(class)?
            .iter()
            .map(|student| (student.clone(), initial))
            .collect();

        for (student, status) in overrides {
            match statuses.get_mut(student) {
                Some(slot) => *slot = *status,
                None => {
                    return Err(AttendanceError::UnknownStudent {
                        class: class.to_string(),
                        student: student.clone(),
                    })
                }
            }
        }

        Ok(statuses)
    }
}
