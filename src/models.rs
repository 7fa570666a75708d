//! Data models for the attendance ledger.
//!
//! This module contains the persisted structures (roster and attendance log)
//! and the derived count/rate rows produced by the aggregation engine.

use crate::error::AttendanceError;
use chrono::{Datelike, NaiveDate};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Date format used for attendance log keys.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Attendance status of one student on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttendanceStatus::Present => write!(f, "Present"),
            AttendanceStatus::Absent => write!(f, "Absent"),
            AttendanceStatus::Late => write!(f, "Late"),
        }
    }
}

/// A status value as stored in the attendance document.
///
/// Values other than the three known statuses are kept verbatim so they
/// survive a load/save cycle; aggregation ignores them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusEntry {
    Known(AttendanceStatus),
    Unrecognized(String),
}

impl StatusEntry {
    /// Returns the status if it is one of the known values.
    pub fn status(&self) -> Option<AttendanceStatus> {
        match self {
            StatusEntry::Known(status) => Some(*status),
            StatusEntry::Unrecognized(_) => None,
        }
    }
}

impl From<AttendanceStatus> for StatusEntry {
    fn from(status: AttendanceStatus) -> Self {
        StatusEntry::Known(status)
    }
}

impl fmt::Display for StatusEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEntry::Known(status) => write!(f, "{}", status),
            StatusEntry::Unrecognized(raw) => write!(f, "{}", raw),
        }
    }
}

/// Class names mapped to their enrolled students, in document order.
///
/// Class names are unique, and student names are unique within a class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    classes: Vec<(String, Vec<String>)>,
}

impl Roster {
    /// Builds a roster, rejecting duplicate classes or duplicate students.
    pub fn new(classes: Vec<(String, Vec<String>)>) -> Result<Self, AttendanceError> {
        let mut seen_classes = HashSet::new();

        for (class, students) in &classes {
            if !seen_classes.insert(class.as_str()) {
                return Err(AttendanceError::DuplicateClass(class.clone()));
            }

            let mut seen_students = HashSet::new();
            for student in students {
                if !seen_students.insert(student.as_str()) {
                    return Err(AttendanceError::DuplicateStudent {
                        class: class.clone(),
                        student: student.clone(),
                    });
                }
            }
        }

        Ok(Self { classes })
    }

    /// Class names in roster order.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|(class, _)| class.as_str())
    }

    /// Students of a class in roster order, or `None` if the class is unknown.
    pub fn students(&self, class: &str) -> Option<&[String]> {
        self.classes
            .iter()
            .find(|(name, _)| name == class)
            .map(|(_, students)| students.as_slice())
    }

    /// Iterate over `(class, students)` pairs in roster order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.classes
            .iter()
            .map(|(class, students)| (class.as_str(), students.as_slice()))
    }

    pub fn contains_class(&self, class: &str) -> bool {
        self.students(class).is_some()
    }

    pub fn is_enrolled(&self, class: &str, student: &str) -> bool {
        self.students(class)
            .map(|students| students.iter().any(|s| s == student))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }
}

impl Serialize for Roster {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.classes.len()))?;
        for (class, students) in &self.classes {
            map.serialize_entry(class, students)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Roster {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RosterVisitor;

        impl<'de> Visitor<'de> for RosterVisitor {
            type Value = Vec<(String, Vec<String>)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of class names to lists of student names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut classes = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((class, students)) = map.next_entry::<String, Vec<String>>()? {
                    classes.push((class, students));
                }
                Ok(classes)
            }
        }

        let classes = deserializer.deserialize_map(RosterVisitor)?;
        Roster::new(classes).map_err(serde::de::Error::custom)
    }
}

/// Statuses of one class on one date, keyed by student name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyClassRecord {
    entries: BTreeMap<String, StatusEntry>,
}

impl DailyClassRecord {
    /// Builds a record from known statuses.
    pub fn from_statuses(statuses: BTreeMap<String, AttendanceStatus>) -> Self {
        Self {
            entries: statuses
                .into_iter()
                .map(|(student, status)| (student, StatusEntry::from(status)))
                .collect(),
        }
    }

    pub fn get(&self, student: &str) -> Option<&StatusEntry> {
        self.entries.get(student)
    }

    /// Known status of a student, `None` if absent from the record or unrecognized.
    pub fn status_of(&self, student: &str) -> Option<AttendanceStatus> {
        self.entries.get(student).and_then(StatusEntry::status)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatusEntry)> {
        self.entries
            .iter()
            .map(|(student, entry)| (student.as_str(), entry))
    }

    /// The known statuses in this record, dropping unrecognized values.
    pub fn statuses(&self) -> BTreeMap<String, AttendanceStatus> {
        self.entries
            .iter()
            .filter_map(|(student, entry)| entry.status().map(|s| (student.clone(), s)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Classes recorded on a single date.
pub type DayRecords = BTreeMap<String, DailyClassRecord>;

/// Date-indexed attendance records: date -> class -> student -> status.
///
/// Keys that parse as `YYYY-MM-DD` are rewritten to the zero-padded form on
/// load, so one calendar date has one key. Keys that do not parse are kept
/// verbatim and retained on save, but never match a date query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AttendanceLog {
    days: BTreeMap<String, DayRecords>,
}

impl<'de> Deserialize<'de> for AttendanceLog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LogVisitor;

        impl<'de> Visitor<'de> for LogVisitor {
            type Value = AttendanceLog;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of dates to class attendance records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut days: BTreeMap<String, DayRecords> = BTreeMap::new();

                // Later entries for the same date win, class by class.
                while let Some((key, classes)) = map.next_entry::<String, DayRecords>()? {
                    match NaiveDate::parse_from_str(&key, DATE_FORMAT) {
                        Ok(date) => days
                            .entry(AttendanceLog::date_key(date))
                            .or_default()
                            .extend(classes),
                        Err(_) => {
                            days.insert(key, classes);
                        }
                    }
                }

                Ok(AttendanceLog { days })
            }
        }

        deserializer.deserialize_map(LogVisitor)
    }
}

impl AttendanceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical key for a date.
    pub fn date_key(date: NaiveDate) -> String {
        date.format(DATE_FORMAT).to_string()
    }

    /// Insert or overwrite the record for `(date, class)`.
    pub fn insert(&mut self, date: NaiveDate, class: &str, record: DailyClassRecord) {
        self.days
            .entry(Self::date_key(date))
            .or_default()
            .insert(class.to_string(), record);
    }

    /// Records for a date, if any were stored.
    pub fn day(&self, date: NaiveDate) -> Option<&DayRecords> {
        self.days.get(&Self::date_key(date))
    }

    /// Iterate over entries whose key parses as a date, in key order.
    /// Malformed keys are skipped.
    pub fn dated(&self) -> impl Iterator<Item = (NaiveDate, &DayRecords)> {
        self.days.iter().filter_map(|(key, classes)| {
            NaiveDate::parse_from_str(key, DATE_FORMAT)
                .ok()
                .map(|date| (date, classes))
        })
    }

    /// Dated entries falling in the given year.
    pub fn in_year(&self, year: i32) -> impl Iterator<Item = (NaiveDate, &DayRecords)> {
        self.dated().filter(move |(date, _)| date.year() == year)
    }

    /// Dated entries falling in the given year and month.
    pub fn in_month(
        &self,
        year: i32,
        month: u32,
    ) -> impl Iterator<Item = (NaiveDate, &DayRecords)> {
        self.in_year(year).filter(move |(date, _)| date.month() == month)
    }

    /// All well-formed dates present in the log.
    pub fn dates(&self) -> BTreeSet<NaiveDate> {
        self.dated().map(|(date, _)| date).collect()
    }

    /// Number of date keys, including malformed ones.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Bulk-fill mode used to seed a day's statuses before per-student overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulkFill {
    AllPresent,
    AllAbsent,
    /// Leave the default, which is present.
    #[default]
    Default,
}

impl BulkFill {
    pub fn initial_status(&self) -> AttendanceStatus {
        match self {
            BulkFill::AllPresent | BulkFill::Default => AttendanceStatus::Present,
            BulkFill::AllAbsent => AttendanceStatus::Absent,
        }
    }
}

/// Year-end award tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AwardTier {
    Platinum,
    Gold,
    Silver,
}

impl AwardTier {
    /// All tiers, highest first.
    pub const ALL: [AwardTier; 3] = [AwardTier::Platinum, AwardTier::Gold, AwardTier::Silver];

    /// Minimum attendance rate (percent) for the tier.
    pub fn threshold(&self) -> f64 {
        match self {
            AwardTier::Platinum => 100.0,
            AwardTier::Gold => 95.0,
            AwardTier::Silver => 90.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AwardTier::Platinum => "Platinum Award (100% Attendance)",
            AwardTier::Gold => "Gold Award (95%+ Attendance)",
            AwardTier::Silver => "Silver Award (90%+ Attendance)",
        }
    }
}

impl fmt::Display for AwardTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AwardTier::Platinum => write!(f, "Platinum"),
            AwardTier::Gold => write!(f, "Gold"),
            AwardTier::Silver => write!(f, "Silver"),
        }
    }
}

/// Present/absent/late counts. `total` is always the sum of the three.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub total: usize,
}

impl Tally {
    pub fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Late => self.late += 1,
        }
        self.total += 1;
    }

    pub fn merge(&mut self, other: &Tally) {
        self.present += other.present;
        self.absent += other.absent;
        self.late += other.late;
        self.total += other.total;
    }
}

/// Counts for one class over one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTally {
    pub month: u32,
    #[serde(flatten)]
    pub counts: Tally,
    /// Attendance rate in percent.
    pub rate: f64,
    /// Dates in the month on which the class has a record.
    pub days_recorded: usize,
}

/// A student's attendance over a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StudentRate {
    pub present_days: usize,
    pub total_days: usize,
    /// Attendance rate in percent.
    pub rate: f64,
}

/// Month number with its rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthRate {
    pub month: u32,
    pub rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_roster_preserves_document_order() {
        let json = r#"{"Zeta": ["Yan", "Abe"], "Alpha": ["Cy"]}"#;
        let roster: Roster = serde_json::from_str(json).unwrap();

        let classes: Vec<_> = roster.class_names().collect();
        assert_eq!(classes, vec!["Zeta", "Alpha"]);
        assert_eq!(
            roster.students("Zeta").unwrap(),
            &["Yan".to_string(), "Abe".to_string()]
        );

        let back = serde_json::to_string(&roster).unwrap();
        assert_eq!(back, r#"{"Zeta":["Yan","Abe"],"Alpha":["Cy"]}"#);
    }

    #[test]
    fn test_roster_rejects_duplicates() {
        let err = Roster::new(vec![
            ("A".to_string(), vec![]),
            ("A".to_string(), vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, AttendanceError::DuplicateClass(c) if c == "A"));

        let json = r#"{"A": ["Bo", "Bo"]}"#;
        assert!(serde_json::from_str::<Roster>(json).is_err());
    }

    #[test]
    fn test_status_entry_keeps_unrecognized_values() {
        let json = r#"{"Alice": "Present", "Bob": "Excused"}"#;
        let record: DailyClassRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.status_of("Alice"), Some(AttendanceStatus::Present));
        assert_eq!(record.status_of("Bob"), None);
        assert_eq!(
            record.get("Bob"),
            Some(&StatusEntry::Unrecognized("Excused".to_string()))
        );
        assert_eq!(record.statuses().len(), 1);

        let back = serde_json::to_string(&record).unwrap();
        assert_eq!(back, r#"{"Alice":"Present","Bob":"Excused"}"#);
    }

    #[test]
    fn test_log_skips_malformed_dates() {
        let json = r#"{
            "2024-03-01": {"ClassA": {"Alice": "Present"}},
            "not-a-date": {"ClassA": {"Alice": "Absent"}},
            "2024-04-10": {"ClassA": {"Alice": "Late"}}
        }"#;
        let log: AttendanceLog = serde_json::from_str(json).unwrap();

        assert_eq!(log.len(), 3);
        assert_eq!(log.dates().len(), 2);
        assert_eq!(log.in_month(2024, 3).count(), 1);
        assert_eq!(log.in_year(2024).count(), 2);
        assert_eq!(log.in_year(2023).count(), 0);
    }

    #[test]
    fn test_log_normalizes_unpadded_dates() {
        let json = r#"{
            "2024-3-1": {"ClassA": {"Alice": "Absent"}, "ClassB": {"Cy": "Late"}},
            "2024-03-01": {"ClassA": {"Alice": "Present"}}
        }"#;
        let log: AttendanceLog = serde_json::from_str(json).unwrap();

        assert_eq!(log.len(), 1);
        let day = log.day(date(2024, 3, 1)).unwrap();
        assert_eq!(day["ClassA"].status_of("Alice"), Some(AttendanceStatus::Present));
        assert_eq!(day["ClassB"].status_of("Cy"), Some(AttendanceStatus::Late));

        let back = serde_json::to_value(&log).unwrap();
        assert!(back.get("2024-3-1").is_none());
        assert!(back.get("2024-03-01").is_some());
    }

    #[test]
    fn test_insert_after_load_overwrites_unpadded_key() {
        let json = r#"{"2024-3-1": {"ClassA": {"Alice": "Absent"}}}"#;
        let mut log: AttendanceLog = serde_json::from_str(json).unwrap();
        let statuses: BTreeMap<_, _> = [("Alice".to_string(), AttendanceStatus::Present)].into();

        log.insert(date(2024, 3, 1), "ClassA", DailyClassRecord::from_statuses(statuses));

        assert_eq!(log.len(), 1);
        assert_eq!(log.dated().count(), 1);
        assert_eq!(
            log.day(date(2024, 3, 1)).unwrap()["ClassA"].status_of("Alice"),
            Some(AttendanceStatus::Present)
        );
    }

    #[test]
    fn test_log_insert_overwrites() {
        let mut log = AttendanceLog::new();
        let day = date(2024, 3, 1);

        let first: BTreeMap<_, _> = [("Alice".to_string(), AttendanceStatus::Absent)].into();
        let second: BTreeMap<_, _> = [("Bob".to_string(), AttendanceStatus::Late)].into();
        log.insert(day, "ClassA", DailyClassRecord::from_statuses(first));
        log.insert(day, "ClassA", DailyClassRecord::from_statuses(second.clone()));

        let record = &log.day(day).unwrap()["ClassA"];
        assert_eq!(record.statuses(), second);
        assert_eq!(AttendanceLog::date_key(day), "2024-03-01");
    }

    #[test]
    fn test_tally_total_is_sum() {
        let mut tally = Tally::default();
        tally.add(AttendanceStatus::Present);
        tally.add(AttendanceStatus::Late);
        tally.add(AttendanceStatus::Absent);
        tally.add(AttendanceStatus::Present);

        assert_eq!(tally.present, 2);
        assert_eq!(tally.total, tally.present + tally.absent + tally.late);
    }

    #[test]
    fn test_award_thresholds() {
        assert_eq!(AwardTier::Platinum.threshold(), 100.0);
        assert_eq!(AwardTier::Gold.threshold(), 95.0);
        assert_eq!(AwardTier::Silver.threshold(), 90.0);
        assert_eq!(AwardTier::ALL[0], AwardTier::Platinum);
    }

    #[test]
    fn test_bulk_fill_defaults_to_present() {
        assert_eq!(BulkFill::default().initial_status(), AttendanceStatus::Present);
        assert_eq!(BulkFill::AllAbsent.initial_status(), AttendanceStatus::Absent);
    }
}
