//! JSON file storage for the roster and attendance log.

use crate::error::{AttendanceError, Result};
use crate::models::{AttendanceLog, Roster};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// A loaded document plus the warning raised if it had to be substituted.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub data: T,
    /// Set when the file was missing and an empty document was used instead.
    pub warning: Option<String>,
}

/// Reads and writes the two JSON documents.
#[derive(Debug, Clone)]
pub struct JsonStore {
    roster_path: PathBuf,
    attendance_path: PathBuf,
}

impl JsonStore {
    /// Create a store over the given roster and attendance document paths.
    pub fn new(roster_path: impl Into<PathBuf>, attendance_path: impl Into<PathBuf>) -> Self {
        Self {
            roster_path: roster_path.into(),
            attendance_path: attendance_path.into(),
        }
    }

    pub fn roster_path(&self) -> &Path {
        &self.roster_path
    }

    pub fn attendance_path(&self) -> &Path {
        &self.attendance_path
    }

    /// Load the roster. A missing file yields an empty roster and a warning.
    pub fn load_roster(&self) -> Result<Loaded<Roster>> {
        load_document(&self.roster_path, "Students")
    }

    /// Load the attendance log. A missing file yields an empty log and a warning.
    pub fn load_log(&self) -> Result<Loaded<AttendanceLog>> {
        load_document(&self.attendance_path, "Attendance")
    }

    /// Replace the attendance document with `log`.
    ///
    /// The new content goes to a temporary file in the same directory which is
    /// then renamed over the target, so a failed save leaves the previous
    /// document intact.
    pub fn save_log(&self, log: &AttendanceLog) -> Result<()> {
        write_document(&self.attendance_path, log)?;
        info!(
            "Saved {} attendance days to {}",
            log.len(),
            self.attendance_path.display()
        );
        Ok(())
    }

    /// Replace the roster document.
    pub fn save_roster(&self, roster: &Roster) -> Result<()> {
        write_document(&self.roster_path, roster)
    }
}

fn load_document<T>(path: &Path, label: &str) -> Result<Loaded<T>>
where
    T: DeserializeOwned + Default,
{
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let data = serde_json::from_str(&content).map_err(|source| AttendanceError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
            debug!("Loaded {}", path.display());
            Ok(Loaded {
                data,
                warning: None,
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let warning = format!(
                "{} file not found ({}). Starting with empty {} records.",
                label,
                path.display(),
                label.to_lowercase()
            );
            warn!("{}", warning);
            Ok(Loaded {
                data: T::default(),
                warning: Some(warning),
            })
        }
        Err(source) => Err(AttendanceError::Load {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    buf.push(b'\n');

    let save_error = |source: std::io::Error| AttendanceError::Save {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(save_error)?;
    tmp.write_all(&buf).map_err(save_error)?;
    tmp.as_file().sync_all().map_err(save_error)?;

    // Temp files are created 0600; keep the mode of the document being replaced.
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(save_error)?;
    }

    tmp.persist(path).map_err(|e| save_error(e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, DailyClassRecord};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonStore {
        JsonStore::new(
            dir.path().join("students.json"),
            dir.path().join("records.json"),
        )
    }

    fn sample_log() -> AttendanceLog {
        let mut log = AttendanceLog::new();
        let statuses: BTreeMap<_, _> = [
            ("Alice".to_string(), AttendanceStatus::Present),
            ("Bob".to_string(), AttendanceStatus::Late),
        ]
        .into();
        log.insert(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "ClassA",
            DailyClassRecord::from_statuses(statuses),
        );
        log
    }

    #[test]
    fn test_missing_files_are_not_fatal() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let roster = store.load_roster().unwrap();
        assert!(roster.data.is_empty());
        assert!(roster.warning.unwrap().contains("not found"));

        let log = store.load_log().unwrap();
        assert!(log.data.is_empty());
        assert!(log.warning.is_some());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let log = sample_log();

        store.save_log(&log).unwrap();
        let loaded = store.load_log().unwrap();

        assert!(loaded.warning.is_none());
        assert_eq!(loaded.data, log);
    }

    #[test]
    fn test_saved_document_layout() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save_log(&sample_log()).unwrap();

        let content = std::fs::read_to_string(store.attendance_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["2024-03-01"]["ClassA"]["Bob"], "Late");
        assert!(content.contains("\n    \"2024-03-01\""));
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.roster_path(), "{ not json").unwrap();

        let err = store.load_roster().unwrap_err();
        assert!(matches!(err, AttendanceError::Parse { .. }));
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(
            dir.path().join("students.json"),
            dir.path().join("missing").join("records.json"),
        );

        let err = store.save_log(&sample_log()).unwrap_err();
        assert!(matches!(err, AttendanceError::Save { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_save_keeps_existing_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save_log(&sample_log()).unwrap();

        std::fs::set_permissions(
            store.attendance_path(),
            std::fs::Permissions::from_mode(0o644),
        )
        .unwrap();
        store.save_log(&sample_log()).unwrap();

        let mode = std::fs::metadata(store.attendance_path())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_failed_save_keeps_previous_document() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save_log(&sample_log()).unwrap();
        let before = std::fs::read_to_string(store.attendance_path()).unwrap();

        // Renaming a file over a non-empty directory fails.
        let blocked = JsonStore::new(
            store.roster_path().to_path_buf(),
            dir.path().to_path_buf(),
        );
        assert!(blocked.save_log(&AttendanceLog::new()).is_err());

        let after = std::fs::read_to_string(store.attendance_path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_roster_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let roster = Roster::new(vec![
            ("ClassB".to_string(), vec!["Zed".to_string(), "Amy".to_string()]),
            ("ClassA".to_string(), vec!["Alice".to_string()]),
        ])
        .unwrap();

        store.save_roster(&roster).unwrap();
        assert_eq!(store.load_roster().unwrap().data, roster);
    }
}
