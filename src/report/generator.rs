//! Markdown and JSON rendering of report rows.

use super::queries::{
    AwardStanding, DailyReport, MonthlyAnalytics, MonthlyClassSummary, StudentProgress,
    StudentReport, YearEndAwards,
};
use crate::error::Result;
use crate::ledger::Ledger;
use crate::models::{MonthRate, Tally};
use chrono::Month;
use serde::{Deserialize, Serialize};

/// Output format for rendered reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown tables (default)
    #[default]
    Markdown,
    /// Pretty-printed JSON
    Json,
}

/// Reports that can be rendered as Markdown.
pub trait ToMarkdown {
    fn to_markdown(&self) -> String;
}

/// Render a report in the requested format.
pub fn render<T: ToMarkdown + Serialize>(report: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(report.to_markdown()),
        OutputFormat::Json => generate_json_report(report),
    }
}

/// Generate a JSON report.
pub fn generate_json_report<T: Serialize>(report: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Name of a month number, falling back to `Month N`.
pub fn month_name(month: u32) -> String {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name().to_string())
        .unwrap_or_else(|| format!("Month {}", month))
}

fn pct(rate: f64) -> String {
    format!("{:.1}%", rate)
}

fn tally_table_header(first: &str) -> String {
    format!(
        "| {} | Present | Absent | Late | **Total** |\n|:---|:---:|:---:|:---:|:---:|\n",
        first
    )
}

fn tally_table_row(label: &str, tally: &Tally) -> String {
    format!(
        "| {} | {} | {} | {} | **{}** |\n",
        label, tally.present, tally.absent, tally.late, tally.total
    )
}

fn month_rate_line(label: &str, month: &MonthRate) -> String {
    format!(
        "- **{}:** {} ({})\n",
        label,
        month_name(month.month),
        pct(month.rate)
    )
}

impl ToMarkdown for DailyReport {
    fn to_markdown(&self) -> String {
        let mut output = format!("# Daily Attendance: {}\n\n", self.date);

        if self.classes.is_empty() {
            output.push_str("No attendance records found for this date.\n");
            return output;
        }

        for (class, rows) in &self.classes {
            output.push_str(&format!("## {}\n\n", class));
            output.push_str("| Student | Status |\n|:---|:---:|\n");
            for row in rows {
                output.push_str(&format!("| {} | {} |\n", row.student, row.status));
            }
            output.push('\n');
        }

        output
    }
}

impl ToMarkdown for StudentReport {
    fn to_markdown(&self) -> String {
        let mut output = format!("# Attendance Report: {} ({})\n\n", self.student, self.class);

        if self.records.is_empty() {
            output.push_str(&format!(
                "No attendance records found for {}.\n",
                self.student
            ));
            return output;
        }

        output.push_str("## Summary\n\n");
        output.push_str(&tally_table_header("Student"));
        output.push_str(&tally_table_row(&self.student, &self.counts));
        output.push('\n');
        output.push_str(&format!(
            "- **Present:** {}\n- **Absent:** {}\n- **Late:** {}\n\n",
            pct(self.present_pct),
            pct(self.absent_pct),
            pct(self.late_pct)
        ));

        output.push_str("## History\n\n");
        output.push_str("| Date | Status |\n|:---|:---:|\n");
        for record in &self.records {
            output.push_str(&format!("| {} | {} |\n", record.date, record.status));
        }

        output
    }
}

impl ToMarkdown for MonthlyClassSummary {
    fn to_markdown(&self) -> String {
        let mut output = format!(
            "# Monthly Report: {} {}\n\n",
            month_name(self.month),
            self.year
        );

        if self.classes.is_empty() {
            output.push_str(&format!(
                "No records found for {}/{}.\n",
                self.month, self.year
            ));
            return output;
        }

        output.push_str(&tally_table_header("Class"));
        for (class, tally) in &self.classes {
            output.push_str(&tally_table_row(class, tally));
        }

        output
    }
}

impl ToMarkdown for MonthlyAnalytics {
    fn to_markdown(&self) -> String {
        let mut output = format!("# Monthly Analytics: {} ({})\n\n", self.class, self.year);

        if self.months.is_empty() {
            output.push_str(&format!(
                "No data found for {} in {}.\n",
                self.class, self.year
            ));
            return output;
        }

        output.push_str(
            "| Month | Present | Absent | Late | Total | Rate |\n|:---|:---:|:---:|:---:|:---:|:---:|\n",
        );
        for row in &self.months {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                month_name(row.month),
                row.counts.present,
                row.counts.absent,
                row.counts.late,
                row.counts.total,
                pct(row.rate)
            ));
        }
        output.push('\n');

        if let Some(ref best) = self.best {
            output.push_str(&month_rate_line("Best Month", best));
        }
        if let Some(ref worst) = self.worst {
            output.push_str(&month_rate_line("Worst Month", worst));
        }

        output
    }
}

impl ToMarkdown for StudentProgress {
    fn to_markdown(&self) -> String {
        let mut output = format!(
            "# Student Progress: {} ({}, {})\n\n",
            self.student, self.class, self.year
        );

        if self.months.is_empty() {
            output.push_str(&format!(
                "No attendance records found for {}.\n",
                self.student
            ));
            return output;
        }

        output.push_str(
            "| Month | Rate | Days Present | Days Recorded |\n|:---|:---:|:---:|:---:|\n",
        );
        for row in &self.months {
            output.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                month_name(row.month),
                pct(row.rate.rate),
                row.rate.present_days,
                row.rate.total_days
            ));
        }
        output.push('\n');

        if let Some(rate) = self.current_month_rate {
            output.push_str(&format!("- **Current Month Attendance:** {}\n", pct(rate)));
        }
        output.push_str(&format!(
            "- **Overall Annual Attendance:** {}\n",
            pct(self.annual_rate)
        ));

        output
    }
}

fn generate_award_section(standing: &AwardStanding) -> String {
    let mut section = format!("## {}\n\n", standing.label);

    if standing.winners.is_empty() {
        section.push_str(&format!("No students qualified for {}.\n\n", standing.label));
        return section;
    }

    section.push_str(
        "| Class | Student | Attendance Rate | Days Present | Total Days |\n|:---|:---|:---:|:---:|:---:|\n",
    );
    for winner in &standing.winners {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            winner.class,
            winner.student,
            pct(winner.rate),
            winner.present_days,
            winner.total_days
        ));
    }
    section.push('\n');

    section
}

impl ToMarkdown for YearEndAwards {
    fn to_markdown(&self) -> String {
        let mut output = format!("# Year-End Awards {}\n\n", self.year);
        output.push_str(&format!(
            "*Students need at least {} recorded days to qualify.*\n\n",
            self.min_days
        ));

        for standing in &self.tiers {
            output.push_str(&generate_award_section(standing));
        }

        output
    }
}

/// Roster listing used by the `classes` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassListing {
    pub classes: Vec<ClassEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub class: String,
    pub students: Vec<String>,
}

impl ClassListing {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        Self {
            classes: ledger
                .roster()
                .iter()
                .map(|(class, students)| ClassEntry {
                    class: class.to_string(),
                    students: students.to_vec(),
                })
                .collect(),
        }
    }
}

impl ToMarkdown for ClassListing {
    fn to_markdown(&self) -> String {
        let mut output = String::from("# Classes\n\n");

        if self.classes.is_empty() {
            output.push_str("No students data found.\n");
            return output;
        }

        for entry in &self.classes {
            output.push_str(&format!(
                "- **{}** ({} students): {}\n",
                entry.class,
                entry.students.len(),
                entry.students.join(", ")
            ));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::{date, sample_ledger, statuses};
    use crate::models::AttendanceStatus::{Absent, Present};
    use crate::report::Reports;
    use tempfile::TempDir;

    fn sample() -> (TempDir, Ledger) {
        let dir = TempDir::new().unwrap();
        let mut ledger = sample_ledger(&dir);
        ledger
            .record_day(
                "ClassA",
                date(2024, 3, 1),
                statuses(&[("Alice", Present), ("Bob", Absent)]),
            )
            .unwrap();
        ledger
            .record_day(
                "ClassA",
                date(2024, 3, 2),
                statuses(&[("Alice", Present), ("Bob", Present)]),
            )
            .unwrap();
        (dir, ledger)
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(3), "March");
        assert_eq!(month_name(13), "Month 13");
    }

    #[test]
    fn test_daily_markdown() {
        let (_dir, ledger) = sample();
        let markdown = Reports::new(&ledger)
            .daily_report(date(2024, 3, 1))
            .to_markdown();

        assert!(markdown.contains("# Daily Attendance: 2024-03-01"));
        assert!(markdown.contains("## ClassA"));
        assert!(markdown.contains("| Bob | Absent |"));
    }

    #[test]
    fn test_analytics_markdown() {
        let (_dir, ledger) = sample();
        let markdown = Reports::new(&ledger)
            .monthly_analytics("ClassA", 2024)
            .unwrap()
            .to_markdown();

        assert!(markdown.contains("| March | 3 | 1 | 0 | 4 | 75.0% |"));
        assert!(markdown.contains("**Best Month:** March (75.0%)"));
    }

    #[test]
    fn test_awards_markdown_without_winners() {
        let (_dir, ledger) = sample();
        let markdown = Reports::new(&ledger).year_end_awards(2024).to_markdown();

        assert!(markdown.contains("at least 50 recorded days"));
        assert!(markdown.contains("No students qualified for Platinum Award (100% Attendance)"));
    }

    #[test]
    fn test_json_rendering() {
        let (_dir, ledger) = sample();
        let summary = Reports::new(&ledger).monthly_class_summary(2024, 3);
        let json = render(&summary, OutputFormat::Json).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["classes"]["ClassA"]["present"], 3);
        assert_eq!(value["classes"]["ClassA"]["total"], 4);
    }

    #[test]
    fn test_monthly_tally_json_is_flat() {
        let (_dir, ledger) = sample();
        let analytics = Reports::new(&ledger).monthly_analytics("ClassA", 2024).unwrap();
        let json = generate_json_report(&analytics).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["months"][0]["month"], 3);
        assert_eq!(value["months"][0]["present"], 3);
        assert_eq!(value["months"][0]["rate"], 75.0);
    }

    #[test]
    fn test_class_listing() {
        let (_dir, ledger) = sample();
        let listing = ClassListing::from_ledger(&ledger);

        assert_eq!(listing.classes.len(), 1);
        assert!(listing
            .to_markdown()
            .contains("- **ClassA** (2 students): Alice, Bob"));
    }
}
