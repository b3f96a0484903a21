use jobwatch_core::{MigrationRecord, Timestamp};

const HEADERS: [&str; 5] = ["ID", "STATUS", "STARTED", "COMPLETED", "DURATION"];

/// Render the history as a left-aligned text table, newest first.
pub fn format_history(records: &[MigrationRecord]) -> String {
    if records.is_empty() {
        return "No migrations yet.\n".to_string();
    }

    let rows: Vec<[String; 5]> = records.iter().map(format_row).collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(String::from), &widths);
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn format_row(record: &MigrationRecord) -> [String; 5] {
    [
        record.id.clone(),
        record.status.to_string(),
        format_timestamp(record.started_at.as_ref()),
        format_timestamp(record.completed_at.as_ref()),
        record
            .duration_ms()
            .map(format_duration_ms)
            .unwrap_or_else(|| "-".to_string()),
    ]
}

fn push_line(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

fn format_timestamp(ts: Option<&Timestamp>) -> String {
    ts.map(Timestamp::to_string)
        .unwrap_or_else(|| "-".to_string())
}

/// Milliseconds as seconds with one decimal place, e.g. `3000` -> `3.0s`.
pub fn format_duration_ms(ms: f64) -> String {
    format!("{:.1}s", ms / 1000.0)
}

#[cfg(test)]
mod tests {
    use jobwatch_core::MigrationStatus;

    use super::*;

    #[test]
    fn empty_history_has_placeholder() {
        assert_eq!(format_history(&[]), "No migrations yet.\n");
    }

    #[test]
    fn durations_render_in_seconds() {
        assert_eq!(format_duration_ms(3000.0), "3.0s");
        assert_eq!(format_duration_ms(1240.0), "1.2s");
        assert_eq!(format_duration_ms(3000.4), "3.0s");
        assert_eq!(format_duration_ms(0.0), "0.0s");
    }

    #[test]
    fn table_aligns_columns_and_marks_missing_fields() {
        let mut done = MigrationRecord::new("m1", MigrationStatus::Completed);
        done.started_at = Some(Timestamp::EpochMillis(0));
        done.completed_at = Some(Timestamp::EpochMillis(3000));
        done.duration = Some(3000.into());
        let running = MigrationRecord::new("m-long-id", MigrationStatus::Started);

        let table = format_history(&[running, done]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID         STATUS"));
        assert!(lines[1].starts_with("m-long-id  started"));
        assert!(lines[1].contains('-'));
        assert!(lines[2].starts_with("m1         completed"));
        assert!(lines[2].contains("1970-01-01 00:00:03 UTC"));
        assert!(lines[2].ends_with("3.0s"));
    }

    #[test]
    fn unknown_status_is_shown_verbatim() {
        let record = MigrationRecord::new("m9", MigrationStatus::Other("paused".into()));
        assert!(format_history(&[record]).contains("paused"));
    }
}
