//! Summary command for extracting and printing one run.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Duration;

use rt_core::Run;

pub fn run<W: Write>(writer: &mut W, file: &Path, json: bool) -> Result<()> {
    let extracted = rt_fit::extract_run(file)
        .with_context(|| format!("failed to extract run from {}", file.display()))?;

    let Some(run) = extracted else {
        writeln!(writer, "No completed run found in {}", file.display())?;
        return Ok(());
    };

    if json {
        let rendered = serde_json::to_string_pretty(&run)?;
        writeln!(writer, "{rendered}")?;
    } else {
        write_human(writer, &run)?;
    }
    Ok(())
}

fn write_human<W: Write>(writer: &mut W, run: &Run) -> Result<()> {
    writeln!(writer, "Id:                 {}", run.id)?;
    writeln!(
        writer,
        "Start time:         {}",
        run.start_time.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(writer, "Duration:           {}", format_duration(run.duration))?;
    writeln!(writer, "Distance:           {:.2} km", run.distance_km)?;
    writeln!(writer, "Average heart rate: {} bpm", run.average_heart_rate)?;
    writeln!(writer, "Average pace:       {} /km", format_pace(run.average_pace))?;
    Ok(())
}

/// Formats a duration as `h:mm:ss`.
fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

/// Formats a pace as `m:ss`.
fn format_pace(pace: Duration) -> String {
    let total_seconds = pace.num_seconds().max(0);
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use insta::assert_snapshot;

    use super::*;

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample.fit")
    }

    /// Drops the identity line, which differs on every extraction.
    fn without_id_line(output: &str) -> String {
        output
            .lines()
            .filter(|line| !line.starts_with("Id:"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn summary_command_prints_run_fields() {
        let mut output = Vec::new();
        run(&mut output, &fixture(), false).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("Id:"));
        assert_snapshot!(without_id_line(&output), @r"
        Start time:         2021-07-20 22:11:21 UTC
        Duration:           1:00:01
        Distance:           3.60 km
        Average heart rate: 126 bpm
        Average pace:       16:40 /km
        ");
    }

    #[test]
    fn summary_command_emits_json() {
        let mut output = Vec::new();
        run(&mut output, &fixture(), true).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed["start_time"], "2021-07-20T22:11:21Z");
        assert_eq!(parsed["duration"], 3601.0);
        assert_eq!(parsed["average_heart_rate"], 126);
        assert!(parsed["id"].as_str().is_some());
        assert!((parsed["distance_km"].as_f64().unwrap() - 3.6).abs() < 1e-9);
    }

    #[test]
    fn summary_command_reports_absent_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty-activity.fit");
        // A valid FIT container with no messages at all: a 14-byte header,
        // an empty record section, and the matching checksum.
        let mut bytes = vec![14, 0x10];
        bytes.extend_from_slice(&2195u16.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(b".FIT");
        let header_crc = rt_fit::crc::checksum(&bytes[..12]);
        bytes.extend_from_slice(&header_crc.to_le_bytes());
        let file_crc = rt_fit::crc::checksum(&bytes);
        bytes.extend_from_slice(&file_crc.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let mut output = Vec::new();
        run(&mut output, &path, false).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("No completed run found in "));
    }

    #[test]
    fn summary_command_propagates_format_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.txt");
        std::fs::write(&path, "This is not a FIT file").unwrap();

        let mut output = Vec::new();
        let err = run(&mut output, &path, false).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("Not a valid FIT file"));
    }

    #[test]
    fn durations_format_as_hours_minutes_seconds() {
        assert_eq!(format_duration(Duration::seconds(3601)), "1:00:01");
        assert_eq!(format_duration(Duration::seconds(59)), "0:00:59");
        assert_eq!(format_duration(Duration::zero()), "0:00:00");
    }

    #[test]
    fn paces_format_as_minutes_seconds() {
        assert_eq!(format_pace(Duration::seconds(1000)), "16:40");
        assert_eq!(format_pace(Duration::zero()), "0:00");
    }
}
