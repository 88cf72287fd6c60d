//! Inspect command for reporting what an activity file contains.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use rt_core::{ActivityMessage, MessageVisitor, RecordMessage, SessionMessage};

/// Counts messages per kind without interpreting them.
#[derive(Debug, Default)]
struct CountingVisitor {
    records: u64,
    sessions: u64,
    activities: u64,
}

impl MessageVisitor for CountingVisitor {
    fn visit_record(&mut self, _record: RecordMessage) {
        self.records += 1;
    }

    fn visit_session(&mut self, _session: SessionMessage) {
        self.sessions += 1;
    }

    fn visit_activity(&mut self, _activity: ActivityMessage) {
        self.activities += 1;
    }

    fn on_complete(&mut self) {}
}

pub fn run<W: Write>(writer: &mut W, file: &Path) -> Result<()> {
    let mut counts = CountingVisitor::default();
    rt_fit::extract_messages(file, &mut counts)
        .with_context(|| format!("failed to decode {}", file.display()))?;

    writeln!(writer, "File:       {}", file.display())?;
    writeln!(writer, "Records:    {}", counts.records)?;
    writeln!(writer, "Sessions:   {}", counts.sessions)?;
    writeln!(writer, "Activities: {}", counts.activities)?;
    Ok(())
}
