use std::fmt::Write;

use serde::{Deserialize, Serialize};

use super::Payout;

/// Narrative lines under one heading (a zone name, "Arena" or "Cornucopia").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventGroup {
    pub heading: String,
    pub lines: Vec<String>,
}

/// Outcome of resolving one day.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayReport {
    pub day: u32,
    pub groups: Vec<EventGroup>,
    pub eliminated: Vec<String>,
    pub payouts: Vec<Payout>,
    pub shrunk_zone: Option<String>,
    pub feast_held: bool,
}

impl DayReport {
    pub fn new(day: u32) -> Self {
        Self {
            day,
            ..Self::default()
        }
    }

    /// Append a line under `heading`, keeping headings in first-seen order.
    pub fn push(&mut self, heading: &str, line: impl Into<String>) {
        let line = line.into();
        match self.groups.iter_mut().find(|group| group.heading == heading) {
            Some(group) => group.lines.push(line),
            None => self.groups.push(EventGroup {
                heading: heading.to_string(),
                lines: vec![line],
            }),
        }
    }

    pub fn group(&self, heading: &str) -> Option<&EventGroup> {
        self.groups.iter().find(|group| group.heading == heading)
    }

    pub fn line_count(&self) -> usize {
        self.groups.iter().map(|group| group.lines.len()).sum()
    }
}

impl EventGroup {
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.heading.len() + self.lines.len() * 48);
        let _ = writeln!(out, "== {} ==", self.heading);
        for line in &self.lines {
            let _ = writeln!(out, "- {line}");
        }
        out
    }
}
