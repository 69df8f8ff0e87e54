use std::fmt;

/// What happened to the stations of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub stations: usize,
    /// Commands the provider accepted.
    pub commands: usize,
    /// Stations whose command creation failed; never polled.
    pub rejected: usize,
    /// Stations whose records were published.
    pub published: usize,
    /// Commands abandoned after a permanent poll failure.
    pub failed: usize,
    /// Commands still pending when the pass budget ran out.
    pub abandoned: usize,
    /// Polling passes actually run.
    pub passes: u32,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} stations, {} commands, {} published, {} rejected, {} failed, {} abandoned after {} passes",
            self.stations,
            self.commands,
            self.published,
            self.rejected,
            self.failed,
            self.abandoned,
            self.passes
        )
    }
}

/// Totals over every batch of a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub batches: Vec<BatchReport>,
}

impl CycleReport {
    pub fn commands(&self) -> usize {
        self.batches.iter().map(|b| b.commands).sum()
    }

    pub fn published(&self) -> usize {
        self.batches.iter().map(|b| b.published).sum()
    }

    pub fn rejected(&self) -> usize {
        self.batches.iter().map(|b| b.rejected).sum()
    }

    pub fn failed(&self) -> usize {
        self.batches.iter().map(|b| b.failed).sum()
    }

    pub fn abandoned(&self) -> usize {
        self.batches.iter().map(|b| b.abandoned).sum()
    }

    pub fn stations(&self) -> usize {
        self.batches.iter().map(|b| b.stations).sum()
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} batches, {} stations, {} commands: {} published, {} rejected, {} failed, {} abandoned",
            self.batches.len(),
            self.stations(),
            self.commands(),
            self.published(),
            self.rejected(),
            self.failed(),
            self.abandoned()
        )
    }
}
