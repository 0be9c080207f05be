//! Run statistics collection and reporting.
//!
//! Tracks how much trace a run produced and how much of it was usable:
//! output lines, completed snapshots, parse diagnostics, and wall time.

use std::time::{Duration, Instant};

use crate::common::STAGE_COUNT;

/// Per-run counters.
///
/// Reset at the start of every run together with the parser and the store.
#[derive(Clone, Debug)]
pub struct RunStats {
    start_time: Instant,
    /// Lines of simulator output received.
    pub lines: u64,
    /// Snapshots appended to the store.
    pub snapshots: u64,
    /// Parse diagnostics recorded.
    pub diagnostics: u64,
    /// Cycle number of the first snapshot.
    pub first_cycle: Option<u64>,
    /// Cycle number of the most recent snapshot.
    pub last_cycle: Option<u64>,
    /// Invalid latches summed over all snapshots.
    pub bubbles: u64,
    /// Forwarding paths summed over all snapshots.
    pub forwarding_paths: u64,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            lines: 0,
            snapshots: 0,
            diagnostics: 0,
            first_cycle: None,
            last_cycle: None,
            bubbles: 0,
            forwarding_paths: 0,
        }
    }
}

impl RunStats {
    /// Records one appended snapshot.
    ///
    /// # Arguments
    ///
    /// * `cycle` - Cycle number of the snapshot.
    /// * `occupancy` - Number of valid latches in it.
    /// * `forwarding` - Number of forwarding paths it carries.
    pub fn record_snapshot(&mut self, cycle: u64, occupancy: usize, forwarding: usize) {
        self.snapshots += 1;
        self.first_cycle.get_or_insert(cycle);
        self.last_cycle = Some(cycle);
        self.bubbles += (STAGE_COUNT - occupancy.min(STAGE_COUNT)) as u64;
        self.forwarding_paths += forwarding as u64;
    }

    /// Forgets snapshot and diagnostic counts but keeps line count and start time.
    pub fn clear_history(&mut self) {
        self.snapshots = 0;
        self.diagnostics = 0;
        self.first_cycle = None;
        self.last_cycle = None;
        self.bubbles = 0;
        self.forwarding_paths = 0;
    }

    /// Time since the counters were reset.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// One-line summary for status bars and logs.
    pub fn summary(&self) -> String {
        format!(
            "{} lines, {} snapshots, {} diagnostics in {:.2}s",
            self.lines,
            self.snapshots,
            self.diagnostics,
            self.elapsed().as_secs_f64()
        )
    }

    /// Prints a formatted report of all counters.
    ///
    /// Displays trace volume, snapshot coverage, pipeline occupancy, and
    /// wall time in a human-readable format.
    pub fn print(&self) {
        let seconds = self.elapsed().as_secs_f64();
        let snaps = if self.snapshots == 0 { 1 } else { self.snapshots };
        let slots = snaps * STAGE_COUNT as u64;

        let lines_per_sec = if seconds > 0.0 {
            self.lines as f64 / seconds
        } else {
            0.0
        };
        let occupancy = if self.snapshots == 0 {
            0.0
        } else {
            100.0 - (self.bubbles as f64 / slots as f64) * 100.0
        };
        let cycles = match (self.first_cycle, self.last_cycle) {
            (Some(first), Some(last)) => format!("{first}..={last}"),
            _ => "-".to_string(),
        };

        println!("\n==========================================================");
        println!("PIPELINE TRACE STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);
        println!("trace_lines              {}", self.lines);
        println!("trace_rate               {:.2} lines/s", lines_per_sec);
        println!("snapshots                {}", self.snapshots);
        println!("cycles                   {}", cycles);
        println!("----------------------------------------------------------");
        println!("PIPELINE");
        println!("  occupancy              {:.2}%", occupancy);
        println!(
            "  bubbles                {} ({:.2}% of slots)",
            self.bubbles,
            (self.bubbles as f64 / slots as f64) * 100.0
        );
        println!(
            "  forwarding.paths       {} ({:.2}/cycle)",
            self.forwarding_paths,
            self.forwarding_paths as f64 / snaps as f64
        );
        println!("----------------------------------------------------------");
        println!("diagnostics              {}", self.diagnostics);
        println!("==========================================================");
    }
}
