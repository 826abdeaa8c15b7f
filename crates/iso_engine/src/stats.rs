//! Counters and timings for one extraction run

use std::fmt;
use std::time::Duration;

/// Result of processing one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellOutcome {
    /// All 8 corners share one tag
    Empty,

    /// The cell emitted this many triangles
    Triangulated(usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionStats {
    pub isovalue: f32,
    pub cells: usize,
    pub empty_cells: usize,
    pub triangulated_cells: usize,
    pub vertices: usize,
    pub triangles: usize,

    // Timing stats (in milliseconds)
    pub classify_ms: f32,
    pub triangulate_ms: f32,
}

impl ExtractionStats {
    pub(crate) fn record(&mut self, outcome: CellOutcome) {
        self.cells += 1;
        match outcome {
            CellOutcome::Empty => self.empty_cells += 1,
            CellOutcome::Triangulated(count) => {
                self.triangulated_cells += 1;
                self.triangles += count;
            }
        }
    }

    pub(crate) fn merge_cells(&mut self, other: &ExtractionStats) {
        self.cells += other.cells;
        self.empty_cells += other.empty_cells;
        self.triangulated_cells += other.triangulated_cells;
        self.triangles += other.triangles;
    }

    pub fn total_ms(&self) -> f32 {
        self.classify_ms + self.triangulate_ms
    }
}

pub(crate) fn millis(elapsed: Duration) -> f32 {
    elapsed.as_secs_f32() * 1000.0
}

impl fmt::Display for ExtractionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "iso {:.3}: {} vertices, {} triangles ({} of {} cells crossed) in {:.2}ms",
            self.isovalue,
            self.vertices,
            self.triangles,
            self.triangulated_cells,
            self.cells,
            self.total_ms()
        )
    }
}
