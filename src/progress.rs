//! Single-line progress reporting on stdout.

use std::io::{stdout, Write};

use crossterm::{
    cursor::MoveToColumn,
    execute,
    terminal::{Clear, ClearType},
};

/// Rewrites one terminal line as items are worked through.  Display failures
/// are ignored; progress output never aborts a run.
pub struct Progress {
    label: String,
    total: usize,
    done: usize,
}

impl Progress {
    pub fn new(label: &str, total: usize) -> Self {
        Progress {
            label: label.to_string(),
            total,
            done: 0,
        }
    }

    /// Mark one item done and redraw the line with its description.
    pub fn step(&mut self, detail: &str) {
        self.done += 1;
        let mut out = stdout();
        let _ = execute!(out, MoveToColumn(0), Clear(ClearType::CurrentLine));
        let _ = write!(
            out,
            "{} [{}/{}] {}",
            self.label, self.done, self.total, detail
        );
        let _ = out.flush();
    }

    /// End the progress line with a final summary.
    pub fn finish(self, summary: &str) {
        let mut out = stdout();
        let _ = execute!(out, MoveToColumn(0), Clear(ClearType::CurrentLine));
        let _ = writeln!(out, "{} {}", self.label, summary);
    }
}
