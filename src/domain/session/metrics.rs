//! Derived metrics computed from a summary at read time.

use chrono::Duration;

use crate::domain::foundation::{Progress, Timestamp};

use super::summary::Summary;

/// Values derived from a [`Summary`]; never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMetrics {
    /// Finished share of submitted tasks; `None` until tasks are submitted.
    pub task_progress: Option<Progress>,

    /// Running share of submitted tasks; `None` until tasks are submitted.
    pub running_share: Option<Progress>,

    /// Elapsed time from creation to close, or to `now` while open.
    pub duration: Option<Duration>,

    /// Session name from the `SessionSpec`, when it has one.
    pub title: Option<String>,
}

impl SessionMetrics {
    /// Computes metrics for `summary` as of `now`.
    ///
    /// `now` only matters while the session is open; a closed session's
    /// duration is fixed by its `finished` time.
    pub fn compute(summary: &Summary, now: Timestamp) -> Self {
        let session = summary.session.as_ref();

        let duration = session.map(|s| {
            let end = s.finished.unwrap_or(now);
            end.duration_since(&s.created)
        });

        Self {
            task_progress: Progress::of(summary.tasks_finished, summary.tasks_count),
            running_share: Progress::of(summary.tasks_running, summary.tasks_count),
            duration,
            title: session.and_then(|s| s.spec.name()).map(str::to_string),
        }
    }

    /// Duration in fractional seconds.
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration
            .map(|d| d.num_milliseconds() as f64 / 1000.0)
    }
}
