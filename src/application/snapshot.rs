//! Serializable point-in-time view of a monitored session.

use serde::Serialize;

use crate::domain::foundation::{Progress, SessionId};
use crate::domain::session::{SessionInfo, SessionMetrics, Summary};

/// Summary counters plus derived metrics, ready for display or JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub session: Option<SessionInfo>,
    pub submit_count: u64,
    pub tasks_count: u64,
    pub tasks_running: u64,
    pub tasks_finished: u64,
    pub objs_count: u64,

    /// Finished share as a percentage; absent until tasks are submitted.
    pub task_progress: Option<Progress>,
    pub running_share: Option<Progress>,
    pub duration_secs: Option<f64>,
    pub title: Option<String>,

    /// Last feed error, rendered for display.
    pub error: Option<String>,
}

impl SessionSnapshot {
    pub fn new(session_id: SessionId, summary: &Summary, metrics: &SessionMetrics) -> Self {
        Self {
            session_id,
            session: summary.session.clone(),
            submit_count: summary.submit_count,
            tasks_count: summary.tasks_count,
            tasks_running: summary.tasks_running,
            tasks_finished: summary.tasks_finished,
            objs_count: summary.objs_count,
            task_progress: metrics.task_progress,
            running_share: metrics.running_share,
            duration_secs: metrics.duration_secs(),
            title: metrics.title.clone(),
            error: summary.error.as_ref().map(ToString::to_string),
        }
    }

    /// Progress for display, treating "no tasks yet" as 0%.
    pub fn display_progress(&self) -> Progress {
        Progress::or_zero(self.task_progress)
    }
}
