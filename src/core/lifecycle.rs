//! Lifecycle hooks fired by running execution units.

use serde::{Deserialize, Serialize};

use super::{JobId, UnitId};

/// Identifies the unit a lifecycle event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitInfo {
    /// Registry key of the unit.
    pub unit_id: UnitId,
    /// Job the unit executes.
    pub job_id: JobId,
}

/// Progress milestone reported by a running unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    /// One page finished auditing.
    PageAudited {
        /// Page URL.
        url: String,
    },
    /// Free-form step.
    Step(String),
}

/// Callbacks invoked by an execution unit at start, at progress milestones
/// and at completion.
///
/// `on_end` fires exactly once per dispatched unit, whatever the outcome;
/// the scheduler's implementation frees the unit's registry slot there.
pub trait LifecycleListener: Send + Sync {
    /// The unit began its audit.
    fn on_start(&self, _unit: &UnitInfo) {}

    /// The unit reached a milestone.
    fn on_progress(&self, _unit: &UnitInfo, _milestone: &Milestone) {}

    /// The unit finished, failed or was interrupted.
    fn on_end(&self, unit: &UnitInfo);
}
