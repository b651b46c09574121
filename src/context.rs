//! The planning context handed out by the cache.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::ResourceLimits;
use crate::traits::{SharedPlanner, StateSpace};

/// Everything a context was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanningContextSpecification {
    /// Configuration name, e.g. `arm[rrt_fast]`.
    pub name: String,
    pub group: String,
    /// Planner identifier the algorithm was allocated with.
    pub planner_id: String,
    /// Configuration options as registered.
    pub config: BTreeMap<String, String>,
    pub limits: ResourceLimits,
}

/// Representation + planner + resource limits for one configuration.
///
/// Contexts are shared through `Arc`; running a solve on the planner is up to
/// the caller, who locks [`PlanningContext::planner`] for the duration.
pub struct PlanningContext {
    spec: PlanningContextSpecification,
    space: Arc<dyn StateSpace>,
    planner: SharedPlanner,
}

impl PlanningContext {
    pub(crate) fn new(
        spec: PlanningContextSpecification,
        space: Arc<dyn StateSpace>,
        planner: SharedPlanner,
    ) -> Self {
        Self {
            spec,
            space,
            planner,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn group(&self) -> &str {
        &self.spec.group
    }

    pub fn specification(&self) -> &PlanningContextSpecification {
        &self.spec
    }

    pub fn state_space(&self) -> &Arc<dyn StateSpace> {
        &self.space
    }

    pub fn planner(&self) -> &SharedPlanner {
        &self.planner
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.spec.limits
    }

    pub fn max_goal_samples(&self) -> u32 {
        self.spec.limits.max_goal_samples
    }

    pub fn max_state_sampling_attempts(&self) -> u32 {
        self.spec.limits.max_state_sampling_attempts
    }

    pub fn max_goal_sampling_attempts(&self) -> u32 {
        self.spec.limits.max_goal_sampling_attempts
    }

    pub fn max_planning_threads(&self) -> u32 {
        self.spec.limits.max_planning_threads
    }

    pub fn max_solution_segment_length(&self) -> f64 {
        self.spec.limits.max_solution_segment_length
    }

    pub fn minimum_waypoint_count(&self) -> u32 {
        self.spec.limits.minimum_waypoint_count
    }
}

impl fmt::Debug for PlanningContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanningContext")
            .field("name", &self.spec.name)
            .field("group", &self.spec.group)
            .field("space_type", &self.space.space_type())
            .field("planner_id", &self.spec.planner_id)
            .finish_non_exhaustive()
    }
}
