//! Core capability traits for the planning-context layer.
//!
//! These are intentionally minimal. The search algorithms, the geometric
//! state spaces and the scene live in other crates; they plug in here by
//! implementing these traits.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{ContextError, PlannerDataError};
use crate::request::MotionPlanRequest;
use crate::storage::PlannerData;

/// A search-space encoding built for one group.
pub trait StateSpace: Send + Sync {
    /// Factory type that produced this space, e.g. `"JointModel"`.
    fn space_type(&self) -> &str;

    /// Group the space was built for.
    fn group(&self) -> &str;
}

/// Builds [`StateSpace`]s and decides which problems it can represent.
pub trait RepresentationFactory: Send + Sync {
    /// Unique type name used for explicit lookup.
    fn space_type(&self) -> &str;

    /// Higher wins during request inspection.
    fn priority(&self) -> i32;

    /// Whether this factory can represent `request` for `group`.
    fn can_represent(&self, group: &str, request: &MotionPlanRequest) -> bool;

    fn build(&self, group: &str) -> Result<Arc<dyn StateSpace>, ContextError>;
}

/// Empty problem definition attached to every freshly allocated planner.
#[derive(Clone)]
pub struct ProblemDefinition {
    space: Arc<dyn StateSpace>,
}

impl ProblemDefinition {
    pub fn new(space: Arc<dyn StateSpace>) -> Self {
        Self { space }
    }

    pub fn space(&self) -> &Arc<dyn StateSpace> {
        &self.space
    }
}

/// A live planner-algorithm instance.
pub trait Planner: Send {
    fn name(&self) -> &str;

    fn set_name(&mut self, name: &str);

    /// Set one named parameter. Returns `false` if the planner does not know it.
    fn set_param(&mut self, key: &str, value: &str) -> bool;

    fn set_problem_definition(&mut self, problem: ProblemDefinition);

    fn setup(&mut self);

    /// Snapshot of the exploration graph accumulated so far.
    fn planner_data(&self) -> PlannerData;
}

/// Planner instance shared between the allocator and the contexts using it.
pub type SharedPlanner = Arc<Mutex<Box<dyn Planner>>>;

/// Constructs planner instances of one algorithm family.
pub trait PlannerAllocator: Send + Sync {
    /// Algorithm family this allocator builds, e.g. `"geometric::PRM"`.
    fn planner_type(&self) -> &str;

    fn allocate(&self, space: &Arc<dyn StateSpace>) -> Box<dyn Planner>;

    /// Construct an instance pre-seeded with stored exploration data.
    ///
    /// Only planners that can resume from a stored graph override this.
    fn allocate_with_data(
        &self,
        space: &Arc<dyn StateSpace>,
        data: PlannerData,
    ) -> Result<Box<dyn Planner>, PlannerDataError> {
        let _ = (space, data);
        Err(PlannerDataError::Unsupported {
            planner_type: self.planner_type().to_string(),
        })
    }
}

/// Durable location for [`PlannerData`] blobs.
pub trait PlannerDataStorage: Send + Sync {
    fn load(&self, path: &Path) -> Result<PlannerData, PlannerDataError>;

    fn store(&self, data: &PlannerData, path: &Path) -> Result<(), PlannerDataError>;
}

/// The scene a request is planned against.
pub trait PlanningScene {
    /// Whether the robot model has a joint-model group with this name.
    fn has_group(&self, group: &str) -> bool;
}
