//! Built-in representation factories.
//!
//! The geometry itself is built elsewhere; these factories carry the
//! selection rules and hand back a lightweight space descriptor.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::ContextError;
use crate::request::MotionPlanRequest;
use crate::traits::{RepresentationFactory, StateSpace};

/// Descriptor for a space built by one of the model-based factories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStateSpace {
    space_type: String,
    group: String,
}

impl ModelStateSpace {
    pub fn new(space_type: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            space_type: space_type.into(),
            group: group.into(),
        }
    }
}

impl StateSpace for ModelStateSpace {
    fn space_type(&self) -> &str {
        &self.space_type
    }

    fn group(&self) -> &str {
        &self.group
    }
}

/// Joint-space representation. Represents any problem, so it doubles as the
/// fallback when nothing more specific accepts a request.
#[derive(Debug, Clone, Default)]
pub struct JointModelStateSpaceFactory;

impl JointModelStateSpaceFactory {
    pub const TYPE: &'static str = "JointModel";
    pub const PRIORITY: i32 = 100;
}

impl RepresentationFactory for JointModelStateSpaceFactory {
    fn space_type(&self) -> &str {
        Self::TYPE
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn can_represent(&self, _group: &str, _request: &MotionPlanRequest) -> bool {
        true
    }

    fn build(&self, group: &str) -> Result<Arc<dyn StateSpace>, ContextError> {
        Ok(Arc::new(ModelStateSpace::new(Self::TYPE, group)))
    }
}

/// End-effector pose representation.
///
/// Only usable for groups with an IK solver, and only for requests whose goals
/// are pure pose targets.
#[derive(Debug, Clone, Default)]
pub struct PoseModelStateSpaceFactory {
    ik_groups: HashSet<String>,
}

impl PoseModelStateSpaceFactory {
    pub const TYPE: &'static str = "PoseModel";
    pub const PRIORITY: i32 = 200;

    pub fn new<I, S>(ik_groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ik_groups: ik_groups.into_iter().map(Into::into).collect(),
        }
    }
}

impl RepresentationFactory for PoseModelStateSpaceFactory {
    fn space_type(&self) -> &str {
        Self::TYPE
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn can_represent(&self, group: &str, request: &MotionPlanRequest) -> bool {
        self.ik_groups.contains(group)
            && !request.goal_constraints.is_empty()
            && request.goal_constraints.iter().all(|goal| goal.is_pose_only())
    }

    fn build(&self, group: &str) -> Result<Arc<dyn StateSpace>, ContextError> {
        if !self.ik_groups.contains(group) {
            return Err(ContextError::RepresentationBuildFailed {
                space_type: Self::TYPE.to_string(),
                group: group.to_string(),
                reason: "group has no IK solver".to_string(),
            });
        }
        Ok(Arc::new(ModelStateSpace::new(Self::TYPE, group)))
    }
}
