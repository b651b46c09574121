//! Planning request shape and request-level error codes.
//!
//! Only the fields needed to select a configuration and a representation are
//! modelled here.

use serde::{Deserialize, Serialize};

use crate::error::ContextError;

/// A single constraint, reduced to its kind and the frame it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    Joint { joint_name: String },
    Position { link_name: String },
    Orientation { link_name: String },
    Visibility { target_frame: String },
}

impl Constraint {
    pub fn is_pose(&self) -> bool {
        matches!(self, Constraint::Position { .. } | Constraint::Orientation { .. })
    }
}

/// A conjunction of constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl Constraints {
    pub fn new(constraints: Vec<Constraint>) -> Self {
        Self { constraints }
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// True if non-empty and made only of position/orientation constraints.
    pub fn is_pose_only(&self) -> bool {
        !self.constraints.is_empty() && self.constraints.iter().all(Constraint::is_pose)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionPlanRequest {
    pub group_name: String,
    /// Empty, a bare suffix such as `rrt_fast`, or a full `arm[rrt_fast]` name.
    #[serde(default)]
    pub planner_id: String,
    /// Explicit representation type; skips request inspection when set.
    #[serde(default)]
    pub representation_type: Option<String>,
    #[serde(default)]
    pub goal_constraints: Vec<Constraints>,
    #[serde(default)]
    pub path_constraints: Constraints,
}

impl MotionPlanRequest {
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            ..Self::default()
        }
    }

    pub fn with_planner_id(mut self, planner_id: impl Into<String>) -> Self {
        self.planner_id = planner_id.into();
        self
    }

    pub fn with_representation(mut self, space_type: impl Into<String>) -> Self {
        self.representation_type = Some(space_type.into());
        self
    }

    pub fn with_goal(mut self, goal: Constraints) -> Self {
        self.goal_constraints.push(goal);
        self
    }

    pub fn with_path_constraints(mut self, path: Constraints) -> Self {
        self.path_constraints = path;
        self
    }

    /// Configuration name this request resolves to.
    ///
    /// `arm` with planner id `rrt` gives `arm[rrt]`; an id that already
    /// carries the `arm[...]` prefix is used verbatim; an empty id gives the
    /// group default `arm`.
    pub fn configuration_name(&self) -> String {
        if self.planner_id.is_empty() {
            return self.group_name.clone();
        }
        let prefix = format!("{}[", self.group_name);
        if self.planner_id.starts_with(&prefix) && self.planner_id.ends_with(']') {
            self.planner_id.clone()
        } else {
            format!("{}[{}]", self.group_name, self.planner_id)
        }
    }
}

/// Structured failure returned from request-level entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The scene's robot model has no such group.
    InvalidGroupName,
    ConfigurationNotFound,
    /// No representation could be selected or built.
    RepresentationNotFound,
    PlannerAllocationFailed,
    InvalidConfiguration,
}

impl From<&ContextError> for ErrorCode {
    fn from(err: &ContextError) -> Self {
        match err {
            ContextError::UnknownConfiguration { .. } => ErrorCode::ConfigurationNotFound,
            ContextError::UnknownRepresentation { .. }
            | ContextError::NoSuitableRepresentation { .. }
            | ContextError::RepresentationBuildFailed { .. } => ErrorCode::RepresentationNotFound,
            ContextError::UnknownAlgorithm { .. }
            | ContextError::PersistenceLoadFailed { .. }
            | ContextError::PersistenceStoreFailed { .. } => ErrorCode::PlannerAllocationFailed,
            ContextError::InvalidOptionValue { .. } => ErrorCode::InvalidConfiguration,
        }
    }
}
