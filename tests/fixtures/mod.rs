//! Test fixtures for planner-context.
//!
//! Provides:
//! - Mock planners (a seedable roadmap planner, a one-shot tree planner)
//! - A scene with a fixed set of groups
//! - Storage that fails for selected paths

#![allow(dead_code)]

pub mod planners;

pub use planners::*;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use planner_context::config::{PlannerConfigurationMap, PlannerConfigurationSettings, configuration_map};
use planner_context::error::PlannerDataError;
use planner_context::storage::{MemoryPlannerDataStorage, PlannerData};
use planner_context::traits::{PlannerDataStorage, PlanningScene};

/// Scene whose robot model knows exactly the given groups.
pub struct TestScene {
    groups: HashSet<String>,
}

impl TestScene {
    pub fn with_groups(groups: &[&str]) -> Self {
        Self {
            groups: groups.iter().map(|g| g.to_string()).collect(),
        }
    }
}

impl PlanningScene for TestScene {
    fn has_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }
}

/// In-memory storage that refuses to write to some paths.
#[derive(Default)]
pub struct FlakyStorage {
    inner: MemoryPlannerDataStorage,
    broken: HashSet<PathBuf>,
}

impl FlakyStorage {
    pub fn broken_at(paths: &[&str]) -> Self {
        Self {
            inner: MemoryPlannerDataStorage::new(),
            broken: paths.iter().map(PathBuf::from).collect(),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.inner.contains(path)
    }
}

impl PlannerDataStorage for FlakyStorage {
    fn load(&self, path: &Path) -> Result<PlannerData, PlannerDataError> {
        self.inner.load(path)
    }

    fn store(&self, data: &PlannerData, path: &Path) -> Result<(), PlannerDataError> {
        if self.broken.contains(path) {
            return Err(PlannerDataError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only volume",
            )));
        }
        self.inner.store(data, path)
    }
}

/// Typical configuration set for an arm and a gripper.
pub fn arm_configurations() -> PlannerConfigurationMap {
    configuration_map([
        PlannerConfigurationSettings::new("arm", "arm").option("type", TREE_PLANNER),
        PlannerConfigurationSettings::new("arm[rrt]", "arm")
            .option("type", TREE_PLANNER)
            .option("range", "0.5"),
        PlannerConfigurationSettings::new("arm[prm]", "arm")
            .option("type", ROADMAP_PLANNER)
            .option("multi_query_planning_enabled", "true"),
        PlannerConfigurationSettings::new("gripper[rrt]", "gripper").option("type", TREE_PLANNER),
    ])
}
