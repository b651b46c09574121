//! Planner configurations, resource limits and file-based manager config.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ContextError};

/// One named bundle of planner options for a group.
///
/// `name` is either the group name itself (the group default) or
/// `group[suffix]` for a named variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfigurationSettings {
    pub name: String,
    pub group: String,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

impl PlannerConfigurationSettings {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            config: BTreeMap::new(),
        }
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

/// All configurations, keyed by configuration name.
pub type PlannerConfigurationMap = BTreeMap<String, PlannerConfigurationSettings>;

/// Build a map from a list of settings, keyed by their names.
pub fn configuration_map(
    settings: impl IntoIterator<Item = PlannerConfigurationSettings>,
) -> PlannerConfigurationMap {
    settings.into_iter().map(|s| (s.name.clone(), s)).collect()
}

/// The current configuration set. Replaced wholesale, never patched.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationRegistry {
    configs: PlannerConfigurationMap,
}

impl ConfigurationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, configs: PlannerConfigurationMap) {
        self.configs = configs;
    }

    pub fn all(&self) -> &PlannerConfigurationMap {
        &self.configs
    }

    pub fn get(&self, name: &str) -> Result<&PlannerConfigurationSettings, ContextError> {
        self.configs
            .get(name)
            .ok_or_else(|| ContextError::UnknownConfiguration {
                name: name.to_string(),
            })
    }

    /// Whether any configuration targets `group`.
    pub fn has_group(&self, group: &str) -> bool {
        self.configs.values().any(|c| c.group == group)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

/// Per-context resource limits handed to the solve phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    /// Maximum number of states sampled in the goal region.
    pub max_goal_samples: u32,
    /// Attempts at sampling a single valid state.
    pub max_state_sampling_attempts: u32,
    /// Attempts at sampling a goal.
    pub max_goal_sampling_attempts: u32,
    /// Upper bound passed through to the solver; not enforced here.
    pub max_planning_threads: u32,
    /// 0.0 lets the solver pick its own default.
    pub max_solution_segment_length: f64,
    pub minimum_waypoint_count: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_goal_samples: 10,
            max_state_sampling_attempts: 4,
            max_goal_sampling_attempts: 1000,
            max_planning_threads: 4,
            max_solution_segment_length: 0.0,
            minimum_waypoint_count: 2,
        }
    }
}

impl ResourceLimits {
    /// Apply per-configuration limit overrides, removing them from `options`.
    pub fn apply_overrides(
        &mut self,
        options: &mut BTreeMap<String, String>,
    ) -> Result<(), ContextError> {
        take_parsed(options, "max_goal_samples", &mut self.max_goal_samples)?;
        take_parsed(
            options,
            "max_state_sampling_attempts",
            &mut self.max_state_sampling_attempts,
        )?;
        take_parsed(
            options,
            "max_goal_sampling_attempts",
            &mut self.max_goal_sampling_attempts,
        )?;
        take_parsed(options, "max_planning_threads", &mut self.max_planning_threads)?;
        take_parsed(
            options,
            "max_solution_segment_length",
            &mut self.max_solution_segment_length,
        )?;
        take_parsed(options, "minimum_waypoint_count", &mut self.minimum_waypoint_count)?;
        Ok(())
    }
}

fn take_parsed<T: FromStr>(
    options: &mut BTreeMap<String, String>,
    key: &str,
    slot: &mut T,
) -> Result<(), ContextError> {
    if let Some(raw) = options.remove(key) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| ContextError::invalid_option(key, &raw))?;
    }
    Ok(())
}

/// File-level manager configuration.
///
/// ```toml
/// [limits]
/// max_planning_threads = 2
///
/// [[planner_configs]]
/// name = "arm[rrt_fast]"
/// group = "arm"
/// config = { type = "geometric::RRT", range = "0.5" }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub limits: ResourceLimits,
    pub default_planner: Option<String>,
    pub planner_configs: Vec<PlannerConfigurationSettings>,
}

impl ManagerConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Configurations keyed by name. Duplicate names are rejected.
    pub fn configuration_map(&self) -> Result<PlannerConfigurationMap, ConfigError> {
        let mut map = PlannerConfigurationMap::new();
        for settings in &self.planner_configs {
            if map.insert(settings.name.clone(), settings.clone()).is_some() {
                return Err(ConfigError::DuplicateConfiguration(settings.name.clone()));
            }
        }
        Ok(map)
    }
}
