//! Multi-query planner allocation.
//!
//! Planners configured with `multi_query_planning_enabled` are kept alive and
//! handed out again for the same name, so their exploration graph (roadmap,
//! tree, ...) keeps growing across planning calls. Their graph can also be
//! loaded on construction and stored again on shutdown.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::ContextError;
use crate::storage::FilePlannerDataStorage;
use crate::traits::{
    Planner, PlannerAllocator, PlannerDataStorage, ProblemDefinition, SharedPlanner, StateSpace,
};

pub const MULTI_QUERY_PLANNING_ENABLED: &str = "multi_query_planning_enabled";
pub const LOAD_PLANNER_DATA: &str = "load_planner_data";
pub const STORE_PLANNER_DATA: &str = "store_planner_data";
pub const PLANNER_DATA_PATH: &str = "planner_data_path";

/// Allocator-level options. Never forwarded to the planner itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservedOptions {
    pub multi_query_planning_enabled: bool,
    pub load_planner_data: bool,
    pub store_planner_data: bool,
    pub planner_data_path: Option<PathBuf>,
}

impl ReservedOptions {
    /// Remove the reserved keys from `options` and parse them.
    pub fn extract(options: &mut BTreeMap<String, String>) -> Result<Self, ContextError> {
        Ok(Self {
            multi_query_planning_enabled: take_bool(options, MULTI_QUERY_PLANNING_ENABLED)?,
            load_planner_data: take_bool(options, LOAD_PLANNER_DATA)?,
            store_planner_data: take_bool(options, STORE_PLANNER_DATA)?,
            planner_data_path: options
                .remove(PLANNER_DATA_PATH)
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn take_bool(options: &mut BTreeMap<String, String>, key: &str) -> Result<bool, ContextError> {
    match options.remove(key) {
        None => Ok(false),
        Some(raw) => parse_bool(&raw).ok_or_else(|| ContextError::invalid_option(key, &raw)),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Outcome of flushing planner data to storage.
#[derive(Debug, Default)]
pub struct FlushReport {
    pub stored: Vec<String>,
    pub failed: Vec<(String, ContextError)>,
}

impl FlushReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owns long-lived planner instances, keyed by name.
///
/// Not internally synchronized: the owning cache serializes access.
pub struct MultiQueryPlannerAllocator {
    planners: HashMap<String, SharedPlanner>,
    storage_paths: BTreeMap<String, PathBuf>,
    storage: Arc<dyn PlannerDataStorage>,
    flushed: bool,
}

impl Default for MultiQueryPlannerAllocator {
    fn default() -> Self {
        Self::new(Arc::new(FilePlannerDataStorage::new()))
    }
}

impl MultiQueryPlannerAllocator {
    pub fn new(storage: Arc<dyn PlannerDataStorage>) -> Self {
        Self {
            planners: HashMap::new(),
            storage_paths: BTreeMap::new(),
            storage,
            flushed: true,
        }
    }

    /// Allocate a planner for `name`.
    ///
    /// Single-shot planners are built fresh on every call and not retained.
    /// Multi-query planners are built once; later calls for the same name get
    /// the cached instance and their `config` is ignored.
    pub fn allocate(
        &mut self,
        allocator: &dyn PlannerAllocator,
        space: &Arc<dyn StateSpace>,
        name: &str,
        config: &BTreeMap<String, String>,
    ) -> Result<SharedPlanner, ContextError> {
        let mut options = config.clone();
        let reserved = ReservedOptions::extract(&mut options)?;

        if !reserved.multi_query_planning_enabled {
            let planner = self.build(allocator, space, name, &options, None);
            return Ok(Arc::new(Mutex::new(planner)));
        }

        if let Some(existing) = self.planners.get(name) {
            debug!(name, "reusing multi-query planner");
            return Ok(Arc::clone(existing));
        }

        let load_from = match (reserved.load_planner_data, &reserved.planner_data_path) {
            (true, None) => {
                warn!(name, "load_planner_data set without planner_data_path");
                None
            }
            (true, Some(path)) => Some(path.as_path()),
            (false, _) => None,
        };
        let planner = Arc::new(Mutex::new(self.build(allocator, space, name, &options, load_from)));

        if reserved.store_planner_data {
            match reserved.planner_data_path {
                Some(path) => {
                    self.storage_paths.insert(name.to_string(), path);
                    self.flushed = false;
                }
                None => warn!(name, "store_planner_data set without planner_data_path"),
            }
        }

        info!(name, planner_type = allocator.planner_type(), "multi-query planner allocated");
        self.planners.insert(name.to_string(), Arc::clone(&planner));
        Ok(planner)
    }

    fn build(
        &self,
        allocator: &dyn PlannerAllocator,
        space: &Arc<dyn StateSpace>,
        name: &str,
        options: &BTreeMap<String, String>,
        load_from: Option<&Path>,
    ) -> Box<dyn Planner> {
        let mut planner = load_from
            .and_then(|path| self.load_seeded(allocator, space, name, path))
            .unwrap_or_else(|| allocator.allocate(space));

        if !name.is_empty() {
            planner.set_name(name);
        }
        for (key, value) in options {
            if !planner.set_param(key, value) {
                debug!(name, key = key.as_str(), "planner ignored unknown parameter");
            }
        }
        planner.set_problem_definition(ProblemDefinition::new(Arc::clone(space)));
        planner.setup();
        planner
    }

    /// Seeded construction. Any failure is logged and yields `None`.
    fn load_seeded(
        &self,
        allocator: &dyn PlannerAllocator,
        space: &Arc<dyn StateSpace>,
        name: &str,
        path: &Path,
    ) -> Option<Box<dyn Planner>> {
        let loaded = self.storage.load(path).and_then(|data| {
            data.ensure_type(allocator.planner_type())?;
            allocator.allocate_with_data(space, data)
        });

        match loaded {
            Ok(planner) => {
                info!(name, path = %path.display(), "planner seeded from stored data");
                Some(planner)
            }
            Err(source) => {
                let err = ContextError::PersistenceLoadFailed {
                    name: name.to_string(),
                    path: path.to_path_buf(),
                    source,
                };
                warn!(error = %err, "falling back to an unseeded planner");
                None
            }
        }
    }

    /// Store the data of every planner registered for storing.
    ///
    /// Entries are written one after another; a failure is logged and the
    /// remaining entries are still attempted.
    pub fn shutdown(&mut self) -> FlushReport {
        let mut report = FlushReport::default();
        for (name, path) in &self.storage_paths {
            match self.store_one(name, path) {
                Ok(()) => report.stored.push(name.clone()),
                Err(err) => {
                    error!(error = %err, "planner data not stored");
                    report.failed.push((name.clone(), err));
                }
            }
        }
        self.flushed = true;
        report
    }

    fn store_one(&self, name: &str, path: &Path) -> Result<(), ContextError> {
        let Some(planner) = self.planners.get(name) else {
            return Ok(());
        };
        info!(name, path = %path.display(), "storing planner data");
        let data = planner.lock().planner_data();
        self.storage
            .store(&data, path)
            .map_err(|source| ContextError::PersistenceStoreFailed {
                name: name.to_string(),
                path: path.to_path_buf(),
                source,
            })
    }

    /// Drop the cached planner for `name` so the next allocation rebuilds it.
    ///
    /// If the planner was registered for storing, its data is stored first.
    pub fn invalidate(&mut self, name: &str) -> bool {
        if let Some(path) = self.storage_paths.get(name) {
            if let Err(err) = self.store_one(name, path) {
                error!(error = %err, "planner data not stored before invalidation");
            }
        }
        self.storage_paths.remove(name);
        self.planners.remove(name).is_some()
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.planners.contains_key(name)
    }

    pub fn cached_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.planners.keys().cloned().collect();
        names.sort();
        names
    }

    /// Names registered for storing, with their paths.
    pub fn stored_paths(&self) -> &BTreeMap<String, PathBuf> {
        &self.storage_paths
    }
}

impl Drop for MultiQueryPlannerAllocator {
    fn drop(&mut self) {
        if !self.flushed {
            self.shutdown();
        }
    }
}
