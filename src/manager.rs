//! Request-facing façade over the registries and the context cache.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::allocator::{FlushReport, MultiQueryPlannerAllocator};
use crate::cache::{ContextSource, PlanningContextCache};
use crate::config::{
    ConfigurationRegistry, ManagerConfig, PlannerConfigurationMap, PlannerConfigurationSettings,
    ResourceLimits,
};
use crate::context::PlanningContext;
use crate::error::{ConfigError, ContextError};
use crate::registry::{PlannerAllocatorRegistry, RepresentationFactoryRegistry};
use crate::request::{ErrorCode, MotionPlanRequest};
use crate::state_space::JointModelStateSpaceFactory;
use crate::storage::FilePlannerDataStorage;
use crate::traits::{PlannerAllocator, PlannerDataStorage, PlanningScene, RepresentationFactory};

/// Resolves planning requests to cached planning contexts.
///
/// Safe to share between threads. Locks are always taken in the order
/// configurations → registries/limits → cache.
pub struct PlanningContextManager {
    configs: RwLock<ConfigurationRegistry>,
    factories: RwLock<RepresentationFactoryRegistry>,
    planners: RwLock<PlannerAllocatorRegistry>,
    limits: RwLock<ResourceLimits>,
    cache: PlanningContextCache,
}

impl Default for PlanningContextManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanningContextManager {
    /// Manager storing planner data on the filesystem.
    pub fn new() -> Self {
        Self::with_storage(Arc::new(FilePlannerDataStorage::new()))
    }

    /// Manager with the joint-space factory registered and default limits.
    pub fn with_storage(storage: Arc<dyn PlannerDataStorage>) -> Self {
        let mut factories = RepresentationFactoryRegistry::new();
        factories.register(Arc::new(JointModelStateSpaceFactory));

        Self {
            configs: RwLock::new(ConfigurationRegistry::new()),
            factories: RwLock::new(factories),
            planners: RwLock::new(PlannerAllocatorRegistry::new()),
            limits: RwLock::new(ResourceLimits::default()),
            cache: PlanningContextCache::with_allocator(MultiQueryPlannerAllocator::new(storage)),
        }
    }

    pub fn from_config(config: &ManagerConfig) -> Result<Self, ConfigError> {
        let manager = Self::new();
        manager.apply_config(config)?;
        Ok(manager)
    }

    /// Apply limits, default planner and configurations from `config`.
    pub fn apply_config(&self, config: &ManagerConfig) -> Result<(), ConfigError> {
        let configs = config.configuration_map()?;
        self.set_resource_limits(config.limits);
        self.set_default_planner(config.default_planner.clone());
        self.set_planner_configurations(configs);
        Ok(())
    }

    /// Replace every planner configuration and drop all cached contexts.
    pub fn set_planner_configurations(&self, configs: PlannerConfigurationMap) {
        let mut registry = self.configs.write();
        registry.replace(configs);
        self.cache.clear();
        info!(count = registry.len(), "planner configurations replaced");
    }

    pub fn planner_configurations(&self) -> PlannerConfigurationMap {
        self.configs.read().all().clone()
    }

    pub fn planner_configuration(&self, name: &str) -> Option<PlannerConfigurationSettings> {
        self.configs.read().get(name).ok().cloned()
    }

    /// Configuration names in sorted order.
    pub fn planner_configuration_names(&self) -> Vec<String> {
        self.configs.read().names().map(str::to_string).collect()
    }

    /// Whether any configuration targets `group`.
    pub fn has_planner_configurations_for(&self, group: &str) -> bool {
        self.configs.read().has_group(group)
    }

    pub fn register_planner_allocator(
        &self,
        planner_id: impl Into<String>,
        allocator: Arc<dyn PlannerAllocator>,
    ) {
        self.planners.write().register(planner_id, allocator);
    }

    pub fn set_default_planner(&self, planner_id: Option<String>) {
        self.planners.write().set_default_planner(planner_id);
    }

    pub fn registered_planner_allocators(&self) -> Vec<String> {
        self.planners.read().planner_ids()
    }

    pub fn register_representation_factory(&self, factory: Arc<dyn RepresentationFactory>) {
        self.factories.write().register(factory);
    }

    pub fn registered_representation_factories(&self) -> Vec<String> {
        self.factories.read().registered_types()
    }

    /// Representation used when no registered factory accepts a request.
    /// Contexts already cached keep the representation they were built with.
    pub fn set_default_representation(&self, space_type: impl Into<String>) {
        self.factories.write().set_default_type(space_type);
    }

    pub fn default_representation(&self) -> String {
        self.factories.read().default_type().to_string()
    }

    /// Context for a configuration named directly.
    ///
    /// Without a hint the representation is chosen as for a request on the
    /// configuration's group that carries no constraints.
    pub fn context(
        &self,
        config_name: &str,
        representation_hint: Option<&str>,
    ) -> Result<Arc<PlanningContext>, ContextError> {
        let configs = self.configs.read();
        let settings = configs.get(config_name)?;
        let request = MotionPlanRequest::new(settings.group.as_str());
        self.context_from(settings, representation_hint, &request)
    }

    /// Context for a full planning request against `scene`.
    ///
    /// Failures come back as an [`ErrorCode`] and are logged.
    pub fn context_for_request<S>(
        &self,
        scene: &S,
        request: &MotionPlanRequest,
    ) -> Result<Arc<PlanningContext>, ErrorCode>
    where
        S: PlanningScene + ?Sized,
    {
        let group = request.group_name.as_str();
        if !scene.has_group(group) {
            warn!(group, "no such planning group");
            return Err(ErrorCode::InvalidGroupName);
        }

        let name = request.configuration_name();
        let configs = self.configs.read();
        let result = configs.get(&name).and_then(|settings| {
            self.context_from(settings, request.representation_type.as_deref(), request)
        });

        result.map_err(|err| {
            warn!(
                group,
                name = name.as_str(),
                group_configured = configs.has_group(group),
                error = %err,
                "no planning context for request"
            );
            ErrorCode::from(&err)
        })
    }

    fn context_from(
        &self,
        settings: &PlannerConfigurationSettings,
        representation_hint: Option<&str>,
        request: &MotionPlanRequest,
    ) -> Result<Arc<PlanningContext>, ContextError> {
        let factory = self
            .factories
            .read()
            .resolve(&settings.group, representation_hint, request)?;
        let limits = *self.limits.read();
        let planners = self.planners.read();

        self.cache.context(ContextSource {
            settings,
            factory: factory.as_ref(),
            planners: &planners,
            limits,
        })
    }

    /// Forget the multi-query planner `name` and the contexts using it.
    pub fn invalidate_planner(&self, name: &str) -> bool {
        self.cache.invalidate_planner(name)
    }

    pub fn cached_contexts(&self) -> usize {
        self.cache.len()
    }

    pub fn cached_planners(&self) -> Vec<String> {
        self.cache.cached_planners()
    }

    /// Store planner data for every planner registered for storing.
    ///
    /// Dropping the manager does the same for anything not yet flushed.
    pub fn shutdown(&self) -> FlushReport {
        let report = self.cache.shutdown();
        info!(
            stored = report.stored.len(),
            failed = report.failed.len(),
            "planner data flushed"
        );
        report
    }

    pub fn resource_limits(&self) -> ResourceLimits {
        *self.limits.read()
    }

    /// New limits apply to contexts built afterwards; cached ones keep theirs.
    pub fn set_resource_limits(&self, limits: ResourceLimits) {
        *self.limits.write() = limits;
    }

    pub fn maximum_goal_samples(&self) -> u32 {
        self.limits.read().max_goal_samples
    }

    pub fn set_maximum_goal_samples(&self, value: u32) {
        self.limits.write().max_goal_samples = value;
    }

    pub fn maximum_state_sampling_attempts(&self) -> u32 {
        self.limits.read().max_state_sampling_attempts
    }

    pub fn set_maximum_state_sampling_attempts(&self, value: u32) {
        self.limits.write().max_state_sampling_attempts = value;
    }

    pub fn maximum_goal_sampling_attempts(&self) -> u32 {
        self.limits.read().max_goal_sampling_attempts
    }

    pub fn set_maximum_goal_sampling_attempts(&self, value: u32) {
        self.limits.write().max_goal_sampling_attempts = value;
    }

    pub fn maximum_planning_threads(&self) -> u32 {
        self.limits.read().max_planning_threads
    }

    pub fn set_maximum_planning_threads(&self, value: u32) {
        self.limits.write().max_planning_threads = value;
    }

    pub fn maximum_solution_segment_length(&self) -> f64 {
        self.limits.read().max_solution_segment_length
    }

    pub fn set_maximum_solution_segment_length(&self, value: f64) {
        self.limits.write().max_solution_segment_length = value;
    }

    pub fn minimum_waypoint_count(&self) -> u32 {
        self.limits.read().minimum_waypoint_count
    }

    pub fn set_minimum_waypoint_count(&self, value: u32) {
        self.limits.write().minimum_waypoint_count = value;
    }
}
