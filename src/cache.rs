//! Cache of built planning contexts.
//!
//! One lock covers the context map and the multi-query allocator. Contexts are
//! built rarely compared to how often they are solved on, so the whole build,
//! including an optional planner-data load from disk, runs under that lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::allocator::{FlushReport, MultiQueryPlannerAllocator};
use crate::config::{PlannerConfigurationSettings, ResourceLimits};
use crate::context::{PlanningContext, PlanningContextSpecification};
use crate::error::ContextError;
use crate::registry::PlannerAllocatorRegistry;
use crate::traits::{PlannerDataStorage, RepresentationFactory};

/// Option naming the planner identifier of a configuration.
pub const PLANNER_TYPE_OPTION: &str = "type";

/// Identity of a cached context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey {
    pub group: String,
    pub config_name: String,
    pub space_type: String,
}

impl ContextKey {
    pub fn new(
        group: impl Into<String>,
        config_name: impl Into<String>,
        space_type: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            config_name: config_name.into(),
            space_type: space_type.into(),
        }
    }
}

/// Inputs needed to build a context on a cache miss.
pub struct ContextSource<'a> {
    pub settings: &'a PlannerConfigurationSettings,
    pub factory: &'a dyn RepresentationFactory,
    pub planners: &'a PlannerAllocatorRegistry,
    pub limits: ResourceLimits,
}

impl ContextSource<'_> {
    pub fn key(&self) -> ContextKey {
        ContextKey::new(
            self.settings.group.as_str(),
            self.settings.name.as_str(),
            self.factory.space_type(),
        )
    }
}

struct CacheState {
    contexts: HashMap<ContextKey, Arc<PlanningContext>>,
    allocator: MultiQueryPlannerAllocator,
}

pub struct PlanningContextCache {
    state: Mutex<CacheState>,
}

impl Default for PlanningContextCache {
    fn default() -> Self {
        Self::with_allocator(MultiQueryPlannerAllocator::default())
    }
}

impl PlanningContextCache {
    pub fn new(storage: Arc<dyn PlannerDataStorage>) -> Self {
        Self::with_allocator(MultiQueryPlannerAllocator::new(storage))
    }

    pub fn with_allocator(allocator: MultiQueryPlannerAllocator) -> Self {
        Self {
            state: Mutex::new(CacheState {
                contexts: HashMap::new(),
                allocator,
            }),
        }
    }

    /// Return the cached context for `source`, building it on a miss.
    ///
    /// A hit returns the cached instance untouched, even if the limits or
    /// options in `source` differ from the ones it was built with. On error
    /// nothing is inserted.
    pub fn context(&self, source: ContextSource<'_>) -> Result<Arc<PlanningContext>, ContextError> {
        let key = source.key();
        let mut state = self.state.lock();

        if let Some(context) = state.contexts.get(&key) {
            debug!(
                group = key.group.as_str(),
                name = key.config_name.as_str(),
                "planning context cache hit"
            );
            return Ok(Arc::clone(context));
        }

        let context = Arc::new(build_context(&mut state.allocator, &source)?);
        info!(
            group = key.group.as_str(),
            name = key.config_name.as_str(),
            space_type = key.space_type.as_str(),
            planner_id = context.specification().planner_id.as_str(),
            "planning context built"
        );
        state.contexts.insert(key, Arc::clone(&context));
        Ok(context)
    }

    pub fn get(&self, key: &ContextKey) -> Option<Arc<PlanningContext>> {
        self.state.lock().contexts.get(key).cloned()
    }

    /// Forget every cached context. Multi-query planners stay alive.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let dropped = state.contexts.len();
        state.contexts.clear();
        debug!(dropped, "planning context cache cleared");
    }

    pub fn len(&self) -> usize {
        self.state.lock().contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().contexts.is_empty()
    }

    /// Rebuild the multi-query planner `name` on its next allocation.
    ///
    /// Contexts already holding the old instance are dropped as well.
    pub fn invalidate_planner(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        state.contexts.retain(|key, _| key.config_name != name);
        state.allocator.invalidate(name)
    }

    pub fn cached_planners(&self) -> Vec<String> {
        self.state.lock().allocator.cached_names()
    }

    /// Flush stored planner data now instead of at drop.
    pub fn shutdown(&self) -> FlushReport {
        self.state.lock().allocator.shutdown()
    }
}

fn build_context(
    allocator: &mut MultiQueryPlannerAllocator,
    source: &ContextSource<'_>,
) -> Result<PlanningContext, ContextError> {
    let settings = source.settings;
    let mut options = settings.config.clone();
    let requested_planner = options.remove(PLANNER_TYPE_OPTION);

    let mut limits = source.limits;
    limits.apply_overrides(&mut options)?;

    let (planner_id, planner_allocator) = source.planners.resolve(requested_planner.as_deref())?;
    let space = source.factory.build(&settings.group)?;
    let planner = allocator.allocate(planner_allocator.as_ref(), &space, &settings.name, &options)?;

    let spec = PlanningContextSpecification {
        name: settings.name.clone(),
        group: settings.group.clone(),
        planner_id,
        config: settings.config.clone(),
        limits,
    };
    Ok(PlanningContext::new(spec, space, planner))
}
