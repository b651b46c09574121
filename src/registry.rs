//! Registries for representation factories and planner allocators.
//!
//! Each manager owns its own registries; nothing here is process-global.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::ContextError;
use crate::request::MotionPlanRequest;
use crate::state_space::JointModelStateSpaceFactory;
use crate::traits::{PlannerAllocator, RepresentationFactory};

/// Representation factories in registration order.
pub struct RepresentationFactoryRegistry {
    factories: Vec<Arc<dyn RepresentationFactory>>,
    default_type: String,
}

impl Default for RepresentationFactoryRegistry {
    fn default() -> Self {
        Self {
            factories: Vec::new(),
            default_type: JointModelStateSpaceFactory::TYPE.to_string(),
        }
    }
}

impl RepresentationFactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory. A factory with the same type replaces the old one
    /// in its original slot.
    pub fn register(&mut self, factory: Arc<dyn RepresentationFactory>) {
        match self
            .factories
            .iter_mut()
            .find(|f| f.space_type() == factory.space_type())
        {
            Some(slot) => *slot = factory,
            None => self.factories.push(factory),
        }
    }

    /// Type used when no factory accepts a request.
    pub fn set_default_type(&mut self, space_type: impl Into<String>) {
        self.default_type = space_type.into();
    }

    pub fn default_type(&self) -> &str {
        &self.default_type
    }

    pub fn registered_types(&self) -> Vec<String> {
        self.factories
            .iter()
            .map(|f| f.space_type().to_string())
            .collect()
    }

    pub fn by_type(&self, space_type: &str) -> Result<Arc<dyn RepresentationFactory>, ContextError> {
        self.factories
            .iter()
            .find(|f| f.space_type() == space_type)
            .cloned()
            .ok_or_else(|| ContextError::UnknownRepresentation {
                space_type: space_type.to_string(),
            })
    }

    /// Pick a factory by inspecting the request.
    ///
    /// Highest priority first; equal priorities keep registration order.
    pub fn select(
        &self,
        group: &str,
        request: &MotionPlanRequest,
    ) -> Result<Arc<dyn RepresentationFactory>, ContextError> {
        let mut ranked: Vec<&Arc<dyn RepresentationFactory>> = self.factories.iter().collect();
        ranked.sort_by_key(|f| Reverse(f.priority()));

        if let Some(factory) = ranked.into_iter().find(|f| f.can_represent(group, request)) {
            debug!(group, space_type = factory.space_type(), "representation selected");
            return Ok(Arc::clone(factory));
        }

        self.by_type(&self.default_type)
            .map_err(|_| ContextError::NoSuitableRepresentation {
                group: group.to_string(),
            })
    }

    /// Explicit type if given, otherwise request inspection.
    pub fn resolve(
        &self,
        group: &str,
        space_type: Option<&str>,
        request: &MotionPlanRequest,
    ) -> Result<Arc<dyn RepresentationFactory>, ContextError> {
        match space_type.filter(|t| !t.is_empty()) {
            Some(space_type) => self.by_type(space_type),
            None => self.select(group, request),
        }
    }
}

/// Planner allocators keyed by planner identifier.
#[derive(Default)]
pub struct PlannerAllocatorRegistry {
    allocators: HashMap<String, Arc<dyn PlannerAllocator>>,
    default_planner: Option<String>,
}

impl PlannerAllocatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, planner_id: impl Into<String>, allocator: Arc<dyn PlannerAllocator>) {
        self.allocators.insert(planner_id.into(), allocator);
    }

    /// Planner used by configurations that do not name one.
    pub fn set_default_planner(&mut self, planner_id: Option<String>) {
        self.default_planner = planner_id;
    }

    pub fn default_planner(&self) -> Option<&str> {
        self.default_planner.as_deref()
    }

    pub fn get(&self, planner_id: &str) -> Result<Arc<dyn PlannerAllocator>, ContextError> {
        self.allocators
            .get(planner_id)
            .cloned()
            .ok_or_else(|| ContextError::UnknownAlgorithm {
                planner_id: planner_id.to_string(),
            })
    }

    /// Look up `planner_id`, or the default planner when it is `None`.
    ///
    /// Returns the identifier that was actually resolved with its allocator.
    pub fn resolve(
        &self,
        planner_id: Option<&str>,
    ) -> Result<(String, Arc<dyn PlannerAllocator>), ContextError> {
        match planner_id.or(self.default_planner.as_deref()) {
            Some(id) => Ok((id.to_string(), self.get(id)?)),
            None => Err(ContextError::UnknownAlgorithm {
                planner_id: String::new(),
            }),
        }
    }

    /// Registered identifiers, sorted.
    pub fn planner_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.allocators.keys().cloned().collect();
        ids.sort();
        ids
    }
}
