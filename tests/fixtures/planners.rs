//! Mock planner families.
//!
//! Each allocator hands the test a [`PlannerProbe`] for every instance it
//! builds, so tests can grow a planner's graph or inspect the parameters it
//! received without downcasting.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use planner_context::error::PlannerDataError;
use planner_context::storage::PlannerData;
use planner_context::traits::{Planner, PlannerAllocator, ProblemDefinition, StateSpace};

pub const ROADMAP_PLANNER: &str = "geometric::PRM";
pub const TREE_PLANNER: &str = "geometric::RRT";

/// Shared view of one mock planner instance.
#[derive(Clone, Default)]
pub struct PlannerProbe {
    graph: Arc<Mutex<Vec<u8>>>,
    params: Arc<Mutex<BTreeMap<String, String>>>,
    seeded: bool,
}

impl PlannerProbe {
    /// Simulate exploration by appending vertices to the graph.
    pub fn explore(&self, vertices: &[u8]) {
        self.graph.lock().extend_from_slice(vertices);
    }

    pub fn graph(&self) -> Vec<u8> {
        self.graph.lock().clone()
    }

    pub fn param(&self, key: &str) -> Option<String> {
        self.params.lock().get(key).cloned()
    }

    pub fn params(&self) -> BTreeMap<String, String> {
        self.params.lock().clone()
    }

    pub fn was_seeded(&self) -> bool {
        self.seeded
    }
}

struct MockPlanner {
    planner_type: &'static str,
    name: String,
    known_params: &'static [&'static str],
    probe: PlannerProbe,
    problem: Option<ProblemDefinition>,
}

impl Planner for MockPlanner {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn set_param(&mut self, key: &str, value: &str) -> bool {
        if !self.known_params.contains(&key) {
            return false;
        }
        self.probe
            .params
            .lock()
            .insert(key.to_string(), value.to_string());
        true
    }

    fn set_problem_definition(&mut self, problem: ProblemDefinition) {
        self.problem = Some(problem);
    }

    fn setup(&mut self) {
        assert!(self.problem.is_some(), "setup before problem definition");
    }

    fn planner_data(&self) -> PlannerData {
        PlannerData::new(self.planner_type, self.probe.graph())
    }
}

/// Allocator recording a probe for every instance it builds.
pub struct MockAllocator {
    planner_type: &'static str,
    seedable: bool,
    probes: Mutex<Vec<PlannerProbe>>,
}

impl MockAllocator {
    /// Roadmap planner: can be seeded with stored data.
    pub fn roadmap() -> Arc<Self> {
        Arc::new(Self {
            planner_type: ROADMAP_PLANNER,
            seedable: true,
            probes: Mutex::new(Vec::new()),
        })
    }

    /// Tree planner: single-query, cannot be seeded.
    pub fn tree() -> Arc<Self> {
        Arc::new(Self {
            planner_type: TREE_PLANNER,
            seedable: false,
            probes: Mutex::new(Vec::new()),
        })
    }

    pub fn allocations(&self) -> usize {
        self.probes.lock().len()
    }

    pub fn probe(&self, index: usize) -> PlannerProbe {
        self.probes.lock()[index].clone()
    }

    pub fn last_probe(&self) -> PlannerProbe {
        self.probes
            .lock()
            .last()
            .cloned()
            .expect("no planner allocated yet")
    }

    fn make(&self, graph: Vec<u8>, seeded: bool) -> Box<dyn Planner> {
        let probe = PlannerProbe {
            graph: Arc::new(Mutex::new(graph)),
            params: Arc::default(),
            seeded,
        };
        self.probes.lock().push(probe.clone());
        Box::new(MockPlanner {
            planner_type: self.planner_type,
            name: self.planner_type.to_string(),
            known_params: &["range", "max_nearest_neighbors"],
            probe,
            problem: None,
        })
    }
}

impl PlannerAllocator for MockAllocator {
    fn planner_type(&self) -> &str {
        self.planner_type
    }

    fn allocate(&self, _space: &Arc<dyn StateSpace>) -> Box<dyn Planner> {
        self.make(Vec::new(), false)
    }

    fn allocate_with_data(
        &self,
        space: &Arc<dyn StateSpace>,
        data: PlannerData,
    ) -> Result<Box<dyn Planner>, PlannerDataError> {
        if !self.seedable {
            let _ = space;
            return Err(PlannerDataError::Unsupported {
                planner_type: self.planner_type.to_string(),
            });
        }
        Ok(self.make(data.into_graph(), true))
    }
}
