//! Multi-query allocator behaviour: reuse, single-shot allocation, degraded
//! loading and best-effort flushing.

mod fixtures;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use planner_context::allocator::MultiQueryPlannerAllocator;
use planner_context::error::ContextError;
use planner_context::state_space::ModelStateSpace;
use planner_context::storage::{MemoryPlannerDataStorage, PlannerData};
use planner_context::traits::{PlannerDataStorage, StateSpace};

use fixtures::{FlakyStorage, MockAllocator, ROADMAP_PLANNER, TREE_PLANNER};

fn space() -> Arc<dyn StateSpace> {
    Arc::new(ModelStateSpace::new("JointModel", "arm"))
}

fn options(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn multi_query(extra: &[(&str, &str)]) -> BTreeMap<String, String> {
    let mut opts = options(&[("multi_query_planning_enabled", "true")]);
    opts.extend(options(extra));
    opts
}

// ============================================================================
// Reuse
// ============================================================================

#[test]
fn multi_query_name_returns_same_instance() {
    let roadmap = MockAllocator::roadmap();
    let mut alloc = MultiQueryPlannerAllocator::new(Arc::new(MemoryPlannerDataStorage::new()));

    let first = alloc
        .allocate(roadmap.as_ref(), &space(), "arm[prm]", &multi_query(&[("range", "0.1")]))
        .unwrap();
    let second = alloc
        .allocate(roadmap.as_ref(), &space(), "arm[prm]", &multi_query(&[("range", "9.9")]))
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(roadmap.allocations(), 1);
    // Second call's options are ignored.
    assert_eq!(roadmap.last_probe().param("range").as_deref(), Some("0.1"));
}

#[test]
fn multi_query_names_are_independent() {
    let roadmap = MockAllocator::roadmap();
    let mut alloc = MultiQueryPlannerAllocator::new(Arc::new(MemoryPlannerDataStorage::new()));

    let a = alloc
        .allocate(roadmap.as_ref(), &space(), "arm[prm]", &multi_query(&[]))
        .unwrap();
    let b = alloc
        .allocate(roadmap.as_ref(), &space(), "arm[prm_star]", &multi_query(&[]))
        .unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(alloc.cached_names(), vec!["arm[prm]", "arm[prm_star]"]);
}

#[test]
fn single_shot_returns_distinct_instances() {
    let tree = MockAllocator::tree();
    let mut alloc = MultiQueryPlannerAllocator::new(Arc::new(MemoryPlannerDataStorage::new()));

    let a = alloc
        .allocate(tree.as_ref(), &space(), "arm[rrt]", &options(&[("range", "0.5")]))
        .unwrap();
    let b = alloc
        .allocate(tree.as_ref(), &space(), "arm[rrt]", &options(&[("range", "0.5")]))
        .unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(tree.allocations(), 2);
    assert!(!alloc.is_cached("arm[rrt]"));
}

#[test]
fn reserved_options_never_reach_the_planner() {
    let roadmap = MockAllocator::roadmap();
    let mut alloc = MultiQueryPlannerAllocator::new(Arc::new(MemoryPlannerDataStorage::new()));

    alloc
        .allocate(
            roadmap.as_ref(),
            &space(),
            "arm[prm]",
            &multi_query(&[
                ("load_planner_data", "false"),
                ("store_planner_data", "false"),
                ("planner_data_path", "/tmp/unused.dat"),
                ("max_nearest_neighbors", "8"),
                ("bogus", "1"),
            ]),
        )
        .unwrap();

    let params = roadmap.last_probe().params();
    assert_eq!(params.len(), 1);
    assert_eq!(params["max_nearest_neighbors"], "8");
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn load_from_missing_path_degrades_to_unseeded() {
    let roadmap = MockAllocator::roadmap();
    let mut alloc = MultiQueryPlannerAllocator::new(Arc::new(MemoryPlannerDataStorage::new()));

    let planner = alloc.allocate(
        roadmap.as_ref(),
        &space(),
        "arm[prm]",
        &multi_query(&[("load_planner_data", "true"), ("planner_data_path", "/nonexistent/prm.dat")]),
    );

    assert!(planner.is_ok());
    assert!(!roadmap.last_probe().was_seeded());
    assert!(roadmap.last_probe().graph().is_empty());
}

#[test]
fn load_of_foreign_data_degrades_to_unseeded() {
    let storage = Arc::new(MemoryPlannerDataStorage::new());
    storage
        .store(&PlannerData::new(TREE_PLANNER, vec![1, 2, 3]), Path::new("mem://tree"))
        .unwrap();

    let roadmap = MockAllocator::roadmap();
    let mut alloc = MultiQueryPlannerAllocator::new(storage);
    alloc
        .allocate(
            roadmap.as_ref(),
            &space(),
            "arm[prm]",
            &multi_query(&[("load_planner_data", "true"), ("planner_data_path", "mem://tree")]),
        )
        .unwrap();

    assert!(!roadmap.last_probe().was_seeded());
}

#[test]
fn load_into_unseedable_planner_degrades() {
    let storage = Arc::new(MemoryPlannerDataStorage::new());
    storage
        .store(&PlannerData::new(TREE_PLANNER, vec![4, 5]), Path::new("mem://tree"))
        .unwrap();

    let tree = MockAllocator::tree();
    let mut alloc = MultiQueryPlannerAllocator::new(storage);
    alloc
        .allocate(
            tree.as_ref(),
            &space(),
            "arm[rrt]",
            &multi_query(&[("load_planner_data", "true"), ("planner_data_path", "mem://tree")]),
        )
        .unwrap();

    assert_eq!(tree.allocations(), 1);
    assert!(!tree.last_probe().was_seeded());
}

#[test]
fn load_seeds_matching_data() {
    let storage = Arc::new(MemoryPlannerDataStorage::new());
    storage
        .store(&PlannerData::new(ROADMAP_PLANNER, vec![9, 8, 7]), Path::new("mem://prm"))
        .unwrap();

    let roadmap = MockAllocator::roadmap();
    let mut alloc = MultiQueryPlannerAllocator::new(storage);
    alloc
        .allocate(
            roadmap.as_ref(),
            &space(),
            "arm[prm]",
            &multi_query(&[("load_planner_data", "1"), ("planner_data_path", "mem://prm")]),
        )
        .unwrap();

    assert!(roadmap.last_probe().was_seeded());
    assert_eq!(roadmap.last_probe().graph(), vec![9, 8, 7]);
}

#[test]
fn unparsable_reserved_flag_is_fatal() {
    let roadmap = MockAllocator::roadmap();
    let mut alloc = MultiQueryPlannerAllocator::new(Arc::new(MemoryPlannerDataStorage::new()));

    let result = alloc.allocate(
        roadmap.as_ref(),
        &space(),
        "arm[prm]",
        &multi_query(&[("store_planner_data", "yes")]),
    );

    assert!(matches!(
        result,
        Err(ContextError::InvalidOptionValue { ref option, ref value })
            if option == "store_planner_data" && value == "yes"
    ));
    assert_eq!(roadmap.allocations(), 0);
    assert!(alloc.cached_names().is_empty());
}

// ============================================================================
// Flushing
// ============================================================================

#[test]
fn shutdown_stores_each_registered_planner() {
    let storage = Arc::new(MemoryPlannerDataStorage::new());
    let roadmap = MockAllocator::roadmap();
    let mut alloc = MultiQueryPlannerAllocator::new(storage.clone());

    for (name, path) in [("arm[prm]", "mem://a"), ("arm[prm_star]", "mem://b")] {
        alloc
            .allocate(
                roadmap.as_ref(),
                &space(),
                name,
                &multi_query(&[("store_planner_data", "true"), ("planner_data_path", path)]),
            )
            .unwrap();
    }
    alloc
        .allocate(roadmap.as_ref(), &space(), "arm[lazy]", &multi_query(&[]))
        .unwrap();
    roadmap.probe(0).explore(&[1, 1]);

    let report = alloc.shutdown();
    assert!(report.is_complete());
    assert_eq!(report.stored, vec!["arm[prm]", "arm[prm_star]"]);
    assert_eq!(storage.len(), 2);
    assert_eq!(
        storage.load(Path::new("mem://a")).unwrap().graph(),
        &[1, 1]
    );
}

#[test]
fn one_failed_store_does_not_stop_the_rest() {
    let storage = Arc::new(FlakyStorage::broken_at(&["mem://a"]));
    let roadmap = MockAllocator::roadmap();
    let mut alloc = MultiQueryPlannerAllocator::new(storage.clone());

    for (name, path) in [("arm[a]", "mem://a"), ("arm[b]", "mem://b"), ("arm[c]", "mem://c")] {
        alloc
            .allocate(
                roadmap.as_ref(),
                &space(),
                name,
                &multi_query(&[("store_planner_data", "true"), ("planner_data_path", path)]),
            )
            .unwrap();
    }

    let report = alloc.shutdown();
    assert!(!report.is_complete());
    assert_eq!(report.stored, vec!["arm[b]", "arm[c]"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "arm[a]");
    assert!(matches!(
        report.failed[0].1,
        ContextError::PersistenceStoreFailed { .. }
    ));
    assert!(!storage.contains("mem://a"));
    assert!(storage.contains("mem://b"));
    assert!(storage.contains("mem://c"));
}

#[test]
fn dropping_the_allocator_flushes() {
    let storage = Arc::new(MemoryPlannerDataStorage::new());
    let roadmap = MockAllocator::roadmap();
    {
        let mut alloc = MultiQueryPlannerAllocator::new(storage.clone());
        alloc
            .allocate(
                roadmap.as_ref(),
                &space(),
                "arm[prm]",
                &multi_query(&[("store_planner_data", "true"), ("planner_data_path", "mem://prm")]),
            )
            .unwrap();
        roadmap.last_probe().explore(&[42]);
    }
    assert_eq!(
        storage.load(Path::new("mem://prm")).unwrap().graph(),
        &[42]
    );
}
