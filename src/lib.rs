//! planner-context: planning-context allocation and caching
//!
//! Resolves symbolic planning requests (group, configuration, representation)
//! to ready-to-use planning contexts, and keeps multi-query planners alive
//! across requests.

pub mod allocator;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod manager;
pub mod registry;
pub mod request;
pub mod state_space;
pub mod storage;
pub mod traits;

pub use context::PlanningContext;
pub use error::ContextError;
pub use manager::PlanningContextManager;
pub use request::{ErrorCode, MotionPlanRequest};
