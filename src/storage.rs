//! Exploration-graph blobs and the places they are kept.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::PlannerDataError;
use crate::traits::PlannerDataStorage;

/// Opaque exploration-graph data extracted from a live planner.
///
/// The graph bytes are owned by the algorithm library; this crate only moves
/// them around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerData {
    planner_type: String,
    graph: Vec<u8>,
}

impl PlannerData {
    pub fn new(planner_type: impl Into<String>, graph: Vec<u8>) -> Self {
        Self {
            planner_type: planner_type.into(),
            graph,
        }
    }

    pub fn planner_type(&self) -> &str {
        &self.planner_type
    }

    pub fn graph(&self) -> &[u8] {
        &self.graph
    }

    pub fn into_graph(self) -> Vec<u8> {
        self.graph
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Fails with `FormatMismatch` unless produced by `planner_type`.
    pub fn ensure_type(&self, planner_type: &str) -> Result<(), PlannerDataError> {
        if self.planner_type == planner_type {
            Ok(())
        } else {
            Err(PlannerDataError::FormatMismatch {
                expected: planner_type.to_string(),
                found: self.planner_type.clone(),
            })
        }
    }
}

/// Stores each blob as a JSON file at the given path.
#[derive(Debug, Clone, Default)]
pub struct FilePlannerDataStorage;

impl FilePlannerDataStorage {
    pub fn new() -> Self {
        Self
    }
}

impl PlannerDataStorage for FilePlannerDataStorage {
    fn load(&self, path: &Path) -> Result<PlannerData, PlannerDataError> {
        let file = File::open(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => PlannerDataError::NotFound(path.to_path_buf()),
            _ => PlannerDataError::Io(err),
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn store(&self, data: &PlannerData, path: &Path) -> Result<(), PlannerDataError> {
        let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };
        // Unique temp file next to the target; rename is atomic within a directory.
        let tmp = NamedTempFile::new_in(parent)?;
        let mut writer = BufWriter::new(tmp);
        serde_json::to_writer(&mut writer, data)?;
        writer.flush()?;
        let tmp = writer.into_inner().map_err(|err| err.into_error())?;
        tmp.persist(path).map_err(|err| err.error)?;
        Ok(())
    }
}

/// In-memory storage keyed by path, for tests and ephemeral services.
#[derive(Debug, Default)]
pub struct MemoryPlannerDataStorage {
    blobs: Mutex<HashMap<PathBuf, PlannerData>>,
}

impl MemoryPlannerDataStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.blobs.lock().contains_key(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.lock().is_empty()
    }
}

impl PlannerDataStorage for MemoryPlannerDataStorage {
    fn load(&self, path: &Path) -> Result<PlannerData, PlannerDataError> {
        self.blobs
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| PlannerDataError::NotFound(path.to_path_buf()))
    }

    fn store(&self, data: &PlannerData, path: &Path) -> Result<(), PlannerDataError> {
        self.blobs.lock().insert(path.to_path_buf(), data.clone());
        Ok(())
    }
}
