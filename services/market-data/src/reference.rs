//! Reference world table
//!
//! Maps world names to numeric ids and worlds to their datacenter. The
//! table is loaded once at startup and never refreshed by the core.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::info;
use types::ids::WorldId;
use types::world::World;

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("failed to read world table {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse world table: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct WorldTable {
    by_id: HashMap<WorldId, World>,
    by_name: HashMap<String, WorldId>,
}

impl WorldTable {
    pub fn new(worlds: impl IntoIterator<Item = World>) -> Self {
        let mut table = Self::default();
        for world in worlds {
            table.by_name.insert(world.name.clone(), world.id);
            table.by_id.insert(world.id, world);
        }
        table
    }

    /// Parse a JSON array of `{id, name, datacenter}` rows.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ReferenceError> {
        let worlds: Vec<World> = serde_json::from_slice(bytes)?;
        Ok(Self::new(worlds))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ReferenceError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|source| ReferenceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_json(&bytes)?;
        info!(path = %path.display(), worlds = table.len(), "World table loaded");
        Ok(table)
    }

    /// Exact-name lookup.
    pub fn world_id(&self, name: &str) -> Option<WorldId> {
        self.by_name.get(name).copied()
    }

    pub fn datacenter_of(&self, world_id: WorldId) -> Option<&str> {
        self.by_id.get(&world_id).map(|w| w.datacenter.as_str())
    }

    /// Every world of a datacenter, ascending by id.
    pub fn worlds_in(&self, datacenter: &str) -> Vec<WorldId> {
        let mut ids: Vec<WorldId> = self
            .by_id
            .values()
            .filter(|w| w.datacenter == datacenter)
            .map(|w| w.id)
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn sample_table() -> WorldTable {
    let world = |id: u32, name: &str, datacenter: &str| World {
        id: WorldId::new(id),
        name: name.to_string(),
        datacenter: datacenter.to_string(),
    };
    WorldTable::new(vec![
        world(74, "Coeurl", "Crystal"),
        world(57, "Faerie", "Aether"),
        world(91, "Balmung", "Crystal"),
        world(73, "Adamantoise", "Aether"),
    ])
}
