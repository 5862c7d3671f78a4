//! Obstacle store
//!
//! Sphere obstacles approximated from external sources. The store is rebuilt
//! wholesale, and only when the number of sources changes: moving or
//! resizing a source without adding/removing one leaves the store stale
//! until the next count change.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::info;

/// GPU obstacle record.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Obstacle {
    pub position: [f32; 3],
    pub radius: f32,
}

const _: () = assert!(std::mem::size_of::<Obstacle>() == 16);

impl Obstacle {
    /// Zero-radius placeholder that keeps the store non-empty.
    pub const SENTINEL: Obstacle = Obstacle {
        position: [0.0; 3],
        radius: 0.0,
    };

    pub fn new(position: Vec3, radius: f32) -> Self {
        Self {
            position: position.to_array(),
            radius,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// An external obstacle as the host sees it: a position and a scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSource {
    pub position: Vec3,
    pub scale: Vec3,
}

impl ObstacleSource {
    pub fn uniform(position: Vec3, scale: f32) -> Self {
        Self {
            position,
            scale: Vec3::splat(scale),
        }
    }

    /// Sphere radius: half the horizontal (x) scale.
    pub fn radius(&self) -> f32 {
        self.scale.x * 0.5
    }

    pub fn to_obstacle(&self) -> Obstacle {
        Obstacle::new(self.position, self.radius())
    }
}

/// Host copy of the obstacle records. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleStore {
    records: Vec<Obstacle>,
    active: u32,
}

impl ObstacleStore {
    /// Build from the current sources. No sources yields exactly one sentinel.
    pub fn rebuild(sources: &[ObstacleSource]) -> Self {
        if sources.is_empty() {
            return Self {
                records: vec![Obstacle::SENTINEL],
                active: 0,
            };
        }
        Self {
            records: sources.iter().map(ObstacleSource::to_obstacle).collect(),
            active: sources.len() as u32,
        }
    }

    /// Number of real obstacles (0 when only the sentinel is stored).
    pub fn active_count(&self) -> u32 {
        self.active
    }

    pub fn is_sentinel(&self) -> bool {
        self.active == 0
    }

    pub fn records(&self) -> &[Obstacle] {
        &self.records
    }

    /// Records the kernel iterates over.
    pub fn active(&self) -> &[Obstacle] {
        &self.records[..self.active as usize]
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.records)
    }
}

/// Remembers the source count captured at the last rebuild.
#[derive(Debug, Default)]
pub struct ObstacleTracker {
    last_count: Option<usize>,
    rebuilds: u64,
}

impl ObstacleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh store when the source count differs from the last
    /// build (or nothing was built yet), otherwise `None`.
    pub fn ensure_current(&mut self, sources: &[ObstacleSource]) -> Option<ObstacleStore> {
        if self.last_count == Some(sources.len()) {
            return None;
        }
        let store = ObstacleStore::rebuild(sources);
        info!(
            previous = ?self.last_count,
            current = sources.len(),
            "rebuilding obstacle store"
        );
        self.last_count = Some(sources.len());
        self.rebuilds += 1;
        Some(store)
    }

    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Forget the captured count so the next call rebuilds.
    pub fn invalidate(&mut self) {
        self.last_count = None;
    }
}
