//! Flat ownership container for every simulatable or drawable entity.
//!
//! Entities live in per-kind arenas and are addressed by typed indices. The
//! registry is the sole owner; everything else keeps ids, never references
//! that outlive a frame. Dropping the registry drops all entities.

use crate::hair::Hair;
use crate::simulation::collider::ColliderPool;
use crate::simulation::spatial_grid::GridStruct;

use super::model::HeadModel;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            pub fn index(&self) -> usize {
                self.0
            }
        }
    };
}

entity_id!(ModelId);
entity_id!(HairId);
entity_id!(GridId);
entity_id!(ColliderPoolId);

/// Which entity kind a simulation step was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingEntity {
    Hair,
    Grid,
    ColliderPool,
}

/// The hair, grid and collider pool one simulation step operates on.
pub struct SimulationTriple<'a> {
    pub hair_id: HairId,
    pub grid_id: GridId,
    pub collider_pool_id: ColliderPoolId,
    pub hair: &'a Hair,
    pub grid: &'a GridStruct,
    pub colliders: &'a ColliderPool,
}

#[derive(Default)]
pub struct SceneRegistry {
    models: Vec<HeadModel>,
    hairs: Vec<Hair>,
    grids: Vec<GridStruct>,
    collider_pools: Vec<ColliderPool>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_model(&mut self, model: HeadModel) -> ModelId {
        self.models.push(model);
        ModelId(self.models.len() - 1)
    }

    pub fn add_hair(&mut self, hair: Hair) -> HairId {
        self.hairs.push(hair);
        HairId(self.hairs.len() - 1)
    }

    pub fn add_grid(&mut self, grid: GridStruct) -> GridId {
        self.grids.push(grid);
        GridId(self.grids.len() - 1)
    }

    pub fn add_collider_pool(&mut self, pool: ColliderPool) -> ColliderPoolId {
        self.collider_pools.push(pool);
        ColliderPoolId(self.collider_pools.len() - 1)
    }

    pub fn model(&self, id: ModelId) -> Option<&HeadModel> {
        self.models.get(id.0)
    }

    pub fn hair(&self, id: HairId) -> Option<&Hair> {
        self.hairs.get(id.0)
    }

    pub fn hair_mut(&mut self, id: HairId) -> Option<&mut Hair> {
        self.hairs.get_mut(id.0)
    }

    pub fn grid(&self, id: GridId) -> Option<&GridStruct> {
        self.grids.get(id.0)
    }

    pub fn collider_pool(&self, id: ColliderPoolId) -> Option<&ColliderPool> {
        self.collider_pools.get(id.0)
    }

    pub fn models(&self) -> impl Iterator<Item = (ModelId, &HeadModel)> {
        self.models.iter().enumerate().map(|(i, m)| (ModelId(i), m))
    }

    pub fn hairs(&self) -> impl Iterator<Item = (HairId, &Hair)> {
        self.hairs.iter().enumerate().map(|(i, h)| (HairId(i), h))
    }

    pub fn hairs_mut(&mut self) -> impl Iterator<Item = (HairId, &mut Hair)> {
        self.hairs.iter_mut().enumerate().map(|(i, h)| (HairId(i), h))
    }

    pub fn grids(&self) -> impl Iterator<Item = (GridId, &GridStruct)> {
        self.grids.iter().enumerate().map(|(i, g)| (GridId(i), g))
    }

    pub fn collider_pools(&self) -> impl Iterator<Item = (ColliderPoolId, &ColliderPool)> {
        self.collider_pools.iter().enumerate().map(|(i, p)| (ColliderPoolId(i), p))
    }

    /// First hair, grid and collider pool, the only combination the strand
    /// method simulates. Reports the first missing kind otherwise.
    pub fn simulation_triple(&self) -> Result<SimulationTriple<'_>, MissingEntity> {
        let hair = self.hairs.first().ok_or(MissingEntity::Hair)?;
        let grid = self.grids.first().ok_or(MissingEntity::Grid)?;
        let colliders = self.collider_pools.first().ok_or(MissingEntity::ColliderPool)?;
        Ok(SimulationTriple {
            hair_id: HairId(0),
            grid_id: GridId(0),
            collider_pool_id: ColliderPoolId(0),
            hair,
            grid,
            colliders,
        })
    }

    /// One-line summary for logging.
    pub fn summary(&self) -> String {
        format!(
            "{} models, {} hairs, {} grids, {} collider pools",
            self.models.len(),
            self.hairs.len(),
            self.grids.len(),
            self.collider_pools.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::collider::ColliderDesc;
    use glam::{UVec3, Vec3};

    fn grid() -> GridStruct {
        GridStruct::new("grid", Vec3::ZERO, Vec3::ONE, UVec3::splat(2), 8).unwrap()
    }

    #[test]
    fn test_empty_registry_has_no_triple() {
        let registry = SceneRegistry::new();
        assert_eq!(registry.simulation_triple().err(), Some(MissingEntity::Hair));
    }

    #[test]
    fn test_ids_are_stable_indices() {
        let mut registry = SceneRegistry::new();
        let a = registry.add_grid(grid());
        let b = registry.add_grid(grid());
        assert_eq!((a.index(), b.index()), (0, 1));
        assert!(registry.grid(b).is_some());
        assert!(registry.grid(GridId(5)).is_none());

        let pool = registry.add_collider_pool(ColliderPool::new("pool", ColliderDesc::demo_set()));
        assert_eq!(registry.collider_pool(pool).map(|p| p.len()), Some(7));
        assert_eq!(registry.grids().count(), 2);
    }

    #[test]
    fn test_missing_hair_is_reported_before_grid() {
        let mut registry = SceneRegistry::new();
        registry.add_collider_pool(ColliderPool::new("pool", Vec::new()));
        assert_eq!(registry.simulation_triple().err(), Some(MissingEntity::Hair));
        assert_eq!(registry.summary(), "0 models, 0 hairs, 0 grids, 1 collider pools");
    }
}
