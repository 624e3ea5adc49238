//! Hash-indexed block store with lazy neighbourhood allocation.
//!
//! Blocks live in an arena of generational slots; a FNV-hashed map indexes
//! slots by block key. Evicted slots are recycled with a bumped generation,
//! so handles taken before an eviction sweep are rejected afterwards.

use std::collections::HashMap;

use recon_core::{coords, BlockKey, BuildFnvHasher, Point3, Transform};

use crate::block::{BlockFactory, VoxelBlock, ZeroedBlockFactory};
use crate::config::GridConfig;
use crate::error::{MapError, Result};

/// Reference to a stored block, valid until the block is evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHandle {
    index: u32,
    generation: u32,
}

impl BlockHandle {
    /// Arena slot index.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation the handle was issued for.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    block: Option<VoxelBlock>,
}

/// Owner of every voxel block.
///
/// Each key maps to exactly one block; blocks tile world space in the grid
/// frame described by [`GridConfig`].
#[derive(Debug)]
pub struct BlockStore<F = ZeroedBlockFactory> {
    config: GridConfig,
    grid: Transform,
    factory: F,
    index: HashMap<BlockKey, u32, BuildFnvHasher>,
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl BlockStore<ZeroedBlockFactory> {
    /// Create an empty store producing zeroed blocks.
    pub fn new(config: GridConfig) -> Result<Self> {
        Self::with_factory(config, ZeroedBlockFactory)
    }
}

impl<F: BlockFactory> BlockStore<F> {
    /// Create an empty store with a custom block factory.
    pub fn with_factory(config: GridConfig, factory: F) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            grid: config.grid_transform(),
            factory,
            index: HashMap::default(),
            slots: Vec::new(),
            free: Vec::new(),
        })
    }

    /// Grid configuration.
    #[inline]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// World pose of the block grid.
    #[inline]
    pub fn grid_transform(&self) -> &Transform {
        &self.grid
    }

    /// Key of the block containing a world point.
    #[inline]
    pub fn key_of(&self, world: Point3) -> BlockKey {
        coords::world_to_block_key(&self.grid, world)
    }

    /// Handle of the block containing `world`, creating it (and every missing
    /// block within the generation radius) on a miss.
    pub fn get_or_create(&mut self, world: Point3) -> BlockHandle {
        let key = self.key_of(world);
        self.get_or_create_key(key)
    }

    /// Handle of the block at `key`, creating its neighbourhood on a miss.
    pub fn get_or_create_key(&mut self, key: BlockKey) -> BlockHandle {
        if let Some(handle) = self.handle_of(key) {
            return handle;
        }

        let center = self.insert(key);
        let mut created = 1usize;
        for neighbor in coords::neighborhood(key, self.config.generation_radius) {
            if !self.index.contains_key(&neighbor) {
                self.insert(neighbor);
                created += 1;
            }
        }
        log::debug!(
            "Created {} blocks around ({}, {}, {}), {} stored",
            created,
            key.x,
            key.y,
            key.z,
            self.len()
        );
        center
    }

    /// Handle of an existing block.
    pub fn handle_of(&self, key: BlockKey) -> Option<BlockHandle> {
        let index = *self.index.get(&key)?;
        let slot = self.slots.get(index as usize)?;
        Some(BlockHandle {
            index,
            generation: slot.generation,
        })
    }

    /// Block behind a handle.
    pub fn get(&self, handle: BlockHandle) -> Result<&VoxelBlock> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.block.as_ref())
            .ok_or(MapError::StaleHandle {
                index: handle.index,
                generation: handle.generation,
            })
    }

    /// Mutable block behind a handle.
    pub fn get_mut(&mut self, handle: BlockHandle) -> Result<&mut VoxelBlock> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.block.as_mut())
            .ok_or(MapError::StaleHandle {
                index: handle.index,
                generation: handle.generation,
            })
    }

    /// Block at `key`, if stored.
    pub fn block(&self, key: BlockKey) -> Option<&VoxelBlock> {
        let index = *self.index.get(&key)?;
        self.slots.get(index as usize)?.block.as_ref()
    }

    /// Block at `key`, failing if it does not exist.
    pub fn require(&self, key: BlockKey) -> Result<&VoxelBlock> {
        self.block(key).ok_or(MapError::BlockNotFound {
            x: key.x,
            y: key.y,
            z: key.z,
        })
    }

    /// Whether a block is stored at `key`.
    #[inline]
    pub fn contains(&self, key: BlockKey) -> bool {
        self.index.contains_key(&key)
    }

    /// Number of stored blocks.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True if no blocks are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Keys of every stored block, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = BlockKey> + '_ {
        self.index.keys().copied()
    }

    /// Every stored block, in no particular order.
    pub fn blocks(&self) -> impl Iterator<Item = &VoxelBlock> + '_ {
        self.slots.iter().filter_map(|slot| slot.block.as_ref())
    }

    /// Sum of active voxels over all blocks.
    pub fn total_active_voxels(&self) -> u64 {
        self.blocks().map(|b| b.active_count() as u64).sum()
    }

    /// Evict every block whose active count is zero and return their keys.
    ///
    /// Running it twice in a row removes nothing the second time.
    pub fn remove_empty_blocks(&mut self) -> Vec<BlockKey> {
        let mut removed = Vec::new();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let evict = slot.block.as_ref().map_or(false, VoxelBlock::is_empty);
            if !evict {
                continue;
            }
            if let Some(block) = slot.block.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.index.remove(&block.key());
                self.free.push(i as u32);
                removed.push(block.key());
            }
        }
        log::debug!(
            "Evicted {} empty blocks, {} stored",
            removed.len(),
            self.index.len()
        );
        removed
    }

    fn insert(&mut self, key: BlockKey) -> BlockHandle {
        let transform = coords::block_transform(&self.grid, key);
        let block = self.factory.create(key, transform, self.config.resolution);

        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].block = Some(block);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    block: Some(block),
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.index.insert(key, index);
        BlockHandle {
            index,
            generation: self.slots[index as usize].generation,
        }
    }
}
