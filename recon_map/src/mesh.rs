//! Block mesh extraction.
//!
//! Every active voxel is drawn as a cube; faces shared with an active
//! neighbour inside the same block are culled. Faces on the block boundary
//! are always emitted, since neighbouring blocks are not consulted.

use std::collections::HashMap;

use recon_core::{coords, BlockKey, BuildFnvHasher, Point3, Transform, VoxelClass};

use crate::block::VoxelBlock;
#[cfg(feature = "rayon")]
use crate::block::BlockFactory;
#[cfg(feature = "rayon")]
use crate::store::BlockStore;

/// RGBA colour.
pub type Color = [f32; 4];

/// One of the six faces of a voxel cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// +Y
    Top,
    /// -Y
    Bottom,
    /// -Z
    Front,
    /// +Z
    Back,
    /// -X
    Left,
    /// +X
    Right,
}

impl Face {
    /// All faces in emission order.
    pub const ALL: [Face; 6] = [
        Face::Top,
        Face::Bottom,
        Face::Front,
        Face::Back,
        Face::Left,
        Face::Right,
    ];

    /// Index offset of the neighbour across this face.
    #[inline]
    pub const fn offset(self) -> [i32; 3] {
        match self {
            Face::Top => [0, 1, 0],
            Face::Bottom => [0, -1, 0],
            Face::Front => [0, 0, -1],
            Face::Back => [0, 0, 1],
            Face::Left => [-1, 0, 0],
            Face::Right => [1, 0, 0],
        }
    }

    /// Outward unit normal.
    #[inline]
    pub fn normal(self) -> Point3 {
        let [x, y, z] = self.offset();
        Point3::new(x as f32, y as f32, z as f32)
    }

    /// Corner offsets of the quad, relative to the voxel's minimum corner.
    const fn corners(self) -> [[u32; 3]; 4] {
        match self {
            Face::Top => [[0, 1, 0], [1, 1, 0], [0, 1, 1], [1, 1, 1]],
            Face::Bottom => [[0, 0, 0], [1, 0, 0], [0, 0, 1], [1, 0, 1]],
            Face::Front => [[0, 0, 0], [1, 0, 0], [0, 1, 0], [1, 1, 0]],
            Face::Back => [[0, 0, 1], [1, 0, 1], [0, 1, 1], [1, 1, 1]],
            Face::Left => [[0, 0, 0], [0, 0, 1], [0, 1, 0], [0, 1, 1]],
            Face::Right => [[1, 0, 0], [1, 0, 1], [1, 1, 0], [1, 1, 1]],
        }
    }

    /// Two triangles over `corners`, counter-clockwise seen from outside.
    const fn triangles(self) -> [u32; 6] {
        match self {
            Face::Top | Face::Front | Face::Right => [0, 2, 1, 1, 2, 3],
            Face::Bottom | Face::Back | Face::Left => [0, 1, 2, 1, 3, 2],
        }
    }
}

/// Colours used per voxel class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshPalette {
    /// Colour of Live voxels.
    pub live: Color,
    /// Colour of Reference voxels.
    pub reference: Color,
}

impl MeshPalette {
    /// Colour for a class; Empty voxels are never drawn.
    #[inline]
    pub fn color_for(&self, class: VoxelClass) -> Option<Color> {
        match class {
            VoxelClass::Empty => None,
            VoxelClass::Live => Some(self.live),
            VoxelClass::Reference => Some(self.reference),
        }
    }
}

impl Default for MeshPalette {
    fn default() -> Self {
        Self {
            live: [0.0, 0.0, 1.0, 1.0],
            reference: [1.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Triangle mesh of one block, in block-local coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockMesh {
    /// Key of the source block.
    pub key: BlockKey,
    /// Vertex positions; the block spans `[-0.5, 0.5]` on every axis.
    pub vertices: Vec<Point3>,
    /// Per-vertex colour.
    pub colors: Vec<Color>,
    /// Triangle list into `vertices`.
    pub indices: Vec<u32>,
    /// Per-vertex unit normals.
    pub normals: Vec<Point3>,
}

impl BlockMesh {
    /// Number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True if the mesh has no triangles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Recompute per-vertex normals by accumulating triangle normals.
    pub fn recompute_normals(&mut self) {
        let mut normals = vec![Point3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let n = (self.vertices[b] - self.vertices[a]).cross(self.vertices[c] - self.vertices[a]);
            normals[a] = normals[a] + n;
            normals[b] = normals[b] + n;
            normals[c] = normals[c] + n;
        }
        for n in &mut normals {
            *n = n.normalize();
        }
        self.normals = normals;
    }

    /// Vertex positions mapped through the block pose.
    pub fn world_vertices(&self, transform: &Transform) -> Vec<Point3> {
        self.vertices
            .iter()
            .map(|&v| transform.transform_point(v))
            .collect()
    }
}

/// Build the mesh of one block.
pub fn extract_block_mesh(block: &VoxelBlock, palette: &MeshPalette) -> BlockMesh {
    let resolution = block.resolution();
    let mut mesh = BlockMesh {
        key: block.key(),
        ..BlockMesh::default()
    };

    for (flat, voxel) in block.voxels().iter().enumerate() {
        let color = match palette.color_for(voxel.class) {
            Some(color) => color,
            None => continue,
        };
        let index = resolution.from_flat_index(flat);
        let [x, y, z] = index.as_array();

        for face in Face::ALL {
            let [dx, dy, dz] = face.offset();
            let neighbor = [x as i32 + dx, y as i32 + dy, z as i32 + dz];
            if block.voxel_signed(neighbor).map_or(false, |v| v.is_active()) {
                continue;
            }

            let base = mesh.vertices.len() as u32;
            for [cx, cy, cz] in face.corners() {
                mesh.vertices.push(coords::voxel_corner_to_local(
                    resolution,
                    (x + cx) as f32,
                    (y + cy) as f32,
                    (z + cz) as f32,
                ));
                mesh.colors.push(color);
            }
            mesh.indices
                .extend(face.triangles().iter().map(|i| base + i));
        }
    }

    mesh.recompute_normals();
    mesh
}

/// Extract every block of a store in parallel.
#[cfg(feature = "rayon")]
pub fn par_extract_meshes<F>(store: &BlockStore<F>, palette: &MeshPalette) -> Vec<BlockMesh>
where
    F: BlockFactory,
{
    use rayon::prelude::*;

    let blocks: Vec<&VoxelBlock> = store.blocks().collect();
    blocks
        .par_iter()
        .map(|block| extract_block_mesh(block, palette))
        .collect()
}

/// Receiver of rebuilt block meshes.
pub trait MeshConsumer {
    /// A block's mesh was rebuilt.
    fn on_block_mesh(&mut self, mesh: BlockMesh);

    /// A block was evicted; any mesh held for it is obsolete.
    fn on_block_evicted(&mut self, key: BlockKey);
}

/// Keeps the latest mesh of every block in memory.
#[derive(Debug, Default)]
pub struct MeshCache {
    meshes: HashMap<BlockKey, BlockMesh, BuildFnvHasher>,
}

impl MeshCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest mesh for a block.
    pub fn get(&self, key: BlockKey) -> Option<&BlockMesh> {
        self.meshes.get(&key)
    }

    /// Number of cached meshes.
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// All cached meshes.
    pub fn meshes(&self) -> impl Iterator<Item = &BlockMesh> + '_ {
        self.meshes.values()
    }

    /// Summary statistics over every cached mesh.
    pub fn stats(&self) -> MeshStats {
        MeshStats::from_meshes(self.meshes.values())
    }
}

impl MeshConsumer for MeshCache {
    fn on_block_mesh(&mut self, mesh: BlockMesh) {
        self.meshes.insert(mesh.key, mesh);
    }

    fn on_block_evicted(&mut self, key: BlockKey) {
        self.meshes.remove(&key);
    }
}

/// Mesh statistics after extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshStats {
    /// Number of meshes counted.
    pub mesh_count: usize,
    /// Total number of triangles.
    pub triangle_count: usize,
    /// Total number of vertices.
    pub vertex_count: usize,
    /// Bounding box minimum, block-local.
    pub bbox_min: Point3,
    /// Bounding box maximum, block-local.
    pub bbox_max: Point3,
}

impl MeshStats {
    /// Compute statistics over a set of meshes.
    pub fn from_meshes<'a>(meshes: impl IntoIterator<Item = &'a BlockMesh>) -> Self {
        let mut stats = Self {
            mesh_count: 0,
            triangle_count: 0,
            vertex_count: 0,
            bbox_min: Point3::splat(f32::MAX),
            bbox_max: Point3::splat(f32::MIN),
        };
        for mesh in meshes {
            stats.mesh_count += 1;
            stats.triangle_count += mesh.triangle_count();
            stats.vertex_count += mesh.vertices.len();
            for &v in &mesh.vertices {
                stats.bbox_min = stats.bbox_min.min(v);
                stats.bbox_max = stats.bbox_max.max(v);
            }
        }
        stats
    }
}
