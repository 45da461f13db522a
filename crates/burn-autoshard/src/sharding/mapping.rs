//! Resolution of tensor dimensions to the mesh dimensions that partition them.

use alloc::vec;
use alloc::vec::Vec;

use super::tile::greater_than_one_count;
use super::{ShardingError, ShardingSpec, TileAssignment};

/// For every tensor dimension, the mesh dimension it is partitioned across, or `None` when
/// the dimension is not tiled.
pub type TensorDimToMeshDim = Vec<Option<usize>>;

/// Finds which mesh dimension partitions each of the `rank` tensor dimensions of `spec`.
///
/// The tile assignment is matched against every transposition of `mesh`; the first
/// permutation whose devices line up with the tile assignment fixes the mapping. Tiled
/// tensor dimensions then consume the permuted mesh axes in order, skipping axes of extent
/// one.
///
/// The result never names a mesh axis of extent one. The replication dimension of a
/// partially replicated sharding is not a tensor dimension, so the mesh axis it lands on
/// never appears either.
///
/// Fails when `rank` is not the tiled data rank of `spec`, when the device counts differ,
/// or when no permutation of the mesh reproduces the tile assignment.
pub fn tensor_dim_to_mesh_dim(
    rank: usize,
    spec: &ShardingSpec,
    mesh: &TileAssignment,
) -> Result<TensorDimToMeshDim, ShardingError> {
    let tiled = match spec {
        ShardingSpec::Replicated => return Ok(vec![None; rank]),
        ShardingSpec::Undefined => return Err(ShardingError::UndefinedSharding),
        ShardingSpec::Tiled(tiled) => tiled,
    };

    if rank != tiled.tiled_data_rank() {
        return Err(ShardingError::RankMismatch {
            rank,
            tiled_data_rank: tiled.tiled_data_rank(),
        });
    }

    let tile_assignment = tiled.tile_assignment();
    if tile_assignment.num_elements() != mesh.num_elements() {
        return Err(ShardingError::DeviceCountMismatch {
            sharding: tile_assignment.num_elements(),
            mesh: mesh.num_elements(),
        });
    }

    let axes = matching_permutation(tile_assignment, mesh).ok_or(ShardingError::NoMeshMapping)?;

    let mut mapping = vec![None; rank];
    let mut mesh_index = 0;
    for (i, slot) in mapping.iter_mut().enumerate() {
        if tile_assignment.dim(i) == 1 {
            continue;
        }
        while mesh_index < axes.len() && mesh.dim(axes[mesh_index]) == 1 {
            mesh_index += 1;
        }
        let Some(&axis) = axes.get(mesh_index) else {
            return Err(ShardingError::NoMeshMapping);
        };
        *slot = Some(axis);
        mesh_index += 1;
    }

    Ok(mapping)
}

/// Returns the first permutation of the mesh axes (in lexicographic order) whose transposed
/// mesh lists the same devices, in the same order, as `tile_assignment`.
fn matching_permutation(
    tile_assignment: &TileAssignment,
    mesh: &TileAssignment,
) -> Option<Vec<usize>> {
    let mut axes: Vec<usize> = (0..mesh.num_dimensions()).collect();
    loop {
        if mesh.transpose(&axes).devices() == tile_assignment.devices() {
            return Some(axes);
        }
        if !next_permutation(&mut axes) {
            return None;
        }
    }
}

/// Rearranges `values` into the next lexicographic permutation. Returns `false` once the
/// last permutation has been passed, leaving `values` sorted ascending.
fn next_permutation(values: &mut [usize]) -> bool {
    if values.len() < 2 {
        return false;
    }
    let mut i = values.len() - 1;
    while i > 0 && values[i - 1] >= values[i] {
        i -= 1;
    }
    if i == 0 {
        values.reverse();
        return false;
    }
    let mut j = values.len() - 1;
    while values[j] <= values[i - 1] {
        j -= 1;
    }
    values.swap(i - 1, j);
    values[i..].reverse();
    true
}

/// Number of tile-assignment dimensions that cut the devices, replication included.
///
/// `None` for a sharding that is not tiled.
pub fn num_tile_dimensions(spec: &ShardingSpec) -> Option<usize> {
    match spec {
        ShardingSpec::Tiled(tiled) => Some(greater_than_one_count(tiled.tile_assignment().dims())),
        ShardingSpec::Replicated | ShardingSpec::Undefined => None,
    }
}

/// Returns `true` when `src` can be turned into `dst` by moving every tile to exactly one
/// new device, with no tile split or merged on the way.
///
/// Both sides must agree on partial replication; each replica of a tile then moves on its
/// own.
pub fn can_reshard_with_collective_permute(src: &ShardingSpec, dst: &ShardingSpec) -> bool {
    let (Some(src), Some(dst)) = (src.as_tiled(), dst.as_tiled()) else {
        return false;
    };
    if src.replicate_on_last_tile_dim() != dst.replicate_on_last_tile_dim() {
        return false;
    }
    let src_tiles = src.tile_assignment();
    let dst_tiles = dst.tile_assignment();
    if src_tiles.dims() != dst_tiles.dims() {
        return false;
    }
    let mut src_devices = src_tiles.devices().to_vec();
    let mut dst_devices = dst_tiles.devices().to_vec();
    src_devices.sort_unstable();
    dst_devices.sort_unstable();
    src_devices == dst_devices
}
