use alloc::vec::Vec;

use super::{ShardingError, TileAssignment};

/// Tiled layout: every cell of the tile assignment holds one tile of the tensor.
///
/// With partial replication the last tile-assignment dimension does not slice the tensor;
/// devices along it hold copies of the same tile.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TiledSharding {
    /// Device holding each tile.
    tile_assignment: TileAssignment,
    /// Whether the last tile-assignment dimension is used for replication.
    replicate_on_last_tile_dim: bool,
}

impl TiledSharding {
    /// Device holding each tile.
    pub fn tile_assignment(&self) -> &TileAssignment {
        &self.tile_assignment
    }

    /// Whether the last tile-assignment dimension replicates rather than slices.
    pub fn replicate_on_last_tile_dim(&self) -> bool {
        self.replicate_on_last_tile_dim
    }

    /// Number of tensor dimensions described by the tile assignment.
    pub fn tiled_data_rank(&self) -> usize {
        let rank = self.tile_assignment.num_dimensions();
        if self.replicate_on_last_tile_dim {
            rank.saturating_sub(1)
        } else {
            rank
        }
    }

    /// Number of distinct tiles the tensor is cut into.
    pub fn num_tiles(&self) -> usize {
        self.tile_assignment.dims()[..self.tiled_data_rank()]
            .iter()
            .product()
    }
}

/// Describes how a tensor is distributed across devices.
///
/// The three states are mutually exclusive. Every consumer matches on them exhaustively.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShardingSpec {
    /// Every device holds the full tensor.
    Replicated,
    /// No sharding has been decided yet.
    Undefined,
    /// The tensor is cut into tiles spread over the devices.
    Tiled(TiledSharding),
}

impl ShardingSpec {
    /// Creates a tiled sharding where each tile-assignment dimension slices the matching
    /// tensor dimension.
    pub fn tiled(tile_assignment: TileAssignment) -> Self {
        ShardingSpec::Tiled(TiledSharding {
            tile_assignment,
            replicate_on_last_tile_dim: false,
        })
    }

    /// Creates a tiled sharding whose last tile-assignment dimension replicates the tiles.
    ///
    /// Fails if the tile assignment has no dimension to replicate on.
    pub fn partially_replicated(tile_assignment: TileAssignment) -> Result<Self, ShardingError> {
        if tile_assignment.num_dimensions() == 0 {
            return Err(ShardingError::MissingReplicationDim);
        }
        Ok(ShardingSpec::Tiled(TiledSharding {
            tile_assignment,
            replicate_on_last_tile_dim: true,
        }))
    }

    /// Creates a tiled sharding over `dims` with devices numbered `0..n` in row-major order.
    pub fn iota_tile<S: Into<Vec<usize>>>(dims: S) -> Self {
        ShardingSpec::tiled(TileAssignment::iota(dims))
    }

    /// Returns `true` when every device holds the full tensor.
    pub fn is_replicated(&self) -> bool {
        matches!(self, ShardingSpec::Replicated)
    }

    /// Returns `true` when no sharding has been decided.
    pub fn is_undefined(&self) -> bool {
        matches!(self, ShardingSpec::Undefined)
    }

    /// The tiled layout, if any.
    pub fn as_tiled(&self) -> Option<&TiledSharding> {
        match self {
            ShardingSpec::Tiled(tiled) => Some(tiled),
            ShardingSpec::Replicated | ShardingSpec::Undefined => None,
        }
    }

    /// Returns `true` when some tiles are held by more than one device.
    pub fn has_partial_replication(&self) -> bool {
        match self {
            ShardingSpec::Tiled(tiled) => tiled.replicate_on_last_tile_dim,
            ShardingSpec::Replicated | ShardingSpec::Undefined => false,
        }
    }

    /// Number of distinct tiles; a replicated or undefined tensor counts as one tile.
    pub fn num_tiles(&self) -> usize {
        match self {
            ShardingSpec::Tiled(tiled) => tiled.num_tiles(),
            ShardingSpec::Replicated | ShardingSpec::Undefined => 1,
        }
    }
}
