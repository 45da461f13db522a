//! Device topology and tensor sharding descriptors consumed by the cost model.

mod mapping;
mod mesh;
mod spec;
mod tile;

pub use mapping::*;
pub use mesh::*;
pub use spec::*;
pub use tile::TileAssignment;

/// Globally unique identifier of a device in the cluster.
pub type DeviceId = u64;

/// Errors raised while interpreting a sharding against a device mesh.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShardingError {
    /// The number of devices does not fill the tile assignment shape.
    #[error("tile assignment expects {expected} device(s), but got {actual}")]
    TileCountMismatch {
        /// Product of the tile-assignment dimensions.
        expected: usize,
        /// Number of devices provided.
        actual: usize,
    },
    /// A partially replicated sharding needs at least one tile-assignment dimension.
    #[error("partial replication requires at least one tile assignment dimension")]
    MissingReplicationDim,
    /// An undefined sharding has no tensor-to-mesh mapping.
    #[error("an undefined sharding cannot be mapped onto the device mesh")]
    UndefinedSharding,
    /// The tensor rank does not match the rank described by the sharding.
    #[error("tensor rank {rank} does not match tiled data rank {tiled_data_rank}")]
    RankMismatch {
        /// Rank of the tensor.
        rank: usize,
        /// Rank described by the tile assignment.
        tiled_data_rank: usize,
    },
    /// The sharding spans a different number of devices than the mesh.
    #[error("sharding spans {sharding} device(s), but the mesh has {mesh}")]
    DeviceCountMismatch {
        /// Devices in the tile assignment.
        sharding: usize,
        /// Devices in the mesh.
        mesh: usize,
    },
    /// No transposition of the mesh reproduces the tile assignment.
    #[error("no mesh axis permutation matches the tile assignment")]
    NoMeshMapping,
}
