use crate::sharding::DeviceId;

/// Malformed input handed to the cost model.
///
/// These are caller bugs, not pricing decisions: a plan that is merely forbidden is
/// reported as [`Cost::Infinite`](crate::Cost::Infinite) instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CostModelError {
    /// Resharding was requested towards a sharding that has not been decided.
    #[error("cannot reshard to an undefined sharding")]
    UndefinedDestination,
    /// A collective-permute pair names a device that is not part of the mesh.
    #[error("device {device} is not part of the device mesh")]
    UnknownDevice {
        /// The unknown device.
        device: DeviceId,
    },
    /// The two ends of a collective-permute pair have coordinates of different ranks.
    #[error("collective-permute pair has coordinates of rank {src} and {dst}")]
    CoordinateRankMismatch {
        /// Rank of the source coordinate.
        src: usize,
        /// Rank of the destination coordinate.
        dst: usize,
    },
}
