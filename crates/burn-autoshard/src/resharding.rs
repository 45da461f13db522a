use alloc::vec::Vec;

use crate::Cost;
use crate::cluster::{ClusterEnvironment, all_to_all_cost_util};
use crate::error::CostModelError;
use crate::sharding::{
    ShardingError, ShardingSpec, TensorDimToMeshDim, can_reshard_with_collective_permute,
    num_tile_dimensions, tensor_dim_to_mesh_dim,
};
use crate::tensor::TensorShape;

impl ClusterEnvironment {
    /// Cost of turning a tensor of `shape` sharded as `src` into one sharded as `dst`.
    ///
    /// Transitions the model cannot price cheaply, such as moving a dimension from one
    /// mesh axis straight to another or an all-to-all over a 2-D mesh, cost
    /// [`Cost::Infinite`]. The only error is an undefined destination, or a malformed
    /// permutation surfacing from [`collective_permute_cost`](Self::collective_permute_cost).
    ///
    /// When a sharding cannot be matched against the mesh and the destination is
    /// replicated, the source is re-expressed as an iota tiling over the same tile
    /// dimensions and priced again. An iota tiling always lines up with the identity
    /// permutation of a mesh holding the same number of devices, and the retry is only
    /// taken when the re-expression differs from the source, so it recurses at most once.
    pub fn resharding_cost(
        &self,
        shape: &TensorShape,
        src: &ShardingSpec,
        dst: &ShardingSpec,
    ) -> Result<Cost, CostModelError> {
        if src == dst || src.is_undefined() || src.is_replicated() {
            log::debug!("resharding {src:?} -> {dst:?} is free");
            return Ok(Cost::ZERO);
        }

        if dst.is_undefined() {
            return Err(CostModelError::UndefinedDestination);
        }

        let src_rank = tiled_rank(shape, src);
        let dst_rank = tiled_rank(shape, dst);

        let src_result = self.resolve_mapping(src_rank, src);
        let dst_result = self.resolve_mapping(dst_rank, dst);
        let (src_mapping, dst_mapping) = match (src_result, dst_result) {
            (Ok(src_mapping), Ok(dst_mapping)) => (src_mapping, dst_mapping),
            (src_result, dst_result) => {
                log::debug!(
                    "no mesh mapping for resharding {src:?} -> {dst:?}: {:?}",
                    src_result.err().or(dst_result.err())
                );
                if !src.has_partial_replication()
                    && dst.is_replicated()
                    && let Some(tiled) = src.as_tiled()
                {
                    let equivalent = ShardingSpec::iota_tile(tiled.tile_assignment().dims());
                    if &equivalent != src {
                        log::debug!("retrying with iota re-expression {equivalent:?}");
                        return self.resharding_cost(shape, &equivalent, dst);
                    }
                }
                return self.try_collective_permute_for_resharding(shape, src, dst);
            }
        };

        let src_n_dim = num_tile_dimensions(src);
        let dst_n_dim = num_tile_dimensions(dst);
        if let (Some(src_n_dim), Some(dst_n_dim)) = (src_n_dim, dst_n_dim)
            && src_n_dim != dst_n_dim
        {
            log::debug!("resharding between {src_n_dim}-d and {dst_n_dim}-d tilings");
            return Ok(self.resharding_cost_mixed_mesh_shape(shape, &src_mapping, &dst_mapping));
        }

        // Resolved mappings never name a unit mesh axis or a replication axis, so every
        // entry below is a real partition.
        let mut all_gather_dims = Vec::new();
        let mut num_slice_dims = 0;
        for i in 0..src_rank.min(dst_rank) {
            if src_mapping[i] == dst_mapping[i] {
                continue;
            }
            match (src_mapping[i], dst_mapping[i]) {
                (None, _) => num_slice_dims += 1,
                (Some(src_dim), None) => all_gather_dims.push(src_dim),
                (Some(src_dim), Some(dst_dim)) => {
                    log::debug!("tensor dim {i} moves from mesh dim {src_dim} to {dst_dim}");
                    return Ok(Cost::Infinite);
                }
            }
        }

        if all_gather_dims.is_empty() {
            log::debug!("resharding {src:?} -> {dst:?} only slices locally");
            return Ok(Cost::ZERO);
        }

        if num_slice_dims > 1 && all_gather_dims.len() > 1 {
            log::debug!("resharding {src:?} -> {dst:?} slices and gathers several dims");
            return Ok(Cost::Infinite);
        }

        if num_slice_dims == 1 && all_gather_dims.len() == 1 {
            let mesh = self.device_mesh();
            if mesh.dim(0).unwrap_or(1) > 1 && mesh.dim(1).unwrap_or(1) > 1 {
                log::debug!("all-to-all over a 2-d mesh");
                return Ok(Cost::Infinite);
            }
            return Ok(self.all_to_all_cost(shape.bytes(), all_gather_dims[0]));
        }

        let mut num_bytes = shape.bytes() / src.num_tiles() as f64;
        let mut cost = Cost::ZERO;
        for mesh_dim in all_gather_dims {
            let Some(extent) = self.device_mesh().dim(mesh_dim) else {
                return Ok(Cost::Infinite);
            };
            num_bytes *= extent as f64;
            cost += self.all_gather_cost(num_bytes, mesh_dim);
        }
        log::debug!("resharding {src:?} -> {dst:?} through all-gather costs {cost}");
        Ok(cost)
    }

    /// Prices `src -> dst` as a one-to-one move of every tile, when that is possible.
    fn try_collective_permute_for_resharding(
        &self,
        shape: &TensorShape,
        src: &ShardingSpec,
        dst: &ShardingSpec,
    ) -> Result<Cost, CostModelError> {
        let (Some(src_tiled), Some(dst_tiled)) = (src.as_tiled(), dst.as_tiled()) else {
            return Ok(Cost::Infinite);
        };
        if !can_reshard_with_collective_permute(src, dst) {
            log::debug!("resharding {src:?} -> {dst:?} is not a collective-permute");
            return Ok(Cost::Infinite);
        }

        let dst_tiles = dst_tiled.tile_assignment();
        let mut src_dst_pairs = Vec::with_capacity(dst_tiles.num_elements());
        src_tiled.tile_assignment().each(|indices, src_device| {
            if let Some(dst_device) = dst_tiles.get(indices) {
                src_dst_pairs.push((src_device, dst_device));
            }
        });

        log::debug!("resharding {src:?} -> {dst:?} through collective-permute");
        let num_bytes = shape.bytes() / src.num_tiles() as f64;
        self.collective_permute_cost(num_bytes, &src_dst_pairs)
    }

    /// Cost of resharding between tilings that cut the devices along a different number of
    /// mesh dimensions.
    ///
    /// A dimension that becomes tiled or untiled pays an all-to-all over every device. A
    /// dimension that moves from one mesh dim to another is forbidden, as it is between
    /// tilings of equal dimensionality.
    fn resharding_cost_mixed_mesh_shape(
        &self,
        shape: &TensorShape,
        src_mapping: &TensorDimToMeshDim,
        dst_mapping: &TensorDimToMeshDim,
    ) -> Cost {
        let num_devices = self.device_mesh().num_elements();
        let alpha = self.device_mesh().alpha();
        let beta = self.device_mesh().beta();
        let num_bytes = shape.bytes();

        src_mapping
            .iter()
            .zip(dst_mapping)
            .map(|(&src_dim, &dst_dim)| match (src_dim, dst_dim) {
                (None, None) => Cost::ZERO,
                (Some(src_dim), Some(dst_dim)) if src_dim == dst_dim => Cost::ZERO,
                (None, Some(mesh_dim)) | (Some(mesh_dim), None) => {
                    all_to_all_cost_util(num_bytes, mesh_dim, num_devices, &alpha, &beta)
                }
                (Some(_), Some(_)) => Cost::Infinite,
            })
            .sum()
    }

    /// Resolves `spec` against the mesh, or against the flattened mesh when `spec` cuts the
    /// devices along a single dimension of a multi-dimensional mesh.
    fn resolve_mapping(
        &self,
        rank: usize,
        spec: &ShardingSpec,
    ) -> Result<TensorDimToMeshDim, ShardingError> {
        let one_dimensional = spec
            .as_tiled()
            .is_some_and(|tiled| tiled.tile_assignment().num_non_trivial_dims() == 1);
        if one_dimensional && self.device_mesh().num_non_trivial_dims() > 1 {
            tensor_dim_to_mesh_dim(rank, spec, self.device_mesh_1d())
        } else {
            tensor_dim_to_mesh_dim(rank, spec, self.device_mesh().devices())
        }
    }
}

fn tiled_rank(shape: &TensorShape, spec: &ShardingSpec) -> usize {
    match spec {
        ShardingSpec::Tiled(tiled) => tiled.tiled_data_rank(),
        ShardingSpec::Replicated | ShardingSpec::Undefined => shape.rank(),
    }
}
