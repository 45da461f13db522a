use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::Cost;
use crate::error::CostModelError;
use crate::option::SolverOption;
use crate::profiling::{NoProfiling, ProfilingResult};
use crate::sharding::{DeviceId, DeviceMesh, TileAssignment};
use crate::tensor::{DotDimensionNumbers, TensorShape};

// Tie-breakers between otherwise equally priced plans. Each collective kind gets its own
// value so the ordering among them stays deterministic.
const ALL_GATHER_EPSILON: f64 = 0.1;
const ALL_REDUCE_EPSILON: f64 = 0.01;
const REDUCE_SCATTER_EPSILON: f64 = 0.001;
const ALL_TO_ALL_EPSILON: f64 = 0.0001;

/// Element width and dtype label assumed when looking up profiled measurements.
const PROFILED_ELEMENT_BYTES: f64 = 4.0;
const PROFILED_DTYPE: &str = "float32";

/// Collective communication primitives priced along mesh dimensions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectiveKind {
    /// Every device ends up with the concatenation of all shards.
    AllGather,
    /// Every device ends up with the reduction of all inputs.
    AllReduce,
    /// The reduction of all inputs is scattered across the devices.
    ReduceScatter,
    /// Every device sends a distinct slice to every other device.
    AllToAll,
}

/// The cluster as seen by the sharding solver: topology, cost coefficients, solver options
/// and optional profiled measurements.
///
/// The environment is immutable once built and all of its cost queries are pure, so one
/// instance can be shared by every worker of a solver run.
pub struct ClusterEnvironment {
    device_mesh: DeviceMesh,
    /// Devices of `device_mesh` in row-major order, shaped `[num_elements, 1]`.
    device_mesh_1d: TileAssignment,
    mesh_alpha: Vec<f64>,
    mesh_beta: Vec<f64>,
    /// Replica groups of every mesh dimension, indexed by mesh dimension.
    cached_replica_groups: Vec<Vec<Vec<DeviceId>>>,
    solver_option: SolverOption,
    profiling: Box<dyn ProfilingResult>,
}

impl ClusterEnvironment {
    /// Creates an environment that prices collectives with the analytic alpha-beta model.
    pub fn new(device_mesh: DeviceMesh, solver_option: SolverOption) -> Self {
        let cached_replica_groups = (0..device_mesh.num_dimensions())
            .map(|mesh_dim| device_mesh.replica_groups(mesh_dim))
            .collect();

        Self {
            device_mesh_1d: device_mesh.flattened(),
            mesh_alpha: device_mesh.alpha(),
            mesh_beta: device_mesh.beta(),
            cached_replica_groups,
            device_mesh,
            solver_option,
            profiling: Box::new(NoProfiling),
        }
    }

    /// Prices collectives with `profiling` whenever it is enabled and has a measurement.
    pub fn with_profiling<P: ProfilingResult + 'static>(mut self, profiling: P) -> Self {
        self.profiling = Box::new(profiling);
        self
    }

    /// The device mesh.
    pub fn device_mesh(&self) -> &DeviceMesh {
        &self.device_mesh
    }

    /// The device grid flattened to `[num_elements, 1]`.
    pub fn device_mesh_1d(&self) -> &TileAssignment {
        &self.device_mesh_1d
    }

    /// The solver options.
    pub fn solver_option(&self) -> &SolverOption {
        &self.solver_option
    }

    /// Replica groups of a collective along `mesh_dim`.
    pub fn replica_groups(&self, mesh_dim: usize) -> Option<&[Vec<DeviceId>]> {
        self.cached_replica_groups
            .get(mesh_dim)
            .map(Vec::as_slice)
    }

    /// Cost of an all-gather of `num_bytes` along `mesh_dim`.
    ///
    /// Forbidden on the mesh dimension reserved for data parallelism.
    pub fn all_gather_cost(&self, num_bytes: f64, mesh_dim: usize) -> Cost {
        if self.solver_option.override_all_gather_cost {
            return Cost::Finite(self.solver_option.all_gather_cost);
        }

        if let Some(cost) = self.profiled_cost(CollectiveKind::AllGather, num_bytes, mesh_dim) {
            return cost;
        }

        if self.solver_option.is_forced_batch_dim(mesh_dim) {
            // Data parallelism on this dimension only allows all-reduce.
            return Cost::Infinite;
        }

        let Some((alpha, beta, num_devices)) = self.coefficients(mesh_dim) else {
            return Cost::Infinite;
        };
        let moved = beta * (num_devices - 1.0) / num_devices * num_bytes;
        let cost = libm::round(alpha + moved) + ALL_GATHER_EPSILON;
        log::trace!("all-gather of {num_bytes} bytes on mesh dim {mesh_dim}: {cost}");
        Cost::Finite(cost)
    }

    /// Cost of an all-reduce of `num_bytes` along `mesh_dim`, or across both `mesh_dim` and
    /// `mesh_dim_another`.
    ///
    /// A reduction over two dimensions uses the slower coefficients of the pair and spans
    /// every device of the mesh.
    pub fn all_reduce_cost(
        &self,
        num_bytes: f64,
        mesh_dim: usize,
        mesh_dim_another: Option<usize>,
    ) -> Cost {
        if self.solver_option.override_all_reduce_cost {
            return Cost::Finite(self.solver_option.all_reduce_cost);
        }

        if let Some(cost) = self.profiled_cost(CollectiveKind::AllReduce, num_bytes, mesh_dim) {
            return cost;
        }

        let Some((mut alpha, mut beta, mut num_devices)) = self.coefficients(mesh_dim) else {
            return Cost::Infinite;
        };
        if let Some(another) = mesh_dim_another {
            let Some((alpha_another, beta_another, _)) = self.coefficients(another) else {
                return Cost::Infinite;
            };
            alpha = alpha.max(alpha_another);
            beta = beta.max(beta_another);
            num_devices = self.device_mesh.num_elements() as f64;
        }

        // Ring all-reduce moves the data twice: once to reduce, once to broadcast.
        let moved = beta * 2.0 * (num_devices - 1.0) / num_devices * num_bytes;
        let cost = libm::round(alpha + moved) + ALL_REDUCE_EPSILON;
        log::trace!("all-reduce of {num_bytes} bytes on mesh dims {mesh_dim}/{mesh_dim_another:?}");
        Cost::Finite(cost)
    }

    /// Cost of a reduce-scatter of `num_bytes` along `mesh_dim`.
    pub fn reduce_scatter_cost(&self, num_bytes: f64, mesh_dim: usize) -> Cost {
        if self.solver_option.override_reduce_scatter_cost {
            return Cost::Finite(self.solver_option.reduce_scatter_cost);
        }

        let profiled = self.profiled_cost(CollectiveKind::ReduceScatter, num_bytes, mesh_dim);
        if let Some(cost) = profiled {
            return cost;
        }

        let Some((alpha, beta, num_devices)) = self.coefficients(mesh_dim) else {
            return Cost::Infinite;
        };
        let moved = beta * (num_devices - 1.0) / num_devices * num_bytes;
        let cost = libm::round(alpha + moved) + REDUCE_SCATTER_EPSILON;
        log::trace!("reduce-scatter of {num_bytes} bytes on mesh dim {mesh_dim}: {cost}");
        Cost::Finite(cost)
    }

    /// Cost of an all-to-all of `num_bytes` along `mesh_dim`.
    ///
    /// Forbidden on the mesh dimension reserved for data parallelism.
    pub fn all_to_all_cost(&self, num_bytes: f64, mesh_dim: usize) -> Cost {
        if self.solver_option.override_all_to_all_cost {
            return Cost::Finite(self.solver_option.all_to_all_cost);
        }

        if let Some(cost) = self.profiled_cost(CollectiveKind::AllToAll, num_bytes, mesh_dim) {
            return cost;
        }

        if self.solver_option.is_forced_batch_dim(mesh_dim) {
            // Data parallelism on this dimension only allows all-reduce.
            return Cost::Infinite;
        }

        let Some(num_devices) = self.device_mesh.dim(mesh_dim) else {
            return Cost::Infinite;
        };
        let (alpha, beta) = (&self.mesh_alpha, &self.mesh_beta);
        all_to_all_cost_util(num_bytes, mesh_dim, num_devices, alpha, beta)
    }

    /// Cost of the collective `kind` moving `num_bytes` along `mesh_dim`.
    ///
    /// `mesh_dim_another` only matters for all-reduce, which may span two mesh dimensions.
    pub fn collective_cost(
        &self,
        kind: CollectiveKind,
        num_bytes: f64,
        mesh_dim: usize,
        mesh_dim_another: Option<usize>,
    ) -> Cost {
        match kind {
            CollectiveKind::AllGather => self.all_gather_cost(num_bytes, mesh_dim),
            CollectiveKind::AllReduce => {
                self.all_reduce_cost(num_bytes, mesh_dim, mesh_dim_another)
            }
            CollectiveKind::ReduceScatter => self.reduce_scatter_cost(num_bytes, mesh_dim),
            CollectiveKind::AllToAll => self.all_to_all_cost(num_bytes, mesh_dim),
        }
    }

    /// Cost of sending `num_bytes` from every source device to its destination device.
    ///
    /// A pair pays one hop, `alpha + beta * num_bytes`, on every mesh axis where the two
    /// coordinates differ; the slowest pair sets the cost of the whole permutation.
    pub fn collective_permute_cost(
        &self,
        num_bytes: f64,
        src_dst_pairs: &[(DeviceId, DeviceId)],
    ) -> Result<Cost, CostModelError> {
        let coordinates = self.device_mesh.device_coordinates();
        let coordinate = |device: DeviceId| {
            coordinates
                .get(&device)
                .ok_or(CostModelError::UnknownDevice { device })
        };

        let mut max_cost = 0.0f64;
        for &(src, dst) in src_dst_pairs {
            let src_indices = coordinate(src)?;
            let dst_indices = coordinate(dst)?;
            if src_indices.len() != dst_indices.len() {
                return Err(CostModelError::CoordinateRankMismatch {
                    src: src_indices.len(),
                    dst: dst_indices.len(),
                });
            }

            let pair_cost: f64 = src_indices
                .iter()
                .zip(dst_indices)
                .enumerate()
                .filter(|(_, (s, d))| s != d)
                .map(|(axis, _)| self.mesh_alpha[axis] + self.mesh_beta[axis] * num_bytes)
                .sum();
            max_cost = max_cost.max(pair_cost);
        }
        Ok(Cost::Finite(max_cost))
    }

    /// Cost of recomputing a dot product instead of communicating its result.
    ///
    /// Without profiled compute costs there is no common scale for compute and
    /// communication, so the recomputation is priced as all-reduces of both operands over
    /// the first two mesh dimensions. Forbidden unless heavy-op recomputation is allowed.
    pub fn dot_cost(
        &self,
        lhs_shape: &TensorShape,
        rhs_shape: &TensorShape,
        dot_dnums: &DotDimensionNumbers,
    ) -> Cost {
        if !self.solver_option.allow_recompute_heavy_op {
            return Cost::Infinite;
        }

        log::trace!(
            "pricing dot recomputation with contracting dims {:?}/{:?}",
            dot_dnums.lhs_contracting_dims,
            dot_dnums.rhs_contracting_dims
        );
        let num_bytes = lhs_shape.bytes() + rhs_shape.bytes();
        (0..self.device_mesh.num_dimensions().min(2))
            .map(|mesh_dim| self.all_reduce_cost(num_bytes, mesh_dim, None))
            .sum()
    }

    /// Alpha, beta and device count of `mesh_dim`.
    fn coefficients(&self, mesh_dim: usize) -> Option<(f64, f64, f64)> {
        let num_devices = self.device_mesh.dim(mesh_dim)?;
        Some((self.mesh_alpha[mesh_dim], self.mesh_beta[mesh_dim], num_devices as f64))
    }

    /// Measured cost of `kind` along `mesh_dim`, when profiling is enabled and has one.
    fn profiled_cost(
        &self,
        kind: CollectiveKind,
        num_bytes: f64,
        mesh_dim: usize,
    ) -> Option<Cost> {
        let profiling = &self.profiling;
        if !profiling.enabled() {
            return None;
        }
        let groups = self.replica_groups(mesh_dim)?;
        let size = num_bytes / PROFILED_ELEMENT_BYTES;
        let dtype = PROFILED_DTYPE;
        let estimate = match kind {
            CollectiveKind::AllGather => profiling.estimate_all_gather_cost(groups, size, dtype),
            CollectiveKind::AllReduce => profiling.estimate_all_reduce_cost(groups, size, dtype),
            CollectiveKind::ReduceScatter => {
                profiling.estimate_reduce_scatter_cost(groups, size, dtype)
            }
            CollectiveKind::AllToAll => profiling.estimate_all_to_all_cost(groups, size, dtype),
        };
        if estimate.is_none() {
            log::warn!("no profiled {kind:?} cost for mesh dim {mesh_dim}, using analytic model");
        }
        estimate.map(Cost::Finite)
    }
}

impl fmt::Debug for ClusterEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterEnvironment")
            .field("device_mesh", &self.device_mesh)
            .field("solver_option", &self.solver_option)
            .field("profiling_enabled", &self.profiling.enabled())
            .finish_non_exhaustive()
    }
}

/// Analytic all-to-all cost among `num_devices` devices along `mesh_dim`.
///
/// Each device keeps `1/n` of its payload and ships `(n-1)/n` of the rest; the `n/2`
/// penalty factor calibrates the ring formula against measured NVLink behavior.
pub(crate) fn all_to_all_cost_util(
    num_bytes: f64,
    mesh_dim: usize,
    num_devices: usize,
    mesh_alpha: &[f64],
    mesh_beta: &[f64],
) -> Cost {
    let (Some(&alpha), Some(&beta)) = (mesh_alpha.get(mesh_dim), mesh_beta.get(mesh_dim)) else {
        return Cost::Infinite;
    };
    let n = num_devices as f64;
    let penalty_factor = n / 2.0;
    let moved = beta * (n - 1.0) / n / n * num_bytes * penalty_factor;
    let cost = libm::round(alpha + moved) + ALL_TO_ALL_EPSILON;
    log::trace!("all-to-all of {num_bytes} bytes among {num_devices} devices: {cost}");
    Cost::Finite(cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiling::ProfilingTable;
    use crate::sharding::{DeviceMeshBuilder, MeshDim};
    use crate::tensor::DType;
    use alloc::vec;
    use float_cmp::approx_eq;
    use rstest::rstest;

    fn mesh(shape: &[usize], alpha: &[f64], beta: &[f64]) -> DeviceMesh {
        let mut builder = DeviceMeshBuilder::iota(shape.to_vec());
        for (idx, name) in ["x", "y", "z"].iter().take(shape.len()).enumerate() {
            builder = builder.with_dim(idx, MeshDim::new(*name, alpha[idx], beta[idx]));
        }
        builder.build().unwrap()
    }

    fn env_2x2(option: SolverOption) -> ClusterEnvironment {
        ClusterEnvironment::new(mesh(&[2, 2], &[1.0, 1.0], &[1.0, 1.0]), option)
    }

    fn env_2x4() -> ClusterEnvironment {
        ClusterEnvironment::new(mesh(&[2, 4], &[1.0, 3.0], &[1.0, 0.5]), SolverOption::default())
    }

    fn finite(cost: Cost) -> f64 {
        cost.finite().expect("expected a finite cost")
    }

    #[test]
    fn test_all_gather_cost_analytic() {
        let env = env_2x2(SolverOption::default());
        // round(1 + 1 * 1/2 * 1024) + 0.1
        assert!(approx_eq!(f64, finite(env.all_gather_cost(1024.0, 0)), 513.1, epsilon = 1e-9));
    }

    #[test]
    fn test_all_reduce_cost_one_and_two_dims() {
        let env = env_2x4();

        // round(1 + 1 * 2 * 1/2 * 100) + 0.01
        let one_dim = finite(env.all_reduce_cost(100.0, 0, None));
        assert!(approx_eq!(f64, one_dim, 101.01, epsilon = 1e-9));
        // max alpha 3, max beta 1, n = 8: round(3 + 2 * 7/8 * 100) + 0.01
        let two_dims = finite(env.all_reduce_cost(100.0, 0, Some(1)));
        assert!(approx_eq!(f64, two_dims, 178.01, epsilon = 1e-9));
    }

    #[test]
    fn test_all_reduce_cost_same_dim_twice_spans_mesh() {
        let env = env_2x4();

        // alpha 1, beta 1, n = 8: round(1 + 2 * 7/8 * 100) + 0.01
        let cost = finite(env.all_reduce_cost(100.0, 0, Some(0)));
        assert!(approx_eq!(f64, cost, 176.01, epsilon = 1e-9));
    }

    #[test]
    fn test_reduce_scatter_and_all_to_all_cost() {
        let env = env_2x2(SolverOption::default());

        let reduce_scatter = finite(env.reduce_scatter_cost(1024.0, 1));
        assert!(approx_eq!(f64, reduce_scatter, 513.001, epsilon = 1e-9));
        // round(1 + 1/2/2 * 1024 * 1) + 0.0001
        let all_to_all = finite(env.all_to_all_cost(1024.0, 1));
        assert!(approx_eq!(f64, all_to_all, 257.0001, epsilon = 1e-9));
    }

    #[test]
    fn test_epsilons_order_equal_collectives() {
        let env = env_2x2(SolverOption::default());

        let all_gather = env.all_gather_cost(1024.0, 0);
        let reduce_scatter = env.reduce_scatter_cost(1024.0, 0);
        assert!(reduce_scatter < all_gather);
    }

    #[rstest]
    #[case(CollectiveKind::AllGather)]
    #[case(CollectiveKind::AllReduce)]
    #[case(CollectiveKind::ReduceScatter)]
    #[case(CollectiveKind::AllToAll)]
    fn test_collective_cost_is_monotonic(#[case] kind: CollectiveKind) {
        let mesh = mesh(&[4, 2], &[2.0, 1.0], &[0.25, 1.0]);
        let env = ClusterEnvironment::new(mesh, SolverOption::default());

        for mesh_dim in 0..2 {
            let mut previous = Cost::ZERO;
            for num_bytes in [0.0, 1.0, 64.0, 1000.0, 4096.0, 1e6] {
                let cost = env.collective_cost(kind, num_bytes, mesh_dim, None);
                assert!(cost >= previous, "{kind:?} on dim {mesh_dim} at {num_bytes} bytes");
                previous = cost;
            }
        }
    }

    #[rstest]
    #[case(1.0)]
    #[case(4096.0)]
    #[case(1e9)]
    fn test_forced_batch_dim_only_allows_all_reduce(#[case] num_bytes: f64) {
        let env = env_2x2(SolverOption {
            force_batch_dim_to_mesh_dim: Some(0),
            ..Default::default()
        });

        assert_eq!(env.all_gather_cost(num_bytes, 0), Cost::Infinite);
        assert_eq!(env.all_to_all_cost(num_bytes, 0), Cost::Infinite);
        assert!(!env.all_reduce_cost(num_bytes, 0, None).is_infinite());
        assert!(!env.reduce_scatter_cost(num_bytes, 0).is_infinite());
        assert!(!env.all_gather_cost(num_bytes, 1).is_infinite());
    }

    #[test]
    fn test_overrides_win() {
        let env = env_2x2(SolverOption {
            override_all_gather_cost: true,
            all_gather_cost: 5.0,
            override_all_reduce_cost: true,
            all_reduce_cost: 6.0,
            override_reduce_scatter_cost: true,
            reduce_scatter_cost: 7.0,
            override_all_to_all_cost: true,
            all_to_all_cost: 8.0,
            force_batch_dim_to_mesh_dim: Some(0),
            ..Default::default()
        });

        assert_eq!(env.all_gather_cost(1e6, 0), Cost::Finite(5.0));
        assert_eq!(env.all_reduce_cost(1e6, 0, Some(1)), Cost::Finite(6.0));
        assert_eq!(env.reduce_scatter_cost(1e6, 1), Cost::Finite(7.0));
        assert_eq!(env.all_to_all_cost(1e6, 0), Cost::Finite(8.0));
    }

    #[test]
    fn test_out_of_range_mesh_dim_is_infinite() {
        let env = env_2x2(SolverOption::default());

        assert!(env.all_gather_cost(8.0, 2).is_infinite());
        assert!(env.all_reduce_cost(8.0, 0, Some(5)).is_infinite());
        assert!(env.reduce_scatter_cost(8.0, 3).is_infinite());
        assert!(env.all_to_all_cost(8.0, 2).is_infinite());
    }

    #[test]
    fn test_profiled_costs_use_replica_groups() {
        let groups_dim0 = vec![vec![0, 2], vec![1, 3]];
        let profile = ProfilingTable::new()
            .with_sample(CollectiveKind::AllGather, groups_dim0.clone(), "float32", 256.0, 42.0)
            .with_sample(CollectiveKind::AllReduce, groups_dim0, "float32", 256.0, 17.0);
        let env = env_2x2(SolverOption {
            force_batch_dim_to_mesh_dim: Some(0),
            ..Default::default()
        })
        .with_profiling(profile);

        // 1024 bytes are looked up as 256 float32 elements; the profile wins over the
        // forced batch dimension.
        assert_eq!(env.all_gather_cost(1024.0, 0), Cost::Finite(42.0));
        assert_eq!(env.all_reduce_cost(1024.0, 0, None), Cost::Finite(17.0));
        // No measurement on mesh dim 1: analytic fallback.
        let fallback = finite(env.all_gather_cost(1024.0, 1));
        assert!(approx_eq!(f64, fallback, 513.1, epsilon = 1e-9));
    }

    #[test]
    fn test_profiled_costs_are_looked_up_per_collective_kind() {
        let groups_dim1 = vec![vec![0, 1], vec![2, 3]];
        let profile = ProfilingTable::new()
            .with_sample(CollectiveKind::ReduceScatter, groups_dim1.clone(), "float32", 64.0, 9.0)
            .with_sample(CollectiveKind::AllToAll, groups_dim1, "float32", 64.0, 4.0);
        let env = env_2x2(SolverOption::default()).with_profiling(profile);

        assert_eq!(env.reduce_scatter_cost(256.0, 1), Cost::Finite(9.0));
        assert_eq!(env.all_to_all_cost(256.0, 1), Cost::Finite(4.0));
        // Only reduce-scatter and all-to-all were measured.
        let all_gather = finite(env.all_gather_cost(256.0, 1));
        assert!(approx_eq!(f64, all_gather, 129.1, epsilon = 1e-9));
    }

    #[test]
    fn test_collective_permute_cost() {
        let mesh = mesh(&[2, 2], &[1.0, 10.0], &[1.0, 2.0]);
        let env = ClusterEnvironment::new(mesh, SolverOption::default());

        let in_place = env.collective_permute_cost(100.0, &[(0, 0), (3, 3)]);
        assert_eq!(in_place.unwrap(), Cost::Finite(0.0));
        // 0 -> 1 differs on axis 1 only: 10 + 2 * 100.
        assert_eq!(env.collective_permute_cost(100.0, &[(0, 1)]).unwrap(), Cost::Finite(210.0));
        // 0 -> 3 differs on both axes: (1 + 100) + (10 + 200); the slowest pair wins.
        assert_eq!(
            env.collective_permute_cost(100.0, &[(0, 1), (0, 3), (2, 0)]).unwrap(),
            Cost::Finite(311.0)
        );
        assert_eq!(env.collective_permute_cost(100.0, &[]).unwrap(), Cost::ZERO);
    }

    #[test]
    fn test_collective_permute_rejects_unknown_devices() {
        let env = env_2x2(SolverOption::default());

        assert_eq!(
            env.collective_permute_cost(1.0, &[(0, 9)]),
            Err(CostModelError::UnknownDevice { device: 9 })
        );
    }

    #[test]
    fn test_dot_cost() {
        let lhs = TensorShape::new([8, 8], DType::F32);
        let rhs = TensorShape::new([8, 8], DType::F32);
        let dnums = DotDimensionNumbers {
            lhs_contracting_dims: vec![1],
            rhs_contracting_dims: vec![0],
            ..Default::default()
        };

        let disabled = env_2x2(SolverOption::default());
        assert_eq!(disabled.dot_cost(&lhs, &rhs, &dnums), Cost::Infinite);

        let enabled = env_2x2(SolverOption {
            allow_recompute_heavy_op: true,
            ..Default::default()
        });
        let num_bytes = 512.0;
        let expected = enabled.all_reduce_cost(num_bytes, 0, None)
            + enabled.all_reduce_cost(num_bytes, 1, None);
        assert_eq!(enabled.dot_cost(&lhs, &rhs, &dnums), expected);
    }

    #[test]
    fn test_environment_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClusterEnvironment>();
    }
}
