use alloc::string::{String, ToString};
use alloc::vec::Vec;
use hashbrown::HashMap;

use crate::cluster::CollectiveKind;
use crate::sharding::DeviceId;

/// Source of empirically measured collective costs.
///
/// When [`enabled`](ProfilingResult::enabled) returns `true`, the cluster environment asks
/// the profile before falling back to the analytic alpha-beta model. Estimates are keyed by
/// the replica groups taking part in the collective, the payload size in elements and a
/// dtype label.
pub trait ProfilingResult: Send + Sync {
    /// Whether measurements should be consulted at all.
    fn enabled(&self) -> bool;

    /// Estimated cost of `kind` over `replica_groups`, or `None` without a measurement.
    fn estimate(
        &self,
        kind: CollectiveKind,
        replica_groups: &[Vec<DeviceId>],
        size: f64,
        dtype: &str,
    ) -> Option<f64>;

    /// Estimated all-gather cost.
    fn estimate_all_gather_cost(
        &self,
        replica_groups: &[Vec<DeviceId>],
        size: f64,
        dtype: &str,
    ) -> Option<f64> {
        self.estimate(CollectiveKind::AllGather, replica_groups, size, dtype)
    }

    /// Estimated all-reduce cost.
    fn estimate_all_reduce_cost(
        &self,
        replica_groups: &[Vec<DeviceId>],
        size: f64,
        dtype: &str,
    ) -> Option<f64> {
        self.estimate(CollectiveKind::AllReduce, replica_groups, size, dtype)
    }

    /// Estimated reduce-scatter cost.
    fn estimate_reduce_scatter_cost(
        &self,
        replica_groups: &[Vec<DeviceId>],
        size: f64,
        dtype: &str,
    ) -> Option<f64> {
        self.estimate(CollectiveKind::ReduceScatter, replica_groups, size, dtype)
    }

    /// Estimated all-to-all cost.
    fn estimate_all_to_all_cost(
        &self,
        replica_groups: &[Vec<DeviceId>],
        size: f64,
        dtype: &str,
    ) -> Option<f64> {
        self.estimate(CollectiveKind::AllToAll, replica_groups, size, dtype)
    }
}

/// Profiling disabled: every collective is priced analytically.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProfiling;

impl ProfilingResult for NoProfiling {
    fn enabled(&self) -> bool {
        false
    }

    fn estimate(&self, _: CollectiveKind, _: &[Vec<DeviceId>], _: f64, _: &str) -> Option<f64> {
        None
    }
}

type ProfileKey = (CollectiveKind, Vec<Vec<DeviceId>>, String);

/// Measured collective costs, interpolated between recorded payload sizes.
///
/// Between two measured sizes the cost is linearly interpolated; outside the measured range
/// it is extrapolated from the two nearest samples and clamped at zero. A single sample is
/// returned as is.
#[derive(Clone, Debug, Default)]
pub struct ProfilingTable {
    samples: HashMap<ProfileKey, Vec<(f64, f64)>>,
}

impl ProfilingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `kind` over `replica_groups` moving `size` elements of `dtype` took `cost`.
    ///
    /// A later measurement for the same size replaces the earlier one.
    pub fn record(
        &mut self,
        kind: CollectiveKind,
        replica_groups: Vec<Vec<DeviceId>>,
        dtype: &str,
        size: f64,
        cost: f64,
    ) {
        let samples = self
            .samples
            .entry((kind, replica_groups, dtype.to_string()))
            .or_default();
        match samples.iter_mut().find(|(recorded, _)| *recorded == size) {
            Some(sample) => sample.1 = cost,
            None => {
                samples.push((size, cost));
                samples.sort_by(|a, b| a.0.total_cmp(&b.0));
            }
        }
    }

    /// Builder-style [`record`](Self::record).
    pub fn with_sample(
        mut self,
        kind: CollectiveKind,
        replica_groups: Vec<Vec<DeviceId>>,
        dtype: &str,
        size: f64,
        cost: f64,
    ) -> Self {
        self.record(kind, replica_groups, dtype, size, cost);
        self
    }

    /// Returns `true` when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl ProfilingResult for ProfilingTable {
    fn enabled(&self) -> bool {
        !self.is_empty()
    }

    fn estimate(
        &self,
        kind: CollectiveKind,
        replica_groups: &[Vec<DeviceId>],
        size: f64,
        dtype: &str,
    ) -> Option<f64> {
        let key = (kind, replica_groups.to_vec(), dtype.to_string());
        let samples = self.samples.get(&key)?;
        interpolate(samples, size)
    }
}

fn interpolate(samples: &[(f64, f64)], size: f64) -> Option<f64> {
    match samples {
        [] => None,
        [(_, cost)] => Some(*cost),
        _ => {
            // Segment ending at the first sample not below `size`; the outermost segments
            // extend past the measured range.
            let upper = samples
                .iter()
                .position(|&(recorded, _)| recorded >= size)
                .unwrap_or(samples.len() - 1)
                .max(1);
            let (x0, y0) = samples[upper - 1];
            let (x1, y1) = samples[upper];
            if size == x1 {
                return Some(y1);
            }
            Some((y0 + (y1 - y0) * (size - x0) / (x1 - x0)).max(0.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn groups() -> Vec<Vec<DeviceId>> {
        vec![vec![0, 1], vec![2, 3]]
    }

    #[test]
    fn test_no_profiling_is_disabled() {
        assert!(!NoProfiling.enabled());
        assert_eq!(NoProfiling.estimate_all_gather_cost(&groups(), 1.0, "float32"), None);
    }

    #[test]
    fn test_profiling_table_interpolates() {
        let table = ProfilingTable::new()
            .with_sample(CollectiveKind::AllReduce, groups(), "float32", 100.0, 10.0)
            .with_sample(CollectiveKind::AllReduce, groups(), "float32", 300.0, 30.0);

        assert!(table.enabled());
        assert_eq!(table.estimate_all_reduce_cost(&groups(), 100.0, "float32"), Some(10.0));
        assert_eq!(table.estimate_all_reduce_cost(&groups(), 200.0, "float32"), Some(20.0));
        assert_eq!(table.estimate_all_reduce_cost(&groups(), 300.0, "float32"), Some(30.0));
        assert_eq!(table.estimate_all_reduce_cost(&groups(), 500.0, "float32"), Some(50.0));
        assert_eq!(table.estimate_all_reduce_cost(&groups(), 0.0, "float32"), Some(0.0));
    }

    #[test]
    fn test_profiling_table_keys() {
        let table = ProfilingTable::new()
            .with_sample(CollectiveKind::AllGather, groups(), "float32", 64.0, 3.0);

        assert_eq!(table.estimate_all_gather_cost(&groups(), 1024.0, "float32"), Some(3.0));
        assert_eq!(table.estimate_all_gather_cost(&groups(), 64.0, "float16"), None);
        assert_eq!(table.estimate_reduce_scatter_cost(&groups(), 64.0, "float32"), None);
        assert_eq!(table.estimate_all_gather_cost(&[vec![0, 1, 2, 3]], 64.0, "float32"), None);
    }

    #[test]
    fn test_profiling_table_replaces_duplicate_sizes() {
        let mut table = ProfilingTable::new();
        table.record(CollectiveKind::AllToAll, groups(), "float32", 8.0, 1.0);
        table.record(CollectiveKind::AllToAll, groups(), "float32", 8.0, 2.0);

        assert_eq!(table.estimate_all_to_all_cost(&groups(), 8.0, "float32"), Some(2.0));
    }
}
