use serde::{Deserialize, Serialize};

/// Options of the sharding solver that shape how collectives are priced.
///
/// Missing fields take their [`Default`] value when deserialized, so a configuration
/// document only needs to mention what it changes:
///
/// ```json
/// { "force_batch_dim_to_mesh_dim": 0, "override_all_gather_cost": true, "all_gather_cost": 10.0 }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOption {
    /// Replace every all-gather cost with [`all_gather_cost`](Self::all_gather_cost).
    pub override_all_gather_cost: bool,
    /// Fixed all-gather cost.
    pub all_gather_cost: f64,
    /// Replace every all-reduce cost with [`all_reduce_cost`](Self::all_reduce_cost).
    pub override_all_reduce_cost: bool,
    /// Fixed all-reduce cost.
    pub all_reduce_cost: f64,
    /// Replace every reduce-scatter cost with [`reduce_scatter_cost`](Self::reduce_scatter_cost).
    pub override_reduce_scatter_cost: bool,
    /// Fixed reduce-scatter cost.
    pub reduce_scatter_cost: f64,
    /// Replace every all-to-all cost with [`all_to_all_cost`](Self::all_to_all_cost).
    pub override_all_to_all_cost: bool,
    /// Fixed all-to-all cost.
    pub all_to_all_cost: f64,
    /// Mesh dimension reserved for data parallelism.
    ///
    /// Only all-reduce may run along it; all-gather and all-to-all are forbidden.
    pub force_batch_dim_to_mesh_dim: Option<usize>,
    /// Whether recomputing heavy operators such as dot products may be priced at all.
    pub allow_recompute_heavy_op: bool,
}

impl Default for SolverOption {
    fn default() -> Self {
        Self {
            override_all_gather_cost: false,
            all_gather_cost: 0.0,
            override_all_reduce_cost: false,
            all_reduce_cost: 0.0,
            override_reduce_scatter_cost: false,
            reduce_scatter_cost: 0.0,
            override_all_to_all_cost: false,
            all_to_all_cost: 0.0,
            force_batch_dim_to_mesh_dim: None,
            allow_recompute_heavy_op: false,
        }
    }
}

impl SolverOption {
    /// Parses options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes options to JSON.
    pub fn to_json(&self) -> Result<alloc::string::String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Returns `true` when `mesh_dim` is reserved for data-parallel all-reduce.
    pub fn is_forced_batch_dim(&self, mesh_dim: usize) -> bool {
        self.force_batch_dim_to_mesh_dim == Some(mesh_dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_option_defaults() {
        let option = SolverOption::default();
        assert!(!option.override_all_gather_cost);
        assert!(!option.allow_recompute_heavy_op);
        assert_eq!(option.force_batch_dim_to_mesh_dim, None);
        assert!(!option.is_forced_batch_dim(0));
    }

    #[test]
    fn test_solver_option_partial_json() {
        let json = r#"{
            "force_batch_dim_to_mesh_dim": 1,
            "override_all_to_all_cost": true,
            "all_to_all_cost": 7.5
        }"#;
        let option = SolverOption::from_json(json).unwrap();

        assert!(option.is_forced_batch_dim(1));
        assert!(option.override_all_to_all_cost);
        assert_eq!(option.all_to_all_cost, 7.5);
        assert!(!option.override_all_reduce_cost);
    }

    #[test]
    fn test_solver_option_json_round_trip() {
        let option = SolverOption {
            allow_recompute_heavy_op: true,
            ..Default::default()
        };
        let parsed = SolverOption::from_json(&option.to_json().unwrap()).unwrap();
        assert_eq!(parsed, option);
    }

    #[test]
    fn test_solver_option_rejects_bad_types() {
        assert!(SolverOption::from_json(r#"{ "all_gather_cost": "cheap" }"#).is_err());
    }
}
