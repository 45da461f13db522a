use burn_autoshard::sharding::{
    DeviceMesh, DeviceMeshBuilder, MeshDim, ShardingSpec, TileAssignment,
};
use burn_autoshard::{ClusterEnvironment, Cost, CostModelError, DType, SolverOption, TensorShape};
use float_cmp::approx_eq;

fn mesh(shape: [usize; 2]) -> DeviceMesh {
    DeviceMeshBuilder::iota(shape)
        .with_dim(0, MeshDim::new("data", 1.0, 1.0))
        .with_dim(1, MeshDim::new("model", 1.0, 1.0))
        .build()
        .unwrap()
}

fn tensor() -> TensorShape {
    TensorShape::new([16, 16], DType::F32)
}

fn shardings() -> Vec<ShardingSpec> {
    vec![
        ShardingSpec::Replicated,
        ShardingSpec::iota_tile([2, 2]),
        ShardingSpec::iota_tile([4, 1]),
        ShardingSpec::iota_tile([1, 4]),
        ShardingSpec::tiled(TileAssignment::new([2, 2], vec![0, 2, 1, 3]).unwrap()),
        ShardingSpec::partially_replicated(TileAssignment::iota([2, 1, 2])).unwrap(),
    ]
}

#[test]
fn identity_resharding_is_free() {
    let env = ClusterEnvironment::new(mesh([2, 2]), SolverOption::default());

    for spec in shardings() {
        assert_eq!(env.resharding_cost(&tensor(), &spec, &spec), Ok(Cost::ZERO), "{spec:?}");
    }
}

#[test]
fn undefined_source_is_free_and_undefined_destination_fails() {
    let env = ClusterEnvironment::new(mesh([2, 2]), SolverOption::default());

    for spec in shardings() {
        assert_eq!(env.resharding_cost(&tensor(), &ShardingSpec::Undefined, &spec), Ok(Cost::ZERO));
        if !spec.is_replicated() {
            assert_eq!(
                env.resharding_cost(&tensor(), &spec, &ShardingSpec::Undefined),
                Err(CostModelError::UndefinedDestination)
            );
        }
    }
}

#[test]
fn gather_along_one_mesh_dim() {
    let env = ClusterEnvironment::new(mesh([2, 2]), SolverOption::default());
    let src = ShardingSpec::partially_replicated(TileAssignment::iota([2, 1, 2])).unwrap();

    let cost = env
        .resharding_cost(&tensor(), &src, &ShardingSpec::Replicated)
        .unwrap();

    assert!(approx_eq!(f64, cost.finite().unwrap(), 513.1, epsilon = 1e-9));
}

#[test]
fn all_to_all_only_on_effectively_one_dimensional_mesh() {
    let src = ShardingSpec::iota_tile([4, 1]);
    let dst = ShardingSpec::iota_tile([1, 4]);

    let env = ClusterEnvironment::new(mesh([1, 4]), SolverOption::default());
    let cost = env.resharding_cost(&tensor(), &src, &dst).unwrap();
    assert_eq!(cost, env.all_to_all_cost(tensor().bytes(), 1));
    assert!(!cost.is_infinite());

    let env = ClusterEnvironment::new(mesh([2, 2]), SolverOption::default());
    assert_eq!(env.resharding_cost(&tensor(), &src, &dst), Ok(Cost::Infinite));
}

#[test]
fn differing_tiling_dimensionality_uses_mixed_cost() {
    let env = ClusterEnvironment::new(mesh([2, 2]), SolverOption::default());
    let src = ShardingSpec::iota_tile([4, 1]);
    let dst = ShardingSpec::iota_tile([2, 2]);

    let cost = env.resharding_cost(&tensor(), &src, &dst).unwrap();

    // The per-dimension path would only slice here and report zero.
    assert!(cost > Cost::ZERO);
    assert!(!cost.is_infinite());
}

#[test]
fn infinite_cost_saturates_for_solvers() {
    let env = ClusterEnvironment::new(
        mesh([2, 2]),
        SolverOption::from_json(r#"{ "force_batch_dim_to_mesh_dim": 0 }"#).unwrap(),
    );
    let src = ShardingSpec::partially_replicated(TileAssignment::iota([2, 1, 2])).unwrap();

    let cost = env
        .resharding_cost(&tensor(), &src, &ShardingSpec::Replicated)
        .unwrap();

    assert!(cost.is_infinite());
    assert_eq!(cost.to_f64_saturating(), burn_autoshard::INFINITY_COST);
    assert!(cost > Cost::Finite(1e300));
}
