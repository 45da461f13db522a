use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use super::tile::{coordinate_for_linear_index, greater_than_one_count};
use super::{DeviceId, TileAssignment};

/// Represents a logical mesh dimension and the cost of communicating along it.
///
/// Mesh dimensions organize parallel computation workloads, such as data or tensor
/// parallelism, across the mesh. Besides its name, each dimension carries the two
/// coefficients of the alpha-beta communication model: `alpha` is the fixed latency of a
/// collective over the dimension and `beta` is the cost per byte moved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshDim {
    /// A name that uniquely identifies the mesh dimension.
    name: String,
    /// Latency term of the alpha-beta model.
    alpha: f64,
    /// Bandwidth term of the alpha-beta model.
    beta: f64,
}

impl MeshDim {
    /// Constructs a new [`MeshDim`] with the given name and cost coefficients.
    pub fn new<S: Into<String>>(name: S, alpha: f64, beta: f64) -> Self {
        MeshDim {
            name: name.into(),
            alpha,
            beta,
        }
    }

    /// Name of the dimension.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Latency coefficient.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Bandwidth coefficient.
    pub fn beta(&self) -> f64 {
        self.beta
    }
}

/// Represents the device topology of a cluster used for parallel computation.
///
/// A `DeviceMesh` arranges globally unique device ids in an N-dimensional logical grid and
/// attaches an alpha-beta cost pair to every grid dimension. For example, a 2D mesh with
/// shape `[2, 4]` and dimensions `["dp", "tp"]` represents 2-way data parallelism and
/// 4-way tensor parallelism over 8 devices.
///
/// A mesh is immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceMesh {
    /// Physical devices in an n-dimensional logical arrangement
    devices: TileAssignment,
    /// Mesh dimensions, in index order
    dims: Vec<MeshDim>,
}

impl DeviceMesh {
    /// Extent of every mesh dimension.
    pub fn dimensions(&self) -> &[usize] {
        self.devices.dims()
    }

    /// Extent of mesh dimension `idx`, or `None` if the mesh has no such dimension.
    pub fn dim(&self, idx: usize) -> Option<usize> {
        self.devices.dims().get(idx).copied()
    }

    /// Number of mesh dimensions.
    pub fn num_dimensions(&self) -> usize {
        self.devices.num_dimensions()
    }

    /// Total number of devices.
    pub fn num_elements(&self) -> usize {
        self.devices.num_elements()
    }

    /// Number of mesh dimensions with more than one device.
    pub fn num_non_trivial_dims(&self) -> usize {
        greater_than_one_count(self.devices.dims())
    }

    /// Latency coefficient of every mesh dimension.
    pub fn alpha(&self) -> Vec<f64> {
        self.dims.iter().map(MeshDim::alpha).collect()
    }

    /// Bandwidth coefficient of every mesh dimension.
    pub fn beta(&self) -> Vec<f64> {
        self.dims.iter().map(MeshDim::beta).collect()
    }

    /// Device grid.
    pub fn devices(&self) -> &TileAssignment {
        &self.devices
    }

    /// Calls `f` with the coordinate and id of every device, in row-major order.
    pub fn each<F: FnMut(&[usize], DeviceId)>(&self, f: F) {
        self.devices.each(f)
    }

    /// Builds the lookup table from device id to mesh coordinate.
    pub fn device_coordinates(&self) -> HashMap<DeviceId, Vec<usize>> {
        let mut coordinates = HashMap::with_capacity(self.num_elements());
        self.each(|indices, device| {
            coordinates.insert(device, indices.to_vec());
        });
        coordinates
    }

    /// Groups of devices that communicate when a collective runs along `mesh_dim`.
    ///
    /// Every group holds the devices that share all coordinates except the one on
    /// `mesh_dim`, ordered by that coordinate. Returns an empty list for an out-of-range
    /// dimension.
    pub fn replica_groups(&self, mesh_dim: usize) -> Vec<Vec<DeviceId>> {
        let Some(extent) = self.dim(mesh_dim) else {
            return Vec::new();
        };
        let dims = self.dimensions();
        let mut groups = Vec::with_capacity(self.num_elements() / extent.max(1));
        for linear in 0..self.num_elements() {
            let coordinate = coordinate_for_linear_index(linear, dims);
            if coordinate[mesh_dim] != 0 {
                continue;
            }
            let mut group = Vec::with_capacity(extent);
            let mut member = coordinate;
            for i in 0..extent {
                member[mesh_dim] = i;
                if let Some(device) = self.devices.get(&member) {
                    group.push(device);
                }
            }
            groups.push(group);
        }
        groups
    }

    /// Returns the device grid in row-major order, viewed as a `[num_elements, 1]` array.
    ///
    /// One-dimensional shardings are resolved against this view, since they cannot name a
    /// specific axis of a multi-dimensional mesh.
    pub fn flattened(&self) -> TileAssignment {
        self.devices.as_column()
    }
}

/// Represents errors that can occur when constructing a `DeviceMesh`.
///
/// These errors are typically related to invalid dimension mappings or mismatches
/// between the device count and the mesh shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeviceMeshError {
    /// An invalid dimension was specified.
    #[error("invalid mesh dimension: {0}")]
    InvalidDimension(String),
    /// The mesh configuration is invalid.
    #[error("invalid device mesh: {0}")]
    InvalidMesh(String),
}

/// A builder for constructing a [`DeviceMesh`].
///
/// This builder allows you to define a logical mesh structure with a shape and
/// specific dimension mappings. Once all dimensions are mapped, the builder can
/// be used to construct the [`DeviceMesh`] instance.
#[derive(Clone, Debug)]
pub struct DeviceMeshBuilder {
    /// Physical devices in an n-dimensional logical arrangement.
    devices: Vec<DeviceId>,
    /// Shape of the logical mesh.
    shape: Vec<usize>,
    /// Dimensions in insertion order, with the index they were assigned to.
    dims: Vec<(usize, MeshDim)>,
}

impl DeviceMeshBuilder {
    /// Creates a new [`DeviceMeshBuilder`] with the given devices and shape.
    ///
    /// # Arguments
    /// * `devices` - Device ids to be arranged in the mesh, in row-major order.
    /// * `shape` - A vector representing the shape (dimensions) of the mesh.
    pub fn new<S: Into<Vec<usize>>>(devices: Vec<DeviceId>, shape: S) -> Self {
        Self {
            devices,
            shape: shape.into(),
            dims: Vec::new(),
        }
    }

    /// Creates a builder whose devices are numbered `0..n` in row-major order.
    pub fn iota<S: Into<Vec<usize>>>(shape: S) -> Self {
        let shape = shape.into();
        let count = shape.iter().product::<usize>();
        Self::new((0..count as DeviceId).collect(), shape)
    }

    /// Adds a dimension to the logical mesh, associating it with a specific index.
    ///
    /// Each dimension should correspond to a unique index in the shape of the mesh and
    /// carries the alpha-beta coefficients used to price collectives along it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use burn_autoshard::sharding::{DeviceMeshBuilder, MeshDim};
    ///
    /// let mesh = DeviceMeshBuilder::new(vec![0, 1, 2, 3], [2, 2])
    ///     .with_dim(0, MeshDim::new("data_parallel", 1.0, 1.0))
    ///     .with_dim(1, MeshDim::new("tensor_parallel", 1.0, 0.1))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(mesh.num_elements(), 4);
    /// ```
    pub fn with_dim(mut self, idx: usize, dim: MeshDim) -> Self {
        self.dims.push((idx, dim));
        self
    }

    /// Builds a [`DeviceMesh`] from the current configuration.
    ///
    /// This method performs validation to ensure that all dimensions are correctly
    /// mapped, that their cost coefficients are usable, and that the devices match the
    /// expected shape. If the validation fails, an error is returned.
    pub fn build(self) -> Result<DeviceMesh, DeviceMeshError> {
        let ndim = self.shape.len();
        let mut by_index: Vec<Option<MeshDim>> = alloc::vec![None; ndim];
        let mut seen_names = HashSet::new();

        for (idx, dim) in self.dims {
            if idx >= ndim {
                return Err(DeviceMeshError::InvalidDimension(format!(
                    "Index {} exceeds mesh shape {:?}",
                    idx, self.shape
                )));
            }
            if by_index[idx].is_some() {
                return Err(DeviceMeshError::InvalidDimension(format!(
                    "Dimension {} already mapped",
                    idx
                )));
            }
            if !seen_names.insert(dim.name.clone()) {
                return Err(DeviceMeshError::InvalidDimension(format!(
                    "Dimension name '{}' used more than once",
                    dim.name
                )));
            }
            let valid_coefficient = |value: f64| value.is_finite() && value >= 0.0;
            if !(valid_coefficient(dim.alpha) && valid_coefficient(dim.beta)) {
                return Err(DeviceMeshError::InvalidDimension(format!(
                    "Dimension '{}' has invalid cost coefficients (alpha {}, beta {})",
                    dim.name, dim.alpha, dim.beta
                )));
            }
            by_index[idx] = Some(dim);
        }

        let dims: Vec<MeshDim> = by_index.into_iter().flatten().collect();
        if dims.len() != ndim {
            return Err(DeviceMeshError::InvalidMesh(format!(
                "Not all mesh dimensions are mapped. Got {}, expected {}",
                dims.len(),
                ndim
            )));
        }

        if let Some(idx) = self.shape.iter().position(|&extent| extent == 0) {
            return Err(DeviceMeshError::InvalidMesh(format!(
                "Mesh dimension {} has extent 0",
                idx
            )));
        }

        let expected_devices = self.shape.iter().product::<usize>();
        if self.devices.len() != expected_devices {
            return Err(DeviceMeshError::InvalidMesh(format!(
                "Device count ({}) doesn't match mesh shape {:?}",
                self.devices.len(),
                self.shape,
            )));
        }

        let mut seen_devices = HashSet::with_capacity(self.devices.len());
        for &device in &self.devices {
            if !seen_devices.insert(device) {
                return Err(DeviceMeshError::InvalidMesh(format!(
                    "Device {} appears more than once",
                    device
                )));
            }
        }

        let devices = TileAssignment::new(self.shape, self.devices)
            .map_err(|err| DeviceMeshError::InvalidMesh(format!("{err}")))?;

        Ok(DeviceMesh { devices, dims })
    }
}
