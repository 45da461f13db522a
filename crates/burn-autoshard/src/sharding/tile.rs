use alloc::vec;
use alloc::vec::Vec;

use super::{DeviceId, ShardingError};

/// N-dimensional array of device ids, stored in row-major order.
///
/// Each cell of a tile assignment names the device that holds the corresponding tile of a
/// tensor. The same structure also backs the device grid of a
/// [`DeviceMesh`](super::DeviceMesh).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TileAssignment {
    /// Extent of every dimension.
    dims: Vec<usize>,
    /// Device ids in row-major order.
    devices: Vec<DeviceId>,
}

impl TileAssignment {
    /// Creates a new [`TileAssignment`], checking that `devices` fills `dims` exactly.
    pub fn new<S: Into<Vec<usize>>>(
        dims: S,
        devices: Vec<DeviceId>,
    ) -> Result<Self, ShardingError> {
        let dims = dims.into();
        let expected = dims.iter().product::<usize>();
        if devices.len() != expected {
            return Err(ShardingError::TileCountMismatch {
                expected,
                actual: devices.len(),
            });
        }
        Ok(Self { dims, devices })
    }

    /// Creates the canonical assignment where device `i` holds the `i`-th tile in row-major
    /// order.
    pub fn iota<S: Into<Vec<usize>>>(dims: S) -> Self {
        let dims = dims.into();
        let count = dims.iter().product::<usize>();
        Self {
            dims,
            devices: (0..count as DeviceId).collect(),
        }
    }

    /// Extent of every dimension.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Extent of dimension `idx`.
    pub fn dim(&self, idx: usize) -> usize {
        self.dims[idx]
    }

    /// Number of dimensions.
    pub fn num_dimensions(&self) -> usize {
        self.dims.len()
    }

    /// Total number of cells.
    pub fn num_elements(&self) -> usize {
        self.devices.len()
    }

    /// Device ids in row-major order.
    pub fn devices(&self) -> &[DeviceId] {
        &self.devices
    }

    /// Number of dimensions whose extent is greater than one.
    pub fn num_non_trivial_dims(&self) -> usize {
        greater_than_one_count(&self.dims)
    }

    /// Device at the given multi-index, or `None` if the index is out of bounds.
    pub fn get(&self, indices: &[usize]) -> Option<DeviceId> {
        if indices.len() != self.dims.len() {
            return None;
        }
        let mut linear = 0usize;
        for (&index, &extent) in indices.iter().zip(&self.dims) {
            if index >= extent {
                return None;
            }
            linear = linear * extent + index;
        }
        self.devices.get(linear).copied()
    }

    /// Calls `f` with the multi-index and device of every cell, in row-major order.
    pub fn each<F: FnMut(&[usize], DeviceId)>(&self, mut f: F) {
        for (linear, &device) in self.devices.iter().enumerate() {
            let indices = coordinate_for_linear_index(linear, &self.dims);
            f(&indices, device);
        }
    }

    /// Returns the same devices viewed as a `[num_elements, 1]` column.
    pub(crate) fn as_column(&self) -> Self {
        Self {
            dims: vec![self.devices.len(), 1],
            devices: self.devices.clone(),
        }
    }

    /// Permutes the dimensions so that dimension `i` of the result is dimension `axes[i]` of
    /// `self`.
    ///
    /// `axes` must be a permutation of `0..num_dimensions()`.
    pub fn transpose(&self, axes: &[usize]) -> Self {
        let dims: Vec<usize> = axes.iter().map(|&axis| self.dims[axis]).collect();
        let mut devices = Vec::with_capacity(self.devices.len());
        let mut source = vec![0usize; self.dims.len()];
        for linear in 0..self.devices.len() {
            let target = coordinate_for_linear_index(linear, &dims);
            for (i, &axis) in axes.iter().enumerate() {
                source[axis] = target[i];
            }
            // In bounds: `source` is a permutation of an in-bounds target index.
            let device = self.get(&source).unwrap_or_default();
            devices.push(device);
        }
        Self { dims, devices }
    }
}

/// Number of entries greater than one.
pub(crate) fn greater_than_one_count(values: &[usize]) -> usize {
    values.iter().filter(|&&value| value > 1).count()
}

/// Row-major multi-index of the `index`-th cell of an array with extents `dims`.
pub(crate) fn coordinate_for_linear_index(mut index: usize, dims: &[usize]) -> Vec<usize> {
    let mut coordinate = vec![0usize; dims.len()];
    for axis in (0..dims.len()).rev() {
        let extent = dims[axis];
        coordinate[axis] = index % extent;
        index /= extent;
    }
    coordinate
}
