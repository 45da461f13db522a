use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

/// Element type of a tensor, as far as the cost model cares about it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    /// 64-bit float.
    F64,
    /// 32-bit float.
    F32,
    /// 16-bit float.
    F16,
    /// 16-bit brain float.
    BF16,
    /// 64-bit signed integer.
    I64,
    /// 32-bit signed integer.
    I32,
    /// 16-bit signed integer.
    I16,
    /// 8-bit signed integer.
    I8,
    /// 8-bit unsigned integer.
    U8,
    /// Boolean.
    Bool,
}

impl DType {
    /// Size of a single element in bytes.
    pub fn size(&self) -> usize {
        match self {
            DType::F64 | DType::I64 => 8,
            DType::F32 | DType::I32 => 4,
            DType::F16 | DType::BF16 | DType::I16 => 2,
            DType::I8 | DType::U8 | DType::Bool => 1,
        }
    }

    /// Label used to key profiled measurements.
    pub fn name(&self) -> &'static str {
        match self {
            DType::F64 => "float64",
            DType::F32 => "float32",
            DType::F16 => "float16",
            DType::BF16 => "bfloat16",
            DType::I64 => "int64",
            DType::I32 => "int32",
            DType::I16 => "int16",
            DType::I8 => "int8",
            DType::U8 => "uint8",
            DType::Bool => "bool",
        }
    }
}

/// Global shape of a (possibly sharded) tensor.
///
/// The cost model only reads the dimensions and element width; the tensor data itself
/// never crosses this boundary.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorShape {
    /// Size of every dimension of the full tensor.
    dims: Vec<usize>,
    /// Element type.
    dtype: DType,
}

impl TensorShape {
    /// Creates a new [`TensorShape`].
    pub fn new<S: Into<Vec<usize>>>(dims: S, dtype: DType) -> Self {
        Self {
            dims: dims.into(),
            dtype,
        }
    }

    /// Dimension sizes.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Element type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Number of elements in the full tensor.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Size of the full tensor in bytes.
    pub fn bytes(&self) -> f64 {
        (self.num_elements() * self.dtype.size()) as f64
    }
}

/// Dimension numbers of a dot product, describing which dimensions are contracted and
/// which are batch dimensions on each operand.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DotDimensionNumbers {
    /// Contracted dimensions of the left operand.
    pub lhs_contracting_dims: Vec<usize>,
    /// Contracted dimensions of the right operand.
    pub rhs_contracting_dims: Vec<usize>,
    /// Batch dimensions of the left operand.
    pub lhs_batch_dims: Vec<usize>,
    /// Batch dimensions of the right operand.
    pub rhs_batch_dims: Vec<usize>,
}
