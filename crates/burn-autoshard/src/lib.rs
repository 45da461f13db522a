#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Burn automatic sharding cost model.
//!
//! Prices collective communication over a device mesh and the resharding of tensors
//! between layouts, for use by a sharding strategy solver.

extern crate alloc;

mod cluster;
mod cost;
mod error;
mod option;
mod profiling;
mod resharding;
mod tensor;

pub mod sharding;

pub use cluster::*;
pub use cost::*;
pub use error::*;
pub use option::*;
pub use profiling::*;
pub use tensor::*;
