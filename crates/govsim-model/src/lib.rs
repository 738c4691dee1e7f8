#![warn(missing_docs)]
#![doc = include_str!("../readme.md")]

pub mod error;
pub mod soc;
pub mod workload;

pub use error::ModelError;
pub use soc::{Cluster, ClusterModel, Opp, Soc};
pub use workload::{LoadSlice, Workload};
