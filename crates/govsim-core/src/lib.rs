#![warn(missing_docs)]
#![doc = include_str!("../readme.md")]

pub mod config;
pub mod error;
pub mod freq_table;
pub mod input_boost;
pub mod interactive;
pub mod parallel;
pub mod score;
pub mod sim;
pub mod stats;
pub mod tunables;
pub mod units;
pub mod walt_hmp;

pub use config::MiscConst;
pub use error::{ConfigError, SimError};
pub use score::Score;
pub use sim::{RunMode, Sim};
pub use tunables::Tunables;
