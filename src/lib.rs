//! Volume booster: places randomized buy and sell orders until a target
//! traded volume is reached.

pub mod booster;
pub mod config;
pub mod domain;
pub mod exchanges;

pub use booster::{Booster, BoosterConfig, BoosterError};
pub use config::Config;
