// crates/kelp-economics/src/lib.rs
//
// kelp-economics: KELP token, halving emission schedule, the Forest
// staking/accounting engine, harvest fees, and the treasury buyback for
// KelpFi.
//
// All monetary values are tracked in wei (the smallest unit of KELP).
// 1 KELP = 1,000,000,000,000,000,000 wei (10^18).

pub mod config;
pub mod emission;
pub mod forest;
pub mod token;
pub mod treasury;

// Re-export key types for ergonomic access from downstream crates.
pub use config::LaunchConfig;
pub use emission::EmissionSchedule;
pub use forest::{Forest, Pool, UserStake, ACC_PRECISION, BPS_DENOMINATOR};
pub use token::{Kelp, KelpToken, MintAuthority, MAX_SUPPLY_WEI, WEI_PER_KELP};
pub use treasury::{BuybackRecord, Treasury};
