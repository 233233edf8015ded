// crates/kelp-core/src/lib.rs
//
// kelp-core: Core types, errors, and trait interfaces for the KelpFi
// reward engine.
//
// This is the leaf crate the rest of the workspace depends on. It defines
// the address/amount/block aliases, the protocol-wide error type, and the
// trait seams through which the engine talks to external token contracts
// and the DEX used for treasury buybacks.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic access from downstream crates.
pub use error::KelpError;
pub use traits::{Exchange, FungibleToken};
pub use types::{Address, BlockNumber, Wei};
