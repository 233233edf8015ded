// crates/kelp-core/src/types.rs
//
// Shared primitive aliases for the KelpFi reward engine.
//
// All monetary amounts are tracked in wei (the smallest unit of KELP,
// 1 KELP = 10^18 wei) as u128 so accumulator arithmetic at 10^18 scale
// cannot overflow intermediate products.

/// Identity of an account, contract, or token. 32 raw bytes.
pub type Address = [u8; 32];

/// Block height on the underlying ledger.
pub type BlockNumber = u64;

/// Token amount in wei (smallest denomination).
pub type Wei = u128;
