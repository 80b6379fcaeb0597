extern crate serde;

#[macro_use]
extern crate serde_derive;

mod ledger;

pub use ledger::*;

/// Largest number of blocks a single scan may request from the node.
pub const MAX_BLOCKS_PER_SCAN: u64 = 500;
