use std::cmp::Ordering;
use std::collections::HashMap;

use ledger_sdk::quantity::parse_quantity_biguint;
use ledger_types::{BalanceChange, Block, Transaction};
use num_bigint::BigInt;

use crate::error::ScanError;

/// Folds transactions into per-address net balance deltas.
///
/// The fold is order-insensitive: blocks, and transactions within a block,
/// may be applied in any order and yield the same deltas. Amounts are kept
/// as arbitrary precision integers so no flow is ever truncated.
#[derive(Debug, Default)]
pub struct BalanceAggregator {
    deltas: HashMap<String, BigInt>,
}

impl BalanceAggregator {
    pub fn new() -> Self {
        BalanceAggregator {
            deltas: HashMap::new(),
        }
    }

    /// Computes the net balance delta of every address referenced by `blocks`.
    pub fn balance_deltas(blocks: &[Block]) -> Result<HashMap<String, BigInt>, ScanError> {
        Ok(BalanceAggregator::from_blocks(blocks)?.deltas)
    }

    /// Returns the address whose balance moved the most across `blocks`, with
    /// its signed delta (negative for a net sender).
    pub fn largest_change(blocks: &[Block]) -> Result<BalanceChange, ScanError> {
        BalanceAggregator::from_blocks(blocks)?.into_largest_change()
    }

    fn from_blocks(blocks: &[Block]) -> Result<Self, ScanError> {
        if blocks.is_empty() {
            return Err(ScanError::NoBlocks);
        }
        let mut aggregator = BalanceAggregator::new();
        for block in blocks.iter() {
            aggregator.apply_block(block)?;
        }
        Ok(aggregator)
    }

    /// A block without transactions is rejected: the node never returns one
    /// for a full-transaction request unless the payload is truncated.
    pub fn apply_block(&mut self, block: &Block) -> Result<(), ScanError> {
        if block.transactions.is_empty() {
            return Err(ScanError::EmptyBlock);
        }
        for transaction in block.transactions.iter() {
            self.apply_transaction(transaction)?;
        }
        Ok(())
    }

    pub fn apply_transaction(&mut self, transaction: &Transaction) -> Result<(), ScanError> {
        let value = parse_quantity_biguint(&transaction.value)
            .map(BigInt::from)
            .map_err(|_| ScanError::InvalidValue(transaction.value.clone()))?;

        // Self-transfers go through both legs and net to zero.
        *self.deltas.entry(transaction.from.clone()).or_default() -= &value;
        if let Some(ref to) = transaction.to {
            *self.deltas.entry(to.clone()).or_default() += &value;
        }
        Ok(())
    }

    pub fn delta_of(&self, address: &str) -> Option<&BigInt> {
        self.deltas.get(address)
    }

    /// Picks the delta with the greatest magnitude. Equal magnitudes are
    /// settled by the lexicographically smallest address, so the winner does
    /// not depend on map iteration order.
    pub fn into_largest_change(self) -> Result<BalanceChange, ScanError> {
        let mut largest: Option<(String, BigInt)> = None;
        for (address, delta) in self.deltas.into_iter() {
            let replace = match largest {
                None => true,
                Some((ref best_address, ref best_delta)) => {
                    match delta.magnitude().cmp(best_delta.magnitude()) {
                        Ordering::Greater => true,
                        Ordering::Equal => address < *best_address,
                        Ordering::Less => false,
                    }
                }
            };
            if replace {
                largest = Some((address, delta));
            }
        }
        let (address, delta) = largest.ok_or(ScanError::NoBlocks)?;
        Ok(BalanceChange::new(address, delta))
    }
}
