use super::{to_ether, Block, Transaction};
use alloy_primitives::U256;

/// Hex-encoded selector of `transfer(address,uint256)`.
pub const TOKEN_TRANSFER_SELECTOR: &str = "0xa9059cbb";

/// Aggregates over one block's transaction list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockTotals {
    /// Sum of carried value, in wei.
    pub total_value: U256,
    pub contracts_created: u64,
    pub token_transfers: u64,
    pub value_transfers: u64,
    pub size_bytes: f64,
}

impl BlockTotals {
    /// Classifies every transaction of `block`. The three classifications
    /// are independent of each other.
    pub fn from_block(block: &Block) -> Self {
        let mut totals = BlockTotals {
            size_bytes: block.size.to_bytes(),
            ..Default::default()
        };

        for tx in &block.transactions {
            if tx.to.is_none() {
                totals.contracts_created += 1;
            }

            if is_token_transfer(tx) {
                totals.token_transfers += 1;
            }

            if !tx.value.is_zero() {
                totals.value_transfers += 1;
            }

            totals.total_value = totals.total_value.saturating_add(tx.value);
        }

        totals
    }

    pub fn total_value_ether(&self) -> String {
        to_ether(self.total_value)
    }
}

fn is_token_transfer(tx: &Transaction) -> bool {
    if tx.input.len() < 4 {
        return false;
    }
    let method = format!("0x{}", hex::encode(&tx.input[..4]));
    method == TOKEN_TRANSFER_SELECTOR
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReportedSize;
    use alloy_sol_types::{sol, SolCall};
    use alloy_primitives::{address, Address, Bytes, B256};

    sol! {
        function transfer(address to, uint256 amount) external returns (bool);
    }

    fn tx(to: Option<Address>, value: u64, input: &[u8]) -> Transaction {
        Transaction {
            to,
            value: U256::from(value),
            input: Bytes::copy_from_slice(input),
        }
    }

    fn block(transactions: Vec<Transaction>) -> Block {
        Block {
            number: 1,
            hash: B256::ZERO,
            transactions,
            gas_used: 0,
            gas_limit: 0,
            nonce: 0,
            difficulty: U256::ZERO,
            uncles: 0,
            size: ReportedSize::new("1.50 kB"),
        }
    }

    const RECIPIENT: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

    #[test]
    fn test_selector_matches_erc20_transfer() {
        assert_eq!(
            format!("0x{}", hex::encode(transferCall::SELECTOR)),
            TOKEN_TRANSFER_SELECTOR
        );
    }

    #[test]
    fn test_total_value_is_sum_of_values() {
        let txs = vec![
            tx(Some(RECIPIENT), 5, &[]),
            tx(None, 0, &[0x60, 0x80]),
            tx(Some(RECIPIENT), 1_000_000, &[]),
            tx(Some(RECIPIENT), 0, &[]),
        ];
        let expected: U256 = txs.iter().map(|t| t.value).sum();

        let totals = BlockTotals::from_block(&block(txs));
        assert_eq!(totals.total_value, expected);
        assert_eq!(totals.total_value, U256::from(1_000_005u64));
        assert_eq!(totals.value_transfers, 2);
    }

    #[test]
    fn test_contract_creations_counted_once_each() {
        let totals = BlockTotals::from_block(&block(vec![
            tx(None, 0, &[]),
            tx(Some(RECIPIENT), 0, &[]),
            tx(None, 3, &[]),
        ]));
        assert_eq!(totals.contracts_created, 2);
        // Classifications overlap freely.
        assert_eq!(totals.value_transfers, 1);
    }

    #[test]
    fn test_token_transfer_detection() {
        let call = transferCall {
            to: RECIPIENT,
            amount: U256::from(10u64),
        }
        .abi_encode();

        let totals = BlockTotals::from_block(&block(vec![
            tx(Some(RECIPIENT), 0, &call),
            tx(Some(RECIPIENT), 0, &[0xa9, 0x05, 0x9c, 0xbb]),
            // Shorter payloads never match, even as a prefix.
            tx(Some(RECIPIENT), 0, &[0xa9, 0x05, 0x9c]),
            tx(Some(RECIPIENT), 0, &[0x09, 0x5e, 0xa7, 0xb3, 0x00]),
            tx(Some(RECIPIENT), 0, &[]),
        ]));
        assert_eq!(totals.token_transfers, 2);
        assert_eq!(totals.contracts_created, 0);
    }

    #[test]
    fn test_empty_block() {
        let totals = BlockTotals::from_block(&block(vec![]));
        assert_eq!(totals.total_value, U256::ZERO);
        assert_eq!(totals.total_value_ether(), "0");
        assert_eq!(totals.contracts_created, 0);
        assert_eq!(totals.token_transfers, 0);
        assert_eq!(totals.value_transfers, 0);
        assert_eq!(totals.size_bytes, 1500.0);
    }
}
