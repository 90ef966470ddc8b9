//! Canned service answers, substituted only when the session's fallback policy allows it.

use crate::api::{TxHashItem, UnspentOutput};
use crate::utils::constants::COMMIT_ITEM_ID;

const MOCK_UTXO_TX_HASH: &str = "5c710aeac5567439926b80b6e6e4ccc503abb3db6478cb4bb004d53cfc2cd5e0";
const MOCK_UTXO_VOUT: u32 = 1;
const MOCK_UTXO_AMOUNT: u64 = 63_464;

const MOCK_COMMIT_TX_HASH: &str =
    "cd09509cc602ea797c5d3218f36b401a6f21202470ea6e2ef98db71d48980e1f";
const MOCK_REVEAL_TX_HASH: &str =
    "64c89978eb7c1b9a197e2d86b49c2d025dc09f70b17bbb76894767e463a7cbec";

pub fn mock_utxos() -> Vec<UnspentOutput> {
    vec![UnspentOutput {
        tx_hash: MOCK_UTXO_TX_HASH.to_string(),
        vout: MOCK_UTXO_VOUT,
        coin_amount: MOCK_UTXO_AMOUNT,
        status: 1,
        token_amount: None,
    }]
}

pub fn mock_tx_hashes() -> Vec<TxHashItem> {
    vec![
        TxHashItem {
            item_id: COMMIT_ITEM_ID.to_string(),
            tx_hash: MOCK_COMMIT_TX_HASH.to_string(),
        },
        TxHashItem {
            item_id: "reveal0".to_string(),
            tx_hash: MOCK_REVEAL_TX_HASH.to_string(),
        },
    ]
}
