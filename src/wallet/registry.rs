use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::builder::SignedInscriptionSet;
use crate::SigningError;

/// Output spent by a transaction to sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrevOutput {
    pub tx_id: String,
    pub v_out: u32,
    /// Value in satoshis
    pub amount: u64,
}

/// Inscription written by a commit/reveal pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InscriptionData {
    pub content_type: String,
    pub body: String,
    pub reveal_addr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InscribeRequest {
    /// Address owning every input
    pub address: String,
    pub commit_tx_prev_outputs: Vec<PrevOutput>,
    /// sat/vB
    pub commit_fee_rate: u64,
    /// sat/vB
    pub reveal_fee_rate: u64,
    pub reveal_out_value: u64,
    pub inscriptions: Vec<InscriptionData>,
    pub change_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutput {
    pub address: String,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Address owning every input, receiving the change
    pub address: String,
    /// Inputs spent first, in order, e.g. the outputs carrying an inscription
    pub leading_inputs: Vec<PrevOutput>,
    /// Inputs paying for the transfer, spent after the leading ones
    pub inputs: Vec<PrevOutput>,
    /// Single payment output
    pub output: TransferOutput,
    /// sat/vB
    pub fee_per_b: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignRequest {
    Inscribe(InscribeRequest),
    Transfer(TransferRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignedTx {
    Inscription(SignedInscriptionSet),
    /// Hex-encoded signed transaction
    Raw(String),
}

/// Signing capability of a single chain.
pub trait ChainWallet: Send + Sync {
    /// Chain id of the wallet service this wallet signs for.
    fn chain_id(&self) -> u32;

    fn sign_transaction(&self, request: SignRequest) -> Result<SignedTx, SigningError>;

    /// Hash identifying a hex-encoded signed transaction on chain.
    fn calc_tx_hash(&self, signed_tx: &str) -> Result<String, SigningError>;

    fn valid_address(&self, address: &str) -> bool;
}

/// Chain wallets keyed by chain id.
#[derive(Default)]
pub struct WalletRegistry {
    wallets: HashMap<u32, Box<dyn ChainWallet>>,
}

impl WalletRegistry {
    /// Registers `wallet`, replacing any wallet previously registered for the same chain.
    pub fn register(&mut self, wallet: impl ChainWallet + 'static) {
        self.wallets.insert(wallet.chain_id(), Box::new(wallet));
    }

    pub fn get(&self, chain_id: u32) -> Result<&dyn ChainWallet, SigningError> {
        self.wallets
            .get(&chain_id)
            .map(|wallet| wallet.as_ref())
            .ok_or(SigningError::UnsupportedChain(chain_id))
    }
}
