use bitcoin::key::Keypair;
use bitcoin::secp256k1::{All, Secp256k1};
use bitcoin::taproot::{ControlBlock, LeafVersion, TaprootBuilder};
use bitcoin::{Address, Amount, Network, ScriptBuf, TxOut, XOnlyPublicKey};

use crate::SigningError;

/// Commit output locking an inscription envelope behind a single tapscript leaf.
#[derive(Debug, Clone)]
pub struct TaprootPayload {
    pub address: Address,
    pub control_block: ControlBlock,
    pub commit_output: TxOut,
    pub keypair: Keypair,
}

impl TaprootPayload {
    /// Build a taproot payload and get its P2TR address.
    ///
    /// The output value is unknown until the reveal fee is estimated, see [`Self::with_value`].
    pub fn build(
        secp: &Secp256k1<All>,
        keypair: Keypair,
        x_public_key: XOnlyPublicKey,
        redeem_script: &ScriptBuf,
        network: Network,
    ) -> Result<Self, SigningError> {
        let taproot_spend_info = TaprootBuilder::new()
            .add_leaf(0, redeem_script.clone())
            .map_err(|_| SigningError::TaprootCompute)?
            .finalize(secp, x_public_key)
            .map_err(|_| SigningError::TaprootCompute)?;

        let address = Address::p2tr_tweaked(taproot_spend_info.output_key(), network);

        Ok(Self {
            control_block: taproot_spend_info
                .control_block(&(redeem_script.clone(), LeafVersion::TapScript))
                .ok_or(SigningError::TaprootCompute)?,
            keypair,
            commit_output: TxOut {
                value: Amount::ZERO,
                script_pubkey: address.script_pubkey(),
            },
            address,
        })
    }

    /// Sets the value locked in the commit output.
    pub fn with_value(mut self, value: Amount) -> Self {
        self.commit_output.value = value;
        self
    }
}
