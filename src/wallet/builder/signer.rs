use std::fmt;

use bitcoin::hashes::Hash as _;
use bitcoin::key::{Keypair, Secp256k1, TapTweak};
use bitcoin::secp256k1::{self, All};
use bitcoin::sighash::{Prevouts, SighashCache};
use bitcoin::taproot::LeafVersion;
use bitcoin::{
    PrivateKey, PublicKey, ScriptBuf, TapLeafHash, TapSighashType, Transaction, TxOut, Witness,
};

use super::taproot::TaprootPayload;
use super::ScriptType;
use crate::SigningError;

/// Local signer holding the private key of the funding address.
///
/// The key never leaves the process and is not part of the `Debug` output.
pub struct Wallet {
    private_key: PrivateKey,
    secp: Secp256k1<All>,
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

impl Wallet {
    pub fn new(private_key: PrivateKey) -> Self {
        Self {
            private_key,
            secp: Secp256k1::new(),
        }
    }

    pub fn secp(&self) -> &Secp256k1<All> {
        &self.secp
    }

    pub fn public_key(&self) -> PublicKey {
        self.private_key.public_key(&self.secp)
    }

    /// Untweaked keypair, used as internal key and tapscript key of the commit outputs.
    pub fn keypair(&self) -> Keypair {
        Keypair::from_secret_key(&self.secp, &self.private_key.inner)
    }

    /// Signs every input of `transaction`, all of them spending outputs of `script_type`
    /// controlled by this key.
    ///
    /// `prev_outs` must list the outputs spent by the transaction inputs, in the same order.
    pub fn sign_transaction(
        &self,
        transaction: Transaction,
        prev_outs: &[TxOut],
        script_type: ScriptType,
    ) -> Result<Transaction, SigningError> {
        if transaction.input.len() != prev_outs.len() {
            return Err(SigningError::InputNotFound(
                transaction.input.len().min(prev_outs.len()),
            ));
        }

        match script_type {
            ScriptType::P2WPKH => self.sign_p2wpkh(transaction, prev_outs),
            ScriptType::P2TR => self.sign_p2tr_key_spend(transaction, prev_outs),
        }
    }

    /// Signs the single input of a reveal transaction through the inscription leaf.
    pub fn sign_reveal_transaction_schnorr(
        &self,
        taproot: &TaprootPayload,
        redeem_script: &ScriptBuf,
        transaction: Transaction,
    ) -> Result<Transaction, SigningError> {
        let prevouts_array = vec![taproot.commit_output.clone()];
        let prevouts = Prevouts::All(&prevouts_array);

        let mut sighash_cache = SighashCache::new(transaction);
        let sighash_sig = sighash_cache
            .taproot_script_spend_signature_hash(
                0,
                &prevouts,
                TapLeafHash::from_script(redeem_script, LeafVersion::TapScript),
                TapSighashType::Default,
            )
            .map_err(|err| SigningError::BitcoinSigHash(err.to_string()))?;

        let msg = secp256k1::Message::from_digest(sighash_sig.to_byte_array());
        let sig = self.secp.sign_schnorr_no_aux_rand(&msg, &taproot.keypair);

        // verify
        self.secp
            .verify_schnorr(&sig, &msg, &taproot.keypair.x_only_public_key().0)?;

        let signature = bitcoin::taproot::Signature {
            sig,
            hash_ty: TapSighashType::Default,
        };

        let mut witness = Witness::new();
        witness.push(signature.to_vec());
        witness.push(redeem_script.as_bytes());
        witness.push(taproot.control_block.serialize());

        *sighash_cache
            .witness_mut(0)
            .ok_or(SigningError::InputNotFound(0))? = witness;

        Ok(sighash_cache.into_transaction())
    }

    fn sign_p2wpkh(
        &self,
        transaction: Transaction,
        prev_outs: &[TxOut],
    ) -> Result<Transaction, SigningError> {
        let own_pubkey = self.public_key();
        let mut cache = SighashCache::new(transaction);

        for (index, prev_out) in prev_outs.iter().enumerate() {
            let sighash = cache
                .p2wpkh_signature_hash(
                    index,
                    &prev_out.script_pubkey,
                    prev_out.value,
                    bitcoin::EcdsaSighashType::All,
                )
                .map_err(|err| SigningError::BitcoinSigHash(err.to_string()))?;

            let message = secp256k1::Message::from_digest(sighash.to_byte_array());
            let signature = self.secp.sign_ecdsa(&message, &self.private_key.inner);
            self.secp
                .verify_ecdsa(&message, &signature, &own_pubkey.inner)?;

            let signature = bitcoin::ecdsa::Signature::sighash_all(signature);
            *cache
                .witness_mut(index)
                .ok_or(SigningError::InputNotFound(index))? =
                Witness::p2wpkh(&signature, &own_pubkey.inner);
        }

        Ok(cache.into_transaction())
    }

    fn sign_p2tr_key_spend(
        &self,
        transaction: Transaction,
        prev_outs: &[TxOut],
    ) -> Result<Transaction, SigningError> {
        let tweaked = self.keypair().tap_tweak(&self.secp, None).to_inner();
        let (tweaked_x_only, _) = tweaked.x_only_public_key();
        let prevouts = Prevouts::All(prev_outs);
        let mut cache = SighashCache::new(transaction);

        for index in 0..prev_outs.len() {
            let sighash = cache
                .taproot_key_spend_signature_hash(index, &prevouts, TapSighashType::Default)
                .map_err(|err| SigningError::BitcoinSigHash(err.to_string()))?;

            let message = secp256k1::Message::from_digest(sighash.to_byte_array());
            let sig = self.secp.sign_schnorr_no_aux_rand(&message, &tweaked);
            self.secp.verify_schnorr(&sig, &message, &tweaked_x_only)?;

            let signature = bitcoin::taproot::Signature {
                sig,
                hash_ty: TapSighashType::Default,
            };
            let mut witness = Witness::new();
            witness.push(signature.to_vec());

            *cache
                .witness_mut(index)
                .ok_or(SigningError::InputNotFound(index))? = witness;
        }

        Ok(cache.into_transaction())
    }
}
