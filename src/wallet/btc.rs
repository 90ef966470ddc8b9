use std::fmt;
use std::str::FromStr;

use bitcoin::consensus::deserialize;
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::key::Secp256k1;
use bitcoin::secp256k1::All;
use bitcoin::{Address, Amount, Network, PrivateKey, Transaction, Txid};

use super::builder::signer::Wallet;
use super::builder::{
    CreateInscriptionArgs, CreateTransferArgs, OrdTransactionBuilder, RevealTarget, ScriptType,
    Utxo,
};
use super::registry::{ChainWallet, InscribeRequest, PrevOutput, SignRequest, SignedTx, TransferRequest};
use crate::inscription::TextInscription;
use crate::utils::constants::BTC_CHAIN_ID;
use crate::utils::fees::fee_rate_from_sat_per_vb;
use crate::SigningError;

/// Bitcoin wallet signing with locally held private keys.
///
/// A key controls an address when the address is its P2WPKH address or its key-path-only
/// P2TR address.
pub struct BtcWallet {
    network: Network,
    keys: Vec<PrivateKey>,
    secp: Secp256k1<All>,
}

impl fmt::Debug for BtcWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BtcWallet")
            .field("network", &self.network)
            .field("keys", &self.keys.len())
            .finish()
    }
}

impl BtcWallet {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            keys: Vec::new(),
            secp: Secp256k1::new(),
        }
    }

    /// Adds the WIF-encoded private key to the wallet.
    pub fn with_private_key(mut self, wif: &str) -> Result<Self, SigningError> {
        let private_key = PrivateKey::from_wif(wif.trim())
            .map_err(|_| SigningError::InvalidPrivateKey("not a valid WIF key".to_string()))?;
        self.keys.push(private_key);
        Ok(self)
    }

    pub fn add_private_key(&mut self, private_key: PrivateKey) {
        self.keys.push(private_key);
    }

    pub fn network(&self) -> Network {
        self.network
    }

    fn parse_address(&self, address: &str) -> Result<Address, SigningError> {
        Address::from_str(address)
            .map_err(|err| SigningError::InvalidAddress {
                address: address.to_string(),
                reason: err.to_string(),
            })?
            .require_network(self.network)
            .map_err(|err| SigningError::InvalidAddress {
                address: address.to_string(),
                reason: err.to_string(),
            })
    }

    /// Builds a transaction builder signing with the key controlling `address`.
    fn builder_for(&self, address: &Address) -> Result<OrdTransactionBuilder, SigningError> {
        let script_pubkey = address.script_pubkey();
        let script_type = ScriptType::from_script(&script_pubkey)
            .ok_or_else(|| SigningError::InvalidScriptType(address.to_string()))?;

        let private_key = self
            .keys
            .iter()
            .find(|key| {
                self.controlled_script(key, script_type)
                    .map(|script| script == script_pubkey)
                    .unwrap_or(false)
            })
            .ok_or_else(|| SigningError::MissingPrivateKey(address.to_string()))?;

        Ok(OrdTransactionBuilder::new(
            Wallet::new(*private_key),
            script_type,
            script_pubkey,
            self.network,
        ))
    }

    fn controlled_script(
        &self,
        private_key: &PrivateKey,
        script_type: ScriptType,
    ) -> Result<bitcoin::ScriptBuf, SigningError> {
        let public_key = private_key.public_key(&self.secp);
        let address = match script_type {
            ScriptType::P2WPKH => Address::p2wpkh(&public_key, self.network).map_err(|err| {
                SigningError::InvalidAddress {
                    address: public_key.to_string(),
                    reason: err.to_string(),
                }
            })?,
            ScriptType::P2TR => {
                let (x_only, _) = public_key.inner.x_only_public_key();
                Address::p2tr(&self.secp, x_only, None, self.network)
            }
        };

        Ok(address.script_pubkey())
    }

    fn sign_inscription(&self, request: InscribeRequest) -> Result<SignedTx, SigningError> {
        let address = self.parse_address(&request.address)?;
        let builder = self.builder_for(&address)?;

        let targets = request
            .inscriptions
            .iter()
            .map(|data| {
                Ok(RevealTarget {
                    inscription: TextInscription::new(&data.content_type, &data.body),
                    recipient: self.parse_address(&data.reveal_addr)?,
                })
            })
            .collect::<Result<Vec<_>, SigningError>>()?;

        let set = builder.build_inscription_set(CreateInscriptionArgs {
            inputs: to_utxos(&request.commit_tx_prev_outputs)?,
            targets,
            leftovers_recipient: self.parse_address(&request.change_address)?,
            reveal_value: Amount::from_sat(request.reveal_out_value),
            commit_fee_rate: fee_rate_from_sat_per_vb(request.commit_fee_rate)?,
            reveal_fee_rate: fee_rate_from_sat_per_vb(request.reveal_fee_rate)?,
        })?;

        Ok(SignedTx::Inscription(set))
    }

    fn sign_transfer(&self, request: TransferRequest) -> Result<SignedTx, SigningError> {
        let address = self.parse_address(&request.address)?;
        let builder = self.builder_for(&address)?;

        let tx = builder.build_transfer_transaction(CreateTransferArgs {
            leading_inputs: to_utxos(&request.leading_inputs)?,
            funding_inputs: to_utxos(&request.inputs)?,
            recipient: self.parse_address(&request.output.address)?,
            value: Amount::from_sat(request.output.amount),
            leftovers_recipient: address,
            fee_rate: fee_rate_from_sat_per_vb(request.fee_per_b)?,
        })?;

        Ok(SignedTx::Raw(serialize_hex(&tx)))
    }
}

impl ChainWallet for BtcWallet {
    fn chain_id(&self) -> u32 {
        BTC_CHAIN_ID
    }

    fn sign_transaction(&self, request: SignRequest) -> Result<SignedTx, SigningError> {
        match request {
            SignRequest::Inscribe(request) => self.sign_inscription(request),
            SignRequest::Transfer(request) => self.sign_transfer(request),
        }
    }

    fn calc_tx_hash(&self, signed_tx: &str) -> Result<String, SigningError> {
        let tx: Transaction = deserialize(&hex::decode(signed_tx)?)?;
        Ok(tx.txid().to_string())
    }

    fn valid_address(&self, address: &str) -> bool {
        self.parse_address(address).is_ok()
    }
}

fn to_utxos(outputs: &[PrevOutput]) -> Result<Vec<Utxo>, SigningError> {
    outputs
        .iter()
        .map(|output| {
            Ok(Utxo {
                id: Txid::from_str(&output.tx_id)
                    .map_err(|_| SigningError::InvalidTxid(output.tx_id.clone()))?,
                index: output.v_out,
                amount: Amount::from_sat(output.amount),
            })
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::test_utils::{p2tr_address, p2wpkh_address, TEST_WIF, TEST_TXID};
    use crate::wallet::registry::{InscriptionData, TransferOutput};

    fn wallet() -> BtcWallet {
        BtcWallet::new(Network::Testnet)
            .with_private_key(TEST_WIF)
            .unwrap()
    }

    fn inscribe_request(address: &str, inputs: Vec<PrevOutput>) -> InscribeRequest {
        InscribeRequest {
            address: address.to_string(),
            commit_tx_prev_outputs: inputs,
            commit_fee_rate: 10,
            reveal_fee_rate: 10,
            reveal_out_value: 546,
            inscriptions: vec![InscriptionData {
                content_type: "text/plain;charset=utf-8".to_string(),
                body: r#"{"p":"brc-20","op":"mint","tick":"okex","amt":"5"}"#.to_string(),
                reveal_addr: address.to_string(),
            }],
            change_address: address.to_string(),
        }
    }

    fn prev_output(amount: u64) -> PrevOutput {
        PrevOutput {
            tx_id: TEST_TXID.to_string(),
            v_out: 1,
            amount,
        }
    }

    #[test]
    fn test_should_sign_inscription_from_p2wpkh_address() {
        let address = p2wpkh_address();
        let signed = wallet()
            .sign_transaction(SignRequest::Inscribe(inscribe_request(
                &address,
                vec![prev_output(63_464)],
            )))
            .unwrap();

        let SignedTx::Inscription(set) = signed else {
            panic!("expected an inscription set");
        };
        assert_eq!(set.reveal_txs.len(), 1);
        assert_eq!(set.commit_addrs.len(), 1);
    }

    #[test]
    fn test_should_sign_inscription_from_p2tr_address() {
        let address = p2tr_address();
        let signed = wallet()
            .sign_transaction(SignRequest::Inscribe(inscribe_request(
                &address,
                vec![prev_output(63_464)],
            )))
            .unwrap();

        let SignedTx::Inscription(set) = signed else {
            panic!("expected an inscription set");
        };
        let commit_tx: Transaction = deserialize(&hex::decode(&set.commit_tx).unwrap()).unwrap();
        // key path spend
        assert_eq!(commit_tx.input[0].witness.len(), 1);
        assert_eq!(commit_tx.input[0].witness.nth(0).unwrap().len(), 64);
    }

    #[test]
    fn test_should_fail_without_key_for_address() {
        let err = BtcWallet::new(Network::Testnet)
            .sign_transaction(SignRequest::Inscribe(inscribe_request(
                &p2wpkh_address(),
                vec![prev_output(63_464)],
            )))
            .unwrap_err();

        assert!(matches!(err, SigningError::MissingPrivateKey(_)));
    }

    #[test]
    fn test_should_fail_on_empty_inputs() {
        let err = wallet()
            .sign_transaction(SignRequest::Inscribe(inscribe_request(
                &p2wpkh_address(),
                vec![],
            )))
            .unwrap_err();

        assert!(matches!(err, SigningError::NoInputs));
    }

    #[test]
    fn test_should_sign_transfer_and_hash_it() {
        let wallet = wallet();
        let address = p2wpkh_address();
        let signed = wallet
            .sign_transaction(SignRequest::Transfer(TransferRequest {
                address: address.clone(),
                leading_inputs: vec![PrevOutput {
                    v_out: 0,
                    ..prev_output(546)
                }],
                inputs: vec![prev_output(20_000)],
                output: TransferOutput {
                    address: "tb1qax89amll2uas5k92tmuc8rdccmqddqw94vrr86".to_string(),
                    amount: 546,
                },
                fee_per_b: 5,
            }))
            .unwrap();

        let SignedTx::Raw(raw) = signed else {
            panic!("expected a raw transaction");
        };
        let tx: Transaction = deserialize(&hex::decode(&raw).unwrap()).unwrap();
        assert_eq!(wallet.calc_tx_hash(&raw).unwrap(), tx.txid().to_string());
        assert_eq!(tx.input[0].previous_output.vout, 0);
        assert_eq!(tx.input[1].previous_output.vout, 1);
        assert_eq!(tx.output[0].value, Amount::from_sat(546));
    }

    #[test]
    fn test_should_reject_garbage_transaction() {
        assert!(matches!(
            wallet().calc_tx_hash("zz"),
            Err(SigningError::MalformedTransaction(_))
        ));
        assert!(matches!(
            wallet().calc_tx_hash("00"),
            Err(SigningError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn test_should_validate_addresses_for_network() {
        let wallet = wallet();
        assert!(wallet.valid_address(&p2wpkh_address()));
        assert!(wallet.valid_address("tb1qax89amll2uas5k92tmuc8rdccmqddqw94vrr86"));
        assert!(!wallet.valid_address(
            "bc1pxwww0ct9ue7e8tdnlmug5m2tamfn7q06sahstg39ys4c9f3340qqxrdu9k"
        ));
        assert!(!wallet.valid_address(""));
    }

    #[test]
    fn test_should_not_leak_keys_in_debug() {
        let debug = format!("{:?}", wallet());
        assert!(!debug.contains(TEST_WIF));
        assert!(debug.contains("keys: 1"));
    }
}
