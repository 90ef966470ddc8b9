pub mod signer;
mod taproot;

use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::script::Builder as ScriptBuilder;
use bitcoin::transaction::Version;
use bitcoin::{
    Address, Amount, FeeRate, Network, OutPoint, Script, ScriptBuf, Sequence, Transaction, TxIn,
    TxOut, Txid, Witness,
};
use serde::{Deserialize, Serialize};
use signer::Wallet;

use self::taproot::TaprootPayload;
use crate::inscription::Inscription;
use crate::utils::constants::DUST_LIMIT;
use crate::utils::fees::{calculate_transaction_fees, estimate_reveal_fee, estimate_transaction_fees};
use crate::SigningError;

/// Ordinal-aware transaction builder signing with a single local key.
///
/// Every funding input spends an output of the same address, whose type is `script_type`.
#[derive(Debug)]
pub struct OrdTransactionBuilder {
    signer: Wallet,
    script_type: ScriptType,
    /// script pubkey of the funding address
    funding_script: ScriptBuf,
    network: Network,
}

/// Type of the outputs funding the transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    P2WPKH,
    P2TR,
}

impl ScriptType {
    pub fn from_script(script: &Script) -> Option<Self> {
        if script.is_p2wpkh() {
            Some(Self::P2WPKH)
        } else if script.is_p2tr() {
            Some(Self::P2TR)
        } else {
            None
        }
    }
}

/// Inscription to write and the address receiving it once revealed.
#[derive(Debug)]
pub struct RevealTarget<T>
where
    T: Inscription,
{
    pub inscription: T,
    pub recipient: Address,
}

/// Arguments for creating a commit transaction and its reveal transactions
#[derive(Debug)]
pub struct CreateInscriptionArgs<T>
where
    T: Inscription,
{
    /// UTXOs to be used as inputs of the commit transaction
    pub inputs: Vec<Utxo>,
    /// Inscriptions to write, one reveal transaction each
    pub targets: Vec<RevealTarget<T>>,
    /// Address to send the leftovers BTC of the commit transaction
    pub leftovers_recipient: Address,
    /// Value of the output of every reveal transaction
    pub reveal_value: Amount,
    pub commit_fee_rate: FeeRate,
    pub reveal_fee_rate: FeeRate,
}

/// Arguments for creating a plain transfer transaction
#[derive(Debug)]
pub struct CreateTransferArgs {
    /// Inputs to be spent first, in order, e.g. the outputs carrying an inscription
    pub leading_inputs: Vec<Utxo>,
    /// Inputs paying for the transfer
    pub funding_inputs: Vec<Utxo>,
    pub recipient: Address,
    pub value: Amount,
    /// Address to send the leftovers BTC of the transaction
    pub leftovers_recipient: Address,
    pub fee_rate: FeeRate,
}

/// Signed commit transaction and the reveal transactions spending its outputs.
///
/// Transactions are hex-encoded in consensus format, fees are in satoshis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedInscriptionSet {
    pub commit_tx: String,
    pub commit_tx_fee: u64,
    /// Address of every commit output, `commit_addrs[i]` is spent by `reveal_txs[i]`
    pub commit_addrs: Vec<String>,
    pub reveal_txs: Vec<String>,
    pub reveal_tx_fees: Vec<u64>,
}

struct PreparedReveal {
    payload: TaprootPayload,
    redeem_script: ScriptBuf,
    output: TxOut,
    fee: Amount,
}

impl OrdTransactionBuilder {
    pub fn new(
        signer: Wallet,
        script_type: ScriptType,
        funding_script: ScriptBuf,
        network: Network,
    ) -> Self {
        Self {
            signer,
            script_type,
            funding_script,
            network,
        }
    }

    /// Creates and signs the commit transaction and one reveal transaction per target.
    pub fn build_inscription_set<T>(
        &self,
        args: CreateInscriptionArgs<T>,
    ) -> Result<SignedInscriptionSet, SigningError>
    where
        T: Inscription,
    {
        if args.inputs.is_empty() {
            return Err(SigningError::NoInputs);
        }
        if args.targets.is_empty() {
            return Err(SigningError::NoInscriptions);
        }

        let reveals = args
            .targets
            .iter()
            .map(|target| self.prepare_reveal(target, args.reveal_value, args.reveal_fee_rate))
            .collect::<Result<Vec<_>, _>>()?;

        let commit_outputs: Vec<TxOut> = reveals
            .iter()
            .map(|reveal| reveal.payload.commit_output.clone())
            .collect();

        let commit_tx = self.build_funded_transaction(
            &args.inputs,
            commit_outputs,
            &args.leftovers_recipient,
            args.commit_fee_rate,
        )?;
        let commit_tx_fee = Self::paid_fee(&args.inputs, &commit_tx)?;
        let commit_txid = commit_tx.txid();
        debug!("commit transaction {commit_txid}, fee {commit_tx_fee}");

        let mut reveal_txs = Vec::with_capacity(reveals.len());
        for (index, reveal) in reveals.iter().enumerate() {
            let reveal_tx = self.build_reveal_transaction(commit_txid, index as u32, reveal)?;
            debug!("reveal transaction {}: {}", index, reveal_tx.txid());
            reveal_txs.push(serialize_hex(&reveal_tx));
        }

        Ok(SignedInscriptionSet {
            commit_tx: serialize_hex(&commit_tx),
            commit_tx_fee: commit_tx_fee.to_sat(),
            commit_addrs: reveals
                .iter()
                .map(|reveal| reveal.payload.address.to_string())
                .collect(),
            reveal_txs,
            reveal_tx_fees: reveals.iter().map(|reveal| reveal.fee.to_sat()).collect(),
        })
    }

    /// Creates and signs a transaction paying `value` to `recipient`.
    ///
    /// Leading inputs are spent before funding inputs, so the sats they carry flow into the
    /// recipient output.
    pub fn build_transfer_transaction(
        &self,
        args: CreateTransferArgs,
    ) -> Result<Transaction, SigningError> {
        let inputs: Vec<Utxo> = args
            .leading_inputs
            .into_iter()
            .chain(args.funding_inputs)
            .collect();
        if inputs.is_empty() {
            return Err(SigningError::NoInputs);
        }

        let outputs = vec![TxOut {
            value: args.value,
            script_pubkey: args.recipient.script_pubkey(),
        }];

        self.build_funded_transaction(&inputs, outputs, &args.leftovers_recipient, args.fee_rate)
    }

    fn prepare_reveal<T>(
        &self,
        target: &RevealTarget<T>,
        reveal_value: Amount,
        fee_rate: FeeRate,
    ) -> Result<PreparedReveal, SigningError>
    where
        T: Inscription,
    {
        let keypair = self.signer.keypair();
        let (x_public_key, _) = keypair.x_only_public_key();

        let redeem_script = target
            .inscription
            .generate_redeem_script(ScriptBuilder::new(), &x_public_key)?
            .into_script();
        debug!("redeem_script: {redeem_script}");

        let payload = TaprootPayload::build(
            self.signer.secp(),
            keypair,
            x_public_key,
            &redeem_script,
            self.network,
        )?;

        let output = TxOut {
            value: reveal_value,
            script_pubkey: target.recipient.script_pubkey(),
        };
        let fee = estimate_reveal_fee(
            &redeem_script,
            &payload.control_block,
            vec![output.clone()],
            fee_rate,
        )?;
        debug!("reveal fee: {fee}");

        let commit_value = reveal_value
            .checked_add(fee)
            .ok_or(SigningError::AmountOverflow("reveal value plus reveal fee"))?;
        let payload = payload.with_value(commit_value);
        debug!("script_output_address: {}", payload.address);

        Ok(PreparedReveal {
            payload,
            redeem_script,
            output,
            fee,
        })
    }

    fn build_reveal_transaction(
        &self,
        commit_txid: Txid,
        vout: u32,
        reveal: &PreparedReveal,
    ) -> Result<Transaction, SigningError> {
        let unsigned_tx = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint {
                    txid: commit_txid,
                    vout,
                },
                script_sig: ScriptBuf::new(),
                sequence: Sequence::from_consensus(0xffffffff),
                witness: Witness::new(),
            }],
            output: vec![reveal.output.clone()],
        };

        self.signer.sign_reveal_transaction_schnorr(
            &reveal.payload,
            &reveal.redeem_script,
            unsigned_tx,
        )
    }

    /// Spends `inputs` into `outputs`, paying the fee at `fee_rate` and returning the change to
    /// `leftovers_recipient` when it is above the dust limit.
    fn build_funded_transaction(
        &self,
        inputs: &[Utxo],
        mut outputs: Vec<TxOut>,
        leftovers_recipient: &Address,
        fee_rate: FeeRate,
    ) -> Result<Transaction, SigningError> {
        let available = sum_sats(inputs.iter().map(|input| input.amount), "input values")?;
        let spent = sum_sats(outputs.iter().map(|output| output.value), "output values")?;

        let fee_without_change =
            estimate_transaction_fees(self.script_type, inputs.len(), fee_rate, outputs.clone())?;
        let required = spent
            .checked_add(fee_without_change.to_sat())
            .ok_or(SigningError::AmountOverflow("output values plus fee"))?;
        if available < required {
            return Err(SigningError::InsufficientBalance {
                available,
                required,
            });
        }

        let mut outputs_with_change = outputs.clone();
        outputs_with_change.push(TxOut {
            value: Amount::ZERO,
            script_pubkey: leftovers_recipient.script_pubkey(),
        });
        let fee_with_change = estimate_transaction_fees(
            self.script_type,
            inputs.len(),
            fee_rate,
            outputs_with_change,
        )?;

        // leftovers below dust are left to the miners
        let required_with_change = spent
            .checked_add(fee_with_change.to_sat())
            .ok_or(SigningError::AmountOverflow("output values plus fee"))?;
        match available.checked_sub(required_with_change) {
            Some(leftover_amount) if leftover_amount >= DUST_LIMIT => {
                debug!("leftover_amount: {leftover_amount}");
                outputs.push(TxOut {
                    value: Amount::from_sat(leftover_amount),
                    script_pubkey: leftovers_recipient.script_pubkey(),
                });
            }
            _ => debug!("no leftovers output"),
        }

        let tx_in = inputs
            .iter()
            .map(|input| TxIn {
                previous_output: OutPoint {
                    txid: input.id,
                    vout: input.index,
                },
                script_sig: ScriptBuf::new(),
                sequence: Sequence::from_consensus(0xffffffff),
                witness: Witness::new(),
            })
            .collect();

        let unsigned_tx = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: tx_in,
            output: outputs,
        };

        let prev_outs: Vec<TxOut> = inputs
            .iter()
            .map(|input| TxOut {
                value: input.amount,
                script_pubkey: self.funding_script.clone(),
            })
            .collect();

        let tx = self
            .signer
            .sign_transaction(unsigned_tx, &prev_outs, self.script_type)?;
        debug!(
            "signed transaction {} ({} vB, at least {} fee)",
            tx.txid(),
            tx.vsize(),
            calculate_transaction_fees(&tx, fee_rate)?
        );

        Ok(tx)
    }

    fn paid_fee(inputs: &[Utxo], tx: &Transaction) -> Result<Amount, SigningError> {
        let available = sum_sats(inputs.iter().map(|input| input.amount), "input values")?;
        let spent = sum_sats(tx.output.iter().map(|output| output.value), "output values")?;
        Ok(Amount::from_sat(available.saturating_sub(spent)))
    }
}

fn sum_sats(
    mut amounts: impl Iterator<Item = Amount>,
    what: &'static str,
) -> Result<u64, SigningError> {
    amounts.try_fold(0u64, |total, amount| {
        total
            .checked_add(amount.to_sat())
            .ok_or(SigningError::AmountOverflow(what))
    })
}

/// Unspent transaction output to be used as input of a transaction
#[derive(Debug, Clone)]
pub struct Utxo {
    pub id: Txid,
    pub index: u32,
    pub amount: Amount,
}
