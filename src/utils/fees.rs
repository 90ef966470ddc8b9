use bitcoin::absolute::LockTime;
use bitcoin::taproot::ControlBlock;
use bitcoin::transaction::Version;
use bitcoin::{
    Amount, FeeRate, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness,
};

use crate::wallet::ScriptType;
use crate::SigningError;

/// Single ECDSA signature + SIGHASH type size in bytes.
const ECDSA_SIGHASH_SIZE: usize = 72 + 1;
/// Compressed public key pushed after the ECDSA signature.
const COMPRESSED_PUBKEY_SIZE: usize = 33;
/// Schnorr signature with the default SIGHASH type (omitted from the witness).
const SCHNORR_SIGNATURE_SIZE: usize = 64;

/// Builds a fee rate from the sat/vB value quoted by the wallet service.
pub fn fee_rate_from_sat_per_vb(sat_per_vb: u64) -> Result<FeeRate, SigningError> {
    match FeeRate::from_sat_per_vb(sat_per_vb) {
        Some(fee_rate) if sat_per_vb > 0 => Ok(fee_rate),
        _ => Err(SigningError::InvalidFeeRate(sat_per_vb)),
    }
}

/// Witness with the same size as the one produced when spending an output of `script_type`.
pub fn dummy_witness(script_type: ScriptType) -> Witness {
    match script_type {
        ScriptType::P2WPKH => Witness::from_slice(&[
            vec![0; ECDSA_SIGHASH_SIZE],
            vec![0; COMPRESSED_PUBKEY_SIZE],
        ]),
        ScriptType::P2TR => Witness::from_slice(&[vec![0; SCHNORR_SIGNATURE_SIZE]]),
    }
}

pub fn estimate_transaction_fees(
    script_type: ScriptType,
    number_of_inputs: usize,
    current_fee_rate: FeeRate,
    outputs: Vec<TxOut>,
) -> Result<Amount, SigningError> {
    let vbytes = estimate_vbytes(number_of_inputs, script_type, outputs);

    fee_for_vbytes(current_fee_rate, vbytes)
}

/// Fee of a reveal transaction spending the inscription leaf through the script path.
///
/// The witness of a script path spend is `[signature, script, control block]`, all of known
/// size before signing, so the estimate is exact.
pub fn estimate_reveal_fee(
    redeem_script: &ScriptBuf,
    control_block: &ControlBlock,
    outputs: Vec<TxOut>,
    current_fee_rate: FeeRate,
) -> Result<Amount, SigningError> {
    let witness = Witness::from_slice(&[
        vec![0; SCHNORR_SIGNATURE_SIZE],
        redeem_script.to_bytes(),
        control_block.serialize(),
    ]);

    let reveal_tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::null(),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
            witness,
        }],
        output: outputs,
    };

    fee_for_vbytes(current_fee_rate, reveal_tx.vsize())
}

pub fn calculate_transaction_fees(
    transaction: &Transaction,
    current_fee_rate: FeeRate,
) -> Result<Amount, SigningError> {
    fee_for_vbytes(current_fee_rate, transaction.vsize())
}

fn fee_for_vbytes(current_fee_rate: FeeRate, vbytes: usize) -> Result<Amount, SigningError> {
    current_fee_rate
        .fee_vb(vbytes as u64)
        .ok_or(SigningError::InvalidFeeRate(current_fee_rate.to_sat_per_vb_floor()))
}

fn estimate_vbytes(inputs: usize, script_type: ScriptType, outputs: Vec<TxOut>) -> usize {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: (0..inputs)
            .map(|_| TxIn {
                previous_output: OutPoint::null(),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
                witness: dummy_witness(script_type),
            })
            .collect(),
        output: outputs,
    }
    .vsize()
}

#[cfg(test)]
mod tests {
    use bitcoin::address::NetworkUnchecked;
    use bitcoin::Address;

    use super::*;

    const ADDITIONAL_P2TR_INPUT_VBYTES: usize = 57;
    const ADDITIONAL_OUTPUT_VBYTES: usize = 43;

    fn outputs(amount: usize) -> Vec<TxOut> {
        let dummy_address = "bc1pxwww0ct9ue7e8tdnlmug5m2tamfn7q06sahstg39ys4c9f3340qqxrdu9k"
            .parse::<Address<NetworkUnchecked>>()
            .unwrap()
            .assume_checked();
        vec![
            TxOut {
                value: Amount::ZERO,
                script_pubkey: dummy_address.script_pubkey(),
            };
            amount
        ]
    }

    #[test]
    fn test_should_estimate_vbytes() {
        let before = estimate_vbytes(0, ScriptType::P2TR, Vec::new());
        let after = estimate_vbytes(1, ScriptType::P2TR, Vec::new());
        assert_eq!(after - before, ADDITIONAL_P2TR_INPUT_VBYTES);
    }

    #[test]
    fn additional_output_size_is_correct() {
        let before = estimate_vbytes(0, ScriptType::P2TR, Vec::new());
        let after = estimate_vbytes(0, ScriptType::P2TR, outputs(1));
        assert_eq!(after - before, ADDITIONAL_OUTPUT_VBYTES);
    }

    #[test]
    fn p2wpkh_inputs_are_heavier_than_p2tr_inputs() {
        let p2wpkh = estimate_vbytes(3, ScriptType::P2WPKH, outputs(2));
        let p2tr = estimate_vbytes(3, ScriptType::P2TR, outputs(2));
        assert!(p2wpkh > p2tr);
    }

    #[test]
    fn estimate_transaction_fees_scales_with_fee_rate() {
        let tx_size = estimate_vbytes(5, ScriptType::P2WPKH, outputs(2));

        let fee = estimate_transaction_fees(
            ScriptType::P2WPKH,
            5,
            FeeRate::from_sat_per_vb(5).unwrap(),
            outputs(2),
        )
        .unwrap();

        assert_eq!(fee, Amount::from_sat((tx_size * 5) as u64));
    }

    #[test]
    fn should_reject_zero_fee_rate() {
        assert!(matches!(
            fee_rate_from_sat_per_vb(0),
            Err(SigningError::InvalidFeeRate(0))
        ));
        assert_eq!(
            fee_rate_from_sat_per_vb(12).unwrap(),
            FeeRate::from_sat_per_vb(12).unwrap()
        );
    }
}
