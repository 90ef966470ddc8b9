use thiserror::Error;

/// Errors raised by a pipeline stage.
#[derive(Error, Debug)]
pub enum WaasError {
    /// The wallet service answered with a failure, a malformed body, or did not answer in time.
    #[error("remote service error: {0}")]
    RemoteService(String),
    #[error("signing error: {0}")]
    Signing(#[from] SigningError),
    /// Missing or invalid user input.
    #[error("validation error: {0}")]
    Validation(String),
    #[error("another action is already in flight for this session")]
    ActionInProgress,
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for WaasError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::RemoteService(format!("request timed out: {err}"))
        } else {
            Self::RemoteService(err.to_string())
        }
    }
}

impl From<::config::ConfigError> for WaasError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Local transaction construction errors.
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("no private key controls address {0}")]
    MissingPrivateKey(String),
    #[error("no inputs to spend")]
    NoInputs,
    #[error("nothing to inscribe")]
    NoInscriptions,
    #[error("insufficient balance: inputs hold {available} sat, {required} sat required")]
    InsufficientBalance { available: u64, required: u64 },
    #[error("amount overflow: {0}")]
    AmountOverflow(&'static str),
    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("unsupported script type for address {0}")]
    InvalidScriptType(String),
    #[error("invalid fee rate: {0} sat/vB")]
    InvalidFeeRate(u64),
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("invalid utxo txid {0}")]
    InvalidTxid(String),
    #[error("bad transaction input: {0}")]
    InputNotFound(usize),
    #[error("no wallet registered for chain {0}")]
    UnsupportedChain(u32),
    #[error("wallet cannot handle this signing request")]
    UnsupportedRequest,
    #[error("Bitcoin sighash error: {0}")]
    BitcoinSigHash(String),
    #[error("Bitcoin script error: {0}")]
    PushBytes(#[from] bitcoin::script::PushBytesError),
    #[error("secp256k1 error: {0}")]
    Secp256k1(#[from] bitcoin::secp256k1::Error),
    #[error("failed to compute taproot spend info")]
    TaprootCompute,
    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),
}

impl From<hex::FromHexError> for SigningError {
    fn from(err: hex::FromHexError) -> Self {
        Self::MalformedTransaction(err.to_string())
    }
}

impl From<bitcoin::consensus::encode::Error> for SigningError {
    fn from(err: bitcoin::consensus::encode::Error) -> Self {
        Self::MalformedTransaction(err.to_string())
    }
}
