pub mod builder;
mod btc;
mod registry;

pub use btc::BtcWallet;
pub use builder::{
    CreateInscriptionArgs, CreateTransferArgs, OrdTransactionBuilder, RevealTarget, ScriptType,
    SignedInscriptionSet, Utxo,
};
pub use registry::{
    ChainWallet, InscribeRequest, InscriptionData, PrevOutput, SignRequest, SignedTx,
    TransferOutput, TransferRequest, WalletRegistry,
};
