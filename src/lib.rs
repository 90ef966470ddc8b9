//! # waas-brc20
//!
//! Issue BRC-20 operations (deploy, mint, transfer and inscription transfer)
//! through a wallet-as-a-service REST API while keeping every signature local.
//!
//! Each action runs the same pipeline:
//!
//! 1. fetch the signing info (fee rate, service cost, inscription output) for the address pair;
//! 2. fetch the UTXOs covering the inscription outputs and the service charge;
//! 3. build the BRC-20 operation to inscribe;
//! 4. sign the commit and reveal transactions (or the single inscription transfer transaction);
//! 5. hash the signed transactions, link every reveal to its commit and broadcast them.
//!
//! ## Example
//!
//! ```rust,no_run
//! use waas_brc20::{Brc20Session, BtcWallet, DeployArgs, WaasClient, WaasConfig, WalletRegistry};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WaasConfig::load(None)?;
//! let client = WaasClient::new(&config)?;
//! let wallet = BtcWallet::new(config.network).with_private_key("<wif>")?;
//!
//! let mut wallets = WalletRegistry::default();
//! wallets.register(wallet);
//!
//! let session = Brc20Session::new(client, wallets, config.session());
//! let record = session
//!     .deploy(DeployArgs::new("bc1q...", "ordi", 21_000_000, 1_000), &())
//!     .await?;
//! println!("{:?}", record.result);
//! # Ok(())
//! # }
//! ```
//!

#[macro_use]
extern crate log;

pub mod api;
pub mod brc20;
pub mod config;
mod error;
mod inscription;
pub mod pipeline;
mod result;
pub mod utils;
pub mod wallet;

pub use api::{WaasApi, WaasClient};
pub use brc20::Brc20Operation;
pub use config::{FallbackPolicy, FeeRateMode, ServiceEnvironment, SessionConfig, WaasConfig};
pub use error::{SigningError, WaasError};
pub use inscription::Inscription;
pub use pipeline::{
    ActionFailure, ActionKind, ActionRecord, ActionState, Brc20Session, DeployArgs, LogSink,
    MintArgs, NftTransferArgs, OperationResult, ProgressEvent, ProgressSink, TransferArgs,
};
pub use result::WaasResult;
pub use wallet::{BtcWallet, ChainWallet, WalletRegistry};
