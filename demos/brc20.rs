use std::path::PathBuf;

use argh::FromArgs;
use log::{debug, info};
use tokio::sync::mpsc;
use waas_brc20::{
    ActionRecord, Brc20Session, BtcWallet, DeployArgs, LogSink, MintArgs, NftTransferArgs,
    ProgressEvent, TransferArgs, WaasClient, WaasConfig, WalletRegistry,
};

const WIF_ENV: &str = "WAAS_WIF";

#[derive(FromArgs, Debug)]
#[argh(description = "Deploy, mint and transfer BRC-20 tokens through the wallet service")]
struct Args {
    #[argh(option, short = 'c')]
    /// config file (TOML), overridden by WAAS_* environment variables
    config: Option<PathBuf>,

    #[argh(option, short = 'p')]
    /// private key (WIF), read from WAAS_WIF when missing
    private_key: Option<String>,

    #[argh(switch, short = 'w')]
    /// print every pipeline event instead of logging it
    watch: bool,

    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
enum Command {
    Deploy(DeployCmd),
    Mint(MintCmd),
    Transfer(TransferCmd),
    TransferNft(TransferNftCmd),
    Status(StatusCmd),
}

#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "deploy", description = "inscribe a deploy operation")]
struct DeployCmd {
    #[argh(option, short = 'f')]
    /// inscribing address
    from: String,

    #[argh(option, short = 'T')]
    /// ticker, defaults to the configured one
    tick: Option<String>,

    #[argh(option, short = 'm')]
    /// max supply
    max: u64,

    #[argh(option, short = 'l')]
    /// mint limit per inscription
    lim: u64,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "mint", description = "inscribe a mint operation")]
struct MintCmd {
    #[argh(option, short = 'f')]
    /// inscribing address
    from: String,

    #[argh(option, short = 'T')]
    /// ticker, defaults to the configured one
    tick: Option<String>,

    #[argh(option, short = 'a')]
    /// amount
    amount: u64,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "transfer", description = "inscribe a transfer operation")]
struct TransferCmd {
    #[argh(option, short = 'f')]
    /// inscribing address
    from: String,

    #[argh(option, short = 'T')]
    /// ticker, defaults to the configured one
    tick: Option<String>,

    #[argh(option, short = 'a')]
    /// amount
    amount: u64,
}

#[derive(FromArgs, Debug)]
#[argh(
    subcommand,
    name = "transfer-nft",
    description = "send an inscribed transfer to a recipient"
)]
struct TransferNftCmd {
    #[argh(option, short = 'f')]
    /// holder of the inscription
    from: String,

    #[argh(option, short = 't')]
    /// recipient address
    to: String,

    #[argh(option, short = 'T')]
    /// ticker, defaults to the configured one
    tick: Option<String>,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "status", description = "look up a broadcast order")]
struct StatusCmd {
    #[argh(positional)]
    /// order id returned by transfer-nft
    order_id: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = WaasConfig::load(args.config.as_deref())?;
    debug!("config: {config:?}");
    let client = WaasClient::new(&config)?;

    let mut wallet = BtcWallet::new(config.network);
    if let Some(wif) = args
        .private_key
        .clone()
        .or_else(|| std::env::var(WIF_ENV).ok())
    {
        wallet = wallet.with_private_key(&wif)?;
    }
    let mut wallets = WalletRegistry::default();
    wallets.register(wallet);

    let session = Brc20Session::new(client, wallets, config.session());
    let tick = |tick: Option<String>| tick.unwrap_or_else(|| config.tick.clone());

    if let Command::Status(cmd) = &args.command {
        let detail = session.transaction_detail(&cmd.order_id).await?;
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("{event:?}");
        }
    });

    let record: anyhow::Result<ActionRecord> = {
        let sink: &dyn waas_brc20::ProgressSink = if args.watch { &tx } else { &LogSink };
        let result = match args.command {
            Command::Deploy(cmd) => {
                session
                    .deploy(DeployArgs::new(cmd.from, tick(cmd.tick), cmd.max, cmd.lim), sink)
                    .await
            }
            Command::Mint(cmd) => {
                session
                    .mint(MintArgs::new(cmd.from, tick(cmd.tick), cmd.amount), sink)
                    .await
            }
            Command::Transfer(cmd) => {
                session
                    .transfer(TransferArgs::new(cmd.from, tick(cmd.tick), cmd.amount), sink)
                    .await
            }
            Command::TransferNft(cmd) => {
                session
                    .transfer_nft(NftTransferArgs::new(cmd.from, cmd.to, tick(cmd.tick)), sink)
                    .await
            }
            Command::Status(_) => unreachable!("handled above"),
        };
        result.map_err(anyhow::Error::from)
    };
    drop(tx);
    printer.await?;

    let record = record?;
    if record.is_degraded() {
        info!("stages served with canned data: {:?}", record.degraded);
    }
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}
