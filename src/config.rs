use std::fmt;
use std::path::Path;
use std::time::Duration;

use bitcoin::Network;
use serde::{Deserialize, Serialize};

use crate::api::SigningInfo;
use crate::WaasResult;

/// Environment variables prefix, e.g. `WAAS_API_KEY` or `WAAS_FALLBACK__MOCK_UTXOS`.
pub const ENV_PREFIX: &str = "WAAS";

pub const PRODUCTION_HOST: &str = "https://www.okx.com";
pub const DEVELOPMENT_HOST: &str = "https://beta.okex.org";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TICK: &str = "okex";

/// Wallet service deployment to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceEnvironment {
    #[default]
    Production,
    Development,
}

impl ServiceEnvironment {
    pub fn host(&self) -> &'static str {
        match self {
            Self::Production => PRODUCTION_HOST,
            Self::Development => DEVELOPMENT_HOST,
        }
    }
}

/// Selects which service cost and fee rate of the signing info an action pays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeRateMode {
    #[default]
    Normal,
    Max,
}

impl FeeRateMode {
    /// Service cost per transaction, in satoshis.
    pub fn cost(&self, info: &SigningInfo) -> u64 {
        match self {
            Self::Normal => info.normal_cost,
            Self::Max => info.max_cost,
        }
    }

    /// Fee rate in sat/vB.
    pub fn fee_rate(&self, info: &SigningInfo) -> u64 {
        match self {
            Self::Normal => info.normal_fee_rate,
            Self::Max => info.max_fee_rate,
        }
    }
}

/// Stages allowed to substitute canned data when the wallet service fails.
///
/// Both are off unless explicitly enabled; substituted data is always reported as degraded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackPolicy {
    /// Use a canned UTXO set when `get-utxo` fails during an inscription.
    pub mock_utxos: bool,
    /// Use a canned hash list when the batch broadcast returns nothing.
    pub mock_broadcast: bool,
}

/// Wallet service API credentials.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
    pub passphrase: String,
    pub project_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

/// Crate configuration.
///
/// Read from an optional TOML file, then overridden by `WAAS_` environment variables.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WaasConfig {
    pub api_key: String,
    pub secret_key: String,
    pub passphrase: String,
    pub project_id: String,
    pub environment: ServiceEnvironment,
    /// Overrides the host selected by `environment`
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub network: Network,
    pub wallet_id: String,
    /// Ticker used by the demo when none is given
    pub tick: String,
    pub fee_rate_mode: FeeRateMode,
    /// Administrative switch of the batch broadcast; when off, inscriptions are signed but
    /// never broadcast.
    pub batch_broadcast_enabled: bool,
    pub fallback: FallbackPolicy,
}

impl fmt::Debug for WaasConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaasConfig")
            .field("credentials", &self.credentials())
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("network", &self.network)
            .field("wallet_id", &self.wallet_id)
            .field("tick", &self.tick)
            .field("fee_rate_mode", &self.fee_rate_mode)
            .field("batch_broadcast_enabled", &self.batch_broadcast_enabled)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl Default for WaasConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            secret_key: String::new(),
            passphrase: String::new(),
            project_id: String::new(),
            environment: ServiceEnvironment::default(),
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            network: Network::Bitcoin,
            wallet_id: String::new(),
            tick: DEFAULT_TICK.to_string(),
            fee_rate_mode: FeeRateMode::default(),
            batch_broadcast_enabled: false,
            fallback: FallbackPolicy::default(),
        }
    }
}

impl WaasConfig {
    /// Loads the configuration from `path`, if any, and the `WAAS_` environment variables.
    pub fn load(path: Option<&Path>) -> WaasResult<Self> {
        Self::load_with(path, environment())
    }

    fn load_with(path: Option<&Path>, environment: ::config::Environment) -> WaasResult<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }

        let settings = builder.add_source(environment).build()?;

        let config: Self = settings.try_deserialize()?;
        debug!("loaded configuration: {config:?}");

        Ok(config)
    }

    /// Parses a TOML document, without looking at the environment.
    pub fn from_toml(toml: &str) -> WaasResult<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from_str(toml, ::config::FileFormat::Toml))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.host())
            .trim_end_matches('/')
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            api_key: self.api_key.clone(),
            secret_key: self.secret_key.clone(),
            passphrase: self.passphrase.clone(),
            project_id: self.project_id.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Settings of a pipeline session.
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            wallet_id: self.wallet_id.clone(),
            fee_rate_mode: self.fee_rate_mode,
            batch_broadcast_enabled: self.batch_broadcast_enabled,
            fallback: self.fallback,
        }
    }
}

/// `WAAS_` variables, with `__` separating nested keys.
fn environment() -> ::config::Environment {
    ::config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Settings consumed by [`crate::Brc20Session`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub wallet_id: String,
    pub fee_rate_mode: FeeRateMode,
    pub batch_broadcast_enabled: bool,
    pub fallback: FallbackPolicy,
}
