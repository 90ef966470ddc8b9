use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::inscription::Inscription;
use crate::utils::constants::TEXT_CONTENT_TYPE;
use crate::{SigningError, WaasError, WaasResult};

const PROTOCOL: &str = "brc-20";

/// BRC-20 operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Brc20Op {
    Deploy,
    Mint,
    Transfer,
}

impl fmt::Display for Brc20Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::Deploy => "deploy",
            Self::Mint => "mint",
            Self::Transfer => "transfer",
        };
        f.write_str(op)
    }
}

/// A BRC-20 operation, as inscribed in the reveal transaction.
///
/// Field order is the serialization order: `p`, `op`, `tick`, then `max` and `lim` for a
/// deploy or `amt` for a mint or transfer. Amounts are encoded as decimal strings.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brc20Operation {
    /// Protocol (required): Helps other systems identify and process brc-20 events
    #[serde(rename = "p")]
    protocol: String,
    pub op: Brc20Op,
    /// Ticker (required): 4 or 5 letter identifier of the brc-20
    pub tick: String,
    /// Max supply, deploy only
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub max: Option<u64>,
    /// Mint limit per inscription, deploy only
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub lim: Option<u64>,
    /// Amount to mint or transfer
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub amt: Option<u64>,
}

impl Brc20Operation {
    /// Create a new BRC-20 deploy operation
    pub fn deploy(tick: impl ToString, max: u64, lim: u64) -> Self {
        Self {
            protocol: PROTOCOL.to_string(),
            op: Brc20Op::Deploy,
            tick: tick.to_string(),
            max: Some(max),
            lim: Some(lim),
            amt: None,
        }
    }

    /// Create a new BRC-20 mint operation
    pub fn mint(tick: impl ToString, amt: u64) -> Self {
        Self {
            protocol: PROTOCOL.to_string(),
            op: Brc20Op::Mint,
            tick: tick.to_string(),
            max: None,
            lim: None,
            amt: Some(amt),
        }
    }

    /// Create a new BRC-20 transfer operation
    pub fn transfer(tick: impl ToString, amt: u64) -> Self {
        Self {
            protocol: PROTOCOL.to_string(),
            op: Brc20Op::Transfer,
            tick: tick.to_string(),
            max: None,
            lim: None,
            amt: Some(amt),
        }
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Encode the BRC-20 operation as a JSON string
    pub fn encode(&self) -> WaasResult<String> {
        serde_json::to_string(self)
            .map_err(|err| WaasError::Validation(format!("cannot encode BRC-20 operation: {err}")))
    }
}

impl FromStr for Brc20Operation {
    type Err = WaasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s)
            .map_err(|err| WaasError::Validation(format!("invalid BRC-20 operation: {err}")))
    }
}

impl Inscription for Brc20Operation {
    fn content_type(&self) -> String {
        TEXT_CONTENT_TYPE.to_string()
    }

    fn body(&self) -> Result<Vec<u8>, SigningError> {
        serde_json::to_vec(self).map_err(|err| SigningError::MalformedTransaction(err.to_string()))
    }
}
