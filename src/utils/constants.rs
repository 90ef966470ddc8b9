pub const PROTOCOL_ID: [u8; 3] = *b"ord";
/// Tag 1, representing the MIME type of the body.
pub const CONTENT_TYPE_TAG: [u8; 1] = [1];
/// Content type of every BRC-20 inscription.
pub const TEXT_CONTENT_TYPE: &str = "text/plain;charset=utf-8";
/// Maximum size of a single data push in tapscript.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;
/// Outputs below this value are not relayed, leftovers under it are left to the miners.
pub const DUST_LIMIT: u64 = 546;

/// Chain id of Bitcoin mainnet on the wallet service.
pub const BTC_CHAIN_ID: u32 = 0;
/// `broadcastType` of every item sent through the batch endpoint.
pub const BROADCAST_TYPE_BATCH: u8 = 1;
/// `itemId` of the commit transaction in a batch broadcast.
pub const COMMIT_ITEM_ID: &str = "commitTx";
/// Prefix of the token address of a BRC-20 ticker.
pub const BRC20_TOKEN_ADDRESS_PREFIX: &str = "btc-brc20-";
