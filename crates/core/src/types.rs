//! Record types for the three collections
//!
//! - [`Order`]: signed trading orders, keyed by hash
//! - [`MiniHeader`]: block header summaries, keyed by hash
//! - [`Metadata`]: the singleton node state row, keyed by chain id
//!
//! Each record has a field enum listing its queryable fields. Amounts and other
//! uint256 quantities are carried as base-10 strings.

use crate::value::{FieldKind, FieldValue, Record, RecordField};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Order
// =============================================================================

/// A signed trading order known to the node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order hash (primary key)
    pub hash: String,
    /// Chain the order was signed for
    pub chain_id: u64,
    /// Exchange contract address
    pub exchange_address: String,
    /// Maker address
    pub maker_address: String,
    /// Maker asset data
    pub maker_asset_data: String,
    /// Maker fee asset data
    pub maker_fee_asset_data: String,
    /// Maker asset amount (decimal)
    pub maker_asset_amount: String,
    /// Maker fee (decimal)
    pub maker_fee: String,
    /// Taker address
    pub taker_address: String,
    /// Taker asset data
    pub taker_asset_data: String,
    /// Taker fee asset data
    pub taker_fee_asset_data: String,
    /// Taker asset amount (decimal)
    pub taker_asset_amount: String,
    /// Taker fee (decimal)
    pub taker_fee: String,
    /// Sender address
    pub sender_address: String,
    /// Fee recipient address
    pub fee_recipient_address: String,
    /// Expiration time in seconds (decimal)
    pub expiration_time_seconds: String,
    /// Salt (decimal)
    pub salt: String,
    /// Signature bytes, hex encoded
    pub signature: String,
    /// Remaining fillable taker amount (decimal)
    pub fillable_taker_asset_amount: String,
    /// Last time the node revalidated this order
    pub last_updated: DateTime<Utc>,
    /// Marked removed (kept for a grace period by the node)
    pub is_removed: bool,
    /// Pinned orders are exempt from the node's own pruning
    pub is_pinned: bool,
    /// Underlying token parsed from maker asset data
    pub parsed_maker_asset_data: String,
    /// Underlying token parsed from maker fee asset data
    pub parsed_maker_fee_asset_data: String,
}

/// Queryable fields of [`Order`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderField {
    Hash,
    ChainId,
    ExchangeAddress,
    MakerAddress,
    MakerAssetData,
    MakerFeeAssetData,
    MakerAssetAmount,
    MakerFee,
    TakerAddress,
    TakerAssetData,
    TakerFeeAssetData,
    TakerAssetAmount,
    TakerFee,
    SenderAddress,
    FeeRecipientAddress,
    ExpirationTimeSeconds,
    Salt,
    Signature,
    FillableTakerAssetAmount,
    LastUpdated,
    IsRemoved,
    IsPinned,
    ParsedMakerAssetData,
    ParsedMakerFeeAssetData,
}

impl RecordField for OrderField {
    fn all() -> &'static [Self] {
        use OrderField::*;
        &[
            Hash,
            ChainId,
            ExchangeAddress,
            MakerAddress,
            MakerAssetData,
            MakerFeeAssetData,
            MakerAssetAmount,
            MakerFee,
            TakerAddress,
            TakerAssetData,
            TakerFeeAssetData,
            TakerAssetAmount,
            TakerFee,
            SenderAddress,
            FeeRecipientAddress,
            ExpirationTimeSeconds,
            Salt,
            Signature,
            FillableTakerAssetAmount,
            LastUpdated,
            IsRemoved,
            IsPinned,
            ParsedMakerAssetData,
            ParsedMakerFeeAssetData,
        ]
    }

    fn name(&self) -> &'static str {
        match self {
            OrderField::Hash => "hash",
            OrderField::ChainId => "chainId",
            OrderField::ExchangeAddress => "exchangeAddress",
            OrderField::MakerAddress => "makerAddress",
            OrderField::MakerAssetData => "makerAssetData",
            OrderField::MakerFeeAssetData => "makerFeeAssetData",
            OrderField::MakerAssetAmount => "makerAssetAmount",
            OrderField::MakerFee => "makerFee",
            OrderField::TakerAddress => "takerAddress",
            OrderField::TakerAssetData => "takerAssetData",
            OrderField::TakerFeeAssetData => "takerFeeAssetData",
            OrderField::TakerAssetAmount => "takerAssetAmount",
            OrderField::TakerFee => "takerFee",
            OrderField::SenderAddress => "senderAddress",
            OrderField::FeeRecipientAddress => "feeRecipientAddress",
            OrderField::ExpirationTimeSeconds => "expirationTimeSeconds",
            OrderField::Salt => "salt",
            OrderField::Signature => "signature",
            OrderField::FillableTakerAssetAmount => "fillableTakerAssetAmount",
            OrderField::LastUpdated => "lastUpdated",
            OrderField::IsRemoved => "isRemoved",
            OrderField::IsPinned => "isPinned",
            OrderField::ParsedMakerAssetData => "parsedMakerAssetData",
            OrderField::ParsedMakerFeeAssetData => "parsedMakerFeeAssetData",
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            OrderField::ChainId => FieldKind::Integer,
            OrderField::LastUpdated => FieldKind::Timestamp,
            OrderField::IsRemoved | OrderField::IsPinned => FieldKind::Boolean,
            _ => FieldKind::String,
        }
    }

    fn is_primary_key(&self) -> bool {
        matches!(self, OrderField::Hash)
    }
}

impl Record for Order {
    type Key = String;
    type Field = OrderField;
    const COLLECTION: &'static str = "order";

    fn key(&self) -> String {
        self.hash.clone()
    }

    fn field(&self, field: OrderField) -> FieldValue {
        match field {
            OrderField::Hash => self.hash.as_str().into(),
            OrderField::ChainId => self.chain_id.into(),
            OrderField::ExchangeAddress => self.exchange_address.as_str().into(),
            OrderField::MakerAddress => self.maker_address.as_str().into(),
            OrderField::MakerAssetData => self.maker_asset_data.as_str().into(),
            OrderField::MakerFeeAssetData => self.maker_fee_asset_data.as_str().into(),
            OrderField::MakerAssetAmount => self.maker_asset_amount.as_str().into(),
            OrderField::MakerFee => self.maker_fee.as_str().into(),
            OrderField::TakerAddress => self.taker_address.as_str().into(),
            OrderField::TakerAssetData => self.taker_asset_data.as_str().into(),
            OrderField::TakerFeeAssetData => self.taker_fee_asset_data.as_str().into(),
            OrderField::TakerAssetAmount => self.taker_asset_amount.as_str().into(),
            OrderField::TakerFee => self.taker_fee.as_str().into(),
            OrderField::SenderAddress => self.sender_address.as_str().into(),
            OrderField::FeeRecipientAddress => self.fee_recipient_address.as_str().into(),
            OrderField::ExpirationTimeSeconds => self.expiration_time_seconds.as_str().into(),
            OrderField::Salt => self.salt.as_str().into(),
            OrderField::Signature => self.signature.as_str().into(),
            OrderField::FillableTakerAssetAmount => {
                self.fillable_taker_asset_amount.as_str().into()
            }
            OrderField::LastUpdated => self.last_updated.into(),
            OrderField::IsRemoved => self.is_removed.into(),
            OrderField::IsPinned => self.is_pinned.into(),
            OrderField::ParsedMakerAssetData => self.parsed_maker_asset_data.as_str().into(),
            OrderField::ParsedMakerFeeAssetData => {
                self.parsed_maker_fee_asset_data.as_str().into()
            }
        }
    }
}

/// Storage status of one order hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatus {
    /// Hash that was asked about
    pub hash: String,
    /// Whether a row with this hash exists
    pub is_stored: bool,
    /// Whether the stored row is flagged removed
    pub is_marked_removed: bool,
    /// Remaining fillable amount, "0" when not stored
    pub fillable_taker_asset_amount: String,
}

// =============================================================================
// MiniHeader
// =============================================================================

/// Block header summary used to track chain reorgs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniHeader {
    /// Block hash (primary key)
    pub hash: String,
    /// Parent block hash (lookup only)
    pub parent: String,
    /// Block height
    pub number: u64,
    /// Block timestamp
    pub timestamp: DateTime<Utc>,
    /// Serialized event logs relevant to the node
    #[serde(default)]
    pub logs: serde_json::Value,
}

/// Queryable fields of [`MiniHeader`]
///
/// `logs` is an opaque blob and is not queryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MiniHeaderField {
    Hash,
    Parent,
    Number,
    Timestamp,
}

impl RecordField for MiniHeaderField {
    fn all() -> &'static [Self] {
        &[
            MiniHeaderField::Hash,
            MiniHeaderField::Parent,
            MiniHeaderField::Number,
            MiniHeaderField::Timestamp,
        ]
    }

    fn name(&self) -> &'static str {
        match self {
            MiniHeaderField::Hash => "hash",
            MiniHeaderField::Parent => "parent",
            MiniHeaderField::Number => "number",
            MiniHeaderField::Timestamp => "timestamp",
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            MiniHeaderField::Hash | MiniHeaderField::Parent => FieldKind::String,
            MiniHeaderField::Number => FieldKind::Integer,
            MiniHeaderField::Timestamp => FieldKind::Timestamp,
        }
    }

    fn is_primary_key(&self) -> bool {
        matches!(self, MiniHeaderField::Hash)
    }
}

impl Record for MiniHeader {
    type Key = String;
    type Field = MiniHeaderField;
    const COLLECTION: &'static str = "miniHeader";

    fn key(&self) -> String {
        self.hash.clone()
    }

    fn field(&self, field: MiniHeaderField) -> FieldValue {
        match field {
            MiniHeaderField::Hash => self.hash.as_str().into(),
            MiniHeaderField::Parent => self.parent.as_str().into(),
            MiniHeaderField::Number => self.number.into(),
            MiniHeaderField::Timestamp => self.timestamp.into(),
        }
    }
}

// =============================================================================
// Metadata
// =============================================================================

/// Singleton node state row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Chain id (primary key)
    #[serde(rename = "ethereumChainID")]
    pub ethereum_chain_id: u64,
    /// Largest expiration time the node currently accepts (decimal)
    #[serde(rename = "maxExpirationTime")]
    pub max_expiration_time: String,
    /// RPC requests sent since `start_of_current_utc_day`
    #[serde(rename = "ethRPCRequestsSentInCurrentUTCDay")]
    pub eth_rpc_requests_sent_in_current_utc_day: u64,
    /// Start of the current UTC accounting day
    #[serde(rename = "startOfCurrentUTCDay")]
    pub start_of_current_utc_day: DateTime<Utc>,
}

/// Queryable fields of [`Metadata`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetadataField {
    #[serde(rename = "ethereumChainID")]
    EthereumChainId,
    #[serde(rename = "maxExpirationTime")]
    MaxExpirationTime,
    #[serde(rename = "ethRPCRequestsSentInCurrentUTCDay")]
    EthRpcRequestsSentInCurrentUtcDay,
    #[serde(rename = "startOfCurrentUTCDay")]
    StartOfCurrentUtcDay,
}

impl RecordField for MetadataField {
    fn all() -> &'static [Self] {
        &[
            MetadataField::EthereumChainId,
            MetadataField::MaxExpirationTime,
            MetadataField::EthRpcRequestsSentInCurrentUtcDay,
            MetadataField::StartOfCurrentUtcDay,
        ]
    }

    fn name(&self) -> &'static str {
        match self {
            MetadataField::EthereumChainId => "ethereumChainID",
            MetadataField::MaxExpirationTime => "maxExpirationTime",
            MetadataField::EthRpcRequestsSentInCurrentUtcDay => "ethRPCRequestsSentInCurrentUTCDay",
            MetadataField::StartOfCurrentUtcDay => "startOfCurrentUTCDay",
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            MetadataField::EthereumChainId => FieldKind::Integer,
            MetadataField::MaxExpirationTime => FieldKind::String,
            MetadataField::EthRpcRequestsSentInCurrentUtcDay => FieldKind::Integer,
            MetadataField::StartOfCurrentUtcDay => FieldKind::Timestamp,
        }
    }

    fn is_primary_key(&self) -> bool {
        matches!(self, MetadataField::EthereumChainId)
    }
}

impl Record for Metadata {
    type Key = u64;
    type Field = MetadataField;
    const COLLECTION: &'static str = "metadata";

    fn key(&self) -> u64 {
        self.ethereum_chain_id
    }

    fn field(&self, field: MetadataField) -> FieldValue {
        match field {
            MetadataField::EthereumChainId => self.ethereum_chain_id.into(),
            MetadataField::MaxExpirationTime => self.max_expiration_time.as_str().into(),
            MetadataField::EthRpcRequestsSentInCurrentUtcDay => {
                self.eth_rpc_requests_sent_in_current_utc_day.into()
            }
            MetadataField::StartOfCurrentUtcDay => self.start_of_current_utc_day.into(),
        }
    }
}
