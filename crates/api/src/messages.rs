//! Hand-maintained protobuf messages for the auction wire protocol.
//!
//! Tags are part of the wire contract shared by every hop and must not be
//! renumbered. The outer request/response pairs carry only ciphertext; the
//! `*RawRequest`/`*RawResponse` messages are the plaintext payloads sealed
//! inside the encrypted envelope.

use std::collections::HashMap;

/// Client device class that produced the protected auction payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ClientType {
    Unknown = 0,
    /// Payload is a framed binary protobuf.
    Android = 1,
    /// Payload is framed canonical CBOR.
    Browser = 2,
}

impl ClientType {
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Android => "ANDROID",
            Self::Browser => "BROWSER",
        }
    }
}

/// Reason a seller rejected a bid during scoring.
///
/// The string forms of these variants are the only values ever substituted
/// for `${rejectReason}` in debug URLs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum SellerRejectionReason {
    SellerRejectionReasonNotAvailable = 0,
    InvalidBid = 1,
    BidBelowAuctionFloor = 2,
    PendingApprovalByExchange = 3,
    DisapprovedByExchange = 4,
    BlockedByPublisher = 5,
    LanguageExclusions = 6,
    CategoryExclusions = 7,
}

/// Request for the seller front end's `SelectAd` method.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SelectAdRequest {
    /// Encapsulated `ProtectedAuctionInput`, CBOR-encoded (browser clients).
    /// Superseded `protected_auction_ciphertext` carries the same bytes for
    /// newer clients; exactly one of the two should be set.
    #[prost(bytes = "vec", tag = "1")]
    pub protected_audience_ciphertext: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub auction_config: Option<AuctionConfig>,
    #[prost(enumeration = "ClientType", tag = "3")]
    pub client_type: i32,
    #[prost(bytes = "vec", tag = "13")]
    pub protected_auction_ciphertext: Vec<u8>,
}

/// Plaintext auction configuration provided by the seller's ad server.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AuctionConfig {
    /// Opaque JSON passed to `scoreAd`.
    #[prost(string, tag = "1")]
    pub seller_signals: String,
    /// Opaque JSON passed to both `generateBid` and `scoreAd`.
    #[prost(string, tag = "2")]
    pub auction_signals: String,
    /// Buyer origins participating in this auction.
    #[prost(string, repeated, tag = "3")]
    pub buyer_list: Vec<String>,
    #[prost(string, tag = "4")]
    pub seller: String,
    #[prost(map = "string, message", tag = "5")]
    pub per_buyer_config: HashMap<String, PerBuyerConfig>,
    /// Overrides the server default GetBids timeout when positive.
    #[prost(int64, tag = "6")]
    pub buyer_timeout_ms: i64,
    #[prost(string, tag = "7")]
    pub seller_debug_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PerBuyerConfig {
    /// Opaque JSON passed to this buyer's `generateBid`.
    #[prost(string, tag = "1")]
    pub buyer_signals: String,
    #[prost(string, tag = "2")]
    pub buyer_debug_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SelectAdResponse {
    /// Encapsulated, framed and padded `AuctionResult`.
    #[prost(bytes = "vec", tag = "1")]
    pub auction_result_ciphertext: Vec<u8>,
}

/// Decrypted contents of the client envelope.
///
/// Browser clients produce this via canonical CBOR, app clients as binary
/// protobuf; after decode both paths are handled identically.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtectedAuctionInput {
    /// UUID identifying one auction across all services.
    #[prost(string, tag = "1")]
    pub generation_id: String,
    #[prost(string, tag = "2")]
    pub publisher_name: String,
    #[prost(bool, tag = "3")]
    pub enable_debug_reporting: bool,
    /// Buyer origin to gzip-compressed, encoded `BuyerInput`.
    #[prost(map = "string, bytes", tag = "4")]
    pub buyer_input: HashMap<String, Vec<u8>>,
    #[prost(message, optional, tag = "5")]
    pub consented_debug_config: Option<ConsentedDebugConfig>,
}

/// Opt-in for verbose per-request logging, gated on a shared secret token.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConsentedDebugConfig {
    #[prost(bool, tag = "1")]
    pub is_consented: bool,
    #[prost(string, tag = "2")]
    pub token: String,
}

/// One buyer's slice of the user's on-device data.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BuyerInput {
    #[prost(message, repeated, tag = "1")]
    pub interest_groups: Vec<InterestGroup>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InterestGroup {
    #[prost(string, tag = "1")]
    pub name: String,
    /// Keys to look up in the buyer's key-value service.
    #[prost(string, repeated, tag = "2")]
    pub bidding_signals_keys: Vec<String>,
    #[prost(string, repeated, tag = "3")]
    pub ad_render_ids: Vec<String>,
    #[prost(string, repeated, tag = "4")]
    pub component_ads: Vec<String>,
    /// Opaque JSON recorded when the user joined the group.
    #[prost(string, tag = "5")]
    pub user_bidding_signals: String,
    #[prost(message, optional, tag = "6")]
    pub browser_signals: Option<BrowserSignals>,
}

/// Browser-tracked activity for one interest group.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BrowserSignals {
    #[prost(int32, tag = "1")]
    pub join_count: i32,
    #[prost(int32, tag = "2")]
    pub bid_count: i32,
    #[prost(int64, tag = "3")]
    pub recency: i64,
    /// JSON array of `[relative_time, ad_render_id]` pairs.
    #[prost(string, tag = "4")]
    pub prev_wins: String,
}

/// Correlation identifiers threaded through every downstream call.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LogContext {
    #[prost(string, tag = "1")]
    pub generation_id: String,
    #[prost(string, tag = "2")]
    pub adtech_debug_id: String,
}

/// Request for the buyer front end's `GetBids` method.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBidsRequest {
    /// Key id the client selected; must match the id embedded in the
    /// encapsulated ciphertext header.
    #[prost(string, tag = "1")]
    pub key_id: String,
    #[prost(bytes = "vec", tag = "2")]
    pub request_ciphertext: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBidsResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub response_ciphertext: Vec<u8>,
}

/// Plaintext payload of a `GetBids` call.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBidsRawRequest {
    /// Chaff requests exist only to mask traffic and produce no bids.
    #[prost(bool, tag = "1")]
    pub is_chaff: bool,
    #[prost(message, optional, tag = "2")]
    pub buyer_input: Option<BuyerInput>,
    #[prost(string, tag = "3")]
    pub auction_signals: String,
    #[prost(string, tag = "4")]
    pub buyer_signals: String,
    #[prost(string, tag = "5")]
    pub seller: String,
    #[prost(string, tag = "6")]
    pub publisher_name: String,
    #[prost(bool, tag = "7")]
    pub enable_debug_reporting: bool,
    #[prost(message, optional, tag = "8")]
    pub log_context: Option<LogContext>,
    #[prost(message, optional, tag = "9")]
    pub consented_debug_config: Option<ConsentedDebugConfig>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBidsRawResponse {
    #[prost(message, repeated, tag = "1")]
    pub bids: Vec<AdWithBid>,
}

/// Output of a buyer's `generateBid` for one interest group.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AdWithBid {
    /// Ad metadata forwarded verbatim (JSON) to the seller's `scoreAd`.
    #[prost(string, tag = "1")]
    pub ad: String,
    #[prost(float, tag = "2")]
    pub bid: f32,
    #[prost(string, tag = "3")]
    pub render: String,
    #[prost(string, repeated, tag = "4")]
    pub ad_components: Vec<String>,
    #[prost(bool, tag = "5")]
    pub allow_component_auction: bool,
    #[prost(string, tag = "6")]
    pub interest_group_name: String,
    #[prost(double, optional, tag = "7")]
    pub ad_cost: Option<f64>,
    #[prost(message, optional, tag = "8")]
    pub debug_report_urls: Option<DebugReportUrls>,
    #[prost(int32, optional, tag = "10")]
    pub modeling_signals: Option<i32>,
    #[prost(string, tag = "11")]
    pub bid_currency: String,
}

/// Win/loss ping URLs registered through `forDebuggingOnly`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DebugReportUrls {
    #[prost(string, tag = "1")]
    pub auction_debug_win_url: String,
    #[prost(string, tag = "2")]
    pub auction_debug_loss_url: String,
}

/// Request for the bidding service's `GenerateBids` method.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GenerateBidsRequest {
    /// Key id the caller selected; must match the id embedded in the
    /// encapsulated ciphertext header.
    #[prost(string, tag = "1")]
    pub key_id: String,
    #[prost(bytes = "vec", tag = "2")]
    pub request_ciphertext: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GenerateBidsResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub response_ciphertext: Vec<u8>,
}

/// Plaintext payload of a `GenerateBids` call.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GenerateBidsRawRequest {
    #[prost(message, repeated, tag = "1")]
    pub interest_group_for_bidding: Vec<InterestGroupForBidding>,
    #[prost(string, tag = "2")]
    pub auction_signals: String,
    #[prost(string, tag = "3")]
    pub buyer_signals: String,
    /// Raw JSON from the buyer key-value service; values live under the
    /// top-level `keys` property.
    #[prost(string, tag = "4")]
    pub bidding_signals: String,
    #[prost(bool, tag = "5")]
    pub enable_debug_reporting: bool,
    #[prost(message, optional, tag = "6")]
    pub log_context: Option<LogContext>,
    #[prost(message, optional, tag = "7")]
    pub consented_debug_config: Option<ConsentedDebugConfig>,
    #[prost(string, tag = "8")]
    pub publisher_name: String,
    #[prost(string, tag = "9")]
    pub seller: String,
}

/// Interest group reshaped for dispatch into `generateBid`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InterestGroupForBidding {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, repeated, tag = "2")]
    pub trusted_bidding_signals_keys: Vec<String>,
    #[prost(string, repeated, tag = "3")]
    pub ad_render_ids: Vec<String>,
    #[prost(string, repeated, tag = "4")]
    pub ad_component_render_ids: Vec<String>,
    #[prost(string, tag = "5")]
    pub user_bidding_signals: String,
    #[prost(message, optional, tag = "6")]
    pub browser_signals: Option<BrowserSignals>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GenerateBidsRawResponse {
    #[prost(message, repeated, tag = "1")]
    pub bids: Vec<AdWithBid>,
}

/// Request for the auction service's `ScoreAds` method.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ScoreAdsRequest {
    /// Key id the caller selected; must match the id embedded in the
    /// encapsulated ciphertext header.
    #[prost(string, tag = "1")]
    pub key_id: String,
    #[prost(bytes = "vec", tag = "2")]
    pub request_ciphertext: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ScoreAdsResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub response_ciphertext: Vec<u8>,
}

/// Plaintext payload of a `ScoreAds` call.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ScoreAdsRawRequest {
    #[prost(message, repeated, tag = "1")]
    pub ad_bids: Vec<AdWithBidMetadata>,
    #[prost(string, tag = "2")]
    pub seller_signals: String,
    #[prost(string, tag = "3")]
    pub auction_signals: String,
    /// Raw JSON from the seller key-value service keyed by render URL.
    #[prost(string, tag = "4")]
    pub scoring_signals: String,
    #[prost(string, tag = "5")]
    pub publisher_hostname: String,
    #[prost(bool, tag = "6")]
    pub enable_debug_reporting: bool,
    #[prost(message, optional, tag = "7")]
    pub log_context: Option<LogContext>,
    #[prost(map = "string, string", tag = "8")]
    pub per_buyer_signals: HashMap<String, String>,
    #[prost(message, optional, tag = "9")]
    pub consented_debug_config: Option<ConsentedDebugConfig>,
}

/// A buyer bid annotated by the seller front end.
///
/// The owner is derived from which BFE returned the bid and is never taken
/// from client-supplied data.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AdWithBidMetadata {
    #[prost(string, tag = "1")]
    pub ad: String,
    #[prost(float, tag = "2")]
    pub bid: f32,
    #[prost(string, tag = "3")]
    pub render: String,
    #[prost(string, repeated, tag = "4")]
    pub ad_components: Vec<String>,
    #[prost(bool, tag = "5")]
    pub allow_component_auction: bool,
    #[prost(string, tag = "6")]
    pub interest_group_name: String,
    #[prost(string, tag = "7")]
    pub interest_group_owner: String,
    #[prost(double, optional, tag = "8")]
    pub ad_cost: Option<f64>,
    #[prost(int32, tag = "9")]
    pub join_count: i32,
    #[prost(int64, tag = "10")]
    pub recency: i64,
    #[prost(int32, optional, tag = "11")]
    pub modeling_signals: Option<i32>,
    #[prost(string, tag = "12")]
    pub bid_currency: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ScoreAdsRawResponse {
    /// Winning score, absent when no bid scored positively.
    #[prost(message, optional, tag = "1")]
    pub ad_score: Option<AdScore>,
}

/// Output of the seller's `scoreAd` for the winning ad.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AdScore {
    #[prost(float, tag = "1")]
    pub desirability: f32,
    #[prost(string, tag = "2")]
    pub render: String,
    #[prost(string, repeated, tag = "3")]
    pub component_renders: Vec<String>,
    #[prost(string, tag = "4")]
    pub interest_group_name: String,
    #[prost(string, tag = "5")]
    pub interest_group_owner: String,
    #[prost(float, tag = "6")]
    pub buyer_bid: f32,
    /// Owner of the highest-scoring-other-bid group to the sum of that
    /// group's bids.
    #[prost(map = "string, message", tag = "7")]
    pub ig_owner_highest_scoring_other_bids_map: HashMap<String, BidList>,
    #[prost(message, optional, tag = "8")]
    pub win_reporting_urls: Option<WinReportingUrls>,
    #[prost(message, optional, tag = "9")]
    pub debug_report_urls: Option<DebugReportUrls>,
    #[prost(message, repeated, tag = "10")]
    pub ad_rejection_reasons: Vec<AdRejectionReason>,
    #[prost(bool, tag = "11")]
    pub allow_component_auction: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BidList {
    #[prost(float, repeated, tag = "1")]
    pub values: Vec<f32>,
}

/// Seller rejection attributed to a specific interest group.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AdRejectionReason {
    #[prost(string, tag = "1")]
    pub interest_group_owner: String,
    #[prost(string, tag = "2")]
    pub interest_group_name: String,
    #[prost(enumeration = "SellerRejectionReason", tag = "3")]
    pub rejection_reason: i32,
}

/// Event-level reporting URLs produced by `reportResult` / `reportWin`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WinReportingUrls {
    #[prost(message, optional, tag = "1")]
    pub buyer_reporting_urls: Option<ReportingUrls>,
    #[prost(message, optional, tag = "2")]
    pub component_seller_reporting_urls: Option<ReportingUrls>,
    #[prost(message, optional, tag = "3")]
    pub top_level_seller_reporting_urls: Option<ReportingUrls>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReportingUrls {
    #[prost(string, tag = "1")]
    pub reporting_url: String,
    /// Interaction event name to beacon URL.
    #[prost(map = "string, string", tag = "2")]
    pub interaction_reporting_urls: HashMap<String, String>,
}

/// Payload returned to the client inside the encrypted response.
///
/// Exactly one of three states holds: a winner (the scalar fields below),
/// chaff (`is_chaff` with everything else empty), or `error`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AuctionResult {
    #[prost(string, tag = "1")]
    pub ad_render_url: String,
    #[prost(string, repeated, tag = "2")]
    pub ad_component_render_urls: Vec<String>,
    #[prost(string, tag = "3")]
    pub interest_group_name: String,
    #[prost(string, tag = "4")]
    pub interest_group_owner: String,
    #[prost(float, tag = "5")]
    pub score: f32,
    #[prost(float, tag = "6")]
    pub bid: f32,
    #[prost(bool, tag = "7")]
    pub is_chaff: bool,
    #[prost(message, optional, tag = "8")]
    pub win_reporting_urls: Option<WinReportingUrls>,
    /// Buyer origin to indices (in client encode order) of the interest
    /// groups that produced a positive bid.
    #[prost(map = "string, message", tag = "9")]
    pub bidding_groups: HashMap<String, auction_result::InterestGroupIndex>,
    #[prost(message, optional, tag = "10")]
    pub error: Option<auction_result::Error>,
}

pub mod auction_result {
    /// Indices into the original interest group list of one buyer.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct InterestGroupIndex {
        #[prost(int32, repeated, tag = "1")]
        pub index: Vec<i32>,
    }

    /// Client-visible error transported through the encrypted channel.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Error {
        #[prost(int32, tag = "1")]
        pub code: i32,
        #[prost(string, tag = "2")]
        pub message: String,
    }
}
