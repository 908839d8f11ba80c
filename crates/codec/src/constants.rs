//! CBOR key names and client-facing error strings.
//!
//! Key spellings are part of the wire contract with on-device encoders and
//! must not change.

// Request root keys.
pub const VERSION_KEY: &str = "version";
pub const PUBLISHER_KEY: &str = "publisher";
pub const INTEREST_GROUPS_KEY: &str = "interestGroups";
pub const GENERATION_ID_KEY: &str = "generationId";
pub const DEBUG_REPORTING_KEY: &str = "enableDebugReporting";
pub const CONSENTED_DEBUG_CONFIG_KEY: &str = "consentedDebugConfig";

// Interest group keys.
pub const NAME_KEY: &str = "name";
pub const BIDDING_SIGNALS_KEYS_KEY: &str = "biddingSignalsKeys";
pub const USER_BIDDING_SIGNALS_KEY: &str = "userBiddingSignals";
pub const ADS_KEY: &str = "ads";
pub const COMPONENT_ADS_KEY: &str = "componentAds";
pub const BROWSER_SIGNALS_KEY: &str = "browserSignals";

// Browser signal keys.
pub const BID_COUNT_KEY: &str = "bidCount";
pub const JOIN_COUNT_KEY: &str = "joinCount";
pub const RECENCY_KEY: &str = "recency";
pub const PREV_WINS_KEY: &str = "prevWins";

// Consented debug config keys.
pub const IS_CONSENTED_KEY: &str = "isConsented";
pub const TOKEN_KEY: &str = "token";

// Response keys.
pub const BID_KEY: &str = "bid";
pub const SCORE_KEY: &str = "score";
pub const CHAFF_KEY: &str = "isChaff";
pub const COMPONENTS_KEY: &str = "components";
pub const AD_RENDER_URL_KEY: &str = "adRenderURL";
pub const BIDDING_GROUPS_KEY: &str = "biddingGroups";
pub const WIN_REPORTING_URLS_KEY: &str = "winReportingURLs";
pub const INTEREST_GROUP_NAME_KEY: &str = "interestGroupName";
pub const INTEREST_GROUP_OWNER_KEY: &str = "interestGroupOwner";
pub const ERROR_KEY: &str = "error";
pub const MESSAGE_KEY: &str = "message";
pub const CODE_KEY: &str = "code";
pub const BUYER_REPORTING_URLS_KEY: &str = "buyerReportingURLs";
pub const COMPONENT_SELLER_REPORTING_URLS_KEY: &str = "componentSellerReportingURLs";
pub const TOP_LEVEL_SELLER_REPORTING_URLS_KEY: &str = "topLevelSellerReportingURLs";
pub const REPORTING_URL_KEY: &str = "reportingURL";
pub const INTERACTION_REPORTING_URLS_KEY: &str = "interactionReportingURLs";

// Client-facing error strings.
pub const INVALID_CBOR_ERROR: &str = "Unable to parse ProtectedAuctionInput CBOR";
pub const ROOT_CBOR_KEY_FIELD: &str = "Root level CBOR key";
pub const PROTECTED_AUCTION_INPUT_FIELD: &str = "ProtectedAuctionInput";

/// `Invalid type provided for (field: %s, expected: %s, actual: %s)`
pub fn invalid_type_error(field: &str, expected: &str, actual: &str) -> String {
    format!("Invalid type provided for (field: {field}, expected: {expected}, actual: {actual})")
}

/// `Unsupported schema version provided: (provided: %d)`
pub fn unsupported_schema_version_error(provided: i128) -> String {
    format!("Unsupported schema version provided: (provided: {provided})")
}

pub const MALFORMED_COMPRESSED_BYTESTRING: &str =
    "Malformed bytestring for compressed interest group";

/// `Malformed bytestring for compressed interest group for buyer: %s`
pub fn malformed_compressed_ig_error(owner: &str) -> String {
    format!("Malformed bytestring for compressed interest group for buyer: {owner}")
}

/// `Invalid BuyerInput CBOR document for buyer: %s`
pub fn invalid_buyer_input_cbor_error(owner: &str) -> String {
    format!("Invalid BuyerInput CBOR document for buyer: {owner}")
}

/// `Found browserSignals.prevWins[x] array of not length 2 for owner '%s'`
pub fn prev_wins_not_correct_length_error(owner: &str) -> String {
    format!("Found browserSignals.prevWins[x] array of not length 2 for owner '{owner}'")
}
