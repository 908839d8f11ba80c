//! Wire protocol for the bidding and auction services.
//!
//! Messages are hand-maintained prost structs (see [`messages`] for the tag
//! contract); [`grpc`] holds the unary client/server glue for the four
//! services.

mod messages;
pub use messages::*;

pub mod grpc;

impl SellerRejectionReason {
    /// String form used in debug URL substitution. The eight values below are
    /// the entire vocabulary.
    pub fn as_reason_str(&self) -> &'static str {
        match self {
            Self::SellerRejectionReasonNotAvailable => "not-available",
            Self::InvalidBid => "invalid-bid",
            Self::BidBelowAuctionFloor => "bid-below-auction-floor",
            Self::PendingApprovalByExchange => "pending-approval-by-exchange",
            Self::DisapprovedByExchange => "disapproved-by-exchange",
            Self::BlockedByPublisher => "blocked-by-publisher",
            Self::LanguageExclusions => "language-exclusions",
            Self::CategoryExclusions => "category-exclusions",
        }
    }

    /// Inverse of [`Self::as_reason_str`]; unknown strings collapse to
    /// not-available.
    pub fn from_reason_str(s: &str) -> Self {
        match s {
            "invalid-bid" => Self::InvalidBid,
            "bid-below-auction-floor" => Self::BidBelowAuctionFloor,
            "pending-approval-by-exchange" => Self::PendingApprovalByExchange,
            "disapproved-by-exchange" => Self::DisapprovedByExchange,
            "blocked-by-publisher" => Self::BlockedByPublisher,
            "language-exclusions" => Self::LanguageExclusions,
            "category-exclusions" => Self::CategoryExclusions,
            _ => Self::SellerRejectionReasonNotAvailable,
        }
    }
}
