//! Debug-reporting URL pipeline: post-auction signal extraction, placeholder
//! substitution, and the fire-and-forget HTTP sender.

use std::collections::HashMap;
use std::time::Duration;

use ba_api::{AdScore, SellerRejectionReason};
use tracing::{debug, warn};

pub const WINNING_BID_PLACEHOLDER: &str = "${winningBid}";
pub const MADE_WINNING_BID_PLACEHOLDER: &str = "${madeWinningBid}";
pub const HIGHEST_SCORING_OTHER_BID_PLACEHOLDER: &str = "${highestScoringOtherBid}";
pub const MADE_HIGHEST_SCORING_OTHER_BID_PLACEHOLDER: &str = "${madeHighestScoringOtherBid}";
pub const REJECT_REASON_PLACEHOLDER: &str = "${rejectReason}";

/// Signals the auction outcome determines, consumed by every debug URL.
#[derive(Debug, Clone, Default)]
pub struct PostAuctionSignals {
    pub winning_ig_name: String,
    pub winning_ig_owner: String,
    pub winning_bid: f32,
    pub winning_score: f32,
    pub winning_ad_render_url: String,
    pub highest_scoring_other_bid: f32,
    pub highest_scoring_other_bid_ig_owner: String,
    pub has_highest_scoring_other_bid: bool,
    /// owner -> interest group name -> rejection reason.
    pub rejection_reason_map: HashMap<String, HashMap<String, SellerRejectionReason>>,
}

/// Extracts post-auction signals from the winning score; defaults when the
/// auction produced no winner.
pub fn generate_post_auction_signals(winning_ad_score: Option<&AdScore>) -> PostAuctionSignals {
    let Some(score) = winning_ad_score else {
        return PostAuctionSignals::default();
    };

    let mut signals = PostAuctionSignals {
        winning_ig_name: score.interest_group_name.clone(),
        winning_ig_owner: score.interest_group_owner.clone(),
        winning_bid: score.buyer_bid,
        winning_score: score.desirability,
        winning_ad_render_url: score.render.clone(),
        ..Default::default()
    };

    if let Some((owner, bids)) = score.ig_owner_highest_scoring_other_bids_map.iter().next() {
        signals.highest_scoring_other_bid = bids.values.iter().sum();
        signals.highest_scoring_other_bid_ig_owner = owner.clone();
        signals.has_highest_scoring_other_bid = true;
    }

    for rejection in &score.ad_rejection_reasons {
        signals
            .rejection_reason_map
            .entry(rejection.interest_group_owner.clone())
            .or_default()
            .insert(
                rejection.interest_group_name.clone(),
                SellerRejectionReason::try_from(rejection.rejection_reason)
                    .unwrap_or(SellerRejectionReason::SellerRejectionReasonNotAvailable),
            );
    }

    signals
}

/// Values substituted into one interest group's debug URL.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugReportingPlaceholder {
    pub winning_bid: f32,
    pub made_winning_bid: bool,
    pub highest_scoring_other_bid: f32,
    pub made_highest_scoring_other_bid: bool,
    pub rejection_reason: SellerRejectionReason,
}

/// Builds the placeholder values for one interest group from the
/// post-auction signals.
pub fn placeholder_data_for_interest_group(
    interest_group_owner: &str,
    interest_group_name: &str,
    signals: &PostAuctionSignals,
) -> DebugReportingPlaceholder {
    let rejection_reason = signals
        .rejection_reason_map
        .get(interest_group_owner)
        .and_then(|by_name| by_name.get(interest_group_name))
        .copied()
        .unwrap_or(SellerRejectionReason::SellerRejectionReasonNotAvailable);

    DebugReportingPlaceholder {
        winning_bid: signals.winning_bid,
        made_winning_bid: signals.winning_ig_owner == interest_group_owner,
        highest_scoring_other_bid: signals.highest_scoring_other_bid,
        made_highest_scoring_other_bid: signals.has_highest_scoring_other_bid
            && signals.highest_scoring_other_bid_ig_owner == interest_group_owner,
        rejection_reason,
    }
}

/// Literal `${name}` substitution; no escaping, no nesting.
pub fn substitute_placeholders(url: &str, placeholder: &DebugReportingPlaceholder) -> String {
    url.replace(WINNING_BID_PLACEHOLDER, &placeholder.winning_bid.to_string())
        .replace(
            MADE_WINNING_BID_PLACEHOLDER,
            if placeholder.made_winning_bid { "true" } else { "false" },
        )
        .replace(
            HIGHEST_SCORING_OTHER_BID_PLACEHOLDER,
            &placeholder.highest_scoring_other_bid.to_string(),
        )
        .replace(
            MADE_HIGHEST_SCORING_OTHER_BID_PLACEHOLDER,
            if placeholder.made_highest_scoring_other_bid { "true" } else { "false" },
        )
        .replace(
            REJECT_REASON_PLACEHOLDER,
            placeholder.rejection_reason.as_reason_str(),
        )
}

/// Fire-and-forget URL sender. Implementations must never surface failures
/// onto the auction critical path.
pub trait Reporter: Send + Sync {
    /// Dispatches a GET to `url`; returns immediately.
    fn report(&self, url: String);
}

/// HTTP reporter with a short timeout; each ping runs on a detached task
/// whose lifetime is independent of the originating request.
pub struct HttpReporter {
    client: reqwest::Client,
}

impl HttpReporter {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Reporter for HttpReporter {
    fn report(&self, url: String) {
        let client = self.client.clone();
        tokio::spawn(async move {
            match client.get(&url).send().await {
                Ok(response) => {
                    debug!(message = "debug report sent", url = %url, status = %response.status());
                }
                Err(e) => {
                    warn!(message = "debug report failed", url = %url, error = %e);
                }
            }
        });
    }
}
