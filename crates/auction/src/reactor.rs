//! Core of the auction service: scores every candidate bid through the
//! sandboxed `scoreAd`, selects the winner, computes the
//! highest-scoring-other-bid, and runs the reporting and debug pipelines.

use std::collections::HashMap;
use std::time::Duration;

use ba_api::{
    AdRejectionReason, AdScore, AdWithBidMetadata, BidList, ScoreAdsRawRequest,
    ScoreAdsRawResponse, SellerRejectionReason,
};
use ba_common::reporting::{
    generate_post_auction_signals, placeholder_data_for_interest_group, substitute_placeholders,
    Reporter,
};
use ba_common::RequestContext;
use ba_dispatch::wrapper::{feature_flags_json, SCORE_AD_ENTRY_FUNCTION};
use ba_dispatch::{CodeDispatcher, DispatchRequest};
use serde::Deserialize;
use serde_json::{json, Value};
use tonic::Status;
use tracing::{debug, warn};

use crate::reporting::{
    parse_reporting_response, reporting_dispatch_request, BuyerReportingMetadata,
};

pub const NO_ADS_TO_SCORE_ERROR: &str = "No ads to score.";
pub const NO_TRUSTED_SCORING_SIGNALS_ERROR: &str = "Empty trusted scoring signals";
pub const NO_ADS_WITH_VALID_SCORING_SIGNALS_ERROR: &str = "No ads with valid scoring signals.";

/// Feature toggles and deadlines for the auction service.
#[derive(Debug, Clone)]
pub struct AuctionRuntimeConfig {
    pub enable_adtech_code_logging: bool,
    pub enable_seller_debug_url_generation: bool,
    pub enable_report_result_url_generation: bool,
    pub enable_report_win_url_generation: bool,
    pub score_ads_timeout: Duration,
    pub code_version: u64,
}

/// Wrapper output contract of `scoreAdEntryFunction`.
#[derive(Debug, Default, Deserialize)]
struct ScoreAdOutput {
    #[serde(default)]
    response: ScoreAdValue,
    #[serde(default)]
    logs: Vec<String>,
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

/// `scoreAd` may return a bare number or an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScoreAdValue {
    Number(f64),
    Object(ScoreAdObject),
    // Anything else (string, array, null) scores as invalid.
    Other(Value),
}

impl Default for ScoreAdValue {
    fn default() -> Self {
        Self::Other(Value::Null)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ScoreAdObject {
    #[serde(default)]
    desirability: f64,
    #[serde(default, alias = "rejectReason")]
    reject_reason: Option<String>,
    #[serde(default, alias = "allowComponentAuction")]
    allow_component_auction: bool,
    #[serde(default, alias = "debugReportUrls")]
    debug_report_urls: Option<ScoreAdDebugUrls>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct ScoreAdDebugUrls {
    #[serde(default, alias = "auctionDebugWinUrl")]
    auction_debug_win_url: Option<String>,
    #[serde(default, alias = "auctionDebugLossUrl")]
    auction_debug_loss_url: Option<String>,
}

/// One scored candidate, in `ad_bids` arrival order.
struct ScoredAd {
    ad_index: usize,
    desirability: f32,
    rejection_reason: Option<SellerRejectionReason>,
    allow_component_auction: bool,
    debug_report_urls: Option<ScoreAdDebugUrls>,
}

/// Scores all candidate bids and returns the winning `AdScore`, if any.
pub async fn score_ads(
    dispatcher: &dyn CodeDispatcher,
    config: &AuctionRuntimeConfig,
    context: &RequestContext,
    reporter: &dyn Reporter,
    raw_request: &ScoreAdsRawRequest,
) -> Result<ScoreAdsRawResponse, Status> {
    if raw_request.ad_bids.is_empty() {
        return Err(Status::invalid_argument(NO_ADS_TO_SCORE_ERROR));
    }
    if raw_request.scoring_signals.is_empty() {
        return Err(Status::invalid_argument(NO_TRUSTED_SCORING_SIGNALS_ERROR));
    }

    let scoring_signals: Value = serde_json::from_str(&raw_request.scoring_signals)
        .map_err(|_| Status::invalid_argument(NO_TRUSTED_SCORING_SIGNALS_ERROR))?;
    let render_signals = scoring_signals.get("renderUrls").and_then(Value::as_object);
    let component_signals = scoring_signals
        .get("adComponentRenderUrls")
        .and_then(Value::as_object);

    let auction_config_json = auction_config_json(raw_request);
    let feature_flags = feature_flags_json(
        config.enable_adtech_code_logging,
        config.enable_seller_debug_url_generation && raw_request.enable_debug_reporting,
    );

    // Ads whose render URL has no scoring signals cannot be scored at all.
    let mut dispatch_requests = Vec::with_capacity(raw_request.ad_bids.len());
    let mut dispatched_ads = Vec::with_capacity(raw_request.ad_bids.len());
    for (ad_index, ad) in raw_request.ad_bids.iter().enumerate() {
        let Some(render_value) = render_signals.and_then(|map| map.get(&ad.render)) else {
            debug!(message = "no scoring signals for ad", render = %ad.render);
            continue;
        };

        let mut components = serde_json::Map::new();
        for component in &ad.ad_components {
            if let Some(value) = component_signals.and_then(|map| map.get(component)) {
                components.insert(component.clone(), value.clone());
            }
        }
        let mut render_entry = serde_json::Map::new();
        render_entry.insert(ad.render.clone(), render_value.clone());
        let trusted_scoring_signals = json!({
            "renderUrl": render_entry,
            "adComponentRenderUrls": components,
        });
        let browser_signals = json!({
            "topWindowHostname": raw_request.publisher_hostname,
            "interestGroupOwner": ad.interest_group_owner,
            "renderUrl": ad.render,
            "adComponents": ad.ad_components,
        });

        dispatch_requests.push(DispatchRequest {
            id: ad_index.to_string(),
            version: config.code_version,
            handler_name: SCORE_AD_ENTRY_FUNCTION.to_string(),
            input: vec![
                if ad.ad.is_empty() { "null".to_string() } else { ad.ad.clone() },
                ad.bid.to_string(),
                auction_config_json.clone(),
                trusted_scoring_signals.to_string(),
                browser_signals.to_string(),
                "\"\"".to_string(),
                feature_flags.clone(),
            ],
        });
        dispatched_ads.push(ad_index);
    }

    if dispatch_requests.is_empty() {
        return Err(Status::invalid_argument(NO_ADS_WITH_VALID_SCORING_SIGNALS_ERROR));
    }

    let results = dispatcher
        .batch_execute(dispatch_requests, config.score_ads_timeout)
        .await
        .map_err(|e| Status::internal(e.to_string()))?;

    let mut scored_ads = Vec::with_capacity(results.len());
    for (slot, result) in results.into_iter().enumerate() {
        let ad_index = dispatched_ads[slot];
        match result {
            Ok(response) => {
                if let Some(scored) =
                    parse_score(ad_index, &response.resp, config.enable_adtech_code_logging, context)
                {
                    scored_ads.push(scored);
                }
            }
            Err(e) => {
                warn!(message = "scoreAd dispatch failed", ad_index, error = %e);
            }
        }
    }
    // Dispatch order is not completion order; restore arrival order before
    // the deterministic winner scan.
    scored_ads.sort_by_key(|scored| scored.ad_index);

    let rejection_reasons = collect_rejection_reasons(&raw_request.ad_bids, &scored_ads);

    let Some(winner_index) = select_winner(&scored_ads) else {
        // Chaff: request was well-formed but nothing scored positively.
        perform_debug_reporting(None, &raw_request.ad_bids, &scored_ads, reporter);
        return Ok(ScoreAdsRawResponse::default());
    };
    let winner = &scored_ads[winner_index];
    let winning_ad = &raw_request.ad_bids[winner.ad_index];

    let mut ad_score = AdScore {
        desirability: winner.desirability,
        render: winning_ad.render.clone(),
        component_renders: winning_ad.ad_components.clone(),
        interest_group_name: winning_ad.interest_group_name.clone(),
        interest_group_owner: winning_ad.interest_group_owner.clone(),
        buyer_bid: winning_ad.bid,
        allow_component_auction: winner.allow_component_auction,
        ad_rejection_reasons: rejection_reasons,
        ..Default::default()
    };
    if let Some((owner, total)) =
        highest_scoring_other_bid(&raw_request.ad_bids, &scored_ads, winner_index)
    {
        ad_score
            .ig_owner_highest_scoring_other_bids_map
            .insert(owner, BidList { values: vec![total] });
    }
    if let Some(debug_urls) = &winner.debug_report_urls {
        ad_score.debug_report_urls = Some(ba_api::DebugReportUrls {
            auction_debug_win_url: debug_urls.auction_debug_win_url.clone().unwrap_or_default(),
            auction_debug_loss_url: debug_urls.auction_debug_loss_url.clone().unwrap_or_default(),
        });
    }

    if config.enable_report_result_url_generation {
        perform_reporting(dispatcher, config, context, raw_request, &mut ad_score, winning_ad)
            .await;
    }

    perform_debug_reporting(Some(&ad_score), &raw_request.ad_bids, &scored_ads, reporter);

    Ok(ScoreAdsRawResponse { ad_score: Some(ad_score) })
}

fn auction_config_json(raw_request: &ScoreAdsRawRequest) -> String {
    let non_empty = |signals: &str| {
        if signals.is_empty() {
            "\"\"".to_string()
        } else {
            signals.to_string()
        }
    };
    format!(
        "{{\"auctionSignals\":{},\"sellerSignals\":{}}}",
        non_empty(&raw_request.auction_signals),
        non_empty(&raw_request.seller_signals),
    )
}

fn parse_score(
    ad_index: usize,
    raw: &str,
    log_adtech_output: bool,
    context: &RequestContext,
) -> Option<ScoredAd> {
    let output: ScoreAdOutput = match serde_json::from_str(raw) {
        Ok(output) => output,
        Err(e) => {
            warn!(message = "invalid json output from scoreAd", ad_index, error = %e);
            return None;
        }
    };

    if log_adtech_output {
        for log in &output.logs {
            context.debug_log(format!("scoreAd log: {log}"));
        }
        for warning in &output.warnings {
            context.debug_log(format!("scoreAd warning: {warning}"));
        }
        for error in &output.errors {
            context.debug_log(format!("scoreAd error: {error}"));
        }
    }

    let scored = match output.response {
        ScoreAdValue::Number(desirability) => ScoredAd {
            ad_index,
            desirability: desirability as f32,
            rejection_reason: None,
            allow_component_auction: false,
            debug_report_urls: None,
        },
        ScoreAdValue::Object(object) => ScoredAd {
            ad_index,
            desirability: object.desirability as f32,
            rejection_reason: object
                .reject_reason
                .as_deref()
                .map(SellerRejectionReason::from_reason_str),
            allow_component_auction: object.allow_component_auction,
            debug_report_urls: object.debug_report_urls,
        },
        ScoreAdValue::Other(value) => {
            warn!(message = "scoreAd returned a non-score value", ad_index, value = %value);
            return None;
        }
    };
    Some(scored)
}

/// A candidate survives when it scored strictly positive and the seller did
/// not name an explicit rejection reason.
fn survives(scored: &ScoredAd) -> bool {
    scored.desirability > 0.0 && scored.rejection_reason.is_none()
}

/// Argmax over desirability with first-arrival tie-break. Returns an index
/// into `scored_ads`.
fn select_winner(scored_ads: &[ScoredAd]) -> Option<usize> {
    let mut winner: Option<usize> = None;
    for (index, scored) in scored_ads.iter().enumerate() {
        if !survives(scored) {
            continue;
        }
        match winner {
            Some(current) if scored_ads[current].desirability >= scored.desirability => {}
            _ => winner = Some(index),
        }
    }
    winner
}

/// Rejection reasons for every non-surviving candidate; explicit reasons
/// from `scoreAd` win over the not-available default.
fn collect_rejection_reasons(
    ad_bids: &[AdWithBidMetadata],
    scored_ads: &[ScoredAd],
) -> Vec<AdRejectionReason> {
    scored_ads
        .iter()
        .filter(|scored| !survives(scored))
        .map(|scored| {
            let ad = &ad_bids[scored.ad_index];
            AdRejectionReason {
                interest_group_owner: ad.interest_group_owner.clone(),
                interest_group_name: ad.interest_group_name.clone(),
                rejection_reason: scored
                    .rejection_reason
                    .unwrap_or(SellerRejectionReason::SellerRejectionReasonNotAvailable)
                    as i32,
            }
        })
        .collect()
}

/// Picks the owner group with the highest bid sum among survivors,
/// excluding the winning bid. The winner's own owner is only eligible when
/// no other owner has a positive surviving bid; ties break on first-seen
/// owner in arrival order.
fn highest_scoring_other_bid(
    ad_bids: &[AdWithBidMetadata],
    scored_ads: &[ScoredAd],
    winner_index: usize,
) -> Option<(String, f32)> {
    let winner_owner = &ad_bids[scored_ads[winner_index].ad_index].interest_group_owner;

    let mut sums: HashMap<&str, f32> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for (index, scored) in scored_ads.iter().enumerate() {
        if index == winner_index || !survives(scored) {
            continue;
        }
        let ad = &ad_bids[scored.ad_index];
        let owner = ad.interest_group_owner.as_str();
        if !sums.contains_key(owner) {
            order.push(owner);
        }
        *sums.entry(owner).or_insert(0.0) += ad.bid;
    }

    let other_owners: Vec<&str> = order
        .iter()
        .copied()
        .filter(|owner| *owner != winner_owner && sums[owner] > 0.0)
        .collect();
    let candidates = if other_owners.is_empty() { order.clone() } else { other_owners };

    let mut best: Option<(&str, f32)> = None;
    for owner in candidates {
        let total = sums[owner];
        match best {
            Some((_, best_total)) if best_total >= total => {}
            _ => best = Some((owner, total)),
        }
    }
    best.map(|(owner, total)| (owner.to_string(), total))
}

async fn perform_reporting(
    dispatcher: &dyn CodeDispatcher,
    config: &AuctionRuntimeConfig,
    context: &RequestContext,
    raw_request: &ScoreAdsRawRequest,
    ad_score: &mut AdScore,
    winning_ad: &AdWithBidMetadata,
) {
    let buyer_metadata = BuyerReportingMetadata {
        enable_report_win_url_generation: config.enable_report_win_url_generation,
        buyer_signals: raw_request
            .per_buyer_signals
            .get(&ad_score.interest_group_owner)
            .cloned(),
    };
    let request = reporting_dispatch_request(
        config.code_version,
        ad_score,
        winning_ad,
        &raw_request.publisher_hostname,
        &auction_config_json(raw_request),
        config.enable_adtech_code_logging,
        &buyer_metadata,
    );

    match dispatcher
        .batch_execute(vec![request], config.score_ads_timeout)
        .await
    {
        Ok(results) => {
            if let Some(Ok(response)) = results.into_iter().next() {
                ad_score.win_reporting_urls = parse_reporting_response(
                    &response.resp,
                    config.enable_adtech_code_logging,
                    context,
                );
            }
        }
        Err(e) => {
            warn!(message = "reporting dispatch failed", error = %e);
        }
    }
}

/// Substitutes post-auction placeholders into every candidate's debug URL
/// and fires best-effort pings. The winner gets its win URL, every loser
/// its loss URL.
fn perform_debug_reporting(
    winning_score: Option<&AdScore>,
    ad_bids: &[AdWithBidMetadata],
    scored_ads: &[ScoredAd],
    reporter: &dyn Reporter,
) {
    let signals = generate_post_auction_signals(winning_score);
    for scored in scored_ads {
        let Some(debug_urls) = &scored.debug_report_urls else {
            continue;
        };
        let ad = &ad_bids[scored.ad_index];
        let is_winner = signals.winning_ig_owner == ad.interest_group_owner
            && signals.winning_ig_name == ad.interest_group_name
            && winning_score.is_some();
        let url = if is_winner {
            debug_urls.auction_debug_win_url.as_deref()
        } else {
            debug_urls.auction_debug_loss_url.as_deref()
        };
        let Some(url) = url.filter(|url| !url.is_empty()) else {
            continue;
        };
        let placeholder = placeholder_data_for_interest_group(
            &ad.interest_group_owner,
            &ad.interest_group_name,
            &signals,
        );
        reporter.report(substitute_placeholders(url, &placeholder));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ba_dispatch::{DispatchError, DispatchResponse};
    use std::sync::Mutex;

    /// Dispatcher that maps each request id to a canned scoreAd output.
    struct ScoreTable {
        scores: HashMap<String, String>,
        reporting_response: Option<String>,
        requests: Mutex<Vec<DispatchRequest>>,
    }

    impl ScoreTable {
        fn new(scores: &[(&str, &str)]) -> Self {
            Self {
                scores: scores
                    .iter()
                    .map(|(id, resp)| (id.to_string(), resp.to_string()))
                    .collect(),
                reporting_response: None,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CodeDispatcher for ScoreTable {
        async fn batch_execute(
            &self,
            requests: Vec<DispatchRequest>,
            _timeout: Duration,
        ) -> Result<Vec<Result<DispatchResponse, DispatchError>>, DispatchError> {
            self.requests.lock().unwrap().extend(requests.iter().cloned());
            Ok(requests
                .into_iter()
                .map(|request| {
                    if request.handler_name == ba_dispatch::wrapper::REPORTING_ENTRY_FUNCTION {
                        return match &self.reporting_response {
                            Some(resp) => {
                                Ok(DispatchResponse { id: request.id, resp: resp.clone() })
                            }
                            None => Err(DispatchError::Engine("no reporting".into())),
                        };
                    }
                    match self.scores.get(&request.id) {
                        Some(resp) => Ok(DispatchResponse { id: request.id, resp: resp.clone() }),
                        None => Err(DispatchError::Timeout),
                    }
                })
                .collect())
        }
    }

    /// Reporter that collects URLs instead of sending them.
    #[derive(Default)]
    struct CapturingReporter {
        urls: Mutex<Vec<String>>,
    }

    impl Reporter for CapturingReporter {
        fn report(&self, url: String) {
            self.urls.lock().unwrap().push(url);
        }
    }

    fn config() -> AuctionRuntimeConfig {
        AuctionRuntimeConfig {
            enable_adtech_code_logging: false,
            enable_seller_debug_url_generation: true,
            enable_report_result_url_generation: false,
            enable_report_win_url_generation: false,
            score_ads_timeout: Duration::from_millis(100),
            code_version: 1,
        }
    }

    fn ad(owner: &str, name: &str, render: &str, bid: f32) -> AdWithBidMetadata {
        AdWithBidMetadata {
            ad: "{\"meta\": 1}".into(),
            bid,
            render: render.into(),
            interest_group_name: name.into(),
            interest_group_owner: owner.into(),
            ..Default::default()
        }
    }

    fn raw_request(ad_bids: Vec<AdWithBidMetadata>) -> ScoreAdsRawRequest {
        let renders: Vec<String> = ad_bids.iter().map(|ad| ad.render.clone()).collect();
        let mut render_urls = serde_json::Map::new();
        for render in renders {
            render_urls.insert(render, json!([1]));
        }
        ScoreAdsRawRequest {
            ad_bids,
            seller_signals: "{\"s\":1}".into(),
            auction_signals: "{\"a\":1}".into(),
            scoring_signals: json!({"renderUrls": render_urls}).to_string(),
            publisher_hostname: "pub.example.com".into(),
            enable_debug_reporting: true,
            ..Default::default()
        }
    }

    fn score(desirability: f64) -> String {
        format!("{{\"response\": {{\"desirability\": {desirability}}}}}")
    }

    #[tokio::test]
    async fn empty_ad_bids_is_invalid_argument() {
        let dispatcher = ScoreTable::new(&[]);
        let err = score_ads(
            &dispatcher,
            &config(),
            &RequestContext::default(),
            &CapturingReporter::default(),
            &raw_request(vec![]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message(), NO_ADS_TO_SCORE_ERROR);
    }

    #[tokio::test]
    async fn empty_scoring_signals_is_invalid_argument() {
        let dispatcher = ScoreTable::new(&[]);
        let mut request = raw_request(vec![ad("https://b.example.com", "cars", "r1", 1.0)]);
        request.scoring_signals = String::new();
        let err = score_ads(
            &dispatcher,
            &config(),
            &RequestContext::default(),
            &CapturingReporter::default(),
            &request,
        )
        .await
        .unwrap_err();
        assert_eq!(err.message(), NO_TRUSTED_SCORING_SIGNALS_ERROR);
    }

    #[tokio::test]
    async fn winner_is_argmax_with_first_arrival_tie_break() {
        let dispatcher = ScoreTable::new(&[
            ("0", &score(2.0)),
            ("1", &score(3.0)),
            ("2", &score(3.0)),
        ]);
        let request = raw_request(vec![
            ad("https://a.example.com", "cars", "r0", 1.0),
            ad("https://b.example.com", "bikes", "r1", 2.0),
            ad("https://c.example.com", "boats", "r2", 3.0),
        ]);

        let response = score_ads(
            &dispatcher,
            &config(),
            &RequestContext::default(),
            &CapturingReporter::default(),
            &request,
        )
        .await
        .unwrap();

        let ad_score = response.ad_score.unwrap();
        assert_eq!(ad_score.desirability, 3.0);
        assert_eq!(ad_score.render, "r1");
        assert_eq!(ad_score.interest_group_owner, "https://b.example.com");
        assert_eq!(ad_score.buyer_bid, 2.0);
    }

    #[tokio::test]
    async fn bare_number_scores_are_accepted() {
        let dispatcher = ScoreTable::new(&[("0", "{\"response\": 4.5}")]);
        let request = raw_request(vec![ad("https://a.example.com", "cars", "r0", 1.0)]);
        let response = score_ads(
            &dispatcher,
            &config(),
            &RequestContext::default(),
            &CapturingReporter::default(),
            &request,
        )
        .await
        .unwrap();
        assert_eq!(response.ad_score.unwrap().desirability, 4.5);
    }

    #[tokio::test]
    async fn no_positive_score_is_chaff() {
        let dispatcher = ScoreTable::new(&[("0", &score(0.0)), ("1", &score(-1.0))]);
        let request = raw_request(vec![
            ad("https://a.example.com", "cars", "r0", 1.0),
            ad("https://b.example.com", "bikes", "r1", 2.0),
        ]);
        let response = score_ads(
            &dispatcher,
            &config(),
            &RequestContext::default(),
            &CapturingReporter::default(),
            &request,
        )
        .await
        .unwrap();
        assert!(response.ad_score.is_none());
    }

    #[tokio::test]
    async fn highest_scoring_other_bid_excludes_winner_owner() {
        let dispatcher = ScoreTable::new(&[
            ("0", &score(5.0)),
            ("1", &score(4.0)),
            ("2", &score(1.0)),
            ("3", &score(1.0)),
        ]);
        // Winner's owner also has another surviving bid (index 1, bid 10),
        // but other owners contributed, so the map must name one of them.
        let request = raw_request(vec![
            ad("https://win.example.com", "cars", "r0", 2.0),
            ad("https://win.example.com", "vans", "r1", 10.0),
            ad("https://other.example.com", "bikes", "r2", 3.0),
            ad("https://other.example.com", "boats", "r3", 1.5),
        ]);

        let response = score_ads(
            &dispatcher,
            &config(),
            &RequestContext::default(),
            &CapturingReporter::default(),
            &request,
        )
        .await
        .unwrap();

        let ad_score = response.ad_score.unwrap();
        let (owner, bids) = ad_score
            .ig_owner_highest_scoring_other_bids_map
            .iter()
            .next()
            .unwrap();
        assert_eq!(owner, "https://other.example.com");
        assert_eq!(bids.values, vec![4.5]);
    }

    #[tokio::test]
    async fn winner_owner_is_used_when_it_is_the_only_owner() {
        let dispatcher = ScoreTable::new(&[("0", &score(5.0)), ("1", &score(4.0))]);
        let request = raw_request(vec![
            ad("https://solo.example.com", "cars", "r0", 2.0),
            ad("https://solo.example.com", "vans", "r1", 1.0),
        ]);
        let response = score_ads(
            &dispatcher,
            &config(),
            &RequestContext::default(),
            &CapturingReporter::default(),
            &request,
        )
        .await
        .unwrap();
        let ad_score = response.ad_score.unwrap();
        let (owner, bids) = ad_score
            .ig_owner_highest_scoring_other_bids_map
            .iter()
            .next()
            .unwrap();
        assert_eq!(owner, "https://solo.example.com");
        assert_eq!(bids.values, vec![1.0]);
    }

    #[tokio::test]
    async fn rejection_reasons_use_the_closed_vocabulary() {
        let dispatcher = ScoreTable::new(&[
            ("0", &score(5.0)),
            (
                "1",
                "{\"response\": {\"desirability\": 2.0, \"rejectReason\": \"invalid-bid\"}}",
            ),
            ("2", &score(0.0)),
        ]);
        let request = raw_request(vec![
            ad("https://a.example.com", "cars", "r0", 1.0),
            ad("https://b.example.com", "bikes", "r1", 2.0),
            ad("https://c.example.com", "boats", "r2", 3.0),
        ]);

        let response = score_ads(
            &dispatcher,
            &config(),
            &RequestContext::default(),
            &CapturingReporter::default(),
            &request,
        )
        .await
        .unwrap();

        let ad_score = response.ad_score.unwrap();
        assert_eq!(ad_score.ad_rejection_reasons.len(), 2);
        let by_owner: HashMap<_, _> = ad_score
            .ad_rejection_reasons
            .iter()
            .map(|r| (r.interest_group_owner.clone(), r.rejection_reason))
            .collect();
        assert_eq!(
            by_owner["https://b.example.com"],
            SellerRejectionReason::InvalidBid as i32
        );
        assert_eq!(
            by_owner["https://c.example.com"],
            SellerRejectionReason::SellerRejectionReasonNotAvailable as i32
        );
    }

    #[tokio::test]
    async fn debug_urls_are_substituted_and_fired() {
        let dispatcher = ScoreTable::new(&[
            (
                "0",
                "{\"response\": {\"desirability\": 5.0, \"debugReportUrls\": \
                 {\"auctionDebugWinUrl\": \"https://a.example.com/win?b=${winningBid}\"}}}",
            ),
            (
                "1",
                "{\"response\": {\"desirability\": 0.0, \"debugReportUrls\": \
                 {\"auctionDebugLossUrl\": \
                  \"https://b.example.com/loss?r=${rejectReason}&m=${madeWinningBid}\"}}}",
            ),
        ]);
        let request = raw_request(vec![
            ad("https://a.example.com", "cars", "r0", 2.0),
            ad("https://b.example.com", "bikes", "r1", 1.0),
        ]);

        let reporter = CapturingReporter::default();
        let _ = score_ads(
            &dispatcher,
            &config(),
            &RequestContext::default(),
            &reporter,
            &request,
        )
        .await
        .unwrap();

        let urls = reporter.urls.lock().unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains(&"https://a.example.com/win?b=2".to_string()));
        assert!(urls.contains(&"https://b.example.com/loss?r=not-available&m=false".to_string()));
    }

    #[tokio::test]
    async fn reporting_urls_attach_to_the_winner() {
        let mut dispatcher = ScoreTable::new(&[("0", &score(5.0))]);
        dispatcher.reporting_response = Some(
            r#"{"reportResultResponse": {"reportResultUrl": "https://seller.example.com/rr"},
                "reportWinResponse": {"reportWinUrl": "https://buyer.example.com/rw"}}"#
                .to_string(),
        );
        let mut config = config();
        config.enable_report_result_url_generation = true;
        config.enable_report_win_url_generation = true;

        let mut request = raw_request(vec![ad("https://a.example.com", "cars", "r0", 2.0)]);
        request
            .per_buyer_signals
            .insert("https://a.example.com".into(), "{\"pb\":1}".into());

        let response = score_ads(
            &dispatcher,
            &config,
            &RequestContext::default(),
            &CapturingReporter::default(),
            &request,
        )
        .await
        .unwrap();

        let urls = response.ad_score.unwrap().win_reporting_urls.unwrap();
        assert_eq!(
            urls.top_level_seller_reporting_urls.unwrap().reporting_url,
            "https://seller.example.com/rr"
        );
        assert_eq!(
            urls.buyer_reporting_urls.unwrap().reporting_url,
            "https://buyer.example.com/rw"
        );
    }

    #[tokio::test]
    async fn ads_without_scoring_signals_are_rejected_when_none_remain() {
        let dispatcher = ScoreTable::new(&[]);
        let mut request = raw_request(vec![ad("https://a.example.com", "cars", "r0", 1.0)]);
        request.scoring_signals = "{\"renderUrls\": {\"other\": [1]}}".into();
        let err = score_ads(
            &dispatcher,
            &config(),
            &RequestContext::default(),
            &CapturingReporter::default(),
            &request,
        )
        .await
        .unwrap_err();
        assert_eq!(err.message(), NO_ADS_WITH_VALID_SCORING_SIGNALS_ERROR);
    }
}
