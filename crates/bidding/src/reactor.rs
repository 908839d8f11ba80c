//! Core of the bidding service: turns one `GenerateBidsRawRequest` into a
//! `GenerateBidsRawResponse` by dispatching `generateBid` for every interest
//! group and parsing the results.

use std::collections::HashSet;
use std::time::Duration;

use ba_api::{
    AdWithBid, DebugReportUrls, GenerateBidsRawRequest, GenerateBidsRawResponse,
    InterestGroupForBidding,
};
use ba_common::RequestContext;
use ba_dispatch::wrapper::{feature_flags_json, GENERATE_BID_ENTRY_FUNCTION};
use ba_dispatch::{CodeDispatcher, DispatchRequest};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tonic::Status;
use tracing::{debug, warn};

pub const NO_INTEREST_GROUPS_ERROR: &str = "No interest groups found to generate bids for.";
pub const MISSING_SIGNALS_KEYS_ERROR: &str =
    "Malformatted trusted bidding signals (Missing property \"keys\")";
pub const NO_TRUSTED_SIGNALS_ERROR: &str =
    "Interest Group must contain non-empty trusted bidding signals to generate bids.";

/// Feature toggles and deadlines the reactor needs per process.
#[derive(Debug, Clone)]
pub struct BiddingRuntimeConfig {
    pub enable_adtech_code_logging: bool,
    pub enable_buyer_debug_url_generation: bool,
    pub generate_bid_timeout: Duration,
    pub code_version: u64,
}

/// Wrapper output contract of `generateBidEntryFunction`.
#[derive(Debug, Default, Deserialize)]
struct GenerateBidOutput {
    #[serde(default)]
    response: BidResponse,
    #[serde(default)]
    logs: Vec<String>,
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

/// The ad tech's `generateBid` return value. Accepts both the snake_case
/// keys the wrapper emits and the camelCase names from hand-rolled scripts.
#[derive(Debug, Default, Deserialize)]
struct BidResponse {
    #[serde(default)]
    ad: Value,
    #[serde(default)]
    bid: f32,
    #[serde(default)]
    render: String,
    #[serde(default, alias = "adComponents")]
    ad_components: Vec<String>,
    #[serde(default, alias = "allowComponentAuction")]
    allow_component_auction: bool,
    #[serde(default, alias = "adCost")]
    ad_cost: Option<f64>,
    #[serde(default, alias = "modelingSignals")]
    modeling_signals: Option<i32>,
    #[serde(default, alias = "bidCurrency")]
    bid_currency: String,
    #[serde(default, alias = "debugReportUrls")]
    debug_report_urls: Option<DebugUrls>,
}

#[derive(Debug, Deserialize)]
struct DebugUrls {
    #[serde(default, alias = "auctionDebugWinUrl")]
    auction_debug_win_url: Option<String>,
    #[serde(default, alias = "auctionDebugLossUrl")]
    auction_debug_loss_url: Option<String>,
}

/// Generates bids for every interest group in the request.
///
/// Per-group dispatch failures are skipped; the RPC only fails on input
/// validation or a batch-level dispatch failure.
pub async fn generate_bids(
    dispatcher: &dyn CodeDispatcher,
    config: &BiddingRuntimeConfig,
    context: &RequestContext,
    raw_request: &GenerateBidsRawRequest,
) -> Result<GenerateBidsRawResponse, Status> {
    if raw_request.interest_group_for_bidding.is_empty() {
        return Err(Status::invalid_argument(NO_INTEREST_GROUPS_ERROR));
    }

    let signals: Value = serde_json::from_str(&raw_request.bidding_signals)
        .map_err(|_| Status::invalid_argument(MISSING_SIGNALS_KEYS_ERROR))?;
    let signals_by_key = signals
        .get("keys")
        .and_then(Value::as_object)
        .ok_or_else(|| Status::invalid_argument(MISSING_SIGNALS_KEYS_ERROR))?;

    let auction_signals = non_empty_json(&raw_request.auction_signals);
    let buyer_signals = non_empty_json(&raw_request.buyer_signals);
    let feature_flags = feature_flags_json(
        config.enable_adtech_code_logging,
        config.enable_buyer_debug_url_generation && raw_request.enable_debug_reporting,
    );

    let mut dispatch_requests = Vec::with_capacity(raw_request.interest_group_for_bidding.len());
    for ig in &raw_request.interest_group_for_bidding {
        let Some((trusted_signals, parsed_keys)) = signals_for_interest_group(ig, signals_by_key)
        else {
            debug!(
                message = "skipping interest group without trusted bidding signals",
                interest_group = %ig.name,
            );
            continue;
        };

        dispatch_requests.push(DispatchRequest {
            id: ig.name.clone(),
            version: config.code_version,
            handler_name: GENERATE_BID_ENTRY_FUNCTION.to_string(),
            input: vec![
                serialize_interest_group(ig, &parsed_keys),
                auction_signals.clone(),
                buyer_signals.clone(),
                trusted_signals,
                browser_signals_json(raw_request, ig),
                feature_flags.clone(),
            ],
        });
    }

    if dispatch_requests.is_empty() {
        return Err(Status::invalid_argument(NO_TRUSTED_SIGNALS_ERROR));
    }

    let results = dispatcher
        .batch_execute(dispatch_requests, config.generate_bid_timeout)
        .await
        .map_err(|e| Status::internal(e.to_string()))?;

    let mut response = GenerateBidsRawResponse::default();
    let mut failed = 0usize;
    let total = results.len();
    for result in results {
        match result {
            Ok(dispatch_response) => {
                if let Some(bid) = parse_bid(
                    &dispatch_response.id,
                    &dispatch_response.resp,
                    config.enable_adtech_code_logging,
                    context,
                ) {
                    response.bids.push(bid);
                }
            }
            Err(e) => {
                failed += 1;
                warn!(message = "generateBid dispatch failed", error = %e);
            }
        }
    }
    debug!(message = "generateBid batch complete", failed, total);

    Ok(response)
}

fn non_empty_json(signals: &str) -> String {
    if signals.is_empty() {
        "\"\"".to_string()
    } else {
        signals.to_string()
    }
}

/// Slices the request-wide bidding signals down to the keys this interest
/// group asked for. The group's own name is also a lookup key. Returns
/// `None` when none of the keys are present.
fn signals_for_interest_group(
    ig: &InterestGroupForBidding,
    signals_by_key: &Map<String, Value>,
) -> Option<(String, Vec<String>)> {
    let mut sliced = Map::new();
    let mut parsed_keys = Vec::new();
    let mut seen = HashSet::new();

    if let Some(value) = signals_by_key.get(&ig.name) {
        sliced.insert(ig.name.clone(), value.clone());
        parsed_keys.push(ig.name.clone());
        seen.insert(ig.name.as_str());
    }
    for key in &ig.trusted_bidding_signals_keys {
        if !seen.insert(key.as_str()) {
            continue;
        }
        if let Some(value) = signals_by_key.get(key) {
            sliced.insert(key.clone(), value.clone());
            parsed_keys.push(key.clone());
        }
    }

    if sliced.is_empty() {
        return None;
    }
    Some((Value::Object(sliced).to_string(), parsed_keys))
}

/// Serializes the interest group for the script, omitting empty fields.
/// Only the signal keys that were actually found are passed along.
fn serialize_interest_group(ig: &InterestGroupForBidding, parsed_keys: &[String]) -> String {
    let mut out = Map::new();
    out.insert("name".into(), json!(ig.name));
    if !parsed_keys.is_empty() {
        out.insert("trustedBiddingSignalsKeys".into(), json!(parsed_keys));
    }
    if !ig.ad_render_ids.is_empty() {
        out.insert("adRenderIds".into(), json!(ig.ad_render_ids));
    }
    if !ig.ad_component_render_ids.is_empty() {
        out.insert("adComponentRenderIds".into(), json!(ig.ad_component_render_ids));
    }
    if !ig.user_bidding_signals.is_empty() {
        match serde_json::from_str::<Value>(&ig.user_bidding_signals) {
            Ok(user_signals) => {
                out.insert("userBiddingSignals".into(), user_signals);
            }
            Err(e) => {
                warn!(
                    message = "dropping malformed userBiddingSignals",
                    interest_group = %ig.name,
                    error = %e,
                );
            }
        }
    }
    Value::Object(out).to_string()
}

/// Device signals argument for `generateBid` on the browser path.
fn browser_signals_json(raw_request: &GenerateBidsRawRequest, ig: &InterestGroupForBidding) -> String {
    let signals = ig.browser_signals.clone().unwrap_or_default();
    let prev_wins = if signals.prev_wins.is_empty() {
        "\"\"".to_string()
    } else {
        signals.prev_wins
    };
    format!(
        "{{\"topWindowHostname\":\"{}\",\"seller\":\"{}\",\"topLevelSeller\":\"{}\",\
         \"joinCount\":{},\"bidCount\":{},\"recency\":{},\"prevWins\":{}}}",
        raw_request.publisher_name,
        raw_request.seller,
        raw_request.seller,
        signals.join_count,
        signals.bid_count,
        signals.recency,
        prev_wins,
    )
}

/// Parses one wrapper result into an `AdWithBid`.
///
/// A zero bid without debug URLs is dropped; with debug URLs it is kept at
/// bid 0 purely so the URLs reach scoring.
fn parse_bid(
    interest_group_name: &str,
    raw: &str,
    log_adtech_output: bool,
    context: &RequestContext,
) -> Option<AdWithBid> {
    let output: GenerateBidOutput = match serde_json::from_str(raw) {
        Ok(output) => output,
        Err(e) => {
            warn!(
                message = "invalid json output from generateBid",
                interest_group = %interest_group_name,
                error = %e,
            );
            return None;
        }
    };

    if log_adtech_output {
        for log in &output.logs {
            context.debug_log(format!("generateBid log: {log}"));
        }
        for warning in &output.warnings {
            context.debug_log(format!("generateBid warning: {warning}"));
        }
        for error in &output.errors {
            context.debug_log(format!("generateBid error: {error}"));
        }
    }

    let response = output.response;
    let debug_report_urls = response.debug_report_urls.map(|urls| DebugReportUrls {
        auction_debug_win_url: urls.auction_debug_win_url.unwrap_or_default(),
        auction_debug_loss_url: urls.auction_debug_loss_url.unwrap_or_default(),
    });

    if (response.bid <= 0.0 || response.render.is_empty()) && debug_report_urls.is_none() {
        debug!(
            message = "skipping non-positive bid",
            interest_group = %interest_group_name,
        );
        return None;
    }

    let bid = if response.bid > 0.0 && !response.render.is_empty() {
        response.bid
    } else {
        0.0
    };

    Some(AdWithBid {
        ad: if response.ad.is_null() {
            String::new()
        } else {
            response.ad.to_string()
        },
        bid,
        render: response.render,
        ad_components: response.ad_components,
        allow_component_auction: response.allow_component_auction,
        interest_group_name: interest_group_name.to_string(),
        ad_cost: response.ad_cost,
        debug_report_urls,
        modeling_signals: response.modeling_signals,
        bid_currency: response.bid_currency,
    })
}
