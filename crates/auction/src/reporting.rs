//! Reporting dispatch for the winning ad: builds the
//! `reportingEntryFunction` invocation and parses its output into
//! `WinReportingUrls`.

use std::collections::HashMap;

use ba_api::{AdScore, AdWithBidMetadata, ReportingUrls, WinReportingUrls};
use ba_common::RequestContext;
use ba_dispatch::wrapper::REPORTING_ENTRY_FUNCTION;
use ba_dispatch::DispatchRequest;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

/// Buyer-specific context the reporting wrapper needs to invoke the right
/// per-buyer `reportWin` wrapper.
#[derive(Debug, Clone)]
pub struct BuyerReportingMetadata {
    pub enable_report_win_url_generation: bool,
    pub buyer_signals: Option<String>,
}

/// Builds the dispatch request for `reportingEntryFunction`.
pub fn reporting_dispatch_request(
    code_version: u64,
    winning_score: &AdScore,
    winning_ad: &AdWithBidMetadata,
    publisher_hostname: &str,
    auction_config_json: &str,
    enable_adtech_code_logging: bool,
    buyer_metadata: &BuyerReportingMetadata,
) -> DispatchRequest {
    let highest_scoring_other_bid: f32 = winning_score
        .ig_owner_highest_scoring_other_bids_map
        .values()
        .next()
        .map(|bids| bids.values.iter().sum())
        .unwrap_or(0.0);
    let made_highest_scoring_other_bid = winning_score
        .ig_owner_highest_scoring_other_bids_map
        .contains_key(&winning_score.interest_group_owner);

    let seller_reporting_signals = json!({
        "topWindowHostname": publisher_hostname,
        "interestGroupOwner": winning_score.interest_group_owner,
        "renderURL": winning_score.render,
        "renderUrl": winning_score.render,
        "bid": winning_score.buyer_bid,
        "desirability": winning_score.desirability,
        "highestScoringOtherBid": highest_scoring_other_bid,
    });

    let per_buyer_signals = buyer_metadata
        .buyer_signals
        .as_deref()
        .and_then(|signals| serde_json::from_str::<Value>(signals).ok())
        .unwrap_or(Value::Null);
    let buyer_reporting_metadata = json!({
        "enableReportWinUrlGeneration": buyer_metadata.enable_report_win_url_generation,
        "buyerOrigin": winning_score.interest_group_owner,
        "interestGroupName": winning_score.interest_group_name,
        "madeHighestScoringOtherBid": made_highest_scoring_other_bid,
        "joinCount": winning_ad.join_count,
        "recency": winning_ad.recency,
        "modelingSignals": winning_ad.modeling_signals,
        "perBuyerSignals": per_buyer_signals,
    });

    DispatchRequest {
        id: winning_score.render.clone(),
        version: code_version,
        handler_name: REPORTING_ENTRY_FUNCTION.to_string(),
        input: vec![
            auction_config_json.to_string(),
            seller_reporting_signals.to_string(),
            "\"\"".to_string(),
            enable_adtech_code_logging.to_string(),
            buyer_reporting_metadata.to_string(),
        ],
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReportingOutput {
    #[serde(default, alias = "reportResultResponse")]
    report_result_response: ReportResultResponse,
    #[serde(default, alias = "sellerLogs")]
    seller_logs: Vec<String>,
    #[serde(default, alias = "sellerErrors")]
    seller_errors: Vec<String>,
    #[serde(default, alias = "reportWinResponse")]
    report_win_response: Option<ReportWinResponse>,
    #[serde(default, alias = "buyerLogs")]
    buyer_logs: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReportResultResponse {
    #[serde(default, alias = "reportResultUrl")]
    report_result_url: String,
    #[serde(default, alias = "interactionReportingUrls")]
    interaction_reporting_urls: Value,
}

#[derive(Debug, Default, Deserialize)]
struct ReportWinResponse {
    #[serde(default, alias = "reportWinUrl")]
    report_win_url: String,
    #[serde(default, alias = "interactionReportingUrls")]
    interaction_reporting_urls: Value,
}

fn interaction_map(value: &Value) -> HashMap<String, String> {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(event, url)| {
                    url.as_str().map(|url| (event.clone(), url.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parses the reporting wrapper output into `WinReportingUrls`. Returns
/// `None` when the output is unusable; reporting failures never fail the
/// auction.
pub fn parse_reporting_response(
    raw: &str,
    enable_adtech_code_logging: bool,
    context: &RequestContext,
) -> Option<WinReportingUrls> {
    let output: ReportingOutput = match serde_json::from_str(raw) {
        Ok(output) => output,
        Err(e) => {
            warn!(message = "invalid json output from reporting dispatch", error = %e);
            return None;
        }
    };

    if enable_adtech_code_logging {
        for log in &output.seller_logs {
            context.debug_log(format!("reportResult log: {log}"));
        }
        for error in &output.seller_errors {
            context.debug_log(format!("reportResult error: {error}"));
        }
        for log in &output.buyer_logs {
            context.debug_log(format!("reportWin log: {log}"));
        }
    }

    let mut urls = WinReportingUrls {
        top_level_seller_reporting_urls: Some(ReportingUrls {
            reporting_url: output.report_result_response.report_result_url,
            interaction_reporting_urls: interaction_map(
                &output.report_result_response.interaction_reporting_urls,
            ),
        }),
        ..Default::default()
    };
    if let Some(report_win) = output.report_win_response {
        urls.buyer_reporting_urls = Some(ReportingUrls {
            reporting_url: report_win.report_win_url,
            interaction_reporting_urls: interaction_map(&report_win.interaction_reporting_urls),
        });
    }
    Some(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ba_api::BidList;

    fn winning_score() -> AdScore {
        let mut score = AdScore {
            desirability: 3.0,
            buyer_bid: 2.0,
            render: "https://cdn.example.com/ad1".into(),
            interest_group_name: "cars".into(),
            interest_group_owner: "https://buyer.example.com".into(),
            ..Default::default()
        };
        score
            .ig_owner_highest_scoring_other_bids_map
            .insert("https://other.example.com".into(), BidList { values: vec![1.0] });
        score
    }

    fn winning_ad() -> AdWithBidMetadata {
        AdWithBidMetadata {
            bid: 2.0,
            render: "https://cdn.example.com/ad1".into(),
            interest_group_name: "cars".into(),
            interest_group_owner: "https://buyer.example.com".into(),
            join_count: 4,
            recency: 600,
            modeling_signals: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn dispatch_request_carries_reporting_signals() {
        let request = reporting_dispatch_request(
            1,
            &winning_score(),
            &winning_ad(),
            "pub.example.com",
            "{\"auctionSignals\":{},\"sellerSignals\":{}}",
            true,
            &BuyerReportingMetadata {
                enable_report_win_url_generation: true,
                buyer_signals: Some("{\"b\":1}".into()),
            },
        );

        assert_eq!(request.handler_name, REPORTING_ENTRY_FUNCTION);
        assert_eq!(request.input.len(), 5);

        let signals: Value = serde_json::from_str(&request.input[1]).unwrap();
        assert_eq!(signals["topWindowHostname"], "pub.example.com");
        assert_eq!(signals["renderURL"], "https://cdn.example.com/ad1");
        assert_eq!(signals["bid"], 2.0);
        assert_eq!(signals["desirability"], 3.0);
        assert_eq!(signals["highestScoringOtherBid"], 1.0);

        assert_eq!(request.input[3], "true");

        let metadata: Value = serde_json::from_str(&request.input[4]).unwrap();
        assert_eq!(metadata["enableReportWinUrlGeneration"], true);
        assert_eq!(metadata["buyerOrigin"], "https://buyer.example.com");
        assert_eq!(metadata["interestGroupName"], "cars");
        assert_eq!(metadata["madeHighestScoringOtherBid"], false);
        assert_eq!(metadata["joinCount"], 4);
        assert_eq!(metadata["perBuyerSignals"]["b"], 1);
    }

    #[test]
    fn parses_seller_and_buyer_urls() {
        let raw = r#"{
            "reportResultResponse": {
                "reportResultUrl": "https://seller.example.com/report",
                "interactionReportingUrls": {"click": "https://seller.example.com/click"},
                "sendReportToInvoked": true,
                "registerAdBeaconInvoked": true
            },
            "sellerLogs": [],
            "reportWinResponse": {
                "reportWinUrl": "https://buyer.example.com/win",
                "interactionReportingUrls": {"click": "https://buyer.example.com/click"}
            },
            "buyerLogs": []
        }"#;

        let urls = parse_reporting_response(raw, false, &RequestContext::default()).unwrap();
        let seller = urls.top_level_seller_reporting_urls.unwrap();
        assert_eq!(seller.reporting_url, "https://seller.example.com/report");
        assert_eq!(
            seller.interaction_reporting_urls["click"],
            "https://seller.example.com/click"
        );
        let buyer = urls.buyer_reporting_urls.unwrap();
        assert_eq!(buyer.reporting_url, "https://buyer.example.com/win");
    }

    #[test]
    fn empty_interaction_urls_string_is_tolerated() {
        let raw = r#"{
            "reportResultResponse": {
                "reportResultUrl": "https://seller.example.com/report",
                "interactionReportingUrls": ""
            }
        }"#;
        let urls = parse_reporting_response(raw, false, &RequestContext::default()).unwrap();
        let seller = urls.top_level_seller_reporting_urls.unwrap();
        assert!(seller.interaction_reporting_urls.is_empty());
        assert!(urls.buyer_reporting_urls.is_none());
    }

    #[test]
    fn garbage_output_is_none() {
        assert!(parse_reporting_response("nope", false, &RequestContext::default()).is_none());
    }
}
