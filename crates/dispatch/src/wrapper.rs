//! Wrapper codegen for ad-tech-authored JavaScript.
//!
//! The wrappers are textual: they concatenate fixed templates around the
//! ad-tech code to expose the entry functions the reactors dispatch to, to
//! capture console output, and to collect debug/reporting URLs. The
//! dispatcher never parses the result; the only invariant is that the entry
//! function names below stay fixed.

use std::collections::HashMap;
use std::fmt::Write as _;

/// Entry point the bidding reactor dispatches to.
pub const GENERATE_BID_ENTRY_FUNCTION: &str = "generateBidEntryFunction";
/// Entry point the auction reactor dispatches to for scoring.
pub const SCORE_AD_ENTRY_FUNCTION: &str = "scoreAdEntryFunction";
/// Entry point the auction reactor dispatches to for reporting.
pub const REPORTING_ENTRY_FUNCTION: &str = "reportingEntryFunction";

const FEATURE_LOGGING: &str = "enable_logging";
const FEATURE_DEBUG_URL_GENERATION: &str = "enable_debug_url_generation";

/// Feature flags passed as the last dispatch argument.
pub fn feature_flags_json(enable_logging: bool, enable_debug_url_generation: bool) -> String {
    format!(
        "{{\"{FEATURE_LOGGING}\": {enable_logging}, \
         \"{FEATURE_DEBUG_URL_GENERATION}\": {enable_debug_url_generation}}}"
    )
}

/// Per-buyer `reportWin` wrapper name: the fixed prefix plus the buyer
/// origin with every non-alphanumeric character stripped.
pub fn report_win_wrapper_name(buyer_origin: &str) -> String {
    let sanitized: String = buyer_origin.chars().filter(char::is_ascii_alphanumeric).collect();
    format!("reportWinWrapper{sanitized}")
}

/// Embeds raw WASM bytes as a JS hex array and compiles it into
/// `globalWasmHelper` (null when no module is configured).
fn wasm_module_js(wasm_bytes: &[u8]) -> String {
    let mut hex_array = String::with_capacity(wasm_bytes.len() * 5);
    for byte in wasm_bytes {
        // A trailing comma after the last element is fine in JS.
        let _ = write!(hex_array, "{byte:#x},");
    }
    format!(
        r#"
  const globalWasmHex = [{hex_array}];
  const globalWasmHelper = globalWasmHex.length ? new WebAssembly.Module(Uint8Array.from(globalWasmHex)) : null;
"#
    )
}

const BUYER_ENTRY_FUNCTION: &str = r#"
    const forDebuggingOnly = {}
    forDebuggingOnly.auction_win_url = undefined;
    forDebuggingOnly.auction_loss_url = undefined;

    forDebuggingOnly.reportAdAuctionLoss = (url) => {
      forDebuggingOnly.auction_loss_url = url;
    }

    forDebuggingOnly.reportAdAuctionWin = (url) => {
      forDebuggingOnly.auction_win_url = url;
    }

    function generateBidEntryFunction(interest_group,
                                auction_signals,
                                buyer_signals,
                                trusted_bidding_signals,
                                device_signals,
                                featureFlags){
      device_signals.wasmHelper = globalWasmHelper;
      var ps_logs = [];
      var ps_errors = [];
      var ps_warns = [];
      if(featureFlags.enable_logging){
        console.log = function(...args) {
          ps_logs.push(JSON.stringify(args))
        }
        console.error = function(...args) {
          ps_errors.push(JSON.stringify(args))
        }
        console.warn = function(...args) {
          ps_warns.push(JSON.stringify(args))
        }
      }
      var generateBidResponse = {};
      try {
        generateBidResponse = generateBid(interest_group, auction_signals,
          buyer_signals, trusted_bidding_signals, device_signals);
      } catch({error, message}) {
          console.error("[Error: " + error + "; Message: " + message + "]");
      } finally {
        if( featureFlags.enable_debug_url_generation &&
            (forDebuggingOnly.auction_win_url
                || forDebuggingOnly.auction_loss_url)) {
          generateBidResponse.debug_report_urls = {
            auction_debug_loss_url: forDebuggingOnly.auction_loss_url,
            auction_debug_win_url: forDebuggingOnly.auction_win_url
          }
        }
      }
      return {
        response: generateBidResponse,
        logs: ps_logs,
        errors: ps_errors,
        warnings: ps_warns
      }
    }
"#;

/// Wraps buyer `generateBid` code, optionally with a WASM helper module.
pub fn get_buyer_wrapped_code(adtech_js: &str, adtech_wasm: &[u8]) -> String {
    let mut blob = wasm_module_js(adtech_wasm);
    blob.push_str(BUYER_ENTRY_FUNCTION);
    blob.push_str(adtech_js);
    blob
}

const SELLER_ENTRY_FUNCTION: &str = r#"
    const forDebuggingOnly = {}
    forDebuggingOnly.auction_win_url = undefined;
    forDebuggingOnly.auction_loss_url = undefined;

    forDebuggingOnly.reportAdAuctionLoss = (url) => {
      forDebuggingOnly.auction_loss_url = url;
    }

    forDebuggingOnly.reportAdAuctionWin = (url) => {
      forDebuggingOnly.auction_win_url = url;
    }

    function scoreAdEntryFunction(adMetadata, bid, auctionConfig, trustedScoringSignals,
                                browserSignals, directFromSellerSignals, featureFlags){
      var ps_logs = [];
      var ps_errors = [];
      var ps_warns = [];
      if(featureFlags.enable_logging){
        console.log = function(...args) {
          ps_logs.push(JSON.stringify(args))
        }
        console.error = function(...args) {
          ps_errors.push(JSON.stringify(args))
        }
        console.warn = function(...args) {
          ps_warns.push(JSON.stringify(args))
        }
      }

      var scoreAdResponse = {};
      try {
        scoreAdResponse = scoreAd(adMetadata, bid, auctionConfig,
              trustedScoringSignals, browserSignals, directFromSellerSignals);
      } catch({error, message}) {
          console.error("[Error: " + error + "; Message: " + message + "]");
      } finally {
        if( featureFlags.enable_debug_url_generation &&
              (forDebuggingOnly.auction_win_url
                  || forDebuggingOnly.auction_loss_url)) {
          scoreAdResponse.debugReportUrls = {
            auctionDebugLossUrl: forDebuggingOnly.auction_loss_url,
            auctionDebugWinUrl: forDebuggingOnly.auction_win_url
          }
        }
      }
      return {
        response: scoreAdResponse,
        logs: ps_logs,
        errors: ps_errors,
        warnings: ps_warns
      }
    }
"#;

const REPORTING_ENTRY_FUNCTION_CODE: &str = r#"
    //Handler method to call adTech provided reportResult method and wrap the
    // response with reportResult url and interaction reporting urls.
    function reportingEntryFunction(auctionConfig, sellerReportingSignals, directFromSellerSignals, enable_logging, buyerReportingMetadata) {
      var ps_report_result_response = {
        reportResultUrl : "",
        signalsForWinner : "",
        interactionReportingUrls : "",
        sendReportToInvoked : false,
        registerAdBeaconInvoked : false,
      }
      var ps_logs = [];
      var ps_errors = [];
      var ps_warns = [];
      if(enable_logging){
        console.log = function(...args) {
          ps_logs.push(JSON.stringify(args))
        }
        console.error = function(...args) {
          ps_errors.push(JSON.stringify(args))
        }
        console.warn = function(...args) {
          ps_warns.push(JSON.stringify(args))
        }
      }
      globalThis.sendReportTo = function sendReportTo(url){
        if(ps_report_result_response.sendReportToInvoked) {
          throw new Error("sendReportTo function invoked more than once");
        }
        ps_report_result_response.reportResultUrl = url;
        ps_report_result_response.sendReportToInvoked = true;
      }
      globalThis.registerAdBeacon = function registerAdBeacon(eventUrlMap){
        if(ps_report_result_response.registerAdBeaconInvoked) {
          throw new Error("registerAdBeacon function invoked more than once");
        }
        ps_report_result_response.interactionReportingUrls=eventUrlMap;
        ps_report_result_response.registerAdBeaconInvoked = true;
      }
      ps_report_result_response.signalsForWinner = reportResult(auctionConfig, sellerReportingSignals, directFromSellerSignals);
      try{
      if(buyerReportingMetadata.enableReportWinUrlGeneration){
        var buyerOrigin = buyerReportingMetadata.buyerOrigin
        var buyerPrefix = buyerOrigin.replace(/[^a-zA-Z0-9 ]/g, "")
        var auctionSignals = auctionConfig.auctionSignals
        var buyerReportingSignals = sellerReportingSignals
        buyerReportingSignals.interestGroupName = buyerReportingMetadata.interestGroupName
        buyerReportingSignals.madeHighestScoringOtherBid = buyerReportingMetadata.madeHighestScoringOtherBid
        buyerReportingSignals.joinCount = buyerReportingMetadata.joinCount
        buyerReportingSignals.recency = buyerReportingMetadata.recency
        buyerReportingSignals.modelingSignals = buyerReportingMetadata.modelingSignals
        perBuyerSignals = buyerReportingMetadata.perBuyerSignals
        signalsForWinner = ps_report_result_response.signalsForWinner
        var reportWinFunction = "reportWinWrapper"+buyerPrefix+"(auctionSignals, perBuyerSignals, signalsForWinner, buyerReportingSignals,"+
                              "directFromSellerSignals, enable_logging)"
        var reportWinResponse = eval(reportWinFunction)
        return {
          reportResultResponse: ps_report_result_response,
          sellerLogs: ps_logs,
          sellerErrors: ps_errors,
          sellerWarnings: ps_warns,
          reportWinResponse: reportWinResponse.response,
          buyerLogs: reportWinResponse.logs
      }
      }
      } catch(ex){
        console.error(ex.message)
      }
      return {
        reportResultResponse: ps_report_result_response,
        sellerLogs: ps_logs,
        sellerErrors: ps_errors,
        sellerWarnings: ps_warns,
      }
    }
"#;

const REPORT_WIN_WRAPPER_TEMPLATE: &str = r#"
    // Handler method to call adTech provided reportWin method and wrap the
    // response with reportWin url and interaction reporting urls.
    function $reportWinWrapperName(auctionSignals, perBuyerSignals, signalsForWinner, buyerReportingSignals,
                              directFromSellerSignals, enable_logging) {
      var ps_report_win_response = {
        reportWinUrl : "",
        interactionReportingUrls : "",
        sendReportToInvoked : false,
        registerAdBeaconInvoked : false,
      }
      var ps_logs = [];
      if(enable_logging){
        console.log = function(...args) {
          ps_logs.push(JSON.stringify(args))
        }
      }
      globalThis.sendReportTo = function sendReportTo(url){
        if(ps_report_win_response.sendReportToInvoked) {
          throw new Error("sendReportTo function invoked more than once");
        }
        ps_report_win_response.reportWinUrl = url;
        ps_report_win_response.sendReportToInvoked = true;
      }
      globalThis.registerAdBeacon = function registerAdBeacon(eventUrlMap){
        if(ps_report_win_response.registerAdBeaconInvoked) {
          throw new Error("registerAdBeacon function invoked more than once");
        }
        ps_report_win_response.interactionReportingUrls = eventUrlMap;
        ps_report_win_response.registerAdBeaconInvoked = true;
      }
ps_report_win_code = $reportWinCode
      try{
      reportWin(auctionSignals, perBuyerSignals, signalsForWinner, buyerReportingSignals,
                              directFromSellerSignals)
      } catch(ex){
        console.error(ex.message)
      }
      return {
        response: ps_report_win_response,
        logs: ps_logs,
      }
    }
"#;

const REPORT_WIN_WRAPPER_NAME_PLACEHOLDER: &str = "$reportWinWrapperName";
const REPORT_WIN_CODE_PLACEHOLDER: &str = "$reportWinCode";

/// Wraps seller `scoreAd` code; when reporting is enabled the blob also
/// carries the reporting entry function and one `reportWin` wrapper per
/// buyer so a single compiled snapshot serves every buyer.
pub fn get_seller_wrapped_code(
    seller_js: &str,
    enable_report_result_url_generation: bool,
    enable_report_win_url_generation: bool,
    buyer_origin_code_map: &HashMap<String, String>,
) -> String {
    let mut blob = String::from(SELLER_ENTRY_FUNCTION);
    if enable_report_result_url_generation {
        blob.push_str(REPORTING_ENTRY_FUNCTION_CODE);
        if enable_report_win_url_generation {
            for (buyer_origin, report_win_code) in buyer_origin_code_map {
                blob.push_str(
                    &REPORT_WIN_WRAPPER_TEMPLATE
                        .replace(
                            REPORT_WIN_WRAPPER_NAME_PLACEHOLDER,
                            &report_win_wrapper_name(buyer_origin),
                        )
                        .replace(REPORT_WIN_CODE_PLACEHOLDER, report_win_code),
                );
            }
        }
    }
    blob.push_str(seller_js);
    blob
}
