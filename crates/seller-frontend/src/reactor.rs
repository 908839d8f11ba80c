//! The SelectAd orchestrator.
//!
//! One task owns the whole request: decrypt and decode the protected input,
//! validate, fan out GetBids to every buyer, collate, fetch scoring
//! signals, run the auction, fire debug reports, and seal the padded
//! result. Dropping the task (client disconnect) aborts the outstanding
//! fan-out through the `JoinSet`.

use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use ba_api::{
    auction_result, AdScore, AdWithBidMetadata, AuctionConfig, AuctionResult, ClientType,
    GetBidsRawRequest, GetBidsRawResponse, LogContext, ProtectedAuctionInput, ScoreAdsRawRequest,
    SelectAdRequest, SelectAdResponse,
};
use ba_common::error::{
    ErrorAccumulator, ErrorCode, ErrorVisibility, EMPTY_AUCTION_SIGNALS,
    EMPTY_BUYER_IN_PER_BUYER_CONFIG, EMPTY_BUYER_LIST, EMPTY_INTEREST_GROUP_OWNER, EMPTY_SELLER,
    EMPTY_SELLER_SIGNALS, INTERNAL_SERVER_ERROR, MISSING_BUYER_INPUTS, MISSING_GENERATION_ID,
    MISSING_PUBLISHER_NAME, UNKNOWN_CLIENT_TYPE, WRONG_SELLER_DOMAIN,
};
use ba_common::kv::{RequestMetadata, SellerKvInput};
use ba_common::metrics::{InitiatedRequest, CALLEE_AUCTION, CALLEE_BFE, CALLEE_KV};
use ba_common::reporting::{
    generate_post_auction_signals, placeholder_data_for_interest_group, substitute_placeholders,
};
use ba_common::RequestContext;
use flate2::read::GzDecoder;
use prost::Message;
use tokio::task::JoinSet;
use tonic::Status;
use tracing::{debug, warn, Instrument};

use crate::bid_stats::{BidStats, CompletedBidState};
use crate::clients::ClientRegistry;

pub const EMPTY_PROTECTED_AUCTION_CIPHERTEXT_ERROR: &str =
    "protected_auction_ciphertext must be non-null.";
pub const INVALID_OHTTP_KEY_ID_ERROR: &str =
    "Invalid key ID provided in OHTTP encapsulated request for protected_audience_ciphertext.";
pub const MISSING_PRIVATE_KEY_ERROR: &str =
    "Unable to get private key for the key ID in OHTTP encapsulated request.";
pub const BAD_PROTECTED_AUCTION_BINARY_PROTO: &str =
    "Unable to decode ProtectedAuctionInput binary proto";

fn malformed_encapsulated_request(reason: &str) -> String {
    format!(
        "Malformed OHTTP encapsulated request provided for protected_audience_ciphertext: {reason}"
    )
}

fn missing_interest_groups(buyer: &str) -> String {
    format!("Request is missing interest groups for buyer: {buyer}")
}

fn non_empty_buyer_input_malformed(errors: &str) -> String {
    format!("BuyerInput map is present but malformed: {errors}")
}

fn bad_compressed_buyer_input(buyer: &str) -> String {
    format!("Unable to decompress buyer input for buyer: {buyer}")
}

fn bad_buyer_input_proto(buyer: &str) -> String {
    format!("Unable to decode BuyerInput binary proto for buyer: {buyer}")
}

fn empty_buyer_signals(buyer: &str) -> String {
    format!("Buyer signals missing in auction config for buyer: {buyer}")
}

/// Per-process settings of the SelectAd orchestrator.
#[derive(Debug, Clone)]
pub struct SfeRuntimeConfig {
    /// Origin this SFE serves; a mismatching `auction_config.seller` is an
    /// ad-server error.
    pub seller_origin_domain: String,
    pub get_bid_timeout: Duration,
    pub score_ads_timeout: Duration,
    pub scoring_signals_fetch_timeout: Duration,
    pub consented_debug_token: String,
    /// Stop decoding at the first client-visible defect instead of
    /// accumulating all of them.
    pub fail_fast: bool,
}

pub struct SelectAdReactor {
    registry: Arc<ClientRegistry>,
    config: SfeRuntimeConfig,
}

impl SelectAdReactor {
    pub fn new(registry: Arc<ClientRegistry>, config: SfeRuntimeConfig) -> Self {
        Self { registry, config }
    }

    pub async fn execute(
        &self,
        metadata: RequestMetadata,
        request: SelectAdRequest,
    ) -> Result<SelectAdResponse, Status> {
        let auction_config = request.auction_config.clone().unwrap_or_default();
        let client_type = ClientType::try_from(request.client_type).unwrap_or(ClientType::Unknown);

        // Decrypt.
        let encapsulated = if !request.protected_auction_ciphertext.is_empty() {
            request.protected_auction_ciphertext.as_slice()
        } else if !request.protected_audience_ciphertext.is_empty() {
            request.protected_audience_ciphertext.as_slice()
        } else {
            return Err(Status::invalid_argument(EMPTY_PROTECTED_AUCTION_CIPHERTEXT_ERROR));
        };
        let key_id = ba_envelope::parse_key_id(encapsulated)
            .map_err(|_| Status::invalid_argument(INVALID_OHTTP_KEY_ID_ERROR))?;
        let private_key = self
            .registry
            .key_fetcher
            .private_key(key_id)
            .ok_or_else(|| Status::invalid_argument(MISSING_PRIVATE_KEY_ERROR))?;
        let (payload, response_context) =
            ba_envelope::unpackage_request(&private_key, encapsulated).map_err(|e| {
                Status::invalid_argument(malformed_encapsulated_request(&e.to_string()))
            })?;

        // Decode.
        let accumulator = ErrorAccumulator::new();
        let (protected_input, buyer_inputs) =
            self.decode_protected_input(client_type, &payload, &accumulator);

        let context = RequestContext::new(
            protected_input.generation_id.clone(),
            auction_config.seller_debug_id.clone(),
        )
        .with_consent(
            protected_input.consented_debug_config.as_ref(),
            &self.config.consented_debug_token,
        );
        let span = context.span("seller_frontend");
        span.in_scope(|| context.debug_log(format!("ProtectedAuctionInput: {protected_input:?}")));

        // Bad ad-server input fails in plaintext; the client envelope is
        // only used for client-visible defects.
        self.validate_auction_config(&auction_config, client_type, &accumulator);
        if accumulator.has_errors_for(ErrorVisibility::AdServerVisible) {
            return Err(Status::invalid_argument(
                accumulator.joined_message(ErrorVisibility::AdServerVisible),
            ));
        }

        if !accumulator.has_errors_for(ErrorVisibility::ClientVisible) {
            validate_protected_input(&protected_input, &buyer_inputs, &accumulator);
        }
        if accumulator.has_errors_for(ErrorVisibility::ClientVisible) {
            let error = auction_result::Error {
                code: ErrorCode::ClientSide as i32,
                message: accumulator.joined_message(ErrorVisibility::ClientVisible),
            };
            return self.encode_and_seal(
                client_type,
                None,
                &HashMap::new(),
                Some(&error),
                &response_context,
            );
        }

        self.run_auction(
            metadata,
            client_type,
            auction_config,
            protected_input,
            buyer_inputs,
            response_context,
        )
        .instrument(span)
        .await
    }

    /// Fan-out, collation, scoring and response sealing; everything after
    /// the request was decoded and validated.
    async fn run_auction(
        &self,
        metadata: RequestMetadata,
        client_type: ClientType,
        auction_config: AuctionConfig,
        protected_input: ProtectedAuctionInput,
        buyer_inputs: HashMap<String, ba_api::BuyerInput>,
        response_context: ba_envelope::ResponseContext,
    ) -> Result<SelectAdResponse, Status> {
        // Fan out to every buyer with a usable input and a stub.
        let buyer_timeout = if auction_config.buyer_timeout_ms > 0 {
            Duration::from_millis(auction_config.buyer_timeout_ms as u64)
        } else {
            self.config.get_bid_timeout
        };
        let mut stats = BidStats::default();
        let mut fan_out: JoinSet<(String, Result<GetBidsRawResponse, Status>)> = JoinSet::new();
        for buyer in &auction_config.buyer_list {
            let Some(buyer_input) = buyer_inputs.get(buyer) else {
                debug!(message = "no buyer input found for buyer", buyer = %buyer);
                stats.record(CompletedBidState::Skipped);
                continue;
            };
            let Some(client) = self.registry.buyer_client(buyer) else {
                debug!(message = "no buyer client found for buyer", buyer = %buyer);
                stats.record(CompletedBidState::Skipped);
                continue;
            };
            let raw_request = create_get_bids_request(
                &protected_input,
                &auction_config,
                buyer,
                buyer_input.clone(),
            );
            let metadata = metadata.clone();
            let buyer = buyer.clone();
            fan_out.spawn(async move {
                let timer = InitiatedRequest::start(CALLEE_BFE, 0);
                let result = client.get_bids(raw_request, &metadata, buyer_timeout).await;
                timer.finish(result.is_ok());
                (buyer, result)
            });
        }

        // Collation: completions race; the map is only read after the last
        // buyer reported.
        let mut buyer_bids: HashMap<String, GetBidsRawResponse> = HashMap::new();
        while let Some(joined) = fan_out.join_next().await {
            match joined {
                Ok((buyer, Ok(response))) => {
                    if response.bids.is_empty() {
                        debug!(message = "buyer returned no bids", buyer = %buyer);
                        stats.record(CompletedBidState::EmptyResponse);
                    } else {
                        stats.record(CompletedBidState::Success);
                        buyer_bids.insert(buyer, response);
                    }
                }
                Ok((buyer, Err(status))) => {
                    warn!(message = "GetBids failed", buyer = %buyer, status = %status);
                    stats.record(CompletedBidState::Error);
                }
                Err(e) => {
                    warn!(message = "GetBids task failed", error = %e);
                    stats.record(CompletedBidState::Error);
                }
            }
        }
        debug!(message = "all bids done", %stats);

        if buyer_bids.is_empty() {
            if !stats.allows_chaff() {
                // Every attempted buyer errored: a true fan-out failure.
                return Err(Status::internal(INTERNAL_SERVER_ERROR));
            }
            return self.encode_and_seal(
                client_type,
                None,
                &HashMap::new(),
                None,
                &response_context,
            );
        }

        // Scoring signals; failures degrade to empty signals so the client
        // still gets a determinate answer.
        let kv_input = scoring_signals_input(&buyer_bids);
        let kv_timer = InitiatedRequest::start(CALLEE_KV, kv_input.render_urls.len());
        let scoring_signals = match self
            .registry
            .scoring_signals_fetcher
            .fetch_scoring_signals(&kv_input, self.config.scoring_signals_fetch_timeout)
            .await
        {
            Ok(signals) => {
                kv_timer.finish(true);
                signals
            }
            Err(e) => {
                kv_timer.finish(false);
                warn!(message = "scoring signals fetch failed", error = %e);
                String::new()
            }
        };

        let score_ads_request = create_score_ads_request(
            &protected_input,
            &auction_config,
            &buyer_inputs,
            &buyer_bids,
            scoring_signals,
            client_type,
        );
        let auction_timer = InitiatedRequest::start(CALLEE_AUCTION, score_ads_request.ad_bids.len());
        let score_ads_response = match self
            .registry
            .auction_client
            .score_ads(score_ads_request, self.config.score_ads_timeout)
            .await
        {
            Ok(response) => {
                auction_timer.finish(true);
                response
            }
            Err(status) => {
                auction_timer.finish(false);
                warn!(message = "ScoreAds failed", status = %status);
                return Err(Status::internal(INTERNAL_SERVER_ERROR));
            }
        };

        let high_score = score_ads_response
            .ad_score
            .filter(|score| score.buyer_bid > 0.0);
        let bidding_groups = bidding_groups(&buyer_bids, &buyer_inputs);
        self.perform_debug_reporting(high_score.as_ref(), &buyer_bids);

        self.encode_and_seal(
            client_type,
            high_score.as_ref(),
            &bidding_groups,
            None,
            &response_context,
        )
    }

    fn decode_protected_input(
        &self,
        client_type: ClientType,
        payload: &[u8],
        accumulator: &ErrorAccumulator,
    ) -> (ProtectedAuctionInput, HashMap<String, ba_api::BuyerInput>) {
        match client_type {
            ClientType::Browser => {
                let input = ba_codec::decode_protected_auction_input(
                    payload,
                    accumulator,
                    self.config.fail_fast,
                );
                let buyer_inputs = ba_codec::decode_buyer_inputs(
                    &input.buyer_input,
                    accumulator,
                    self.config.fail_fast,
                );
                (input, buyer_inputs)
            }
            ClientType::Android => match ProtectedAuctionInput::decode(payload) {
                Ok(input) => {
                    let buyer_inputs = decode_proto_buyer_inputs(&input, accumulator);
                    (input, buyer_inputs)
                }
                Err(_) => {
                    accumulator.report_error(
                        ErrorVisibility::ClientVisible,
                        BAD_PROTECTED_AUCTION_BINARY_PROTO,
                        ErrorCode::ClientSide,
                    );
                    (ProtectedAuctionInput::default(), HashMap::new())
                }
            },
            // The unknown client type is already an ad-server error.
            ClientType::Unknown => (ProtectedAuctionInput::default(), HashMap::new()),
        }
    }

    fn validate_auction_config(
        &self,
        auction_config: &AuctionConfig,
        client_type: ClientType,
        accumulator: &ErrorAccumulator,
    ) {
        let report = |message: String| {
            accumulator.report_error(
                ErrorVisibility::AdServerVisible,
                message,
                ErrorCode::ClientSide,
            );
        };
        if auction_config.seller_signals.is_empty() {
            report(EMPTY_SELLER_SIGNALS.into());
        }
        if auction_config.auction_signals.is_empty() {
            report(EMPTY_AUCTION_SIGNALS.into());
        }
        if auction_config.buyer_list.is_empty() {
            report(EMPTY_BUYER_LIST.into());
        }
        if auction_config.seller.is_empty() {
            report(EMPTY_SELLER.into());
        } else if auction_config.seller != self.config.seller_origin_domain {
            report(WRONG_SELLER_DOMAIN.into());
        }
        for (buyer, per_buyer_config) in &auction_config.per_buyer_config {
            if buyer.is_empty() {
                report(EMPTY_BUYER_IN_PER_BUYER_CONFIG.into());
            }
            if per_buyer_config.buyer_signals.is_empty() {
                report(empty_buyer_signals(buyer));
            }
        }
        if client_type == ClientType::Unknown {
            report(UNKNOWN_CLIENT_TYPE.into());
        }
    }

    /// Substitutes post-auction signals into every buyer debug URL and fires
    /// the pings; never blocks the critical path.
    fn perform_debug_reporting(
        &self,
        high_score: Option<&AdScore>,
        buyer_bids: &HashMap<String, GetBidsRawResponse>,
    ) {
        let signals = generate_post_auction_signals(high_score);
        for (buyer, response) in buyer_bids {
            for bid in &response.bids {
                let Some(debug_urls) = &bid.debug_report_urls else {
                    continue;
                };
                let won = signals.winning_ig_owner == *buyer
                    && signals.winning_ig_name == bid.interest_group_name;
                let url = if won {
                    &debug_urls.auction_debug_win_url
                } else {
                    &debug_urls.auction_debug_loss_url
                };
                if url.is_empty() {
                    continue;
                }
                let placeholder =
                    placeholder_data_for_interest_group(buyer, &bid.interest_group_name, &signals);
                self.registry
                    .reporter
                    .report(substitute_placeholders(url, &placeholder));
            }
        }
    }

    /// Encodes the auction result for the client type, then frames, pads and
    /// seals it with the saved request context.
    fn encode_and_seal(
        &self,
        client_type: ClientType,
        high_score: Option<&AdScore>,
        bidding_groups: &HashMap<String, auction_result::InterestGroupIndex>,
        error: Option<&auction_result::Error>,
        response_context: &ba_envelope::ResponseContext,
    ) -> Result<SelectAdResponse, Status> {
        let payload = match client_type {
            ClientType::Android => {
                build_auction_result(high_score, bidding_groups, error).encode_to_vec()
            }
            // Browser clients and the unknown fallback get CBOR.
            _ => ba_codec::encode_auction_result(high_score, bidding_groups, error)
                .map_err(|_| Status::internal(INTERNAL_SERVER_ERROR))?,
        };

        let ciphertext =
            ba_envelope::package_response(response_context, &payload, &mut rand::thread_rng())
                .map_err(|_| Status::internal(INTERNAL_SERVER_ERROR))?;
        Ok(SelectAdResponse { auction_result_ciphertext: ciphertext })
    }
}

/// Decodes the gzip-compressed binary-proto buyer inputs of the app path.
fn decode_proto_buyer_inputs(
    input: &ProtectedAuctionInput,
    accumulator: &ErrorAccumulator,
) -> HashMap<String, ba_api::BuyerInput> {
    let mut out = HashMap::new();
    for (buyer, compressed) in &input.buyer_input {
        let mut decoder = GzDecoder::new(compressed.as_slice());
        let mut decompressed = Vec::new();
        if decoder.read_to_end(&mut decompressed).is_err() {
            accumulator.report_error(
                ErrorVisibility::ClientVisible,
                bad_compressed_buyer_input(buyer),
                ErrorCode::ClientSide,
            );
            continue;
        }
        match ba_api::BuyerInput::decode(decompressed.as_slice()) {
            Ok(buyer_input) => {
                out.insert(buyer.clone(), buyer_input);
            }
            Err(_) => {
                accumulator.report_error(
                    ErrorVisibility::ClientVisible,
                    bad_buyer_input_proto(buyer),
                    ErrorCode::ClientSide,
                );
            }
        }
    }
    out
}

/// Mandatory-field validation of the decoded protected input.
fn validate_protected_input(
    input: &ProtectedAuctionInput,
    buyer_inputs: &HashMap<String, ba_api::BuyerInput>,
    accumulator: &ErrorAccumulator,
) {
    let report = |message: String| {
        accumulator.report_error(ErrorVisibility::ClientVisible, message, ErrorCode::ClientSide);
    };
    if input.generation_id.is_empty() {
        report(MISSING_GENERATION_ID.into());
    }
    if input.publisher_name.is_empty() {
        report(MISSING_PUBLISHER_NAME.into());
    }

    if buyer_inputs.is_empty() {
        report(MISSING_BUYER_INPUTS.into());
        return;
    }
    let mut observed_errors = BTreeSet::new();
    let mut any_valid = false;
    for (buyer, buyer_input) in buyer_inputs {
        let mut any_error = false;
        if buyer.is_empty() {
            observed_errors.insert(EMPTY_INTEREST_GROUP_OWNER.to_string());
            any_error = true;
        }
        if buyer_input.interest_groups.is_empty() {
            observed_errors.insert(missing_interest_groups(buyer));
            any_error = true;
        }
        if !any_error {
            any_valid = true;
        }
    }
    if !any_valid {
        let joined = observed_errors.into_iter().collect::<Vec<_>>().join("; ");
        report(non_empty_buyer_input_malformed(&joined));
    } else {
        // At least one buyer input is usable; the rest are only logged.
        for error in observed_errors {
            debug!(message = "ignoring malformed buyer input", error = %error);
        }
    }
}

fn create_get_bids_request(
    protected_input: &ProtectedAuctionInput,
    auction_config: &AuctionConfig,
    buyer: &str,
    buyer_input: ba_api::BuyerInput,
) -> GetBidsRawRequest {
    let per_buyer_config = auction_config.per_buyer_config.get(buyer);
    GetBidsRawRequest {
        is_chaff: false,
        buyer_input: Some(buyer_input),
        auction_signals: auction_config.auction_signals.clone(),
        buyer_signals: per_buyer_config
            .map(|config| config.buyer_signals.clone())
            .unwrap_or_default(),
        seller: auction_config.seller.clone(),
        publisher_name: protected_input.publisher_name.clone(),
        enable_debug_reporting: protected_input.enable_debug_reporting,
        log_context: Some(LogContext {
            generation_id: protected_input.generation_id.clone(),
            adtech_debug_id: per_buyer_config
                .map(|config| config.buyer_debug_id.clone())
                .unwrap_or_default(),
        }),
        consented_debug_config: protected_input.consented_debug_config.clone(),
    }
}

/// Union of all surviving bids' render URLs and component URLs, in stable
/// order.
fn scoring_signals_input(buyer_bids: &HashMap<String, GetBidsRawResponse>) -> SellerKvInput {
    let mut render_urls = BTreeSet::new();
    let mut component_urls = BTreeSet::new();
    for response in buyer_bids.values() {
        for bid in &response.bids {
            render_urls.insert(bid.render.clone());
            component_urls.extend(bid.ad_components.iter().cloned());
        }
    }
    SellerKvInput {
        render_urls: render_urls.into_iter().collect(),
        ad_component_render_urls: component_urls.into_iter().collect(),
    }
}

fn create_score_ads_request(
    protected_input: &ProtectedAuctionInput,
    auction_config: &AuctionConfig,
    buyer_inputs: &HashMap<String, ba_api::BuyerInput>,
    buyer_bids: &HashMap<String, GetBidsRawResponse>,
    scoring_signals: String,
    client_type: ClientType,
) -> ScoreAdsRawRequest {
    let mut ad_bids = Vec::new();
    for (buyer, response) in buyer_bids {
        for bid in &response.bids {
            ad_bids.push(build_ad_with_bid_metadata(
                bid,
                buyer,
                buyer_inputs.get(buyer),
                client_type,
            ));
        }
    }

    ScoreAdsRawRequest {
        ad_bids,
        seller_signals: auction_config.seller_signals.clone(),
        auction_signals: auction_config.auction_signals.clone(),
        scoring_signals,
        publisher_hostname: protected_input.publisher_name.clone(),
        enable_debug_reporting: protected_input.enable_debug_reporting,
        log_context: Some(LogContext {
            generation_id: protected_input.generation_id.clone(),
            adtech_debug_id: auction_config.seller_debug_id.clone(),
        }),
        per_buyer_signals: auction_config
            .per_buyer_config
            .iter()
            .map(|(buyer, config)| (buyer.clone(), config.buyer_signals.clone()))
            .collect(),
        consented_debug_config: protected_input.consented_debug_config.clone(),
    }
}

/// Annotates one buyer bid with its owner. The owner comes from the BFE the
/// bid arrived from, never from client data.
fn build_ad_with_bid_metadata(
    bid: &ba_api::AdWithBid,
    interest_group_owner: &str,
    buyer_input: Option<&ba_api::BuyerInput>,
    client_type: ClientType,
) -> AdWithBidMetadata {
    let mut metadata = AdWithBidMetadata {
        ad: bid.ad.clone(),
        bid: bid.bid,
        render: bid.render.clone(),
        ad_components: bid.ad_components.clone(),
        allow_component_auction: bid.allow_component_auction,
        interest_group_name: bid.interest_group_name.clone(),
        interest_group_owner: interest_group_owner.to_string(),
        ad_cost: bid.ad_cost,
        modeling_signals: bid.modeling_signals,
        bid_currency: bid.bid_currency.clone(),
        ..Default::default()
    };
    if client_type == ClientType::Browser {
        let browser_signals = buyer_input.and_then(|input| {
            input
                .interest_groups
                .iter()
                .find(|ig| ig.name == bid.interest_group_name)
                .and_then(|ig| ig.browser_signals.as_ref())
        });
        if let Some(signals) = browser_signals {
            metadata.join_count = signals.join_count;
            metadata.recency = signals.recency;
        }
    }
    metadata
}

/// For every buyer, the indices (in the client's original interest group
/// order) of groups that produced a strictly positive bid.
fn bidding_groups(
    buyer_bids: &HashMap<String, GetBidsRawResponse>,
    buyer_inputs: &HashMap<String, ba_api::BuyerInput>,
) -> HashMap<String, auction_result::InterestGroupIndex> {
    let mut groups = HashMap::new();
    for (buyer, response) in buyer_bids {
        let bidding_names: BTreeSet<&str> = response
            .bids
            .iter()
            .filter(|bid| bid.bid > 0.0)
            .map(|bid| bid.interest_group_name.as_str())
            .collect();
        let Some(buyer_input) = buyer_inputs.get(buyer) else {
            continue;
        };
        let indices: Vec<i32> = buyer_input
            .interest_groups
            .iter()
            .enumerate()
            .filter(|(_, ig)| bidding_names.contains(ig.name.as_str()))
            .map(|(index, _)| index as i32)
            .collect();
        groups.insert(
            buyer.clone(),
            auction_result::InterestGroupIndex { index: indices },
        );
    }
    groups
}

/// Protobuf auction result for the app path; mirrors the CBOR shape.
fn build_auction_result(
    high_score: Option<&AdScore>,
    bidding_groups: &HashMap<String, auction_result::InterestGroupIndex>,
    error: Option<&auction_result::Error>,
) -> AuctionResult {
    if let Some(error) = error {
        return AuctionResult { error: Some(error.clone()), ..Default::default() };
    }
    match high_score {
        Some(score) => AuctionResult {
            ad_render_url: score.render.clone(),
            ad_component_render_urls: score.component_renders.clone(),
            interest_group_name: score.interest_group_name.clone(),
            interest_group_owner: score.interest_group_owner.clone(),
            score: score.desirability,
            bid: score.buyer_bid,
            is_chaff: false,
            win_reporting_urls: score.win_reporting_urls.clone(),
            bidding_groups: bidding_groups.clone(),
            error: None,
        },
        None => AuctionResult { is_chaff: true, ..Default::default() },
    }
}
