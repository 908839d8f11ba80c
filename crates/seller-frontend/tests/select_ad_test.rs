//! End-to-end orchestrator tests with scripted downstream clients.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ba_api::{
    auction_result, AdScore, AdWithBid, AuctionConfig, BrowserSignals, BuyerInput, ClientType,
    GetBidsRawRequest, GetBidsRawResponse, InterestGroup, ProtectedAuctionInput,
    ScoreAdsRawRequest, ScoreAdsRawResponse, SelectAdRequest,
};
use ba_common::keys::PrivateKeyCache;
use ba_common::kv::{KvError, RequestMetadata, SellerKvInput};
use ba_common::reporting::Reporter;
use ba_seller_frontend::clients::{AuctionClient, BuyerFrontEndClient, ClientRegistry};
use ba_seller_frontend::reactor::{SelectAdReactor, SfeRuntimeConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tonic::Status;

const SELLER: &str = "https://seller.example.com";
const BUYER_A: &str = "https://buyer-a.example.com";
const BUYER_B: &str = "https://buyer-b.example.com";

struct ScriptedBfe {
    result: Result<GetBidsRawResponse, tonic::Code>,
    seen_request: Mutex<Option<GetBidsRawRequest>>,
}

impl ScriptedBfe {
    fn bids(bids: Vec<AdWithBid>) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(GetBidsRawResponse { bids }),
            seen_request: Mutex::new(None),
        })
    }

    fn failing(code: tonic::Code) -> Arc<Self> {
        Arc::new(Self { result: Err(code), seen_request: Mutex::new(None) })
    }
}

#[async_trait]
impl BuyerFrontEndClient for ScriptedBfe {
    async fn get_bids(
        &self,
        raw_request: GetBidsRawRequest,
        _metadata: &RequestMetadata,
        _timeout: Duration,
    ) -> Result<GetBidsRawResponse, Status> {
        *self.seen_request.lock().unwrap() = Some(raw_request);
        match &self.result {
            Ok(response) => Ok(response.clone()),
            Err(code) => Err(Status::new(*code, "scripted failure")),
        }
    }
}

/// Auction stub: the highest bid wins with a fixed desirability of 2.0.
struct HighestBidWins {
    seen_request: Mutex<Option<ScoreAdsRawRequest>>,
}

impl HighestBidWins {
    fn new() -> Arc<Self> {
        Arc::new(Self { seen_request: Mutex::new(None) })
    }
}

#[async_trait]
impl AuctionClient for HighestBidWins {
    async fn score_ads(
        &self,
        raw_request: ScoreAdsRawRequest,
        _timeout: Duration,
    ) -> Result<ScoreAdsRawResponse, Status> {
        let winner = raw_request
            .ad_bids
            .iter()
            .filter(|ad| ad.bid > 0.0)
            .max_by(|a, b| a.bid.partial_cmp(&b.bid).unwrap());
        let ad_score = winner.map(|ad| AdScore {
            desirability: 2.0,
            render: ad.render.clone(),
            interest_group_name: ad.interest_group_name.clone(),
            interest_group_owner: ad.interest_group_owner.clone(),
            buyer_bid: ad.bid,
            ..Default::default()
        });
        *self.seen_request.lock().unwrap() = Some(raw_request);
        Ok(ScoreAdsRawResponse { ad_score })
    }
}

struct StaticKv(Option<String>);

#[async_trait]
impl ba_common::kv::ScoringSignalsFetcher for StaticKv {
    async fn fetch_scoring_signals(
        &self,
        _input: &SellerKvInput,
        _timeout: Duration,
    ) -> Result<String, KvError> {
        self.0.clone().ok_or(KvError::Timeout)
    }
}

#[derive(Default)]
struct CapturingReporter {
    urls: Mutex<Vec<String>>,
}

impl Reporter for CapturingReporter {
    fn report(&self, url: String) {
        self.urls.lock().unwrap().push(url);
    }
}

struct Harness {
    reactor: SelectAdReactor,
    public_key: ba_envelope::PublicKey,
    rng: StdRng,
}

fn harness(
    buyers: Vec<(&str, Arc<dyn BuyerFrontEndClient>)>,
    auction: Arc<dyn AuctionClient>,
    scoring_signals: Option<&str>,
    reporter: Arc<dyn Reporter>,
) -> Harness {
    let mut rng = StdRng::seed_from_u64(77);
    let (sk, pk) = ba_envelope::generate_key_pair(1, &mut rng);

    let registry = Arc::new(ClientRegistry {
        buyer_clients: buyers
            .into_iter()
            .map(|(origin, client)| (origin.to_string(), client))
            .collect(),
        auction_client: auction,
        scoring_signals_fetcher: Arc::new(StaticKv(scoring_signals.map(str::to_string))),
        key_fetcher: Arc::new(PrivateKeyCache::with_static_keys([sk])),
        reporter,
    });
    let config = SfeRuntimeConfig {
        seller_origin_domain: SELLER.to_string(),
        get_bid_timeout: Duration::from_millis(100),
        score_ads_timeout: Duration::from_millis(100),
        scoring_signals_fetch_timeout: Duration::from_millis(100),
        consented_debug_token: String::new(),
        fail_fast: false,
    };
    Harness { reactor: SelectAdReactor::new(registry, config), public_key: pk, rng }
}

fn interest_groups_input(buyers: &[(&str, Vec<InterestGroup>)]) -> ProtectedAuctionInput {
    let mut input = ProtectedAuctionInput {
        generation_id: "6fa459ea-ee8a-3ca4-894e-db77e160355e".into(),
        publisher_name: "pub.example.com".into(),
        enable_debug_reporting: true,
        ..Default::default()
    };
    for (owner, groups) in buyers {
        let compressed = ba_codec::encode_and_compress_buyer_input(&BuyerInput {
            interest_groups: groups.clone(),
        })
        .unwrap();
        input.buyer_input.insert(owner.to_string(), compressed);
    }
    input
}

fn auction_config(buyers: &[&str]) -> AuctionConfig {
    AuctionConfig {
        seller_signals: "{\"s\":1}".into(),
        auction_signals: "{\"a\":1}".into(),
        buyer_list: buyers.iter().map(|b| b.to_string()).collect(),
        seller: SELLER.into(),
        ..Default::default()
    }
}

/// Packages a browser request the way a client does and returns the request
/// plus the context to open the response.
fn package_browser_request(
    harness: &mut Harness,
    input: &ProtectedAuctionInput,
    config: AuctionConfig,
) -> (SelectAdRequest, ba_envelope::RequestContext) {
    let payload = ba_codec::encode_protected_auction_input(input).unwrap();
    let (ciphertext, context) =
        ba_envelope::package_request(&harness.public_key, &payload, &mut harness.rng).unwrap();
    (
        SelectAdRequest {
            protected_auction_ciphertext: ciphertext,
            auction_config: Some(config),
            client_type: ClientType::Browser as i32,
            ..Default::default()
        },
        context,
    )
}

fn open_auction_result(
    context: &ba_envelope::RequestContext,
    ciphertext: &[u8],
) -> ba_api::AuctionResult {
    let payload = ba_envelope::unpackage_response(context, ciphertext).unwrap();
    ba_codec::decode_auction_result(&payload).unwrap()
}

fn ig(name: &str, render_ids: &[&str]) -> InterestGroup {
    InterestGroup {
        name: name.into(),
        ad_render_ids: render_ids.iter().map(|r| r.to_string()).collect(),
        bidding_signals_keys: vec![format!("{name}-key")],
        browser_signals: Some(BrowserSignals {
            join_count: 1,
            bid_count: 1,
            recency: 10,
            prev_wins: String::new(),
        }),
        ..Default::default()
    }
}

fn bid(name: &str, render: &str, amount: f32) -> AdWithBid {
    AdWithBid {
        render: render.into(),
        bid: amount,
        interest_group_name: name.into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn happy_path_one_buyer_one_interest_group() {
    let bfe = ScriptedBfe::bids(vec![bid("cars", "r1", 5.0)]);
    let auction = HighestBidWins::new();
    let mut harness = harness(
        vec![(BUYER_A, bfe.clone() as Arc<dyn BuyerFrontEndClient>)],
        auction.clone(),
        Some("{\"renderUrls\": {\"r1\": [1]}}"),
        Arc::new(CapturingReporter::default()),
    );

    let input = interest_groups_input(&[(BUYER_A, vec![ig("cars", &["r1"])])]);
    let (request, context) = package_browser_request(&mut harness, &input, auction_config(&[BUYER_A]));

    let response = harness.reactor.execute(Vec::new(), request).await.unwrap();
    let result = open_auction_result(&context, &response.auction_result_ciphertext);

    assert!(!result.is_chaff);
    assert!(result.error.is_none());
    assert_eq!(result.ad_render_url, "r1");
    assert_eq!(result.bid, 5.0);
    assert_eq!(result.score, 2.0);
    assert_eq!(result.interest_group_name, "cars");
    assert_eq!(result.interest_group_owner, BUYER_A);
    assert_eq!(result.bidding_groups[BUYER_A].index, vec![0]);

    // The buyer request carried the auction-config signals and the seller.
    let get_bids = bfe.seen_request.lock().unwrap().clone().unwrap();
    assert_eq!(get_bids.seller, SELLER);
    assert_eq!(get_bids.auction_signals, "{\"a\":1}");
    assert_eq!(get_bids.publisher_name, "pub.example.com");

    // The auction call carried the scoring signals and the owner derived
    // from the BFE, not from client data.
    let score_ads = auction.seen_request.lock().unwrap().clone().unwrap();
    assert_eq!(score_ads.scoring_signals, "{\"renderUrls\": {\"r1\": [1]}}");
    assert_eq!(score_ads.ad_bids.len(), 1);
    assert_eq!(score_ads.ad_bids[0].interest_group_owner, BUYER_A);
}

#[tokio::test]
async fn no_bids_returns_chaff() {
    let bfe = ScriptedBfe::bids(vec![]);
    let mut harness = harness(
        vec![(BUYER_A, bfe as Arc<dyn BuyerFrontEndClient>)],
        HighestBidWins::new(),
        Some("{}"),
        Arc::new(CapturingReporter::default()),
    );

    let input = interest_groups_input(&[(BUYER_A, vec![ig("cars", &["r1"])])]);
    let (request, context) = package_browser_request(&mut harness, &input, auction_config(&[BUYER_A]));

    let response = harness.reactor.execute(Vec::new(), request).await.unwrap();
    let result = open_auction_result(&context, &response.auction_result_ciphertext);

    assert!(result.is_chaff);
    assert!(result.error.is_none());
    assert!(result.bidding_groups.is_empty());
    assert!(result.ad_render_url.is_empty());
}

#[tokio::test]
async fn chaff_and_winner_responses_have_identical_size() {
    // Response size must not leak bid presence (power-of-two padding with a
    // floor).
    let winner_response = {
        let bfe = ScriptedBfe::bids(vec![bid("cars", "r1", 5.0)]);
        let mut harness = harness(
            vec![(BUYER_A, bfe as Arc<dyn BuyerFrontEndClient>)],
            HighestBidWins::new(),
            Some("{\"renderUrls\": {\"r1\": [1]}}"),
            Arc::new(CapturingReporter::default()),
        );
        let input = interest_groups_input(&[(BUYER_A, vec![ig("cars", &["r1"])])]);
        let (request, _) =
            package_browser_request(&mut harness, &input, auction_config(&[BUYER_A]));
        harness.reactor.execute(Vec::new(), request).await.unwrap()
    };
    let chaff_response = {
        let bfe = ScriptedBfe::bids(vec![]);
        let mut harness = harness(
            vec![(BUYER_A, bfe as Arc<dyn BuyerFrontEndClient>)],
            HighestBidWins::new(),
            Some("{}"),
            Arc::new(CapturingReporter::default()),
        );
        let input = interest_groups_input(&[(BUYER_A, vec![ig("cars", &["r1"])])]);
        let (request, _) =
            package_browser_request(&mut harness, &input, auction_config(&[BUYER_A]));
        harness.reactor.execute(Vec::new(), request).await.unwrap()
    };
    assert_eq!(
        winner_response.auction_result_ciphertext.len(),
        chaff_response.auction_result_ciphertext.len()
    );
}

#[tokio::test]
async fn one_buyer_times_out_the_other_wins() {
    let good_bfe = ScriptedBfe::bids(vec![bid("cars", "r1", 5.0)]);
    let bad_bfe = ScriptedBfe::failing(tonic::Code::DeadlineExceeded);
    let mut harness = harness(
        vec![
            (BUYER_A, good_bfe as Arc<dyn BuyerFrontEndClient>),
            (BUYER_B, bad_bfe as Arc<dyn BuyerFrontEndClient>),
        ],
        HighestBidWins::new(),
        Some("{\"renderUrls\": {\"r1\": [1]}}"),
        Arc::new(CapturingReporter::default()),
    );

    let input = interest_groups_input(&[
        (BUYER_A, vec![ig("cars", &["r1"])]),
        (BUYER_B, vec![ig("bikes", &["r2"])]),
    ]);
    let (request, context) =
        package_browser_request(&mut harness, &input, auction_config(&[BUYER_A, BUYER_B]));

    let response = harness.reactor.execute(Vec::new(), request).await.unwrap();
    let result = open_auction_result(&context, &response.auction_result_ciphertext);

    assert!(!result.is_chaff);
    assert_eq!(result.interest_group_owner, BUYER_A);
    assert!(result.bidding_groups.contains_key(BUYER_A));
    assert!(!result.bidding_groups.contains_key(BUYER_B));
}

#[tokio::test]
async fn all_buyers_failing_is_internal_error() {
    let mut harness = harness(
        vec![
            (BUYER_A, ScriptedBfe::failing(tonic::Code::Unavailable) as Arc<dyn BuyerFrontEndClient>),
            (BUYER_B, ScriptedBfe::failing(tonic::Code::Internal) as Arc<dyn BuyerFrontEndClient>),
        ],
        HighestBidWins::new(),
        Some("{}"),
        Arc::new(CapturingReporter::default()),
    );

    let input = interest_groups_input(&[
        (BUYER_A, vec![ig("cars", &["r1"])]),
        (BUYER_B, vec![ig("bikes", &["r2"])]),
    ]);
    let (request, _) =
        package_browser_request(&mut harness, &input, auction_config(&[BUYER_A, BUYER_B]));

    let err = harness.reactor.execute(Vec::new(), request).await.unwrap_err();
    assert_eq!(err.code(), tonic::Code::Internal);
}

#[tokio::test]
async fn malformed_cbor_fields_are_reported_together() {
    let mut harness = harness(
        vec![],
        HighestBidWins::new(),
        Some("{}"),
        Arc::new(CapturingReporter::default()),
    );

    // generationId as bytes, publisher as int.
    let root = ciborium_value_with_bad_types();
    let mut payload = Vec::new();
    ciborium::into_writer(&root, &mut payload).unwrap();
    let (ciphertext, context) =
        ba_envelope::package_request(&harness.public_key, &payload, &mut harness.rng).unwrap();
    let request = SelectAdRequest {
        protected_auction_ciphertext: ciphertext,
        auction_config: Some(auction_config(&[BUYER_A])),
        client_type: ClientType::Browser as i32,
        ..Default::default()
    };

    let response = harness.reactor.execute(Vec::new(), request).await.unwrap();
    let result = open_auction_result(&context, &response.auction_result_ciphertext);

    let error = result.error.unwrap();
    assert_eq!(error.code, 400);
    assert!(error.message.contains("generationId"), "{}", error.message);
    assert!(error.message.contains("publisher"), "{}", error.message);
    assert!(error.message.contains("; "), "{}", error.message);
}

fn ciborium_value_with_bad_types() -> ciborium::Value {
    ciborium::Value::Map(vec![
        (
            ciborium::Value::Text("generationId".into()),
            ciborium::Value::Bytes(vec![1, 2, 3]),
        ),
        (
            ciborium::Value::Text("publisher".into()),
            ciborium::Value::Integer(5.into()),
        ),
    ])
}

#[tokio::test]
async fn bad_auction_config_fails_in_plaintext() {
    let mut harness = harness(
        vec![],
        HighestBidWins::new(),
        Some("{}"),
        Arc::new(CapturingReporter::default()),
    );

    let input = interest_groups_input(&[(BUYER_A, vec![ig("cars", &["r1"])])]);
    let mut config = auction_config(&[BUYER_A]);
    config.auction_signals = String::new();
    config.seller = "https://other-seller.example.com".into();
    let (request, _) = package_browser_request(&mut harness, &input, config);

    let err = harness.reactor.execute(Vec::new(), request).await.unwrap_err();
    assert_eq!(err.code(), tonic::Code::InvalidArgument);
    assert!(err.message().contains("Auction signals missing in auction config"));
    assert!(err
        .message()
        .contains("Seller domain passed in request does not match this server's domain"));
}

#[tokio::test]
async fn empty_ciphertext_is_rejected() {
    let harness = harness(
        vec![],
        HighestBidWins::new(),
        Some("{}"),
        Arc::new(CapturingReporter::default()),
    );
    let request = SelectAdRequest {
        auction_config: Some(auction_config(&[BUYER_A])),
        client_type: ClientType::Browser as i32,
        ..Default::default()
    };
    let err = harness.reactor.execute(Vec::new(), request).await.unwrap_err();
    assert_eq!(err.code(), tonic::Code::InvalidArgument);
    assert!(err.message().contains("protected_auction_ciphertext"));
}

#[tokio::test]
async fn bidding_groups_track_positive_bid_indices() {
    // Three groups for one buyer; only the first and third bid positively.
    let bfe = ScriptedBfe::bids(vec![
        bid("cars", "r1", 5.0),
        bid("boats", "r3", 1.0),
        bid("bikes", "r2", 0.0),
    ]);
    let mut harness = harness(
        vec![(BUYER_A, bfe as Arc<dyn BuyerFrontEndClient>)],
        HighestBidWins::new(),
        Some("{\"renderUrls\": {\"r1\": [1], \"r2\": [1], \"r3\": [1]}}"),
        Arc::new(CapturingReporter::default()),
    );

    let input = interest_groups_input(&[(
        BUYER_A,
        vec![ig("cars", &["r1"]), ig("bikes", &["r2"]), ig("boats", &["r3"])],
    )]);
    let (request, context) = package_browser_request(&mut harness, &input, auction_config(&[BUYER_A]));

    let response = harness.reactor.execute(Vec::new(), request).await.unwrap();
    let result = open_auction_result(&context, &response.auction_result_ciphertext);

    assert_eq!(result.bidding_groups[BUYER_A].index, vec![0, 2]);
}

#[tokio::test]
async fn debug_urls_fire_with_post_auction_signals() {
    let bfe_a = ScriptedBfe::bids(vec![AdWithBid {
        render: "r1".into(),
        bid: 5.0,
        interest_group_name: "cars".into(),
        debug_report_urls: Some(ba_api::DebugReportUrls {
            auction_debug_win_url: "https://buyer-a.example.com/win?wb=${winningBid}".into(),
            auction_debug_loss_url: String::new(),
        }),
        ..Default::default()
    }]);
    let bfe_b = ScriptedBfe::bids(vec![AdWithBid {
        render: "r2".into(),
        bid: 1.0,
        interest_group_name: "bikes".into(),
        debug_report_urls: Some(ba_api::DebugReportUrls {
            auction_debug_win_url: String::new(),
            auction_debug_loss_url: "https://buyer-b.example.com/loss?mwb=${madeWinningBid}".into(),
        }),
        ..Default::default()
    }]);
    let reporter = Arc::new(CapturingReporter::default());
    let mut harness = harness(
        vec![
            (BUYER_A, bfe_a as Arc<dyn BuyerFrontEndClient>),
            (BUYER_B, bfe_b as Arc<dyn BuyerFrontEndClient>),
        ],
        HighestBidWins::new(),
        Some("{\"renderUrls\": {\"r1\": [1], \"r2\": [1]}}"),
        reporter.clone(),
    );

    let input = interest_groups_input(&[
        (BUYER_A, vec![ig("cars", &["r1"])]),
        (BUYER_B, vec![ig("bikes", &["r2"])]),
    ]);
    let (request, _) =
        package_browser_request(&mut harness, &input, auction_config(&[BUYER_A, BUYER_B]));

    let _ = harness.reactor.execute(Vec::new(), request).await.unwrap();

    let urls = reporter.urls.lock().unwrap().clone();
    assert_eq!(urls.len(), 2);
    assert!(urls.contains(&"https://buyer-a.example.com/win?wb=5".to_string()));
    assert!(urls.contains(&"https://buyer-b.example.com/loss?mwb=false".to_string()));
}

#[tokio::test]
async fn app_path_round_trips_binary_proto() {
    use prost::Message;

    let bfe = ScriptedBfe::bids(vec![bid("cars", "r1", 5.0)]);
    let mut harness = harness(
        vec![(BUYER_A, bfe as Arc<dyn BuyerFrontEndClient>)],
        HighestBidWins::new(),
        Some("{\"renderUrls\": {\"r1\": [1]}}"),
        Arc::new(CapturingReporter::default()),
    );

    // App clients gzip binary BuyerInput protos instead of CBOR.
    let buyer_input = BuyerInput { interest_groups: vec![ig("cars", &["r1"])] };
    let mut compressed = Vec::new();
    {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;
        let mut encoder = GzEncoder::new(&mut compressed, Compression::default());
        encoder.write_all(&buyer_input.encode_to_vec()).unwrap();
        encoder.finish().unwrap();
    }
    let mut input = ProtectedAuctionInput {
        generation_id: "gen-app".into(),
        publisher_name: "pub.example.com".into(),
        ..Default::default()
    };
    input.buyer_input.insert(BUYER_A.into(), compressed);

    let (ciphertext, context) = ba_envelope::package_request(
        &harness.public_key,
        &input.encode_to_vec(),
        &mut harness.rng,
    )
    .unwrap();
    let request = SelectAdRequest {
        protected_auction_ciphertext: ciphertext,
        auction_config: Some(auction_config(&[BUYER_A])),
        client_type: ClientType::Android as i32,
        ..Default::default()
    };

    let response = harness.reactor.execute(Vec::new(), request).await.unwrap();
    let payload =
        ba_envelope::unpackage_response(&context, &response.auction_result_ciphertext).unwrap();
    let result = ba_api::AuctionResult::decode(payload.as_slice()).unwrap();

    assert!(!result.is_chaff);
    assert_eq!(result.ad_render_url, "r1");
    assert_eq!(result.bid, 5.0);
    assert_eq!(
        result.bidding_groups[BUYER_A],
        auction_result::InterestGroupIndex { index: vec![0] }
    );
}
