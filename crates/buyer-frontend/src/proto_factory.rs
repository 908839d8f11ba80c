//! Builds the bidding service request from a decrypted `GetBidsRawRequest`
//! and the fetched bidding signals.

use ba_api::{GenerateBidsRawRequest, GetBidsRawRequest, InterestGroupForBidding};

pub fn create_generate_bids_raw_request(
    get_bids_request: &GetBidsRawRequest,
    bidding_signals: String,
) -> GenerateBidsRawRequest {
    let interest_groups = get_bids_request
        .buyer_input
        .as_ref()
        .map(|buyer_input| {
            buyer_input
                .interest_groups
                .iter()
                .map(|ig| InterestGroupForBidding {
                    name: ig.name.clone(),
                    trusted_bidding_signals_keys: ig.bidding_signals_keys.clone(),
                    ad_render_ids: ig.ad_render_ids.clone(),
                    ad_component_render_ids: ig.component_ads.clone(),
                    user_bidding_signals: ig.user_bidding_signals.clone(),
                    browser_signals: ig.browser_signals.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    GenerateBidsRawRequest {
        interest_group_for_bidding: interest_groups,
        auction_signals: get_bids_request.auction_signals.clone(),
        buyer_signals: get_bids_request.buyer_signals.clone(),
        bidding_signals,
        enable_debug_reporting: get_bids_request.enable_debug_reporting,
        log_context: get_bids_request.log_context.clone(),
        consented_debug_config: get_bids_request.consented_debug_config.clone(),
        publisher_name: get_bids_request.publisher_name.clone(),
        seller: get_bids_request.seller.clone(),
    }
}
