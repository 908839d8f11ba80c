//! Canonical CBOR encoding of the `AuctionResult`, and the matching decoder
//! used by clients and tests.
//!
//! The encoded map is in exactly one of three shapes: an error
//! (`{error: {code, message}}`), chaff (`{isChaff: true}`), or a winner with
//! the full key set. All map keys are shortlex ordered.

use std::collections::HashMap;

use ba_api::{auction_result, AdScore, AuctionResult, ReportingUrls, WinReportingUrls};
use ciborium::Value;

use crate::constants::*;
use crate::value::shortlex_map;
use crate::CodecError;

/// Encodes the auction outcome for the browser path.
///
/// `high_score` carries the winner; `bidding_groups` is included only with a
/// winner; `error` takes precedence over both.
pub fn encode_auction_result(
    high_score: Option<&AdScore>,
    bidding_groups: &HashMap<String, auction_result::InterestGroupIndex>,
    error: Option<&auction_result::Error>,
) -> Result<Vec<u8>, CodecError> {
    let root = if let Some(error) = error {
        shortlex_map(vec![(
            ERROR_KEY.to_string(),
            shortlex_map(vec![
                (CODE_KEY.to_string(), Value::Integer((error.code as i64).into())),
                (MESSAGE_KEY.to_string(), Value::Text(error.message.clone())),
            ]),
        )])
    } else if let Some(score) = high_score {
        encode_winner(score, bidding_groups)
    } else {
        shortlex_map(vec![(CHAFF_KEY.to_string(), Value::Bool(true))])
    };

    let mut bytes = Vec::new();
    ciborium::into_writer(&root, &mut bytes).map_err(|e| CodecError::Serialize(e.to_string()))?;
    Ok(bytes)
}

fn encode_winner(
    score: &AdScore,
    bidding_groups: &HashMap<String, auction_result::InterestGroupIndex>,
) -> Value {
    let mut entries = vec![
        (BID_KEY.to_string(), Value::Float(f64::from(score.buyer_bid))),
        (
            SCORE_KEY.to_string(),
            Value::Float(f64::from(score.desirability)),
        ),
        (CHAFF_KEY.to_string(), Value::Bool(false)),
        (
            COMPONENTS_KEY.to_string(),
            Value::Array(
                score
                    .component_renders
                    .iter()
                    .map(|r| Value::Text(r.clone()))
                    .collect(),
            ),
        ),
        (
            AD_RENDER_URL_KEY.to_string(),
            Value::Text(score.render.clone()),
        ),
        (
            INTEREST_GROUP_NAME_KEY.to_string(),
            Value::Text(score.interest_group_name.clone()),
        ),
        (
            INTEREST_GROUP_OWNER_KEY.to_string(),
            Value::Text(score.interest_group_owner.clone()),
        ),
        (
            BIDDING_GROUPS_KEY.to_string(),
            encode_bidding_groups(bidding_groups),
        ),
    ];

    if let Some(urls) = &score.win_reporting_urls {
        if let Some(encoded) = encode_win_reporting_urls(urls) {
            entries.push((WIN_REPORTING_URLS_KEY.to_string(), encoded));
        }
    }

    shortlex_map(entries)
}

fn encode_bidding_groups(
    bidding_groups: &HashMap<String, auction_result::InterestGroupIndex>,
) -> Value {
    shortlex_map(
        bidding_groups
            .iter()
            .map(|(origin, indices)| {
                (
                    origin.clone(),
                    Value::Array(
                        indices
                            .index
                            .iter()
                            .map(|i| Value::Integer((*i as i64).into()))
                            .collect(),
                    ),
                )
            })
            .collect(),
    )
}

fn encode_win_reporting_urls(urls: &WinReportingUrls) -> Option<Value> {
    let mut entries = Vec::new();
    if let Some(buyer) = &urls.buyer_reporting_urls {
        entries.push((
            BUYER_REPORTING_URLS_KEY.to_string(),
            encode_reporting_urls(buyer),
        ));
    }
    if let Some(top_level) = &urls.top_level_seller_reporting_urls {
        entries.push((
            TOP_LEVEL_SELLER_REPORTING_URLS_KEY.to_string(),
            encode_reporting_urls(top_level),
        ));
    }
    if entries.is_empty() {
        return None;
    }
    Some(shortlex_map(entries))
}

fn encode_reporting_urls(urls: &ReportingUrls) -> Value {
    shortlex_map(vec![
        (
            REPORTING_URL_KEY.to_string(),
            Value::Text(urls.reporting_url.clone()),
        ),
        (
            INTERACTION_REPORTING_URLS_KEY.to_string(),
            shortlex_map(
                urls.interaction_reporting_urls
                    .iter()
                    .map(|(event, url)| (event.clone(), Value::Text(url.clone())))
                    .collect(),
            ),
        ),
    ])
}

/// Decodes a CBOR `AuctionResult`; the inverse of [`encode_auction_result`].
pub fn decode_auction_result(payload: &[u8]) -> Result<AuctionResult, CodecError> {
    let root: Value =
        ciborium::from_reader(payload).map_err(|e| CodecError::InvalidCbor(e.to_string()))?;
    let entries = root
        .as_map()
        .ok_or_else(|| CodecError::InvalidCbor("AuctionResult is not a map".into()))?;

    let mut out = AuctionResult::default();
    for (key, value) in entries {
        let key = key
            .as_text()
            .ok_or_else(|| CodecError::InvalidCbor("non-string AuctionResult key".into()))?;
        match key {
            BID_KEY => out.bid = as_f32(value, BID_KEY)?,
            SCORE_KEY => out.score = as_f32(value, SCORE_KEY)?,
            CHAFF_KEY => {
                out.is_chaff = value
                    .as_bool()
                    .ok_or_else(|| CodecError::InvalidCbor(CHAFF_KEY.into()))?;
            }
            AD_RENDER_URL_KEY => out.ad_render_url = as_string(value, AD_RENDER_URL_KEY)?,
            INTEREST_GROUP_NAME_KEY => {
                out.interest_group_name = as_string(value, INTEREST_GROUP_NAME_KEY)?;
            }
            INTEREST_GROUP_OWNER_KEY => {
                out.interest_group_owner = as_string(value, INTEREST_GROUP_OWNER_KEY)?;
            }
            COMPONENTS_KEY => {
                let components = value
                    .as_array()
                    .ok_or_else(|| CodecError::InvalidCbor(COMPONENTS_KEY.into()))?;
                out.ad_component_render_urls = components
                    .iter()
                    .map(|c| as_string(c, COMPONENTS_KEY))
                    .collect::<Result<_, _>>()?;
            }
            BIDDING_GROUPS_KEY => {
                let groups = value
                    .as_map()
                    .ok_or_else(|| CodecError::InvalidCbor(BIDDING_GROUPS_KEY.into()))?;
                for (origin, indices) in groups {
                    let origin = as_string(origin, BIDDING_GROUPS_KEY)?;
                    let indices = indices
                        .as_array()
                        .ok_or_else(|| CodecError::InvalidCbor(BIDDING_GROUPS_KEY.into()))?
                        .iter()
                        .map(|i| {
                            i.as_integer()
                                .map(|i| i128::from(i) as i32)
                                .ok_or_else(|| CodecError::InvalidCbor(BIDDING_GROUPS_KEY.into()))
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    out.bidding_groups
                        .insert(origin, auction_result::InterestGroupIndex { index: indices });
                }
            }
            WIN_REPORTING_URLS_KEY => {
                out.win_reporting_urls = Some(decode_win_reporting_urls(value)?);
            }
            ERROR_KEY => {
                let error = value
                    .as_map()
                    .ok_or_else(|| CodecError::InvalidCbor(ERROR_KEY.into()))?;
                let mut decoded = auction_result::Error::default();
                for (error_key, error_value) in error {
                    match error_key.as_text() {
                        Some(CODE_KEY) => {
                            decoded.code = error_value
                                .as_integer()
                                .map(|i| i128::from(i) as i32)
                                .ok_or_else(|| CodecError::InvalidCbor(CODE_KEY.into()))?;
                        }
                        Some(MESSAGE_KEY) => {
                            decoded.message = as_string(error_value, MESSAGE_KEY)?;
                        }
                        _ => {}
                    }
                }
                out.error = Some(decoded);
            }
            _ => {}
        }
    }
    Ok(out)
}

fn decode_win_reporting_urls(value: &Value) -> Result<WinReportingUrls, CodecError> {
    let entries = value
        .as_map()
        .ok_or_else(|| CodecError::InvalidCbor(WIN_REPORTING_URLS_KEY.into()))?;
    let mut out = WinReportingUrls::default();
    for (key, value) in entries {
        match key.as_text() {
            Some(BUYER_REPORTING_URLS_KEY) => {
                out.buyer_reporting_urls = Some(decode_reporting_urls(value)?);
            }
            Some(TOP_LEVEL_SELLER_REPORTING_URLS_KEY) => {
                out.top_level_seller_reporting_urls = Some(decode_reporting_urls(value)?);
            }
            Some(COMPONENT_SELLER_REPORTING_URLS_KEY) => {
                out.component_seller_reporting_urls = Some(decode_reporting_urls(value)?);
            }
            _ => {}
        }
    }
    Ok(out)
}

fn decode_reporting_urls(value: &Value) -> Result<ReportingUrls, CodecError> {
    let entries = value
        .as_map()
        .ok_or_else(|| CodecError::InvalidCbor(REPORTING_URL_KEY.into()))?;
    let mut out = ReportingUrls::default();
    for (key, value) in entries {
        match key.as_text() {
            Some(REPORTING_URL_KEY) => out.reporting_url = as_string(value, REPORTING_URL_KEY)?,
            Some(INTERACTION_REPORTING_URLS_KEY) => {
                let interactions = value.as_map().ok_or_else(|| {
                    CodecError::InvalidCbor(INTERACTION_REPORTING_URLS_KEY.into())
                })?;
                for (event, url) in interactions {
                    out.interaction_reporting_urls.insert(
                        as_string(event, INTERACTION_REPORTING_URLS_KEY)?,
                        as_string(url, INTERACTION_REPORTING_URLS_KEY)?,
                    );
                }
            }
            _ => {}
        }
    }
    Ok(out)
}

fn as_string(value: &Value, field: &str) -> Result<String, CodecError> {
    value
        .as_text()
        .map(str::to_string)
        .ok_or_else(|| CodecError::InvalidCbor(field.into()))
}

fn as_f32(value: &Value, field: &str) -> Result<f32, CodecError> {
    value
        .as_float()
        .map(|f| f as f32)
        .ok_or_else(|| CodecError::InvalidCbor(field.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winner() -> AdScore {
        let mut score = AdScore {
            desirability: 2.0,
            buyer_bid: 5.0,
            render: "https://cdn.example.com/ad1".into(),
            component_renders: vec!["https://cdn.example.com/c1".into()],
            interest_group_name: "cars".into(),
            interest_group_owner: "https://buyer.example.com".into(),
            ..Default::default()
        };
        let mut urls = WinReportingUrls::default();
        let mut buyer_urls = ReportingUrls {
            reporting_url: "https://buyer.example.com/win".into(),
            ..Default::default()
        };
        buyer_urls
            .interaction_reporting_urls
            .insert("click".into(), "https://buyer.example.com/click".into());
        urls.buyer_reporting_urls = Some(buyer_urls);
        urls.top_level_seller_reporting_urls = Some(ReportingUrls {
            reporting_url: "https://seller.example.com/win".into(),
            ..Default::default()
        });
        score.win_reporting_urls = Some(urls);
        score
    }

    fn groups() -> HashMap<String, auction_result::InterestGroupIndex> {
        let mut groups = HashMap::new();
        groups.insert(
            "https://buyer.example.com".to_string(),
            auction_result::InterestGroupIndex { index: vec![0, 2] },
        );
        groups
    }

    #[test]
    fn winner_round_trips() {
        let encoded = encode_auction_result(Some(&winner()), &groups(), None).unwrap();
        let decoded = decode_auction_result(&encoded).unwrap();

        assert!(!decoded.is_chaff);
        assert_eq!(decoded.bid, 5.0);
        assert_eq!(decoded.score, 2.0);
        assert_eq!(decoded.ad_render_url, "https://cdn.example.com/ad1");
        assert_eq!(decoded.ad_component_render_urls, vec!["https://cdn.example.com/c1"]);
        assert_eq!(decoded.interest_group_name, "cars");
        assert_eq!(decoded.interest_group_owner, "https://buyer.example.com");
        assert_eq!(
            decoded.bidding_groups["https://buyer.example.com"].index,
            vec![0, 2]
        );
        let urls = decoded.win_reporting_urls.unwrap();
        assert_eq!(
            urls.buyer_reporting_urls.unwrap().reporting_url,
            "https://buyer.example.com/win"
        );
        assert_eq!(
            urls.top_level_seller_reporting_urls.unwrap().reporting_url,
            "https://seller.example.com/win"
        );
        assert!(decoded.error.is_none());
    }

    #[test]
    fn chaff_is_a_single_key_map() {
        let encoded = encode_auction_result(None, &HashMap::new(), None).unwrap();
        let root: Value = ciborium::from_reader(encoded.as_slice()).unwrap();
        let map = root.as_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[0].0.as_text().unwrap(), CHAFF_KEY);
        assert_eq!(map[0].1.as_bool().unwrap(), true);

        let decoded = decode_auction_result(&encoded).unwrap();
        assert!(decoded.is_chaff);
    }

    #[test]
    fn error_takes_precedence() {
        let error = auction_result::Error { code: 400, message: "bad input; worse input".into() };
        let encoded = encode_auction_result(Some(&winner()), &groups(), Some(&error)).unwrap();
        let decoded = decode_auction_result(&encoded).unwrap();
        let decoded_error = decoded.error.unwrap();
        assert_eq!(decoded_error.code, 400);
        assert_eq!(decoded_error.message, "bad input; worse input");
        assert!(decoded.ad_render_url.is_empty());
    }

    #[test]
    fn winner_map_keys_are_shortlex_ordered() {
        let encoded = encode_auction_result(Some(&winner()), &groups(), None).unwrap();
        let root: Value = ciborium::from_reader(encoded.as_slice()).unwrap();
        let keys: Vec<String> = root
            .as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_text().unwrap().to_string())
            .collect();
        let mut expected = keys.clone();
        expected.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        assert_eq!(keys, expected);
        assert_eq!(keys[0], BID_KEY);
    }

    #[test]
    fn integers_use_narrowest_width() {
        let mut groups = HashMap::new();
        groups.insert(
            "b".to_string(),
            auction_result::InterestGroupIndex { index: vec![0, 23, 24, 255, 256] },
        );
        let mut score = winner();
        score.win_reporting_urls = None;
        let encoded = encode_auction_result(Some(&score), &groups, None).unwrap();

        // 0..=23 encode in the initial byte; 24..=255 take one extra byte;
        // 256.. take two.
        let root: Value = ciborium::from_reader(encoded.as_slice()).unwrap();
        let map = root.as_map().unwrap();
        let groups_value = map
            .iter()
            .find(|(k, _)| k.as_text() == Some(BIDDING_GROUPS_KEY))
            .map(|(_, v)| v)
            .unwrap();
        let mut probe = Vec::new();
        ciborium::into_writer(groups_value, &mut probe).unwrap();
        // map hdr (1) + key "b" (2) + array hdr (1) + 1 + 1 + 2 + 2 + 3 bytes.
        assert_eq!(probe.len(), 1 + 2 + 1 + 1 + 1 + 2 + 2 + 3);
    }

    #[test]
    fn float_widths_are_minimal() {
        // 1.5 fits half precision; 0.1 requires double.
        for (value, encoded_len) in [(1.5f64, 3usize), (0.1f64, 9usize)] {
            let mut bytes = Vec::new();
            ciborium::into_writer(&Value::Float(value), &mut bytes).unwrap();
            assert_eq!(bytes.len(), encoded_len, "value={value}");
        }
    }
}
