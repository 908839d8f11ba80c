//! Decoding of the browser-encoded `ProtectedAuctionInput` and its nested
//! compressed `BuyerInput`s, plus the matching client-side encoders used by
//! tests and the secure-invoke tooling.
//!
//! Decoding is best-effort: every defect is reported to the accumulator and,
//! unless `fail_fast` is set, decoding continues so the client learns about
//! all of them in one round trip.

use std::collections::HashMap;
use std::io::{Read, Write};

use ba_api::{
    BrowserSignals, BuyerInput, ConsentedDebugConfig, InterestGroup, ProtectedAuctionInput,
};
use ba_common::{ErrorAccumulator, ErrorCode, ErrorVisibility};
use ciborium::Value;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::constants::*;
use crate::value::*;
use crate::CodecError;

macro_rules! bail_if_errors {
    ($acc:expr, $fail_fast:expr, $ret:expr) => {
        if $fail_fast && $acc.has_errors() {
            return $ret;
        }
    };
}

/// Decodes a CBOR-encoded `ProtectedAuctionInput`. Buyer inputs stay
/// compressed; see [`decode_buyer_inputs`].
pub fn decode_protected_auction_input(
    payload: &[u8],
    acc: &ErrorAccumulator,
    fail_fast: bool,
) -> ProtectedAuctionInput {
    let mut out = ProtectedAuctionInput::default();

    let root: Value = match ciborium::from_reader(payload) {
        Ok(root) => root,
        Err(_) => {
            acc.report_error(
                ErrorVisibility::ClientVisible,
                INVALID_CBOR_ERROR,
                ErrorCode::ClientSide,
            );
            return out;
        }
    };

    let Some(entries) = expect_map(&root, PROTECTED_AUCTION_INPUT_FIELD, acc) else {
        return out;
    };

    for (key, value) in entries {
        let Some(key) = expect_text(key, ROOT_CBOR_KEY_FIELD, acc) else {
            bail_if_errors!(acc, fail_fast, out);
            continue;
        };

        match key {
            VERSION_KEY => {
                if let Some(version) = expect_int(value, VERSION_KEY, acc) {
                    // Only version 0 schemas are supported.
                    if version != 0 {
                        acc.report_error(
                            ErrorVisibility::ClientVisible,
                            unsupported_schema_version_error(version),
                            ErrorCode::ClientSide,
                        );
                    }
                }
            }
            PUBLISHER_KEY => {
                if let Some(publisher) = expect_text(value, PUBLISHER_KEY, acc) {
                    out.publisher_name = publisher.to_string();
                }
            }
            GENERATION_ID_KEY => {
                if let Some(generation_id) = expect_text(value, GENERATION_ID_KEY, acc) {
                    out.generation_id = generation_id.to_string();
                }
            }
            DEBUG_REPORTING_KEY => {
                if let Some(enabled) = expect_bool(value, DEBUG_REPORTING_KEY, acc) {
                    out.enable_debug_reporting = enabled;
                }
            }
            INTEREST_GROUPS_KEY => {
                out.buyer_input = decode_buyer_input_keys(value, acc, fail_fast);
            }
            CONSENTED_DEBUG_CONFIG_KEY => {
                out.consented_debug_config =
                    Some(decode_consented_debug_config(value, acc, fail_fast));
            }
            // Unknown root keys are ignored for forward compatibility.
            _ => {}
        }
        bail_if_errors!(acc, fail_fast, out);
    }

    out
}

/// Reads the owner -> compressed-bytestring map without touching the values.
fn decode_buyer_input_keys(
    value: &Value,
    acc: &ErrorAccumulator,
    fail_fast: bool,
) -> HashMap<String, Vec<u8>> {
    let mut out = HashMap::new();
    let Some(entries) = expect_map(value, INTEREST_GROUPS_KEY, acc) else {
        return out;
    };

    for (key, value) in entries {
        let Some(owner) = expect_text(key, "interestGroups.key", acc) else {
            bail_if_errors!(acc, fail_fast, out);
            continue;
        };
        let Some(bytes) = expect_bytes(value, "interestGroups.value", acc) else {
            bail_if_errors!(acc, fail_fast, out);
            continue;
        };
        out.insert(owner.to_string(), bytes.to_vec());
    }
    out
}

fn decode_consented_debug_config(
    value: &Value,
    acc: &ErrorAccumulator,
    fail_fast: bool,
) -> ConsentedDebugConfig {
    let mut out = ConsentedDebugConfig::default();
    let Some(entries) = expect_map(value, CONSENTED_DEBUG_CONFIG_KEY, acc) else {
        return out;
    };

    for (key, value) in entries {
        let Some(key) = expect_text(key, "consentedDebugConfig.key", acc) else {
            bail_if_errors!(acc, fail_fast, out);
            continue;
        };
        match key {
            IS_CONSENTED_KEY => {
                if let Some(consented) = expect_bool(value, "consentedDebugConfig.isConsented", acc)
                {
                    out.is_consented = consented;
                }
            }
            TOKEN_KEY => {
                if let Some(token) = expect_text(value, "consentedDebugConfig.token", acc) {
                    out.token = token.to_string();
                }
            }
            _ => {}
        }
        bail_if_errors!(acc, fail_fast, out);
    }
    out
}

/// Decompresses and decodes every buyer's `BuyerInput`. A failure for one
/// buyer never aborts the others.
pub fn decode_buyer_inputs(
    encoded_buyer_inputs: &HashMap<String, Vec<u8>>,
    acc: &ErrorAccumulator,
    fail_fast: bool,
) -> HashMap<String, BuyerInput> {
    let mut out = HashMap::new();
    for (owner, compressed) in encoded_buyer_inputs {
        out.insert(
            owner.clone(),
            decode_buyer_input(owner, compressed, acc, fail_fast),
        );
        bail_if_errors!(acc, fail_fast, out);
    }
    out
}

/// Decompresses and decodes one buyer's CBOR `BuyerInput` (an array of
/// interest group maps).
pub fn decode_buyer_input(
    owner: &str,
    compressed: &[u8],
    acc: &ErrorAccumulator,
    fail_fast: bool,
) -> BuyerInput {
    let mut out = BuyerInput::default();

    let mut decoder = GzDecoder::new(compressed);
    let mut decompressed = Vec::new();
    if decoder.read_to_end(&mut decompressed).is_err() {
        acc.report_error(
            ErrorVisibility::ClientVisible,
            malformed_compressed_ig_error(owner),
            ErrorCode::ClientSide,
        );
        return out;
    }

    let root: Value = match ciborium::from_reader(decompressed.as_slice()) {
        Ok(root) => root,
        Err(_) => {
            acc.report_error(
                ErrorVisibility::ClientVisible,
                invalid_buyer_input_cbor_error(owner),
                ErrorCode::ClientSide,
            );
            return out;
        }
    };

    let Some(interest_groups) = expect_array(&root, "BuyerInput", acc) else {
        return out;
    };

    for interest_group in interest_groups {
        let Some(entries) = expect_map(interest_group, "BuyerInput[x]", acc) else {
            bail_if_errors!(acc, fail_fast, out);
            out.interest_groups.push(InterestGroup::default());
            continue;
        };

        let mut ig = InterestGroup::default();
        for (key, value) in entries {
            let Some(key) = expect_text(key, "BuyerInput[x].key", acc) else {
                bail_if_errors!(acc, fail_fast, out);
                continue;
            };
            match key {
                NAME_KEY => {
                    if let Some(name) = expect_text(value, "interestGroups.name", acc) {
                        ig.name = name.to_string();
                    }
                }
                BIDDING_SIGNALS_KEYS_KEY => {
                    if let Some(keys) = expect_array(value, "interestGroups.biddingSignalKeys", acc)
                    {
                        ig.bidding_signals_keys = decode_string_array(
                            keys,
                            "interestGroups.biddingSignalKeys[x]",
                            acc,
                        );
                    }
                }
                USER_BIDDING_SIGNALS_KEY => {
                    if let Some(signals) = expect_text(value, USER_BIDDING_SIGNALS_KEY, acc) {
                        ig.user_bidding_signals = signals.to_string();
                    }
                }
                ADS_KEY => {
                    if let Some(ads) = expect_array(value, ADS_KEY, acc) {
                        ig.ad_render_ids = decode_string_array(ads, "ad_render_id", acc);
                    }
                }
                COMPONENT_ADS_KEY => {
                    if let Some(ads) = expect_array(value, "interestGroups.component", acc) {
                        ig.component_ads =
                            decode_string_array(ads, "interestGroups.component[x]", acc);
                    }
                }
                BROWSER_SIGNALS_KEY => {
                    ig.browser_signals =
                        Some(decode_browser_signals(value, owner, acc, fail_fast));
                }
                _ => {}
            }
            bail_if_errors!(acc, fail_fast, out);
        }
        out.interest_groups.push(ig);
    }

    out
}

fn decode_string_array(values: &[Value], field: &str, acc: &ErrorAccumulator) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| expect_text(v, field, acc).map(str::to_string))
        .collect()
}

fn decode_browser_signals(
    value: &Value,
    owner: &str,
    acc: &ErrorAccumulator,
    fail_fast: bool,
) -> BrowserSignals {
    let mut out = BrowserSignals::default();
    let Some(entries) = expect_map(value, BROWSER_SIGNALS_KEY, acc) else {
        return out;
    };

    for (key, value) in entries {
        let Some(key) = expect_text(key, "browserSignals[x].key", acc) else {
            bail_if_errors!(acc, fail_fast, out);
            continue;
        };
        match key {
            BID_COUNT_KEY => {
                if let Some(count) = expect_int(value, "browserSignals[x].bidCount", acc) {
                    out.bid_count = count as i32;
                }
            }
            JOIN_COUNT_KEY => {
                if let Some(count) = expect_int(value, "browserSignals[x].joinCount", acc) {
                    out.join_count = count as i32;
                }
            }
            RECENCY_KEY => {
                if let Some(recency) = expect_int(value, "browserSignals[x].recency", acc) {
                    out.recency = recency as i64;
                }
            }
            PREV_WINS_KEY => {
                if let Some(prev_wins) = expect_array(value, "browserSignals[x].prevWins", acc) {
                    out.prev_wins = stringify_prev_wins(prev_wins, owner, acc, fail_fast);
                }
            }
            _ => {}
        }
        bail_if_errors!(acc, fail_fast, out);
    }
    out
}

/// Converts the CBOR `[[relative_time, ad_render_id], ...]` array into the
/// JSON string `generateBid` receives.
fn stringify_prev_wins(
    entries: &[Value],
    owner: &str,
    acc: &ErrorAccumulator,
    fail_fast: bool,
) -> String {
    let mut wins = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(pair) = expect_array(entry, "browserSignals[x].prevWins[y]", acc) else {
            bail_if_errors!(acc, fail_fast, String::new());
            continue;
        };
        if pair.len() != 2 {
            acc.report_error(
                ErrorVisibility::ClientVisible,
                prev_wins_not_correct_length_error(owner),
                ErrorCode::ClientSide,
            );
            bail_if_errors!(acc, fail_fast, String::new());
            continue;
        }
        let time = expect_int(&pair[0], "browserSignals[x].prevWins[y][0]", acc);
        let ad_render_id = expect_text(&pair[1], "browserSignals[x].prevWins[y][1]", acc);
        bail_if_errors!(acc, fail_fast, String::new());
        if let (Some(time), Some(ad_render_id)) = (time, ad_render_id) {
            wins.push(serde_json::json!([time as i64, ad_render_id]));
        }
    }
    serde_json::Value::Array(wins).to_string()
}

fn gzip_compress(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|()| encoder.finish())
        .map_err(|e| CodecError::Serialize(e.to_string()))
}

/// Client-side encoder for one `BuyerInput`: CBOR, then gzip, as the browser
/// nests it inside `interestGroups`.
pub fn encode_and_compress_buyer_input(buyer_input: &BuyerInput) -> Result<Vec<u8>, CodecError> {
    let groups: Result<Vec<Value>, CodecError> = buyer_input
        .interest_groups
        .iter()
        .map(encode_interest_group)
        .collect();
    let mut bytes = Vec::new();
    ciborium::into_writer(&Value::Array(groups?), &mut bytes)
        .map_err(|e| CodecError::Serialize(e.to_string()))?;
    gzip_compress(&bytes)
}

fn encode_interest_group(ig: &InterestGroup) -> Result<Value, CodecError> {
    let mut entries = vec![(NAME_KEY.to_string(), Value::Text(ig.name.clone()))];
    if !ig.bidding_signals_keys.is_empty() {
        entries.push((
            BIDDING_SIGNALS_KEYS_KEY.to_string(),
            Value::Array(
                ig.bidding_signals_keys
                    .iter()
                    .map(|k| Value::Text(k.clone()))
                    .collect(),
            ),
        ));
    }
    if !ig.user_bidding_signals.is_empty() {
        entries.push((
            USER_BIDDING_SIGNALS_KEY.to_string(),
            Value::Text(ig.user_bidding_signals.clone()),
        ));
    }
    if !ig.ad_render_ids.is_empty() {
        entries.push((
            ADS_KEY.to_string(),
            Value::Array(ig.ad_render_ids.iter().map(|a| Value::Text(a.clone())).collect()),
        ));
    }
    if !ig.component_ads.is_empty() {
        entries.push((
            COMPONENT_ADS_KEY.to_string(),
            Value::Array(ig.component_ads.iter().map(|a| Value::Text(a.clone())).collect()),
        ));
    }
    if let Some(signals) = &ig.browser_signals {
        entries.push((
            BROWSER_SIGNALS_KEY.to_string(),
            encode_browser_signals(signals)?,
        ));
    }
    Ok(shortlex_map(entries))
}

fn encode_browser_signals(signals: &BrowserSignals) -> Result<Value, CodecError> {
    let mut entries = vec![
        (
            BID_COUNT_KEY.to_string(),
            Value::Integer((signals.bid_count as i64).into()),
        ),
        (
            JOIN_COUNT_KEY.to_string(),
            Value::Integer((signals.join_count as i64).into()),
        ),
        (RECENCY_KEY.to_string(), Value::Integer(signals.recency.into())),
    ];

    if !signals.prev_wins.is_empty() {
        let wins: serde_json::Value = serde_json::from_str(&signals.prev_wins)
            .map_err(|e| CodecError::Serialize(format!("prevWins is not valid JSON: {e}")))?;
        let entries_json = wins
            .as_array()
            .ok_or_else(|| CodecError::Serialize("prevWins is not a JSON array".into()))?;
        let mut wins_cbor = Vec::with_capacity(entries_json.len());
        for pair in entries_json {
            let time = pair
                .get(0)
                .and_then(serde_json::Value::as_i64)
                .ok_or_else(|| CodecError::Serialize("prevWins entry time".into()))?;
            let ad_render_id = pair
                .get(1)
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| CodecError::Serialize("prevWins entry ad render id".into()))?;
            wins_cbor.push(Value::Array(vec![
                Value::Integer(time.into()),
                Value::Text(ad_render_id.to_string()),
            ]));
        }
        entries.push((PREV_WINS_KEY.to_string(), Value::Array(wins_cbor)));
    }

    Ok(shortlex_map(entries))
}

/// Client-side encoder for the full `ProtectedAuctionInput`. Buyer input
/// values must already be compressed (see
/// [`encode_and_compress_buyer_input`]).
pub fn encode_protected_auction_input(
    input: &ProtectedAuctionInput,
) -> Result<Vec<u8>, CodecError> {
    let mut entries = vec![
        (VERSION_KEY.to_string(), Value::Integer(0.into())),
        (
            PUBLISHER_KEY.to_string(),
            Value::Text(input.publisher_name.clone()),
        ),
        (
            GENERATION_ID_KEY.to_string(),
            Value::Text(input.generation_id.clone()),
        ),
        (
            DEBUG_REPORTING_KEY.to_string(),
            Value::Bool(input.enable_debug_reporting),
        ),
    ];

    let buyers: Vec<(String, Value)> = input
        .buyer_input
        .iter()
        .map(|(owner, compressed)| (owner.clone(), Value::Bytes(compressed.clone())))
        .collect();
    entries.push((INTEREST_GROUPS_KEY.to_string(), shortlex_map(buyers)));

    if let Some(config) = &input.consented_debug_config {
        entries.push((
            CONSENTED_DEBUG_CONFIG_KEY.to_string(),
            shortlex_map(vec![
                (IS_CONSENTED_KEY.to_string(), Value::Bool(config.is_consented)),
                (TOKEN_KEY.to_string(), Value::Text(config.token.clone())),
            ]),
        ));
    }

    let mut bytes = Vec::new();
    ciborium::into_writer(&shortlex_map(entries), &mut bytes)
        .map_err(|e| CodecError::Serialize(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> ProtectedAuctionInput {
        let ig = InterestGroup {
            name: "cars".into(),
            bidding_signals_keys: vec!["k1".into(), "k2".into()],
            ad_render_ids: vec!["r1".into(), "r2".into()],
            component_ads: vec!["c1".into()],
            user_bidding_signals: "{\"likes\":[\"sedans\"]}".into(),
            browser_signals: Some(BrowserSignals {
                join_count: 3,
                bid_count: 7,
                recency: 1200,
                prev_wins: "[[-20,\"r1\"],[-100,\"r2\"]]".into(),
            }),
        };
        let buyer_input = BuyerInput { interest_groups: vec![ig] };
        let compressed = encode_and_compress_buyer_input(&buyer_input).unwrap();

        let mut input = ProtectedAuctionInput {
            generation_id: "6fa459ea-ee8a-3ca4-894e-db77e160355e".into(),
            publisher_name: "pub.example.com".into(),
            enable_debug_reporting: true,
            ..Default::default()
        };
        input
            .buyer_input
            .insert("https://buyer.example.com".into(), compressed);
        input
    }

    #[test]
    fn protected_auction_input_round_trips() {
        let input = sample_input();
        let encoded = encode_protected_auction_input(&input).unwrap();

        let acc = ErrorAccumulator::new();
        let decoded = decode_protected_auction_input(&encoded, &acc, false);
        assert!(!acc.has_errors(), "{}", acc.joined_message(ErrorVisibility::ClientVisible));
        assert_eq!(decoded.generation_id, input.generation_id);
        assert_eq!(decoded.publisher_name, input.publisher_name);
        assert!(decoded.enable_debug_reporting);

        let buyer_inputs = decode_buyer_inputs(&decoded.buyer_input, &acc, false);
        assert!(!acc.has_errors());
        let buyer_input = &buyer_inputs["https://buyer.example.com"];
        assert_eq!(buyer_input.interest_groups.len(), 1);
        let ig = &buyer_input.interest_groups[0];
        assert_eq!(ig.name, "cars");
        assert_eq!(ig.bidding_signals_keys, vec!["k1", "k2"]);
        assert_eq!(ig.ad_render_ids, vec!["r1", "r2"]);
        assert_eq!(ig.component_ads, vec!["c1"]);
        let signals = ig.browser_signals.as_ref().unwrap();
        assert_eq!(signals.join_count, 3);
        assert_eq!(signals.bid_count, 7);
        assert_eq!(signals.recency, 1200);
        assert_eq!(signals.prev_wins, "[[-20,\"r1\"],[-100,\"r2\"]]");
    }

    #[test]
    fn type_mismatches_accumulate_without_fail_fast() {
        // generationId as bytes and publisher as int, in one payload.
        let root = Value::Map(vec![
            (
                Value::Text(GENERATION_ID_KEY.into()),
                Value::Bytes(vec![1, 2, 3]),
            ),
            (Value::Text(PUBLISHER_KEY.into()), Value::Integer(7.into())),
        ]);
        let mut payload = Vec::new();
        ciborium::into_writer(&root, &mut payload).unwrap();

        let acc = ErrorAccumulator::new();
        let _ = decode_protected_auction_input(&payload, &acc, false);
        let message = acc.joined_message(ErrorVisibility::ClientVisible);
        assert!(message.contains(GENERATION_ID_KEY), "{message}");
        assert!(message.contains(PUBLISHER_KEY), "{message}");
        assert!(message.contains("; "), "{message}");
    }

    #[test]
    fn fail_fast_stops_at_first_error() {
        let root = Value::Map(vec![
            (
                Value::Text(GENERATION_ID_KEY.into()),
                Value::Bytes(vec![1, 2, 3]),
            ),
            (Value::Text(PUBLISHER_KEY.into()), Value::Integer(7.into())),
        ]);
        let mut payload = Vec::new();
        ciborium::into_writer(&root, &mut payload).unwrap();

        let acc = ErrorAccumulator::new();
        let _ = decode_protected_auction_input(&payload, &acc, true);
        let message = acc.joined_message(ErrorVisibility::ClientVisible);
        assert!(message.contains(GENERATION_ID_KEY));
        assert!(!message.contains("; "), "{message}");
    }

    #[test]
    fn garbage_payload_reports_invalid_cbor() {
        let acc = ErrorAccumulator::new();
        let _ = decode_protected_auction_input(b"\xff\xff\xff", &acc, false);
        assert_eq!(
            acc.joined_message(ErrorVisibility::ClientVisible),
            INVALID_CBOR_ERROR
        );
    }

    #[test]
    fn unsupported_schema_version_is_reported() {
        let root = Value::Map(vec![(
            Value::Text(VERSION_KEY.into()),
            Value::Integer(2.into()),
        )]);
        let mut payload = Vec::new();
        ciborium::into_writer(&root, &mut payload).unwrap();

        let acc = ErrorAccumulator::new();
        let _ = decode_protected_auction_input(&payload, &acc, false);
        assert!(acc
            .joined_message(ErrorVisibility::ClientVisible)
            .contains("Unsupported schema version provided: (provided: 2)"));
    }

    #[test]
    fn one_bad_buyer_does_not_abort_the_others() {
        let good = encode_and_compress_buyer_input(&BuyerInput {
            interest_groups: vec![InterestGroup { name: "cars".into(), ..Default::default() }],
        })
        .unwrap();

        let mut encoded = HashMap::new();
        encoded.insert("https://good.example.com".to_string(), good);
        encoded.insert("https://bad.example.com".to_string(), vec![0xde, 0xad]);

        let acc = ErrorAccumulator::new();
        let decoded = decode_buyer_inputs(&encoded, &acc, false);
        assert!(acc.has_errors());
        assert_eq!(decoded["https://good.example.com"].interest_groups.len(), 1);
        assert!(decoded["https://bad.example.com"].interest_groups.is_empty());
        assert!(acc
            .joined_message(ErrorVisibility::ClientVisible)
            .contains("https://bad.example.com"));
    }

    #[test]
    fn prev_wins_length_is_validated() {
        // prevWins entry with 3 elements.
        let ig = Value::Map(vec![
            (Value::Text(NAME_KEY.into()), Value::Text("cars".into())),
            (
                Value::Text(BROWSER_SIGNALS_KEY.into()),
                Value::Map(vec![(
                    Value::Text(PREV_WINS_KEY.into()),
                    Value::Array(vec![Value::Array(vec![
                        Value::Integer(1.into()),
                        Value::Text("r1".into()),
                        Value::Text("extra".into()),
                    ])]),
                )]),
            ),
        ]);
        let mut bytes = Vec::new();
        ciborium::into_writer(&Value::Array(vec![ig]), &mut bytes).unwrap();
        let compressed = gzip_compress(&bytes).unwrap();

        let acc = ErrorAccumulator::new();
        let _ = decode_buyer_input("https://buyer.example.com", &compressed, &acc, false);
        assert!(acc
            .joined_message(ErrorVisibility::ClientVisible)
            .contains("prevWins[x] array of not length 2"));
    }
}
