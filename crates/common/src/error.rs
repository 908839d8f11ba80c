//! Error visibility classes and the request-scoped error accumulator.
//!
//! Two audiences can be told about a bad request: the seller's ad server
//! (plaintext gRPC status) and the on-device client (an error object inside
//! the encrypted response). Validation and decoding collect into an
//! accumulator instead of failing fast so a client gets every defect in one
//! round trip.

use std::collections::BTreeMap;
use std::sync::Mutex;

/// Who is allowed to see an accumulated error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorVisibility {
    ClientVisible,
    AdServerVisible,
}

/// Coarse error class carried in the client-visible error object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorCode {
    ClientSide = 400,
    ServerSide = 500,
}

/// Joins accumulated error messages.
pub const ERROR_DELIMITER: &str = "; ";

// Client-visible validation errors.
pub const MISSING_GENERATION_ID: &str = "Request is missing generation ID";
pub const MISSING_PUBLISHER_NAME: &str = "Request is missing publisher name";
pub const MISSING_BUYER_INPUTS: &str = "Request is missing buyer inputs";
pub const EMPTY_INTEREST_GROUP_OWNER: &str =
    "One or more interest group owner name is empty in buyer inputs";

// Ad-server-visible validation errors.
pub const EMPTY_SELLER_SIGNALS: &str = "Seller signals missing in auction config";
pub const EMPTY_AUCTION_SIGNALS: &str = "Auction signals missing in auction config";
pub const EMPTY_BUYER_LIST: &str = "No buyers specified";
pub const EMPTY_SELLER: &str = "Seller origin missing in auction config";
pub const WRONG_SELLER_DOMAIN: &str =
    "Seller domain passed in request does not match this server's domain";
pub const EMPTY_BUYER_IN_PER_BUYER_CONFIG: &str =
    "One or more buyer keys are empty in per buyer config map";
pub const UNKNOWN_CLIENT_TYPE: &str = "Unknown client type in SelectAdRequest";

// Server-side errors.
pub const INTERNAL_SERVER_ERROR: &str = "Internal Error";
pub const REQUEST_CANCELLED: &str = "Request Cancelled by Client.";

/// Collects request defects grouped by visibility and code.
///
/// Interior mutability lets decode helpers share one accumulator without
/// threading `&mut` through every call; contention is nil since a request is
/// validated on one task.
#[derive(Debug, Default)]
pub struct ErrorAccumulator {
    errors: Mutex<BTreeMap<(ErrorVisibility, ErrorCode), Vec<String>>>,
}

impl ErrorAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one error; duplicates of an already-reported message are
    /// dropped so repeated per-item checks do not spam the client.
    pub fn report_error(
        &self,
        visibility: ErrorVisibility,
        message: impl Into<String>,
        code: ErrorCode,
    ) {
        let message = message.into();
        tracing::debug!(message = %message, ?visibility, "accumulated request error");
        let mut errors = self.errors.lock().expect("error accumulator poisoned");
        let entries = errors.entry((visibility, code)).or_default();
        if !entries.iter().any(|e| e == &message) {
            entries.push(message);
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.lock().expect("error accumulator poisoned").is_empty()
    }

    pub fn has_errors_for(&self, visibility: ErrorVisibility) -> bool {
        self.errors
            .lock()
            .expect("error accumulator poisoned")
            .keys()
            .any(|(v, _)| *v == visibility)
    }

    /// All messages for one visibility, joined with [`ERROR_DELIMITER`] in
    /// report order.
    pub fn joined_message(&self, visibility: ErrorVisibility) -> String {
        let errors = self.errors.lock().expect("error accumulator poisoned");
        errors
            .iter()
            .filter(|((v, _), _)| *v == visibility)
            .flat_map(|(_, msgs)| msgs.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(ERROR_DELIMITER)
    }
}
