//! Per-buyer fan-out accounting.
//!
//! Every buyer in the list reports exactly one terminal state; once all have
//! reported, the stats decide between the internal-error, chaff and scoring
//! paths.

/// Terminal state of one buyer's GetBids attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletedBidState {
    /// Missing buyer input or no client for the buyer; the call was never
    /// made.
    Skipped,
    /// The buyer answered with zero bids.
    EmptyResponse,
    Error,
    Success,
}

#[derive(Debug, Default)]
pub struct BidStats {
    pub successful: usize,
    pub empty: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl BidStats {
    pub fn record(&mut self, state: CompletedBidState) {
        match state {
            CompletedBidState::Skipped => self.skipped += 1,
            CompletedBidState::EmptyResponse => self.empty += 1,
            CompletedBidState::Error => self.errored += 1,
            CompletedBidState::Success => self.successful += 1,
        }
    }

    /// Whether the fan-out outcome still allows a chaff response.
    ///
    /// Only a fan-out where every attempted buyer errored is a true failure;
    /// empty responses and skips account for legitimate no-bid auctions.
    pub fn allows_chaff(&self) -> bool {
        let possible_chaff = self.empty > 0 || self.skipped > 0;
        self.successful > 0 || possible_chaff || self.errored == 0
    }
}

impl std::fmt::Display for BidStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "succeeded={}, errored={}, skipped={}, empty={}",
            self.successful, self.errored, self.skipped, self.empty
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_errors_is_a_true_failure() {
        let mut stats = BidStats::default();
        stats.record(CompletedBidState::Error);
        stats.record(CompletedBidState::Error);
        assert!(!stats.allows_chaff());
    }

    #[test]
    fn empty_or_skipped_buyers_allow_chaff() {
        let mut stats = BidStats::default();
        stats.record(CompletedBidState::Error);
        stats.record(CompletedBidState::EmptyResponse);
        assert!(stats.allows_chaff());

        let mut stats = BidStats::default();
        stats.record(CompletedBidState::Error);
        stats.record(CompletedBidState::Skipped);
        assert!(stats.allows_chaff());
    }

    #[test]
    fn success_always_counts() {
        let mut stats = BidStats::default();
        stats.record(CompletedBidState::Success);
        stats.record(CompletedBidState::Error);
        assert!(stats.allows_chaff());
    }

    #[test]
    fn no_buyers_at_all_is_not_a_failure() {
        assert!(BidStats::default().allows_chaff());
    }
}
