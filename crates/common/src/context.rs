//! Per-request logging context and consented-debug gating.

use ba_api::ConsentedDebugConfig;

/// Correlation fields attached to every log line of a request, and the
/// consented-debug decision for that single request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub generation_id: String,
    pub adtech_debug_id: String,
    /// True only when the request's consented-debug token exactly matches
    /// the server-side secret; un-gates verbose logging for this request.
    consented: bool,
}

impl RequestContext {
    pub fn new(generation_id: impl Into<String>, adtech_debug_id: impl Into<String>) -> Self {
        Self {
            generation_id: generation_id.into(),
            adtech_debug_id: adtech_debug_id.into(),
            consented: false,
        }
    }

    /// Applies the consent decision from the request's debug config against
    /// the configured server token.
    pub fn with_consent(
        mut self,
        config: Option<&ConsentedDebugConfig>,
        server_token: &str,
    ) -> Self {
        self.consented = is_consented(config, server_token);
        self
    }

    pub fn is_consented(&self) -> bool {
        self.consented
    }

    /// Tracing span wrapping all work for this request.
    pub fn span(&self, service: &'static str) -> tracing::Span {
        tracing::info_span!(
            "request",
            service,
            generation_id = %self.generation_id,
            adtech_debug_id = %self.adtech_debug_id,
        )
    }

    /// Logs `message` only for consented requests.
    pub fn debug_log(&self, message: impl AsRef<str>) {
        if self.consented {
            tracing::info!(
                message = message.as_ref(),
                generation_id = %self.generation_id,
                consented = true,
            );
        }
    }
}

/// A request is consented iff it asks for consent, carries a non-empty token
/// and that token matches the server's secret exactly.
pub fn is_consented(config: Option<&ConsentedDebugConfig>, server_token: &str) -> bool {
    match config {
        Some(config) => {
            config.is_consented && !config.token.is_empty() && config.token == server_token
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(is_consented: bool, token: &str) -> ConsentedDebugConfig {
        ConsentedDebugConfig { is_consented, token: token.into() }
    }

    #[test]
    fn consent_requires_exact_token_match() {
        assert!(is_consented(Some(&config(true, "secret")), "secret"));
        assert!(!is_consented(Some(&config(true, "Secret")), "secret"));
        assert!(!is_consented(Some(&config(true, "")), ""));
        assert!(!is_consented(Some(&config(false, "secret")), "secret"));
        assert!(!is_consented(None, "secret"));
    }

    #[test]
    fn context_carries_consent() {
        let ctx = RequestContext::new("gen-1", "debug-1")
            .with_consent(Some(&config(true, "tok")), "tok");
        assert!(ctx.is_consented());

        let ctx = RequestContext::new("gen-1", "debug-1")
            .with_consent(Some(&config(true, "tok")), "other");
        assert!(!ctx.is_consented());
    }
}
