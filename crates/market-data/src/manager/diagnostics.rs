//! Attempt trace for one fallback pass.

use std::fmt;

/// Why a provider was passed over without being called.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Provider's capability flag for the operation is off.
    CapabilityNotSupported,

    /// Provider's tracked health is false and fallback is enabled.
    Unhealthy,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapabilityNotSupported => f.write_str("capability not supported"),
            Self::Unhealthy => f.write_str("unhealthy"),
        }
    }
}

/// Record of a single provider during a fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderAttempt {
    pub provider: String,
    pub skipped: Option<SkipReason>,
    /// Error code and message when the call failed
    pub error: Option<String>,
    pub success: bool,
}

/// Ordered record of every candidate considered for one request.
#[derive(Clone, Debug, Default)]
pub struct FetchDiagnostics {
    pub attempts: Vec<ProviderAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_skip(&mut self, provider: &str, reason: SkipReason) {
        self.attempts.push(ProviderAttempt {
            provider: provider.to_string(),
            skipped: Some(reason),
            error: None,
            success: false,
        });
    }

    pub fn record_error(&mut self, provider: &str, error: String) {
        self.attempts.push(ProviderAttempt {
            provider: provider.to_string(),
            skipped: None,
            error: Some(error),
            success: false,
        });
    }

    pub fn record_success(&mut self, provider: &str) {
        self.attempts.push(ProviderAttempt {
            provider: provider.to_string(),
            skipped: None,
            error: None,
            success: true,
        });
    }

    /// Number of providers that were actually called.
    pub fn called(&self) -> usize {
        self.attempts.iter().filter(|a| a.skipped.is_none()).count()
    }

    pub fn has_success(&self) -> bool {
        self.attempts.iter().any(|a| a.success)
    }

    pub fn skip_reasons(&self) -> Vec<(&str, SkipReason)> {
        self.attempts
            .iter()
            .filter_map(|a| a.skipped.map(|s| (a.provider.as_str(), s)))
            .collect()
    }

    /// One line for logs, e.g. `p1: ERROR (PROVIDER_UNAVAILABLE) -> p2: SUCCESS`.
    pub fn summary(&self) -> String {
        if self.attempts.is_empty() {
            return "no candidates".to_string();
        }
        self.attempts
            .iter()
            .map(|a| {
                if a.success {
                    format!("{}: SUCCESS", a.provider)
                } else if let Some(skip) = &a.skipped {
                    format!("{}: SKIPPED ({})", a.provider, skip)
                } else if let Some(err) = &a.error {
                    format!("{}: ERROR ({})", a.provider, err)
                } else {
                    format!("{}: UNKNOWN", a.provider)
                }
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_summary() {
        let mut diag = FetchDiagnostics::new();
        diag.record_skip("p1", SkipReason::Unhealthy);
        diag.record_error("p2", "RATE_LIMIT_EXCEEDED".to_string());
        diag.record_success("p3");

        assert_eq!(
            diag.summary(),
            "p1: SKIPPED (unhealthy) -> p2: ERROR (RATE_LIMIT_EXCEEDED) -> p3: SUCCESS"
        );
        assert_eq!(diag.called(), 2);
        assert!(diag.has_success());
    }

    #[test]
    fn test_skip_reasons() {
        let mut diag = FetchDiagnostics::new();
        diag.record_skip("a", SkipReason::CapabilityNotSupported);
        diag.record_skip("b", SkipReason::Unhealthy);
        assert_eq!(diag.called(), 0);
        assert!(!diag.has_success());
        assert_eq!(
            diag.skip_reasons(),
            vec![
                ("a", SkipReason::CapabilityNotSupported),
                ("b", SkipReason::Unhealthy)
            ]
        );
        assert_eq!(FetchDiagnostics::new().summary(), "no candidates");
    }
}
