/// Classification for retry policy.
///
/// Used by the shared HTTP helper to decide whether to retry the same
/// provider, and by the provider manager to decide how a failure affects
/// provider health.
///
/// # Behavior Summary
///
/// | Class | Retry same provider? | Try next provider? | Mark provider unhealthy? |
/// |-------|----------------------|--------------------|--------------------------|
/// | `Retry` | Yes (with backoff) | Yes, once retries are spent | No |
/// | `NextProvider` | No | Yes | No |
/// | `MarkUnhealthy` | 5xx only, inside the HTTP helper | Yes | Yes |
/// | `Terminal` | No | No | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Unclassified transport failure (connect error, timeout, truncated body).
    ///
    /// The HTTP helper retries these with exponential backoff up to the
    /// provider's retry budget before giving up.
    Retry,

    /// The provider answered, but cannot serve this request.
    ///
    /// Rate limits, unknown symbols, bad credentials and unsupported
    /// operations all land here. Another vendor may still succeed, and the
    /// provider's health is left alone.
    NextProvider,

    /// The provider is down: a 5xx, or a connection failure that outlived
    /// the retry budget.
    ///
    /// The manager marks it unhealthy immediately so the next call skips it.
    MarkUnhealthy,

    /// Failure that did not come from a provider call.
    ///
    /// Invalid configuration, malformed requests and exhausted fallback
    /// chains. Retrying anywhere won't help.
    Terminal,
}
