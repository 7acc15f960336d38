use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::time::Duration;

/// Per-call context supplied by the caller: which tenant to talk to, the
/// bearer token to present, and the span all diagnostics are recorded under.
///
/// Nothing here is global. Each invocation receives its own context by
/// reference and the client never stores it.
#[derive(Clone)]
pub struct RequestContext {
    tenant: String,
    token: SecretString,
    span: tracing::Span,
    timeout: Option<Duration>,
}

impl RequestContext {
    pub fn new(tenant: impl Into<String>, token: impl Into<String>) -> Self {
        let tenant = tenant.into();
        let span = tracing::info_span!("model_transform", tenant = %tenant);
        Self {
            tenant,
            token: SecretString::from(token.into()),
            span,
            timeout: None,
        }
    }

    /// Record diagnostics under a caller-owned span instead of the default one.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// Deadline handed down to the transport. The client itself never imposes one.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// `Bearer <token>` value for the Authorization header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }

    /// Resolve `path` against the tenant.
    ///
    /// A bare host (`acme.verify.example.com`) is addressed over https; a
    /// tenant that already carries a scheme is used as given.
    pub fn endpoint_url(&self, path: &str) -> String {
        let base = self.tenant.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if base.contains("://") {
            format!("{}/{}", base, path)
        } else {
            format!("https://{}/{}", base, path)
        }
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("tenant", &self.tenant)
            .field("token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}
