use actix_web::HttpRequest;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Allow { identity: String },
    /// `identity` is `None` when the request carried no identity at all.
    Deny { identity: Option<String> },
}

/// Decides whether a request may see the dashboard.
pub trait AuthorizationGate: Send + Sync {
    fn check(&self, request: &HttpRequest) -> AuthDecision;
}

/// Trusts an identity header set by an upstream login proxy and admits
/// identities on a fixed allow-list.
pub struct HeaderAllowList {
    header: String,
    allowed: HashSet<String>,
}

impl HeaderAllowList {
    pub fn new(header: impl Into<String>, allowed: impl IntoIterator<Item = String>) -> Self {
        Self {
            header: header.into(),
            allowed: allowed.into_iter().collect(),
        }
    }
}

impl AuthorizationGate for HeaderAllowList {
    fn check(&self, request: &HttpRequest) -> AuthDecision {
        let identity = request
            .headers()
            .get(self.header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        match identity {
            Some(identity) if self.allowed.contains(&identity) => AuthDecision::Allow { identity },
            identity => AuthDecision::Deny { identity },
        }
    }
}
