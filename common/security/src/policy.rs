use axum::http::Method;
use common_auth::Role;

use crate::context::SecurityContext;
use crate::error::SecurityResult;
use crate::pattern::{split_segments, PathPattern};

/// Endpoint-level requirement: requests matching `method` + `pattern` need `required`.
#[derive(Debug, Clone)]
pub struct RoleRule {
    method: Option<Method>,
    pattern: PathPattern,
    required: Role,
}

impl RoleRule {
    fn applies_to(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().map_or(true, |expected| expected == method)
            && self.pattern.matches(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Permit,
    Deny(DenyReason),
}

/// Why a request was denied. Logged only; clients always see the same 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NonCanonicalPath,
    Unauthenticated,
    MissingAuthority(&'static str),
}

/// Ordered authorization rule table evaluated for every request.
///
/// 1. public patterns permit without a principal;
/// 2. everything else needs an authenticated principal;
/// 3. every matching role rule must be satisfied by the principal's authorities.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationRules {
    public: Vec<PathPattern>,
    role_rules: Vec<RoleRule>,
}

impl AuthorizationRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permit_all<I, P>(mut self, patterns: I) -> SecurityResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        for pattern in patterns {
            self.public.push(PathPattern::parse(pattern.as_ref())?);
        }
        Ok(self)
    }

    pub fn require(
        mut self,
        method: Option<Method>,
        pattern: &str,
        required: Role,
    ) -> SecurityResult<Self> {
        self.role_rules.push(RoleRule {
            method,
            pattern: PathPattern::parse(pattern)?,
            required,
        });
        Ok(self)
    }

    pub fn public_patterns(&self) -> impl Iterator<Item = &PathPattern> {
        self.public.iter()
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public.iter().any(|pattern| pattern.matches(path))
    }

    pub fn evaluate(&self, method: &Method, path: &str, context: &SecurityContext) -> Decision {
        if !is_canonical(path) {
            return Decision::Deny(DenyReason::NonCanonicalPath);
        }

        if self.is_public(path) {
            return Decision::Permit;
        }

        let Some(principal) = context.principal() else {
            return Decision::Deny(DenyReason::Unauthenticated);
        };

        let missing = self
            .role_rules
            .iter()
            .filter(|rule| rule.applies_to(method, path))
            .find(|rule| !principal.has_role(rule.required));

        match missing {
            Some(rule) => Decision::Deny(DenyReason::MissingAuthority(rule.required.authority())),
            None => Decision::Permit,
        }
    }
}

fn is_canonical(path: &str) -> bool {
    split_segments(path)
        .iter()
        .all(|segment| *segment != "." && *segment != "..")
}
