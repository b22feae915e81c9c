// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Optional caller identity.
//
// The conversion endpoints are open; an enclosing deployment may put a real
// identity layer in front.  Here a bearer credential, when present, is only
// observed: a short fingerprint of it lands in the request log so an
// operator can correlate traffic without this service ever validating or
// storing the credential itself.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};

/// Fingerprint length, in hex characters.
const FINGERPRINT_LEN: usize = 12;

/// Who is calling, as far as this service cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerIdentity {
    Anonymous,
    /// A bearer credential was presented; holds a SHA-256 prefix of it.
    Bearer { fingerprint: String },
}

impl CallerIdentity {
    fn from_bearer(token: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        let digest = hex::encode(hasher.finalize());

        Self::Bearer {
            fingerprint: digest[..FINGERPRINT_LEN].to_string(),
        }
    }
}

impl std::fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => f.write_str("anonymous"),
            Self::Bearer { fingerprint } => write!(f, "bearer:{fingerprint}"),
        }
    }
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .filter(|token| !token.is_empty())
            .map(CallerIdentity::from_bearer)
            .unwrap_or(CallerIdentity::Anonymous);

        Ok(identity)
    }
}
