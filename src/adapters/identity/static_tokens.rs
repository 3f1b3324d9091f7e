//! Static bearer-token identity resolver.
//!
//! Maps opaque tokens to user ids from configuration. The token is read
//! from a query parameter (`token` by default) or, failing that, from an
//! `Authorization: Bearer <token>` header.
//!
//! # Example
//!
//! ```ignore
//! let resolver = StaticTokenResolver::new("token")
//!     .with_token("secret-42", "42")
//!     .with_token("secret-7", "7");
//! ```

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{IdentityError, UserId};
use crate::ports::{Handshake, IdentityResolver};

const BEARER_PREFIX: &str = "Bearer ";

/// Resolver backed by a fixed token table.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenResolver {
    param: String,
    tokens: HashMap<String, String>,
}

impl StaticTokenResolver {
    /// Creates an empty resolver reading the token from query parameter `param`.
    pub fn new(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            tokens: HashMap::new(),
        }
    }

    /// Accepts `token` as `user_id`.
    pub fn with_token(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), user_id.into());
        self
    }

    /// Builds a resolver from `(token, user_id)` pairs.
    pub fn from_pairs<I>(param: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            param: param.into(),
            tokens: pairs.into_iter().collect(),
        }
    }

    /// Number of accepted tokens.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    fn extract<'a>(&self, handshake: &'a Handshake) -> Option<&'a str> {
        let from_query = handshake
            .query
            .get(&self.param)
            .map(String::as_str)
            .filter(|t| !t.is_empty());
        from_query.or_else(|| {
            handshake
                .header("authorization")
                .and_then(|h| h.strip_prefix(BEARER_PREFIX))
                .map(str::trim)
                .filter(|t| !t.is_empty())
        })
    }
}

#[async_trait]
impl IdentityResolver for StaticTokenResolver {
    async fn resolve(&self, handshake: &Handshake) -> Result<UserId, IdentityError> {
        let token = self
            .extract(handshake)
            .ok_or(IdentityError::MissingCredentials)?;
        let user_id = self
            .tokens
            .get(token)
            .ok_or(IdentityError::InvalidCredentials)?;
        UserId::new(user_id.clone()).map_err(|_| IdentityError::InvalidCredentials)
    }
}
