//! Identity configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Static token table used by the token resolver
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfig {
    /// Comma separated `token=userId` pairs
    #[serde(default)]
    pub tokens: Option<String>,
}

impl IdentityConfig {
    /// Parse the token table into `(token, user_id)` pairs
    pub fn token_pairs(&self) -> Result<Vec<(String, String)>, ValidationError> {
        let Some(raw) = self.tokens.as_deref() else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (token, user_id) = entry
                    .split_once('=')
                    .map(|(t, u)| (t.trim(), u.trim()))
                    .filter(|(t, u)| !t.is_empty() && !u.is_empty())
                    .ok_or_else(|| ValidationError::InvalidTokenEntry(entry.to_string()))?;
                Ok((token.to_string(), user_id.to_string()))
            })
            .collect()
    }

    /// Validate identity configuration
    ///
    /// Production deployments must configure at least one token.
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        let pairs = self.token_pairs()?;
        if production && pairs.is_empty() {
            return Err(ValidationError::NoTokensConfigured);
        }
        Ok(())
    }
}
