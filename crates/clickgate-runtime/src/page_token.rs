//! Opaque cursors for `list_tables` pagination.
//!
//! A token is URL-safe base64 over a small JSON document recording the last
//! table name served, how many tables came before it, and the filter the
//! listing was made with. Resuming is a keyset seek (`name > after`), so a
//! token stays valid while tables come and go.

use crate::error::GatewayError;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

const TOKEN_VERSION: u8 = 1;

/// Decoded page position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    #[serde(rename = "v")]
    version: u8,
    pub database: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_like: Option<String>,
    /// Last table name already returned.
    pub after: String,
    /// Number of tables returned before the next page.
    pub offset: u64,
}

impl PageCursor {
    pub fn new(
        database: &str,
        like: Option<&str>,
        not_like: Option<&str>,
        after: impl Into<String>,
        offset: u64,
    ) -> Self {
        Self {
            version: TOKEN_VERSION,
            database: database.to_string(),
            like: like.map(str::to_string),
            not_like: not_like.map(str::to_string),
            after: after.into(),
            offset,
        }
    }

    pub fn encode(&self) -> String {
        // Serializing a struct of strings and integers cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode a token and check it belongs to the listing being resumed.
    pub fn decode(
        token: &str,
        database: &str,
        like: Option<&str>,
        not_like: Option<&str>,
    ) -> Result<Self, GatewayError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| GatewayError::invalid_argument("page_token is not a valid token"))?;
        let cursor: PageCursor = serde_json::from_slice(&bytes)
            .map_err(|_| GatewayError::invalid_argument("page_token is not a valid token"))?;

        if cursor.version != TOKEN_VERSION {
            return Err(GatewayError::invalid_argument(format!(
                "page_token version {} is not supported",
                cursor.version
            )));
        }

        if cursor.database != database
            || cursor.like.as_deref() != like
            || cursor.not_like.as_deref() != not_like
        {
            return Err(GatewayError::invalid_argument(
                "page_token was issued for a different database or filter",
            ));
        }

        Ok(cursor)
    }
}
