// SPDX-License-Identifier: MIT OR Apache-2.0

//! Share URLs: `<origin><path>?token=<id>`.

use granary_core::TokenId;

/// Render the shareable URL embedding a token id.
pub fn share_url(origin: &str, path: &str, token: &TokenId) -> String {
    format!("{origin}{path}?token={token}")
}

/// Extract the token id from a URL query string.
///
/// `token` is the only recognized parameter of this workflow; any other
/// pairs are ignored. Accepts the query with or without its leading `?`.
pub fn token_from_query(query: &str) -> Option<TokenId> {
    let query = query.strip_prefix('?').unwrap_or(query);
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, value)| *key == "token" && !value.is_empty())
        .map(|(_, value)| TokenId::from(value))
}

#[cfg(test)]
mod tests {
    use granary_core::TokenId;

    use super::{share_url, token_from_query};

    #[test]
    fn round_trip() {
        let token = TokenId::from("abc123");
        let url = share_url("https://harvest.example", "/app", &token);
        assert_eq!(url, "https://harvest.example/app?token=abc123");

        let query = url.split_once('?').map(|(_, query)| query).unwrap();
        assert_eq!(token_from_query(query), Some(token));
    }

    #[test]
    fn ignores_other_parameters() {
        assert_eq!(
            token_from_query("?lang=fr&token=abc&view=list"),
            Some(TokenId::from("abc"))
        );
        assert_eq!(token_from_query("lang=fr"), None);
        assert_eq!(token_from_query("token="), None);
        assert_eq!(token_from_query(""), None);
    }
}
