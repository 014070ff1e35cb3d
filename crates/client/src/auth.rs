//! Admin login and access-token resolution.

use serde::{Deserialize, Serialize};

use crate::admin_api::{parse_response, ClientError};
use crate::config::ClientConfig;

/// JWT pair returned by `POST /admin/auth/login/`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Exchange admin credentials for a token pair.
pub async fn login(
    client: &reqwest::Client,
    api_url: &str,
    username: &str,
    password: &str,
) -> Result<TokenPair, ClientError> {
    let url = format!("{}/admin/auth/login/", api_url.trim_end_matches('/'));
    let response = client
        .post(url)
        .json(&LoginRequest { username, password })
        .send()
        .await?;

    let tokens: TokenPair = parse_response(response).await?;
    tracing::info!(username, "Logged in to admin API");
    Ok(tokens)
}

/// Access token for `config`: the configured token, else a fresh login.
pub async fn access_token(
    client: &reqwest::Client,
    config: &ClientConfig,
) -> Result<String, ClientError> {
    if let Some(token) = &config.api_token {
        return Ok(token.clone());
    }

    match (&config.admin_username, &config.admin_password) {
        (Some(username), Some(password)) => {
            let tokens = login(client, &config.api_url, username, password).await?;
            Ok(tokens.access)
        }
        _ => Err(ClientError::Auth(
            "set GLAFRICA_API_TOKEN or GLAFRICA_ADMIN_USERNAME and GLAFRICA_ADMIN_PASSWORD"
                .to_string(),
        )),
    }
}
