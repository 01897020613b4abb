use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::{TokenVerifier, VerifiedToken};

pub struct FirebaseTokenVerifier {
    api_key: String,
    client: reqwest::Client,
}

impl FirebaseTokenVerifier {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
struct LookupUser {
    #[serde(rename = "localId")]
    local_id: String,
    #[serde(default)]
    email: String,
}

#[async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> anyhow::Result<VerifiedToken> {
        anyhow::ensure!(!self.api_key.is_empty(), "identity API key not configured");

        let url = format!(
            "https://identitytoolkit.googleapis.com/v1/accounts:lookup?key={}",
            self.api_key
        );

        // Keying the lookup by this project's API key rejects tokens minted
        // for any other project.
        let response: LookupResponse = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "idToken": token }))
            .send()
            .await
            .context("failed to reach identity provider")?
            .error_for_status()
            .context("identity provider rejected token")?
            .json()
            .await
            .context("failed to parse identity provider response")?;

        let user = response
            .users
            .into_iter()
            .next()
            .context("token resolved to no account")?;

        Ok(VerifiedToken {
            uid: user.local_id,
            email: user.email,
        })
    }
}
