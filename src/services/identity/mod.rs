pub mod firebase;

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub uid: String,
    pub email: String,
}

/// Black-box credential verifier. Implementations must reject expired
/// tokens and tokens minted for a different project.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> anyhow::Result<VerifiedToken>;
}
