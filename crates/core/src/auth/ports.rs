//! Ports implemented by the provider adapters in `moodmix-infra`

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use moodmix_common::auth::OAuthClientTrait;
use moodmix_domain::{Profile, Provider, Result};

/// Fetches the identity of the account behind an access token
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    /// Spotify returns the current user, YouTube the first owned channel.
    ///
    /// # Errors
    /// Returns an error when the request fails or the payload does not
    /// describe an account (e.g. an empty channel list).
    async fn fetch_profile(&self, access_token: &str) -> Result<Profile>;
}

/// Everything the lifecycle needs to talk to one provider
#[derive(Clone)]
pub struct ProviderBinding {
    pub provider: Provider,
    pub oauth: Arc<dyn OAuthClientTrait>,
    pub profiles: Arc<dyn ProfileFetcher>,
}

impl ProviderBinding {
    /// Bind `oauth` and `profiles` to `provider`
    pub fn new(
        provider: Provider,
        oauth: Arc<dyn OAuthClientTrait>,
        profiles: Arc<dyn ProfileFetcher>,
    ) -> Self {
        Self { provider, oauth, profiles }
    }
}

impl fmt::Debug for ProviderBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderBinding")
            .field("provider", &self.provider)
            .field("redirect_uri", &self.oauth.redirect_uri())
            .finish_non_exhaustive()
    }
}
