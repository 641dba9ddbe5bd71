//! One value per provider without map lookups

use moodmix_domain::Provider;

/// Holds a `T` for each [`Provider`]
#[derive(Debug, Clone)]
pub struct PerProvider<T> {
    spotify: T,
    youtube: T,
}

impl<T> PerProvider<T> {
    /// Build both slots with `init`
    pub fn new(mut init: impl FnMut(Provider) -> T) -> Self {
        Self { spotify: init(Provider::Spotify), youtube: init(Provider::YouTube) }
    }

    /// Value held for `provider`
    pub const fn get(&self, provider: Provider) -> &T {
        match provider {
            Provider::Spotify => &self.spotify,
            Provider::YouTube => &self.youtube,
        }
    }
}
