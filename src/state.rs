use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::{config::AppConfig, services::media::MediaService, store::JsonStore};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: JsonStore,
    pub media: MediaService,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(config: AppConfig, store: JsonStore, media: MediaService) -> Self {
        let digest = Sha512::digest(config.cookie_secret.as_bytes());
        let cookie_key = Key::from(&digest[..]);
        Self {
            config,
            store,
            media,
            cookie_key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.cookie_key.clone()
    }
}
