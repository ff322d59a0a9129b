use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::fs;

use crate::error::AppError;

/// Profile pictures live in one directory, keyed by username. Uploads are
/// decoded and re-encoded as PNG so the stored file is always a valid
/// image regardless of what was submitted.
#[derive(Clone)]
pub struct MediaService {
    root: Arc<PathBuf>,
}

impl MediaService {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_structure(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.root()).await?;
        Ok(())
    }

    pub fn profile_pic_path(&self, username: &str) -> PathBuf {
        self.root().join(format!("{username}.png"))
    }

    /// Returns the stored path for the account record.
    pub fn save_profile_pic(&self, username: &str, bytes: &[u8]) -> Result<String, AppError> {
        let img = image::load_from_memory(bytes)?;
        let path = self.profile_pic_path(username);
        img.save(&path)?;
        Ok(path.to_string_lossy().into_owned())
    }

    pub async fn reset_profile_pic(&self, username: &str) -> Result<(), AppError> {
        let path = self.profile_pic_path(username);
        if fs::try_exists(&path).await? {
            fs::remove_file(path).await?;
        }
        Ok(())
    }
}
