//! Application state shared across handlers

use std::sync::Arc;

use common::ShareRegistry;

use crate::{mailer::KeyMailer, templates::Templates};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: ShareRegistry,
    pub templates: Arc<Templates>,
    pub mailer: Arc<dyn KeyMailer>,
    /// Externally visible origin used to build download links
    pub public_base_url: Option<String>,
}

impl AppState {
    /// Absolute download link for a share, when the public origin is known
    pub fn download_url(&self, share_id: &str) -> Option<String> {
        self.public_base_url
            .as_deref()
            .map(|base| format!("{}/download/{}", base.trim_end_matches('/'), share_id))
    }
}
