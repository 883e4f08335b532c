//! User profile and the fetch seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

/// Profile returned by the backend's `/me` endpoint. The backend owns the
/// shape; unrecognized fields are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Profile {
    /// Best human-readable label for this profile.
    pub fn display_label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.phone.as_deref())
            .or(self.id.as_deref())
            .unwrap_or("unknown user")
    }
}

/// Fetches the profile for a bearer token. Production uses
/// [`ApiClient`](crate::api::ApiClient); tests inject stubs.
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch_profile(&self, token: &str) -> Result<Profile, ApiError>;
}
