//! The app manifest Saleor fetches before installing an app.

use serde::{Deserialize, Serialize};

/// Static description of the app, served at `/configuration/manifest`.
///
/// Field names follow Saleor's manifest format (camelCase). Optional fields
/// are omitted from the JSON when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: String,
    pub version: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,

    #[serde(default)]
    pub permissions: Vec<String>,

    pub app_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_url: Option<String>,

    pub token_target_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_privacy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_privacy_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_url: Option<String>,
}

impl Manifest {
    /// The `User-Agent` sent on calls to Saleor on behalf of this app.
    pub fn user_agent(&self) -> String {
        format!("{}/{}", self.id, self.version)
    }
}
