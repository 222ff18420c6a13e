use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSettings {
    #[serde(default)]
    pub id: u64,
    pub allow_user_change_password: bool,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            id: 0,
            allow_user_change_password: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub settings: SystemSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSettingsRequest {
    pub allow_user_change_password: bool,
}
