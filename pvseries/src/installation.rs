use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A registered photovoltaic installation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PvInstallation {
    pub id: u64,
    pub longitude: f32,
    pub latitude: f32,
    pub address: String,
    pub owner_name: String,
    pub is_active: bool,
    pub comments: Option<String>,
}

impl std::fmt::Display for PvInstallation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PvInstallation: {}/{}, {}, {}, {}, {}",
            self.longitude,
            self.latitude,
            self.address,
            self.owner_name,
            self.is_active,
            self.comments.as_deref().unwrap_or("")
        )
    }
}

/// Fields of an installation record before the store has assigned an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInstallation {
    pub longitude: f32,
    pub latitude: f32,
    pub address: String,
    pub owner_name: String,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogAction {
    Created,
    Updated,
}

/// Append-only audit record, written alongside the mutation it describes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationLog {
    pub id: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub action: LogAction,
    pub previous_value: String,
    pub next_value: String,
    pub installation_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_action_display() {
        assert_eq!(LogAction::Created.to_string(), "created");
        assert_eq!(LogAction::Updated.to_string(), "updated");
    }

    #[test]
    fn test_installation_display() {
        let installation = PvInstallation {
            id: 1,
            longitude: 15.4,
            latitude: 47.1,
            address: "Hauptplatz 1".to_owned(),
            owner_name: "Anna Gruber".to_owned(),
            is_active: true,
            comments: None,
        };
        assert_eq!(
            installation.to_string(),
            "PvInstallation: 15.4/47.1, Hauptplatz 1, Anna Gruber, true, "
        );
    }
}
