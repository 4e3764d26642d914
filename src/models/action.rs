use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Click,
    Close,
    #[serde(other)]
    Other,
}

/// An interaction raised by streamed assistant content, e.g. a click on a
/// service card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEvent {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub component_id: Option<String>,
}
