use crate::prelude::*;
use crate::LatLng;

/// One element of the json array served by `GET /position`.
///
/// ```json
/// {"title": "bus1", "label": "B", "position": {"lat": 1.0, "lng": 2.0},
///  "symbol": "FORWARD_CLOSED_ARROW", "color": "#f00", "heading": 45.0, "center": true}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// stable key of the entity. joins markers across ticks
    #[serde(rename = "title")]
    pub identity: String,
    #[serde(rename = "label", default, skip_serializing_if = "Option::is_none")]
    pub display_label: Option<String>,
    pub position: LatLng,
    /// name of a symbol in the map's symbol table
    #[serde(rename = "symbol", default, skip_serializing_if = "Option::is_none")]
    pub symbol_kind: Option<String>,
    /// fill color. only used when there's a symbol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// `None` -> key was absent. `Some(None)` -> explicit `null`. both mean no rotation
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub heading: Option<Option<f64>>,
    /// recenter the camera on this record. `null` counts as false
    #[serde(
        rename = "center",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub is_focus: bool,
}

impl PositionRecord {
    pub fn new(identity: impl Into<String>, position: LatLng) -> Self {
        Self {
            identity: identity.into(),
            display_label: None,
            position,
            symbol_kind: None,
            color: None,
            heading: None,
            is_focus: false,
        }
    }
    /// the rotation to apply, if any. null and absent headings are the same here
    pub fn rotation(&self) -> Option<f64> {
        self.heading.flatten()
    }
}

/// only called when the key exists, so a `null` becomes `Some(None)` instead of collapsing into `None`
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
