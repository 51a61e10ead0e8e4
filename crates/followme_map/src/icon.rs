use serde::Serialize;

use crate::{MapError, PositionRecord, SymbolPath};

pub const ICON_SCALE: f32 = 10.0;
pub const ICON_STROKE_WEIGHT: f32 = 4.0;
/// a colored icon is always fully opaque
pub const ICON_FILL_OPACITY: f32 = 1.0;

/// A vector icon for a marker. Unset optional fields mean "use the widget default".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Icon {
    pub path: SymbolPath,
    pub scale: f32,
    pub stroke_weight: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f32>,
    /// degrees clockwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

impl Icon {
    pub fn new(path: SymbolPath) -> Self {
        Self {
            path,
            scale: ICON_SCALE,
            stroke_weight: ICON_STROKE_WEIGHT,
            fill_color: None,
            fill_opacity: None,
            rotation: None,
        }
    }
}

/// The icon a marker should have after seeing `record`.
///
/// 1. no symbol on the record -> whatever the marker had before, untouched. even if that is nothing.
/// 2. otherwise a fresh icon is built from the symbol. nothing carries over from `previous`.
///     * color -> fill color, fully opaque
///     * a numeric heading -> rotation. `null` and absent headings leave rotation unset
///
/// `lookup` resolves symbol names, usually [crate::MapRenderer::symbol_path].
pub fn derive_icon(
    record: &PositionRecord,
    previous: Option<&Icon>,
    lookup: impl Fn(&str) -> Option<SymbolPath>,
) -> Result<Option<Icon>, MapError> {
    let Some(symbol) = record.symbol_kind.as_deref() else {
        return Ok(previous.cloned());
    };
    let path = lookup(symbol).ok_or_else(|| MapError::UnknownSymbol {
        identity: record.identity.clone(),
        symbol: symbol.to_string(),
    })?;
    let mut icon = Icon::new(path);
    if let Some(color) = &record.color {
        icon.fill_color = Some(color.clone());
        icon.fill_opacity = Some(ICON_FILL_OPACITY);
    }
    icon.rotation = record.rotation();
    Ok(Some(icon))
}

#[cfg(test)]
mod test {
    use rstest::*;
    use similar_asserts::assert_eq;

    use super::*;
    use crate::LatLng;

    fn record(json: &str) -> PositionRecord {
        serde_json::from_str(json).expect("failed to parse test record")
    }

    #[fixture]
    fn red_circle() -> Icon {
        Icon {
            path: SymbolPath::Circle,
            scale: ICON_SCALE,
            stroke_weight: ICON_STROKE_WEIGHT,
            fill_color: Some("#f00".to_string()),
            fill_opacity: Some(1.0),
            rotation: None,
        }
    }

    #[rstest]
    fn colored_symbol(red_circle: Icon) {
        let r = record(
            r##"{"title": "bus1", "position": {"lat": 1, "lng": 1}, "symbol": "CIRCLE", "color": "#f00"}"##,
        );
        assert_eq!(derive_icon(&r, None, SymbolPath::from_name), Ok(Some(red_circle)));
    }

    #[rstest]
    fn no_symbol_keeps_previous(red_circle: Icon) {
        let r = PositionRecord::new("bus1", LatLng::new(2.0, 2.0));
        assert_eq!(
            derive_icon(&r, Some(&red_circle), SymbolPath::from_name),
            Ok(Some(red_circle))
        );
        assert_eq!(derive_icon(&r, None, SymbolPath::from_name), Ok(None));
    }

    #[rstest]
    fn color_without_symbol_is_ignored() {
        let r = record(r##"{"title": "a", "position": {"lat": 1, "lng": 1}, "color": "#0f0"}"##);
        assert_eq!(derive_icon(&r, None, SymbolPath::from_name), Ok(None));
    }

    #[rstest]
    fn symbol_without_color_leaves_fill_unset() {
        let r = record(r#"{"title": "a", "position": {"lat": 1, "lng": 1}, "symbol": "FORWARD_OPEN_ARROW"}"#);
        let icon = derive_icon(&r, None, SymbolPath::from_name)
            .unwrap()
            .expect("symbol must produce an icon");
        assert_eq!(icon, Icon::new(SymbolPath::ForwardOpenArrow));
    }

    #[rstest]
    fn new_symbol_does_not_inherit(red_circle: Icon) {
        let r = record(r#"{"title": "a", "position": {"lat": 1, "lng": 1}, "symbol": "CIRCLE"}"#);
        let icon = derive_icon(&r, Some(&red_circle), SymbolPath::from_name)
            .unwrap()
            .unwrap();
        assert_eq!(icon.fill_color, None);
        assert_eq!(icon.fill_opacity, None);
    }

    #[rstest]
    #[case(r#""heading": null,"#, None)]
    #[case(r#""heading": 45,"#, Some(45.0))]
    #[case("", None)]
    fn heading_rotation(#[case] heading: &str, #[case] rotation: Option<f64>) {
        let r = record(&format!(
            r#"{{"title": "a", {heading} "position": {{"lat": 1, "lng": 1}}, "symbol": "FORWARD_CLOSED_ARROW"}}"#
        ));
        let icon = derive_icon(&r, None, SymbolPath::from_name)
            .expect("heading must never fail derivation")
            .unwrap();
        assert_eq!(icon.rotation, rotation);
    }

    #[rstest]
    fn unknown_symbol() {
        let r = record(r#"{"title": "a", "position": {"lat": 1, "lng": 1}, "symbol": "HEXAGON"}"#);
        assert_eq!(
            derive_icon(&r, None, SymbolPath::from_name),
            Err(MapError::UnknownSymbol {
                identity: "a".to_string(),
                symbol: "HEXAGON".to_string()
            })
        );
    }

    #[rstest]
    fn rotation_field_is_not_serialized_when_unset() {
        let json = serde_json::to_value(Icon::new(SymbolPath::Circle)).unwrap();
        assert!(json.get("rotation").is_none());
        assert_eq!(json["path"], "CIRCLE");
    }
}
