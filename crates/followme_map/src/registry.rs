use indexmap::IndexMap;
use tracing::{info_span, trace};

use crate::{derive_icon, Icon, LatLng, MapError, MapRenderer, MarkerOptions, PositionRecord};

/// A marker that is (or was) on the map.
#[derive(Debug)]
pub struct MarkerState<H> {
    identity: String,
    handle: H,
    /// last values we handed to the renderer
    pub last_position: LatLng,
    pub last_icon: Option<Icon>,
}

impl<H> MarkerState<H> {
    pub fn identity(&self) -> &str {
        &self.identity
    }
    pub fn handle(&self) -> &H {
        &self.handle
    }
}

/// What a single [MarkerRegistry::reconcile] did.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReconcileReport {
    pub records: usize,
    pub created: usize,
    pub icons_set: usize,
    /// where the camera ended up, if any record asked for focus
    pub centered_on: Option<LatLng>,
}

/// Every marker ever seen, keyed by identity.
///
/// Markers are created on first sighting and live as long as the registry.
/// An identity missing from a later snapshot keeps its marker exactly where it was.
#[derive(Debug)]
pub struct MarkerRegistry<H> {
    markers: IndexMap<String, MarkerState<H>>,
}

impl<H> Default for MarkerRegistry<H> {
    fn default() -> Self {
        Self {
            markers: IndexMap::new(),
        }
    }
}

impl<H> MarkerRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn get(&self, identity: &str) -> Option<&MarkerState<H>> {
        self.markers.get(identity)
    }
    pub fn contains(&self, identity: &str) -> bool {
        self.markers.contains_key(identity)
    }
    pub fn len(&self) -> usize {
        self.markers.len()
    }
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
    /// in the order the identities were first seen
    pub fn iter(&self) -> impl Iterator<Item = &MarkerState<H>> {
        self.markers.values()
    }

    /// Applies a snapshot to the map, record by record, in the order given.
    ///
    /// 1. unknown identities get a new marker with their label and no icon.
    /// 2. every record moves its marker, even if the position didn't change.
    /// 3. records with a symbol replace the icon. records without one leave the icon alone.
    /// 4. focus records center the map. The last one in the snapshot wins.
    ///
    /// A snapshot that names a symbol the renderer doesn't know is rejected as a whole,
    /// before anything is touched.
    pub fn reconcile<R>(
        &mut self,
        renderer: &mut R,
        snapshot: &[PositionRecord],
    ) -> Result<ReconcileReport, MapError>
    where
        R: MapRenderer<Handle = H>,
    {
        let _span = info_span!("reconcile", records = snapshot.len()).entered();
        for record in snapshot {
            if let Some(symbol) = record.symbol_kind.as_deref() {
                if renderer.symbol_path(symbol).is_none() {
                    return Err(MapError::UnknownSymbol {
                        identity: record.identity.clone(),
                        symbol: symbol.to_string(),
                    });
                }
            }
        }

        let mut report = ReconcileReport {
            records: snapshot.len(),
            ..Default::default()
        };
        for record in snapshot {
            let marker = match self.markers.entry(record.identity.clone()) {
                indexmap::map::Entry::Occupied(o) => o.into_mut(),
                indexmap::map::Entry::Vacant(v) => {
                    let handle = renderer.create_marker(MarkerOptions {
                        title: record.identity.clone(),
                        label: record.display_label.clone(),
                    });
                    report.created += 1;
                    v.insert(MarkerState {
                        identity: record.identity.clone(),
                        handle,
                        last_position: record.position,
                        last_icon: None,
                    })
                }
            };

            trace!(
                identity = %record.identity,
                moved = marker.last_position.distance_to(record.position),
                "moving marker"
            );
            renderer.set_position(&marker.handle, record.position);
            marker.last_position = record.position;

            if record.symbol_kind.is_some() {
                let icon = derive_icon(record, marker.last_icon.as_ref(), |name| {
                    renderer.symbol_path(name)
                })?;
                if let Some(icon) = icon {
                    renderer.set_icon(&marker.handle, &icon);
                    marker.last_icon = Some(icon);
                    report.icons_set += 1;
                }
            }

            if record.is_focus {
                renderer.set_center(record.position);
                report.centered_on = Some(record.position);
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use rstest::*;
    use similar_asserts::assert_eq;

    use super::*;
    use crate::{HeadlessRenderer, MarkerId, SymbolPath};

    struct Map {
        registry: MarkerRegistry<MarkerId>,
        renderer: HeadlessRenderer,
    }
    impl Map {
        fn apply(&mut self, json: &str) -> Result<ReconcileReport, MapError> {
            let snapshot: Vec<PositionRecord> =
                serde_json::from_str(json).expect("failed to parse test snapshot");
            self.registry.reconcile(&mut self.renderer, &snapshot)
        }
        fn marker(&self, identity: &str) -> &crate::HeadlessMarker {
            let state = self.registry.get(identity).expect("no such identity");
            self.renderer
                .marker(*state.handle())
                .expect("renderer lost the marker")
        }
    }

    #[fixture]
    fn map() -> Map {
        Map {
            registry: MarkerRegistry::new(),
            renderer: HeadlessRenderer::new(),
        }
    }

    #[rstest]
    fn empty_snapshot_is_noop(mut map: Map) {
        let report = map.apply("[]").unwrap();
        assert_eq!(report, ReconcileReport::default());
        assert!(map.registry.is_empty());
        assert_eq!(map.renderer.calls(), crate::RendererCalls::default());
    }

    #[rstest]
    fn creates_marker_with_label(mut map: Map) {
        let report = map
            .apply(r#"[{"title": "vehicle", "label": "V", "position": {"lat": 20, "lng": 20}}]"#)
            .unwrap();
        assert_eq!(report.created, 1);
        let marker = map.marker("vehicle");
        assert_eq!(marker.title, "vehicle");
        assert_eq!(marker.label.as_deref(), Some("V"));
        assert_eq!(marker.position, Some(LatLng::new(20.0, 20.0)));
        assert_eq!(marker.icon, None);
    }

    #[rstest]
    fn identity_is_stable(mut map: Map) {
        map.apply(r#"[{"title": "a", "position": {"lat": 1, "lng": 1}}]"#)
            .unwrap();
        let first = *map.registry.get("a").unwrap().handle();
        for i in 2..10 {
            map.apply(&format!(
                r#"[{{"title": "a", "position": {{"lat": {i}, "lng": {i}}}}}]"#
            ))
            .unwrap();
            assert_eq!(*map.registry.get("a").unwrap().handle(), first);
        }
        assert_eq!(map.renderer.calls().create_marker, 1);
        assert_eq!(map.renderer.calls().set_position, 9);
        assert_eq!(map.marker("a").position, Some(LatLng::new(9.0, 9.0)));
    }

    #[rstest]
    fn creation_count_matches_distinct_identities(mut map: Map) {
        let ticks = [
            r#"[{"title": "a", "position": {"lat": 0, "lng": 0}}, {"title": "b", "position": {"lat": 0, "lng": 0}}]"#,
            r#"[{"title": "b", "position": {"lat": 1, "lng": 1}}, {"title": "c", "position": {"lat": 1, "lng": 1}}]"#,
            r#"[{"title": "a", "position": {"lat": 2, "lng": 2}}, {"title": "a", "position": {"lat": 3, "lng": 3}}]"#,
        ];
        for tick in ticks {
            map.apply(tick).unwrap();
        }
        assert_eq!(map.renderer.calls().create_marker, 3);
        assert_eq!(map.registry.len(), 3);
        let identities: Vec<&str> = map.registry.iter().map(|m| m.identity()).collect();
        assert_eq!(identities, vec!["a", "b", "c"]);
        let scene: Vec<(MarkerId, &str, Option<LatLng>)> = map
            .renderer
            .markers()
            .map(|(id, m)| (*id, m.title.as_str(), m.position))
            .collect();
        assert_eq!(
            scene,
            vec![
                (MarkerId(0), "a", Some(LatLng::new(3.0, 3.0))),
                (MarkerId(1), "b", Some(LatLng::new(1.0, 1.0))),
                (MarkerId(2), "c", Some(LatLng::new(1.0, 1.0))),
            ]
        );
    }

    #[rstest]
    fn absent_identity_is_not_removed(mut map: Map) {
        map.apply(r#"[{"title": "a", "position": {"lat": 1, "lng": 1}}, {"title": "b", "position": {"lat": 5, "lng": 5}}]"#)
            .unwrap();
        map.apply(r#"[{"title": "a", "position": {"lat": 2, "lng": 2}}]"#)
            .unwrap();
        map.apply("[]").unwrap();
        assert!(map.registry.contains("b"));
        assert_eq!(map.marker("b").position, Some(LatLng::new(5.0, 5.0)));
        assert_eq!(map.marker("a").position, Some(LatLng::new(2.0, 2.0)));
    }

    #[rstest]
    fn icon_persists_when_symbol_is_omitted(mut map: Map) {
        map.apply(r##"[{"title": "bus1", "position": {"lat": 1, "lng": 1}, "symbol": "CIRCLE", "color": "#f00"}]"##)
            .unwrap();
        let red_circle = map.marker("bus1").icon.clone().expect("icon was not set");
        assert_eq!(red_circle.path, SymbolPath::Circle);
        assert_eq!(red_circle.fill_color.as_deref(), Some("#f00"));

        let report = map
            .apply(r#"[{"title": "bus1", "position": {"lat": 2, "lng": 2}}]"#)
            .unwrap();
        assert_eq!(report.icons_set, 0);
        assert_eq!(map.renderer.calls().set_icon, 1);
        assert_eq!(map.marker("bus1").position, Some(LatLng::new(2.0, 2.0)));
        assert_eq!(map.marker("bus1").icon.as_ref(), Some(&red_circle));
        assert_eq!(map.registry.get("bus1").unwrap().last_icon.as_ref(), Some(&red_circle));
    }

    #[rstest]
    #[case(r#", "heading": null"#, None)]
    #[case(r#", "heading": 45"#, Some(45.0))]
    #[case("", None)]
    fn heading_null_vs_absent(mut map: Map, #[case] heading: &str, #[case] rotation: Option<f64>) {
        map.apply(&format!(
            r#"[{{"title": "v", "position": {{"lat": 1, "lng": 1}}, "symbol": "FORWARD_CLOSED_ARROW"{heading}}}]"#
        ))
        .unwrap();
        assert_eq!(map.marker("v").icon.as_ref().unwrap().rotation, rotation);
    }

    #[rstest]
    fn last_focus_wins(mut map: Map) {
        let report = map
            .apply(
                r#"[{"title": "a", "position": {"lat": 1, "lng": 1}, "center": true},
                    {"title": "b", "position": {"lat": 2, "lng": 2}, "center": true},
                    {"title": "c", "position": {"lat": 3, "lng": 3}}]"#,
            )
            .unwrap();
        assert_eq!(map.renderer.center(), Some(LatLng::new(2.0, 2.0)));
        assert_eq!(report.centered_on, Some(LatLng::new(2.0, 2.0)));
        assert_eq!(map.renderer.calls().set_center, 2);
    }

    #[rstest]
    fn no_focus_keeps_camera(mut map: Map) {
        map.apply(r#"[{"title": "a", "position": {"lat": 1, "lng": 1}, "center": true}]"#)
            .unwrap();
        map.apply(r#"[{"title": "a", "position": {"lat": 7, "lng": 7}, "center": false}]"#)
            .unwrap();
        assert_eq!(map.renderer.center(), Some(LatLng::new(1.0, 1.0)));
    }

    #[rstest]
    fn duplicate_identity_in_snapshot_applies_in_order(mut map: Map) {
        let report = map
            .apply(
                r##"[{"title": "a", "position": {"lat": 1, "lng": 1}, "symbol": "CIRCLE", "color": "#f00"},
                     {"title": "a", "position": {"lat": 2, "lng": 2}, "symbol": "FORWARD_OPEN_ARROW", "heading": 90}]"##,
            )
            .unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.icons_set, 2);
        let marker = map.marker("a");
        assert_eq!(marker.position, Some(LatLng::new(2.0, 2.0)));
        let icon = marker.icon.as_ref().unwrap();
        assert_eq!(icon.path, SymbolPath::ForwardOpenArrow);
        assert_eq!(icon.fill_color, None);
        assert_eq!(icon.rotation, Some(90.0));
    }

    #[rstest]
    fn unknown_symbol_rejects_whole_snapshot(mut map: Map) {
        map.apply(r#"[{"title": "a", "position": {"lat": 1, "lng": 1}}]"#)
            .unwrap();
        let calls = map.renderer.calls();
        let err = map
            .apply(
                r#"[{"title": "a", "position": {"lat": 5, "lng": 5}, "center": true},
                    {"title": "b", "position": {"lat": 6, "lng": 6}, "symbol": "STAR"}]"#,
            )
            .unwrap_err();
        assert_eq!(
            err,
            MapError::UnknownSymbol {
                identity: "b".to_string(),
                symbol: "STAR".to_string()
            }
        );
        assert_eq!(map.renderer.calls(), calls);
        assert!(!map.registry.contains("b"));
        assert_eq!(map.marker("a").position, Some(LatLng::new(1.0, 1.0)));
        assert_eq!(map.renderer.center(), None);
    }

    /// a map whose symbol table only has circles
    struct CirclesOnly(HeadlessRenderer);
    impl MapRenderer for CirclesOnly {
        type Handle = MarkerId;
        fn create_marker(&mut self, options: MarkerOptions) -> MarkerId {
            self.0.create_marker(options)
        }
        fn set_position(&mut self, handle: &MarkerId, position: LatLng) {
            self.0.set_position(handle, position)
        }
        fn set_icon(&mut self, handle: &MarkerId, icon: &Icon) {
            self.0.set_icon(handle, icon)
        }
        fn set_center(&mut self, position: LatLng) {
            self.0.set_center(position)
        }
        fn symbol_path(&self, name: &str) -> Option<SymbolPath> {
            (name == "CIRCLE").then_some(SymbolPath::Circle)
        }
    }

    #[rstest]
    fn symbol_table_comes_from_renderer() {
        let mut registry = MarkerRegistry::new();
        let mut renderer = CirclesOnly(HeadlessRenderer::new());
        let mut record = PositionRecord::new("a", LatLng::new(1.0, 1.0));
        record.symbol_kind = Some("CIRCLE".to_string());
        assert!(registry.reconcile(&mut renderer, &[record.clone()]).is_ok());

        record.symbol_kind = Some("FORWARD_CLOSED_ARROW".to_string());
        assert!(registry.reconcile(&mut renderer, &[record]).is_err());
    }
}
