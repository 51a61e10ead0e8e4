use indexmap::IndexMap;
use tracing::{debug, info};

use crate::{Icon, LatLng, SymbolPath};

/// What a marker is created with. The icon is always applied later with [MapRenderer::set_icon].
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOptions {
    pub title: String,
    pub label: Option<String>,
}

/// The map widget, as far as the registry is concerned.
/// All calls are synchronous and fire-and-forget. The only thing we get back is a handle for new markers.
pub trait MapRenderer {
    /// owned by the registry for as long as the marker lives
    type Handle;

    fn create_marker(&mut self, options: MarkerOptions) -> Self::Handle;
    fn set_position(&mut self, handle: &Self::Handle, position: LatLng);
    fn set_icon(&mut self, handle: &Self::Handle, icon: &Icon);
    fn set_center(&mut self, position: LatLng);
    /// The symbol table of this map. Defaults to the conventional set.
    fn symbol_path(&self, name: &str) -> Option<SymbolPath> {
        SymbolPath::from_name(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMarker {
    pub title: String,
    pub label: Option<String>,
    /// None until the first `set_position`
    pub position: Option<LatLng>,
    pub icon: Option<Icon>,
}

/// Number of times each [MapRenderer] call was made.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RendererCalls {
    pub create_marker: usize,
    pub set_position: usize,
    pub set_icon: usize,
    pub set_center: usize,
}

/// A map without a window.
/// It keeps the scene a real widget would show and traces every change.
/// Used when followme runs without a frontend, and by tests to look at what the registry did.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    markers: IndexMap<MarkerId, HeadlessMarker>,
    center: Option<LatLng>,
    calls: RendererCalls,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn marker(&self, id: MarkerId) -> Option<&HeadlessMarker> {
        self.markers.get(&id)
    }
    pub fn markers(&self) -> impl Iterator<Item = (&MarkerId, &HeadlessMarker)> {
        self.markers.iter()
    }
    pub fn center(&self) -> Option<LatLng> {
        self.center
    }
    pub fn calls(&self) -> RendererCalls {
        self.calls
    }
}

impl MapRenderer for HeadlessRenderer {
    type Handle = MarkerId;

    fn create_marker(&mut self, options: MarkerOptions) -> MarkerId {
        self.calls.create_marker += 1;
        let id = MarkerId(self.markers.len());
        info!(?id, title = %options.title, label = ?options.label, "created marker");
        self.markers.insert(
            id,
            HeadlessMarker {
                title: options.title,
                label: options.label,
                position: None,
                icon: None,
            },
        );
        id
    }

    fn set_position(&mut self, handle: &MarkerId, position: LatLng) {
        self.calls.set_position += 1;
        if let Some(marker) = self.markers.get_mut(handle) {
            debug!(title = %marker.title, %position, "moved marker");
            marker.position = Some(position);
        }
    }

    fn set_icon(&mut self, handle: &MarkerId, icon: &Icon) {
        self.calls.set_icon += 1;
        if let Some(marker) = self.markers.get_mut(handle) {
            debug!(title = %marker.title, ?icon, "changed marker icon");
            marker.icon = Some(icon.clone());
        }
    }

    fn set_center(&mut self, position: LatLng) {
        self.calls.set_center += 1;
        debug!(%position, "centered map");
        self.center = Some(position);
    }
}
