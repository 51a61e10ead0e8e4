//! The marker registry of followme.
//!
//! It owns every marker that was ever shown on the map and turns position snapshots into
//! calls on a [MapRenderer]. Markers are created the first time an identity shows up,
//! moved on every sighting and never removed.

mod error;
mod icon;
mod registry;
mod renderer;
mod symbol;

pub use error::MapError;
pub use icon::*;
pub use registry::*;
pub use renderer::*;
pub use symbol::SymbolPath;

pub use followme_api::{LatLng, PositionRecord};
