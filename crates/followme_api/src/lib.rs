//! Client side of the followme position feed.
//!
//! 1. [position::PositionRecord] is the wire shape served by `GET /position`
//! 2. [end_point::EndPoint] describes a json end point relative to the server url
//! 3. [end_point::PositionSource] is what the poll scheduler fetches snapshots from.
//!     [end_point::HttpPositionSource] is the ureq backed implementation
//! 4. [geom] has the small amount of geodesic math we need on [LatLng]
pub mod end_point;
pub mod geom;
pub mod position;

pub use end_point::{EndPoint, FetchError, HttpPositionSource, Position, PositionSource, RetryPolicy};
pub use geom::LatLng;
pub use position::PositionRecord;

pub(crate) mod prelude {
    pub type HttpClient = ureq::Agent;
    pub use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
    pub use tracing::debug;
    pub use url::Url;
    pub const USER_AGENT: &str = const_format::concatcp!("followme/", env!("CARGO_PKG_VERSION"));
}
