//! Map viewport plumbing.
//!
//! A viewport host publishes the currently visible bounding box. The
//! aggregator subscribes to it while mounted and refreshes only when the box
//! moved noticeably.

pub mod feed;
pub mod filter;
pub mod host;

pub use feed::feed_bounds;
pub use filter::ViewportFilter;
pub use host::{MapViewport, ViewportHost, ViewportSubscription};
