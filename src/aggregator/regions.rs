//! Continental macro-regions swept to build the baseline station set.

use crate::models::BoundingBox;
use serde::{Deserialize, Serialize};

/// A named bounding box covered by every world sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub bounds: BoundingBox,
}

impl Region {
    fn new(name: &str, north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            name: name.to_string(),
            bounds: BoundingBox {
                north,
                south,
                east,
                west,
            },
        }
    }
}

/// Six continental boxes covering populated land with modest overlap.
pub fn default_regions() -> Vec<Region> {
    vec![
        Region::new("North America", 72.0, 7.0, -50.0, -170.0),
        Region::new("South America", 13.0, -56.0, -30.0, -92.0),
        Region::new("Europe", 71.0, 35.0, 45.0, -25.0),
        Region::new("Africa & Middle East", 38.0, -35.0, 63.0, -20.0),
        Region::new("Asia", 77.0, -11.0, 150.0, 60.0),
        Region::new("Oceania", 0.0, -48.0, 180.0, 110.0),
    ]
}
