//! Spatial operators. These are opaque to the translation core and lowered
//! by a dialect; the only one the core inspects itself is `Bbox`, which the
//! build fallback extracts as a pre-filter.

use crate::path::PropertyName;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box, optionally tagged with a spatial reference
/// system id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub srid: Option<i32>,
}

impl Envelope {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Envelope {
        Envelope {
            min_x,
            min_y,
            max_x,
            max_y,
            srid: None,
        }
    }

    pub fn with_srid(mut self, srid: i32) -> Envelope {
        self.srid = Some(srid);
        self
    }

    /// The smallest envelope containing both `self` and `other`.
    pub fn union(&self, other: &Envelope) -> Envelope {
        Envelope {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
            srid: self.srid.or(other.srid),
        }
    }

    /// WKT polygon text for this envelope (counter-clockwise ring).
    pub fn to_wkt(&self) -> String {
        format!(
            "POLYGON(({minx} {miny},{maxx} {miny},{maxx} {maxy},{minx} {maxy},{minx} {miny}))",
            minx = self.min_x,
            miny = self.min_y,
            maxx = self.max_x,
            maxy = self.max_y,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum SpatialOp {
    /// True for rows whose geometry interacts with the bounding box. May be
    /// used as a sound pre-filter for any filter that contains it.
    Bbox {
        prop: PropertyName,
        envelope: Envelope,
    },

    /// True for rows whose geometry intersects the given geometry (modelled
    /// here by its envelope).
    Intersects {
        prop: PropertyName,
        envelope: Envelope,
    },
}

impl SpatialOp {
    pub fn prop(&self) -> &PropertyName {
        match self {
            SpatialOp::Bbox { prop, .. } | SpatialOp::Intersects { prop, .. } => prop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_covers_both() {
        let a = Envelope::new(0.0, 0.0, 2.0, 2.0);
        let b = Envelope::new(1.0, -1.0, 3.0, 1.0).with_srid(4326);
        let u = a.union(&b);
        assert_eq!((u.min_x, u.min_y, u.max_x, u.max_y), (0.0, -1.0, 3.0, 2.0));
        assert_eq!(u.srid, Some(4326));
    }

    #[test]
    fn wkt_ring_is_closed() {
        let wkt = Envelope::new(1.0, 2.0, 3.0, 4.0).to_wkt();
        assert_eq!(wkt, "POLYGON((1 2,3 2,3 4,1 4,1 2))");
    }
}
