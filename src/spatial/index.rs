use crate::{
    core::geo::{LatLng, LatLngBounds},
    model::report::Report,
};

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A report position stored in the R-tree, as `[lng, lat]`
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedReport {
    pub id: String,
    pub position: LatLng,
    /// Position of the report in the slice the index was built from
    pub slot: usize,
}

impl IndexedReport {
    fn coords(&self) -> [f64; 2] {
        [self.position.lng, self.position.lat]
    }
}

// --- rstar integration -------------------------------------------------------------------------

impl RTreeObject for IndexedReport {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.coords())
    }
}

impl PointDistance for IndexedReport {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let [x, y] = self.coords();
        let dx = x - point[0];
        let dy = y - point[1];
        dx * dx + dy * dy
    }
}

/// A nearby report with its great-circle distance in metres
#[derive(Debug, Clone, PartialEq)]
pub struct Nearby<'a> {
    pub report: &'a IndexedReport,
    pub distance_m: f64,
}

/// R-tree over report positions, rebuilt from a store snapshot
pub struct ReportIndex {
    rtree: RTree<IndexedReport>,
}

impl ReportIndex {
    /// Bulk-load positions of `reports`
    pub fn build(reports: &[Report]) -> Self {
        let items = reports
            .iter()
            .enumerate()
            .map(|(slot, r)| IndexedReport {
                id: r.id.clone(),
                position: r.position(),
                slot,
            })
            .collect();
        Self {
            rtree: RTree::bulk_load(items),
        }
    }

    /// Reports inside `bounds`, in slot order
    pub fn within(&self, bounds: &LatLngBounds) -> Vec<&IndexedReport> {
        let envelope = AABB::from_corners(
            [bounds.south_west.lng, bounds.south_west.lat],
            [bounds.north_east.lng, bounds.north_east.lat],
        );
        let mut hits: Vec<_> = self.rtree.locate_in_envelope(&envelope).collect();
        hits.sort_by_key(|item| item.slot);
        hits
    }

    /// Up to `limit` reports closest to `center`.
    ///
    /// Candidates come from the planar degree metric of the tree, which
    /// orders points like great-circle distance at street and city scale.
    pub fn nearest(&self, center: LatLng, limit: usize) -> Vec<Nearby<'_>> {
        self.rtree
            .nearest_neighbor_iter(&[center.lng, center.lat])
            .take(limit)
            .map(|item| Nearby {
                report: item,
                distance_m: center.distance_to(&item.position),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }
}
