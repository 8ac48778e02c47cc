use crate::models::BoundingBox;

/// Suppresses viewport refreshes for negligible pans and zooms.
///
/// Compares against the last box a refresh was actually issued for.
#[derive(Debug, Clone)]
pub struct ViewportFilter {
    epsilon: f64,
    last: Option<BoundingBox>,
}

impl ViewportFilter {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            last: None,
        }
    }

    /// True if there is no previous box or any edge moved more than epsilon.
    pub fn should_refresh(&self, bbox: &BoundingBox) -> bool {
        match &self.last {
            None => true,
            Some(last) => bbox.differs_from(last, self.epsilon),
        }
    }

    /// Remember `bbox` as the last-used box.
    pub fn record(&mut self, bbox: BoundingBox) {
        self.last = Some(bbox);
    }

    /// Check and record in one step. Returns whether a refresh is due.
    pub fn admit(&mut self, bbox: BoundingBox) -> bool {
        if self.should_refresh(&bbox) {
            self.record(bbox);
            true
        } else {
            false
        }
    }

    pub fn last(&self) -> Option<&BoundingBox> {
        self.last.as_ref()
    }

    /// Undo the admission of `bbox`, restoring `previous` as the last box.
    /// No-op if another box was admitted since.
    pub fn forget(&mut self, bbox: &BoundingBox, previous: Option<BoundingBox>) {
        if self.last.as_ref() == Some(bbox) {
            self.last = previous;
        }
    }
}
