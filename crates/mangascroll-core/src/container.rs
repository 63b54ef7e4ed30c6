//! Scroll container seam.
//!
//! The engine never owns real layout. Hosts implement `ScrollContainer` over
//! whatever element wraps the embedded page; `SimulatedContainer` stands in for
//! it in the headless reader and in tests.

use crate::session::sanitize;

/// One fresh read of the container's geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub offset: f64,
    pub scrollable_extent: f64,
    pub view_extent: f64,
}

impl ScrollMetrics {
    /// Reported scrollable range. May be zero or negative for cross-origin content.
    pub fn limit(&self) -> f64 {
        self.scrollable_extent - self.view_extent
    }
}

pub trait ScrollContainer {
    fn metrics(&self) -> ScrollMetrics;

    /// Write a new offset. Implementations clamp to whatever range the
    /// underlying element really allows.
    fn set_offset(&mut self, offset: f64);
}

/// In-memory container whose reported extent can differ from the range it
/// actually scrolls, mimicking an embedded page that hides its height.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedContainer {
    offset: f64,
    true_limit: f64,
    reported_scrollable_extent: f64,
    view_extent: f64,
    writes: usize,
}

impl SimulatedContainer {
    /// Container that reports its dimensions faithfully.
    pub fn reliable(scrollable_extent: f64, view_extent: f64) -> Self {
        let scrollable_extent = sanitize(scrollable_extent).max(0.0);
        let view_extent = sanitize(view_extent).max(0.0);
        SimulatedContainer {
            offset: 0.0,
            true_limit: (scrollable_extent - view_extent).max(0.0),
            reported_scrollable_extent: scrollable_extent,
            view_extent,
            writes: 0,
        }
    }

    /// Container that scrolls `true_scrollable_extent` but reports its
    /// scrollable extent as equal to the view.
    pub fn unreliable(true_scrollable_extent: f64, view_extent: f64) -> Self {
        let mut container = Self::reliable(true_scrollable_extent, view_extent);
        container.reported_scrollable_extent = container.view_extent;
        container
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = sanitize(offset).clamp(0.0, self.true_limit);
        self
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn true_limit(&self) -> f64 {
        self.true_limit
    }

    /// Number of offset writes performed so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Swap in new content geometry, as when a page finishes lazy-loading images.
    pub fn resize(&mut self, scrollable_extent: f64, view_extent: f64, reliable: bool) {
        let resized = if reliable {
            Self::reliable(scrollable_extent, view_extent)
        } else {
            Self::unreliable(scrollable_extent, view_extent)
        };
        self.true_limit = resized.true_limit;
        self.reported_scrollable_extent = resized.reported_scrollable_extent;
        self.view_extent = resized.view_extent;
        self.offset = self.offset.clamp(0.0, self.true_limit);
    }
}

impl ScrollContainer for SimulatedContainer {
    fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            offset: self.offset,
            scrollable_extent: self.reported_scrollable_extent,
            view_extent: self.view_extent,
        }
    }

    fn set_offset(&mut self, offset: f64) {
        self.writes += 1;
        self.offset = sanitize(offset).clamp(0.0, self.true_limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_clamp_to_true_range() {
        let mut container = SimulatedContainer::reliable(1000.0, 500.0);
        container.set_offset(720.0);
        assert_eq!(container.offset(), 500.0);
        container.set_offset(-3.0);
        assert_eq!(container.offset(), 0.0);
        assert_eq!(container.writes(), 2);
    }

    #[test]
    fn unreliable_container_hides_its_extent() {
        let container = SimulatedContainer::unreliable(4000.0, 600.0);
        assert_eq!(container.metrics().limit(), 0.0);
        assert_eq!(container.true_limit(), 3400.0);
    }
}
