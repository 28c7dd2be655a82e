//! Render sync: rope state → ordered polyline.

use super::chain::Rope;
use bevy::prelude::*;

/// Points to draw for one rope: anchor, every active segment from the anchor
/// end to the body end, then the moving body.
///
/// Republished every fixed tick after the growth/shrink step.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct RopePolyline {
    pub points: Vec<Vec2>,
}

impl RopePolyline {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Rope {
    /// Rewrite `out` with the rope's polyline, reusing its allocation.
    ///
    /// Returns `false` and leaves `out` untouched when there is no moving body
    /// to end the line at.
    pub fn write_polyline(&self, body: Option<Vec2>, out: &mut Vec<Vec2>) -> bool {
        let Some(body) = body else {
            return false;
        };
        out.clear();
        out.reserve(self.len() + 2);
        out.push(self.anchor().position);
        out.extend(self.segments().map(|s| s.position()));
        out.push(body);
        true
    }
}
