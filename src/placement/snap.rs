//! Alignment snapping of a dragged rectangle against its neighbours, and the
//! guide lines derived from the final position.

use crate::widget::snap_with_grid;
use egui::{Pos2, Rect, pos2};

/// Alignment guides of the current drag, in form content coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Guides {
    /// x coordinates of vertical guide lines.
    pub vertical: Vec<f32>,
    /// y coordinates of horizontal guide lines.
    pub horizontal: Vec<f32>,
}

impl Guides {
    pub fn is_empty(&self) -> bool {
        self.vertical.is_empty() && self.horizontal.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertical.clear();
        self.horizontal.clear();
    }
}

/// One axis of a rectangle.
#[derive(Clone, Copy, Debug)]
struct Span {
    start: f32,
    len: f32,
}

impl Span {
    fn x(r: &Rect) -> Self {
        Span {
            start: r.min.x,
            len: r.width(),
        }
    }

    fn y(r: &Rect) -> Self {
        Span {
            start: r.min.y,
            len: r.height(),
        }
    }

    fn end(&self) -> f32 {
        self.start + self.len
    }

    fn center(&self) -> f32 {
        self.start + self.len / 2.0
    }

    /// `(own coordinate, neighbour coordinate, origin that aligns them)` in
    /// enumeration order: start/start, end/end, center/center, start/end, end/start.
    fn candidates(&self, other: &Span) -> [(f32, f32, f32); 5] {
        let len = self.len;
        [
            (self.start, other.start, other.start),
            (self.end(), other.end(), other.end() - len),
            (self.center(), other.center(), other.center() - len / 2.0),
            (self.start, other.end(), other.end()),
            (self.end(), other.start, other.start - len),
        ]
    }
}

/// Origin on one axis after snapping `own` to the closest neighbour candidate.
///
/// Only candidates strictly closer than `threshold` qualify. Among equally close
/// candidates the first one wins, scanning neighbours in form order and, for
/// each neighbour, candidates in [`Span::candidates`] order.
fn snap_axis(own: Span, others: impl Iterator<Item = Span>, threshold: f32) -> f32 {
    let mut best: Option<(f32, f32)> = None;
    for other in others {
        for (mine, theirs, origin) in own.candidates(&other) {
            let dist = (mine - theirs).abs();
            if dist < threshold && best.is_none_or(|(d, _)| dist < d) {
                best = Some((dist, origin));
            }
        }
    }
    best.map_or(own.start, |(_, origin)| origin)
}

/// Snaps the proposed rectangle's origin against `others`, then rounds it to
/// the grid.
pub fn align_snap(proposed: Rect, others: &[Rect], threshold: f32, grid: f32) -> Pos2 {
    let x = snap_axis(Span::x(&proposed), others.iter().map(Span::x), threshold);
    let y = snap_axis(Span::y(&proposed), others.iter().map(Span::y), threshold);
    pos2(snap_with_grid(x, grid), snap_with_grid(y, grid))
}

/// Guide coordinates where `rect` shares an edge or center with a neighbour.
pub fn derive_guides(rect: Rect, others: &[Rect], tolerance: f32) -> Guides {
    fn axis(own: Span, others: impl Iterator<Item = Span>, tolerance: f32) -> Vec<f32> {
        let mut out: Vec<f32> = others
            .flat_map(|other| own.candidates(&other))
            .filter(|(mine, theirs, _)| (mine - theirs).abs() <= tolerance)
            .map(|(_, theirs, _)| theirs)
            .collect();
        out.sort_by(f32::total_cmp);
        out.dedup();
        out
    }

    Guides {
        vertical: axis(Span::x(&rect), others.iter().map(Span::x), tolerance),
        horizontal: axis(Span::y(&rect), others.iter().map(Span::y), tolerance),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::vec2;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::from_min_size(pos2(x, y), vec2(w, h))
    }

    #[test]
    fn test_left_edge_snaps_to_neighbour_right_edge() {
        let a = rect(0.0, 0.0, 100.0, 30.0);
        let proposed = rect(104.0, 200.0, 80.0, 30.0);
        let snapped = align_snap(proposed, &[a], 6.0, 4.0);
        assert_eq!(snapped, pos2(100.0, 200.0));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let a = rect(0.0, 0.0, 100.0, 30.0);
        // Left edge 6 px from A's right edge: not snapped, only grid-rounded.
        let proposed = rect(106.0, 300.0, 80.0, 30.0);
        assert_eq!(align_snap(proposed, &[a], 6.0, 4.0), pos2(108.0, 300.0));
    }

    #[test]
    fn test_axes_snap_independently() {
        let a = rect(40.0, 40.0, 100.0, 32.0);
        // x: left 43 vs 40 (3 px); y: top 301 far from everything.
        let proposed = rect(43.0, 301.0, 60.0, 20.0);
        assert_eq!(align_snap(proposed, &[a], 6.0, 4.0), pos2(40.0, 300.0));
    }

    #[test]
    fn test_closest_candidate_wins() {
        let a = rect(0.0, 0.0, 100.0, 30.0);
        let b = rect(0.0, 100.0, 103.0, 30.0);
        // Left edge at 104: 4 px from A's right, 1 px from B's right.
        let proposed = rect(104.0, 300.0, 50.0, 20.0);
        assert_eq!(align_snap(proposed, &[a, b], 6.0, 1.0), pos2(103.0, 300.0));
    }

    #[test]
    fn test_tie_resolves_to_first_neighbour() {
        let a = rect(0.0, 0.0, 100.0, 30.0);
        let b = rect(0.0, 100.0, 108.0, 30.0);
        // Left edge at 104: exactly 4 px from both A's and B's right edges.
        let proposed = rect(104.0, 300.0, 50.0, 20.0);
        assert_eq!(align_snap(proposed, &[a, b], 6.0, 1.0), pos2(100.0, 300.0));
        assert_eq!(align_snap(proposed, &[b, a], 6.0, 1.0), pos2(108.0, 300.0));
    }

    #[test]
    fn test_center_alignment() {
        let a = rect(100.0, 0.0, 100.0, 30.0);
        // Center 152 vs A's center 150.
        let proposed = rect(132.0, 300.0, 40.0, 20.0);
        assert_eq!(align_snap(proposed, &[a], 6.0, 1.0), pos2(130.0, 300.0));
    }

    #[test]
    fn test_right_edge_to_neighbour_left_edge() {
        let a = rect(200.0, 0.0, 100.0, 30.0);
        // Right edge 197 vs A's left 200.
        let proposed = rect(147.0, 300.0, 50.0, 20.0);
        assert_eq!(align_snap(proposed, &[a], 6.0, 1.0), pos2(150.0, 300.0));
    }

    #[test]
    fn test_no_neighbours_only_rounds_to_grid() {
        let proposed = rect(13.0, 27.0, 50.0, 20.0);
        assert_eq!(align_snap(proposed, &[], 6.0, 4.0), pos2(12.0, 28.0));
    }

    #[test]
    fn test_guides_from_final_rect() {
        let a = rect(0.0, 0.0, 100.0, 30.0);
        let final_rect = rect(100.0, 0.0, 80.0, 30.0);
        let guides = derive_guides(final_rect, &[a], 1.0);
        // x: own left meets A's right. y: tops, bottoms and centers all align.
        assert_eq!(guides.vertical, vec![100.0]);
        assert_eq!(guides.horizontal, vec![0.0, 15.0, 30.0]);
    }

    #[test]
    fn test_guides_deduplicated_across_neighbours() {
        let a = rect(0.0, 0.0, 100.0, 30.0);
        let b = rect(0.0, 200.0, 100.0, 30.0);
        let final_rect = rect(0.0, 100.0, 100.0, 30.0);
        let guides = derive_guides(final_rect, &[a, b], 1.0);
        assert_eq!(guides.vertical, vec![0.0, 50.0, 100.0]);
        assert!(guides.horizontal.is_empty());
    }

    #[test]
    fn test_guides_empty_without_alignment() {
        let a = rect(0.0, 0.0, 100.0, 30.0);
        let guides = derive_guides(rect(203.0, 203.0, 10.0, 10.0), &[a], 1.0);
        assert!(guides.is_empty());
    }
}
