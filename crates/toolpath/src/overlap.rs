//! Perimeter-overlap detection and merging.
//!
//! A perimeter that crosses over itself or doubles back within an
//! extrusion width would deposit material twice. This pass finds segment
//! pairs that run antiparallel and close together, replaces each pair with
//! a single midline segment carrying a widened extrusion, and splits the
//! result into connected fragments.

use crate::path::PathAndWidth;
use geom::{make_close_segments_mergeable, points_to_segments, Point3};
use tracing::debug;

/// Per-segment annotation during the merge scan. Merged and removed are
/// mutually exclusive outcomes, so this is a tagged state rather than a
/// bitflag.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Altered {
    Untouched,
    Merged,
    Removed,
}

/// Rewrites the overlapping parts of a closed perimeter as single wider
/// extrusions.
///
/// Segment `i` matches a later segment `j` when `i.start` is within
/// `overlap_merge_um` of `j.end` and `i.end` is within it of `j.start`,
/// i.e. the path comes back over itself antiparallel. The pair collapses
/// to the midline, the merged segment's width is the smaller endpoint gap,
/// and the partner is dropped. Each segment takes at most one match.
///
/// Returns whether any merge occurred, plus the perimeter cut into
/// fragments wherever consecutive segments disconnect or change width.
/// Fragment widths are the segment width plus `overlap_merge_um`.
pub fn remove_perimeter_overlaps(
    perimeter: &[Point3],
    overlap_merge_um: i64,
) -> (bool, Vec<PathAndWidth>) {
    // Insert virtual vertices so near-parallel runs have pairwise matching
    // segments to merge.
    let mergeable = make_close_segments_mergeable(perimeter, overlap_merge_um);
    let mut segments = points_to_segments(&mergeable, true);
    let mut marks = vec![Altered::Untouched; segments.len()];
    let mut modified = false;

    for first in 0..segments.len() {
        if marks[first] != Altered::Untouched {
            continue;
        }
        for check in first + 1..segments.len() {
            // Each segment participates in at most one pairing.
            if marks[check] != Altered::Untouched {
                continue;
            }
            // The path coming back over itself pairs this start with the
            // later segment's end.
            let start_gap = (segments[first].start.xy() - segments[check].end.xy()).length();
            if start_gap >= overlap_merge_um {
                continue;
            }
            let end_gap = (segments[first].end.xy() - segments[check].start.xy()).length();
            if end_gap >= overlap_merge_um {
                continue;
            }

            segments[first].width_um = start_gap.min(end_gap);
            let merged_start = (segments[first].start + segments[check].end) / 2;
            let merged_end = (segments[first].end + segments[check].start) / 2;
            segments[first].start = merged_start;
            segments[first].end = merged_end;
            marks[first] = Altered::Merged;
            marks[check] = Altered::Removed;
            modified = true;
            break;
        }
    }

    for index in (0..segments.len()).rev() {
        if marks[index] == Altered::Removed {
            segments.remove(index);
        }
    }

    if modified {
        debug!(
            input_points = perimeter.len(),
            surviving_segments = segments.len(),
            "merged overlapping perimeter segments"
        );
    }

    // Cut the surviving segments into connected equal-width fragments.
    let mut fragments = Vec::new();
    let mut current = PathAndWidth::default();
    for index in 0..segments.len() {
        let segment = segments[index];
        current.path.push(segment.start);
        current.extrusion_width_um = segment.width_um + overlap_merge_um;
        let break_here = index + 1 < segments.len()
            && (segments[index + 1].start != segment.end
                || segments[index + 1].width_um != segment.width_um);
        if break_here {
            current.path.push(segment.end);
            fragments.push(std::mem::take(&mut current));
        }
    }
    if let Some(last) = segments.last() {
        current.path.push(last.end);
    }
    fragments.push(current);

    (modified, fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geom::Point3;

    fn thin_slot() -> Vec<Point3> {
        // A 10 mm long, 10 um tall slot: the top and bottom runs are
        // antiparallel and nearly coincident.
        vec![
            Point3::new(0, 0, 0),
            Point3::new(10_000, 0, 0),
            Point3::new(10_000, 10, 0),
            Point3::new(0, 10, 0),
        ]
    }

    #[test]
    fn slot_merges_to_midline() {
        let (modified, fragments) = remove_perimeter_overlaps(&thin_slot(), 100);
        assert!(modified);
        let merged = fragments
            .iter()
            .find(|fragment| fragment.extrusion_width_um == 110)
            .expect("merged fragment");
        assert_eq!(
            merged.path,
            vec![Point3::new(0, 5, 0), Point3::new(10_000, 5, 0)]
        );
        // the two short end caps survive unmerged at the base width
        assert_eq!(fragments.len(), 3);
        for fragment in fragments.iter().filter(|f| f.extrusion_width_um == 100) {
            assert_eq!(fragment.path.len(), 2);
        }
    }

    #[test]
    fn square_is_returned_as_one_fragment() {
        let square = vec![
            Point3::new(0, 0, 0),
            Point3::new(10_000, 0, 0),
            Point3::new(10_000, 10_000, 0),
            Point3::new(0, 10_000, 0),
        ];
        let (modified, fragments) = remove_perimeter_overlaps(&square, 100);
        assert!(!modified);
        assert_eq!(fragments.len(), 1);
        // the single fragment closes back on the start point
        assert_eq!(fragments[0].path.len(), square.len() + 1);
        assert_eq!(fragments[0].path.first(), fragments[0].path.last());
        assert_eq!(fragments[0].extrusion_width_um, 100);
    }

    #[test]
    fn rerunning_on_clean_input_reports_no_merge() {
        let square = vec![
            Point3::new(0, 0, 0),
            Point3::new(20_000, 0, 0),
            Point3::new(20_000, 20_000, 0),
            Point3::new(0, 20_000, 0),
        ];
        let (first, _) = remove_perimeter_overlaps(&square, 400);
        let (second, fragments) = remove_perimeter_overlaps(&square, 400);
        assert!(!first);
        assert!(!second);
        assert_eq!(fragments.len(), 1);
    }
}
