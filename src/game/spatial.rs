//! Spatial hash grid over trail segments
//!
//! Each segment is inserted into every cell its bounding box touches,
//! expanded by the query radius. A point query then only has to look at the
//! single cell containing the point.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::util::vec2::Vec2;

/// Initial capacity for grid cells (number of expected non-empty cells)
const GRID_INITIAL_CAPACITY: usize = 512;

/// Segments whose expanded box covers more cells than this go to a side list
/// checked by every query (authoritative teleports can produce these).
const MAX_CELLS_PER_SEGMENT: i64 = 256;

/// Grid cell key - (x, y) cell coordinates
pub type CellKey = (i32, i32);

/// One trail segment as seen by the broad phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentRef {
    /// Index of the owning agent in registration order
    pub owner: usize,
    /// Index of the segment within the owner's polyline (segment i joins points i, i+1)
    pub index: usize,
    pub a: Vec2,
    pub b: Vec2,
}

/// Segment grid rebuilt once per tick
#[derive(Debug)]
pub struct SegmentGrid {
    inv_cell_size: f32,
    /// Expansion applied to every inserted segment's box
    padding: f32,
    cells: FxHashMap<CellKey, SmallVec<[SegmentRef; 8]>>,
    oversized: Vec<SegmentRef>,
    len: usize,
}

impl SegmentGrid {
    pub fn new(cell_size: f32, padding: f32) -> Self {
        let mut cells = FxHashMap::default();
        cells.reserve(GRID_INITIAL_CAPACITY);
        Self {
            inv_cell_size: 1.0 / cell_size,
            padding,
            cells,
            oversized: Vec::new(),
            len: 0,
        }
    }

    /// Clear all segments, keeping allocations
    pub fn clear(&mut self) {
        for cell in self.cells.values_mut() {
            cell.clear();
        }
        self.oversized.clear();
        self.len = 0;
    }

    #[inline]
    fn cell_of(&self, x: f32, y: f32) -> CellKey {
        (
            (x * self.inv_cell_size).floor() as i32,
            (y * self.inv_cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, segment: SegmentRef) {
        let min = segment.a.min(segment.b);
        let max = segment.a.max(segment.b);
        let (x0, y0) = self.cell_of(min.x - self.padding, min.y - self.padding);
        let (x1, y1) = self.cell_of(max.x + self.padding, max.y + self.padding);

        let span = (x1 as i64 - x0 as i64 + 1) * (y1 as i64 - y0 as i64 + 1);
        self.len += 1;
        if span > MAX_CELLS_PER_SEGMENT {
            self.oversized.push(segment);
            return;
        }

        for cx in x0..=x1 {
            for cy in y0..=y1 {
                self.cells.entry((cx, cy)).or_default().push(segment);
            }
        }
    }

    /// Segments whose padded box contains `point`
    pub fn query_point(&self, point: Vec2) -> impl Iterator<Item = &SegmentRef> {
        let key = self.cell_of(point.x, point.y);
        self.cells
            .get(&key)
            .into_iter()
            .flat_map(|cell| cell.iter())
            .chain(self.oversized.iter())
    }

    /// Number of segments inserted since the last clear
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(owner: usize, a: (f32, f32), b: (f32, f32)) -> SegmentRef {
        SegmentRef {
            owner,
            index: 0,
            a: Vec2::new(a.0, a.1),
            b: Vec2::new(b.0, b.1),
        }
    }

    #[test]
    fn test_query_finds_segment_near_point() {
        let mut grid = SegmentGrid::new(64.0, 12.0);
        grid.insert(seg(0, (0.0, 0.0), (100.0, 0.0)));
        grid.insert(seg(1, (1_000.0, 1_000.0), (1_010.0, 1_000.0)));

        let hits: Vec<_> = grid.query_point(Vec2::new(50.0, 5.0)).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].owner, 0);
    }

    #[test]
    fn test_padding_reaches_across_cell_border() {
        let mut grid = SegmentGrid::new(64.0, 12.0);
        // Segment sits at y = 60, query point at y = 70 lies in the next cell row
        grid.insert(seg(0, (10.0, 60.0), (20.0, 60.0)));
        assert_eq!(grid.query_point(Vec2::new(15.0, 70.0)).count(), 1);
    }

    #[test]
    fn test_far_point_sees_nothing() {
        let mut grid = SegmentGrid::new(64.0, 12.0);
        grid.insert(seg(0, (0.0, 0.0), (10.0, 0.0)));
        assert_eq!(grid.query_point(Vec2::new(500.0, 500.0)).count(), 0);
    }

    #[test]
    fn test_oversized_segment_always_returned() {
        let mut grid = SegmentGrid::new(64.0, 12.0);
        grid.insert(seg(3, (-4_000.0, -3_000.0), (4_000.0, 3_000.0)));
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.query_point(Vec2::new(-3_999.0, 2_999.0)).count(), 1);
    }

    #[test]
    fn test_clear() {
        let mut grid = SegmentGrid::new(64.0, 12.0);
        grid.insert(seg(0, (0.0, 0.0), (10.0, 0.0)));
        grid.clear();
        assert!(grid.is_empty());
        assert_eq!(grid.query_point(Vec2::new(5.0, 0.0)).count(), 0);
    }
}
