//! Live ranges over linear program points
//!
//! A live range is a set of half-open segments `[start, end)`. Segments are
//! kept sorted, disjoint and non-adjacent so that overlap queries are a single
//! merge-style walk over both ranges.

use std::fmt;

/// Half-open interval of program points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    pub start: u32,
    pub end: u32,
}

impl Segment {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn overlaps(&self, other: &Segment) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Set of program points where a register's value must be preserved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveRange {
    segments: Vec<Segment>,
}

impl LiveRange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-segment range `[start, end)`
    pub fn from_interval(start: u32, end: u32) -> Self {
        let mut range = Self::new();
        range.add_segment(start, end);
        range
    }

    pub fn from_segments(segments: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut range = Self::new();
        for (start, end) in segments {
            range.add_segment(start, end);
        }
        range
    }

    /// Add `[start, end)`, merging with any segment it touches
    pub fn add_segment(&mut self, start: u32, end: u32) {
        let seg = Segment::new(start, end);
        if seg.is_empty() {
            return;
        }

        // First segment that ends at or after the new start can merge with it.
        let first = self.segments.partition_point(|s| s.end < seg.start);
        let mut merged = seg;
        let mut last = first;
        while last < self.segments.len() && self.segments[last].start <= merged.end {
            merged.start = merged.start.min(self.segments[last].start);
            merged.end = merged.end.max(self.segments[last].end);
            last += 1;
        }
        self.segments.splice(first..last, std::iter::once(merged));
    }

    /// Union `other` into this range
    pub fn merge(&mut self, other: &LiveRange) {
        for seg in &other.segments {
            self.add_segment(seg.start, seg.end);
        }
    }

    pub fn overlaps(&self, other: &LiveRange) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.segments.len() && j < other.segments.len() {
            let a = &self.segments[i];
            let b = &other.segments[j];
            if a.overlaps(b) {
                return true;
            }
            if a.end <= b.start {
                i += 1;
            } else {
                j += 1;
            }
        }
        false
    }

    pub fn contains(&self, point: u32) -> bool {
        let idx = self.segments.partition_point(|s| s.end <= point);
        self.segments
            .get(idx)
            .map(|s| s.start <= point)
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn start(&self) -> Option<u32> {
        self.segments.first().map(|s| s.start)
    }

    pub fn end(&self) -> Option<u32> {
        self.segments.last().map(|s| s.end)
    }

    /// Number of program points covered
    pub fn len(&self) -> u32 {
        self.segments.iter().map(|s| s.end - s.start).sum()
    }
}

impl fmt::Display for LiveRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "EMPTY");
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "[{},{})", seg.start, seg.end)?;
        }
        Ok(())
    }
}
