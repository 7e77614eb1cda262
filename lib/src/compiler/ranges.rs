/// Largest code point.
pub(crate) const MAX_CHAR: u32 = char::MAX as u32;

/// A set of code points, stored as a sorted list of disjoint, non-adjacent
/// inclusive ranges.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub(crate) struct RangeSet {
    ranges: Vec<(u32, u32)>,
}

impl RangeSet {
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Set with every code point.
    pub fn universal() -> Self {
        Self { ranges: vec![(0, MAX_CHAR)] }
    }

    /// Adds `min..=max` to the set if `include` is true, or removes it
    /// otherwise.
    #[inline]
    pub fn include(&mut self, min: u32, max: u32, include: bool) {
        if include {
            self.merge(min, max)
        } else {
            self.remove(min, max)
        }
    }

    /// Adds `min..=max` to the set, coalescing it with any range that it
    /// overlaps or touches.
    pub fn merge(&mut self, mut min: u32, mut max: u32) {
        debug_assert!(min <= max);

        // First range that ends at `min - 1` or later, which is the first
        // one that could be coalesced with the new one.
        let first = self
            .ranges
            .partition_point(|(_, hi)| hi.saturating_add(1) < min);

        let mut last = first;

        while let Some((lo, hi)) = self.ranges.get(last) {
            if *lo > max.saturating_add(1) {
                break;
            }
            min = min.min(*lo);
            max = max.max(*hi);
            last += 1;
        }

        self.ranges.splice(first..last, [(min, max)]);
    }

    /// Removes `min..=max` from the set, splitting any range that contains
    /// it.
    pub fn remove(&mut self, min: u32, max: u32) {
        debug_assert!(min <= max);

        let mut result = Vec::with_capacity(self.ranges.len() + 1);

        for (lo, hi) in self.ranges.drain(..) {
            if hi < min || lo > max {
                result.push((lo, hi));
                continue;
            }
            if lo < min {
                result.push((lo, min - 1));
            }
            if hi > max {
                result.push((max + 1, hi));
            }
        }

        self.ranges = result;
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn ranges(&self) -> &[(u32, u32)] {
        self.ranges.as_slice()
    }
}
