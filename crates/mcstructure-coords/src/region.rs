use crate::Coordinate;

/// Inclusive axis-aligned box of cells.
///
/// Invariant: `min.x <= max.x`, `min.y <= max.y`, `min.z <= max.z`.
/// The constructor enforces this by sorting components, so the two corners may
/// be given in any order on any axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    pub min: Coordinate,
    pub max: Coordinate,
}

impl Region {
    /// Create a region from two corners.
    pub fn new(a: Coordinate, b: Coordinate) -> Self {
        Self {
            min: Coordinate::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Coordinate::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Returns true if the point lies inside or on the boundary.
    pub fn contains(&self, p: Coordinate) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Returns true if the point lies on a face of the region.
    ///
    /// Axes one cell thick do not form faces, so a flat `5x1x5` region has a
    /// 16-cell ring as its boundary. A single cell is its own boundary.
    pub fn is_on_boundary(&self, p: Coordinate) -> bool {
        let axes = [
            (p.x, self.min.x, self.max.x),
            (p.y, self.min.y, self.max.y),
            (p.z, self.min.z, self.max.z),
        ];
        let mut thick = axes.iter().filter(|(_, lo, hi)| lo != hi).peekable();
        if thick.peek().is_none() {
            return self.contains(p);
        }
        thick.any(|&(v, lo, hi)| v == lo || v == hi)
    }

    /// Number of cells in the region.
    pub fn volume(&self) -> usize {
        let dx = (self.max.x - self.min.x) as usize + 1;
        let dy = (self.max.y - self.min.y) as usize + 1;
        let dz = (self.max.z - self.min.z) as usize + 1;
        dx * dy * dz
    }

    /// Visits every cell exactly once, `z` fastest.
    pub fn iter(&self) -> RegionIter {
        RegionIter {
            region: *self,
            next: Some(self.min),
        }
    }
}

impl IntoIterator for Region {
    type Item = Coordinate;
    type IntoIter = RegionIter;

    fn into_iter(self) -> RegionIter {
        self.iter()
    }
}

/// Iterator over the cells of a [`Region`].
#[derive(Clone, Debug)]
pub struct RegionIter {
    region: Region,
    next: Option<Coordinate>,
}

impl Iterator for RegionIter {
    type Item = Coordinate;

    fn next(&mut self) -> Option<Coordinate> {
        let current = self.next?;
        let Region { min, max } = self.region;
        self.next = if current.z < max.z {
            Some(Coordinate::new(current.x, current.y, current.z + 1))
        } else if current.y < max.y {
            Some(Coordinate::new(current.x, current.y + 1, min.z))
        } else if current.x < max.x {
            Some(Coordinate::new(current.x + 1, min.y, min.z))
        } else {
            None
        };
        Some(current)
    }
}
