use glam::{Mat4, Vec3};

/// Axis-aligned bounding box.
///
/// Invariant: `min` is component-wise less than or equal to `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box from two corners, ordered per axis.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let he = half_extents.abs();
        Self {
            min: center - he,
            max: center + he,
        }
    }

    /// Smallest box containing every point, or `None` for an empty set.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self { min: first, max: first }, |acc, p| Self {
            min: acc.min.min(p),
            max: acc.max.max(p),
        }))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Inclusive overlap test: per-axis center distance against the sum of
    /// half-extents plus `epsilon`. Touching boxes intersect.
    pub fn intersects(&self, other: &Self, epsilon: f32) -> bool {
        let distance = (self.center() - other.center()).abs();
        let reach = self.half_extents() + other.half_extents() + Vec3::splat(epsilon);
        distance.cmple(reach).all()
    }

    pub fn contains_point(&self, p: Vec3, epsilon: f32) -> bool {
        let e = Vec3::splat(epsilon);
        p.cmpge(self.min - e).all() && p.cmple(self.max + e).all()
    }

    /// Whether `other` lies entirely inside this box.
    pub fn contains(&self, other: &Self) -> bool {
        other.min.cmpge(self.min).all() && other.max.cmple(self.max).all()
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn inflate(&self, margin: f32) -> Self {
        let m = Vec3::splat(margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Region shared by two intersecting boxes.
    ///
    /// On each axis the four bounds are sorted and the middle pair is taken.
    /// For disjoint boxes this yields the gap between them instead.
    pub fn overlap(&self, other: &Self) -> Self {
        let mut min = [0.0f32; 3];
        let mut max = [0.0f32; 3];
        for axis in 0..3 {
            let mut bounds = [
                self.min[axis],
                self.max[axis],
                other.min[axis],
                other.max[axis],
            ];
            bounds.sort_by(f32::total_cmp);
            min[axis] = bounds[1];
            max[axis] = bounds[2];
        }
        Self {
            min: Vec3::from_array(min),
            max: Vec3::from_array(max),
        }
    }

    /// One of the eight equal sub-boxes split at the center.
    /// Bit 0 of `index` selects +X, bit 1 +Y, bit 2 +Z.
    pub fn octant(&self, index: usize) -> Self {
        let c = self.center();
        let pick = |bit: usize, axis: usize| {
            if index & bit != 0 {
                (c[axis], self.max[axis])
            } else {
                (self.min[axis], c[axis])
            }
        };
        let (x0, x1) = pick(1, 0);
        let (y0, y1) = pick(2, 1);
        let (z0, z1) = pick(4, 2);
        Self {
            min: Vec3::new(x0, y0, z0),
            max: Vec3::new(x1, y1, z1),
        }
    }

    /// Bounds of this box after an affine transform, from its eight corners.
    pub fn transformed(&self, mat: &Mat4) -> Self {
        let mut out = Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        };
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 != 0 { self.max.x } else { self.min.x },
                if i & 2 != 0 { self.max.y } else { self.min.y },
                if i & 4 != 0 { self.max.z } else { self.min.z },
            );
            let p = mat.transform_point3(corner);
            out.min = out.min.min(p);
            out.max = out.max.max(p);
        }
        out
    }
}
