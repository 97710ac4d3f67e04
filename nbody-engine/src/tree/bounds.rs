// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Axis-aligned regions for octree subdivision

use crate::body::Body;
use crate::math::Vector3;

/// Axis-aligned box `[min, max]`
///
/// Regions are split at their center along every axis. They are not
/// forced to be cubes; `width` is the largest extent and is what the
/// opening criterion compares against distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    min: Vector3,
    max: Vector3,
    center: Vector3,
    width: f64,
}

impl Bounds {
    /// Create a region from its corners
    pub fn new(min: Vector3, max: Vector3) -> Self {
        let center = (min + max) * 0.5;
        let width = (max - min).max_component();
        Bounds { min, max, center, width }
    }

    /// Smallest region containing every body position
    ///
    /// Returns `None` for an empty slice.
    pub fn enclosing(bodies: &[Body]) -> Option<Self> {
        let first = bodies.first()?.position;
        let (min, max) = bodies
            .iter()
            .skip(1)
            .fold((first, first), |(min, max), body| {
                (min.min(&body.position), max.max(&body.position))
            });
        Some(Bounds::new(min, max))
    }

    /// Lower corner
    pub fn min(&self) -> Vector3 {
        self.min
    }

    /// Upper corner
    pub fn max(&self) -> Vector3 {
        self.max
    }

    /// Geometric center
    pub fn center(&self) -> Vector3 {
        self.center
    }

    /// Largest extent along any axis
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Check if `point` lies inside the closed region
    pub fn contains(&self, point: Vector3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Octant (0-7) that `point` falls into
    ///
    /// Bit 0 is x, bit 1 is y, bit 2 is z; a bit is set when the
    /// coordinate is at or above the center.
    pub fn octant(&self, point: &Vector3) -> usize {
        let mut index = 0;
        if point.x >= self.center.x {
            index |= 1;
        }
        if point.y >= self.center.y {
            index |= 2;
        }
        if point.z >= self.center.z {
            index |= 4;
        }
        index
    }

    /// Region covered by one octant
    pub fn subdivide(&self, octant: usize) -> Bounds {
        let pick = |bit: usize, low: f64, mid: f64, high: f64| {
            if octant & bit != 0 {
                (mid, high)
            } else {
                (low, mid)
            }
        };
        let (min_x, max_x) = pick(1, self.min.x, self.center.x, self.max.x);
        let (min_y, max_y) = pick(2, self.min.y, self.center.y, self.max.y);
        let (min_z, max_z) = pick(4, self.min.z, self.center.z, self.max.z);
        Bounds::new(
            Vector3::new(min_x, min_y, min_z),
            Vector3::new(max_x, max_y, max_z),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_and_width() {
        let b = Bounds::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(4.0, 2.0, 1.0));
        assert_eq!(b.center(), Vector3::new(2.0, 1.0, 0.5));
        assert_eq!(b.width(), 4.0);
    }

    #[test]
    fn test_octant_boundary_goes_high() {
        let b = Bounds::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(b.octant(&Vector3::zero()), 7);
        assert_eq!(b.octant(&Vector3::new(-0.5, -0.5, -0.5)), 0);
        assert_eq!(b.octant(&Vector3::new(0.5, -0.5, 0.5)), 5);
    }

    #[test]
    fn test_subdivide_contains_octant_points() {
        let b = Bounds::new(Vector3::new(-2.0, -2.0, -2.0), Vector3::new(2.0, 2.0, 2.0));
        let p = Vector3::new(-1.0, 1.5, 0.25);
        let child = b.subdivide(b.octant(&p));
        assert!(child.contains(p));
        assert!(!child.contains(Vector3::new(1.0, 1.5, 0.25)));
        assert_eq!(child.width(), 2.0);
    }

    #[test]
    fn test_enclosing() {
        let bodies = [
            Body::at_rest(1.0, Vector3::new(1.0, -3.0, 2.0)),
            Body::at_rest(1.0, Vector3::new(-2.0, 4.0, 0.0)),
        ];
        let b = Bounds::enclosing(&bodies).unwrap();
        assert_eq!(b.min(), Vector3::new(-2.0, -3.0, 0.0));
        assert_eq!(b.max(), Vector3::new(1.0, 4.0, 2.0));
        assert!(Bounds::enclosing(&[]).is_none());
    }
}
