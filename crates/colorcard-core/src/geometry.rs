use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Four ordered integer image points describing a card region.
///
/// The quad is not necessarily axis-aligned; downstream sampling only uses
/// its axis-aligned bounding rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quad {
    pub points: [Point2<i32>; 4],
}

impl Quad {
    pub fn new(points: [Point2<i32>; 4]) -> Self {
        Self { points }
    }

    pub fn from_xy(xy: [[i32; 2]; 4]) -> Self {
        Self::new(xy.map(|[x, y]| Point2::new(x, y)))
    }

    /// Axis-aligned quad covering `rect` (clockwise from top-left).
    pub fn from_rect(rect: PixelRect) -> Self {
        Self::from_xy([
            [rect.x0, rect.y0],
            [rect.x1, rect.y0],
            [rect.x1, rect.y1],
            [rect.x0, rect.y1],
        ])
    }

    /// Mean of the four y-coordinates.
    pub fn mean_y(&self) -> f64 {
        self.points.iter().map(|p| p.y as f64).sum::<f64>() / 4.0
    }

    /// Absolute polygon area (shoelace).
    pub fn area(&self) -> f64 {
        let mut twice = 0i64;
        for k in 0..4 {
            let a = self.points[k];
            let b = self.points[(k + 1) % 4];
            twice += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
        }
        (twice as f64 / 2.0).abs()
    }

    /// A quad is usable when it is simple (edges `0-1`/`2-3` and `1-2`/`3-0`
    /// do not cross) and encloses positive area.
    pub fn is_valid(&self) -> bool {
        let p = &self.points;
        self.area() > 0.0
            && !segments_cross(p[0], p[1], p[2], p[3])
            && !segments_cross(p[1], p[2], p[3], p[0])
    }

    /// Axis-aligned bounding rectangle; `x1`/`y1` are the max coordinates.
    pub fn bounding_rect(&self) -> PixelRect {
        let mut r = PixelRect {
            x0: i32::MAX,
            y0: i32::MAX,
            x1: i32::MIN,
            y1: i32::MIN,
        };
        for p in &self.points {
            r.x0 = r.x0.min(p.x);
            r.y0 = r.y0.min(p.y);
            r.x1 = r.x1.max(p.x);
            r.y1 = r.y1.max(p.y);
        }
        r
    }

    /// Rescale every point by `(sx, sy)`, truncating toward zero.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self::new(
            self.points
                .map(|p| Point2::new((p.x as f64 * sx) as i32, (p.y as f64 * sy) as i32)),
        )
    }
}

fn orient(a: Point2<i32>, b: Point2<i32>, c: Point2<i32>) -> i64 {
    (b.x - a.x) as i64 * (c.y - a.y) as i64 - (b.y - a.y) as i64 * (c.x - a.x) as i64
}

fn segments_cross(a: Point2<i32>, b: Point2<i32>, c: Point2<i32>, d: Point2<i32>) -> bool {
    let o1 = orient(a, b, c).signum();
    let o2 = orient(a, b, d).signum();
    let o3 = orient(c, d, a).signum();
    let o4 = orient(c, d, b).signum();
    o1 * o2 < 0 && o3 * o4 < 0
}

/// Half-open integer rectangle `[x0, x1) × [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl PixelRect {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Pixel count, zero for empty rectangles.
    pub fn area(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.width() as usize * self.height() as usize
        }
    }

    pub fn contains(&self, other: &PixelRect) -> bool {
        other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }

    /// Intersect with `[0, width) × [0, height)`.
    pub fn clamped(&self, width: usize, height: usize) -> Self {
        let w = width as i32;
        let h = height as i32;
        Self {
            x0: self.x0.clamp(0, w),
            y0: self.y0.clamp(0, h),
            x1: self.x1.clamp(0, w),
            y1: self.y1.clamp(0, h),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shoelace_area_ignores_winding() {
        let cw = Quad::from_xy([[0, 0], [10, 0], [10, 5], [0, 5]]);
        let ccw = Quad::from_xy([[0, 0], [0, 5], [10, 5], [10, 0]]);
        assert_eq!(cw.area(), 50.0);
        assert_eq!(ccw.area(), 50.0);
        assert!(cw.is_valid());
        assert!(ccw.is_valid());
    }

    #[test]
    fn bow_tie_and_collapsed_quads_are_invalid() {
        let bow_tie = Quad::from_xy([[0, 0], [10, 10], [10, 0], [0, 10]]);
        assert!(!bow_tie.is_valid());

        let line = Quad::from_xy([[0, 0], [5, 0], [10, 0], [3, 0]]);
        assert!(!line.is_valid());
    }

    #[test]
    fn bounding_rect_of_rotated_quad() {
        let q = Quad::from_xy([[5, 0], [10, 5], [5, 10], [0, 5]]);
        assert_eq!(q.bounding_rect(), PixelRect::new(0, 0, 10, 10));
        assert_eq!(q.mean_y(), 5.0);
    }

    #[test]
    fn clamping_keeps_rect_inside_image() {
        let r = PixelRect::new(-3, 2, 120, 40).clamped(100, 30);
        assert_eq!(r, PixelRect::new(0, 2, 100, 30));
        assert!(PixelRect::new(5, 5, 5, 9).is_empty());
        assert_eq!(PixelRect::new(5, 5, 5, 9).area(), 0);
    }

    #[test]
    fn scaling_truncates() {
        let q = Quad::from_xy([[1, 1], [3, 1], [3, 3], [1, 3]]).scaled(2.5, 1.5);
        assert_eq!(q.points[0], Point2::new(2, 1));
        assert_eq!(q.points[2], Point2::new(7, 4));
    }
}
