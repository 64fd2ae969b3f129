use serde::{Deserialize, Serialize};

/// Integer pixel coordinate in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: Point) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        dx * dx + dy * dy
    }

    /// Truncated Euclidean distance, matching the integer costs used by the
    /// walk planner.
    pub fn distance(&self, other: Point) -> i32 {
        (self.distance_squared(other) as f32).sqrt() as i32
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i32; 2] {
    fn from(point: Point) -> Self {
        [point.x, point.y]
    }
}

/// Axis-aligned rectangle with an exclusive right/bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub const fn contains(&self, point: Point) -> bool {
        self.x <= point.x && point.x < self.right() && self.y <= point.y && point.y < self.bottom()
    }

    pub const fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Overlapping region of both rectangles, `None` when they only touch or
    /// are disjoint.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        let rect = Rect::new(left, top, right - left, bottom - top);
        if rect.is_empty() { None } else { Some(rect) }
    }

    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            i64::from(self.width) * i64::from(self.height)
        }
    }
}

impl From<[i32; 4]> for Rect {
    fn from([x, y, width, height]: [i32; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<Rect> for [i32; 4] {
    fn from(rect: Rect) -> Self {
        [rect.x, rect.y, rect.width, rect.height]
    }
}

/// Removes `minuend` from `subtrahend`, returning the parts of `subtrahend`
/// left over.
///
/// The remainder is emitted as up to four strips in the fixed order top,
/// left, right, bottom; empty strips are skipped. When the rectangles do not
/// overlap the subtrahend comes back unchanged.
pub fn rect_subtract(minuend: &Rect, subtrahend: &Rect) -> Vec<Rect> {
    let Some(hole) = minuend.intersect(subtrahend) else {
        return vec![*subtrahend];
    };

    let candidates = [
        Rect::new(
            subtrahend.x,
            subtrahend.y,
            subtrahend.width,
            hole.y - subtrahend.y,
        ),
        Rect::new(subtrahend.x, hole.y, hole.x - subtrahend.x, hole.height),
        Rect::new(
            hole.right(),
            hole.y,
            subtrahend.right() - hole.right(),
            hole.height,
        ),
        Rect::new(
            subtrahend.x,
            hole.bottom(),
            subtrahend.width,
            subtrahend.bottom() - hole.bottom(),
        ),
    ];

    candidates
        .into_iter()
        .filter(|rect| !rect.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered(rects: &[Rect], point: Point) -> usize {
        rects.iter().filter(|rect| rect.contains(point)).count()
    }

    #[test]
    fn disjoint_subtraction_returns_subtrahend() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 20, 5, 5);
        assert_eq!(rect_subtract(&a, &b), vec![b]);

        // Touching edges do not intersect.
        let c = Rect::new(10, 0, 10, 10);
        assert_eq!(rect_subtract(&a, &c), vec![c]);
    }

    #[test]
    fn centered_hole_yields_four_strips_in_order() {
        let hole = Rect::new(4, 4, 2, 2);
        let area = Rect::new(0, 0, 10, 10);
        let parts = rect_subtract(&hole, &area);
        assert_eq!(
            parts,
            vec![
                Rect::new(0, 0, 10, 4),
                Rect::new(0, 4, 4, 2),
                Rect::new(6, 4, 4, 2),
                Rect::new(0, 6, 10, 4),
            ]
        );
    }

    #[test]
    fn full_cover_leaves_nothing() {
        let area = Rect::new(5, 5, 10, 10);
        let cover = Rect::new(0, 0, 30, 30);
        assert!(rect_subtract(&cover, &area).is_empty());
    }

    #[test]
    fn remainder_tiles_subtrahend_outside_the_hole() {
        let subtrahend = Rect::new(-3, 2, 17, 11);
        let minuends = [
            Rect::new(0, 0, 5, 5),
            Rect::new(10, 8, 20, 3),
            Rect::new(-10, 4, 8, 40),
            Rect::new(2, 5, 3, 3),
        ];
        for minuend in minuends {
            let parts = rect_subtract(&minuend, &subtrahend);
            for y in subtrahend.y..subtrahend.bottom() {
                for x in subtrahend.x..subtrahend.right() {
                    let point = Point::new(x, y);
                    let expected = usize::from(!minuend.contains(point));
                    assert_eq!(
                        covered(&parts, point),
                        expected,
                        "point {point:?} covered wrongly for minuend {minuend:?}"
                    );
                }
            }
            assert!(parts.iter().all(|part| !part.is_empty()));
        }
    }

    #[test]
    fn contains_uses_exclusive_far_edges() {
        let rect = Rect::new(0, 0, 100, 50);
        assert!(rect.contains(Point::new(0, 0)));
        assert!(rect.contains(Point::new(99, 49)));
        assert!(!rect.contains(Point::new(100, 10)));
        assert!(!rect.contains(Point::new(10, 50)));
        assert!(!Rect::new(3, 3, 0, 4).contains(Point::new(3, 3)));
    }

    #[test]
    fn serde_uses_compact_arrays() {
        let rect: Rect = serde_json::from_str("[1, 2, 3, 4]").expect("rect");
        assert_eq!(rect, Rect::new(1, 2, 3, 4));
        let point: Point = serde_json::from_str("[7, -8]").expect("point");
        assert_eq!(point, Point::new(7, -8));
        assert_eq!(Point::new(0, 0).distance(Point::new(3, 4)), 5);
    }
}
