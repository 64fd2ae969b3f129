use bbvs_formats::{rect_subtract, Point, Rect};

use crate::state::{WALK_AREAS_CAPACITY, WALK_AREA_LINKS_CAPACITY, WALK_INFOS_CAPACITY};

/// Orientation of the edge shared by two walk areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalDirection {
    /// Areas are stacked; the edge is horizontal and its span runs along x.
    Horizontal,
    /// Areas sit side by side; the edge is vertical and its span runs along y.
    Vertical,
}

/// One side of a portal between two walk areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkInfo {
    pub x: i32,
    pub y: i32,
    pub delta: i32,
    pub direction: PortalDirection,
    pub mid_pt: Point,
    /// Area on whose side of the edge this record lies.
    pub walk_area_index: usize,
}

impl WalkInfo {
    fn new(x: i32, y: i32, delta: i32, direction: PortalDirection, walk_area_index: usize) -> Self {
        let mid_pt = match direction {
            PortalDirection::Horizontal => Point::new(x + delta / 2, y),
            PortalDirection::Vertical => Point::new(x, y + delta / 2),
        };
        Self {
            x,
            y,
            delta,
            direction,
            mid_pt,
            walk_area_index,
        }
    }

    pub fn start_point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Last pixel covered by the span.
    pub fn end_point(&self) -> Point {
        match self.direction {
            PortalDirection::Horizontal => Point::new(self.x + self.delta - 1, self.y),
            PortalDirection::Vertical => Point::new(self.x, self.y + self.delta - 1),
        }
    }
}

/// Adjacency from one area to another through a portal pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkLink {
    pub area: usize,
    /// Portal record on the owning area's side.
    pub near: usize,
    /// Portal record on the linked area's side.
    pub far: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkArea {
    pub rect: Rect,
    pub links: Vec<WalkLink>,
}

/// Disjoint walkable rectangles and the portals joining them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkGraph {
    areas: Vec<WalkArea>,
    infos: Vec<WalkInfo>,
}

impl WalkGraph {
    pub fn build(rects: &[Rect]) -> Self {
        let mut graph = Self::default();
        graph.rebuild(rects);
        graph
    }

    /// Replaces the graph with one built from `rects`.
    ///
    /// Every ordered pair is checked once: `j` directly below `i` yields a
    /// horizontal portal, `j` directly right of `i` a vertical one.
    pub fn rebuild(&mut self, rects: &[Rect]) {
        assert!(
            rects.len() <= WALK_AREAS_CAPACITY,
            "walk area capacity exceeded: {} rectangles (limit {WALK_AREAS_CAPACITY})",
            rects.len()
        );
        self.infos.clear();
        self.areas.clear();
        self.areas.extend(rects.iter().map(|&rect| WalkArea {
            rect,
            links: Vec::new(),
        }));

        for i in 0..rects.len() {
            for j in 0..rects.len() {
                if i == j {
                    continue;
                }
                let (upper, lower) = (rects[i], rects[j]);
                if lower.y == upper.bottom() {
                    let start = upper.x.max(lower.x);
                    let end = upper.right().min(lower.right());
                    if start < end {
                        let near = self.add_info(WalkInfo::new(
                            start,
                            upper.bottom() - 1,
                            end - start,
                            PortalDirection::Horizontal,
                            i,
                        ));
                        let far = self.add_info(WalkInfo::new(
                            start,
                            lower.y,
                            end - start,
                            PortalDirection::Horizontal,
                            j,
                        ));
                        self.link(i, j, near, far);
                    }
                } else if lower.x == upper.right() {
                    let start = upper.y.max(lower.y);
                    let end = upper.bottom().min(lower.bottom());
                    if start < end {
                        let near = self.add_info(WalkInfo::new(
                            upper.right() - 1,
                            start,
                            end - start,
                            PortalDirection::Vertical,
                            i,
                        ));
                        let far = self.add_info(WalkInfo::new(
                            lower.x,
                            start,
                            end - start,
                            PortalDirection::Vertical,
                            j,
                        ));
                        self.link(i, j, near, far);
                    }
                }
            }
        }
    }

    pub fn areas(&self) -> &[WalkArea] {
        &self.areas
    }

    pub fn area(&self, index: usize) -> &WalkArea {
        &self.areas[index]
    }

    pub fn infos(&self) -> &[WalkInfo] {
        &self.infos
    }

    pub fn info(&self, index: usize) -> &WalkInfo {
        &self.infos[index]
    }

    /// First area containing `point`.
    pub fn find_area(&self, point: Point) -> Option<usize> {
        self.areas.iter().position(|area| area.rect.contains(point))
    }

    fn add_info(&mut self, info: WalkInfo) -> usize {
        assert!(
            self.infos.len() < WALK_INFOS_CAPACITY,
            "walk info capacity ({WALK_INFOS_CAPACITY}) exceeded"
        );
        self.infos.push(info);
        self.infos.len() - 1
    }

    fn link(&mut self, a: usize, b: usize, near: usize, far: usize) {
        self.push_link(
            a,
            WalkLink {
                area: b,
                near,
                far,
            },
        );
        self.push_link(
            b,
            WalkLink {
                area: a,
                near: far,
                far: near,
            },
        );
    }

    fn push_link(&mut self, area: usize, link: WalkLink) {
        let links = &mut self.areas[area].links;
        assert!(
            links.len() < WALK_AREA_LINKS_CAPACITY,
            "walk area {area} has more than {WALK_AREA_LINKS_CAPACITY} links"
        );
        links.push(link);
    }
}

/// Walkable rectangles as seen by a mover, with the other privileged actor's
/// footprint cut out unless the mover already stands inside it.
pub fn exclude_footprint(walkable: &[Rect], footprint: Option<Rect>, mover: Point) -> Vec<Rect> {
    match footprint {
        Some(hole) if !hole.is_empty() && !hole.contains(mover) => walkable
            .iter()
            .flat_map(|rect| rect_subtract(&hole, rect))
            .collect(),
        _ => walkable.to_vec(),
    }
}
