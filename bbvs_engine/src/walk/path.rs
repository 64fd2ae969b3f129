use bbvs_formats::{Point, Rect};

use super::graph::{PortalDirection, WalkGraph, WalkInfo};
use crate::state::{SHORT_SEARCH_BUDGET, SHORT_SEARCH_HOP_LIMIT};

/// Cost reported while no candidate path has been accepted.
pub const NO_PATH_DISTANCE: i32 = 0x00FF_FFFF;

/// Depth limit shared by the reachability test and the path search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    hop_limit: Option<usize>,
}

impl SearchBudget {
    /// Budget derived from a scene's `field_c` value.
    pub fn from_field_c(field_c: i32) -> Self {
        let hop_limit = (field_c <= SHORT_SEARCH_BUDGET).then_some(SHORT_SEARCH_HOP_LIMIT);
        Self { hop_limit }
    }

    pub fn unbounded() -> Self {
        Self { hop_limit: None }
    }

    fn allows(&self, hops: usize) -> bool {
        self.hop_limit.map_or(true, |limit| hops < limit)
    }
}

/// Outcome of a successful walk plan: the point to head for next and the
/// cost of the accepted route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathPlan {
    pub target: Point,
    pub distance: i32,
}

/// Scratch space for one pathfinding call, cleared at the start of each.
#[derive(Debug, Clone, Default)]
pub struct PathfindingWorkspace {
    graph: WalkGraph,
    visited: Vec<bool>,
    trail: Vec<usize>,
    source_pt: Point,
    dest_pt: Point,
    dest_area: usize,
    budget: Option<SearchBudget>,
    curr_walk_distance: i32,
    final_walk_pt: Point,
    accepted_costs: Vec<i32>,
}

impl PathfindingWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the walk-area graph for the given walkable rectangles.
    pub fn init_walk_areas(&mut self, rects: &[Rect]) {
        self.graph.rebuild(rects);
        self.visited.clear();
        self.visited.resize(self.graph.areas().len(), false);
        self.trail.clear();
        self.accepted_costs.clear();
        self.curr_walk_distance = NO_PATH_DISTANCE;
    }

    pub fn graph(&self) -> &WalkGraph {
        &self.graph
    }

    /// Best cost found by the last search, `None` while still at the sentinel.
    pub fn curr_walk_distance(&self) -> Option<i32> {
        (self.curr_walk_distance != NO_PATH_DISTANCE).then_some(self.curr_walk_distance)
    }

    /// Costs of every candidate accepted by the last search, in order.
    pub fn accepted_costs(&self) -> &[i32] {
        &self.accepted_costs
    }

    /// Picks the next point to walk towards on the way from `source` to
    /// `dest`. Returns `None` when either point lies outside every area or
    /// no route exists within `budget`.
    pub fn plan_walk(&mut self, source: Point, dest: Point, budget: SearchBudget) -> Option<PathPlan> {
        let source_area = self.graph.find_area(source)?;
        let dest_area = self.graph.find_area(dest)?;
        if source_area == dest_area {
            return Some(PathPlan {
                target: dest,
                distance: source.distance(dest),
            });
        }
        self.begin_search(source, dest, dest_area, budget);
        self.walk_find_path(source_area);
        self.curr_walk_distance().map(|distance| PathPlan {
            target: self.final_walk_pt,
            distance,
        })
    }

    pub fn can_walk_to_dest(&mut self, source: Point, dest: Point, budget: SearchBudget) -> bool {
        let (Some(source_area), Some(dest_area)) =
            (self.graph.find_area(source), self.graph.find_area(dest))
        else {
            return false;
        };
        if source_area == dest_area {
            return true;
        }
        self.begin_search(source, dest, dest_area, budget);
        self.search_reachable(source_area, 0)
    }

    fn begin_search(&mut self, source: Point, dest: Point, dest_area: usize, budget: SearchBudget) {
        self.source_pt = source;
        self.dest_pt = dest;
        self.dest_area = dest_area;
        self.budget = Some(budget);
        self.visited.iter_mut().for_each(|flag| *flag = false);
        self.trail.clear();
        self.accepted_costs.clear();
        self.curr_walk_distance = NO_PATH_DISTANCE;
        self.final_walk_pt = dest;
    }

    fn allows(&self, hops: usize) -> bool {
        self.budget.map_or(true, |budget| budget.allows(hops))
    }

    fn search_reachable(&mut self, area: usize, hops: usize) -> bool {
        if area == self.dest_area {
            return true;
        }
        if !self.allows(hops) {
            return false;
        }
        self.visited[area] = true;
        let mut found = false;
        for k in 0..self.graph.area(area).links.len() {
            let link = self.graph.area(area).links[k];
            if !self.visited[link.area] && self.search_reachable(link.area, hops + 1) {
                found = true;
                break;
            }
        }
        self.visited[area] = false;
        found
    }

    fn walk_find_path(&mut self, area: usize) {
        if area == self.dest_area {
            self.walk_found_path();
            return;
        }
        if !self.allows(self.trail.len() / 2) {
            return;
        }
        self.visited[area] = true;
        for k in 0..self.graph.area(area).links.len() {
            let link = self.graph.area(area).links[k];
            if self.visited[link.area] {
                continue;
            }
            self.trail.push(link.near);
            self.trail.push(link.far);
            self.walk_find_path(link.area);
            self.trail.truncate(self.trail.len() - 2);
        }
        self.visited[area] = false;
    }

    /// Scores the route on the trail and, when it beats the best so far,
    /// straightens it into the next walk target.
    fn walk_found_path(&mut self) {
        let count = self.trail.len();
        let mut prev = self.source_pt;
        let mut distance = 0;
        for hop in 0..(count + 1) / 2 {
            let mid = self.graph.info(self.trail[hop * 2]).mid_pt;
            distance += prev.distance(mid);
            prev = mid;
        }
        distance += prev.distance(self.dest_pt);

        if distance >= self.curr_walk_distance {
            return;
        }
        self.curr_walk_distance = distance;
        self.accepted_costs.push(distance);

        let mut count = count;
        let mut dest_pt = self.dest_pt;
        loop {
            let walkable = self.trail[..count]
                .iter()
                .all(|&info| walk_test_line_walkable(self.source_pt, dest_pt, self.graph.info(info)));
            if walkable {
                break;
            }
            count -= 1;
            let info = self.graph.info(self.trail[count]);
            let start = info.start_point();
            let end = info.end_point();
            dest_pt = if end.distance_squared(self.dest_pt) < start.distance_squared(self.dest_pt) {
                end
            } else {
                start
            };
        }
        self.final_walk_pt = dest_pt;
    }
}

/// Whether the segment `source -> dest` crosses the portal line within its
/// span. Degenerate segments parallel to the portal never pass.
pub fn walk_test_line_walkable(source: Point, dest: Point, info: &WalkInfo) -> bool {
    let pt_dx = (dest.x - source.x) as f32;
    let pt_dy = (dest.y - source.y) as f32;
    let offset = match info.direction {
        PortalDirection::Vertical => {
            (info.x - source.x) as f32 * pt_dy / pt_dx + source.y as f32 - info.y as f32
        }
        PortalDirection::Horizontal => {
            (info.y - source.y) as f32 * pt_dx / pt_dy + source.x as f32 - info.x as f32
        }
    };
    offset >= 0.0 && offset < info.delta as f32
}
