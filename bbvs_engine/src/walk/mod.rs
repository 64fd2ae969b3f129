//! Walk-area graph construction and the route search that runs over it.

mod graph;
mod path;

pub use graph::{exclude_footprint, PortalDirection, WalkArea, WalkGraph, WalkInfo, WalkLink};
pub use path::{
    walk_test_line_walkable, PathPlan, PathfindingWorkspace, SearchBudget, NO_PATH_DISTANCE,
};
