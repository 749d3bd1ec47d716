//! Layout: deciding where fragments land and mapping them to page
//! coordinates.

mod mapper;
mod planner;

pub use mapper::{resolve_scale, CoordinateMapper, DrawInstruction, DEFAULT_SCALE};
pub use planner::{PageBreakPlan, PagingMode, PixelClip, PlanEntry, Planner, EPSILON};
