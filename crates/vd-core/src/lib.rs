pub mod id;
pub mod model;
pub mod tree;

pub use id::NodeId;
pub use model::*;
pub use tree::DropPosition;

// Re-export geometry types so downstream crates share one definition
pub use kurbo::{Affine, Point, Rect, Size, Vec2};
