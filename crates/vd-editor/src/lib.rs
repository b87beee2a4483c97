pub mod config;
pub mod drop;
pub mod error;
pub mod history;
pub mod input;
pub mod mutation;
pub mod session;
pub mod shortcuts;
pub mod tables;
pub mod viewport;

pub use config::{EditorConfig, ZoomConfig};
pub use error::EditError;
pub use mutation::{Change, ChartPatch, Mutation, NodePatch};
pub use session::EditorSession;
pub use viewport::ViewportController;
