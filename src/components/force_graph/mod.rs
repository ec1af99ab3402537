mod component;
mod layout;
mod render;
pub mod scale;
mod state;
mod types;

pub use component::ForceGraphCanvas;
pub use layout::{LayoutMode, LayoutSettings, NodeView, Simulation};
pub use state::{ForceGraphState, PointerRelease};
pub use types::{Adjacency, AttributeValue, GraphData, GraphLink, GraphNode};
