//! Force-directed mind-map visualization component.
//!
//! Renders a knowledge graph on an HTML canvas with:
//! - A d3-style force simulation (links, Barnes-Hut repulsion, centering, collision)
//! - Node dragging, hover highlighting, click selection, pan, wheel and pinch zoom
//! - Node size and color derived from connectivity, edge color from relationship type
//!
//! The engine itself (`model`, `simulation`, `style`, `interaction`, `state`)
//! is plain Rust with no DOM access; only `component`, `render` and the
//! `requestAnimationFrame` scheduler touch the browser.
//!
//! # Example
//!
//! ```ignore
//! use mindmap_graph::{GraphData, MindMapCanvas};
//!
//! let data = GraphData::from_json(r#"{"nodes": [{"id": "FTP", "type": "Protocol"}], "relationships": []}"#)?;
//!
//! view! { <MindMapCanvas data=Signal::derive(move || data.clone()) fullscreen=true /> }
//! ```

mod component;
pub mod config;
pub mod error;
pub mod interaction;
pub mod model;
pub mod quadtree;
mod render;
pub mod scale;
pub mod scheduler;
pub mod simulation;
pub mod state;
pub mod style;
pub mod theme;
pub mod types;

pub use component::MindMapCanvas;
pub use config::{GraphConfig, ViewConfig};
pub use error::{GraphError, GraphResult};
pub use model::{Connection, Direction, GraphModel, GraphStats, NodeDetails, NodeIndex};
pub use scheduler::{AnimationFrameScheduler, FrameScheduler, ManualScheduler};
pub use simulation::{Simulation, SimulationParameters, SimulationPhase};
pub use state::ForceGraphState;
pub use style::RelationshipKind;
pub use theme::{Theme, ThemeName};
pub use types::{GraphData, GraphNode, GraphPayload, GraphRelationship, PayloadShape};
