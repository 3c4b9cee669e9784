pub mod assembler;
pub mod models;
pub mod orchestrator;
pub mod resolver;
pub mod store;

pub use models::{Episode, EpisodeBrief, Persona, Project, ProjectStatus, Segment};
pub use orchestrator::Orchestrator;
pub use resolver::resolve_segments;
pub use store::ProjectStore;
