pub mod dispatcher;
pub mod registry;
pub mod types;

pub use dispatcher::{Dispatcher, Pipeline};
pub use registry::{JobRegistry, JobUpdate};
pub use types::{ConvertOptions, Job, JobInput, JobResult, JobStatus, MediaKind};
