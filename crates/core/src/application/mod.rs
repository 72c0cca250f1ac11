// Application Layer - job runner and the page-facing use cases built on it

pub mod property_page;
pub mod registry;
pub mod runner;
pub mod ui_ref;

// Re-exports
pub use property_page::{ApplyMode, ObjectUpdate, PropertyPage};
pub use registry::SessionRegistry;
pub use runner::{Job, JobHandle, JobRunner, RunnerConfig};
pub use ui_ref::{Disposable, UiRef};
