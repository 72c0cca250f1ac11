// Port Layer - Interfaces for external collaborators

pub mod message_surface;
pub mod progress;
pub mod session;
pub mod ui_dispatch;

// Re-exports
pub use message_surface::MessageSurface;
pub use progress::ProgressSink;
pub use session::{Session, SessionError};
pub use ui_dispatch::{DispatchError, UiCallback, UiDispatcher};
