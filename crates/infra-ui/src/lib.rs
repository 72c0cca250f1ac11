// Panelkit Infrastructure - Interactive-thread adapters
// Implements: UiDispatcher, MessageSurface, ProgressSink

pub mod event_loop;
pub mod message_area;
pub mod progress;

pub use event_loop::{EventLoopHandle, EventLoopThread};
pub use message_area::{Message, MessageArea, MessageLevel};
pub use progress::TracingProgress;
