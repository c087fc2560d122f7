pub mod core;
pub mod models;
pub mod platform;

pub use crate::core::body_tracker::BodyTracker;
pub use crate::core::config::Config;
pub use crate::core::events::{EventKind, EventSubscription, RateSnapshot, StreamEvent};
pub use crate::core::stream_dispatcher::StreamDispatcher;
pub use crate::models::stream::{StreamError, StreamResult, StreamType};
pub use crate::platform::{DriverError, SensorDriver};
