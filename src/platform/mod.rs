// Sensor driver abstraction - the seam between the dispatcher and whatever
// supplies frames (native binding, recorded session, simulation)

use crate::models::stream::{FrameSourceTypes, StreamType};
use async_trait::async_trait;

pub mod replay;
pub mod simulated;

pub use replay::ReplaySensor;
pub use simulated::SimulatedSensor;

/// Errors reported by a sensor driver
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DriverError {
    #[error("Driver refused: {0}")]
    Refused(String),

    #[error("Sensor unavailable")]
    Unavailable,

    #[error("I/O error: {0}")]
    Io(String),
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Reader lifecycle operations a sensor driver exposes.
///
/// Frames are delivered out of band through the channel the driver was
/// constructed with.
#[async_trait]
pub trait SensorDriver: Send + Sync {
    /// Acquire the sensor handle
    async fn open_sensor(&self) -> DriverResult<()>;

    /// Release the sensor handle
    async fn close_sensor(&self) -> DriverResult<()>;

    /// Start a dedicated reader for a single stream type
    async fn open_reader(&self, stream: StreamType) -> DriverResult<()>;

    /// Start the composite reader for the requested sub-frame kinds
    async fn open_multi_source_reader(&self, sources: FrameSourceTypes) -> DriverResult<()>;

    /// Stop a reader. Never called for readers without a native close.
    async fn close_reader(&self, stream: StreamType) -> DriverResult<()>;
}
