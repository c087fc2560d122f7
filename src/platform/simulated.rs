// Simulated sensor - in-memory driver with scripted failures and synthetic frames

use super::{DriverError, DriverResult, SensorDriver};
use crate::models::body::{Body, BodyFrame, HandState, Joint, JointType, TrackingState, Vector3};
use crate::models::stream::{FrameSourceTypes, SensorFrame, StreamType};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Driver call log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    OpenSensor,
    CloseSensor,
    OpenReader(StreamType),
    OpenMultiSource(FrameSourceTypes),
    CloseReader(StreamType),
}

#[derive(Debug, Default)]
struct SimulatedState {
    calls: Vec<DriverCall>,
    open_readers: HashSet<StreamType>,
    sensor_open: bool,
    fail_sensor_open: bool,
    fail_sensor_close: bool,
    fail_open: HashSet<StreamType>,
    fail_close: HashSet<StreamType>,
}

/// Driver that needs no hardware.
///
/// Frames pushed with [`SimulatedSensor::emit`] go straight to the frame
/// channel; failures are injected per stream type.
pub struct SimulatedSensor {
    state: Mutex<SimulatedState>,
    frame_tx: mpsc::UnboundedSender<SensorFrame>,
}

impl SimulatedSensor {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<SensorFrame>) {
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let sensor = Arc::new(Self {
            state: Mutex::new(SimulatedState::default()),
            frame_tx,
        });
        (sensor, frame_rx)
    }

    /// Push a frame as if the hardware had produced it
    pub fn emit(&self, frame: SensorFrame) {
        let _ = self.frame_tx.send(frame);
    }

    pub fn fail_sensor_open(&self, fail: bool) {
        self.with_state(|s| s.fail_sensor_open = fail);
    }

    pub fn fail_sensor_close(&self, fail: bool) {
        self.with_state(|s| s.fail_sensor_close = fail);
    }

    pub fn fail_open(&self, stream: StreamType) {
        self.with_state(|s| {
            s.fail_open.insert(stream);
        });
    }

    pub fn fail_close(&self, stream: StreamType) {
        self.with_state(|s| {
            s.fail_close.insert(stream);
        });
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn is_reader_open(&self, stream: StreamType) -> bool {
        self.with_state(|s| s.open_readers.contains(&stream))
    }

    pub fn is_sensor_open(&self) -> bool {
        self.with_state(|s| s.sensor_open)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut SimulatedState) -> T) -> T {
        // A poisoned lock only means a test panicked mid-call; keep going
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut state)
    }
}

#[async_trait]
impl SensorDriver for SimulatedSensor {
    async fn open_sensor(&self) -> DriverResult<()> {
        self.with_state(|s| {
            s.calls.push(DriverCall::OpenSensor);
            if s.fail_sensor_open {
                return Err(DriverError::Unavailable);
            }
            s.sensor_open = true;
            Ok(())
        })
    }

    async fn close_sensor(&self) -> DriverResult<()> {
        self.with_state(|s| {
            s.calls.push(DriverCall::CloseSensor);
            if s.fail_sensor_close {
                return Err(DriverError::Refused("sensor busy".to_string()));
            }
            s.sensor_open = false;
            s.open_readers.clear();
            Ok(())
        })
    }

    async fn open_reader(&self, stream: StreamType) -> DriverResult<()> {
        self.with_state(|s| {
            s.calls.push(DriverCall::OpenReader(stream));
            if s.fail_open.contains(&stream) {
                return Err(DriverError::Refused(format!("{} reader unavailable", stream)));
            }
            s.open_readers.insert(stream);
            Ok(())
        })
    }

    async fn open_multi_source_reader(&self, sources: FrameSourceTypes) -> DriverResult<()> {
        self.with_state(|s| {
            s.calls.push(DriverCall::OpenMultiSource(sources));
            if s.fail_open.contains(&StreamType::MultiSource) {
                return Err(DriverError::Refused("multi-source reader unavailable".to_string()));
            }
            s.open_readers.insert(StreamType::MultiSource);
            Ok(())
        })
    }

    async fn close_reader(&self, stream: StreamType) -> DriverResult<()> {
        self.with_state(|s| {
            s.calls.push(DriverCall::CloseReader(stream));
            if s.fail_close.contains(&stream) {
                return Err(DriverError::Refused(format!("{} reader stuck", stream)));
            }
            s.open_readers.remove(&stream);
            Ok(())
        })
    }
}

/// One body whose right hand sweeps side to side once every two seconds
pub fn synthetic_body_frame(timestamp_ms: i64) -> BodyFrame {
    let phase = (timestamp_ms % 2000) as f32 / 2000.0;
    // Triangle wave between -0.4 and 0.4
    let hand_x = if phase < 0.5 {
        -0.4 + phase * 1.6
    } else {
        0.4 - (phase - 0.5) * 1.6
    };

    let tracked = |joint_type: JointType, x: f32, y: f32, z: f32| {
        Joint::new(joint_type, Vector3::new(x, y, z), TrackingState::Tracked)
    };

    let mut body = Body::new(1)
        .with_joint(tracked(JointType::SpineBase, 0.0, -0.1, 2.0))
        .with_joint(tracked(JointType::Head, 0.0, -0.7, 2.0))
        .with_joint(tracked(JointType::ShoulderLeft, -0.2, -0.45, 2.0))
        .with_joint(tracked(JointType::ElbowLeft, -0.25, -0.2, 2.0))
        .with_joint(tracked(JointType::WristLeft, -0.25, 0.0, 2.0))
        .with_joint(tracked(JointType::HandLeft, -0.25, 0.05, 2.0))
        .with_joint(tracked(JointType::ShoulderRight, 0.2, -0.45, 2.0))
        .with_joint(tracked(JointType::ElbowRight, 0.3, -0.45, 1.9))
        .with_joint(tracked(JointType::WristRight, hand_x, -0.55, 1.8))
        .with_joint(tracked(JointType::HandRight, hand_x, -0.6, 1.8))
        .with_joint(tracked(JointType::HipLeft, -0.1, 0.0, 2.0))
        .with_joint(tracked(JointType::KneeLeft, -0.1, 0.45, 2.0))
        .with_joint(tracked(JointType::AnkleLeft, -0.1, 0.85, 2.0))
        .with_joint(tracked(JointType::FootLeft, -0.1, 0.9, 1.95))
        .with_joint(tracked(JointType::HipRight, 0.1, 0.0, 2.0))
        .with_joint(tracked(JointType::KneeRight, 0.1, 0.45, 2.0))
        .with_joint(tracked(JointType::AnkleRight, 0.1, 0.85, 2.0))
        .with_joint(tracked(JointType::FootRight, 0.1, 0.9, 1.95));
    body.right_hand_state = HandState::Open;

    BodyFrame {
        bodies: vec![body],
        timestamp: timestamp_ms,
        floor_clip_plane: None,
    }
}
