// Replay sensor - plays back recorded body frames from a JSON lines file
//
// Each line is one frame in the driver's raw shape: numeric joint ids,
// tracking states and hand states.

use super::{DriverError, DriverResult, SensorDriver};
use crate::core::gesture_detector::GestureDetector;
use crate::models::body::{
    Body, BodyFrame, FloorPlane, Joint, JointType, Orientation, TrackingState, Vector3, MAX_BODIES,
};
use crate::models::stream::{FrameSourceTypes, MultiSourceFrame, SensorFrame, StreamType};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Pause between passes when the recording has no usable frame spacing
const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(33);

// ==============================================================================
// Recording format
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawJoint {
    joint_type: u8,
    x: f32,
    y: f32,
    z: f32,
    #[serde(default)]
    orientation: Option<[f32; 4]>,
    tracking_state: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBody {
    tracking_id: u64,
    tracked: bool,
    #[serde(default)]
    left_hand_state: Option<i32>,
    #[serde(default)]
    right_hand_state: Option<i32>,
    #[serde(default)]
    joints: Vec<RawJoint>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBodyFrame {
    timestamp: i64,
    #[serde(default)]
    floor_clip_plane: Option<[f32; 4]>,
    #[serde(default)]
    bodies: Vec<RawBody>,
}

impl RawBodyFrame {
    fn decode(self) -> BodyFrame {
        if self.bodies.len() > MAX_BODIES {
            log::warn!(
                "Frame {} has {} bodies, keeping the first {}",
                self.timestamp,
                self.bodies.len(),
                MAX_BODIES
            );
        }

        let bodies = self
            .bodies
            .into_iter()
            .take(MAX_BODIES)
            .map(|raw| {
                let joints: HashMap<JointType, Joint> = raw
                    .joints
                    .into_iter()
                    .filter_map(|j| {
                        let joint_type = JointType::from_raw(j.joint_type)?;
                        let mut joint = Joint::new(
                            joint_type,
                            Vector3::new(j.x, j.y, j.z),
                            TrackingState::from_raw(j.tracking_state),
                        );
                        if let Some([x, y, z, w]) = j.orientation {
                            joint.orientation = Orientation { x, y, z, w };
                        }
                        Some((joint_type, joint))
                    })
                    .collect();

                Body {
                    tracking_id: raw.tracking_id,
                    tracked: raw.tracked,
                    joints,
                    left_hand_state: GestureDetector::hand_state(raw.left_hand_state),
                    right_hand_state: GestureDetector::hand_state(raw.right_hand_state),
                }
            })
            .collect();

        BodyFrame {
            bodies,
            timestamp: self.timestamp,
            floor_clip_plane: self
                .floor_clip_plane
                .map(|[x, y, z, w]| FloorPlane { x, y, z, w }),
        }
    }
}

/// Parse a JSON lines recording; blank lines are skipped
pub fn parse_recording(contents: &str) -> DriverResult<Vec<BodyFrame>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<RawBodyFrame>(line)
                .map(RawBodyFrame::decode)
                .map_err(|e| DriverError::Io(format!("line {}: {}", index + 1, e)))
        })
        .collect()
}

// ==============================================================================
// Replay driver
// ==============================================================================

/// Driver that replays a recorded session at its original pace
pub struct ReplaySensor {
    frames: Arc<Vec<BodyFrame>>,
    looped: bool,
    sensor_open: AtomicBool,
    playback: Mutex<HashMap<StreamType, JoinHandle<()>>>,
    frame_tx: mpsc::UnboundedSender<SensorFrame>,
}

impl ReplaySensor {
    pub fn new(
        frames: Vec<BodyFrame>,
        looped: bool,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<SensorFrame>) {
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let sensor = Arc::new(Self {
            frames: Arc::new(frames),
            looped,
            sensor_open: AtomicBool::new(false),
            playback: Mutex::new(HashMap::new()),
            frame_tx,
        });
        (sensor, frame_rx)
    }

    /// Load a recording from disk
    pub fn load(
        path: &Path,
        looped: bool,
    ) -> DriverResult<(Arc<Self>, mpsc::UnboundedReceiver<SensorFrame>)> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DriverError::Io(format!("{}: {}", path.display(), e)))?;
        let frames = parse_recording(&contents)?;
        log::info!("Loaded {} recorded body frames from {}", frames.len(), path.display());
        Ok(Self::new(frames, looped))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn start_playback(&self, stream: StreamType, wrap: fn(BodyFrame) -> SensorFrame) -> DriverResult<()> {
        if !self.sensor_open.load(Ordering::SeqCst) {
            return Err(DriverError::Unavailable);
        }
        if self.frames.is_empty() {
            return Err(DriverError::Refused("recording is empty".to_string()));
        }

        let frames = self.frames.clone();
        let tx = self.frame_tx.clone();
        let looped = self.looped;
        let wrap_gap = loop_interval(&frames);

        let handle = tokio::spawn(async move {
            loop {
                let mut previous: Option<i64> = None;
                for frame in frames.iter() {
                    if let Some(prev) = previous {
                        let gap = (frame.timestamp - prev).max(0) as u64;
                        tokio::time::sleep(Duration::from_millis(gap)).await;
                    }
                    previous = Some(frame.timestamp);
                    if tx.send(wrap(frame.clone())).is_err() {
                        return;
                    }
                }
                if !looped {
                    log::info!("Replay of {} stream finished", stream);
                    return;
                }
                // Never restart without waiting, even for single-frame recordings
                tokio::time::sleep(wrap_gap).await;
            }
        });

        let mut playback = self.lock_playback();
        if let Some(previous) = playback.insert(stream, handle) {
            previous.abort();
        }
        Ok(())
    }

    fn lock_playback(&self) -> std::sync::MutexGuard<'_, HashMap<StreamType, JoinHandle<()>>> {
        match self.playback.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Average spacing of the recording, used as the gap before it restarts
fn loop_interval(frames: &[BodyFrame]) -> Duration {
    let (Some(first), Some(last)) = (frames.first(), frames.last()) else {
        return DEFAULT_FRAME_INTERVAL;
    };
    let span = last.timestamp - first.timestamp;
    if frames.len() < 2 || span <= 0 {
        return DEFAULT_FRAME_INTERVAL;
    }
    let average_ms = span as u64 / (frames.len() - 1) as u64;
    Duration::from_millis(average_ms.max(1))
}

fn wrap_body(frame: BodyFrame) -> SensorFrame {
    SensorFrame::Body(Arc::new(frame))
}

fn wrap_multi_source(frame: BodyFrame) -> SensorFrame {
    SensorFrame::MultiSource(Arc::new(MultiSourceFrame {
        timestamp: frame.timestamp,
        body: Some(Arc::new(frame)),
        ..Default::default()
    }))
}

#[async_trait]
impl SensorDriver for ReplaySensor {
    async fn open_sensor(&self) -> DriverResult<()> {
        self.sensor_open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close_sensor(&self) -> DriverResult<()> {
        for (_, handle) in self.lock_playback().drain() {
            handle.abort();
        }
        self.sensor_open.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn open_reader(&self, stream: StreamType) -> DriverResult<()> {
        match stream {
            StreamType::Body => self.start_playback(stream, wrap_body),
            other => Err(DriverError::Refused(format!("recording has no {} data", other))),
        }
    }

    async fn open_multi_source_reader(&self, sources: FrameSourceTypes) -> DriverResult<()> {
        if !sources.contains(FrameSourceTypes::BODY) {
            return Err(DriverError::Refused("recording only carries body frames".to_string()));
        }
        self.start_playback(StreamType::MultiSource, wrap_multi_source)
    }

    async fn close_reader(&self, stream: StreamType) -> DriverResult<()> {
        if let Some(handle) = self.lock_playback().remove(&stream) {
            handle.abort();
        }
        Ok(())
    }
}
