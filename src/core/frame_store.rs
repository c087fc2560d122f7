// Latest-frame cache, one slot per stream type

use crate::models::stream::{SensorFrame, StreamType};
use std::collections::HashMap;

/// Holds the most recent frame of each stream type
#[derive(Debug, Default)]
pub struct FrameStore {
    frames: HashMap<StreamType, SensorFrame>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot for the frame's stream type
    pub fn put(&mut self, frame: SensorFrame) {
        self.frames.insert(frame.stream_type(), frame);
    }

    pub fn get(&self, stream: StreamType) -> Option<&SensorFrame> {
        self.frames.get(&stream)
    }

    pub fn clear(&mut self, stream: StreamType) {
        self.frames.remove(&stream);
    }

    pub fn clear_all(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
