// Data structures for sensor streams and the frames they carry

use crate::models::body::BodyFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ==============================================================================
// Stream types
// ==============================================================================

/// The eight reader types the sensor exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StreamType {
    Color,
    Depth,
    Infrared,
    LongExposureInfrared,
    RawDepth,
    Body,
    BodyIndex,
    MultiSource,
}

impl StreamType {
    pub const ALL: [StreamType; 8] = [
        StreamType::Color,
        StreamType::Depth,
        StreamType::Infrared,
        StreamType::LongExposureInfrared,
        StreamType::RawDepth,
        StreamType::Body,
        StreamType::BodyIndex,
        StreamType::MultiSource,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::Color => "color",
            StreamType::Depth => "depth",
            StreamType::Infrared => "infrared",
            StreamType::LongExposureInfrared => "longExposureInfrared",
            StreamType::RawDepth => "rawDepth",
            StreamType::Body => "body",
            StreamType::BodyIndex => "bodyIndex",
            StreamType::MultiSource => "multiSource",
        }
    }

    /// Whether the driver owns a dedicated close for this reader.
    /// Body-index readers are torn down locally only.
    pub fn has_native_close(&self) -> bool {
        !matches!(self, StreamType::BodyIndex)
    }

    /// Bit for this stream inside a composite reader request
    pub fn source_bit(&self) -> Option<FrameSourceTypes> {
        match self {
            StreamType::Color => Some(FrameSourceTypes::COLOR),
            StreamType::Infrared => Some(FrameSourceTypes::INFRARED),
            StreamType::LongExposureInfrared => Some(FrameSourceTypes::LONG_EXPOSURE_INFRARED),
            StreamType::Depth => Some(FrameSourceTypes::DEPTH),
            StreamType::BodyIndex => Some(FrameSourceTypes::BODY_INDEX),
            StreamType::Body => Some(FrameSourceTypes::BODY),
            StreamType::RawDepth | StreamType::MultiSource => None,
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bitmask of sub-frame kinds requested from the composite reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameSourceTypes(pub u32);

impl FrameSourceTypes {
    pub const NONE: FrameSourceTypes = FrameSourceTypes(0);
    pub const COLOR: FrameSourceTypes = FrameSourceTypes(0x1);
    pub const INFRARED: FrameSourceTypes = FrameSourceTypes(0x2);
    pub const LONG_EXPOSURE_INFRARED: FrameSourceTypes = FrameSourceTypes(0x4);
    pub const DEPTH: FrameSourceTypes = FrameSourceTypes(0x8);
    pub const BODY_INDEX: FrameSourceTypes = FrameSourceTypes(0x10);
    pub const BODY: FrameSourceTypes = FrameSourceTypes(0x20);

    pub fn contains(&self, other: FrameSourceTypes) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn union(self, other: FrameSourceTypes) -> FrameSourceTypes {
        FrameSourceTypes(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Build a mask from stream types; types without a bit are ignored
    pub fn from_streams(streams: &[StreamType]) -> FrameSourceTypes {
        streams
            .iter()
            .filter_map(StreamType::source_bit)
            .fold(FrameSourceTypes::NONE, FrameSourceTypes::union)
    }
}

impl std::ops::BitOr for FrameSourceTypes {
    type Output = FrameSourceTypes;

    fn bitor(self, rhs: FrameSourceTypes) -> FrameSourceTypes {
        self.union(rhs)
    }
}

// ==============================================================================
// Frames
// ==============================================================================

/// Pixel layout of an image-like frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Rgba8,
    Bgra8,
    /// 16-bit little-endian samples (depth mm, infrared intensity)
    Gray16,
    /// One byte per pixel (body index)
    Gray8,
}

/// Image payload shared by color, depth, infrared and body-index frames
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    pub timestamp: i64,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Arc<[u8]>,
}

impl ImageFrame {
    pub fn new(timestamp: i64, width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            timestamp,
            width,
            height,
            format,
            data: data.into(),
        }
    }
}

/// Composite frame carrying zero or more sub-frames
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiSourceFrame {
    pub timestamp: i64,
    pub color: Option<ImageFrame>,
    pub depth: Option<ImageFrame>,
    pub infrared: Option<ImageFrame>,
    pub long_exposure_infrared: Option<ImageFrame>,
    pub body_index: Option<ImageFrame>,
    pub body: Option<Arc<BodyFrame>>,
}

impl MultiSourceFrame {
    /// Populated sub-frames, each tagged as its dedicated stream
    pub fn sub_frames(&self) -> Vec<SensorFrame> {
        let mut frames = Vec::new();
        if let Some(f) = &self.color {
            frames.push(SensorFrame::Color(f.clone()));
        }
        if let Some(f) = &self.depth {
            frames.push(SensorFrame::Depth(f.clone()));
        }
        if let Some(f) = &self.infrared {
            frames.push(SensorFrame::Infrared(f.clone()));
        }
        if let Some(f) = &self.long_exposure_infrared {
            frames.push(SensorFrame::LongExposureInfrared(f.clone()));
        }
        if let Some(f) = &self.body_index {
            frames.push(SensorFrame::BodyIndex(f.clone()));
        }
        if let Some(f) = &self.body {
            frames.push(SensorFrame::Body(f.clone()));
        }
        frames
    }
}

/// A frame as delivered by the driver, tagged by the stream it arrived on
#[derive(Debug, Clone, PartialEq)]
pub enum SensorFrame {
    Color(ImageFrame),
    Depth(ImageFrame),
    Infrared(ImageFrame),
    LongExposureInfrared(ImageFrame),
    RawDepth(ImageFrame),
    Body(Arc<BodyFrame>),
    BodyIndex(ImageFrame),
    MultiSource(Arc<MultiSourceFrame>),
}

impl SensorFrame {
    pub fn stream_type(&self) -> StreamType {
        match self {
            SensorFrame::Color(_) => StreamType::Color,
            SensorFrame::Depth(_) => StreamType::Depth,
            SensorFrame::Infrared(_) => StreamType::Infrared,
            SensorFrame::LongExposureInfrared(_) => StreamType::LongExposureInfrared,
            SensorFrame::RawDepth(_) => StreamType::RawDepth,
            SensorFrame::Body(_) => StreamType::Body,
            SensorFrame::BodyIndex(_) => StreamType::BodyIndex,
            SensorFrame::MultiSource(_) => StreamType::MultiSource,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            SensorFrame::Color(f)
            | SensorFrame::Depth(f)
            | SensorFrame::Infrared(f)
            | SensorFrame::LongExposureInfrared(f)
            | SensorFrame::RawDepth(f)
            | SensorFrame::BodyIndex(f) => f.timestamp,
            SensorFrame::Body(f) => f.timestamp,
            SensorFrame::MultiSource(f) => f.timestamp,
        }
    }

    pub fn as_body(&self) -> Option<&Arc<BodyFrame>> {
        match self {
            SensorFrame::Body(f) => Some(f),
            _ => None,
        }
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("Sensor not initialized")]
    NotInitialized,

    #[error("Failed to open {stream} stream: {reason}")]
    OpenFailed { stream: StreamType, reason: String },

    #[error("Failed to close {stream} stream: {reason}")]
    CloseFailed { stream: StreamType, reason: String },

    #[error("Sensor failure: {0}")]
    SensorFailed(String),

    #[error("Teardown failed for {} operation(s)", .0.len())]
    TeardownFailed(Vec<StreamError>),
}

pub type StreamResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_type_names_match_serde() {
        for stream in StreamType::ALL {
            let json = serde_json::to_string(&stream).unwrap();
            assert_eq!(json, format!("\"{}\"", stream.as_str()));
            assert_eq!(serde_json::from_str::<StreamType>(&json).unwrap(), stream);
        }
        assert!(serde_json::from_str::<StreamType>("\"audio\"").is_err());
    }

    #[test]
    fn test_only_body_index_lacks_native_close() {
        let local_only: Vec<_> = StreamType::ALL
            .iter()
            .filter(|s| !s.has_native_close())
            .collect();
        assert_eq!(local_only, vec![&StreamType::BodyIndex]);
    }

    #[test]
    fn test_frame_source_mask() {
        let mask = FrameSourceTypes::from_streams(&[
            StreamType::Color,
            StreamType::Body,
            StreamType::RawDepth,
        ]);
        assert_eq!(mask, FrameSourceTypes::COLOR | FrameSourceTypes::BODY);
        assert!(mask.contains(FrameSourceTypes::BODY));
        assert!(!mask.contains(FrameSourceTypes::DEPTH));
        assert!(!mask.contains(FrameSourceTypes::NONE));
        assert!(FrameSourceTypes::from_streams(&[StreamType::MultiSource]).is_empty());
    }

    #[test]
    fn test_multi_source_sub_frames() {
        let color = ImageFrame::new(5, 2, 1, PixelFormat::Rgba8, vec![0; 8]);
        let frame = MultiSourceFrame {
            timestamp: 5,
            color: Some(color.clone()),
            body: Some(Arc::new(BodyFrame::default())),
            ..Default::default()
        };

        let subs = frame.sub_frames();
        let kinds: Vec<_> = subs.iter().map(SensorFrame::stream_type).collect();
        assert_eq!(kinds, vec![StreamType::Color, StreamType::Body]);
        assert_eq!(subs[0], SensorFrame::Color(color));
        assert!(MultiSourceFrame::default().sub_frames().is_empty());
    }

    #[test]
    fn test_error_names_stream() {
        let err = StreamError::OpenFailed {
            stream: StreamType::Depth,
            reason: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to open depth stream: busy");

        let agg = StreamError::TeardownFailed(vec![err]);
        assert_eq!(agg.to_string(), "Teardown failed for 1 operation(s)");
    }
}
