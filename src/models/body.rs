// Data models for skeletal tracking: joints, bodies and body frames

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum number of bodies the sensor tracks in one frame
pub const MAX_BODIES: usize = 6;

// ==============================================================================
// Joint identity and tracking state
// ==============================================================================

/// Sensor skeleton joint indices (25 total)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum JointType {
    SpineBase = 0,
    SpineMid = 1,
    Neck = 2,
    Head = 3,
    ShoulderLeft = 4,
    ElbowLeft = 5,
    WristLeft = 6,
    HandLeft = 7,
    ShoulderRight = 8,
    ElbowRight = 9,
    WristRight = 10,
    HandRight = 11,
    HipLeft = 12,
    KneeLeft = 13,
    AnkleLeft = 14,
    FootLeft = 15,
    HipRight = 16,
    KneeRight = 17,
    AnkleRight = 18,
    FootRight = 19,
    SpineShoulder = 20,
    HandTipLeft = 21,
    ThumbLeft = 22,
    HandTipRight = 23,
    ThumbRight = 24,
}

impl JointType {
    pub const ALL: [JointType; 25] = [
        JointType::SpineBase,
        JointType::SpineMid,
        JointType::Neck,
        JointType::Head,
        JointType::ShoulderLeft,
        JointType::ElbowLeft,
        JointType::WristLeft,
        JointType::HandLeft,
        JointType::ShoulderRight,
        JointType::ElbowRight,
        JointType::WristRight,
        JointType::HandRight,
        JointType::HipLeft,
        JointType::KneeLeft,
        JointType::AnkleLeft,
        JointType::FootLeft,
        JointType::HipRight,
        JointType::KneeRight,
        JointType::AnkleRight,
        JointType::FootRight,
        JointType::SpineShoulder,
        JointType::HandTipLeft,
        JointType::ThumbLeft,
        JointType::HandTipRight,
        JointType::ThumbRight,
    ];

    /// Decode the driver's raw joint id
    pub fn from_raw(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }
}

/// Per-joint tracking confidence reported by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum TrackingState {
    NotTracked = 0,
    Inferred = 1,
    Tracked = 2,
}

impl TrackingState {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => TrackingState::Inferred,
            2 => TrackingState::Tracked,
            _ => TrackingState::NotTracked,
        }
    }
}

/// Hand open/closed classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HandState {
    #[default]
    Unknown,
    NotTracked,
    Open,
    Closed,
    Lasso,
}

impl HandState {
    pub fn to_string(&self) -> &'static str {
        match self {
            HandState::Unknown => "unknown",
            HandState::NotTracked => "notTracked",
            HandState::Open => "open",
            HandState::Closed => "closed",
            HandState::Lasso => "lasso",
        }
    }
}

/// Left or right side of the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn to_string(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    pub fn hand(&self) -> JointType {
        match self {
            Side::Left => JointType::HandLeft,
            Side::Right => JointType::HandRight,
        }
    }

    pub fn shoulder(&self) -> JointType {
        match self {
            Side::Left => JointType::ShoulderLeft,
            Side::Right => JointType::ShoulderRight,
        }
    }
}

// ==============================================================================
// Joint / Body / BodyFrame
// ==============================================================================

/// Camera-space position in meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn sub(&self, other: &Vector3) -> Vector3 {
        Vector3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn dot(&self, other: &Vector3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }
}

/// Joint orientation quaternion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Orientation {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 }
    }
}

/// One tracked skeletal landmark
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Joint {
    pub joint_type: JointType,
    pub position: Vector3,
    /// Projection into color image coordinates
    #[serde(default)]
    pub color_point: (f32, f32),
    /// Projection into depth image coordinates
    #[serde(default)]
    pub depth_point: (f32, f32),
    #[serde(default)]
    pub orientation: Orientation,
    pub tracking_state: TrackingState,
}

impl Joint {
    pub fn new(joint_type: JointType, position: Vector3, tracking_state: TrackingState) -> Self {
        Self {
            joint_type,
            position,
            color_point: (0.0, 0.0),
            depth_point: (0.0, 0.0),
            orientation: Orientation::default(),
            tracking_state,
        }
    }

    /// Tracked or inferred
    pub fn is_tracked(&self) -> bool {
        self.tracking_state != TrackingState::NotTracked
    }

    pub fn is_fully_tracked(&self) -> bool {
        self.tracking_state == TrackingState::Tracked
    }
}

/// One detected person's skeleton
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    pub tracking_id: u64,
    pub tracked: bool,
    pub joints: HashMap<JointType, Joint>,
    #[serde(default)]
    pub left_hand_state: HandState,
    #[serde(default)]
    pub right_hand_state: HandState,
}

impl Body {
    pub fn new(tracking_id: u64) -> Self {
        Self {
            tracking_id,
            tracked: true,
            joints: HashMap::new(),
            left_hand_state: HandState::Unknown,
            right_hand_state: HandState::Unknown,
        }
    }

    pub fn with_joint(mut self, joint: Joint) -> Self {
        self.joints.insert(joint.joint_type, joint);
        self
    }

    pub fn joint(&self, joint_type: JointType) -> Option<&Joint> {
        self.joints.get(&joint_type)
    }

    /// Joint that is present and tracked (or inferred)
    pub fn tracked_joint(&self, joint_type: JointType) -> Option<&Joint> {
        self.joint(joint_type).filter(|j| j.is_tracked())
    }

    pub fn hand_state(&self, side: Side) -> HandState {
        match side {
            Side::Left => self.left_hand_state,
            Side::Right => self.right_hand_state,
        }
    }
}

/// Floor plane equation `x*X + y*Y + z*Z + w = 0` in camera space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorPlane {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

/// All bodies seen in a single sensor tick
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyFrame {
    pub bodies: Vec<Body>,
    /// Capture time reported by the driver (milliseconds)
    pub timestamp: i64,
    #[serde(default)]
    pub floor_clip_plane: Option<FloorPlane>,
}

impl BodyFrame {
    pub fn tracked_bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter().filter(|b| b.tracked)
    }
}
