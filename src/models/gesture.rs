// Data models for derived skeletal signals: angles, postures and swipes

use crate::models::body::{HandState, Side};
use serde::{Deserialize, Serialize};

// ==============================================================================
// Swipe configuration
// ==============================================================================

/// Thresholds for swipe classification.
/// Distances are sensor-space meters, durations milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeConfig {
    /// Minimum speed between window endpoints (m/s)
    pub velocity_threshold: f32,
    /// Displacement along the swipe axis required to fire
    pub min_movement_distance: f32,
    /// Horizontal drift tolerated by vertical and depth swipes
    pub max_horizontal_change: f32,
    /// Vertical drift tolerated by horizontal and depth swipes
    pub max_vertical_change: f32,
    /// Age after which samples leave the window
    pub tracking_duration_ms: u64,
    /// Quiet period after a swipe before the same hand can fire again
    pub cooldown_period_ms: u64,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            velocity_threshold: 0.2,
            min_movement_distance: 0.15,
            max_horizontal_change: 0.35,
            max_vertical_change: 0.35,
            tracking_duration_ms: 700,
            cooldown_period_ms: 800,
        }
    }
}

impl SwipeConfig {
    pub fn validate(&self) -> Result<(), String> {
        let thresholds = [
            ("velocity_threshold", self.velocity_threshold),
            ("min_movement_distance", self.min_movement_distance),
            ("max_horizontal_change", self.max_horizontal_change),
            ("max_vertical_change", self.max_vertical_change),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("Invalid {}: {}. Must be non-negative", name, value));
            }
        }

        if self.tracking_duration_ms == 0 {
            return Err("Invalid tracking_duration_ms: 0. Must be positive".to_string());
        }

        Ok(())
    }
}

// ==============================================================================
// Swipe results
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
    Forward,
    Backward,
}

impl SwipeDirection {
    pub fn to_string(&self) -> &'static str {
        match self {
            SwipeDirection::Left => "left",
            SwipeDirection::Right => "right",
            SwipeDirection::Up => "up",
            SwipeDirection::Down => "down",
            SwipeDirection::Forward => "forward",
            SwipeDirection::Backward => "backward",
        }
    }
}

/// A classified swipe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeResult {
    pub direction: SwipeDirection,
    /// Euclidean distance between window endpoints (m)
    pub distance: f32,
    /// Distance over elapsed window time (m/s)
    pub velocity: f32,
}

/// A swipe attributed to a hand, as broadcast downstream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeEvent {
    pub hand: Side,
    #[serde(flatten)]
    pub swipe: SwipeResult,
}

// ==============================================================================
// Joint angles and postures
// ==============================================================================

/// Flexion angles in degrees; a side is absent unless all three joints are tracked
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JointAngles {
    pub left_elbow: Option<f32>,
    pub right_elbow: Option<f32>,
    pub left_knee: Option<f32>,
    pub right_knee: Option<f32>,
}

impl JointAngles {
    pub fn is_empty(&self) -> bool {
        self.left_elbow.is_none()
            && self.right_elbow.is_none()
            && self.left_knee.is_none()
            && self.right_knee.is_none()
    }
}

/// Frame-local postures for one body
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Posture {
    pub left_hand_raised: bool,
    pub right_hand_raised: bool,
    pub jumping: bool,
    pub left_hand_state: HandState,
    pub right_hand_state: HandState,
}

// ==============================================================================
// DTOs (handed to the broadcaster)
// ==============================================================================

/// Derived signals for the nearest person in one body frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyUpdate {
    pub session_id: String,
    /// Wall-clock time the update was produced (ms since epoch)
    pub timestamp: i64,
    /// Driver capture time of the source frame
    pub frame_timestamp: i64,
    pub tracking_id: u64,
    pub angles: JointAngles,
    pub posture: Posture,
    pub swipes: Vec<SwipeEvent>,
}
