// Frame-local posture detection - raised hands, jumping and hand states

use crate::models::body::{Body, HandState, JointType, Side};
use crate::models::gesture::Posture;

/// Default tolerance for a hand reading above the head
pub const DEFAULT_HAND_RAISE_MARGIN: f32 = 0.1;
/// Default average foot height that counts as airborne
pub const DEFAULT_JUMP_THRESHOLD: f32 = 0.10;

/// Stateless posture classifier
#[derive(Debug, Clone, Copy)]
pub struct GestureDetector {
    hand_raise_margin: f32,
    jump_threshold: f32,
}

impl Default for GestureDetector {
    fn default() -> Self {
        Self::new(DEFAULT_HAND_RAISE_MARGIN, DEFAULT_JUMP_THRESHOLD)
    }
}

impl GestureDetector {
    pub fn new(hand_raise_margin: f32, jump_threshold: f32) -> Self {
        Self {
            hand_raise_margin,
            jump_threshold,
        }
    }

    /// Hand above its shoulder but no more than the margin above the head.
    /// Smaller Y is higher in sensor space.
    pub fn hand_raised(&self, body: &Body, side: Side) -> bool {
        let (Some(head), Some(shoulder), Some(hand)) = (
            body.tracked_joint(JointType::Head),
            body.tracked_joint(side.shoulder()),
            body.tracked_joint(side.hand()),
        ) else {
            return false;
        };

        let hand_y = hand.position.y;
        hand_y < shoulder.position.y && hand_y >= head.position.y - self.hand_raise_margin
    }

    /// Both feet read as elevated relative to the floor reference
    pub fn is_jumping(&self, body: &Body) -> bool {
        let (Some(left), Some(right), Some(_spine)) = (
            body.tracked_joint(JointType::FootLeft),
            body.tracked_joint(JointType::FootRight),
            body.tracked_joint(JointType::SpineBase),
        ) else {
            return false;
        };

        let average = (left.position.y + right.position.y) / 2.0;
        average > self.jump_threshold
    }

    /// Decode the driver's numeric hand state
    pub fn hand_state(raw: Option<i32>) -> HandState {
        match raw {
            Some(1) => HandState::NotTracked,
            Some(2) => HandState::Open,
            Some(3) => HandState::Closed,
            Some(4) => HandState::Lasso,
            _ => HandState::Unknown,
        }
    }

    /// All frame-local postures for a body
    pub fn posture(&self, body: &Body) -> Posture {
        Posture {
            left_hand_raised: self.hand_raised(body, Side::Left),
            right_hand_raised: self.hand_raised(body, Side::Right),
            jumping: self.is_jumping(body),
            left_hand_state: body.hand_state(Side::Left),
            right_hand_state: body.hand_state(Side::Right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::body::{Joint, TrackingState, Vector3};

    fn joint(joint_type: JointType, y: f32) -> Joint {
        Joint::new(joint_type, Vector3::new(0.0, y, 1.5), TrackingState::Tracked)
    }

    fn upper_body(hand_y: f32) -> Body {
        Body::new(1)
            .with_joint(joint(JointType::Head, -0.6))
            .with_joint(joint(JointType::ShoulderRight, -0.3))
            .with_joint(joint(JointType::HandRight, hand_y))
    }

    #[test]
    fn test_hand_raised_above_shoulder() {
        let detector = GestureDetector::default();
        assert!(detector.hand_raised(&upper_body(-0.5), Side::Right));
        assert!(!detector.hand_raised(&upper_body(0.0), Side::Right));
        assert!(!detector.hand_raised(&upper_body(-0.5), Side::Left));
    }

    #[test]
    fn test_hand_raised_rejects_far_above_head() {
        let detector = GestureDetector::default();
        // Within the 0.1m margin above the head
        assert!(detector.hand_raised(&upper_body(-0.65), Side::Right));
        assert!(!detector.hand_raised(&upper_body(-0.9), Side::Right));
    }

    #[test]
    fn test_hand_raised_requires_tracked_joints() {
        let detector = GestureDetector::default();
        let body = upper_body(-0.5).with_joint(Joint::new(
            JointType::Head,
            Vector3::new(0.0, -0.6, 1.5),
            TrackingState::NotTracked,
        ));
        assert!(!detector.hand_raised(&body, Side::Right));
    }

    #[test]
    fn test_is_jumping() {
        let detector = GestureDetector::default();
        let feet = |left: f32, right: f32| {
            Body::new(1)
                .with_joint(joint(JointType::SpineBase, 0.0))
                .with_joint(joint(JointType::FootLeft, left))
                .with_joint(joint(JointType::FootRight, right))
        };

        assert!(detector.is_jumping(&feet(0.15, 0.12)));
        assert!(!detector.is_jumping(&feet(0.15, 0.0)));
        assert!(!detector.is_jumping(&Body::new(2).with_joint(joint(JointType::FootLeft, 0.5))));
    }

    #[test]
    fn test_hand_state_mapping() {
        assert_eq!(GestureDetector::hand_state(Some(2)), HandState::Open);
        assert_eq!(GestureDetector::hand_state(Some(3)), HandState::Closed);
        assert_eq!(GestureDetector::hand_state(Some(4)), HandState::Lasso);
        assert_eq!(GestureDetector::hand_state(Some(1)), HandState::NotTracked);
        assert_eq!(GestureDetector::hand_state(Some(0)), HandState::Unknown);
        assert_eq!(GestureDetector::hand_state(Some(42)), HandState::Unknown);
        assert_eq!(GestureDetector::hand_state(None), HandState::Unknown);
    }

    #[test]
    fn test_posture_collects_flags() {
        let mut body = upper_body(-0.5);
        body.left_hand_state = HandState::Closed;
        let posture = GestureDetector::default().posture(&body);

        assert!(posture.right_hand_raised);
        assert!(!posture.left_hand_raised);
        assert!(!posture.jumping);
        assert_eq!(posture.left_hand_state, HandState::Closed);
        assert_eq!(posture.right_hand_state, HandState::Unknown);
    }
}
