// Skeletal analysis - stateless queries over a body frame

use crate::models::body::{Body, BodyFrame, Joint, JointType};
use crate::models::gesture::JointAngles;

/// Stateless queries over body frames
pub struct SkeletalAnalyzer;

impl SkeletalAnalyzer {
    /// Tracked body with the smallest base-of-spine depth.
    ///
    /// Bodies whose spine base is missing or not tracked are skipped. Ties keep
    /// the earlier body.
    pub fn nearest_person(frame: &BodyFrame) -> Option<&Body> {
        let mut nearest: Option<(&Body, f32)> = None;

        for body in frame.tracked_bodies() {
            let Some(spine) = body.tracked_joint(JointType::SpineBase) else {
                continue;
            };
            let depth = spine.position.z;

            match nearest {
                Some((_, best)) if depth >= best => {}
                _ => nearest = Some((body, depth)),
            }
        }

        nearest.map(|(body, _)| body)
    }

    /// Angle at `vertex` between the rays to `a` and `c`, in degrees
    pub fn joint_angle(a: &Joint, vertex: &Joint, c: &Joint) -> Option<f32> {
        if !(a.is_tracked() && vertex.is_tracked() && c.is_tracked()) {
            return None;
        }

        let ba = a.position.sub(&vertex.position);
        let bc = c.position.sub(&vertex.position);
        let magnitude = ba.length() * bc.length();
        if magnitude == 0.0 {
            return None;
        }

        // Clamp against floating-point overshoot before acos
        let cosine = (ba.dot(&bc) / magnitude).clamp(-1.0, 1.0);
        Some(cosine.acos().to_degrees())
    }

    /// Elbow and knee flexion for both sides of a body
    pub fn joint_angles(body: &Body) -> JointAngles {
        JointAngles {
            left_elbow: Self::angle_of(
                body,
                JointType::ShoulderLeft,
                JointType::ElbowLeft,
                JointType::WristLeft,
            ),
            right_elbow: Self::angle_of(
                body,
                JointType::ShoulderRight,
                JointType::ElbowRight,
                JointType::WristRight,
            ),
            left_knee: Self::angle_of(
                body,
                JointType::HipLeft,
                JointType::KneeLeft,
                JointType::AnkleLeft,
            ),
            right_knee: Self::angle_of(
                body,
                JointType::HipRight,
                JointType::KneeRight,
                JointType::AnkleRight,
            ),
        }
    }

    fn angle_of(body: &Body, a: JointType, vertex: JointType, c: JointType) -> Option<f32> {
        let a = body.joint(a)?;
        let vertex = body.joint(vertex)?;
        let c = body.joint(c)?;
        Self::joint_angle(a, vertex, c)
    }
}
