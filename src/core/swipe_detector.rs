// Swipe detection - per-hand sliding-window classifier with cooldown

use crate::models::body::{Body, Joint, Side, Vector3};
use crate::models::gesture::{SwipeConfig, SwipeDirection, SwipeEvent, SwipeResult};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// One hand position in the window
#[derive(Debug, Clone, Copy)]
pub struct HandPositionSample {
    pub position: Vector3,
    pub timestamp: Instant,
    /// Driver capture time of the frame the sample came from
    pub frame_timestamp: i64,
}

/// Window and cooldown clock for one hand
#[derive(Debug, Default)]
struct HandTrackingState {
    window: VecDeque<HandPositionSample>,
    last_swipe: Option<Instant>,
}

impl HandTrackingState {
    fn cooling_down(&self, now: Instant, cooldown: Duration) -> bool {
        match self.last_swipe {
            Some(last) => now.saturating_duration_since(last) <= cooldown,
            None => false,
        }
    }

    fn prune(&mut self, now: Instant, tracking_duration: Duration) {
        while let Some(oldest) = self.window.front() {
            if now.saturating_duration_since(oldest.timestamp) > tracking_duration {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }

    fn reset(&mut self) {
        self.window.clear();
        self.last_swipe = None;
    }
}

/// Stateful swipe classifier, one window per hand
pub struct SwipeDetector {
    config: SwipeConfig,
    left: HandTrackingState,
    right: HandTrackingState,
}

impl SwipeDetector {
    pub fn new(config: SwipeConfig) -> Self {
        Self {
            config,
            left: HandTrackingState::default(),
            right: HandTrackingState::default(),
        }
    }

    pub fn config(&self) -> &SwipeConfig {
        &self.config
    }

    /// Feed one hand joint observed at `now`.
    ///
    /// Only fully tracked joints enter the window; anything else leaves the
    /// accumulated history untouched and yields no result.
    pub fn classify(&mut self, hand: Side, joint: &Joint, now: Instant) -> Option<SwipeResult> {
        self.classify_sample(hand, joint, now, 0)
    }

    /// Feed both hands of a body from one frame
    pub fn classify_body(&mut self, body: &Body, frame_timestamp: i64, now: Instant) -> Vec<SwipeEvent> {
        let mut events = Vec::new();
        for hand in [Side::Left, Side::Right] {
            let Some(joint) = body.joint(hand.hand()) else {
                continue;
            };
            if let Some(swipe) = self.classify_sample(hand, joint, now, frame_timestamp) {
                events.push(SwipeEvent { hand, swipe });
            }
        }
        events
    }

    /// Drop all history; used when no person is tracked
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }

    /// Number of samples currently held for a hand
    pub fn window_len(&self, hand: Side) -> usize {
        self.state(hand).window.len()
    }

    fn state(&self, hand: Side) -> &HandTrackingState {
        match hand {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn classify_sample(
        &mut self,
        hand: Side,
        joint: &Joint,
        now: Instant,
        frame_timestamp: i64,
    ) -> Option<SwipeResult> {
        if !joint.is_fully_tracked() {
            return None;
        }

        let tracking_duration = Duration::from_millis(self.config.tracking_duration_ms);
        let cooldown = Duration::from_millis(self.config.cooldown_period_ms);

        let state = match hand {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        };
        state.window.push_back(HandPositionSample {
            position: joint.position,
            timestamp: now,
            frame_timestamp,
        });
        state.prune(now, tracking_duration);

        if state.window.len() < 2 || state.cooling_down(now, cooldown) {
            return None;
        }

        let oldest = state.window.front()?;
        let newest = state.window.back()?;
        let result = Self::evaluate(&self.config, oldest, newest)?;

        // Fire and clear together so leftover samples cannot retrigger
        state.last_swipe = Some(now);
        state.window.clear();

        log::debug!(
            "{} hand swipe {} (distance {:.3}m, velocity {:.3}m/s)",
            hand.to_string(),
            result.direction.to_string(),
            result.distance,
            result.velocity
        );

        Some(result)
    }

    /// Classify the motion between two window endpoints
    fn evaluate(
        config: &SwipeConfig,
        oldest: &HandPositionSample,
        newest: &HandPositionSample,
    ) -> Option<SwipeResult> {
        let elapsed = newest
            .timestamp
            .saturating_duration_since(oldest.timestamp)
            .as_secs_f32();
        if elapsed == 0.0 {
            return None;
        }

        let delta = newest.position.sub(&oldest.position);
        let distance = delta.length();
        let velocity = distance / elapsed;
        if velocity < config.velocity_threshold {
            return None;
        }

        let (dx, dy, dz) = (delta.x, delta.y, delta.z);

        // Horizontal, then vertical, then depth; first match wins
        let direction = if dx.abs() > config.min_movement_distance
            && dy.abs() < config.max_vertical_change
        {
            if dx > 0.0 {
                SwipeDirection::Right
            } else {
                SwipeDirection::Left
            }
        } else if dy.abs() > config.min_movement_distance
            && dx.abs() < config.max_horizontal_change
        {
            // Y grows downward in sensor space
            if dy < 0.0 {
                SwipeDirection::Up
            } else {
                SwipeDirection::Down
            }
        } else if dz.abs() > config.min_movement_distance
            && dx.abs() < config.max_horizontal_change
            && dy.abs() < config.max_vertical_change
        {
            if dz < 0.0 {
                SwipeDirection::Forward
            } else {
                SwipeDirection::Backward
            }
        } else {
            return None;
        };

        Some(SwipeResult {
            direction,
            distance,
            velocity,
        })
    }
}

impl Default for SwipeDetector {
    fn default() -> Self {
        Self::new(SwipeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::body::{JointType, TrackingState};

    fn hand(x: f32, y: f32, z: f32) -> Joint {
        Joint::new(JointType::HandRight, Vector3::new(x, y, z), TrackingState::Tracked)
    }

    fn at(t0: Instant, ms: u64) -> Instant {
        t0 + Duration::from_millis(ms)
    }

    #[test]
    fn test_single_sample_never_classifies() {
        let mut detector = SwipeDetector::default();
        let t0 = Instant::now();
        assert!(detector.classify(Side::Right, &hand(0.0, 0.0, 1.0), t0).is_none());
        assert_eq!(detector.window_len(Side::Right), 1);
    }

    #[test]
    fn test_right_swipe_scenario() {
        let mut detector = SwipeDetector::default();
        let t0 = Instant::now();

        assert!(detector.classify(Side::Right, &hand(0.0, 0.0, 1.0), t0).is_none());
        // 0.125m over 200ms: velocity is fine but distance is below 0.15m
        assert!(detector
            .classify(Side::Right, &hand(0.125, 0.0, 1.0), at(t0, 200))
            .is_none());

        let swipe = detector
            .classify(Side::Right, &hand(0.25, 0.0, 1.0), at(t0, 400))
            .unwrap();
        assert_eq!(swipe.direction, SwipeDirection::Right);
        assert!((swipe.distance - 0.25).abs() < 1e-4);
        assert!((swipe.velocity - 0.625).abs() < 1e-3);
        assert_eq!(detector.window_len(Side::Right), 0);
    }

    #[test]
    fn test_left_swipe() {
        let mut detector = SwipeDetector::default();
        let t0 = Instant::now();
        detector.classify(Side::Left, &hand(0.3, 0.0, 1.0), t0);
        let swipe = detector
            .classify(Side::Left, &hand(0.0, 0.05, 1.0), at(t0, 300))
            .unwrap();
        assert_eq!(swipe.direction, SwipeDirection::Left);
    }

    #[test]
    fn test_horizontal_wins_over_vertical() {
        let mut detector = SwipeDetector::default();
        let t0 = Instant::now();
        // Both axes exceed the minimum and stay inside the other's bound
        detector.classify(Side::Right, &hand(0.0, 0.0, 1.0), t0);
        let swipe = detector
            .classify(Side::Right, &hand(0.2, 0.3, 1.0), at(t0, 300))
            .unwrap();
        assert_eq!(swipe.direction, SwipeDirection::Right);
    }

    #[test]
    fn test_vertical_and_depth_directions() {
        let t0 = Instant::now();

        let mut detector = SwipeDetector::default();
        detector.classify(Side::Right, &hand(0.0, 0.0, 1.0), t0);
        let up = detector.classify(Side::Right, &hand(0.0, -0.3, 1.0), at(t0, 300));
        assert_eq!(up.map(|s| s.direction), Some(SwipeDirection::Up));

        let mut detector = SwipeDetector::default();
        detector.classify(Side::Right, &hand(0.0, 0.0, 1.0), t0);
        let down = detector.classify(Side::Right, &hand(0.05, 0.3, 1.0), at(t0, 300));
        assert_eq!(down.map(|s| s.direction), Some(SwipeDirection::Down));

        let mut detector = SwipeDetector::default();
        detector.classify(Side::Right, &hand(0.0, 0.0, 1.5), t0);
        let forward = detector.classify(Side::Right, &hand(0.0, 0.0, 1.2), at(t0, 300));
        assert_eq!(forward.map(|s| s.direction), Some(SwipeDirection::Forward));

        let mut detector = SwipeDetector::default();
        detector.classify(Side::Right, &hand(0.0, 0.0, 1.2), t0);
        let backward = detector.classify(Side::Right, &hand(0.0, 0.0, 1.5), at(t0, 300));
        assert_eq!(backward.map(|s| s.direction), Some(SwipeDirection::Backward));
    }

    #[test]
    fn test_diagonal_outside_bounds_is_ignored() {
        let mut detector = SwipeDetector::default();
        let t0 = Instant::now();
        detector.classify(Side::Right, &hand(0.0, 0.0, 1.0), t0);
        assert!(detector
            .classify(Side::Right, &hand(0.4, 0.4, 1.0), at(t0, 300))
            .is_none());
    }

    #[test]
    fn test_slow_motion_is_ignored() {
        let config = SwipeConfig {
            velocity_threshold: 1.0,
            ..SwipeConfig::default()
        };
        let mut detector = SwipeDetector::new(config);
        let t0 = Instant::now();
        detector.classify(Side::Right, &hand(0.0, 0.0, 1.0), t0);
        assert!(detector
            .classify(Side::Right, &hand(0.3, 0.0, 1.0), at(t0, 600))
            .is_none());
    }

    #[test]
    fn test_zero_elapsed_time_is_ignored() {
        let mut detector = SwipeDetector::default();
        let t0 = Instant::now();
        detector.classify(Side::Right, &hand(0.0, 0.0, 1.0), t0);
        assert!(detector.classify(Side::Right, &hand(0.5, 0.0, 1.0), t0).is_none());
        assert_eq!(detector.window_len(Side::Right), 2);
    }

    #[test]
    fn test_window_cleared_after_swipe() {
        let mut detector = SwipeDetector::new(SwipeConfig {
            cooldown_period_ms: 0,
            ..SwipeConfig::default()
        });
        let t0 = Instant::now();
        detector.classify(Side::Right, &hand(0.0, 0.0, 1.0), t0);
        assert!(detector
            .classify(Side::Right, &hand(0.3, 0.0, 1.0), at(t0, 200))
            .is_some());

        // A sample that would have swiped against the pre-clear window
        assert!(detector
            .classify(Side::Right, &hand(0.6, 0.0, 1.0), at(t0, 250))
            .is_none());
        assert_eq!(detector.window_len(Side::Right), 1);
    }

    #[test]
    fn test_cooldown_blocks_retrigger() {
        let mut detector = SwipeDetector::default();
        let t0 = Instant::now();
        detector.classify(Side::Right, &hand(0.0, 0.0, 1.0), t0);
        assert!(detector
            .classify(Side::Right, &hand(0.3, 0.0, 1.0), at(t0, 200))
            .is_some());

        detector.classify(Side::Right, &hand(0.3, 0.0, 1.0), at(t0, 500));
        assert!(detector
            .classify(Side::Right, &hand(0.0, 0.0, 1.0), at(t0, 900))
            .is_none());

        // Past the 800ms cooldown and still inside the 700ms window
        let swipe = detector
            .classify(Side::Right, &hand(0.0, 0.0, 1.0), at(t0, 1100))
            .unwrap();
        assert_eq!(swipe.direction, SwipeDirection::Left);
    }

    #[test]
    fn test_cooldown_boundary_is_exclusive() {
        let mut detector = SwipeDetector::default();
        let t0 = Instant::now();
        detector.classify(Side::Right, &hand(0.0, 0.0, 1.0), t0);
        assert!(detector
            .classify(Side::Right, &hand(0.3, 0.0, 1.0), at(t0, 200))
            .is_some());

        detector.classify(Side::Right, &hand(0.3, 0.0, 1.0), at(t0, 500));
        // Exactly 800ms after the last swipe is still cooling down
        assert!(detector
            .classify(Side::Right, &hand(0.0, 0.0, 1.0), at(t0, 1000))
            .is_none());
        assert_eq!(detector.window_len(Side::Right), 2);

        let swipe = detector
            .classify(Side::Right, &hand(0.0, 0.0, 1.0), at(t0, 1001))
            .unwrap();
        assert_eq!(swipe.direction, SwipeDirection::Left);
    }

    #[test]
    fn test_prune_keeps_sample_at_exact_duration() {
        let mut detector = SwipeDetector::default();
        let t0 = Instant::now();
        detector.classify(Side::Right, &hand(0.0, 0.0, 1.0), t0);

        // 700ms old is not older than the tracking duration
        detector.classify(Side::Right, &hand(0.01, 0.0, 1.0), at(t0, 700));
        assert_eq!(detector.window_len(Side::Right), 2);

        detector.classify(Side::Right, &hand(0.02, 0.0, 1.0), at(t0, 701));
        assert_eq!(detector.window_len(Side::Right), 2);
    }

    #[test]
    fn test_old_samples_are_pruned() {
        let mut detector = SwipeDetector::default();
        let t0 = Instant::now();
        detector.classify(Side::Right, &hand(0.0, 0.0, 1.0), t0);
        detector.classify(Side::Right, &hand(0.01, 0.0, 1.0), at(t0, 600));
        assert_eq!(detector.window_len(Side::Right), 2);

        // The t0 sample is now older than 700ms
        assert!(detector
            .classify(Side::Right, &hand(0.02, 0.0, 1.0), at(t0, 800))
            .is_none());
        assert_eq!(detector.window_len(Side::Right), 2);
    }

    #[test]
    fn test_inferred_hand_keeps_history() {
        let mut detector = SwipeDetector::default();
        let t0 = Instant::now();
        detector.classify(Side::Right, &hand(0.0, 0.0, 1.0), t0);

        let inferred = Joint::new(
            JointType::HandRight,
            Vector3::new(0.3, 0.0, 1.0),
            TrackingState::Inferred,
        );
        assert!(detector.classify(Side::Right, &inferred, at(t0, 100)).is_none());
        assert_eq!(detector.window_len(Side::Right), 1);

        assert!(detector
            .classify(Side::Right, &hand(0.3, 0.0, 1.0), at(t0, 200))
            .is_some());
    }

    #[test]
    fn test_hands_are_independent() {
        let mut detector = SwipeDetector::default();
        let t0 = Instant::now();
        detector.classify(Side::Left, &hand(0.0, 0.0, 1.0), t0);
        assert!(detector
            .classify(Side::Right, &hand(0.3, 0.0, 1.0), at(t0, 200))
            .is_none());
        assert_eq!(detector.window_len(Side::Left), 1);
        assert_eq!(detector.window_len(Side::Right), 1);
    }

    #[test]
    fn test_reset_clears_windows_and_cooldown() {
        let mut detector = SwipeDetector::default();
        let t0 = Instant::now();
        detector.classify(Side::Right, &hand(0.0, 0.0, 1.0), t0);
        detector.classify(Side::Right, &hand(0.3, 0.0, 1.0), at(t0, 200));
        detector.classify(Side::Left, &hand(0.0, 0.0, 1.0), at(t0, 200));

        detector.reset();
        assert_eq!(detector.window_len(Side::Left), 0);

        // No cooldown carried across the reset
        detector.classify(Side::Right, &hand(0.0, 0.0, 1.0), at(t0, 300));
        assert!(detector
            .classify(Side::Right, &hand(0.3, 0.0, 1.0), at(t0, 400))
            .is_some());
    }

    #[test]
    fn test_classify_body_reports_hand() {
        let mut detector = SwipeDetector::default();
        let t0 = Instant::now();
        let body = |x: f32| {
            Body::new(1).with_joint(Joint::new(
                JointType::HandLeft,
                Vector3::new(x, 0.0, 1.0),
                TrackingState::Tracked,
            ))
        };

        assert!(detector.classify_body(&body(0.0), 10, t0).is_empty());
        let events = detector.classify_body(&body(-0.3), 20, at(t0, 200));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].hand, Side::Left);
        assert_eq!(events[0].swipe.direction, SwipeDirection::Left);
    }
}
