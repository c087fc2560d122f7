// Body tracking pipeline - turns body frames into derived updates for the broadcaster

use crate::core::config::Config;
use crate::core::events::{EventSubscription, StreamEvent};
use crate::core::gesture_detector::GestureDetector;
use crate::core::skeletal_analyzer::SkeletalAnalyzer;
use crate::core::swipe_detector::SwipeDetector;
use crate::models::body::BodyFrame;
use crate::models::gesture::BodyUpdate;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Derives per-frame signals for the nearest tracked person
pub struct BodyTracker {
    session_id: String,
    gestures: GestureDetector,
    swipes: SwipeDetector,
    current_person: Option<u64>,
}

impl BodyTracker {
    pub fn new(config: &Config) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            gestures: GestureDetector::new(config.hand_raise_margin_m, config.jump_threshold_m),
            swipes: SwipeDetector::new(config.swipe.clone()),
            current_person: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Process one body frame observed at `now`.
    ///
    /// Returns `None` and resets swipe history when nobody qualifies.
    pub fn process(&mut self, frame: &BodyFrame, now: Instant) -> Option<BodyUpdate> {
        let Some(body) = SkeletalAnalyzer::nearest_person(frame) else {
            if self.current_person.take().is_some() {
                log::info!("Lost tracked person, resetting swipe history");
            }
            self.swipes.reset();
            return None;
        };

        if self.current_person != Some(body.tracking_id) {
            log::info!("Tracking person {}", body.tracking_id);
            // Another person's hand history must not feed this one's swipes
            self.swipes.reset();
            self.current_person = Some(body.tracking_id);
        }

        let swipes = self.swipes.classify_body(body, frame.timestamp, now);
        for event in &swipes {
            log::info!(
                "Swipe {} with {} hand ({:.2} m/s)",
                event.swipe.direction.to_string(),
                event.hand.to_string(),
                event.swipe.velocity
            );
        }

        Some(BodyUpdate {
            session_id: self.session_id.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            frame_timestamp: frame.timestamp,
            tracking_id: body.tracking_id,
            angles: SkeletalAnalyzer::joint_angles(body),
            posture: self.gestures.posture(body),
            swipes,
        })
    }

    /// Run the tracker in the background, forwarding updates to `tx`.
    ///
    /// Stops when the subscription closes or the receiver is dropped. Body
    /// frames arrive either on the body stream or inside composite frames.
    pub fn spawn(
        mut self,
        mut events: EventSubscription,
        tx: mpsc::Sender<BodyUpdate>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let StreamEvent::Frame(frame) = event else {
                    continue;
                };
                let Some(body_frame) = frame.as_body() else {
                    continue;
                };

                let now = tokio::time::Instant::now().into_std();
                if let Some(update) = self.process(body_frame, now) {
                    if tx.send(update).await.is_err() {
                        log::debug!("Body update receiver dropped, stopping tracker");
                        break;
                    }
                }
            }
        })
    }
}
