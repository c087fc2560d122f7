pub mod config;
pub mod events;
pub mod frame_store;
pub mod rate_meter;
pub mod stream_dispatcher;

// Skeletal analysis and gesture recognition
pub mod body_tracker;
pub mod gesture_detector;
pub mod skeletal_analyzer;
pub mod swipe_detector;
