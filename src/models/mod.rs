// Data models for sensor streams, skeletal tracking and derived gesture signals

pub mod body;
pub mod gesture;
pub mod stream;
