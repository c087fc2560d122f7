// Stream dispatcher - owns reader lifecycles and republishes frames as typed events

use crate::core::config::Config;
use crate::core::events::{EventKind, EventSubscription, RateSnapshot, StreamEvent};
use crate::core::frame_store::FrameStore;
use crate::core::rate_meter::RateMeter;
use crate::models::stream::{FrameSourceTypes, SensorFrame, StreamError, StreamResult, StreamType};
use crate::platform::SensorDriver;
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// State kept for each stream type while it is being tracked
#[derive(Debug)]
struct StreamState {
    meter: RateMeter,
    /// Sub-frame kinds requested, composite stream only
    sources: Option<FrameSourceTypes>,
}

/// Owns the open/close lifecycle of every reader and fans frames out to subscribers.
///
/// All methods take `&mut self`, so lifecycle operations and frame handling
/// never interleave on one dispatcher.
pub struct StreamDispatcher<D: SensorDriver + ?Sized> {
    driver: Arc<D>,
    sensor_open: bool,
    streams: HashMap<StreamType, StreamState>,
    frames: FrameStore,
    multi_source_types: FrameSourceTypes,
    rate_window: Duration,
    event_tx: broadcast::Sender<StreamEvent>,
}

impl<D: SensorDriver + ?Sized> StreamDispatcher<D> {
    pub fn new(driver: Arc<D>, config: &Config) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            driver,
            sensor_open: false,
            streams: HashMap::new(),
            frames: FrameStore::new(),
            multi_source_types: config.multi_source_mask(),
            rate_window: Duration::from_millis(config.rate_window_ms),
            event_tx,
        }
    }

    /// Subscribe to every event
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.event_tx.subscribe()
    }

    /// Subscribe to a fixed set of event kinds
    pub fn subscribe_to(&self, kinds: &[EventKind]) -> EventSubscription {
        EventSubscription::new(self.event_tx.subscribe(), kinds.to_vec())
    }

    // ==========================================================================
    // Lifecycle
    // ==========================================================================

    /// Acquire the sensor handle; a no-op when already open
    pub async fn initialize(&mut self) -> StreamResult<()> {
        if self.sensor_open {
            return Ok(());
        }

        self.driver
            .open_sensor()
            .await
            .map_err(|e| StreamError::SensorFailed(e.to_string()))?;
        self.sensor_open = true;

        log::info!("Sensor opened");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.sensor_open
    }

    /// Start tracking a stream. Succeeds immediately if already tracking.
    pub async fn open(&mut self, stream: StreamType) -> StreamResult<()> {
        if stream == StreamType::MultiSource {
            let sources = self.multi_source_types;
            return self.open_multi_source(sources).await;
        }
        self.open_reader(stream, None).await
    }

    /// Start the composite stream with an explicit sub-frame mask
    pub async fn open_multi_source(&mut self, sources: FrameSourceTypes) -> StreamResult<()> {
        if sources.is_empty() {
            return Err(StreamError::OpenFailed {
                stream: StreamType::MultiSource,
                reason: "no frame sources requested".to_string(),
            });
        }
        self.open_reader(StreamType::MultiSource, Some(sources)).await
    }

    async fn open_reader(
        &mut self,
        stream: StreamType,
        sources: Option<FrameSourceTypes>,
    ) -> StreamResult<()> {
        if !self.sensor_open {
            return Err(StreamError::NotInitialized);
        }
        if self.streams.contains_key(&stream) {
            log::debug!("{} stream already open", stream);
            return Ok(());
        }

        let result = match sources {
            Some(mask) => self.driver.open_multi_source_reader(mask).await,
            None => self.driver.open_reader(stream).await,
        };
        result.map_err(|e| StreamError::OpenFailed {
            stream,
            reason: e.to_string(),
        })?;

        // Only mark as tracking once the driver has accepted
        self.streams.insert(
            stream,
            StreamState {
                meter: RateMeter::new(Self::now(), self.rate_window),
                sources,
            },
        );

        log::info!("Opened {} stream", stream);
        Ok(())
    }

    /// Stop tracking a stream. Succeeds immediately if not tracking.
    pub async fn close(&mut self, stream: StreamType) -> StreamResult<()> {
        if !self.streams.contains_key(&stream) {
            return Ok(());
        }

        if stream.has_native_close() {
            self.driver
                .close_reader(stream)
                .await
                .map_err(|e| StreamError::CloseFailed {
                    stream,
                    reason: e.to_string(),
                })?;
        }

        self.teardown(stream);
        log::info!("Closed {} stream", stream);
        Ok(())
    }

    /// Close every active stream concurrently, then release the sensor.
    ///
    /// Streams that close successfully stay closed even when others fail; all
    /// failures are reported together.
    pub async fn close_all(&mut self) -> StreamResult<()> {
        if !self.sensor_open {
            return Ok(());
        }

        let active = self.active_streams();
        let results = {
            let driver = &self.driver;
            join_all(active.iter().map(|&stream| async move {
                if !stream.has_native_close() {
                    return Ok(());
                }
                driver
                    .close_reader(stream)
                    .await
                    .map_err(|e| StreamError::CloseFailed {
                        stream,
                        reason: e.to_string(),
                    })
            }))
            .await
        };

        let mut errors = Vec::new();
        for (stream, result) in active.into_iter().zip(results) {
            match result {
                Ok(()) => self.teardown(stream),
                Err(e) => {
                    log::error!("{}", e);
                    errors.push(e);
                }
            }
        }

        match self.driver.close_sensor().await {
            Ok(()) => {
                // Readers cannot outlive the sensor handle
                self.sensor_open = false;
                self.streams.clear();
                self.frames.clear_all();
                log::info!("Sensor closed");
            }
            Err(e) => {
                let err = StreamError::SensorFailed(e.to_string());
                log::error!("{}", err);
                errors.push(err);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(StreamError::TeardownFailed(errors))
        }
    }

    fn teardown(&mut self, stream: StreamType) {
        self.streams.remove(&stream);
        self.frames.clear(stream);
    }

    // ==========================================================================
    // Frame arrival
    // ==========================================================================

    /// Handle a frame delivered by the driver
    pub fn handle_frame(&mut self, frame: SensorFrame) {
        self.handle_frame_at(frame, Self::now());
    }

    /// Handle a frame that arrived at `now`.
    ///
    /// Frames for streams that are not being tracked are dropped. Composite
    /// frames are additionally re-emitted as one event per requested sub-frame.
    pub fn handle_frame_at(&mut self, frame: SensorFrame, now: Instant) {
        let stream = frame.stream_type();
        let Some(state) = self.streams.get_mut(&stream) else {
            log::trace!("Dropping {} frame, stream not open", stream);
            return;
        };

        let rate_ticked = state.meter.record(now).is_some();

        let sub_frames = match (&frame, state.sources) {
            (SensorFrame::MultiSource(multi), Some(sources)) => multi
                .sub_frames()
                .into_iter()
                .filter(|sub| {
                    sub.stream_type()
                        .source_bit()
                        .map(|bit| sources.contains(bit))
                        .unwrap_or(false)
                })
                .collect(),
            _ => Vec::new(),
        };

        self.frames.put(frame.clone());
        self.publish(StreamEvent::Frame(frame));
        for sub in sub_frames {
            self.publish(StreamEvent::Frame(sub));
        }

        if rate_ticked {
            let snapshot = self.rates();
            log::debug!("Frame rates: {:?}", snapshot.0);
            self.publish(StreamEvent::Rates(snapshot));
        }
    }

    fn publish(&self, event: StreamEvent) {
        // No subscribers is not an error
        let _ = self.event_tx.send(event);
    }

    fn now() -> Instant {
        tokio::time::Instant::now().into_std()
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    pub fn is_tracking(&self, stream: StreamType) -> bool {
        self.streams.contains_key(&stream)
    }

    /// Streams currently being tracked, in a stable order
    pub fn active_streams(&self) -> Vec<StreamType> {
        let mut streams: Vec<_> = self.streams.keys().copied().collect();
        streams.sort();
        streams
    }

    /// Most recent frame of a stream
    pub fn latest_frame(&self, stream: StreamType) -> Option<&SensorFrame> {
        self.frames.get(stream)
    }

    /// Latest known rate of every active stream
    pub fn rates(&self) -> RateSnapshot {
        RateSnapshot(
            self.streams
                .iter()
                .map(|(stream, state)| (*stream, state.meter.rate()))
                .collect::<BTreeMap<_, _>>(),
        )
    }
}
