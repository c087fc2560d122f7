use kinect_bridge::core::body_tracker::BodyTracker;
use kinect_bridge::core::config::Config;
use kinect_bridge::core::events::{EventKind, EventSubscription, StreamEvent};
use kinect_bridge::core::stream_dispatcher::StreamDispatcher;
use kinect_bridge::models::gesture::BodyUpdate;
use kinect_bridge::models::stream::{SensorFrame, StreamType};
use kinect_bridge::platform::simulated::{synthetic_body_frame, SimulatedSensor};
use kinect_bridge::platform::{ReplaySensor, SensorDriver};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Failed to load configuration, using defaults: {}", e);
            Config::default()
        }
    };

    let (driver, mut frames): (Arc<dyn SensorDriver>, mpsc::UnboundedReceiver<SensorFrame>) =
        match &config.replay_path {
            Some(path) => {
                let (sensor, frames) = ReplaySensor::load(path, config.replay_loop)?;
                (sensor as Arc<dyn SensorDriver>, frames)
            }
            None => {
                log::info!("No recording configured, using simulated sensor");
                let (sensor, frames) = SimulatedSensor::new();
                let source = sensor.clone();
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(Duration::from_millis(33));
                    let start = tokio::time::Instant::now();
                    loop {
                        ticker.tick().await;
                        let elapsed = start.elapsed().as_millis() as i64;
                        source.emit(SensorFrame::Body(Arc::new(synthetic_body_frame(elapsed))));
                    }
                });
                (sensor as Arc<dyn SensorDriver>, frames)
            }
        };

    let mut dispatcher = StreamDispatcher::new(driver, &config);
    dispatcher.initialize().await?;

    for stream in &config.streams {
        if let Err(e) = dispatcher.open(*stream).await {
            log::error!("{}", e);
        }
    }
    if dispatcher.active_streams().is_empty() {
        log::error!("No streams could be opened");
        dispatcher.close_all().await?;
        return Ok(());
    }

    let (update_tx, mut updates) = mpsc::channel(32);
    let tracker = BodyTracker::new(&config);
    log::info!("Body tracking session {}", tracker.session_id());
    // Composite frames are re-emitted as body frames, so one kind covers both
    let tracker_handle =
        tracker.spawn(dispatcher.subscribe_to(&[EventKind::Frame(StreamType::Body)]), update_tx);
    let mut rates = dispatcher.subscribe_to(&[EventKind::Rates]);

    log::info!(
        "Streaming {:?}, press Ctrl+C to stop",
        dispatcher.active_streams()
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    run_until(&mut dispatcher, &mut frames, &mut updates, &mut rates, shutdown).await?;

    if let Err(e) = dispatcher.close_all().await {
        log::error!("{}", e);
    }
    drop(dispatcher);
    drop(updates);
    let _ = tracker_handle.await;

    Ok(())
}

/// Pump driver frames until `shutdown` resolves or the sensor stops
async fn run_until<D, S>(
    dispatcher: &mut StreamDispatcher<D>,
    frames: &mut mpsc::UnboundedReceiver<SensorFrame>,
    updates: &mut mpsc::Receiver<BodyUpdate>,
    rates: &mut EventSubscription,
    shutdown: S,
) -> Result<(), Box<dyn std::error::Error>>
where
    D: SensorDriver + ?Sized,
    S: Future<Output = ()>,
{
    // Pinned once so a signal arriving between iterations is not lost
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            frame = frames.recv() => match frame {
                Some(frame) => dispatcher.handle_frame(frame),
                None => {
                    log::info!("Sensor frame channel closed");
                    break;
                }
            },
            Some(update) = updates.recv() => match serde_json::to_string(&update) {
                Ok(json) => println!("{}", json),
                Err(e) => log::error!("Failed to serialize body update: {}", e),
            },
            Some(event) = rates.recv() => {
                if let StreamEvent::Rates(snapshot) = event {
                    log::debug!("Frame rates: {}", serde_json::to_string(&snapshot)?);
                }
            }
            _ = &mut shutdown => {
                log::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
