//! Headless playback of a search result queue
//!
//! Drives the playback controller on the virtual engine: the clock advances
//! by `speed` times wall time, engine notifications are pumped every step and
//! the progress timer is ticked when due.

use std::io::{self, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use xasd_playback::{
    PlaybackConfig, PlaybackController, PlaybackEvent, PlaybackState, Track, VirtualEngine,
};

const STEP: Duration = Duration::from_millis(250);

pub struct PlayOptions {
    /// Virtual seconds per wall-clock second
    pub speed: f64,
    /// Length given to every virtual source
    pub track_length: Duration,
    pub volume: Option<u8>,
}

/// Queue `tracks`, play the first and run until the queue is exhausted
pub async fn play_queue(
    config: PlaybackConfig,
    tracks: Vec<Track>,
    options: PlayOptions,
) -> anyhow::Result<()> {
    let Some(first) = tracks.first().cloned() else {
        println!("Nothing to play");
        return Ok(());
    };

    let engine = VirtualEngine::new(options.track_length);
    let mut controller = PlaybackController::new(config, Box::new(engine.clone()))?;

    if let Some(volume) = options.volume {
        controller.set_volume(volume);
    }
    for track in tracks {
        controller.enqueue(track)?;
    }
    info!(tracks = controller.queue_len(), "Queue ready");

    controller.select(first)?;
    let events = controller.drain_events();
    print_events(&controller, events);

    let speed = if options.speed.is_finite() && options.speed > 0.0 {
        options.speed
    } else {
        1.0
    };
    let mut interval = tokio::time::interval(STEP);

    loop {
        interval.tick().await;

        engine.advance(STEP.mul_f64(speed));
        engine.pump(&mut controller);

        let now = Instant::now();
        if controller.next_deadline().is_some_and(|deadline| deadline <= now) {
            controller.tick(now);
        }

        let events = controller.drain_events();
        print_events(&controller, events);

        if controller.state() == PlaybackState::Stopped {
            debug!("Playback finished");
            break;
        }
    }

    println!();
    Ok(())
}

fn print_events(controller: &PlaybackController, events: Vec<PlaybackEvent>) {
    let mut stdout = io::stdout();

    for event in events {
        match event {
            PlaybackEvent::TrackChanged { .. } => {
                let title = controller.current_title().unwrap_or_default();
                let artist = controller.current_artist().unwrap_or_default();
                let _ = writeln!(stdout, "\nNow playing: {} - {}", artist, title);
            }
            PlaybackEvent::PositionUpdate { .. } => {
                let display = controller.display();
                let _ = write!(
                    stdout,
                    "\r  {} / {} ({:>3.0}%)",
                    display.timestamp, display.track_length, display.percentage
                );
            }
            PlaybackEvent::TrackFinished { track_id } => {
                debug!(track_id = %track_id, "Track finished");
            }
            PlaybackEvent::Error { message } => {
                eprintln!("\nError: {}", message);
            }
            _ => {}
        }
    }

    let _ = stdout.flush();
}
