// Demo host: drives the recorder from a simulated 60 Hz update loop.
//
// Usage: modality-recorder [settings.json] [seconds]

use anyhow::{bail, Context, Result};
use modality_recorder::capture::{Resolution, ScrollingGradientSource};
use modality_recorder::export::{self, ExportStage, MemorySinkFactory, VideoExporter};
use modality_recorder::recorder::{KeyEdges, KeyId, RecordingController, RecordingEvent, StopOutcome};
use modality_recorder::RecordingSettings;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const HOST_DELTA: Duration = Duration::from_nanos(16_666_667);

#[tokio::main]
async fn main() -> Result<()> {
    modality_recorder::init_tracing();
    tracing::info!("Starting Modality Recorder v{}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => RecordingSettings::load_or_default(&PathBuf::from(path))?,
        None => RecordingSettings::default(),
    };
    let seconds: u32 = match args.next() {
        Some(s) => s.parse().with_context(|| format!("invalid duration {:?}", s))?,
        None => 2,
    };

    let project_dir = std::env::current_dir().context("no working directory")?;
    let exporter = if export::ffmpeg_available() {
        VideoExporter::new(project_dir)
    } else {
        tracing::warn!("ffmpeg not found on PATH, encoding into memory only");
        VideoExporter::with_sink_factory(project_dir, Arc::new(MemorySinkFactory::new()))
    };

    let source = ScrollingGradientSource::new(Resolution::new(320, 180));
    let mut recorder = RecordingController::new(settings.clone(), Box::new(source), exporter)
        .with_runtime(tokio::runtime::Handle::current());

    let mut events = recorder.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                RecordingEvent::ExportProgress(progress) => {
                    if progress.stage == ExportStage::Encoding {
                        tracing::debug!(
                            "Encoding frame {}/{} ({:.0}%)",
                            progress.current_frame,
                            progress.total_frames,
                            progress.percent
                        );
                    }
                }
                RecordingEvent::CaptureSkipped { reason, .. } => {
                    tracing::warn!("Capture skipped: {}", reason)
                }
                other => tracing::info!("{:?}", other),
            }
        }
    });

    // Hold the start key for a few frames, as a player would
    let mut keys = KeyEdges::new();
    match &settings.start_capture_key {
        Some(key) => {
            for _ in 0..3 {
                keys.update([key.clone()]);
                let _ = recorder.tick(HOST_DELTA, &keys);
            }
            keys.update(Vec::<KeyId>::new());
        }
        None => {
            recorder.start_recording();
        }
    }

    let ticks = seconds * 60;
    for _ in 0..ticks {
        let _ = recorder.tick(HOST_DELTA, &keys);
    }
    tracing::info!(
        "Buffered {} frames ({:?})",
        recorder.buffered_frames(),
        recorder.recording_duration()
    );

    let mut outcome = recorder.stop_recording_in_background()?;
    while let StopOutcome::ExportStarted = outcome {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if let Some(result) = recorder.poll_export() {
            outcome = result?;
        }
    }

    let Some(report) = outcome.report().cloned() else {
        bail!("nothing was recorded");
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if export::ffmpeg_available() {
        match export::probe_video(&report.output_path) {
            Ok(info) => println!(
                "{}: {} frames at {} ({} fps)",
                report.output_path.display(),
                info.frame_count,
                info.resolution,
                info.fps
            ),
            Err(e) => tracing::warn!("Could not probe {:?}: {}", report.output_path, e),
        }
    }

    Ok(())
}
