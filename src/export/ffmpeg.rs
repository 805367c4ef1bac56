//! FFmpeg encoder wrapper
//!
//! Composite frames are piped as raw RGB24 into an `ffmpeg` child process,
//! which encodes them into the output container.

use crate::capture::Resolution;
use crate::export::sink::{VideoSink, VideoSinkFactory};
use crate::export::types::{EncoderSettings, ExportError, ExportFormat};
use image::RgbImage;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};

/// Check whether an `ffmpeg` binary is reachable on PATH
pub fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Build the FFmpeg argument list for an encoder
fn encoder_args(settings: &EncoderSettings) -> Vec<String> {
    let crf = settings.quality.crf();

    let mut args = vec![
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgb24".to_string(),
        "-s".to_string(),
        settings.resolution.to_string(),
        "-r".to_string(),
        settings.fps.to_string(),
        "-i".to_string(),
        "-".to_string(), // stdin for video frames
        "-c:v".to_string(),
        settings.format.video_codec().to_string(),
    ];

    match settings.format {
        ExportFormat::Mp4 => {
            args.extend([
                "-preset".to_string(),
                settings.quality.h264_preset().to_string(),
                "-crf".to_string(),
                crf.to_string(),
                "-pix_fmt".to_string(),
                "yuv420p".to_string(),
                "-movflags".to_string(),
                "+faststart".to_string(),
            ]);
        }
        ExportFormat::Webm => {
            args.extend([
                "-crf".to_string(),
                crf.to_string(),
                "-b:v".to_string(),
                "0".to_string(),
                "-pix_fmt".to_string(),
                "yuv420p".to_string(),
            ]);
        }
    }

    args.push(settings.output_path.to_string_lossy().to_string());
    args
}

/// Opens [`FfmpegSink`]s
#[derive(Debug, Clone)]
pub struct FfmpegSinkFactory {
    program: PathBuf,
}

impl FfmpegSinkFactory {
    /// Use `ffmpeg` from PATH
    pub fn new() -> Self {
        Self::with_program("ffmpeg")
    }

    /// Use a specific FFmpeg binary
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfmpegSinkFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSinkFactory for FfmpegSinkFactory {
    fn open(&self, settings: &EncoderSettings) -> Result<Box<dyn VideoSink>, ExportError> {
        Ok(Box::new(FfmpegSink::spawn(&self.program, settings)?))
    }
}

/// Video encoder using FFmpeg for export output
pub struct FfmpegSink {
    process: Child,
    stdin: Option<ChildStdin>,
    output_path: PathBuf,
    frame_size: usize,
    frame_count: u64,
}

impl FfmpegSink {
    /// Spawn FFmpeg from PATH reading raw frames from stdin
    pub fn open(settings: &EncoderSettings) -> Result<Self, ExportError> {
        Self::spawn(Path::new("ffmpeg"), settings)
    }

    fn spawn(program: &Path, settings: &EncoderSettings) -> Result<Self, ExportError> {
        let args = encoder_args(settings);
        tracing::info!("Starting FFmpeg encoder {:?}: {:?}", program, args);

        let mut process = Command::new(program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExportError::EncoderOpen(format!("Failed to start FFmpeg: {}", e)))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| ExportError::EncoderOpen("Failed to capture FFmpeg stdin".to_string()))?;

        let Resolution { width, height } = settings.resolution;
        Ok(Self {
            process,
            stdin: Some(stdin),
            output_path: settings.output_path.clone(),
            frame_size: width as usize * height as usize * 3,
            frame_count: 0,
        })
    }

    /// Get number of frames written
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Close stdin, wait for FFmpeg and collect its diagnostics
    fn close(&mut self) -> Result<(ExitStatus, String), ExportError> {
        // Close stdin to signal EOF to FFmpeg
        drop(self.stdin.take());

        let mut stderr = String::new();
        if let Some(mut pipe) = self.process.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }

        let status = self
            .process
            .wait()
            .map_err(|e| ExportError::Ffmpeg(format!("Failed to wait for FFmpeg: {}", e)))?;
        Ok((status, stderr.trim().to_string()))
    }

    /// Classify an FFmpeg exit. Nothing written to the output means the
    /// codec or container never opened.
    fn exit_error(&self, status: ExitStatus, stderr: String) -> ExportError {
        let message = if stderr.is_empty() {
            format!("FFmpeg exited with {}", status)
        } else {
            stderr
        };

        let wrote_output = std::fs::metadata(&self.output_path)
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if wrote_output {
            ExportError::Ffmpeg(message)
        } else {
            ExportError::EncoderOpen(message)
        }
    }
}

impl VideoSink for FfmpegSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), ExportError> {
        let data = frame.as_raw();
        if data.len() != self.frame_size {
            return Err(ExportError::Encoding(format!(
                "Frame has {} bytes, encoder expects {}",
                data.len(),
                self.frame_size
            )));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ExportError::Encoding("Encoder already closed".to_string()))?;

        if let Err(e) = stdin.write_all(data) {
            tracing::warn!("FFmpeg stopped reading frames: {}", e);
            // FFmpeg gave up; its stderr says why
            let (status, stderr) = self.close()?;
            if status.success() {
                return Err(ExportError::Encoding(format!("Failed to write frame: {}", e)));
            }
            return Err(self.exit_error(status, stderr));
        }

        self.frame_count += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<u64, ExportError> {
        let (status, stderr) = self.close()?;
        if !status.success() {
            return Err(self.exit_error(status, stderr));
        }

        tracing::info!("FFmpeg encoder finished: {} frames written", self.frame_count);
        Ok(self.frame_count)
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        // Abandoned before finish(): don't let FFmpeg finalize a partial file
        if self.stdin.take().is_some() {
            let _ = self.process.kill();
        }
        let _ = self.process.wait();
    }
}

/// Basic facts about an encoded video
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub resolution: Resolution,
    pub frame_count: u64,
    pub fps: f64,
}

/// Probe a video file with ffprobe, counting decoded packets
pub fn probe_video(video_path: &Path) -> Result<VideoInfo, ExportError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-count_packets",
            "-show_entries",
            "stream=width,height,r_frame_rate,nb_read_packets",
            "-of",
            "csv=p=0",
        ])
        .arg(video_path)
        .output()
        .map_err(|e| ExportError::Ffmpeg(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExportError::Ffmpeg(format!("ffprobe failed: {}", stderr)));
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `width,height,r_frame_rate,nb_read_packets`
fn parse_probe_output(stdout: &str) -> Result<VideoInfo, ExportError> {
    let parts: Vec<&str> = stdout.trim().split(',').collect();
    if parts.len() < 4 {
        return Err(ExportError::Ffmpeg(format!(
            "Unexpected ffprobe output: {}",
            stdout
        )));
    }

    let width: u32 = parts[0]
        .parse()
        .map_err(|_| ExportError::Ffmpeg("Invalid width".to_string()))?;
    let height: u32 = parts[1]
        .parse()
        .map_err(|_| ExportError::Ffmpeg("Invalid height".to_string()))?;

    // Parse frame rate (format: "30/1" or "30000/1001")
    let fps = match parts[2].split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().unwrap_or(30.0);
            let den: f64 = den.parse().unwrap_or(1.0);
            num / den
        }
        None => parts[2].parse().unwrap_or(30.0),
    };

    let frame_count: u64 = parts[3]
        .parse()
        .map_err(|_| ExportError::Ffmpeg("Invalid packet count".to_string()))?;

    Ok(VideoInfo {
        resolution: Resolution::new(width, height),
        frame_count,
        fps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::types::ExportQuality;
    use image::Rgb;
    use tempfile::tempdir;

    fn settings(path: PathBuf, format: ExportFormat) -> EncoderSettings {
        EncoderSettings {
            output_path: path,
            resolution: Resolution::new(128, 96),
            fps: 30,
            format,
            quality: ExportQuality::Low,
        }
    }

    #[test]
    fn test_mp4_args() {
        let args = encoder_args(&settings(PathBuf::from("/tmp/out.mp4"), ExportFormat::Mp4));
        let joined = args.join(" ");
        assert!(joined.contains("-pix_fmt rgb24 -s 128x96 -r 30 -i -"));
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-crf 28"));
        assert_eq!(args.last().unwrap(), "/tmp/out.mp4");
    }

    #[test]
    fn test_webm_args() {
        let args = encoder_args(&settings(PathBuf::from("out.webm"), ExportFormat::Webm));
        assert!(args.join(" ").contains("-c:v libvpx-vp9"));
        assert!(!args.contains(&"-movflags".to_string()));
    }

    #[test]
    fn test_parse_probe_output() {
        let info = parse_probe_output("128,96,30/1,3\n").unwrap();
        assert_eq!(info.resolution, Resolution::new(128, 96));
        assert_eq!(info.frame_count, 3);
        assert_eq!(info.fps, 30.0);

        assert!(parse_probe_output("garbage").is_err());
    }

    /// FFmpeg on PATH and built with libx264
    fn h264_available() -> bool {
        ffmpeg_available()
            && Command::new("ffmpeg")
                .args(["-hide_banner", "-encoders"])
                .output()
                .map(|o| String::from_utf8_lossy(&o.stdout).contains("libx264"))
                .unwrap_or(false)
    }

    #[test]
    fn test_encode_round_trip() {
        if !h264_available() {
            eprintln!("ffmpeg not on PATH, skipping");
            return;
        }

        let dir = tempdir().unwrap();
        let path = dir.path().join("round_trip.mp4");
        let mut sink: Box<dyn VideoSink> =
            FfmpegSinkFactory::new().open(&settings(path.clone(), ExportFormat::Mp4)).unwrap();

        for shade in [0u8, 128, 255] {
            sink.write_frame(&RgbImage::from_pixel(128, 96, Rgb([shade, 64, 32])))
                .unwrap();
        }
        assert_eq!(sink.finish().unwrap(), 3);

        assert!(path.metadata().unwrap().len() > 0);

        if let Ok(info) = probe_video(&path) {
            assert_eq!(info.resolution, Resolution::new(128, 96));
            assert_eq!(info.frame_count, 3);
        }
    }

    #[test]
    fn test_wrong_frame_size_rejected() {
        if !ffmpeg_available() {
            return;
        }

        let dir = tempdir().unwrap();
        let mut sink = FfmpegSink::open(&settings(dir.path().join("bad.mp4"), ExportFormat::Mp4)).unwrap();
        let err = sink.write_frame(&RgbImage::new(10, 10)).unwrap_err();
        assert!(matches!(err, ExportError::Encoding(_)));
        assert_eq!(sink.frame_count(), 0);
    }

    /// Stand-in encoder that rejects its codec the way FFmpeg does
    #[cfg(unix)]
    fn rejecting_encoder(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("ffmpeg");
        std::fs::write(
            &script,
            "#!/bin/sh\necho \"Unknown encoder 'libx264'\" >&2\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[test]
    fn test_rejected_codec_is_encoder_open_failure() {
        use crate::config::RecordingSettings;
        use crate::export::VideoExporter;
        use std::sync::Arc;
        use uuid::Uuid;

        let dir = tempdir().unwrap();
        let factory = FfmpegSinkFactory::with_program(rejecting_encoder(dir.path()));
        let exporter = VideoExporter::with_sink_factory(dir.path().to_path_buf(), Arc::new(factory));
        let frames = vec![RgbImage::from_pixel(64, 64, Rgb([10, 20, 30])); 3];

        let err = exporter
            .export(Uuid::new_v4(), &frames, &RecordingSettings::default(), |_| {})
            .unwrap_err();

        match err {
            ExportError::EncoderOpen(message) => assert!(message.contains("Unknown encoder 'libx264'")),
            other => panic!("expected EncoderOpen, got {:?}", other),
        }
    }
}
