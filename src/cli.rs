// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the capture client
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Running a capture sequence (countdown, snapshot, save, optional upload)
//! - Talking to the skin-analysis backend (analyze, compare, history, chat,
//!   PDF report download)

use skincam::backends::camera::synthetic::SyntheticBackend;
use skincam::backends::camera::{CaptureBackend, FacingMode, default_backend};
use skincam::config::Config;
use skincam::presenter::{NotificationLevel, Presenter};
use skincam::sequencer::{
    CaptureDriver, CaptureEvent, CaptureGuard, CaptureSequencer, CapturedFrame,
};
use skincam::session::CameraSessionManager;
use skincam::storage;
use skincam::upload::{AnalyzeResponse, ReportSummary, SelectedImage, UploadClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};

/// How long to wait for the first frame before giving up
const WARMUP_TIMEOUT: Duration = Duration::from_secs(5);

/// List all available capture devices
pub fn list_devices(synthetic: bool) -> Result<(), Box<dyn std::error::Error>> {
    let backend = make_backend(synthetic);
    let devices = backend.enumerate_devices()?;

    if devices.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, device) in devices.iter().enumerate() {
        println!("  [{}] {}", index, device.name);
        println!("      Path: {}", device.path);
        if let Some(facing) = device.facing_hint() {
            println!("      Facing: {}", facing);
        }
        println!();
    }

    Ok(())
}

/// Run one capture sequence: open the camera, count down, snapshot, save,
/// and optionally upload the result for analysis.
pub fn capture(
    facing: Option<FacingMode>,
    countdown: Option<u8>,
    synthetic: bool,
    output: Option<PathBuf>,
    analyze: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let facing = facing.unwrap_or(config.facing);
    let ticks = countdown.unwrap_or(config.countdown_secs);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let save_dir = output
            .or(config.save_dir.clone())
            .unwrap_or_else(storage::default_photo_dir);

        // Restore the previous capture as the initial thumbnail
        let mut presenter = Presenter::new();
        if let Some((_, bytes)) = storage::latest_capture(save_dir.clone()).await {
            use image::GenericImageView;
            if let Ok(img) = image::load_from_memory(&bytes) {
                let (width, height) = img.dimensions();
                presenter.show_thumbnail(CapturedFrame {
                    width,
                    height,
                    jpeg: Arc::from(bytes.into_boxed_slice()),
                    mirrored: false,
                });
            }
        }

        let guard = CaptureGuard::new();
        let session = CameraSessionManager::new(make_backend(synthetic), guard.clone())
            .with_mirror_front(config.mirror_front);

        session.open(facing)?;
        let device = session
            .current_device()
            .map(|d| d.name)
            .unwrap_or_default();
        println!("Using camera: {} ({})", device, session.facing());

        // Camera warm-up: wait until the stream buffers a frame
        let deadline = Instant::now() + WARMUP_TIMEOUT;
        while session.current_frame().is_none() {
            if Instant::now() >= deadline {
                session.close();
                return Err("Camera produced no frames within 5 seconds".into());
            }
            tokio::time::sleep(Duration::from_millis(16)).await;
        }

        let mut sequencer = CaptureSequencer::new(guard);
        let driver = CaptureDriver::new()
            .with_countdown(ticks)
            .with_quality(config.jpeg_quality);

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        // Keep the cancel handle alive for the whole sequence; dropping it
        // would abandon the countdown
        let (_cancel_tx, cancel_rx) = oneshot::channel();

        let printer = tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                match event {
                    CaptureEvent::CountdownTick(n) => println!("  {}...", n),
                    CaptureEvent::Flash => println!("  *click*"),
                    CaptureEvent::Failed(e) => eprintln!("  capture failed: {}", e),
                    CaptureEvent::Captured(_) | CaptureEvent::SessionClosed => {}
                }
            }
        });

        let result = driver
            .run(&session, &mut sequencer, &events_tx, cancel_rx)
            .await;
        drop(events_tx);
        let _ = printer.await;
        let captured = result?;

        presenter.show_thumbnail(captured.clone());
        presenter.notify("Photo captured!", NotificationLevel::Success);

        let path = storage::save_capture(&captured, &save_dir).await?;

        if analyze {
            let mut client = UploadClient::new(&config.server_url)?;
            client.select_capture(&captured);
            println!();
            println!("Analyzing...");
            match client.analyze().await {
                Ok(report) => print_analysis(&report),
                Err(e) => {
                    presenter.notify(e.to_string(), NotificationLevel::Error);
                }
            }
        }

        println!();
        render_presenter(&presenter, &path);
        Ok(())
    })
}

/// Analyze an image file
pub fn analyze(image: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let mut client = UploadClient::new(&config.server_url)?;
        client.select_image(SelectedImage::from_path(&image)?);

        println!("Analyzing {}...", image.display());
        let report = client.analyze().await?;
        print_analysis(&report);
        Ok(())
    })
}

/// Compare a before/after image pair
pub fn compare(before: PathBuf, after: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let client = UploadClient::new(&config.server_url)?;
        let before_image = SelectedImage::from_path(&before)?;
        let after_image = SelectedImage::from_path(&after)?;

        println!("Comparing...");
        let result = client.compare(&before_image, &after_image).await?;

        println!();
        println!("Before: {:.0}/100", result.before.score);
        println!("After:  {:.0}/100", result.after.score);
        if result.improvement > 0.0 {
            println!("Improvement: +{:.1}%", result.improvement_percentage);
        } else {
            println!("Change: {:.1}%", result.improvement_percentage);
        }
        Ok(())
    })
}

/// Show past analysis reports
pub fn history() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let client = UploadClient::new(&config.server_url)?;
        let reports = client.history().await?;

        if reports.is_empty() {
            println!("No reports yet.");
            return Ok(());
        }

        println!("Past reports:");
        println!();
        for report in &reports {
            print_report_summary(report);
        }
        Ok(())
    })
}

/// Download the PDF report for a past analysis
pub fn download_pdf(
    report_id: String,
    output: Option<PathBuf>,
    open_after: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let client = UploadClient::new(&config.server_url)?;
        let dest = output.unwrap_or_else(|| PathBuf::from("."));

        let path = client.download_report_pdf(&report_id, &dest).await?;
        println!("Report saved: {}", path.display());

        if open_after {
            open::that(&path)?;
        }
        Ok(())
    })
}

/// Send one message to the skincare chatbot
pub fn chat(message: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let client = UploadClient::new(&config.server_url)?;
        let reply = client.chat(&message).await?;
        println!("{}", reply);
        Ok(())
    })
}

fn make_backend(synthetic: bool) -> Box<dyn CaptureBackend> {
    if synthetic {
        Box::new(SyntheticBackend::new())
    } else {
        default_backend()
    }
}

/// Print the presenter state (thumbnail line and pending notifications)
fn render_presenter(presenter: &Presenter, saved_path: &std::path::Path) {
    if let Some(thumbnail) = presenter.thumbnail() {
        let frame = &thumbnail.frame;
        let label = skincam::constants::get_resolution_label(frame.width)
            .map(|l| format!(" {}", l))
            .unwrap_or_default();
        println!(
            "Photo saved: {} ({}x{}{}{})",
            saved_path.display(),
            frame.width,
            frame.height,
            label,
            if frame.mirrored { ", mirrored" } else { "" }
        );
    }
    for notification in presenter.notifications() {
        let prefix = match notification.level {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "ok",
            NotificationLevel::Error => "error",
        };
        println!("[{}] {}", prefix, notification.message);
    }
}

fn print_analysis(report: &AnalyzeResponse) {
    println!();
    println!("Health score: {:.0}/100", report.health_score);
    println!("Skin type:    {}", report.skin_type);

    if !report.analysis.is_empty() {
        println!();
        println!("Conditions:");
        for (name, reading) in &report.analysis {
            println!(
                "  {:<14} {:>6.1}  ({})",
                name.replace('_', " "),
                reading.value(),
                reading.level()
            );
        }
    }

    let recs = &report.recommendations;
    for (title, items) in [
        ("Products", &recs.products),
        ("Morning routine", &recs.morning_routine),
        ("Night routine", &recs.night_routine),
        ("Diet tips", &recs.diet_tips),
        ("General tips", &recs.general_tips),
    ] {
        if !items.is_empty() {
            println!();
            println!("{}:", title);
            for item in items {
                println!("  - {}", item);
            }
        }
    }

    println!();
    println!("Report id: {}", report.report_id);
}

fn print_report_summary(report: &ReportSummary) {
    println!(
        "  {}  {:<10} {:>3.0}/100  {}",
        report.created_at, report.skin_type, report.health_score, report.id
    );
}
