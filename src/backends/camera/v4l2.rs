// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 webcam backend
//!
//! Captures YUYV frames from `/dev/video*` devices via a memory-mapped
//! stream on a dedicated capture thread. The thread converts each frame to
//! RGBA and publishes it to a latest-frame slot; consumers only ever see the
//! most recent frame.

use super::types::*;
use super::CaptureBackend;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// Number of mmap buffers for the capture stream
const STREAM_BUFFERS: u32 = 4;

struct OpenStream {
    stop_signal: Arc<AtomicBool>,
    latest_frame: Arc<Mutex<Option<CameraFrame>>>,
    capture_thread: Option<JoinHandle<()>>,
}

/// V4L2 capture backend
pub struct V4l2Backend {
    stream: Option<OpenStream>,
}

impl V4l2Backend {
    pub fn new() -> Self {
        Self { stream: None }
    }
}

impl Default for V4l2Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for V4l2Backend {
    fn enumerate_devices(&self) -> BackendResult<Vec<CameraDevice>> {
        let entries = std::fs::read_dir("/dev")
            .map_err(|e| BackendError::Io(format!("cannot read /dev: {}", e)))?;

        let mut devices: Vec<CameraDevice> = entries
            .flatten()
            .filter_map(|entry| {
                let file_name = entry.file_name();
                let name_str = file_name.to_string_lossy();
                if !name_str.starts_with("video") {
                    return None;
                }
                let path = entry.path().to_string_lossy().to_string();

                // Card name from sysfs, falling back to the device node name
                let sysfs_name = format!("/sys/class/video4linux/{}/name", name_str);
                let card = std::fs::read_to_string(&sysfs_name)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_else(|_| name_str.to_string());

                Some(CameraDevice {
                    name: card,
                    path,
                    location: None,
                })
            })
            .collect();

        devices.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(count = devices.len(), "Enumerated V4L2 devices");
        Ok(devices)
    }

    fn fallback_device(&self) -> CameraDevice {
        CameraDevice {
            name: "Default camera".to_string(),
            path: "/dev/video0".to_string(),
            location: None,
        }
    }

    fn open(
        &mut self,
        device: &CameraDevice,
        constraints: &StreamConstraints,
    ) -> BackendResult<()> {
        self.close();

        if !Path::new(&device.path).exists() {
            return Err(BackendError::DeviceNotFound(device.path.clone()));
        }

        let dev = Device::with_path(&device.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                BackendError::PermissionDenied(device.path.clone())
            }
            std::io::ErrorKind::NotFound => BackendError::DeviceNotFound(device.path.clone()),
            _ => BackendError::Io(format!("failed to open {}: {}", device.path, e)),
        })?;

        let fourcc = FourCC::new(b"YUYV");
        let requested = Format::new(constraints.ideal_width, constraints.ideal_height, fourcc);
        let actual = dev
            .set_format(&requested)
            .map_err(|e| BackendError::Io(format!("failed to set format: {}", e)))?;

        if actual.fourcc != fourcc {
            return Err(BackendError::ConstraintsUnsatisfied(format!(
                "device offered {} instead of YUYV",
                actual.fourcc
            )));
        }
        if actual.width < constraints.min_width || actual.height < constraints.min_height {
            return Err(BackendError::ConstraintsUnsatisfied(format!(
                "device offered {}x{}, below the requested minimum {}x{}",
                actual.width, actual.height, constraints.min_width, constraints.min_height
            )));
        }

        info!(
            device = %device.path,
            width = actual.width,
            height = actual.height,
            "V4L2 stream format configured"
        );

        let stop_signal = Arc::new(AtomicBool::new(false));
        let latest_frame: Arc<Mutex<Option<CameraFrame>>> = Arc::new(Mutex::new(None));

        let thread_stop = Arc::clone(&stop_signal);
        let thread_latest = Arc::clone(&latest_frame);
        let width = actual.width;
        let height = actual.height;
        let path = device.path.clone();
        let capture_thread = std::thread::spawn(move || {
            if let Err(e) = capture_loop(dev, width, height, thread_stop, thread_latest) {
                warn!(device = %path, error = %e, "Capture loop terminated");
            }
        });

        self.stream = Some(OpenStream {
            stop_signal,
            latest_frame,
            capture_thread: Some(capture_thread),
        });
        Ok(())
    }

    fn close(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            return;
        };

        stream.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = stream.capture_thread.take() {
            let _ = handle.join();
        }
        if let Ok(mut guard) = stream.latest_frame.lock() {
            *guard = None;
        }
        info!("V4L2 stream released");
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn current_frame(&self) -> Option<CameraFrame> {
        let stream = self.stream.as_ref()?;
        stream.latest_frame.lock().ok()?.clone()
    }

    fn open_stream_count(&self) -> usize {
        usize::from(self.stream.is_some())
    }
}

impl Drop for V4l2Backend {
    fn drop(&mut self) {
        self.close();
    }
}

/// Capture loop running on a dedicated thread
fn capture_loop(
    dev: Device,
    width: u32,
    height: u32,
    stop_signal: Arc<AtomicBool>,
    latest_frame: Arc<Mutex<Option<CameraFrame>>>,
) -> Result<(), String> {
    let mut stream = Stream::with_buffers(&dev, Type::VideoCapture, STREAM_BUFFERS)
        .map_err(|e| format!("failed to create stream: {}", e))?;

    info!(width, height, "V4L2 capture loop started");

    while !stop_signal.load(Ordering::SeqCst) {
        let (buf, _meta) = match stream.next() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to capture frame");
                continue;
            }
        };

        let captured_at = Instant::now();
        let rgba = yuyv_to_rgba(buf, width, height);
        let frame = CameraFrame {
            width,
            height,
            data: Arc::from(rgba.into_boxed_slice()),
            captured_at,
        };

        if let Ok(mut guard) = latest_frame.lock() {
            *guard = Some(frame);
        }
    }

    Ok(())
}

/// Convert YUYV (YUV 4:2:2) to RGBA
///
/// YUYV format: Y0 U Y1 V - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients for YUV to RGB conversion.
fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);

    for chunk in data.chunks_exact(4) {
        if rgba.len() >= pixel_count * 4 {
            break;
        }
        let y0 = chunk[0] as f32;
        let u = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v = chunk[3] as f32 - 128.0;

        for y in [y0, y1] {
            let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
            let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
            let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

            rgba.push(r);
            rgba.push(g);
            rgba.push(b);
            rgba.push(255);

            if rgba.len() >= pixel_count * 4 {
                break;
            }
        }
    }

    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_gray_converts_to_gray() {
        // Y=128, U=V=128 is mid gray with zero chroma
        let data = [128u8, 128, 128, 128];
        let rgba = yuyv_to_rgba(&data, 2, 1);
        assert_eq!(rgba.len(), 8);
        assert_eq!(&rgba[0..4], &[128, 128, 128, 255]);
        assert_eq!(&rgba[4..8], &[128, 128, 128, 255]);
    }

    #[test]
    fn test_yuyv_output_is_bounded_to_pixel_count() {
        // One extra chunk beyond the pixel count must not overflow the output
        let data = [128u8; 12];
        let rgba = yuyv_to_rgba(&data, 2, 1);
        assert_eq!(rgba.len(), 2 * 4);
    }
}
