/**
 * Camera Backends
 *
 * The controller talks to the sensor through `CameraBackend`. On a Pi the
 * still pipeline is driven through the `rpicam-still` tool, which writes the
 * encoded frame to stdout.
 */

use std::process::Command;

use image::ImageFormat;
use log::{debug, info};

use super::frame::RGB_HEADER_LEN;
use super::Encoding;
use crate::config::CameraConfig;
use crate::error::{HwError, HwResult};

const DEFAULT_PROGRAM: &str = "rpicam-still";
const DEFAULT_TIMEOUT_MS: u64 = 1000;

pub trait CameraBackend: Send {
    fn open(&mut self, config: &CameraConfig) -> HwResult<()>;
    /// Grab one frame in the layout described by `config.encoding`.
    fn grab(&mut self, config: &CameraConfig) -> HwResult<Vec<u8>>;
    fn release(&mut self);
    fn is_open(&self) -> bool;
}

/// Still capture through the `rpicam-still` CLI
pub struct RpiCamStill {
    program: String,
    timeout_ms: u64,
    open: bool,
}

impl Default for RpiCamStill {
    fn default() -> Self {
        Self::new()
    }
}

impl RpiCamStill {
    pub fn new() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            open: false,
        }
    }

    /// Use another binary, e.g. `libcamera-still` on older images
    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    /// Time the sensor runs before the still is taken, lets AE/AWB settle
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn capture_args(&self, config: &CameraConfig) -> Vec<String> {
        let encoding = match config.encoding {
            Encoding::Png => "png",
            Encoding::Jpeg => "jpg",
            Encoding::Rgb => "bmp",
        };
        vec![
            "-n".to_string(),
            "-o".to_string(),
            "-".to_string(),
            "-t".to_string(),
            self.timeout_ms.to_string(),
            "--width".to_string(),
            config.image_width.to_string(),
            "--height".to_string(),
            config.image_height.to_string(),
            "-e".to_string(),
            encoding.to_string(),
            "--sharpness".to_string(),
            format!("{:.2}", unit_gain(config.sharpness)),
            "--contrast".to_string(),
            format!("{:.2}", unit_gain(config.contrast)),
            "--brightness".to_string(),
            format!("{:.2}", (config.brightness as f32 - 50.0) / 50.0),
            "--saturation".to_string(),
            format!("{:.2}", unit_gain(config.saturation)),
            "--gain".to_string(),
            format!("{:.2}", config.iso as f32 / 100.0),
        ]
    }
}

//-100..100 onto rpicam's 0.0..2.0 where 1.0 is neutral
fn unit_gain(value: i32) -> f32 {
    1.0 + value as f32 / 100.0
}

impl CameraBackend for RpiCamStill {
    fn open(&mut self, _config: &CameraConfig) -> HwResult<()> {
        let output = Command::new(&self.program)
            .arg("--list-cameras")
            .output()
            .map_err(|e| HwError::Camera(format!("failed to run {}: {}", self.program, e)))?;
        let listing = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() || listing.contains("No cameras available") {
            return Err(HwError::Camera("no camera detected".to_string()));
        }
        debug!("{}", listing.trim());
        self.open = true;
        Ok(())
    }

    fn grab(&mut self, config: &CameraConfig) -> HwResult<Vec<u8>> {
        let args = self.capture_args(config);
        debug!("{} {}", self.program, args.join(" "));
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| HwError::Camera(format!("failed to run {}: {}", self.program, e)))?;
        if !output.status.success() {
            return Err(HwError::Camera(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        match config.encoding {
            Encoding::Rgb => bmp_to_raw_rgb(&output.stdout, config.image_width, config.image_height),
            _ => Ok(output.stdout),
        }
    }

    fn release(&mut self) {
        if self.open {
            info!("camera released");
        }
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// Reshape a BMP capture into the raw rgb capture layout: unpadded RGB rows
/// bottom-up (sensor order) whatever the file's row order, then the first
/// `RGB_HEADER_LEN` bytes of the file.
pub fn bmp_to_raw_rgb(bmp: &[u8], width: u32, height: u32) -> HwResult<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(HwError::Camera("capture size must be non-zero".to_string()));
    }
    if bmp.len() < RGB_HEADER_LEN {
        return Err(HwError::Camera("capture is not a BMP".to_string()));
    }
    let decoded = image::load_from_memory_with_format(bmp, ImageFormat::Bmp)
        .map_err(|e| HwError::Camera(format!("malformed BMP capture: {}", e)))?
        .to_rgb8();
    if decoded.dimensions() != (width, height) {
        return Err(HwError::Camera(format!(
            "capture is {}x{}, configured {}x{}",
            decoded.width(),
            decoded.height(),
            width,
            height
        )));
    }

    let row_size = width as usize * 3;
    let mut out = Vec::with_capacity(row_size * height as usize + RGB_HEADER_LEN);
    for row in decoded.as_raw().chunks_exact(row_size).rev() {
        out.extend_from_slice(row);
    }
    out.extend_from_slice(&bmp[..RGB_HEADER_LEN]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    //minimal 24-bit BMP with 4-byte stride padding. Rows are written in the
    //order given: bottom-up for a positive height, top-down for a negative one.
    fn bmp(width: u32, height: i32, rows_bgr: &[Vec<u8>]) -> Vec<u8> {
        let row_size = width as usize * 3;
        let stride = (row_size + 3) & !3;
        let mut buf = Vec::new();
        buf.extend_from_slice(b"BM");
        buf.extend_from_slice(&((54 + stride * rows_bgr.len()) as u32).to_le_bytes());
        buf.extend_from_slice(&[0, 0, 0, 0]);
        buf.extend_from_slice(&54u32.to_le_bytes());
        buf.extend_from_slice(&40u32.to_le_bytes());
        buf.extend_from_slice(&width.to_le_bytes());
        buf.extend_from_slice(&height.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&24u16.to_le_bytes());
        buf.extend_from_slice(&[0u8; 24]);
        assert_eq!(buf.len(), 54);
        for row in rows_bgr {
            buf.extend_from_slice(row);
            buf.extend(std::iter::repeat(0).take(stride - row_size));
        }
        buf
    }

    #[test]
    fn test_bmp_to_raw_rgb() {
        let data = bmp(1, 2, &[vec![3, 2, 1], vec![6, 5, 4]]);
        let raw = bmp_to_raw_rgb(&data, 1, 2).unwrap();
        assert_eq!(raw.len(), 6 + RGB_HEADER_LEN);
        assert_eq!(&raw[..6], &[1, 2, 3, 4, 5, 6]);
        assert_eq!(&raw[6..8], b"BM");
    }

    #[test]
    fn test_top_down_bmp_still_bottom_up() {
        //top row [3,2,1] stored first
        let data = bmp(1, -2, &[vec![3, 2, 1], vec![6, 5, 4]]);
        let raw = bmp_to_raw_rgb(&data, 1, 2).unwrap();
        assert_eq!(&raw[..6], &[4, 5, 6, 1, 2, 3]);
        assert_eq!(&raw[6..], &data[..RGB_HEADER_LEN]);
    }

    #[test]
    fn test_padded_rows() {
        //2 px wide: 6 bytes of pixels plus 2 bytes of padding per row
        let data = bmp(2, 2, &[vec![3, 2, 1, 6, 5, 4], vec![9, 8, 7, 12, 11, 10]]);
        let raw = bmp_to_raw_rgb(&data, 2, 2).unwrap();
        assert_eq!(&raw[..12], &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_bmp_size_mismatch() {
        let data = bmp(1, 2, &[vec![3, 2, 1], vec![6, 5, 4]]);
        assert!(bmp_to_raw_rgb(&data, 2, 2).is_err());
    }

    #[test]
    fn test_bmp_truncated() {
        let mut data = bmp(1, 2, &[vec![3, 2, 1], vec![6, 5, 4]]);
        data.truncate(58);
        assert!(bmp_to_raw_rgb(&data, 1, 2).is_err());
    }

    #[test]
    fn test_not_bmp() {
        assert!(matches!(bmp_to_raw_rgb(&[0u8; 80], 1, 1), Err(HwError::Camera(_))));
    }

    #[test]
    fn test_capture_args() {
        let config = CameraConfig { encoding: Encoding::Rgb, ..Default::default() };
        let args = RpiCamStill::new().capture_args(&config);
        let pos = args.iter().position(|a| a == "-e").unwrap();
        assert_eq!(args[pos + 1], "bmp");
        let pos = args.iter().position(|a| a == "--gain").unwrap();
        assert_eq!(args[pos + 1], "7.00");
        let pos = args.iter().position(|a| a == "--brightness").unwrap();
        assert_eq!(args[pos + 1], "0.00");
    }

    #[test]
    fn test_missing_program_fails_open() {
        let mut cam = RpiCamStill::new().with_program("definitely-not-a-camera-tool");
        assert!(cam.open(&CameraConfig::default()).is_err());
        assert!(!cam.is_open());
    }
}
