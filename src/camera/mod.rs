/**
 * Camera Module
 *
 * Configure the still camera, open it, and capture single frames as `Image`s.
 * Sensor access goes through a `CameraBackend`:
 * - `RpiCamStill` on a Raspberry Pi
 * - `SimulatedCamera` everywhere else
 */

pub mod backend;
pub mod frame;
pub mod simulated;

pub use backend::{CameraBackend, RpiCamStill};
pub use frame::{Image, RGB_HEADER_LEN};
pub use simulated::{CameraStats, SimulatedCamera};

use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use serde::Deserialize;

use crate::config::{self, CameraConfig};
use crate::error::{HwError, HwResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Png,
    Jpeg,
    Rgb,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Png => "png",
            Encoding::Jpeg => "jpeg",
            Encoding::Rgb => "rgb",
        }
    }

    /// Whether a lowercase file extension fits this encoding
    pub fn matches_extension(&self, ext: &str) -> bool {
        match self {
            Encoding::Png => ext == "png",
            Encoding::Jpeg => ext == "jpeg" || ext == "jpg",
            Encoding::Rgb => true,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = HwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "png" => Ok(Encoding::Png),
            "jpeg" => Ok(Encoding::Jpeg),
            "rgb" => Ok(Encoding::Rgb),
            other => Err(HwError::InvalidEncoding(other.to_string())),
        }
    }
}

pub struct CameraController {
    config: CameraConfig,
    backend: Box<dyn CameraBackend>,
}

impl CameraController {
    pub fn new(backend: Box<dyn CameraBackend>) -> Self {
        info!("camera initialized");
        Self {
            config: CameraConfig::default(),
            backend,
        }
    }

    pub fn with_config(backend: Box<dyn CameraBackend>, config: CameraConfig) -> HwResult<Self> {
        config.validate()?;
        let mut controller = Self::new(backend);
        controller.config = config;
        Ok(controller)
    }

    /// Open the camera. Set width, height and encoding first; they are
    /// still honored if changed later since every capture re-reads them.
    pub fn open_camera(&mut self) -> HwResult<()> {
        if self.backend.is_open() {
            debug!("camera already open");
            return Ok(());
        }
        self.backend.open(&self.config)?;
        info!(
            "camera open: {}x{} {}",
            self.config.image_width, self.config.image_height, self.config.encoding
        );
        Ok(())
    }

    /// Capture one frame. The result still carries its header.
    pub fn capture_image(&mut self) -> HwResult<Image> {
        if !self.backend.is_open() {
            return Err(HwError::CameraNotOpen);
        }
        info!("taking single image");
        let data = self.backend.grab(&self.config)?;
        debug!("captured {} bytes", data.len());
        Ok(Image::new(
            data,
            self.config.image_width,
            self.config.image_height,
            self.config.encoding,
            true,
        ))
    }

    pub fn release_camera(&mut self) {
        if self.backend.is_open() {
            self.backend.release();
            info!("camera cleanup done");
        }
    }

    pub fn is_open(&self) -> bool {
        self.backend.is_open()
    }

    pub fn set_image_width(&mut self, width: u32) -> HwResult<()> {
        config::check_dimension("image_width", width, config::WIDTH_STEP)?;
        self.config.image_width = width;
        Ok(())
    }

    pub fn set_image_height(&mut self, height: u32) -> HwResult<()> {
        config::check_dimension("image_height", height, config::HEIGHT_STEP)?;
        self.config.image_height = height;
        Ok(())
    }

    /// Accepts "png", "jpeg" or "rgb"
    pub fn set_image_encoding(&mut self, encoding: &str) -> HwResult<()> {
        self.set_encoding(encoding.parse()?);
        Ok(())
    }

    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.config.encoding = encoding;
    }

    pub fn set_sharpness(&mut self, value: i32) -> HwResult<()> {
        config::check_range("sharpness", value, config::SHARPNESS_RANGE)?;
        self.config.sharpness = value;
        Ok(())
    }

    pub fn set_contrast(&mut self, value: i32) -> HwResult<()> {
        config::check_range("contrast", value, config::CONTRAST_RANGE)?;
        self.config.contrast = value;
        Ok(())
    }

    pub fn set_brightness(&mut self, value: u32) -> HwResult<()> {
        config::check_range("brightness", value, config::BRIGHTNESS_RANGE)?;
        self.config.brightness = value;
        Ok(())
    }

    pub fn set_saturation(&mut self, value: i32) -> HwResult<()> {
        config::check_range("saturation", value, config::SATURATION_RANGE)?;
        self.config.saturation = value;
        Ok(())
    }

    pub fn set_iso(&mut self, value: u32) -> HwResult<()> {
        config::check_range("iso", value, config::ISO_RANGE)?;
        self.config.iso = value;
        Ok(())
    }

    pub fn image_width(&self) -> u32 {
        self.config.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.config.image_height
    }

    pub fn image_encoding(&self) -> Encoding {
        self.config.encoding
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Largest buffer a capture can need: pixels plus the header block.
    /// png/jpeg are bounded by 4 bytes per pixel.
    pub fn image_buffer_size(&self) -> usize {
        let pixels = self.config.image_width as usize * self.config.image_height as usize;
        let bytes_per_pixel = match self.config.encoding {
            Encoding::Rgb => 3,
            Encoding::Png | Encoding::Jpeg => 4,
        };
        pixels * bytes_per_pixel + RGB_HEADER_LEN
    }
}
