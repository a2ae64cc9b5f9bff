/**
 * Hardware Configuration
 *
 * Typed settings for the camera and the stepper motor, with the defaults the
 * controllers start from. Can be loaded from a TOML file where every field is
 * optional.
 */

use std::path::Path;

use log::warn;
use serde::Deserialize;

use crate::camera::Encoding;
use crate::error::{HwError, HwResult};
use crate::motor::PinNumbering;

pub const SHARPNESS_RANGE: (i32, i32) = (-100, 100);
pub const CONTRAST_RANGE: (i32, i32) = (-100, 100);
pub const BRIGHTNESS_RANGE: (u32, u32) = (0, 100);
pub const SATURATION_RANGE: (i32, i32) = (-100, 100);
pub const ISO_RANGE: (u32, u32) = (100, 800);

pub(crate) const WIDTH_STEP: u32 = 320;
pub(crate) const HEIGHT_STEP: u32 = 240;

/// 8-phase half-step sequence for a 4-coil unipolar stepper
pub const HALF_STEP_SEQUENCE: [[u8; 4]; 8] = [
    [1, 0, 0, 1],
    [1, 0, 0, 0],
    [1, 1, 0, 0],
    [0, 1, 0, 0],
    [0, 1, 1, 0],
    [0, 0, 1, 0],
    [0, 0, 1, 1],
    [0, 0, 0, 1],
];

/// Which backends `HardwareController::initialize_all` builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    RaspberryPi,
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub sharpness: i32,
    pub contrast: i32,
    pub brightness: u32,
    pub saturation: i32,
    pub iso: u32,
    pub image_width: u32,
    pub image_height: u32,
    pub encoding: Encoding,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            sharpness: 0,
            contrast: 0,
            brightness: 50,
            saturation: 0,
            iso: 700,
            image_width: 320,
            image_height: 240,
            encoding: Encoding::Png,
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> HwResult<()> {
        check_range("sharpness", self.sharpness, SHARPNESS_RANGE)?;
        check_range("contrast", self.contrast, CONTRAST_RANGE)?;
        check_range("brightness", self.brightness, BRIGHTNESS_RANGE)?;
        check_range("saturation", self.saturation, SATURATION_RANGE)?;
        check_range("iso", self.iso, ISO_RANGE)?;
        check_dimension("image_width", self.image_width, WIDTH_STEP)?;
        check_dimension("image_height", self.image_height, HEIGHT_STEP)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    pub steps_per_rev: u32,
    pub step_delay_ms: u64,
    pub pins: [u8; 4],
    pub numbering: PinNumbering,
    pub step_sequence: [[u8; 4]; 8],
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            steps_per_rev: 4096,
            step_delay_ms: 2,
            pins: [25, 24, 23, 22],
            numbering: PinNumbering::WiringPi,
            step_sequence: HALF_STEP_SEQUENCE,
        }
    }
}

impl MotorConfig {
    pub fn validate(&self) -> HwResult<()> {
        if self.steps_per_rev == 0 {
            return Err(HwError::InvalidConfiguration("steps_per_rev must be greater than 0".to_string()));
        }
        if self.step_sequence.iter().flatten().any(|&v| v > 1) {
            return Err(HwError::InvalidConfiguration("step_sequence entries must be 0 or 1".to_string()));
        }
        for &pin in &self.pins {
            self.numbering.to_bcm(pin)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    pub camera: CameraConfig,
    pub motor: MotorConfig,
    pub backend: BackendKind,
}

impl HardwareConfig {
    pub fn simulated() -> Self {
        Self {
            backend: BackendKind::Simulated,
            ..Default::default()
        }
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn validate(&self) -> HwResult<()> {
        self.camera.validate()?;
        self.motor.validate()
    }
}

/// Parse and validate a TOML config
pub fn parse_config(text: &str) -> HwResult<HardwareConfig> {
    let config: HardwareConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Load a TOML config file
pub fn load_config<P: AsRef<Path>>(path: P) -> HwResult<HardwareConfig> {
    let text = std::fs::read_to_string(path)?;
    parse_config(&text)
}

pub(crate) fn check_range<T>(name: &str, value: T, (min, max): (T, T)) -> HwResult<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(HwError::InvalidConfiguration(format!(
            "{} must be within {}..={}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

pub(crate) fn check_dimension(name: &str, value: u32, step: u32) -> HwResult<()> {
    if value == 0 {
        return Err(HwError::InvalidConfiguration(format!("{} must be greater than 0", name)));
    }
    if value % step != 0 {
        warn!("{} {} is not a multiple of {}, the sensor may crop or pad", name, value, step);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = HardwareConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend, BackendKind::RaspberryPi);
        assert_eq!(config.camera.image_width, 320);
        assert_eq!(config.camera.image_height, 240);
        assert_eq!(config.motor.pins, [25, 24, 23, 22]);
        assert_eq!(config.motor.steps_per_rev, 4096);
    }

    #[test]
    fn test_parse_partial_toml() {
        let text = r#"
            backend = "simulated"

            [camera]
            image_width = 640
            image_height = 480
            encoding = "rgb"

            [motor]
            step_delay_ms = 0
        "#;
        let config = parse_config(text).unwrap();
        assert_eq!(config.backend, BackendKind::Simulated);
        assert_eq!(config.camera.image_width, 640);
        assert_eq!(config.camera.encoding, Encoding::Rgb);
        assert_eq!(config.camera.iso, 700);
        assert_eq!(config.motor.step_delay_ms, 0);
        assert_eq!(config.motor.steps_per_rev, 4096);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let text = "[camera]\niso = 1600\n";
        match parse_config(text) {
            Err(HwError::InvalidConfiguration(msg)) => assert!(msg.contains("iso")),
            other => panic!("expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_encoding_rejected() {
        let text = "[camera]\nencoding = \"gif\"\n";
        assert!(matches!(parse_config(text), Err(HwError::Config(_))));
    }

    #[test]
    fn test_zero_width_rejected() {
        let config = CameraConfig { image_width: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_odd_dimension_accepted() {
        let config = CameraConfig { image_width: 100, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unmapped_wiring_pi_pin_rejected() {
        let config = MotorConfig { pins: [25, 24, 23, 18], ..Default::default() };
        assert!(matches!(config.validate(), Err(HwError::InvalidPin(18))));
    }
}
