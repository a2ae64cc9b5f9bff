//! Error handling for the hardware controllers

use std::fmt;

/// Result type for hardware operations
pub type HwResult<T> = Result<T, HwError>;

/// Errors that can occur when driving the camera or the motor
#[derive(Debug)]
pub enum HwError {
    /// Controllers accessed before `initialize_all`
    NotInitialized,
    /// Capture attempted before `open_camera`
    CameraNotOpen,
    /// Rotation attempted before `set_to_output_mode`
    PinsNotConfigured,
    /// Encoding other than png, jpeg or rgb
    InvalidEncoding(String),
    /// Pin number that cannot be mapped to a BCM GPIO
    InvalidPin(u8),
    /// Setting outside its accepted range
    InvalidConfiguration(String),
    /// Camera backend failure
    Camera(String),
    /// GPIO backend failure
    Gpio(String),
    /// Image encode/decode failure
    Image(String),
    /// Filesystem failure
    Io(std::io::Error),
    /// Config file could not be parsed
    Config(String),
}

impl fmt::Display for HwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HwError::NotInitialized => write!(f, "Hardware not initialized, call initialize_all first"),
            HwError::CameraNotOpen => write!(f, "Camera is not open, call open_camera first"),
            HwError::PinsNotConfigured => write!(f, "Motor pins are not in output mode, call set_to_output_mode first"),
            HwError::InvalidEncoding(enc) => write!(f, "Invalid encoding '{}': use png, jpeg, or rgb instead", enc),
            HwError::InvalidPin(pin) => write!(f, "Invalid pin: {}", pin),
            HwError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            HwError::Camera(msg) => write!(f, "Camera error: {}", msg),
            HwError::Gpio(msg) => write!(f, "GPIO error: {}", msg),
            HwError::Image(msg) => write!(f, "Image error: {}", msg),
            HwError::Io(err) => write!(f, "I/O error: {}", err),
            HwError::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for HwError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HwError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for HwError {
    fn from(err: std::io::Error) -> Self {
        HwError::Io(err)
    }
}

impl From<rppal::gpio::Error> for HwError {
    fn from(err: rppal::gpio::Error) -> Self {
        HwError::Gpio(err.to_string())
    }
}

impl From<image::ImageError> for HwError {
    fn from(err: image::ImageError) -> Self {
        HwError::Image(err.to_string())
    }
}

impl From<toml::de::Error> for HwError {
    fn from(err: toml::de::Error) -> Self {
        HwError::Config(err.to_string())
    }
}
