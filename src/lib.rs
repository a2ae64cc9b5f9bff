pub mod error;
pub mod config;
pub mod camera;
pub mod motor;
pub mod hardware;
pub mod ffi;

#[cfg(feature = "python")]
pub mod python;

pub use error::{HwError, HwResult};
pub use config::{load_config, parse_config, BackendKind, CameraConfig, HardwareConfig, MotorConfig};
pub use camera::{CameraBackend, CameraController, Encoding, Image, RpiCamStill, SimulatedCamera, RGB_HEADER_LEN};
pub use motor::{Direction, GpioBackend, MotorController, PinNumbering, RppalGpio, SimulatedGpio};
pub use hardware::HardwareController;
