/**
 * Hardware Controller
 *
 * Owns the camera and motor controllers for their whole lifetime:
 * 1. `initialize_all` builds both from the configured backends
 * 2. callers borrow them through `camera_controller` / `motor_controller`
 * 3. `cleanup_all` releases the camera and returns the motor pins to input
 *
 * Dropping the controller runs `cleanup_all`, so the hardware is released on
 * every exit path.
 */

use log::{info, warn};

use crate::camera::{CameraBackend, CameraController, RpiCamStill, SimulatedCamera};
use crate::config::{BackendKind, HardwareConfig};
use crate::error::{HwError, HwResult};
use crate::motor::{GpioBackend, MotorController, RppalGpio, SimulatedGpio};

pub struct HardwareController {
    config: HardwareConfig,
    camera: Option<CameraController>,
    motor: Option<MotorController>,
}

impl Default for HardwareController {
    fn default() -> Self {
        Self::new(HardwareConfig::default())
    }
}

impl HardwareController {
    pub fn new(config: HardwareConfig) -> Self {
        Self {
            config,
            camera: None,
            motor: None,
        }
    }

    /// Use controllers that were built elsewhere, already initialized
    pub fn from_parts(camera: CameraController, motor: MotorController, config: HardwareConfig) -> Self {
        Self {
            config,
            camera: Some(camera),
            motor: Some(motor),
        }
    }

    pub fn config(&self) -> &HardwareConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.camera.is_some() && self.motor.is_some()
    }

    /// Build the camera and motor controllers. No-op when already initialized.
    pub fn initialize_all(&mut self) -> HwResult<()> {
        if self.is_initialized() {
            return Ok(());
        }
        self.config.validate()?;
        self.initialize_camera()?;
        self.initialize_motor()?;
        info!("hardware initialized ({:?} backend)", self.config.backend);
        Ok(())
    }

    /// Build only the camera controller, leaving the GPIO untouched.
    pub fn initialize_camera(&mut self) -> HwResult<()> {
        if self.camera.is_some() {
            return Ok(());
        }
        let backend: Box<dyn CameraBackend> = match self.config.backend {
            BackendKind::RaspberryPi => Box::new(RpiCamStill::new()),
            BackendKind::Simulated => Box::new(SimulatedCamera::new()),
        };
        self.camera = Some(CameraController::with_config(backend, self.config.camera.clone())?);
        Ok(())
    }

    /// Build only the motor controller.
    pub fn initialize_motor(&mut self) -> HwResult<()> {
        if self.motor.is_some() {
            return Ok(());
        }
        let backend: Box<dyn GpioBackend> = match self.config.backend {
            BackendKind::RaspberryPi => Box::new(RppalGpio::new()?),
            BackendKind::Simulated => Box::new(SimulatedGpio::new()),
        };
        self.motor = Some(MotorController::with_config(backend, self.config.motor.clone())?);
        Ok(())
    }

    /// Release the camera and set the motor pins back to input. Safe to call
    /// more than once; failures are logged and the rest still runs.
    pub fn cleanup_all(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            camera.release_camera();
        }
        if let Some(mut motor) = self.motor.take() {
            if let Err(e) = motor.cleanup() {
                warn!("motor cleanup failed: {}", e);
            }
        }
    }

    pub fn camera_controller(&mut self) -> HwResult<&mut CameraController> {
        self.camera.as_mut().ok_or(HwError::NotInitialized)
    }

    pub fn motor_controller(&mut self) -> HwResult<&mut MotorController> {
        self.motor.as_mut().ok_or(HwError::NotInitialized)
    }
}

impl Drop for HardwareController {
    fn drop(&mut self) {
        self.cleanup_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraStats;
    use crate::config::MotorConfig;
    use crate::motor::GpioEvent;
    use std::sync::{Arc, Mutex};

    struct Probes {
        camera: Arc<Mutex<CameraStats>>,
        gpio: Arc<Mutex<Vec<GpioEvent>>>,
    }

    fn with_probes() -> (HardwareController, Probes) {
        let cam = SimulatedCamera::new();
        let gpio = SimulatedGpio::new();
        let probes = Probes {
            camera: cam.stats_handle(),
            gpio: gpio.log_handle(),
        };
        let motor_config = MotorConfig { step_delay_ms: 0, ..Default::default() };
        let camera = CameraController::new(Box::new(cam));
        let motor = MotorController::with_config(Box::new(gpio), motor_config).unwrap();
        (
            HardwareController::from_parts(camera, motor, HardwareConfig::simulated()),
            probes,
        )
    }

    #[test]
    fn test_access_before_initialize() {
        let mut hw = HardwareController::new(HardwareConfig::simulated());
        assert!(matches!(hw.camera_controller(), Err(HwError::NotInitialized)));
        assert!(matches!(hw.motor_controller(), Err(HwError::NotInitialized)));
    }

    #[test]
    fn test_initialize_and_cleanup_simulated() {
        let mut hw = HardwareController::new(HardwareConfig::simulated());
        hw.initialize_all().unwrap();
        assert!(hw.is_initialized());
        hw.initialize_all().unwrap();
        hw.camera_controller().unwrap().open_camera().unwrap();
        hw.cleanup_all();
        assert!(!hw.is_initialized());
        hw.cleanup_all();

        //can come back up after cleanup
        hw.initialize_all().unwrap();
        assert!(hw.camera_controller().is_ok());
    }

    #[test]
    fn test_initialize_rejects_bad_config() {
        let mut config = HardwareConfig::simulated();
        config.camera.iso = 5;
        let mut hw = HardwareController::new(config);
        assert!(matches!(hw.initialize_all(), Err(HwError::InvalidConfiguration(_))));
        assert!(!hw.is_initialized());
    }

    #[test]
    fn test_initialize_camera_only() {
        let mut hw = HardwareController::new(HardwareConfig::simulated());
        hw.initialize_camera().unwrap();
        assert!(hw.camera_controller().is_ok());
        assert!(matches!(hw.motor_controller(), Err(HwError::NotInitialized)));
        assert!(!hw.is_initialized());

        //completing the set keeps the camera already built
        hw.camera_controller().unwrap().open_camera().unwrap();
        hw.initialize_all().unwrap();
        assert!(hw.camera_controller().unwrap().is_open());
        assert!(hw.motor_controller().is_ok());
    }

    #[test]
    fn test_initialize_motor_only() {
        let mut hw = HardwareController::new(HardwareConfig::simulated());
        hw.initialize_motor().unwrap();
        assert!(hw.motor_controller().is_ok());
        assert!(matches!(hw.camera_controller(), Err(HwError::NotInitialized)));
        hw.cleanup_all();
        assert!(hw.motor_controller().is_err());
    }

    #[test]
    fn test_drop_releases_hardware() {
        let (mut hw, probes) = with_probes();
        hw.camera_controller().unwrap().open_camera().unwrap();
        hw.motor_controller().unwrap().set_to_output_mode().unwrap();
        drop(hw);

        assert_eq!(probes.camera.lock().unwrap().releases, 1);
        let events = probes.gpio.lock().unwrap();
        assert_eq!(events.iter().filter(|e| matches!(e, GpioEvent::Input(_))).count(), 4);
    }

    #[test]
    fn test_release_on_early_return() {
        fn failing_sequence(hw: &mut HardwareController) -> HwResult<()> {
            hw.camera_controller()?.open_camera()?;
            hw.motor_controller()?.rotate(90, 1)?;
            Ok(())
        }

        let (mut hw, probes) = with_probes();
        assert!(failing_sequence(&mut hw).is_err());
        drop(hw);
        assert_eq!(probes.camera.lock().unwrap().releases, 1);
    }
}
