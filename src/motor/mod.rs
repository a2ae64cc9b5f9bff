/**
 * Motor Module
 *
 * Drives a 4-coil unipolar stepper (28BYJ-48 on a ULN2003 board) by writing
 * the half-step sequence to four GPIO pins.
 */

pub mod gpio;
pub mod pins;

pub use gpio::{GpioBackend, GpioEvent, RppalGpio, SimulatedGpio};
pub use pins::{wiring_pi_to_bcm, PinNumbering};

use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use rppal::gpio::Level;

use crate::config::MotorConfig;
use crate::error::{HwError, HwResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl From<i32> for Direction {
    /// `1` is clockwise, anything else counter-clockwise
    fn from(value: i32) -> Self {
        if value == 1 {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        }
    }
}

fn level(value: u8) -> Level {
    if value == 0 {
        Level::Low
    } else {
        Level::High
    }
}

pub struct MotorController {
    config: MotorConfig,
    bcm_pins: [u8; 4],
    output_mode: bool,
    backend: Box<dyn GpioBackend>,
}

impl MotorController {
    pub fn new(backend: Box<dyn GpioBackend>) -> Self {
        let config = MotorConfig::default();
        // default pins are always mappable
        let bcm_pins = config.pins.map(|p| wiring_pi_to_bcm(p).unwrap_or(p));
        info!("motor initialized");
        Self {
            config,
            bcm_pins,
            output_mode: false,
            backend,
        }
    }

    pub fn with_config(backend: Box<dyn GpioBackend>, config: MotorConfig) -> HwResult<Self> {
        config.validate()?;
        let mut controller = Self::new(backend);
        controller.bcm_pins = map_pins(config.pins, config.numbering)?;
        controller.config = config;
        Ok(controller)
    }

    /// Put all four pins in output mode so they can drive the coils.
    pub fn set_to_output_mode(&mut self) -> HwResult<()> {
        for pin in self.bcm_pins {
            self.backend.set_output(pin)?;
        }
        self.output_mode = true;
        debug!("motor pins {:?} (BCM {:?}) set to output", self.config.pins, self.bcm_pins);
        Ok(())
    }

    /// Return the pins to input mode when done with them.
    pub fn cleanup(&mut self) -> HwResult<()> {
        for pin in self.bcm_pins {
            self.backend.set_input(pin)?;
        }
        self.output_mode = false;
        info!("motor cleanup done");
        Ok(())
    }

    /// Replace the four coil pins. The old pins are left as they are, so
    /// call `cleanup` before and `set_to_output_mode` after.
    pub fn set_pins(&mut self, pin1: u8, pin2: u8, pin3: u8, pin4: u8) -> HwResult<()> {
        let pins = [pin1, pin2, pin3, pin4];
        let bcm_pins = map_pins(pins, self.config.numbering)?;
        if self.output_mode && bcm_pins != self.bcm_pins {
            warn!("switching motor pins while {:?} are still outputs", self.config.pins);
        }
        self.config.pins = pins;
        self.bcm_pins = bcm_pins;
        self.output_mode = false;
        Ok(())
    }

    /// Half steps for `degrees`, saturating at `u32::MAX`.
    pub fn steps_for(&self, degrees: u32) -> u32 {
        let steps = self.config.steps_per_rev as u64 * degrees as u64 / 360;
        u32::try_from(steps).unwrap_or(u32::MAX)
    }

    /// Rotate by `degrees` in `direction`. Returns the number of half steps
    /// taken. Blocks for `steps * step_delay_ms`.
    pub fn rotate<D: Into<Direction>>(&mut self, degrees: u32, direction: D) -> HwResult<u32> {
        if !self.output_mode {
            return Err(HwError::PinsNotConfigured);
        }
        let direction = direction.into();
        let steps = self.steps_for(degrees);
        let delay = Duration::from_millis(self.config.step_delay_ms);
        debug!("rotating {} degrees {:?} ({} steps)", degrees, direction, steps);

        let mut phase = 0usize;
        for _ in 0..steps {
            self.step(phase, direction)?;
            phase = (phase + 1) % self.config.step_sequence.len();
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
        Ok(steps)
    }

    fn step(&mut self, phase: usize, direction: Direction) -> HwResult<()> {
        let coils = self.config.step_sequence[phase];
        for (i, pin) in self.bcm_pins.into_iter().enumerate() {
            let value = match direction {
                Direction::Clockwise => coils[i],
                Direction::CounterClockwise => coils[3 - i],
            };
            self.backend.write(pin, level(value))?;
        }
        Ok(())
    }

    pub fn pins(&self) -> [u8; 4] {
        self.config.pins
    }

    pub fn bcm_pins(&self) -> [u8; 4] {
        self.bcm_pins
    }

    pub fn is_output_mode(&self) -> bool {
        self.output_mode
    }

    pub fn config(&self) -> &MotorConfig {
        &self.config
    }
}

fn map_pins(pins: [u8; 4], numbering: PinNumbering) -> HwResult<[u8; 4]> {
    let mut bcm_pins = [0u8; 4];
    for (bcm, pin) in bcm_pins.iter_mut().zip(pins) {
        *bcm = numbering.to_bcm(pin)?;
    }
    Ok(bcm_pins)
}
