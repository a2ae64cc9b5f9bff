use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rppal::gpio::{Gpio, IoPin, Level, Mode};

use crate::error::{HwError, HwResult};

/// Pin-level access the motor controller needs. Pins are BCM numbers.
pub trait GpioBackend: Send {
    fn set_output(&mut self, pin: u8) -> HwResult<()>;
    fn set_input(&mut self, pin: u8) -> HwResult<()>;
    fn write(&mut self, pin: u8, level: Level) -> HwResult<()>;
}

/// GPIO through rppal's /dev/gpiomem access
pub struct RppalGpio {
    gpio: Gpio,
    pins: HashMap<u8, IoPin>,
}

impl RppalGpio {
    pub fn new() -> HwResult<Self> {
        Ok(Self {
            gpio: Gpio::new()?,
            pins: HashMap::new(),
        })
    }

    fn set_mode(&mut self, pin: u8, mode: Mode) -> HwResult<()> {
        match self.pins.get_mut(&pin) {
            Some(io) => io.set_mode(mode),
            None => {
                let io = self.gpio.get(pin)?.into_io(mode);
                self.pins.insert(pin, io);
            }
        }
        Ok(())
    }
}

impl GpioBackend for RppalGpio {
    fn set_output(&mut self, pin: u8) -> HwResult<()> {
        self.set_mode(pin, Mode::Output)
    }

    fn set_input(&mut self, pin: u8) -> HwResult<()> {
        self.set_mode(pin, Mode::Input)
    }

    fn write(&mut self, pin: u8, level: Level) -> HwResult<()> {
        let io = self
            .pins
            .get_mut(&pin)
            .ok_or_else(|| HwError::Gpio(format!("GPIO {} was never configured", pin)))?;
        io.write(level);
        Ok(())
    }
}

/// What a `SimulatedGpio` was asked to do, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioEvent {
    Output(u8),
    Input(u8),
    Write(u8, Level),
}

/// GPIO that records every call instead of touching hardware
#[derive(Default)]
pub struct SimulatedGpio {
    modes: HashMap<u8, Mode>,
    log: Arc<Mutex<Vec<GpioEvent>>>,
}

impl SimulatedGpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_handle(&self) -> Arc<Mutex<Vec<GpioEvent>>> {
        Arc::clone(&self.log)
    }

    fn record(&self, event: GpioEvent) {
        if let Ok(mut log) = self.log.lock() {
            log.push(event);
        }
    }
}

impl GpioBackend for SimulatedGpio {
    fn set_output(&mut self, pin: u8) -> HwResult<()> {
        self.modes.insert(pin, Mode::Output);
        self.record(GpioEvent::Output(pin));
        Ok(())
    }

    fn set_input(&mut self, pin: u8) -> HwResult<()> {
        self.modes.insert(pin, Mode::Input);
        self.record(GpioEvent::Input(pin));
        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> HwResult<()> {
        if self.modes.get(&pin) != Some(&Mode::Output) {
            return Err(HwError::Gpio(format!("GPIO {} is not in output mode", pin)));
        }
        self.record(GpioEvent::Write(pin, level));
        Ok(())
    }
}
