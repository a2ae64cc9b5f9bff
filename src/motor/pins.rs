use serde::Deserialize;

use crate::error::{HwError, HwResult};

/// How pin numbers passed to the motor controller are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinNumbering{
    /// wiringPi numbering, converted to BCM before use
    #[default]
    WiringPi,
    /// Broadcom GPIO numbers, used as is
    Bcm,
}

//wiringPi -> BCM for Pi 2 and later 40-pin headers, index is the wPi number.
//17..=20 were the P5 header on the rev 2 board and have no mapping.
const WPI_TO_BCM: [Option<u8>; 32] = [
    Some(17), Some(18), Some(27), Some(22), Some(23), Some(24), Some(25), Some(4),
    Some(2), Some(3), Some(8), Some(7), Some(10), Some(9), Some(11), Some(14),
    Some(15), None, None, None, None, Some(5), Some(6), Some(13),
    Some(19), Some(26), Some(12), Some(16), Some(20), Some(21), Some(0), Some(1),
];

const MAX_BCM: u8 = 27;

pub fn wiring_pi_to_bcm(pin: u8) -> Option<u8>{
    WPI_TO_BCM.get(pin as usize).copied().flatten()
}

impl PinNumbering{
    pub fn to_bcm(&self, pin: u8) -> HwResult<u8>{
        match self{
            PinNumbering::WiringPi => wiring_pi_to_bcm(pin).ok_or(HwError::InvalidPin(pin)),
            PinNumbering::Bcm if pin <= MAX_BCM => Ok(pin),
            PinNumbering::Bcm => Err(HwError::InvalidPin(pin)),
        }
    }
}
