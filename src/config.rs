//! Runtime tunables.
//!
//! Pin assignment is the platform's business; what remains are the controller settings
//! sent at power-on and the timing of the button handling. The defaults are the values
//! the lamp hardware was tuned with.
use crate::instructions::prelude::*;

/// Settings applied by [`PCD8544::init`](crate::PCD8544::init).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayConfig {
    /// Vop, 7 bits
    pub contrast: u8,
    pub temperature_coefficient: TemperatureCoefficient,
    pub bias: MuxRate,
    pub display_mode: DisplayMode,
    /// How long reset is held low. The controller needs tens of milliseconds here.
    pub reset_settle_ms: u16,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            contrast: 0x21,
            temperature_coefficient: TC0,
            bias: Bias1To48,
            display_mode: Normal,
            reset_settle_ms: 10,
        }
    }
}

impl DisplayConfig {
    /// The command bytes sent after the reset pulse, in order.
    ///
    /// Contrast, temperature coefficient and bias live in the extended instruction set,
    /// so the sequence switches to it first and back to the basic set at the end.
    pub fn init_sequence(&self) -> [u8; 6] {
        [
            FunctionSet { pd: false, v: false, h: true }.byte(),
            SetVop(self.contrast).byte(),
            SetTempCoefficient(self.temperature_coefficient).byte(),
            SetBiasMode(self.bias).byte(),
            FunctionSet { pd: false, v: false, h: false }.byte(),
            SetDisplayMode(self.display_mode).byte(),
        ]
    }
}

/// Debounce holds of the button handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerConfig {
    /// Hold after an edge that turned the lamp up
    pub brighten_hold_ms: u16,
    /// Hold after an edge that turned the lamp off, before powering down
    pub power_down_hold_ms: u16,
}

impl Default for PowerConfig {
    fn default() -> Self {
        PowerConfig {
            brighten_hold_ms: 100,
            power_down_hold_ms: 300,
        }
    }
}
