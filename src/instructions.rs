//! # Instruction set of the PCD8544
//!
//! Instructions are plain values that encode to the single command byte the controller
//! expects while the command-select line is low. The layout follows the data sheet:
//! <https://www.sparkfun.com/datasheets/LCD/Monochrome/Nokia5110.pdf>
//!
//! Some instructions only exist in the "extended" instruction set (H = 1 in
//! FunctionSet): contrast, temperature coefficient and bias. Everything else, including
//! the two addressing commands, needs the basic set (H = 0).

use crate::{ROWS, WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
/// Temperature coefficient of the LCD supply voltage.
///
/// The controller raises Vop by this many millivolt per Kelvin below 27 °C.
pub enum TemperatureCoefficient {
    /// Adds 1 mV/K
    TC0 = 0b00,
    /// Adds 9 mV/K
    TC1 = 0b01,
    /// Adds 17 mV/K
    TC2 = 0b10,
    /// Adds 24 mV/K
    TC3 = 0b11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
/// Bias voltage, chosen by the multiplex rate of the attached glass.
/// The Nokia 5110 glass is 1:48.
pub enum MuxRate {
    Bias1To100 = 0,
    Bias1To80 = 1,
    Bias1To65 = 2,
    Bias1To48 = 3,
    Bias1To40 = 4,
    Bias1To24 = 5,
    Bias1To18 = 6,
    Bias1To10 = 7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
/// The display mode (normal, inversed, all black or all blank).
pub enum DisplayMode {
    /// All pixels off
    DisplayBlank = 0b000,
    /// Show DDRAM, a set bit is a black pixel
    Normal = 0b100,
    /// All pixels on
    AllSegmentsOn = 0b001,
    /// Show DDRAM inverted
    InverseVideo = 0b101,
}

/// PCD8544 instruction set, both basic and extended instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Instruction {
    /// no operation
    NOP,

    /// PD -> 0=active 1=power down | V -> 0=horizontal 1=vertical addressing |
    /// H -> 0=basic 1=extended instruction set
    FunctionSet { pd: bool, v: bool, h: bool },

    /// set display configuration
    SetDisplayMode(DisplayMode),

    /// set the bank (8 pixel row) of the DDRAM pointer, wraps modulo 6
    Yaddress(u8),

    /// set the column of the DDRAM pointer, clamped to 0..=83
    Xaddress(u8),

    /// extended: temperature compensation curve
    SetTempCoefficient(TemperatureCoefficient),

    /// extended: bias voltage for the glass' multiplex rate
    SetBiasMode(MuxRate),

    /// extended: operating voltage, i.e. contrast, 7 bits
    SetVop(u8),
}

use Instruction::*;

impl Instruction {
    /// Returns the instruction as the byte sent over the wire.
    pub fn byte(self) -> u8 {
        match self {
            NOP => 0b0000_0000,
            FunctionSet { pd, v, h } => {
                0b0010_0000 | ((pd as u8) << 2) | ((v as u8) << 1) | h as u8
            }
            SetDisplayMode(mode) => 0b0000_1000 | mode as u8,
            Yaddress(y) => 0b0100_0000 | (y % ROWS),
            Xaddress(x) => 0b1000_0000 | x.min(WIDTH - 1),
            SetTempCoefficient(coeff) => 0b0000_0100 | coeff as u8,
            SetBiasMode(mux) => 0b0001_0000 | mux as u8,
            SetVop(contrast) => 0b1000_0000 | (contrast & 0x7f),
        }
    }

    /// Whether the instruction needs the extended instruction set (H = 1).
    pub fn extended(self) -> bool {
        matches!(self, SetTempCoefficient(_) | SetBiasMode(_) | SetVop(_))
    }
}

/// A prelude for convenience, it pulls all enums into scope.
pub mod prelude {
    pub use super::{
        DisplayMode, DisplayMode::*, Instruction, Instruction::*, MuxRate, MuxRate::*,
        TemperatureCoefficient, TemperatureCoefficient::*,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn encodes_power_on_sequence() {
        let bytes = [
            FunctionSet { pd: false, v: false, h: true }.byte(),
            SetVop(0x21).byte(),
            SetTempCoefficient(TC0).byte(),
            SetBiasMode(Bias1To48).byte(),
            FunctionSet { pd: false, v: false, h: false }.byte(),
            SetDisplayMode(Normal).byte(),
        ];
        assert_eq!(bytes, [0x21, 0xa1, 0x04, 0x14, 0x20, 0x0c]);
    }

    #[test]
    fn addressing_wraps_rows_and_clamps_columns() {
        assert_eq!(Xaddress(0).byte(), 0x80);
        assert_eq!(Xaddress(83).byte(), 0x80 | 83);
        assert_eq!(Xaddress(200).byte(), 0x80 | 83);
        assert_eq!(Yaddress(5).byte(), 0x45);
        assert_eq!(Yaddress(7).byte(), 0x41);
    }

    #[test]
    fn only_voltage_settings_are_extended() {
        assert!(SetVop(1).extended());
        assert!(SetBiasMode(Bias1To48).extended());
        assert!(SetTempCoefficient(TC2).extended());
        assert!(!Xaddress(1).extended());
        assert!(!SetDisplayMode(InverseVideo).extended());
        assert!(!NOP.extended());
    }
}
