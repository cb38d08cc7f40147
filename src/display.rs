//! # Main driver for the PCD8544
//!
//! Holds the command/data channel and the reset pin, and walks the controller through
//! its power-on sequence. Text rendering lives in [`textmode`](crate::textmode) and is
//! implemented on the same struct.
//!
//! The controller is in an undefined state after power on. Until [`PCD8544::init`] has
//! pulsed reset and sent the configuration, anything written to it may be garbled, and
//! skipping the reset hold can leave the glass driven with wrong voltages.
use hal::blocking::delay::DelayMs;
use hal::digital::v2::OutputPin;

use crate::{
    backend::PCD8544Backend,
    config::DisplayConfig,
    error::DisplayError,
    instructions::prelude::*,
};

/// Error type of a driver built from `Backend` and reset pin `RST`
pub type Error<Backend, RST> =
    DisplayError<<Backend as PCD8544Backend>::Error, <RST as OutputPin>::Error>;

/// Where the driver is in its power-on sequence.
///
/// The steps only move forward; once `Ready` only a hardware reset brings the
/// controller back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitState {
    Uninitialized,
    /// every control line is an output and driven low
    PinsConfigured,
    /// reset pulse done
    Reset,
    /// configuration sent, ready for data
    Ready,
}

/// PCD8544 driver: command/data channel, reset pin and power-on state.
pub struct PCD8544<Backend, RST> {
    pub(crate) backend: Backend,
    rst: RST,
    config: DisplayConfig,
    state: InitState,
}

impl<Backend, RST> PCD8544<Backend, RST>
where
    Backend: PCD8544Backend,
    RST: OutputPin,
{
    /// Create a driver with the default configuration. Nothing is sent yet, call
    /// [`init`](Self::init) before rendering.
    pub fn new(backend: Backend, rst: RST) -> Self {
        Self::with_config(backend, rst, DisplayConfig::default())
    }

    pub fn with_config(backend: Backend, rst: RST, config: DisplayConfig) -> Self {
        PCD8544 {
            backend,
            rst,
            config,
            state: InitState::Uninitialized,
        }
    }

    pub fn state(&self) -> InitState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == InitState::Ready
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Runs the power-on sequence: all lines low, reset pulse with the configured
    /// settle hold, then the configuration commands.
    ///
    /// Calling it again on a ready controller does nothing.
    pub fn init<D>(&mut self, delay: &mut D) -> Result<(), Error<Backend, RST>>
    where
        D: DelayMs<u16>,
    {
        if self.state == InitState::Ready {
            return Ok(());
        }

        Self::bus(self.backend.idle())?;
        Self::reset(self.rst.set_low())?;
        self.enter(InitState::PinsConfigured);

        // the hold is a hardware requirement, it must never be shortened
        Self::reset(self.rst.set_low())?;
        delay.delay_ms(self.config.reset_settle_ms);
        Self::reset(self.rst.set_high())?;
        self.enter(InitState::Reset);

        for command in self.config.init_sequence() {
            Self::bus(self.backend.send_command(command))?;
        }
        self.enter(InitState::Ready);
        Ok(())
    }

    /// Zeroes the whole display.
    pub fn clear(&mut self) -> Result<(), Error<Backend, RST>> {
        Self::bus(self.backend.clear_all())
    }

    /// Zeroes one 8 pixel row, `row` wraps modulo 6.
    pub fn clear_row(&mut self, row: u8) -> Result<(), Error<Backend, RST>> {
        Self::bus(self.backend.clear_row(row))
    }

    pub fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), Error<Backend, RST>> {
        Self::bus(self.backend.set_cursor(row, col))
    }

    /// Sends a single instruction, wrapped in the FunctionSet switches an extended
    /// instruction needs. The controller is left in the basic instruction set.
    pub fn write_command(&mut self, instruction: Instruction) -> Result<(), Error<Backend, RST>> {
        if instruction.extended() {
            for command in [
                FunctionSet { pd: false, v: false, h: true }.byte(),
                instruction.byte(),
                FunctionSet { pd: false, v: false, h: false }.byte(),
            ] {
                Self::bus(self.backend.send_command(command))?;
            }
            Ok(())
        } else {
            Self::bus(self.backend.send_command(instruction.byte()))
        }
    }

    /// Contrast (Vop), 7 bits
    pub fn set_contrast(&mut self, contrast: u8) -> Result<(), Error<Backend, RST>> {
        self.config.contrast = contrast & 0x7f;
        self.write_command(SetVop(contrast))
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) -> Result<(), Error<Backend, RST>> {
        self.config.display_mode = mode;
        self.write_command(SetDisplayMode(mode))
    }

    /// Gives the channel and the reset pin back.
    pub fn release(self) -> (Backend, RST) {
        (self.backend, self.rst)
    }

    pub(crate) fn bus<T>(result: Result<T, Backend::Error>) -> Result<T, Error<Backend, RST>> {
        result.map_err(DisplayError::Bus)
    }

    fn reset<T>(result: Result<T, RST::Error>) -> Result<T, Error<Backend, RST>> {
        result.map_err(DisplayError::Reset)
    }

    fn enter(&mut self, state: InitState) {
        #[cfg(feature = "defmt")]
        defmt::debug!("pcd8544: {} -> {}", self.state, state);
        self.state = state;
    }
}
