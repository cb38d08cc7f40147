//! Command/data channel to the PCD8544.
//!
//! The controller tells instructions and pixel data apart by the level of its D/C line
//! while a byte is shifted in: low means command, high means display data. A backend
//! only needs to know how to put one byte on the wire with the right D/C level; the
//! addressing and clearing helpers are built on top of that.
use embedded_hal::{blocking, blocking::delay::DelayUs, digital::v2::OutputPin};

use crate::bitbang::BitBangSpi;
use crate::instructions::Instruction::{Xaddress, Yaddress};
use crate::{ROWS, WIDTH};

const CLEAR_BYTE: u8 = 0x00;

pub trait PCD8544Backend {
    type Error;

    /// Drives D/C to data (`true`) or command (`false`) level, then sends `value`.
    fn write_byte(&mut self, data: bool, value: u8) -> Result<(), Self::Error>;

    /// Drives every bus line low, as required before the reset pulse.
    fn idle(&mut self) -> Result<(), Self::Error>;

    fn send_command(&mut self, value: u8) -> Result<(), Self::Error> {
        self.write_byte(false, value)
    }

    fn send_data(&mut self, value: u8) -> Result<(), Self::Error> {
        self.write_byte(true, value)
    }

    /// Moves the controller's write pointer: column first, then bank.
    fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), Self::Error> {
        self.send_command(Xaddress(col).byte())?;
        self.send_command(Yaddress(row).byte())
    }

    /// Zeroes the whole DDRAM, starting at (0, 0).
    fn clear_all(&mut self) -> Result<(), Self::Error> {
        self.set_cursor(0, 0)?;
        for _ in 0..(WIDTH as u16 * ROWS as u16) {
            self.send_data(CLEAR_BYTE)?;
        }
        Ok(())
    }

    /// Zeroes one bank from the left edge to the right edge.
    fn clear_row(&mut self, row: u8) -> Result<(), Self::Error> {
        self.set_cursor(row, 0)?;
        for _ in 0..WIDTH {
            self.send_data(CLEAR_BYTE)?;
        }
        Ok(())
    }
}

/// Bit-banged backend: clock and data pins driven by [`BitBangSpi`] plus the D/C pin.
pub struct PCD8544GpioBackend<ERR, CLK, DIN, DELAY, DC>
where
    CLK: OutputPin<Error = ERR>,
    DIN: OutputPin<Error = ERR>,
    DELAY: DelayUs<u8>,
    DC: OutputPin<Error = ERR>,
{
    spi: BitBangSpi<ERR, CLK, DIN, DELAY>,
    dc: DC,
}

impl<ERR, CLK, DIN, DELAY, DC> PCD8544GpioBackend<ERR, CLK, DIN, DELAY, DC>
where
    CLK: OutputPin<Error = ERR>,
    DIN: OutputPin<Error = ERR>,
    DELAY: DelayUs<u8>,
    DC: OutputPin<Error = ERR>,
{
    pub fn new(spi: BitBangSpi<ERR, CLK, DIN, DELAY>, dc: DC) -> Self {
        PCD8544GpioBackend { spi, dc }
    }

    pub fn release(self) -> (BitBangSpi<ERR, CLK, DIN, DELAY>, DC) {
        (self.spi, self.dc)
    }
}

impl<ERR, CLK, DIN, DELAY, DC> PCD8544Backend for PCD8544GpioBackend<ERR, CLK, DIN, DELAY, DC>
where
    CLK: OutputPin<Error = ERR>,
    DIN: OutputPin<Error = ERR>,
    DELAY: DelayUs<u8>,
    DC: OutputPin<Error = ERR>,
{
    type Error = ERR;

    fn write_byte(&mut self, data: bool, value: u8) -> Result<(), ERR> {
        if data {
            self.dc.set_high()?;
        } else {
            self.dc.set_low()?;
        }
        self.spi.transmit_byte(value)
    }

    fn idle(&mut self) -> Result<(), ERR> {
        self.spi.idle()?;
        self.dc.set_low()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiBackendError<PinErr, SpiErr> {
    Pin(PinErr),
    Spi(SpiErr),
}

/// Backend for boards that spend a hardware SPI peripheral on the display.
pub struct PCD8544SpiBackend<SPI, DC>
where
    SPI: blocking::spi::Write<u8>,
    DC: OutputPin,
{
    spi: SPI,
    dc: DC,
}

impl<SPI, DC, PinErr, SpiErr> PCD8544SpiBackend<SPI, DC>
where
    SPI: blocking::spi::Write<u8, Error = SpiErr>,
    DC: OutputPin<Error = PinErr>,
{
    pub fn new(spi: SPI, dc: DC) -> PCD8544SpiBackend<SPI, DC> {
        PCD8544SpiBackend { spi, dc }
    }

    pub fn release(self) -> (SPI, DC) {
        (self.spi, self.dc)
    }
}

impl<SPI, DC, PinErr, SpiErr> PCD8544Backend for PCD8544SpiBackend<SPI, DC>
where
    SPI: blocking::spi::Write<u8, Error = SpiErr>,
    DC: OutputPin<Error = PinErr>,
{
    type Error = SpiBackendError<PinErr, SpiErr>;

    fn write_byte(&mut self, data: bool, value: u8) -> Result<(), Self::Error> {
        if data {
            self.dc.set_high().map_err(SpiBackendError::Pin)?;
        } else {
            self.dc.set_low().map_err(SpiBackendError::Pin)?;
        }
        self.spi.write(&[value]).map_err(SpiBackendError::Spi)
    }

    // the peripheral owns clock and data, only D/C is ours to park
    fn idle(&mut self) -> Result<(), Self::Error> {
        self.dc.set_low().map_err(SpiBackendError::Pin)
    }
}
