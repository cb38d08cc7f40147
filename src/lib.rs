//! # Push-button lamp with a PCD8544 status display
//!
//! Two independent halves share this crate:
//!
//!  - a driver for the PCD8544 (Nokia 5110/3310) display controller, talked to over a
//!    write-only, bit-banged serial bus and used to render fixed-width text at normal or
//!    double size ([`display`], [`textmode`], [`backend`], [`bitbang`]),
//!  - the LED side: a software-pulsed brightness level ([`brightness`]) and the
//!    button/sleep state machine that drives it from a pin-change interrupt ([`power`]).
//!
//! Everything is generic over embedded_hal traits plus the small platform traits in
//! [`power`], so the protocol and the state machines run unchanged on the host in tests.
#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate embedded_hal as hal;

pub mod backend;
pub mod bitbang;
pub mod brightness;
pub mod config;
pub mod display;
pub mod error;
pub mod font;
pub mod instructions;
pub mod power;
pub mod textmode;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{PCD8544Backend, PCD8544GpioBackend, PCD8544SpiBackend};
pub use bitbang::BitBangSpi;
pub use brightness::{Brightness, SharedBrightness, FULL_BRIGHTNESS};
pub use config::{DisplayConfig, PowerConfig};
pub use display::{InitState, PCD8544};
pub use error::DisplayError;
pub use power::{
    EdgeSource, InterruptControl, InterruptMask, PowerController, PowerState, SleepControl,
    Transition,
};
pub use textmode::{TextSize, TextWriter};

/// Display width in pixels (and columns)
pub const WIDTH: u8 = 84;
/// Display height in pixels
pub const HEIGHT: u8 = 48;
/// Number of 8 pixel high banks, also the number of text rows
pub const ROWS: u8 = HEIGHT / 8;
/// Size of the display data RAM in bytes
pub const DDRAM_SIZE: usize = WIDTH as usize * ROWS as usize;
