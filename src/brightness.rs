//! # Software dimmed LED
//!
//! There is no PWM channel behind the LED pin. Brightness is produced by the main loop
//! calling [`Brightness::tick`] as fast as it can: each tick flashes the LED for a fixed
//! short pulse and then keeps it dark for `255 - level` microseconds. A high level
//! therefore means a short dark dwell and a bright LED.
//!
//! The level is written from the button interrupt and read from the main loop, so the
//! firmware keeps the state machine in a [`SharedBrightness`] and only touches it inside
//! a critical section.
use core::cell::RefCell;

use critical_section::Mutex;
use hal::blocking::delay::DelayUs;
use hal::digital::v2::OutputPin;

/// Brightest level, shortest dark dwell
pub const FULL_BRIGHTNESS: u8 = 255;

/// Width of the on pulse of one tick in microseconds
pub const PULSE_WIDTH_US: u16 = 1;

/// Brightness level plus the LED pin it is rendered on.
pub struct Brightness<LED> {
    led: LED,
    level: u8,
}

impl<LED> Brightness<LED>
where
    LED: OutputPin,
{
    /// Starts dark. The pin is not touched until the first level change or tick.
    pub fn new(led: LED) -> Self {
        Brightness { led, level: 0 }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Stores `value` clamped to `0..=255`. Level 0 switches the LED off right away
    /// instead of waiting for the next tick.
    pub fn set_level(&mut self, value: i32) -> Result<(), LED::Error> {
        self.level = value.clamp(0, i32::from(FULL_BRIGHTNESS)) as u8;
        if self.level == 0 {
            self.led.set_low()?;
        }
        Ok(())
    }

    /// One pulse period: on for [`PULSE_WIDTH_US`], then dark for `255 - level` µs.
    /// Does nothing at level 0.
    pub fn tick<D>(&mut self, delay: &mut D) -> Result<(), LED::Error>
    where
        D: DelayUs<u16>,
    {
        if self.level == 0 {
            return Ok(());
        }
        self.led.set_high()?;
        delay.delay_us(PULSE_WIDTH_US);
        self.led.set_low()?;

        let dwell = u16::from(FULL_BRIGHTNESS - self.level);
        if dwell > 0 {
            delay.delay_us(dwell);
        }
        Ok(())
    }

    pub fn release(self) -> LED {
        self.led
    }
}

/// A [`Brightness`] that can live in a `static` shared by the main loop and an
/// interrupt handler.
///
/// Empty until [`install`](Self::install) is called during start-up.
pub struct SharedBrightness<LED> {
    inner: Mutex<RefCell<Option<Brightness<LED>>>>,
}

impl<LED> SharedBrightness<LED>
where
    LED: OutputPin,
{
    pub const fn new() -> Self {
        SharedBrightness {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Puts `brightness` in place, handing back whatever was installed before.
    pub fn install(&self, brightness: Brightness<LED>) -> Option<Brightness<LED>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).replace(brightness))
    }

    /// Runs `f` on the state machine inside a critical section. `None` if nothing is
    /// installed yet.
    ///
    /// `f` must not block on anything that needs interrupts, the whole call runs with
    /// them masked.
    pub fn with<R>(&self, f: impl FnOnce(&mut Brightness<LED>) -> R) -> Option<R> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).as_mut().map(f))
    }

    /// Current level, 0 while empty
    pub fn level(&self) -> u8 {
        self.with(|brightness| brightness.level()).unwrap_or(0)
    }
}

impl<LED> Default for SharedBrightness<LED>
where
    LED: OutputPin,
{
    fn default() -> Self {
        Self::new()
    }
}
