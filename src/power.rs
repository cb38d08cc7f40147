//! # Button and power handling
//!
//! A single push button cycles the lamp: a press while it is not at full brightness
//! turns it fully on, a press at full brightness turns it off and puts the whole MCU
//! into power-down sleep. The next press wakes it and starts over.
//!
//! Everything here runs from the button's pin-change interrupt. Contact bounce is
//! swallowed by keeping interrupts masked for a hold time after each press and dropping
//! whatever edges were latched meanwhile.
//!
//! The MCU specific parts (interrupt flag, sleep registers, pin-change setup) are
//! reached through the [`InterruptControl`], [`SleepControl`] and [`EdgeSource`] traits.
use hal::blocking::delay::DelayMs;
use hal::digital::v2::OutputPin;

use crate::brightness::{SharedBrightness, FULL_BRIGHTNESS};
use crate::config::PowerConfig;

/// Global interrupt enable of the MCU.
pub trait InterruptControl {
    fn disable_interrupts(&mut self);

    fn enable_interrupts(&mut self);

    /// Clears a latched pin-change flag so the edge never reaches its handler.
    fn discard_pending_edges(&mut self);
}

/// Sleep mode control of the MCU.
pub trait SleepControl {
    /// Switches off peripherals the firmware never uses (ADC, analog comparator,
    /// brown-out detector) to cut sleep current.
    fn disable_unused_peripherals(&mut self);

    /// Selects the deepest sleep mode, woken only by external interrupts.
    fn select_power_down(&mut self);

    /// Sets the sleep enable bit.
    fn arm_sleep(&mut self);

    /// Halts the core until an enabled interrupt fires.
    fn sleep(&mut self);

    /// Clears the sleep enable bit.
    fn disarm_sleep(&mut self);
}

/// The button pin and its pin-change interrupt.
pub trait EdgeSource {
    fn configure_input_pullup(&mut self);

    fn enable_edge_interrupt(&mut self);
}

/// Interrupts stay masked while this is alive. Dropping it clears the edges latched in
/// the meantime and unmasks again.
pub struct InterruptMask<'a, M>
where
    M: InterruptControl,
{
    mcu: &'a mut M,
}

impl<'a, M> InterruptMask<'a, M>
where
    M: InterruptControl,
{
    pub fn new(mcu: &'a mut M) -> Self {
        mcu.disable_interrupts();
        InterruptMask { mcu }
    }
}

impl<'a, M> Drop for InterruptMask<'a, M>
where
    M: InterruptControl,
{
    fn drop(&mut self) {
        self.mcu.discard_pending_edges();
        self.mcu.enable_interrupts();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// awake, LED off or dimmed
    Dim,
    /// awake at full brightness
    Bright,
    /// LED off, waiting out the hold before sleeping
    PoweringDown,
    /// core halted in power-down
    Asleep,
}

impl PowerState {
    pub fn for_level(level: u8) -> Self {
        if level == FULL_BRIGHTNESS {
            PowerState::Bright
        } else {
            PowerState::Dim
        }
    }
}

/// What a button edge did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    /// went to full brightness
    Brightened,
    /// went dark, slept, and has been woken up again
    Slept,
}

/// Drives the lamp through its press cycle.
///
/// Cheap to build, the firmware creates one per interrupt. `on_edge` must not hold any
/// borrow of the lamp while sleeping, because the waking edge runs the handler again
/// before the sleeping call returns.
pub struct PowerController<M> {
    mcu: M,
    config: PowerConfig,
    state: PowerState,
}

impl<M> PowerController<M>
where
    M: InterruptControl + SleepControl,
{
    pub fn new(mcu: M) -> Self {
        Self::with_config(mcu, PowerConfig::default())
    }

    pub fn with_config(mcu: M, config: PowerConfig) -> Self {
        PowerController {
            mcu,
            config,
            state: PowerState::Dim,
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Start-up: peripherals off, button as pulled-up input with its edge interrupt,
    /// then interrupts on. Edges are delivered from here on.
    pub fn arm<B>(&mut self, button: &mut B)
    where
        B: EdgeSource,
    {
        self.mcu.disable_unused_peripherals();
        button.configure_input_pullup();
        button.enable_edge_interrupt();
        self.mcu.enable_interrupts();
    }

    /// Handles one button edge.
    ///
    /// Below full brightness: go to full brightness and hold for
    /// `brighten_hold_ms`. At full brightness: LED off, hold for `power_down_hold_ms`,
    /// then sleep until the next edge. Returns once awake again.
    pub fn on_edge<LED, D>(
        &mut self,
        lamp: &SharedBrightness<LED>,
        delay: &mut D,
    ) -> Result<Transition, LED::Error>
    where
        LED: OutputPin,
        D: DelayMs<u16>,
    {
        self.state = PowerState::for_level(lamp.level());

        if self.state == PowerState::Bright {
            Self::set_level(lamp, 0)?;
            self.enter(PowerState::PoweringDown);
            self.hold(delay, self.config.power_down_hold_ms);
            self.power_down();
            self.enter(PowerState::for_level(lamp.level()));
            Ok(Transition::Slept)
        } else {
            Self::set_level(lamp, FULL_BRIGHTNESS.into())?;
            self.enter(PowerState::Bright);
            self.hold(delay, self.config.brighten_hold_ms);
            Ok(Transition::Brightened)
        }
    }

    /// Gives the MCU handle back.
    pub fn release(self) -> M {
        self.mcu
    }

    fn set_level<LED>(lamp: &SharedBrightness<LED>, level: i32) -> Result<(), LED::Error>
    where
        LED: OutputPin,
    {
        lamp.with(|brightness| brightness.set_level(level))
            .unwrap_or(Ok(()))
    }

    // bounce edges latched during the hold are dropped
    fn hold<D>(&mut self, delay: &mut D, ms: u16)
    where
        D: DelayMs<u16>,
    {
        let _mask = InterruptMask::new(&mut self.mcu);
        delay.delay_ms(ms);
    }

    fn power_down(&mut self) {
        self.mcu.disable_interrupts();
        self.mcu.select_power_down();
        self.mcu.arm_sleep();
        // unmasked so the next press can wake us
        self.mcu.enable_interrupts();
        self.enter(PowerState::Asleep);
        self.mcu.sleep();
        self.mcu.disarm_sleep();
        self.mcu.disable_interrupts();
    }

    fn enter(&mut self, state: PowerState) {
        #[cfg(feature = "defmt")]
        defmt::debug!("power: {} -> {}", self.state, state);
        self.state = state;
    }
}
