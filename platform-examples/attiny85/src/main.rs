//! Push-button lamp on an ATtiny85 running from the internal 1 MHz clock.
//!
//! Wiring (all on PORTB):
//!
//! | PCD8544 | pin |
//! |---------|-----|
//! | RST     | PB0 |
//! | D/C     | PB1 |
//! | DIN     | PB2 |
//! | CLK     | PB4 |
//!
//! The LED sits on PB5, which needs the RSTDISBL fuse programmed. The button pulls PB3
//! to ground.
#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

use core::convert::Infallible;

use avr_device::attiny85::{self, AC, ADC, CPU, EXINT, PORTB};
use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::digital::v2::OutputPin;
use panic_halt as _;

use pcd8544_lamp::{
    BitBangSpi, Brightness, DisplayError, EdgeSource, InterruptControl, PCD8544GpioBackend,
    PowerController, SharedBrightness, SleepControl, TextSize, FULL_BRIGHTNESS, PCD8544,
};

const CPU_HZ: u32 = 1_000_000;

const RST: u8 = 0;
const DC: u8 = 1;
const DIN: u8 = 2;
const BUTTON: u8 = 3;
const CLK: u8 = 4;
const LED: u8 = 5;

/// Supply settle time before anything is touched
const STARTUP_SETTLE_MS: u16 = 1000;

const BANNER: &str = "0123456789";

static LAMP: SharedBrightness<PortB<LED>> = SharedBrightness::new();

#[avr_device::entry]
fn main() -> ! {
    let mut delay = BusyDelay;
    delay.delay_ms(STARTUP_SETTLE_MS);

    LAMP.install(Brightness::new(PortB::<LED>::output()));

    let mut power = PowerController::new(Attiny85);
    power.arm(&mut Button);

    if let Some(Err(never)) = LAMP.with(|lamp| lamp.set_level(FULL_BRIGHTNESS.into())) {
        match never {}
    }

    show_banner(&mut delay);

    loop {
        if let Some(Err(never)) = LAMP.with(|lamp| lamp.tick(&mut delay)) {
            match never {}
        }
    }
}

fn show_banner(delay: &mut BusyDelay) {
    let clk = PortB::<CLK>::output();
    let din = PortB::<DIN>::output();
    let spi = match BitBangSpi::new(clk, din) {
        Ok(spi) => spi,
        Err(never) => match never {},
    };
    let backend = PCD8544GpioBackend::new(spi, PortB::<DC>::output());
    let mut display = PCD8544::new(backend, PortB::<RST>::output());

    let shown = display
        .init(delay)
        .and_then(|()| display.render_string(0, 0, BANNER, TextSize::Double));
    match shown {
        Ok(()) => {}
        Err(DisplayError::Bus(never) | DisplayError::Reset(never)) => match never {},
    }
}

#[avr_device::interrupt(attiny85)]
fn PCINT0() {
    let mut power = PowerController::new(Attiny85);
    if let Err(never) = power.on_edge(&LAMP, &mut BusyDelay) {
        match never {}
    }
}

fn portb() -> &'static attiny85::portb::RegisterBlock {
    // SAFETY: every access below is a single register write or runs in a critical section
    unsafe { &*PORTB::ptr() }
}

/// One PORTB line as a push-pull output.
pub struct PortB<const N: u8>;

impl<const N: u8> PortB<N> {
    fn output() -> Self {
        avr_device::interrupt::free(|_| {
            portb()
                .ddrb
                .modify(|r, w| unsafe { w.bits(r.bits() | 1 << N) })
        });
        PortB
    }
}

impl<const N: u8> OutputPin for PortB<N> {
    type Error = Infallible;

    // the interrupt handler writes PB5, so read-modify-write must not be torn
    fn set_low(&mut self) -> Result<(), Infallible> {
        avr_device::interrupt::free(|_| {
            portb()
                .portb
                .modify(|r, w| unsafe { w.bits(r.bits() & !(1 << N)) })
        });
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        avr_device::interrupt::free(|_| {
            portb()
                .portb
                .modify(|r, w| unsafe { w.bits(r.bits() | 1 << N) })
        });
        Ok(())
    }
}

/// PB3 with its pin-change interrupt
struct Button;

impl EdgeSource for Button {
    fn configure_input_pullup(&mut self) {
        avr_device::interrupt::free(|_| {
            let port = portb();
            port.portb
                .modify(|r, w| unsafe { w.bits(r.bits() | 1 << BUTTON) });
            port.ddrb
                .modify(|r, w| unsafe { w.bits(r.bits() & !(1 << BUTTON)) });
        });
    }

    fn enable_edge_interrupt(&mut self) {
        // SAFETY: EXINT is only touched from here and from `Attiny85`
        let exint = unsafe { &*EXINT::ptr() };
        exint.pcmsk.modify(|_, w| w.pcint3().set_bit());
        exint.gimsk.modify(|_, w| w.pcie().set_bit());
    }
}

/// Interrupt and sleep registers of the core
#[derive(Clone, Copy)]
struct Attiny85;

impl Attiny85 {
    fn cpu(self) -> &'static attiny85::cpu::RegisterBlock {
        // SAFETY: MCUCR is only modified with interrupts disabled
        unsafe { &*CPU::ptr() }
    }
}

impl InterruptControl for Attiny85 {
    fn disable_interrupts(&mut self) {
        avr_device::interrupt::disable();
    }

    fn enable_interrupts(&mut self) {
        // SAFETY: no critical section is open when the controller unmasks
        unsafe { avr_device::interrupt::enable() };
    }

    fn discard_pending_edges(&mut self) {
        // SAFETY: GIFR flags are cleared by writing one
        let exint = unsafe { &*EXINT::ptr() };
        exint.gifr.write(|w| w.pcif().set_bit());
    }
}

impl SleepControl for Attiny85 {
    fn disable_unused_peripherals(&mut self) {
        // SAFETY: called once during start-up, before interrupts are enabled
        let (adc, ac) = unsafe { (&*ADC::ptr(), &*AC::ptr()) };
        adc.adcsra.modify(|_, w| w.aden().clear_bit());
        ac.acsr.modify(|_, w| w.acd().set_bit());
        // BODS (bit 7) and BODSE (bit 2)
        self.cpu()
            .mcucr
            .modify(|r, w| unsafe { w.bits(r.bits() | 1 << 7 | 1 << 2) });
    }

    fn select_power_down(&mut self) {
        self.cpu().mcucr.modify(|_, w| w.sm().pdown());
    }

    fn arm_sleep(&mut self) {
        self.cpu().mcucr.modify(|_, w| w.se().set_bit());
    }

    fn sleep(&mut self) {
        avr_device::asm::sleep();
    }

    fn disarm_sleep(&mut self) {
        self.cpu().mcucr.modify(|_, w| w.se().clear_bit());
    }
}

/// Busy-wait delay calibrated for [`CPU_HZ`]. Interrupts stretch it.
struct BusyDelay;

impl DelayMs<u16> for BusyDelay {
    fn delay_ms(&mut self, ms: u16) {
        for _ in 0..ms {
            avr_device::asm::delay_cycles(CPU_HZ / 1_000);
        }
    }
}

impl DelayUs<u16> for BusyDelay {
    fn delay_us(&mut self, us: u16) {
        avr_device::asm::delay_cycles(u32::from(us) * (CPU_HZ / 1_000_000));
    }
}
