//! Recording fakes shared by the unit tests.
//!
//! Every pin, delay, SPI bus and MCU fake created from one [`Bus`] appends to the same
//! ordered event log, so tests can assert the exact interleaving of line transitions,
//! delays and interrupt/sleep calls.
use core::convert::Infallible;
use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use hal::blocking::delay::{DelayMs, DelayUs};
use hal::blocking::spi::Write as SpiWrite;
use hal::digital::v2::OutputPin;

use crate::backend::PCD8544GpioBackend;
use crate::bitbang::{BitBangSpi, NoDelay};
use crate::display::PCD8544;
use crate::power::{EdgeSource, InterruptControl, SleepControl};
use crate::{ROWS, WIDTH};

pub type TestBackend =
    PCD8544GpioBackend<Infallible, RecordingPin, RecordingPin, NoDelay, RecordingPin>;
pub type TestDisplay = PCD8544<TestBackend, RecordingPin>;

/// Bit-banged driver on a fresh log; construction events are dropped.
pub fn display(bus: &Bus) -> TestDisplay {
    let spi = BitBangSpi::new(bus.pin(Line::Clk), bus.pin(Line::Din)).unwrap();
    let backend = PCD8544GpioBackend::new(spi, bus.pin(Line::Dc));
    let display = PCD8544::new(backend, bus.pin(Line::Rst));
    bus.clear();
    display
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Clk,
    Din,
    Dc,
    Rst,
    Led,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mcu {
    DisableInterrupts,
    EnableInterrupts,
    DiscardPendingEdges,
    DisableUnusedPeripherals,
    SelectPowerDown,
    ArmSleep,
    Sleep,
    DisarmSleep,
    ButtonPullup,
    ButtonEdgeInterrupt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    High(Line),
    Low(Line),
    DelayMs(u32),
    DelayUs(u32),
    Spi(u8),
    Mcu(Mcu),
}

/// Byte as seen by the display controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Command(u8),
    Data(u8),
}

#[derive(Debug, Clone, Default)]
pub struct Bus {
    log: Rc<RefCell<Vec<Event>>>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pin(&self, line: Line) -> RecordingPin {
        RecordingPin {
            line,
            log: self.log.clone(),
        }
    }

    pub fn delay(&self) -> RecordingDelay {
        RecordingDelay {
            log: self.log.clone(),
        }
    }

    pub fn spi(&self) -> RecordingSpi {
        RecordingSpi {
            log: self.log.clone(),
        }
    }

    pub fn mcu(&self) -> FakeMcu {
        FakeMcu {
            log: self.log.clone(),
        }
    }

    pub fn button(&self) -> FakeButton {
        FakeButton {
            log: self.log.clone(),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    pub fn frames(&self) -> Vec<Frame> {
        decode(&self.events())
    }

    pub fn data_bytes(&self) -> Vec<u8> {
        self.frames()
            .into_iter()
            .filter_map(|frame| match frame {
                Frame::Data(byte) => Some(byte),
                Frame::Command(_) => None,
            })
            .collect()
    }

    fn push(log: &Rc<RefCell<Vec<Event>>>, event: Event) {
        log.borrow_mut().push(event);
    }
}

/// Rebuilds the byte stream the controller samples: one bit per rising clock edge,
/// MSB first, with the command-select level at the eighth edge deciding the byte kind.
pub fn decode(events: &[Event]) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut din = false;
    let mut dc = false;
    let mut value = 0u8;
    let mut bits = 0;
    for event in events {
        match *event {
            Event::High(Line::Din) => din = true,
            Event::Low(Line::Din) => din = false,
            Event::High(Line::Dc) => dc = true,
            Event::Low(Line::Dc) => dc = false,
            Event::High(Line::Clk) => {
                value = (value << 1) | din as u8;
                bits += 1;
                if bits == 8 {
                    frames.push(if dc {
                        Frame::Data(value)
                    } else {
                        Frame::Command(value)
                    });
                    value = 0;
                    bits = 0;
                }
            }
            _ => {}
        }
    }
    frames
}

/// A data byte and the (row, column) it lands on, following the controller's write
/// pointer through addressing commands. Columns are not wrapped, so a write past the
/// right edge shows up as column 84 or more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placed {
    pub row: u8,
    pub col: u8,
    pub byte: u8,
}

pub fn placed(frames: &[Frame]) -> Vec<Placed> {
    let (mut row, mut col) = (0u8, 0u8);
    let mut out = Vec::new();
    for frame in frames {
        match *frame {
            Frame::Command(cmd) if cmd & 0x80 != 0 => col = cmd & 0x7f,
            Frame::Command(cmd) if cmd & 0xc0 == 0x40 => row = cmd & 0x07,
            Frame::Command(_) => {}
            Frame::Data(byte) => {
                out.push(Placed { row, col, byte });
                col = col.saturating_add(1);
            }
        }
    }
    out
}

/// Screen contents after replaying `frames` onto a blank display.
pub fn screen(frames: &[Frame]) -> [[u8; WIDTH as usize]; ROWS as usize] {
    let mut ram = [[0u8; WIDTH as usize]; ROWS as usize];
    for p in placed(frames) {
        if p.col < WIDTH && p.row < ROWS {
            ram[p.row as usize][p.col as usize] = p.byte;
        }
    }
    ram
}

pub struct RecordingPin {
    line: Line,
    log: Rc<RefCell<Vec<Event>>>,
}

impl OutputPin for RecordingPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        Bus::push(&self.log, Event::Low(self.line));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Bus::push(&self.log, Event::High(self.line));
        Ok(())
    }
}

pub struct RecordingDelay {
    log: Rc<RefCell<Vec<Event>>>,
}

macro_rules! recording_delay {
    ($($t:ty),*) => {
        $(
            impl DelayMs<$t> for RecordingDelay {
                fn delay_ms(&mut self, ms: $t) {
                    Bus::push(&self.log, Event::DelayMs(ms as u32));
                }
            }

            impl DelayUs<$t> for RecordingDelay {
                fn delay_us(&mut self, us: $t) {
                    Bus::push(&self.log, Event::DelayUs(us as u32));
                }
            }
        )*
    };
}

recording_delay!(u8, u16, u32);

pub struct RecordingSpi {
    log: Rc<RefCell<Vec<Event>>>,
}

impl SpiWrite<u8> for RecordingSpi {
    type Error = Infallible;

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        for word in words {
            Bus::push(&self.log, Event::Spi(*word));
        }
        Ok(())
    }
}

pub struct FakeMcu {
    log: Rc<RefCell<Vec<Event>>>,
}

impl FakeMcu {
    fn record(&self, call: Mcu) {
        Bus::push(&self.log, Event::Mcu(call));
    }
}

impl InterruptControl for FakeMcu {
    fn disable_interrupts(&mut self) {
        self.record(Mcu::DisableInterrupts);
    }

    fn enable_interrupts(&mut self) {
        self.record(Mcu::EnableInterrupts);
    }

    fn discard_pending_edges(&mut self) {
        self.record(Mcu::DiscardPendingEdges);
    }
}

impl SleepControl for FakeMcu {
    fn disable_unused_peripherals(&mut self) {
        self.record(Mcu::DisableUnusedPeripherals);
    }

    fn select_power_down(&mut self) {
        self.record(Mcu::SelectPowerDown);
    }

    fn arm_sleep(&mut self) {
        self.record(Mcu::ArmSleep);
    }

    fn sleep(&mut self) {
        self.record(Mcu::Sleep);
    }

    fn disarm_sleep(&mut self) {
        self.record(Mcu::DisarmSleep);
    }
}

pub struct FakeButton {
    log: Rc<RefCell<Vec<Event>>>,
}

impl EdgeSource for FakeButton {
    fn configure_input_pullup(&mut self) {
        Bus::push(&self.log, Event::Mcu(Mcu::ButtonPullup));
    }

    fn enable_edge_interrupt(&mut self) {
        Bus::push(&self.log, Event::Mcu(Mcu::ButtonEdgeInterrupt));
    }
}
