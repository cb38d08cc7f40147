//! "Bit bang" half duplex serial transmitter
//! perfect for the PCD8544 which is write-only and doesn't need full duplex.
//!
//! Use BitBangSpi::new() for slow cores (like an 8 MHz AVR) that do not need a delay
//! and BitBangSpi::new_with_delay() for fast(er) boards.
//!
//! On the wire every byte is exactly 8 data line assignments, each followed by one full
//! clock pulse, most significant bit first. The controller samples the data line on the
//! rising clock edge, so data is always settled before the clock goes high.

use core::marker::PhantomData;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::blocking::spi::Write as SpiWrite;
use embedded_hal::digital::v2::OutputPin;

/// "Bit bang" serial transmitter over a clock and a data pin.
pub struct BitBangSpi<ERR, CLK, DIN, DELAY> {
    clk: CLK,
    din: DIN,
    delay: DELAY,
    _phantom: PhantomData<ERR>,
}

/// Used to run without delay on a slow enough clock speed (below 8Mhz)
pub struct NoDelay {}

impl DelayUs<u8> for NoDelay {
    #[inline]
    fn delay_us(&mut self, _us: u8) {}
}

impl<ERR, CLK, DIN> BitBangSpi<ERR, CLK, DIN, NoDelay>
where
    CLK: OutputPin<Error = ERR>,
    DIN: OutputPin<Error = ERR>,
{
    /// Constructs a transmitter from "clock" and "data in" pins.
    /// If your clock frequency is higher than 8Mhz please consider `new_with_delay`,
    /// otherwise the controller misses bits.
    pub fn new(mut clk: CLK, din: DIN) -> Result<BitBangSpi<ERR, CLK, DIN, NoDelay>, ERR> {
        clk.set_low()?;
        Ok(BitBangSpi {
            clk,
            din,
            delay: NoDelay {},
            _phantom: PhantomData,
        })
    }
}

impl<ERR, CLK, DIN, DELAY> BitBangSpi<ERR, CLK, DIN, DELAY>
where
    CLK: OutputPin<Error = ERR>,
    DIN: OutputPin<Error = ERR>,
    DELAY: DelayUs<u8>,
{
    /// Constructs a transmitter from "clock" and "data in" pins with a 1µs hold after
    /// each clock edge. Please use this variant for clock speeds higher than 8Mhz.
    pub fn new_with_delay(
        mut clk: CLK,
        din: DIN,
        delay: DELAY,
    ) -> Result<BitBangSpi<ERR, CLK, DIN, DELAY>, ERR> {
        clk.set_low()?;
        Ok(BitBangSpi {
            clk,
            din,
            delay,
            _phantom: PhantomData,
        })
    }

    /// Drives both lines low, the idle level the controller expects at reset.
    pub fn idle(&mut self) -> Result<(), ERR> {
        self.clk.set_low()?;
        self.din.set_low()
    }

    /// Shifts `value` out MSB first.
    #[inline]
    pub fn transmit_byte(&mut self, mut value: u8) -> Result<(), ERR> {
        for _ in 0..8 {
            self.write_bit((value & 0x80) == 0x80)?;
            value <<= 1;
        }
        Ok(())
    }

    /// Gives the pins back.
    pub fn release(self) -> (CLK, DIN, DELAY) {
        (self.clk, self.din, self.delay)
    }

    #[inline]
    fn write_bit(&mut self, high: bool) -> Result<(), ERR> {
        if high {
            self.din.set_high()?;
        } else {
            self.din.set_low()?;
        }
        self.clk.set_high()?;
        self.delay.delay_us(1);
        self.clk.set_low()?;
        self.delay.delay_us(1);
        Ok(())
    }
}

impl<ERR, CLK, DIN, DELAY> SpiWrite<u8> for BitBangSpi<ERR, CLK, DIN, DELAY>
where
    CLK: OutputPin<Error = ERR>,
    DIN: OutputPin<Error = ERR>,
    DELAY: DelayUs<u8>,
{
    type Error = ERR;

    #[inline]
    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        for value in words {
            self.transmit_byte(*value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Bus, Event, Frame, Line, RecordingPin};
    use core::convert::Infallible;

    type Transmitter = BitBangSpi<Infallible, RecordingPin, RecordingPin, NoDelay>;

    fn transmitter(bus: &Bus) -> Transmitter {
        let spi = BitBangSpi::new(bus.pin(Line::Clk), bus.pin(Line::Din)).unwrap();
        bus.clear();
        spi
    }

    #[test]
    fn transmits_msb_first_with_one_pulse_per_bit() {
        let bus = Bus::new();
        let mut spi = transmitter(&bus);

        spi.transmit_byte(0b1010_0001).unwrap();

        let expected = [
            true, false, true, false, false, false, false, true,
        ]
        .iter()
        .flat_map(|&bit| {
            [
                if bit { Event::High(Line::Din) } else { Event::Low(Line::Din) },
                Event::High(Line::Clk),
                Event::Low(Line::Clk),
            ]
        })
        .collect::<std::vec::Vec<_>>();
        assert_eq!(bus.events(), expected);
    }

    #[test]
    fn exactly_eight_data_assignments_and_clock_pulses() {
        let bus = Bus::new();
        let mut spi = transmitter(&bus);

        spi.transmit_byte(0xff).unwrap();

        let events = bus.events();
        let data = events
            .iter()
            .filter(|e| matches!(e, Event::High(Line::Din) | Event::Low(Line::Din)))
            .count();
        let rising = events.iter().filter(|e| **e == Event::High(Line::Clk)).count();
        let falling = events.iter().filter(|e| **e == Event::Low(Line::Clk)).count();
        assert_eq!((data, rising, falling), (8, 8, 8));
    }

    #[test]
    fn constructor_parks_clock_low() {
        let bus = Bus::new();
        let _spi = BitBangSpi::new(bus.pin(Line::Clk), bus.pin(Line::Din)).unwrap();
        assert_eq!(bus.events(), [Event::Low(Line::Clk)]);
    }

    #[test]
    fn delayed_variant_holds_each_clock_edge() {
        let bus = Bus::new();
        let mut spi =
            BitBangSpi::new_with_delay(bus.pin(Line::Clk), bus.pin(Line::Din), bus.delay())
                .unwrap();
        bus.clear();

        spi.transmit_byte(0x00).unwrap();

        let holds = bus
            .events()
            .iter()
            .filter(|e| **e == Event::DelayUs(1))
            .count();
        assert_eq!(holds, 16);
    }

    #[test]
    fn spi_write_sends_words_in_order() {
        let bus = Bus::new();
        let mut spi = transmitter(&bus);

        spi.write(&[0x21, 0xa1, 0x0c]).unwrap();

        // command-select never moves, so the decoder reports commands
        assert_eq!(
            bus.frames(),
            [Frame::Command(0x21), Frame::Command(0xa1), Frame::Command(0x0c)]
        );
    }
}
