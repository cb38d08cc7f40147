//! Errors of the display driver.
//!
//! The driver talks to two independent resources, the command/data channel and the
//! reset pin, which may come from different HALs with different error types.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError<BusErr, PinErr> {
    /// The command/data channel failed to put a byte on the wire
    Bus(BusErr),
    /// The reset pin could not be driven
    Reset(PinErr),
}
