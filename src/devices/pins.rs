//! Optional auxiliary pins
//!
//! Many Click boards route RST, INT or enable lines to the mikroBUS header,
//! but a board may leave them unconnected. Drivers take those pins as
//! generics; pass `NoPin` when the line is not wired.

use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// Placeholder for an unconnected pin
///
/// Writes are ignored. Reads report high, the idle level of the active-low
/// lines (RST, INT, OE) it usually stands in for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl InputPin for NoPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}
