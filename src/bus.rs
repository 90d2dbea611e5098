//! GPIO access consumed by the 3-wire protocol engine
//!
//! The driver never touches hardware directly; it addresses its three lines by GPIO number through
//! [Gpio]. Boards with a pin-number based GPIO layer implement [Gpio] themselves, anything built on
//! `embedded-hal` pins can use [`PinBus`].

use embedded_hal::digital::{InputPin, OutputPin, PinState};

/// Data line direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Host samples the line
    Input,

    /// Host drives the line
    Output,
}

/// Pin-number addressed GPIO primitives
///
/// Every call must take effect before it returns; the protocol timing relies on it.
pub trait Gpio {
    /// Error raised by the underlying GPIO layer
    type Error;

    /// One-time bus initialization, called before any other method
    ///
    /// # Errors
    /// Returns an error if the GPIO layer cannot be brought up
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Switch `pin` between input and output
    ///
    /// # Errors
    /// Returns an error if the pin cannot be reconfigured
    fn set_direction(&mut self, pin: u8, direction: Direction) -> Result<(), Self::Error>;

    /// Drive `pin` to `level`
    ///
    /// # Errors
    /// Returns an error if the pin cannot be driven
    fn write_level(&mut self, pin: u8, level: PinState) -> Result<(), Self::Error>;

    /// Sample the level on `pin`
    ///
    /// # Errors
    /// Returns an error if the pin cannot be read
    fn read_level(&mut self, pin: u8) -> Result<PinState, Self::Error>;
}

/// Errors raised by [`PinBus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// A pin reported an error
    Pin,

    /// The requested GPIO number is not one of the three owned pins
    UnknownPin(u8),
}

/// [Gpio] over three `embedded-hal` pins
///
/// The data pin has to be configured open-drain with a pull-up: switching it to
/// [`Direction::Input`] releases the line by driving it high so the DS1302 can pull it down.
#[must_use]
pub struct PinBus<CLK, DAT, CE> {
    clk_pin: u8,
    dat_pin: u8,
    ce_pin: u8,

    clk: CLK,
    dat: DAT,
    ce: CE,
}

impl<CLK, DAT, CE> PinBus<CLK, DAT, CE>
where
    CLK: OutputPin,
    DAT: OutputPin + InputPin,
    CE: OutputPin,
{
    /// Bind three pins to the GPIO numbers in `pins`
    pub const fn new(pins: crate::Pins, clk: CLK, dat: DAT, ce: CE) -> Self {
        Self {
            clk_pin: pins.clk(),
            dat_pin: pins.dat(),
            ce_pin: pins.ce(),
            clk,
            dat,
            ce,
        }
    }

    /// Give the pins back
    #[must_use]
    pub fn release(self) -> (CLK, DAT, CE) {
        (self.clk, self.dat, self.ce)
    }
}

impl<CLK, DAT, CE> Gpio for PinBus<CLK, DAT, CE>
where
    CLK: OutputPin,
    DAT: OutputPin + InputPin,
    CE: OutputPin,
{
    type Error = BusError;

    fn init(&mut self) -> Result<(), BusError> {
        Ok(())
    }

    fn set_direction(&mut self, pin: u8, direction: Direction) -> Result<(), BusError> {
        if pin == self.dat_pin {
            if direction == Direction::Input {
                self.dat.set_high().map_err(|_| BusError::Pin)?;
            }
            Ok(())
        } else if pin == self.clk_pin || pin == self.ce_pin {
            // push-pull outputs only
            Ok(())
        } else {
            Err(BusError::UnknownPin(pin))
        }
    }

    fn write_level(&mut self, pin: u8, level: PinState) -> Result<(), BusError> {
        if pin == self.clk_pin {
            self.clk.set_state(level).map_err(|_| BusError::Pin)
        } else if pin == self.dat_pin {
            self.dat.set_state(level).map_err(|_| BusError::Pin)
        } else if pin == self.ce_pin {
            self.ce.set_state(level).map_err(|_| BusError::Pin)
        } else {
            Err(BusError::UnknownPin(pin))
        }
    }

    fn read_level(&mut self, pin: u8) -> Result<PinState, BusError> {
        if pin != self.dat_pin {
            return Err(BusError::UnknownPin(pin));
        }

        self.dat
            .is_high()
            .map(PinState::from)
            .map_err(|_| BusError::Pin)
    }
}
