//! 3-wire transfer layers: bits, bytes, and chip-enable framed register commands
//!
//! The DS1302 latches input on the rising clock edge and shifts output out on the falling edge;
//! both directions are least significant bit first. Every register access is its own complete
//! transaction:
//!
//! ```text
//! CE   ___/‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾\____
//! CLK  _________/‾\_/‾\_  ..  _/‾\___/‾\_/‾\_  ..  _/‾\___________
//! DAT  ========[ R/W A0 .. A5 1 ][ D0  D1  ..  D7 ]==============
//! ```

use embedded_hal::{delay::DelayNs, digital::PinState};

use crate::{
    bus::{Direction, Gpio},
    error::{ConfigError, Error, Mismatch, Result},
    field::READ_BIT,
};

/// Chip-enable to first clock edge
const CE_SETUP_US: u32 = 5;
/// Data setup before a rising edge, and the gaps around a read
const SETUP_US: u32 = 1;
/// Clock high time while writing
const HOLD_US: u32 = 2;

const MIN_PIN: u8 = 2;
const MAX_PIN: u8 = 27;

/// GPIO numbers of the three bus lines
///
/// Validated once on construction; never changes afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pins {
    clk: u8,
    dat: u8,
    ce: u8,
}

impl Pins {
    /// Validate a pin assignment
    ///
    /// # Errors
    /// Returns [`ConfigError::Pin`] for the first pin outside `[2, 27]`
    pub const fn new(clk: u8, dat: u8, ce: u8) -> core::result::Result<Self, ConfigError> {
        let pins = [clk, dat, ce];
        let mut i = 0;
        while i < pins.len() {
            if pins[i] < MIN_PIN || pins[i] > MAX_PIN {
                return Err(ConfigError::Pin(pins[i]));
            }
            i += 1;
        }

        Ok(Self { clk, dat, ce })
    }

    /// Clock line
    #[must_use]
    pub const fn clk(self) -> u8 {
        self.clk
    }

    /// Bidirectional data line
    #[must_use]
    pub const fn dat(self) -> u8 {
        self.dat
    }

    /// Chip-enable line
    #[must_use]
    pub const fn ce(self) -> u8 {
        self.ce
    }
}

impl Default for Pins {
    /// Clock on GPIO 2, data on GPIO 3, chip-enable on GPIO 4
    fn default() -> Self {
        Self {
            clk: 2,
            dat: 3,
            ce: 4,
        }
    }
}

/// What [`Wire::write_and_check`] does when the read-back differs from what was written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VerifyPolicy {
    /// Log a warning and carry on as if the write succeeded
    #[default]
    Warn,

    /// Fail with [`Error::Mismatch`]
    Strict,
}

/// Bit-banged 3-wire bus; owns the GPIO layer and the delay provider
#[must_use]
pub struct Wire<G, D> {
    pins: Pins,
    gpio: G,
    delay: D,
}

impl<G, D> Wire<G, D>
where
    G: Gpio,
    D: DelayNs,
{
    /// Wrap the GPIO layer without touching the bus; see [`Wire::setup`]
    pub const fn new(gpio: G, delay: D, pins: Pins) -> Self {
        Self { pins, gpio, delay }
    }

    /// Initialize the GPIO layer, make all three lines outputs and end any half-finished transfer
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails
    pub fn setup(&mut self) -> Result<(), G::Error> {
        self.gpio.init().map_err(Error::Bus)?;

        for pin in [self.pins.clk, self.pins.dat, self.pins.ce] {
            self.direction(pin, Direction::Output)?;
        }

        self.stop_transfer()
    }

    /// Pin assignment in use
    #[must_use]
    pub const fn pins(&self) -> Pins {
        self.pins
    }

    /// Give back the GPIO layer and delay provider
    #[must_use]
    pub fn release(self) -> (G, D) {
        (self.gpio, self.delay)
    }

    fn drive(&mut self, pin: u8, level: PinState) -> Result<(), G::Error> {
        self.gpio.write_level(pin, level).map_err(Error::Bus)
    }

    fn direction(&mut self, pin: u8, direction: Direction) -> Result<(), G::Error> {
        self.gpio.set_direction(pin, direction).map_err(Error::Bus)
    }

    fn start_transfer(&mut self) -> Result<(), G::Error> {
        self.drive(self.pins.ce, PinState::High)?;
        self.delay.delay_us(CE_SETUP_US);
        Ok(())
    }

    /// Every line is driven low even if an earlier one fails; the first error wins
    fn stop_transfer(&mut self) -> Result<(), G::Error> {
        let clk = self.drive(self.pins.clk, PinState::Low);
        let ce = self.drive(self.pins.ce, PinState::Low);
        let dat = self.drive(self.pins.dat, PinState::Low);
        clk.and(ce).and(dat)
    }

    /// Run `body` between chip-enable high and low; the transfer is stopped whatever `body` returns
    fn transaction<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, G::Error>,
    ) -> Result<T, G::Error> {
        let result = self.start_transfer().and_then(|()| body(self));
        let stopped = self.stop_transfer();

        let value = result?;
        stopped?;
        Ok(value)
    }

    fn start_read(&mut self) -> Result<(), G::Error> {
        self.direction(self.pins.dat, Direction::Input)?;
        self.delay.delay_us(SETUP_US);
        Ok(())
    }

    fn start_write(&mut self) -> Result<(), G::Error> {
        self.direction(self.pins.dat, Direction::Output)
    }

    /// Clock one bit out to the chip; expects the clock low and leaves it low
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails
    pub fn write_bit(&mut self, bit: bool) -> Result<(), G::Error> {
        self.drive(self.pins.dat, PinState::from(bit))?;
        self.delay.delay_us(SETUP_US);
        self.drive(self.pins.clk, PinState::High)?;
        self.delay.delay_us(HOLD_US);
        self.drive(self.pins.dat, PinState::Low)?;
        self.delay.delay_us(SETUP_US);
        self.drive(self.pins.clk, PinState::Low)
    }

    /// Sample one bit from the chip, then clock the next one out; expects the clock low and leaves
    /// it low
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails
    pub fn read_bit(&mut self) -> Result<bool, G::Error> {
        let bit = self.gpio.read_level(self.pins.dat).map_err(Error::Bus)? == PinState::High;
        self.delay.delay_us(SETUP_US);
        self.drive(self.pins.clk, PinState::High)?;
        self.delay.delay_us(SETUP_US);
        self.drive(self.pins.clk, PinState::Low)?;
        self.delay.delay_us(SETUP_US);
        Ok(bit)
    }

    /// Send a byte, least significant bit first
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails
    pub fn write_byte(&mut self, byte: u8) -> Result<(), G::Error> {
        for i in 0..8 {
            self.write_bit((byte >> i) & 1 == 1)?;
        }
        Ok(())
    }

    /// Receive a byte, least significant bit first
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails
    pub fn read_byte(&mut self) -> Result<u8, G::Error> {
        let mut byte = 0;
        for i in 0..8 {
            byte |= u8::from(self.read_bit()?) << i;
        }
        Ok(byte)
    }

    /// Read one register in a complete transaction; bit 0 of `command` is forced to read
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails
    pub fn read_command(&mut self, command: u8) -> Result<u8, G::Error> {
        let value = self.transaction(|wire| {
            wire.start_write()?;
            wire.write_byte(command | READ_BIT)?;
            wire.start_read()?;
            wire.read_byte()
        })?;

        log::trace!("read {:#04x} -> {:#04x}", command | READ_BIT, value);
        Ok(value)
    }

    /// Write one register in a complete transaction; bit 0 of `command` is forced to write
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails
    pub fn write_command(&mut self, command: u8, value: u8) -> Result<u8, G::Error> {
        self.transaction(|wire| {
            wire.start_write()?;
            wire.write_byte(command & !READ_BIT)?;
            wire.write_byte(value)
        })?;

        log::trace!("write {:#04x} <- {:#04x}", command & !READ_BIT, value);
        Ok(value)
    }

    /// Write a register and read it straight back
    ///
    /// Returns `value` whether or not the read-back agreed, unless `policy` is
    /// [`VerifyPolicy::Strict`]. Nothing is ever retried.
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails, or on a mismatch under [`VerifyPolicy::Strict`]
    pub fn write_and_check(
        &mut self,
        command: u8,
        value: u8,
        policy: VerifyPolicy,
    ) -> Result<u8, G::Error> {
        self.write_command(command, value)?;
        let actual = self.read_command(command | READ_BIT)?;

        if actual != value {
            log::warn!("values don't match: {:#04x} != {:#04x}", value, actual);

            if policy == VerifyPolicy::Strict {
                return Err(Mismatch {
                    address: command & !READ_BIT,
                    expected: value,
                    actual,
                }
                .into());
            }
        }

        Ok(value)
    }
}
