//! DS1302 register accessors and the date transaction

use embedded_hal::delay::DelayNs;

use crate::{
    bcd,
    bus::Gpio,
    datetime::DateTime,
    error::Result,
    field::{
        Field, CLOCK_HALT_BIT, HOUR_12_BIT, HOUR_PM_BIT, READ_BIT, WRITE_PROTECT,
        WRITE_PROTECT_BIT,
    },
    wire::{Pins, VerifyPolicy, Wire},
};

/// ds1302 real-time clock; interfaced via a bit-banged 3-wire bus
///
/// Nothing is cached: every getter reads the chip, every setter writes and reads back. Taking
/// `&mut self` everywhere keeps each transaction exclusive; share the driver between threads only
/// behind a lock.
#[must_use]
pub struct Ds1302<G, D> {
    wire: Wire<G, D>,
    policy: VerifyPolicy,
}

// Specialized methods
impl<G, D> Ds1302<G, D>
where
    G: Gpio,
    D: DelayNs,
{
    /// Connect to the ds1302 by taking ownership of the GPIO layer
    ///
    /// Initializes the GPIO layer and idles the bus, aborting any transfer left half-finished.
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails
    pub fn new(gpio: G, delay: D, pins: Pins) -> Result<Self, G::Error> {
        let mut wire = Wire::new(gpio, delay, pins);
        wire.setup()?;

        Ok(Self {
            wire,
            policy: VerifyPolicy::default(),
        })
    }

    /// Validate raw GPIO numbers, then connect as [`Ds1302::new`] does
    ///
    /// # Errors
    /// Returns a configuration error if any pin is outside `[2, 27]`, or an error if the GPIO layer
    /// fails
    pub fn setup(gpio: G, delay: D, clk: u8, dat: u8, ce: u8) -> Result<Self, G::Error> {
        Self::new(gpio, delay, Pins::new(clk, dat, ce)?)
    }

    /// Choose how read-back mismatches are handled; [`VerifyPolicy::Warn`] unless set
    pub fn with_policy(mut self, policy: VerifyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current read-back mismatch handling
    #[must_use]
    pub const fn policy(&self) -> VerifyPolicy {
        self.policy
    }

    /// Pin assignment in use
    #[must_use]
    pub const fn pins(&self) -> Pins {
        self.wire.pins()
    }

    /// Disconnect to release the GPIO layer and delay provider
    #[must_use]
    pub fn release(self) -> (G, D) {
        self.wire.release()
    }

    /// Raw access to one register, for anything the typed accessors do not cover
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails
    pub fn read_register(&mut self, command: u8) -> Result<u8, G::Error> {
        self.wire.read_command(command)
    }

    /// Write a raw register byte and read it back under the configured policy
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails, or on a strict read-back mismatch
    pub fn write_register(&mut self, command: u8, value: u8) -> Result<u8, G::Error> {
        self.wire.write_and_check(command, value, self.policy)
    }
}

// Time getters
impl<G, D> Ds1302<G, D>
where
    G: Gpio,
    D: DelayNs,
{
    /// Get any field as a range-checked decimal
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails or the chip reports a value outside the field's
    /// domain
    pub fn read_field(&mut self, field: Field) -> Result<u8, G::Error> {
        let reg = field.register();
        let raw = self.wire.read_command(reg.read_address())?;
        let value = bcd::decode(reg.width, raw)?;
        Ok(bcd::check_range(reg.min, reg.max, value)?)
    }

    /// Get seconds
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails or the value is out of range
    pub fn read_seconds(&mut self) -> Result<u8, G::Error> {
        self.read_field(Field::Seconds)
    }

    /// Get minutes
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails or the value is out of range
    pub fn read_minutes(&mut self) -> Result<u8, G::Error> {
        self.read_field(Field::Minutes)
    }

    /// Get hours
    ///
    /// Only meaningful in 24-hour mode; see [`Ds1302::read_24h_mode`]
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails or the value is out of range
    pub fn read_hours(&mut self) -> Result<u8, G::Error> {
        self.read_field(Field::Hours)
    }

    /// Get day of the month
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails or the value is out of range
    pub fn read_mday(&mut self) -> Result<u8, G::Error> {
        self.read_field(Field::MDay)
    }

    /// Get month
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails or the value is out of range
    pub fn read_month(&mut self) -> Result<u8, G::Error> {
        self.read_field(Field::Month)
    }

    /// Get day of the week
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails or the value is out of range
    pub fn read_weekday(&mut self) -> Result<u8, G::Error> {
        self.read_field(Field::Weekday)
    }

    /// Get two-digit year
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails or the value is out of range
    pub fn read_year(&mut self) -> Result<u8, G::Error> {
        self.read_field(Field::Year)
    }

    /// Get year, month, day, hours, minutes and seconds, read in that order
    ///
    /// Fields are separate transactions, so a rollover between reads is not detected
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails or any value is out of range
    pub fn read_datetime(&mut self) -> Result<DateTime, G::Error> {
        Ok(DateTime {
            year: self.read_year()?,
            month: self.read_month()?,
            day: self.read_mday()?,
            hours: self.read_hours()?,
            minutes: self.read_minutes()?,
            seconds: self.read_seconds()?,
        })
    }

    /// Whether the oscillator is halted
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails
    pub fn read_clock_halt(&mut self) -> Result<bool, G::Error> {
        let seconds = self.wire.read_command(Field::Seconds.register().read_address())?;
        Ok(seconds & CLOCK_HALT_BIT != 0)
    }

    /// Whether hours are kept in 24-hour format
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails
    pub fn read_24h_mode(&mut self) -> Result<bool, G::Error> {
        let hours = self.wire.read_command(Field::Hours.register().read_address())?;
        Ok(hours & HOUR_12_BIT == 0)
    }

    /// Raw PM flag of the hours register
    ///
    /// In 24-hour mode this bit is the high bit of the tens digit instead.
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails
    pub fn read_pm(&mut self) -> Result<bool, G::Error> {
        let hours = self.wire.read_command(Field::Hours.register().read_address())?;
        Ok(hours & HOUR_PM_BIT != 0)
    }

    /// Whether register writes are currently refused
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails
    pub fn read_write_protect(&mut self) -> Result<bool, G::Error> {
        let wp = self.wire.read_command(WRITE_PROTECT | READ_BIT)?;
        Ok(wp & WRITE_PROTECT_BIT != 0)
    }
}

// Time setters
impl<G, D> Ds1302<G, D>
where
    G: Gpio,
    D: DelayNs,
{
    /// Set any field from a decimal value; returns `value`
    ///
    /// Seconds keep the current clock halt flag. Hours are always written in 24-hour format, which
    /// switches a chip in 12-hour mode over.
    ///
    /// # Errors
    /// Returns an error if `value` is outside the field's domain (nothing is written then), if the
    /// GPIO layer fails, or on a strict read-back mismatch
    pub fn write_field(&mut self, field: Field, value: u8) -> Result<u8, G::Error> {
        let reg = field.register();
        let mut byte = bcd::encode(bcd::check_range(reg.min, reg.max, value)?);

        match field {
            Field::Seconds => {
                byte |= self.wire.read_command(reg.read_address())? & CLOCK_HALT_BIT;
            }
            Field::Hours => byte &= !HOUR_12_BIT,
            _ => {}
        }

        self.wire.write_and_check(reg.address, byte, self.policy)?;
        Ok(value)
    }

    /// Set seconds without starting or stopping the clock
    ///
    /// # Errors
    /// Returns an error if the value is out of range, the GPIO layer fails, or on a strict
    /// read-back mismatch
    pub fn write_seconds(&mut self, seconds: u8) -> Result<u8, G::Error> {
        self.write_field(Field::Seconds, seconds)
    }

    /// Set minutes
    ///
    /// # Errors
    /// Returns an error if the value is out of range, the GPIO layer fails, or on a strict
    /// read-back mismatch
    pub fn write_minutes(&mut self, minutes: u8) -> Result<u8, G::Error> {
        self.write_field(Field::Minutes, minutes)
    }

    /// Set hours, switching the chip to 24-hour mode
    ///
    /// # Errors
    /// Returns an error if the value is out of range, the GPIO layer fails, or on a strict
    /// read-back mismatch
    pub fn write_hours(&mut self, hours: u8) -> Result<u8, G::Error> {
        self.write_field(Field::Hours, hours)
    }

    /// Set day of the month
    ///
    /// # Errors
    /// Returns an error if the value is out of range, the GPIO layer fails, or on a strict
    /// read-back mismatch
    pub fn write_mday(&mut self, mday: u8) -> Result<u8, G::Error> {
        self.write_field(Field::MDay, mday)
    }

    /// Set month
    ///
    /// # Errors
    /// Returns an error if the value is out of range, the GPIO layer fails, or on a strict
    /// read-back mismatch
    pub fn write_month(&mut self, month: u8) -> Result<u8, G::Error> {
        self.write_field(Field::Month, month)
    }

    /// Set day of the week
    ///
    /// # Errors
    /// Returns an error if the value is out of range, the GPIO layer fails, or on a strict
    /// read-back mismatch
    pub fn write_weekday(&mut self, weekday: u8) -> Result<u8, G::Error> {
        self.write_field(Field::Weekday, weekday)
    }

    /// Set two-digit year
    ///
    /// # Errors
    /// Returns an error if the value is out of range, the GPIO layer fails, or on a strict
    /// read-back mismatch
    pub fn write_year(&mut self, year: u8) -> Result<u8, G::Error> {
        self.write_field(Field::Year, year)
    }

    /// Set or clear the clock halt bit, leaving the seconds untouched
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails, or on a strict read-back mismatch
    pub fn write_clock_halt(&mut self, halt: bool) -> Result<(), G::Error> {
        let reg = Field::Seconds.register();
        let seconds = self.wire.read_command(reg.read_address())? & !CLOCK_HALT_BIT;
        let halt = if halt { CLOCK_HALT_BIT } else { 0 };

        self.wire
            .write_and_check(reg.address, seconds | halt, self.policy)
            .map(|_| ())
    }

    /// Clear the clock halt bit to enable timekeeping
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails, or on a strict read-back mismatch
    pub fn start_clock(&mut self) -> Result<(), G::Error> {
        self.write_clock_halt(false)
    }

    /// Set the clock halt bit to disable timekeeping
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails, or on a strict read-back mismatch
    pub fn halt_clock(&mut self) -> Result<(), G::Error> {
        self.write_clock_halt(true)
    }

    /// Allow or refuse further register writes
    ///
    /// # Errors
    /// Returns an error if the GPIO layer fails, or on a strict read-back mismatch
    pub fn write_write_protect(&mut self, protect: bool) -> Result<(), G::Error> {
        let wp = if protect { WRITE_PROTECT_BIT } else { 0 };

        self.wire
            .write_and_check(WRITE_PROTECT, wp, self.policy)
            .map(|_| ())
    }

    /// Set the complete date and time
    ///
    /// Clears write protection, writes year, month, day, hours, minutes and seconds in that order,
    /// then reads all six back. Returns the sum of `written - read` over the six fields: zero when
    /// everything stuck. Write protection is left cleared.
    ///
    /// # Errors
    /// Stops at the first value out of range, GPIO failure, or strict read-back mismatch; fields
    /// before it have already been written
    pub fn write_date(
        &mut self,
        year: u8,
        month: u8,
        mday: u8,
        hours: u8,
        minutes: u8,
        seconds: u8,
    ) -> Result<i16, G::Error> {
        let fields = [
            (Field::Year, year),
            (Field::Month, month),
            (Field::MDay, mday),
            (Field::Hours, hours),
            (Field::Minutes, minutes),
            (Field::Seconds, seconds),
        ];

        self.write_write_protect(false)?;
        for (field, value) in fields {
            self.write_field(field, value)?;
        }

        let mut diff = 0;
        for (field, value) in fields {
            diff += i16::from(value) - i16::from(self.read_field(field)?);
        }

        if diff != 0 {
            log::warn!("date read back differs from what was written (sum of differences {})", diff);
        }
        Ok(diff)
    }

    /// Set the complete date and time from a [`DateTime`]; see [`Ds1302::write_date`]
    ///
    /// # Errors
    /// As [`Ds1302::write_date`]
    pub fn write_datetime(&mut self, datetime: &DateTime) -> Result<i16, G::Error> {
        self.write_date(
            datetime.year,
            datetime.month,
            datetime.day,
            datetime.hours,
            datetime.minutes,
            datetime.seconds,
        )
    }
}
