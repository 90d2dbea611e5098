//! Error types shared by every layer of the driver

use ufmt::{uDisplay, uWrite, uwrite, Formatter};

/// Result of any operation that touches the bus; `E` is the GPIO error type
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Everything that can go wrong while talking to a DS1302
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The GPIO implementation failed
    Bus(E),

    /// Bad pin assignment or decode width
    Config(ConfigError),

    /// A value, either caller-supplied or read back from the chip, is outside its field's domain
    Range(RangeError),

    /// Read-back after a write disagreed; only raised under [`VerifyPolicy::Strict`]
    ///
    /// [`VerifyPolicy::Strict`]: crate::VerifyPolicy::Strict
    Mismatch(Mismatch),
}

impl<E> From<ConfigError> for Error<E> {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl<E> From<RangeError> for Error<E> {
    fn from(err: RangeError) -> Self {
        Self::Range(err)
    }
}

impl<E> From<Mismatch> for Error<E> {
    fn from(err: Mismatch) -> Self {
        Self::Mismatch(err)
    }
}

/// Static misconfiguration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// GPIO number outside `[2, 27]`
    Pin(u8),

    /// BCD decode width tag above 8
    Width(u8),
}

impl uDisplay for ConfigError {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> core::result::Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match *self {
            Self::Pin(pin) => uwrite!(f, "pin {} is not a usable GPIO (should be 2..=27)", pin),
            Self::Width(width) => uwrite!(f, "decode width out of range: {} (should be <= 8)", width),
        }
    }
}

/// A decimal value outside `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RangeError {
    /// Smallest accepted value
    pub min: u8,
    /// Largest accepted value
    pub max: u8,
    /// The offending value
    pub value: u8,
}

impl uDisplay for RangeError {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> core::result::Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        if self.value < self.min {
            uwrite!(f, "value out of range: {} (should be >= {})", self.value, self.min)
        } else {
            uwrite!(f, "value out of range: {} (should be <= {})", self.value, self.max)
        }
    }
}

/// Register contents that did not match what was just written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mismatch {
    /// Write address of the register
    pub address: u8,
    /// Byte that was written
    pub expected: u8,
    /// Byte that was read back
    pub actual: u8,
}

impl uDisplay for Mismatch {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> core::result::Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        uwrite!(
            f,
            "register {}: wrote {} but read back {}",
            self.address,
            self.expected,
            self.actual
        )
    }
}
