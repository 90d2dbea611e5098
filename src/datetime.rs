//! Date and time as written to or read from the chip in one go

use ufmt::{uDisplay, uWrite, Formatter};

use crate::{bcd, field::digits};

/// The six fields covered by a date write
///
/// Values are plain decimal and unchecked; the driver range-checks them when writing. The year is
/// the two-digit year within the 2000s.
#[expect(missing_docs, reason = "self-explanatory fields")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

/// Text did not have the shape `20YY-MM-DDThh:mm:ss`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParseError;

impl DateTime {
    /// Parse `20YY-MM-DDThh:mm:ss`; a single space may stand in for the `T`
    ///
    /// Every component must be exactly two digits.
    ///
    /// # Errors
    /// Returns [`ParseError`] if `text` does not have that shape
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let bytes = text.as_bytes();
        if bytes.len() != 19 || !text.starts_with("20") {
            return Err(ParseError);
        }

        // position of the byte following each two-digit component
        for (at, sep) in [(4, b'-'), (7, b'-'), (13, b':'), (16, b':')] {
            if bytes[at] != sep {
                return Err(ParseError);
            }
        }
        if bytes[10] != b'T' && bytes[10] != b' ' {
            return Err(ParseError);
        }

        let field = |at: usize| text.get(at..at + 2).and_then(digits).ok_or(ParseError);

        Ok(Self {
            year: field(2)?,
            month: field(5)?,
            day: field(8)?,
            hours: field(11)?,
            minutes: field(14)?,
            seconds: field(17)?,
        })
    }
}

impl uDisplay for DateTime {
    /// `20YY-MM-DD hh:mm:ss`
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str("20")?;
        write_2digit(f, self.year)?;
        f.write_char('-')?;
        write_2digit(f, self.month)?;
        f.write_char('-')?;
        write_2digit(f, self.day)?;
        f.write_char(' ')?;
        write_2digit(f, self.hours)?;
        f.write_char(':')?;
        write_2digit(f, self.minutes)?;
        f.write_char(':')?;
        write_2digit(f, self.seconds)
    }
}

/// Zero-padded; values above 99 wrap like the chip would
fn write_2digit<W>(f: &mut Formatter<'_, W>, value: u8) -> Result<(), W::Error>
where
    W: uWrite + ?Sized,
{
    let packed = bcd::encode(value % 100);
    f.write_char(char::from(b'0' + (packed >> 4)))?;
    f.write_char(char::from(b'0' + (packed & 0xf)))
}
