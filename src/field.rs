//! Register map and per-field descriptors

/// Write address of the write-protect register; the read address is one higher
pub const WRITE_PROTECT: u8 = 0x8e;

/// Set on a command byte to read instead of write
pub const READ_BIT: u8 = 0x01;

/// Clock halt flag in the seconds register
pub const CLOCK_HALT_BIT: u8 = 0x80;

/// 12-hour mode flag in the hours register
pub const HOUR_12_BIT: u8 = 0x80;

/// PM flag in the hours register; only meaningful in 12-hour mode
pub const HOUR_PM_BIT: u8 = 0x20;

/// Write-protect flag in its own register
pub const WRITE_PROTECT_BIT: u8 = 0x80;

/// Everything needed to read or write one field generically
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Register {
    /// Write command; `address | READ_BIT` reads
    pub address: u8,
    /// Smallest legal decimal value
    pub min: u8,
    /// Largest legal decimal value
    pub max: u8,
    /// Significant bits of the packed byte; see [`crate::bcd::decode`]
    pub width: u8,
}

impl Register {
    /// Command byte that reads this register
    #[must_use]
    pub const fn read_address(self) -> u8 {
        self.address | READ_BIT
    }
}

/// Timekeeping field of the DS1302
#[expect(missing_docs, reason = "self-explanatory variants")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    Seconds,
    Minutes,
    Hours,
    MDay,
    Month,
    Weekday,
    Year,
}

impl Field {
    /// All fields in register order
    pub const ALL: [Self; 7] = [
        Self::Seconds,
        Self::Minutes,
        Self::Hours,
        Self::MDay,
        Self::Month,
        Self::Weekday,
        Self::Year,
    ];

    /// Descriptor of the register holding this field
    #[must_use]
    pub const fn register(self) -> Register {
        match self {
            Self::Seconds => Register {
                address: 0x80,
                min: 0,
                max: 59,
                width: 7,
            },
            Self::Minutes => Register {
                address: 0x82,
                min: 0,
                max: 59,
                width: 7,
            },
            // 24 is accepted; the chip itself rolls over at 23
            Self::Hours => Register {
                address: 0x84,
                min: 0,
                max: 24,
                width: 6,
            },
            Self::MDay => Register {
                address: 0x86,
                min: 1,
                max: 31,
                width: 6,
            },
            Self::Month => Register {
                address: 0x88,
                min: 1,
                max: 12,
                width: 5,
            },
            Self::Weekday => Register {
                address: 0x8a,
                min: 1,
                max: 7,
                width: 3,
            },
            Self::Year => Register {
                address: 0x8c,
                min: 0,
                max: 99,
                width: 8,
            },
        }
    }

    /// Look up a field by the name used on the command line
    ///
    /// Both `hour` and `hours` select [`Field::Hours`]; `day` is the day of the month
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "year" => Some(Self::Year),
            "month" => Some(Self::Month),
            "day" => Some(Self::MDay),
            "weekday" => Some(Self::Weekday),
            "hour" | "hours" => Some(Self::Hours),
            "minutes" => Some(Self::Minutes),
            "seconds" => Some(Self::Seconds),
            _ => None,
        }
    }

    /// Name of [Field] as text
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::MDay => "day",
            Self::Month => "month",
            Self::Weekday => "weekday",
            Self::Year => "year",
        }
    }

    /// Parse a user-supplied value for this field
    ///
    /// Years are written in full as `20YY` and yield `YY`; everything else is one or two decimal
    /// digits. No range check happens here.
    #[must_use]
    pub fn parse_value(self, text: &str) -> Option<u8> {
        match self {
            Self::Year => text.strip_prefix("20").filter(|yy| yy.len() == 2).and_then(digits),
            _ => digits(text),
        }
    }
}

/// Decimal value of an all-digit string short enough to fit a `u8`
pub(crate) fn digits(text: &str) -> Option<u8> {
    if text.is_empty() || text.len() > 2 {
        return None;
    }

    text.bytes().try_fold(0u8, |acc, byte| {
        byte.is_ascii_digit().then(|| acc * 10 + (byte - b'0'))
    })
}
