//! Driver for the DS1302 trickle-charge real-time clock over its 3-wire serial bus
//!
//! The chip is bit-banged through three GPIO lines addressed by number (see [`bus::Gpio`]); any
//! `embedded-hal` delay provides the microsecond waits the bus timing needs.
//!
//! Every time field is read and written as a plain decimal. Values are range-checked on the way in
//! and on the way out, so a chip returning garbage is reported the same way as a bad argument.
//! Writes are read back; a disagreement is only logged unless [`VerifyPolicy::Strict`] is chosen.
//!
//! RAM registers and burst transfers are not supported.
#![cfg_attr(not(test), no_std)]

pub mod bcd;
pub mod bus;
pub mod datetime;
pub mod error;
pub mod field;
pub mod rtc;
pub mod wire;

#[cfg(test)]
mod testing;

pub use crate::{
    bus::{BusError, Direction, Gpio, PinBus},
    datetime::{DateTime, ParseError},
    error::{ConfigError, Error, Mismatch, RangeError, Result},
    field::Field,
    rtc::Ds1302,
    wire::{Pins, VerifyPolicy, Wire},
};
