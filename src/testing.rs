//! Bit-level DS1302 model and helpers for unit tests

use core::cell::RefCell;
use core::convert::Infallible;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use embedded_hal::{delay::DelayNs, digital::PinState};

use crate::{
    bus::{Direction, Gpio},
    Pins,
};

/// Something the driver did to the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Dir(u8, Direction),
    Write(u8, PinState),
    Read(u8),
    DelayUs(u32),
}

/// Event log shared between [`SimChip`] and [`SimDelay`]
pub type Trace = Rc<RefCell<Vec<Event>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Command,
    Write { register: usize },
    Read { value: u8, bit: u8, skip_fall: bool },
    Done,
}

/// Simulated DS1302 answering on the default [`Pins`]
pub struct SimChip {
    pins: Pins,
    trace: Trace,

    /// Register file indexed by `(command >> 1) & 0x1f`
    regs: [u8; 32],
    stuck: Option<usize>,
    initialized: bool,

    ce: bool,
    clk: bool,
    dat_dir: Direction,
    dat_out: bool,

    phase: Phase,
    shift: u8,
    count: u8,

    /// Host data level at every rising clock edge the host drove
    pub sampled: Vec<bool>,
}

impl SimChip {
    pub fn new(trace: Trace) -> Self {
        Self {
            pins: Pins::default(),
            trace,
            regs: [0; 32],
            stuck: None,
            initialized: false,
            ce: false,
            clk: false,
            dat_dir: Direction::Input,
            dat_out: false,
            phase: Phase::Idle,
            shift: 0,
            count: 0,
            sampled: Vec::new(),
        }
    }

    /// Preload the register behind write command `address`
    pub fn with_register(mut self, address: u8, value: u8) -> Self {
        self.regs[index(address)] = value;
        self
    }

    /// Make the register behind `address` ignore every write
    pub fn with_stuck(mut self, address: u8) -> Self {
        self.stuck = Some(index(address));
        self
    }

    /// Current contents of the register behind `address`
    pub fn register(&self, address: u8) -> u8 {
        self.regs[index(address)]
    }

    pub const fn initialized(&self) -> bool {
        self.initialized
    }

    pub const fn idle(&self) -> bool {
        !self.ce && !self.clk && !self.dat_out
    }

    fn rising_edge(&mut self) {
        if self.dat_dir == Direction::Output {
            self.sampled.push(self.dat_out);
        }
        if !self.ce {
            return;
        }

        match self.phase {
            Phase::Command | Phase::Write { .. } => {
                self.shift |= u8::from(self.dat_out) << self.count;
                self.count += 1;
            }
            _ => return,
        }
        if self.count < 8 {
            return;
        }

        let byte = self.shift;
        self.shift = 0;
        self.count = 0;

        self.phase = match self.phase {
            // bit 7 must be set for the chip to respond at all
            Phase::Command if byte & 0x80 == 0 => Phase::Done,
            Phase::Command if byte & 0x01 == 1 => Phase::Read {
                value: self.regs[index(byte)],
                bit: 0,
                skip_fall: true,
            },
            Phase::Command => Phase::Write {
                register: index(byte),
            },
            Phase::Write { register } => {
                let protected = self.regs[index(0x8e)] & 0x80 != 0;
                if (!protected || register == index(0x8e)) && self.stuck != Some(register) {
                    self.regs[register] = byte;
                }
                Phase::Done
            }
            other => other,
        };
    }

    fn falling_edge(&mut self) {
        if let Phase::Read {
            value,
            bit,
            skip_fall,
        } = self.phase
        {
            self.phase = if skip_fall {
                Phase::Read {
                    value,
                    bit,
                    skip_fall: false,
                }
            } else {
                Phase::Read {
                    value,
                    bit: bit + 1,
                    skip_fall,
                }
            };
        }
    }
}

const fn index(address: u8) -> usize {
    ((address >> 1) & 0x1f) as usize
}

impl Gpio for SimChip {
    type Error = Infallible;

    fn init(&mut self) -> Result<(), Infallible> {
        self.initialized = true;
        Ok(())
    }

    fn set_direction(&mut self, pin: u8, direction: Direction) -> Result<(), Infallible> {
        self.trace.borrow_mut().push(Event::Dir(pin, direction));
        if pin == self.pins.dat() {
            self.dat_dir = direction;
        }
        Ok(())
    }

    fn write_level(&mut self, pin: u8, level: PinState) -> Result<(), Infallible> {
        self.trace.borrow_mut().push(Event::Write(pin, level));
        let high = level == PinState::High;

        if pin == self.pins.ce() {
            if high && !self.ce {
                self.phase = Phase::Command;
                self.shift = 0;
                self.count = 0;
            } else if !high {
                self.phase = Phase::Idle;
            }
            self.ce = high;
        } else if pin == self.pins.clk() {
            let was_high = self.clk;
            self.clk = high;
            if high && !was_high {
                self.rising_edge();
            } else if !high && was_high {
                self.falling_edge();
            }
        } else if pin == self.pins.dat() {
            self.dat_out = high;
        }
        Ok(())
    }

    fn read_level(&mut self, pin: u8) -> Result<PinState, Infallible> {
        self.trace.borrow_mut().push(Event::Read(pin));

        let level = match self.phase {
            Phase::Read { value, bit, .. } if self.ce && self.dat_dir == Direction::Input && bit < 8 => {
                (value >> bit) & 1 == 1
            }
            _ if self.dat_dir == Direction::Output => self.dat_out,
            _ => false,
        };
        Ok(PinState::from(level))
    }
}

/// Error raised by [`Flaky`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glitch;

/// [`SimChip`] behind a GPIO layer that fails one chosen line read or write
///
/// The failing call never reaches the chip; every call after it goes through again.
pub struct Flaky {
    pub chip: SimChip,
    reads_left: Option<usize>,
    writes_left: Option<usize>,
}

impl Flaky {
    pub const fn new(chip: SimChip) -> Self {
        Self {
            chip,
            reads_left: None,
            writes_left: None,
        }
    }

    /// Let `count` more line reads through, then fail the next one
    pub fn fail_read_after(&mut self, count: usize) {
        self.reads_left = Some(count);
    }

    /// Let `count` more line writes through, then fail the next one
    pub fn fail_write_after(&mut self, count: usize) {
        self.writes_left = Some(count);
    }
}

fn tick(left: &mut Option<usize>) -> Result<(), Glitch> {
    match left {
        Some(0) => {
            *left = None;
            Err(Glitch)
        }
        Some(n) => {
            *n -= 1;
            Ok(())
        }
        None => Ok(()),
    }
}

impl Gpio for Flaky {
    type Error = Glitch;

    fn init(&mut self) -> Result<(), Glitch> {
        self.chip.init().map_err(|never| match never {})
    }

    fn set_direction(&mut self, pin: u8, direction: Direction) -> Result<(), Glitch> {
        self.chip.set_direction(pin, direction).map_err(|never| match never {})
    }

    fn write_level(&mut self, pin: u8, level: PinState) -> Result<(), Glitch> {
        tick(&mut self.writes_left)?;
        self.chip.write_level(pin, level).map_err(|never| match never {})
    }

    fn read_level(&mut self, pin: u8) -> Result<PinState, Glitch> {
        tick(&mut self.reads_left)?;
        self.chip.read_level(pin).map_err(|never| match never {})
    }
}

/// Records requested delays instead of sleeping
pub struct SimDelay {
    trace: Trace,
}

impl SimDelay {
    pub const fn new(trace: Trace) -> Self {
        Self { trace }
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.trace.borrow_mut().push(Event::DelayUs(ns.div_ceil(1000)));
    }

    fn delay_us(&mut self, us: u32) {
        self.trace.borrow_mut().push(Event::DelayUs(us));
    }
}

/// Fresh chip and delay sharing one trace
pub fn rig() -> (SimChip, SimDelay, Trace) {
    let trace = Trace::default();
    (SimChip::new(trace.clone()), SimDelay::new(trace.clone()), trace)
}

/// [`ufmt::uWrite`] sink backed by a `String`
#[derive(Default)]
pub struct Text(String);

impl Text {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ufmt::uWrite for Text {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        self.0.push_str(s);
        Ok(())
    }
}
