// Copyright 2025 The aspeed-sgpio Authors.
// This project is dual-licensed under Apache 2.0 and MIT terms.
// See LICENSE-APACHE and LICENSE-MIT for details.

//! Fake register block and platform for unit tests.

use crate::{
    Error, Resource, SgpioRegisters,
    bank::{BANKS, Register},
    probe::{Clock, Platform, ResetControl},
    registers::REGISTER_COUNT,
};
use safe_mmio::UniqueMmioPointer;
use std::{cell::RefCell, collections::HashMap, rc::Rc, vec::Vec};
use zerocopy::{FromBytes, IntoBytes, transmute_mut};

/// Plain memory standing in for the SGPIO register block.
///
/// Writes are not interpreted: a write to a value register does not update the write latch, and a
/// write of one to a status bit does not clear it. Use [`FakeSgpioRegisters::latch_outputs`] to
/// model the latch.
#[derive(Clone, Debug, Eq, FromBytes, IntoBytes, PartialEq)]
#[repr(transparent)]
pub struct FakeSgpioRegisters {
    regs: [u32; REGISTER_COUNT],
}

impl Default for FakeSgpioRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSgpioRegisters {
    /// Returns a register block with every register zero.
    pub fn new() -> Self {
        Self {
            regs: [0; REGISTER_COUNT],
        }
    }

    /// Sets every register to the given value.
    pub fn fill(&mut self, value: u32) {
        self.regs.fill(value);
    }

    /// Reads the register at the given byte offset.
    pub fn reg_read(&self, offset: usize) -> u32 {
        self.regs[offset / 4]
    }

    /// Writes the register at the given byte offset.
    pub fn reg_write(&mut self, offset: usize, value: u32) {
        self.regs[offset / 4] = value;
    }

    /// Copies each value register to its write latch, as the hardware does on a write.
    pub fn latch_outputs(&mut self) {
        for bank in &BANKS {
            let value = self.reg_read(bank.locate(Register::Value));
            self.reg_write(bank.locate(Register::WriteLatch), value);
        }
    }

    /// Returns the memory viewed as the MMIO register block.
    pub fn as_registers(&mut self) -> &mut SgpioRegisters {
        transmute_mut!(self)
    }
}

/// An action performed on a fake collaborator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Event {
    ClockEnabled,
    ClockDisabled,
    ResetAsserted,
    ResetDeasserted,
    Delay(u32),
}

/// Log of actions shared between a [`FakePlatform`] and the handles it gives out.
pub type EventLog = Rc<RefCell<Vec<Event>>>;

/// Fake clock handle.
#[derive(Debug)]
pub struct FakeClock {
    rate_hz: u64,
    enable: Result<(), Error>,
    events: EventLog,
}

impl Clock for FakeClock {
    fn enable(&mut self) -> Result<(), Error> {
        self.enable?;
        self.events.borrow_mut().push(Event::ClockEnabled);
        Ok(())
    }

    fn disable(&mut self) {
        self.events.borrow_mut().push(Event::ClockDisabled);
    }

    fn rate_hz(&self) -> u64 {
        self.rate_hz
    }
}

/// Fake reset controller handle.
#[derive(Debug)]
pub struct FakeReset {
    events: EventLog,
}

impl ResetControl for FakeReset {
    fn assert(&mut self) {
        self.events.borrow_mut().push(Event::ResetAsserted);
    }

    fn deassert(&mut self) {
        self.events.borrow_mut().push(Event::ResetDeasserted);
    }
}

/// Fake platform, with a configurable outcome for each collaborator.
#[derive(Debug)]
pub struct FakePlatform<'a> {
    /// Register block handed out by [`Platform::registers`], or `None` if mapping fails.
    pub registers: Option<&'a mut FakeSgpioRegisters>,
    /// Device properties.
    pub properties: HashMap<&'static str, u32>,
    /// Rate of the clock, or the error returned when acquiring it.
    pub clock: Result<u64, Error>,
    /// Result of enabling the clock once acquired.
    pub clock_enable: Result<(), Error>,
    /// Error returned when acquiring the reset controller, if any.
    pub reset: Result<(), Error>,
    /// Upstream interrupt number, or the error returned when looking it up.
    pub irq: Result<u32, Error>,
    /// Actions performed on the clock, reset controller and delay.
    pub events: EventLog,
}

impl<'a> FakePlatform<'a> {
    /// Returns a platform on which every collaborator is available, with a 24 MHz clock and no
    /// properties.
    pub fn new(registers: &'a mut FakeSgpioRegisters) -> Self {
        Self {
            registers: Some(registers),
            properties: HashMap::new(),
            clock: Ok(24_000_000),
            clock_enable: Ok(()),
            reset: Ok(()),
            irq: Ok(40),
            events: EventLog::default(),
        }
    }
}

impl<'a> Platform<'a> for FakePlatform<'a> {
    type Clock = FakeClock;
    type Reset = FakeReset;

    fn registers(&mut self) -> Result<UniqueMmioPointer<'a, SgpioRegisters>, Error> {
        let registers = self
            .registers
            .take()
            .ok_or(Error::Unavailable(Resource::Registers))?;
        Ok(UniqueMmioPointer::from(registers.as_registers()))
    }

    fn property_u32(&self, name: &str) -> Option<u32> {
        self.properties.get(name).copied()
    }

    fn clock(&mut self) -> Result<FakeClock, Error> {
        Ok(FakeClock {
            rate_hz: self.clock?,
            enable: self.clock_enable,
            events: self.events.clone(),
        })
    }

    fn reset(&mut self) -> Result<FakeReset, Error> {
        self.reset?;
        Ok(FakeReset {
            events: self.events.clone(),
        })
    }

    fn irq(&mut self) -> Result<u32, Error> {
        self.irq
    }

    fn delay_us(&mut self, us: u32) {
        self.events.borrow_mut().push(Event::Delay(us));
    }
}
