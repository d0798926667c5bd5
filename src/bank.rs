// Copyright 2025 The aspeed-sgpio Authors.
// This project is dual-licensed under Apache 2.0 and MIT terms.
// See LICENSE-APACHE and LICENSE-MIT for details.

//! The fixed table of SGPIO banks and the register locator.
//!
//! The controller exposes 80 bidirectional lines as two sets of 96 logical GPIOs: banks 0-2 are
//! the outputs and banks 3-5 the inputs. Each output bank shares its register window with the
//! corresponding input bank. The "value" register returns the level sampled on the line when read
//! and drives the line when written, while the "rdata" register returns the content of the write
//! latch, i.e. what was last written.

use crate::PinId;

/// Offset of the interrupt enable register within a bank's interrupt group.
const IRQ_ENABLE: usize = 0x00;
/// Offset of the interrupt type 0 register within a bank's interrupt group.
const IRQ_TYPE0: usize = 0x04;
/// Offset of the interrupt type 1 register within a bank's interrupt group.
const IRQ_TYPE1: usize = 0x08;
/// Offset of the interrupt type 2 register within a bank's interrupt group.
const IRQ_TYPE2: usize = 0x0c;
/// Offset of the interrupt status register within a bank's interrupt group.
const IRQ_STATUS: usize = 0x10;

/// The logical role of a register belonging to a bank.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Register {
    /// Sampled line level on read, drives the line on write.
    Value,
    /// Read-back of the write latch.
    WriteLatch,
    /// Interrupt enable bits.
    IrqEnable,
    /// Rising edge / high level select.
    IrqType0,
    /// Level (rather than edge) select.
    IrqType1,
    /// Dual edge select.
    IrqType2,
    /// Interrupt status, write one to clear.
    IrqStatus,
    /// Reset tolerance bits.
    Tolerance,
}

impl Register {
    /// Returns whether this register is part of a bank's interrupt group.
    pub const fn is_irq(self) -> bool {
        matches!(
            self,
            Self::IrqEnable | Self::IrqType0 | Self::IrqType1 | Self::IrqType2 | Self::IrqStatus
        )
    }
}

/// Description of one 32-pin bank.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bank {
    value: u16,
    rdata: u16,
    tolerance: u16,
    irq: u16,
    supports_irq: bool,
    names: &'static [&'static str],
}

/// The number of banks.
pub const BANK_COUNT: usize = 6;

/// All banks, indexed by `pin >> 5`.
pub static BANKS: [Bank; BANK_COUNT] = [
    Bank::new(0x0000, 0x0070, 0x0018, 0x0004, false, &["OA", "OB", "OC", "OD"]),
    Bank::new(0x001c, 0x0074, 0x0034, 0x0020, false, &["OE", "OF", "OG", "OH"]),
    Bank::new(0x0038, 0x0078, 0x0050, 0x003c, false, &["OI", "OJ"]),
    Bank::new(0x0000, 0x0070, 0x0018, 0x0004, true, &["IA", "IB", "IC", "ID"]),
    Bank::new(0x001c, 0x0074, 0x0034, 0x0020, true, &["IE", "IF", "IG", "IH"]),
    Bank::new(0x0038, 0x0078, 0x0050, 0x003c, true, &["II", "IJ"]),
];

/// The number of logical pins covered by the bank table.
pub const PIN_CAPACITY: u32 = BANK_COUNT as u32 * PinId::PINS_PER_BANK;

impl Bank {
    const fn new(
        value: u16,
        rdata: u16,
        tolerance: u16,
        irq: u16,
        supports_irq: bool,
        names: &'static [&'static str],
    ) -> Self {
        Self {
            value,
            rdata,
            tolerance,
            irq,
            supports_irq,
            names,
        }
    }

    /// Returns the bank containing the given pin.
    ///
    /// # Panics
    ///
    /// Panics if the pin lies beyond the bank table, which means the device configuration claims
    /// more pins than the hardware has.
    pub fn for_pin(pin: PinId) -> &'static Bank {
        let index = pin.bank_index();
        assert!(index < BANK_COUNT, "{pin:?} is not covered by the bank table");
        &BANKS[index]
    }

    /// Returns whether the bank can raise interrupts.
    pub const fn supports_irq(&self) -> bool {
        self.supports_irq
    }

    /// Returns the byte offset from the start of the register block of the given register of this
    /// bank.
    ///
    /// # Panics
    ///
    /// Panics if an interrupt register is requested for a bank without interrupt support. Callers
    /// must check [`Bank::supports_irq`] first.
    pub const fn locate(&self, register: Register) -> usize {
        assert!(
            self.supports_irq || !register.is_irq(),
            "interrupt register requested for a bank without interrupt support"
        );
        let irq = self.irq as usize;
        match register {
            Register::Value => self.value as usize,
            Register::WriteLatch => self.rdata as usize,
            Register::IrqEnable => irq + IRQ_ENABLE,
            Register::IrqType0 => irq + IRQ_TYPE0,
            Register::IrqType1 => irq + IRQ_TYPE1,
            Register::IrqType2 => irq + IRQ_TYPE2,
            Register::IrqStatus => irq + IRQ_STATUS,
            Register::Tolerance => self.tolerance as usize,
        }
    }

    /// Returns the group label covering the given bit, and the bit's position within the group.
    ///
    /// Each label names eight consecutive pins. Returns `None` for bits which have no label.
    pub fn label(&self, bit: u32) -> Option<(&'static str, u32)> {
        let name = self.names.get((bit / 8) as usize)?;
        Some((name, bit % 8))
    }
}
