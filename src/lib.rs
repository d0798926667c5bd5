// Copyright 2025 The aspeed-sgpio Authors.
// This project is dual-licensed under Apache 2.0 and MIT terms.
// See LICENSE-APACHE and LICENSE-MIT for details.

//! Driver for the Aspeed serial GPIO (SGPIO) master controller.
//!
//! The controller shifts up to 80 bidirectional lines over a serial bus, exposing them as 192
//! logical GPIOs in six banks of 32, and demultiplexes a single upstream interrupt into one virtual
//! interrupt per input pin.
//!
//! # Example
//!
//! ```no_run
//! use aspeed_sgpio::{
//!     config::AST2500_CONFIG, sgpio::Sgpio, IrqType, PinId, SgpioRegisters,
//! };
//! use core::ptr::NonNull;
//! use safe_mmio::UniqueMmioPointer;
//!
//! // Base address of the SGPIO master register block.
//! const SGPIO_BASE_ADDRESS: *mut SgpioRegisters = 0x1e78_0200 as _;
//!
//! # fn handle_pin(_: PinId) {}
//! // SAFETY: The SGPIO register block is mapped as device memory at this address, and nothing else
//! // accesses it.
//! let regs = unsafe { UniqueMmioPointer::new(NonNull::new(SGPIO_BASE_ADDRESS).unwrap()) };
//! let sgpio = Sgpio::new(regs, &AST2500_CONFIG, 40);
//! sgpio.setup(24_000_000, 1_000_000);
//!
//! // Drive the first output, and listen for a rising edge on the first input.
//! sgpio.direction_output(PinId::new(0), true).unwrap();
//! sgpio.set_type(PinId::new(96), IrqType::EdgeRising).unwrap();
//! sgpio.unmask(PinId::new(96)).unwrap();
//!
//! // In the upstream interrupt handler:
//! sgpio.handle_interrupt(handle_pin);
//! ```

#![cfg_attr(not(any(test, feature = "fakes")), no_std)]
#![deny(clippy::undocumented_unsafe_blocks)]

pub mod bank;
pub mod config;
#[cfg(any(test, feature = "fakes"))]
pub mod fake;
pub mod probe;
mod registers;
pub mod sgpio;

pub use registers::{Control, SgpioRegisters, TypeBits, clock_divisor, pin_bytes};

use core::fmt::{self, Debug, Display, Formatter};
use thiserror::Error;

/// The offset of a logical GPIO within the SGPIO controller.
#[derive(Copy, Clone, Eq, Ord, PartialOrd, PartialEq)]
pub struct PinId(u32);

impl PinId {
    /// The number of pins sharing one bank's registers.
    pub const PINS_PER_BANK: u32 = 32;

    /// Returns the ID for the given pin offset.
    pub const fn new(offset: u32) -> Self {
        Self(offset)
    }

    /// Returns the ID for the given bit of the given bank.
    pub const fn from_bank(bank: usize, bit: u32) -> Self {
        assert!(bit < Self::PINS_PER_BANK);
        Self(bank as u32 * Self::PINS_PER_BANK + bit)
    }

    /// Returns the index of the bank the pin belongs to.
    pub const fn bank_index(self) -> usize {
        (self.0 >> 5) as usize
    }

    /// Returns the position of the pin within its bank.
    pub const fn bit(self) -> u32 {
        self.0 & 0x1f
    }

    /// Returns the pin's bit within its bank's registers.
    pub const fn mask(self) -> u32 {
        1 << self.bit()
    }
}

impl Debug for PinId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match bank::BANKS
            .get(self.bank_index())
            .and_then(|bank| bank.label(self.bit()))
        {
            Some((name, bit)) => write!(f, "{name}{bit}"),
            None => write!(f, "SGPIO {}", self.0),
        }
    }
}

impl From<PinId> for u32 {
    fn from(pin: PinId) -> Self {
        pin.0
    }
}

/// The trigger configuration for an interrupt, which determines the flow handler the interrupt
/// framework should use for it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Trigger {
    /// The interrupt is edge triggered.
    Edge,
    /// The interrupt is level triggered.
    Level,
}

/// The condition which raises a pin's interrupt.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IrqType {
    /// Raised on a low to high transition.
    EdgeRising,
    /// Raised on a high to low transition.
    EdgeFalling,
    /// Raised on any transition.
    EdgeBoth,
    /// Raised while the line is high.
    LevelHigh,
    /// Raised while the line is low.
    LevelLow,
}

impl IrqType {
    /// Interrupt sense bits as used by interrupt frameworks.
    pub const SENSE_EDGE_RISING: u32 = 0x1;
    pub const SENSE_EDGE_FALLING: u32 = 0x2;
    pub const SENSE_EDGE_BOTH: u32 = Self::SENSE_EDGE_RISING | Self::SENSE_EDGE_FALLING;
    pub const SENSE_LEVEL_HIGH: u32 = 0x4;
    pub const SENSE_LEVEL_LOW: u32 = 0x8;
    pub const SENSE_MASK: u32 = 0xf;

    /// Decodes interrupt sense bits. Bits outside [`Self::SENSE_MASK`] are ignored.
    pub fn from_sense(sense: u32) -> Result<Self, Error> {
        match sense & Self::SENSE_MASK {
            Self::SENSE_EDGE_RISING => Ok(Self::EdgeRising),
            Self::SENSE_EDGE_FALLING => Ok(Self::EdgeFalling),
            Self::SENSE_EDGE_BOTH => Ok(Self::EdgeBoth),
            Self::SENSE_LEVEL_HIGH => Ok(Self::LevelHigh),
            Self::SENSE_LEVEL_LOW => Ok(Self::LevelLow),
            _ => Err(Error::InvalidTriggerType(sense)),
        }
    }

    /// Returns the bits to set for this type across the three interrupt type registers.
    pub fn type_bits(self) -> TypeBits {
        match self {
            Self::EdgeRising => TypeBits::TYPE0,
            Self::EdgeFalling => TypeBits::empty(),
            Self::EdgeBoth => TypeBits::TYPE0 | TypeBits::TYPE2,
            Self::LevelHigh => TypeBits::TYPE0 | TypeBits::TYPE1,
            Self::LevelLow => TypeBits::TYPE1,
        }
    }

    /// Returns the flow handler for this type.
    pub fn trigger(self) -> Trigger {
        match self {
            Self::EdgeRising | Self::EdgeFalling | Self::EdgeBoth => Trigger::Edge,
            Self::LevelHigh | Self::LevelLow => Trigger::Level,
        }
    }
}

/// The direction of a pin.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    /// The pin's level is sampled from the line.
    Input,
    /// The pin drives the line.
    Output,
}

/// A pin configuration parameter.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PinConfig {
    /// Keep the driven value across a watchdog reset.
    PersistState(bool),
    /// Input debouncing.
    InputDebounce,
    /// Open drain output.
    DriveOpenDrain,
    /// Internal pull up.
    BiasPullUp,
    /// Internal pull down.
    BiasPullDown,
}

/// A collaborator which the controller needs in order to attach.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Resource {
    /// The memory-mapped register block.
    Registers,
    /// The source clock.
    Clock,
    /// The reset controller.
    Reset,
    /// The upstream interrupt line.
    Interrupt,
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Registers => "register block",
            Self::Clock => "clock source",
            Self::Reset => "reset controller",
            Self::Interrupt => "upstream interrupt",
        })
    }
}

/// An error returned by the SGPIO driver.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum Error {
    /// The pin lacks the capability needed for the operation.
    #[error("{0:?} does not support this operation")]
    NotSupported(PinId),
    /// The pin is beyond the controller's logical GPIOs.
    #[error("{0:?} is not a valid SGPIO pin")]
    InvalidPin(PinId),
    /// The interrupt sense bits do not describe a supported trigger type.
    #[error("Invalid interrupt trigger type {0:#x}")]
    InvalidTriggerType(u32),
    /// A collaborator is not available yet; attaching may be retried later.
    #[error("{0} is not available yet")]
    Deferred(Resource),
    /// A collaborator could not be acquired.
    #[error("Failed to acquire {0}")]
    Unavailable(Resource),
}

impl Error {
    /// Returns whether the operation failed because a collaborator is not ready yet, and may
    /// succeed if retried later.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_position() {
        let pin = PinId::new(117);
        assert_eq!(pin.bank_index(), 3);
        assert_eq!(pin.bit(), 21);
        assert_eq!(pin.mask(), 1 << 21);
        assert_eq!(PinId::from_bank(3, 21), pin);
    }

    #[test]
    fn pin_debug() {
        assert_eq!(format!("{:?}", PinId::new(0)), "OA0");
        assert_eq!(format!("{:?}", PinId::new(117)), "IC5");
        assert_eq!(format!("{:?}", PinId::new(175)), "IJ7");
        assert_eq!(format!("{:?}", PinId::new(176)), "SGPIO 176");
        assert_eq!(format!("{:?}", PinId::new(500)), "SGPIO 500");
    }

    #[test]
    fn sense_decoding() {
        assert_eq!(IrqType::from_sense(0x1), Ok(IrqType::EdgeRising));
        assert_eq!(IrqType::from_sense(0x2), Ok(IrqType::EdgeFalling));
        assert_eq!(IrqType::from_sense(0x3), Ok(IrqType::EdgeBoth));
        assert_eq!(IrqType::from_sense(0x4), Ok(IrqType::LevelHigh));
        assert_eq!(IrqType::from_sense(0x8), Ok(IrqType::LevelLow));
        assert_eq!(IrqType::from_sense(0x104), Ok(IrqType::LevelHigh));
        for sense in [0x0, 0x5, 0x6, 0xc, 0xf] {
            assert_eq!(
                IrqType::from_sense(sense),
                Err(Error::InvalidTriggerType(sense))
            );
        }
    }

    #[test]
    fn type_encoding() {
        assert_eq!(IrqType::EdgeRising.type_bits().bits(), 0b001);
        assert_eq!(IrqType::EdgeFalling.type_bits().bits(), 0b000);
        assert_eq!(IrqType::EdgeBoth.type_bits().bits(), 0b101);
        assert_eq!(IrqType::LevelHigh.type_bits().bits(), 0b011);
        assert_eq!(IrqType::LevelLow.type_bits().bits(), 0b010);
        assert_eq!(IrqType::EdgeBoth.trigger(), Trigger::Edge);
        assert_eq!(IrqType::LevelLow.trigger(), Trigger::Level);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            Error::NotSupported(PinId::new(3)).to_string(),
            "OA3 does not support this operation"
        );
        assert_eq!(
            Error::Deferred(Resource::Clock).to_string(),
            "clock source is not available yet"
        );
        assert!(Error::Deferred(Resource::Reset).is_deferred());
        assert!(!Error::Unavailable(Resource::Reset).is_deferred());
    }
}
