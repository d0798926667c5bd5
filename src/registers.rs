// Copyright 2025 The aspeed-sgpio Authors.
// This project is dual-licensed under Apache 2.0 and MIT terms.
// See LICENSE-APACHE and LICENSE-MIT for details.

use bitflags::bitflags;
use safe_mmio::fields::ReadPureWrite;
use zerocopy::{FromBytes, IntoBytes};

/// Byte offset of the global control register.
pub const CTRL: usize = 0x54;

/// The number of 32-bit registers in the SGPIO register block.
pub const REGISTER_COUNT: usize = 0x7c / 4;

/// SGPIO master register block.
///
/// Bank registers are shared between the output and input banks and are reached by byte offset
/// through [`Bank::locate`](crate::bank::Bank::locate), so the block is described as a flat array
/// of 32-bit registers.
#[repr(C, align(4))]
#[derive(FromBytes, IntoBytes)]
pub struct SgpioRegisters {
    /// 0x00 - 0x78: Bank, control and write latch registers.
    pub(crate) regs: [ReadPureWrite<u32>; REGISTER_COUNT],
}

/// Serial GPIO clock divisor bounds.
const CLOCK_DIVISOR_MIN: u64 = 1;
const CLOCK_DIVISOR_MAX: u64 = 65535;

/// Bytes per frame bounds.
const PIN_BYTES_MIN: u32 = 1;
const PIN_BYTES_MAX: u32 = 10;

/// Value of the global control register.
#[derive(Clone, Copy, Eq, PartialEq)]
#[repr(transparent)]
pub struct Control(u32);

impl Control {
    const CLOCK_DIVISOR_SHIFT: u32 = 16;
    const PIN_BYTES_SHIFT: u32 = 6;
    const PIN_BYTES_MASK: u32 = 0b1111;
    const ENABLE: u32 = 1 << 0;

    /// Returns an enabled control word with the given clock divisor and frame length.
    pub fn new(clock_divisor: u16, pin_bytes: u8) -> Self {
        Self(
            u32::from(clock_divisor) << Self::CLOCK_DIVISOR_SHIFT
                | (u32::from(pin_bytes) & Self::PIN_BYTES_MASK) << Self::PIN_BYTES_SHIFT
                | Self::ENABLE,
        )
    }

    /// Returns the control word for driving the bus at `bus_hz` from a `src_hz` source clock with
    /// `nr_gpios` logical GPIOs.
    pub fn for_bus(src_hz: u64, bus_hz: u32, nr_gpios: u32) -> Self {
        Self::new(clock_divisor(src_hz, bus_hz), pin_bytes(nr_gpios))
    }

    /// Wraps a raw register value.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw register value.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns the serial clock divisor.
    pub fn clock_divisor(self) -> u16 {
        (self.0 >> Self::CLOCK_DIVISOR_SHIFT) as u16
    }

    /// Returns the number of bytes shifted per frame.
    pub fn pin_bytes(self) -> u8 {
        ((self.0 >> Self::PIN_BYTES_SHIFT) & Self::PIN_BYTES_MASK) as u8
    }

    /// Returns whether the controller is enabled.
    pub fn is_enabled(self) -> bool {
        self.0 & Self::ENABLE != 0
    }
}

impl core::fmt::Debug for Control {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Control")
            .field("clock_divisor", &self.clock_divisor())
            .field("pin_bytes", &self.pin_bytes())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Computes the serial clock divisor for the requested bus frequency.
///
/// The serial clock period is `2 * (divisor + 1)` source clock periods, so the divisor is the
/// nearest whole ratio of source to doubled bus frequency, less one. The hardware requires a divisor
/// of at least 1.
pub fn clock_divisor(src_hz: u64, bus_hz: u32) -> u16 {
    let bus_hz = u64::from(bus_hz);
    let divisor = (src_hz + bus_hz)
        .checked_div(2 * bus_hz)
        .unwrap_or(0)
        .saturating_sub(1);
    divisor.clamp(CLOCK_DIVISOR_MIN, CLOCK_DIVISOR_MAX) as u16
}

/// Computes the number of bytes shifted per frame for the given number of logical GPIOs.
pub fn pin_bytes(nr_gpios: u32) -> u8 {
    (nr_gpios / 16).clamp(PIN_BYTES_MIN, PIN_BYTES_MAX) as u8
}

bitflags! {
    /// Bits set for one pin across the three interrupt type registers.
    #[repr(transparent)]
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct TypeBits: u8 {
        /// Rising edge or high level.
        const TYPE0 = 1 << 0;
        /// Level sensitive.
        const TYPE1 = 1 << 1;
        /// Both edges.
        const TYPE2 = 1 << 2;
    }
}
