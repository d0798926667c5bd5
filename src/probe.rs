// Copyright 2025 The aspeed-sgpio Authors.
// This project is dual-licensed under Apache 2.0 and MIT terms.
// See LICENSE-APACHE and LICENSE-MIT for details.

//! Attaching the driver to a device, using collaborators provided by the platform.

use crate::{Error, SgpioRegisters, config::SgpioConfig, sgpio::Sgpio};
use log::{error, warn};
use safe_mmio::UniqueMmioPointer;

/// Name of the device property holding the requested serial bus frequency in Hz.
pub const BUS_FREQUENCY_PROPERTY: &str = "bus-frequency";

/// Serial bus frequency used when the device doesn't request one.
pub const DEFAULT_BUS_FREQUENCY: u32 = 1_000_000;

/// How long the reset line is held asserted, in microseconds.
const RESET_DELAY_US: u32 = 3;

/// A handle to the controller's source clock.
pub trait Clock {
    /// Ungates the clock.
    fn enable(&mut self) -> Result<(), Error>;

    /// Gates the clock.
    fn disable(&mut self);

    /// Returns the clock rate in Hz.
    fn rate_hz(&self) -> u64;
}

/// A handle to the controller's reset line.
pub trait ResetControl {
    /// Puts the controller into reset.
    fn assert(&mut self);

    /// Takes the controller out of reset.
    fn deassert(&mut self);
}

/// The services a platform provides to attach an SGPIO controller.
///
/// Acquisition methods should return [`Error::Deferred`] when the collaborator exists but has not
/// been set up yet, so that attaching can be retried later, and [`Error::Unavailable`] otherwise.
pub trait Platform<'a> {
    type Clock: Clock;
    type Reset: ResetControl;

    /// Maps the controller's register block.
    fn registers(&mut self) -> Result<UniqueMmioPointer<'a, SgpioRegisters>, Error>;

    /// Reads an unsigned 32-bit device property, returning `None` if it is absent or malformed.
    fn property_u32(&self, name: &str) -> Option<u32>;

    /// Acquires the source clock.
    fn clock(&mut self) -> Result<Self::Clock, Error>;

    /// Acquires the reset controller.
    fn reset(&mut self) -> Result<Self::Reset, Error>;

    /// Returns the number of the upstream interrupt line.
    fn irq(&mut self) -> Result<u32, Error>;

    /// Busy-waits for the given number of microseconds.
    fn delay_us(&mut self, us: u32);
}

/// Logs a failure to acquire a collaborator, unless it is only deferred.
fn report(error: &Error) {
    if !error.is_deferred() {
        error!("{error}");
    }
}

/// Attaches to an SGPIO controller, returning the initialised driver.
///
/// The source clock is left enabled on success. If attaching fails after the clock has been
/// enabled it is disabled again.
pub fn probe<'a, P: Platform<'a>>(
    platform: &mut P,
    config: &'a SgpioConfig,
) -> Result<Sgpio<'a>, Error> {
    let regs = platform.registers().inspect_err(report)?;

    let bus_hz = match platform.property_u32(BUS_FREQUENCY_PROPERTY) {
        Some(hz) if hz != 0 => hz,
        _ => {
            warn!(
                "Could not read {BUS_FREQUENCY_PROPERTY} property, using default of {DEFAULT_BUS_FREQUENCY} Hz"
            );
            DEFAULT_BUS_FREQUENCY
        }
    };

    let mut clock = platform.clock().inspect_err(report)?;
    clock.enable().inspect_err(report)?;
    let src_hz = clock.rate_hz();

    attach(platform, regs, config, src_hz, bus_hz).inspect_err(|_| clock.disable())
}

fn attach<'a, P: Platform<'a>>(
    platform: &mut P,
    regs: UniqueMmioPointer<'a, SgpioRegisters>,
    config: &'a SgpioConfig,
    src_hz: u64,
    bus_hz: u32,
) -> Result<Sgpio<'a>, Error> {
    let mut reset = platform.reset().inspect_err(report)?;
    reset.assert();
    platform.delay_us(RESET_DELAY_US);
    reset.deassert();

    let irq = platform.irq().inspect_err(report)?;

    let sgpio = Sgpio::new(regs, config, irq);
    sgpio.setup(src_hz, bus_hz);
    Ok(sgpio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Control, Resource,
        config::AST2500_CONFIG,
        fake::{Event, FakePlatform, FakeSgpioRegisters},
    };

    const CTRL: usize = 0x54;

    #[test]
    fn default_bus_frequency() {
        let mut regs = FakeSgpioRegisters::new();
        let mut platform = FakePlatform::new(&mut regs);
        let events = platform.events.clone();

        let sgpio = probe(&mut platform, &AST2500_CONFIG).unwrap();
        assert_eq!(sgpio.irq(), 40);
        drop(sgpio);
        drop(platform);

        assert_eq!(
            *events.borrow(),
            [
                Event::ClockEnabled,
                Event::ResetAsserted,
                Event::Delay(3),
                Event::ResetDeasserted,
            ]
        );
        assert_eq!(regs.reg_read(CTRL), Control::new(11, 10).bits());
    }

    #[test]
    fn bus_frequency_property() {
        let mut regs = FakeSgpioRegisters::new();
        let mut platform = FakePlatform::new(&mut regs);
        platform.properties.insert(BUS_FREQUENCY_PROPERTY, 400_000);
        platform.clock = Ok(48_000_000);

        probe(&mut platform, &AST2500_CONFIG).unwrap();
        drop(platform);

        assert_eq!(regs.reg_read(CTRL), Control::new(59, 10).bits());
    }

    #[test]
    fn zero_bus_frequency_uses_default() {
        let mut regs = FakeSgpioRegisters::new();
        let mut platform = FakePlatform::new(&mut regs);
        platform.properties.insert(BUS_FREQUENCY_PROPERTY, 0);

        probe(&mut platform, &AST2500_CONFIG).unwrap();
        drop(platform);

        assert_eq!(regs.reg_read(CTRL), Control::new(11, 10).bits());
    }

    #[test]
    fn missing_registers() {
        let mut regs = FakeSgpioRegisters::new();
        let mut platform = FakePlatform::new(&mut regs);
        platform.registers = None;

        assert_eq!(
            probe(&mut platform, &AST2500_CONFIG).err(),
            Some(Error::Unavailable(Resource::Registers))
        );
        assert!(platform.events.borrow().is_empty());
    }

    #[test]
    fn deferred_clock() {
        let mut regs = FakeSgpioRegisters::new();
        regs.fill(0x1234_5678);
        let mut platform = FakePlatform::new(&mut regs);
        platform.clock = Err(Error::Deferred(Resource::Clock));
        let events = platform.events.clone();

        let error = probe(&mut platform, &AST2500_CONFIG).err().unwrap();
        assert!(error.is_deferred());
        assert!(events.borrow().is_empty());
        drop(platform);
        // Nothing was written.
        assert_eq!(regs, {
            let mut untouched = FakeSgpioRegisters::new();
            untouched.fill(0x1234_5678);
            untouched
        });
    }

    #[test]
    fn clock_enable_failure() {
        let mut regs = FakeSgpioRegisters::new();
        let mut platform = FakePlatform::new(&mut regs);
        platform.clock_enable = Err(Error::Unavailable(Resource::Clock));
        let events = platform.events.clone();

        assert_eq!(
            probe(&mut platform, &AST2500_CONFIG).err(),
            Some(Error::Unavailable(Resource::Clock))
        );
        assert!(events.borrow().is_empty());
        drop(platform);
        assert_eq!(regs.reg_read(CTRL), 0);
    }

    #[test]
    fn missing_reset_disables_clock() {
        let mut regs = FakeSgpioRegisters::new();
        let mut platform = FakePlatform::new(&mut regs);
        platform.reset = Err(Error::Unavailable(Resource::Reset));
        let events = platform.events.clone();

        assert_eq!(
            probe(&mut platform, &AST2500_CONFIG).err(),
            Some(Error::Unavailable(Resource::Reset))
        );
        assert_eq!(
            *events.borrow(),
            [Event::ClockEnabled, Event::ClockDisabled]
        );
    }

    #[test]
    fn missing_irq_disables_clock() {
        let mut regs = FakeSgpioRegisters::new();
        let mut platform = FakePlatform::new(&mut regs);
        platform.irq = Err(Error::Unavailable(Resource::Interrupt));
        let events = platform.events.clone();

        let error = probe(&mut platform, &AST2500_CONFIG).err().unwrap();
        assert_eq!(error, Error::Unavailable(Resource::Interrupt));
        assert!(!error.is_deferred());
        assert_eq!(events.borrow().last(), Some(&Event::ClockDisabled));
        drop(platform);
        assert_eq!(regs.reg_read(CTRL), 0);
    }
}
