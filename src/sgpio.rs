// Copyright 2025 The aspeed-sgpio Authors.
// This project is dual-licensed under Apache 2.0 and MIT terms.
// See LICENSE-APACHE and LICENSE-MIT for details.

//! Driver for the SGPIO master controller.

use crate::{
    Control, Direction, Error, IrqType, PinConfig, PinId, Trigger, TypeBits,
    bank::{BANKS, Bank, PIN_CAPACITY, Register},
    config::SgpioConfig,
    registers::{CTRL, SgpioRegisters},
};
use core::cell::RefCell;
use critical_section::Mutex;
use log::debug;
use safe_mmio::{UniqueMmioPointer, field, fields::ReadPureWrite};

/// Returns a pointer to the 32-bit register at the given byte offset.
fn register_at<'r>(
    regs: &'r mut UniqueMmioPointer<'_, SgpioRegisters>,
    offset: usize,
) -> UniqueMmioPointer<'r, ReadPureWrite<u32>> {
    field!(*regs, regs)
        .take(offset / 4)
        .expect("register offset outside the SGPIO register block")
}

/// Sets or clears the bits in `mask` of the register at the given byte offset, leaving the others
/// unchanged.
fn update_bits(
    regs: &mut UniqueMmioPointer<'_, SgpioRegisters>,
    offset: usize,
    mask: u32,
    set: bool,
) {
    let mut register = register_at(regs, offset);
    let value = register.read();
    register.write(if set { value | mask } else { value & !mask });
}

/// Driver for an Aspeed SGPIO master controller.
///
/// All register accesses go through a single lock which masks interrupts on the current core while
/// it is held, so the driver may be shared between thread and interrupt context.
pub struct Sgpio<'a> {
    regs: Mutex<RefCell<UniqueMmioPointer<'a, SgpioRegisters>>>,
    config: &'a SgpioConfig,
    irq: u32,
}

impl<'a> Sgpio<'a> {
    /// Constructs a new instance of the driver for the given register block, without touching the
    /// hardware. Call [`Sgpio::setup`] before using it.
    ///
    /// # Panics
    ///
    /// Panics if the configuration has more logical GPIOs than the bank table covers.
    pub fn new(
        regs: UniqueMmioPointer<'a, SgpioRegisters>,
        config: &'a SgpioConfig,
        irq: u32,
    ) -> Self {
        assert!(
            config.nr_gpios <= PIN_CAPACITY,
            "{} GPIOs configured but the banks only cover {PIN_CAPACITY}",
            config.nr_gpios
        );
        Self {
            regs: Mutex::new(RefCell::new(regs)),
            config,
            irq,
        }
    }

    /// Returns the device configuration.
    pub fn config(&self) -> &'a SgpioConfig {
        self.config
    }

    /// Returns the number of the upstream interrupt line.
    pub fn irq(&self) -> u32 {
        self.irq
    }

    /// Runs `f` with exclusive access to the registers, with interrupts masked.
    fn with_regs<R>(&self, f: impl FnOnce(&mut UniqueMmioPointer<'a, SgpioRegisters>) -> R) -> R {
        critical_section::with(|cs| {
            let mut regs = self.regs.borrow_ref_mut(cs);
            f(&mut *regs)
        })
    }

    /// Returns the bank of the given pin, or an error if it is not one of the controller's pins.
    fn bank(&self, pin: PinId) -> Result<&'static Bank, Error> {
        if !self.config.contains(pin) {
            return Err(Error::InvalidPin(pin));
        }
        Ok(Bank::for_pin(pin))
    }

    /// Initialises the controller.
    ///
    /// Programs the serial clock for `bus_hz` given a source clock of `src_hz` and enables the
    /// controller, then clears the tolerance bits of every bank and disables, clears and
    /// configures as rising edge the interrupts of every bank which has them.
    pub fn setup(&self, src_hz: u64, bus_hz: u32) -> Control {
        let control = Control::for_bus(src_hz, bus_hz, self.config.nr_gpios);
        debug!("SGPIO source clock {src_hz} Hz, bus {bus_hz} Hz: {control:?}");

        self.with_regs(|regs| {
            register_at(regs, CTRL).write(control.bits());

            for bank in &BANKS {
                register_at(regs, bank.locate(Register::Tolerance)).write(0);

                if !bank.supports_irq() {
                    continue;
                }
                register_at(regs, bank.locate(Register::IrqEnable)).write(0);
                register_at(regs, bank.locate(Register::IrqStatus)).write(0xffffffff);
                register_at(regs, bank.locate(Register::IrqType0)).write(0xffffffff);
                register_at(regs, bank.locate(Register::IrqType1)).write(0);
                register_at(regs, bank.locate(Register::IrqType2)).write(0);
            }
        });

        control
    }

    /// Returns the level of the given pin.
    ///
    /// For an output capable pin this is the value last written, read back from the write latch.
    /// Otherwise it is the level sampled on the line.
    pub fn get(&self, pin: PinId) -> Result<bool, Error> {
        let bank = self.bank(pin)?;
        let register = if self.config.output_capable(pin) {
            Register::WriteLatch
        } else {
            Register::Value
        };
        let value = self.with_regs(|regs| register_at(regs, bank.locate(register)).read());
        Ok(value & pin.mask() != 0)
    }

    /// Drives the given pin high or low.
    ///
    /// Does nothing if the pin is not output capable.
    pub fn set(&self, pin: PinId, value: bool) -> Result<(), Error> {
        let bank = self.bank(pin)?;
        if !self.config.output_capable(pin) {
            return Ok(());
        }

        self.with_regs(|regs| {
            // The value register can only be written a whole bank at a time, so start from what
            // is currently latched.
            let latched = register_at(regs, bank.locate(Register::WriteLatch)).read();
            let latched = if value {
                latched | pin.mask()
            } else {
                latched & !pin.mask()
            };
            register_at(regs, bank.locate(Register::Value)).write(latched);
        });
        Ok(())
    }

    /// Configures the pin as an input.
    ///
    /// Pin directions are fixed by the wiring, so this only checks that the pin is input capable.
    pub fn direction_input(&self, pin: PinId) -> Result<(), Error> {
        self.bank(pin)?;
        if !self.config.input_capable(pin) {
            return Err(Error::NotSupported(pin));
        }
        Ok(())
    }

    /// Configures the pin as an output driving the given value.
    pub fn direction_output(&self, pin: PinId, value: bool) -> Result<(), Error> {
        self.bank(pin)?;
        if !self.config.output_capable(pin) {
            return Err(Error::NotSupported(pin));
        }
        self.set(pin, value)
    }

    /// Returns the direction of the pin. Pins which can be used either way are outputs.
    pub fn direction(&self, pin: PinId) -> Result<Direction, Error> {
        self.bank(pin)?;
        if self.config.output_capable(pin) {
            Ok(Direction::Output)
        } else if self.config.input_capable(pin) {
            Ok(Direction::Input)
        } else {
            Err(Error::NotSupported(pin))
        }
    }

    /// Sets or clears the reset tolerance bit of the pin. A tolerant pin keeps its output value
    /// across a watchdog reset.
    pub fn set_persist_tolerance(&self, pin: PinId, enable: bool) -> Result<(), Error> {
        let bank = self.bank(pin)?;
        self.with_regs(|regs| {
            update_bits(regs, bank.locate(Register::Tolerance), pin.mask(), enable);
        });
        Ok(())
    }

    /// Applies a pin configuration parameter. Only [`PinConfig::PersistState`] is supported.
    pub fn set_config(&self, pin: PinId, config: PinConfig) -> Result<(), Error> {
        match config {
            PinConfig::PersistState(enable) => self.set_persist_tolerance(pin, enable),
            _ => {
                self.bank(pin)?;
                Err(Error::NotSupported(pin))
            }
        }
    }

    /// Returns the bank of the pin if it can raise interrupts.
    fn irq_bank(&self, pin: PinId) -> Result<Option<&'static Bank>, Error> {
        let bank = self.bank(pin)?;
        Ok(bank.supports_irq().then_some(bank))
    }

    /// Configures what raises the pin's interrupt, and returns the flow handler which should
    /// service it.
    pub fn set_type(&self, pin: PinId, irq_type: IrqType) -> Result<Trigger, Error> {
        let bank = self.irq_bank(pin)?.ok_or(Error::NotSupported(pin))?;
        let type_bits = irq_type.type_bits();

        // The three type registers are only consistent with each other once all are written.
        self.with_regs(|regs| {
            for (register, flag) in [
                (Register::IrqType0, TypeBits::TYPE0),
                (Register::IrqType1, TypeBits::TYPE1),
                (Register::IrqType2, TypeBits::TYPE2),
            ] {
                update_bits(
                    regs,
                    bank.locate(register),
                    pin.mask(),
                    type_bits.contains(flag),
                );
            }
        });

        Ok(irq_type.trigger())
    }

    /// Like [`Sgpio::set_type`], but takes interrupt sense bits as used by interrupt frameworks.
    pub fn set_type_sense(&self, pin: PinId, sense: u32) -> Result<Trigger, Error> {
        if self.irq_bank(pin)?.is_none() {
            return Err(Error::NotSupported(pin));
        }
        self.set_type(pin, IrqType::from_sense(sense)?)
    }

    fn set_irq_enabled(&self, pin: PinId, enable: bool) -> Result<(), Error> {
        let Some(bank) = self.irq_bank(pin)? else {
            return Ok(());
        };
        self.with_regs(|regs| {
            update_bits(regs, bank.locate(Register::IrqEnable), pin.mask(), enable);
        });
        Ok(())
    }

    /// Disables the pin's interrupt. Does nothing if the pin's bank has no interrupts.
    pub fn mask(&self, pin: PinId) -> Result<(), Error> {
        self.set_irq_enabled(pin, false)
    }

    /// Enables the pin's interrupt. Does nothing if the pin's bank has no interrupts.
    pub fn unmask(&self, pin: PinId) -> Result<(), Error> {
        self.set_irq_enabled(pin, true)
    }

    /// Clears the pin's pending interrupt status. Does nothing if the pin's bank has no
    /// interrupts.
    ///
    /// A level triggered interrupt is raised again while the level persists.
    pub fn ack(&self, pin: PinId) -> Result<(), Error> {
        let Some(bank) = self.irq_bank(pin)? else {
            return Ok(());
        };
        self.with_regs(|regs| {
            register_at(regs, bank.locate(Register::IrqStatus)).write(pin.mask());
        });
        Ok(())
    }

    /// Handles the upstream interrupt, calling `dispatch` in ascending order for every interrupt
    /// source pin with a pending status bit.
    ///
    /// Status bits are left for the pin's handler to clear with [`Sgpio::ack`]. Returns the number
    /// of pins dispatched, which is zero if the interrupt was raised by another device sharing the
    /// line.
    pub fn handle_interrupt(&self, mut dispatch: impl FnMut(PinId)) -> usize {
        let mut dispatched = 0;

        for (index, bank) in BANKS.iter().enumerate() {
            if !bank.supports_irq() {
                continue;
            }
            let mut pending =
                self.with_regs(|regs| register_at(regs, bank.locate(Register::IrqStatus)).read());

            while pending != 0 {
                let pin = PinId::from_bank(index, pending.trailing_zeros());
                pending &= pending - 1;
                if !self.config.is_irq_valid(pin) {
                    debug!("Ignoring status of {pin:?}, which is not an interrupt source");
                    continue;
                }
                dispatch(pin);
                dispatched += 1;
            }
        }

        dispatched
    }
}
