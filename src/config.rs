// Copyright 2025 The aspeed-sgpio Authors.
// This project is dual-licensed under Apache 2.0 and MIT terms.
// See LICENSE-APACHE and LICENSE-MIT for details.

//! Device configurations and pin capabilities.

use crate::PinId;

/// Input and output capabilities of the pins in one bank.
///
/// Any bank which has no entry in a configuration's list is assumed to have every pin both input
/// and output capable.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BankProps {
    /// Index of the bank the masks apply to.
    pub bank: usize,
    /// Bit `n` is set if pin `n` of the bank can be read.
    pub input: u32,
    /// Bit `n` is set if pin `n` of the bank can be driven.
    pub output: u32,
}

/// Capabilities of the standard SGPIO wiring: 80 outputs in banks 0-2 and 80 inputs in banks 3-5.
pub const AST_BANK_PROPS: [BankProps; 6] = [
    BankProps::new(0, 0x0000_0000, 0xffff_ffff), // OA/OB/OC/OD
    BankProps::new(1, 0x0000_0000, 0xffff_ffff), // OE/OF/OG/OH
    BankProps::new(2, 0x0000_0000, 0x0000_ffff), // OI/OJ
    BankProps::new(3, 0xffff_ffff, 0x0000_0000), // IA/IB/IC/ID
    BankProps::new(4, 0xffff_ffff, 0x0000_0000), // IE/IF/IG/IH
    BankProps::new(5, 0x0000_ffff, 0x0000_0000), // II/IJ
];

impl BankProps {
    /// Returns capabilities for the given bank.
    pub const fn new(bank: usize, input: u32, output: u32) -> Self {
        Self {
            bank,
            input,
            output,
        }
    }
}

/// Static configuration of an SGPIO controller variant.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SgpioConfig {
    /// Number of pins of the parallel GPIO controller, which the SGPIO pins follow in the global
    /// GPIO numbering.
    pub nr_pgpios: u32,
    /// Number of logical GPIOs. Every output and every input takes one, and each set is padded to
    /// whole banks.
    pub nr_gpios: u32,
    /// Capability overrides, in bank order.
    pub props: &'static [BankProps],
}

/// Configuration of the AST2400.
pub const AST2400_CONFIG: SgpioConfig = SgpioConfig {
    nr_pgpios: 224,
    nr_gpios: 192,
    props: &AST_BANK_PROPS,
};

/// Configuration of the AST2500 and AST2600.
pub const AST2500_CONFIG: SgpioConfig = SgpioConfig {
    nr_pgpios: 232,
    nr_gpios: 192,
    props: &AST_BANK_PROPS,
};

/// Firmware compatible strings and the configuration each selects.
static COMPATIBLE: [(&str, &SgpioConfig); 3] = [
    ("aspeed,ast2400-sgpio", &AST2400_CONFIG),
    ("aspeed,ast2500-sgpio", &AST2500_CONFIG),
    ("aspeed,ast2600-sgpio", &AST2500_CONFIG),
];

impl SgpioConfig {
    /// Returns the configuration for the given firmware compatible string, if it is supported.
    pub fn for_compatible(compatible: &str) -> Option<&'static SgpioConfig> {
        COMPATIBLE
            .iter()
            .find(|(name, _)| *name == compatible)
            .map(|(_, config)| *config)
    }

    /// Returns whether the pin is one of this controller's logical GPIOs.
    pub fn contains(&self, pin: PinId) -> bool {
        u32::from(pin) < self.nr_gpios
    }

    fn find_props(&self, pin: PinId) -> Option<&BankProps> {
        self.props
            .iter()
            .find(|props| props.bank == pin.bank_index())
    }

    /// Returns whether the pin can be read as an input.
    pub fn input_capable(&self, pin: PinId) -> bool {
        self.find_props(pin)
            .is_none_or(|props| props.input & pin.mask() != 0)
    }

    /// Returns whether the pin can be driven as an output.
    pub fn output_capable(&self, pin: PinId) -> bool {
        self.find_props(pin)
            .is_none_or(|props| props.output & pin.mask() != 0)
    }

    /// Returns whether the pin is backed by hardware in either direction.
    pub fn is_valid(&self, pin: PinId) -> bool {
        self.contains(pin) && (self.input_capable(pin) || self.output_capable(pin))
    }

    /// Returns whether the pin may be used as an interrupt source.
    ///
    /// Pins which are not input capable never latch a status bit.
    pub fn is_irq_valid(&self, pin: PinId) -> bool {
        self.contains(pin) && self.input_capable(pin)
    }

    /// Returns all pins which may be used as interrupt sources.
    pub fn irq_valid_pins(&self) -> impl Iterator<Item = PinId> + '_ {
        (0..self.nr_gpios)
            .map(PinId::new)
            .filter(|&pin| self.is_irq_valid(pin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatible_lookup() {
        assert_eq!(
            SgpioConfig::for_compatible("aspeed,ast2400-sgpio"),
            Some(&AST2400_CONFIG)
        );
        assert_eq!(
            SgpioConfig::for_compatible("aspeed,ast2600-sgpio"),
            Some(&AST2500_CONFIG)
        );
        assert_eq!(SgpioConfig::for_compatible("aspeed,ast2600-gpio"), None);
    }

    /// Overrides bank 1 only: bits 0-7 are inputs and bits 8-15 outputs.
    static PARTIAL_CONFIG: SgpioConfig = SgpioConfig {
        nr_pgpios: 0,
        nr_gpios: 96,
        props: &[BankProps::new(1, 0x0000_00ff, 0x0000_ff00)],
    };

    #[test]
    fn missing_bank_is_fully_capable() {
        let config = &PARTIAL_CONFIG;
        for pin in (0..32).chain(64..96).map(PinId::new) {
            assert!(config.input_capable(pin));
            assert!(config.output_capable(pin));
        }
    }

    #[test]
    fn overridden_bank_has_no_fallback() {
        let config = &PARTIAL_CONFIG;
        for bit in 0..32 {
            let pin = PinId::new(32 + bit);
            assert_eq!(config.input_capable(pin), bit < 8);
            assert_eq!(config.output_capable(pin), (8..16).contains(&bit));
            assert_eq!(config.is_valid(pin), bit < 16);
        }
    }

    #[test]
    fn standard_wiring() {
        let config = AST2500_CONFIG;
        assert!(config.output_capable(PinId::new(0)));
        assert!(!config.input_capable(PinId::new(0)));
        assert!(config.output_capable(PinId::new(79)));
        assert!(!config.output_capable(PinId::new(80)));
        assert!(!config.is_valid(PinId::new(80)));
        assert!(config.input_capable(PinId::new(96)));
        assert!(!config.output_capable(PinId::new(96)));
        assert!(config.input_capable(PinId::new(175)));
        assert!(!config.is_valid(PinId::new(176)));
        assert!(!config.is_valid(PinId::new(192)));
    }

    #[test]
    fn irq_valid_mask() {
        let pins: Vec<u32> = AST2500_CONFIG.irq_valid_pins().map(u32::from).collect();
        assert_eq!(pins, (96..176).collect::<Vec<_>>());
    }
}
