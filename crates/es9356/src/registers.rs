//! ES9356 register map
//!
//! Addresses are 32-bit, values one byte, every register accessed with a
//! single bus transaction.
//!
//! # Layout
//!
//! | Range             | Contents                                         |
//! |-------------------|--------------------------------------------------|
//! | `0x0040..=0x0070` | SCP (control port) registers, incl. `DevId_0..5` |
//! | `0x0100..=0x0137` | Data port 1: playback sink                       |
//! | `0x0200..=0x0237` | Data port 2: capture source                      |
//! | `0x3000..=0x30FF` | Implementation-defined codec registers           |
//!
//! SCP and DPn registers belong to the bus core; the driver reads the
//! identity bytes and otherwise only touches the codec block.
//!
//! # Identity
//!
//! `SCP_DevId_1/2` hold the MIPI manufacturer id (0x04B3, Everest
//! Semiconductor) and `SCP_DevId_3/4` the part id (0x9356), high byte first.

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// Page 0x00: SCP registers
pub const PAGE_00: u32 = 0x0000;
/// Page 0x01: DP1
pub const PAGE_01: u32 = 0x0100;
/// Page 0x02: DP2
pub const PAGE_02: u32 = 0x0200;

/// Highest valid register address.
pub const MAX_REGISTER: u32 = 0xFF01;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Manufacturer id, high byte (`SCP_DevId_1`)
pub const MANID_AB: u32 = PAGE_00 + 0x51;
/// Manufacturer id, low byte (`SCP_DevId_2`)
pub const MANID_CD: u32 = PAGE_00 + 0x52;
/// Part id, high byte (`SCP_DevId_3`)
pub const DEVID_AB: u32 = PAGE_00 + 0x53;
/// Part id, low byte (`SCP_DevId_4`)
pub const DEVID_CD: u32 = PAGE_00 + 0x54;

/// Expected manufacturer id.
pub const MANUFACTURER_ID: u16 = 0x04B3;
/// Expected part id.
pub const PART_ID: u16 = 0x9356;
/// Device class.
pub const CLASS_ID: u8 = 0;

/// Chip id as printed on the part.
pub const CHIP_ID: u32 = 9356;

// ---------------------------------------------------------------------------
// Codec block
// ---------------------------------------------------------------------------

/// First implementation-defined register.
pub const VENDOR_BASE: u32 = 0x3000;
/// Last implementation-defined register.
pub const VENDOR_END: u32 = 0x30FF;

/// Soft reset. Bit 0 starts a reset; the driver clears it again.
pub const REG_SOFT_RESET: u32 = VENDOR_BASE;

/// Clock manager
///
/// - bit 0: MCLK input enable
/// - bit 1: system clock from PLL (`0` = straight from MCLK)
/// - bit 4: DAC path clock
/// - bit 5: ADC path clock
pub const REG_CLK_MGR: u32 = VENDOR_BASE + 0x01;

/// PLL configuration word (divider selection, board specific).
pub const REG_PLL_CFG: u32 = VENDOR_BASE + 0x02;

/// Sample-rate select, bits \[3:0\], see [`rate_code`].
pub const REG_FS_SEL: u32 = VENDOR_BASE + 0x03;

/// Bit clock ratio select, bits \[1:0\], see [`bclk_ratio_code`].
pub const REG_BCLK_RATIO: u32 = VENDOR_BASE + 0x04;

/// DAC word length, bits \[1:0\], see [`word_length_code`].
pub const REG_DAC_FMT: u32 = VENDOR_BASE + 0x10;

/// DAC channel mode, bit 0 set = stereo.
pub const REG_DAC_CH: u32 = VENDOR_BASE + 0x11;

/// DAC mute
///
/// - bit 0: left mute
/// - bit 1: right mute
/// - bit 7: soft ramp on mute transitions
pub const REG_DAC_MUTE: u32 = VENDOR_BASE + 0x12;

/// DAC digital volume, left (0x00 = 0 dB, 0.5 dB/step attenuation).
pub const REG_DAC_VOL_L: u32 = VENDOR_BASE + 0x13;

/// DAC digital volume, right.
pub const REG_DAC_VOL_R: u32 = VENDOR_BASE + 0x14;

/// ADC word length, bits \[1:0\].
pub const REG_ADC_FMT: u32 = VENDOR_BASE + 0x20;

/// ADC mute: bit 0 mute, bit 7 soft ramp.
pub const REG_ADC_MUTE: u32 = VENDOR_BASE + 0x21;

/// ADC digital volume.
pub const REG_ADC_VOL: u32 = VENDOR_BASE + 0x22;

/// Path power, one bit per DAPM widget (`PWR_*`).
pub const REG_PWR_CTL: u32 = VENDOR_BASE + 0x30;

/// Interrupt status, write 1 to clear.
pub const REG_IRQ_STATUS: u32 = VENDOR_BASE + 0x40;

/// Interrupt mask, 1 = masked.
pub const REG_IRQ_MASK: u32 = VENDOR_BASE + 0x41;

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

/// Soft reset request
pub const SOFT_RESET: u8 = 0x01;

/// MCLK input enable
pub const CLK_MCLK_EN: u8 = 1 << 0;
/// System clock from PLL
pub const CLK_PLL_SEL: u8 = 1 << 1;
/// DAC path clock enable
pub const CLK_DAC_EN: u8 = 1 << 4;
/// ADC path clock enable
pub const CLK_ADC_EN: u8 = 1 << 5;

/// Sample-rate field mask
pub const FS_SEL_MASK: u8 = 0x0F;
/// Bit clock ratio field mask
pub const BCLK_RATIO_MASK: u8 = 0x03;
/// Word length field mask
pub const WORD_LENGTH_MASK: u8 = 0x03;
/// Stereo DAC
pub const DAC_CH_STEREO: u8 = 0x01;

/// DAC left + right mute bits
pub const DAC_MUTE_LR: u8 = 0x03;
/// ADC mute bit
pub const ADC_MUTE: u8 = 0x01;
/// Soft ramp on mute transitions
pub const MUTE_SOFT_RAMP: u8 = 0x80;

/// DAC power bit position in [`REG_PWR_CTL`]
pub const PWR_DAC_SHIFT: u8 = 0;
/// Headphone amplifier power bit position
pub const PWR_HP_SHIFT: u8 = 1;
/// ADC power bit position
pub const PWR_ADC_SHIFT: u8 = 2;
/// Microphone bias power bit position
pub const PWR_MICBIAS_SHIFT: u8 = 3;
/// Every path power bit
pub const PWR_ALL: u8 = 0x0F;

/// PLL lost lock
pub const IRQ_PLL_UNLOCK: u8 = 1 << 0;
/// MCLK missing or out of range
pub const IRQ_CLK_ERR: u8 = 1 << 1;
/// Headphone output short
pub const IRQ_HP_SHORT: u8 = 1 << 2;
/// Thermal warning
pub const IRQ_THERMAL: u8 = 1 << 3;
/// Interrupts the driver services
pub const IRQ_SERVICED: u8 = IRQ_PLL_UNLOCK | IRQ_CLK_ERR | IRQ_HP_SHORT | IRQ_THERMAL;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Register values at power-on.
///
/// SCP and DP1/DP2 entries follow the bus-standard layout; the identity
/// bytes at 0x51..0x54 spell 0x04B3 / 0x9356.
pub const REG_DEFAULTS: &[(u32, u8)] = &[
    // SCP
    (0x40, 0x00),
    (0x41, 0x00),
    (0x42, 0x00),
    (0x43, 0x00),
    (0x44, 0x20),
    (0x45, 0x01),
    (0x46, 0x00),
    (0x48, 0x00),
    (0x49, 0x00),
    (0x4C, 0x00),
    (0x50, 0x20),
    (0x51, 0x04),
    (0x52, 0xB3),
    (0x53, 0x93),
    (0x54, 0x56),
    (0x55, 0x00),
    (0x60, 0x00),
    (0x70, 0x00),
    // DP1
    (0x100, 0x00),
    (0x101, 0x00),
    (0x102, 0x00),
    (0x103, 0x17),
    (0x104, 0x00),
    (0x105, 0x3F),
    (0x120, 0x00),
    (0x122, 0x5F),
    (0x123, 0x00),
    (0x124, 0x00),
    (0x125, 0x00),
    (0x126, 0x00),
    (0x127, 0x00),
    (0x130, 0x00),
    (0x132, 0x00),
    (0x133, 0x00),
    (0x134, 0x00),
    (0x135, 0x00),
    (0x136, 0x00),
    (0x137, 0x00),
    // DP2
    (0x200, 0x00),
    (0x201, 0x00),
    (0x202, 0x20),
    (0x203, 0x17),
    (0x204, 0x00),
    (0x205, 0x0F),
    (0x220, 0x00),
    (0x222, 0x5F),
    (0x223, 0x00),
    (0x224, 0x00),
    (0x225, 0x00),
    (0x226, 0x00),
    (0x227, 0x00),
    (0x230, 0x00),
    (0x231, 0x00),
    (0x232, 0x00),
    (0x233, 0x00),
    (0x234, 0x00),
    (0x235, 0x00),
    (0x236, 0x00),
    (0x237, 0x00),
    // Codec block
    (REG_SOFT_RESET, 0x00),
    (REG_CLK_MGR, CLK_MCLK_EN),
    (REG_PLL_CFG, 0x00),
    (REG_FS_SEL, 0x06),
    (REG_BCLK_RATIO, 0x02),
    (REG_DAC_FMT, 0x00),
    (REG_DAC_CH, DAC_CH_STEREO),
    (REG_DAC_MUTE, MUTE_SOFT_RAMP | DAC_MUTE_LR),
    (REG_DAC_VOL_L, 0x00),
    (REG_DAC_VOL_R, 0x00),
    (REG_ADC_FMT, 0x00),
    (REG_ADC_MUTE, MUTE_SOFT_RAMP | ADC_MUTE),
    (REG_ADC_VOL, 0x00),
    (REG_PWR_CTL, 0x00),
    (REG_IRQ_STATUS, 0x00),
    (REG_IRQ_MASK, 0xFF),
];

/// Whether `reg` is in the implementation-defined codec block.
#[must_use]
pub const fn is_vendor_register(reg: u32) -> bool {
    reg >= VENDOR_BASE && reg <= VENDOR_END
}

/// Whether hardware init restores the default of `reg`.
///
/// Only the codec block, minus the reset trigger and the status register.
#[must_use]
pub const fn is_init_default(reg: u32) -> bool {
    is_vendor_register(reg) && reg != REG_SOFT_RESET && reg != REG_IRQ_STATUS
}

/// Codec-block defaults the driver restores during hardware init.
pub fn codec_defaults() -> impl Iterator<Item = (u32, u8)> {
    REG_DEFAULTS
        .iter()
        .copied()
        .filter(|&(reg, _)| is_init_default(reg))
}

/// Power-on default for `reg`, if the table lists one.
#[must_use]
pub fn default_value(reg: u32) -> Option<u8> {
    REG_DEFAULTS
        .iter()
        .find(|&&(r, _)| r == reg)
        .map(|&(_, v)| v)
}

// ---------------------------------------------------------------------------
// Field encoders
// ---------------------------------------------------------------------------

/// [`REG_FS_SEL`] code for a sample rate, `None` for unsupported rates.
#[must_use]
pub const fn rate_code(rate: u32) -> Option<u8> {
    match rate {
        8_000 => Some(0x0),
        11_025 => Some(0x1),
        16_000 => Some(0x2),
        22_050 => Some(0x3),
        32_000 => Some(0x4),
        44_100 => Some(0x5),
        48_000 => Some(0x6),
        64_000 => Some(0x7),
        88_200 => Some(0x8),
        96_000 => Some(0x9),
        _ => None,
    }
}

/// [`REG_BCLK_RATIO`] code for a bit clock ratio (BCLK / FS).
#[must_use]
pub const fn bclk_ratio_code(ratio: u32) -> Option<u8> {
    match ratio {
        32 => Some(0x0),
        48 => Some(0x1),
        64 => Some(0x2),
        _ => None,
    }
}

/// Word length code for [`REG_DAC_FMT`] / [`REG_ADC_FMT`].
#[must_use]
pub const fn word_length_code(bits: u8) -> Option<u8> {
    match bits {
        16 => Some(0x0),
        24 => Some(0x1),
        32 => Some(0x2),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_defaults_spell_bus_ids() {
        let man = (u16::from(default_value(MANID_AB).unwrap_or(0)) << 8)
            | u16::from(default_value(MANID_CD).unwrap_or(0));
        let part = (u16::from(default_value(DEVID_AB).unwrap_or(0)) << 8)
            | u16::from(default_value(DEVID_CD).unwrap_or(0));
        assert_eq!(man, MANUFACTURER_ID);
        assert_eq!(part, PART_ID);
    }

    #[test]
    fn defaults_have_unique_addresses() {
        for (i, (reg, _)) in REG_DEFAULTS.iter().enumerate() {
            assert!(
                !REG_DEFAULTS.iter().skip(i + 1).any(|(r, _)| r == reg),
                "duplicate default for {reg:#x}"
            );
        }
    }

    #[test]
    fn defaults_within_register_space() {
        assert!(REG_DEFAULTS.iter().all(|&(reg, _)| reg <= MAX_REGISTER));
    }

    #[test]
    fn pages_are_0x100_apart() {
        assert_eq!(PAGE_01 - PAGE_00, 0x100);
        assert_eq!(PAGE_02 - PAGE_01, 0x100);
    }

    #[test]
    fn codec_defaults_skip_status_and_reset() {
        assert!(codec_defaults().all(|(reg, _)| is_vendor_register(reg)));
        assert!(!codec_defaults().any(|(reg, _)| reg == REG_IRQ_STATUS));
        assert!(!codec_defaults().any(|(reg, _)| reg == REG_SOFT_RESET));
        assert!(codec_defaults().any(|(reg, v)| reg == REG_DAC_MUTE && v & DAC_MUTE_LR == DAC_MUTE_LR));
    }

    #[test]
    fn every_supported_rate_has_a_code() {
        for rate in [8_000, 11_025, 16_000, 22_050, 32_000, 44_100, 48_000, 64_000, 88_200, 96_000] {
            assert!(rate_code(rate).is_some(), "{rate}");
        }
        assert_eq!(rate_code(192_000), None);
        assert_eq!(rate_code(REG_FS_SEL), None);
    }

    #[test]
    fn default_fs_sel_is_48k() {
        assert_eq!(default_value(REG_FS_SEL), rate_code(48_000));
    }

    #[test]
    fn word_length_codes() {
        assert_eq!(word_length_code(16), Some(0));
        assert_eq!(word_length_code(24), Some(1));
        assert_eq!(word_length_code(32), Some(2));
        assert_eq!(word_length_code(20), None);
    }

    #[test]
    fn bclk_ratio_default_is_64fs() {
        assert_eq!(default_value(REG_BCLK_RATIO), bclk_ratio_code(64));
    }
}
