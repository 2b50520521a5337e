//! Driver identity and board configuration.

/// Bus driver name.
pub const DRIVER_NAME: &str = "es9356-sdw";
/// Module description.
pub const MODULE_DESCRIPTION: &str = "ASoC ES9356 SoundWire driver";
/// Module author.
pub const MODULE_AUTHOR: &str = "Edgar Lai <laichengjie@everest-semi.com>";
/// Module license.
pub const MODULE_LICENSE: &str = "GPL";
/// Namespace companion drivers import to call [`crate::es9356_mute_stream`].
pub const SYMBOL_NAMESPACE: &str = "SND_SOC_ES9356_CORE";

/// Component name registered with the audio framework.
pub const COMPONENT_NAME: &str = "es9356-codec";
/// DAI name.
pub const DAI_NAME: &str = "es9356-aif";
/// Playback stream name (matched by the `DP1RX` widget).
pub const PLAYBACK_STREAM: &str = "Playback";
/// Capture stream name (matched by the `DP2TX` widget).
pub const CAPTURE_STREAM: &str = "Capture";

/// Number of supplies the codec needs.
pub const NUM_SUPPLIES: usize = 5;

/// Default supply names.
pub const DEFAULT_SUPPLIES: [&str; NUM_SUPPLIES] = ["vdd-cp", "vdd-pll", "vdd-hp", "vdd-io", "vdd-a"];

/// Board-level configuration.
///
/// ```
/// use es9356::Es9356Config;
///
/// let cfg = Es9356Config::default().with_bclk_ratio(32).with_pll(0x21);
/// assert_eq!(cfg.pll_config, Some(0x21));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Es9356Config {
    /// Minimum BCLK/FS ratio; raised when two sample containers need more.
    pub bclk_ratio: u32,
    /// PLL configuration word; `None` runs the system clock straight from MCLK.
    pub pll_config: Option<u8>,
    /// Reset line low time, microseconds.
    pub reset_pulse_us: u32,
    /// Time after releasing reset before the first bus access, milliseconds.
    pub reset_settle_ms: u32,
    /// Supply names.
    pub supplies: [&'static str; NUM_SUPPLIES],
}

impl Default for Es9356Config {
    fn default() -> Self {
        Self {
            bclk_ratio: 64,
            pll_config: None,
            reset_pulse_us: 100,
            reset_settle_ms: 10,
            supplies: DEFAULT_SUPPLIES,
        }
    }
}

impl Es9356Config {
    /// Set the minimum BCLK ratio.
    #[must_use]
    pub const fn with_bclk_ratio(mut self, ratio: u32) -> Self {
        self.bclk_ratio = ratio;
        self
    }

    /// Run the system clock from the PLL with this configuration word.
    #[must_use]
    pub const fn with_pll(mut self, config: u8) -> Self {
        self.pll_config = Some(config);
        self
    }

    /// Set reset timings.
    #[must_use]
    pub const fn with_reset_timing(mut self, pulse_us: u32, settle_ms: u32) -> Self {
        self.reset_pulse_us = pulse_us;
        self.reset_settle_ms = settle_ms;
        self
    }

    /// Override supply names.
    #[must_use]
    pub const fn with_supplies(mut self, supplies: [&'static str; NUM_SUPPLIES]) -> Self {
        self.supplies = supplies;
        self
    }
}
