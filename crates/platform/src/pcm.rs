//! PCM stream domain types.
//!
//! These mirror the parts of the ALSA PCM layer a codec DAI negotiates with:
//! - `StreamDirection` / `StreamMask`: playback and capture bookkeeping
//! - `PcmFormat` / `PcmFormats`: sample formats and the format bitmask
//! - `PcmRates` / `SampleRateHz`: discrete rate bitmask and validated rate
//! - `HwParams` / `PcmStreamCaps`: requested parameters and what a DAI accepts

use bitflags::bitflags;
use thiserror_no_std::Error;

// ── Error type ───────────────────────────────────────────────────────────────

/// Why a set of hardware parameters was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamError {
    /// Sample rate outside the declared range or rate mask.
    #[error("unsupported sample rate {0} Hz")]
    Rate(u32),
    /// Sample format not in the declared format mask.
    #[error("unsupported sample format {0:?}")]
    Format(PcmFormat),
    /// Channel count outside `channels_min..=channels_max`.
    #[error("unsupported channel count {0}")]
    Channels(u8),
}

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("{value} outside {min}..={max}")]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: u32,
    /// The inclusive minimum allowed value.
    pub min: u32,
    /// The inclusive maximum allowed value.
    pub max: u32,
}

// ── Direction ────────────────────────────────────────────────────────────────

/// PCM substream direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamDirection {
    /// Host to codec (DAC path).
    Playback,
    /// Codec to host (ADC path).
    Capture,
}

impl StreamDirection {
    /// Both directions, playback first.
    pub const ALL: [StreamDirection; 2] = [StreamDirection::Playback, StreamDirection::Capture];

    /// Index usable for per-direction arrays (`0` playback, `1` capture).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Playback => 0,
            Self::Capture => 1,
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Playback => Self::Capture,
            Self::Capture => Self::Playback,
        }
    }
}

bitflags! {
    /// Set of stream directions (stream usage, active streams).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StreamMask: u8 {
        /// Playback in use.
        const PLAYBACK = 1 << 0;
        /// Capture in use.
        const CAPTURE = 1 << 1;
    }
}

impl From<StreamDirection> for StreamMask {
    fn from(dir: StreamDirection) -> Self {
        match dir {
            StreamDirection::Playback => StreamMask::PLAYBACK,
            StreamDirection::Capture => StreamMask::CAPTURE,
        }
    }
}

// ── Formats ──────────────────────────────────────────────────────────────────

/// Linear PCM sample formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PcmFormat {
    /// Signed 8-bit.
    S8,
    /// Unsigned 8-bit.
    U8,
    /// Signed 16-bit little-endian.
    S16Le,
    /// Signed 16-bit big-endian.
    S16Be,
    /// Signed 24-bit little-endian in a 32-bit container.
    S24Le,
    /// Signed 24-bit little-endian packed in 3 bytes.
    S24Le3,
    /// Signed 32-bit little-endian.
    S32Le,
    /// 32-bit IEEE float little-endian.
    FloatLe,
}

bitflags! {
    /// Format bitmask; bit positions follow `SNDRV_PCM_FORMAT_*`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PcmFormats: u64 {
        /// `SNDRV_PCM_FORMAT_S8`
        const S8 = 1 << 0;
        /// `SNDRV_PCM_FORMAT_U8`
        const U8 = 1 << 1;
        /// `SNDRV_PCM_FORMAT_S16_LE`
        const S16_LE = 1 << 2;
        /// `SNDRV_PCM_FORMAT_S16_BE`
        const S16_BE = 1 << 3;
        /// `SNDRV_PCM_FORMAT_S24_LE`
        const S24_LE = 1 << 6;
        /// `SNDRV_PCM_FORMAT_S32_LE`
        const S32_LE = 1 << 10;
        /// `SNDRV_PCM_FORMAT_FLOAT_LE`
        const FLOAT_LE = 1 << 14;
        /// `SNDRV_PCM_FORMAT_S24_3LE`
        const S24_3LE = 1 << 32;
    }
}

impl PcmFormat {
    /// The bit this format occupies in a [`PcmFormats`] mask.
    #[must_use]
    pub const fn mask(self) -> PcmFormats {
        match self {
            Self::S8 => PcmFormats::S8,
            Self::U8 => PcmFormats::U8,
            Self::S16Le => PcmFormats::S16_LE,
            Self::S16Be => PcmFormats::S16_BE,
            Self::S24Le => PcmFormats::S24_LE,
            Self::S24Le3 => PcmFormats::S24_3LE,
            Self::S32Le => PcmFormats::S32_LE,
            Self::FloatLe => PcmFormats::FLOAT_LE,
        }
    }

    /// Significant bits per sample.
    #[must_use]
    pub const fn width(self) -> u8 {
        match self {
            Self::S8 | Self::U8 => 8,
            Self::S16Le | Self::S16Be => 16,
            Self::S24Le | Self::S24Le3 => 24,
            Self::S32Le | Self::FloatLe => 32,
        }
    }

    /// Bits a sample occupies in memory/on the wire.
    #[must_use]
    pub const fn physical_width(self) -> u8 {
        match self {
            Self::S8 | Self::U8 => 8,
            Self::S16Le | Self::S16Be => 16,
            Self::S24Le3 => 24,
            Self::S24Le | Self::S32Le | Self::FloatLe => 32,
        }
    }
}

// ── Rates ────────────────────────────────────────────────────────────────────

bitflags! {
    /// Discrete rate bitmask; bit positions follow `SNDRV_PCM_RATE_*`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PcmRates: u32 {
        /// 5512 Hz
        const RATE_5512 = 1 << 0;
        /// 8 kHz
        const RATE_8000 = 1 << 1;
        /// 11.025 kHz
        const RATE_11025 = 1 << 2;
        /// 16 kHz
        const RATE_16000 = 1 << 3;
        /// 22.05 kHz
        const RATE_22050 = 1 << 4;
        /// 32 kHz
        const RATE_32000 = 1 << 5;
        /// 44.1 kHz
        const RATE_44100 = 1 << 6;
        /// 48 kHz
        const RATE_48000 = 1 << 7;
        /// 64 kHz
        const RATE_64000 = 1 << 8;
        /// 88.2 kHz
        const RATE_88200 = 1 << 9;
        /// 96 kHz
        const RATE_96000 = 1 << 10;
        /// 176.4 kHz
        const RATE_176400 = 1 << 11;
        /// 192 kHz
        const RATE_192000 = 1 << 12;

        /// `SNDRV_PCM_RATE_8000_96000`
        const RATE_8000_96000 = Self::RATE_8000.bits()
            | Self::RATE_11025.bits()
            | Self::RATE_16000.bits()
            | Self::RATE_22050.bits()
            | Self::RATE_32000.bits()
            | Self::RATE_44100.bits()
            | Self::RATE_48000.bits()
            | Self::RATE_64000.bits()
            | Self::RATE_88200.bits()
            | Self::RATE_96000.bits();
    }
}

/// Rate-in-Hz to mask-bit table, ascending.
const RATE_TABLE: [(u32, PcmRates); 13] = [
    (5_512, PcmRates::RATE_5512),
    (8_000, PcmRates::RATE_8000),
    (11_025, PcmRates::RATE_11025),
    (16_000, PcmRates::RATE_16000),
    (22_050, PcmRates::RATE_22050),
    (32_000, PcmRates::RATE_32000),
    (44_100, PcmRates::RATE_44100),
    (48_000, PcmRates::RATE_48000),
    (64_000, PcmRates::RATE_64000),
    (88_200, PcmRates::RATE_88200),
    (96_000, PcmRates::RATE_96000),
    (176_400, PcmRates::RATE_176400),
    (192_000, PcmRates::RATE_192000),
];

impl PcmRates {
    /// Mask bit for a rate in Hz, `None` for rates without a bit (continuous/knot).
    #[must_use]
    pub fn from_hz(hz: u32) -> Option<Self> {
        RATE_TABLE
            .iter()
            .find(|(rate, _)| *rate == hz)
            .map(|(_, bit)| *bit)
    }

    /// Iterate the rates in this mask in Hz, ascending.
    pub fn iter_hz(self) -> impl Iterator<Item = u32> {
        RATE_TABLE
            .iter()
            .filter(move |(_, bit)| self.contains(*bit))
            .map(|(rate, _)| *rate)
    }
}

/// Sample rate in Hz, validated against a DAI's declared range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct SampleRateHz(u32);

impl SampleRateHz {
    /// Create a `SampleRateHz` within `min..=max`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `hz` is outside `min..=max`.
    pub fn new_in(hz: u32, min: u32, max: u32) -> Result<Self, OutOfRangeError> {
        if hz < min || hz > max {
            Err(OutOfRangeError { value: hz, min, max })
        } else {
            Ok(Self(hz))
        }
    }

    /// Return the sample rate in Hz.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

// ── Parameters and capabilities ─────────────────────────────────────────────

/// Hardware parameters requested for one substream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HwParams {
    /// Frame rate in Hz.
    pub rate: u32,
    /// Sample format.
    pub format: PcmFormat,
    /// Channel count.
    pub channels: u8,
}

impl HwParams {
    /// Convenience constructor.
    #[must_use]
    pub const fn new(rate: u32, format: PcmFormat, channels: u8) -> Self {
        Self {
            rate,
            format,
            channels,
        }
    }
}

/// What one direction of a DAI accepts (`struct snd_soc_pcm_stream`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmStreamCaps {
    /// Stream name, matched by DAPM AIF widgets.
    pub stream_name: &'static str,
    /// Minimum channel count.
    pub channels_min: u8,
    /// Maximum channel count.
    pub channels_max: u8,
    /// Discrete rates accepted.
    pub rates: PcmRates,
    /// Lowest rate in Hz.
    pub rate_min: u32,
    /// Highest rate in Hz.
    pub rate_max: u32,
    /// Formats accepted.
    pub formats: PcmFormats,
}

impl PcmStreamCaps {
    /// Check `params` against these capabilities.
    ///
    /// Rate is checked first, then format, then channels.
    pub fn validate(&self, params: &HwParams) -> Result<(), ParamError> {
        SampleRateHz::new_in(params.rate, self.rate_min, self.rate_max)
            .map_err(|e| ParamError::Rate(e.value))?;
        match PcmRates::from_hz(params.rate) {
            Some(bit) if self.rates.contains(bit) => {}
            _ => return Err(ParamError::Rate(params.rate)),
        }
        if !self.formats.contains(params.format.mask()) {
            return Err(ParamError::Format(params.format));
        }
        if params.channels < self.channels_min || params.channels > self.channels_max {
            return Err(ParamError::Channels(params.channels));
        }
        Ok(())
    }
}
