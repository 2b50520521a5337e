//! Per-device state.
//!
//! Plain data guarded by the device mutex. Nothing here touches the bus;
//! the callbacks read and update it, then write registers from it.

use platform::{BusParams, HwParams, PortMask, StreamDirection, StreamHandle, StreamMask};

use crate::registers::{
    ADC_MUTE, CLK_ADC_EN, CLK_DAC_EN, DAC_MUTE_LR, MUTE_SOFT_RAMP, REG_ADC_MUTE, REG_DAC_MUTE,
};

/// Bus slave lifecycle.
///
/// ```text
/// Unattached ──attach──▶ Attached ──bus_config──▶ Configured ──PostPrep──▶ Streaming
///      ▲                                              ▲                        │
///      └────────────── any state on Unattached        └────── PostDeprep ──────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlaveState {
    /// Not enumerated.
    #[default]
    Unattached,
    /// Enumerated, bus parameters not yet applied.
    Attached,
    /// Bus parameters applied.
    Configured,
    /// At least one data port prepared.
    Streaming,
}

impl SlaveState {
    /// Whether the bus has enumerated the device.
    #[must_use]
    pub const fn is_attached(self) -> bool {
        !matches!(self, Self::Unattached)
    }

    /// Whether `bus_config` has run.
    #[must_use]
    pub const fn is_configured(self) -> bool {
        matches!(self, Self::Configured | Self::Streaming)
    }
}

/// One direction of the DAI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionState {
    /// Bus stream bound by `set_stream`.
    pub stream: Option<StreamHandle>,
    /// Stream this direction's port was added to by `hw_params`.
    pub port_stream: Option<StreamHandle>,
    /// Parameters applied by `hw_params`.
    pub params: Option<HwParams>,
    /// `prepare` ran since the last `hw_params`.
    pub prepared: bool,
    /// Desired digital mute.
    pub muted: bool,
}

impl DirectionState {
    const INIT: Self = Self {
        stream: None,
        port_stream: None,
        params: None,
        prepared: false,
        muted: true,
    };
}

/// Copyable view of the device state for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Lifecycle state.
    pub slave_state: SlaveState,
    /// Directions opened by `startup`.
    pub stream_use: StreamMask,
    /// Shared sample rate, `0` when no direction holds params.
    pub sample_rate: u32,
    /// BCLK/FS ratio, `0` when no direction holds params.
    pub bclk_ratio: u32,
    /// Suspended by system or runtime PM.
    pub suspended: bool,
    /// Hardware init ran since the last attach.
    pub hw_init: bool,
    /// Last vendor interrupt status seen.
    pub last_irq_status: u8,
    /// Data ports allocated by `PrePrep`.
    pub ports: PortMask,
    /// Allocated ports past `PreDeprep`.
    pub stopping: PortMask,
}

/// Mutable device state.
#[derive(Debug, Clone)]
pub struct DeviceState {
    /// Lifecycle state.
    pub slave: SlaveState,
    /// Parameters from the last `bus_config`.
    pub bus_params: Option<BusParams>,
    /// Ports allocated by `PrePrep`.
    pub ports: PortMask,
    /// Allocated ports past `PreDeprep`, released by `PostDeprep`.
    pub stopping: PortMask,
    /// Directions opened by `startup`.
    pub stream_use: StreamMask,
    dirs: [DirectionState; 2],
    /// Shared sample rate in Hz.
    pub sample_rate: u32,
    /// BCLK/FS ratio.
    pub bclk_ratio: u32,
    /// Clock manager value last written.
    pub clk_mgr: u8,
    /// Suspended by system or runtime PM.
    pub suspended: bool,
    /// Hardware init ran since the last attach.
    pub hw_init: bool,
    /// Last vendor interrupt status seen.
    pub last_irq_status: u8,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceState {
    /// Freshly probed device: unattached, both directions idle and muted.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slave: SlaveState::Unattached,
            bus_params: None,
            ports: PortMask::EMPTY,
            stopping: PortMask::EMPTY,
            stream_use: StreamMask::empty(),
            dirs: [DirectionState::INIT; 2],
            sample_rate: 0,
            bclk_ratio: 0,
            clk_mgr: 0,
            suspended: false,
            hw_init: false,
            last_irq_status: 0,
        }
    }

    /// State of one direction.
    #[must_use]
    pub fn dir(&self, dir: StreamDirection) -> &DirectionState {
        let [playback, capture] = &self.dirs;
        match dir {
            StreamDirection::Playback => playback,
            StreamDirection::Capture => capture,
        }
    }

    /// Mutable state of one direction.
    pub fn dir_mut(&mut self, dir: StreamDirection) -> &mut DirectionState {
        let [playback, capture] = &mut self.dirs;
        match dir {
            StreamDirection::Playback => playback,
            StreamDirection::Capture => capture,
        }
    }

    /// Rate `dir` is running at, if it holds params.
    #[must_use]
    pub fn rate_of(&self, dir: StreamDirection) -> Option<u32> {
        self.dir(dir).params.map(|p| p.rate)
    }

    /// Directions that ran `prepare`.
    #[must_use]
    pub fn prepared(&self) -> StreamMask {
        StreamDirection::ALL
            .into_iter()
            .filter(|&d| self.dir(d).prepared)
            .fold(StreamMask::empty(), |mask, d| mask | StreamMask::from(d))
    }

    /// Whether any direction holds params.
    #[must_use]
    pub fn has_params(&self) -> bool {
        StreamDirection::ALL
            .into_iter()
            .any(|d| self.dir(d).params.is_some())
    }

    /// Forget `dir`'s applied params and drop its path clock.
    ///
    /// The shared rate and BCLK ratio reset once neither direction holds
    /// params. Returns whether the path was prepared.
    pub fn clear_params(&mut self, dir: StreamDirection) -> bool {
        let d = self.dir_mut(dir);
        d.params = None;
        let was_prepared = core::mem::replace(&mut d.prepared, false);
        self.clk_mgr &= !path_clock(dir);
        if !self.has_params() {
            self.sample_rate = 0;
            self.bclk_ratio = 0;
        }
        was_prepared
    }

    /// Path clock bits for the prepared directions.
    #[must_use]
    pub fn path_clocks(&self) -> u8 {
        StreamDirection::ALL
            .into_iter()
            .filter(|&d| self.dir(d).prepared)
            .fold(0, |bits, d| bits | path_clock(d))
    }

    /// Mute register and the full value matching the desired mute state.
    #[must_use]
    pub fn mute_reg(&self, dir: StreamDirection) -> (u32, u8) {
        let muted = self.dir(dir).muted;
        match dir {
            StreamDirection::Playback => {
                (REG_DAC_MUTE, MUTE_SOFT_RAMP | if muted { DAC_MUTE_LR } else { 0 })
            }
            StreamDirection::Capture => {
                (REG_ADC_MUTE, MUTE_SOFT_RAMP | if muted { ADC_MUTE } else { 0 })
            }
        }
    }

    /// Forget everything tied to the bus link.
    pub fn detach(&mut self) {
        self.slave = SlaveState::Unattached;
        self.bus_params = None;
        self.ports = PortMask::EMPTY;
        self.stopping = PortMask::EMPTY;
        self.hw_init = false;
    }

    /// Copyable view.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            slave_state: self.slave,
            stream_use: self.stream_use,
            sample_rate: self.sample_rate,
            bclk_ratio: self.bclk_ratio,
            suspended: self.suspended,
            hw_init: self.hw_init,
            last_irq_status: self.last_irq_status,
            ports: self.ports,
            stopping: self.stopping,
        }
    }
}

/// Clock manager bit gating one path.
#[must_use]
pub const fn path_clock(dir: StreamDirection) -> u8 {
    match dir {
        StreamDirection::Playback => CLK_DAC_EN,
        StreamDirection::Capture => CLK_ADC_EN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::PcmFormat;

    #[test]
    fn new_device_is_unattached_and_muted() {
        let st = DeviceState::new();
        assert_eq!(st.slave, SlaveState::Unattached);
        assert!(st.dir(StreamDirection::Playback).muted);
        assert!(st.dir(StreamDirection::Capture).muted);
        assert!(st.stream_use.is_empty());
        assert!(!st.has_params());
    }

    #[test]
    fn mute_reg_full_values() {
        let mut st = DeviceState::new();
        assert_eq!(st.mute_reg(StreamDirection::Playback), (REG_DAC_MUTE, 0x83));
        assert_eq!(st.mute_reg(StreamDirection::Capture), (REG_ADC_MUTE, 0x81));
        st.dir_mut(StreamDirection::Playback).muted = false;
        assert_eq!(st.mute_reg(StreamDirection::Playback), (REG_DAC_MUTE, 0x80));
    }

    #[test]
    fn prepared_and_clocks_follow_directions() {
        let mut st = DeviceState::new();
        assert!(st.prepared().is_empty());
        st.dir_mut(StreamDirection::Capture).prepared = true;
        assert_eq!(st.prepared(), StreamMask::CAPTURE);
        assert_eq!(st.path_clocks(), CLK_ADC_EN);
        st.dir_mut(StreamDirection::Playback).prepared = true;
        assert_eq!(st.path_clocks(), CLK_ADC_EN | CLK_DAC_EN);
    }

    #[test]
    fn detach_keeps_stream_bookkeeping() {
        let mut st = DeviceState::new();
        st.slave = SlaveState::Streaming;
        st.ports = PortMask::port(1);
        st.stopping = PortMask::port(1);
        st.hw_init = true;
        st.stream_use = StreamMask::PLAYBACK;
        st.dir_mut(StreamDirection::Playback).params =
            Some(HwParams::new(48_000, PcmFormat::S16Le, 2));
        st.detach();
        assert_eq!(st.slave, SlaveState::Unattached);
        assert!(st.ports.is_empty());
        assert!(st.stopping.is_empty());
        assert!(!st.hw_init);
        assert_eq!(st.stream_use, StreamMask::PLAYBACK);
        assert_eq!(st.rate_of(StreamDirection::Playback), Some(48_000));
    }

    #[test]
    fn clear_params_keeps_shared_rate_while_other_direction_holds_params() {
        let mut st = DeviceState::new();
        for dir in StreamDirection::ALL {
            st.dir_mut(dir).params = Some(HwParams::new(48_000, PcmFormat::S16Le, 1));
        }
        st.dir_mut(StreamDirection::Playback).prepared = true;
        st.clk_mgr = CLK_DAC_EN | CLK_ADC_EN;
        st.sample_rate = 48_000;
        st.bclk_ratio = 32;

        assert!(st.clear_params(StreamDirection::Playback));
        assert_eq!(st.clk_mgr, CLK_ADC_EN);
        assert_eq!(st.sample_rate, 48_000);

        assert!(!st.clear_params(StreamDirection::Capture));
        assert_eq!(st.sample_rate, 0);
        assert_eq!(st.bclk_ratio, 0);
        assert!(!st.has_params());
    }

    #[test]
    fn lifecycle_predicates() {
        assert!(!SlaveState::Unattached.is_attached());
        assert!(SlaveState::Attached.is_attached());
        assert!(!SlaveState::Attached.is_configured());
        assert!(SlaveState::Streaming.is_configured());
    }
}
