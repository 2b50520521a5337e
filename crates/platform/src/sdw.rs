//! SoundWire slave abstractions
//!
//! The slice of the SoundWire bus core a peripheral driver talks to:
//!
//! ```text
//! bus core ──update_status/bus_config/port_prep──▶ SdwSlaveOps (driver)
//! driver   ──read/write/stream_add_slave─────────▶ SdwBus      (bus core)
//! ```
//!
//! Register addresses are 32-bit, values are one byte. The bus core owns
//! paging and retries; a failed transaction is reported once.

use bitflags::bitflags;

use crate::pcm::StreamDirection;

/// Highest data port number on a SoundWire peripheral.
pub const MAX_PORT: u8 = 14;

/// Upper bound on DPn property entries per direction.
pub const MAX_DPN_PROPS: usize = 4;

// ── Identification ───────────────────────────────────────────────────────────

/// SoundWire device id table entry (`struct sdw_device_id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SdwDeviceId {
    /// MIPI manufacturer id.
    pub mfg_id: u16,
    /// Vendor part id.
    pub part_id: u16,
    /// SoundWire version, `0` matches any.
    pub sdw_version: u8,
    /// Device class id.
    pub class_id: u8,
}

impl SdwDeviceId {
    /// `SDW_SLAVE_ENTRY(mfg, part, class)`: any SoundWire version.
    #[must_use]
    pub const fn slave_entry(mfg_id: u16, part_id: u16, class_id: u8) -> Self {
        Self {
            mfg_id,
            part_id,
            sdw_version: 0,
            class_id,
        }
    }

    /// Whether an enumerated device matches this table entry.
    #[must_use]
    pub fn matches(&self, dev: &SdwDeviceId) -> bool {
        self.mfg_id == dev.mfg_id
            && self.part_id == dev.part_id
            && self.class_id == dev.class_id
            && (self.sdw_version == 0 || self.sdw_version == dev.sdw_version)
    }
}

// ── Status and properties ───────────────────────────────────────────────────

/// Enumeration status reported by the bus core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlaveStatus {
    /// Lost sync or never enumerated.
    Unattached,
    /// Enumerated and assigned a device number.
    Attached,
    /// Attached with a pending interrupt.
    Alert,
}

/// Bitmask of data ports, bit `n` = DPn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortMask(u32);

impl PortMask {
    /// No ports.
    pub const EMPTY: Self = Self(0);

    /// Mask with a single port set. Port numbers above [`MAX_PORT`] yield an empty mask.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)] // num <= MAX_PORT < 32
    pub const fn port(num: u8) -> Self {
        if num > MAX_PORT {
            Self(0)
        } else {
            Self(1 << num)
        }
    }

    /// Add a port.
    #[must_use]
    pub const fn with(self, num: u8) -> Self {
        Self(self.0 | Self::port(num).0)
    }

    /// Remove a port.
    #[must_use]
    pub const fn without(self, num: u8) -> Self {
        Self(self.0 & !Self::port(num).0)
    }

    /// Whether `num` is in the mask.
    #[must_use]
    pub const fn contains(self, num: u8) -> bool {
        self.0 & Self::port(num).0 != 0
    }

    /// Whether no port is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw mask.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

bitflags! {
    /// `SCP_INT1` interrupt sources a peripheral asks the host to unmask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ScpIntMask: u8 {
        /// Parity error.
        const PARITY = 1 << 0;
        /// Bus clash.
        const BUS_CLASH = 1 << 1;
        /// Implementation-defined interrupt.
        const IMPL_DEF = 1 << 2;
        /// Cascade from SCP_INT2.
        const SCP2_CASCADE = 1 << 7;
    }
}

/// Data port 0 (control/bulk) properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dp0Properties {
    /// Maximum word length.
    pub max_word: u8,
    /// Minimum word length.
    pub min_word: u8,
    /// Bulk register access flow control.
    pub bra_flow_controlled: bool,
    /// Simplified channel prepare state machine.
    pub simple_ch_prep_sm: bool,
    /// DP0 raises implementation-defined interrupts.
    pub imp_def_interrupts: bool,
}

/// Data port n properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DpnProperties {
    /// Port number.
    pub num: u8,
    /// Maximum word length.
    pub max_word: u8,
    /// Minimum word length.
    pub min_word: u8,
    /// Maximum channel count.
    pub max_ch: u8,
    /// Minimum channel count.
    pub min_ch: u8,
    /// Simplified channel prepare state machine.
    pub simple_ch_prep_sm: bool,
    /// Channel prepare timeout in milliseconds.
    pub ch_prep_timeout_ms: u16,
    /// Implementation-defined interrupt mask.
    pub imp_def_interrupts: u8,
}

/// Everything `read_prop` reports to the bus core (`struct sdw_slave_prop`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlaveProperties {
    /// Register paging (addresses above 0x7fff) supported.
    pub paging_support: bool,
    /// Clock-stop mode 1 supported.
    pub clk_stop_mode1: bool,
    /// Simplified clock-stop prepare.
    pub simple_clk_stop_capable: bool,
    /// Clock-stop timeout in milliseconds.
    pub clk_stop_timeout_ms: u32,
    /// `SCP_INT1` sources to unmask.
    pub scp_int1_mask: ScpIntMask,
    /// DP0 properties, `None` if DP0 is not implemented.
    pub dp0: Option<Dp0Properties>,
    /// Ports carrying data from the peripheral (capture).
    pub source_ports: PortMask,
    /// Ports carrying data to the peripheral (playback).
    pub sink_ports: PortMask,
    /// One entry per source port.
    pub src_dpn: heapless::Vec<DpnProperties, MAX_DPN_PROPS>,
    /// One entry per sink port.
    pub sink_dpn: heapless::Vec<DpnProperties, MAX_DPN_PROPS>,
}

/// Bus parameters negotiated by the bus core (`struct sdw_bus_params`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusParams {
    /// Current bus clock (double data rate) in Hz.
    pub curr_dr_freq: u32,
    /// Frame columns.
    pub col: u16,
    /// Frame rows.
    pub row: u16,
    /// Register bank the parameters were programmed into.
    pub bank: u8,
}

impl BusParams {
    /// Legal frame row counts.
    pub const ROWS: core::ops::RangeInclusive<u16> = 48..=256;
    /// Legal frame column counts.
    pub const COLS: core::ops::RangeInclusive<u16> = 2..=16;

    /// Whether the clock is running and the frame shape is legal.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.curr_dr_freq != 0 && Self::ROWS.contains(&self.row) && Self::COLS.contains(&self.col)
    }
}

// ── Port preparation ────────────────────────────────────────────────────────

/// Port prepare operation (`enum sdw_port_prep_ops`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortPrepOp {
    /// Before the port is prepared.
    PrePrep,
    /// Before the port is de-prepared.
    PreDeprep,
    /// After the port is prepared.
    PostPrep,
    /// After the port is de-prepared.
    PostDeprep,
}

/// Channel prepare request (`struct sdw_prepare_ch`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PrepareChannel {
    /// Port number.
    pub num: u8,
    /// Channel mask.
    pub ch_mask: u8,
    /// Prepare (`true`) or de-prepare.
    pub prepare: bool,
    /// Register bank.
    pub bank: u8,
}

/// Per-port interrupt status handed to `interrupt_callback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlaveInterruptStatus {
    /// `SCP_INT1` bits that fired.
    pub control_port: u8,
    /// DP0..DP14 interrupt bits.
    pub port: [u8; 15],
}

// ── Streams ─────────────────────────────────────────────────────────────────

/// Data direction from the peripheral's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataDirection {
    /// Peripheral receives (sink port, playback).
    Rx,
    /// Peripheral transmits (source port, capture).
    Tx,
}

impl From<StreamDirection> for DataDirection {
    fn from(dir: StreamDirection) -> Self {
        match dir {
            StreamDirection::Playback => DataDirection::Rx,
            StreamDirection::Capture => DataDirection::Tx,
        }
    }
}

/// Handle of a bus-level stream runtime set on a DAI by the machine driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StreamHandle(pub u16);

/// Stream configuration passed when adding a slave to a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StreamConfig {
    /// Frame rate in Hz.
    pub frame_rate: u32,
    /// Channel count.
    pub ch_count: u8,
    /// Bits per sample.
    pub bps: u8,
    /// Data direction.
    pub direction: DataDirection,
}

/// Port configuration passed when adding a slave to a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortConfig {
    /// Port number.
    pub num: u8,
    /// Channel mask.
    pub ch_mask: u8,
}

// ── Traits ──────────────────────────────────────────────────────────────────

/// The bus as seen from one peripheral: register transactions and stream membership.
pub trait SdwBus {
    /// Transport error
    type Error: core::fmt::Debug;

    /// Read one register.
    async fn read(&mut self, addr: u32) -> Result<u8, Self::Error>;

    /// Write one register.
    async fn write(&mut self, addr: u32, value: u8) -> Result<(), Self::Error>;

    /// Add this peripheral's port to a stream (`sdw_stream_add_slave`).
    async fn stream_add_slave(
        &mut self,
        stream: StreamHandle,
        config: &StreamConfig,
        port: &PortConfig,
    ) -> Result<(), Self::Error>;

    /// Remove this peripheral from a stream (`sdw_stream_remove_slave`).
    async fn stream_remove_slave(&mut self, stream: StreamHandle) -> Result<(), Self::Error>;
}

/// Callbacks the bus core drives on a peripheral driver (`struct sdw_slave_ops`).
pub trait SdwSlaveOps {
    /// Error type
    type Error: core::fmt::Debug;

    /// Report peripheral properties.
    async fn read_prop(&self) -> Result<SlaveProperties, Self::Error>;

    /// Enumeration status changed.
    async fn update_status(&self, status: SlaveStatus) -> Result<(), Self::Error>;

    /// New bus parameters were programmed.
    async fn bus_config(&self, params: &BusParams) -> Result<(), Self::Error>;

    /// Port prepare/de-prepare notification.
    async fn port_prep(&self, ch: &PrepareChannel, op: PortPrepOp) -> Result<(), Self::Error>;

    /// Peripheral interrupt; called from process context.
    async fn interrupt_callback(&self, status: &SlaveInterruptStatus) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slave_entry_matches_any_version() {
        let entry = SdwDeviceId::slave_entry(0x04b3, 0x9356, 0);
        let dev = SdwDeviceId {
            sdw_version: 3,
            ..entry
        };
        assert!(entry.matches(&dev));
    }

    #[test]
    fn slave_entry_rejects_other_part() {
        let entry = SdwDeviceId::slave_entry(0x04b3, 0x9356, 0);
        assert!(!entry.matches(&SdwDeviceId::slave_entry(0x04b3, 0x9357, 0)));
        assert!(!entry.matches(&SdwDeviceId::slave_entry(0x025d, 0x9356, 0)));
        assert!(!entry.matches(&SdwDeviceId::slave_entry(0x04b3, 0x9356, 1)));
    }

    #[test]
    fn port_mask_ops() {
        let mask = PortMask::EMPTY.with(1).with(2);
        assert_eq!(mask.bits(), 0b110);
        assert!(mask.contains(1));
        assert!(!mask.contains(3));
        assert!(mask.without(1).without(2).is_empty());
        assert!(PortMask::port(MAX_PORT + 1).is_empty());
        assert!(!mask.contains(40));
    }

    #[test]
    fn bus_params_validity() {
        let good = BusParams {
            curr_dr_freq: 9_600_000,
            col: 4,
            row: 50,
            bank: 0,
        };
        assert!(good.is_valid());
        assert!(!BusParams { curr_dr_freq: 0, ..good }.is_valid());
        assert!(!BusParams { row: 10, ..good }.is_valid());
        assert!(!BusParams { col: 1, ..good }.is_valid());
    }

    #[test]
    fn playback_is_rx() {
        assert_eq!(DataDirection::from(StreamDirection::Playback), DataDirection::Rx);
        assert_eq!(DataDirection::from(StreamDirection::Capture), DataDirection::Tx);
    }
}
