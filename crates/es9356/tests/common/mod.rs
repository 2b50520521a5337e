//! Shared fixtures: a probed codec on a simulated bus.
#![allow(dead_code, clippy::unwrap_used)]

use es9356::registers::REG_DEFAULTS;
use es9356::{Es9356, Es9356Config, ProbeResources};
use platform::mocks::{MockRegistry, RecordingDelay, SimulatedSdwBus};
use platform::{
    BusParams, DaiOps, SdwDeviceId, SdwSlaveOps, SlaveStatus, StreamDirection, StreamHandle,
};

pub type Codec = Es9356<SimulatedSdwBus>;

pub const PLAYBACK_STREAM: StreamHandle = StreamHandle(1);
pub const CAPTURE_STREAM: StreamHandle = StreamHandle(2);

pub const BUS: BusParams = BusParams {
    curr_dr_freq: 9_600_000,
    col: 4,
    row: 50,
    bank: 0,
};

pub fn id() -> SdwDeviceId {
    SdwDeviceId::slave_entry(0x04b3, 0x9356, 0)
}

/// Simulated codec holding its power-on register values.
pub fn sim() -> SimulatedSdwBus {
    SimulatedSdwBus::with_registers(REG_DEFAULTS)
}

/// Probed, not yet attached.
pub async fn probed(sim: &SimulatedSdwBus) -> (Codec, MockRegistry) {
    let mut registry = MockRegistry::new();
    let codec = Es9356::probe(
        sim.clone(),
        id(),
        ProbeResources::new(RecordingDelay::new()),
        &mut registry,
        Es9356Config::default(),
    )
    .await
    .unwrap();
    (codec, registry)
}

/// Probed, attached and bus-configured; transaction log cleared.
pub async fn configured(sim: &SimulatedSdwBus) -> Codec {
    let (codec, _registry) = probed(sim).await;
    codec.update_status(SlaveStatus::Attached).await.unwrap();
    codec.bus_config(&BUS).await.unwrap();
    sim.clear_log();
    codec
}

/// `startup` + `set_stream` for one direction.
pub async fn open(codec: &Codec, dir: StreamDirection) {
    let stream = match dir {
        StreamDirection::Playback => PLAYBACK_STREAM,
        StreamDirection::Capture => CAPTURE_STREAM,
    };
    codec.startup(dir).await.unwrap();
    codec.set_stream(dir, Some(stream)).await.unwrap();
}
