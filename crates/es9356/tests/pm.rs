//! System and runtime power management.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::{configured, open, probed, sim};
use es9356::registers::{
    CLK_MCLK_EN, DEVID_CD, IRQ_SERVICED, REG_ADC_MUTE, REG_CLK_MGR, REG_DAC_MUTE, REG_FS_SEL,
    REG_IRQ_MASK, REG_PWR_CTL, REG_SOFT_RESET,
};
use es9356::{Error, SlaveState};
use platform::mocks::SimBusError;
use platform::{
    DaiOps, DevPmOps, HwParams, PcmFormat, SdwSlaveOps, SlaveStatus,
    StreamDirection::{Capture, Playback},
};

#[tokio::test]
async fn suspend_refused_while_stream_open() {
    let sim = sim();
    let codec = configured(&sim).await;
    open(&codec, Playback).await;

    assert_eq!(codec.suspend().await, Err(Error::Busy));
    assert_eq!(codec.runtime_suspend().await, Err(Error::Busy));
    assert!(!codec.snapshot().await.suspended);
    assert!(codec.supplies_enabled().await);

    codec.shutdown(Playback).await.unwrap();
    codec.suspend().await.unwrap();
    assert!(codec.snapshot().await.suspended);
}

#[tokio::test]
async fn suspend_powers_down_without_bus_traffic() {
    let sim = sim();
    let codec = configured(&sim).await;

    codec.suspend().await.unwrap();
    assert!(!codec.supplies_enabled().await);
    assert!(sim.transactions().is_empty());
    assert_eq!(
        codec.read_register(REG_FS_SEL).await,
        Err(Error::CacheOnly(REG_FS_SEL))
    );
    assert_eq!(codec.startup(Playback).await, Err(Error::InvalidState));

    // Suspending twice is harmless.
    codec.suspend().await.unwrap();
}

#[tokio::test]
async fn resume_restores_register_state_after_power_loss() {
    let sim = sim();
    let codec = configured(&sim).await;
    codec.mute_stream(Playback, false).await.unwrap();
    codec.write_register(REG_FS_SEL, 0x09).await.unwrap();

    codec.suspend().await.unwrap();
    sim.power_cycle();
    codec.resume().await.unwrap();

    assert!(codec.supplies_enabled().await);
    let snap = codec.snapshot().await;
    assert!(!snap.suspended);
    assert!(snap.hw_init);
    assert_eq!(snap.slave_state, SlaveState::Configured);
    // Driver state is written back over the power-on values.
    assert_eq!(sim.peek(REG_DAC_MUTE), 0x80);
    assert_eq!(sim.peek(REG_ADC_MUTE), 0x81);
    assert_eq!(sim.peek(REG_IRQ_MASK), !IRQ_SERVICED);
    // A plain register write made before suspend is not driver state.
    assert_eq!(sim.peek(REG_FS_SEL), 0x06);

    codec.startup(Playback).await.unwrap();
}

#[tokio::test]
async fn writes_while_suspended_replay_on_resume() {
    let sim = sim();
    let codec = configured(&sim).await;
    codec.suspend().await.unwrap();

    codec.write_register(REG_FS_SEL, 0x04).await.unwrap();
    codec.write_register(REG_FS_SEL, 0x05).await.unwrap();
    codec.mute_stream(Capture, false).await.unwrap();
    assert!(sim.transactions().is_empty());

    codec.runtime_resume().await.unwrap();
    // Last write wins; each register replayed once.
    let fs: Vec<_> = sim
        .writes()
        .into_iter()
        .filter(|&(reg, _)| reg == REG_FS_SEL)
        .collect();
    assert_eq!(fs.last(), Some(&(REG_FS_SEL, 0x05)));
    assert!(!fs.contains(&(REG_FS_SEL, 0x04)));
    assert_eq!(sim.peek(REG_FS_SEL), 0x05);
    assert_eq!(sim.peek(REG_ADC_MUTE), 0x80);
}

#[tokio::test]
async fn resume_with_wrong_identity_stays_suspended() {
    let sim = sim();
    let codec = configured(&sim).await;
    codec.suspend().await.unwrap();

    sim.poke(DEVID_CD, 0x00);
    assert!(matches!(
        codec.resume().await,
        Err(Error::IdMismatch { part: 0x9300, .. })
    ));
    let snap = codec.snapshot().await;
    assert!(snap.suspended);
    assert!(!codec.supplies_enabled().await);
    assert_eq!(
        codec.read_register(REG_FS_SEL).await,
        Err(Error::CacheOnly(REG_FS_SEL))
    );

    // The right part comes back.
    sim.poke(DEVID_CD, 0x56);
    codec.resume().await.unwrap();
    assert!(!codec.snapshot().await.suspended);
}

#[tokio::test]
async fn failed_hardware_init_on_resume_powers_back_down() {
    let sim = sim();
    let codec = configured(&sim).await;
    codec.suspend().await.unwrap();

    sim.fail_on(REG_SOFT_RESET);
    assert_eq!(
        codec.resume().await,
        Err(Error::Transport(SimBusError::Fault(REG_SOFT_RESET)))
    );
    let snap = codec.snapshot().await;
    assert!(snap.suspended);
    assert!(!snap.hw_init);
    assert!(!codec.supplies_enabled().await);
    assert_eq!(
        codec.read_register(REG_FS_SEL).await,
        Err(Error::CacheOnly(REG_FS_SEL))
    );
    assert_eq!(codec.startup(Playback).await, Err(Error::InvalidState));

    sim.clear_faults();
    codec.resume().await.unwrap();
    assert!(codec.snapshot().await.hw_init);
    assert!(codec.supplies_enabled().await);
    assert_eq!(sim.peek(REG_IRQ_MASK), !IRQ_SERVICED);
}

#[tokio::test]
async fn attach_while_suspended_initialises_on_resume() {
    let sim = sim();
    let (codec, _registry) = probed(&sim).await;
    codec.update_status(SlaveStatus::Attached).await.unwrap();
    codec.runtime_suspend().await.unwrap();

    // Link drops and comes back while powered down.
    codec.update_status(SlaveStatus::Unattached).await.unwrap();
    codec.update_status(SlaveStatus::Attached).await.unwrap();
    sim.clear_log();
    let snap = codec.snapshot().await;
    assert_eq!(snap.slave_state, SlaveState::Attached);
    assert!(!snap.hw_init);

    codec.runtime_resume().await.unwrap();
    assert!(codec.snapshot().await.hw_init);
    assert!(!sim.writes().is_empty());
}

#[tokio::test]
async fn resume_while_unattached_waits_for_attach() {
    let sim = sim();
    let codec = configured(&sim).await;
    codec.suspend().await.unwrap();
    codec.update_status(SlaveStatus::Unattached).await.unwrap();

    codec.resume().await.unwrap();
    assert!(sim.transactions().is_empty());
    assert!(codec.supplies_enabled().await);
    let snap = codec.snapshot().await;
    assert!(!snap.suspended);
    assert!(!snap.hw_init);

    codec.update_status(SlaveStatus::Attached).await.unwrap();
    assert!(codec.snapshot().await.hw_init);
    assert_eq!(sim.peek(REG_IRQ_MASK), !IRQ_SERVICED);
}

#[tokio::test]
async fn resume_without_suspend_is_noop() {
    let sim = sim();
    let codec = configured(&sim).await;
    codec.resume().await.unwrap();
    codec.runtime_resume().await.unwrap();
    assert!(sim.transactions().is_empty());
}

#[tokio::test]
async fn resume_after_streaming_leaves_only_master_clock() {
    let sim = sim();
    let codec = configured(&sim).await;
    open(&codec, Playback).await;
    codec
        .hw_params(Playback, &HwParams::new(48_000, PcmFormat::S16Le, 2))
        .await
        .unwrap();
    codec.prepare(Playback).await.unwrap();
    codec.hw_free(Playback).await.unwrap();
    codec.shutdown(Playback).await.unwrap();

    codec.suspend().await.unwrap();
    sim.power_cycle();
    codec.resume().await.unwrap();
    assert_eq!(sim.peek(REG_CLK_MGR), CLK_MCLK_EN);
    assert_eq!(sim.peek(REG_PWR_CTL), 0);
}

#[tokio::test]
async fn suspend_and_startup_race_resolves_cleanly() {
    let sim = sim();
    let codec = configured(&sim).await;

    let (suspend, startup) = tokio::join!(codec.suspend(), codec.startup(Playback));
    match (suspend, startup) {
        // Suspend took the lock first.
        (Ok(()), Err(Error::InvalidState)) => {
            assert!(codec.snapshot().await.suspended);
        }
        // Startup won: the open stream blocks suspend.
        (Err(Error::Busy), Ok(())) => {
            assert!(!codec.snapshot().await.suspended);
        }
        other => panic!("inconsistent outcome {other:?}"),
    }
}
