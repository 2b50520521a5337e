//! Mock implementations for testing
//!
//! Host-side stand-ins for the collaborators a codec driver talks to:
//! a simulated SoundWire peripheral register file, a recording reset pin,
//! a delay provider that only accumulates time, and a component registry.
//! Every mock is a cheap-clone handle over shared state so a test can keep
//! one clone for assertions after moving another into the driver.

#![cfg(any(test, feature = "std"))]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::vec::Vec;

use crate::component::{ComponentDriverDesc, ComponentRegistry, RegistryError};
use crate::dai::DaiDriverDesc;
use crate::sdw::{PortConfig, SdwBus, StreamConfig, StreamHandle};

/// One logged bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Register read.
    Read(u32),
    /// Register write.
    Write(u32, u8),
}

/// Simulated transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimBusError {
    /// Injected fault on this address.
    Fault(u32),
    /// `stream_remove_slave` on a stream the peripheral is not part of.
    NotInStream(StreamHandle),
    /// Injected `stream_add_slave` refusal.
    StreamRejected(StreamHandle),
}

#[derive(Debug, Default)]
struct SimState {
    regs: BTreeMap<u32, u8>,
    reset: BTreeMap<u32, u8>,
    log: Vec<Access>,
    faults: BTreeSet<u32>,
    fail_all: bool,
    reject_streams: bool,
    streams: BTreeMap<StreamHandle, Vec<(StreamConfig, PortConfig)>>,
}

impl SimState {
    fn check(&self, addr: u32) -> Result<(), SimBusError> {
        if self.fail_all || self.faults.contains(&addr) {
            Err(SimBusError::Fault(addr))
        } else {
            Ok(())
        }
    }
}

/// Simulated SoundWire peripheral: a flat byte-wide register file.
///
/// Unwritten registers read as zero. [`power_cycle`][Self::power_cycle]
/// restores the power-on values the simulator was built with.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSdwBus {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedSdwBus {
    /// Empty register file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register file starting at (and resetting to) `power_on` values.
    pub fn with_registers(power_on: &[(u32, u8)]) -> Self {
        let sim = Self::new();
        {
            let mut st = sim.lock();
            for &(addr, val) in power_on {
                st.regs.insert(addr, val);
                st.reset.insert(addr, val);
            }
        }
        sim
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current register value without logging a transaction.
    pub fn peek(&self, addr: u32) -> u8 {
        self.lock().regs.get(&addr).copied().unwrap_or(0)
    }

    /// Set a register without logging a transaction (hardware-side change).
    pub fn poke(&self, addr: u32, value: u8) {
        self.lock().regs.insert(addr, value);
    }

    /// Lose power: every register returns to its power-on value.
    pub fn power_cycle(&self) {
        let mut st = self.lock();
        st.regs = st.reset.clone();
    }

    /// Fail every transaction touching `addr`.
    pub fn fail_on(&self, addr: u32) {
        self.lock().faults.insert(addr);
    }

    /// Fail every transaction.
    pub fn fail_all(&self, fail: bool) {
        self.lock().fail_all = fail;
    }

    /// Refuse every `stream_add_slave`.
    pub fn reject_streams(&self, reject: bool) {
        self.lock().reject_streams = reject;
    }

    /// Remove injected faults.
    pub fn clear_faults(&self) {
        let mut st = self.lock();
        st.faults.clear();
        st.fail_all = false;
        st.reject_streams = false;
    }

    /// Every transaction so far, in order.
    pub fn transactions(&self) -> Vec<Access> {
        self.lock().log.clone()
    }

    /// Every write so far, in order.
    pub fn writes(&self) -> Vec<(u32, u8)> {
        self.lock()
            .log
            .iter()
            .filter_map(|a| match *a {
                Access::Write(addr, val) => Some((addr, val)),
                Access::Read(_) => None,
            })
            .collect()
    }

    /// Forget logged transactions.
    pub fn clear_log(&self) {
        self.lock().log.clear();
    }

    /// Ports this peripheral contributes to `stream`.
    pub fn stream_ports(&self, stream: StreamHandle) -> Vec<(StreamConfig, PortConfig)> {
        self.lock().streams.get(&stream).cloned().unwrap_or_default()
    }
}

impl SdwBus for SimulatedSdwBus {
    type Error = SimBusError;

    async fn read(&mut self, addr: u32) -> Result<u8, Self::Error> {
        let mut st = self.lock();
        st.check(addr)?;
        st.log.push(Access::Read(addr));
        Ok(st.regs.get(&addr).copied().unwrap_or(0))
    }

    async fn write(&mut self, addr: u32, value: u8) -> Result<(), Self::Error> {
        let mut st = self.lock();
        st.check(addr)?;
        st.log.push(Access::Write(addr, value));
        st.regs.insert(addr, value);
        Ok(())
    }

    async fn stream_add_slave(
        &mut self,
        stream: StreamHandle,
        config: &StreamConfig,
        port: &PortConfig,
    ) -> Result<(), Self::Error> {
        let mut st = self.lock();
        if st.reject_streams {
            return Err(SimBusError::StreamRejected(stream));
        }
        st.streams.entry(stream).or_default().push((*config, *port));
        Ok(())
    }

    async fn stream_remove_slave(&mut self, stream: StreamHandle) -> Result<(), Self::Error> {
        self.lock()
            .streams
            .remove(&stream)
            .map(|_| ())
            .ok_or(SimBusError::NotInStream(stream))
    }
}

/// Output pin that records every level it is driven to.
#[derive(Debug, Clone, Default)]
pub struct RecordingPin {
    levels: Arc<Mutex<Vec<bool>>>,
}

impl RecordingPin {
    /// New pin with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Levels driven so far (`true` = high).
    pub fn history(&self) -> Vec<bool> {
        self.levels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl embedded_hal::digital::ErrorType for RecordingPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.levels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.levels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(true);
        Ok(())
    }
}

/// Delay that returns immediately and accumulates the requested time.
#[derive(Debug, Clone, Default)]
pub struct RecordingDelay {
    total_ns: Arc<AtomicU64>,
}

impl RecordingDelay {
    /// New delay with nothing accumulated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total requested delay in nanoseconds.
    pub fn total_ns(&self) -> u64 {
        self.total_ns.load(Ordering::Relaxed)
    }
}

impl embedded_hal_async::delay::DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns.fetch_add(u64::from(ns), Ordering::Relaxed);
    }
}

/// Component registry that remembers what is registered.
#[derive(Debug, Default)]
pub struct MockRegistry {
    components: Vec<(&'static str, Vec<&'static str>)>,
    /// Refuse every registration.
    pub reject: bool,
}

impl MockRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a component is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.components.iter().any(|(n, _)| *n == name)
    }

    /// DAI names registered for a component.
    pub fn dai_names(&self, name: &str) -> Vec<&'static str> {
        self.components
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, dais)| dais.clone())
            .unwrap_or_default()
    }
}

impl ComponentRegistry for MockRegistry {
    fn register_component(
        &mut self,
        component: &ComponentDriverDesc,
        dais: &[DaiDriverDesc],
    ) -> Result<(), RegistryError> {
        if self.reject {
            return Err(RegistryError::Rejected);
        }
        if self.is_registered(component.name) {
            return Err(RegistryError::AlreadyRegistered);
        }
        self.components
            .push((component.name, dais.iter().map(|d| d.name).collect()));
        Ok(())
    }

    fn unregister_component(&mut self, name: &str) -> Result<(), RegistryError> {
        let idx = self
            .components
            .iter()
            .position(|(n, _)| *n == name)
            .ok_or(RegistryError::NotRegistered)?;
        self.components.remove(idx);
        Ok(())
    }
}
