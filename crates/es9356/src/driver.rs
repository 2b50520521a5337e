//! ES9356 device instance, probe and remove.
//!
//! One [`Es9356`] exists per enumerated codec. It owns the register map,
//! the optional reset GPIO and the supply bulk; dropping it releases all of
//! them. Every framework callback locks the device mutex first, so bus,
//! DAI, PM and interrupt paths never interleave.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use platform::{
    ComponentDriverDesc, ComponentRegistry, SdwBus, SdwDeviceId, StreamDirection, SupplyBulk,
};

use crate::config::{Es9356Config, COMPONENT_NAME, NUM_SUPPLIES};
use crate::dai::ES9356_DAI;
use crate::dapm::{self, GRAPH, ROUTES, WIDGETS};
use crate::error::{Error, Result};
use crate::regmap::{Regmap, ES9356_REGMAP};
use crate::registers::{
    CLASS_ID, CLK_MCLK_EN, CLK_PLL_SEL, DEVID_AB, DEVID_CD, IRQ_SERVICED, MANID_AB, MANID_CD,
    MANUFACTURER_ID, PART_ID, REG_CLK_MGR, REG_IRQ_MASK, REG_PLL_CFG, REG_PWR_CTL, REG_SOFT_RESET,
    SOFT_RESET,
};
use crate::state::{DeviceState, SlaveState, Snapshot};

/// Devices this driver binds to.
pub static ES9356_SDW_ID: [SdwDeviceId; 1] =
    [SdwDeviceId::slave_entry(MANUFACTURER_ID, PART_ID, CLASS_ID)];

/// Component declaration.
pub static COMPONENT: ComponentDriverDesc = ComponentDriverDesc {
    name: COMPONENT_NAME,
    widgets: &WIDGETS,
    routes: &ROUTES,
    endianness: true,
};

/// Placeholder for boards without a reset GPIO.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResetPin;

impl embedded_hal::digital::ErrorType for NoResetPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for NoResetPin {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }
}

/// Board resources handed to [`Es9356::probe`].
#[derive(Debug)]
pub struct ProbeResources<P, D> {
    /// Reset GPIO, active low.
    pub reset: Option<P>,
    /// Interrupt line, if wired.
    pub irq: Option<u32>,
    /// Delay provider for reset timing.
    pub delay: D,
}

impl<D> ProbeResources<NoResetPin, D> {
    /// No reset GPIO, no interrupt.
    pub fn new(delay: D) -> Self {
        Self {
            reset: None,
            irq: None,
            delay,
        }
    }
}

impl<P, D> ProbeResources<P, D> {
    /// Add a reset GPIO.
    pub fn with_reset<Q>(self, pin: Q) -> ProbeResources<Q, D> {
        ProbeResources {
            reset: Some(pin),
            irq: self.irq,
            delay: self.delay,
        }
    }

    /// Add an interrupt line.
    #[must_use]
    pub fn with_irq(mut self, irq: u32) -> Self {
        self.irq = Some(irq);
        self
    }
}

pub(crate) struct Inner<B, P> {
    pub(crate) regmap: Regmap<B>,
    pub(crate) state: DeviceState,
    pub(crate) supplies: SupplyBulk<NUM_SUPPLIES>,
    pub(crate) config: Es9356Config,
    // Held for the device's lifetime; released on drop.
    _reset: Option<P>,
}

/// ES9356 codec on a SoundWire bus.
pub struct Es9356<B, P = NoResetPin> {
    inner: Mutex<CriticalSectionRawMutex, Inner<B, P>>,
    id: SdwDeviceId,
    irq: Option<u32>,
}

impl<B: SdwBus, P: OutputPin> Es9356<B, P> {
    /// Whether this driver handles `id`.
    #[must_use]
    pub fn matches(id: &SdwDeviceId) -> bool {
        ES9356_SDW_ID.iter().any(|entry| entry.matches(id))
    }

    /// Bind to an enumerated device.
    ///
    /// Pulses the reset GPIO if there is one, checks the identity registers,
    /// powers the supplies and registers the component with its DAI. The
    /// register map stays cache-only until the bus reports the device
    /// attached.
    pub async fn probe<D, R>(
        bus: B,
        id: SdwDeviceId,
        resources: ProbeResources<P, D>,
        registry: &mut R,
        config: Es9356Config,
    ) -> Result<Self, B::Error>
    where
        D: DelayNs,
        R: ComponentRegistry,
    {
        info!("es9356: probe {:#x}:{:#x}", id.mfg_id, id.part_id);
        if !Self::matches(&id) {
            warn!("es9356: no id table entry for part {:#x}", id.part_id);
            return Err(Error::NotSupported);
        }

        let mut regmap = Regmap::new(bus, &ES9356_REGMAP);
        let ProbeResources {
            mut reset,
            irq,
            mut delay,
        } = resources;

        if let Some(pin) = reset.as_mut() {
            pin.set_low().map_err(|_| Error::Gpio)?;
            delay.delay_us(config.reset_pulse_us).await;
            pin.set_high().map_err(|_| Error::Gpio)?;
            delay.delay_ms(config.reset_settle_ms).await;
        }

        check_identity(&mut regmap).await?;
        regmap.set_cache_only(true);

        let mut supplies = SupplyBulk::new(config.supplies);
        supplies.enable();

        GRAPH.validate().map_err(Error::Dapm)?;
        registry
            .register_component(&COMPONENT, &[ES9356_DAI])
            .map_err(Error::Registry)?;

        match irq {
            Some(line) => debug!("es9356: irq {}", line),
            None => info!("es9356: no irq, interrupts polled by the bus"),
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                regmap,
                state: DeviceState::new(),
                supplies,
                config,
                _reset: reset,
            }),
            id,
            irq,
        })
    }
}

impl<B: SdwBus, P> Es9356<B, P> {
    /// Unregister the component. Everything else is released on drop.
    #[allow(clippy::needless_pass_by_value)]
    pub fn remove<R: ComponentRegistry>(self, registry: &mut R) -> Result<(), B::Error> {
        info!("es9356: remove");
        registry
            .unregister_component(COMPONENT.name)
            .map_err(Error::Registry)
    }

    /// Device id the driver was bound to.
    pub fn id(&self) -> SdwDeviceId {
        self.id
    }

    /// Interrupt line, if wired.
    pub fn irq(&self) -> Option<u32> {
        self.irq
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, CriticalSectionRawMutex, Inner<B, P>> {
        self.inner.lock().await
    }

    /// Copy of the current device state.
    pub async fn snapshot(&self) -> Snapshot {
        self.lock().await.state.snapshot()
    }

    /// Whether the supplies are on.
    pub async fn supplies_enabled(&self) -> bool {
        self.lock().await.supplies.is_enabled()
    }

    /// Read a register under the device lock.
    pub async fn read_register(&self, reg: u32) -> Result<u8, B::Error> {
        self.lock().await.regmap.read(reg).await
    }

    /// Write a register under the device lock; deferred while powered down.
    pub async fn write_register(&self, reg: u32, val: u8) -> Result<(), B::Error> {
        self.lock().await.regmap.write(reg, val).await
    }
}

/// Read the identity registers and compare them with the id table.
pub(crate) async fn check_identity<B: SdwBus>(regmap: &mut Regmap<B>) -> Result<(), B::Error> {
    let manufacturer = u16::from_be_bytes([regmap.read(MANID_AB).await?, regmap.read(MANID_CD).await?]);
    let part = u16::from_be_bytes([regmap.read(DEVID_AB).await?, regmap.read(DEVID_CD).await?]);
    if manufacturer != MANUFACTURER_ID || part != PART_ID {
        error!(
            "es9356: id mismatch, manufacturer {:#x} part {:#x}",
            manufacturer, part
        );
        return Err(Error::IdMismatch { manufacturer, part });
    }
    Ok(())
}

impl<B: SdwBus, P> Inner<B, P> {
    /// Bring the codec from power-on defaults to the driver's state.
    ///
    /// Runs on attach and on resume after the link was lost. Stream
    /// configuration still held by the driver is written back over the
    /// defaults. Deferred writes are replayed last so they win over both.
    pub(crate) async fn io_init(&mut self) -> Result<(), B::Error> {
        debug!("es9356: hardware init");
        self.regmap.set_cache_only(false);

        self.regmap.write(REG_SOFT_RESET, SOFT_RESET).await?;
        self.regmap.write(REG_SOFT_RESET, 0).await?;
        self.regmap.write_defaults().await?;

        let mut clk = CLK_MCLK_EN;
        if let Some(pll) = self.config.pll_config {
            self.regmap.write(REG_PLL_CFG, pll).await?;
            clk |= CLK_PLL_SEL;
        }
        self.restore_formats().await?;
        self.state.clk_mgr = clk | self.state.path_clocks();
        self.regmap.write(REG_CLK_MGR, self.state.clk_mgr).await?;

        for dir in StreamDirection::ALL {
            let (reg, val) = self.state.mute_reg(dir);
            self.regmap.write(reg, val).await?;
        }
        self.sync_power().await?;
        self.regmap.write(REG_IRQ_MASK, !IRQ_SERVICED).await?;
        self.regmap.sync().await?;

        self.state.hw_init = true;
        if self.state.slave == SlaveState::Unattached {
            self.state.slave = SlaveState::Attached;
        }
        info!("es9356: hardware init done");
        Ok(())
    }

    /// Write path power for the prepared directions.
    pub(crate) async fn sync_power(&mut self) -> Result<(), B::Error> {
        let val = dapm::power_ctl(self.state.prepared());
        self.regmap.write(REG_PWR_CTL, val).await
    }

    /// Write the clock manager shadow.
    pub(crate) async fn sync_clocks(&mut self) -> Result<(), B::Error> {
        self.regmap.write(REG_CLK_MGR, self.state.clk_mgr).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registers::REG_DEFAULTS;
    use platform::mocks::{MockRegistry, RecordingDelay, RecordingPin, SimulatedSdwBus};

    fn id() -> SdwDeviceId {
        SdwDeviceId::slave_entry(0x04b3, 0x9356, 0)
    }

    #[tokio::test]
    async fn probe_registers_component_and_dai() {
        let sim = SimulatedSdwBus::with_registers(REG_DEFAULTS);
        let mut reg = MockRegistry::new();
        let dev = Es9356::probe(
            sim.clone(),
            id(),
            ProbeResources::new(RecordingDelay::new()).with_irq(42),
            &mut reg,
            Es9356Config::default(),
        )
        .await
        .unwrap();
        assert!(reg.is_registered(COMPONENT_NAME));
        assert_eq!(reg.dai_names(COMPONENT_NAME), [ES9356_DAI.name]);
        assert_eq!(dev.irq(), Some(42));
        assert!(dev.supplies_enabled().await);
        assert_eq!(dev.snapshot().await.slave_state, SlaveState::Unattached);
        // identity only; nothing written before attach
        assert!(sim.writes().is_empty());
    }

    #[tokio::test]
    async fn reset_pin_pulses_low_then_high() {
        let sim = SimulatedSdwBus::with_registers(REG_DEFAULTS);
        let pin = RecordingPin::new();
        let delay = RecordingDelay::new();
        let mut reg = MockRegistry::new();
        let cfg = Es9356Config::default().with_reset_timing(50, 2);
        let _dev = Es9356::probe(
            sim,
            id(),
            ProbeResources::new(delay.clone()).with_reset(pin.clone()),
            &mut reg,
            cfg,
        )
        .await
        .unwrap();
        assert_eq!(pin.history(), [false, true]);
        assert_eq!(delay.total_ns(), 50_000 + 2_000_000);
    }

    #[tokio::test]
    async fn io_init_writes_defaults_then_mute_and_irq_mask() {
        let sim = SimulatedSdwBus::with_registers(REG_DEFAULTS);
        let mut reg = MockRegistry::new();
        let dev = Es9356::probe(
            sim.clone(),
            id(),
            ProbeResources::new(RecordingDelay::new()),
            &mut reg,
            Es9356Config::default().with_pll(0x21),
        )
        .await
        .unwrap();
        dev.lock().await.io_init().await.unwrap();
        let writes = sim.writes();
        assert_eq!(writes.first(), Some(&(REG_SOFT_RESET, SOFT_RESET)));
        assert_eq!(writes.get(1), Some(&(REG_SOFT_RESET, 0)));
        assert_eq!(sim.peek(REG_PLL_CFG), 0x21);
        assert_eq!(sim.peek(REG_CLK_MGR), CLK_MCLK_EN | CLK_PLL_SEL);
        assert_eq!(sim.peek(REG_IRQ_MASK), !IRQ_SERVICED);
        assert_eq!(sim.peek(REG_PWR_CTL), 0);
        let snap = dev.snapshot().await;
        assert!(snap.hw_init);
        assert_eq!(snap.slave_state, SlaveState::Attached);
    }
}
