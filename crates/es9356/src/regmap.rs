//! Register access over the SoundWire bus.
//!
//! Every register is volatile, so nothing is served from a cache: a read is
//! always a bus transaction. While the device is powered down the map is put
//! in cache-only mode; reads then fail and writes are held back (last value
//! per register wins) until [`Regmap::sync`] replays them in address order.

use heapless::LinearMap;
use platform::SdwBus;

use crate::error::{Error, Result};
use crate::registers;

/// Most distinct registers that can be written while cache-only.
pub const MAX_DEFERRED: usize = 64;

/// Register map descriptor.
#[derive(Debug, Clone, Copy)]
pub struct RegmapConfig {
    /// Address width in bits.
    pub reg_bits: u8,
    /// Value width in bits.
    pub val_bits: u8,
    /// Highest valid address.
    pub max_register: u32,
    /// Whether a register may be read.
    pub readable: fn(u32) -> bool,
    /// Whether a register may change behind the driver's back.
    pub volatile: fn(u32) -> bool,
    /// Whether a power-on default is restored by [`Regmap::write_defaults`].
    pub restore_default: fn(u32) -> bool,
    /// Power-on values.
    pub reg_defaults: &'static [(u32, u8)],
}

impl RegmapConfig {
    /// Descriptor with `reg_bits`/`val_bits` and everything else permissive.
    #[must_use]
    pub const fn new(reg_bits: u8, val_bits: u8) -> Self {
        Self {
            reg_bits,
            val_bits,
            max_register: u32::MAX,
            readable: always,
            volatile: always,
            restore_default: never,
            reg_defaults: &[],
        }
    }

    /// Highest valid address.
    #[must_use]
    pub const fn max_register(mut self, max_register: u32) -> Self {
        self.max_register = max_register;
        self
    }

    /// Power-on values.
    #[must_use]
    pub const fn reg_defaults(mut self, defaults: &'static [(u32, u8)]) -> Self {
        self.reg_defaults = defaults;
        self
    }

    /// Which defaults [`Regmap::write_defaults`] restores.
    #[must_use]
    pub const fn restore_default(mut self, f: fn(u32) -> bool) -> Self {
        self.restore_default = f;
        self
    }
}

const fn always(_reg: u32) -> bool {
    true
}

const fn never(_reg: u32) -> bool {
    false
}

/// ES9356 register map: 32-bit addresses, 8-bit values, all volatile.
pub static ES9356_REGMAP: RegmapConfig = RegmapConfig::new(32, 8)
    .max_register(registers::MAX_REGISTER)
    .reg_defaults(registers::REG_DEFAULTS)
    .restore_default(registers::is_init_default);

/// Register map bound to one bus slave.
pub struct Regmap<B> {
    bus: B,
    config: &'static RegmapConfig,
    cache_only: bool,
    deferred: LinearMap<u32, u8, MAX_DEFERRED>,
}

impl<B: SdwBus> Regmap<B> {
    /// Bind `config` to a bus slave.
    pub fn new(bus: B, config: &'static RegmapConfig) -> Self {
        Self {
            bus,
            config,
            cache_only: false,
            deferred: LinearMap::new(),
        }
    }

    /// The descriptor this map was built from.
    pub fn config(&self) -> &'static RegmapConfig {
        self.config
    }

    fn check(&self, reg: u32) -> Result<(), B::Error> {
        if reg > self.config.max_register {
            Err(Error::InvalidRegister(reg))
        } else {
            Ok(())
        }
    }

    /// Read one register.
    pub async fn read(&mut self, reg: u32) -> Result<u8, B::Error> {
        self.check(reg)?;
        if !(self.config.readable)(reg) {
            return Err(Error::InvalidRegister(reg));
        }
        if self.cache_only {
            if !(self.config.volatile)(reg) {
                if let Some(&val) = self.deferred.get(&reg) {
                    return Ok(val);
                }
            }
            return Err(Error::CacheOnly(reg));
        }
        self.bus.read(reg).await.map_err(Error::Transport)
    }

    /// Write one register; deferred while cache-only.
    pub async fn write(&mut self, reg: u32, val: u8) -> Result<(), B::Error> {
        self.check(reg)?;
        if self.cache_only {
            self.deferred
                .insert(reg, val)
                .map_err(|_| Error::DeferredWritesFull)?;
            return Ok(());
        }
        self.bus.write(reg, val).await.map_err(Error::Transport)
    }

    /// Read-modify-write the bits in `mask`. Returns whether the value changed.
    pub async fn update_bits(&mut self, reg: u32, mask: u8, val: u8) -> Result<bool, B::Error> {
        let old = self.read(reg).await?;
        let new = (old & !mask) | (val & mask);
        if new == old {
            return Ok(false);
        }
        self.write(reg, new).await?;
        Ok(true)
    }

    /// Write a sequence of registers, stopping at the first failure.
    pub async fn multi_write(&mut self, seq: &[(u32, u8)]) -> Result<(), B::Error> {
        for &(reg, val) in seq {
            self.write(reg, val).await?;
        }
        Ok(())
    }

    /// Restore the power-on values selected by the descriptor.
    pub async fn write_defaults(&mut self) -> Result<(), B::Error> {
        let config = self.config;
        for &(reg, val) in config.reg_defaults {
            if (config.restore_default)(reg) {
                self.write(reg, val).await?;
            }
        }
        Ok(())
    }

    /// Enter or leave cache-only mode. Leaving does not replay deferred writes.
    pub fn set_cache_only(&mut self, enable: bool) {
        self.cache_only = enable;
    }

    /// Whether the map is cache-only.
    pub fn is_cache_only(&self) -> bool {
        self.cache_only
    }

    /// Number of writes waiting for [`sync`][Self::sync].
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Forget deferred writes without issuing them.
    pub fn drop_deferred(&mut self) {
        self.deferred.clear();
    }

    /// Replay deferred writes in address order.
    ///
    /// A write that fails stays deferred along with every later one.
    pub async fn sync(&mut self) -> Result<(), B::Error> {
        if self.cache_only {
            return Err(Error::InvalidState);
        }
        let mut regs: heapless::Vec<u32, MAX_DEFERRED> = self.deferred.keys().copied().collect();
        regs.sort_unstable();
        for reg in regs {
            if let Some(&val) = self.deferred.get(&reg) {
                self.bus.write(reg, val).await.map_err(Error::Transport)?;
                self.deferred.remove(&reg);
            }
        }
        Ok(())
    }

    /// The underlying bus, for stream membership calls.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use platform::mocks::{Access, SimBusError, SimulatedSdwBus};

    fn regmap(sim: &SimulatedSdwBus) -> Regmap<SimulatedSdwBus> {
        Regmap::new(sim.clone(), &ES9356_REGMAP)
    }

    #[tokio::test]
    async fn read_is_always_a_bus_transaction() {
        let sim = SimulatedSdwBus::with_registers(&[(registers::MANID_AB, 0x04)]);
        let mut map = regmap(&sim);
        assert_eq!(map.read(registers::MANID_AB).await.unwrap(), 0x04);
        assert_eq!(map.read(registers::MANID_AB).await.unwrap(), 0x04);
        assert_eq!(
            sim.transactions(),
            [Access::Read(registers::MANID_AB), Access::Read(registers::MANID_AB)]
        );
    }

    #[tokio::test]
    async fn out_of_range_rejected_without_traffic() {
        let sim = SimulatedSdwBus::new();
        let mut map = regmap(&sim);
        assert_eq!(map.read(0xFF02).await, Err(Error::InvalidRegister(0xFF02)));
        assert_eq!(map.write(0x1_0000, 1).await, Err(Error::InvalidRegister(0x1_0000)));
        assert!(sim.transactions().is_empty());
    }

    #[tokio::test]
    async fn transport_error_surfaces_once() {
        let sim = SimulatedSdwBus::new();
        sim.fail_on(registers::REG_DAC_MUTE);
        let mut map = regmap(&sim);
        assert_eq!(
            map.write(registers::REG_DAC_MUTE, 0).await,
            Err(Error::Transport(SimBusError::Fault(registers::REG_DAC_MUTE)))
        );
    }

    #[tokio::test]
    async fn update_bits_skips_unchanged_write() {
        let sim = SimulatedSdwBus::with_registers(&[(registers::REG_CLK_MGR, 0x01)]);
        let mut map = regmap(&sim);
        assert!(!map.update_bits(registers::REG_CLK_MGR, 0x01, 0x01).await.unwrap());
        assert!(sim.writes().is_empty());
        assert!(map.update_bits(registers::REG_CLK_MGR, 0x10, 0xFF).await.unwrap());
        assert_eq!(sim.writes(), [(registers::REG_CLK_MGR, 0x11)]);
    }

    #[tokio::test]
    async fn cache_only_defers_writes_and_refuses_reads() {
        let sim = SimulatedSdwBus::new();
        let mut map = regmap(&sim);
        map.set_cache_only(true);
        map.write(registers::REG_DAC_VOL_R, 0x20).await.unwrap();
        map.write(registers::REG_DAC_VOL_L, 0x10).await.unwrap();
        map.write(registers::REG_DAC_VOL_L, 0x11).await.unwrap();
        assert_eq!(
            map.read(registers::REG_DAC_VOL_L).await,
            Err(Error::CacheOnly(registers::REG_DAC_VOL_L))
        );
        assert!(sim.transactions().is_empty());
        assert_eq!(map.deferred_len(), 2);

        assert_eq!(map.sync().await, Err(Error::InvalidState));
        map.set_cache_only(false);
        map.sync().await.unwrap();
        assert_eq!(
            sim.writes(),
            [(registers::REG_DAC_VOL_L, 0x11), (registers::REG_DAC_VOL_R, 0x20)]
        );
        assert_eq!(map.deferred_len(), 0);
    }

    #[tokio::test]
    async fn deferred_overflow_is_an_error() {
        let sim = SimulatedSdwBus::new();
        let mut map = regmap(&sim);
        map.set_cache_only(true);
        for i in 0..MAX_DEFERRED as u32 {
            map.write(registers::VENDOR_BASE + i, 0).await.unwrap();
        }
        // Overwriting an already deferred register still fits.
        map.write(registers::VENDOR_BASE, 1).await.unwrap();
        assert_eq!(
            map.write(registers::VENDOR_END, 0).await,
            Err(Error::DeferredWritesFull)
        );
    }

    #[tokio::test]
    async fn failed_sync_keeps_remaining_writes() {
        let sim = SimulatedSdwBus::new();
        let mut map = regmap(&sim);
        map.set_cache_only(true);
        map.write(0x3010, 1).await.unwrap();
        map.write(0x3020, 2).await.unwrap();
        map.set_cache_only(false);
        sim.fail_on(0x3020);
        assert!(map.sync().await.is_err());
        assert_eq!(map.deferred_len(), 1);
        sim.clear_faults();
        map.sync().await.unwrap();
        assert_eq!(sim.peek(0x3020), 2);
    }

    #[tokio::test]
    async fn write_defaults_restores_codec_block_only() {
        let sim = SimulatedSdwBus::new();
        let mut map = regmap(&sim);
        map.write_defaults().await.unwrap();
        let writes = sim.writes();
        assert!(writes.iter().all(|&(reg, _)| registers::is_vendor_register(reg)));
        assert!(!writes.iter().any(|&(reg, _)| reg == registers::REG_IRQ_STATUS));
        assert!(writes.contains(&(registers::REG_IRQ_MASK, 0xFF)));
        assert_eq!(writes.len(), registers::codec_defaults().count());
    }
}
