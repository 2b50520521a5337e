//! SoundWire slave callbacks.

use platform::{
    BusParams, Dp0Properties, DpnProperties, PortMask, PortPrepOp, PrepareChannel, ScpIntMask,
    SdwBus, SdwSlaveOps, SlaveInterruptStatus, SlaveProperties, SlaveStatus,
};

use crate::dai::{CAPTURE_PORT, PLAYBACK_PORT};
use crate::driver::Es9356;
use crate::error::{Error, Result};
use crate::registers::REG_IRQ_STATUS;
use crate::state::SlaveState;

/// Channel prepare timeout reported for both data ports.
pub const CH_PREP_TIMEOUT_MS: u16 = 10;
/// Clock-stop timeout.
pub const CLK_STOP_TIMEOUT_MS: u32 = 300;

fn dpn(num: u8, max_ch: u8) -> DpnProperties {
    DpnProperties {
        num,
        max_word: 32,
        min_word: 16,
        max_ch,
        min_ch: 1,
        simple_ch_prep_sm: true,
        ch_prep_timeout_ms: CH_PREP_TIMEOUT_MS,
        imp_def_interrupts: 0,
    }
}

/// Properties reported to the bus core.
#[must_use]
pub fn properties() -> SlaveProperties {
    let sink_dpn = heapless::Vec::from_slice(&[dpn(PLAYBACK_PORT, 2)]).unwrap_or_default();
    let src_dpn = heapless::Vec::from_slice(&[dpn(CAPTURE_PORT, 1)]).unwrap_or_default();
    SlaveProperties {
        paging_support: true,
        clk_stop_mode1: false,
        simple_clk_stop_capable: true,
        clk_stop_timeout_ms: CLK_STOP_TIMEOUT_MS,
        scp_int1_mask: ScpIntMask::PARITY | ScpIntMask::BUS_CLASH | ScpIntMask::IMPL_DEF,
        dp0: Some(Dp0Properties {
            max_word: 64,
            min_word: 1,
            bra_flow_controlled: false,
            simple_ch_prep_sm: true,
            imp_def_interrupts: false,
        }),
        source_ports: PortMask::port(CAPTURE_PORT),
        sink_ports: PortMask::port(PLAYBACK_PORT),
        src_dpn,
        sink_dpn,
    }
}

impl<B: SdwBus, P> SdwSlaveOps for Es9356<B, P> {
    type Error = Error<B::Error>;

    async fn read_prop(&self) -> Result<SlaveProperties, B::Error> {
        Ok(properties())
    }

    async fn update_status(&self, status: SlaveStatus) -> Result<(), B::Error> {
        let mut inner = self.lock().await;
        debug!("es9356: status {:?} in {:?}", status, inner.state.slave);
        match status {
            SlaveStatus::Unattached => {
                inner.state.detach();
                inner.regmap.set_cache_only(true);
                Ok(())
            }
            SlaveStatus::Attached => {
                if inner.state.slave == SlaveState::Unattached {
                    inner.state.slave = SlaveState::Attached;
                }
                if inner.state.hw_init {
                    return Ok(());
                }
                if inner.state.suspended {
                    // Initialised on resume.
                    debug!("es9356: attached while suspended");
                    return Ok(());
                }
                inner.io_init().await
            }
            SlaveStatus::Alert => Ok(()),
        }
    }

    async fn bus_config(&self, params: &BusParams) -> Result<(), B::Error> {
        let mut inner = self.lock().await;
        if !inner.state.slave.is_attached() {
            return Err(Error::InvalidState);
        }
        if !params.is_valid() {
            warn!(
                "es9356: bus params {} Hz {}x{} rejected",
                params.curr_dr_freq, params.row, params.col
            );
            return Err(Error::InvalidBusParams);
        }
        inner.state.bus_params = Some(*params);
        if inner.state.slave == SlaveState::Attached {
            inner.state.slave = SlaveState::Configured;
        }
        debug!(
            "es9356: bus {} Hz, {} rows x {} cols, bank {}",
            params.curr_dr_freq, params.row, params.col, params.bank
        );
        Ok(())
    }

    async fn port_prep(&self, ch: &PrepareChannel, op: PortPrepOp) -> Result<(), B::Error> {
        if ch.num != PLAYBACK_PORT && ch.num != CAPTURE_PORT {
            return Err(Error::InvalidPort(ch.num));
        }
        let mut inner = self.lock().await;
        let st = &mut inner.state;
        if !st.slave.is_configured() {
            return Err(Error::InvalidState);
        }
        debug!("es9356: port {} {:?}", ch.num, op);
        match op {
            PortPrepOp::PrePrep => {
                if st.ports.contains(ch.num) {
                    return Err(Error::PortsExhausted);
                }
                st.ports = st.ports.with(ch.num);
                st.stopping = st.stopping.without(ch.num);
            }
            PortPrepOp::PostPrep => {
                if !st.ports.contains(ch.num) || st.stopping.contains(ch.num) {
                    return Err(Error::InvalidState);
                }
                st.slave = SlaveState::Streaming;
            }
            PortPrepOp::PreDeprep => {
                if !st.ports.contains(ch.num) {
                    return Err(Error::InvalidState);
                }
                st.stopping = st.stopping.with(ch.num);
            }
            PortPrepOp::PostDeprep => {
                if !st.ports.contains(ch.num) {
                    return Err(Error::InvalidState);
                }
                st.ports = st.ports.without(ch.num);
                st.stopping = st.stopping.without(ch.num);
                if st.ports.is_empty() {
                    st.slave = SlaveState::Configured;
                }
            }
        }
        Ok(())
    }

    async fn interrupt_callback(&self, status: &SlaveInterruptStatus) -> Result<(), B::Error> {
        let mut inner = self.lock().await;
        if inner.regmap.is_cache_only() {
            debug!("es9356: interrupt while powered down ignored");
            return Ok(());
        }
        let irq = inner.regmap.read(REG_IRQ_STATUS).await?;
        if irq != 0 {
            inner.regmap.write(REG_IRQ_STATUS, irq).await?;
            warn!(
                "es9356: interrupt {:#x} (scp {:#x})",
                irq, status.control_port
            );
        }
        inner.state.last_irq_status = irq;
        Ok(())
    }
}
