//! DAI stream control.
//!
//! Playback enters on data port 1, capture leaves on data port 2. Both
//! directions share the codec's sample-rate and bit-clock registers, hence
//! the symmetric rate constraint.
//!
//! Every check in [`DaiOps::hw_params`] runs before the first register write
//! or bus stream change, so a rejected request leaves the hardware untouched.

use platform::{
    DaiDriverDesc, DaiOps, DataDirection, HwParams, ParamError, PcmFormats, PcmRates,
    PcmStreamCaps, PortConfig, SdwBus, StreamConfig, StreamDirection, StreamHandle, StreamMask,
};

use crate::config::{CAPTURE_STREAM, DAI_NAME, PLAYBACK_STREAM};
use crate::driver::{Es9356, Inner};
use crate::error::{Error, Result};
use crate::registers::{
    bclk_ratio_code, rate_code, word_length_code, DAC_CH_STEREO, REG_ADC_FMT, REG_BCLK_RATIO,
    REG_DAC_CH, REG_DAC_FMT, REG_FS_SEL,
};
use crate::state::path_clock;

/// Playback data port.
pub const PLAYBACK_PORT: u8 = 1;
/// Capture data port.
pub const CAPTURE_PORT: u8 = 2;

const FORMATS: PcmFormats = PcmFormats::S16_LE
    .union(PcmFormats::S24_LE)
    .union(PcmFormats::S32_LE);

/// DAI declaration.
pub const ES9356_DAI: DaiDriverDesc = DaiDriverDesc {
    name: DAI_NAME,
    id: 0,
    playback: PcmStreamCaps {
        stream_name: PLAYBACK_STREAM,
        channels_min: 1,
        channels_max: 2,
        rates: PcmRates::RATE_8000_96000,
        rate_min: 8_000,
        rate_max: 96_000,
        formats: FORMATS,
    },
    capture: PcmStreamCaps {
        stream_name: CAPTURE_STREAM,
        channels_min: 1,
        channels_max: 1,
        rates: PcmRates::RATE_8000_96000,
        rate_min: 8_000,
        rate_max: 96_000,
        formats: FORMATS,
    },
    symmetric_rate: true,
};

/// Data port carrying `dir`.
#[must_use]
pub const fn port_for(dir: StreamDirection) -> u8 {
    match dir {
        StreamDirection::Playback => PLAYBACK_PORT,
        StreamDirection::Capture => CAPTURE_PORT,
    }
}

/// Register values derived from validated hw params.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClockPlan {
    fs_sel: u8,
    bclk_ratio: u32,
    bclk_code: u8,
    word_length: u8,
}

impl ClockPlan {
    fn new(params: &HwParams, min_ratio: u32) -> core::result::Result<Self, ParamError> {
        let fs_sel = rate_code(params.rate).ok_or(ParamError::Rate(params.rate))?;
        // Two slots per frame, each a full sample container.
        let bclk_ratio = u32::from(params.format.physical_width())
            .saturating_mul(2)
            .max(min_ratio);
        let bclk_code = bclk_ratio_code(bclk_ratio).ok_or(ParamError::Format(params.format))?;
        let word_length =
            word_length_code(params.format.width()).ok_or(ParamError::Format(params.format))?;
        Ok(Self {
            fs_sel,
            bclk_ratio,
            bclk_code,
            word_length,
        })
    }
}

/// One bit per channel, lowest channels first.
fn channel_mask(channels: u8) -> u8 {
    u8::MAX
        .checked_shr(u32::from(8u8.saturating_sub(channels)))
        .unwrap_or(0)
}

impl<B: SdwBus, P> Inner<B, P> {
    async fn write_clocking(&mut self, fs_sel: u8, bclk_code: u8) -> Result<(), B::Error> {
        self.regmap.write(REG_FS_SEL, fs_sel).await?;
        self.regmap.write(REG_BCLK_RATIO, bclk_code).await
    }

    async fn write_word_format(
        &mut self,
        dir: StreamDirection,
        params: &HwParams,
        word_length: u8,
    ) -> Result<(), B::Error> {
        match dir {
            StreamDirection::Playback => {
                self.regmap.write(REG_DAC_FMT, word_length).await?;
                let ch = if params.channels > 1 { DAC_CH_STEREO } else { 0 };
                self.regmap.write(REG_DAC_CH, ch).await
            }
            StreamDirection::Capture => self.regmap.write(REG_ADC_FMT, word_length).await,
        }
    }

    async fn write_format(
        &mut self,
        dir: StreamDirection,
        params: &HwParams,
        plan: &ClockPlan,
    ) -> Result<(), B::Error> {
        self.write_clocking(plan.fs_sel, plan.bclk_code).await?;
        self.write_word_format(dir, params, plan.word_length).await
    }

    /// Write the stream configuration held in the device state back to the
    /// codec after its registers returned to power-on values.
    pub(crate) async fn restore_formats(&mut self) -> Result<(), B::Error> {
        if !self.state.has_params() {
            return Ok(());
        }
        let fs_sel = rate_code(self.state.sample_rate).ok_or(Error::InvalidState)?;
        let bclk_code = bclk_ratio_code(self.state.bclk_ratio).ok_or(Error::InvalidState)?;
        self.write_clocking(fs_sel, bclk_code).await?;
        for dir in StreamDirection::ALL {
            if let Some(params) = self.state.dir(dir).params {
                let word_length = word_length_code(params.format.width())
                    .ok_or(Error::InvalidParams(ParamError::Format(params.format)))?;
                self.write_word_format(dir, &params, word_length).await?;
            }
        }
        debug!(
            "es9356: restored {} Hz, bclk {}fs",
            self.state.sample_rate, self.state.bclk_ratio
        );
        Ok(())
    }

    /// Take `dir`'s port out of its bus stream, if it was added.
    async fn release_port(&mut self, dir: StreamDirection) -> Result<(), B::Error> {
        if let Some(stream) = self.state.dir_mut(dir).port_stream.take() {
            self.regmap
                .bus_mut()
                .stream_remove_slave(stream)
                .await
                .map_err(Error::Transport)?;
        }
        Ok(())
    }

    /// Release `dir`'s port and forget its params. Returns whether its path
    /// was prepared, in which case clocks and power need rewriting.
    async fn drop_params(&mut self, dir: StreamDirection) -> Result<bool, B::Error> {
        self.release_port(dir).await?;
        Ok(self.state.clear_params(dir))
    }

    async fn write_mute(&mut self, dir: StreamDirection) -> Result<(), B::Error> {
        let (reg, val) = self.state.mute_reg(dir);
        self.regmap.write(reg, val).await
    }
}

impl<B: SdwBus, P> DaiOps for Es9356<B, P> {
    type Error = Error<B::Error>;

    async fn startup(&self, dir: StreamDirection) -> Result<(), B::Error> {
        let mut inner = self.lock().await;
        let st = &mut inner.state;
        if st.suspended || !st.slave.is_attached() {
            warn!("es9356: startup {:?} while unavailable", dir);
            return Err(Error::InvalidState);
        }
        let bit = StreamMask::from(dir);
        if st.stream_use.contains(bit) {
            return Err(Error::Busy);
        }
        st.stream_use |= bit;
        debug!("es9356: startup {:?}", dir);
        Ok(())
    }

    async fn shutdown(&self, dir: StreamDirection) -> Result<(), B::Error> {
        let mut inner = self.lock().await;
        inner.state.stream_use.remove(dir.into());
        inner.state.dir_mut(dir).stream = None;
        debug!("es9356: shutdown {:?}", dir);

        // Closed without hw_free: the rate must not outlive the stream.
        let d = inner.state.dir(dir);
        if d.params.is_some() || d.port_stream.is_some() {
            warn!("es9356: {:?} closed while configured", dir);
            if inner.drop_params(dir).await? {
                inner.sync_clocks().await?;
                inner.sync_power().await?;
            }
        }
        Ok(())
    }

    async fn hw_params(&self, dir: StreamDirection, params: &HwParams) -> Result<(), B::Error> {
        let mut inner = self.lock().await;

        if !inner.state.stream_use.contains(dir.into()) {
            return Err(Error::InvalidState);
        }
        ES9356_DAI
            .caps(dir)
            .validate(params)
            .map_err(Error::InvalidParams)?;
        if ES9356_DAI.symmetric_rate {
            if let Some(active) = inner.state.rate_of(dir.other()) {
                if active != params.rate {
                    warn!(
                        "es9356: {:?} at {} Hz while other direction runs {} Hz",
                        dir, params.rate, active
                    );
                    return Err(Error::SymmetricRate {
                        active,
                        requested: params.rate,
                    });
                }
            }
        }
        let stream = inner.state.dir(dir).stream.ok_or(Error::NoStream)?;
        let plan = ClockPlan::new(params, inner.config.bclk_ratio).map_err(Error::InvalidParams)?;

        // Re-running hw_params replaces the previous port and params.
        if inner.drop_params(dir).await? {
            inner.sync_clocks().await?;
            inner.sync_power().await?;
        }

        let config = StreamConfig {
            frame_rate: params.rate,
            ch_count: params.channels,
            bps: params.format.width(),
            direction: DataDirection::from(dir),
        };
        let port = PortConfig {
            num: port_for(dir),
            ch_mask: channel_mask(params.channels),
        };
        inner
            .regmap
            .bus_mut()
            .stream_add_slave(stream, &config, &port)
            .await
            .map_err(Error::Transport)?;
        inner.state.dir_mut(dir).port_stream = Some(stream);

        inner.write_format(dir, params, &plan).await?;

        let st = &mut inner.state;
        st.dir_mut(dir).params = Some(*params);
        st.dir_mut(dir).prepared = false;
        st.sample_rate = params.rate;
        st.bclk_ratio = plan.bclk_ratio;
        info!(
            "es9356: {:?} {} Hz, {} bit, {} ch, bclk {}fs",
            dir,
            params.rate,
            params.format.width(),
            params.channels,
            plan.bclk_ratio
        );
        Ok(())
    }

    async fn hw_free(&self, dir: StreamDirection) -> Result<(), B::Error> {
        let mut inner = self.lock().await;
        inner.drop_params(dir).await?;
        inner.sync_clocks().await?;
        inner.sync_power().await?;
        debug!("es9356: hw_free {:?}", dir);
        Ok(())
    }

    async fn prepare(&self, dir: StreamDirection) -> Result<(), B::Error> {
        let mut inner = self.lock().await;
        if inner.state.dir(dir).params.is_none() {
            return Err(Error::NotConfigured);
        }
        inner.state.dir_mut(dir).prepared = true;
        inner.state.clk_mgr |= path_clock(dir);
        inner.sync_clocks().await?;
        inner.sync_power().await
    }

    async fn set_stream(
        &self,
        dir: StreamDirection,
        stream: Option<StreamHandle>,
    ) -> Result<(), B::Error> {
        let mut inner = self.lock().await;
        inner.state.dir_mut(dir).stream = stream;
        Ok(())
    }

    async fn mute_stream(&self, dir: StreamDirection, mute: bool) -> Result<(), B::Error> {
        let mut inner = self.lock().await;
        inner.state.dir_mut(dir).muted = mute;
        inner.write_mute(dir).await?;
        debug!("es9356: {:?} mute {}", dir, mute);
        Ok(())
    }
}

/// Mute entry point for companion drivers.
pub async fn es9356_mute_stream<B: SdwBus, P>(
    dev: &Es9356<B, P>,
    dir: StreamDirection,
    mute: bool,
) -> Result<(), B::Error> {
    dev.mute_stream(dir, mute).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::PcmFormat;

    #[test]
    fn dai_caps_match_codec() {
        assert_eq!(ES9356_DAI.playback.channels_max, 2);
        assert_eq!(ES9356_DAI.capture.channels_max, 1);
        assert!(ES9356_DAI.symmetric_rate);
        for fmt in [PcmFormat::S16Le, PcmFormat::S24Le, PcmFormat::S32Le] {
            assert!(ES9356_DAI.playback.formats.contains(fmt.mask()));
        }
        assert!(!ES9356_DAI.playback.formats.contains(PcmFormat::FloatLe.mask()));
    }

    #[test]
    fn every_accepted_rate_has_a_register_code() {
        for rate in ES9356_DAI.playback.rates.iter_hz() {
            assert!(rate_code(rate).is_some(), "{rate}");
        }
    }

    #[test]
    fn clock_plan_widens_bclk_for_32_bit_containers() {
        let s16 = ClockPlan::new(&HwParams::new(48_000, PcmFormat::S16Le, 2), 32).unwrap();
        assert_eq!(s16.bclk_ratio, 32);
        let s24 = ClockPlan::new(&HwParams::new(48_000, PcmFormat::S24Le, 2), 32).unwrap();
        assert_eq!(s24.bclk_ratio, 64);
        assert_eq!(s24.word_length, 1);
        let floor = ClockPlan::new(&HwParams::new(48_000, PcmFormat::S16Le, 2), 64).unwrap();
        assert_eq!(floor.bclk_ratio, 64);
    }

    #[test]
    fn clock_plan_rejects_unencodable_ratio() {
        assert_eq!(
            ClockPlan::new(&HwParams::new(48_000, PcmFormat::S16Le, 2), 128),
            Err(ParamError::Format(PcmFormat::S16Le))
        );
    }

    #[test]
    fn channel_masks() {
        assert_eq!(channel_mask(1), 0b01);
        assert_eq!(channel_mask(2), 0b11);
        assert_eq!(channel_mask(8), 0xFF);
    }

    #[test]
    fn ports_per_direction() {
        assert_eq!(port_for(StreamDirection::Playback), 1);
        assert_eq!(port_for(StreamDirection::Capture), 2);
    }
}
