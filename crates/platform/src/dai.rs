//! Digital audio interface abstraction

use crate::pcm::{HwParams, PcmStreamCaps, StreamDirection};
use crate::sdw::StreamHandle;

/// Static DAI declaration (`struct snd_soc_dai_driver`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaiDriverDesc {
    /// DAI name.
    pub name: &'static str,
    /// DAI id within the component.
    pub id: u32,
    /// Playback capabilities.
    pub playback: PcmStreamCaps,
    /// Capture capabilities.
    pub capture: PcmStreamCaps,
    /// Playback and capture must run at the same rate.
    pub symmetric_rate: bool,
}

impl DaiDriverDesc {
    /// Capabilities for one direction.
    #[must_use]
    pub const fn caps(&self, dir: StreamDirection) -> &PcmStreamCaps {
        match dir {
            StreamDirection::Playback => &self.playback,
            StreamDirection::Capture => &self.capture,
        }
    }
}

/// DAI stream callbacks (`struct snd_soc_dai_ops`).
pub trait DaiOps {
    /// Error type
    type Error: core::fmt::Debug;

    /// Substream opened.
    async fn startup(&self, dir: StreamDirection) -> Result<(), Self::Error>;

    /// Substream closed.
    async fn shutdown(&self, dir: StreamDirection) -> Result<(), Self::Error>;

    /// Apply rate/format/channels.
    async fn hw_params(&self, dir: StreamDirection, params: &HwParams)
        -> Result<(), Self::Error>;

    /// Release what `hw_params` acquired.
    async fn hw_free(&self, dir: StreamDirection) -> Result<(), Self::Error>;

    /// Last step before the stream starts.
    async fn prepare(&self, dir: StreamDirection) -> Result<(), Self::Error>;

    /// Bind (`Some`) or unbind (`None`) the bus stream used for port allocation.
    async fn set_stream(
        &self,
        dir: StreamDirection,
        stream: Option<StreamHandle>,
    ) -> Result<(), Self::Error>;

    /// Digital mute.
    async fn mute_stream(&self, dir: StreamDirection, mute: bool) -> Result<(), Self::Error>;
}
