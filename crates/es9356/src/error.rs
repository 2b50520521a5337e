//! Driver error type.

use platform::{DapmError, ParamError, RegistryError};
use thiserror_no_std::Error;

/// Errors returned by the ES9356 driver, generic over the bus transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Bus transaction failed.
    #[error("bus transaction failed: {0:?}")]
    Transport(E),
    /// Register address above the map's maximum.
    #[error("register {0:#x} out of range")]
    InvalidRegister(u32),
    /// Register read while the map is cache-only.
    #[error("register {0:#x} not readable while cache-only")]
    CacheOnly(u32),
    /// Too many distinct registers written while cache-only.
    #[error("deferred write buffer full")]
    DeferredWritesFull,
    /// Device id not in the driver's id table.
    #[error("device not supported")]
    NotSupported,
    /// Identity registers do not hold the expected ids.
    #[error("id mismatch: manufacturer {manufacturer:#06x}, part {part:#06x}")]
    IdMismatch {
        /// Manufacturer id read back.
        manufacturer: u16,
        /// Part id read back.
        part: u16,
    },
    /// Rate, format or channel count not supported.
    #[error("invalid hw params: {0}")]
    InvalidParams(ParamError),
    /// The other direction runs at a different rate.
    #[error("symmetric rate violated: active {active} Hz, requested {requested} Hz")]
    SymmetricRate {
        /// Rate of the running direction.
        active: u32,
        /// Rate requested.
        requested: u32,
    },
    /// Direction already in use, or a stream is active.
    #[error("device busy")]
    Busy,
    /// No bus stream bound to the DAI.
    #[error("no stream bound")]
    NoStream,
    /// Operation needs `hw_params` first.
    #[error("stream not configured")]
    NotConfigured,
    /// Operation not allowed in the current lifecycle state.
    #[error("invalid state")]
    InvalidState,
    /// Bus parameters out of range.
    #[error("invalid bus parameters")]
    InvalidBusParams,
    /// Port number the codec does not implement.
    #[error("invalid port {0}")]
    InvalidPort(u8),
    /// Port already allocated.
    #[error("no free port")]
    PortsExhausted,
    /// Component registration failed.
    #[error("registration failed: {0}")]
    Registry(RegistryError),
    /// Reset GPIO could not be driven.
    #[error("reset gpio failed")]
    Gpio,
    /// Route table invalid.
    #[error("dapm: {0}")]
    Dapm(DapmError),
}

/// Driver result.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_mismatch_formats_both_ids() {
        let err: Error<()> = Error::IdMismatch {
            manufacturer: 0x025d,
            part: 0x0711,
        };
        let msg = std::format!("{err}");
        assert!(msg.contains("0x025d"), "{msg}");
        assert!(msg.contains("0x0711"), "{msg}");
    }

    #[test]
    fn param_error_is_wrapped() {
        let err: Error<()> = Error::InvalidParams(ParamError::Rate(192_000));
        assert_eq!(std::format!("{err}"), "invalid hw params: unsupported sample rate 192000 Hz");
    }
}
