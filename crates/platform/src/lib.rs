//! Codec driver abstractions for SoundWire-attached ASoC codecs
//!
//! This crate provides trait-based abstractions of the kernel frameworks a
//! codec driver plugs into, enabling development and testing without the
//! frameworks or the hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Codec driver (es9356-sdw)
//!         ↓ implements SdwSlaveOps / DaiOps / DevPmOps
//! Platform abstractions (this crate)
//!         ↓ SdwBus / ComponentRegistry
//! SoundWire bus core, ASoC core, PM core
//! ```
//!
//! # Modules
//!
//! - [`sdw`] - SoundWire slave: transport, status, properties, ports, streams
//! - [`pcm`] - PCM directions, formats, rates, hardware parameters
//! - [`dai`] - DAI declaration and stream callbacks
//! - [`dapm`] - DAPM widgets, routes and path power
//! - [`power`] - Device PM callbacks and supply bookkeeping
//! - [`component`] - Component registration
//!
//! # Features
//!
//! - `std`: host builds; exposes [`mocks`]
//! - `defmt`: `defmt::Format` derives on public types

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this crate:
#![allow(clippy::doc_markdown)] // register and callback names in doc comments
#![allow(clippy::must_use_candidate)] // accessors: callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // callbacks are driven by one framework context at a time

#[cfg(all(feature = "std", not(test)))]
extern crate std;

pub mod component;
pub mod dai;
pub mod dapm;
pub mod mocks;
pub mod pcm;
pub mod power;
pub mod sdw;

// Re-export main high-level traits
pub use component::{ComponentDriverDesc, ComponentRegistry, RegistryError};
pub use dai::{DaiDriverDesc, DaiOps};
pub use dapm::{DapmError, DapmGraph, PowerControl, Route, Widget, WidgetKind, WidgetSet};
pub use power::{DevPmOps, PmKind, SupplyBulk};
pub use sdw::{SdwBus, SdwSlaveOps};

// Re-export value types
pub use pcm::{
    HwParams, OutOfRangeError, ParamError, PcmFormat, PcmFormats, PcmRates, PcmStreamCaps,
    SampleRateHz, StreamDirection, StreamMask,
};
pub use sdw::{
    BusParams, DataDirection, Dp0Properties, DpnProperties, PortConfig, PortMask, PortPrepOp,
    PrepareChannel, ScpIntMask, SdwDeviceId, SlaveInterruptStatus, SlaveProperties, SlaveStatus,
    StreamConfig, StreamHandle,
};
