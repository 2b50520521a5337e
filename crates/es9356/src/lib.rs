//! ES9356 SoundWire codec driver
//!
//! Glue between the SoundWire bus core, the ASoC core and the PM core for
//! the Everest Semiconductor ES9356 (manufacturer `0x04b3`, part `0x9356`).
//! The frameworks themselves are modelled by the traits in [`platform`]; this
//! crate implements them for one device.
//!
//! # Call flow
//!
//! ```text
//! bus core  ──▶ SdwSlaveOps  (read_prop, update_status, bus_config, port_prep, interrupt)
//! ASoC core ──▶ DaiOps       (startup, hw_params, prepare, mute, hw_free, shutdown)
//! PM core   ──▶ DevPmOps     (suspend/resume, runtime_suspend/runtime_resume)
//!                  │
//!                  ▼  device mutex
//!              Regmap ──▶ SdwBus (single-byte register transactions)
//! ```
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> Result<(), es9356::Error<platform::mocks::SimBusError>> {
//! use es9356::{Es9356, Es9356Config, ProbeResources};
//! use platform::mocks::{MockRegistry, RecordingDelay, SimulatedSdwBus};
//! use platform::{DaiOps, HwParams, PcmFormat, SdwDeviceId, SdwSlaveOps, SlaveStatus};
//! use platform::{StreamDirection, StreamHandle};
//!
//! let bus = SimulatedSdwBus::with_registers(es9356::registers::REG_DEFAULTS);
//! let mut registry = MockRegistry::new();
//! let codec = Es9356::probe(
//!     bus,
//!     SdwDeviceId::slave_entry(0x04b3, 0x9356, 0),
//!     ProbeResources::new(RecordingDelay::new()),
//!     &mut registry,
//!     Es9356Config::default(),
//! )
//! .await?;
//!
//! codec.update_status(SlaveStatus::Attached).await?;
//! codec.startup(StreamDirection::Playback).await?;
//! codec.set_stream(StreamDirection::Playback, Some(StreamHandle(1))).await?;
//! codec
//!     .hw_params(StreamDirection::Playback, &HwParams::new(48_000, PcmFormat::S24Le, 2))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `std`: host builds, logs through `tracing`
//! - `defmt`: hardware builds, logs through `defmt`

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
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)]

// Must come first: the log macros are textually scoped.
#[macro_use]
mod fmt;

pub mod config;
pub mod dai;
pub mod dapm;
pub mod driver;
pub mod error;
pub mod pm;
pub mod regmap;
pub mod registers;
pub mod slave;
pub mod state;

pub use config::{Es9356Config, DRIVER_NAME, SYMBOL_NAMESPACE};
pub use dai::{es9356_mute_stream, ES9356_DAI};
pub use driver::{Es9356, NoResetPin, ProbeResources, COMPONENT, ES9356_SDW_ID};
pub use error::{Error, Result};
pub use regmap::{Regmap, RegmapConfig, ES9356_REGMAP};
pub use state::{SlaveState, Snapshot};
