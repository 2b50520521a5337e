//! Power management abstraction
//!
//! Device PM callbacks (system sleep and runtime PM) and the bookkeeping of a
//! bulk set of supply regulators.

/// Device PM callbacks (`struct dev_pm_ops`).
pub trait DevPmOps {
    /// Error type
    type Error: core::fmt::Debug;

    /// System sleep entry.
    async fn suspend(&self) -> Result<(), Self::Error>;

    /// System sleep exit.
    async fn resume(&self) -> Result<(), Self::Error>;

    /// Runtime PM idle entry.
    async fn runtime_suspend(&self) -> Result<(), Self::Error>;

    /// Runtime PM idle exit.
    async fn runtime_resume(&self) -> Result<(), Self::Error>;
}

/// Which PM path is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PmKind {
    /// System sleep.
    System,
    /// Runtime PM.
    Runtime,
}

/// A fixed set of named supplies switched together (`regulator_bulk_data`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplyBulk<const N: usize> {
    names: [&'static str; N],
    enabled: bool,
}

impl<const N: usize> SupplyBulk<N> {
    /// All supplies start disabled.
    #[must_use]
    pub const fn new(names: [&'static str; N]) -> Self {
        Self {
            names,
            enabled: false,
        }
    }

    /// Supply names.
    #[must_use]
    pub fn names(&self) -> &[&'static str; N] {
        &self.names
    }

    /// Switch every supply on.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Switch every supply off.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Whether the bulk is on.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
