//! Component registration with the audio framework

use thiserror_no_std::Error;

use crate::dai::DaiDriverDesc;
use crate::dapm::{DapmGraph, Route, Widget};

/// Registration failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// A component with this name is already registered.
    #[error("component already registered")]
    AlreadyRegistered,
    /// No component with this name is registered.
    #[error("component not registered")]
    NotRegistered,
    /// The framework refused the registration.
    #[error("registration rejected")]
    Rejected,
}

/// Static component declaration (`struct snd_soc_component_driver`).
#[derive(Debug, Clone, Copy)]
pub struct ComponentDriverDesc {
    /// Component name.
    pub name: &'static str,
    /// DAPM widgets.
    pub widgets: &'static [Widget],
    /// DAPM routes.
    pub routes: &'static [Route],
    /// Component is endianness-agnostic.
    pub endianness: bool,
}

impl ComponentDriverDesc {
    /// The component's DAPM graph.
    #[must_use]
    pub const fn graph(&self) -> DapmGraph<'static> {
        DapmGraph::new(self.widgets, self.routes)
    }
}

/// The audio framework's component registry.
pub trait ComponentRegistry {
    /// Register a component and its DAIs.
    fn register_component(
        &mut self,
        component: &ComponentDriverDesc,
        dais: &[DaiDriverDesc],
    ) -> Result<(), RegistryError>;

    /// Unregister a component by name.
    fn unregister_component(&mut self, name: &str) -> Result<(), RegistryError>;
}
