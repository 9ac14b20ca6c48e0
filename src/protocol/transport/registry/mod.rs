//! Name-keyed registry of [`CanInterface`] backends.
//!
//! Backends are registered at start-up (statically linked or discovered by
//! the firmware) and opened by name at runtime. The key is the name the
//! backend reports through [`CanInterface::name`]. The registry borrows
//! backends, it never owns or allocates.
use heapless::Vec;

use crate::error::{CanError, CanResult};
use crate::protocol::transport::traits::can_interface::CanInterface;

/// Fixed-capacity registry holding up to `N` backends.
pub struct BackendRegistry<'a, const N: usize> {
    entries: Vec<&'a mut dyn CanInterface, N>,
}

impl<const N: usize> Default for BackendRegistry<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> BackendRegistry<'a, N> {
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Register `backend` under its own name.
    ///
    /// Fails with `GenericFailure` when the name is taken and with
    /// `NotSupported` when the registry is full.
    pub fn register(&mut self, backend: &'a mut dyn CanInterface) -> CanResult {
        if self.contains(backend.name()) {
            #[cfg(feature = "defmt")]
            defmt::warn!("backend {} already registered", backend.name());
            return Err(CanError::GenericFailure);
        }
        #[cfg(feature = "defmt")]
        defmt::debug!("registering backend {}", backend.name());
        self.entries
            .push(backend)
            .map_err(|_| CanError::NotSupported)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|backend| backend.name() == name)
    }

    /// Look a backend up; a missing name yields `LibraryLoadFailed`.
    pub fn get_mut(&mut self, name: &str) -> CanResult<&mut (dyn CanInterface + 'a)> {
        self.entries
            .iter_mut()
            .find(|backend| backend.name() == name)
            .map(|backend| &mut **backend)
            .ok_or(CanError::LibraryLoadFailed)
    }

    /// Look `name` up and connect it.
    pub fn open(&mut self, name: &str) -> CanResult<&mut (dyn CanInterface + 'a)> {
        let backend = self.get_mut(name)?;
        backend.connect()?;
        #[cfg(feature = "defmt")]
        defmt::info!("backend {} connected", name);
        Ok(backend)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<&str, N> {
        self.entries.iter().map(|backend| backend.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
