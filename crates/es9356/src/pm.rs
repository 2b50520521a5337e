//! System sleep and runtime PM.
//!
//! Both paths share one implementation and the device mutex, so a suspend
//! can never interleave with stream setup or an interrupt. Suspend is
//! refused while any direction is open; the caller retries once the
//! streams close.

use platform::{DevPmOps, PmKind, SdwBus};

use crate::driver::{check_identity, Es9356};
use crate::error::{Error, Result};
use crate::state::SlaveState;

impl<B: SdwBus, P> Es9356<B, P> {
    async fn pm_suspend(&self, kind: PmKind) -> Result<(), B::Error> {
        let mut inner = self.lock().await;
        if inner.state.suspended {
            return Ok(());
        }
        if !inner.state.stream_use.is_empty() {
            warn!(
                "es9356: {:?} suspend refused, streams {:#x} open",
                kind,
                inner.state.stream_use.bits()
            );
            return Err(Error::Busy);
        }
        inner.regmap.set_cache_only(true);
        inner.supplies.disable();
        inner.state.suspended = true;
        info!("es9356: {:?} suspend", kind);
        Ok(())
    }

    async fn pm_resume(&self, kind: PmKind) -> Result<(), B::Error> {
        let mut inner = self.lock().await;
        if !inner.state.suspended {
            return Ok(());
        }
        inner.supplies.enable();

        if inner.state.slave == SlaveState::Unattached {
            // Nothing to talk to yet; the next attach runs hardware init.
            inner.state.suspended = false;
            info!("es9356: {:?} resume, waiting for attach", kind);
            return Ok(());
        }

        inner.regmap.set_cache_only(false);
        let restored = match check_identity(&mut inner.regmap).await {
            // Supplies were off: register contents are back at power-on values.
            Ok(()) => inner.io_init().await,
            Err(e) => Err(e),
        };
        if let Err(e) = restored {
            // Stay suspended; the next resume starts over.
            warn!("es9356: {:?} resume failed", kind);
            inner.state.hw_init = false;
            inner.regmap.set_cache_only(true);
            inner.supplies.disable();
            return Err(e);
        }
        inner.state.suspended = false;
        info!("es9356: {:?} resume", kind);
        Ok(())
    }
}

impl<B: SdwBus, P> DevPmOps for Es9356<B, P> {
    type Error = Error<B::Error>;

    async fn suspend(&self) -> Result<(), B::Error> {
        self.pm_suspend(PmKind::System).await
    }

    async fn resume(&self) -> Result<(), B::Error> {
        self.pm_resume(PmKind::System).await
    }

    async fn runtime_suspend(&self) -> Result<(), B::Error> {
        self.pm_suspend(PmKind::Runtime).await
    }

    async fn runtime_resume(&self) -> Result<(), B::Error> {
        self.pm_resume(PmKind::Runtime).await
    }
}
