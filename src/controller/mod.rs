//! Controllers.
//!
//! A controller embeds a [`ControllerBase`] and implements [`Controller`] to
//! expose it. The trait's provided methods give the dismiss guard and teardown;
//! everything else (loading flags, `wait`, error dispatch) lives on the base.
//!
//! ```
//! use controlkit::{Controller, ControllerBase};
//!
//! #[derive(Default)]
//! struct UploadController {
//!     base: ControllerBase,
//! }
//!
//! impl Controller for UploadController {
//!     fn base(&self) -> &ControllerBase {
//!         &self.base
//!     }
//! }
//!
//! let controller = UploadController::default();
//! assert!(controller.allow_dismiss());
//! controller.dispose();
//! ```

mod base;

pub use base::ControllerBase;

use log::debug;

use crate::constants::LOG_DISMISS_BLOCKED;

pub trait Controller: Send + Sync {
    fn base(&self) -> &ControllerBase;

    /// Whether the view may be dismissed right now.
    ///
    /// Overrides usually AND extra conditions onto
    /// [`ControllerBase::allow_dismiss`].
    fn allow_dismiss(&self) -> bool {
        self.base().allow_dismiss()
    }

    /// Teardown hook, run once after the base state has been released.
    fn on_close(&self) {}

    /// Release all observable state, then run [`on_close`](Self::on_close).
    /// Later calls do nothing.
    fn dispose(&self) {
        if self.base().dispose() {
            self.on_close();
        }
    }
}

/// Dismiss guard for view code: call before popping/closing the view.
pub fn will_pop<C>(controller: &C) -> bool
where
    C: Controller + ?Sized,
{
    let allowed = controller.allow_dismiss();
    if !allowed {
        debug!("{}", LOG_DISMISS_BLOCKED);
    }
    allowed
}
