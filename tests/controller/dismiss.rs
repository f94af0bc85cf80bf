use controlkit::{will_pop, Controller, ControllerBase, LoadingScope};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
struct PlainController {
    base: ControllerBase,
}

impl Controller for PlainController {
    fn base(&self) -> &ControllerBase {
        &self.base
    }
}

/// Also refuses to close while the form has unsaved edits
#[derive(Default)]
struct FormController {
    base: ControllerBase,
    dirty: AtomicBool,
}

impl Controller for FormController {
    fn base(&self) -> &ControllerBase {
        &self.base
    }

    fn allow_dismiss(&self) -> bool {
        self.base.allow_dismiss() && !self.dirty.load(Ordering::SeqCst)
    }
}

#[test]
fn test_dismiss_follows_default_flag() {
    let controller = PlainController::default();
    assert!(controller.allow_dismiss());

    controller.base().set_is_loading(true);
    assert!(!controller.allow_dismiss());

    controller.base().set_is_loading(false);
    assert!(controller.allow_dismiss());
}

#[test]
fn test_tagged_flags_never_block_dismiss() {
    let controller = PlainController::default();
    controller.base().set_is_loading_by_tag("upload", true);
    let _guard = controller.base().enter(&LoadingScope::tag("download"));

    assert!(controller.allow_dismiss());
    assert!(will_pop(&controller));
}

#[test]
fn test_override_composes_with_base_result() {
    let controller = FormController::default();
    assert!(controller.allow_dismiss());

    controller.dirty.store(true, Ordering::SeqCst);
    assert!(!controller.allow_dismiss());

    controller.dirty.store(false, Ordering::SeqCst);
    controller.base().set_is_loading(true);
    assert!(!will_pop(&controller));
}

#[test]
fn test_will_pop_on_trait_object() {
    let controller: Box<dyn Controller> = Box::new(PlainController::default());
    assert!(will_pop(controller.as_ref()));

    let _guard = controller.base().enter(&LoadingScope::Default);
    assert!(!will_pop(controller.as_ref()));
}

#[tokio::test]
async fn test_dismiss_blocked_during_wait() {
    let controller = PlainController::default();

    let allowed_during = controller.base().wait(|| async { controller.allow_dismiss() }).await;

    assert!(!allowed_during);
    assert!(controller.allow_dismiss());
}
