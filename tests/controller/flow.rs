use controlkit::{Controller, ControllerBase, DispatchOutcome, LoadingScope, Observable};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
enum SaveError {
    Conflict,
    Offline,
}

#[derive(Debug)]
struct SessionExpired;

struct ProfileController {
    base: ControllerBase,
    error_text: Observable<Option<String>>,
}

impl Controller for ProfileController {
    fn base(&self) -> &ControllerBase {
        &self.base
    }
}

impl ProfileController {
    fn new() -> Self {
        Self {
            base: ControllerBase::default(),
            error_text: Observable::new(None),
        }
    }

    async fn save(&self, result: Result<u32, SaveError>) -> Option<u32> {
        match self.base.wait_tagged("save", || async move { result }).await {
            Ok(version) => Some(version),
            Err(err) => {
                self.base.handle_error(err).await;
                None
            }
        }
    }
}

#[tokio::test]
async fn test_failed_save_is_presented_by_view_handler() {
    let controller = ProfileController::new();
    let error_text = controller.error_text.clone();
    controller.base().set_sync_error_handler(move |err: SaveError| {
        error_text.set(Some(format!("{:?}", err)));
    });

    let transitions = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&transitions);
    let _sub = controller
        .base()
        .loading_view()
        .subscribe(&LoadingScope::tag("save"), move |busy| sink.lock().unwrap().push(busy));

    assert_eq!(controller.save(Ok(3)).await, Some(3));
    assert_eq!(controller.error_text.get(), None);

    assert_eq!(controller.save(Err(SaveError::Conflict)).await, None);
    assert_eq!(controller.error_text.get(), Some("Conflict".to_string()));

    assert_eq!(*transitions.lock().unwrap(), vec![true, false, true, false]);
    assert!(!controller.base().is_loading_by_tag("save"));
    assert!(controller.allow_dismiss());
}

#[tokio::test]
async fn test_wait_does_not_dispatch_by_itself() {
    let controller = ProfileController::new();
    let calls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);
    controller.base().set_sync_error_handler(move |_: SaveError| *counter.lock().unwrap() += 1);

    let result = controller
        .base()
        .wait(|| async { Err::<(), _>(SaveError::Offline) })
        .await;

    assert_eq!(result, Err(SaveError::Offline));
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_unregistered_error_leaves_state_untouched() {
    let controller = ProfileController::new();
    controller.base().set_sync_error_handler(|_: SaveError| {});

    let outcome = controller.base().handle_error(SessionExpired).await;

    assert!(matches!(outcome, DispatchOutcome::Unhandled));
    assert_eq!(controller.error_text.get(), None);
}
