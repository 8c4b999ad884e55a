/// The UI that shows the published list.
///
/// `items_changed` is called after every publish and every preview update,
/// from runtime worker threads and never while controller state is locked.
/// Hosts respond by pulling [`crate::QueryController::items`].
pub trait ResultsHost: Send + Sync {
    fn items_changed(&self);
}

/// Host that ignores notifications; for callers that only poll.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedHost;

impl ResultsHost for DetachedHost {
    fn items_changed(&self) {}
}
