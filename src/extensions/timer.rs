use std::any::Any;

use super::ViewEvent;

/// Periodic or one-shot behavior owned by a view scope.
///
/// The scope drives `tick`, broadcasts the returned events and calls `stop`
/// on every timer when it detaches.
pub trait ViewTimer: Any {
    fn id(&self) -> &str;
    fn start(&mut self);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
    fn tick(&mut self, delta_secs: f64) -> Option<ViewEvent>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
