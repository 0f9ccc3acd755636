use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{DeviceMode, ElementId, Tween, select_mode_with_breakpoint};
use crate::error::{RevealError, RevealResult};
use crate::extensions::{ViewContext, ViewEvent, ViewListener, ViewTimer};
use crate::interaction::{
    AutoScrollCoordinator, AutoScrollStatus, IntersectionEntry, ObservationHandle,
    ObserveOptions, ObservedTarget, ObserverEvent, ObserverRegistry, ScrollTarget, TargetKind,
    ViewportHost,
};
use crate::render::{StyleFrame, StyleSink};

use super::{EngineConfig, RevealController, RevealGroupId, RevealParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(pub u64);

/// When a scope-owned timer starts running.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerTrigger {
    Immediate,
    /// First viewport entry of `element`.
    OnEnter {
        element: ElementId,
        options: ObserveOptions,
    },
}

/// Observer events the scope did not consume itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchOutcome {
    pub unclaimed: Vec<ObserverEvent>,
    pub revealed: Vec<ElementId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetachReport {
    pub released_observers: usize,
    pub released_timers: usize,
    pub cancelled_scroll: bool,
}

/// Lifetime of one attached view.
///
/// Everything a view creates against its host (observations, tweens,
/// timers and the auto-scroll operation) is owned here and released by
/// `detach`, which also runs on drop.
pub struct ViewScope<H: ViewportHost, S: StyleSink> {
    host: H,
    sink: S,
    mode: DeviceMode,
    registry: ObserverRegistry,
    reveal: RevealController,
    auto_scroll: AutoScrollCoordinator,
    listeners: Vec<Box<dyn ViewListener>>,
    timers: IndexMap<TimerId, Box<dyn ViewTimer>>,
    timer_handles: IndexMap<ObservationHandle, TimerId>,
    pending_timer_triggers: Vec<(TimerId, ElementId, ObserveOptions)>,
    next_timer: u64,
    attached: bool,
}

impl<H: ViewportHost, S: StyleSink> ViewScope<H, S> {
    /// Attaches a scope to `host`.
    ///
    /// The device mode is read from the host viewport here, once.
    pub fn attach(host: H, sink: S, config: &EngineConfig) -> RevealResult<Self> {
        let config = config.validate()?;
        let viewport = host.viewport();
        let mode = select_mode_with_breakpoint(viewport.width, config.compact_breakpoint_px);
        let auto_scroll = AutoScrollCoordinator::new(config.auto_scroll)?;
        debug!(?mode, width = viewport.width, "view scope attached");
        Ok(Self {
            host,
            sink,
            mode,
            registry: ObserverRegistry::new(),
            reveal: RevealController::new(mode),
            auto_scroll,
            listeners: Vec::new(),
            timers: IndexMap::new(),
            timer_handles: IndexMap::new(),
            pending_timer_triggers: Vec::new(),
            next_timer: 0,
            attached: true,
        })
    }

    #[must_use]
    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access for geometry updates and user scrolling.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[must_use]
    pub fn registry(&self) -> &ObserverRegistry {
        &self.registry
    }

    #[must_use]
    pub fn reveal(&self) -> &RevealController {
        &self.reveal
    }

    #[must_use]
    pub fn auto_scroll(&self) -> &AutoScrollCoordinator {
        &self.auto_scroll
    }

    /// Registers a listener with a unique, non-empty id.
    pub fn register_listener(&mut self, listener: Box<dyn ViewListener>) -> RevealResult<()> {
        let listener_id = listener.id().to_owned();
        if listener_id.is_empty() {
            return Err(RevealError::InvalidData(
                "listener id must not be empty".to_owned(),
            ));
        }
        if self.listeners.iter().any(|entry| entry.id() == listener_id) {
            return Err(RevealError::InvalidData(format!(
                "listener with id `{listener_id}` is already registered"
            )));
        }
        self.listeners.push(listener);
        Ok(())
    }

    /// Unregisters a listener by id. Returns `true` when removed.
    pub fn unregister_listener(&mut self, listener_id: &str) -> bool {
        if let Some(position) = self
            .listeners
            .iter()
            .position(|entry| entry.id() == listener_id)
        {
            self.listeners.remove(position);
            return true;
        }
        false
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn context(&self) -> ViewContext {
        ViewContext {
            mode: self.mode,
            viewport: self.host.viewport(),
            scroll_position: self.host.scroll_position(),
            observation_count: self.registry.len(),
            active_timers: self.active_timer_count(),
            active_tasks: self.active_task_count(),
        }
    }

    pub(crate) fn emit(&mut self, event: ViewEvent) {
        if self.listeners.is_empty() {
            return;
        }
        let context = self.context();
        for listener in &mut self.listeners {
            listener.on_event(&event, context);
        }
    }

    /// Hands a frame to the sink. Sink failures are logged, not propagated.
    pub fn apply(&mut self, frame: &StyleFrame) {
        if frame.is_empty() {
            return;
        }
        if let Err(err) = self.sink.apply(frame) {
            warn!(error = %err, "style sink rejected frame");
        }
    }

    /// Observes `element` on behalf of the owning view.
    pub fn observe(
        &mut self,
        element: ElementId,
        kind: TargetKind,
        options: ObserveOptions,
    ) -> Option<ObservationHandle> {
        if !self.attached {
            return None;
        }
        self.registry
            .observe(&mut self.host, ObservedTarget::new(element, kind), options)
    }

    pub fn unobserve(&mut self, handle: ObservationHandle) -> bool {
        self.registry.unobserve(&mut self.host, handle)
    }

    /// Registers a reveal group and applies its initial states.
    pub fn register_reveal_group(
        &mut self,
        targets: &[ElementId],
        kind: TargetKind,
        params: RevealParams,
    ) -> RevealResult<(RevealGroupId, Vec<ElementId>)> {
        if !self.attached {
            return Err(RevealError::Host("view scope is detached".to_owned()));
        }
        let (id, outcome) = self.reveal.register_reveal_group(
            &mut self.registry,
            &mut self.host,
            targets,
            kind,
            params,
        )?;
        self.apply(&outcome.frame);
        for &element in &outcome.newly_revealed {
            self.emit(ViewEvent::TargetRevealed { element });
        }
        Ok((id, outcome.newly_revealed))
    }

    /// Runs a tween on `element` alongside reveal tweens.
    pub fn animate(&mut self, element: ElementId, tween: Tween) {
        if self.attached {
            self.reveal.animate(element, tween);
        }
    }

    /// Retries observations that failed while the host root was detached.
    pub fn retry_pending(&mut self) -> RevealResult<usize> {
        if !self.attached {
            return Ok(0);
        }
        let mut created = self
            .reveal
            .reobserve_pending(&mut self.registry, &mut self.host)?;
        let pending = std::mem::take(&mut self.pending_timer_triggers);
        for (timer, element, options) in pending {
            created += usize::from(self.observe_timer_trigger(timer, element, options));
        }
        Ok(created)
    }

    /// Pulls pending entries from the host and dispatches them.
    pub fn poll(&mut self) -> DispatchOutcome {
        if !self.attached {
            return DispatchOutcome::default();
        }
        let entries = self.host.take_entries();
        self.handle_intersections(&entries)
    }

    /// Routes host entries to reveal groups and timer triggers.
    ///
    /// Events for observations the scope does not own are returned in
    /// `unclaimed` for the owning view to interpret.
    pub fn handle_intersections(&mut self, entries: &[IntersectionEntry]) -> DispatchOutcome {
        if !self.attached || entries.is_empty() {
            return DispatchOutcome::default();
        }
        let events = self.registry.dispatch(&mut self.host, entries);

        let mut reveal_events = Vec::new();
        let mut unclaimed = Vec::new();
        for event in events {
            if self.reveal.owns(event.handle) {
                reveal_events.push(event);
            } else if let Some(timer) = self.timer_handles.get(&event.handle).copied() {
                self.timer_handles.shift_remove(&event.handle);
                self.unobserve(event.handle);
                if let Some(timer) = self.timers.get_mut(&timer) {
                    timer.start();
                }
            } else {
                unclaimed.push(event);
            }
        }

        let outcome = self.reveal.handle_events(&reveal_events);
        self.apply(&outcome.frame);
        for &element in &outcome.newly_revealed {
            self.emit(ViewEvent::TargetRevealed { element });
        }
        DispatchOutcome {
            unclaimed,
            revealed: outcome.newly_revealed,
        }
    }

    /// Advances tweens, timers and auto-scroll by one host frame.
    pub fn tick(&mut self, delta_secs: f64) -> AutoScrollStatus {
        if !self.attached {
            return AutoScrollStatus::Idle;
        }
        let frame = self.reveal.tick(delta_secs);
        self.apply(&frame);

        let mut timer_events = Vec::new();
        for timer in self.timers.values_mut() {
            if let Some(event) = timer.tick(delta_secs) {
                timer_events.push(event);
            }
        }
        for event in timer_events {
            self.emit(event);
        }

        let status = self.auto_scroll.tick(&mut self.host, delta_secs);
        if let AutoScrollStatus::Finished(outcome) = status {
            self.emit(ViewEvent::AutoScrollFinished { outcome });
        }
        status
    }

    pub fn start_auto_scroll(&mut self, target: ScrollTarget) -> bool {
        if !self.attached || !self.auto_scroll.start(&self.host, target) {
            return false;
        }
        if let Some(operation) = self.auto_scroll.active_operation() {
            let target = operation.target;
            self.emit(ViewEvent::AutoScrollStarted { target });
        }
        true
    }

    pub fn cancel_auto_scroll(&mut self) -> bool {
        let cancelled = self.auto_scroll.cancel();
        if cancelled {
            self.emit(ViewEvent::AutoScrollFinished {
                outcome: crate::interaction::AutoScrollOutcome::Cancelled,
            });
        }
        cancelled
    }

    /// Hands `timer` to the scope.
    pub fn add_timer(&mut self, mut timer: Box<dyn ViewTimer>, trigger: TimerTrigger) -> TimerId {
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        match trigger {
            TimerTrigger::Immediate if self.attached => timer.start(),
            TimerTrigger::Immediate => {}
            TimerTrigger::OnEnter { element, options } => {
                if !self.observe_timer_trigger(id, element, options) && self.attached {
                    self.pending_timer_triggers.push((id, element, options));
                }
            }
        }
        debug!(timer = id.0, name = timer.id(), "timer added");
        self.timers.insert(id, timer);
        id
    }

    fn observe_timer_trigger(
        &mut self,
        id: TimerId,
        element: ElementId,
        options: ObserveOptions,
    ) -> bool {
        match self.observe(element, TargetKind::Section, options.with_once(true)) {
            Some(handle) => {
                self.timer_handles.insert(handle, id);
                true
            }
            None => false,
        }
    }

    /// Stops and removes a timer. Returns `true` when it existed.
    pub fn remove_timer(&mut self, id: TimerId) -> bool {
        let Some(mut timer) = self.timers.shift_remove(&id) else {
            return false;
        };
        timer.stop();
        let handles: Vec<ObservationHandle> = self
            .timer_handles
            .iter()
            .filter(|(_, timer)| **timer == id)
            .map(|(handle, _)| *handle)
            .collect();
        for handle in handles {
            self.timer_handles.shift_remove(&handle);
            self.unobserve(handle);
        }
        self.pending_timer_triggers.retain(|(timer, _, _)| *timer != id);
        true
    }

    #[must_use]
    pub fn timer<T: ViewTimer>(&self, id: TimerId) -> Option<&T> {
        self.timers
            .get(&id)
            .and_then(|timer| timer.as_any().downcast_ref::<T>())
    }

    pub fn timer_mut<T: ViewTimer>(&mut self, id: TimerId) -> Option<&mut T> {
        self.timers
            .get_mut(&id)
            .and_then(|timer| timer.as_any_mut().downcast_mut::<T>())
    }

    #[must_use]
    pub fn active_timer_count(&self) -> usize {
        self.timers.values().filter(|timer| timer.is_running()).count()
    }

    /// Everything still advancing on `tick`: timers, tweens and auto-scroll.
    #[must_use]
    pub fn active_task_count(&self) -> usize {
        self.active_timer_count()
            + self.reveal.active_tween_count()
            + usize::from(self.auto_scroll.is_active())
    }

    /// Releases every observation, tween, timer and scroll operation.
    ///
    /// Idempotent: a second call releases nothing and reports zeros.
    pub fn detach(&mut self) -> DetachReport {
        if !self.attached {
            return DetachReport::default();
        }
        let released_observers = self.registry.unobserve_all(&mut self.host);
        let mut released_timers = self.reveal.cancel_all();
        for timer in self.timers.values_mut() {
            if timer.is_running() {
                released_timers += 1;
            }
            timer.stop();
        }
        self.timer_handles.clear();
        self.pending_timer_triggers.clear();
        let cancelled_scroll = self.auto_scroll.cancel();

        let report = DetachReport {
            released_observers,
            released_timers,
            cancelled_scroll,
        };
        debug!(
            released_observers,
            released_timers, cancelled_scroll, "view scope detached"
        );
        self.emit(ViewEvent::Detached {
            released_observers,
            released_timers,
        });
        self.attached = false;
        report
    }
}

impl<H: ViewportHost, S: StyleSink> Drop for ViewScope<H, S> {
    fn drop(&mut self) {
        self.detach();
    }
}
