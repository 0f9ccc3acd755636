use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::core::{DeviceMode, ElementId, Ease, Side, TriggerStart, Tween, VisualState};
use crate::error::{RevealError, RevealResult};
use crate::interaction::{
    IntersectionHost, ObservationHandle, ObserveOptions, ObservedTarget, ObserverEvent,
    ObserverRegistry, TargetKind, Transition,
};
use crate::render::StyleFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RevealGroupId(pub u64);

/// What happens when a revealed target leaves the trigger area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayPolicy {
    /// Reveal once; later exits and re-entries are ignored.
    Once,
    /// Animate back to the hidden state on leave and replay on re-entry.
    ReverseOnLeave,
}

/// Which targets' entries start the group's animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupTrigger {
    /// Every target reveals on its own entry.
    EachTarget,
    /// The first target's entry reveals the whole group, staggered.
    FirstTarget,
}

/// Reveal behavior under the compact device mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompactBehavior {
    Animate,
    /// Show targets in their natural state right away, no observation.
    Immediate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevealParams {
    pub from: VisualState,
    pub duration_secs: f64,
    #[serde(default)]
    pub stagger_secs: f64,
    #[serde(default)]
    pub ease: Ease,
    pub start: TriggerStart,
    #[serde(default)]
    pub threshold: f64,
    pub replay: ReplayPolicy,
    pub trigger: GroupTrigger,
    pub compact: CompactBehavior,
}

impl Default for RevealParams {
    fn default() -> Self {
        Self {
            from: VisualState::faded_offset_y(30.0),
            duration_secs: 0.6,
            stagger_secs: 0.0,
            ease: Ease::Power3Out,
            start: TriggerStart::top_at_percent(95.0),
            threshold: 0.0,
            replay: ReplayPolicy::Once,
            trigger: GroupTrigger::EachTarget,
            compact: CompactBehavior::Animate,
        }
    }
}

impl RevealParams {
    /// Page section that fades up near the bottom edge and hides again on leave.
    #[must_use]
    pub fn section() -> Self {
        Self {
            from: VisualState::faded_offset_y(40.0),
            duration_secs: 1.0,
            start: TriggerStart::top_at_percent(98.0),
            replay: ReplayPolicy::ReverseOnLeave,
            ..Self::default()
        }
    }

    /// Card grid revealed together when its first card enters.
    #[must_use]
    pub fn staggered_cards() -> Self {
        Self {
            from: VisualState::faded_offset_y(40.0),
            stagger_secs: 0.12,
            trigger: GroupTrigger::FirstTarget,
            ..Self::default()
        }
    }

    /// Chronology item sliding in from its side of the line.
    #[must_use]
    pub fn timeline_item(side: Side) -> Self {
        Self {
            from: VisualState::faded_offset_x(side.sign() * 50.0),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn year_marker() -> Self {
        Self {
            from: VisualState::TRANSPARENT.with_scale(0.5),
            ease: Ease::back_out(1.7),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn process_step_compact() -> Self {
        Self {
            ease: Ease::Power2Out,
            start: TriggerStart::top_at_percent(90.0),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_from(mut self, from: VisualState) -> Self {
        self.from = from;
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration_secs: f64) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    #[must_use]
    pub fn with_stagger(mut self, stagger_secs: f64) -> Self {
        self.stagger_secs = stagger_secs;
        self
    }

    #[must_use]
    pub fn with_start(mut self, start: TriggerStart) -> Self {
        self.start = start;
        self
    }

    #[must_use]
    pub fn with_replay(mut self, replay: ReplayPolicy) -> Self {
        self.replay = replay;
        self
    }

    #[must_use]
    pub fn with_trigger(mut self, trigger: GroupTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    #[must_use]
    pub fn with_compact(mut self, compact: CompactBehavior) -> Self {
        self.compact = compact;
        self
    }

    pub fn validate(self) -> RevealResult<Self> {
        self.from.validate("reveal.from")?;
        if !self.duration_secs.is_finite() || self.duration_secs < 0.0 {
            return Err(RevealError::InvalidConfig(
                "reveal duration must be finite and >= 0".to_owned(),
            ));
        }
        if !self.stagger_secs.is_finite() || self.stagger_secs < 0.0 {
            return Err(RevealError::InvalidConfig(
                "reveal stagger must be finite and >= 0".to_owned(),
            ));
        }
        if !self.ease.is_valid() {
            return Err(RevealError::InvalidConfig(
                "reveal easing parameters must be finite and >= 0".to_owned(),
            ));
        }
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(RevealError::InvalidConfig(
                "reveal threshold must be within [0, 1]".to_owned(),
            ));
        }
        self.start.to_root_margin()?;
        Ok(self)
    }

    fn observe_options(self) -> RevealResult<ObserveOptions> {
        Ok(ObserveOptions::from_trigger(self.start)?
            .with_threshold(self.threshold)
            .with_once(self.replay == ReplayPolicy::Once))
    }
}

#[derive(Debug, Clone, Copy)]
struct RevealTarget {
    element: ElementId,
    handle: Option<ObservationHandle>,
    revealed: bool,
}

#[derive(Debug, Clone)]
struct RevealGroup {
    kind: TargetKind,
    params: RevealParams,
    targets: Vec<RevealTarget>,
}

impl RevealGroup {
    /// Indexes of targets that carry their own observation.
    fn observed_indexes(&self) -> std::ops::Range<usize> {
        match self.params.trigger {
            GroupTrigger::EachTarget => 0..self.targets.len(),
            GroupTrigger::FirstTarget => 0..self.targets.len().min(1),
        }
    }
}

/// Result of processing observer events or registering a group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevealOutcome {
    pub frame: StyleFrame,
    /// Targets that reached their revealed state for the first time.
    pub newly_revealed: Vec<ElementId>,
}

/// One-shot and replayable entrance animations keyed to viewport entry.
///
/// The controller never touches the host beyond observation calls: it turns
/// observer events into tweens and tweens into style frames.
#[derive(Debug)]
pub struct RevealController {
    mode: DeviceMode,
    groups: IndexMap<RevealGroupId, RevealGroup>,
    by_handle: IndexMap<ObservationHandle, (RevealGroupId, usize)>,
    tweens: IndexMap<ElementId, Tween>,
    current: IndexMap<ElementId, VisualState>,
    next_group: u64,
}

impl RevealController {
    #[must_use]
    pub fn new(mode: DeviceMode) -> Self {
        Self {
            mode,
            groups: IndexMap::new(),
            by_handle: IndexMap::new(),
            tweens: IndexMap::new(),
            current: IndexMap::new(),
            next_group: 0,
        }
    }

    #[must_use]
    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    /// Hides `targets` and starts observing them.
    ///
    /// Under compact mode with `CompactBehavior::Immediate` the targets are
    /// shown at once instead. Observations that cannot be created yet are
    /// retried by `reobserve_pending`.
    pub fn register_reveal_group<H: IntersectionHost + ?Sized>(
        &mut self,
        registry: &mut ObserverRegistry,
        host: &mut H,
        targets: &[ElementId],
        kind: TargetKind,
        params: RevealParams,
    ) -> RevealResult<(RevealGroupId, RevealOutcome)> {
        let params = params.validate()?;
        self.next_group += 1;
        let id = RevealGroupId(self.next_group);
        let mut outcome = RevealOutcome::default();

        let immediate =
            self.mode.is_compact() && params.compact == CompactBehavior::Immediate;
        let group = RevealGroup {
            kind,
            params,
            targets: targets
                .iter()
                .map(|&element| RevealTarget {
                    element,
                    handle: None,
                    revealed: immediate,
                })
                .collect(),
        };

        let initial = if immediate {
            VisualState::NATURAL
        } else {
            params.from
        };
        for &element in targets {
            self.current.insert(element, initial);
            outcome.frame.set_state(element, initial);
            if immediate {
                outcome.newly_revealed.push(element);
            }
        }

        debug!(
            group = id.0,
            targets = targets.len(),
            ?kind,
            immediate,
            "reveal group registered"
        );
        self.groups.insert(id, group);
        if !immediate {
            self.observe_group(registry, host, id)?;
        }
        Ok((id, outcome))
    }

    /// Retries observations that could not be created earlier.
    ///
    /// Returns how many observations were created.
    pub fn reobserve_pending<H: IntersectionHost + ?Sized>(
        &mut self,
        registry: &mut ObserverRegistry,
        host: &mut H,
    ) -> RevealResult<usize> {
        let ids: Vec<RevealGroupId> = self.groups.keys().copied().collect();
        let mut created = 0;
        for id in ids {
            created += self.observe_group(registry, host, id)?;
        }
        Ok(created)
    }

    fn observe_group<H: IntersectionHost + ?Sized>(
        &mut self,
        registry: &mut ObserverRegistry,
        host: &mut H,
        id: RevealGroupId,
    ) -> RevealResult<usize> {
        let Some(group) = self.groups.get_mut(&id) else {
            return Ok(0);
        };
        let options = group.params.observe_options()?;
        let once = group.params.replay == ReplayPolicy::Once;
        let mut created = 0;
        for index in group.observed_indexes() {
            let target = &mut group.targets[index];
            if target.handle.is_some() || (once && target.revealed) {
                continue;
            }
            let observed = ObservedTarget::new(target.element, group.kind);
            if let Some(handle) = registry.observe(host, observed, options) {
                target.handle = Some(handle);
                self.by_handle.insert(handle, (id, index));
                created += 1;
            }
        }
        Ok(created)
    }

    #[must_use]
    pub fn owns(&self, handle: ObservationHandle) -> bool {
        self.by_handle.contains_key(&handle)
    }

    pub fn handle_event(&mut self, event: &ObserverEvent) -> RevealOutcome {
        self.handle_events(std::slice::from_ref(event))
    }

    /// Applies one batch of observer events.
    ///
    /// Entries of the same group within one batch are staggered in order.
    /// Events for handles this controller does not own are ignored.
    pub fn handle_events(&mut self, events: &[ObserverEvent]) -> RevealOutcome {
        let mut outcome = RevealOutcome::default();
        let mut batch_rank: IndexMap<RevealGroupId, usize> = IndexMap::new();

        for event in events {
            let Some(&(id, index)) = self.by_handle.get(&event.handle) else {
                continue;
            };
            let Some(group) = self.groups.get(&id) else {
                continue;
            };
            let params = group.params;
            let indexes: Vec<usize> = match params.trigger {
                GroupTrigger::EachTarget => vec![index],
                GroupTrigger::FirstTarget => (0..group.targets.len()).collect(),
            };

            match event.transition {
                Transition::Enter => {
                    if params.replay == ReplayPolicy::Once {
                        // The registry released the observation on this entry.
                        self.by_handle.shift_remove(&event.handle);
                        if let Some(group) = self.groups.get_mut(&id) {
                            group.targets[index].handle = None;
                        }
                    }
                    for target_index in indexes {
                        let rank = batch_rank.entry(id).or_insert(0);
                        let delay = *rank as f64 * params.stagger_secs;
                        *rank += 1;
                        self.reveal_target(id, target_index, delay, &mut outcome);
                    }
                }
                Transition::Leave => {
                    if params.replay != ReplayPolicy::ReverseOnLeave {
                        continue;
                    }
                    for target_index in indexes {
                        self.hide_target(id, target_index, &mut outcome.frame);
                    }
                }
            }
        }
        outcome
    }

    fn reveal_target(
        &mut self,
        id: RevealGroupId,
        index: usize,
        delay_secs: f64,
        outcome: &mut RevealOutcome,
    ) {
        let Some(group) = self.groups.get_mut(&id) else {
            return;
        };
        let params = group.params;
        let target = &mut group.targets[index];
        if target.revealed && params.replay == ReplayPolicy::Once {
            return;
        }
        let element = target.element;
        if !target.revealed {
            target.revealed = true;
            outcome.newly_revealed.push(element);
        }

        let from = self.state_of(element).unwrap_or(params.from);
        match Tween::new(from, VisualState::NATURAL, params.duration_secs, params.ease) {
            Ok(tween) => {
                self.start_tween(element, tween.with_delay(delay_secs), &mut outcome.frame);
                trace!(element = %element, delay_secs, "reveal started");
            }
            Err(err) => warn!(element = %element, error = %err, "reveal tween rejected"),
        }
    }

    fn hide_target(&mut self, id: RevealGroupId, index: usize, frame: &mut StyleFrame) {
        let Some(group) = self.groups.get(&id) else {
            return;
        };
        let params = group.params;
        let element = group.targets[index].element;
        let from = self.state_of(element).unwrap_or(VisualState::NATURAL);
        match Tween::new(from, params.from, params.duration_secs, params.ease) {
            Ok(tween) => {
                self.start_tween(element, tween, frame);
                trace!(element = %element, "reveal reversed");
            }
            Err(err) => warn!(element = %element, error = %err, "reverse tween rejected"),
        }
    }

    fn start_tween(&mut self, element: ElementId, tween: Tween, frame: &mut StyleFrame) {
        if tween.total_secs() <= 0.0 {
            let state = tween.to_state();
            self.tweens.shift_remove(&element);
            self.current.insert(element, state);
            frame.set_state(element, state);
        } else {
            self.tweens.insert(element, tween);
        }
    }

    /// Runs an arbitrary tween on `element`, replacing any tween it has.
    pub fn animate(&mut self, element: ElementId, tween: Tween) {
        self.tweens.insert(element, tween);
    }

    /// Advances every running tween and collects the resulting states.
    pub fn tick(&mut self, delta_secs: f64) -> StyleFrame {
        let mut frame = StyleFrame::new();
        if self.tweens.is_empty() {
            return frame;
        }
        for (element, tween) in &mut self.tweens {
            if let Some(state) = tween.advance(delta_secs) {
                self.current.insert(*element, state);
                frame.set_state(*element, state);
            }
        }
        self.tweens.retain(|_, tween| !tween.is_finished());
        frame
    }

    /// Last state produced for `element`, mid-tween included.
    #[must_use]
    pub fn state_of(&self, element: ElementId) -> Option<VisualState> {
        self.tweens
            .get(&element)
            .map(Tween::current)
            .or_else(|| self.current.get(&element).copied())
    }

    #[must_use]
    pub fn is_revealed(&self, element: ElementId) -> bool {
        self.groups.values().any(|group| {
            group
                .targets
                .iter()
                .any(|target| target.element == element && target.revealed)
        })
    }

    #[must_use]
    pub fn revealed_count(&self) -> usize {
        self.groups
            .values()
            .flat_map(|group| group.targets.iter())
            .filter(|target| target.revealed)
            .count()
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn active_tween_count(&self) -> usize {
        self.tweens.len()
    }

    /// Drops running tweens and forgets observation handles.
    ///
    /// Observations themselves belong to the registry and are released there.
    /// Returns how many tweens were running.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.tweens.len();
        self.tweens.clear();
        self.by_handle.clear();
        for group in self.groups.values_mut() {
            for target in &mut group.targets {
                target.handle = None;
            }
        }
        if cancelled > 0 {
            debug!(cancelled, "reveal tweens cancelled");
        }
        cancelled
    }
}
