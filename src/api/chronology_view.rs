use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::core::{
    Ease, ElementId, FALLBACK_YEAR, Length, RootMargin, Side, TimelineRecord, TriggerStart,
    Tween, VisualState, YearGroup, aggregate_with_fallback,
};
use crate::error::{RevealError, RevealResult};
use crate::extensions::ViewEvent;
use crate::interaction::{
    AutoScrollStatus, IntersectionEntry, ObservationHandle, ObserveOptions, ScrollTarget,
    TargetKind, Transition, ViewportHost,
};
use crate::render::{StyleFrame, StyleSink};

use super::{
    CompactBehavior, DetachReport, RecordSource, RevealParams, ViewScope, load_chronology,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChronologyConfig {
    #[serde(default = "default_line_start")]
    pub line_start: TriggerStart,
    #[serde(default = "default_year_track_margin")]
    pub year_track_margin: RootMargin,
    #[serde(default = "default_year_track_threshold")]
    pub year_track_threshold: f64,
    #[serde(default = "default_fallback_year")]
    pub fallback_year: i32,
    /// Opacity of the current-year display while the chronology is on screen.
    #[serde(default = "default_year_display_opacity")]
    pub year_display_opacity: f64,
    /// The display shows once the container top is this far below the viewport top.
    #[serde(default = "default_display_band_start_px")]
    pub display_band_start_px: f64,
    /// The display hides once the container bottom rises above this line.
    #[serde(default = "default_display_band_end_px")]
    pub display_band_end_px: f64,
    #[serde(default = "default_emphasis_duration_secs")]
    pub emphasis_duration_secs: f64,
    #[serde(default = "default_compact_items")]
    pub compact_items: CompactBehavior,
}

fn default_line_start() -> TriggerStart {
    TriggerStart::top_at_percent(80.0)
}

fn default_year_track_margin() -> RootMargin {
    RootMargin {
        top: Length::Percent(-50.0),
        right: Length::Px(0.0),
        bottom: Length::Percent(-50.0),
        left: Length::Px(0.0),
    }
}

fn default_year_track_threshold() -> f64 {
    0.1
}

fn default_fallback_year() -> i32 {
    FALLBACK_YEAR
}

fn default_year_display_opacity() -> f64 {
    0.2
}

fn default_display_band_start_px() -> f64 {
    200.0
}

fn default_display_band_end_px() -> f64 {
    100.0
}

fn default_emphasis_duration_secs() -> f64 {
    0.5
}

fn default_compact_items() -> CompactBehavior {
    CompactBehavior::Animate
}

impl Default for ChronologyConfig {
    fn default() -> Self {
        Self {
            line_start: default_line_start(),
            year_track_margin: default_year_track_margin(),
            year_track_threshold: default_year_track_threshold(),
            fallback_year: default_fallback_year(),
            year_display_opacity: default_year_display_opacity(),
            display_band_start_px: default_display_band_start_px(),
            display_band_end_px: default_display_band_end_px(),
            emphasis_duration_secs: default_emphasis_duration_secs(),
            compact_items: default_compact_items(),
        }
    }
}

impl ChronologyConfig {
    #[must_use]
    pub fn with_fallback_year(mut self, year: i32) -> Self {
        self.fallback_year = year;
        self
    }

    #[must_use]
    pub fn with_compact_items(mut self, behavior: CompactBehavior) -> Self {
        self.compact_items = behavior;
        self
    }

    pub fn validate(self) -> RevealResult<Self> {
        self.line_start
            .to_root_margin()
            .map_err(|err| RevealError::InvalidConfig(format!("chronology line_start: {err}")))?;
        if !self.year_track_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.year_track_threshold)
        {
            return Err(RevealError::InvalidConfig(
                "chronology year_track_threshold must be within [0, 1]".to_owned(),
            ));
        }
        if !self.year_display_opacity.is_finite()
            || !(0.0..=1.0).contains(&self.year_display_opacity)
        {
            return Err(RevealError::InvalidConfig(
                "chronology year_display_opacity must be within [0, 1]".to_owned(),
            ));
        }
        if !self.display_band_start_px.is_finite() || !self.display_band_end_px.is_finite() {
            return Err(RevealError::InvalidConfig(
                "chronology display band offsets must be finite".to_owned(),
            ));
        }
        if !self.emphasis_duration_secs.is_finite() || self.emphasis_duration_secs < 0.0 {
            return Err(RevealError::InvalidConfig(
                "chronology emphasis_duration_secs must be finite and >= 0".to_owned(),
            ));
        }
        Ok(self)
    }

    fn year_display_shown(self) -> VisualState {
        VisualState::NATURAL.with_opacity(self.year_display_opacity)
    }
}

/// Element ids of one year group as rendered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearGroupLayout {
    pub year: i32,
    pub group: ElementId,
    pub marker: ElementId,
    pub items: Vec<ElementId>,
}

/// Element ids of a rendered chronology, in the aggregated order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChronologyLayout {
    pub container: ElementId,
    #[serde(default)]
    pub line: Option<ElementId>,
    #[serde(default)]
    pub year_display: Option<ElementId>,
    pub groups: Vec<YearGroupLayout>,
}

impl ChronologyLayout {
    /// Assigns consecutive ids starting at `first_id`: container, line,
    /// year display, then each group followed by its marker and items.
    #[must_use]
    pub fn sequential<R>(groups: &[YearGroup<R>], first_id: u64) -> Self {
        let mut next = first_id;
        let mut take = || {
            let id = ElementId(next);
            next += 1;
            id
        };
        let container = take();
        let line = Some(take());
        let year_display = Some(take());
        let groups = groups
            .iter()
            .map(|group| YearGroupLayout {
                year: group.year,
                group: take(),
                marker: take(),
                items: group.items.iter().map(|_| take()).collect(),
            })
            .collect();
        Self {
            container,
            line,
            year_display,
            groups,
        }
    }

    fn check_matches<R>(&self, groups: &[YearGroup<R>]) -> RevealResult<()> {
        if self.groups.len() != groups.len() {
            return Err(RevealError::InvalidData(format!(
                "layout has {} year groups, chronology has {}",
                self.groups.len(),
                groups.len()
            )));
        }
        for (layout, group) in self.groups.iter().zip(groups) {
            if layout.year != group.year || layout.items.len() != group.items.len() {
                return Err(RevealError::InvalidData(format!(
                    "layout for year {} does not match chronology group {}",
                    layout.year, group.year
                )));
            }
        }
        Ok(())
    }
}

/// What one dispatch pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChronologyUpdate {
    /// Ids of entries that became visible for the first time.
    pub newly_visible: Vec<String>,
    pub year_changed: Option<i32>,
    pub line_revealed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingObservation {
    Line(ElementId),
    Year(ElementId, i32),
    Band(ElementId),
}

/// Client and partner history grouped by year, revealed while scrolling.
pub struct ChronologyView<R, H: ViewportHost, S: StyleSink> {
    scope: ViewScope<H, S>,
    config: ChronologyConfig,
    groups: Vec<YearGroup<R>>,
    layout: Option<ChronologyLayout>,
    items: IndexMap<ElementId, (usize, usize)>,
    year_handles: IndexMap<ObservationHandle, i32>,
    line_handle: Option<ObservationHandle>,
    band_handle: Option<ObservationHandle>,
    pending: Vec<PendingObservation>,
    line_visible: bool,
    display_visible: bool,
    current_year: Option<i32>,
}

impl<R: TimelineRecord, H: ViewportHost, S: StyleSink> ChronologyView<R, H, S> {
    pub fn new(scope: ViewScope<H, S>, config: ChronologyConfig) -> RevealResult<Self> {
        Ok(Self {
            scope,
            config: config.validate()?,
            groups: Vec::new(),
            layout: None,
            items: IndexMap::new(),
            year_handles: IndexMap::new(),
            line_handle: None,
            band_handle: None,
            pending: Vec::new(),
            line_visible: false,
            display_visible: false,
            current_year: None,
        })
    }

    /// Aggregates the two collections. Only allowed before `attach`.
    pub fn load<A, B>(&mut self, clients: A, partners: B) -> RevealResult<usize>
    where
        A: IntoIterator<Item = R>,
        B: IntoIterator<Item = R>,
    {
        let groups = aggregate_with_fallback(clients, partners, self.config.fallback_year);
        self.load_groups(groups)
    }

    /// Loads from a record source; unavailable collections count as empty.
    pub fn load_from<Src>(&mut self, source: &Src) -> RevealResult<usize>
    where
        Src: RecordSource<Record = R> + ?Sized,
    {
        let groups = load_chronology(source, self.config.fallback_year);
        self.load_groups(groups)
    }

    pub fn load_groups(&mut self, groups: Vec<YearGroup<R>>) -> RevealResult<usize> {
        if self.layout.is_some() {
            return Err(RevealError::InvalidData(
                "chronology records cannot change after attach".to_owned(),
            ));
        }
        debug!(groups = groups.len(), "chronology loaded");
        self.groups = groups;
        Ok(self.groups.len())
    }

    #[must_use]
    pub fn timeline(&self) -> &[YearGroup<R>] {
        &self.groups
    }

    #[must_use]
    pub fn current_year(&self) -> Option<i32> {
        self.current_year
    }

    #[must_use]
    pub fn is_line_visible(&self) -> bool {
        self.line_visible
    }

    #[must_use]
    pub fn is_year_display_visible(&self) -> bool {
        self.display_visible
    }

    #[must_use]
    pub fn layout(&self) -> Option<&ChronologyLayout> {
        self.layout.as_ref()
    }

    #[must_use]
    pub fn scope(&self) -> &ViewScope<H, S> {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut ViewScope<H, S> {
        &mut self.scope
    }

    /// Binds the rendered elements and starts observing them.
    ///
    /// Observations the host cannot create yet are kept and retried by
    /// `retry_pending`.
    pub fn attach(&mut self, layout: ChronologyLayout) -> RevealResult<()> {
        if self.layout.is_some() {
            return Err(RevealError::InvalidData(
                "chronology view is already attached".to_owned(),
            ));
        }
        layout.check_matches(&self.groups)?;

        self.items.clear();
        for (group_index, group) in layout.groups.iter().enumerate() {
            for (item_index, element) in group.items.iter().enumerate() {
                self.items.insert(*element, (group_index, item_index));
            }
        }

        if let Some(line) = layout.line {
            self.pending.push(PendingObservation::Line(line));
        }
        for group in &layout.groups {
            self.pending
                .push(PendingObservation::Year(group.group, group.year));
        }

        let mut frame = StyleFrame::new();
        if let Some(display) = layout.year_display {
            self.pending.push(PendingObservation::Band(layout.container));
            frame.set_state(display, VisualState::TRANSPARENT);
            if let Some(first) = self.groups.first() {
                frame.set_text(display, first.year.to_string());
            }
        }
        self.current_year = self.groups.first().map(|group| group.year);
        self.scope.apply(&frame);

        let markers: Vec<ElementId> = layout.groups.iter().map(|group| group.marker).collect();
        // Aggregated order; observation order decides reveal order within a batch.
        let items: Vec<(ElementId, Side)> = layout
            .groups
            .iter()
            .zip(&self.groups)
            .flat_map(|(group_layout, group)| {
                group_layout
                    .items
                    .iter()
                    .zip(&group.items)
                    .map(|(element, entry)| (*element, entry.side))
            })
            .collect();

        self.layout = Some(layout);
        self.observe_pending()?;

        let compact = self.config.compact_items;
        let mut revealed = Vec::new();
        if !markers.is_empty() {
            let (_, shown) = self.scope.register_reveal_group(
                &markers,
                TargetKind::YearMarker,
                RevealParams::year_marker().with_compact(compact),
            )?;
            revealed.extend(shown);
        }
        for (element, side) in items {
            let (_, shown) = self.scope.register_reveal_group(
                &[element],
                TargetKind::Item,
                RevealParams::timeline_item(side).with_compact(compact),
            )?;
            revealed.extend(shown);
        }
        self.mark_items_visible(&revealed);

        debug!(
            groups = self.groups.len(),
            items = self.items.len(),
            year = ?self.current_year,
            "chronology attached"
        );
        Ok(())
    }

    /// Retries observations that failed while the host root was detached.
    pub fn retry_pending(&mut self) -> RevealResult<usize> {
        let created = self.observe_pending()?;
        Ok(created + self.scope.retry_pending()?)
    }

    fn observe_pending(&mut self) -> RevealResult<usize> {
        let pending = std::mem::take(&mut self.pending);
        let viewport = self.scope.host().viewport();
        let mut created = 0;
        for request in pending {
            let handle = match request {
                PendingObservation::Line(line) => {
                    let options = ObserveOptions::from_trigger(self.config.line_start)?;
                    let handle = self.scope.observe(line, TargetKind::Line, options);
                    self.line_handle = handle.or(self.line_handle);
                    handle
                }
                PendingObservation::Year(group, year) => {
                    let options = ObserveOptions::repeating()
                        .with_root_margin(self.config.year_track_margin)
                        .with_threshold(self.config.year_track_threshold);
                    let handle = self.scope.observe(group, TargetKind::Section, options);
                    if let Some(handle) = handle {
                        self.year_handles.insert(handle, year);
                    }
                    handle
                }
                PendingObservation::Band(container) => {
                    let margin = RootMargin {
                        top: Length::Px(-self.config.display_band_end_px),
                        bottom: Length::Px(self.config.display_band_start_px - viewport.height),
                        ..RootMargin::ZERO
                    };
                    let options = ObserveOptions::repeating().with_root_margin(margin);
                    let handle = self.scope.observe(container, TargetKind::Section, options);
                    self.band_handle = handle.or(self.band_handle);
                    handle
                }
            };
            match handle {
                Some(_) => created += 1,
                None => self.pending.push(request),
            }
        }
        if !self.pending.is_empty() {
            debug!(pending = self.pending.len(), "chronology observations deferred");
        }
        Ok(created)
    }

    pub fn poll(&mut self) -> ChronologyUpdate {
        if !self.scope.is_attached() {
            return ChronologyUpdate::default();
        }
        let entries = self.scope.host_mut().take_entries();
        self.handle_intersections(&entries)
    }

    pub fn handle_intersections(&mut self, entries: &[IntersectionEntry]) -> ChronologyUpdate {
        let outcome = self.scope.handle_intersections(entries);
        let mut update = ChronologyUpdate {
            newly_visible: self.mark_items_visible(&outcome.revealed),
            ..ChronologyUpdate::default()
        };

        for event in outcome.unclaimed {
            if Some(event.handle) == self.line_handle {
                if event.transition == Transition::Enter && !self.line_visible {
                    self.line_visible = true;
                    self.line_handle = None;
                    update.line_revealed = true;
                    if let Some(line) = self.layout.as_ref().and_then(|layout| layout.line) {
                        let mut frame = StyleFrame::new();
                        frame.set_flag(line, "visible", true);
                        self.scope.apply(&frame);
                    }
                    trace!("chronology line revealed");
                    self.scope.emit(ViewEvent::LineRevealed);
                }
            } else if Some(event.handle) == self.band_handle {
                self.set_display_visible(event.transition == Transition::Enter);
            } else if let Some(&year) = self.year_handles.get(&event.handle) {
                if event.transition == Transition::Enter && self.set_current_year(year) {
                    update.year_changed = Some(year);
                }
            }
        }
        update
    }

    fn mark_items_visible(&mut self, elements: &[ElementId]) -> Vec<String> {
        let mut newly_visible = Vec::new();
        for element in elements {
            let Some(&(group_index, item_index)) = self.items.get(element) else {
                continue;
            };
            if let Some(entry) = self
                .groups
                .get_mut(group_index)
                .and_then(|group| group.items.get_mut(item_index))
            {
                if entry.mark_visible() {
                    newly_visible.push(entry.id.clone());
                }
            }
        }
        newly_visible
    }

    fn display_element(&self) -> Option<ElementId> {
        self.layout.as_ref().and_then(|layout| layout.year_display)
    }

    fn set_current_year(&mut self, year: i32) -> bool {
        if self.current_year == Some(year) {
            return false;
        }
        self.current_year = Some(year);
        debug!(year, "current year changed");

        if let Some(display) = self.display_element() {
            let mut frame = StyleFrame::new();
            frame.set_text(display, year.to_string());
            self.scope.apply(&frame);
            if self.display_visible {
                let emphasis_from = VisualState::NATURAL.with_scale(0.8).with_opacity(
                    (self.config.year_display_opacity * 0.5).clamp(0.0, 1.0),
                );
                self.tween_display(display, emphasis_from, self.config.year_display_shown());
            }
        }
        self.scope.emit(ViewEvent::YearChanged { year });
        true
    }

    fn set_display_visible(&mut self, visible: bool) {
        if self.display_visible == visible {
            return;
        }
        self.display_visible = visible;
        if let Some(display) = self.display_element() {
            let from = self
                .scope
                .reveal()
                .state_of(display)
                .unwrap_or(VisualState::TRANSPARENT);
            let to = if visible {
                self.config.year_display_shown()
            } else {
                VisualState::TRANSPARENT
            };
            self.tween_display(display, from, to);
        }
        trace!(visible, "year display visibility");
        self.scope
            .emit(ViewEvent::YearDisplayVisibility { visible });
    }

    fn tween_display(&mut self, display: ElementId, from: VisualState, to: VisualState) {
        match Tween::new(from, to, self.config.emphasis_duration_secs, Ease::Power2Out) {
            Ok(tween) => self.scope.animate(display, tween),
            Err(err) => warn!(error = %err, "year display tween rejected"),
        }
    }

    pub fn tick(&mut self, delta_secs: f64) -> AutoScrollStatus {
        self.scope.tick(delta_secs)
    }

    /// Slowly scrolls to the end of the content until arrival or cancel.
    pub fn start_auto_scroll(&mut self) -> bool {
        self.scope.start_auto_scroll(ScrollTarget::End)
    }

    pub fn scroll_to(&mut self, target: ScrollTarget) -> bool {
        self.scope.start_auto_scroll(target)
    }

    pub fn cancel_auto_scroll(&mut self) -> bool {
        self.scope.cancel_auto_scroll()
    }

    #[must_use]
    pub fn is_auto_scrolling(&self) -> bool {
        self.scope.auto_scroll().is_active()
    }

    /// Releases every observation and timer. Safe to call twice.
    pub fn detach(&mut self) -> DetachReport {
        self.year_handles.clear();
        self.line_handle = None;
        self.band_handle = None;
        self.pending.clear();
        self.scope.detach()
    }
}
