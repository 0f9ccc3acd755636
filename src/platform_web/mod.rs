//! Browser host built on `web-sys`.
//!
//! Elements are addressed through an [`ElementDirectory`] shared by the host
//! and the style sink. Intersection detection uses one native
//! `IntersectionObserver` per distinct option set; its callback only buffers
//! entries, which `take_entries` turns into engine entries on the next poll.

mod fanout;

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, trace, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, HtmlElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, Window,
};

use crate::core::{Bounds, ElementId, Viewport, VisualState};
use crate::error::{RevealError, RevealResult};
use crate::interaction::{
    IntersectionEntry, IntersectionHost, ObservationHandle, ObserveOptions, ScrollHost,
    ViewportHost,
};
use crate::render::{StyleFrame, StyleSink};

use fanout::ObservedTargets;

/// Attribute carrying numeric element ids in markup.
pub const ELEMENT_ID_ATTRIBUTE: &str = "data-scrollstage-id";

/// Shared id-to-element table.
#[derive(Debug, Clone, Default)]
pub struct ElementDirectory {
    elements: Rc<RefCell<IndexMap<ElementId, Element>>>,
}

impl ElementDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: ElementId, element: Element) {
        self.elements.borrow_mut().insert(id, element);
    }

    pub fn unregister(&self, id: ElementId) {
        self.elements.borrow_mut().shift_remove(&id);
    }

    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<Element> {
        self.elements.borrow().get(&id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.borrow().is_empty()
    }

    /// Registers every element carrying [`ELEMENT_ID_ATTRIBUTE`].
    ///
    /// Elements with a non-numeric id are skipped. Returns how many were added.
    pub fn scan(&self, document: &Document) -> RevealResult<usize> {
        let nodes = document
            .query_selector_all(&format!("[{ELEMENT_ID_ATTRIBUTE}]"))
            .map_err(|err| RevealError::Host(format!("element scan failed: {err:?}")))?;
        let mut added = 0;
        for index in 0..nodes.length() {
            let Some(element) = nodes
                .get(index)
                .and_then(|node| node.dyn_into::<Element>().ok())
            else {
                continue;
            };
            let Some(raw) = element
                .get_attribute(ELEMENT_ID_ATTRIBUTE)
                .and_then(|value| value.trim().parse::<u64>().ok())
            else {
                warn!("skipping element with malformed id attribute");
                continue;
            };
            self.register(ElementId(raw), element);
            added += 1;
        }
        debug!(added, "element directory scanned");
        Ok(added)
    }

    fn find(&self, target: &Element) -> Option<ElementId> {
        self.elements
            .borrow()
            .iter()
            .find(|(_, element)| js_sys::Object::is(element, target))
            .map(|(id, _)| *id)
    }
}

#[derive(Debug, Clone)]
struct RawEntry {
    target: Element,
    is_intersecting: bool,
    ratio: f64,
}

struct NativeObserver {
    observer: IntersectionObserver,
    buffer: Rc<RefCell<Vec<RawEntry>>>,
    targets: ObservedTargets,
    _callback: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

/// Window or container scrolling host backed by the DOM.
pub struct WebHost {
    window: Window,
    document: Document,
    directory: ElementDirectory,
    scroll_container: Option<Element>,
    observers: IndexMap<String, NativeObserver>,
    handle_keys: IndexMap<ObservationHandle, String>,
    replayed: Vec<IntersectionEntry>,
}

impl WebHost {
    /// Host scrolling the browser window.
    pub fn new(directory: ElementDirectory) -> RevealResult<Self> {
        let window =
            web_sys::window().ok_or_else(|| RevealError::Host("no window".to_owned()))?;
        let document = window
            .document()
            .ok_or_else(|| RevealError::Host("no document".to_owned()))?;
        Ok(Self {
            window,
            document,
            directory,
            scroll_container: None,
            observers: IndexMap::new(),
            handle_keys: IndexMap::new(),
            replayed: Vec::new(),
        })
    }

    /// Scrolls and observes within `container` instead of the window.
    #[must_use]
    pub fn with_scroll_container(mut self, container: Element) -> Self {
        self.scroll_container = Some(container);
        self
    }

    #[must_use]
    pub fn directory(&self) -> &ElementDirectory {
        &self.directory
    }

    fn options_key(options: &ObserveOptions) -> String {
        format!("{}|{}", options.root_margin, options.threshold)
    }

    fn create_observer(&self, options: &ObserveOptions) -> RevealResult<NativeObserver> {
        let buffer: Rc<RefCell<Vec<RawEntry>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&buffer);
        let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                let mut sink = sink.borrow_mut();
                for value in entries.iter() {
                    let entry: IntersectionObserverEntry = value.unchecked_into();
                    sink.push(RawEntry {
                        target: entry.target(),
                        is_intersecting: entry.is_intersecting(),
                        ratio: entry.intersection_ratio(),
                    });
                }
            },
        );

        let init = IntersectionObserverInit::new();
        init.set_root_margin(&options.root_margin.to_string());
        init.set_threshold(&JsValue::from_f64(options.threshold));
        if let Some(container) = &self.scroll_container {
            init.set_root(Some(container.unchecked_ref()));
        }
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
                .map_err(|err| RevealError::Host(format!("observer creation failed: {err:?}")))?;
        Ok(NativeObserver {
            observer,
            buffer,
            targets: ObservedTargets::default(),
            _callback: callback,
        })
    }

    fn scroll_offset_of_root(&self) -> f64 {
        self.scroll_position()
    }
}

impl IntersectionHost for WebHost {
    fn root_attached(&self) -> bool {
        match &self.scroll_container {
            Some(container) => container.is_connected(),
            None => self.document.body().is_some(),
        }
    }

    fn observe(&mut self, handle: ObservationHandle, element: ElementId, options: &ObserveOptions) {
        let Some(node) = self.directory.get(element) else {
            debug!(element = %element, "unknown element, observation stays silent");
            return;
        };
        let key = Self::options_key(options);
        if !self.observers.contains_key(&key) {
            match self.create_observer(options) {
                Ok(observer) => {
                    self.observers.insert(key.clone(), observer);
                }
                Err(err) => {
                    warn!(error = %err, "intersection observer unavailable");
                    return;
                }
            }
        }
        if let Some(native) = self.observers.get_mut(&key) {
            // The native observer ignores repeat `observe` calls for a node.
            if !native.targets.is_watching(element) {
                native.observer.observe(&node);
            }
            if let Some(entry) = native.targets.add(handle, element) {
                self.replayed.push(entry);
            }
            self.handle_keys.insert(handle, key);
            trace!(handle = handle.0, element = %element, "native observe");
        }
    }

    fn unobserve(&mut self, handle: ObservationHandle) {
        let Some(key) = self.handle_keys.shift_remove(&handle) else {
            return;
        };
        let Some(native) = self.observers.get_mut(&key) else {
            return;
        };
        self.replayed.retain(|entry| entry.handle != handle);
        if let Some(node) = native
            .targets
            .remove(handle)
            .and_then(|element| self.directory.get(element))
        {
            native.observer.unobserve(&node);
        }
        if native.targets.is_empty() {
            native.observer.disconnect();
            self.observers.shift_remove(&key);
        }
    }

    fn take_entries(&mut self) -> Vec<IntersectionEntry> {
        let mut entries = std::mem::take(&mut self.replayed);
        for native in self.observers.values_mut() {
            let raw: Vec<RawEntry> = native.buffer.borrow_mut().drain(..).collect();
            for entry in raw {
                let Some(element) = self.directory.find(&entry.target) else {
                    continue;
                };
                native
                    .targets
                    .report(element, entry.is_intersecting, entry.ratio, &mut entries);
            }
        }
        entries
    }
}

impl ScrollHost for WebHost {
    fn scroll_position(&self) -> f64 {
        match &self.scroll_container {
            Some(container) => f64::from(container.scroll_top()),
            None => self.window.scroll_y().unwrap_or(0.0),
        }
    }

    fn set_scroll_position(&mut self, position: f64) {
        match &self.scroll_container {
            Some(container) => container.set_scroll_top(position.round() as i32),
            None => self.window.scroll_to_with_x_and_y(0.0, position),
        }
    }

    fn max_scroll_position(&self) -> f64 {
        let (content, visible) = match &self.scroll_container {
            Some(container) => (container.scroll_height(), container.client_height()),
            None => match self.document.document_element() {
                Some(root) => (root.scroll_height(), root.client_height()),
                None => return 0.0,
            },
        };
        f64::from((content - visible).max(0))
    }

    fn element_bounds(&self, element: ElementId) -> Option<Bounds> {
        let node = self.directory.get(element)?;
        let rect = node.get_bounding_client_rect();
        let root_top = self
            .scroll_container
            .as_ref()
            .map_or(0.0, |container| container.get_bounding_client_rect().top());
        Some(Bounds::new(
            rect.top() - root_top + self.scroll_offset_of_root(),
            rect.height(),
        ))
    }
}

impl ViewportHost for WebHost {
    fn viewport(&self) -> Viewport {
        match &self.scroll_container {
            Some(container) => Viewport::new(
                f64::from(container.client_width()),
                f64::from(container.client_height()),
            ),
            None => {
                let read = |value: Result<JsValue, JsValue>| {
                    value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
                };
                Viewport::new(
                    read(self.window.inner_width()),
                    read(self.window.inner_height()),
                )
            }
        }
    }
}

impl Drop for WebHost {
    fn drop(&mut self) {
        for native in self.observers.values() {
            native.observer.disconnect();
        }
    }
}

/// Writes style frames to inline styles, text content and classes.
#[derive(Debug, Clone)]
pub struct WebStyleSink {
    directory: ElementDirectory,
}

impl WebStyleSink {
    #[must_use]
    pub fn new(directory: ElementDirectory) -> Self {
        Self { directory }
    }

    fn html(&self, id: ElementId) -> Option<HtmlElement> {
        self.directory
            .get(id)
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
    }
}

fn css_transform(state: &VisualState) -> String {
    format!(
        "translate({}px, {}px) scale({}) rotate({}deg)",
        state.translate_x, state.translate_y, state.scale, state.rotation_deg
    )
}

fn host_error(err: JsValue) -> RevealError {
    RevealError::Host(format!("{err:?}"))
}

impl StyleSink for WebStyleSink {
    fn apply(&mut self, frame: &StyleFrame) -> RevealResult<()> {
        frame.validate()?;
        for patch in &frame.patches {
            let Some(element) = self.html(patch.element) else {
                trace!(element = %patch.element, "style target missing");
                continue;
            };
            let style = element.style();
            style
                .set_property("opacity", &patch.state.opacity.to_string())
                .map_err(host_error)?;
            style
                .set_property("transform", &css_transform(&patch.state))
                .map_err(host_error)?;
            let filter = if patch.state.blur_px > 0.0 {
                format!("blur({}px)", patch.state.blur_px)
            } else {
                "none".to_owned()
            };
            style.set_property("filter", &filter).map_err(host_error)?;
        }
        for patch in &frame.texts {
            if let Some(element) = self.directory.get(patch.element) {
                element.set_text_content(Some(&patch.text));
            }
        }
        for patch in &frame.fills {
            if let Some(element) = self.html(patch.element) {
                element
                    .style()
                    .set_property("transform", &format!("scaleX({})", patch.fraction))
                    .map_err(host_error)?;
            }
        }
        for patch in &frame.flags {
            if let Some(element) = self.directory.get(patch.element) {
                element
                    .class_list()
                    .toggle_with_force(&patch.flag, patch.enabled)
                    .map_err(host_error)?;
            }
        }
        Ok(())
    }
}
