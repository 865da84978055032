// SPDX-License-Identifier: LGPL-3.0-only

use indexmap::IndexMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tessera_core::event::PointerEvent;
use tessera_core::layout::{Axis, Dimensions, LayoutContext, List};

use crate::clickable::Clickable;

static NEXT_TAB_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [Tab], unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(u64);

impl TabId {
    fn next() -> Self {
        Self(NEXT_TAB_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

type Content = Box<dyn FnMut(&mut LayoutContext<'_>) -> Dimensions + Send>;

/// A single tab of a [TabBar].
pub struct Tab {
    id: TabId,
    /// Display label.
    pub label: String,
    button: Clickable,
    on_activate: Option<Box<dyn FnMut(TabId) + Send>>,
    content: Option<Content>,
}

impl Tab {
    /// Create a new tab with a fresh [TabId].
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: TabId::next(),
            label: label.into(),
            button: Clickable::new(),
            on_activate: None,
            content: None,
        }
    }

    /// Lays out the page shown while the tab is active and returns self.
    pub fn with_content(
        mut self,
        content: impl FnMut(&mut LayoutContext<'_>) -> Dimensions + Send + 'static,
    ) -> Self {
        self.content = Some(Box::new(content));
        self
    }

    /// Runs `hook` every time the tab is activated and returns self.
    pub fn with_on_activate(mut self, hook: impl FnMut(TabId) + Send + 'static) -> Self {
        self.on_activate = Some(Box::new(hook));
        self
    }

    /// The identity of the tab.
    pub fn id(&self) -> TabId {
        self.id
    }

    /// The press state of the tab's button.
    pub fn button(&self) -> &Clickable {
        &self.button
    }

    /// Lays out the tab's page. A tab without content takes no space.
    pub fn layout(&mut self, ctx: &mut LayoutContext<'_>) -> Dimensions {
        match self.content.as_mut() {
            Some(content) => content(ctx),
            None => Dimensions::default(),
        }
    }
}

impl fmt::Debug for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tab")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("on_activate", &self.on_activate.is_some())
            .field("content", &self.content.is_some())
            .finish()
    }
}

/// Ordered tabs with one active tab.
///
/// Activation is edge triggered: [became_active](Self::became_active) reports
/// a freshly activated tab exactly once, for one-shot reactions like moving
/// input focus.
#[derive(Debug, Default)]
pub struct TabBar {
    tabs: IndexMap<TabId, Tab>,
    active: Option<TabId>,
    became_active: Option<TabId>,
}

impl TabBar {
    /// A tab bar over `tabs`, in order, with no active tab.
    pub fn new(tabs: impl IntoIterator<Item = Tab>) -> Self {
        Self {
            tabs: tabs.into_iter().map(|tab| (tab.id, tab)).collect(),
            active: None,
            became_active: None,
        }
    }

    /// Makes `id` the active tab and runs its activation hook.
    ///
    /// Returns `false` for ids not in the bar.
    pub fn activate(&mut self, id: TabId) -> bool {
        let Some(tab) = self.tabs.get_mut(&id) else {
            return false;
        };
        log::debug!("activating {} '{}'", id, tab.label);
        self.active = Some(id);
        self.became_active = Some(id);
        if let Some(hook) = tab.on_activate.as_mut() {
            hook(id);
        }
        true
    }

    /// Inserts `tab` at `index`, clamped to the end, and returns its id.
    pub fn insert(&mut self, index: usize, tab: Tab) -> TabId {
        let id = tab.id;
        let index = index.min(self.tabs.len());
        self.tabs.shift_insert(index, id, tab);
        id
    }

    /// Appends `tab` and returns its id.
    pub fn append(&mut self, tab: Tab) -> TabId {
        self.insert(self.tabs.len(), tab)
    }

    /// Removes the tab at `index`.
    ///
    /// Closing the active tab activates the tab sliding into its place, or
    /// the new last tab when the closed one was last.
    pub fn close(&mut self, index: usize) -> Option<Tab> {
        let (id, tab) = self.tabs.shift_remove_index(index)?;
        if self.became_active == Some(id) {
            self.became_active = None;
        }
        if self.active == Some(id) {
            self.active = None;
            if !self.tabs.is_empty() {
                let successor = index.min(self.tabs.len() - 1);
                if let Some((&next, _)) = self.tabs.get_index(successor) {
                    self.activate(next);
                }
            }
        }
        Some(tab)
    }

    /// Activates the tab before the active one, wrapping around.
    pub fn prev(&mut self) {
        let len = self.tabs.len();
        if len == 0 {
            return;
        }
        let index = match self.active_index() {
            Some(current) => (current + len - 1) % len,
            None => len - 1,
        };
        self.activate_index(index);
    }

    /// Activates the tab after the active one, wrapping around.
    pub fn next(&mut self) {
        let len = self.tabs.len();
        if len == 0 {
            return;
        }
        let index = match self.active_index() {
            Some(current) => (current + 1) % len,
            None => 0,
        };
        self.activate_index(index);
    }

    /// Whether `id` was activated since the last call that returned `true`
    /// for it.
    pub fn became_active(&mut self, id: TabId) -> bool {
        if self.active == Some(id) && self.became_active == Some(id) {
            self.became_active = None;
            return true;
        }
        false
    }

    /// The active tab.
    pub fn active(&self) -> Option<TabId> {
        self.active
    }

    /// Position of the active tab.
    pub fn active_index(&self) -> Option<usize> {
        self.active.and_then(|id| self.tabs.get_index_of(&id))
    }

    /// The tab with `id`.
    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.tabs.get(&id)
    }

    /// The tabs in order.
    pub fn tabs(&self) -> impl Iterator<Item = &Tab> {
        self.tabs.values()
    }

    /// Number of tabs.
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    /// Whether there are no tabs.
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Activates tabs whose button was clicked.
    ///
    /// Event positions are in the coordinate space of the last
    /// [layout](Self::layout).
    pub fn process_events(&mut self, events: &[PointerEvent]) {
        let mut clicked = Vec::new();
        for tab in self.tabs.values_mut() {
            tab.button.process(events);
            while tab.button.clicked() {
                clicked.push(tab.id);
            }
        }
        for id in clicked {
            self.activate(id);
        }
    }

    /// Lays the tab buttons out along `list` and records their hit areas.
    ///
    /// `button` draws a single tab and is told whether the tab is active.
    pub fn layout<F>(&mut self, ctx: &mut LayoutContext<'_>, list: &mut List, mut button: F) -> Dimensions
    where
        F: FnMut(&mut LayoutContext<'_>, &Tab, bool) -> Dimensions,
    {
        if list.axis != Axis::Horizontal {
            log::warn!("tab bar laid out along a vertical list");
        }
        let tabs = &self.tabs;
        let active = self.active;
        let dims = list.layout(ctx, tabs.len(), |child, index| match tabs.get_index(index) {
            Some((&id, tab)) => button(child, tab, active == Some(id)),
            None => Dimensions::default(),
        });

        for tab in self.tabs.values_mut() {
            tab.button.set_area(Default::default());
        }
        for drawn in list.drawn_children() {
            if let Some((_, tab)) = self.tabs.get_index_mut(drawn.index) {
                tab.button.set_area(drawn.rect);
            }
        }
        dims
    }

    /// Lays out the page of the active tab, if any.
    pub fn layout_active(&mut self, ctx: &mut LayoutContext<'_>) -> Dimensions {
        let Some(id) = self.active else {
            return Dimensions::default();
        };
        match self.tabs.get_mut(&id) {
            Some(tab) => tab.layout(ctx),
            None => Dimensions::default(),
        }
    }

    fn activate_index(&mut self, index: usize) {
        if let Some((&id, _)) = self.tabs.get_index(index) {
            self.activate(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;
    use tessera_core::layout::Constraints;
    use tessera_core::unit::Metric;
    use tessera_core::vg::Scene;

    fn bar(n: usize) -> (TabBar, Vec<TabId>) {
        let tabs: Vec<Tab> = (0..n).map(|i| Tab::new(format!("Tab {i}"))).collect();
        let ids = tabs.iter().map(Tab::id).collect();
        (TabBar::new(tabs), ids)
    }

    #[test]
    fn test_close_active_activates_successor() {
        let (mut bar, ids) = bar(3);
        bar.activate(ids[1]);
        let closed = bar.close(1).map(|tab| tab.id());
        assert_eq!(closed, Some(ids[1]));
        assert_eq!(bar.active(), Some(ids[2]));
        assert_eq!(bar.active_index(), Some(1));
    }

    #[test]
    fn test_close_last_active_activates_new_last() {
        let (mut bar, ids) = bar(3);
        bar.activate(ids[2]);
        bar.close(2);
        assert_eq!(bar.active(), Some(ids[1]));
    }

    #[test]
    fn test_close_inactive_keeps_active() {
        let (mut bar, ids) = bar(3);
        bar.activate(ids[2]);
        bar.close(0);
        assert_eq!(bar.active(), Some(ids[2]));
        assert_eq!(bar.active_index(), Some(1));
        assert!(bar.close(5).is_none());
    }

    #[test]
    fn test_close_only_tab() {
        let (mut bar, ids) = bar(1);
        bar.activate(ids[0]);
        bar.close(0);
        assert!(bar.is_empty());
        assert_eq!(bar.active(), None);
    }

    #[test]
    fn test_became_active_is_edge_triggered() {
        let (mut bar, ids) = bar(2);
        assert!(bar.activate(ids[0]));
        assert!(!bar.became_active(ids[1]));
        assert!(bar.became_active(ids[0]));
        assert!(!bar.became_active(ids[0]));

        bar.activate(ids[0]);
        assert!(bar.became_active(ids[0]));
    }

    #[test]
    fn test_prev_next_wrap() {
        let (mut bar, ids) = bar(3);
        bar.next();
        assert_eq!(bar.active(), Some(ids[0]));
        bar.prev();
        assert_eq!(bar.active(), Some(ids[2]));
        bar.next();
        assert_eq!(bar.active(), Some(ids[0]));
    }

    #[test]
    fn test_insert_and_append_keep_order() {
        let (mut bar, ids) = bar(2);
        let first = bar.insert(0, Tab::new("first"));
        let last = bar.append(Tab::new("last"));
        let far = bar.insert(100, Tab::new("far"));
        let order: Vec<TabId> = bar.tabs().map(Tab::id).collect();
        assert_eq!(order, vec![first, ids[0], ids[1], last, far]);
    }

    #[test]
    fn test_activate_runs_hook() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let tab = Tab::new("hooked").with_on_activate(move |id| sink.lock().unwrap().push(id));
        let id = tab.id();
        let mut bar = TabBar::new([tab, Tab::new("plain")]);

        assert!(bar.activate(id));
        assert!(bar.activate(id));
        assert_eq!(*seen.lock().unwrap(), vec![id, id]);
    }

    fn pages(labels: &[&'static str], shown: &Arc<Mutex<Vec<&'static str>>>) -> (TabBar, Vec<TabId>) {
        let tabs: Vec<Tab> = labels
            .iter()
            .map(|&label| {
                let shown = shown.clone();
                Tab::new(label).with_content(move |ctx| {
                    shown.lock().unwrap().push(label);
                    Dimensions::new(ctx.constraints.max.x, 10)
                })
            })
            .collect();
        let ids = tabs.iter().map(Tab::id).collect();
        (TabBar::new(tabs), ids)
    }

    fn layout_page(bar: &mut TabBar) -> Dimensions {
        let mut scene = Scene::new();
        let mut ctx = LayoutContext::new(
            Constraints::loose(Vector2::new(120, 80)),
            Metric::default(),
            Instant::now(),
            &[],
            &mut scene,
        );
        bar.layout_active(&mut ctx)
    }

    #[test]
    fn test_layout_active_shows_active_page() {
        let shown = Arc::new(Mutex::new(Vec::new()));
        let (mut bar, ids) = pages(&["a", "b", "c"], &shown);

        assert_eq!(layout_page(&mut bar), Dimensions::default());
        bar.activate(ids[1]);
        assert_eq!(layout_page(&mut bar).size, Vector2::new(120, 10));

        bar.close(1);
        layout_page(&mut bar);
        assert_eq!(*shown.lock().unwrap(), vec!["b", "c"]);
    }

    #[test]
    fn test_tab_without_content_takes_no_space() {
        let (mut bar, ids) = bar(1);
        bar.activate(ids[0]);
        assert_eq!(layout_page(&mut bar), Dimensions::default());
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let (mut bar, _) = bar(2);
        let stranger = Tab::new("stranger").id();
        assert!(!bar.activate(stranger));
        assert_eq!(bar.active(), None);
    }
}
