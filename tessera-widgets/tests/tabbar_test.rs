//! Tests for tab bar layout and click handling

use nalgebra::Vector2;
use std::time::Instant;

use tessera_core::event::{Buttons, PointerEvent, PointerKind};
use tessera_core::layout::{Alignment, Axis, Constraints, Dimensions, LayoutContext, List};
use tessera_core::unit::Metric;
use tessera_core::vg::kurbo::Rect;
use tessera_core::vg::Scene;
use tessera_widgets::tabbar::{Tab, TabBar, TabId};

fn tabs(n: usize) -> (TabBar, Vec<TabId>) {
    let tabs: Vec<Tab> = (0..n).map(|i| Tab::new(format!("Tab {i}"))).collect();
    let ids = tabs.iter().map(Tab::id).collect();
    (TabBar::new(tabs), ids)
}

fn layout(bar: &mut TabBar, list: &mut List, seen: &mut Vec<(String, bool)>) -> Dimensions {
    let mut scene = Scene::new();
    let mut ctx = LayoutContext::new(
        Constraints::loose(Vector2::new(300, 48)),
        Metric::default(),
        Instant::now(),
        &[],
        &mut scene,
    );
    bar.layout(&mut ctx, list, |_, tab, active| {
        seen.push((tab.label.clone(), active));
        Dimensions::new(90, 48)
    })
}

fn click(x: f32, y: f32) -> [PointerEvent; 2] {
    [
        PointerEvent::new(PointerKind::Press, Vector2::new(x, y)).with_buttons(Buttons::LEFT),
        PointerEvent::new(PointerKind::Release, Vector2::new(x, y)),
    ]
}

#[test]
fn test_layout_records_button_areas() {
    let (mut bar, ids) = tabs(3);
    bar.activate(ids[1]);
    let mut list = List::new(Axis::Horizontal).with_alignment(Alignment::Middle);
    let mut seen = Vec::new();

    let dims = layout(&mut bar, &mut list, &mut seen);
    assert_eq!(dims.size, Vector2::new(270, 48));
    assert_eq!(
        seen,
        vec![
            ("Tab 0".to_string(), false),
            ("Tab 1".to_string(), true),
            ("Tab 2".to_string(), false),
        ]
    );
    let areas: Vec<Rect> = bar.tabs().map(|tab| tab.button().area()).collect();
    assert_eq!(areas[1], Rect::new(90.0, 0.0, 180.0, 48.0));
}

#[test]
fn test_click_activates_tab() {
    let (mut bar, ids) = tabs(3);
    let mut list = List::new(Axis::Horizontal);
    layout(&mut bar, &mut list, &mut Vec::new());

    bar.process_events(&click(200.0, 10.0));
    assert_eq!(bar.active(), Some(ids[2]));
    assert!(bar.became_active(ids[2]));

    bar.process_events(&click(295.0, 10.0));
    assert_eq!(bar.active(), Some(ids[2]));
    assert!(!bar.became_active(ids[2]));
}

#[test]
fn test_closed_tab_stops_taking_clicks() {
    let (mut bar, ids) = tabs(3);
    let mut list = List::new(Axis::Horizontal);
    layout(&mut bar, &mut list, &mut Vec::new());

    bar.activate(ids[1]);
    bar.close(1);
    assert_eq!(bar.active(), Some(ids[2]));
    layout(&mut bar, &mut list, &mut Vec::new());

    bar.process_events(&click(100.0, 10.0));
    assert_eq!(bar.active(), Some(ids[2]));
    bar.process_events(&click(10.0, 10.0));
    assert_eq!(bar.active(), Some(ids[0]));
}

#[test]
fn test_click_switches_page() {
    let tabs: Vec<Tab> = ["Inbox", "Sent"]
        .into_iter()
        .map(|label| Tab::new(label).with_content(move |_| Dimensions::new(label.len() as i32, 1)))
        .collect();
    let mut bar = TabBar::new(tabs);
    let mut list = List::new(Axis::Horizontal);
    layout(&mut bar, &mut list, &mut Vec::new());

    let page = |bar: &mut TabBar| {
        let mut scene = Scene::new();
        let mut ctx = LayoutContext::new(
            Constraints::loose(Vector2::new(300, 200)),
            Metric::default(),
            Instant::now(),
            &[],
            &mut scene,
        );
        bar.layout_active(&mut ctx).size.x
    };
    assert_eq!(page(&mut bar), 0);

    bar.process_events(&click(100.0, 10.0));
    assert_eq!(page(&mut bar), 4);
    bar.process_events(&click(10.0, 10.0));
    assert_eq!(page(&mut bar), 5);
}
