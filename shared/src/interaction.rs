use serde::Serialize;

use crate::geometry::{Point, Size};
use crate::hit::HitIndex;
use crate::insights::Tooltip;
use crate::intensity::Metric;
use crate::region::{Region, RegionRegistry};
use crate::stats::StatsMap;
use crate::viewport::Viewport;

/// Pointer travel (px) beyond which a press-release is a drag, not a click.
const CLICK_SLOP_PX: f64 = 5.0;

/// Receives the postal code of a region the user selected.
pub trait SelectHandler {
    fn select(&mut self, region_id: &str);
}

impl<F: FnMut(&str)> SelectHandler for F {
    fn select(&mut self, region_id: &str) {
        self(region_id)
    }
}

/// Device-independent pointer event, in container pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Down(Point),
    Move(Point),
    Up,
    Leave,
    Click(Point),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

impl PointerInput {
    /// Map a touch event onto the pointer pipeline using the first touch only.
    pub fn from_touches(phase: TouchPhase, touches: &[Point]) -> Option<Self> {
        match phase {
            TouchPhase::Start => touches.first().map(|&p| Self::Down(p)),
            TouchPhase::Move => touches.first().map(|&p| Self::Move(p)),
            TouchPhase::End => Some(Self::Up),
            TouchPhase::Cancel => Some(Self::Leave),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionState {
    pub hovered: Option<String>,
    pub metric: Metric,
    pub intelligence_panel_open: bool,
}

/// Binds pointer input to the viewport and to region hover/selection.
pub struct InteractionSurface<'r, S> {
    registry: &'r RegionRegistry,
    hits: HitIndex<'r>,
    viewport: Viewport,
    state: InteractionState,
    press: Option<Point>,
    on_select: S,
}

impl<'r, S: SelectHandler> InteractionSurface<'r, S> {
    pub fn new(registry: &'r RegionRegistry, container: Size, on_select: S) -> Self {
        Self {
            registry,
            hits: HitIndex::build(registry.regions()),
            viewport: Viewport::new(container, registry.default_target()),
            state: InteractionState::default(),
            press: None,
            on_select,
        }
    }

    pub fn registry(&self) -> &'r RegionRegistry {
        self.registry
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Zoom, lock, center, reset and resize commands go straight to the viewport.
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn hovered(&self) -> Option<&str> {
        self.state.hovered.as_deref()
    }

    pub fn metric(&self) -> Metric {
        self.state.metric
    }

    /// Region under a container-pixel point.
    pub fn region_at(&self, screen: Point) -> Option<&'r Region> {
        self.hits.find_at(self.viewport.screen_to_virtual(screen))
    }

    /// Pointer entered a region's geometry. Replaces any previous hover.
    pub fn enter_region(&mut self, region_id: &str) -> bool {
        let Some(region) = self.registry.get(region_id) else {
            return false;
        };
        self.set_hovered(Some(region.id))
    }

    /// Pointer left a region's geometry. Stale leaves for other regions are ignored.
    pub fn leave_region(&mut self, region_id: &str) -> bool {
        if self.hovered() != Some(region_id) {
            return false;
        }
        self.set_hovered(None)
    }

    fn set_hovered(&mut self, region_id: Option<&str>) -> bool {
        if self.hovered() == region_id {
            return false;
        }
        self.state.hovered = region_id.map(str::to_string);
        true
    }

    /// Feed one pointer event. Returns whether anything visible changed.
    pub fn handle_pointer(&mut self, input: PointerInput) -> bool {
        match input {
            PointerInput::Down(p) => {
                self.press = Some(p);
                self.viewport.begin_drag(p);
                if self.viewport.is_dragging() {
                    self.set_hovered(None);
                    return true;
                }
                false
            }
            PointerInput::Move(p) => {
                if self.viewport.is_dragging() {
                    self.viewport.update_drag(p);
                    return true;
                }
                let hit = self.region_at(p).map(|r| r.id);
                self.set_hovered(hit)
            }
            PointerInput::Up => {
                let was_dragging = self.viewport.is_dragging();
                self.viewport.end_drag();
                was_dragging
            }
            PointerInput::Leave => {
                let was_dragging = self.viewport.is_dragging();
                self.viewport.end_drag();
                self.press = None;
                let cleared = self.set_hovered(None);
                was_dragging || cleared
            }
            PointerInput::Click(p) => {
                let press = self.press.take();
                if press.is_some_and(|start| start.distance(p) >= CLICK_SLOP_PX) {
                    return false;
                }
                match self.region_at(p) {
                    Some(region) => self.select_region(region.id),
                    None => false,
                }
            }
        }
    }

    /// Invoke the select callback for a known region, once.
    pub fn select_region(&mut self, region_id: &str) -> bool {
        if !self.registry.contains_id(region_id) {
            return false;
        }
        self.on_select.select(region_id);
        true
    }

    /// "Go to hub" for the hovered region, if any.
    pub fn go_to_hub(&mut self) -> bool {
        let Some(region_id) = self.state.hovered.clone() else {
            return false;
        };
        self.select_region(&region_id)
    }

    pub fn set_metric(&mut self, metric: Metric) -> bool {
        if self.state.metric == metric {
            return false;
        }
        self.state.metric = metric;
        true
    }

    pub fn toggle_intelligence_panel(&mut self) {
        self.state.intelligence_panel_open = !self.state.intelligence_panel_open;
    }

    /// Drop transient UI state when the host navigates away from the map.
    pub fn reset_for_navigation(&mut self) {
        self.state = InteractionState::default();
        self.press = None;
        self.viewport.end_drag();
    }

    pub fn tooltip(&self, stats: &StatsMap) -> Option<Tooltip> {
        let region = self.registry.get(self.hovered()?)?;
        Some(Tooltip::for_region(region, stats))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::region::registry;
    use crate::stats::RegionStats;

    type Selections = Rc<RefCell<Vec<String>>>;

    fn surface() -> (InteractionSurface<'static, impl FnMut(&str)>, Selections) {
        let selections: Selections = Rc::new(RefCell::new(Vec::new()));
        let sink = selections.clone();
        let surface = InteractionSurface::new(
            registry(),
            Size::new(800.0, 600.0),
            move |id: &str| sink.borrow_mut().push(id.to_string()),
        );
        (surface, selections)
    }

    fn screen_of<S: SelectHandler>(surface: &InteractionSurface<'_, S>, id: &str) -> Point {
        let region = surface.registry().get(id).expect("known region");
        surface.viewport().virtual_to_screen(region.label_anchor)
    }

    #[test]
    fn hover_moves_between_regions_without_leave() {
        let (mut surface, _) = surface();
        assert!(surface.enter_region("33301"));
        assert!(surface.enter_region("33431"));
        assert_eq!(surface.hovered(), Some("33431"));

        // A late leave for the old region must not clear the new hover.
        assert!(!surface.leave_region("33301"));
        assert_eq!(surface.hovered(), Some("33431"));

        assert!(surface.leave_region("33431"));
        assert_eq!(surface.hovered(), None);
    }

    #[test]
    fn pointer_move_hovers_through_hit_test() {
        let (mut surface, _) = surface();
        let ftl = screen_of(&surface, "33301");
        let boca = screen_of(&surface, "33431");

        assert!(surface.handle_pointer(PointerInput::Move(ftl)));
        assert_eq!(surface.hovered(), Some("33301"));
        assert!(surface.handle_pointer(PointerInput::Move(boca)));
        assert_eq!(surface.hovered(), Some("33431"));
        assert!(!surface.handle_pointer(PointerInput::Move(boca)));

        assert!(surface.handle_pointer(PointerInput::Move(Point::new(1.0, 1.0))));
        assert_eq!(surface.hovered(), None);
    }

    #[test]
    fn unknown_region_enter_is_ignored() {
        let (mut surface, _) = surface();
        assert!(!surface.enter_region("99999"));
        assert_eq!(surface.hovered(), None);
    }

    #[test]
    fn click_selects_exactly_once() {
        let (mut surface, selections) = surface();
        let ftl = screen_of(&surface, "33301");
        surface.handle_pointer(PointerInput::Down(ftl));
        surface.handle_pointer(PointerInput::Up);
        assert!(surface.handle_pointer(PointerInput::Click(ftl)));
        assert_eq!(*selections.borrow(), ["33301"]);
    }

    #[test]
    fn click_on_bare_map_selects_nothing() {
        let (mut surface, selections) = surface();
        let p = Point::new(2.0, 2.0);
        surface.handle_pointer(PointerInput::Down(p));
        assert!(!surface.handle_pointer(PointerInput::Click(p)));
        assert!(selections.borrow().is_empty());
    }

    #[test]
    fn drag_release_is_not_a_click() {
        let (mut surface, selections) = surface();
        surface.viewport_mut().toggle_lock();
        let start = screen_of(&surface, "33301");
        let end = Point::new(start.x + 40.0, start.y);
        surface.handle_pointer(PointerInput::Down(start));
        surface.handle_pointer(PointerInput::Move(end));
        surface.handle_pointer(PointerInput::Up);
        assert!(!surface.handle_pointer(PointerInput::Click(end)));
        assert!(selections.borrow().is_empty());
    }

    #[test]
    fn go_to_hub_selects_hovered_region() {
        let (mut surface, selections) = surface();
        assert!(!surface.go_to_hub());
        surface.enter_region("33027");
        assert!(surface.go_to_hub());
        assert_eq!(*selections.borrow(), ["33027"]);
        assert_eq!(surface.hovered(), Some("33027"));
    }

    #[test]
    fn select_unknown_region_is_ignored() {
        let (mut surface, selections) = surface();
        assert!(!surface.select_region("00000"));
        assert!(selections.borrow().is_empty());
    }

    #[test]
    fn locked_drag_does_not_pan_but_unlocked_does() {
        let (mut surface, _) = surface();
        let before = surface.viewport().pan();
        surface.handle_pointer(PointerInput::Down(Point::new(10.0, 10.0)));
        surface.handle_pointer(PointerInput::Move(Point::new(90.0, 10.0)));
        assert_eq!(surface.viewport().pan(), before);

        surface.viewport_mut().toggle_lock();
        surface.handle_pointer(PointerInput::Down(Point::new(10.0, 10.0)));
        assert!(surface.viewport().is_dragging());
        surface.handle_pointer(PointerInput::Move(Point::new(90.0, 10.0)));
        assert!((surface.viewport().pan().x - (before.x + 80.0)).abs() < 1e-9);
        surface.handle_pointer(PointerInput::Up);
        assert!(!surface.viewport().is_dragging());
    }

    #[test]
    fn drag_start_clears_hover_and_leave_ends_drag() {
        let (mut surface, _) = surface();
        surface.viewport_mut().toggle_lock();
        surface.enter_region("33301");
        surface.handle_pointer(PointerInput::Down(Point::new(10.0, 10.0)));
        assert_eq!(surface.hovered(), None);
        assert!(surface.handle_pointer(PointerInput::Leave));
        assert!(!surface.viewport().is_dragging());
    }

    #[test]
    fn touch_uses_first_point_only() {
        let touches = [Point::new(1.0, 2.0), Point::new(50.0, 60.0)];
        assert_eq!(
            PointerInput::from_touches(TouchPhase::Start, &touches),
            Some(PointerInput::Down(Point::new(1.0, 2.0)))
        );
        assert_eq!(
            PointerInput::from_touches(TouchPhase::Move, &touches),
            Some(PointerInput::Move(Point::new(1.0, 2.0)))
        );
        assert_eq!(PointerInput::from_touches(TouchPhase::Move, &[]), None);
        assert_eq!(
            PointerInput::from_touches(TouchPhase::End, &[]),
            Some(PointerInput::Up)
        );
        assert_eq!(
            PointerInput::from_touches(TouchPhase::Cancel, &[]),
            Some(PointerInput::Leave)
        );
    }

    #[test]
    fn metric_and_panel_toggles_reset_on_navigation() {
        let (mut surface, _) = surface();
        assert!(surface.set_metric(Metric::Growth));
        assert!(!surface.set_metric(Metric::Growth));
        surface.toggle_intelligence_panel();
        surface.enter_region("33480");
        assert!(surface.state().intelligence_panel_open);

        surface.reset_for_navigation();
        assert_eq!(surface.state(), &InteractionState::default());
        assert_eq!(surface.metric(), Metric::Volume);
    }

    #[test]
    fn tooltip_tracks_hovered_region() {
        let (mut surface, _) = surface();
        let mut stats = StatsMap::new();
        stats.insert(
            "33009".to_string(),
            RegionStats {
                volume: 2_500,
                recent_count: 12,
                ..RegionStats::default()
            },
        );
        assert!(surface.tooltip(&stats).is_none());
        surface.enter_region("33009");
        let tooltip = surface.tooltip(&stats).expect("tooltip for hovered region");
        assert_eq!(tooltip.name, "Hallandale Beach");
        assert_eq!(tooltip.volume, "2,500");
        assert_eq!(tooltip.recent, "+12");
    }
}
