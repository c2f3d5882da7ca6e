use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 3.0;
pub const PAN_THRESHOLD_PX: f64 = 8.0;
/// Pointers pressed on a cell need to travel further, so that taps still reveal.
pub const CELL_PAN_THRESHOLD_PX: f64 = PAN_THRESHOLD_PX * 2.0;
pub const WHEEL_ZOOM_SENSITIVITY: f64 = 0.0015;
pub const FIT_MARGIN: f64 = 0.2;

fn clamp_zoom(zoom: f64) -> f64 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn distance(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Zero sizes mean the element has not been laid out yet.
    pub fn is_laid_out(self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Pan and uniform zoom applied to the field, with the transform origin at its top left corner.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl Transform {
    pub fn pan(&self) -> Point {
        Point::new(self.pan_x, self.pan_y)
    }

    pub fn to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan_x) / self.zoom,
            (screen.y - self.pan_y) / self.zoom,
        )
    }

    #[cfg(test)]
    pub(crate) fn to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x * self.zoom + self.pan_x,
            world.y * self.zoom + self.pan_y,
        )
    }

    /// Transform at `zoom` that places `world` under `screen`.
    fn anchored(world: Point, screen: Point, zoom: f64) -> Self {
        Self {
            zoom,
            pan_x: screen.x - world.x * zoom,
            pan_y: screen.y - world.y * zoom,
        }
    }

    pub fn css(&self) -> String {
        format!(
            "translate3d({}px, {}px, 0) scale({})",
            self.pan_x, self.pan_y, self.zoom
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerId(pub i32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

impl PointerKind {
    pub fn from_pointer_type(value: &str) -> Self {
        match value {
            "touch" => Self::Touch,
            "pen" => Self::Pen,
            _ => Self::Mouse,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerDown {
    pub id: PointerId,
    pub kind: PointerKind,
    pub button: i16,
    pub position: Point,
    /// Whether the pointer went down over a clickable cell.
    pub on_cell: bool,
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct DragOrigin {
    id: PointerId,
    start: Point,
    pan: Point,
    threshold: f64,
}

impl DragOrigin {
    fn moved_enough(&self, position: Point) -> bool {
        (position.x - self.start.x).abs() >= self.threshold
            || (position.y - self.start.y).abs() >= self.threshold
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct PinchBaseline {
    distance: f64,
    zoom: f64,
    world: Point,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
enum Gesture {
    #[default]
    Idle,
    Pressed(DragOrigin),
    Panning(DragOrigin),
    Pinching(PinchBaseline),
}

/// What the host should do with the event that produced this outcome.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum GestureOutcome {
    Ignored,
    Tracked,
    PanStarted,
    PinchStarted,
    Transformed,
    Released { was_panning: bool },
}

impl GestureOutcome {
    /// The pointer should be captured so the gesture keeps receiving its events.
    pub const fn captures_pointer(self) -> bool {
        matches!(self, Self::PanStarted | Self::PinchStarted)
    }

    /// The browser default (scrolling, synthetic clicks) should be suppressed.
    pub const fn prevents_default(self) -> bool {
        matches!(
            self,
            Self::PanStarted | Self::Transformed | Self::Released { was_panning: true }
        )
    }

    pub const fn has_update(self) -> bool {
        !matches!(self, Self::Ignored | Self::Tracked)
    }
}

/// Camera over the rendered field: drag to pan, pinch or wheel to zoom.
///
/// Only the first two engaged pointers take part in a gesture, any further ones are ignored until one of them is
/// released.
#[derive(Clone, Debug, Default)]
pub struct Viewport {
    transform: Transform,
    gesture: Gesture,
    pointers: SmallVec<[(PointerId, Point); 2]>,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn zoom(&self) -> f64 {
        self.transform.zoom
    }

    pub fn pan(&self) -> Point {
        self.transform.pan()
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Panning(_))
    }

    pub fn is_pinching(&self) -> bool {
        matches!(self.gesture, Gesture::Pinching(_))
    }

    pub fn has_active_pointers(&self) -> bool {
        !self.pointers.is_empty()
    }

    pub fn css_transform(&self) -> String {
        self.transform.css()
    }

    pub fn pointer_down(&mut self, event: PointerDown) -> GestureOutcome {
        if event.button != 0 {
            return GestureOutcome::Ignored;
        }
        // mice and pens drive a single pointer, only touch can pinch
        if event.kind != PointerKind::Touch && !self.pointers.is_empty() {
            return GestureOutcome::Ignored;
        }
        if self.pointers.len() >= 2 || self.pointer_index(event.id).is_some() {
            return GestureOutcome::Ignored;
        }

        self.pointers.push((event.id, event.position));
        log::trace!("pointer {:?} down at {:?}", event.id, event.position);

        if self.pointers.len() == 2 {
            self.start_pinch();
            return GestureOutcome::PinchStarted;
        }

        let threshold = if event.on_cell {
            CELL_PAN_THRESHOLD_PX
        } else {
            PAN_THRESHOLD_PX
        };
        self.gesture = Gesture::Pressed(DragOrigin {
            id: event.id,
            start: event.position,
            pan: self.transform.pan(),
            threshold,
        });
        GestureOutcome::Tracked
    }

    pub fn pointer_move(&mut self, id: PointerId, position: Point) -> GestureOutcome {
        let Some(index) = self.pointer_index(id) else {
            return GestureOutcome::Ignored;
        };
        self.pointers[index].1 = position;

        match self.gesture {
            Gesture::Pinching(baseline) => {
                self.update_pinch(baseline);
                GestureOutcome::Transformed
            }
            Gesture::Pressed(origin) if origin.id == id => {
                if !origin.moved_enough(position) {
                    return GestureOutcome::Tracked;
                }
                log::debug!("pan started by {:?}", id);
                self.gesture = Gesture::Panning(origin);
                self.drag_to(origin, position);
                GestureOutcome::PanStarted
            }
            Gesture::Panning(origin) if origin.id == id => {
                self.drag_to(origin, position);
                GestureOutcome::Transformed
            }
            _ => GestureOutcome::Tracked,
        }
    }

    /// Handles release and cancellation alike, wherever on the page they happen.
    pub fn pointer_up(&mut self, id: PointerId) -> GestureOutcome {
        let Some(index) = self.pointer_index(id) else {
            return GestureOutcome::Ignored;
        };
        self.pointers.remove(index);
        log::trace!("pointer {:?} up", id);

        match self.gesture {
            Gesture::Pinching(_) if self.pointers.len() < 2 => {
                log::debug!("pinch ended at zoom {}", self.transform.zoom);
                self.gesture = Gesture::Idle;
                GestureOutcome::Released { was_panning: false }
            }
            Gesture::Pressed(origin) if origin.id == id => {
                self.gesture = Gesture::Idle;
                GestureOutcome::Released { was_panning: false }
            }
            Gesture::Panning(origin) if origin.id == id => {
                log::debug!("pan ended at {:?}", self.transform.pan());
                self.gesture = Gesture::Idle;
                GestureOutcome::Released { was_panning: true }
            }
            _ => GestureOutcome::Tracked,
        }
    }

    /// Drops every engaged pointer without touching the transform.
    pub fn reset_gesture(&mut self) {
        self.pointers.clear();
        self.gesture = Gesture::Idle;
    }

    pub fn on_wheel(&mut self, delta_y: f64, position: Point) -> GestureOutcome {
        if delta_y == 0.0 {
            return GestureOutcome::Ignored;
        }
        let factor = (-delta_y * WHEEL_ZOOM_SENSITIVITY).exp();
        if self.zoom_at(position, factor) {
            GestureOutcome::Transformed
        } else {
            GestureOutcome::Ignored
        }
    }

    /// Scales the zoom by `factor`, keeping the world point under `position` in place.
    pub fn zoom_at(&mut self, position: Point, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let world = self.transform.to_world(position);
        let zoom = clamp_zoom(self.transform.zoom * factor);
        self.transform = Transform::anchored(world, position, zoom);
        true
    }

    /// Zooms the field to fit the viewport with some margin and centers it. Does nothing until both are laid out.
    pub fn fit_to_viewport(&mut self, viewport: Size, field: Size) -> bool {
        if !viewport.is_laid_out() || !field.is_laid_out() {
            return false;
        }

        let ratio = (viewport.width / field.width).min(viewport.height / field.height);
        let zoom = clamp_zoom(clamp_zoom(ratio) - FIT_MARGIN);
        self.transform = Transform {
            zoom,
            pan_x: (viewport.width - field.width * zoom) / 2.0,
            pan_y: (viewport.height - field.height * zoom) / 2.0,
        };
        log::debug!("fit to viewport: {:?}", self.transform);
        true
    }

    fn pointer_index(&self, id: PointerId) -> Option<usize> {
        self.pointers.iter().position(|&(pointer, _)| pointer == id)
    }

    fn pinch_points(&self) -> Option<(Point, Point)> {
        match self.pointers.as_slice() {
            [(_, a), (_, b)] => Some((*a, *b)),
            _ => None,
        }
    }

    fn start_pinch(&mut self) {
        let Some((a, b)) = self.pinch_points() else {
            return;
        };
        let baseline = PinchBaseline {
            distance: a.distance(b),
            zoom: self.transform.zoom,
            world: self.transform.to_world(a.midpoint(b)),
        };
        log::debug!("pinch started: {:?}", baseline);
        self.gesture = Gesture::Pinching(baseline);
    }

    fn update_pinch(&mut self, baseline: PinchBaseline) {
        let Some((a, b)) = self.pinch_points() else {
            return;
        };
        let zoom = if baseline.distance > f64::EPSILON {
            clamp_zoom(baseline.zoom * a.distance(b) / baseline.distance)
        } else {
            baseline.zoom
        };
        self.transform = Transform::anchored(baseline.world, a.midpoint(b), zoom);
    }

    fn drag_to(&mut self, origin: DragOrigin, position: Point) {
        self.transform.pan_x = origin.pan.x + position.x - origin.start.x;
        self.transform.pan_y = origin.pan.y + position.y - origin.start.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < EPSILON, "{} != {}", a, b);
    }

    fn down(id: i32, kind: PointerKind, x: f64, y: f64) -> PointerDown {
        PointerDown {
            id: PointerId(id),
            kind,
            button: 0,
            position: Point::new(x, y),
            on_cell: false,
        }
    }

    fn mouse(id: i32, x: f64, y: f64) -> PointerDown {
        down(id, PointerKind::Mouse, x, y)
    }

    fn touch(id: i32, x: f64, y: f64) -> PointerDown {
        down(id, PointerKind::Touch, x, y)
    }

    #[test]
    fn drag_past_threshold_pans_until_release() {
        let mut viewport = Viewport::new();

        assert_eq!(viewport.pointer_down(mouse(1, 100.0, 100.0)), GestureOutcome::Tracked);
        let outcome = viewport.pointer_move(PointerId(1), Point::new(120.0, 100.0));

        assert_eq!(outcome, GestureOutcome::PanStarted);
        assert!(outcome.captures_pointer());
        assert!(viewport.is_panning());
        assert_eq!(viewport.pan(), Point::new(20.0, 0.0));

        assert_eq!(
            viewport.pointer_move(PointerId(1), Point::new(130.0, 90.0)),
            GestureOutcome::Transformed
        );
        assert_eq!(viewport.pan(), Point::new(30.0, -10.0));
        assert!(viewport.is_panning());

        let outcome = viewport.pointer_up(PointerId(1));
        assert_eq!(outcome, GestureOutcome::Released { was_panning: true });
        assert!(outcome.prevents_default());
        assert!(!viewport.is_panning());
    }

    #[test]
    fn release_is_handled_once() {
        let mut viewport = Viewport::new();
        viewport.pointer_down(mouse(1, 100.0, 100.0));
        viewport.pointer_move(PointerId(1), Point::new(120.0, 100.0));

        // the viewport and the window both see the same release
        assert!(viewport.pointer_up(PointerId(1)).has_update());
        assert_eq!(viewport.pointer_up(PointerId(1)), GestureOutcome::Ignored);
        assert!(!viewport.has_active_pointers());
    }

    #[test]
    fn small_moves_stay_a_tap() {
        let mut viewport = Viewport::new();
        viewport.pointer_down(mouse(1, 100.0, 100.0));

        assert_eq!(
            viewport.pointer_move(PointerId(1), Point::new(105.0, 97.0)),
            GestureOutcome::Tracked
        );
        assert!(!viewport.is_panning());
        assert_eq!(viewport.transform(), Transform::default());

        let outcome = viewport.pointer_up(PointerId(1));
        assert_eq!(outcome, GestureOutcome::Released { was_panning: false });
        assert!(!outcome.prevents_default());
    }

    #[test]
    fn pressing_on_a_cell_doubles_the_threshold() {
        let mut viewport = Viewport::new();
        viewport.pointer_down(PointerDown {
            on_cell: true,
            ..mouse(1, 0.0, 0.0)
        });

        viewport.pointer_move(PointerId(1), Point::new(0.0, 12.0));
        assert!(!viewport.is_panning());

        viewport.pointer_move(PointerId(1), Point::new(0.0, 16.0));
        assert!(viewport.is_panning());
        assert_eq!(viewport.pan(), Point::new(0.0, 16.0));
    }

    #[test]
    fn secondary_buttons_and_extra_mice_are_ignored() {
        let mut viewport = Viewport::new();

        let right = PointerDown {
            button: 2,
            ..mouse(1, 0.0, 0.0)
        };
        assert_eq!(viewport.pointer_down(right), GestureOutcome::Ignored);

        viewport.pointer_down(mouse(1, 0.0, 0.0));
        assert_eq!(viewport.pointer_down(mouse(2, 5.0, 5.0)), GestureOutcome::Ignored);
        assert!(!viewport.is_pinching());
        assert_eq!(
            viewport.pointer_move(PointerId(2), Point::new(50.0, 50.0)),
            GestureOutcome::Ignored
        );
    }

    #[test]
    fn pinch_zooms_around_the_midpoint() {
        let mut viewport = Viewport::new();
        viewport.pointer_down(touch(1, 0.0, 0.0));
        viewport.pointer_move(PointerId(1), Point::new(20.0, 0.0));
        assert!(viewport.is_panning());

        assert_eq!(viewport.pointer_down(touch(2, 120.0, 0.0)), GestureOutcome::PinchStarted);
        assert!(viewport.is_pinching());
        assert!(!viewport.is_panning());

        let before = viewport.transform();
        let world = before.to_world(Point::new(70.0, 0.0));

        assert_eq!(
            viewport.pointer_move(PointerId(2), Point::new(220.0, 0.0)),
            GestureOutcome::Transformed
        );

        assert_close(viewport.zoom(), 2.0);
        let screen = viewport.transform().to_screen(world);
        assert_close(screen.x, 120.0);
        assert_close(screen.y, 0.0);
    }

    #[test]
    fn pinch_zoom_is_clamped() {
        let mut viewport = Viewport::new();
        viewport.pointer_down(touch(1, 0.0, 0.0));
        viewport.pointer_down(touch(2, 10.0, 0.0));

        viewport.pointer_move(PointerId(2), Point::new(1000.0, 0.0));
        assert_close(viewport.zoom(), MAX_ZOOM);

        viewport.pointer_move(PointerId(2), Point::new(1.0, 0.0));
        assert_close(viewport.zoom(), MIN_ZOOM);
    }

    #[test]
    fn third_pointer_is_ignored() {
        let mut viewport = Viewport::new();
        viewport.pointer_down(touch(1, 0.0, 0.0));
        viewport.pointer_down(touch(2, 100.0, 0.0));
        let before = viewport.transform();

        assert_eq!(viewport.pointer_down(touch(3, 50.0, 50.0)), GestureOutcome::Ignored);
        assert_eq!(
            viewport.pointer_move(PointerId(3), Point::new(500.0, 500.0)),
            GestureOutcome::Ignored
        );
        assert_eq!(viewport.pointer_up(PointerId(3)), GestureOutcome::Ignored);

        assert!(viewport.is_pinching());
        assert_eq!(viewport.transform(), before);
    }

    #[test]
    fn lifting_a_finger_ends_the_pinch() {
        let mut viewport = Viewport::new();
        viewport.pointer_down(touch(1, 0.0, 0.0));
        viewport.pointer_down(touch(2, 100.0, 0.0));
        viewport.pointer_move(PointerId(2), Point::new(150.0, 0.0));

        assert_eq!(
            viewport.pointer_up(PointerId(1)),
            GestureOutcome::Released { was_panning: false }
        );
        assert!(!viewport.is_pinching());

        // the remaining finger does not start a pan on its own
        let after = viewport.transform();
        viewport.pointer_move(PointerId(2), Point::new(300.0, 40.0));
        assert!(!viewport.is_panning());
        assert_eq!(viewport.transform(), after);

        // but a new second finger starts another pinch
        assert_eq!(viewport.pointer_down(touch(4, 0.0, 0.0)), GestureOutcome::PinchStarted);
    }

    #[test]
    fn wheel_zooms_in_around_the_cursor() {
        let mut viewport = Viewport::new();
        let cursor = Point::new(50.0, 50.0);
        let world = viewport.transform().to_world(cursor);

        assert_eq!(viewport.on_wheel(-100.0, cursor), GestureOutcome::Transformed);

        assert!(viewport.zoom() > 1.0);
        assert_close(viewport.zoom(), (0.15f64).exp());
        let screen = viewport.transform().to_screen(world);
        assert_close(screen.x, cursor.x);
        assert_close(screen.y, cursor.y);
    }

    #[test]
    fn wheel_zoom_out_is_clamped() {
        let mut viewport = Viewport::new();
        for _ in 0..20 {
            viewport.on_wheel(500.0, Point::new(10.0, 10.0));
        }
        assert_close(viewport.zoom(), MIN_ZOOM);
        assert_eq!(viewport.on_wheel(0.0, Point::default()), GestureOutcome::Ignored);
    }

    #[test]
    fn fit_centers_the_field_with_margin() {
        let mut viewport = Viewport::new();

        assert!(viewport.fit_to_viewport(Size::new(800.0, 600.0), Size::new(400.0, 400.0)));

        let transform = viewport.transform();
        assert_close(transform.zoom, 1.3);
        assert_close(transform.pan_x, 140.0);
        assert_close(transform.pan_y, 40.0);
    }

    #[test]
    fn fit_stays_within_zoom_bounds() {
        let mut viewport = Viewport::new();

        viewport.fit_to_viewport(Size::new(100.0, 100.0), Size::new(1000.0, 1000.0));
        assert_close(viewport.zoom(), MIN_ZOOM);

        viewport.fit_to_viewport(Size::new(5000.0, 5000.0), Size::new(100.0, 100.0));
        assert_close(viewport.zoom(), MAX_ZOOM - FIT_MARGIN);
    }

    #[test]
    fn fit_waits_for_layout() {
        let mut viewport = Viewport::new();

        assert!(!viewport.fit_to_viewport(Size::new(0.0, 600.0), Size::new(400.0, 400.0)));
        assert!(!viewport.fit_to_viewport(Size::new(800.0, 600.0), Size::default()));
        assert_eq!(viewport.transform(), Transform::default());
    }

    #[test]
    fn css_transform_matches_state() {
        let mut viewport = Viewport::new();
        assert_eq!(viewport.css_transform(), "translate3d(0px, 0px, 0) scale(1)");

        viewport.fit_to_viewport(Size::new(800.0, 600.0), Size::new(400.0, 400.0));
        assert_eq!(
            viewport.css_transform(),
            format!("translate3d({}px, {}px, 0) scale({})", 140.0, 40.0, 1.3)
        );
    }

    #[test]
    fn reset_gesture_drops_pointers() {
        let mut viewport = Viewport::new();
        viewport.pointer_down(mouse(1, 0.0, 0.0));
        viewport.pointer_move(PointerId(1), Point::new(50.0, 0.0));

        viewport.reset_gesture();

        assert!(!viewport.is_panning());
        assert!(!viewport.has_active_pointers());
        assert_eq!(viewport.pan(), Point::new(50.0, 0.0));
    }
}
