use crate::cell::{CellMsg, CellView, ViewCellState, step_focus};
use crate::controls::ControlsView;
use crate::utils::*;
use clap::Args;
use gloo::events::{EventListener, EventListenerOptions};
use gloo::render::{AnimationFrame, request_animation_frame};
use sapper_core as game;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, PointerEvent, WheelEvent};
use yew::prelude::*;

#[derive(Args, Properties, Debug, Clone, Default, PartialEq)]
pub(crate) struct GameProps {
    /// Force a seed instead of random
    #[arg(short, long)]
    #[prop_or_default]
    pub seed: Option<u64>,

    /// Difficulty to start with
    #[arg(short, long)]
    #[prop_or_default]
    pub difficulty: Option<game::Difficulty>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Msg {
    Cell(CellMsg),
    NewGame,
    SelectDifficulty(game::Difficulty),
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    Wheel(WheelEvent),
    Blur,
    Fit,
}

pub(crate) struct GameView {
    session: game::Session,
    viewport: game::Viewport,
    viewport_ref: NodeRef,
    field_ref: NodeRef,
    /// Set when a pan ends, so the click that follows the release does not reveal a cell.
    suppress_click: bool,
    /// Keyboard cursor, the only cell in the tab order.
    focused: game::Coord2,
    /// Set when the cursor moved by key, so the new cell gets DOM focus after rendering.
    pending_focus: bool,
    fit_frame: Option<AnimationFrame>,
    wheel_listener: Option<EventListener>,
    _release_listeners: [EventListener; 2],
    _blur_listener: EventListener,
}

impl GameView {
    /// Releases have to end a gesture even when they happen outside of the viewport, so they are taken from the
    /// window for as long as the view lives.
    fn create_release_listeners(ctx: &Context<Self>) -> [EventListener; 2] {
        let window = gloo::utils::window();
        ["pointerup", "pointercancel"].map(|event_type| {
            let link = ctx.link().clone();
            EventListener::new(&window, event_type, move |event| {
                if let Some(event) = event.dyn_ref::<PointerEvent>() {
                    link.send_message(Msg::PointerUp(event.clone()));
                }
            })
        })
    }

    /// Pointers still held when the window loses focus never report their release, so the gesture is dropped.
    fn create_blur_listener(ctx: &Context<Self>) -> EventListener {
        let link = ctx.link().clone();
        EventListener::new(&gloo::utils::window(), "blur", move |_| {
            link.send_message(Msg::Blur)
        })
    }

    fn focus_cell(&self) {
        let (row, column) = self.focused;
        let id = format!("cell-{}-{}", row, column);
        let Some(element) = gloo::utils::document()
            .get_element_by_id(&id)
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        if let Err(err) = element.focus() {
            log::warn!("failed to focus {}: {:?}", id, err);
        }
    }

    /// Wheel events are registered by hand since the listener must not be passive to stop the page from scrolling.
    fn create_wheel_listener(&self, ctx: &Context<Self>) -> Option<EventListener> {
        let element = self.viewport_ref.cast::<Element>()?;
        let link = ctx.link().clone();
        Some(EventListener::new_with_options(
            &element,
            "wheel",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                if let Some(event) = event.dyn_ref::<WheelEvent>() {
                    if event.delta_y() != 0.0 {
                        event.prevent_default();
                    }
                    link.send_message(Msg::Wheel(event.clone()));
                }
            },
        ))
    }

    /// Runs the fit on the next frame, once the new field has been laid out. A pending request is replaced, which
    /// cancels it.
    fn schedule_fit(&mut self, ctx: &Context<Self>) {
        if !self.session.wants_auto_fit() {
            return;
        }
        let link = ctx.link().clone();
        self.fit_frame = Some(request_animation_frame(move |_| link.send_message(Msg::Fit)));
    }

    fn fit_to_viewport(&mut self) -> bool {
        let (Some(viewport), Some(field)) = (
            self.viewport_ref.cast::<Element>(),
            self.field_ref.cast::<HtmlElement>(),
        ) else {
            return false;
        };

        self.viewport.fit_to_viewport(
            game::Size::new(viewport.client_width().into(), viewport.client_height().into()),
            game::Size::new(field.offset_width().into(), field.offset_height().into()),
        )
    }

    /// Converts client coordinates into coordinates relative to the viewport element.
    fn local_point(&self, client_x: i32, client_y: i32) -> game::Point {
        let (left, top) = self
            .viewport_ref
            .cast::<Element>()
            .map(|element| {
                let rect = element.get_bounding_client_rect();
                (rect.left(), rect.top())
            })
            .unwrap_or_default();
        game::Point::new(f64::from(client_x) - left, f64::from(client_y) - top)
    }

    fn apply_gesture(&self, event: &PointerEvent, outcome: game::GestureOutcome) -> bool {
        log::trace!("pointer {} -> {:?}", event.pointer_id(), outcome);

        if outcome.prevents_default() {
            event.prevent_default();
        }

        if let Some(element) = self.viewport_ref.cast::<Element>() {
            let pointer_id = event.pointer_id();
            if outcome.captures_pointer() {
                if let Err(err) = element.set_pointer_capture(pointer_id) {
                    log::warn!("failed to capture pointer {}: {:?}", pointer_id, err);
                }
            } else if matches!(outcome, game::GestureOutcome::Released { .. })
                && element.has_pointer_capture(pointer_id)
            {
                if let Err(err) = element.release_pointer_capture(pointer_id) {
                    log::warn!("failed to release pointer {}: {:?}", pointer_id, err);
                }
            }
        }

        outcome.has_update()
    }

    fn trigger_cell(&mut self, coords: game::Coord2) -> bool {
        match self.session.trigger_cell(coords) {
            Ok(outcome) => {
                log::debug!("trigger {:?}: {:?}", coords, outcome);
                let moved = self.focused != coords;
                self.focused = coords;
                moved || outcome.has_update()
            }
            Err(err) => {
                log::error!("trigger {:?} rejected: {}", coords, err);
                false
            }
        }
    }

    fn flag_cell(&mut self, coords: game::Coord2) -> bool {
        match self.session.flag_cell(coords) {
            Ok(outcome) => {
                log::debug!("flag {:?}: {:?}", coords, outcome);
                outcome.has_update()
            }
            Err(err) => {
                log::error!("flag {:?} rejected: {}", coords, err);
                false
            }
        }
    }

    fn view_field(&self, ctx: &Context<Self>) -> Html {
        let phase = self.session.phase();
        let triggered_mine = self.session.triggered_mine();
        let callback = ctx.link().callback(Msg::Cell);
        let field = self.session.field();
        let label = format!(
            "Minefield, {} of {} cells open",
            field.revealed_count(),
            field.total_cells()
        );

        html! {
            <table class="sapper-grid" role="grid" aria-label={label}>
                {
                    for field.rows().map(|row| html! {
                        <tr>
                            {
                                for row.iter().map(|cell| {
                                    let coords = cell.coords();
                                    let state = ViewCellState::of(
                                        cell,
                                        phase,
                                        triggered_mine == Some(coords),
                                    );
                                    html! {
                                        <CellView
                                            {coords}
                                            {state}
                                            focused={self.focused == coords}
                                            callback={callback.clone()}
                                        />
                                    }
                                })
                            }
                        </tr>
                    })
                }
            </table>
        }
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let props = ctx.props();
        let seed = props.seed.unwrap_or_else(js_random_seed);
        let config = props.difficulty.unwrap_or_default().config();
        log::debug!("seed: {}, config: {:?}", seed, config);

        Self {
            session: game::Session::new(config, seed).expect("preset configs are valid"),
            viewport: game::Viewport::new(),
            viewport_ref: NodeRef::default(),
            field_ref: NodeRef::default(),
            suppress_click: false,
            focused: (0, 0),
            pending_focus: false,
            fit_frame: None,
            wheel_listener: None,
            _release_listeners: GameView::create_release_listeners(ctx),
            _blur_listener: GameView::create_blur_listener(ctx),
        }
    }

    fn rendered(&mut self, ctx: &Context<Self>, first_render: bool) {
        if first_render {
            self.wheel_listener = self.create_wheel_listener(ctx);
            self.schedule_fit(ctx);
        }
        if self.pending_focus {
            self.pending_focus = false;
            self.focus_cell();
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use Msg::*;

        match msg {
            Cell(CellMsg::Trigger(coords)) => {
                if self.suppress_click {
                    log::trace!("click after pan ignored at {:?}", coords);
                    return false;
                }
                self.trigger_cell(coords)
            }
            Cell(CellMsg::Activate(coords)) => self.trigger_cell(coords),
            Cell(CellMsg::Flag(coords)) => self.flag_cell(coords),
            Cell(CellMsg::Focus(coords)) => {
                let changed = self.focused != coords;
                self.focused = coords;
                changed
            }
            Cell(CellMsg::Move(coords, direction)) => {
                self.focused = step_focus(coords, direction, self.session.field().size());
                self.pending_focus = true;
                true
            }
            NewGame => {
                self.session.reset_game();
                self.schedule_fit(ctx);
                true
            }
            SelectDifficulty(difficulty) => {
                let config = difficulty.config();
                if let Err(err) = self
                    .session
                    .set_config(config.width, config.height, config.mines)
                {
                    log::error!("cannot switch to {}: {}", difficulty, err);
                    return false;
                }
                self.focused = self
                    .session
                    .field()
                    .validate_coords(self.focused)
                    .unwrap_or((0, 0));
                self.schedule_fit(ctx);
                true
            }
            PointerDown(event) => {
                self.suppress_click = false;
                let down = game::PointerDown {
                    id: game::PointerId(event.pointer_id()),
                    kind: game::PointerKind::from_pointer_type(&event.pointer_type()),
                    button: event.button(),
                    position: self.local_point(event.client_x(), event.client_y()),
                    on_cell: is_over_cell(&event),
                };
                let outcome = self.viewport.pointer_down(down);
                self.apply_gesture(&event, outcome)
            }
            PointerMove(event) => {
                let position = self.local_point(event.client_x(), event.client_y());
                let outcome = self
                    .viewport
                    .pointer_move(game::PointerId(event.pointer_id()), position);
                self.apply_gesture(&event, outcome)
            }
            PointerUp(event) => {
                let outcome = self.viewport.pointer_up(game::PointerId(event.pointer_id()));
                if let game::GestureOutcome::Released { was_panning } = outcome {
                    self.suppress_click = was_panning;
                }
                self.apply_gesture(&event, outcome)
            }
            Wheel(event) => {
                let position = self.local_point(event.client_x(), event.client_y());
                self.viewport.on_wheel(event.delta_y(), position).has_update()
            }
            Blur => {
                if !self.viewport.has_active_pointers() {
                    return false;
                }
                log::debug!("window lost focus, dropping gesture");
                self.viewport.reset_gesture();
                self.suppress_click = false;
                true
            }
            Fit => {
                self.fit_frame = None;
                self.fit_to_viewport()
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();

        let viewport_class = classes!(
            "sapper-viewport",
            self.viewport
                .is_panning()
                .then_some("sapper-viewport--panning"),
            self.viewport
                .is_pinching()
                .then_some("sapper-viewport--pinching")
        );
        let field_style = format!("transform: {};", self.viewport.css_transform());

        html! {
            <main class="sapper" oncontextmenu={Callback::from(|e: MouseEvent| e.prevent_default())}>
                <div
                    ref={self.viewport_ref.clone()}
                    class={viewport_class}
                    tabindex="0"
                    aria-label="Game field viewport"
                    onpointerdown={link.callback(Msg::PointerDown)}
                    onpointermove={link.callback(Msg::PointerMove)}
                >
                    <div class="sapper-overlay">
                        <ControlsView
                            selected={game::Difficulty::from_config(&self.session.config())}
                            mines_left={self.session.mines_left()}
                            phase={self.session.phase()}
                            on_new_game={link.callback(|_| Msg::NewGame)}
                            on_select={link.callback(Msg::SelectDifficulty)}
                        />
                    </div>
                    <div ref={self.field_ref.clone()} class="sapper-field" style={field_style}>
                        { self.view_field(ctx) }
                    </div>
                </div>
            </main>
        }
    }
}
