use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use territory_shared::insights::format_count;
use territory_shared::intensity::LEGEND;
use territory_shared::{
    InteractionSurface, MarketIntelligence, Metric, Point, PointerInput, Size, StatsMap,
    TouchPhase, Tooltip, Viewport, registry,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, PointerEvent, TouchEvent};

use crate::labels::{active_territory_text, lock_title, zoom_percent};
use crate::render::{Frame, draw_frame};
use crate::render_loop::RenderScheduler;

type Surface = InteractionSurface<'static, Box<dyn FnMut(&str)>>;
type SharedSurface = Rc<RefCell<Surface>>;

/// Reactive mirror of the interaction surface, republished after every command.
#[derive(Debug, Clone, PartialEq)]
struct MapView {
    hovered: Option<String>,
    metric: Metric,
    panel_open: bool,
    locked: bool,
    dragging: bool,
    scale: f64,
    pan: Point,
    /// Container position of the hovered region's label anchor.
    tooltip_at: Option<Point>,
}

impl MapView {
    fn of(surface: &Surface) -> Self {
        let vp = surface.viewport();
        let state = surface.state();
        Self {
            hovered: state.hovered.clone(),
            metric: state.metric,
            panel_open: state.intelligence_panel_open,
            locked: vp.is_locked(),
            dragging: vp.is_dragging(),
            scale: vp.scale(),
            pan: vp.pan(),
            tooltip_at: surface
                .hovered()
                .and_then(|id| surface.registry().get(id))
                .map(|region| vp.virtual_to_screen(region.label_anchor)),
        }
    }
}

fn publish(surface: &Surface, view: RwSignal<MapView>) {
    let next = MapView::of(surface);
    if view.with_untracked(|current| *current != next) {
        view.set(next);
    }
}

struct ResizeBinding {
    window: web_sys::Window,
    _handler: Closure<dyn Fn()>,
}

thread_local! {
    static RESIZE_BINDING: RefCell<Option<ResizeBinding>> = const { RefCell::new(None) };
}

fn apply_container_size(surface: &SharedSurface, container: &web_sys::Element, view: RwSignal<MapView>) {
    let size = Size::new(
        container.client_width() as f64,
        container.client_height() as f64,
    );
    if size.width <= 0.0 || size.height <= 0.0 {
        return;
    }
    surface.borrow_mut().viewport_mut().resize(size);
    publish(&surface.borrow(), view);
}

fn local_point(container: NodeRef<leptos::html::Div>, client_x: f64, client_y: f64) -> Point {
    container
        .get_untracked()
        .map(|el| {
            let rect = el.get_bounding_client_rect();
            Point::new(client_x - rect.left(), client_y - rect.top())
        })
        .unwrap_or(Point::new(client_x, client_y))
}

fn touch_points(e: &TouchEvent, container: NodeRef<leptos::html::Div>) -> Vec<Point> {
    let touches = e.touches();
    (0..touches.length())
        .filter_map(|i| touches.get(i))
        .map(|t| local_point(container, t.client_x() as f64, t.client_y() as f64))
        .collect()
}

fn is_touch(e: &PointerEvent) -> bool {
    e.pointer_type() == "touch"
}

#[component]
pub fn TerritoryMap(stats: Memo<StatsMap>, on_select: Callback<String>) -> impl IntoView {
    let container_ref = NodeRef::<leptos::html::Div>::new();
    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    let select: Box<dyn FnMut(&str)> = Box::new(move |id: &str| on_select.run(id.to_string()));
    let surface: SharedSurface = Rc::new(RefCell::new(InteractionSurface::new(
        registry(),
        Size::new(800.0, 600.0),
        select,
    )));
    let view = RwSignal::new(MapView::of(&surface.borrow()));

    let tooltip = Memo::new(move |_| -> Option<Tooltip> {
        let id = view.with(|v| v.hovered.clone())?;
        let region = registry().get(&id)?;
        Some(stats.with(|s| Tooltip::for_region(region, s)))
    });
    let intel = Memo::new(move |_| {
        let metric = view.with(|v| v.metric);
        stats.with(|s| MarketIntelligence::build(registry().regions(), s, metric))
    });

    let scheduler = Rc::new(RenderScheduler::new({
        let surface = surface.clone();
        move || {
            let Some(canvas) = canvas_ref.get_untracked() else {
                return;
            };
            let canvas: &HtmlCanvasElement = &canvas;
            let Some(parent) = canvas.parent_element() else {
                return;
            };
            let css_size = Size::new(parent.client_width() as f64, parent.client_height() as f64);
            if css_size.width <= 0.0 || css_size.height <= 0.0 {
                return;
            }
            let dpr = web_sys::window()
                .map(|w| w.device_pixel_ratio())
                .unwrap_or(1.0)
                .max(1.0);
            let pw = (css_size.width * dpr).round() as u32;
            let ph = (css_size.height * dpr).round() as u32;
            if canvas.width() != pw || canvas.height() != ph {
                canvas.set_width(pw);
                canvas.set_height(ph);
            }
            let Some(ctx) = canvas
                .get_context("2d")
                .ok()
                .flatten()
                .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            else {
                return;
            };

            let surface = surface.borrow();
            stats.with_untracked(|stats| {
                draw_frame(
                    &ctx,
                    &Frame {
                        css_size,
                        dpr,
                        viewport: surface.viewport(),
                        stats,
                        metric: surface.metric(),
                        hovered: surface.hovered(),
                    },
                );
            });
        }
    }));

    Effect::new({
        let scheduler = scheduler.clone();
        move || {
            view.track();
            stats.track();
            scheduler.mark_dirty();
        }
    });

    // Size the viewport once mounted and keep it centered across window resizes.
    Effect::new({
        let surface = surface.clone();
        move || {
            let Some(container) = container_ref.get() else {
                return;
            };
            let Some(window) = web_sys::window() else {
                return;
            };
            let element: web_sys::Element = container.into();
            apply_container_size(&surface, &element, view);

            RESIZE_BINDING.with(|slot| {
                if let Some(old) = slot.borrow_mut().take() {
                    let _ = old.window.remove_event_listener_with_callback(
                        "resize",
                        old._handler.as_ref().unchecked_ref(),
                    );
                }
            });

            let handler = {
                let surface = surface.clone();
                Closure::<dyn Fn()>::new(move || apply_container_size(&surface, &element, view))
            };
            if window
                .add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref())
                .is_ok()
            {
                RESIZE_BINDING.with(|slot| {
                    *slot.borrow_mut() = Some(ResizeBinding {
                        window: window.clone(),
                        _handler: handler,
                    });
                });
            }
        }
    });

    // --- Pointer pipeline ---

    let feed = {
        let surface = surface.clone();
        move |input: PointerInput| {
            let changed = surface.borrow_mut().handle_pointer(input);
            if matches!(input, PointerInput::Click(_)) && changed {
                surface.borrow_mut().reset_for_navigation();
            }
            publish(&surface.borrow(), view);
        }
    };

    let on_pointer_down = {
        let feed = feed.clone();
        move |e: PointerEvent| {
            if is_touch(&e) {
                return;
            }
            let p = local_point(container_ref, e.client_x() as f64, e.client_y() as f64);
            feed(PointerInput::Down(p));
            if view.with_untracked(|v| v.dragging)
                && let Some(el) = container_ref.get_untracked()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
            }
        }
    };

    let on_pointer_move = {
        let feed = feed.clone();
        move |e: PointerEvent| {
            if is_touch(&e) {
                return;
            }
            let p = local_point(container_ref, e.client_x() as f64, e.client_y() as f64);
            feed(PointerInput::Move(p));
        }
    };

    let on_pointer_up = {
        let feed = feed.clone();
        move |e: PointerEvent| {
            if is_touch(&e) {
                return;
            }
            if let Some(el) = container_ref.get_untracked() {
                el.release_pointer_capture(e.pointer_id()).ok();
            }
            feed(PointerInput::Up);
        }
    };

    let on_pointer_leave = {
        let feed = feed.clone();
        move |e: PointerEvent| {
            if is_touch(&e) {
                return;
            }
            feed(PointerInput::Leave);
        }
    };

    let on_click = {
        let feed = feed.clone();
        move |e: MouseEvent| {
            let p = local_point(container_ref, e.client_x() as f64, e.client_y() as f64);
            feed(PointerInput::Click(p));
        }
    };

    let touch_handler = {
        let feed = feed.clone();
        move |phase: TouchPhase| {
            let feed = feed.clone();
            move |e: TouchEvent| {
                let touches = touch_points(&e, container_ref);
                if phase == TouchPhase::Move && view.with_untracked(|v| v.dragging) {
                    e.prevent_default();
                }
                if let Some(input) = PointerInput::from_touches(phase, &touches) {
                    feed(input);
                }
            }
        }
    };

    // --- Commands ---

    let viewport_command = {
        let surface = surface.clone();
        move |command: fn(&mut Viewport)| {
            let surface = surface.clone();
            move |_: MouseEvent| {
                command(surface.borrow_mut().viewport_mut());
                publish(&surface.borrow(), view);
            }
        }
    };

    let metric_command = {
        let surface = surface.clone();
        move |metric: Metric| {
            let surface = surface.clone();
            move |_: MouseEvent| {
                surface.borrow_mut().set_metric(metric);
                publish(&surface.borrow(), view);
            }
        }
    };

    let toggle_panel = {
        let surface = surface.clone();
        move |_: MouseEvent| {
            surface.borrow_mut().toggle_intelligence_panel();
            publish(&surface.borrow(), view);
        }
    };

    let go_to_hub = {
        let surface = surface.clone();
        move |e: MouseEvent| {
            e.stop_propagation();
            let selected = surface.borrow_mut().go_to_hub();
            if selected {
                surface.borrow_mut().reset_for_navigation();
            }
            publish(&surface.borrow(), view);
        }
    };

    let intelligence_rows = registry()
        .regions()
        .iter()
        .enumerate()
        .map(|(idx, region)| {
            let surface = surface.clone();
            let region_id = region.id;
            let on_row_click = move |_: MouseEvent| {
                let selected = surface.borrow_mut().select_region(region_id);
                if selected {
                    surface.borrow_mut().reset_for_navigation();
                }
                publish(&surface.borrow(), view);
            };
            let highlighted = move || intel.with(|i| i.rows.get(idx).is_some_and(|r| r.highlighted));
            view! {
                <div class="intel-row" on:click=on_row_click style="display: flex; align-items: center; justify-content: space-between; cursor: pointer; padding: 6px 0;">
                    <div style="display: flex; align-items: center;">
                        <div style:background=move || if highlighted() { "#2563eb" } else { "#cbd5e1" } style="width: 8px; height: 8px; border-radius: 50%; margin-right: 12px;" />
                        <span style="font-size: 11px; font-weight: 700; color: #4b5563;">{region.name}</span>
                    </div>
                    <span style="font-size: 11px; font-weight: 900; color: #111827;">
                        {move || intel.with(|i| i.rows.get(idx).map(|r| format_count(r.stats.volume)).unwrap_or_default())}
                    </span>
                </div>
            }
        })
        .collect::<Vec<_>>();

    let legend = LEGEND
        .iter()
        .map(|tier| {
            let swatch = format!(
                "width: 10px; height: 10px; border-radius: 2px; background: {};",
                tier.fill().with_alpha(1.0).css()
            );
            view! {
                <div style="display: flex; align-items: center; gap: 6px;">
                    <div style=swatch />
                    <span style="font-size: 9px; font-weight: 700; color: #6b7280; text-transform: uppercase;">{tier.label()}</span>
                </div>
            }
        })
        .collect::<Vec<_>>();

    let metric_button_style = move |metric: Metric| {
        move || {
            if view.with(|v| v.metric == metric) {
                "padding: 8px 16px; border-radius: 12px; border: none; font-size: 12px; font-weight: 900; cursor: pointer; background: #2563eb; color: #fff;"
            } else {
                "padding: 8px 16px; border-radius: 12px; border: none; font-size: 12px; font-weight: 900; cursor: pointer; background: transparent; color: #6b7280;"
            }
        }
    };

    view! {
        <div style="position: relative; width: 100%; height: 100%; overflow: hidden; background: #f8f5f0;">
            <div
                node_ref=container_ref
                style="position: absolute; inset: 0; touch-action: none;"
                style:cursor=move || view.with(|v| {
                    if v.dragging {
                        "grabbing"
                    } else if v.hovered.is_some() {
                        "pointer"
                    } else if v.locked {
                        "default"
                    } else {
                        "grab"
                    }
                })
                on:pointerdown=on_pointer_down
                on:pointermove=on_pointer_move
                on:pointerup=on_pointer_up
                on:pointerleave=on_pointer_leave
                on:click=on_click
                on:touchstart=touch_handler(TouchPhase::Start)
                on:touchmove=touch_handler(TouchPhase::Move)
                on:touchend=touch_handler(TouchPhase::End)
                on:touchcancel=touch_handler(TouchPhase::Cancel)
            >
                <canvas node_ref=canvas_ref style="position: absolute; inset: 0; width: 100%; height: 100%;" />
                <div
                    class="map-tooltip"
                    style="position: absolute; z-index: 30; width: 256px; transform: translate(-50%, calc(-100% - 24px)); background: #fff; border: 1px solid #f3f4f6; border-radius: 16px; padding: 16px; box-shadow: 0 25px 50px -12px rgba(0,0,0,0.25);"
                    style:display=move || if tooltip.with(Option::is_some) { "block" } else { "none" }
                    style:left=move || view.with(|v| v.tooltip_at.map(|p| format!("{}px", p.x)).unwrap_or_default())
                    style:top=move || view.with(|v| v.tooltip_at.map(|p| format!("{}px", p.y)).unwrap_or_default())
                    on:pointerdown=|e: PointerEvent| e.stop_propagation()
                    on:pointermove=|e: PointerEvent| e.stop_propagation()
                    on:click=|e: MouseEvent| e.stop_propagation()
                >
                    <div style="display: flex; flex-direction: column; margin-bottom: 12px;">
                        <span style="font-size: 12px; font-weight: 900; color: #111827;">
                            {move || tooltip.with(|t| t.as_ref().map(|t| t.name.clone()).unwrap_or_default())}
                        </span>
                        <span style="font-size: 10px; font-weight: 700; color: #2563eb; letter-spacing: 0.1em;">
                            {move || tooltip.with(|t| t.as_ref().map(|t| t.region_id.clone()).unwrap_or_default())}
                        </span>
                    </div>
                    <div style="display: grid; grid-template-columns: 1fr 1fr; gap: 16px; margin-bottom: 16px;">
                        <div style="padding: 8px; background: #f9fafb; border-radius: 12px;">
                            <span style="display: block; font-size: 9px; font-weight: 700; color: #9ca3af; text-transform: uppercase;">"Volume"</span>
                            <span style="font-size: 14px; font-weight: 900; color: #111827;">
                                {move || tooltip.with(|t| t.as_ref().map(|t| t.volume.clone()).unwrap_or_default())}
                            </span>
                        </div>
                        <div style="padding: 8px; background: #ecfdf5; border-radius: 12px;">
                            <span style="display: block; font-size: 9px; font-weight: 700; color: #059669; text-transform: uppercase;">"Recent"</span>
                            <span style="font-size: 14px; font-weight: 900; color: #059669;">
                                {move || tooltip.with(|t| t.as_ref().map(|t| t.recent.clone()).unwrap_or_default())}
                            </span>
                        </div>
                    </div>
                    <button
                        on:click=go_to_hub
                        style="width: 100%; padding: 8px 0; background: #111827; color: #fff; border: none; border-radius: 12px; font-size: 12px; font-weight: 700; cursor: pointer;"
                    >
                        "Go to Hub \u{203A}"
                    </button>
                </div>
            </div>

            <div style="position: absolute; top: 24px; left: 24px; z-index: 20; display: flex; flex-direction: column; gap: 16px;">
                <div style="background: #fff; padding: 6px; border-radius: 16px; border: 1px solid #e5e7eb; width: 288px; display: flex; align-items: center;">
                    <span style="padding: 8px; color: #9ca3af;">"\u{1F50D}"</span>
                    <input
                        type="text"
                        placeholder="Search zip code or city..."
                        style="background: transparent; border: none; outline: none; font-size: 14px; width: 100%;"
                    />
                </div>
                <div style="display: flex; flex-direction: column; gap: 8px; width: 48px;">
                    <button class="map-control" title="Zoom in" on:click=viewport_command(Viewport::zoom_in)>"+"</button>
                    <button class="map-control" title="Zoom out" on:click=viewport_command(Viewport::zoom_out)>"\u{2212}"</button>
                    <button class="map-control" title="Re-center" on:click=viewport_command(Viewport::center)>"\u{27A4}"</button>
                    <button
                        class="map-control"
                        title=move || lock_title(view.with(|v| v.locked))
                        on:click=viewport_command(Viewport::toggle_lock)
                    >
                        {move || if view.with(|v| v.locked) { "\u{1F512}" } else { "\u{1F513}" }}
                    </button>
                    <button class="map-control" title="Reset view" on:click=viewport_command(Viewport::reset)>"\u{21BA}"</button>
                    <span style="font-size: 10px; font-weight: 700; color: #6b7280; text-align: center;">
                        {move || zoom_percent(view.with(|v| v.scale))}
                    </span>
                </div>
            </div>

            <div style="position: absolute; top: 24px; right: 24px; z-index: 20; display: flex; flex-direction: column; align-items: flex-end; gap: 16px;">
                <div style="display: flex; gap: 8px; background: rgba(255,255,255,0.9); padding: 4px; border-radius: 16px; border: 1px solid #e5e7eb;">
                    <button style=metric_button_style(Metric::Volume) on:click=metric_command(Metric::Volume)>
                        {Metric::Volume.label()}
                    </button>
                    <button style=metric_button_style(Metric::Growth) on:click=metric_command(Metric::Growth)>
                        {Metric::Growth.label()}
                    </button>
                </div>
                <button class="map-control" title="Market intelligence" on:click=toggle_panel>
                    "\u{25CE}"
                </button>
            </div>

            <div
                style="position: absolute; bottom: 24px; right: 24px; z-index: 20; width: 320px; background: rgba(255,255,255,0.9); border-radius: 24px; border: 1px solid #f3f4f6; padding: 24px;"
                style:display=move || if view.with(|v| v.panel_open) { "block" } else { "none" }
            >
                <h4 style="margin: 0 0 16px; font-size: 12px; font-weight: 900; color: #2563eb; text-transform: uppercase; letter-spacing: 0.2em;">
                    "Market Intelligence"
                </h4>
                <div style="margin-bottom: 24px;">{intelligence_rows}</div>
                <div style="padding: 16px; background: #eff6ff; border-radius: 16px; border: 1px solid #dbeafe;">
                    <span style="display: block; font-size: 10px; font-weight: 900; color: #1e40af; text-transform: uppercase; letter-spacing: 0.1em; margin-bottom: 4px;">
                        "Active Territory"
                    </span>
                    <p style="margin: 0; font-size: 10px; line-height: 1.6; color: #1d4ed8;">
                        {move || intel.with(|i| active_territory_text(i, registry()))}
                    </p>
                </div>
            </div>

            <div style="position: absolute; bottom: 24px; left: 24px; z-index: 20; background: rgba(255,255,255,0.8); padding: 12px; border-radius: 16px; border: 1px solid #f3f4f6; display: flex; gap: 16px;">
                {legend}
            </div>
        </div>
    }
}
