use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::layout::LayoutSettings;
use super::render;
use super::state::{ForceGraphState, PointerRelease};
use super::types::GraphNode;
use crate::controller::Snapshot;

const FRAME_DT: f32 = 0.016;

type SharedState = Rc<RefCell<Option<ForceGraphState>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

/// Pointer position relative to the canvas.
fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Interactive canvas for one graph snapshot.
///
/// The layout is rebuilt from scratch whenever `snapshot` is replaced or
/// `settings` change. Clicks and context menus report the underlying
/// [`GraphNode`]; `on_context_menu` receives page coordinates.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] snapshot: Signal<Snapshot>,
	#[prop(into)] settings: Signal<LayoutSettings>,
	#[prop(into)] on_select: Callback<Option<GraphNode>>,
	#[prop(into)] on_context_menu: Callback<(GraphNode, f64, f64)>,
	#[prop(into)] on_background_click: Callback<()>,
	#[prop(default = false)] fullscreen: bool,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: FrameCallback = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let parent_size = || {
			canvas
				.parent_element()
				.map(|p| (p.client_width() as f64, p.client_height() as f64))
				.filter(|&(w, h)| w > 0.0 && h > 0.0)
				.unwrap_or((800.0, 600.0))
		};
		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or_else(parent_size)
		} else {
			parent_size()
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok());
		let Some(ctx) = ctx else {
			warn!("canvas has no 2d context, graph will not be drawn");
			return;
		};
		let snap = snapshot.get_untracked();
		*state_init.borrow_mut() = Some(ForceGraphState::new(
			snap.data(),
			settings.get_untracked(),
			w,
			h,
		));

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(FRAME_DT);
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	// Structural changes restart the layout.
	let state_rebuild = state.clone();
	Effect::new(move |_| {
		let snap = snapshot.get();
		let settings = settings.get();
		if let Some(ref mut s) = *state_rebuild.borrow_mut() {
			debug!(
				"rebuilding layout for snapshot {} ({:?})",
				snap.revision(),
				settings
			);
			s.rebuild(snap.data(), settings);
		}
	});

	let lookup = move |id: &str| snapshot.with_untracked(|s| s.data().node(id).cloned());

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(x, y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		// Release the borrow before handing control to the callbacks.
		let release = match *state_mu.borrow_mut() {
			Some(ref mut s) => s.pointer_up(),
			None => return,
		};
		match release {
			PointerRelease::NodeClick(id) => {
				if let Some(node) = lookup(&id) {
					on_select.run(Some(node));
				}
			}
			PointerRelease::BackgroundClick => on_background_click.run(()),
			PointerRelease::Moved => {}
		}
	};

	let state_cm = state.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		let hit = state_cm
			.borrow()
			.as_ref()
			.and_then(|s| s.node_at_position(x, y));
		match hit.and_then(|id| lookup(&id)) {
			Some(node) => on_context_menu.run((node, ev.page_x() as f64, ev.page_y() as f64)),
			None => on_background_click.run(()),
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.zoom(x, y, ev.delta_y());
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:contextmenu=on_contextmenu
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
