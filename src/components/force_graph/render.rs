use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::{ForceGraphState, ease_out_cubic};

const BACKGROUND: &str = "#1a1a2e";
const LABEL_OFFSET: (f64, f64) = (12.0, 5.0);

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	if state.simulation.is_empty() {
		return;
	}
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_links(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_links(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let line_width = 1.5 / k;
	let t = ease_out_cubic(state.hover.highlight_t);

	state.simulation.visit_links(|a, b| {
		let (x1, y1, x2, y2) = (a.x as f64, a.y as f64, b.x as f64, b.y as f64);
		if (x2 - x1).hypot(y2 - y1) < 0.001 {
			return;
		}

		let alpha = state.link_opacity(a.id, b.id);
		let highlighted = state.is_highlighted(a.id) && state.is_highlighted(b.id);
		let width = if highlighted {
			line_width * (1.0 + 0.3 * t)
		} else {
			line_width * (1.0 - 0.3 * t)
		};

		ctx.set_stroke_style_str(&format!("rgba(153, 153, 153, {alpha})"));
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.line_to(x2, y2);
		ctx.stroke();
	});
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);
	let font = format!("{}px sans-serif", 10.0 / k.max(0.5));

	// Dimmed nodes first so the highlighted neighbourhood draws on top.
	for front_pass in [false, true] {
		state.simulation.visit_nodes(|node| {
			let in_front = !has_highlight || state.is_highlighted(node.id);
			if in_front != front_pass {
				return;
			}
			let (x, y) = (node.x as f64, node.y as f64);
			let (alpha, radius) = (state.node_opacity(node.id), state.node_radius(node.id));

			if has_highlight && state.is_hovered(node.id) && t > 0.01 {
				let glow_radius = radius * (1.8 + 1.2 * t);
				if let Ok(gradient) =
					ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow_radius)
				{
					let glow = 0.35 * t;
					let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {glow})"));
					let _ = gradient.add_color_stop(
						0.6,
						&format!("rgba(200, 220, 255, {})", glow * 0.3),
					);
					let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
					ctx.begin_path();
					let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
					#[allow(deprecated)]
					ctx.set_fill_style(&gradient);
					ctx.fill();
				}
			}

			ctx.set_global_alpha(alpha);
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
			ctx.set_fill_style_str(node.color);
			ctx.fill();
			ctx.set_stroke_style_str("#fff");
			ctx.set_line_width(1.5 / k);
			ctx.stroke();

			ctx.set_fill_style_str("white");
			ctx.set_font(&font);
			let _ = ctx.fill_text(node.label, x + LABEL_OFFSET.0, y + LABEL_OFFSET.1);
			ctx.set_global_alpha(1.0);
		});
	}
}
