use std::f32::consts::{PI, SQRT_2};

use super::surface::{Color, DrawSurface, LayerId, RectMode};
use crate::config::{Config, SpectrumCircleConfig};
use crate::sketch::mapper::{map_range, spectrum_bars, SquareParams, VisualParameters};

/// Distance of the square row from the bottom edge.
const SQUARE_MARGIN: f32 = 30.0;
/// Alpha of the background wash that leaves fading trails behind the circles.
const TRAIL_FADE: u8 = 10;
/// How far the trail layer spills past each edge when copied onto itself.
const TRAIL_DRIFT_X: f32 = 10.0;
const TRAIL_DRIFT_Y: f32 = 5.0;
const CORE_STROKE: f32 = 2.0;

/// Per-sketch drawing state. The trail layer lives as long as the scene.
#[derive(Debug, Default)]
pub struct Scene {
    trail: Option<LayerId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw one frame. Without parameters only the background is cleared.
    pub fn draw_frame(
        &mut self,
        surface: &mut dyn DrawSurface,
        config: &Config,
        background: u8,
        frame_count: u64,
        params: Option<&VisualParameters>,
    ) {
        surface.background(Color::gray(background));

        let Some(params) = params else {
            return;
        };

        let (w, h) = (surface.width(), surface.height());
        let trail = *self.trail.get_or_insert_with(|| surface.create_layer(w, h));

        draw_trail(surface, trail, params, background);
        draw_core(surface, params);
        for circle in &config.spectrum_circles {
            draw_spectrum_circle(surface, &params.power_spectrum, circle, frame_count);
        }
        draw_squares(surface, &params.squares);
    }
}

/// Advance the trail layer by one frame and composite it onto the canvas.
///
/// The layer is redrawn enlarged onto itself so old strokes drift outwards,
/// washed with a faint background, then the coloured circles go on top.
fn draw_trail(
    surface: &mut dyn DrawSurface,
    trail: LayerId,
    params: &VisualParameters,
    background: u8,
) {
    let (w, h) = (surface.width(), surface.height());
    let d = params.ball_distance;

    surface.target(Some(trail));

    surface.push();
    surface.draw_layer(
        trail,
        -TRAIL_DRIFT_X,
        -TRAIL_DRIFT_Y,
        w + 2.0 * TRAIL_DRIFT_X,
        h + 2.0 * TRAIL_DRIFT_Y,
    );
    surface.rect_mode(RectMode::Corner);
    surface.fill(Some(Color::gray(background).with_alpha(TRAIL_FADE)));
    surface.stroke(None);
    surface.rect(0.0, 0.0, w, h);
    surface.pop();

    surface.push();
    surface.fill(None);
    surface.stroke_weight(params.stroke_weight);
    surface.translate(w / 2.0, h / 2.0);
    surface.rotate(params.rotation);
    surface.stroke(Some(Color::RED));
    surface.circle(-d, 0.0, params.radius);
    surface.stroke(Some(Color::BLUE));
    surface.circle(d, 0.0, params.radius);
    surface.pop();

    surface.target(None);

    surface.push();
    surface.stroke(None);
    surface.draw_layer(trail, 0.0, 0.0, w, h);
    surface.pop();
}

fn draw_core(surface: &mut dyn DrawSurface, params: &VisualParameters) {
    let (w, h) = (surface.width(), surface.height());
    let d = params.ball_distance;

    surface.push();
    surface.fill(None);
    surface.stroke_weight(CORE_STROKE);
    surface.stroke(Some(Color::WHITE));
    surface.translate(w / 2.0, h / 2.0);
    surface.rotate(params.rotation);
    surface.circle(-d, 0.0, params.radius);
    surface.circle(d, 0.0, params.radius);
    surface.pop();
}

fn draw_spectrum_circle(
    surface: &mut dyn DrawSurface,
    spectrum: &[f32],
    circle: &SpectrumCircleConfig,
    frame_count: u64,
) {
    let (w, h) = (surface.width(), surface.height());
    let radius = circle.radius;

    surface.push();
    surface.stroke(Some(Color::GREY));
    surface.fill(None);
    surface.translate(w / 2.0, h / 2.0);
    surface.circle(0.0, 0.0, radius * 2.0);

    surface.rotate(PI * 0.5);
    surface.rotate(PI * circle.rotation_rate * frame_count as f32 * circle.speed);

    surface.fill(Some(Color::GREY));
    surface.stroke(None);
    let bars = spectrum_bars(spectrum, radius);
    let count = bars.len() as f32;
    for (i, bar) in bars.iter().enumerate() {
        surface.push();
        surface.rotate(map_range(i as f32, 0.0, count, 0.0, PI));
        surface.rect(0.0, radius, bar.width, bar.height);
        // mirrored across the vertical axis
        surface.rotate(PI);
        surface.rect(0.0, radius, bar.width, bar.height);
        surface.pop();
    }
    surface.pop();
}

fn draw_squares(surface: &mut dyn DrawSurface, squares: &[SquareParams]) {
    if squares.is_empty() {
        return;
    }
    let (w, h) = (surface.width(), surface.height());
    let bound = w / 2.0;
    let n = squares.len() as f32;
    let cell = (bound / (n + 1.0)) / SQRT_2;

    surface.push();
    surface.rect_mode(RectMode::Center);
    surface.translate(0.0, h - SQUARE_MARGIN);

    for (i, square) in squares.iter().enumerate() {
        let x = i as f32 * bound / n + cell / 2.0;
        surface.push();
        surface.fill(Some(square.color));
        for pos in [x, w - x] {
            surface.push();
            surface.translate(pos, 0.0);
            surface.rotate(square.angle);
            surface.rect(0.0, 0.0, square.size, square.size);
            surface.pop();
        }
        surface.pop();
    }
    surface.pop();
}
