use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const GREY: Color = Color::rgb(128, 128, 128);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn gray(level: u8) -> Self {
        Self::rgb(level, level, level)
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Linear interpolation per channel, `t` clamped to [0, 1].
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RectMode {
    Corner,
    Center,
}

/// Handle to an offscreen layer created by a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerId(usize);

/// Immediate-mode drawing target. Transforms stack with `push`/`pop`.
///
/// Offscreen layers keep their pixels between frames. `target` redirects the
/// following calls into a layer until it is reset to `None`.
pub trait DrawSurface {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    fn background(&mut self, color: Color);
    fn push(&mut self);
    fn pop(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    fn rotate(&mut self, angle: f32);
    fn fill(&mut self, color: Option<Color>);
    fn stroke(&mut self, color: Option<Color>);
    fn stroke_weight(&mut self, weight: f32);
    fn rect_mode(&mut self, mode: RectMode);
    fn circle(&mut self, x: f32, y: f32, diameter: f32);
    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn create_layer(&mut self, width: f32, height: f32) -> LayerId;
    fn target(&mut self, layer: Option<LayerId>);
    /// Draw `layer` stretched into the given rectangle of the current target.
    fn draw_layer(&mut self, layer: LayerId, x: f32, y: f32, w: f32, h: f32);
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Background(Color),
    Push,
    Pop,
    Translate { x: f32, y: f32 },
    Rotate(f32),
    Fill(Option<Color>),
    Stroke(Option<Color>),
    StrokeWeight(f32),
    RectMode(RectMode),
    Circle { x: f32, y: f32, diameter: f32 },
    Rect { x: f32, y: f32, w: f32, h: f32 },
    CreateLayer { layer: LayerId, width: f32, height: f32 },
    Target(Option<LayerId>),
    DrawLayer { layer: LayerId, x: f32, y: f32, w: f32, h: f32 },
}

/// Surface that records every call for later playback or inspection.
#[derive(Clone, Debug)]
pub struct CommandList {
    width: f32,
    height: f32,
    commands: Vec<DrawCommand>,
    layers: usize,
}

impl CommandList {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            commands: Vec::new(),
            layers: 0,
        }
    }

    #[cfg(test)]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drop the recorded commands. Layers stay valid.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

impl DrawSurface for CommandList {
    fn width(&self) -> f32 {
        self.width
    }
    fn height(&self) -> f32 {
        self.height
    }
    fn background(&mut self, color: Color) {
        self.commands.push(DrawCommand::Background(color));
    }
    fn push(&mut self) {
        self.commands.push(DrawCommand::Push);
    }
    fn pop(&mut self) {
        self.commands.push(DrawCommand::Pop);
    }
    fn translate(&mut self, x: f32, y: f32) {
        self.commands.push(DrawCommand::Translate { x, y });
    }
    fn rotate(&mut self, angle: f32) {
        self.commands.push(DrawCommand::Rotate(angle));
    }
    fn fill(&mut self, color: Option<Color>) {
        self.commands.push(DrawCommand::Fill(color));
    }
    fn stroke(&mut self, color: Option<Color>) {
        self.commands.push(DrawCommand::Stroke(color));
    }
    fn stroke_weight(&mut self, weight: f32) {
        self.commands.push(DrawCommand::StrokeWeight(weight));
    }
    fn rect_mode(&mut self, mode: RectMode) {
        self.commands.push(DrawCommand::RectMode(mode));
    }
    fn circle(&mut self, x: f32, y: f32, diameter: f32) {
        self.commands.push(DrawCommand::Circle { x, y, diameter });
    }
    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.commands.push(DrawCommand::Rect { x, y, w, h });
    }
    fn create_layer(&mut self, width: f32, height: f32) -> LayerId {
        let layer = LayerId(self.layers);
        self.layers += 1;
        self.commands.push(DrawCommand::CreateLayer { layer, width, height });
        layer
    }
    fn target(&mut self, layer: Option<LayerId>) {
        self.commands.push(DrawCommand::Target(layer));
    }
    fn draw_layer(&mut self, layer: LayerId, x: f32, y: f32, w: f32, h: f32) {
        self.commands.push(DrawCommand::DrawLayer { layer, x, y, w, h });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints_and_midpoint() {
        assert_eq!(Color::RED.lerp(Color::YELLOW, 0.0), Color::RED);
        assert_eq!(Color::RED.lerp(Color::YELLOW, 1.0), Color::YELLOW);
        assert_eq!(Color::RED.lerp(Color::YELLOW, 0.5), Color::rgb(255, 128, 0));
        assert_eq!(Color::RED.lerp(Color::YELLOW, f32::NAN), Color::RED);
    }

    #[test]
    fn records_calls_in_order() {
        let mut list = CommandList::new(10, 20);
        list.push();
        list.circle(1.0, 2.0, 3.0);
        list.pop();
        assert_eq!(list.height(), 20.0);
        assert_eq!(
            list.commands(),
            &[
                DrawCommand::Push,
                DrawCommand::Circle { x: 1.0, y: 2.0, diameter: 3.0 },
                DrawCommand::Pop
            ]
        );
        assert_eq!(list.count(|c| matches!(c, DrawCommand::Circle { .. })), 1);
    }

    #[test]
    fn layers_outlive_clear() {
        let mut list = CommandList::new(10, 20);
        let first = list.create_layer(10.0, 20.0);
        list.clear();
        let second = list.create_layer(5.0, 5.0);
        assert_ne!(first, second);
        assert_eq!(
            list.commands(),
            &[DrawCommand::CreateLayer { layer: second, width: 5.0, height: 5.0 }]
        );
    }
}
