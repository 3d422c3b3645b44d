//! Session scripts: a recorded (or made up) stream of touches, card edits and render ticks, in
//! TOML.
//!
//! ```toml
//! viewport = [800.0, 600.0]
//!
//! [[event]]
//! kind = "touch"
//! id = 1
//! phase = "down"
//! tool = "stylus"
//! x = 100.0
//! y = 120.0
//!
//! [[event]]
//! kind = "tick"
//! ```

use crate::touch::{RawTouch, TouchPhase};
use telescope_core::{
    canvas::ToolType,
    card::{CardContent, GridConfig, LinedConfig},
    color::Color,
};

#[derive(Copy, Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Stylus,
    Finger,
}
impl From<Tool> for ToolType {
    fn from(tool: Tool) -> Self {
        match tool {
            Tool::Stylus => Self::Stylus,
            Tool::Finger => Self::Finger,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Solid,
    Lined,
    Grid,
    Drawing,
}
impl CardKind {
    #[must_use]
    pub fn content(self) -> CardContent {
        match self {
            Self::Solid => CardContent::SolidColor(Color::from_srgba8([255, 240, 170, 255])),
            Self::Lined => CardContent::Lined(LinedConfig::default()),
            Self::Grid => CardContent::Grid(GridConfig::default()),
            Self::Drawing => CardContent::Drawing {
                background: Color::WHITE,
            },
        }
    }
}

fn one() -> usize {
    1
}

#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptEvent {
    Touch {
        id: u64,
        phase: TouchPhase,
        tool: Tool,
        x: f32,
        y: f32,
    },
    /// Render this many frames.
    Tick {
        #[serde(default = "one")]
        count: usize,
    },
    /// New card at the center of the view, sized in logical pixels.
    AddCard {
        width: f64,
        height: f64,
        content: CardKind,
        #[serde(default)]
        editing: bool,
    },
    Resize {
        width: f64,
        height: f64,
    },
}
impl ScriptEvent {
    #[must_use]
    pub fn touch(&self) -> Option<RawTouch> {
        match *self {
            Self::Touch {
                id,
                phase,
                tool,
                x,
                y,
            } => Some(RawTouch {
                id,
                phase,
                position: ultraviolet::Vec2::new(x, y),
                tool: tool.into(),
            }),
            _ => None,
        }
    }
}

fn default_viewport() -> [f64; 2] {
    [800.0, 600.0]
}

#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct Script {
    #[serde(default = "default_viewport")]
    pub viewport: [f64; 2],
    #[serde(default, rename = "event")]
    pub events: Vec<ScriptEvent>,
}
impl Script {
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let string = std::fs::read_to_string(path)?;
        Self::parse(&string)
    }
    pub fn parse(string: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(string)?)
    }
    /// A tour of the canvas: draw, zoom in a few thousand times and draw again, add a card,
    /// spin around, and zoom back out.
    #[must_use]
    pub fn demo() -> Self {
        let mut demo = DemoBuilder::new(default_viewport());
        demo.scribble(1, (-200.0, -100.0), 60.0);
        demo.tick(2);
        // Three rounds of a 20x spread about the middle of the view.
        for _ in 0..3 {
            demo.pinch((0.0, 0.0), 10.0, 200.0);
            demo.tick(1);
        }
        demo.scribble(2, (-50.0, 40.0), 30.0);
        demo.tick(2);
        demo.card(240.0, 160.0, CardKind::Lined, true);
        demo.scribble(3, (-20.0, -10.0), 20.0);
        demo.tick(2);
        demo.twist((0.0, 0.0), 120.0, 40f32.to_radians());
        demo.tick(1);
        for _ in 0..3 {
            demo.pinch((0.0, 0.0), 200.0, 10.0);
            demo.tick(1);
        }
        demo.pan((0.0, 0.0), (150.0, 80.0));
        demo.tick(3);
        Self {
            viewport: default_viewport(),
            events: demo.events,
        }
    }
}

/// Writes gestures as touch streams, relative to the center of the view.
struct DemoBuilder {
    center: (f32, f32),
    next_id: u64,
    events: Vec<ScriptEvent>,
}
impl DemoBuilder {
    const STEPS: usize = 12;
    fn new(viewport: [f64; 2]) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let center = ((viewport[0] / 2.0) as f32, (viewport[1] / 2.0) as f32);
        Self {
            center,
            next_id: 1,
            events: Vec::new(),
        }
    }
    fn id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
    fn touch(&mut self, id: u64, phase: TouchPhase, tool: Tool, (x, y): (f32, f32)) {
        self.events.push(ScriptEvent::Touch {
            id,
            phase,
            tool,
            x: self.center.0 + x,
            y: self.center.1 + y,
        });
    }
    fn tick(&mut self, count: usize) {
        self.events.push(ScriptEvent::Tick { count });
    }
    fn card(&mut self, width: f64, height: f64, content: CardKind, editing: bool) {
        self.events.push(ScriptEvent::AddCard {
            width,
            height,
            content,
            editing,
        });
    }
    /// A little sine wave with the stylus.
    fn scribble(&mut self, seed: u32, (x, y): (f32, f32), length: f32) {
        let id = self.id();
        #[allow(clippy::cast_precision_loss)]
        let phase_shift = seed as f32;
        let point = |t: f32| (x + t * length, y + (t * 6.0 + phase_shift).sin() * length / 6.0);
        self.touch(id, TouchPhase::Down, Tool::Stylus, point(0.0));
        for step in 1..=Self::STEPS * 2 {
            #[allow(clippy::cast_precision_loss)]
            let t = step as f32 / (Self::STEPS * 2) as f32;
            self.touch(id, TouchPhase::Move, Tool::Stylus, point(t));
        }
        self.touch(id, TouchPhase::Up, Tool::Stylus, point(1.0));
    }
    /// Two fingers on a horizontal line through `around`, spreading from `from` to `to` apart.
    fn pinch(&mut self, around: (f32, f32), from: f32, to: f32) {
        let (a, b) = (self.id(), self.id());
        let at = |distance: f32| {
            (
                (around.0 - distance / 2.0, around.1),
                (around.0 + distance / 2.0, around.1),
            )
        };
        let (left, right) = at(from);
        self.touch(a, TouchPhase::Down, Tool::Finger, left);
        self.touch(b, TouchPhase::Down, Tool::Finger, right);
        for step in 1..=Self::STEPS {
            #[allow(clippy::cast_precision_loss)]
            let t = step as f32 / Self::STEPS as f32;
            // Geometric, so every step zooms by the same factor.
            let (left, right) = at(from * (to / from).powf(t));
            self.touch(a, TouchPhase::Move, Tool::Finger, left);
            self.touch(b, TouchPhase::Move, Tool::Finger, right);
        }
        let (left, right) = at(to);
        self.touch(a, TouchPhase::Up, Tool::Finger, left);
        self.touch(b, TouchPhase::Up, Tool::Finger, right);
    }
    /// Two fingers `distance` apart, turning by `radians` about `around`.
    fn twist(&mut self, around: (f32, f32), distance: f32, radians: f32) {
        let (a, b) = (self.id(), self.id());
        let at = |angle: f32| {
            let (sin, cos) = angle.sin_cos();
            let arm = (cos * distance / 2.0, sin * distance / 2.0);
            (
                (around.0 - arm.0, around.1 - arm.1),
                (around.0 + arm.0, around.1 + arm.1),
            )
        };
        let (left, right) = at(0.0);
        self.touch(a, TouchPhase::Down, Tool::Finger, left);
        self.touch(b, TouchPhase::Down, Tool::Finger, right);
        for step in 1..=Self::STEPS {
            #[allow(clippy::cast_precision_loss)]
            let (left, right) = at(radians * step as f32 / Self::STEPS as f32);
            self.touch(a, TouchPhase::Move, Tool::Finger, left);
            self.touch(b, TouchPhase::Move, Tool::Finger, right);
        }
        let (left, right) = at(radians);
        self.touch(a, TouchPhase::Up, Tool::Finger, left);
        self.touch(b, TouchPhase::Up, Tool::Finger, right);
    }
    fn pan(&mut self, from: (f32, f32), to: (f32, f32)) {
        let id = self.id();
        self.touch(id, TouchPhase::Down, Tool::Finger, from);
        for step in 1..=Self::STEPS {
            #[allow(clippy::cast_precision_loss)]
            let t = step as f32 / Self::STEPS as f32;
            let point = (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t);
            self.touch(id, TouchPhase::Move, Tool::Finger, point);
        }
        self.touch(id, TouchPhase::Up, Tool::Finger, to);
    }
}
