//! Raw multi-touch recognition.
//!
//! The platform hands over individual contacts. This turns them into what the canvas understands:
//! a stylus draws, one finger draws or pans, two or more fingers pinch and (past a little slop)
//! rotate. Touch-count changes mid-gesture are reported as a `Changed` update with no motion, so
//! the camera can re-lock its anchor instead of jumping.

use smallvec::SmallVec;
use telescope_core::{
    camera::{GesturePhase, GestureUpdate, PanEvent},
    canvas::{DrawEvent, ToolType},
    DVec2,
};
use ultraviolet::Vec2;

#[derive(Copy, Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
pub enum TouchPhase {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct RawTouch {
    pub id: u64,
    pub phase: TouchPhase,
    /// Logical pixels from the top left of the view.
    pub position: Vec2,
    pub tool: ToolType,
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Input {
    Draw(DrawEvent),
    Pan(PanEvent),
    Gesture(GestureUpdate),
}

pub type Inputs = SmallVec<[Input; 4]>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TouchError {
    #[error("touch {0} isn't down")]
    UnknownTouch(u64),
    #[error("touch {0} is already down")]
    DuplicateTouch(u64),
}

fn to_dvec(v: Vec2) -> DVec2 {
    DVec2::new(f64::from(v.x), f64::from(v.y))
}

/// Shortest signed difference between two angles.
fn wrap_angle(radians: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (radians + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Snapshot of a multi-finger contact set.
#[derive(Copy, Clone, Debug)]
struct Measure {
    centroid: Vec2,
    /// Mean distance from the centroid.
    spread: f32,
    /// Angle between the two oldest contacts.
    angle: f32,
    touches: usize,
}

#[derive(Copy, Clone, Debug)]
enum Rotation {
    /// Twist so far, not yet past the slop.
    Pending(f32),
    Active,
}

#[derive(Copy, Clone, Debug)]
enum FingerMode {
    Idle,
    Single(u64),
    Multi { last: Measure, rotation: Rotation },
    /// A multi-finger gesture ended with fingers still down. Ignore them until they lift.
    Draining,
}

pub struct TouchRecognizer {
    fingers: hashbrown::HashMap<u64, Vec2>,
    stylus: Option<u64>,
    mode: FingerMode,
    finger_draws: bool,
    rotation_slop: f32,
}
impl TouchRecognizer {
    #[must_use]
    pub fn new(finger_draws: bool, rotation_slop: f32) -> Self {
        Self {
            fingers: hashbrown::HashMap::new(),
            stylus: None,
            mode: FingerMode::Idle,
            finger_draws,
            rotation_slop,
        }
    }
    /// Number of fingers currently down.
    #[must_use]
    pub fn fingers(&self) -> usize {
        self.fingers.len()
    }
    /// # Errors
    /// On a contact that moves or lifts without having gone down, or goes down twice.
    pub fn feed(&mut self, touch: &RawTouch) -> Result<Inputs, TouchError> {
        match touch.tool {
            ToolType::Stylus => self.feed_stylus(touch),
            ToolType::Finger => self.feed_finger(touch),
        }
    }
    fn feed_stylus(&mut self, touch: &RawTouch) -> Result<Inputs, TouchError> {
        let screen = to_dvec(touch.position);
        let tool = ToolType::Stylus;
        let mut out = Inputs::new();
        match touch.phase {
            TouchPhase::Down => {
                if let Some(current) = self.stylus {
                    return Err(TouchError::DuplicateTouch(current));
                }
                self.stylus = Some(touch.id);
                out.push(Input::Draw(DrawEvent::Began { screen, tool }));
            }
            phase => {
                if self.stylus != Some(touch.id) {
                    return Err(TouchError::UnknownTouch(touch.id));
                }
                let event = match phase {
                    TouchPhase::Move => DrawEvent::Moved { screen, tool },
                    TouchPhase::Up => DrawEvent::Ended { screen, tool },
                    _ => DrawEvent::Cancelled { tool },
                };
                if phase != TouchPhase::Move {
                    self.stylus = None;
                }
                out.push(Input::Draw(event));
            }
        }
        Ok(out)
    }
    /// Events for the single finger stream.
    fn single(&self, phase: TouchPhase, position: Vec2) -> Input {
        let screen = to_dvec(position);
        let tool = ToolType::Finger;
        if self.finger_draws {
            Input::Draw(match phase {
                TouchPhase::Down => DrawEvent::Began { screen, tool },
                TouchPhase::Move => DrawEvent::Moved { screen, tool },
                TouchPhase::Up => DrawEvent::Ended { screen, tool },
                TouchPhase::Cancel => DrawEvent::Cancelled { tool },
            })
        } else {
            Input::Pan(match phase {
                TouchPhase::Down => PanEvent::Began(screen),
                TouchPhase::Move => PanEvent::Moved(screen),
                TouchPhase::Up | TouchPhase::Cancel => PanEvent::Ended,
            })
        }
    }
    fn measure(&self) -> Option<Measure> {
        let touches = self.fingers.len();
        if touches < 2 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = touches as f32;
        let centroid = self.fingers.values().fold(Vec2::zero(), |sum, &p| sum + p) / count;
        let spread = self
            .fingers
            .values()
            .map(|&p| (p - centroid).mag())
            .sum::<f32>()
            / count;

        let mut ids: SmallVec<[u64; 4]> = self.fingers.keys().copied().collect();
        ids.sort_unstable();
        let a = self.fingers[&ids[0]];
        let b = self.fingers[&ids[1]];
        let arm = b - a;
        Some(Measure {
            centroid,
            spread,
            angle: arm.y.atan2(arm.x),
            touches,
        })
    }
    fn feed_finger(&mut self, touch: &RawTouch) -> Result<Inputs, TouchError> {
        let mut out = Inputs::new();
        match touch.phase {
            TouchPhase::Down => {
                if self.fingers.contains_key(&touch.id) {
                    return Err(TouchError::DuplicateTouch(touch.id));
                }
                self.fingers.insert(touch.id, touch.position);
                match self.mode {
                    FingerMode::Idle => {
                        self.mode = FingerMode::Single(touch.id);
                        out.push(self.single(TouchPhase::Down, touch.position));
                    }
                    FingerMode::Single(first) => {
                        // Whatever the first finger was doing is abandoned, not committed.
                        let first_position =
                            self.fingers.get(&first).copied().unwrap_or(touch.position);
                        out.push(self.single(TouchPhase::Cancel, first_position));
                        if let Some(measure) = self.measure() {
                            out.push(Input::Gesture(GestureUpdate::pinch(
                                GesturePhase::Began,
                                1.0,
                                to_dvec(measure.centroid),
                                measure.touches,
                            )));
                            self.mode = FingerMode::Multi {
                                last: measure,
                                rotation: Rotation::Pending(0.0),
                            };
                        }
                    }
                    FingerMode::Multi { rotation, .. } => self.recount(rotation, &mut out),
                    FingerMode::Draining => (),
                }
            }
            TouchPhase::Move => {
                let Some(position) = self.fingers.get_mut(&touch.id) else {
                    return Err(TouchError::UnknownTouch(touch.id));
                };
                *position = touch.position;
                match self.mode {
                    FingerMode::Single(id) if id == touch.id => {
                        out.push(self.single(TouchPhase::Move, touch.position));
                    }
                    FingerMode::Multi { last, rotation } => self.moved(last, rotation, &mut out),
                    _ => (),
                }
            }
            TouchPhase::Up | TouchPhase::Cancel => {
                if self.fingers.remove(&touch.id).is_none() {
                    return Err(TouchError::UnknownTouch(touch.id));
                }
                match self.mode {
                    FingerMode::Single(id) if id == touch.id => {
                        out.push(self.single(touch.phase, touch.position));
                        self.mode = FingerMode::Idle;
                    }
                    FingerMode::Multi { last, rotation } => {
                        if self.fingers.len() >= 2 {
                            self.recount(rotation, &mut out);
                        } else {
                            let phase = if touch.phase == TouchPhase::Cancel {
                                GesturePhase::Cancelled
                            } else {
                                GesturePhase::Ended
                            };
                            let centroid = to_dvec(last.centroid);
                            let touches = self.fingers.len();
                            out.push(Input::Gesture(GestureUpdate::pinch(
                                phase,
                                1.0,
                                centroid,
                                touches,
                            )));
                            if matches!(rotation, Rotation::Active) {
                                out.push(Input::Gesture(GestureUpdate::rotation(
                                    phase, 0.0, centroid, touches,
                                )));
                            }
                            self.mode = FingerMode::Draining;
                        }
                    }
                    _ => (),
                }
                if self.fingers.is_empty() {
                    self.mode = FingerMode::Idle;
                }
            }
        }
        Ok(out)
    }
    /// The finger count changed mid-gesture. Report it without any motion and start measuring
    /// afresh.
    fn recount(&mut self, rotation: Rotation, out: &mut Inputs) {
        let Some(measure) = self.measure() else {
            return;
        };
        let centroid = to_dvec(measure.centroid);
        out.push(Input::Gesture(GestureUpdate::pinch(
            GesturePhase::Changed,
            1.0,
            centroid,
            measure.touches,
        )));
        if matches!(rotation, Rotation::Active) {
            out.push(Input::Gesture(GestureUpdate::rotation(
                GesturePhase::Changed,
                0.0,
                centroid,
                measure.touches,
            )));
        }
        self.mode = FingerMode::Multi {
            last: measure,
            rotation,
        };
    }
    fn moved(&mut self, last: Measure, rotation: Rotation, out: &mut Inputs) {
        let Some(measure) = self.measure() else {
            return;
        };
        let centroid = to_dvec(measure.centroid);
        let scale = if last.spread > f32::EPSILON && measure.spread > f32::EPSILON {
            measure.spread / last.spread
        } else {
            1.0
        };
        out.push(Input::Gesture(GestureUpdate::pinch(
            GesturePhase::Changed,
            f64::from(scale),
            centroid,
            measure.touches,
        )));

        let twist = wrap_angle(measure.angle - last.angle);
        let rotation = match rotation {
            Rotation::Pending(so_far) => {
                let so_far = so_far + twist;
                if so_far.abs() > self.rotation_slop {
                    log::trace!("rotation past slop at {so_far} rad");
                    out.push(Input::Gesture(GestureUpdate::rotation(
                        GesturePhase::Began,
                        0.0,
                        centroid,
                        measure.touches,
                    )));
                    out.push(Input::Gesture(GestureUpdate::rotation(
                        GesturePhase::Changed,
                        f64::from(so_far),
                        centroid,
                        measure.touches,
                    )));
                    Rotation::Active
                } else {
                    Rotation::Pending(so_far)
                }
            }
            Rotation::Active => {
                out.push(Input::Gesture(GestureUpdate::rotation(
                    GesturePhase::Changed,
                    f64::from(twist),
                    centroid,
                    measure.touches,
                )));
                Rotation::Active
            }
        };
        self.mode = FingerMode::Multi {
            last: measure,
            rotation,
        };
    }
}
