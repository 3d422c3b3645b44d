//! Headless replay of a [`Script`] against a [`RecordingBackend`].

use crate::{
    script::{Script, ScriptEvent},
    touch::{Input, TouchRecognizer},
};
use anyhow::Context;
use telescope_core::{
    render::{FrameStats, RecordingBackend},
    Canvas, CanvasConfig, DVec2, FrameId,
};

/// What happened over a whole session.
#[derive(Clone, Debug, Default)]
pub struct Report {
    pub events: usize,
    pub ticks: usize,
    pub strokes_committed: usize,
    pub commit_failures: usize,
    /// Touch streams that made no sense, and gestures that failed to apply.
    pub input_errors: usize,
    pub stats: FrameStats,
    pub draw_commands: usize,
    pub frames: usize,
    pub deepest_frame: u32,
    pub active_frame: Option<FrameId>,
    pub zoom: f64,
    /// Zoom of the view relative to the root frame.
    pub effective_zoom: f64,
    pub resident_bytes: u64,
    pub uploaded_bytes: u64,
    pub live_buffers: usize,
    pub live_textures: usize,
}
impl std::fmt::Display for Report {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} events, {} ticks, {} draw commands",
            self.events, self.ticks, self.draw_commands
        )?;
        writeln!(
            f,
            "strokes: {} committed, {} failed, {} bad inputs",
            self.strokes_committed, self.commit_failures, self.input_errors
        )?;
        writeln!(
            f,
            "frames: {} (deepest {}), active {}, zoom {:.3} ({:e} from root)",
            self.frames,
            self.deepest_frame,
            self.active_frame
                .map_or_else(|| "none".to_owned(), |frame| frame.to_string()),
            self.zoom,
            self.effective_zoom
        )?;
        writeln!(
            f,
            "chunks: {} submitted, {} culled. \
             tiles: {} drawn, {} baked, {} strokes served from tiles",
            self.stats.chunks_submitted,
            self.stats.chunks_culled,
            self.stats.tiles_drawn,
            self.stats.tiles_baked,
            self.stats.strokes_from_tiles
        )?;
        write!(
            f,
            "memory: {} resident in {} buffers and {} textures, {} uploaded",
            human_bytes::human_bytes(self.resident_bytes as f64),
            self.live_buffers,
            self.live_textures,
            human_bytes::human_bytes(self.uploaded_bytes as f64)
        )
    }
}

pub struct Session {
    canvas: Canvas,
    touches: TouchRecognizer,
    backend: RecordingBackend,
    report: Report,
}
impl Session {
    #[must_use]
    pub fn new(config: CanvasConfig, rotation_slop: f32, viewport: DVec2) -> Self {
        Self {
            touches: TouchRecognizer::new(config.finger_draws, rotation_slop),
            canvas: Canvas::new(config, viewport),
            backend: RecordingBackend::new(),
            report: Report::default(),
        }
    }
    #[must_use]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }
    /// Play every event of the script, then report.
    ///
    /// # Errors
    /// If the backend refuses a render pass. Bad input is only logged and counted.
    pub fn run(mut self, script: &Script) -> anyhow::Result<Report> {
        for (index, event) in script.events.iter().enumerate() {
            self.apply(event)
                .with_context(|| format!("event {index} ({event:?})"))?;
        }
        Ok(self.report())
    }
    /// # Errors
    /// If the backend refuses a render pass.
    pub fn apply(&mut self, event: &ScriptEvent) -> anyhow::Result<()> {
        self.report.events += 1;
        match event {
            ScriptEvent::Touch { .. } => {
                let Some(touch) = event.touch() else {
                    return Ok(());
                };
                match self.touches.feed(&touch) {
                    Ok(inputs) => {
                        for input in inputs {
                            self.dispatch(input);
                        }
                    }
                    Err(e) => {
                        log::warn!("ignoring touch: {e}");
                        self.report.input_errors += 1;
                    }
                }
            }
            ScriptEvent::Tick { count } => {
                for _ in 0..*count {
                    self.tick()?;
                }
            }
            ScriptEvent::AddCard {
                width,
                height,
                content,
                editing,
            } => {
                let frame = self.canvas.camera().active_frame;
                let card = self
                    .canvas
                    .add_card(DVec2::new(*width, *height), content.content())?;
                if *editing {
                    self.canvas.set_card_editing(frame, card, true)?;
                }
                log::info!("added {} card {card} to {frame}", content.as_ref());
            }
            ScriptEvent::Resize { width, height } => {
                self.canvas.set_viewport(DVec2::new(*width, *height));
            }
        }
        Ok(())
    }
    fn dispatch(&mut self, input: Input) {
        match input {
            Input::Draw(event) => match self.canvas.handle_draw(event, &mut self.backend) {
                Ok(Some(_)) => self.report.strokes_committed += 1,
                Ok(None) => (),
                Err(e) => {
                    log::warn!("stroke not committed: {e}");
                    self.report.commit_failures += 1;
                }
            },
            Input::Pan(event) => self.canvas.handle_pan(event),
            Input::Gesture(update) => {
                if let Err(e) = self.canvas.handle_gesture(&update) {
                    log::warn!("{} update failed: {e}", update.kind.as_ref());
                    self.report.input_errors += 1;
                }
            }
        }
    }
    fn tick(&mut self) -> anyhow::Result<()> {
        let stats = self.canvas.render_tick(&mut self.backend)?;
        self.report.ticks += 1;
        self.report.stats += stats;
        self.report.draw_commands += self.backend.drain().len();
        Ok(())
    }
    /// Snapshot of everything so far.
    #[must_use]
    pub fn report(&self) -> Report {
        let camera = self.canvas.camera();
        let graph = self.canvas.graph();
        Report {
            frames: graph.len(),
            deepest_frame: graph.frames().map(|(_, frame)| frame.depth()).max().unwrap_or(0),
            active_frame: Some(camera.active_frame),
            zoom: camera.zoom_scale,
            effective_zoom: graph
                .effective_zoom(camera.active_frame)
                .map_or(f64::NAN, |frame_zoom| frame_zoom * camera.zoom_scale),
            resident_bytes: self.backend.resident_bytes(),
            uploaded_bytes: self.backend.uploaded_bytes(),
            live_buffers: self.backend.live_buffers(),
            live_textures: self.backend.live_textures(),
            ..self.report.clone()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn session(script: &Script) -> Session {
        let viewport = DVec2::new(script.viewport[0], script.viewport[1]);
        Session::new(CanvasConfig::default(), 10f32.to_radians(), viewport)
    }

    #[test]
    fn demo_tours_and_returns() {
        let script = Script::demo();
        let mut session = session(&script);
        for event in &script.events {
            session.apply(event).unwrap();
        }
        let report = session.report();
        assert_eq!(report.input_errors, 0);
        assert_eq!(report.commit_failures, 0);
        assert_eq!(report.strokes_committed, 3);
        assert!(report.frames >= 2);
        assert!(report.deepest_frame >= 1);
        assert!(report.draw_commands > 0);
        assert!(report.stats.chunks_submitted > 0);

        let canvas = session.canvas();
        assert_eq!(canvas.camera().active_frame, canvas.graph().root());
        assert!((report.effective_zoom - 1.0).abs() < 1e-3);
        assert_eq!(report.events, script.events.len());

        let canvas_strokes: usize = canvas.frames().map(|(_, frame)| frame.strokes().len()).sum();
        let card_strokes: usize = canvas
            .frames()
            .flat_map(|(_, frame)| frame.cards())
            .map(|card| card.strokes().len())
            .sum();
        assert_eq!(canvas_strokes, 2);
        assert_eq!(card_strokes, 1);
    }
    #[test]
    fn bad_touches_are_counted_not_fatal() {
        let script = Script::parse(
            r#"
            [[event]]
            kind = "touch"
            id = 4
            phase = "move"
            tool = "finger"
            x = 1.0
            y = 1.0

            [[event]]
            kind = "tick"
            count = 2
            "#,
        )
        .unwrap();
        let report = session(&script).run(&script).unwrap();
        assert_eq!(report.input_errors, 1);
        assert_eq!(report.ticks, 2);
        assert_eq!(report.frames, 1);
    }
    #[test]
    fn report_reads_well() {
        let report = Report {
            resident_bytes: 2048,
            ..Report::default()
        };
        let text = report.to_string();
        assert!(text.contains("2 KiB"));
        assert!(text.contains("active none"));
    }
}
