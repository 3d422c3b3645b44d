//! A backend that draws nothing and remembers everything, for tests and headless sessions.

use super::{BackendError, BufferHandle, DrawCall, PassTarget, RenderBackend, TextureHandle};
use crate::{color::Color, geometry::StrokeVertex};

#[derive(Clone, PartialEq, Debug)]
pub enum Recorded {
    BeginPass {
        target: PassTarget,
        clear: Option<Color>,
    },
    Draw(DrawCall),
    EndPass,
}

#[derive(Default)]
pub struct RecordingBackend {
    buffers: hashbrown::HashMap<BufferHandle, Vec<StrokeVertex>>,
    textures: hashbrown::HashMap<TextureHandle, u32>,
    next_handle: u64,
    open_pass: Option<PassTarget>,
    commands: Vec<Recorded>,
    /// How many more textures may be created. `None` for unlimited.
    pub texture_budget: Option<usize>,
    /// Bytes ever uploaded, including since-released buffers.
    uploaded_bytes: u64,
}
impl RecordingBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// A backend on which every texture allocation fails.
    #[must_use]
    pub fn without_textures() -> Self {
        Self {
            texture_budget: Some(0),
            ..Self::default()
        }
    }
    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
    #[must_use]
    pub fn commands(&self) -> &[Recorded] {
        &self.commands
    }
    /// Take the recorded commands, leaving resources alone.
    pub fn drain(&mut self) -> Vec<Recorded> {
        std::mem::take(&mut self.commands)
    }
    /// Every draw, in order, along with the target it was drawn to.
    pub fn draws(&self) -> impl Iterator<Item = (PassTarget, &DrawCall)> + '_ {
        let mut target = PassTarget::Screen;
        self.commands.iter().filter_map(move |command| match command {
            Recorded::BeginPass { target: t, .. } => {
                target = *t;
                None
            }
            Recorded::Draw(call) => Some((target, call)),
            Recorded::EndPass => None,
        })
    }
    #[must_use]
    pub fn buffer(&self, handle: BufferHandle) -> Option<&[StrokeVertex]> {
        self.buffers.get(&handle).map(Vec::as_slice)
    }
    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }
    #[must_use]
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }
    /// Bytes currently held in vertex buffers and textures (RGBA8).
    #[must_use]
    pub fn resident_bytes(&self) -> u64 {
        let vertex_bytes: usize = self
            .buffers
            .values()
            .map(|vertices| std::mem::size_of_val(vertices.as_slice()))
            .sum();
        let texture_bytes: u64 = self
            .textures
            .values()
            .map(|&size| u64::from(size) * u64::from(size) * 4)
            .sum();
        vertex_bytes as u64 + texture_bytes
    }
    #[must_use]
    pub fn uploaded_bytes(&self) -> u64 {
        self.uploaded_bytes
    }
}
impl RenderBackend for RecordingBackend {
    fn create_vertex_buffer(
        &mut self,
        vertices: &[StrokeVertex],
    ) -> Result<BufferHandle, BackendError> {
        if vertices.is_empty() {
            return Err(BackendError::Empty);
        }
        let handle = BufferHandle(self.next());
        self.uploaded_bytes += bytemuck::cast_slice::<_, u8>(vertices).len() as u64;
        self.buffers.insert(handle, vertices.to_vec());
        Ok(handle)
    }
    fn release_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer);
    }
    fn create_texture(&mut self, size: u32) -> Result<TextureHandle, BackendError> {
        if size == 0 {
            return Err(BackendError::Empty);
        }
        if let Some(budget) = self.texture_budget.as_mut() {
            if *budget == 0 {
                return Err(BackendError::OutOfMemory);
            }
            *budget -= 1;
        }
        let handle = TextureHandle(self.next());
        self.textures.insert(handle, size);
        Ok(handle)
    }
    fn begin_pass(&mut self, target: PassTarget, clear: Option<Color>) -> Result<(), BackendError> {
        if self.open_pass.is_some() {
            return Err(BackendError::PassAlreadyOpen);
        }
        if let PassTarget::Texture(texture) = target {
            if !self.textures.contains_key(&texture) {
                return Err(BackendError::UnknownHandle);
            }
        }
        self.open_pass = Some(target);
        self.commands.push(Recorded::BeginPass { target, clear });
        Ok(())
    }
    fn end_pass(&mut self) -> Result<(), BackendError> {
        if self.open_pass.take().is_none() {
            return Err(BackendError::NoPass);
        }
        self.commands.push(Recorded::EndPass);
        Ok(())
    }
    fn submit(&mut self, call: DrawCall) {
        if self.open_pass.is_none() {
            log::warn!("draw submitted outside of a pass: {call:?}");
        }
        self.commands.push(Recorded::Draw(call));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pass_nesting_is_checked() {
        let mut backend = RecordingBackend::new();
        assert_eq!(backend.end_pass(), Err(BackendError::NoPass));
        backend.begin_pass(PassTarget::Screen, None).unwrap();
        assert_eq!(
            backend.begin_pass(PassTarget::Screen, None),
            Err(BackendError::PassAlreadyOpen)
        );
        backend.end_pass().unwrap();
        assert_eq!(backend.commands().len(), 2);
    }
    #[test]
    fn texture_budget_runs_out() {
        let mut backend = RecordingBackend::new();
        backend.texture_budget = Some(1);
        let texture = backend.create_texture(64).unwrap();
        assert_eq!(backend.create_texture(64), Err(BackendError::OutOfMemory));
        assert_eq!(backend.resident_bytes(), 64 * 64 * 4);
        backend
            .begin_pass(PassTarget::Texture(texture), Some(Color::TRANSPARENT))
            .unwrap();
        assert!(RecordingBackend::without_textures()
            .create_texture(64)
            .is_err());
    }
    #[test]
    fn buffers_release() {
        let mut backend = RecordingBackend::new();
        let vertex = StrokeVertex {
            position: [0.0; 2],
            color: [1.0; 4],
        };
        let buffer = backend.create_vertex_buffer(&[vertex; 3]).unwrap();
        assert_eq!(backend.buffer(buffer).map(<[_]>::len), Some(3));
        backend.release_buffer(buffer);
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.uploaded_bytes(), 3 * 24);
        assert!(backend.create_vertex_buffer(&[]).is_err());
    }
}
