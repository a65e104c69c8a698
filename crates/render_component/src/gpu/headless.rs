//! In-memory graphics device
//!
//! Tracks live resources and records every draw call with the state that was
//! bound when it was issued. Used by tests and by the demo, where no window or
//! GL context exists.

use super::{
    AttributeLocation, BufferHandle, BufferUsage, DeviceError, DeviceResult, GraphicsDevice,
    Primitive, ProgramHandle, TextureHandle, UniformLocation,
};
use crate::foundation::math::{Mat4, Vec3};
use slotmap::SlotMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Value last written to a uniform
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// 4x4 matrix
    Mat4(Mat4),
    /// 3-component vector
    Vec3(Vec3),
    /// Float
    F32(f32),
    /// Int
    I32(i32),
}

/// Snapshot of the bound state at the time of a draw call
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Current program
    pub program: Option<ProgramHandle>,
    /// Primitive topology
    pub primitive: Primitive,
    /// First vertex
    pub first: u32,
    /// Vertex count
    pub count: u32,
    /// Uniform values of the current program, by name
    pub uniforms: BTreeMap<String, UniformValue>,
    /// Enabled attributes of the current program, by name, with their buffer
    pub attributes: BTreeMap<String, BufferHandle>,
    /// Texture bound per unit
    pub textures: BTreeMap<u32, TextureHandle>,
    /// Whether back-face culling was enabled
    pub face_culling: bool,
}

#[derive(Debug, Default)]
struct ProgramState {
    attributes: Vec<String>,
    uniforms: Vec<String>,
    values: BTreeMap<String, UniformValue>,
}

impl ProgramState {
    fn slot(names: &mut Vec<String>, name: &str) -> u32 {
        let index = names.iter().position(|n| n == name).unwrap_or_else(|| {
            names.push(name.to_string());
            names.len() - 1
        });
        u32::try_from(index).unwrap_or(u32::MAX)
    }
}

#[derive(Debug)]
struct BufferState {
    data: Vec<u8>,
    usage: Option<BufferUsage>,
    uploads: usize,
}

#[derive(Debug)]
struct TextureState {
    width: u32,
    height: u32,
}

/// Graphics device that keeps everything in main memory
#[derive(Debug)]
pub struct HeadlessDevice {
    programs: SlotMap<ProgramHandle, ProgramState>,
    buffers: SlotMap<BufferHandle, BufferState>,
    textures: SlotMap<TextureHandle, TextureState>,
    current_program: Option<ProgramHandle>,
    enabled_attributes: BTreeSet<AttributeLocation>,
    attribute_buffers: HashMap<AttributeLocation, BufferHandle>,
    bound_textures: BTreeMap<u32, TextureHandle>,
    face_culling: bool,
    draw_calls: Vec<DrawCall>,
    reject_programs: bool,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    /// Create an empty device with back-face culling enabled
    pub fn new() -> Self {
        Self {
            programs: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            current_program: None,
            enabled_attributes: BTreeSet::new(),
            attribute_buffers: HashMap::new(),
            bound_textures: BTreeMap::new(),
            face_culling: true,
            draw_calls: Vec::new(),
            reject_programs: false,
        }
    }

    /// Make every subsequent `create_program` fail (simulates a compile error)
    pub fn set_reject_programs(&mut self, reject: bool) {
        self.reject_programs = reject;
    }

    /// Draw calls recorded so far
    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    /// Forget recorded draw calls (e.g. at the start of a frame)
    pub fn clear_draw_calls(&mut self) {
        self.draw_calls.clear();
    }

    /// Number of programs not yet deleted
    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    /// Number of buffers not yet deleted
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Number of textures not yet deleted
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Attribute slots currently enabled
    pub fn enabled_attribute_count(&self) -> usize {
        self.enabled_attributes.len()
    }

    /// Whether back-face culling is currently enabled
    pub fn face_culling(&self) -> bool {
        self.face_culling
    }

    /// Whether a buffer handle is still live
    pub fn is_buffer_live(&self, buffer: BufferHandle) -> bool {
        self.buffers.contains_key(buffer)
    }

    /// Whether a texture handle is still live
    pub fn is_texture_live(&self, texture: TextureHandle) -> bool {
        self.textures.contains_key(texture)
    }

    /// Buffer contents decoded as native-endian f32 values
    pub fn buffer_floats(&self, buffer: BufferHandle) -> Option<Vec<f32>> {
        self.buffers.get(buffer).map(|b| {
            b.data
                .chunks_exact(4)
                .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                .collect()
        })
    }

    /// Usage hint of the most recent upload to a buffer
    pub fn buffer_usage(&self, buffer: BufferHandle) -> Option<BufferUsage> {
        self.buffers.get(buffer).and_then(|b| b.usage)
    }

    /// How many times a buffer has been uploaded to
    pub fn buffer_upload_count(&self, buffer: BufferHandle) -> usize {
        self.buffers.get(buffer).map_or(0, |b| b.uploads)
    }

    /// Width and height of a texture
    pub fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures.get(texture).map(|t| (t.width, t.height))
    }

    fn uniform_name(&self, location: UniformLocation) -> Option<(ProgramHandle, String)> {
        let program = self.current_program?;
        let state = self.programs.get(program)?;
        let name = state.uniforms.get(location.0 as usize)?;
        Some((program, name.clone()))
    }

    fn write_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        match self.uniform_name(location) {
            Some((program, name)) => {
                if let Some(state) = self.programs.get_mut(program) {
                    state.values.insert(name, value);
                }
            }
            None => log::warn!("Uniform write to {:?} without a matching current program", location),
        }
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> DeviceResult<ProgramHandle> {
        if self.reject_programs {
            return Err(DeviceError::ProgramCreation("program creation rejected by device".to_string()));
        }
        if vertex_source.trim().is_empty() || fragment_source.trim().is_empty() {
            return Err(DeviceError::ProgramCreation("empty shader stage source".to_string()));
        }
        Ok(self.programs.insert(ProgramState::default()))
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(program).is_none() {
            log::warn!("Deleting unknown program {:?}", program);
        }
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn attribute_location(&mut self, program: ProgramHandle, name: &str) -> Option<AttributeLocation> {
        let state = self.programs.get_mut(program)?;
        Some(AttributeLocation(ProgramState::slot(&mut state.attributes, name)))
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let state = self.programs.get_mut(program)?;
        Some(UniformLocation(ProgramState::slot(&mut state.uniforms, name)))
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.current_program = program;
    }

    fn create_buffer(&mut self) -> DeviceResult<BufferHandle> {
        Ok(self.buffers.insert(BufferState {
            data: Vec::new(),
            usage: None,
            uploads: 0,
        }))
    }

    fn buffer_data(&mut self, buffer: BufferHandle, data: &[u8], usage: BufferUsage) {
        match self.buffers.get_mut(buffer) {
            Some(state) => {
                state.data.clear();
                state.data.extend_from_slice(data);
                state.usage = Some(usage);
                state.uploads += 1;
            }
            None => log::warn!("Upload to unknown buffer {:?}", buffer),
        }
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(buffer).is_none() {
            log::warn!("Deleting unknown buffer {:?}", buffer);
        }
        self.attribute_buffers.retain(|_, b| *b != buffer);
    }

    fn create_texture_rgba8(&mut self, width: u32, height: u32, pixels: &[u8]) -> DeviceResult<TextureHandle> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(DeviceError::InvalidTextureData { expected, actual: pixels.len() });
        }
        Ok(self.textures.insert(TextureState { width, height }))
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>) {
        match texture {
            Some(texture) => {
                self.bound_textures.insert(unit, texture);
            }
            None => {
                self.bound_textures.remove(&unit);
            }
        }
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(texture).is_none() {
            log::warn!("Deleting unknown texture {:?}", texture);
        }
        self.bound_textures.retain(|_, t| *t != texture);
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4) {
        self.write_uniform(location, UniformValue::Mat4(*value));
    }

    fn set_uniform_vec3(&mut self, location: UniformLocation, value: &Vec3) {
        self.write_uniform(location, UniformValue::Vec3(*value));
    }

    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32) {
        self.write_uniform(location, UniformValue::F32(value));
    }

    fn set_uniform_i32(&mut self, location: UniformLocation, value: i32) {
        self.write_uniform(location, UniformValue::I32(value));
    }

    fn enable_vertex_attribute(&mut self, location: AttributeLocation) {
        self.enabled_attributes.insert(location);
    }

    fn vertex_attribute_pointer(&mut self, location: AttributeLocation, buffer: BufferHandle, _components: u32) {
        self.attribute_buffers.insert(location, buffer);
    }

    fn disable_vertex_attribute(&mut self, location: AttributeLocation) {
        self.enabled_attributes.remove(&location);
    }

    fn set_face_culling(&mut self, enabled: bool) {
        self.face_culling = enabled;
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        let state = self.current_program.and_then(|p| self.programs.get(p));
        let uniforms = state.map(|s| s.values.clone()).unwrap_or_default();
        let attributes = self
            .enabled_attributes
            .iter()
            .filter_map(|location| {
                let name = state?.attributes.get(location.0 as usize)?.clone();
                let buffer = *self.attribute_buffers.get(location)?;
                Some((name, buffer))
            })
            .collect();

        self.draw_calls.push(DrawCall {
            program: self.current_program,
            primitive,
            first,
            count,
            uniforms,
            attributes,
            textures: self.bound_textures.clone(),
            face_culling: self.face_culling,
        });
    }
}
