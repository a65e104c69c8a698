//! OpenGL device backed by `glow`
//!
//! Wraps a current GL 3.3+ context. Handles handed out to renderables are
//! slotmap keys mapped onto the native GL objects, so the rest of the crate
//! never sees a raw GL name.
#![allow(unsafe_code)]

use super::{
    AttributeLocation, BufferHandle, BufferUsage, DeviceError, DeviceResult, GraphicsDevice,
    Primitive, ProgramHandle, TextureHandle, UniformLocation,
};
use crate::foundation::math::{Mat4, Vec3};
use glow::HasContext;
use slotmap::SlotMap;

type NativeProgram = <glow::Context as HasContext>::Program;
type NativeBuffer = <glow::Context as HasContext>::Buffer;
type NativeTexture = <glow::Context as HasContext>::Texture;
type NativeUniform = <glow::Context as HasContext>::UniformLocation;
type NativeVertexArray = <glow::Context as HasContext>::VertexArray;

/// Graphics device issuing real OpenGL calls
///
/// All methods must be called on the thread that owns the context.
pub struct GlDevice {
    gl: glow::Context,
    vertex_array: NativeVertexArray,
    programs: SlotMap<ProgramHandle, NativeProgram>,
    buffers: SlotMap<BufferHandle, NativeBuffer>,
    textures: SlotMap<TextureHandle, NativeTexture>,
    uniforms: Vec<NativeUniform>,
}

impl GlDevice {
    /// Wrap a context that is current on this thread
    pub fn new(gl: glow::Context) -> DeviceResult<Self> {
        // SAFETY: the caller guarantees `gl` is current on this thread.
        let vertex_array = unsafe {
            let vao = gl.create_vertex_array().map_err(DeviceError::ResourceCreation)?;
            gl.bind_vertex_array(Some(vao));
            gl.enable(glow::DEPTH_TEST);
            gl.enable(glow::CULL_FACE);
            vao
        };
        Ok(Self {
            gl,
            vertex_array,
            programs: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            uniforms: Vec::new(),
        })
    }

    /// Access the wrapped context (e.g. to clear the framebuffer)
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    fn compile_stage(&self, stage: u32, source: &str) -> DeviceResult<<glow::Context as HasContext>::Shader> {
        unsafe {
            let shader = self.gl.create_shader(stage).map_err(DeviceError::ProgramCreation)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if self.gl.get_shader_compile_status(shader) {
                Ok(shader)
            } else {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                Err(DeviceError::ProgramCreation(log))
            }
        }
    }

    fn uniform(&self, location: UniformLocation) -> Option<&NativeUniform> {
        self.uniforms.get(location.0 as usize)
    }

    fn gl_primitive(primitive: Primitive) -> u32 {
        match primitive {
            Primitive::Points => glow::POINTS,
            Primitive::Lines => glow::LINES,
            Primitive::LineStrip => glow::LINE_STRIP,
            Primitive::LineLoop => glow::LINE_LOOP,
            Primitive::Triangles => glow::TRIANGLES,
            Primitive::TriangleStrip => glow::TRIANGLE_STRIP,
            Primitive::TriangleFan => glow::TRIANGLE_FAN,
        }
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl GraphicsDevice for GlDevice {
    fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> DeviceResult<ProgramHandle> {
        let vertex = self.compile_stage(glow::VERTEX_SHADER, vertex_source)?;
        let fragment = match self.compile_stage(glow::FRAGMENT_SHADER, fragment_source) {
            Ok(fragment) => fragment,
            Err(e) => {
                unsafe { self.gl.delete_shader(vertex) };
                return Err(e);
            }
        };

        unsafe {
            let program = match self.gl.create_program() {
                Ok(program) => program,
                Err(e) => {
                    self.gl.delete_shader(vertex);
                    self.gl.delete_shader(fragment);
                    return Err(DeviceError::ProgramCreation(e));
                }
            };
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            self.gl.link_program(program);
            let linked = self.gl.get_program_link_status(program);
            self.gl.detach_shader(program, vertex);
            self.gl.detach_shader(program, fragment);
            self.gl.delete_shader(vertex);
            self.gl.delete_shader(fragment);

            if !linked {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(DeviceError::ProgramCreation(log));
            }
            Ok(self.programs.insert(program))
        }
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if let Some(native) = self.programs.remove(program) {
            unsafe { self.gl.delete_program(native) };
        }
    }

    fn attribute_location(&mut self, program: ProgramHandle, name: &str) -> Option<AttributeLocation> {
        let native = *self.programs.get(program)?;
        unsafe { self.gl.get_attrib_location(native, name) }.map(AttributeLocation)
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let native = *self.programs.get(program)?;
        let location = unsafe { self.gl.get_uniform_location(native, name) }?;
        self.uniforms.push(location);
        u32::try_from(self.uniforms.len() - 1).ok().map(UniformLocation)
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        let native = program.and_then(|p| self.programs.get(p).copied());
        unsafe { self.gl.use_program(native) };
    }

    fn create_buffer(&mut self) -> DeviceResult<BufferHandle> {
        let native = unsafe { self.gl.create_buffer() }.map_err(DeviceError::ResourceCreation)?;
        Ok(self.buffers.insert(native))
    }

    fn buffer_data(&mut self, buffer: BufferHandle, data: &[u8], usage: BufferUsage) {
        let Some(native) = self.buffers.get(buffer).copied() else {
            log::warn!("Upload to unknown buffer {:?}", buffer);
            return;
        };
        let usage = match usage {
            BufferUsage::Static => glow::STATIC_DRAW,
            BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
        };
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(native));
            self.gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, data, usage);
        }
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if let Some(native) = self.buffers.remove(buffer) {
            unsafe { self.gl.delete_buffer(native) };
        }
    }

    fn create_texture_rgba8(&mut self, width: u32, height: u32, pixels: &[u8]) -> DeviceResult<TextureHandle> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(DeviceError::InvalidTextureData { expected, actual: pixels.len() });
        }
        unsafe {
            let native = self.gl.create_texture().map_err(DeviceError::ResourceCreation)?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(native));
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                to_i32(glow::RGBA8),
                to_i32(width),
                to_i32(height),
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(pixels),
            );
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, to_i32(glow::REPEAT));
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, to_i32(glow::REPEAT));
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, to_i32(glow::LINEAR));
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                to_i32(glow::LINEAR_MIPMAP_LINEAR),
            );
            self.gl.generate_mipmap(glow::TEXTURE_2D);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            Ok(self.textures.insert(native))
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>) {
        let native = texture.and_then(|t| self.textures.get(t).copied());
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, native);
        }
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if let Some(native) = self.textures.remove(texture) {
            unsafe { self.gl.delete_texture(native) };
        }
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4) {
        unsafe { self.gl.uniform_matrix_4_f32_slice(self.uniform(location), false, value.as_slice()) };
    }

    fn set_uniform_vec3(&mut self, location: UniformLocation, value: &Vec3) {
        unsafe { self.gl.uniform_3_f32(self.uniform(location), value.x, value.y, value.z) };
    }

    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32) {
        unsafe { self.gl.uniform_1_f32(self.uniform(location), value) };
    }

    fn set_uniform_i32(&mut self, location: UniformLocation, value: i32) {
        unsafe { self.gl.uniform_1_i32(self.uniform(location), value) };
    }

    fn enable_vertex_attribute(&mut self, location: AttributeLocation) {
        unsafe { self.gl.enable_vertex_attrib_array(location.0) };
    }

    fn vertex_attribute_pointer(&mut self, location: AttributeLocation, buffer: BufferHandle, components: u32) {
        let native = self.buffers.get(buffer).copied();
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, native);
            self.gl.vertex_attrib_pointer_f32(location.0, to_i32(components), glow::FLOAT, false, 0, 0);
        }
    }

    fn disable_vertex_attribute(&mut self, location: AttributeLocation) {
        unsafe { self.gl.disable_vertex_attrib_array(location.0) };
    }

    fn set_face_culling(&mut self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::CULL_FACE);
            } else {
                self.gl.disable(glow::CULL_FACE);
            }
        }
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        unsafe { self.gl.draw_arrays(Self::gl_primitive(primitive), to_i32(first), to_i32(count)) };
    }
}

impl Drop for GlDevice {
    fn drop(&mut self) {
        unsafe { self.gl.delete_vertex_array(self.vertex_array) };
    }
}
