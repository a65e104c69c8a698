//! Resource collaborators
//!
//! Renderables never open files or compile shaders themselves. They go through
//! a [`ResourceManager`] passed by reference into the load and allocate stages,
//! which owns one loader per resource kind plus the active configuration.

pub mod geometry;
pub mod shader;
pub mod texture;

pub use geometry::{GeometryError, GeometryLoader, MeshData, ObjLoader};
pub use shader::{ShaderError, ShaderLoader, ShaderManager};
pub use texture::{ImageData, ImageTextureLoader, TextureError, TextureLoader, TextureRoute};

use crate::config::{RenderComponentConfig, ShaderProgramConfig};
use crate::gpu::{GraphicsDevice, ProgramHandle, TextureHandle};

/// Explicit resource context owned by the application
pub struct ResourceManager {
    config: RenderComponentConfig,
    shaders: Box<dyn ShaderLoader>,
    textures: Box<dyn TextureLoader>,
    geometry: Box<dyn GeometryLoader>,
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new(RenderComponentConfig::default())
    }
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ResourceManager {
    /// Create the default file-backed loaders for a configuration
    pub fn new(config: RenderComponentConfig) -> Self {
        let assets_dir = config.assets.assets_dir.clone();
        let shaders = ShaderManager::new(config.assets.shader_dirs.iter().cloned());
        Self {
            shaders: Box::new(shaders),
            textures: Box::new(ImageTextureLoader::new(assets_dir.clone())),
            geometry: Box::new(ObjLoader::new(assets_dir)),
            config,
        }
    }

    /// Replace the shader loader
    #[must_use]
    pub fn with_shader_loader(mut self, loader: impl ShaderLoader + 'static) -> Self {
        self.shaders = Box::new(loader);
        self
    }

    /// Replace the texture loader
    #[must_use]
    pub fn with_texture_loader(mut self, loader: impl TextureLoader + 'static) -> Self {
        self.textures = Box::new(loader);
        self
    }

    /// Replace the geometry loader
    #[must_use]
    pub fn with_geometry_loader(mut self, loader: impl GeometryLoader + 'static) -> Self {
        self.geometry = Box::new(loader);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &RenderComponentConfig {
        &self.config
    }

    /// Compile and link a program from a vertex/fragment pair
    pub fn load_program(
        &mut self,
        device: &mut dyn GraphicsDevice,
        program: &ShaderProgramConfig,
    ) -> Result<ProgramHandle, ShaderError> {
        self.shaders.load_program(device, &program.vertex, &program.fragment)
    }

    /// Load a texture, routed by the extension of `name`.
    ///
    /// Returns `Ok(None)` for an empty name: the caller already holds the
    /// texture. Unsupported extensions fail before any loader is called.
    pub fn load_texture_by_name(
        &mut self,
        device: &mut dyn GraphicsDevice,
        name: &str,
    ) -> Result<Option<TextureHandle>, TextureError> {
        match TextureRoute::from_file_name(name) {
            TextureRoute::Bitmap => self.textures.load_bitmap_texture(device, name).map(Some),
            TextureRoute::Compressed => self.textures.load_compressed_texture(device, name).map(Some),
            TextureRoute::External => Ok(None),
            TextureRoute::Unsupported => Err(TextureError::UnsupportedFormat(name.to_string())),
        }
    }

    /// Read positions, uvs and normals from a geometry file
    pub fn load_geometry_file(&self, path: &str) -> Result<MeshData, GeometryError> {
        self.geometry.load_geometry_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessDevice;

    #[test]
    fn test_empty_texture_name_is_external() {
        let mut device = HeadlessDevice::new();
        let mut resources = ResourceManager::default();
        assert!(matches!(resources.load_texture_by_name(&mut device, ""), Ok(None)));
        assert!(matches!(
            resources.load_texture_by_name(&mut device, "skin.png"),
            Err(TextureError::UnsupportedFormat(_))
        ));
        assert_eq!(device.live_textures(), 0);
    }

    #[test]
    fn test_default_programs_come_from_builtin_sources() {
        let mut device = HeadlessDevice::new();
        let mut resources = ResourceManager::default();
        let programs = resources.config().shaders.clone();
        for program in [&programs.single_colour, &programs.textured, &programs.phong] {
            assert!(resources.load_program(&mut device, program).is_ok());
        }
        assert_eq!(device.live_programs(), 3);
    }

    #[test]
    fn test_geometry_loader_can_be_replaced() {
        struct Triangle;
        impl GeometryLoader for Triangle {
            fn load_geometry_file(&self, _path: &str) -> Result<MeshData, GeometryError> {
                Ok(MeshData::from_flat(3, &[0.0; 9], &[0.0; 6], &[0.0; 9]))
            }
        }

        let resources = ResourceManager::default().with_geometry_loader(Triangle);
        assert_eq!(resources.load_geometry_file("anything.obj").unwrap().vertex_count(), 3);
    }
}
