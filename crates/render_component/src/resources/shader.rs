//! Shader-program collaborator
//!
//! Sources are cached by name; programs are not. Each renderable owns and
//! deletes the program it receives, so every request links a fresh one.

use crate::config::ShaderProgramConfig;
use crate::gpu::{DeviceError, GraphicsDevice, ProgramHandle};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced while loading programs
#[derive(Error, Debug)]
pub enum ShaderError {
    /// No file or built-in source matches the name
    #[error("Shader source not found: {0}")]
    NotFound(String),
    /// IO error while reading a source file
    #[error("IO error reading {path}: {source}")]
    Io {
        /// File that failed
        path: String,
        /// Underlying error
        source: std::io::Error,
    },
    /// Compilation or linking failed
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
}

/// Loads and links GPU programs by source path
pub trait ShaderLoader {
    /// Compile the two stages and link them into a new program
    fn load_program(
        &mut self,
        device: &mut dyn GraphicsDevice,
        vertex_path: &str,
        fragment_path: &str,
    ) -> Result<ProgramHandle, ShaderError>;
}

const BUILTIN_SOURCES: &[(&str, &str)] = &[
    ("clip_space.vert", include_str!("../../shaders/clip_space.vert")),
    ("single_colour.frag", include_str!("../../shaders/single_colour.frag")),
    ("per_vertex_colour.vert", include_str!("../../shaders/per_vertex_colour.vert")),
    ("per_vertex_colour.frag", include_str!("../../shaders/per_vertex_colour.frag")),
    ("textured.vert", include_str!("../../shaders/textured.vert")),
    ("textured.frag", include_str!("../../shaders/textured.frag")),
    ("directional_light.vert", include_str!("../../shaders/directional_light.vert")),
    ("directional_light.frag", include_str!("../../shaders/directional_light.frag")),
    ("point_light.vert", include_str!("../../shaders/point_light.vert")),
    ("point_light.frag", include_str!("../../shaders/point_light.frag")),
];

/// Shader loader reading sources from disk with built-in fallbacks
#[derive(Debug, Default)]
pub struct ShaderManager {
    search_dirs: Vec<PathBuf>,
    sources: HashMap<String, String>,
}

impl ShaderManager {
    /// Create a manager searching `search_dirs` in order
    pub fn new<I, P>(search_dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_dirs: search_dirs.into_iter().map(Into::into).collect(),
            sources: HashMap::new(),
        }
    }

    /// Register (or override) a source under a name
    pub fn register_source(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(name.into(), source.into());
    }

    /// Number of cached sources
    pub fn cached_sources(&self) -> usize {
        self.sources.len()
    }

    /// Load a program from a [`ShaderProgramConfig`]
    pub fn load_configured(
        &mut self,
        device: &mut dyn GraphicsDevice,
        program: &ShaderProgramConfig,
    ) -> Result<ProgramHandle, ShaderError> {
        self.load_program(device, &program.vertex, &program.fragment)
    }

    /// Resolve a source: cache, then the name as a path, then each search
    /// directory, then the built-in sources.
    fn source(&mut self, name: &str) -> Result<String, ShaderError> {
        if let Some(source) = self.sources.get(name) {
            return Ok(source.clone());
        }

        let candidates = std::iter::once(PathBuf::from(name))
            .chain(self.search_dirs.iter().map(|dir| dir.join(name)));
        for candidate in candidates {
            if candidate.is_file() {
                let source = std::fs::read_to_string(&candidate).map_err(|source| ShaderError::Io {
                    path: candidate.display().to_string(),
                    source,
                })?;
                log::debug!("Read shader source {}", candidate.display());
                self.sources.insert(name.to_string(), source.clone());
                return Ok(source);
            }
        }

        let file_name = Path::new(name)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or(name);
        let builtin = BUILTIN_SOURCES
            .iter()
            .find(|(builtin, _)| *builtin == file_name)
            .map(|(_, source)| (*source).to_string())
            .ok_or_else(|| ShaderError::NotFound(name.to_string()))?;
        self.sources.insert(name.to_string(), builtin.clone());
        Ok(builtin)
    }
}

impl ShaderLoader for ShaderManager {
    fn load_program(
        &mut self,
        device: &mut dyn GraphicsDevice,
        vertex_path: &str,
        fragment_path: &str,
    ) -> Result<ProgramHandle, ShaderError> {
        let vertex = self.source(vertex_path)?;
        let fragment = self.source(fragment_path)?;
        let program = device.create_program(&vertex, &fragment)?;
        log::debug!("Linked program {:?} from {} + {}", program, vertex_path, fragment_path);
        Ok(program)
    }
}
