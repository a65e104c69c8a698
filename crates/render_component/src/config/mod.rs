//! Configuration system
//!
//! Asset locations, shader programs per renderable variant, default lighting
//! and logging are described by [`RenderComponentConfig`], loadable from TOML
//! or RON.

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;
        
        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }
    
    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };
        
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    
    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
    
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
    
    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values that parse but cannot be used
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Vertex + fragment stage pair identifying a GPU program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderProgramConfig {
    /// Vertex stage source path
    pub vertex: String,
    /// Fragment stage source path
    pub fragment: String,
}

impl ShaderProgramConfig {
    /// Create a new shader program configuration
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    fn validate(&self, variant: &str) -> Result<(), ConfigError> {
        if self.vertex.is_empty() || self.fragment.is_empty() {
            return Err(ConfigError::Invalid(format!("{variant} shader paths cannot be empty")));
        }
        Ok(())
    }
}

/// Programs used by each renderable variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderPrograms {
    /// Clip-space single colour meshes
    pub single_colour: ShaderProgramConfig,
    /// Per-vertex colour meshes
    pub per_vertex_colour: ShaderProgramConfig,
    /// Unlit textured geometry (unit polygon, textured OBJ)
    pub textured: ShaderProgramConfig,
    /// Directional-light shaded OBJ meshes
    pub directional_light: ShaderProgramConfig,
    /// Phong point-light shaded OBJ meshes
    pub phong: ShaderProgramConfig,
}

impl Default for ShaderPrograms {
    fn default() -> Self {
        Self {
            single_colour: ShaderProgramConfig::new("clip_space.vert", "single_colour.frag"),
            per_vertex_colour: ShaderProgramConfig::new("per_vertex_colour.vert", "per_vertex_colour.frag"),
            textured: ShaderProgramConfig::new("textured.vert", "textured.frag"),
            directional_light: ShaderProgramConfig::new("directional_light.vert", "directional_light.frag"),
            phong: ShaderProgramConfig::new("point_light.vert", "point_light.frag"),
        }
    }
}

impl ShaderPrograms {
    /// Validate that every program names both stages
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.single_colour.validate("single_colour")?;
        self.per_vertex_colour.validate("per_vertex_colour")?;
        self.textured.validate("textured")?;
        self.directional_light.validate("directional_light")?;
        self.phong.validate("phong")
    }
}

/// Asset locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Base directory for geometry and texture files
    pub assets_dir: String,
    /// Directories searched, in order, for shader sources
    pub shader_dirs: Vec<String>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            assets_dir: "resources".to_string(),
            shader_dirs: vec![
                "shaders/".to_string(),
                "resources/shaders/".to_string(),
                "../shaders/".to_string(),
            ],
        }
    }
}

impl AssetConfig {
    /// Set assets directory
    #[must_use]
    pub fn with_assets_dir(mut self, dir: impl Into<String>) -> Self {
        self.assets_dir = dir.into();
        self
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Default light and material parameters for lit renderables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// World-space direction of the directional light
    pub light_direction: [f32; 3],
    /// World-space position of the point light
    pub light_position: [f32; 3],
    /// Light colour shared by both light kinds
    pub light_colour: [f32; 3],
    /// Point light power
    pub light_power: f32,
    /// Phong ambient, diffuse, specular coefficients and shininess
    pub material: [f32; 4],
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            light_direction: [1.0, 0.0, 0.0],
            light_position: [4.0, 4.0, 4.0],
            light_colour: [1.0, 1.0, 1.0],
            light_power: 75.0,
            material: [0.1, 1.0, 0.3, 5.0],
        }
    }
}

impl LightingConfig {
    /// Reject lights that cannot illuminate anything
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.light_direction.iter().all(|c| *c == 0.0) {
            return Err(ConfigError::Invalid("light direction cannot be zero".to_string()));
        }
        if self.light_power < 0.0 || self.material.iter().any(|c| *c < 0.0) {
            return Err(ConfigError::Invalid("light power and material coefficients must be non-negative".to_string()));
        }
        Ok(())
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderComponentConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Asset locations
    pub assets: AssetConfig,
    /// Shader programs per variant
    pub shaders: ShaderPrograms,
    /// Default lighting for lit variants
    pub lighting: LightingConfig,
}

impl RenderComponentConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("log level cannot be empty".to_string()));
        }
        self.shaders.validate()?;
        self.lighting.validate()
    }
}

impl Config for RenderComponentConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RenderComponentConfig = toml::from_str(
            r#"
            [logging]
            level = "debug"

            [shaders.phong]
            vertex = "custom.vert"
            fragment = "custom.frag"
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.shaders.phong.vertex, "custom.vert");
        assert_eq!(config.shaders.textured, ShaderPrograms::default().textured);
        assert_eq!(config.assets, AssetConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ron_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("render_component_cfg_{}.ron", std::process::id()));
        let path = path.to_string_lossy().to_string();
        let config = RenderComponentConfig {
            assets: AssetConfig::default().with_assets_dir("data"),
            ..Default::default()
        };

        config.save_to_file(&path).unwrap();
        let loaded = RenderComponentConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsupported_extension_and_invalid_values() {
        assert!(matches!(
            RenderComponentConfig::default().save_to_file("config.json"),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        let mut config = RenderComponentConfig::default();
        config.shaders.single_colour.fragment.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = RenderComponentConfig::default();
        config.lighting.light_direction = [0.0; 3];
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
