//! Attribute and uniform names shared with the built-in shaders

/// Local-space position, 3 floats
pub const VERTEX_POSITION: &str = "vertex_position";
/// Texture coordinate, 2 floats
pub const VERTEX_UV: &str = "vertex_uv";
/// Local-space normal, 3 floats
pub const VERTEX_NORMAL: &str = "vertex_normal";
/// RGB colour, 3 floats
pub const VERTEX_COLOUR: &str = "vertex_colour";

/// Projection * view * model
pub const MVP: &str = "mvp";
/// Local-to-world matrix
pub const MODEL: &str = "model";
/// World-to-camera matrix
pub const VIEW: &str = "view";
/// Sampler bound to texture unit 0
pub const TEXTURE_SAMPLER: &str = "texture_sampler";
/// Directional light direction in world space
pub const LIGHT_DIRECTION_WORLD: &str = "light_direction_world";
/// Point light position in world space
pub const LIGHT_POSITION_WORLD: &str = "light_position_world";
/// Light RGB colour
pub const LIGHT_COLOUR: &str = "light_colour";
/// Point light power
pub const LIGHT_POWER: &str = "light_power";
/// Phong ambient coefficient
pub const MATERIAL_AMBIENT: &str = "material_ambient";
/// Phong diffuse coefficient
pub const MATERIAL_DIFFUSE: &str = "material_diffuse";
/// Phong specular coefficient
pub const MATERIAL_SPECULAR: &str = "material_specular";
/// Phong shininess exponent
pub const MATERIAL_SHININESS: &str = "material_shininess";

/// Texture unit every textured variant samples from
pub const TEXTURE_UNIT: u32 = 0;
