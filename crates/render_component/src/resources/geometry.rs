//! Geometry collaborator and Wavefront OBJ loader
//!
//! Meshes are returned unindexed: every face corner becomes its own entry in
//! the position/uv/normal arrays, ready to be drawn with `draw_arrays`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced while loading geometry
#[derive(Error, Debug)]
pub enum GeometryError {
    /// IO error while opening or reading a file
    #[error("IO error reading {path}: {source}")]
    Io {
        /// File that failed
        path: String,
        /// Underlying error
        source: std::io::Error,
    },
    /// Malformed statement
    #[error("Parse error on line {line}: {message}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },
    /// Structurally invalid file
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// CPU-side geometry: one entry per drawn vertex
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Local-space positions
    pub positions: Vec<[f32; 3]>,
    /// Texture coordinates
    pub uvs: Vec<[f32; 2]>,
    /// Local-space normals
    pub normals: Vec<[f32; 3]>,
}

impl MeshData {
    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Build from flat arrays (3 floats per position/normal, 2 per uv).
    /// Every array is truncated to `vertex_count` entries.
    pub fn from_flat(vertex_count: usize, positions: &[f32], uvs: &[f32], normals: &[f32]) -> Self {
        Self {
            positions: positions.chunks_exact(3).take(vertex_count).map(|c| [c[0], c[1], c[2]]).collect(),
            uvs: uvs.chunks_exact(2).take(vertex_count).map(|c| [c[0], c[1]]).collect(),
            normals: normals.chunks_exact(3).take(vertex_count).map(|c| [c[0], c[1], c[2]]).collect(),
        }
    }
}

/// Loads geometry files by path
pub trait GeometryLoader {
    /// Read positions, uvs and normals from a geometry file
    fn load_geometry_file(&self, path: &str) -> Result<MeshData, GeometryError>;
}

/// OBJ file loader for 3D models
#[derive(Debug, Clone, Default)]
pub struct ObjLoader {
    assets_dir: Option<PathBuf>,
}

impl ObjLoader {
    /// Loader resolving relative paths against `assets_dir` when the path
    /// does not exist as given
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: Some(assets_dir.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let direct = Path::new(path);
        match &self.assets_dir {
            Some(dir) if !direct.exists() => dir.join(path),
            _ => direct.to_path_buf(),
        }
    }

    /// Parse OBJ text. Polygons are fan-triangulated; missing uvs default to
    /// `[0, 0]` and missing normals to `[0, 1, 0]`.
    pub fn parse<R: BufRead>(reader: R) -> Result<MeshData, GeometryError> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();
        let mut mesh = MeshData::default();

        for (index, line) in reader.lines().enumerate() {
            let line_number = index + 1;
            let line = line.map_err(|source| GeometryError::Io {
                path: "<reader>".to_string(),
                source,
            })?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts[0] {
                "v" => positions.push(parse_floats::<3>(&parts, line_number, "vertex")?),
                "vn" => normals.push(parse_floats::<3>(&parts, line_number, "normal")?),
                "vt" => tex_coords.push(parse_floats::<2>(&parts, line_number, "tex coord")?),
                "f" => {
                    if parts.len() < 4 {
                        return Err(GeometryError::ParseError {
                            line: line_number,
                            message: "face needs at least 3 vertices".to_string(),
                        });
                    }

                    let mut corners = Vec::with_capacity(parts.len() - 1);
                    for vertex_data in &parts[1..] {
                        let mut fields = vertex_data.split('/');
                        let pos_idx = fields
                            .next()
                            .and_then(|s| resolve_index(s, positions.len()))
                            .ok_or_else(|| GeometryError::ParseError {
                                line: line_number,
                                message: format!("invalid position index '{vertex_data}'"),
                            })?;
                        let tex_idx = fields.next().and_then(|s| resolve_index(s, tex_coords.len()));
                        let normal_idx = fields.next().and_then(|s| resolve_index(s, normals.len()));

                        let position = *positions.get(pos_idx).ok_or_else(|| {
                            GeometryError::InvalidFormat(format!(
                                "position index out of bounds on line {line_number}"
                            ))
                        })?;
                        let tex_coord = tex_idx.and_then(|i| tex_coords.get(i)).copied().unwrap_or([0.0, 0.0]);
                        let normal = normal_idx.and_then(|i| normals.get(i)).copied().unwrap_or([0.0, 1.0, 0.0]);
                        corners.push((position, tex_coord, normal));
                    }

                    for i in 1..(corners.len() - 1) {
                        for corner in [corners[0], corners[i], corners[i + 1]] {
                            mesh.positions.push(corner.0);
                            mesh.uvs.push(corner.1);
                            mesh.normals.push(corner.2);
                        }
                    }
                }
                _ => {
                    // Groups, materials and smoothing are not needed for rendering
                }
            }
        }

        if mesh.positions.is_empty() {
            return Err(GeometryError::InvalidFormat("No faces found in OBJ file".to_string()));
        }

        Ok(mesh)
    }
}

impl GeometryLoader for ObjLoader {
    fn load_geometry_file(&self, path: &str) -> Result<MeshData, GeometryError> {
        let resolved = self.resolve(path);
        let file = File::open(&resolved).map_err(|source| GeometryError::Io {
            path: resolved.display().to_string(),
            source,
        })?;
        let mesh = Self::parse(BufReader::new(file))?;
        log::debug!("Loaded {} vertices from {}", mesh.vertex_count(), resolved.display());
        Ok(mesh)
    }
}

fn parse_floats<const N: usize>(parts: &[&str], line: usize, what: &str) -> Result<[f32; N], GeometryError> {
    if parts.len() < N + 1 {
        return Err(GeometryError::ParseError {
            line,
            message: format!("{what} needs {N} components"),
        });
    }
    let mut out = [0.0; N];
    for (slot, text) in out.iter_mut().zip(&parts[1..=N]) {
        *slot = text.parse().map_err(|_| GeometryError::ParseError {
            line,
            message: format!("invalid {what} component '{text}'"),
        })?;
    }
    Ok(out)
}

/// OBJ indices are 1-based; negative values count back from the end.
fn resolve_index(text: &str, len: usize) -> Option<usize> {
    let value: i64 = text.parse().ok()?;
    match value {
        0 => None,
        v if v > 0 => usize::try_from(v - 1).ok(),
        v => len.checked_sub(usize::try_from(-v).ok()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const QUAD: &str = "\
# unit quad
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_quad_is_fan_triangulated() {
        let mesh = ObjLoader::parse(Cursor::new(QUAD)).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.uvs.len(), 6);
        assert_eq!(mesh.normals.len(), 6);
        assert_eq!(mesh.positions[0], [-1.0, -1.0, 0.0]);
        assert_eq!(mesh.positions[3], [-1.0, -1.0, 0.0]);
        assert_eq!(mesh.positions[5], [-1.0, 1.0, 0.0]);
        assert_eq!(mesh.uvs[2], [1.0, 1.0]);
        assert_eq!(mesh.normals[4], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_missing_attributes_and_negative_indices() {
        let mesh = ObjLoader::parse(Cursor::new("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n")).unwrap();
        assert_eq!(mesh.positions, vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert_eq!(mesh.uvs[0], [0.0, 0.0]);
        assert_eq!(mesh.normals[0], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        assert!(matches!(
            ObjLoader::parse(Cursor::new("v 0 zero 0\n")),
            Err(GeometryError::ParseError { line: 1, .. })
        ));
        assert!(matches!(
            ObjLoader::parse(Cursor::new("v 0 0 0\nf 1 2 3\n")),
            Err(GeometryError::InvalidFormat(_))
        ));
        assert!(matches!(
            ObjLoader::parse(Cursor::new("v 0 0 0\n")),
            Err(GeometryError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_reports_io_error() {
        let loader = ObjLoader::new("does/not/exist");
        assert!(matches!(
            loader.load_geometry_file("nothing.obj"),
            Err(GeometryError::Io { .. })
        ));
    }

    #[test]
    fn test_from_flat_truncates_to_vertex_count() {
        let mesh = MeshData::from_flat(1, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[0.5, 0.5], &[0.0, 0.0, 1.0]);
        assert_eq!(mesh.positions, vec![[1.0, 2.0, 3.0]]);
        assert_eq!(mesh.uvs, vec![[0.5, 0.5]]);
    }
}
