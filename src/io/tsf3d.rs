//! Canonical surface snapshot codec (`.og_tsf3d`).
//!
//! A self-describing serialization of one [`TriangulatedSurface`]:
//! read(write(x)) is structurally identical to x. The document is
//! versioned JSON; nothing is reinterpreted on read beyond checking
//! that triangle indices address existing vertices.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::math::Point3;
use crate::mesh::TriangulatedSurface;

pub(crate) const VERSION: u32 = 1;

/// Serialized form of a triangulated surface.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct MeshSnapshot {
    name: String,
    points: Vec<[f64; 3]>,
    triangles: Vec<[usize; 3]>,
}

impl MeshSnapshot {
    pub(crate) fn capture(mesh: &TriangulatedSurface) -> Self {
        Self {
            name: mesh.name().to_string(),
            points: mesh.points().map(|p| [p.x, p.y, p.z]).collect(),
            triangles: mesh.triangles().collect(),
        }
    }

    /// Rebuilds the mesh, validating every triangle reference.
    pub(crate) fn restore(self) -> Result<TriangulatedSurface, CodecError> {
        let mut mesh = TriangulatedSurface::new();
        mesh.set_name(self.name);
        for [x, y, z] in self.points {
            mesh.create_point(Point3::new(x, y, z));
        }
        for triangle in self.triangles {
            if let Some(&vertex) = triangle.iter().find(|&&v| v >= mesh.nb_vertices()) {
                return Err(CodecError::Reference {
                    line: 0,
                    reference: format!("vertex {vertex}"),
                });
            }
            mesh.create_triangle(triangle);
        }
        Ok(mesh)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SurfaceDocument {
    version: u32,
    surface: MeshSnapshot,
}

/// Extracts and checks the `version` field of a snapshot document.
pub(crate) fn check_version(
    value: &serde_json::Value,
    format: &'static str,
) -> Result<(), CodecError> {
    let found = value.get("version").and_then(serde_json::Value::as_u64);
    match found {
        Some(v) if v == u64::from(VERSION) => Ok(()),
        Some(v) => Err(CodecError::Version {
            format,
            found: v.to_string(),
            supported: "1",
        }),
        None => Err(CodecError::parse(0, "snapshot is missing a version field")),
    }
}

pub(crate) fn parse_value(input: impl Read) -> Result<serde_json::Value, CodecError> {
    serde_json::from_reader(input).map_err(|err| CodecError::Parse {
        line: err.line(),
        message: err.to_string(),
    })
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
) -> Result<T, CodecError> {
    serde_json::from_value(value).map_err(|err| CodecError::Parse {
        line: err.line(),
        message: err.to_string(),
    })
}

/// Reads a canonical surface snapshot.
///
/// # Errors
///
/// `Parse` on malformed JSON, `Version` on an unsupported revision,
/// `Reference` on a dangling vertex reference.
pub fn read_from(input: impl Read) -> Result<TriangulatedSurface, CodecError> {
    let value = parse_value(input)?;
    check_version(&value, "og_tsf3d")?;
    let document: SurfaceDocument = decode(value)?;
    document.surface.restore()
}

/// Writes a canonical surface snapshot.
///
/// # Errors
///
/// `Io` if the underlying writer fails.
pub fn write_to(out: &mut (impl Write + ?Sized), mesh: &TriangulatedSurface) -> Result<(), CodecError> {
    let document = SurfaceDocument {
        version: VERSION,
        surface: MeshSnapshot::capture(mesh),
    };
    serde_json::to_writer(&mut *out, &document)
        .map_err(|err| CodecError::Io(std::io::Error::other(err)))?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn triangle_mesh() -> TriangulatedSurface {
        let mut mesh = TriangulatedSurface::new();
        mesh.set_name("one triangle");
        mesh.create_point(Point3::new(0.0, 0.0, 0.0));
        mesh.create_point(Point3::new(1.0, 0.0, 0.0));
        mesh.create_point(Point3::new(0.0, 1.0, 0.5));
        mesh.create_triangle([0, 1, 2]);
        mesh
    }

    #[test]
    fn round_trip_is_identical() {
        let mesh = triangle_mesh();
        let mut buffer = Vec::new();
        write_to(&mut buffer, &mesh).unwrap();
        let reloaded = read_from(buffer.as_slice()).unwrap();
        assert_eq!(reloaded, mesh);
    }

    #[test]
    fn future_revision_is_rejected() {
        let text = r#"{"version": 2, "surface": {"name": "", "points": [], "triangles": []}}"#;
        let err = read_from(text.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Version {
                format: "og_tsf3d",
                ..
            }
        ));
    }

    #[test]
    fn dangling_triangle_reference_is_rejected() {
        let text = r#"{"version": 1, "surface": {"name": "bad", "points": [[0,0,0]], "triangles": [[0,0,7]]}}"#;
        let err = read_from(text.as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::Reference { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = read_from("{not json".as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::Parse { .. }));
    }
}
