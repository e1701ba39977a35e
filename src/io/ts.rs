//! Legacy GOCAD TSurf surface codec (`.ts`).
//!
//! A `.ts` file holds one or more `GOCAD TSurf` ASCII sections; reading
//! merges them into a single [`TriangulatedSurface`], the way the format
//! is used to ship one logical surface split across sections. Writing
//! emits a single section. Attribute/property records are tolerated and
//! skipped; names and record ordering may be normalized on round-trip,
//! vertex and triangle sets are preserved.

use std::io::{BufRead, Write};

use crate::error::CodecError;
use crate::mesh::TriangulatedSurface;

use super::gocad::{self, LineReader};

/// Reads a triangulated surface from GOCAD TSurf text.
///
/// # Errors
///
/// `Parse` if the input holds no TSurf section or a record is
/// malformed, `Version` on an unsupported revision, `Reference` on a
/// dangling vertex reference.
pub fn read_from(input: impl BufRead) -> Result<TriangulatedSurface, CodecError> {
    let mut reader = LineReader::new(input);
    let mut mesh = TriangulatedSurface::new();
    let mut sections = 0_usize;
    while let Some(tsurf) = gocad::read_tsurf(&mut reader)? {
        if sections == 0 {
            mesh.set_name(&tsurf.header.name);
        }
        let offset = mesh.nb_vertices();
        for point in &tsurf.points {
            mesh.create_point(*point);
        }
        for triangle in &tsurf.triangles {
            mesh.create_triangle([
                triangle[0] + offset,
                triangle[1] + offset,
                triangle[2] + offset,
            ]);
        }
        sections += 1;
    }
    if sections == 0 {
        return Err(CodecError::parse(
            reader.line_no(),
            "no GOCAD TSurf section in input",
        ));
    }
    tracing::debug!(sections, vertices = mesh.nb_vertices(), "read ts surface");
    Ok(mesh)
}

/// Writes a triangulated surface as one GOCAD TSurf section.
///
/// # Errors
///
/// `Io` if the underlying writer fails.
pub fn write_to(out: &mut (impl Write + ?Sized), mesh: &TriangulatedSurface) -> Result<(), CodecError> {
    writeln!(out, "GOCAD TSurf 1")?;
    gocad::write_header(out, mesh.name())?;
    writeln!(out, "TFACE")?;
    gocad::write_surface_records(out, mesh, 1)?;
    writeln!(out, "END")?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use approx::assert_relative_eq;

    fn strip(n: usize) -> TriangulatedSurface {
        // A triangle strip with n triangles over n + 2 vertices.
        let mut mesh = TriangulatedSurface::new();
        mesh.set_name("strip");
        for i in 0..n + 2 {
            #[allow(clippy::cast_precision_loss)]
            mesh.create_point(Point3::new((i / 2) as f64, (i % 2) as f64, 0.0));
        }
        for i in 0..n {
            mesh.create_triangle([i, i + 1, i + 2]);
        }
        mesh
    }

    #[test]
    fn round_trip_preserves_counts_and_geometry() {
        let mesh = strip(7);
        let mut buffer = Vec::new();
        write_to(&mut buffer, &mesh).unwrap();
        let reloaded = read_from(buffer.as_slice()).unwrap();
        assert_eq!(reloaded.name(), "strip");
        assert_eq!(reloaded.nb_vertices(), 9);
        assert_eq!(reloaded.nb_triangles(), 7);
        for i in 0..9 {
            assert_relative_eq!(reloaded.point(i).x, mesh.point(i).x);
            assert_relative_eq!(reloaded.point(i).y, mesh.point(i).y);
        }
        assert_eq!(reloaded.triangle(6), [6, 7, 8]);
    }

    #[test]
    fn multiple_sections_merge_with_offsets() {
        let mesh = strip(1);
        let mut buffer = Vec::new();
        write_to(&mut buffer, &mesh).unwrap();
        write_to(&mut buffer, &mesh).unwrap();
        let merged = read_from(buffer.as_slice()).unwrap();
        assert_eq!(merged.nb_vertices(), 6);
        assert_eq!(merged.nb_triangles(), 2);
        assert_eq!(merged.triangle(1), [3, 4, 5]);
    }

    #[test]
    fn empty_input_is_a_parse_error() {
        let err = read_from("# nothing\n".as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::Parse { .. }));
    }
}
