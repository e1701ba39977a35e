//! Shared plumbing for the GOCAD ASCII family (`.ml`, `.ts`).
//!
//! GOCAD files are line-oriented: a keyword, whitespace-separated
//! tokens, and free-text names that may span the rest of the line.
//! Everything here is permissive by construction: unknown records are
//! skipped with a log message instead of failing the read.

use std::io::BufRead;

use crate::error::CodecError;
use crate::math::Point3;
use crate::mesh::TriangulatedSurface;

/// Wraps a reader and tracks line numbers for error reporting.
pub(crate) struct LineReader<R> {
    inner: R,
    line_no: usize,
}

impl<R: BufRead> LineReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner, line_no: 0 }
    }

    /// 1-based number of the last line returned.
    pub(crate) fn line_no(&self) -> usize {
        self.line_no
    }

    /// Returns the next line, or `None` at end of input.
    pub(crate) fn next_line(&mut self) -> Result<Option<String>, CodecError> {
        let mut buffer = String::new();
        if self.inner.read_line(&mut buffer)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        while buffer.ends_with('\n') || buffer.ends_with('\r') {
            buffer.pop();
        }
        Ok(Some(buffer))
    }

    /// Returns the next line with content, skipping blank ones.
    pub(crate) fn next_content_line(&mut self) -> Result<Option<String>, CodecError> {
        while let Some(line) = self.next_line()? {
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }
}

pub(crate) fn parse_usize(token: &str, line: usize) -> Result<usize, CodecError> {
    token
        .parse()
        .map_err(|_| CodecError::parse(line, format!("expected an index, found \"{token}\"")))
}

pub(crate) fn parse_i64(token: &str, line: usize) -> Result<i64, CodecError> {
    token
        .parse()
        .map_err(|_| CodecError::parse(line, format!("expected an integer, found \"{token}\"")))
}

pub(crate) fn parse_f64(token: &str, line: usize) -> Result<f64, CodecError> {
    token
        .parse()
        .map_err(|_| CodecError::parse(line, format!("expected a number, found \"{token}\"")))
}

/// Joins name tokens back into one display name, dropping quotes.
pub(crate) fn read_name(tokens: &[&str]) -> String {
    tokens.join(" ").replace('"', "")
}

/// The `HEADER { ... }` block common to every GOCAD section.
#[derive(Debug, Default)]
pub(crate) struct HeaderData {
    pub(crate) name: String,
}

/// Reads a `HEADER { ... }` block; `opening` is the line holding the
/// `HEADER` keyword.
pub(crate) fn read_header<R: BufRead>(
    reader: &mut LineReader<R>,
    opening: &str,
) -> Result<HeaderData, CodecError> {
    if !opening.trim_start().starts_with("HEADER") {
        return Err(CodecError::parse(
            reader.line_no(),
            format!("expected HEADER, found \"{opening}\""),
        ));
    }
    let mut header = HeaderData::default();
    while let Some(line) = reader.next_line()? {
        let trimmed = line.trim();
        if trimmed.starts_with('}') {
            return Ok(header);
        }
        if let Some(rest) = trimmed.strip_prefix("name:") {
            header.name = rest.trim().replace('"', "");
        }
    }
    Err(CodecError::parse(
        reader.line_no(),
        "unterminated HEADER section",
    ))
}

pub(crate) fn write_header(out: &mut (impl std::io::Write + ?Sized), name: &str) -> Result<(), CodecError> {
    writeln!(out, "HEADER {{")?;
    writeln!(out, "name: {name}")?;
    writeln!(out, "}}")?;
    Ok(())
}

/// Skips a `GOCAD_ORIGINAL_COORDINATE_SYSTEM` block if `line` opens one.
/// Returns `true` if the block was consumed.
pub(crate) fn skip_crs<R: BufRead>(
    reader: &mut LineReader<R>,
    line: &str,
) -> Result<bool, CodecError> {
    if !line.starts_with("GOCAD_ORIGINAL_COORDINATE_SYSTEM") {
        return Ok(false);
    }
    while let Some(next) = reader.next_line()? {
        if next.starts_with("END_ORIGINAL_COORDINATE_SYSTEM") {
            return Ok(true);
        }
    }
    Err(CodecError::parse(
        reader.line_no(),
        "unterminated coordinate system section",
    ))
}

/// One parsed `GOCAD TSurf` section.
///
/// Vertices and triangles are shared across the section; `TFACE`
/// markers split it into patches, recorded as offset tables the way
/// vertex ids keep counting across patches in the file.
#[derive(Debug)]
pub(crate) struct TSurfData {
    pub(crate) header: HeaderData,
    pub(crate) points: Vec<Point3>,
    pub(crate) triangles: Vec<[usize; 3]>,
    tface_vertex_offsets: Vec<usize>,
    tface_triangle_offsets: Vec<usize>,
    /// First vertex id seen in the section, usually 1.
    offset_start: Option<usize>,
    opened: bool,
}

impl TSurfData {
    fn new(header: HeaderData) -> Self {
        Self {
            header,
            points: Vec::new(),
            triangles: Vec::new(),
            tface_vertex_offsets: vec![0],
            tface_triangle_offsets: vec![0],
            offset_start: None,
            opened: false,
        }
    }

    /// Number of `TFACE` patches in the section.
    pub(crate) fn nb_tfaces(&self) -> usize {
        self.tface_vertex_offsets.len() - 1
    }

    /// Extracts patch `index` as a standalone mesh with local indices.
    pub(crate) fn extract_tface(&self, index: usize) -> TriangulatedSurface {
        let mut mesh = TriangulatedSurface::new();
        mesh.set_name(&self.header.name);
        let vertex_start = self.tface_vertex_offsets[index];
        let vertex_end = self.tface_vertex_offsets[index + 1];
        for point in &self.points[vertex_start..vertex_end] {
            mesh.create_point(*point);
        }
        let triangle_start = self.tface_triangle_offsets[index];
        let triangle_end = self.tface_triangle_offsets[index + 1];
        for triangle in &self.triangles[triangle_start..triangle_end] {
            mesh.create_triangle([
                triangle[0] - vertex_start,
                triangle[1] - vertex_start,
                triangle[2] - vertex_start,
            ]);
        }
        mesh
    }

    /// Merges the whole section into one mesh.
    pub(crate) fn merge(&self) -> TriangulatedSurface {
        let mut mesh = TriangulatedSurface::new();
        mesh.set_name(&self.header.name);
        for point in &self.points {
            mesh.create_point(*point);
        }
        for triangle in &self.triangles {
            mesh.create_triangle(*triangle);
        }
        mesh
    }
}

/// Scans forward to the next `GOCAD TSurf` section and reads it fully,
/// or returns `None` if no further section exists.
///
/// # Errors
///
/// `Version` if the section revision is not 1, `Parse` on malformed
/// records or a missing `END`.
pub(crate) fn read_tsurf<R: BufRead>(
    reader: &mut LineReader<R>,
) -> Result<Option<TSurfData>, CodecError> {
    let Some(opening) = goto_tsurf(reader)? else {
        return Ok(None);
    };
    check_revision(&opening, "ts")?;
    let Some(header_line) = reader.next_content_line()? else {
        return Err(CodecError::parse(reader.line_no(), "truncated TSurf section"));
    };
    let header = read_header(reader, &header_line)?;
    let mut tsurf = TSurfData::new(header);
    while let Some(line) = reader.next_content_line()? {
        if skip_crs(reader, &line)? {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens[0] {
            "VRTX" | "PVRTX" => {
                if tokens.len() < 5 {
                    return Err(CodecError::parse(reader.line_no(), "truncated vertex record"));
                }
                if tsurf.offset_start.is_none() {
                    tsurf.offset_start = Some(parse_usize(tokens[1], reader.line_no())?);
                }
                tsurf.points.push(Point3::new(
                    parse_f64(tokens[2], reader.line_no())?,
                    parse_f64(tokens[3], reader.line_no())?,
                    parse_f64(tokens[4], reader.line_no())?,
                ));
            }
            "ATOM" | "PATOM" => {
                if tokens.len() < 3 {
                    return Err(CodecError::parse(reader.line_no(), "truncated atom record"));
                }
                let offset = tsurf.offset_start.unwrap_or(1);
                let reference = parse_usize(tokens[2], reader.line_no())?;
                let index = reference.checked_sub(offset).filter(|&i| i < tsurf.points.len());
                let Some(index) = index else {
                    return Err(CodecError::Reference {
                        line: reader.line_no(),
                        reference: format!("vertex {reference}"),
                    });
                };
                let point = tsurf.points[index];
                tsurf.points.push(point);
            }
            "TRGL" => {
                if tokens.len() < 4 {
                    return Err(CodecError::parse(reader.line_no(), "truncated triangle record"));
                }
                let offset = tsurf.offset_start.unwrap_or(1);
                let mut triangle = [0_usize; 3];
                for (slot, token) in triangle.iter_mut().zip(&tokens[1..4]) {
                    let reference = parse_usize(token, reader.line_no())?;
                    let index = reference
                        .checked_sub(offset)
                        .filter(|&i| i < tsurf.points.len());
                    let Some(index) = index else {
                        return Err(CodecError::Reference {
                            line: reader.line_no(),
                            reference: format!("vertex {reference}"),
                        });
                    };
                    *slot = index;
                }
                tsurf.triangles.push(triangle);
            }
            "TFACE" => {
                // A patch boundary, except the very first marker which
                // merely opens the section body.
                if tsurf.opened {
                    tsurf.tface_vertex_offsets.push(tsurf.points.len());
                    tsurf.tface_triangle_offsets.push(tsurf.triangles.len());
                }
                tsurf.opened = true;
            }
            "END" => {
                tsurf.tface_vertex_offsets.push(tsurf.points.len());
                tsurf.tface_triangle_offsets.push(tsurf.triangles.len());
                return Ok(Some(tsurf));
            }
            // BSTONE/BORDER markers and property records carry geometry
            // bookkeeping this model does not retain.
            _ => tracing::debug!(line = reader.line_no(), record = tokens[0], "skipping record"),
        }
    }
    Err(CodecError::parse(
        reader.line_no(),
        "unterminated TSurf section",
    ))
}

fn goto_tsurf<R: BufRead>(reader: &mut LineReader<R>) -> Result<Option<String>, CodecError> {
    while let Some(line) = reader.next_line()? {
        if line.starts_with("GOCAD TSurf") {
            return Ok(Some(line));
        }
    }
    Ok(None)
}

/// Checks the revision token of a `GOCAD <Kind> <revision>` line.
pub(crate) fn check_revision(opening: &str, format: &'static str) -> Result<(), CodecError> {
    let revision = opening.split_whitespace().nth(2).unwrap_or("");
    if revision == "1" {
        return Ok(());
    }
    Err(CodecError::Version {
        format,
        found: revision.to_string(),
        supported: "1",
    })
}

/// Writes one mesh as `VRTX`/`TRGL` records. Vertex ids are global to
/// the enclosing section: they start at `offset` and the next free id
/// is returned, so patches of one section keep counting.
pub(crate) fn write_surface_records(
    out: &mut (impl std::io::Write + ?Sized),
    mesh: &TriangulatedSurface,
    offset: usize,
) -> Result<usize, CodecError> {
    for (index, point) in mesh.points().enumerate() {
        writeln!(out, "VRTX {} {} {} {}", offset + index, point.x, point.y, point.z)?;
    }
    for triangle in mesh.triangles() {
        writeln!(
            out,
            "TRGL {} {} {}",
            offset + triangle[0],
            offset + triangle[1],
            offset + triangle[2]
        )?;
    }
    Ok(offset + mesh.nb_vertices())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SECTION: &str = "GOCAD TSurf 1\n\
        HEADER {\n\
        name: patchy\n\
        }\n\
        GOCAD_ORIGINAL_COORDINATE_SYSTEM\n\
        ZPOSITIVE Elevation\n\
        END_ORIGINAL_COORDINATE_SYSTEM\n\
        TFACE\n\
        VRTX 1 0 0 0\n\
        VRTX 2 1 0 0\n\
        VRTX 3 0 1 0\n\
        TRGL 1 2 3\n\
        TFACE\n\
        VRTX 4 0 0 1\n\
        VRTX 5 1 0 1\n\
        VRTX 6 0 1 1\n\
        TRGL 4 5 6\n\
        END\n";

    #[test]
    fn reads_patched_section() {
        let mut reader = LineReader::new(SECTION.as_bytes());
        let tsurf = read_tsurf(&mut reader).unwrap().unwrap();
        assert_eq!(tsurf.header.name, "patchy");
        assert_eq!(tsurf.nb_tfaces(), 2);
        assert_eq!(tsurf.points.len(), 6);
        assert_eq!(tsurf.triangles.len(), 2);

        let second = tsurf.extract_tface(1);
        assert_eq!(second.nb_vertices(), 3);
        assert_eq!(second.triangle(0), [0, 1, 2]);
        assert_relative_eq!(second.point(0).z, 1.0);

        let merged = tsurf.merge();
        assert_eq!(merged.nb_vertices(), 6);
        assert_eq!(merged.triangle(1), [3, 4, 5]);
    }

    #[test]
    fn atom_aliases_an_existing_vertex() {
        let text = "GOCAD TSurf 1\nHEADER {\nname: a\n}\nTFACE\n\
            VRTX 1 1 2 3\nATOM 2 1\nVRTX 3 0 0 0\nTRGL 1 2 3\nEND\n";
        let mut reader = LineReader::new(text.as_bytes());
        let tsurf = read_tsurf(&mut reader).unwrap().unwrap();
        assert_eq!(tsurf.points.len(), 3);
        assert_relative_eq!(tsurf.points[1].y, 2.0);
    }

    #[test]
    fn dangling_triangle_vertex_is_a_reference_error() {
        let text = "GOCAD TSurf 1\nHEADER {\nname: a\n}\nTFACE\n\
            VRTX 1 0 0 0\nVRTX 2 1 0 0\nTRGL 1 2 9\nEND\n";
        let mut reader = LineReader::new(text.as_bytes());
        let err = read_tsurf(&mut reader).unwrap_err();
        assert!(matches!(err, CodecError::Reference { .. }));
    }

    #[test]
    fn unsupported_revision() {
        let text = "GOCAD TSurf 7\nHEADER {\nname: a\n}\nEND\n";
        let mut reader = LineReader::new(text.as_bytes());
        let err = read_tsurf(&mut reader).unwrap_err();
        assert!(matches!(err, CodecError::Version { .. }));
    }

    #[test]
    fn missing_section_yields_none() {
        let mut reader = LineReader::new("nothing here\n".as_bytes());
        assert!(read_tsurf(&mut reader).unwrap().is_none());
    }
}
