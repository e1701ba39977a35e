//! Legacy GOCAD Model3d structural-model codec (`.ml`).
//!
//! The `.ml` interchange format is a single ASCII stream: a component
//! section declaring geological objects (`TSURF`), their member
//! surfaces (`TFACE`) and volumetric regions (`REGION`), terminated by
//! `END`, followed by one `GOCAD TSurf` section per geological object
//! carrying member surface meshes. Corners, contact lines and their
//! incidences travel as extension records (`CORNER`, `CONTACT`,
//! `CONTACTS`, `TFACE_IN`) that foreign readers may skip.
//!
//! Index lists follow the classic convention: 1-based ids in file
//! order, terminated by `0`, a duplicated id marking an *internal*
//! relation instead of a boundary. Records may reference entities
//! declared later in the file; everything is resolved in a second pass
//! once the component section is complete, and a reference that is
//! still dangling then is fatal.
//!
//! Reading is permissive: unknown or vendor records (`LAYER`,
//! `FAULT_BLOCK`, property headers) are skipped with a log message,
//! scoped to the read call. Writing is deterministic, ordered by entity
//! creation order, so repeated saves of one model are identical.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use crate::error::CodecError;
use crate::geology::{CollectionId, CollectionKind, FaultKind, HorizonKind};
use crate::model::{BlockId, CornerId, EntityId, LineId, StructuralModel, SurfaceId};

use super::gocad::{self, LineReader};

/// Feature token of a surface belonging to no geological object.
const UNCLASSIFIED: &str = "unclassified";

fn kind_of_feature(feature: &str) -> Option<CollectionKind> {
    match feature {
        "fault" => Some(CollectionKind::Fault(FaultKind::NoType)),
        "normal_fault" => Some(CollectionKind::Fault(FaultKind::Normal)),
        "reverse_fault" => Some(CollectionKind::Fault(FaultKind::Reverse)),
        "boundary" | "lease" => Some(CollectionKind::ModelBoundary),
        "top" => Some(CollectionKind::Horizon(HorizonKind::Conformal)),
        "none" => Some(CollectionKind::Horizon(HorizonKind::NoType)),
        "topographic" => Some(CollectionKind::Horizon(HorizonKind::Topography)),
        "intrusive" => Some(CollectionKind::Horizon(HorizonKind::Intrusion)),
        "unconformity" => Some(CollectionKind::Horizon(HorizonKind::NonConformal)),
        UNCLASSIFIED => None,
        other if other.contains("fault") => Some(CollectionKind::Fault(FaultKind::NoType)),
        other => {
            tracing::warn!(feature = other, "unknown geological feature, treated as horizon");
            Some(CollectionKind::Horizon(HorizonKind::NoType))
        }
    }
}

fn feature_of_kind(kind: CollectionKind) -> &'static str {
    match kind {
        CollectionKind::Fault(FaultKind::NoType) => "fault",
        CollectionKind::Fault(FaultKind::Normal) => "normal_fault",
        CollectionKind::Fault(FaultKind::Reverse) => "reverse_fault",
        CollectionKind::ModelBoundary => "boundary",
        CollectionKind::Horizon(HorizonKind::NoType) => "none",
        CollectionKind::Horizon(HorizonKind::Conformal) => "top",
        CollectionKind::Horizon(HorizonKind::NonConformal) => "unconformity",
        CollectionKind::Horizon(HorizonKind::Topography) => "topographic",
        CollectionKind::Horizon(HorizonKind::Intrusion) => "intrusive",
    }
}

// --- Reader ---

#[derive(Debug, Default)]
struct GroupRecord {
    name: String,
    feature: Option<String>,
    /// Surfaces declared under this object by `TFACE`, in file order.
    members: Vec<usize>,
}

/// A deferred index list, kept with the line it started on so a
/// dangling reference can point back at the file.
struct DeferredList<T> {
    owner: T,
    refs: Vec<usize>,
    line: usize,
}

struct MlReader<R> {
    reader: LineReader<R>,
    model: StructuralModel,
    groups: Vec<GroupRecord>,
    group_index: HashMap<String, usize>,
    corners: Vec<CornerId>,
    lines: Vec<LineId>,
    surfaces: Vec<SurfaceId>,
    regions: Vec<DeferredList<BlockId>>,
    contacts: Vec<DeferredList<LineId>>,
    surface_contacts: Vec<DeferredList<usize>>,
    extra_memberships: Vec<(usize, String, usize)>,
}

impl<R: BufRead> MlReader<R> {
    fn new(input: R) -> Self {
        Self {
            reader: LineReader::new(input),
            model: StructuralModel::default(),
            groups: Vec::new(),
            group_index: HashMap::new(),
            corners: Vec::new(),
            lines: Vec::new(),
            surfaces: Vec::new(),
            regions: Vec::new(),
            contacts: Vec::new(),
            surface_contacts: Vec::new(),
            extra_memberships: Vec::new(),
        }
    }

    fn read(mut self) -> Result<StructuralModel, CodecError> {
        self.read_preamble()?;
        self.read_components()?;
        self.read_meshes()?;
        self.resolve()?;
        Ok(self.model)
    }

    fn read_preamble(&mut self) -> Result<(), CodecError> {
        loop {
            let Some(line) = self.reader.next_line()? else {
                return Err(CodecError::parse(
                    self.reader.line_no(),
                    "cannot find a GOCAD Model3d section",
                ));
            };
            if line.starts_with("GOCAD Model3d") {
                gocad::check_revision(&line, "ml")?;
                break;
            }
        }
        let Some(header_line) = self.reader.next_content_line()? else {
            return Err(CodecError::parse(self.reader.line_no(), "truncated model header"));
        };
        let header = gocad::read_header(&mut self.reader, &header_line)?;
        self.model.set_name(header.name);
        Ok(())
    }

    /// First pass over the component section: allocate entities in file
    /// order and stash every index list for the resolution pass.
    fn read_components(&mut self) -> Result<(), CodecError> {
        while let Some(line) = self.reader.next_content_line()? {
            if gocad::skip_crs(&mut self.reader, &line)? {
                continue;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens[0] {
                "END" => return Ok(()),
                "TSURF" => {
                    let name = gocad::read_name(&tokens[1..]);
                    self.group(&name);
                }
                "TFACE" => self.process_tface(&tokens)?,
                "TFACE_IN" => {
                    if tokens.len() < 3 {
                        return Err(CodecError::parse(self.reader.line_no(), "truncated TFACE_IN record"));
                    }
                    let surface = gocad::parse_usize(tokens[1], self.reader.line_no())?;
                    let name = gocad::read_name(&tokens[2..]);
                    self.extra_memberships.push((surface, name, self.reader.line_no()));
                }
                "CORNER" => {
                    let name = gocad::read_name(&tokens[2.min(tokens.len())..]);
                    self.corners.push(self.model.add_corner(name));
                }
                "CONTACT" => {
                    let name = gocad::read_name(&tokens[2.min(tokens.len())..]);
                    let id = self.model.add_line(name);
                    self.lines.push(id);
                    let (refs, line_no) = self.read_index_list()?;
                    self.contacts.push(DeferredList { owner: id, refs, line: line_no });
                }
                "CONTACTS" => {
                    if tokens.len() < 2 {
                        return Err(CodecError::parse(self.reader.line_no(), "truncated CONTACTS record"));
                    }
                    let surface = gocad::parse_usize(tokens[1], self.reader.line_no())?;
                    let (refs, line_no) = self.read_index_list()?;
                    self.surface_contacts.push(DeferredList { owner: surface, refs, line: line_no });
                }
                "REGION" => self.process_region(&tokens)?,
                other => {
                    tracing::warn!(line = self.reader.line_no(), record = other, "skipping unknown record");
                }
            }
        }
        Err(CodecError::parse(
            self.reader.line_no(),
            "cannot find the end of the component section",
        ))
    }

    fn group(&mut self, name: &str) -> usize {
        if let Some(&index) = self.group_index.get(name) {
            return index;
        }
        self.groups.push(GroupRecord {
            name: name.to_string(),
            ..GroupRecord::default()
        });
        let index = self.groups.len() - 1;
        self.group_index.insert(name.to_string(), index);
        index
    }

    fn process_tface(&mut self, tokens: &[&str]) -> Result<(), CodecError> {
        if tokens.len() < 4 {
            return Err(CodecError::parse(self.reader.line_no(), "truncated TFACE record"));
        }
        let feature = tokens[2].to_string();
        let name = gocad::read_name(&tokens[3..]);
        // Member surfaces take the geological object's display name.
        let id = self.model.add_surface(name.clone());
        let index = self.surfaces.len();
        self.surfaces.push(id);
        let group = self.group(&name);
        let record = &mut self.groups[group];
        record.feature.get_or_insert(feature);
        record.members.push(index);
        Ok(())
    }

    fn process_region(&mut self, tokens: &[&str]) -> Result<(), CodecError> {
        if tokens.len() < 3 {
            return Err(CodecError::parse(self.reader.line_no(), "truncated REGION record"));
        }
        let name = gocad::read_name(&tokens[2..]);
        if name == "Universe" {
            // The universe is the complement of the model, not a block.
            self.read_index_list()?;
            return Ok(());
        }
        let id = self.model.add_block(name);
        let (refs, line_no) = self.read_index_list()?;
        self.regions.push(DeferredList { owner: id, refs, line: line_no });
        Ok(())
    }

    /// Reads continuation lines of whitespace-separated ids up to the
    /// `0` terminator. Signs encode orientation and are dropped.
    fn read_index_list(&mut self) -> Result<(Vec<usize>, usize), CodecError> {
        let start = self.reader.line_no();
        let mut refs = Vec::new();
        while let Some(line) = self.reader.next_content_line()? {
            for token in line.split_whitespace() {
                let value = gocad::parse_i64(token, self.reader.line_no())?;
                if value == 0 {
                    return Ok((refs, start + 1));
                }
                refs.push(value.unsigned_abs().try_into().unwrap_or(usize::MAX));
            }
        }
        Err(CodecError::parse(self.reader.line_no(), "unterminated index list"))
    }

    /// Reads the TSurf sections following the component section and
    /// attaches patch meshes to the member surfaces of each object.
    fn read_meshes(&mut self) -> Result<(), CodecError> {
        for group in &self.groups {
            let Some(tsurf) = gocad::read_tsurf(&mut self.reader)? else {
                tracing::warn!(object = group.name, "missing TSurf section, meshes left empty");
                return Ok(());
            };
            if tsurf.nb_tfaces() != group.members.len() {
                tracing::warn!(
                    object = group.name,
                    patches = tsurf.nb_tfaces(),
                    members = group.members.len(),
                    "patch count does not match member count"
                );
            }
            for (patch, &member) in (0..tsurf.nb_tfaces()).zip(&group.members) {
                let mut mesh = tsurf.extract_tface(patch);
                mesh.set_name(&group.name);
                let id = self.surfaces[member];
                self.model.surface_mut(id)?.mesh = mesh;
            }
        }
        Ok(())
    }

    /// Second pass: every stored index list is resolved against the
    /// now-complete entity tables.
    fn resolve(&mut self) -> Result<(), CodecError> {
        // Geological objects become collections, in declaration order.
        let mut collections: HashMap<String, CollectionId> = HashMap::new();
        for group in &self.groups {
            let Some(feature) = group.feature.as_deref() else {
                tracing::warn!(object = group.name, "TSURF without TFACE, ignored");
                continue;
            };
            let Some(kind) = kind_of_feature(feature) else {
                continue;
            };
            let collection = self.model.add_collection(kind, group.name.clone());
            collections.insert(group.name.clone(), collection);
            for &member in &group.members {
                self.model
                    .add_in_collection(collection, self.surfaces[member].into())?;
            }
        }
        for (surface, name, line) in std::mem::take(&mut self.extra_memberships) {
            let surface = resolve(&self.surfaces, surface, "surface", line)?;
            let Some(&collection) = collections.get(&name) else {
                return Err(CodecError::Reference {
                    line,
                    reference: format!("geological object \"{name}\""),
                });
            };
            self.model.add_in_collection(collection, surface.into())?;
        }

        for contact in std::mem::take(&mut self.contacts) {
            for reference in contact.refs {
                let corner = resolve(&self.corners, reference, "corner", contact.line)?;
                self.model.add_corner_line_boundary(corner, contact.owner);
            }
        }
        for list in std::mem::take(&mut self.surface_contacts) {
            let surface = resolve(&self.surfaces, list.owner, "surface", list.line)?;
            split_boundary_internal(&list.refs, |reference, internal| {
                let line = resolve(&self.lines, reference, "contact", list.line)?;
                if internal {
                    self.model.add_line_surface_internal(line, surface)?;
                } else {
                    self.model.add_line_surface_boundary(line, surface);
                }
                Ok(())
            })?;
        }
        for region in std::mem::take(&mut self.regions) {
            split_boundary_internal(&region.refs, |reference, internal| {
                let surface = resolve(&self.surfaces, reference, "surface", region.line)?;
                if internal {
                    self.model.add_surface_block_internal(surface, region.owner)?;
                } else {
                    self.model.add_surface_block_boundary(surface, region.owner);
                }
                Ok(())
            })?;
        }
        Ok(())
    }
}

fn resolve<T: Copy>(
    table: &[T],
    reference: usize,
    label: &str,
    line: usize,
) -> Result<T, CodecError> {
    reference
        .checked_sub(1)
        .and_then(|index| table.get(index).copied())
        .ok_or_else(|| CodecError::Reference {
            line,
            reference: format!("{label} {reference}"),
        })
}

/// Walks a sorted index list, reporting a duplicated id as one internal
/// relation and a single id as a boundary relation.
fn split_boundary_internal(
    refs: &[usize],
    mut apply: impl FnMut(usize, bool) -> Result<(), CodecError>,
) -> Result<(), CodecError> {
    let mut sorted = refs.to_vec();
    sorted.sort_unstable();
    let mut i = 0;
    while i < sorted.len() {
        if i + 1 < sorted.len() && sorted[i] == sorted[i + 1] {
            apply(sorted[i], true)?;
            i += 2;
        } else {
            apply(sorted[i], false)?;
            i += 1;
        }
    }
    Ok(())
}

/// Reads a structural model from GOCAD Model3d text.
///
/// # Errors
///
/// `Parse` on malformed or truncated records, `Version` on an
/// unsupported revision, `Reference` on an index that resolves to no
/// declared entity, `Model` if the relations violate a model invariant.
pub fn read_from(input: impl BufRead) -> Result<StructuralModel, CodecError> {
    MlReader::new(input).read()
}

// --- Writer ---

struct FileIds {
    corners: HashMap<CornerId, usize>,
    lines: HashMap<LineId, usize>,
    surfaces: HashMap<SurfaceId, usize>,
}

impl FileIds {
    fn of(model: &StructuralModel) -> Self {
        Self {
            corners: model.corners().enumerate().map(|(i, (id, _))| (id, i + 1)).collect(),
            lines: model.lines().enumerate().map(|(i, (id, _))| (id, i + 1)).collect(),
            surfaces: model.surfaces().enumerate().map(|(i, (id, _))| (id, i + 1)).collect(),
        }
    }
}

/// One TSURF record of the output: a geological object, or a synthetic
/// group wrapping a surface that belongs to no collection.
struct OutputGroup {
    name: String,
    feature: &'static str,
    /// Surfaces whose first membership is this group; their meshes are
    /// written in this group's TSurf section.
    tfaces: Vec<SurfaceId>,
}

fn output_groups(model: &StructuralModel) -> Vec<OutputGroup> {
    let mut groups: Vec<OutputGroup> = model
        .collections()
        .iter()
        .map(|(_, data)| OutputGroup {
            name: data.name.clone(),
            feature: feature_of_kind(data.kind()),
            tfaces: Vec::new(),
        })
        .collect();
    let order: HashMap<CollectionId, usize> = model
        .collections()
        .iter()
        .enumerate()
        .map(|(index, (id, _))| (id, index))
        .collect();
    for (id, data) in model.surfaces() {
        match model.collections_of(id.into()).first() {
            Some(first) => groups[order[first]].tfaces.push(id),
            None => groups.push(OutputGroup {
                name: data.name.clone(),
                feature: UNCLASSIFIED,
                tfaces: vec![id],
            }),
        }
    }
    groups
}

fn write_index_list(out: &mut (impl Write + ?Sized), refs: &[usize]) -> Result<(), CodecError> {
    write!(out, " ")?;
    for (index, reference) in refs.iter().enumerate() {
        if index > 0 && index % 5 == 0 {
            writeln!(out)?;
            write!(out, " ")?;
        }
        write!(out, " {reference}")?;
    }
    writeln!(out, " 0")?;
    Ok(())
}

fn only<T: Copy>(kind: fn(EntityId) -> Option<T>, ids: &[EntityId]) -> Vec<T> {
    ids.iter().copied().filter_map(kind).collect()
}

fn as_line(id: EntityId) -> Option<LineId> {
    match id {
        EntityId::Line(line) => Some(line),
        _ => None,
    }
}

fn as_corner(id: EntityId) -> Option<CornerId> {
    match id {
        EntityId::Corner(corner) => Some(corner),
        _ => None,
    }
}

fn as_surface(id: EntityId) -> Option<SurfaceId> {
    match id {
        EntityId::Surface(surface) => Some(surface),
        _ => None,
    }
}

/// Writes a structural model as GOCAD Model3d text.
///
/// Output is deterministic: entities appear in creation order, index
/// lists are sorted by the reader anyway, and repeated saves of one
/// model produce identical bytes.
///
/// # Errors
///
/// `Io` if the underlying writer fails.
pub fn write_to(out: &mut (impl Write + ?Sized), model: &StructuralModel) -> Result<(), CodecError> {
    let ids = FileIds::of(model);
    let groups = output_groups(model);

    writeln!(out, "GOCAD Model3d 1")?;
    gocad::write_header(out, model.name())?;

    for group in &groups {
        writeln!(out, "TSURF {}", group.name)?;
    }
    // TFACE ids are positional: the n-th record declares surface n.
    for (index, (id, _)) in model.surfaces().enumerate() {
        let memberships = model.collections_of(id.into());
        let (feature, name) = match memberships.first() {
            Some(&first) => {
                let data = model.collection(first)?;
                (feature_of_kind(data.kind()), data.name.as_str())
            }
            None => (UNCLASSIFIED, model.surface(id)?.name.as_str()),
        };
        writeln!(out, "TFACE {} {} {}", index + 1, feature, name)?;
        for &extra in memberships.iter().skip(1) {
            let data = model.collection(extra)?;
            writeln!(out, "TFACE_IN {} {}", index + 1, data.name)?;
        }
    }
    for (index, (_, data)) in model.corners().enumerate() {
        writeln!(out, "CORNER {} {}", index + 1, data.name)?;
    }
    for (index, (id, data)) in model.lines().enumerate() {
        writeln!(out, "CONTACT {} {}", index + 1, data.name)?;
        let corners = only(as_corner, model.relationships().boundaries_of(id.into()));
        let refs: Vec<usize> = corners.iter().map(|c| ids.corners[c]).collect();
        write_index_list(out, &refs)?;
    }
    for (index, (id, _)) in model.surfaces().enumerate() {
        let bounds = only(as_line, model.relationships().boundaries_of(id.into()));
        let internals = only(as_line, model.relationships().internals_of(id.into()));
        if bounds.is_empty() && internals.is_empty() {
            continue;
        }
        let mut refs: Vec<usize> = bounds.iter().map(|l| ids.lines[l]).collect();
        for line in &internals {
            // A duplicated id marks the contact as internal.
            refs.push(ids.lines[line]);
            refs.push(ids.lines[line]);
        }
        writeln!(out, "CONTACTS {}", index + 1)?;
        write_index_list(out, &refs)?;
    }

    let region_base = model.nb_surfaces() + 1;
    let universe: Vec<usize> = {
        let mut seen = Vec::new();
        for (_, data) in model.collections().iter() {
            if data.kind() == CollectionKind::ModelBoundary {
                for surface in only(as_surface, data.members()) {
                    let reference = ids.surfaces[&surface];
                    if !seen.contains(&reference) {
                        seen.push(reference);
                    }
                }
            }
        }
        seen
    };
    writeln!(out, "REGION {region_base} Universe")?;
    write_index_list(out, &universe)?;
    for (index, (id, data)) in model.blocks().enumerate() {
        writeln!(out, "REGION {} {}", region_base + index + 1, data.name)?;
        let bounds = only(as_surface, model.relationships().boundaries_of(id.into()));
        let internals = only(as_surface, model.relationships().internals_of(id.into()));
        let mut refs: Vec<usize> = bounds.iter().map(|s| ids.surfaces[s]).collect();
        for surface in &internals {
            refs.push(ids.surfaces[surface]);
            refs.push(ids.surfaces[surface]);
        }
        write_index_list(out, &refs)?;
    }
    writeln!(out, "END")?;

    for group in &groups {
        writeln!(out, "GOCAD TSurf 1")?;
        gocad::write_header(out, &group.name)?;
        writeln!(out, "GEOLOGICAL_FEATURE {}", group.name)?;
        writeln!(out, "GEOLOGICAL_TYPE {}", group.feature)?;
        let mut offset = 1;
        for &surface in &group.tfaces {
            writeln!(out, "TFACE")?;
            offset = gocad::write_surface_records(out, &model.surface(surface)?.mesh, offset)?;
        }
        writeln!(out, "END")?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::mesh::TriangulatedSurface;

    fn small_mesh(z: f64) -> TriangulatedSurface {
        let mut mesh = TriangulatedSurface::new();
        mesh.create_point(Point3::new(0.0, 0.0, z));
        mesh.create_point(Point3::new(1.0, 0.0, z));
        mesh.create_point(Point3::new(0.0, 1.0, z));
        mesh.create_triangle([0, 1, 2]);
        mesh
    }

    fn sample_model() -> StructuralModel {
        let mut model = StructuralModel::new("basin");
        let c0 = model.add_corner("c0");
        let c1 = model.add_corner("c1");
        let l0 = model.add_line("l0");
        let l1 = model.add_line("l1");
        let s0 = model.add_surface_with_mesh("f1", small_mesh(0.0));
        let s1 = model.add_surface_with_mesh("top", small_mesh(1.0));
        let s2 = model.add_surface("loose");
        let b0 = model.add_block("basin b_2");

        model.add_corner_line_boundary(c0, l0);
        model.add_corner_line_boundary(c1, l0);
        model.add_line_surface_boundary(l0, s0);
        model.add_line_surface_internal(l1, s1).unwrap();
        model.add_surface_block_boundary(s1, b0);
        model.add_surface_block_internal(s0, b0).unwrap();

        let fault = model.add_fault("f1", FaultKind::Normal);
        let boundary = model.add_model_boundary("top");
        model.add_in_collection(fault, s0.into()).unwrap();
        model.add_in_collection(boundary, s1.into()).unwrap();
        // s0 belongs to two collections, carried by TFACE_IN.
        model.add_in_collection(boundary, s0.into()).unwrap();
        model
    }

    #[test]
    fn round_trip_preserves_counts_and_relations() {
        let model = sample_model();
        let mut buffer = Vec::new();
        write_to(&mut buffer, &model).unwrap();
        let reloaded = read_from(buffer.as_slice()).unwrap();
        reloaded.verify_integrity().unwrap();

        assert_eq!(reloaded.name(), "basin");
        assert_eq!(reloaded.nb_corners(), 2);
        assert_eq!(reloaded.nb_lines(), 2);
        assert_eq!(reloaded.nb_surfaces(), 3);
        assert_eq!(reloaded.nb_blocks(), 1);
        assert_eq!(reloaded.nb_faults(), 1);
        assert_eq!(reloaded.nb_model_boundaries(), 1);
        assert_eq!(reloaded.nb_horizons(), 0);

        let (block, data) = reloaded.blocks().next().unwrap();
        assert_eq!(data.name, "basin b_2");
        assert_eq!(reloaded.nb_block_internals(block), 1);
        assert_eq!(reloaded.relationships().boundaries_of(block.into()).len(), 1);

        let surfaces: Vec<_> = reloaded.surfaces().collect();
        assert_eq!(reloaded.nb_surface_internals(surfaces[1].0), 1);
        // Multi-collection membership survives via TFACE_IN.
        assert_eq!(reloaded.collections_of(surfaces[0].0.into()).len(), 2);
        // The member surface keeps the object's mesh and name.
        assert_eq!(surfaces[0].1.mesh.nb_vertices(), 3);
        assert_eq!(surfaces[2].1.mesh.nb_vertices(), 0);

        let (line, _) = reloaded.lines().next().unwrap();
        assert_eq!(reloaded.relationships().boundaries_of(line.into()).len(), 2);
    }

    #[test]
    fn writes_are_deterministic() {
        let model = sample_model();
        let mut first = Vec::new();
        let mut second = Vec::new();
        write_to(&mut first, &model).unwrap();
        write_to(&mut second, &model).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn forward_references_resolve() {
        // The region and contact lists reference surfaces and corners
        // declared later in the component section.
        let text = "GOCAD Model3d 1\nHEADER {\nname: fwd\n}\n\
            REGION 5 deep\n  1 1 2 0\n\
            CONTACT 1 rim\n  1 0\n\
            TSURF wall\n\
            TFACE 1 fault wall\n\
            TFACE 2 fault wall\n\
            CORNER 1 pin\n\
            END\n\
            GOCAD TSurf 1\nHEADER {\nname: wall\n}\nTFACE\nTFACE\nEND\n";
        let model = read_from(text.as_bytes()).unwrap();
        assert_eq!(model.nb_surfaces(), 2);
        assert_eq!(model.nb_blocks(), 1);
        assert_eq!(model.nb_faults(), 1);
        let (block, _) = model.blocks().next().unwrap();
        assert_eq!(model.nb_block_internals(block), 1);
        assert_eq!(model.relationships().boundaries_of(block.into()).len(), 1);
        let (line, _) = model.lines().next().unwrap();
        assert_eq!(model.relationships().boundaries_of(line.into()).len(), 1);
    }

    #[test]
    fn dangling_region_reference_is_fatal() {
        let text = "GOCAD Model3d 1\nHEADER {\nname: bad\n}\n\
            TSURF wall\nTFACE 1 fault wall\n\
            REGION 2 deep\n  1 7 0\nEND\n";
        let err = read_from(text.as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::Reference { .. }));
    }

    #[test]
    fn unknown_records_are_skipped() {
        let text = "GOCAD Model3d 1\nHEADER {\nname: tolerant\n}\n\
            TSURF wall\nTFACE 1 boundary wall\n\
            LAYER age_1\n  56 0\n\
            FAULT_BLOCK fb\n  57 0\n\
            END\n";
        let model = read_from(text.as_bytes()).unwrap();
        assert_eq!(model.nb_surfaces(), 1);
        assert_eq!(model.nb_model_boundaries(), 1);
    }

    #[test]
    fn universe_region_is_not_a_block() {
        let text = "GOCAD Model3d 1\nHEADER {\nname: u\n}\n\
            TSURF wall\nTFACE 1 boundary wall\n\
            REGION 2 Universe\n  1 0\nEND\n";
        let model = read_from(text.as_bytes()).unwrap();
        assert_eq!(model.nb_blocks(), 0);
    }

    #[test]
    fn unsupported_revision_is_rejected() {
        let err = read_from("GOCAD Model3d 3\nHEADER {\nname: x\n}\nEND\n".as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::Version { format: "ml", .. }));
    }

    #[test]
    fn missing_model_section_is_a_parse_error() {
        let err = read_from("GOCAD TSurf 1\nEND\n".as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::Parse { .. }));
    }
}
