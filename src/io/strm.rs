//! Canonical structural-model snapshot codec (`.og_strm`).
//!
//! A self-describing, versioned JSON serialization of the full
//! in-memory graph: entity name tables per kind, surface mesh payloads,
//! boundary and internal relation pairs, and collections with their
//! members. Entities are addressed by (kind, creation index), so
//! read(write(m)) reproduces every entity, relation and membership of m
//! without semantic reinterpretation.

use std::collections::HashMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::geology::CollectionKind;
use crate::model::{EntityId, EntityKind, StructuralModel};

use super::tsf3d::{self, MeshSnapshot};

const VERSION: u32 = 1;

/// (kind, creation index) address of an entity within the document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct EntityRef {
    kind: EntityKind,
    index: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct RelationSnapshot {
    from: EntityRef,
    to: EntityRef,
}

#[derive(Debug, Serialize, Deserialize)]
struct SurfaceSnapshot {
    name: String,
    mesh: MeshSnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
struct CollectionSnapshot {
    kind: CollectionKind,
    name: String,
    members: Vec<EntityRef>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModelDocument {
    version: u32,
    name: String,
    corners: Vec<String>,
    lines: Vec<String>,
    surfaces: Vec<SurfaceSnapshot>,
    blocks: Vec<String>,
    /// Boundary incidences, `from` bounding `to`.
    boundaries: Vec<RelationSnapshot>,
    /// Internal embeddings, `from` internal to `to`.
    internals: Vec<RelationSnapshot>,
    collections: Vec<CollectionSnapshot>,
}

fn capture(model: &StructuralModel) -> ModelDocument {
    let mut refs: HashMap<EntityId, EntityRef> = HashMap::new();
    let mut counters: HashMap<EntityKind, usize> = HashMap::new();
    for id in model.entities() {
        let counter = counters.entry(id.kind()).or_default();
        refs.insert(
            id,
            EntityRef {
                kind: id.kind(),
                index: *counter,
            },
        );
        *counter += 1;
    }

    let mut boundaries = Vec::new();
    let mut internals = Vec::new();
    for upper in model.entities() {
        for &lower in model.relationships().boundaries_of(upper) {
            boundaries.push(RelationSnapshot {
                from: refs[&lower],
                to: refs[&upper],
            });
        }
    }
    for host in model.entities() {
        for &inner in model.relationships().internals_of(host) {
            internals.push(RelationSnapshot {
                from: refs[&inner],
                to: refs[&host],
            });
        }
    }

    ModelDocument {
        version: VERSION,
        name: model.name().to_string(),
        corners: model.corners().map(|(_, data)| data.name.clone()).collect(),
        lines: model.lines().map(|(_, data)| data.name.clone()).collect(),
        surfaces: model
            .surfaces()
            .map(|(_, data)| SurfaceSnapshot {
                name: data.name.clone(),
                mesh: MeshSnapshot::capture(&data.mesh),
            })
            .collect(),
        blocks: model.blocks().map(|(_, data)| data.name.clone()).collect(),
        boundaries,
        internals,
        collections: model
            .collections()
            .iter()
            .map(|(_, data)| CollectionSnapshot {
                kind: data.kind(),
                name: data.name.clone(),
                members: data.members().iter().map(|m| refs[m]).collect(),
            })
            .collect(),
    }
}

fn restore(document: ModelDocument) -> Result<StructuralModel, CodecError> {
    let mut model = StructuralModel::new(document.name);

    // First pass: allocate every entity in document order.
    let corners: Vec<_> = document
        .corners
        .into_iter()
        .map(|name| model.add_corner(name))
        .collect();
    let lines: Vec<_> = document
        .lines
        .into_iter()
        .map(|name| model.add_line(name))
        .collect();
    let surfaces: Vec<_> = document
        .surfaces
        .into_iter()
        .map(|snapshot| {
            let mesh = snapshot.mesh.restore()?;
            Ok(model.add_surface_with_mesh(snapshot.name, mesh))
        })
        .collect::<Result<_, CodecError>>()?;
    let blocks: Vec<_> = document
        .blocks
        .into_iter()
        .map(|name| model.add_block(name))
        .collect();

    let resolve = |entity: EntityRef| -> Result<EntityId, CodecError> {
        let id = match entity.kind {
            EntityKind::Corner => corners.get(entity.index).copied().map(EntityId::Corner),
            EntityKind::Line => lines.get(entity.index).copied().map(EntityId::Line),
            EntityKind::Surface => surfaces.get(entity.index).copied().map(EntityId::Surface),
            EntityKind::Block => blocks.get(entity.index).copied().map(EntityId::Block),
        };
        id.ok_or_else(|| CodecError::Reference {
            line: 0,
            reference: format!("{} {}", entity.kind.label(), entity.index),
        })
    };

    // Second pass: resolve relations and memberships.
    for relation in document.boundaries {
        model.add_boundary_relation(resolve(relation.from)?, resolve(relation.to)?);
    }
    for relation in document.internals {
        model.add_internal_relation(resolve(relation.from)?, resolve(relation.to)?)?;
    }
    for snapshot in document.collections {
        let collection = model.add_collection(snapshot.kind, snapshot.name);
        for member in snapshot.members {
            model.add_in_collection(collection, resolve(member)?)?;
        }
    }
    Ok(model)
}

/// Reads a canonical structural-model snapshot.
///
/// # Errors
///
/// `Parse` on malformed JSON, `Version` on an unsupported revision,
/// `Reference` on a dangling entity reference, `Model` if the relations
/// violate a model invariant.
pub fn read_from(input: impl Read) -> Result<StructuralModel, CodecError> {
    let value = tsf3d::parse_value(input)?;
    tsf3d::check_version(&value, "og_strm")?;
    let document: ModelDocument = tsf3d::decode(value)?;
    restore(document)
}

/// Writes a canonical structural-model snapshot.
///
/// # Errors
///
/// `Io` if the underlying writer fails.
pub fn write_to(out: &mut (impl Write + ?Sized), model: &StructuralModel) -> Result<(), CodecError> {
    let document = capture(model);
    serde_json::to_writer(&mut *out, &document)
        .map_err(|err| CodecError::Io(std::io::Error::other(err)))?;
    writeln!(out)?;
    Ok(())
}
