pub mod block;
pub mod corner;
pub mod entity;
pub mod line;
pub mod relationships;
pub mod surface;

pub use block::{BlockData, BlockId};
pub use corner::{CornerData, CornerId};
pub use entity::{EntityId, EntityKind};
pub use line::{LineData, LineId};
pub use relationships::RelationshipGraph;
pub use surface::{SurfaceData, SurfaceId};

use slotmap::SlotMap;

use crate::error::ModelError;
use crate::geology::{CollectionData, CollectionId, CollectionKind, CollectionStore, FaultKind, HorizonKind};

/// The aggregate root of the engine: entity store, relationship graph
/// and geological collection layer behind one facade.
///
/// The model is the sole owner of its entities. Relations and
/// collections hold identifiers (generational indices), never entity
/// copies, so no entity outlives its model and identifiers are never
/// reused within a model's lifetime, even after removal.
///
/// All mutation requires `&mut self`; concurrent readers are safe
/// whenever no writer is active, which the borrow checker enforces
/// within a process. Independent models share no state and may be
/// processed on independent threads.
#[derive(Debug, Default)]
pub struct StructuralModel {
    name: String,
    corners: SlotMap<CornerId, CornerData>,
    lines: SlotMap<LineId, LineData>,
    surfaces: SlotMap<SurfaceId, SurfaceData>,
    blocks: SlotMap<BlockId, BlockData>,
    relationships: RelationshipGraph,
    collections: CollectionStore,
}

impl StructuralModel {
    /// Creates a new, empty model with a display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the display name of the model.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the display name of the model.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // --- Corner operations ---

    /// Inserts a corner and returns its ID.
    pub fn add_corner(&mut self, name: impl Into<String>) -> CornerId {
        self.corners.insert(CornerData::new(name))
    }

    /// Returns a reference to the corner data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn corner(&self, id: CornerId) -> Result<&CornerData, ModelError> {
        self.corners
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound("corner".into()))
    }

    /// Returns a mutable reference to the corner data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn corner_mut(&mut self, id: CornerId) -> Result<&mut CornerData, ModelError> {
        self.corners
            .get_mut(id)
            .ok_or_else(|| ModelError::EntityNotFound("corner".into()))
    }

    /// Number of corners.
    #[must_use]
    pub fn nb_corners(&self) -> usize {
        self.corners.len()
    }

    /// Iterates over all corners in creation order.
    pub fn corners(&self) -> impl Iterator<Item = (CornerId, &CornerData)> {
        self.corners.iter()
    }

    /// Removes a corner, cascading into relations and collections.
    pub fn remove_corner(&mut self, id: CornerId) {
        if self.corners.remove(id).is_some() {
            self.forget(id.into());
        }
    }

    // --- Line operations ---

    /// Inserts a line and returns its ID.
    pub fn add_line(&mut self, name: impl Into<String>) -> LineId {
        self.lines.insert(LineData::new(name))
    }

    /// Returns a reference to the line data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn line(&self, id: LineId) -> Result<&LineData, ModelError> {
        self.lines
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound("line".into()))
    }

    /// Returns a mutable reference to the line data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn line_mut(&mut self, id: LineId) -> Result<&mut LineData, ModelError> {
        self.lines
            .get_mut(id)
            .ok_or_else(|| ModelError::EntityNotFound("line".into()))
    }

    /// Number of lines.
    #[must_use]
    pub fn nb_lines(&self) -> usize {
        self.lines.len()
    }

    /// Iterates over all lines in creation order.
    pub fn lines(&self) -> impl Iterator<Item = (LineId, &LineData)> {
        self.lines.iter()
    }

    /// Removes a line, cascading into relations and collections.
    pub fn remove_line(&mut self, id: LineId) {
        if self.lines.remove(id).is_some() {
            self.forget(id.into());
        }
    }

    // --- Surface operations ---

    /// Inserts a surface and returns its ID.
    pub fn add_surface(&mut self, name: impl Into<String>) -> SurfaceId {
        self.surfaces.insert(SurfaceData::new(name))
    }

    /// Inserts a surface carrying a mesh payload and returns its ID.
    pub fn add_surface_with_mesh(
        &mut self,
        name: impl Into<String>,
        mesh: crate::mesh::TriangulatedSurface,
    ) -> SurfaceId {
        self.surfaces.insert(SurfaceData::with_mesh(name, mesh))
    }

    /// Returns a reference to the surface data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn surface(&self, id: SurfaceId) -> Result<&SurfaceData, ModelError> {
        self.surfaces
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound("surface".into()))
    }

    /// Returns a mutable reference to the surface data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn surface_mut(&mut self, id: SurfaceId) -> Result<&mut SurfaceData, ModelError> {
        self.surfaces
            .get_mut(id)
            .ok_or_else(|| ModelError::EntityNotFound("surface".into()))
    }

    /// Number of surfaces.
    #[must_use]
    pub fn nb_surfaces(&self) -> usize {
        self.surfaces.len()
    }

    /// Iterates over all surfaces in creation order.
    pub fn surfaces(&self) -> impl Iterator<Item = (SurfaceId, &SurfaceData)> {
        self.surfaces.iter()
    }

    /// Removes a surface, cascading into relations and collections.
    pub fn remove_surface(&mut self, id: SurfaceId) {
        if self.surfaces.remove(id).is_some() {
            self.forget(id.into());
        }
    }

    // --- Block operations ---

    /// Inserts a block and returns its ID.
    pub fn add_block(&mut self, name: impl Into<String>) -> BlockId {
        self.blocks.insert(BlockData::new(name))
    }

    /// Returns a reference to the block data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn block(&self, id: BlockId) -> Result<&BlockData, ModelError> {
        self.blocks
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound("block".into()))
    }

    /// Returns a mutable reference to the block data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn block_mut(&mut self, id: BlockId) -> Result<&mut BlockData, ModelError> {
        self.blocks
            .get_mut(id)
            .ok_or_else(|| ModelError::EntityNotFound("block".into()))
    }

    /// Number of blocks.
    #[must_use]
    pub fn nb_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Iterates over all blocks in creation order.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &BlockData)> {
        self.blocks.iter()
    }

    /// Removes a block, cascading into relations and collections.
    pub fn remove_block(&mut self, id: BlockId) {
        if self.blocks.remove(id).is_some() {
            self.forget(id.into());
        }
    }

    /// Returns `true` if `id` addresses a live entity of this model.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        match id {
            EntityId::Corner(c) => self.corners.contains_key(c),
            EntityId::Line(l) => self.lines.contains_key(l),
            EntityId::Surface(s) => self.surfaces.contains_key(s),
            EntityId::Block(b) => self.blocks.contains_key(b),
        }
    }

    /// Display name of any entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn entity_name(&self, id: EntityId) -> Result<&str, ModelError> {
        match id {
            EntityId::Corner(c) => Ok(&self.corner(c)?.name),
            EntityId::Line(l) => Ok(&self.line(l)?.name),
            EntityId::Surface(s) => Ok(&self.surface(s)?.name),
            EntityId::Block(b) => Ok(&self.block(b)?.name),
        }
    }

    // --- Relationship graph ---

    /// Read access to the relationship graph.
    #[must_use]
    pub fn relationships(&self) -> &RelationshipGraph {
        &self.relationships
    }

    /// Records that `corner` bounds `line`.
    pub fn add_corner_line_boundary(&mut self, corner: CornerId, line: LineId) {
        self.relationships.add_boundary(corner.into(), line.into());
    }

    /// Records that `line` bounds `surface`.
    pub fn add_line_surface_boundary(&mut self, line: LineId, surface: SurfaceId) {
        self.relationships.add_boundary(line.into(), surface.into());
    }

    /// Records that `surface` bounds `block`.
    pub fn add_surface_block_boundary(&mut self, surface: SurfaceId, block: BlockId) {
        self.relationships.add_boundary(surface.into(), block.into());
    }

    /// Records a boundary relation between two entities of any kinds.
    /// Codecs use this untyped entry point; prefer the typed helpers.
    pub fn add_boundary_relation(&mut self, lower: EntityId, upper: EntityId) {
        self.relationships.add_boundary(lower, upper);
    }

    /// Records an internal relation between two entities of any kinds.
    ///
    /// # Errors
    ///
    /// Returns an error if `inner` already has a distinct host or the
    /// relation would close a cycle.
    pub fn add_internal_relation(
        &mut self,
        inner: EntityId,
        host: EntityId,
    ) -> Result<(), ModelError> {
        self.relationships.add_internal(inner, host)
    }

    /// Enumerates every entity, kinds in dimension order, each kind in
    /// creation order. This is the canonical ordering writers use.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.corners
            .keys()
            .map(EntityId::Corner)
            .chain(self.lines.keys().map(EntityId::Line))
            .chain(self.surfaces.keys().map(EntityId::Surface))
            .chain(self.blocks.keys().map(EntityId::Block))
    }

    /// Records that `line` is internal to `surface`.
    ///
    /// # Errors
    ///
    /// Returns an error if `line` already has a distinct host.
    pub fn add_line_surface_internal(
        &mut self,
        line: LineId,
        surface: SurfaceId,
    ) -> Result<(), ModelError> {
        self.relationships.add_internal(line.into(), surface.into())
    }

    /// Records that `surface` is internal to `block`.
    ///
    /// # Errors
    ///
    /// Returns an error if `surface` already has a distinct host.
    pub fn add_surface_block_internal(
        &mut self,
        surface: SurfaceId,
        block: BlockId,
    ) -> Result<(), ModelError> {
        self.relationships.add_internal(surface.into(), block.into())
    }

    /// Number of entities internal to any host entity.
    #[must_use]
    pub fn nb_internals(&self, host: EntityId) -> usize {
        self.relationships.internal_count(host)
    }

    /// Number of entities internal to a block.
    #[must_use]
    pub fn nb_block_internals(&self, block: BlockId) -> usize {
        self.relationships.internal_count(block.into())
    }

    /// Number of entities internal to a surface.
    #[must_use]
    pub fn nb_surface_internals(&self, surface: SurfaceId) -> usize {
        self.relationships.internal_count(surface.into())
    }

    // --- Geological collections ---

    /// Read access to the collection store.
    #[must_use]
    pub fn collections(&self) -> &CollectionStore {
        &self.collections
    }

    /// Creates a fault collection and returns its ID.
    pub fn add_fault(&mut self, name: impl Into<String>, kind: FaultKind) -> CollectionId {
        self.collections
            .add_collection(CollectionKind::Fault(kind), name)
    }

    /// Creates a horizon collection and returns its ID.
    pub fn add_horizon(&mut self, name: impl Into<String>, kind: HorizonKind) -> CollectionId {
        self.collections
            .add_collection(CollectionKind::Horizon(kind), name)
    }

    /// Creates a model-boundary collection and returns its ID.
    pub fn add_model_boundary(&mut self, name: impl Into<String>) -> CollectionId {
        self.collections
            .add_collection(CollectionKind::ModelBoundary, name)
    }

    /// Creates a collection of any kind and returns its ID.
    pub fn add_collection(&mut self, kind: CollectionKind, name: impl Into<String>) -> CollectionId {
        self.collections.add_collection(kind, name)
    }

    /// Returns a reference to a collection, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not found in the model.
    pub fn collection(&self, id: CollectionId) -> Result<&CollectionData, ModelError> {
        self.collections.collection(id)
    }

    /// Adds `entity` to `collection`.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not found in the model.
    pub fn add_in_collection(
        &mut self,
        collection: CollectionId,
        entity: EntityId,
    ) -> Result<(), ModelError> {
        self.collections.add_member(collection, entity)
    }

    /// The collections referencing `entity`.
    #[must_use]
    pub fn collections_of(&self, entity: EntityId) -> &[CollectionId] {
        self.collections.collections_of(entity)
    }

    /// Number of fault collections.
    #[must_use]
    pub fn nb_faults(&self) -> usize {
        self.collections.nb_faults()
    }

    /// Number of horizon collections.
    #[must_use]
    pub fn nb_horizons(&self) -> usize {
        self.collections.nb_horizons()
    }

    /// Number of model-boundary collections.
    #[must_use]
    pub fn nb_model_boundaries(&self) -> usize {
        self.collections.nb_model_boundaries()
    }

    // --- Integrity ---

    /// Re-checks the cross-component invariants: relation endpoints and
    /// collection members address live entities, every relation index
    /// agrees with its reverse, and internal embedding stays a forest.
    ///
    /// Violations are programming errors; codecs call this defensively
    /// when a model crosses a format boundary.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Corrupted`] describing the first violation.
    pub fn verify_integrity(&self) -> Result<(), ModelError> {
        self.relationships.verify_integrity()?;
        self.collections.verify_integrity()?;
        for (lower, upper) in self.relationships.boundary_relations() {
            if !self.contains(lower) || !self.contains(upper) {
                return Err(ModelError::Corrupted(format!(
                    "boundary relation {lower} -> {upper} references a removed entity"
                )));
            }
        }
        for (inner, host) in self.relationships.internal_relations() {
            if !self.contains(inner) || !self.contains(host) {
                return Err(ModelError::Corrupted(format!(
                    "internal relation {inner} -> {host} references a removed entity"
                )));
            }
        }
        for (_, data) in self.collections.iter() {
            for member in data.members() {
                if !self.contains(*member) {
                    return Err(ModelError::Corrupted(format!(
                        "collection \"{}\" references a removed entity",
                        data.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn forget(&mut self, id: EntityId) {
        self.relationships.remove_entity(id);
        self.collections.remove_entity(id);
    }
}
