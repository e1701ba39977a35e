//! Format codecs and the extension-dispatched registry.
//!
//! Two families of formats exist. The legacy GOCAD ASCII family,
//! [`ml`] for whole models and [`ts`] for standalone surfaces, is read
//! permissively and written deterministically, but carries geological
//! conventions that are interpreted on the way in. The canonical
//! family, [`strm`] and [`tsf3d`], serializes the in-memory structures
//! verbatim as versioned JSON so read(write(x)) reproduces x.
//!
//! File access goes through the [`CodecRegistry`], which picks a codec
//! by file extension. A model is integrity-checked on both sides of a
//! format boundary, and every save goes through a staging file renamed
//! into place only after a complete write, so a failed save never
//! leaves a truncated file at the target path.

pub mod gocad;
pub mod ml;
pub mod strm;
pub mod ts;
pub mod tsf3d;

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::CodecError;
use crate::mesh::TriangulatedSurface;
use crate::model::StructuralModel;

/// Reads a structural model from a byte stream.
pub trait ModelInput: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`CodecError`] describing the first problem found in
    /// the stream.
    fn read(&self, input: &mut dyn BufRead) -> Result<StructuralModel, CodecError>;
}

/// Writes a structural model to a byte stream.
pub trait ModelOutput: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the stream cannot be written.
    fn write(&self, out: &mut dyn Write, model: &StructuralModel) -> Result<(), CodecError>;
}

/// Reads a triangulated surface from a byte stream.
pub trait SurfaceInput: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`CodecError`] describing the first problem found in
    /// the stream.
    fn read(&self, input: &mut dyn BufRead) -> Result<TriangulatedSurface, CodecError>;
}

/// Writes a triangulated surface to a byte stream.
pub trait SurfaceOutput: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the stream cannot be written.
    fn write(&self, out: &mut dyn Write, mesh: &TriangulatedSurface) -> Result<(), CodecError>;
}

/// Legacy GOCAD Model3d codec, `.ml`.
pub struct MlCodec;

impl ModelInput for MlCodec {
    fn read(&self, input: &mut dyn BufRead) -> Result<StructuralModel, CodecError> {
        ml::read_from(input)
    }
}

impl ModelOutput for MlCodec {
    fn write(&self, out: &mut dyn Write, model: &StructuralModel) -> Result<(), CodecError> {
        ml::write_to(out, model)
    }
}

/// Canonical model snapshot codec, `.og_strm`.
pub struct StrmCodec;

impl ModelInput for StrmCodec {
    fn read(&self, input: &mut dyn BufRead) -> Result<StructuralModel, CodecError> {
        strm::read_from(input)
    }
}

impl ModelOutput for StrmCodec {
    fn write(&self, out: &mut dyn Write, model: &StructuralModel) -> Result<(), CodecError> {
        strm::write_to(out, model)
    }
}

/// Legacy GOCAD TSurf codec, `.ts`.
pub struct TsCodec;

impl SurfaceInput for TsCodec {
    fn read(&self, input: &mut dyn BufRead) -> Result<TriangulatedSurface, CodecError> {
        ts::read_from(input)
    }
}

impl SurfaceOutput for TsCodec {
    fn write(&self, out: &mut dyn Write, mesh: &TriangulatedSurface) -> Result<(), CodecError> {
        ts::write_to(out, mesh)
    }
}

/// Canonical surface snapshot codec, `.og_tsf3d`.
pub struct Tsf3dCodec;

impl SurfaceInput for Tsf3dCodec {
    fn read(&self, input: &mut dyn BufRead) -> Result<TriangulatedSurface, CodecError> {
        tsf3d::read_from(input)
    }
}

impl SurfaceOutput for Tsf3dCodec {
    fn write(&self, out: &mut dyn Write, mesh: &TriangulatedSurface) -> Result<(), CodecError> {
        tsf3d::write_to(out, mesh)
    }
}

/// Maps lowercase file extensions to codecs.
///
/// The registry is immutable once shared; build a custom one with the
/// `register_*` methods before handing it out, or use the process-wide
/// registry behind [`load_structural_model`] and friends.
#[derive(Default)]
pub struct CodecRegistry {
    model_inputs: HashMap<String, Box<dyn ModelInput>>,
    model_outputs: HashMap<String, Box<dyn ModelOutput>>,
    surface_inputs: HashMap<String, Box<dyn SurfaceInput>>,
    surface_outputs: HashMap<String, Box<dyn SurfaceOutput>>,
}

impl CodecRegistry {
    /// An empty registry with no codecs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in codec.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register_model_input("ml", Box::new(MlCodec));
        registry.register_model_output("ml", Box::new(MlCodec));
        registry.register_model_input("og_strm", Box::new(StrmCodec));
        registry.register_model_output("og_strm", Box::new(StrmCodec));
        registry.register_surface_input("ts", Box::new(TsCodec));
        registry.register_surface_output("ts", Box::new(TsCodec));
        registry.register_surface_input("og_tsf3d", Box::new(Tsf3dCodec));
        registry.register_surface_output("og_tsf3d", Box::new(Tsf3dCodec));
        registry
    }

    pub fn register_model_input(&mut self, extension: &str, codec: Box<dyn ModelInput>) {
        self.model_inputs.insert(extension.to_lowercase(), codec);
    }

    pub fn register_model_output(&mut self, extension: &str, codec: Box<dyn ModelOutput>) {
        self.model_outputs.insert(extension.to_lowercase(), codec);
    }

    pub fn register_surface_input(&mut self, extension: &str, codec: Box<dyn SurfaceInput>) {
        self.surface_inputs.insert(extension.to_lowercase(), codec);
    }

    pub fn register_surface_output(&mut self, extension: &str, codec: Box<dyn SurfaceOutput>) {
        self.surface_outputs.insert(extension.to_lowercase(), codec);
    }

    /// Loads a structural model, dispatching on the file extension.
    ///
    /// The loaded model is integrity-checked before it is returned.
    ///
    /// # Errors
    ///
    /// `UnknownFormat` if no codec handles the extension, otherwise the
    /// codec's error.
    pub fn load_model(&self, path: &Path) -> Result<StructuralModel, CodecError> {
        let extension = extension_of(path)?;
        let codec = self
            .model_inputs
            .get(&extension)
            .ok_or(CodecError::UnknownFormat(extension))?;
        tracing::debug!(path = %path.display(), "loading structural model");
        let mut input = BufReader::new(File::open(path)?);
        let model = codec.read(&mut input)?;
        model.verify_integrity()?;
        Ok(model)
    }

    /// Saves a structural model, dispatching on the file extension.
    ///
    /// The model is integrity-checked first, and the bytes reach `path`
    /// only after a complete write.
    ///
    /// # Errors
    ///
    /// `UnknownFormat` if no codec handles the extension, otherwise the
    /// codec's error.
    pub fn save_model(&self, path: &Path, model: &StructuralModel) -> Result<(), CodecError> {
        let extension = extension_of(path)?;
        let codec = self
            .model_outputs
            .get(&extension)
            .ok_or(CodecError::UnknownFormat(extension))?;
        model.verify_integrity()?;
        tracing::debug!(path = %path.display(), "saving structural model");
        atomic_write(path, |out| codec.write(out, model))
    }

    /// Loads a triangulated surface, dispatching on the file extension.
    ///
    /// # Errors
    ///
    /// `UnknownFormat` if no codec handles the extension, otherwise the
    /// codec's error.
    pub fn load_surface(&self, path: &Path) -> Result<TriangulatedSurface, CodecError> {
        let extension = extension_of(path)?;
        let codec = self
            .surface_inputs
            .get(&extension)
            .ok_or(CodecError::UnknownFormat(extension))?;
        tracing::debug!(path = %path.display(), "loading surface");
        let mut input = BufReader::new(File::open(path)?);
        codec.read(&mut input)
    }

    /// Saves a triangulated surface, dispatching on the file extension.
    ///
    /// # Errors
    ///
    /// `UnknownFormat` if no codec handles the extension, otherwise the
    /// codec's error.
    pub fn save_surface(&self, path: &Path, mesh: &TriangulatedSurface) -> Result<(), CodecError> {
        let extension = extension_of(path)?;
        let codec = self
            .surface_outputs
            .get(&extension)
            .ok_or(CodecError::UnknownFormat(extension))?;
        tracing::debug!(path = %path.display(), "saving surface");
        atomic_write(path, |out| codec.write(out, mesh))
    }
}

fn extension_of(path: &Path) -> Result<String, CodecError> {
    path.extension()
        .and_then(std::ffi::OsStr::to_str)
        .map(str::to_lowercase)
        .ok_or_else(|| CodecError::UnknownFormat(path.display().to_string()))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("out"), std::ffi::OsStr::to_os_string);
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes through a staging file renamed into place on success. The
/// staging file is removed on any failure, so the target path either
/// keeps its previous content or receives the complete new content.
fn atomic_write(
    path: &Path,
    write: impl FnOnce(&mut dyn Write) -> Result<(), CodecError>,
) -> Result<(), CodecError> {
    let staging = staging_path(path);
    let result = (|| {
        let mut out = BufWriter::new(File::create(&staging)?);
        write(&mut out)?;
        out.flush()?;
        Ok(())
    })();
    let result = result.and_then(|()| fs::rename(&staging, path).map_err(CodecError::Io));
    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result
}

static REGISTRY: OnceLock<CodecRegistry> = OnceLock::new();

fn registry() -> &'static CodecRegistry {
    REGISTRY.get_or_init(|| {
        tracing::debug!("initializing built-in codec registry");
        CodecRegistry::builtin()
    })
}

/// Eagerly initializes the process-wide codec registry. Calling this is
/// optional and idempotent; the registry also initializes on first use.
pub fn initialize() {
    let _ = registry();
}

/// Loads a structural model through the process-wide registry.
///
/// # Errors
///
/// See [`CodecRegistry::load_model`].
pub fn load_structural_model(path: impl AsRef<Path>) -> crate::Result<StructuralModel> {
    Ok(registry().load_model(path.as_ref())?)
}

/// Saves a structural model through the process-wide registry.
///
/// # Errors
///
/// See [`CodecRegistry::save_model`].
pub fn save_structural_model(
    path: impl AsRef<Path>,
    model: &StructuralModel,
) -> crate::Result<()> {
    Ok(registry().save_model(path.as_ref(), model)?)
}

/// Loads a triangulated surface through the process-wide registry.
///
/// # Errors
///
/// See [`CodecRegistry::load_surface`].
pub fn load_triangulated_surface(path: impl AsRef<Path>) -> crate::Result<TriangulatedSurface> {
    Ok(registry().load_surface(path.as_ref())?)
}

/// Saves a triangulated surface through the process-wide registry.
///
/// # Errors
///
/// See [`CodecRegistry::save_surface`].
pub fn save_triangulated_surface(
    path: impl AsRef<Path>,
    mesh: &TriangulatedSurface,
) -> crate::Result<()> {
    Ok(registry().save_surface(path.as_ref(), mesh)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::LithosError;
    use crate::geology::{FaultKind, HorizonKind};
    use crate::math::Point3;

    struct Workspace {
        root: PathBuf,
    }

    impl Workspace {
        fn new(label: &str) -> Self {
            let root = std::env::temp_dir().join(format!(
                "lithos-io-{}-{label}",
                std::process::id()
            ));
            fs::create_dir_all(&root).unwrap();
            Self { root }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.root.join(name)
        }
    }

    impl Drop for Workspace {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.root);
        }
    }

    /// Builds a model with the shape of a real basin export: 52
    /// corners, 98 lines, 55 surfaces and 8 blocks, grouped into 2
    /// faults, 3 horizons and 6 model boundaries, with 4 surfaces
    /// embedded in blocks and 2 lines embedded in surfaces.
    fn reference_model() -> StructuralModel {
        let mut model = StructuralModel::new("modelA4");

        let corners: Vec<_> = (0..52)
            .map(|i| model.add_corner(format!("corner_{i}")))
            .collect();
        let lines: Vec<_> = (0..98)
            .map(|i| model.add_line(format!("contact_{i}")))
            .collect();
        for (i, &line) in lines.iter().enumerate() {
            model.add_corner_line_boundary(corners[i % 52], line);
            model.add_corner_line_boundary(corners[(i + 1) % 52], line);
        }

        let surfaces: Vec<_> = (0..55)
            .map(|i| match i {
                0 => model.add_surface("voi_top_boundary"),
                1 => model.add_surface("voi_bottom_boundary"),
                _ => model.add_surface(format!("surface_{i}")),
            })
            .collect();
        for (i, &surface) in surfaces.iter().enumerate() {
            model.add_line_surface_boundary(lines[(2 * i) % 98], surface);
            model.add_line_surface_boundary(lines[(2 * i + 1) % 98], surface);
        }
        model.add_line_surface_internal(lines[96], surfaces[0]).unwrap();
        model.add_line_surface_internal(lines[97], surfaces[1]).unwrap();

        let blocks: Vec<_> = (0..8)
            .map(|i| {
                if i % 2 == 0 {
                    model.add_block(format!("region_{i} b_2"))
                } else {
                    model.add_block(format!("region_{i}"))
                }
            })
            .collect();
        for (i, &block) in blocks.iter().enumerate() {
            for offset in 0..3 {
                model.add_surface_block_boundary(surfaces[(6 * i + offset) % 55], block);
            }
        }
        for (i, &surface) in surfaces[51..55].iter().enumerate() {
            model.add_surface_block_internal(surface, blocks[2 * i]).unwrap();
        }

        let mut collections = Vec::new();
        for i in 0..2 {
            collections.push(model.add_fault(format!("fault_{i}"), FaultKind::Normal));
        }
        for i in 0..3 {
            collections.push(model.add_horizon(format!("horizon_{i}"), HorizonKind::Conformal));
        }
        for i in 0..6 {
            collections.push(model.add_model_boundary(format!("boundary_{i}")));
        }
        for (i, &surface) in surfaces.iter().enumerate() {
            model
                .add_in_collection(collections[i % collections.len()], surface.into())
                .unwrap();
        }
        model
    }

    fn assert_reference_shape(model: &StructuralModel) {
        model.verify_integrity().unwrap();
        assert_eq!(model.nb_corners(), 52);
        assert_eq!(model.nb_lines(), 98);
        assert_eq!(model.nb_surfaces(), 55);
        assert_eq!(model.nb_blocks(), 8);
        assert_eq!(model.nb_faults(), 2);
        assert_eq!(model.nb_horizons(), 3);
        assert_eq!(model.nb_model_boundaries(), 6);

        let block_internals: usize = model
            .blocks()
            .map(|(id, _)| model.nb_block_internals(id))
            .sum();
        assert_eq!(block_internals, 4);
        for (id, data) in model.blocks() {
            if model.nb_block_internals(id) > 0 {
                assert!(data.name.ends_with("b_2"));
            }
        }

        let surface_internals: usize = model
            .surfaces()
            .map(|(id, _)| model.nb_surface_internals(id))
            .sum();
        assert_eq!(surface_internals, 2);
    }

    #[test]
    fn legacy_model_round_trip_through_files() {
        let workspace = Workspace::new("ml");
        let path = workspace.path("modelA4.ml");
        let model = reference_model();
        save_structural_model(&path, &model).unwrap();
        let reloaded = load_structural_model(&path).unwrap();
        assert_reference_shape(&reloaded);
        assert_eq!(reloaded.name(), "modelA4");

        // A second generation keeps the same shape.
        save_structural_model(&path, &reloaded).unwrap();
        assert_reference_shape(&load_structural_model(&path).unwrap());
    }

    #[test]
    fn canonical_model_round_trip_through_files() {
        let workspace = Workspace::new("strm");
        let path = workspace.path("modelA4.og_strm");
        let model = reference_model();
        save_structural_model(&path, &model).unwrap();
        let reloaded = load_structural_model(&path).unwrap();
        assert_reference_shape(&reloaded);
        assert_eq!(reloaded.name(), "modelA4");
    }

    #[test]
    fn surface_crosses_between_formats() {
        let workspace = Workspace::new("surface");
        let mut mesh = TriangulatedSurface::new();
        mesh.set_name("dome");
        for i in 0..46 {
            let x = f64::from(i);
            mesh.create_point(Point3::new(x, x * 0.5, (x * 0.1).sin()));
        }
        for i in 0..46 {
            mesh.create_triangle([i % 46, (i + 7) % 46, (i + 13) % 46]);
        }

        let legacy = workspace.path("dome.ts");
        save_triangulated_surface(&legacy, &mesh).unwrap();
        let from_legacy = load_triangulated_surface(&legacy).unwrap();
        assert_eq!(from_legacy.nb_vertices(), 46);
        assert_eq!(from_legacy.nb_triangles(), 46);

        let canonical = workspace.path("dome.og_tsf3d");
        save_triangulated_surface(&canonical, &from_legacy).unwrap();
        let from_canonical = load_triangulated_surface(&canonical).unwrap();
        assert_eq!(from_canonical, from_legacy);
        assert_eq!(from_canonical.name(), "dome");
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let workspace = Workspace::new("unknown");
        let err = load_structural_model(workspace.path("model.xyz")).unwrap_err();
        assert!(matches!(
            err,
            LithosError::Codec(CodecError::UnknownFormat(_))
        ));
        let err = save_structural_model(workspace.path("model.xyz"), &StructuralModel::new("m"))
            .unwrap_err();
        assert!(matches!(
            err,
            LithosError::Codec(CodecError::UnknownFormat(_))
        ));
    }

    #[test]
    fn failed_save_leaves_no_staging_file() {
        let workspace = Workspace::new("atomic");
        // A directory at the target path makes the final rename fail.
        let target = workspace.path("blocked.og_strm");
        fs::create_dir(&target).unwrap();
        let err = save_structural_model(&target, &StructuralModel::new("m")).unwrap_err();
        assert!(matches!(err, LithosError::Codec(CodecError::Io(_))));
        assert!(!staging_path(&target).exists());
        assert!(target.is_dir());
    }

    #[test]
    fn initialize_is_idempotent() {
        initialize();
        initialize();
        let registry = CodecRegistry::builtin();
        assert!(registry.load_model(Path::new("missing.ml")).is_err());
    }
}
