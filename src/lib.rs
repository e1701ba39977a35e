pub mod error;
pub mod geology;
pub mod io;
pub mod math;
pub mod mesh;
pub mod model;

pub use error::{LithosError, Result};
pub use io::{
    load_structural_model, load_triangulated_surface, save_structural_model,
    save_triangulated_surface,
};
pub use mesh::TriangulatedSurface;
pub use model::StructuralModel;
