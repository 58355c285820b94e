pub mod bounds;
pub mod canvas;
pub mod color;
pub mod id;
pub mod scene;
pub mod store;
pub mod stroke;
pub mod util;

pub use id::FuzzID;
