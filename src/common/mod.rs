mod download;
mod fs;
mod shp;

pub use download::*;
pub use fs::*;
pub use shp::*;
