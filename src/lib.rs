#![doc = "Clip US Census TIGER layers to a state, city or county boundary"]
mod common;

pub mod cli;
pub mod clip;
pub mod commands;
pub mod crs;
pub mod error;
pub mod fetch;
pub mod prompt;
pub mod region;
pub mod source;

#[doc(inline)]
pub use clip::{clip_layer, ClipSummary};

#[doc(inline)]
pub use commands::{Pipeline, RunReport};

#[doc(inline)]
pub use error::TigerError;

#[doc(inline)]
pub use region::{Boundary, BoundaryKind, BoundaryRequest};
