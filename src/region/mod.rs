mod boundary;
mod states;
mod table;

pub use boundary::*;
pub use states::*;
pub use table::*;
