pub mod grid;
pub mod region;

pub use grid::*;
pub use region::*;
