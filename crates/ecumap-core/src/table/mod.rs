//! Tables
//!
//! 0, 1 and 2 axis grids mapped onto addressable memory, with interpolated
//! lookup and a plain-text export.

mod export;
mod lookup;
mod model;

pub use export::{export_rows, to_delimited};
pub use model::{Axis, Coords, Table, TableBuilder};
