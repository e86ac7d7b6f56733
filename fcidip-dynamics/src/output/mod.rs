pub mod helper;
pub mod write_data;

pub use write_data::*;
