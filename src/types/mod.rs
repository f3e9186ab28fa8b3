pub mod rows;
pub mod sheets;

pub use rows::{
    Column, MergedRow, PlayerKeyed, PlayerResultRow, PlayerRow, SheetRow, Tabular, WarRecordRow,
};
