pub mod csv_export;
pub mod players;
pub mod records;
pub mod sheet_reader;

pub use sheet_reader::SheetReader;
