pub mod error;
pub mod parser;
pub mod table;

pub use error::CsvError;
pub use parser::CsvParser;
pub use table::{CsvTable, Row};
