//! Input layer: typed record views and the delimited-text parser.

mod parser;
mod record;

pub use parser::{is_null_token, CsvParser, ParseOutcome, ParserConfig};
pub use record::{CellValue, RecordView};
