pub mod details;
pub mod impact;

pub use details::{DetailsRow, details_rows, details_to_json, export_details, export_file_name};
pub use impact::{ImpactReport, impact};
