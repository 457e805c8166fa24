pub mod csv_export;
pub mod csv_import;
pub mod file;
pub mod store;

pub use csv_export::export_csv;
pub use csv_import::{import_csv, CsvImport};
pub use file::{load_schedule, save_schedule};
pub use store::{JsonOrderStore, JsonlAuditLog};
