pub mod csv_loader;

pub use csv_loader::{load_csv, quote_identifier, read_dataset, write_table, Dataset, LoadSummary};
