pub mod table;

pub use table::{NamedTable, SourceFile, Table, ToRowData};
