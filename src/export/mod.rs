mod engine;
mod scan;

pub use engine::ExportEngine;
pub use scan::scan;
