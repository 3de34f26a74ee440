pub mod classification;
pub mod complexity;
pub mod degraded;
pub mod detectors;
pub mod entities;
pub mod parser;
pub mod routes;
pub mod syntax;

pub use degraded::extract_degraded;
pub use entities::extract_entities;
pub use parser::{parse_source, SyntaxTree};
