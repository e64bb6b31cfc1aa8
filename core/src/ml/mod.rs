pub mod artifact;
pub mod pipeline;
pub mod schema;

pub use artifact::{ArtifactError, ModelArtifact};
pub use pipeline::PredictError;
pub use schema::{extract_required_and_numeric, InputSchema};
