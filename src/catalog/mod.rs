mod features;
mod track;

pub use features::{FeatureSet, DEFAULT_FEATURES};
pub use track::Track;
