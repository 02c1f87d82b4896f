pub mod cascade;
pub mod cascade_detector;
pub mod clustering;
pub mod model_resolver;
