pub mod alarm;
pub mod detection;
pub mod fingerprint;
pub mod media;
pub mod pipeline;
pub mod shared;
