pub mod fingerprint;
pub mod fingerprint_engine;
