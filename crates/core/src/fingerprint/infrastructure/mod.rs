pub mod image_hasher;
