//! Media storage layer

pub mod media;

pub use media::MediaStorage;
