//! Repository modules

pub mod properties;

pub use properties::PropertyRepository;
