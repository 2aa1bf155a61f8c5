pub mod document;
pub mod factory;
pub mod image;
pub mod statistics;
