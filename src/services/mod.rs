pub mod aggregate;
pub mod document;
pub mod factory;
pub mod geo;
pub mod image;
pub mod land;
pub mod statistics;
pub mod view;
