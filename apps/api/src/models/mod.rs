pub mod campaign;
pub mod customer;
pub mod segment;
pub mod settings;
pub mod story;
