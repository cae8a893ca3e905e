// Business baseline settings: a single last-write-wins row.
pub mod handlers;
pub mod store;
