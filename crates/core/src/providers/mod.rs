pub mod traits;

// Catalog implementations
pub mod in_memory;
