pub mod engine;
pub mod io;
pub mod models;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use engine::*;
pub use io::*;
pub use models::template_file::*;
