// Application Layer - Use Cases and Business Logic

pub mod engine;

// Re-exports
pub use engine::{ExecutionEngine, RunOptions};
