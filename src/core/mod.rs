pub mod config;
pub mod errors;
pub mod kernel;
pub mod normalize;
pub mod stream;
pub mod traits;
pub mod types;
