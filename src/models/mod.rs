pub mod transcript;

pub use transcript::*;
