pub mod error_classifier;
pub mod r#loop;
pub mod repair;
pub mod stage;
pub mod state;

pub use error_classifier::*;
pub use r#loop::*;
pub use repair::*;
pub use stage::*;
pub use state::*;
