pub mod traits;
pub mod evolution;
pub mod evaluation;
pub mod harness;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use evolution::{EvolutionConfig, SelectionMethod};
pub use evaluation::EvaluationConfig;
pub use harness::HarnessConfig;
