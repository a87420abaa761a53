pub mod codegen;
pub mod fitness;
pub mod harness;
pub mod record;

pub use codegen::{CodeGenerator, FractalNetTemplate};
pub use fitness::FitnessEvaluator;
pub use harness::{CommandHarness, HarnessParams, HarnessResult, TrainingHarness};
pub use record::{extract_accuracy, ResultRecord};
