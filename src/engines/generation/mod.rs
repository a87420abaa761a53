pub mod checkpoint;
pub mod evolution_engine;
pub mod genome;
pub mod operators;
pub mod progress;

pub use checkpoint::Checkpoint;
pub use evolution_engine::{EngineConfig, FitnessFunction, GeneticAlgorithm, ProgressCallback};
pub use genome::{Chromosome, Individual, SearchSpace};
pub use progress::{ConsoleProgressCallback, SilentProgressCallback};
