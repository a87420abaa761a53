use super::evolution_engine::ProgressCallback;

/// Logs progress through the `log` facade; stdout stays free for the summary line.
pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_generation_start(&mut self, generation: usize, total: usize) {
        log::info!("Generation {}/{} starting...", generation + 1, total);
    }

    fn on_candidate_evaluated(&mut self, candidate_num: usize, total: usize, fitness: f64) {
        log::info!("  [{}/{}] fitness {:.2}", candidate_num, total, fitness);
    }

    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, best_ever: f64) {
        log::info!(
            "Generation {} complete. Best fitness: {:.4}, best ever: {:.4}",
            generation + 1,
            best_fitness,
            best_ever
        );
    }
}

/// Discards all progress events
pub struct SilentProgressCallback;

impl ProgressCallback for SilentProgressCallback {
    fn on_generation_start(&mut self, _generation: usize, _total: usize) {}

    fn on_candidate_evaluated(&mut self, _candidate_num: usize, _total: usize, _fitness: f64) {}

    fn on_generation_complete(&mut self, _generation: usize, _best_fitness: f64, _best_ever: f64) {}
}
