pub mod search;

pub use search::SearchMetrics;
