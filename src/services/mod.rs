pub mod elo_calculator;
pub mod exporter;
pub mod feature_aggregator;
pub mod match_loader;

pub use elo_calculator::*;
pub use exporter::*;
pub use feature_aggregator::*;
pub use match_loader::*;
