pub mod attempted;
pub mod similarity;

pub use attempted::{analyze, attempted_count, AnalysisPolicy, AttemptedQuestion};
pub use similarity::similarity;
