// Windowed entropy/volatility feature extraction
pub mod classifier;
pub mod entropy;
pub mod error;
pub mod pipeline;
pub mod records;
pub mod symbolizer;
pub mod volatility;
pub mod window;

// Re-export commonly used types
pub use classifier::ConditionClassifier;
pub use error::PipelineError;
pub use pipeline::{PipelineOutput, RunStatus, run_pipeline, run_pipeline_on_points};
pub use window::{Window, WindowSlicer};
