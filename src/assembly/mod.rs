//! Pipeline assembly: the DAG builder/runner and the reflective,
//! configuration-driven alternative to a code-supplied assembler function.

pub mod assembler;
pub mod registry;

pub use assembler::PipelineAnalysis;
pub use registry::{StageConstructor, StageRegistry};
