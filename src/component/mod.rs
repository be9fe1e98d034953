//! Stage runtime: the typed streaming worker, its queue plumbing, and the
//! two structural helpers (fan-out and barrier) pipelines assemble from it.

pub mod join;
pub mod split;
pub mod stage;
pub mod stream;
pub mod time;

pub use join::{join_component, Awaitable};
pub use split::SplitComponent;
pub use stage::{AnalysisComponent, AnalysisWork, FnWork, Lifecycle, StageSink};
pub use stream::{bounded, ResultSink, ResultSource, DEFAULT_CAPACITY};
