//! Composable, concurrent analysis pipeline runtime: streaming stages,
//! fan-out/barrier helpers, provider-backed model sources with caching and
//! timeouts, and the assembler that wires them into a DAG.

pub mod assembly;
pub mod component;
pub mod demo;
pub mod error;
pub mod logging;
pub mod provider;
pub mod settings;
pub mod writer;
