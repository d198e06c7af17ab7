// Pipeline monitoring module
// Run trace shared by the CLI commands

pub mod trace;

pub use trace::{read_trace_file, Stage, TraceBuilder, TraceEntry, TraceError, TraceWriter};
