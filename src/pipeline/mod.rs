//! Stage orchestration and external step execution.

pub mod runner;
pub mod stages;

pub use runner::{
    ExternalCallError,
    StepRunner,
};
pub use stages::ImportSource;
