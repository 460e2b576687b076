//! Project configuration (`as_i18n.yaml`).
pub mod layout;
mod loader;
mod manager;
pub mod matcher;
pub mod types;

pub use layout::ProjectLayout;
pub use loader::find_project_root;
pub use manager::ConfigManager;
pub use matcher::{
    FileMatcher,
    MatcherError,
};
pub use types::{
    CONFIG_FILE_NAME,
    ConfigError,
    ExternalStep,
    LingoConfig,
    PipelineConfig,
    ProjectSettings,
    Replacement,
    ValidationError,
};
