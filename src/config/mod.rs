//! Configuration: server address, storage root and query limits.

mod settings;

pub use settings::{
    expand_env_vars, QuerySettings, ServerSettings, Settings, SettingsError, StorageSettings,
    CONFIG_ENV, LOCAL_CONFIG_FILE,
};
