//! Data-set versions: where they are recorded, how selectors resolve to
//! them, and what changed between two of them.

pub mod changes;
pub mod repository;
pub mod resolver;

pub use changes::{
    diff, Change, ChangeKind, FilterOptionState, FilterState, GeographicLevelState,
    IndicatorState, TimePeriodState, VersionChangeSet,
};
pub use repository::{
    FileVersionRepository, InMemoryVersionRepository, VersionRepository, DATA_SET_FILE,
    METADATA_FILE, STORE_FILE,
};
pub use resolver::{check_successor, predecessor, select_version, visible_versions, VersionResolver};
