pub mod distance;
pub mod permission;
pub mod watcher;

pub use distance::{EARTH_RADIUS_M, distance, within_radius};
pub use permission::{
    FilePermissionStore, MemoryPermissionStore, PermissionState, PermissionStore,
    PermissionStoreError,
};
pub use watcher::{
    FallbackReason, GeoReading, GeolocationWatcher, PositionError, PositionFeed,
    PositionOptions, PositionSource, WatcherConfig,
};
