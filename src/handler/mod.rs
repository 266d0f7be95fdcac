pub use snapshot_refresher::snapshot_refresh_task;

mod snapshot_refresher;
