mod snapshot;

pub use snapshot::SessionSnapshot;
