pub mod mapper;
pub mod service;

pub use mapper::{classify_type, is_vinyl_format, map_to_draft, RecordDraft, RecordType, SkipReason};
pub use service::{
    CancelFlag, CollectionSource, DiscogsAccount, ExternalIdIndex, FixedDelayPacer, Pacer,
    RecordStore, StoreError, SyncError, SyncItemError, SyncReport, SyncService,
};
