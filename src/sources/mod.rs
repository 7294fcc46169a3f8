pub mod traits;
pub mod schedule;
pub mod realtime;
pub mod registry;

pub use traits::{BuildContext, CatalogEntity, ScheduleLookup, Source};
pub use schedule::{GtfsScheduleSource, NewScheduleSource, ScheduleSourceUpdate};
pub use realtime::{GtfsRealtimeSource, NewRealtimeSource, RealtimeSourceUpdate};
pub use registry::CatalogRegistry;
