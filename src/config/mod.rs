mod object_filter;
mod world_desc;

pub use object_filter::ObjectFilter;
pub use world_desc::RaySyncDesc;
pub(crate) use world_desc::tick_interval;
