//! Collection pipeline: per-channel collection, the concurrent cycle
//! orchestrator, and the single-slot guard that keeps cycles from overlapping.

pub mod channel;
pub mod cycle;
pub mod guard;
pub mod source;

pub use channel::{collect_channel, collect_resolved, ChannelReport, CollectSettings};
pub use cycle::{run_cycle, CycleRunner};
pub use guard::{CycleGuard, CyclePermit};
pub use source::{ChannelSource, ItemStore};

#[cfg(test)]
pub(crate) mod testing;
