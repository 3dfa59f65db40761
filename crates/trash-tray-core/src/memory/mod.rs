mod sampler;
mod steward;

pub use {
    sampler::{MemorySampler, MemoryTrimmer, ProcessMemorySampler, SystemTrimmer, TrimLevel},
    steward::{MemorySteward, OptimizeOutcome, PressureLevel, StewardConfig},
};
