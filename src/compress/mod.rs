pub mod ladder;
pub mod profile;

pub use ladder::{CompressionLadder, LadderOutcome};
pub use profile::CompressionProfile;
