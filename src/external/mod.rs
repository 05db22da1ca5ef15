// Seam to the external raid-detection subsystem.
//
// Raid claim detection, territory lookup and outpost tracking live in the
// host; this crate only consumes the narrow query surface defined here.

pub use detector::{ExternalRaid, GracePeriod, NoopRaidDetector, RaidDetector};

#[cfg(test)]
pub use detector::test_utils;

mod detector;
