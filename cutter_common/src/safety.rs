//! Interlock flags for the cutter enclosure (power, door, material).
//!
//! A cut may only start when every flag in [`InterlockFlags::READY`] is set.
//! Clearing any of them while a session runs cancels it.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Readiness conditions reported by the enclosure sensors.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InterlockFlags: u8 {
        /// Main power is enabled.
        const POWER_ON         = 0x01;
        /// Lid/door is closed.
        const DOOR_CLOSED      = 0x02;
        /// Material is mounted in the work area socket.
        const MATERIAL_PRESENT = 0x04;
    }
}

impl InterlockFlags {
    /// All conditions required to admit a cut job.
    pub const READY: Self = Self::from_bits_truncate(
        Self::POWER_ON.bits() | Self::DOOR_CLOSED.bits() | Self::MATERIAL_PRESENT.bits(),
    );

    /// Returns true if every readiness condition holds.
    #[inline]
    pub const fn is_ready(&self) -> bool {
        self.contains(Self::READY)
    }

    /// First missing readiness condition, in power → door → material order.
    pub fn first_missing(&self) -> Option<Interlock> {
        [Interlock::Power, Interlock::Door, Interlock::Material]
            .into_iter()
            .find(|i| !self.contains(i.flag()))
    }
}

impl Default for InterlockFlags {
    fn default() -> Self {
        // Door starts closed; power off and socket empty.
        Self::DOOR_CLOSED
    }
}

/// One enclosure sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interlock {
    Power,
    Door,
    Material,
}

impl Interlock {
    /// Flag that is set while this sensor reports the safe condition.
    #[inline]
    pub const fn flag(self) -> InterlockFlags {
        match self {
            Self::Power => InterlockFlags::POWER_ON,
            Self::Door => InterlockFlags::DOOR_CLOSED,
            Self::Material => InterlockFlags::MATERIAL_PRESENT,
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
