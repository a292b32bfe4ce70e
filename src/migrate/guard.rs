//! Memory headroom guard.
//!
//! The executor asks the guard at every batch boundary whether it may start
//! another batch. Headroom is `ceiling - usage`; it must stay at or above a
//! fixed margin so the process stops cleanly well before a hard failure.
//! Usage is sampled in the ceiling's own units: resident memory for an
//! explicit byte limit, mapped address space for the process `RLIMIT_AS`.

use std::fmt;
use std::str::FromStr;

use crate::errors::MigrateError;
use crate::platform::{current_memory_usage, current_virtual_memory, process_memory_ceiling};

/// Stop this far below the memory ceiling.
pub const SAFETY_MARGIN_BYTES: u64 = 25 * 1024 * 1024;

pub trait ResourceGuard {
    fn has_headroom(&self) -> bool;

    /// Current usage for display; `None` when the platform cannot report it.
    fn memory_usage(&self) -> Option<u64>;
}

/// Sample the current process and compare against `ceiling`.
/// `None` as ceiling means unlimited.
pub fn has_headroom(ceiling: Option<u64>, margin_bytes: u64) -> bool {
    headroom_ok(ceiling, margin_bytes, current_memory_usage())
}

/// Pure comparison used by `has_headroom`. Unknown usage never blocks a run.
pub fn headroom_ok(ceiling: Option<u64>, margin_bytes: u64, usage: Option<u64>) -> bool {
    match (ceiling, usage) {
        (Some(ceiling), Some(usage)) => ceiling.saturating_sub(usage) >= margin_bytes,
        _ => true,
    }
}

/// Which usage figure a ceiling is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryMeasure {
    /// Resident set; pairs with an explicit byte limit.
    #[default]
    Resident,
    /// Mapped address space; pairs with `RLIMIT_AS`.
    AddressSpace,
}

impl MemoryMeasure {
    pub fn sample(self) -> Option<u64> {
        match self {
            MemoryMeasure::Resident => current_memory_usage(),
            MemoryMeasure::AddressSpace => current_virtual_memory(),
        }
    }
}

/// Configured memory ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryLimit {
    /// Use the process address-space limit, if any.
    #[default]
    Auto,
    Unlimited,
    Bytes(u64),
}

impl MemoryLimit {
    /// Effective ceiling in bytes; `None` means no ceiling.
    pub fn ceiling(self) -> Option<u64> {
        match self {
            MemoryLimit::Auto => process_memory_ceiling(),
            MemoryLimit::Unlimited => None,
            MemoryLimit::Bytes(b) => Some(b),
        }
    }

    /// Usage figure the ceiling is expressed in.
    pub fn measure(self) -> MemoryMeasure {
        match self {
            MemoryLimit::Auto => MemoryMeasure::AddressSpace,
            MemoryLimit::Unlimited | MemoryLimit::Bytes(_) => MemoryMeasure::Resident,
        }
    }
}

impl FromStr for MemoryLimit {
    type Err = MigrateError;

    /// Accepts `auto`, `-1`/`unlimited`, plain bytes, or a `K`/`M`/`G` (1024-based) suffix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MigrateError::InvalidMemoryLimit(s.to_string());
        let t = s.trim().to_ascii_lowercase();
        match t.as_str() {
            "" | "auto" => return Ok(MemoryLimit::Auto),
            "-1" | "unlimited" | "none" => return Ok(MemoryLimit::Unlimited),
            _ => {}
        }
        let t = t.strip_suffix("ib").or_else(|| t.strip_suffix('b')).unwrap_or(t.as_str());
        let (digits, shift) = match t.chars().last() {
            Some('k') => (&t[..t.len() - 1], 10),
            Some('m') => (&t[..t.len() - 1], 20),
            Some('g') => (&t[..t.len() - 1], 30),
            _ => (t, 0),
        };
        let n: u64 = digits.trim().parse().map_err(|_| invalid())?;
        if n == 0 {
            return Err(invalid());
        }
        n.checked_mul(1u64 << shift).map(MemoryLimit::Bytes).ok_or_else(invalid)
    }
}

impl fmt::Display for MemoryLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryLimit::Auto => f.write_str("auto"),
            MemoryLimit::Unlimited => f.write_str("unlimited"),
            MemoryLimit::Bytes(b) => write!(f, "{b}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryGuard {
    ceiling: Option<u64>,
    margin: u64,
    measure: MemoryMeasure,
}

impl MemoryGuard {
    /// Guard comparing resident memory against `ceiling`.
    pub fn new(ceiling: Option<u64>, margin: u64) -> Self {
        Self::with_measure(ceiling, margin, MemoryMeasure::Resident)
    }

    pub fn with_measure(ceiling: Option<u64>, margin: u64, measure: MemoryMeasure) -> Self {
        Self {
            ceiling,
            margin,
            measure,
        }
    }

    pub fn from_limit(limit: MemoryLimit) -> Self {
        Self::with_measure(limit.ceiling(), SAFETY_MARGIN_BYTES, limit.measure())
    }

    pub fn unlimited() -> Self {
        Self::new(None, SAFETY_MARGIN_BYTES)
    }

    pub fn ceiling(&self) -> Option<u64> {
        self.ceiling
    }

    pub fn measure(&self) -> MemoryMeasure {
        self.measure
    }
}

impl ResourceGuard for MemoryGuard {
    fn has_headroom(&self) -> bool {
        headroom_ok(self.ceiling, self.margin, self.measure.sample())
    }

    /// Reported in the same units as the ceiling.
    fn memory_usage(&self) -> Option<u64> {
        self.measure.sample()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn headroom_boundary() {
        let ceiling = Some(100 * MIB);
        assert!(headroom_ok(ceiling, SAFETY_MARGIN_BYTES, Some(50 * MIB)));
        assert!(headroom_ok(ceiling, SAFETY_MARGIN_BYTES, Some(75 * MIB)));
        assert!(!headroom_ok(ceiling, SAFETY_MARGIN_BYTES, Some(75 * MIB + 1)));
        assert!(!headroom_ok(ceiling, SAFETY_MARGIN_BYTES, Some(200 * MIB)));
    }

    #[test]
    fn unlimited_or_unknown_never_blocks() {
        assert!(headroom_ok(None, SAFETY_MARGIN_BYTES, Some(u64::MAX)));
        assert!(headroom_ok(Some(MIB), SAFETY_MARGIN_BYTES, None));
        assert!(MemoryGuard::unlimited().has_headroom());
    }

    #[test]
    fn memory_limit_parsing() {
        assert_eq!("auto".parse::<MemoryLimit>().unwrap(), MemoryLimit::Auto);
        assert_eq!("".parse::<MemoryLimit>().unwrap(), MemoryLimit::Auto);
        assert_eq!("-1".parse::<MemoryLimit>().unwrap(), MemoryLimit::Unlimited);
        assert_eq!("Unlimited".parse::<MemoryLimit>().unwrap(), MemoryLimit::Unlimited);
        assert_eq!("4096".parse::<MemoryLimit>().unwrap(), MemoryLimit::Bytes(4096));
        assert_eq!("512M".parse::<MemoryLimit>().unwrap(), MemoryLimit::Bytes(512 * MIB));
        assert_eq!("512MB".parse::<MemoryLimit>().unwrap(), MemoryLimit::Bytes(512 * MIB));
        assert_eq!("2g".parse::<MemoryLimit>().unwrap(), MemoryLimit::Bytes(2048 * MIB));
        assert_eq!("64KiB".parse::<MemoryLimit>().unwrap(), MemoryLimit::Bytes(64 * 1024));
        for bad in ["0", "lots", "12T", "-5", "99999999999999G"] {
            let err = bad.parse::<MemoryLimit>().unwrap_err();
            assert!(matches!(err, MigrateError::InvalidMemoryLimit(_)), "{bad}");
        }
        assert_eq!(MemoryLimit::Unlimited.ceiling(), None);
        assert_eq!(MemoryLimit::Bytes(7).ceiling(), Some(7));
    }

    #[test]
    fn auto_limit_pairs_with_address_space() {
        assert_eq!(MemoryLimit::Auto.measure(), MemoryMeasure::AddressSpace);
        assert_eq!(MemoryLimit::Bytes(1).measure(), MemoryMeasure::Resident);
        assert_eq!(MemoryGuard::from_limit(MemoryLimit::Auto).measure(), MemoryMeasure::AddressSpace);
        assert_eq!(
            MemoryGuard::from_limit(MemoryLimit::Bytes(512 * MIB)).measure(),
            MemoryMeasure::Resident
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn exhausted_address_space_blocks_even_with_small_rss() {
        // Ceiling at the current mapping size: no address space left, however small RSS is.
        let vsz = current_virtual_memory().unwrap();
        let guard = MemoryGuard::with_measure(Some(vsz), SAFETY_MARGIN_BYTES, MemoryMeasure::AddressSpace);
        assert!(!guard.has_headroom(), "no address space left below the limit");
    }

    #[test]
    fn tiny_ceiling_blocks_live_process() {
        // Any running process uses more than 1 KiB, provided usage can be sampled.
        let guard = MemoryGuard::new(Some(1024), SAFETY_MARGIN_BYTES);
        if guard.memory_usage().is_some() {
            assert!(!guard.has_headroom());
        }
    }
}
