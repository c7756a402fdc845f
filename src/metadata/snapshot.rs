/*!
 * Metadata snapshot and apply report types
 */

use std::fmt;

use filetime::FileTime;
use serde::{Deserialize, Serialize};

/// Access, modification and creation times of a file
///
/// `created` is the inode-change time on POSIX and the real creation time
/// on Windows. It is never written back on POSIX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    #[serde(with = "file_time")]
    pub accessed: FileTime,
    #[serde(with = "file_time")]
    pub modified: FileTime,
    #[serde(with = "file_time::option", default)]
    pub created: Option<FileTime>,
}

/// OS-specific part of a snapshot
///
/// The variant is picked from the running OS, never from how the path looks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlatformExtra {
    /// Nothing could be read
    #[default]
    Empty,
    /// POSIX owner and group
    Owner { uid: u32, gid: u32 },
    /// Windows attribute bits read natively
    Attributes { bits: u32 },
    /// Raw `attrib` output, used when the native read failed
    AttribListing { listing: String },
}

impl PlatformExtra {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Preservable attributes of one file at one moment
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetadataSnapshot {
    pub mode: Option<u32>,
    pub timestamps: Option<Timestamps>,
    pub platform_extra: PlatformExtra,
}

impl MetadataSnapshot {
    /// A snapshot that carries nothing to apply
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.timestamps.is_none() && self.platform_extra.is_empty()
    }
}

/// Outcome of applying one field family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldOutcome {
    Applied,
    /// Nothing to apply on this platform, counted as success
    Skipped,
    Failed(String),
}

impl FieldOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for FieldOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => write!(f, "applied"),
            Self::Skipped => write!(f, "skipped"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Per-family result of [`apply_with_report`](super::apply_with_report)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub permissions: FieldOutcome,
    pub timestamps: FieldOutcome,
    pub platform_extra: FieldOutcome,
}

impl Default for ApplyReport {
    fn default() -> Self {
        Self {
            permissions: FieldOutcome::Skipped,
            timestamps: FieldOutcome::Skipped,
            platform_extra: FieldOutcome::Skipped,
        }
    }
}

impl ApplyReport {
    /// True iff no family failed
    pub fn is_complete(&self) -> bool {
        !self.permissions.is_failed()
            && !self.timestamps.is_failed()
            && !self.platform_extra.is_failed()
    }

    /// Names and reasons of the failed families
    pub fn failures(&self) -> Vec<(&'static str, &str)> {
        [
            ("permissions", &self.permissions),
            ("timestamps", &self.timestamps),
            ("platform_extra", &self.platform_extra),
        ]
        .into_iter()
        .filter_map(|(name, outcome)| match outcome {
            FieldOutcome::Failed(reason) => Some((name, reason.as_str())),
            _ => None,
        })
        .collect()
    }
}

/// Serde support for `FileTime` as `[seconds, nanoseconds]`
mod file_time {
    use filetime::FileTime;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(time: &FileTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (time.unix_seconds(), time.nanoseconds()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<FileTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (seconds, nanos) = <(i64, u32)>::deserialize(deserializer)?;
        Ok(FileTime::from_unix_time(seconds, nanos))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S>(time: &Option<FileTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            time.map(|t| (t.unix_seconds(), t.nanoseconds()))
                .serialize(serializer)
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<FileTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let pair = Option::<(i64, u32)>::deserialize(deserializer)?;
            Ok(pair.map(|(seconds, nanos)| FileTime::from_unix_time(seconds, nanos)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_completeness() {
        let mut report = ApplyReport::default();
        assert!(report.is_complete());

        report.permissions = FieldOutcome::Applied;
        report.platform_extra = FieldOutcome::Failed("chown: EPERM".into());
        assert!(!report.is_complete());
        assert_eq!(report.failures(), vec![("platform_extra", "chown: EPERM")]);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = MetadataSnapshot {
            mode: Some(0o100644),
            timestamps: Some(Timestamps {
                accessed: FileTime::from_unix_time(1_700_000_000, 0),
                modified: FileTime::from_unix_time(1_600_000_000, 500),
                created: None,
            }),
            platform_extra: PlatformExtra::Owner { uid: 1000, gid: 100 },
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["timestamps"]["modified"], serde_json::json!([1_600_000_000, 500]));
        assert_eq!(json["platform_extra"]["kind"], "owner");

        let back: MetadataSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_empty_snapshot() {
        assert!(MetadataSnapshot::empty().is_empty());
        let snapshot = MetadataSnapshot {
            platform_extra: PlatformExtra::Attributes { bits: 0x20 },
            ..Default::default()
        };
        assert!(!snapshot.is_empty());
    }
}
