//! Deterministic, path-derived identifiers

use uuid::Uuid;

use crate::model::{Identifier, SnapshotId};

/// Separator used when a name path is rendered as a single string.
pub const PATH_SEPARATOR: &str = " -> ";

/// Join a name path with [`PATH_SEPARATOR`].
pub fn format_path<S: AsRef<str>>(path: &[S]) -> String {
    path.iter()
        .map(|part| part.as_ref())
        .collect::<Vec<_>>()
        .join(PATH_SEPARATOR)
}

/// UUIDv5 (URL namespace) over the formatted path. Pure; safe to call from
/// any number of concurrent builds.
pub fn identifier_for<S: AsRef<str>>(path: &[S]) -> Identifier {
    let formatted = format_path(path);
    Identifier(Uuid::new_v5(&Uuid::NAMESPACE_URL, formatted.as_bytes()))
}

/// The path segment a position contributes on top of its unit's path.
///
/// The raw norms text is folded in so that two incumbents of the same post
/// appointed under different norms do not collide.
pub fn position_segment(
    position_name: &str,
    order: &str,
    raw_norms: &str,
    last_name: &str,
    first_name: &str,
) -> String {
    format!("{position_name} ({order}) [{raw_norms}]: {last_name}, {first_name}")
}

impl SnapshotId {
    pub fn for_key(source_path: &str, central_administration_only: bool) -> Self {
        let key = format!("{source_path}#central={central_administration_only}");
        SnapshotId(Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_matches_uuid5_url_namespace() {
        let id = identifier_for(&["Presidencia de la Nación"]);
        assert_eq!(id.to_string(), "8ff78f93-3c33-56d7-9b30-d34f8e5bbde2");

        let id = identifier_for(&["Presidencia de la Nación", "Ministry X", "Directorate Y"]);
        assert_eq!(id.to_string(), "3dc7a158-108f-5f1d-91ee-4274f0cc09f4");
    }

    #[test]
    fn test_identifier_is_order_sensitive() {
        let a = identifier_for(&["A", "B"]);
        let b = identifier_for(&["B", "A"]);
        assert_ne!(a, b);
        assert_eq!(a, identifier_for(&vec!["A".to_string(), "B".to_string()]));
    }

    #[test]
    fn test_position_segment_layout() {
        let segment = position_segment("Director", "1", "Dto. 50/2019", "Pérez", "Ana");
        assert_eq!(segment, "Director (1) [Dto. 50/2019]: Pérez, Ana");
    }

    #[test]
    fn test_snapshot_id_depends_on_filter() {
        let central = SnapshotId::for_key("data/2023.csv", true);
        let all = SnapshotId::for_key("data/2023.csv", false);
        assert_ne!(central, all);
        assert_eq!(central, SnapshotId::for_key("data/2023.csv", true));
    }
}
