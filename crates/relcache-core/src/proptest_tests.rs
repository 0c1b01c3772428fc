//! Property-based tests for relcache-core types.
//!
//! These tests use proptest to verify invariants across many randomly generated inputs.

use std::path::Path;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use crate::{
    resolve, CacheRoots, HostInfo, LocalIndex, LocationKind, NativeBuild, NativeKind,
    ResolveContext, ResourceId, ResourceSpec,
};

/// Strategy for generating identifier segments.
fn segment_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.-]{0,20}"
}

/// Strategy for generating release tags.
fn tag_strategy() -> impl Strategy<Value = String> {
    (0u32..20, 0u32..50, 0u32..100).prop_map(|(a, b, c)| format!("v{a}.{b}.{c}"))
}

/// Strategy for generating native kinds.
fn native_kind_strategy() -> impl Strategy<Value = NativeKind> {
    prop_oneof![Just(NativeKind::Napi), Just(NativeKind::Node)]
}

proptest! {
    #[test]
    fn canonical_id_round_trips(
        owner in segment_strategy(),
        collection in segment_strategy(),
        tag in tag_strategy(),
        artifact in segment_strategy(),
    ) {
        let id = ResourceId::new(&owner, &collection, &tag, &artifact).unwrap();
        let text = id.to_string();
        prop_assert_eq!(text.split('/').count(), 4);
        let parsed: ResourceId = text.parse().unwrap();
        prop_assert_eq!(parsed, id);
    }

    #[test]
    fn resolve_is_deterministic(
        owner in segment_strategy(),
        collection in segment_strategy(),
        tag in tag_strategy(),
        kind in native_kind_strategy(),
        abi in 1u32..200,
    ) {
        let host = HostInfo::new("linux", "x64").with_abi_version(kind, abi.to_string());
        let roots = CacheRoots::new("/cache");
        let ctx = ResolveContext {
            caller_location: Path::new("/"),
            host: &host,
            roots: &roots,
        };

        // The package location needs a manifest on disk; keep it to the global root.
        let spec = ResourceSpec::new(format!("{owner}/{collection}"))
            .with_tag(&tag)
            .with_native(NativeBuild::new(kind))
            .with_location(LocationKind::Global);

        let first = resolve(&spec.clone().into(), &ctx).unwrap();
        let second = resolve(&spec.into(), &ctx).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.id.name(), format!("{kind}-v{abi}-linux-x64"));
        prop_assert!(first.location.starts_with("/cache"));
    }

    #[test]
    fn local_index_dates_round_trip(
        secs in 0i64..4_000_000_000,
        etag in "[a-f0-9]{8,40}",
    ) {
        let at = Utc.timestamp_opt(secs, 0).unwrap();
        let index = LocalIndex {
            id: "o/c/t/a".to_string(),
            etag: Some(etag),
            expires: Some(at),
            last_checked: Some(at),
            last_updated: Some(at),
            ..Default::default()
        };

        let json = serde_json::to_string(&index).unwrap();
        let back: LocalIndex = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, index);
    }
}
