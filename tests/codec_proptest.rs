//! Property-based tests for the cache codec and the cache block rewrite

use enna::enna::codec::{self, CachePayload, ModuleEntry, TableData};
use enna::{parse, Template};
use proptest::prelude::*;

fn table() -> impl Strategy<Value = TableData> {
    (1usize..4, 0usize..4).prop_flat_map(|(columns, rows)| {
        (
            prop::collection::vec("[a-z_]{1,8}", columns),
            prop::collection::vec(prop::collection::vec(".{0,12}", columns), rows),
        )
            .prop_map(|(column_names, data)| TableData { column_names, data })
    })
}

fn payload() -> impl Strategy<Value = CachePayload> {
    (
        prop::collection::btree_map("[a-z_]{1,12}", table(), 0..4),
        prop::collection::vec(("[a-z]{1,8}", "[a-z =0-9\n]{0,30}"), 0..3),
    )
        .prop_map(|(table_data, modules)| CachePayload {
            table_data,
            modules: modules
                .into_iter()
                .map(|(name, source)| ModuleEntry { name, source })
                .collect(),
            ..CachePayload::default()
        })
}

/// Template text that cannot contain a cache block of its own
fn plain_source() -> impl Strategy<Value = String> {
    "[a-z \n]{0,80}"
}

proptest! {
    #[test]
    fn decode_inverts_encode(bytes in prop::collection::vec(any::<u8>(), 0..4096)) {
        let encoded = codec::encode(&bytes);
        prop_assert_eq!(codec::decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn decode_inverts_encode_on_repetitive_input(
        bytes in prop::collection::vec(prop::sample::select(b"ab".to_vec()), 0..20000)
    ) {
        let encoded = codec::encode(&bytes);
        prop_assert_eq!(codec::decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn encoded_bytes_are_printable(bytes in prop::collection::vec(any::<u8>(), 0..1024)) {
        let encoded = codec::encode(&bytes);
        prop_assert!(encoded.iter().all(|b| (b'0'..=b'o').contains(b)));
        prop_assert!(!encoded.contains(&b'$') && !encoded.contains(&b'\'') && !encoded.contains(&b'\n'));
    }

    #[test]
    fn wrapped_lines_rejoin(bytes in prop::collection::vec(any::<u8>(), 0..2048), width in 1usize..200) {
        let encoded = codec::encode(&bytes);
        let lines = codec::wrap(&encoded, width);
        prop_assert!(lines.iter().all(|line| line.len() <= width));
        prop_assert_eq!(lines.concat(), encoded);
    }

    #[test]
    fn stored_payload_loads_back(source in plain_source(), payload in payload()) {
        let template = Template::parse(source.as_str());
        let stored = payload.store(template.source(), template.cache(), codec::DEFAULT_LINE_WIDTH).unwrap();

        let reparsed = parse(&stored);
        prop_assert!(reparsed.errors.is_empty(), "{:?}", reparsed.errors);
        prop_assert!(reparsed.cache.found);
        prop_assert_eq!(CachePayload::load(&stored, &reparsed.cache), payload);
    }

    #[test]
    fn rewrite_is_idempotent(source in plain_source(), payload in payload()) {
        let template = Template::parse(source.as_str());
        let once = payload.store(template.source(), template.cache(), codec::DEFAULT_LINE_WIDTH).unwrap();

        let stored = Template::parse(once.clone());
        let twice = payload.store(stored.source(), stored.cache(), codec::DEFAULT_LINE_WIDTH).unwrap();
        prop_assert_eq!(once, twice);
    }
}
