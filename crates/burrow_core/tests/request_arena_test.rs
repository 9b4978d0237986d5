//! Integration test for per-request arenas.
//!
//! A request handler parses header lines into an arena, indexes them in a
//! hash table and keeps their order in a dynamic array. Everything goes away
//! with the arena.

use burrow_core::{
    Arena, DynArray, HashTable, PoolConfig, PoolError, StrView, TableConfig, WORD,
};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const REQUEST: &str = "Host: example.org\r\n\
User-Agent: probe/1.0\r\n\
Accept: text/html\r\n\
Connection: keep-alive\r\n\
X-Forwarded-For: 10.0.0.1\r\n";

/// One parsed header line, stored by value in the containers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct Header {
    name: StrView,
    value: StrView,
}

fn name_key(name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    name.to_ascii_lowercase().hash(&mut hasher);
    hasher.finish()
}

fn parse<'a>(
    arena: &'a Arena,
    request: &str,
) -> (HashTable<'a, u64, Header>, DynArray<'a, Header>) {
    let mut index = HashTable::new(arena).unwrap();
    let mut order = DynArray::new(arena);

    for line in request.split("\r\n").filter(|line| !line.is_empty()) {
        let (name, value) = line.split_once(": ").unwrap();
        let header = Header {
            name: arena.duplicate_str(name).unwrap(),
            value: arena.duplicate_str(value).unwrap(),
        };
        index.set(name_key(name), header).unwrap();
        order.push_back(header).unwrap();
    }
    (index, order)
}

#[test]
fn test_request_headers_round_trip() {
    let arena = Arena::new(256).unwrap();
    let (index, order) = parse(&arena, REQUEST);

    assert_eq!(index.len(), 5);
    assert_eq!(order.len(), 5);

    let host = index.get(&name_key("HOST")).unwrap();
    assert!(arena.view_eq(&host.value, "example.org"));

    let first = order.first().unwrap();
    assert!(arena.view_eq(&first.name, "Host"));
    let last = order.last().unwrap();
    assert!(arena.view_eq(&last.value, "10.0.0.1"));

    // The bucket array alone outgrows a 256-byte root.
    assert!(arena.region_count() > 1);
}

#[test]
fn test_search_inside_header_values() {
    let arena = Arena::new(4096).unwrap();
    let (index, _) = parse(&arena, REQUEST);

    let connection = index.get(&name_key("connection")).unwrap();
    let needle = arena.duplicate_str("ALIVE").unwrap();
    assert_eq!(arena.find_in(&connection.value, &needle), None);
    assert_eq!(arena.find_in_ignore_case(&connection.value, &needle), Some(5));

    let empty = arena.duplicate_cstring(None).unwrap();
    assert_eq!(arena.find_in(&connection.value, &empty), Some(0));
    assert_eq!(arena.find_in(&empty, &empty), None);
}

#[test]
fn test_drop_headers_by_predicate() {
    let arena = Arena::new(4096).unwrap();
    let (mut index, mut order) = parse(&arena, REQUEST);

    let removed = order.remove_if(|header| {
        arena
            .view_bytes(&header.name)
            .starts_with(b"X-")
    });
    assert_eq!(removed, 1);
    assert!(index.remove(&name_key("x-forwarded-for")));

    let names: Vec<String> = order
        .iter()
        .map(|header| String::from_utf8(arena.view_bytes(&header.name).to_vec()).unwrap())
        .collect();
    assert_eq!(names, ["Host", "User-Agent", "Accept", "Connection"]);
    assert_eq!(index.len(), 4);
}

#[test]
fn test_sixty_four_byte_arena() {
    let arena = Arena::new(64).unwrap();
    let first = arena.allocate_aligned(40).unwrap();
    let second = arena.allocate_aligned(40).unwrap();

    assert_eq!(first.region(), 0);
    assert_ne!(second.region(), first.region());
    assert_eq!(arena.estimate_total_capacity(), 128);
    assert_eq!(arena.address_of(&second) % WORD, 0);
}

#[test]
fn test_earlier_bytes_survive_everything() {
    let arena = Arena::new(128).unwrap();
    let marker = arena.duplicate_str("still here").unwrap();

    let mut table: HashTable<'_, u32, u32> = HashTable::new(&arena).unwrap();
    let mut array: DynArray<'_, u32> = DynArray::new(&arena);
    for value in 0..500 {
        table.set(value, value).unwrap();
        array.push_back(value).unwrap();
    }
    let _ = arena.allocate_zeroed(10_000).unwrap();

    assert_eq!(table.bucket_count(), 1024);
    assert!(arena.view_eq(&marker, "still here"));
}

#[test]
fn test_resize_boundary() {
    let arena = Arena::new(64 * 1024).unwrap();
    let mut table: HashTable<'_, u32, u32> = HashTable::new(&arena).unwrap();

    for key in 0..179 {
        table.set(key, key + 1).unwrap();
    }
    assert_eq!(table.bucket_count(), 256);

    table.set(179, 180).unwrap();
    assert_eq!(table.bucket_count(), 1024);
    assert_eq!(table.len(), 180);
    assert!((0..180).all(|key| table.get(&key) == Some(key + 1)));
    assert_eq!(table.iter().count(), 180);
}

#[test]
fn test_built_from_config_file_text() {
    let config = PoolConfig::from_toml_str(
        "[arena]\nregion_capacity = 2048\n\n[table]\ninitial_buckets = 16\ngrowth_factor = 2\n",
    )
    .unwrap();

    let arena = Arena::from_config(&config.arena).unwrap();
    let mut table: HashTable<'_, u16, u16> = HashTable::with_config(&arena, config.table).unwrap();
    assert_eq!(arena.capacity(), 2048);
    assert_eq!(table.grow_threshold(), 11);

    for key in 0..12 {
        table.set(key, key).unwrap();
    }
    assert_eq!(table.bucket_count(), 32);
}

#[test]
fn test_over_aligned_types_rejected() {
    #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
    #[repr(C, align(32))]
    struct Wide([u8; 32]);

    let arena = Arena::new(1024).unwrap();
    let table: Result<HashTable<'_, u32, Wide>, _> =
        HashTable::with_config(&arena, TableConfig::default());
    assert!(matches!(
        table.err(),
        Some(PoolError::UnsupportedLayout { align: 32, .. })
    ));

    let mut array: DynArray<'_, Wide> = DynArray::new(&arena);
    assert!(array.push_back(Wide([0; 32])).is_err());
    assert!(arena.alloc_value(&Wide([1; 32])).is_err());
}
