use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use uuid::Uuid;

use syncpad_core::{AccessLevel, DocumentChange, DocumentPatch, Identity, Language};

fn bench_access_resolve(c: &mut Criterion) {
    let owner = Uuid::new_v4();
    let me = Identity::new(Uuid::new_v4(), "user50@x.com");
    let shared: Vec<String> = (0..100).map(|i| format!("user{i}@x.com")).collect();

    c.bench_function("access_resolve_100_emails", |b| {
        b.iter(|| {
            black_box(AccessLevel::resolve(
                black_box(Some(&me)),
                black_box(owner),
                black_box(&shared),
            ))
        })
    });
}

fn bench_change_decode(c: &mut Criterion) {
    // Typical frame: one slot of editor-sized content plus a share list.
    let code = "print(\"hello\")\n".repeat(64);
    let frame = format!(
        r#"{{"language":"python","language_content":{{"python":{:?}}},"shared_emails":["a@x.com","b@x.com"]}}"#,
        code
    );

    c.bench_function("change_decode_1kB", |b| {
        b.iter(|| {
            let change: DocumentChange =
                serde_json::from_str(black_box(&frame)).unwrap();
            black_box(change);
        })
    });
}

fn bench_patch_encode(c: &mut Criterion) {
    let mut map = HashMap::new();
    map.insert(Language::Python, "print(\"hello\")\n".repeat(64));
    map.insert(Language::Java, "class Main {}\n".repeat(32));
    let patch = DocumentPatch::content(map, Language::Python);

    c.bench_function("patch_encode_full_map", |b| {
        b.iter(|| {
            black_box(serde_json::to_string(black_box(&patch)).unwrap());
        })
    });
}

fn bench_echo_compare(c: &mut Criterion) {
    // The inbound guard is a string compare against last_sent.
    let sent = "print(\"hello\")\n".repeat(256);
    let incoming = sent.clone();

    c.bench_function("echo_compare_4kB", |b| {
        b.iter(|| black_box(black_box(&incoming) == black_box(&sent)))
    });
}

criterion_group!(
    benches,
    bench_access_resolve,
    bench_change_decode,
    bench_patch_encode,
    bench_echo_compare
);
criterion_main!(benches);
