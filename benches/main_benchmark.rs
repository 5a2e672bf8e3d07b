use criterion::{Criterion, criterion_group, criterion_main};
use modforge::config::{self, ForgeConfig};
use modforge::discovery;
use modforge::naming::{self, NameScheme};
use modforge::sync;
use std::hint::black_box;

const MOCK_CONFIG: &str = r#"
[build]
mode = "debug"
jobs = 4

[modules]
exclude = ["assets", "build", "docs", "firstparty", "thirdparty"]

[consumer]
dir = "lobby"
include_dirs = ["reseau/include", "common/include"]

[server]
dir = "reseau"
target = "server"
"#;

fn bench_library_name(c: &mut Criterion) {
    c.bench_function("library_name", |b| {
        b.iter(|| {
            let _ = naming::library_name(black_box("Physics-Engine"));
            let _ = naming::library_name(black_box("net_io"));
            let _ = naming::library_name(black_box("Audio"));
        })
    });
}

fn bench_config_parse(c: &mut Criterion) {
    c.bench_function("parse_forge_toml", |b| {
        b.iter(|| {
            let _: ForgeConfig = toml::from_str(black_box(MOCK_CONFIG)).unwrap();
        })
    });
}

fn bench_discover_modules(c: &mut Criterion) {
    // Setup a temp project with a realistic number of modules
    let temp_dir = std::env::temp_dir().join("modforge_bench_discover");
    if !temp_dir.exists() {
        for i in 0..32 {
            std::fs::create_dir_all(temp_dir.join(format!("module_{i}"))).unwrap();
        }
        for name in ["build", "docs", "lobby", "thirdparty"] {
            std::fs::create_dir_all(temp_dir.join(name)).unwrap();
        }
    }
    let config = ForgeConfig::default();
    let excluded = discovery::exclusion_set(&config);
    let scheme = NameScheme::default();

    c.bench_function("discover_modules_32", |b| {
        b.iter(|| discovery::discover_modules(black_box(&temp_dir), &excluded, &scheme).unwrap())
    });
}

fn bench_sync_unchanged(c: &mut Criterion) {
    let temp_dir = std::env::temp_dir().join("modforge_bench_sync");
    std::fs::create_dir_all(&temp_dir).unwrap();
    let source = temp_dir.join("libaudio.a");
    let dest = temp_dir.join("shared/libaudio.a");
    let payload: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();
    std::fs::write(&source, &payload).unwrap();
    sync::sync_artifact(&source, &dest).unwrap();

    c.bench_function("sync_artifact_unchanged_256k", |b| {
        b.iter(|| sync::sync_artifact(black_box(&source), black_box(&dest)).unwrap())
    });
}

fn bench_load_config_absent(c: &mut Criterion) {
    let temp_dir = std::env::temp_dir().join("modforge_bench_noconfig");
    std::fs::create_dir_all(&temp_dir).unwrap();

    c.bench_function("load_config_defaults", |b| {
        b.iter(|| config::load_config(black_box(&temp_dir)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_library_name,
    bench_config_parse,
    bench_discover_modules,
    bench_sync_unchanged,
    bench_load_config_absent
);
criterion_main!(benches);
