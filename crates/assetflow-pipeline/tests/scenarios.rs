//! End-to-end loading scenarios on real files.

use assetflow_core::{GroupSpec, LoadError, Manifest, NamedEvent, Resource};
use assetflow_loader::{
    ExtensionLoader, GltfDecoder, HandlerRegistry, ImageHandler, ModelAsset, ModelDecoder,
    ModelHandler,
};
use assetflow_pipeline::{GroupSequencer, PipelineEvent, SetupError};
use assetflow_settings::{PipelineConfig, SettingsError};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbaImage};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

const MINIMAL_GLTF: &str = r#"{"asset":{"version":"2.0"},"nodes":[{"name":"root"}]}"#;
const DRACO_GLTF: &str = r#"{
    "asset": {"version": "2.0"},
    "extensionsUsed": ["KHR_draco_mesh_compression"],
    "extensionsRequired": ["KHR_draco_mesh_compression"]
}"#;
const DANGLING_MESH_GLTF: &str = r#"{"asset":{"version":"2.0"},"nodes":[{"mesh":7}]}"#;
const EXTERNAL_BUFFER_GLTF: &str = r#"{
    "asset": {"version": "2.0"},
    "buffers": [{"uri": "room.bin", "byteLength": 8}],
    "nodes": [{"name": "root"}]
}"#;

fn write_png(dir: &TempDir, name: &str) {
    DynamicImage::ImageRgba8(RgbaImage::new(2, 2))
        .save_with_format(dir.path().join(name), ImageFormat::Png)
        .unwrap();
}

fn config_for(dir: &TempDir) -> PipelineConfig {
    let mut config = PipelineConfig::new();
    config.loader.asset_root = dir.path().to_path_buf();
    config.watchdog.enabled = false;
    config
}

/// Records every sequencer event by description.
fn record(pipeline: &GroupSequencer) -> Arc<Mutex<Vec<String>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    pipeline
        .events()
        .subscribe("progress, error, groupEnd, end", move |event: &PipelineEvent| {
            sink.lock().push(event.description())
        })
        .unwrap();
    log
}

/// Names of resources whose `progress` carried no item.
fn record_empty_payloads(pipeline: &GroupSequencer) -> Arc<Mutex<Vec<String>>> {
    let empty = Arc::new(Mutex::new(Vec::new()));
    let sink = empty.clone();
    pipeline
        .events()
        .subscribe("progress", move |event: &PipelineEvent| {
            if let PipelineEvent::Progress {
                resource,
                item: None,
                ..
            } = event
            {
                sink.lock().push(resource.name.clone());
            }
        })
        .unwrap();
    empty
}

#[tokio::test]
async fn test_mixed_group_with_unknown_extension() {
    let dir = tempdir().unwrap();
    write_png(&dir, "a.png");
    std::fs::write(dir.path().join("b.glb"), MINIMAL_GLTF).unwrap();
    std::fs::write(dir.path().join("c.xyz"), "???").unwrap();

    let manifest = Manifest::new(vec![GroupSpec::new(
        "g1",
        vec![
            Resource::texture("a", "/a.png"),
            Resource::model("b", "/b.glb"),
            Resource::other("c", "/c.xyz"),
        ],
    )]);
    let mut pipeline = GroupSequencer::from_config(manifest, &config_for(&dir)).unwrap();
    let log = record(&pipeline);

    pipeline.run().await.unwrap();

    let log = log.lock();
    assert_eq!(log.iter().filter(|e| e.starts_with("progress")).count(), 2);
    assert!(log.contains(&"progress g1/a".to_string()));
    assert!(log.contains(&"progress g1/b".to_string()));
    assert!(log.contains(&"error g1/c".to_string()));
    assert_eq!(log.iter().filter(|e| *e == "groupEnd g1").count(), 1);
    assert_eq!(log.last().map(String::as_str), Some("end"));
    assert_eq!(log.iter().filter(|e| *e == "end").count(), 1);

    let a = pipeline.item("a").unwrap();
    let texture = a.as_texture().unwrap();
    assert!(texture.needs_update());
    assert_eq!(texture.image().unwrap().dimensions(), Some((2, 2)));
    assert!(pipeline.item("b").unwrap().as_model().is_some());
    assert!(!pipeline.items().contains("c"));
}

#[tokio::test]
async fn test_two_groups_in_order() {
    let dir = tempdir().unwrap();
    for name in ["one.png", "two.png", "three.png"] {
        write_png(&dir, name);
    }
    let manifest = Manifest::new(vec![
        GroupSpec::new("g1", vec![Resource::other("one", "one.png")]),
        GroupSpec::new(
            "g2",
            vec![
                Resource::other("two", "two.png"),
                Resource::other("three", "three.png"),
            ],
        ),
    ]);
    let mut pipeline = GroupSequencer::from_config(manifest, &config_for(&dir)).unwrap();
    let log = record(&pipeline);

    pipeline.run().await.unwrap();

    let log = log.lock();
    assert_eq!(log.len(), 6);
    assert_eq!(log[0], "progress g1/one");
    assert_eq!(log[1], "groupEnd g1");
    let mut middle = vec![log[2].clone(), log[3].clone()];
    middle.sort();
    assert_eq!(middle, vec!["progress g2/three", "progress g2/two"]);
    assert_eq!(log[4], "groupEnd g2");
    assert_eq!(log[5], "end");
}

#[tokio::test]
async fn test_loading_bar_from_group_counters() {
    let dir = tempdir().unwrap();
    for name in ["one.png", "two.png", "three.png"] {
        write_png(&dir, name);
    }
    let manifest = Manifest::new(vec![GroupSpec::new(
        "ui",
        vec![
            Resource::texture("one", "one.png"),
            Resource::texture("two", "two.png"),
            Resource::texture("three", "three.png"),
            Resource::other("four", "four.xyz"),
        ],
    )]);
    let mut pipeline = GroupSequencer::from_config(manifest, &config_for(&dir)).unwrap();

    let bar = Arc::new(Mutex::new(Vec::new()));
    let sink = bar.clone();
    pipeline
        .events()
        .subscribe("progress error groupEnd", move |event: &PipelineEvent| {
            if let Some(group) = event.group() {
                sink.lock().push(format!("{}/{}", group.loaded(), group.to_load()));
            }
        })
        .unwrap();
    pipeline.run().await.unwrap();

    assert_eq!(*bar.lock(), vec!["1/4", "2/4", "3/4", "4/4", "4/4"]);
}

struct BrokenDecoder;

#[async_trait]
impl ModelDecoder for BrokenDecoder {
    fn name(&self) -> &str {
        "broken"
    }

    async fn decode(
        &self,
        resource: &Resource,
        _bytes: Arc<[u8]>,
        _base: &Path,
    ) -> Result<ModelAsset, LoadError> {
        Err(LoadError::ModelLoad {
            name: resource.name.clone(),
            reason: "decoder crashed".to_string(),
        })
    }
}

#[tokio::test]
async fn test_model_recovered_by_fallback_decoder() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("room.gltf"), MINIMAL_GLTF).unwrap();

    let mut registry = HandlerRegistry::new();
    registry
        .register(ImageHandler::new(dir.path()))
        .register(ModelHandler::with_decoders(
            dir.path(),
            Arc::new(BrokenDecoder),
            Arc::new(GltfDecoder::document()),
        ));
    let manifest = Manifest::new(vec![GroupSpec::new(
        "models",
        vec![Resource::model("room", "room.gltf")],
    )]);
    let mut pipeline = GroupSequencer::new(manifest, ExtensionLoader::new(registry)).unwrap();
    let log = record(&pipeline);

    pipeline.run().await.unwrap();

    assert_eq!(
        *log.lock(),
        vec!["progress models/room", "groupEnd models", "end"]
    );
    let room = pipeline.item("room").unwrap();
    let model = room.as_model().unwrap();
    assert_eq!(model.decoder(), "gltf");
    assert_eq!(model.node_count(), 1);
}

#[tokio::test]
async fn test_missing_buffer_falls_back_to_document() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("room.gltf"), EXTERNAL_BUFFER_GLTF).unwrap();

    let manifest = Manifest::new(vec![GroupSpec::new(
        "g1",
        vec![Resource::model("room", "room.gltf")],
    )]);
    let mut pipeline = GroupSequencer::from_config(manifest, &config_for(&dir)).unwrap();
    let log = record(&pipeline);
    pipeline.run().await.unwrap();

    assert_eq!(*log.lock(), vec!["progress g1/room", "groupEnd g1", "end"]);
    let room = pipeline.item("room").unwrap();
    let model = room.as_model().unwrap();
    assert_eq!(model.decoder(), "gltf");
    assert!(model.buffers().is_empty());
}

#[tokio::test]
async fn test_model_with_external_buffer_is_imported() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("models")).unwrap();
    std::fs::write(dir.path().join("models/room.gltf"), EXTERNAL_BUFFER_GLTF).unwrap();
    std::fs::write(dir.path().join("models/room.bin"), [7u8; 8]).unwrap();

    let manifest = Manifest::new(vec![GroupSpec::new(
        "g1",
        vec![Resource::model("room", "/models/room.gltf")],
    )]);
    let mut pipeline = GroupSequencer::from_config(manifest, &config_for(&dir)).unwrap();
    pipeline.run().await.unwrap();

    let room = pipeline.item("room").unwrap();
    let model = room.as_model().unwrap();
    assert_eq!(model.decoder(), "gltf-import");
    assert_eq!(&model.buffers()[0][..8], &[7u8; 8]);
}

#[tokio::test]
async fn test_model_failing_both_decoders_still_finishes() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("room.gltf"), DRACO_GLTF).unwrap();
    write_png(&dir, "wall.png");

    let manifest = Manifest::new(vec![GroupSpec::new(
        "g1",
        vec![
            Resource::model("room", "room.gltf"),
            Resource::texture("wall", "wall.png"),
        ],
    )]);
    let mut pipeline = GroupSequencer::from_config(manifest, &config_for(&dir)).unwrap();
    let empty_payloads = record_empty_payloads(&pipeline);
    let log = record(&pipeline);

    pipeline.run().await.unwrap();

    assert_eq!(*empty_payloads.lock(), vec!["room"]);
    assert!(pipeline.items().contains("room"));
    assert!(pipeline.item("room").is_none());
    assert!(pipeline.item("wall").is_some());
    assert_eq!(log.lock().last().map(String::as_str), Some("end"));
}

#[tokio::test]
async fn test_invalid_model_is_an_empty_payload() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("room.gltf"), DANGLING_MESH_GLTF).unwrap();

    let manifest = Manifest::new(vec![GroupSpec::new(
        "g1",
        vec![Resource::model("room", "room.gltf")],
    )]);
    let mut pipeline = GroupSequencer::from_config(manifest, &config_for(&dir)).unwrap();
    let empty_payloads = record_empty_payloads(&pipeline);
    pipeline.run().await.unwrap();

    assert_eq!(*empty_payloads.lock(), vec!["room"]);
    assert!(pipeline.item("room").is_none());
}

#[tokio::test]
async fn test_degraded_image_is_still_progress() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("broken.jpg"), b"not a jpeg").unwrap();

    let manifest = Manifest::new(vec![GroupSpec::new(
        "g1",
        vec![Resource::texture("broken", "broken.jpg")],
    )]);
    let mut pipeline = GroupSequencer::from_config(manifest, &config_for(&dir)).unwrap();
    let log = record(&pipeline);
    pipeline.run().await.unwrap();

    assert_eq!(log.lock()[0], "progress g1/broken");
    let item = pipeline.item("broken").unwrap();
    let image = item.as_texture().unwrap().image().unwrap().clone();
    assert!(image.is_degraded());
}

#[test]
fn test_duplicate_names_rejected_before_loading() {
    let dir = tempdir().unwrap();
    let manifest = Manifest::new(vec![
        GroupSpec::new("g1", vec![Resource::other("x", "x.png")]),
        GroupSpec::new("g2", vec![Resource::other("x", "y.png")]),
    ]);
    let err = GroupSequencer::from_config(manifest, &config_for(&dir)).unwrap_err();
    assert!(err.is_manifest_error());
}

#[test]
fn test_invalid_config_keeps_settings_error() {
    let dir = tempdir().unwrap();
    let mut config = config_for(&dir);
    config.events.channel_capacity = 0;

    let err = GroupSequencer::from_config(Manifest::default(), &config).unwrap_err();
    assert!(err.is_config_error());
    assert!(matches!(
        err,
        SetupError::Config(SettingsError::InvalidSetting { ref key, .. })
            if key == "events.channel_capacity"
    ));
}
