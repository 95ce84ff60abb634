//! Vantage - headless camera engine host
//!
//! Drives a camera context against a recording sink with a fixed frame
//! rate, simulating a user interaction, a projection switch and a preset
//! jump along the way.

mod settings;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;
use vantage_camera::{
    CameraContext, CameraEvent, CameraViewPreset, FileStore, KeyValueStore, MemoryStore,
    MotionType, ProjectionMode, RecordingSink, TransitionOptions,
};
use vantage_core::Vec3;

use settings::HostSettings;

fn open_store(settings: &HostSettings) -> Box<dyn KeyValueStore> {
    if !settings.storage.persist {
        return Box::new(MemoryStore::new());
    }
    let store = match &settings.storage.data_dir {
        Some(dir) => Some(FileStore::new(dir.clone())),
        None => FileStore::default_location(),
    };
    match store {
        Some(store) => {
            info!("Using data directory {:?}", store.dir());
            Box::new(store)
        }
        None => {
            info!("No data directory available, keeping presets in memory");
            Box::new(MemoryStore::new())
        }
    }
}

fn main() -> Result<()> {
    let (settings, origin) = HostSettings::load();
    let env_level = std::env::var(settings::LOG_ENV).ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.max_level(env_level.as_deref()))
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;
    origin.log();

    info!("Starting Vantage camera engine...");

    let mut store = open_store(&settings);
    let mut context = CameraContext::new(settings.engine.clone());
    context.load(store.as_ref());

    let _lifecycle = context.events().subscribe(|event| match event {
        CameraEvent::PoseChanged { .. } | CameraEvent::MotionProgress { .. } => {}
        other => info!("event {}", other.name()),
    });

    let sink = RecordingSink::new(settings.engine.initial_pose);
    context.bind(Box::new(sink.clone()));

    let motion_type = MotionType::from_name(&settings.demo.motion);
    context.motion_mut().start(motion_type, None);
    for point in context
        .motion()
        .generate_preview(context.motion().trajectory().period(), settings.demo.preview_samples)
    {
        info!(
            "preview t={:.2}s position=({:.2}, {:.2}, {:.2}) fov={:.1}",
            point.time, point.position.x, point.position.y, point.position.z, point.fov
        );
    }

    let projection = settings
        .demo
        .projection
        .as_deref()
        .and_then(ProjectionMode::from_name);
    context
        .animator_mut()
        .transitions_mut()
        .set_last_projection_mode(Some(ProjectionMode::Plane));

    let frames = settings.demo.frames;
    let delta = settings.demo.frame_delta();
    let grab_at = frames / 5;
    let release_at = grab_at + frames / 10;
    let switch_at = frames / 2;
    let preset_at = frames * 3 / 4;

    for frame in 0..frames {
        if frame == grab_at {
            context.animator_mut().set_user_interacting(true);
            let mut pose = sink.pose();
            pose.position += Vec3::new(1.5, 0.5, 0.0);
            sink.set_pose(pose);
        }
        if frame == release_at {
            context.animator_mut().set_user_interacting(false);
            context.camera_mut().save_bookmark("after-drag");
        }
        if frame == switch_at {
            if let Some(mode) = projection {
                context
                    .animator_mut()
                    .transition_projection(mode, TransitionOptions::new());
            }
        }
        if frame == preset_at {
            context.camera_mut().apply_preset(CameraViewPreset::Iso);
        }
        context.tick(delta);
    }

    let pose = *context.camera().pose();
    info!(
        "Finished {} frames: {} sink writes, history {}/{}, position=({:.2}, {:.2}, {:.2}) fov={:.1}",
        frames,
        sink.write_count(),
        context.camera().history().current_index() + 1,
        context.camera().history().len(),
        pose.position.x,
        pose.position.y,
        pose.position.z,
        pose.fov
    );

    context.save_motion_preset("last-run");
    if !context.save(store.as_mut()) {
        warn!("Bookmarks or presets were not saved");
    }
    if settings.storage.persist {
        if let Err(e) = settings.save() {
            warn!("Failed to save settings: {:#}", e);
        }
    }

    Ok(())
}
