use std::env;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use log::info;

use live_actor::camera::FPS_RATE;
use live_actor::{
    Actor, ActorGroup, AnimKeeperCache, AnimKind, FixedLightDirector, J3dTrackDecoder, LayerMask,
    PackedArchive, Placement, ResourceArchive, SubArchive, TrackDecoder, ViewerInput,
};

const PLACEMENT_FILE: &str = "placement.xml";

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let stage: Arc<dyn ResourceArchive> = Arc::new(
        PackedArchive::open(&options.path)
            .with_context(|| format!("failed to open stage {}", options.path))?,
    );
    let placement_xml = stage
        .find_file_data(PLACEMENT_FILE)
        .ok_or_else(|| anyhow!("stage has no {PLACEMENT_FILE}"))?;
    let placement_xml =
        std::str::from_utf8(&placement_xml).context("placement XML is not valid UTF-8")?;
    let placement = Placement::from_xml(placement_xml).context("failed to parse placement")?;

    let keepers = AnimKeeperCache::new();
    let decoder: Arc<dyn TrackDecoder> = Arc::new(J3dTrackDecoder);
    let scenario = LayerMask {
        layers: options.layers.clone(),
    };

    let mut group: ActorGroup<Actor> = ActorGroup::new("stage");
    for info in &placement.actors {
        let archive: Arc<dyn ResourceArchive> =
            Arc::new(SubArchive::new(Arc::clone(&stage), info.archive_name()));
        let mut actor = Actor::from_placement(
            info,
            placement.zone_matrix(info.zone_and_layer.zone_id),
            archive,
            Arc::clone(&decoder),
            &keepers,
        );
        actor.scenario_changed(&scenario);
        group.register_actor(actor);
    }

    println!(
        "Loaded stage with {} actors ({} animation tables)",
        group.len(),
        keepers.len()
    );
    for actor in group.iter() {
        let bck = actor
            .model()
            .and_then(|model| model.bound_track(AnimKind::Bck))
            .map(|track| track.name.as_str())
            .unwrap_or("-");
        println!(" - {} (bck {bck})", actor.name);
    }

    if !options.summary_only {
        simulate(&mut group, options.frames);
    }

    print_final_state(&group);
    Ok(())
}

fn simulate(group: &mut ActorGroup<Actor>, frames: u32) {
    let view_proj = ViewerInput::looking_at(Vec3::new(0.0, 500.0, 2000.0), Vec3::ZERO, 45.0, 16.0 / 9.0);
    let lights = FixedLightDirector::default();
    info!("Simulating {frames} frame(s)");

    for frame in 0..frames {
        let input = ViewerInput::new(view_proj, frame as f32 * FPS_RATE, FPS_RATE);
        let delta_frames = input.delta_time_frames();
        for actor in group.iter_mut() {
            actor.movement(delta_frames);
        }
        for actor in group.iter_mut() {
            actor.calc_view_and_entry(&input, &lights);
        }
    }
    println!("Simulated {frames} frame(s)");
}

fn print_final_state(group: &ActorGroup<Actor>) {
    println!(
        "Final actor states ({} alive):",
        group.living_actor_num()
    );
    for actor in group.iter() {
        let visible = actor.model().map(|model| model.visible).unwrap_or(false);
        println!(
            " - {} pos=({:.2}, {:.2}, {:.2}) scenario={} visible={}",
            actor.name,
            actor.translation.x,
            actor.translation.y,
            actor.translation.z,
            actor.is_visible_scenario(),
            visible
        );
    }
}

struct CliOptions {
    path: String,
    frames: u32,
    layers: Vec<u8>,
    summary_only: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(path) = args.next() else {
            return Err(anyhow!(
                "Usage: live-actor <stage.larc> [--frames N] [--layers ABC] [--summary-only]"
            ));
        };
        let mut frames = 60;
        let mut layers = Vec::new();
        let mut summary_only = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--frames" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--frames expects a value"))?;
                    frames = value
                        .parse()
                        .with_context(|| format!("invalid frame count {value}"))?;
                }
                "--layers" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--layers expects a value"))?;
                    for letter in value.chars() {
                        match live_actor::LayerId::parse(&letter.to_string())? {
                            live_actor::LayerId::Layer(index) => layers.push(index),
                            live_actor::LayerId::Common => {}
                        }
                    }
                }
                "--summary-only" => summary_only = true,
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --frames, --layers or --summary-only"
                    ));
                }
            }
        }
        Ok(Self {
            path,
            frames,
            layers,
            summary_only,
        })
    }
}
