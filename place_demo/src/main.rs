//! Place indexing demo
//!
//! Scatters static obstacles and wandering agents over a place, then runs a
//! number of ticks: agents take a random step (write phase) and every agent
//! perceives its surroundings (read phase).

use clap::{Arg, Command};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shagam_tree::prelude::*;

const DEFAULT_AGENTS: &str = "500";
const DEFAULT_OBSTACLES: &str = "2000";
const DEFAULT_TICKS: &str = "20";
const DEFAULT_SEED: &str = "7";

/// Half size of an agent's bounding box
const AGENT_RADIUS: f64 = 0.5;
/// Largest distance an agent moves per tick, per axis
const STEP: f64 = 4.0;
/// Perception range around each agent
const REACH: f64 = 10.0;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("Invalid value for --{name}: {value}")]
    InvalidArgument { name: &'static str, value: String },
}

#[derive(Debug)]
struct DemoConfig {
    place: PlaceConfig,
    agents: u32,
    obstacles: u32,
    ticks: u64,
    seed: u64,
}

fn parse_arg<T: std::str::FromStr>(matches: &clap::ArgMatches, name: &'static str) -> Result<T, DemoError> {
    let value = matches.get_one::<String>(name).cloned().unwrap_or_default();
    value
        .parse()
        .map_err(|_| DemoError::InvalidArgument { name, value })
}

fn parse_command_line() -> Result<DemoConfig, Box<dyn std::error::Error>> {
    let matches = Command::new("place_demo")
        .about("Runs simulated ticks over an obstacle tree and an agent tree")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Place configuration (.toml or .ron); written with defaults if missing"),
        )
        .arg(
            Arg::new("agents")
                .short('a')
                .long("agents")
                .value_name("COUNT")
                .help("Number of mobile agents")
                .default_value(DEFAULT_AGENTS),
        )
        .arg(
            Arg::new("obstacles")
                .short('o')
                .long("obstacles")
                .value_name("COUNT")
                .help("Number of static obstacles")
                .default_value(DEFAULT_OBSTACLES),
        )
        .arg(
            Arg::new("ticks")
                .short('t')
                .long("ticks")
                .value_name("COUNT")
                .help("Number of ticks to run")
                .default_value(DEFAULT_TICKS),
        )
        .arg(
            Arg::new("seed")
                .short('s')
                .long("seed")
                .value_name("SEED")
                .help("Random seed")
                .default_value(DEFAULT_SEED),
        )
        .get_matches();

    let place = match matches.get_one::<String>("config") {
        Some(path) if std::path::Path::new(path).exists() => {
            log::info!("Loading place configuration from {}", path);
            PlaceConfig::load_from_file(path)?
        }
        Some(path) => {
            log::info!("Writing default place configuration to {}", path);
            let config = PlaceConfig::default();
            config.save_to_file(path)?;
            config
        }
        None => PlaceConfig::default(),
    };
    place.validate()?;

    Ok(DemoConfig {
        place,
        agents: parse_arg(&matches, "agents")?,
        obstacles: parse_arg(&matches, "obstacles")?,
        ticks: parse_arg(&matches, "ticks")?,
        seed: parse_arg(&matches, "seed")?,
    })
}

/// Random point inside `universe`
fn random_point(rng: &mut StdRng, universe: &AxisAlignedBounds) -> Point3 {
    let mut point = Point3::origin();
    for axis in Axis::ALL {
        let (lower, upper) = (universe.lower_on(axis), universe.upper_on(axis));
        point[axis.index()] = if lower < upper { rng.gen_range(lower..upper) } else { lower };
    }
    point
}

fn agent_bounds(center: Point3) -> TreeResult<AxisAlignedBounds> {
    AxisAlignedBounds::from_center_extents(center, Vec3::repeat(AGENT_RADIUS))
}

/// Keep an agent's center inside the place
fn clamp_into(point: Point3, universe: &AxisAlignedBounds) -> Point3 {
    let mut clamped = point;
    for axis in Axis::ALL {
        let i = axis.index();
        clamped[i] = point[i].clamp(universe.lower_on(axis), universe.upper_on(axis));
    }
    clamped
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let demo = parse_command_line()?;
    let universe = demo.place.universe;
    let mut rng = StdRng::seed_from_u64(demo.seed);
    log::info!(
        "Starting place demo: {} obstacles, {} agents, {} ticks, seed {}",
        demo.obstacles, demo.agents, demo.ticks, demo.seed
    );

    let obstacles = (0..demo.obstacles)
        .map(|key| {
            let center = random_point(&mut rng, &universe);
            let half = Vec3::new(rng.gen_range(0.5..8.0), rng.gen_range(0.5..8.0), rng.gen_range(0.5..3.0));
            AxisAlignedBounds::from_center_extents(center, half).map(|bounds| IndexEntry::new(key, bounds))
        })
        .collect::<TreeResult<Vec<_>>>()?;

    // Agent keys follow the obstacle keys so both trees share one key space
    let first_agent = demo.obstacles;
    let mut place = PlaceIndex::new(demo.place.clone(), &obstacles)?;
    let mut positions = Vec::with_capacity(demo.agents as usize);
    for offset in 0..demo.agents {
        let key = first_agent + offset;
        let center = random_point(&mut rng, &universe);
        place.spawn_agent(&IndexEntry::new(key, agent_bounds(center)?))?;
        positions.push((key, center));
    }
    let observers: Vec<u32> = positions.iter().map(|(key, _)| *key).collect();

    for _ in 0..demo.ticks {
        let mut moves = Vec::with_capacity(positions.len());
        for (key, center) in &mut positions {
            let step = Vec3::new(
                rng.gen_range(-STEP..STEP),
                rng.gen_range(-STEP..STEP),
                rng.gen_range(-STEP..STEP) * 0.25,
            );
            *center = clamp_into(*center + step, &universe);
            moves.push((*key, agent_bounds(*center)?));
        }

        let report = place.tick(moves, &observers, REACH)?;
        let (seen_obstacles, seen_agents) = report
            .perceptions
            .iter()
            .fold((0, 0), |(o, a), (_, p)| (o + p.obstacles.len(), a + p.agents.len()));
        let crowded = report
            .perceptions
            .iter()
            .max_by_key(|(_, p)| p.agents.len())
            .map_or(0, |(_, p)| p.agents.len());

        log::info!(
            "Tick {}: {} agents moved, {} obstacle sightings, {} agent sightings, most crowded sees {}",
            report.tick,
            report.dynamics.moved.len(),
            seen_obstacles,
            seen_agents,
            crowded
        );
    }

    let (obstacle_stats, agent_stats) = place.stats();
    log::info!("Obstacle tree: {:?}", obstacle_stats);
    log::info!("Agent tree: {:?}", agent_stats);

    let integrity = place.agents().tree().check_integrity();
    if !integrity.is_clean() {
        for issue in &integrity.issues {
            log::warn!("Agent tree integrity: {}", issue);
        }
    }

    log::info!("Place demo finished after {} ticks", place.ticks());
    Ok(())
}
