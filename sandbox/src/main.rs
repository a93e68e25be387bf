// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod world;

use anyhow::Context;
use clap::Parser;
use gambit_control::{Optimizer, OptimizerConfig};
use gambit_core::host::{Drawable, GridHost, OverlayCanvas, Pathfinder, Subsystem};
use gambit_core::{EntityKey, GridPos, Point, Rect, Stopwatch};
use gambit_data::{ObjectPool, Pooled};
use gambit_telemetry::logging;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use world::{tile_at, tile_center, BfsPathfinder, Board, Particles, Projectile, Sprite, Unit, TILE};

const BOARD_WIDTH: i32 = 40;
const BOARD_HEIGHT: i32 = 30;
const UNITS_PER_TEAM: u64 = 24;
const SIGHT_RADIUS: f64 = 6.0 * TILE;
const PROJECTILE_SPEED: f64 = 240.0;

/// Runs a simulated skirmish through the optimizer and prints its report.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON optimizer configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many frames if monitoring has not ended first.
    #[arg(long, default_value_t = 2000)]
    frames: usize,

    /// Optimization to switch off (repeatable), e.g. `--disable caching`.
    #[arg(long)]
    disable: Vec<String>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

struct StdoutCanvas;

impl OverlayCanvas for StdoutCanvas {
    fn text(&mut self, _x: f64, _y: f64, line: &str) {
        println!("  | {line}");
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level);

    let config = match &args.config {
        Some(path) => OptimizerConfig::from_file(path)?,
        None => OptimizerConfig {
            viewport: Some(Rect::new(0.0, 0.0, 800.0, 600.0)),
            ..Default::default()
        },
    };
    let optimizer = Optimizer::with_system_clock(config)?;
    for name in &args.disable {
        optimizer
            .set_optimization_by_name(name, false)
            .with_context(|| format!("invalid --disable value '{name}'"))?;
    }

    let mut board = optimizer.instrument_grid("board", Board::new(BOARD_WIDTH, BOARD_HEIGHT))?;
    for id in 0..UNITS_PER_TEAM * 2 {
        let team = (id % 2) as u8;
        let row = (id / 2) as i32;
        let x = if team == 0 { 1 } else { BOARD_WIDTH - 2 };
        board.add_entity(Unit {
            id,
            team,
            tile: GridPos::new(x, row + 3),
        })?;
    }

    let walls: HashSet<GridPos> = (5..25).map(|y| GridPos::new(BOARD_WIDTH / 2, y)).collect();
    let mut paths = optimizer.cache_pathfinder(
        "paths",
        BfsPathfinder::new(BOARD_WIDTH, BOARD_HEIGHT, walls),
    )?;

    let mut sprites = Vec::new();
    for i in 0..64 {
        let bounds = Rect::new((i % 16) as f64 * 96.0, (i / 16) as f64 * 192.0, 48.0, 48.0);
        sprites.push(optimizer.cull_drawable(
            &format!("sprite{i}"),
            Sprite {
                bounds,
                frames_drawn: 0,
            },
        )?);
    }

    let mut particles = optimizer.time_subsystem(
        "particles",
        Particles {
            count: 2000,
            phase: 0.0,
        },
    )?;

    optimizer.register_object_pool(ObjectPool::resettable("projectile", Projectile::default), 16);
    let shots = optimizer.pooled_factory::<Projectile>("projectile")?;
    let mut in_flight: Vec<Pooled<Projectile>> = Vec::new();

    let terrain = optimizer.defer(|| {
        (0..BOARD_WIDTH * BOARD_HEIGHT)
            .map(|i| ((i * 7919) % 13) as u8)
            .collect::<Vec<_>>()
    });

    optimizer.start_monitoring();
    let clock = optimizer.clock().clone();
    let mut frame_timer = Stopwatch::start(&*clock);
    let mut report = None;

    for frame in 0..args.frames {
        let dt = frame_timer.lap().max(1.0 / 240.0);

        optimizer.time_update(|| -> anyhow::Result<()> {
            for key in board.keys() {
                step_unit(&mut board, &mut paths, key);
            }
            particles.update(dt);
            for key in board.keys().into_iter().step_by(7) {
                if let Some(origin) = board.entity(key).map(|unit| tile_center(unit.tile)) {
                    let shot = shots.create()?;
                    {
                        let mut projectile = shot.borrow_mut();
                        projectile.position = origin;
                        projectile.velocity = Point::new(PROJECTILE_SPEED, 0.0);
                        projectile.ttl = 0.25;
                    }
                    in_flight.push(shot);
                }
            }
            let mut index = 0;
            while index < in_flight.len() {
                let expired = {
                    let mut projectile = in_flight[index].borrow_mut();
                    projectile.position.x += projectile.velocity.x * dt;
                    projectile.ttl -= dt;
                    projectile.ttl <= 0.0
                };
                if expired {
                    let shot = in_flight.swap_remove(index);
                    shots.destroy(&shot)?;
                } else {
                    index += 1;
                }
            }
            Ok(())
        })?;

        optimizer.time_draw(|| {
            for sprite in &mut sprites {
                sprite.draw();
            }
        });

        if frame == 30 {
            log::info!("Terrain has {} tiles", terrain.len());
        }
        if frame % 300 == 0 {
            optimizer.draw_overlay(&mut StdoutCanvas, 8.0, 8.0);
        }

        if let Some(done) = optimizer.tick(dt) {
            report = Some(done);
            break;
        }
    }

    let report = match report {
        Some(report) => report,
        None => optimizer.stop_monitoring(),
    };
    println!("{report}");
    optimizer.draw_overlay(&mut StdoutCanvas, 8.0, 8.0);

    let drawn: u64 = sprites.iter().map(|sprite| sprite.drawn()).sum();
    let culled: u64 = sprites.iter().map(|sprite| sprite.culled()).sum();
    log::info!("Sprites drawn {drawn} times, culled {culled} times");
    Ok(())
}

/// Moves a unit one tile toward the nearest visible enemy.
fn step_unit<G, P>(board: &mut G, paths: &mut P, key: EntityKey)
where
    G: GridHost<Entity = Unit>,
    G::Error: fmt::Display,
    P: Pathfinder<Path = Vec<GridPos>>,
{
    let Some((team, tile)) = board.entity(key).map(|unit| (unit.team, unit.tile)) else {
        return;
    };
    let here = tile_center(tile);
    let target = board
        .entities_in_range(here, SIGHT_RADIUS)
        .into_iter()
        .filter_map(|other| board.entity(other))
        .filter(|other| other.team != team)
        .min_by_key(|other| other.tile.manhattan(&tile))
        .map(|other| other.tile);

    let goal = match target {
        Some(enemy) => enemy,
        None => GridPos::new(BOARD_WIDTH / 2, tile.y),
    };
    let path = paths.find_path(tile, goal);
    if let Some(next) = path.get(1).copied().filter(|next| *next != goal) {
        if let Err(err) = board.move_entity(key, tile_center(next)) {
            log::trace!("Unit {key} stays at {:?}: {err}", tile_at(here));
        }
    }
}
