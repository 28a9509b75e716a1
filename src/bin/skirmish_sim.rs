//! Headless Skirmish Runner
//!
//! Runs a pattern-driven AI vs AI encounter and prints the event stream
//! or a JSON summary.

use clap::Parser;
use serde::Serialize;
use skirmish::combat::combatant::{Archetype, Combatant};
use skirmish::combat::skill::{Loadout, SkillKind};
use skirmish::core::config::CombatConfig;
use skirmish::core::types::{Team, Vec2};
use skirmish::encounter::Arena;
use skirmish::pattern::condition::Condition;
use skirmish::pattern::graph::{PatternGraph, PatternNode, PatternTransition};
use skirmish::pattern::loader::load_pattern;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Headless Skirmish Runner - pattern-driven AI duels
#[derive(Parser, Debug)]
#[command(name = "skirmish_sim")]
#[command(about = "Run a pattern-driven AI vs AI encounter")]
struct Args {
    /// Pattern definition TOML used by both sides (built-in duel pattern
    /// when omitted)
    #[arg(long)]
    pattern: Option<PathBuf>,

    /// Maximum ticks before the run is declared a timeout
    #[arg(long, default_value_t = 3000)]
    max_ticks: u64,

    /// Seed for the chance-guard streams; reruns with the same seed replay
    /// the same encounter
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Serialize)]
struct RunResult {
    outcome: String,
    ticks: u64,
    events: usize,
    seed: u64,
}

/// Probe with lights, turtle behind a block after taking hits, punish
/// with a heavy once the opponent is disabled or cracked open.
fn builtin_pattern() -> PatternGraph {
    let probe = PatternNode {
        name: "probe".into(),
        skill: SkillKind::Light,
        guards: vec![Condition::OpponentWithin { distance: 2.0 }],
        transitions: vec![
            PatternTransition {
                target: 2,
                priority: 10,
                guards: vec![Condition::OpponentDisabled],
                reset_hit_counters: false,
            },
            PatternTransition {
                target: 1,
                priority: 5,
                guards: vec![Condition::HitsTakenAtLeast { count: 2 }],
                reset_hit_counters: true,
            },
        ],
        default_after_seconds: 4.0,
        default_target: 0,
        telegraph_cue: "cue_probe".into(),
        telegraph_lead_seconds: None,
    };
    let turtle = PatternNode {
        name: "turtle".into(),
        skill: SkillKind::Block,
        guards: Vec::new(),
        transitions: Vec::new(),
        default_after_seconds: 3.0,
        default_target: 0,
        telegraph_cue: "cue_turtle".into(),
        telegraph_lead_seconds: Some(0.3),
    };
    let punish = PatternNode {
        name: "punish".into(),
        skill: SkillKind::Heavy,
        guards: vec![Condition::StaminaAtLeast { amount: 25.0 }],
        transitions: Vec::new(),
        default_after_seconds: 3.0,
        default_target: 0,
        telegraph_cue: "cue_punish".into(),
        telegraph_lead_seconds: None,
    };
    PatternGraph::new(vec![probe, turtle, punish], 0)
        .unwrap_or_else(|e| panic!("built-in pattern is invalid: {e}"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let graph = match &args.pattern {
        Some(path) => match load_pattern(path) {
            Ok(graph) => Arc::new(graph),
            Err(e) => {
                eprintln!("Failed to load pattern {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Arc::new(builtin_pattern()),
    };

    let mut arena = Arena::new(CombatConfig::default());
    let blue = Combatant::new(
        "blue",
        Team::Player,
        Archetype::Bruiser,
        Loadout::standard(10.0),
    )
    .at(Vec2::new(0.0, 0.0));
    let red = Combatant::new(
        "red",
        Team::Hostile,
        Archetype::Skirmisher,
        Loadout::standard(11.0),
    )
    .at(Vec2::new(1.5, 0.0));
    arena.spawn_patterned(blue, Arc::clone(&graph), args.seed);
    arena.spawn_patterned(red, Arc::clone(&graph), args.seed.wrapping_add(1));

    let text = args.format != "json";
    while !arena.is_finished() && arena.tick < args.max_ticks {
        let log = arena.run_tick();
        if text {
            for event in &log.events {
                println!("[{:>5}] {}", event.tick, event.description);
            }
        }
    }

    let outcome = match arena.outcome() {
        Some(o) => format!("{o:?}"),
        None => "Timeout".into(),
    };
    if text {
        println!("outcome: {} after {} ticks", outcome, arena.tick);
    } else {
        let result = RunResult {
            outcome,
            ticks: arena.tick,
            events: arena.log.len(),
            seed: args.seed,
        };
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Failed to serialize result: {e}"),
        }
    }
}
