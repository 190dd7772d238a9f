// Headless demo: generate a cave, drop a squad in, and let it hunt a target
// that strafes around the map center and shoots back.
//
// Usage: cave_squad [config.toml]
// Verbosity via RUST_LOG, e.g. RUST_LOG=cave_squad=debug

use cave_squad::{AgentState, Session, SimConfig};
use glam::Vec2;

// ============================================================================
// DEMO TUNING
// ============================================================================

const DT: f32 = 1.0 / 60.0;
const DURATION_SECS: f32 = 60.0;
const SQUAD_SIZE: usize = 5;
/// Target movement per second and its dash sub-steps.
const TARGET_SPEED: f32 = 140.0;
const TARGET_SUBSTEPS: u32 = 4;
/// Seconds between the target's return shots.
const RETURN_FIRE_INTERVAL: f32 = 0.5;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("loading config from {path}");
            SimConfig::load(&path)?
        }
        None => SimConfig::default(),
    };

    let mut session = Session::new(config)?;
    let squad = session.spawn_squad(SQUAD_SIZE);
    log::info!("spawned {} agents in squad {:?}", session.agent_count(), squad);

    let mut clock = 0.0_f32;
    let mut next_report = 1.0_f32;
    let mut next_shot = RETURN_FIRE_INTERVAL;
    let mut shots = 0usize;
    let mut kills = 0usize;
    let mut damage_taken = 0.0_f32;

    while clock < DURATION_SECS && session.target().is_alive() && session.agent_count() > 0 {
        // Slow circle: heading turns one full revolution every 12 seconds.
        let heading = clock * std::f32::consts::TAU / 12.0;
        let step = Vec2::new(heading.cos(), heading.sin()) * TARGET_SPEED * DT;
        session.move_target(step, TARGET_SUBSTEPS);

        if clock >= next_shot {
            next_shot += RETURN_FIRE_INTERVAL;
            let from = session.target().pos;
            let nearest = session
                .agents()
                .into_iter()
                .min_by(|a, b| {
                    a.pos
                        .distance_squared(from)
                        .total_cmp(&b.pos.distance_squared(from))
                });
            if let Some(agent) = nearest {
                session.fire_projectile(agent.pos);
            }
        }

        let report = session.tick(DT);
        shots += report.shots_fired;
        kills += report.agents_killed;
        damage_taken += report.target_damage;
        clock += DT;

        if clock >= next_report {
            next_report += 1.0;
            let agents = session.agents();
            let chasing = agents.iter().filter(|a| a.state == AgentState::Chase).count();
            let searching = agents.iter().filter(|a| a.state == AgentState::Search).count();
            println!(
                "t={:>4.1}s | agents: {} (chase {}, search {}) | target hp: {:.0} | shots: {}",
                clock,
                agents.len(),
                chasing,
                searching,
                session.target().hp,
                session.projectiles().len()
            );
        }
    }

    log::info!(
        "finished after {:.1}s: {} squad shots, {} target damage, {} agents killed, target {}",
        clock,
        shots,
        damage_taken,
        kills,
        if session.target().is_alive() { "alive" } else { "down" }
    );
    Ok(())
}
