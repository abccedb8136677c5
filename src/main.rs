//! Demo: a seeded singles battle between two fixed parties, streamed to two
//! display clients over the lockstep session.
//!
//! `RUST_LOG=debug` shows the engine's stage logging. Pass `--json` to dump
//! the full turn history at the end.

use battle_turn_engine::data_store::{moves, species};
use battle_turn_engine::sync::{ClientEndpoint, ServerMessage};
use battle_turn_engine::{
    Battle, BattleAction, BattleConfig, BattleEngineError, BattleResult, Battler, BattlerId,
    GameState, MoveId, ReferenceData, SpeciesId, SyncSession,
};
use tracing_subscriber::EnvFilter;

const TURN_LIMIT: u32 = 100;

fn party(
    data: &ReferenceData,
    first_uid: u32,
    members: &[(SpeciesId, u8, &[MoveId])],
) -> BattleResult<Vec<Battler>> {
    members
        .iter()
        .enumerate()
        .map(|(i, (species, level, move_ids))| {
            Battler::from_data(data, first_uid + i as u32, *species, *level, move_ids)
                .map_err(BattleEngineError::from)
        })
        .collect()
}

/// Submit the first move the engine accepts, falling back to Struggle.
fn submit_first_legal(battle: &mut Battle, id: BattlerId) {
    let mut candidates: Vec<MoveId> = battle
        .state()
        .battler(id)
        .map(|b| b.moves.iter().map(|slot| slot.move_id).collect())
        .unwrap_or_default();
    candidates.push(moves::STRUGGLE);
    for move_id in candidates {
        let action = BattleAction::UseMove {
            move_id,
            target: None,
        };
        if battle.submit_action(id, action).is_accepted() {
            return;
        }
    }
}

/// A display client that acknowledges every step and prints nothing.
fn spawn_viewer(mut endpoint: ClientEndpoint) {
    tokio::spawn(async move {
        while let Some(Ok(message)) = endpoint.recv().await {
            if let ServerMessage::Step { seq, .. } = message {
                if endpoint.ack(seq).is_err() {
                    break;
                }
            }
        }
    });
}

async fn run(dump_json: bool) -> BattleResult<()> {
    let data = ReferenceData::builtin()?;
    let config = BattleConfig {
        max_clients: 2,
        ..BattleConfig::default()
    }
    .with_seed(0x5eed);

    let side_a = party(
        &data,
        1,
        &[
            (species::PIKACHU, 50, &[moves::THUNDERBOLT, moves::QUICK_ATTACK]),
            (species::VENUSAUR, 50, &[moves::GIGA_DRAIN, moves::SLEEP_POWDER]),
        ],
    )?;
    let side_b = party(
        &data,
        10,
        &[
            (species::GYARADOS, 50, &[moves::SURF, moves::BITE]),
            (species::SNORLAX, 50, &[moves::DOUBLE_EDGE, moves::REST]),
        ],
    )?;

    let mut battle = Battle::with_data(config.clone(), data, [side_a, side_b])?;
    let (mut session, endpoints) = SyncSession::new(&config)?;
    endpoints.into_iter().for_each(spawn_viewer);

    let opening = battle.start()?;
    session.publish_turn(&mut battle, &opening).await?;

    while !battle.is_over() && battle.state().turn_number <= TURN_LIMIT {
        let log = match battle.state().game_state.clone() {
            GameState::WaitingForReplacements(slots) => {
                for slot in slots {
                    let side = slot.side();
                    if let Some(&bench) = battle.state().available_replacements(side).first() {
                        battle.submit_replacement(slot, bench);
                    }
                }
                battle.resolve_replacements()?
            }
            _ => {
                for id in battle.awaiting_actions() {
                    submit_first_legal(&mut battle, id);
                }
                battle.resolve_turn()?
            }
        };
        for event in &log.events {
            if let Some(line) = event.format(battle.state()) {
                println!("{}", line);
            }
        }
        session.publish_turn(&mut battle, &log).await?;
    }

    println!("Result: {:?}", battle.state().game_state);
    if dump_json {
        let history = serde_json::to_string_pretty(battle.history())
            .map_err(|e| BattleEngineError::NotResolvable(e.to_string()))?;
        println!("{}", history);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let dump_json = std::env::args().any(|arg| arg == "--json");
    if let Err(e) = run(dump_json).await {
        eprintln!("Battle failed: {}", e);
        std::process::exit(1);
    }
}
