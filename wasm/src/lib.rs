use minesweeper_inference as ms;
use wasm_bindgen::prelude::*;

fn spec(
    dim: u8,
    mines: u16,
    tier: u8,
    fog: f64,
    seed: Option<u64>,
) -> Result<ms::GameSpec, String> {
    let max_tier = match tier {
        0 => ms::Tier::Local,
        1 => ms::Tier::Global,
        2 => ms::Tier::Cardinality,
        other => return Err(format!("unknown tier {other}")),
    };
    Ok(ms::GameSpec {
        fog_probability: fog,
        seed,
        agent: ms::AgentConfig {
            max_tier,
            ..ms::AgentConfig::default()
        },
        ..ms::GameSpec::new(dim as usize, mines as usize)
    })
}

/// Plays one game. Returns `[score, forced_guesses]`.
#[wasm_bindgen]
pub fn run_game(
    dim: u8,
    mines: u16,
    tier: u8,
    fog: f64,
    seed: Option<u64>,
) -> Result<Vec<f64>, String> {
    console_error_panic_hook::set_once();

    let report = ms::run_game(&spec(dim, mines, tier, fog, seed)?).map_err(|e| e.to_string())?;
    Ok(vec![report.score_value(), report.forced_guesses as f64])
}

/// Plays one game and returns the encoded report.
#[wasm_bindgen]
pub fn play_report(
    dim: u8,
    mines: u16,
    tier: u8,
    fog: f64,
    seed: Option<u64>,
) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let report = ms::run_game(&spec(dim, mines, tier, fog, seed)?).map_err(|e| e.to_string())?;
    report.serialize().map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn report_score(bts: Vec<u8>) -> Result<f64, String> {
    console_error_panic_hook::set_once();

    let report = ms::GameReport::deserialize(&bts).map_err(|e| e.to_string())?;
    Ok(report.score_value())
}

/// `[forced_guesses, mines_hit, moves, local, global, cardinality]` of an
/// encoded report.
#[wasm_bindgen]
pub fn report_counts(bts: Vec<u8>) -> Result<Vec<u32>, String> {
    console_error_panic_hook::set_once();

    let report = ms::GameReport::deserialize(&bts).map_err(|e| e.to_string())?;
    let d = report.deductions;
    Ok([
        report.forced_guesses,
        report.mines_hit,
        report.moves,
        d.local,
        d.global,
        d.cardinality,
    ]
    .into_iter()
    .map(|n| n as u32)
    .collect())
}
