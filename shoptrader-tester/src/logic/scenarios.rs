use anyhow::{Context, Result, bail, ensure};
use shoptrader_game::constants::SHELF_SLOTS;
use shoptrader_game::{
    BootOutcome, MemoryStore, PlatformCall, SaveDecode, decode_str, restore, snapshot,
};

use crate::logic::simulation::{Controller, Simulation, SimulationConfig, SimulationSummary};

pub type ScenarioCheck = fn(&SimulationConfig) -> Result<SimulationSummary>;

/// A named check run once per seed iteration.
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub check: ScenarioCheck,
}

const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "smoke",
        description: "Fresh boot, one full day and the evening shop",
        check: smoke,
    },
    Scenario {
        name: "victory",
        description: "Play to the day cap and check the strategy's expected outcome",
        check: victory,
    },
    Scenario {
        name: "persistence",
        description: "Snapshots survive JSON round trips and reboots",
        check: persistence,
    },
    Scenario {
        name: "invariants",
        description: "State invariants hold after every action",
        check: invariants,
    },
    Scenario {
        name: "determinism",
        description: "Same seed and strategy replay to the same state",
        check: determinism,
    },
];

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    SCENARIOS.iter().map(|s| (s.name, s.description))
}

#[must_use]
pub fn get_scenario(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.name == name)
}

#[must_use]
pub fn scenario_names() -> Vec<String> {
    SCENARIOS.iter().map(|s| s.name.to_string()).collect()
}

fn ignore(_: &Controller) -> Result<()> {
    Ok(())
}

fn booted(config: &SimulationConfig, store: MemoryStore) -> Result<(Simulation, BootOutcome)> {
    let mut sim = Simulation::new(*config, store)?;
    let outcome = sim.boot();
    Ok((sim, outcome))
}

fn smoke(config: &SimulationConfig) -> Result<SimulationSummary> {
    let (mut sim, outcome) = booted(config, MemoryStore::new())?;
    ensure!(outcome == BootOutcome::NewRun, "fresh store booted as {outcome:?}");
    let state = sim.controller().state();
    ensure!(
        state.shelf().count() == SHELF_SLOTS,
        "new run stocked {} of {SHELF_SLOTS} slots",
        state.shelf().count()
    );
    ensure!(state.balance == 0, "new run starts with {} coins", state.balance);

    let won = sim.play_day(&mut ignore)?;
    let controller = sim.controller();
    ensure!(!won, "run won on the first day");
    ensure!(
        controller.state().day == 2,
        "expected day 2 after one day, got {}",
        controller.state().day
    );
    let platform = controller.platform();
    ensure!(platform.count(&PlatformCall::Ready) == 1, "ready signalled more than once");
    ensure!(
        platform.count(&PlatformCall::ShowInterstitial) == 1,
        "expected one interstitial"
    );
    Ok(sim.summary())
}

fn victory(config: &SimulationConfig) -> Result<SimulationSummary> {
    let (mut sim, _) = booted(config, MemoryStore::new())?;
    let summary = sim.run(&mut ignore)?;
    if config.strategy.expects_victory() && summary.victory.is_none() {
        bail!(
            "no victory after {} days: {} unique, {} total sales",
            summary.stats.days_played,
            summary.sold_unique,
            summary.sold_total
        );
    }
    if let Some(result) = &summary.victory {
        ensure!(
            !result.headline(config.variant).is_empty(),
            "victory headline is empty"
        );
        ensure!(
            sim.controller().session().is_victory(),
            "summary present outside the victory phase"
        );
    }
    if summary.stats.sales == 0 {
        ensure!(
            summary.balance == 0 && summary.sold_total == 0,
            "balance moved without sales"
        );
    }
    Ok(summary)
}

fn persistence(config: &SimulationConfig) -> Result<SimulationSummary> {
    let store = MemoryStore::new();
    let (mut sim, _) = booted(config, store.clone())?;
    for _ in 0..config.max_days.min(5) {
        if sim.play_day(&mut ignore)? {
            break;
        }
        let controller = sim.controller();
        let state = controller.state();
        let raw = serde_json::to_string(&snapshot(state)).context("encoding snapshot")?;
        let SaveDecode::Found(saved) = decode_str(&raw, config.variant) else {
            bail!("day {} snapshot did not decode", state.day);
        };
        ensure!(
            &restore(&saved, controller.catalog()) == state,
            "day {} snapshot restored to a different state",
            state.day
        );
    }

    if sim.controller().session().is_victory() {
        return Ok(sim.summary());
    }
    let (reloaded, outcome) = booted(config, store)?;
    ensure!(outcome == BootOutcome::Restored, "reboot gave {outcome:?}");
    ensure!(
        reloaded.controller().state() == sim.controller().state(),
        "rebooted state differs from the saved run"
    );
    Ok(sim.summary())
}

fn invariants(config: &SimulationConfig) -> Result<SimulationSummary> {
    let (mut sim, _) = booted(config, MemoryStore::new())?;
    let mut last_day = sim.controller().state().day;
    let mut last_total = sim.controller().state().sold_total;
    let mut last_unique = 0;
    let mut check = |controller: &Controller| -> Result<()> {
        let state = controller.state();
        let phase = controller.session().phase().name();
        state
            .check_invariants(controller.catalog())
            .with_context(|| format!("day {} in {phase}", state.day))?;
        ensure!(state.day >= last_day, "day went back from {last_day} to {}", state.day);
        ensure!(
            state.sold_total >= last_total && state.sold_unique.len() >= last_unique,
            "sales counters went backwards on day {}",
            state.day
        );
        ensure!(
            state.sold_unique.len() <= state.sold_total as usize,
            "more unique sales than sales"
        );
        last_day = state.day;
        last_total = state.sold_total;
        last_unique = state.sold_unique.len();
        Ok(())
    };
    sim.run(&mut check)
}

fn determinism(config: &SimulationConfig) -> Result<SimulationSummary> {
    let (mut first, _) = booted(config, MemoryStore::new())?;
    let (mut second, _) = booted(config, MemoryStore::new())?;
    let days = config.max_days.min(10);
    for _ in 0..days {
        let won = first.play_day(&mut ignore)?;
        ensure!(second.play_day(&mut ignore)? == won, "runs diverged on victory");
        ensure!(
            first.controller().state() == second.controller().state(),
            "runs diverged on day {}",
            first.controller().state().day
        );
        if won {
            break;
        }
    }
    Ok(first.summary())
}
