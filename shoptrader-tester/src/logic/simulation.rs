use anyhow::{Context, Result, bail};
use log::debug;
use serde::Serialize;
use shoptrader_game::{
    Action, BootOutcome, Effect, MemoryStore, MockPlatform, Phase, PlatformCall, RunSummary,
    ShopController, ShopEngine, ShopFilter, Variant,
};
use shoptrader_web::StaticDataLoader;

use crate::logic::policy::{PlayerPolicy, Strategy};

pub type Controller = ShopController<MockPlatform<MemoryStore>, MemoryStore>;

/// Configuration for a simulation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
    pub variant: Variant,
    pub strategy: Strategy,
    pub seed: u64,
    pub max_days: u32,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(variant: Variant, strategy: Strategy, seed: u64) -> Self {
        Self {
            variant,
            strategy,
            seed,
            max_days: 150,
        }
    }

    #[must_use]
    pub const fn with_max_days(mut self, max_days: u32) -> Self {
        self.max_days = max_days;
        self
    }
}

/// Counters gathered while playing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub days_played: u32,
    pub customers: usize,
    pub sales: usize,
    pub rejections: usize,
    pub skips: usize,
    pub purchases: usize,
    pub actions: usize,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub variant: Variant,
    pub strategy: Strategy,
    pub seed: u64,
    pub stats: RunStats,
    pub balance: u64,
    pub day: u32,
    pub sold_unique: usize,
    pub sold_total: u32,
    pub victory: Option<RunSummary>,
    pub interstitials: usize,
}

/// Hook run after every dispatched action.
pub type Observer<'a> = &'a mut dyn FnMut(&Controller) -> Result<()>;

/// Deterministic headless player driving a [`ShopController`].
pub struct Simulation {
    config: SimulationConfig,
    controller: Controller,
    policy: Box<dyn PlayerPolicy>,
    stats: RunStats,
}

impl Simulation {
    /// Build a simulation over the bundled data, storing saves in `local`.
    ///
    /// # Errors
    ///
    /// Fails if the bundled catalog or requests do not load.
    pub fn new(config: SimulationConfig, local: MemoryStore) -> Result<Self> {
        let engine = ShopEngine::new(StaticDataLoader, local);
        let controller = engine
            .create_controller(config.variant, MockPlatform::in_memory(), config.seed)
            .with_context(|| format!("loading {} data", config.variant))?;
        Ok(Self {
            config,
            controller,
            policy: config.strategy.create_policy(config.seed),
            stats: RunStats::default(),
        })
    }

    pub fn boot(&mut self) -> BootOutcome {
        let outcome = self.controller.boot();
        self.controller.signal_ready();
        outcome
    }

    #[must_use]
    pub const fn controller(&self) -> &Controller {
        &self.controller
    }

    fn dispatch(&mut self, action: Action, observe: Observer<'_>) -> Result<Vec<Effect>> {
        let effects = self.controller.dispatch(action).into_vec();
        self.stats.actions += 1;
        observe(&self.controller)?;
        Ok(effects)
    }

    /// Play one day and its evening shop. Returns `true` once the run is won.
    ///
    /// # Errors
    ///
    /// Propagates observer failures and reports a day that fails to open.
    pub fn play_day(&mut self, observe: Observer<'_>) -> Result<bool> {
        let phase = self.controller.session().phase();
        if phase != &Phase::Idle {
            bail!(
                "day {} cannot start from {}",
                self.controller.state().day,
                phase.name()
            );
        }
        self.dispatch(Action::StartDay, observe)?;
        if let Some(day) = self.controller.session().day() {
            self.stats.customers += day.customers().len();
        }

        while let Some(customer) = self.controller.session().current_customer() {
            let customer = customer.clone();
            match self.policy.pick_offer(self.controller.state(), &customer) {
                Some(slot) => {
                    let effects = self.dispatch(Action::OfferItem { slot }, observe)?;
                    for effect in &effects {
                        match effect {
                            Effect::Sold(_) => self.stats.sales += 1,
                            Effect::Rejected { .. } => self.stats.rejections += 1,
                            _ => {}
                        }
                    }
                    if self.controller.summary().is_some() {
                        self.stats.days_played += 1;
                        return Ok(true);
                    }
                    self.controller.complete_advance();
                    observe(&self.controller)?;
                }
                None => {
                    self.stats.skips += 1;
                    self.dispatch(Action::SkipCustomer, observe)?;
                }
            }
        }

        if let Phase::Day(_) = self.controller.session().phase() {
            self.dispatch(Action::EndDay, observe)?;
        }

        loop {
            let listing = self.controller.shop_listing(&ShopFilter::any());
            let Some(item_id) = self.policy.pick_purchase(self.controller.state(), &listing) else {
                break;
            };
            let effects = self.dispatch(Action::BuyItem { item_id }, observe)?;
            if !effects.iter().any(|e| matches!(e, Effect::Purchased { .. })) {
                break;
            }
            self.stats.purchases += 1;
        }

        self.controller.finish_shop();
        self.stats.actions += 1;
        observe(&self.controller)?;
        self.stats.days_played += 1;
        debug!(
            "{} day {} done: balance {}, sold {}/{}",
            self.policy.name(),
            self.controller.state().day - 1,
            self.controller.state().balance,
            self.controller.state().sold_unique.len(),
            self.controller.state().sold_total
        );
        Ok(false)
    }

    /// Play until victory or the day cap.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`Simulation::play_day`].
    pub fn run(&mut self, observe: Observer<'_>) -> Result<SimulationSummary> {
        while self.stats.days_played < self.config.max_days {
            if self.play_day(observe)? {
                break;
            }
        }
        Ok(self.summary())
    }

    #[must_use]
    pub fn summary(&self) -> SimulationSummary {
        let state = self.controller.state();
        SimulationSummary {
            variant: self.config.variant,
            strategy: self.config.strategy,
            seed: self.config.seed,
            stats: self.stats,
            balance: state.balance,
            day: state.day,
            sold_unique: state.sold_unique.len(),
            sold_total: state.sold_total,
            victory: self.controller.summary().cloned(),
            interstitials: self
                .controller
                .platform()
                .count(&PlatformCall::ShowInterstitial),
        }
    }
}
