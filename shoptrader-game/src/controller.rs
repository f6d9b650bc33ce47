//! Owner of the running session: feeds actions through the reducer and
//! carries out the effects it asks for.
use log::{debug, info, warn};
use std::time::Duration;

use crate::catalog::{Catalog, ShopFilter};
use crate::constants::{LOG_TARGET, LOG_TARGET_PLATFORM};
use crate::persistence::{KeyValueStore, SaveAdapter};
use crate::platform::{Platform, run_interstitial};
use crate::requests::RequestPool;
use crate::result::RunSummary;
use crate::rng::RngBundle;
use crate::session::{Action, Effect, Effects, Phase, ReduceCtx, Session, reduce};
use crate::shop::{ShopListing, shop_listing};
use crate::snapshot::{SaveDecode, restore, snapshot};
use crate::state::GameState;
use crate::variant::Variant;

/// How [`ShopController::boot`] obtained its starting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    Restored,
    NewRun,
    /// A save existed but was legacy or unreadable.
    DiscardedSave,
}

pub struct ShopController<P, S> {
    variant: Variant,
    catalog: Catalog,
    requests: RequestPool,
    session: Session,
    rng: RngBundle,
    saves: SaveAdapter<S>,
    platform: P,
    gameplay_started: bool,
    ready_signalled: bool,
    pending_advance: Option<Duration>,
}

impl<P, S> ShopController<P, S>
where
    P: Platform,
    S: KeyValueStore,
{
    #[must_use]
    pub fn new(
        variant: Variant,
        catalog: Catalog,
        requests: RequestPool,
        platform: P,
        local: S,
        seed: u64,
    ) -> Self {
        Self {
            variant,
            catalog,
            requests,
            session: Session::default(),
            rng: RngBundle::from_user_seed(seed),
            saves: SaveAdapter::new(variant, local),
            platform,
            gameplay_started: false,
            ready_signalled: false,
            pending_advance: None,
        }
    }

    /// Load saved progress, or start a fresh run when there is none.
    pub fn boot(&mut self) -> BootOutcome {
        let outcome = match self.saves.load(&self.platform) {
            SaveDecode::Found(saved) => {
                self.session = Session::new(restore(&saved, &self.catalog));
                BootOutcome::Restored
            }
            SaveDecode::Absent => {
                self.start_fresh();
                BootOutcome::NewRun
            }
            SaveDecode::Legacy | SaveDecode::Malformed(_) => {
                self.start_fresh();
                BootOutcome::DiscardedSave
            }
        };
        info!(
            target: LOG_TARGET,
            "{} booted: {outcome:?}, day {}",
            self.variant,
            self.session.state().day
        );
        outcome
    }

    fn start_fresh(&mut self) {
        let state = GameState::fresh_run(&self.catalog, self.rng.shop());
        self.session = Session::new(state);
    }

    /// Apply one action and run its effects. Returns the effects so the shell
    /// can animate them.
    pub fn dispatch(&mut self, action: Action) -> Effects {
        let restart = action == Action::Restart;
        let session = std::mem::take(&mut self.session);
        let mut ctx = ReduceCtx {
            catalog: &self.catalog,
            requests: &self.requests,
            variant: self.variant,
            rng: if restart {
                self.rng.shop()
            } else {
                self.rng.customers()
            },
        };
        let transition = reduce(session, action, &mut ctx);
        self.session = transition.session;
        if restart {
            self.pending_advance = None;
        }
        for effect in &transition.effects {
            self.apply(effect);
        }
        transition.effects
    }

    fn apply(&mut self, effect: &Effect) {
        match effect {
            Effect::SaveProgress => {
                let outcome = self.saves.save(&self.platform, &snapshot(self.session.state()));
                debug!(target: LOG_TARGET, "saved: {outcome:?}");
            }
            Effect::ClearProgress => self.saves.clear(&self.platform),
            Effect::StartGameplay => self.start_gameplay(),
            Effect::ScheduleAdvance(delay) => self.pending_advance = Some(*delay),
            Effect::Victory(summary) => {
                info!(target: LOG_TARGET, "{}", summary.headline(self.variant));
                self.pending_advance = None;
            }
            Effect::DayStarted { .. }
            | Effect::Sold(_)
            | Effect::Rejected { .. }
            | Effect::Purchased { .. }
            | Effect::ShopOpened
            | Effect::DayFinished { .. } => {}
        }
    }

    fn start_gameplay(&mut self) {
        if self.gameplay_started {
            return;
        }
        self.gameplay_started = true;
        if let Err(err) = self.platform.session_start() {
            warn!(target: LOG_TARGET_PLATFORM, "gameplay start failed: {err}");
        }
    }

    /// Delay of the customer advance currently waiting, if any.
    #[must_use]
    pub const fn pending_advance(&self) -> Option<Duration> {
        self.pending_advance
    }

    /// Fire the pending advance now.
    pub fn complete_advance(&mut self) -> Effects {
        if self.pending_advance.take().is_none() {
            return Effects::new();
        }
        self.dispatch(Action::AdvanceCustomer)
    }

    /// Close the evening shop: show an interstitial, then start the next day.
    pub fn finish_shop(&mut self) -> Effects {
        if self.session.phase() != &Phase::EveningShop {
            return Effects::new();
        }
        let shown = run_interstitial(&self.platform);
        debug!(target: LOG_TARGET_PLATFORM, "interstitial shown: {shown}");
        self.dispatch(Action::FinishShop)
    }

    /// Tell the platform loading finished. Only the first call reaches it.
    pub fn signal_ready(&mut self) {
        if self.ready_signalled {
            return;
        }
        self.ready_signalled = true;
        if let Err(err) = self.platform.ready() {
            warn!(target: LOG_TARGET_PLATFORM, "ready signal failed: {err}");
        }
    }

    #[must_use]
    pub fn shop_listing(&self, filter: &ShopFilter) -> Vec<ShopListing<'_>> {
        shop_listing(self.session.state(), &self.catalog, filter)
    }

    #[must_use]
    pub const fn summary(&self) -> Option<&RunSummary> {
        match self.session.phase() {
            Phase::Victory(summary) => Some(summary),
            _ => None,
        }
    }

    #[must_use]
    pub fn has_progress(&self) -> bool {
        self.session.state().has_progress()
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        self.session.state()
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn requests(&self) -> &RequestPool {
        &self.requests
    }

    #[must_use]
    pub const fn variant(&self) -> Variant {
        self.variant
    }

    #[must_use]
    pub const fn platform(&self) -> &P {
        &self.platform
    }

    #[must_use]
    pub const fn saves(&self) -> &SaveAdapter<S> {
        &self.saves
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }
}
