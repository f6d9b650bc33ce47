//! Day/evening state machine.
//!
//! [`reduce`] is a pure transition over a [`Session`]. It never touches
//! storage, timers or the platform; instead it returns [`Effect`]s for the
//! owning controller to carry out.

use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use std::time::Duration;

use crate::catalog::Catalog;
use crate::constants::{
    CUSTOMERS_PER_DAY, LOG_TARGET, REJECTION_ADVANCE_DELAY, SALE_ADVANCE_DELAY,
};
use crate::requests::{Customer, RequestPool, generate_customers};
use crate::result::RunSummary;
use crate::rng::{RandomSource, choose, in_range};
use crate::state::{GameState, Sale};
use crate::variant::Variant;

/// Progress through today's customer queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayState {
    customers: Vec<Customer>,
    index: usize,
    awaiting_advance: bool,
}

impl DayState {
    #[must_use]
    pub const fn new(customers: Vec<Customer>) -> Self {
        Self {
            customers,
            index: 0,
            awaiting_advance: false,
        }
    }

    #[must_use]
    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    /// Zero-based position of the customer being served.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn current(&self) -> Option<&Customer> {
        self.customers.get(self.index)
    }

    /// Set once an offer resolved and the customer is about to leave.
    #[must_use]
    pub const fn awaiting_advance(&self) -> bool {
        self.awaiting_advance
    }

    fn next(&mut self) -> bool {
        self.awaiting_advance = false;
        self.index = self.index.saturating_add(1);
        self.index < self.customers.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// Before the shop opens. The evening shop is reachable from here too.
    #[default]
    Idle,
    Day(DayState),
    EveningShop,
    /// Terminal until a restart.
    Victory(RunSummary),
}

impl Phase {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Day(_) => "day",
            Self::EveningShop => "evening_shop",
            Self::Victory(_) => "victory",
        }
    }

    /// Phases in which items may be bought.
    #[must_use]
    pub const fn shop_open(&self) -> bool {
        matches!(self, Self::Idle | Self::EveningShop)
    }
}

/// The running game: persistent state plus the transient phase.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    state: GameState,
    phase: Phase,
}

impl Session {
    #[must_use]
    pub fn new(state: GameState) -> Self {
        Self {
            state,
            phase: Phase::Idle,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }

    #[must_use]
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub const fn day(&self) -> Option<&DayState> {
        match &self.phase {
            Phase::Day(day) => Some(day),
            _ => None,
        }
    }

    #[must_use]
    pub fn current_customer(&self) -> Option<&Customer> {
        self.day().and_then(DayState::current)
    }

    #[must_use]
    pub const fn is_victory(&self) -> bool {
        matches!(self.phase, Phase::Victory(_))
    }
}

/// Player and timer inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    StartDay,
    OfferItem { slot: usize },
    SkipCustomer,
    /// Fired by the controller once a scheduled advance delay elapsed.
    AdvanceCustomer,
    EndDay,
    BuyItem { item_id: String },
    FinishShop,
    Restart,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SaveProgress,
    ClearProgress,
    /// Start the platform gameplay session if it is not running yet.
    StartGameplay,
    /// Dispatch [`Action::AdvanceCustomer`] after the delay.
    ScheduleAdvance(Duration),
    DayStarted { customers: usize },
    Sold(Sale),
    Rejected { line: String },
    Purchased { item_id: String, slot: usize },
    ShopOpened,
    DayFinished { next_day: u32 },
    Victory(RunSummary),
}

pub type Effects = SmallVec<[Effect; 4]>;

/// Result of one reduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: Session,
    pub effects: Effects,
}

impl Transition {
    fn unchanged(session: Session) -> Self {
        Self {
            session,
            effects: Effects::new(),
        }
    }
}

/// Read-only data and randomness a transition may draw on.
pub struct ReduceCtx<'a> {
    pub catalog: &'a Catalog,
    pub requests: &'a RequestPool,
    pub variant: Variant,
    pub rng: &'a mut dyn RandomSource,
}

/// Apply `action` to `session`. Invalid actions return the session unchanged
/// with no effects.
pub fn reduce(session: Session, action: Action, ctx: &mut ReduceCtx<'_>) -> Transition {
    if session.is_victory() && action != Action::Restart {
        return Transition::unchanged(session);
    }
    let from = session.phase.name();
    let transition = match action {
        Action::StartDay => start_day(session, ctx),
        Action::OfferItem { slot } => offer_item(session, slot, ctx),
        Action::SkipCustomer => skip_customer(session),
        Action::AdvanceCustomer => advance_customer(session),
        Action::EndDay => end_day(session),
        Action::BuyItem { item_id } => buy_item(session, &item_id, ctx),
        Action::FinishShop => finish_shop(session),
        Action::Restart => restart(ctx),
    };
    let to = transition.session.phase.name();
    if from != to {
        debug!(target: LOG_TARGET, "phase {from} -> {to}");
    }
    transition
}

fn start_day(session: Session, ctx: &mut ReduceCtx<'_>) -> Transition {
    if session.phase != Phase::Idle {
        return Transition::unchanged(session);
    }
    let count = in_range(&CUSTOMERS_PER_DAY, ctx.rng);
    let shelf_ids = session.state.shelf().item_ids();
    let customers = generate_customers(
        &shelf_ids,
        count,
        ctx.requests,
        ctx.variant.avatars(),
        ctx.rng,
    );
    let queued = customers.len();
    let mut effects: Effects = smallvec![
        Effect::StartGameplay,
        Effect::DayStarted { customers: queued }
    ];
    let phase = if customers.is_empty() {
        effects.push(Effect::ShopOpened);
        Phase::EveningShop
    } else {
        Phase::Day(DayState::new(customers))
    };
    debug!(
        target: LOG_TARGET,
        "day {} opened with {queued} of {count} customers",
        session.state.day
    );
    Transition {
        session: Session {
            state: session.state,
            phase,
        },
        effects,
    }
}

fn offer_item(mut session: Session, slot: usize, ctx: &mut ReduceCtx<'_>) -> Transition {
    let Phase::Day(day) = &mut session.phase else {
        return Transition::unchanged(session);
    };
    if day.awaiting_advance {
        return Transition::unchanged(session);
    }
    let Some(customer) = day.current() else {
        return Transition::unchanged(session);
    };
    let Some(item_id) = session.state.shelf().get(slot) else {
        return Transition::unchanged(session);
    };

    if !customer.accepts(item_id) {
        day.awaiting_advance = true;
        let line = choose(ctx.variant.rejection_lines(), ctx.rng)
            .copied()
            .unwrap_or_default()
            .to_string();
        return Transition {
            session,
            effects: smallvec![
                Effect::Rejected { line },
                Effect::ScheduleAdvance(REJECTION_ADVANCE_DELAY)
            ],
        };
    }

    let Some(sale) = session.state.sell(slot, ctx.catalog) else {
        return Transition::unchanged(session);
    };
    debug!(
        target: LOG_TARGET,
        "sold {} for {} (total {})",
        sale.item_id, sale.earned, session.state.sold_total
    );
    let mut effects: Effects = smallvec![Effect::Sold(sale), Effect::SaveProgress];
    if let Some(reason) = session.state.victory() {
        let summary = RunSummary::new(reason, &session.state);
        effects.push(Effect::Victory(summary.clone()));
        session.phase = Phase::Victory(summary);
    } else {
        if let Phase::Day(day) = &mut session.phase {
            day.awaiting_advance = true;
        }
        effects.push(Effect::ScheduleAdvance(SALE_ADVANCE_DELAY));
    }
    Transition { session, effects }
}

fn skip_customer(mut session: Session) -> Transition {
    let Phase::Day(day) = &mut session.phase else {
        return Transition::unchanged(session);
    };
    if day.awaiting_advance || day.current().is_none() {
        return Transition::unchanged(session);
    }
    step_queue(session)
}

fn advance_customer(session: Session) -> Transition {
    match &session.phase {
        Phase::Day(day) if day.awaiting_advance => step_queue(session),
        _ => Transition::unchanged(session),
    }
}

fn step_queue(mut session: Session) -> Transition {
    let more = match &mut session.phase {
        Phase::Day(day) => day.next(),
        _ => return Transition::unchanged(session),
    };
    if more {
        Transition::unchanged(session)
    } else {
        open_shop(session)
    }
}

fn end_day(session: Session) -> Transition {
    if matches!(session.phase, Phase::Day(_)) {
        open_shop(session)
    } else {
        Transition::unchanged(session)
    }
}

fn open_shop(session: Session) -> Transition {
    Transition {
        session: Session {
            state: session.state,
            phase: Phase::EveningShop,
        },
        effects: smallvec![Effect::ShopOpened],
    }
}

fn buy_item(mut session: Session, item_id: &str, ctx: &ReduceCtx<'_>) -> Transition {
    if !session.phase.shop_open() {
        return Transition::unchanged(session);
    }
    let Some(item) = ctx.catalog.get(item_id) else {
        return Transition::unchanged(session);
    };
    match session.state.buy(item) {
        Ok(slot) => Transition {
            session,
            effects: smallvec![
                Effect::Purchased {
                    item_id: item.id.clone(),
                    slot,
                },
                Effect::SaveProgress
            ],
        },
        Err(reason) => {
            debug!(target: LOG_TARGET, "purchase of {item_id} ignored: {reason}");
            Transition::unchanged(session)
        }
    }
}

fn finish_shop(mut session: Session) -> Transition {
    if session.phase != Phase::EveningShop {
        return Transition::unchanged(session);
    }
    session.state.advance_day();
    session.phase = Phase::Idle;
    let next_day = session.state.day;
    Transition {
        session,
        effects: smallvec![Effect::DayFinished { next_day }, Effect::SaveProgress],
    }
}

fn restart(ctx: &mut ReduceCtx<'_>) -> Transition {
    let state = GameState::fresh_run(ctx.catalog, ctx.rng);
    Transition {
        session: Session::new(state),
        effects: smallvec![Effect::ClearProgress, Effect::StartGameplay],
    }
}
