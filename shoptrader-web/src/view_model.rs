//! Serializable snapshot of everything the page renders.
//!
//! The JavaScript side only draws what it receives here; all rules stay in
//! the engine.
use serde::Serialize;
use shoptrader_game::constants::{SHELF_SLOTS, TOTAL_SALES_TO_WIN, UNIQUE_SALES_TO_WIN};
use shoptrader_game::{
    CatalogItem, Effect, KeyValueStore, ListingStatus, Phase, Platform, PriceTier, ShopController,
    ShopFilter, Variant,
};

/// What the current customer just said back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Thanks { earned: u64 },
    Rejection(String),
}

impl Reply {
    /// The reply carried by a transition's effects, if any.
    #[must_use]
    pub fn from_effects(effects: &[Effect]) -> Option<Self> {
        effects.iter().find_map(|effect| match effect {
            Effect::Sold(sale) => Some(Self::Thanks {
                earned: sale.earned,
            }),
            Effect::Rejected { line } => Some(Self::Rejection(line.clone())),
            _ => None,
        })
    }

    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Thanks { earned } => {
                format!("Exactly what I was looking for! Here's {earned} coins.")
            }
            Self::Rejection(line) => line.clone(),
        }
    }
}

/// Shell-side state that is not part of the game: filters and transient
/// highlights.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub filter: ShopFilter,
    pub reply: Option<Reply>,
    /// Slot emptied by the latest sale, shown fading out.
    pub sold_slot: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCard {
    pub id: String,
    pub title: String,
    pub creator: String,
    pub year: Option<i32>,
    pub price: u32,
    pub sale_price: u64,
    pub tier: PriceTier,
    pub genres: Vec<String>,
    pub cover_url: Option<String>,
}

impl From<&CatalogItem> for ItemCard {
    fn from(item: &CatalogItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            creator: item.creator.clone(),
            year: item.year,
            price: item.price,
            sale_price: item.sale_price(),
            tier: item.tier(),
            genres: item.genres.to_vec(),
            cover_url: item.cover_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub balance: u64,
    pub day: u32,
    pub sold_unique: usize,
    pub sold_total: u32,
    pub unique_goal: usize,
    pub total_goal: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Speech {
    pub avatar: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueProgress {
    /// 1-based position of the customer at the counter.
    pub current: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShelfCard {
    pub slot: usize,
    pub item: Option<ItemCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShopEntry {
    pub item: ItemCard,
    pub status: ListingStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopView {
    pub balance: u64,
    pub empty_slots: usize,
    pub filter: ShopFilter,
    pub genres: Vec<FilterOption>,
    pub tiers: Vec<FilterOption>,
    pub entries: Vec<ShopEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub variant: Variant,
    pub phase: &'static str,
    pub stats: Stats,
    pub speech: Speech,
    pub queue: Option<QueueProgress>,
    /// Input is locked while the customer's reply is on screen.
    pub awaiting: bool,
    pub shelf: Vec<ShelfCard>,
    pub sold_slot: Option<usize>,
    pub shop: Option<ShopView>,
    pub victory: Option<String>,
    pub has_progress: bool,
}

/// Genre label with its first letter capitalised.
#[must_use]
pub fn genre_label(genre: &str) -> String {
    let mut chars = genre.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn tier_label(tier: PriceTier) -> &'static str {
    match tier {
        PriceTier::Cheap => "Up to 200",
        PriceTier::Medium => "201 to 450",
        PriceTier::Expensive => "Over 450",
    }
}

const fn evening_line(variant: Variant) -> &'static str {
    match variant {
        Variant::BookTrader => "The shop is closed. Time to restock the bookshelves!",
        Variant::GameTrader => "The store is closed. Time to restock the game racks!",
    }
}

impl ViewModel {
    #[must_use]
    pub fn build<P: Platform, S: KeyValueStore>(
        controller: &ShopController<P, S>,
        ui: &UiState,
    ) -> Self {
        let session = controller.session();
        let state = controller.state();
        let catalog = controller.catalog();
        let variant = controller.variant();

        let stats = Stats {
            balance: state.balance,
            day: state.day,
            sold_unique: state.sold_unique.len(),
            sold_total: state.sold_total,
            unique_goal: UNIQUE_SALES_TO_WIN,
            total_goal: TOTAL_SALES_TO_WIN,
        };

        let day = session.day();
        let awaiting = day.is_some_and(|d| d.awaiting_advance());
        let queue = day.map(|d| QueueProgress {
            current: (d.index() + 1).min(d.customers().len()),
            total: d.customers().len(),
        });

        let speech = match session.phase() {
            Phase::Idle => Speech {
                avatar: "☀️".to_string(),
                text: format!("Day {}. Press \"Start day\" to open the shop.", state.day),
            },
            Phase::Day(_) => match session.current_customer() {
                Some(customer) => Speech {
                    avatar: customer.avatar.clone(),
                    text: match (&ui.reply, awaiting) {
                        (Some(reply), true) => format!("\"{}\"", reply.text()),
                        _ => format!("\"{}\"", customer.text),
                    },
                },
                None => Speech {
                    avatar: "🌙".to_string(),
                    text: evening_line(variant).to_string(),
                },
            },
            Phase::EveningShop => Speech {
                avatar: "🌙".to_string(),
                text: evening_line(variant).to_string(),
            },
            Phase::Victory(summary) => Speech {
                avatar: "🏆".to_string(),
                text: summary.headline(variant),
            },
        };

        let shelf = state
            .shelf()
            .slots()
            .iter()
            .enumerate()
            .map(|(slot, id)| ShelfCard {
                slot,
                item: id
                    .as_deref()
                    .and_then(|id| catalog.get(id))
                    .map(ItemCard::from),
            })
            .collect();

        let shop = session.phase().shop_open().then(|| ShopView {
            balance: state.balance,
            empty_slots: SHELF_SLOTS - state.shelf().count(),
            filter: ui.filter.clone(),
            genres: catalog
                .genres()
                .into_iter()
                .map(|genre| FilterOption {
                    label: genre_label(&genre),
                    value: genre,
                })
                .collect(),
            tiers: [PriceTier::Cheap, PriceTier::Medium, PriceTier::Expensive]
                .into_iter()
                .map(|tier| FilterOption {
                    value: tier.as_str().to_string(),
                    label: tier_label(tier).to_string(),
                })
                .collect(),
            entries: controller
                .shop_listing(&ui.filter)
                .into_iter()
                .map(|listing| ShopEntry {
                    item: ItemCard::from(listing.item),
                    status: listing.status,
                })
                .collect(),
        });

        Self {
            variant,
            phase: session.phase().name(),
            stats,
            speech,
            queue,
            awaiting,
            shelf,
            sold_slot: ui.sold_slot,
            shop,
            victory: controller.summary().map(|summary| summary.headline(variant)),
            has_progress: controller.has_progress(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoptrader_game::{Action, DataLoader, MemoryStore, MockPlatform, Sale};

    use crate::loader::StaticDataLoader;

    type Controller = ShopController<MockPlatform<MemoryStore>, MemoryStore>;

    fn controller(variant: Variant) -> Controller {
        let catalog = StaticDataLoader.load_catalog(variant).unwrap();
        let requests = StaticDataLoader.load_requests(variant, &catalog).unwrap();
        let mut controller = ShopController::new(
            variant,
            catalog,
            requests,
            MockPlatform::in_memory(),
            MemoryStore::new(),
            77,
        );
        controller.boot();
        controller
    }

    #[test]
    fn idle_view_shows_full_shelf_and_open_shop() {
        let controller = controller(Variant::BookTrader);
        let view = ViewModel::build(&controller, &UiState::default());
        assert_eq!(view.phase, "idle");
        assert_eq!(view.shelf.len(), SHELF_SLOTS);
        assert!(view.shelf.iter().all(|card| card.item.is_some()));
        assert!(view.speech.text.starts_with("Day 1."));
        assert_eq!(view.queue, None);
        let shop = view.shop.unwrap();
        assert_eq!(shop.empty_slots, 0);
        assert!(shop
            .entries
            .iter()
            .all(|entry| entry.status == ListingStatus::InsufficientFunds
                || entry.status == ListingStatus::NoSpace));
        assert!(!view.has_progress);
    }

    #[test]
    fn day_view_quotes_the_customer_then_the_reply() {
        let mut controller = controller(Variant::GameTrader);
        controller.dispatch(Action::StartDay);
        let mut ui = UiState::default();
        let view = ViewModel::build(&controller, &ui);
        assert_eq!(view.phase, "day");
        assert!(view.shop.is_none());
        let queue = view.queue.unwrap();
        assert_eq!(queue.current, 1);
        assert!(queue.total >= 1);
        let customer = controller.session().current_customer().unwrap();
        assert_eq!(view.speech.avatar, customer.avatar);
        assert_eq!(view.speech.text, format!("\"{}\"", customer.text));

        let effects = controller.dispatch(Action::OfferItem { slot: 0 });
        ui.reply = Reply::from_effects(&effects);
        let view = ViewModel::build(&controller, &ui);
        assert!(view.awaiting);
        let reply = ui.reply.unwrap();
        assert_eq!(view.speech.text, format!("\"{}\"", reply.text()));
    }

    #[test]
    fn shop_entries_follow_the_filter() {
        let mut controller = controller(Variant::BookTrader);
        controller.dispatch(Action::StartDay);
        controller.dispatch(Action::EndDay);
        let ui = UiState {
            filter: ShopFilter::any().with_tier(PriceTier::Cheap),
            ..UiState::default()
        };
        let view = ViewModel::build(&controller, &ui);
        assert_eq!(view.phase, "evening_shop");
        let shop = view.shop.unwrap();
        assert!(!shop.entries.is_empty());
        assert!(shop
            .entries
            .iter()
            .all(|entry| entry.item.tier == PriceTier::Cheap));
        assert_eq!(shop.tiers.len(), 3);
        assert!(shop.genres.iter().all(|g| !g.label.is_empty()));
    }

    #[test]
    fn thanks_reply_names_the_sale_price() {
        let effects = [Effect::Sold(Sale {
            slot: 2,
            item_id: "dune".into(),
            earned: 450,
        })];
        let reply = Reply::from_effects(&effects).unwrap();
        assert_eq!(reply, Reply::Thanks { earned: 450 });
        assert!(reply.text().contains("450"));
        assert_eq!(Reply::from_effects(&[Effect::ShopOpened]), None);
    }

    #[test]
    fn genre_labels_capitalise_the_first_letter() {
        assert_eq!(genre_label("sci-fi"), "Sci-fi");
        assert_eq!(genre_label(""), "");
    }

    #[test]
    fn view_serializes_with_camel_case_keys() {
        let controller = controller(Variant::BookTrader);
        let view = ViewModel::build(&controller, &UiState::default());
        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["variant"], "book_trader");
        assert!(json["stats"]["soldUnique"].is_number());
        assert!(json["shelf"][0]["item"]["salePrice"].is_number());
        assert_eq!(json["hasProgress"], false);
    }
}
