//! Centralized balance and tuning constants for Shop Trader game logic.
//!
//! These values define the fixed rules of the shop simulation. Keeping them
//! together ensures that gameplay can only be adjusted via code changes
//! reviewed in version control, rather than through external JSON assets.

use std::ops::RangeInclusive;
use std::time::Duration;

// Shelf and economy ---------------------------------------------------------
pub const SHELF_SLOTS: usize = 10;
pub const STARTING_BALANCE: u64 = 0;
pub const FIRST_DAY: u32 = 1;
/// Sale markup expressed as a fraction `numerator / denominator` over the purchase price.
pub(crate) const SALE_MARKUP_NUMERATOR: u64 = 3;
pub(crate) const SALE_MARKUP_DENOMINATOR: u64 = 2;

// Shop price tiers ---------------------------------------------------------
pub const CHEAP_MAX_PRICE: u32 = 200;
pub const MEDIUM_MAX_PRICE: u32 = 450;

// Customers ----------------------------------------------------------------
pub const CUSTOMERS_PER_DAY: RangeInclusive<usize> = 5..=8;
/// Upper bound of shelf items that are guaranteed a linked request each day.
pub const SHELF_SEEDED_REQUESTS: usize = 4;

// Win conditions -----------------------------------------------------------
pub const UNIQUE_SALES_TO_WIN: usize = 50;
pub const TOTAL_SALES_TO_WIN: u32 = 200;

// Timers -------------------------------------------------------------------
pub const SALE_ADVANCE_DELAY: Duration = Duration::from_millis(1_500);
pub const REJECTION_ADVANCE_DELAY: Duration = Duration::from_millis(1_500);
pub const SHELF_CLEAR_DELAY: Duration = Duration::from_millis(400);
pub const MIN_LOADING_TIME: Duration = Duration::from_millis(2_000);
pub const MOCK_AD_DURATION: Duration = Duration::from_millis(1_000);

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_TARGET: &str = "shoptrader";
pub(crate) const LOG_TARGET_SAVE: &str = "shoptrader::save";
pub(crate) const LOG_TARGET_PLATFORM: &str = "shoptrader::platform";
