//! Game skins sharing the same rules.
//!
//! Each variant owns a distinct storage key so both shops can be deployed on
//! the same origin without reading each other's saves.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const BOOK_AVATARS: [&str; 10] = [
    "👩‍🦰", "👨‍🦳", "👩‍🎓", "🧔", "👵", "👨‍💼", "👧", "🧑‍🎨", "👨‍🏫", "👩‍🔬",
];
const GAME_AVATARS: [&str; 10] = [
    "🧑‍💻", "👾", "🧒", "👨‍🎤", "👩‍🚀", "🧙", "🥷", "👩‍🎤", "🧑‍🚒", "🕵️",
];

const BOOK_REJECTIONS: [&str; 5] = [
    "No, that's not it... I'll look somewhere else.",
    "Hmm, doesn't fit. Goodbye!",
    "Wrong author, and the genre is off too...",
    "No, thank you. I'll keep looking.",
    "Not what I wanted. Have a nice day!",
];
const GAME_REJECTIONS: [&str; 5] = [
    "Nah, I've already beaten that one.",
    "Wrong platform, wrong vibe. See you!",
    "That's not even close. Bye!",
    "Hmm, no. I'll check the other store.",
    "Not my kind of game. Thanks anyway!",
];

/// Skin of the shop: what the player trades in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    BookTrader,
    GameTrader,
}

impl Variant {
    pub const ALL: [Self; 2] = [Self::BookTrader, Self::GameTrader];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BookTrader => "book_trader",
            Self::GameTrader => "game_trader",
        }
    }

    /// Storage key used for both the local store and cloud player data.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::BookTrader => "book_trader_save_v1",
            Self::GameTrader => "game_trader_save_v1",
        }
    }

    /// Directory name of the variant's data assets.
    #[must_use]
    pub const fn asset_dir(self) -> &'static str {
        self.as_str()
    }

    /// Ownership fields written by older skins of the game.
    ///
    /// A save that carries one of these but not `ownedIds` belongs to another
    /// schema and is discarded.
    #[must_use]
    pub const fn legacy_ownership_fields(self) -> &'static [&'static str] {
        match self {
            Self::BookTrader => &["ownedFilms"],
            Self::GameTrader => &["ownedFilms", "ownedBooks"],
        }
    }

    #[must_use]
    pub const fn avatars(self) -> &'static [&'static str] {
        match self {
            Self::BookTrader => &BOOK_AVATARS,
            Self::GameTrader => &GAME_AVATARS,
        }
    }

    #[must_use]
    pub const fn rejection_lines(self) -> &'static [&'static str] {
        match self {
            Self::BookTrader => &BOOK_REJECTIONS,
            Self::GameTrader => &GAME_REJECTIONS,
        }
    }

    /// Singular noun for the traded item.
    #[must_use]
    pub const fn item_noun(self) -> &'static str {
        match self {
            Self::BookTrader => "book",
            Self::GameTrader => "game",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "book_trader" | "books" | "book" => Ok(Self::BookTrader),
            "game_trader" | "games" | "game" => Ok(Self::GameTrader),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_keys_do_not_collide() {
        assert_ne!(
            Variant::BookTrader.storage_key(),
            Variant::GameTrader.storage_key()
        );
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("book-trader".parse::<Variant>(), Ok(Variant::BookTrader));
        assert_eq!("GAMES".parse::<Variant>(), Ok(Variant::GameTrader));
        assert!("films".parse::<Variant>().is_err());
    }

    #[test]
    fn flavor_tables_are_populated() {
        for variant in Variant::ALL {
            assert!(!variant.avatars().is_empty());
            assert!(!variant.rejection_lines().is_empty());
            assert!(variant.legacy_ownership_fields().contains(&"ownedFilms"));
        }
    }
}
