//! String encodings used to squeeze lists into single flat cells.
//!
//! `|` separates list entries and `:` separates a name from its price.
//! Neither character is escaped, so names or prices containing them do not
//! survive a decode.

use crate::model::{AccessoryItem, ClosedSet, TireOption};

pub const LIST_SEPARATOR: char = '|';
pub const PAIR_SEPARATOR: char = ':';

/// An entity that encodes as a `name:price` pair.
pub trait PricedEntry {
    fn entry_name(&self) -> &str;
    fn entry_price(&self) -> &str;
}

impl PricedEntry for AccessoryItem {
    fn entry_name(&self) -> &str {
        &self.name
    }

    fn entry_price(&self) -> &str {
        &self.price
    }
}

impl PricedEntry for TireOption {
    fn entry_name(&self) -> &str {
        self.label.as_str()
    }

    fn entry_price(&self) -> &str {
        &self.price
    }
}

/// Splits multi-line text on line breaks or `|`, trims every entry, drops the
/// blank ones and rejoins with `|`.
pub fn normalize_list_field(text: &str) -> String {
    text.split(['\n', LIST_SEPARATOR])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect::<Vec<_>>()
        .join("|")
}

/// Encodes every entry with a non-blank name as `name:price`, joined by `|`.
pub fn encode_entity_list<T: PricedEntry>(items: &[T]) -> String {
    items
        .iter()
        .filter(|item| !item.entry_name().trim().is_empty())
        .map(|item| {
            format!(
                "{}{PAIR_SEPARATOR}{}",
                item.entry_name().trim(),
                item.entry_price().trim()
            )
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Decodes a compound cell: split on `|`, then each segment on its first `:`.
/// A segment without `:` decodes with an empty price.
pub fn decode_entity_list(text: &str) -> Vec<(String, String)> {
    text.split(LIST_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once(PAIR_SEPARATOR) {
            Some((name, price)) => (name.to_string(), price.to_string()),
            None => (segment.to_string(), String::new()),
        })
        .collect()
}
