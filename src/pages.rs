//! The admin pages and their registration.
//!
//! Every page is a [`TablePage`] over one record type. Each provider owns a
//! single in-memory source, so edits survive leaving and reopening a page.

/// Declare a [`Choice`] enum from `Variant => ("value", "Label")` lines.
macro_rules! choice {
    ($(#[$meta:meta])* $vis:vis enum $name:ident {
        $($variant:ident => ($value:literal, $label:literal)),+ $(,)?
    }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::pages::Choice for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];
            const OPTIONS: &'static [(&'static str, &'static str)] = &[$(($value, $label)),+];

            fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $value),+
                }
            }
        }
    };
}

mod appointments;
mod emergency;
mod lab_tests;
mod prescriptions;
mod staff;

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use color_eyre::Result;
use color_eyre::eyre::eyre;

use crate::config::{BrowserConfig, DataConfig, KeyResolver};
use crate::page::{Page, TablePage, TableSchema};
use crate::record::{FieldKey, Patch, Value, patch_text};
use crate::registry::{PageProvider, PageRegistry};
use crate::source::InMemorySource;

/// Register every admin page, in the order the selector lists them.
pub fn register_all(registry: &mut PageRegistry, data: &DataConfig) {
    let latency = Duration::from_millis(data.latency_ms);
    registry.register(appointments::provider(latency));
    registry.register(prescriptions::provider(latency));
    registry.register(staff::provider(latency));
    registry.register(emergency::provider(latency));
    registry.register(lab_tests::provider(latency));
}

/// Provider for a page browsing one record type.
pub struct TableProvider<R: TableSchema> {
    source: Arc<InMemorySource<R>>,
    description: &'static str,
    icon: &'static str,
}

impl<R: TableSchema> TableProvider<R> {
    pub fn new(source: InMemorySource<R>, description: &'static str, icon: &'static str) -> Self {
        Self {
            source: Arc::new(source),
            description,
            icon,
        }
    }
}

impl<R: TableSchema> PageProvider for TableProvider<R> {
    fn key(&self) -> &'static str {
        R::KEY
    }

    fn display_name(&self) -> &'static str {
        R::TITLE
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn icon(&self) -> Option<&'static str> {
        Some(self.icon)
    }

    fn create_page(&self, resolver: Arc<KeyResolver>, config: &BrowserConfig) -> Box<dyn Page> {
        Box::new(TablePage::new(self.source.clone(), resolver, config))
    }
}

/// A closed set of text values stored in one field, e.g. a status.
pub trait Choice: Copy + PartialEq + 'static {
    const ALL: &'static [Self];
    /// `(value, label)` pairs, usable as editor and filter options.
    const OPTIONS: &'static [(&'static str, &'static str)];

    /// The stored value.
    fn as_str(self) -> &'static str;

    fn label(self) -> &'static str {
        Self::OPTIONS
            .iter()
            .find(|(value, _)| *value == self.as_str())
            .map_or_else(|| self.as_str(), |(_, label)| label)
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == value)
    }

    /// The choice held by a raw field value, if any.
    fn of(value: &Value) -> Option<Self> {
        value.as_str().and_then(Self::parse)
    }
}

pub fn patch_choice<K: FieldKey, C: Choice>(patch: &Patch<K>, key: K) -> Result<Option<C>> {
    patch_text(patch, key)?
        .map(|text| {
            C::parse(&text).ok_or_else(|| eyre!("Field '{}' has no option '{text}'", key.name()))
        })
        .transpose()
}

/// Fixture timestamp; invalid parts fall back to the epoch.
fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .unwrap_or_default()
}

fn on(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PageId;

    #[test]
    fn test_all_pages_register_in_order() {
        let mut registry = PageRegistry::new();
        register_all(&mut registry, &DataConfig::default());

        let keys: Vec<&str> = registry.providers().iter().map(|p| p.key()).collect();
        assert_eq!(
            keys,
            vec!["appointments", "prescriptions", "staff", "emergency", "lab-tests"]
        );
        assert!(registry.get(&PageId::new("staff")).is_some());
    }

    choice! {
        enum Level {
            Low => ("low", "Low"),
            High => ("high", "High"),
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    enum Field {
        Level,
    }

    impl FieldKey for Field {
        fn name(self) -> &'static str {
            "level"
        }
    }

    #[test]
    fn test_choice_round_trips_through_patch() {
        assert_eq!(Level::High.as_str(), "high");
        assert_eq!(Level::OPTIONS[0], ("low", "Low"));
        assert_eq!(Level::High.label(), "High");
        assert_eq!(Level::of(&Value::text("low")), Some(Level::Low));

        let patch = Patch::from([(Field::Level, Value::text("high"))]);
        assert_eq!(patch_choice::<_, Level>(&patch, Field::Level).unwrap(), Some(Level::High));

        let bad = Patch::from([(Field::Level, Value::text("urgent"))]);
        assert!(patch_choice::<_, Level>(&bad, Field::Level).is_err());
        assert_eq!(patch_choice::<_, Level>(&Patch::new(), Field::Level).unwrap(), None);
    }

    #[test]
    fn test_fixture_dates() {
        assert_eq!(at(2024, 5, 1, 9, 30).to_string(), "2024-05-01 09:30:00");
        assert_eq!(on(2024, 2, 30), NaiveDate::default());
    }
}
