//! Country / subdivision holiday calendar.
//!
//! The calendar is built once from the static tables in [`super::regions`] and
//! [`super::rules`], validated, and then shared read-only by every request.
//! Lookups never fail: an unsupported country yields no holidays and an
//! unknown subdivision falls back to the national calendar.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Datelike, Days, NaiveDate};
use tracing::{debug, warn};

use super::regions::{COUNTRIES, CountryEntry, REGIONS, RegionEntry};
use super::rules::{HolidayRule, NATIONAL, REGIONAL};
use crate::domain::HolidayEvent;
use crate::error::AppError;

/// A resolved calendar: country plus optional subdivision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionKey {
    pub country: &'static str,
    pub subdivision: Option<&'static str>,
}

#[derive(Debug)]
struct CountryCalendar {
    entry: CountryEntry,
    national: &'static [HolidayRule],
    /// Subdivision code -> extra rules (empty slice when none).
    regions: HashMap<&'static str, &'static [HolidayRule]>,
    /// Lowercase code / `cc-xx` / name -> subdivision code.
    region_lookup: HashMap<String, &'static str>,
}

/// Read-only holiday provider.
#[derive(Debug)]
pub struct HolidayCalendar {
    /// Country codes in table order.
    order: Vec<&'static str>,
    countries: HashMap<&'static str, CountryCalendar>,
    /// Lowercase code / name / alias -> country code.
    country_lookup: HashMap<String, &'static str>,
}

impl HolidayCalendar {
    /// Build the calendar from the built-in tables.
    pub fn new() -> Result<Self, AppError> {
        Self::from_tables(COUNTRIES, REGIONS, NATIONAL, REGIONAL)
    }

    /// Build and validate a calendar from explicit tables.
    pub fn from_tables(
        countries: &'static [CountryEntry],
        regions: &'static [RegionEntry],
        national: &'static [(&'static str, &'static [HolidayRule])],
        regional: &'static [(&'static str, &'static str, &'static [HolidayRule])],
    ) -> Result<Self, AppError> {
        let mut country_lookup: HashMap<String, &'static str> = HashMap::new();
        let mut calendars: HashMap<&'static str, CountryCalendar> = HashMap::new();

        for entry in countries {
            let national_rules = national
                .iter()
                .find(|(code, _)| *code == entry.code)
                .map(|(_, rules)| *rules)
                .ok_or_else(|| AppError::Config(format!("country {} has no holiday rules", entry.code)))?;

            let keys = std::iter::once(entry.code.to_ascii_lowercase())
                .chain(std::iter::once(entry.name.to_lowercase()))
                .chain(entry.aliases.iter().map(|a| a.to_lowercase()));
            for key in keys {
                if let Some(existing) = country_lookup.insert(key.clone(), entry.code) {
                    if existing != entry.code {
                        return Err(AppError::Config(format!(
                            "country key '{key}' maps to both {existing} and {}",
                            entry.code
                        )));
                    }
                }
            }

            if calendars
                .insert(
                    entry.code,
                    CountryCalendar {
                        entry: *entry,
                        national: national_rules,
                        regions: HashMap::new(),
                        region_lookup: HashMap::new(),
                    },
                )
                .is_some()
            {
                return Err(AppError::Config(format!("duplicate country code {}", entry.code)));
            }
        }

        if let Some((code, _)) = national.iter().find(|(code, _)| !calendars.contains_key(code)) {
            return Err(AppError::Config(format!("holiday rules for unknown country {code}")));
        }

        for region in regions {
            let calendar = calendars
                .get_mut(region.country)
                .ok_or_else(|| AppError::Config(format!("region {} belongs to unknown country {}", region.code, region.country)))?;
            if calendar.regions.insert(region.code, &[]).is_some() {
                return Err(AppError::Config(format!(
                    "duplicate region code {}-{}",
                    region.country, region.code
                )));
            }
            let keys = [
                region.code.to_ascii_lowercase(),
                format!("{}-{}", region.country, region.code).to_ascii_lowercase(),
                region.name.to_lowercase(),
            ];
            for key in keys {
                if let Some(existing) = calendar.region_lookup.insert(key.clone(), region.code) {
                    if existing != region.code {
                        return Err(AppError::Config(format!(
                            "region key '{key}' maps to both {existing} and {}",
                            region.code
                        )));
                    }
                }
            }
        }

        for (country, code, rules) in regional {
            let slot = calendars
                .get_mut(country)
                .and_then(|c| c.regions.get_mut(code))
                .ok_or_else(|| AppError::Config(format!("holiday rules for unknown region {country}-{code}")))?;
            if !slot.is_empty() {
                return Err(AppError::Config(format!("duplicate holiday rules for {country}-{code}")));
            }
            *slot = *rules;
        }

        debug!(
            countries = calendars.len(),
            regions = regions.len(),
            "holiday calendar ready"
        );
        Ok(Self {
            order: countries.iter().map(|c| c.code).collect(),
            countries: calendars,
            country_lookup,
        })
    }

    /// Supported countries as `(code, name)`, in table order.
    pub fn supported_countries(&self) -> Vec<(&'static str, &'static str)> {
        self.order
            .iter()
            .filter_map(|code| self.countries.get(code))
            .map(|c| (c.entry.code, c.entry.name))
            .collect()
    }

    /// Map user input to a calendar.
    ///
    /// Returns `None` (and logs a warning) when the country is unsupported.
    /// An unknown subdivision resolves to the national calendar.
    pub fn resolve(&self, country: &str, subdivision: Option<&str>) -> Option<RegionKey> {
        let key = country.trim().to_lowercase();
        let Some(code) = self.country_lookup.get(&key).copied() else {
            warn!(country = country.trim(), "country not supported for holidays");
            return None;
        };
        let calendar = self.countries.get(code)?;

        let subdivision = subdivision.map(str::trim).filter(|s| !s.is_empty()).and_then(|s| {
            let found = calendar.region_lookup.get(&s.to_lowercase()).copied();
            if found.is_none() {
                debug!(country = code, subdivision = s, "unknown subdivision; using national calendar");
            }
            found
        });

        Some(RegionKey {
            country: calendar.entry.code,
            subdivision,
        })
    }

    /// Holidays with dates in `[start, end]`, sorted by date then name.
    pub fn holidays_between(
        &self,
        country: &str,
        subdivision: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<HolidayEvent> {
        let Some(key) = self.resolve(country, subdivision) else {
            return Vec::new();
        };
        self.events_between(key, start, end)
    }

    /// Unique holiday names in `[today, today + weeks_ahead weeks]`, in date order.
    pub fn upcoming_holidays(
        &self,
        country: &str,
        subdivision: Option<&str>,
        weeks_ahead: u32,
        today: NaiveDate,
    ) -> Vec<String> {
        let end = today
            .checked_add_days(Days::new(u64::from(weeks_ahead) * 7))
            .unwrap_or(NaiveDate::MAX);
        let mut seen = HashSet::new();
        self.holidays_between(country, subdivision, today, end)
            .into_iter()
            .filter(|event| seen.insert(event.name.clone()))
            .map(|event| event.name)
            .collect()
    }

    /// Holidays for an already-resolved calendar.
    pub fn events_between(&self, key: RegionKey, start: NaiveDate, end: NaiveDate) -> Vec<HolidayEvent> {
        if start > end {
            return Vec::new();
        }
        let Some(calendar) = self.countries.get(key.country) else {
            return Vec::new();
        };
        let regional: &[HolidayRule] = key
            .subdivision
            .and_then(|code| calendar.regions.get(code).copied())
            .unwrap_or(&[]);

        // Observed dates can spill into the neighbouring year (e.g. a Saturday
        // New Year's Day observed on December 31st).
        let mut events: Vec<HolidayEvent> = (start.year() - 1..=end.year() + 1)
            .flat_map(|year| year_events(calendar.national.iter().chain(regional), year))
            .filter(|event| event.date >= start && event.date <= end)
            .collect();
        events.sort();
        events.dedup();
        events
    }
}

/// All holidays (actual and observed) generated by `rules` for one year.
fn year_events<'a>(rules: impl Iterator<Item = &'a HolidayRule>, year: i32) -> Vec<HolidayEvent> {
    let dated: Vec<(&HolidayRule, NaiveDate)> = rules
        .filter_map(|rule| rule.date_in(year).map(|date| (rule, date)))
        .collect();
    let mut taken: BTreeSet<NaiveDate> = dated.iter().map(|(_, date)| *date).collect();

    let mut events = Vec::with_capacity(dated.len());
    for (rule, date) in dated {
        events.push(HolidayEvent {
            date,
            name: rule.name.to_string(),
        });
        if let Some(observed) = rule.observance.shift(date, &taken) {
            taken.insert(observed);
            events.push(HolidayEvent {
                date: observed,
                name: format!("{} (observed)", rule.name),
            });
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::rules::{DateRule, Observance};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn calendar() -> HolidayCalendar {
        HolidayCalendar::new().unwrap()
    }

    fn has(events: &[HolidayEvent], date: NaiveDate, name: &str) -> bool {
        events.iter().any(|e| e.date == date && e.name == name)
    }

    #[test]
    fn builtin_tables_are_valid() {
        let cal = calendar();
        assert_eq!(cal.supported_countries().len(), 10);
    }

    #[test]
    fn country_aliases_resolve() {
        let cal = calendar();
        for input in ["US", "us", " usa ", "America", "United States"] {
            assert_eq!(cal.resolve(input, None).unwrap().country, "US", "{input}");
        }
        for input in ["uk", "Britain", "GB", "united kingdom"] {
            assert_eq!(cal.resolve(input, None).unwrap().country, "GB", "{input}");
        }
        assert!(cal.resolve("Atlantis", None).is_none());
    }

    #[test]
    fn subdivisions_accept_code_iso_and_name() {
        let cal = calendar();
        for input in ["CA", "us-ca", "California", " california "] {
            let key = cal.resolve("US", Some(input)).unwrap();
            assert_eq!(key.subdivision, Some("CA"), "{input}");
        }
        let key = cal.resolve("India", Some("Tamil Nadu")).unwrap();
        assert_eq!(key.subdivision, Some("TN"));
        let key = cal.resolve("Canada", Some("ON")).unwrap();
        assert_eq!(key.subdivision, Some("ON"));
    }

    #[test]
    fn india_includes_festivals_and_state_days() {
        let cal = calendar();
        let events = cal.holidays_between("India", Some("Maharashtra"), d(2024, 1, 1), d(2024, 12, 31));
        assert!(has(&events, d(2024, 11, 1), "Diwali"));
        assert!(has(&events, d(2024, 3, 25), "Holi"));
        assert!(has(&events, d(2024, 10, 12), "Dussehra"));
        assert!(has(&events, d(2024, 4, 11), "Eid al-Fitr"));
        assert!(has(&events, d(2024, 6, 17), "Eid al-Adha"));
        assert!(has(&events, d(2024, 5, 1), "Maharashtra Day"));

        let upcoming = cal.upcoming_holidays("IN", None, 6, d(2024, 10, 1));
        assert!(upcoming.iter().any(|h| h == "Diwali"));
    }

    #[test]
    fn unknown_subdivision_falls_back_to_national() {
        let cal = calendar();
        let key = cal.resolve("US", Some("Narnia")).unwrap();
        assert_eq!(key.subdivision, None);

        let start = d(2024, 1, 1);
        let end = d(2024, 12, 31);
        assert_eq!(
            cal.holidays_between("US", Some("Narnia"), start, end),
            cal.holidays_between("US", None, start, end)
        );
    }

    #[test]
    fn us_known_dates() {
        let cal = calendar();
        let events = cal.holidays_between("US", None, d(2024, 1, 1), d(2026, 12, 31));
        assert!(has(&events, d(2024, 11, 28), "Thanksgiving"));
        assert!(has(&events, d(2026, 7, 4), "Independence Day"));
        assert!(has(&events, d(2026, 7, 3), "Independence Day (observed)"));
        assert!(has(&events, d(2024, 1, 15), "Martin Luther King Jr. Day"));
        assert!(events.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn observed_dates_cross_year_boundaries() {
        // 2022-01-01 is a Saturday, observed on Friday 2021-12-31.
        let cal = calendar();
        let events = cal.holidays_between("US", None, d(2021, 12, 1), d(2021, 12, 31));
        assert!(has(&events, d(2021, 12, 31), "New Year's Day (observed)"));
    }

    #[test]
    fn gb_good_friday_and_substitutes() {
        let cal = calendar();
        let events = cal.holidays_between("uk", None, d(2024, 1, 1), d(2024, 12, 31));
        assert!(has(&events, d(2024, 3, 29), "Good Friday"));
        assert!(has(&events, d(2024, 4, 1), "Easter Monday"));

        let events = cal.holidays_between("GB", None, d(2021, 12, 20), d(2021, 12, 31));
        assert!(has(&events, d(2021, 12, 27), "Christmas Day (observed)"));
        assert!(has(&events, d(2021, 12, 28), "Boxing Day (observed)"));
    }

    #[test]
    fn regional_rules_add_to_national() {
        let cal = calendar();
        let national = cal.holidays_between("US", None, d(2024, 1, 1), d(2024, 12, 31));
        let texas = cal.holidays_between("US", Some("TX"), d(2024, 1, 1), d(2024, 12, 31));
        assert!(texas.len() > national.len());
        assert!(has(&texas, d(2024, 4, 21), "San Jacinto Day"));
        assert!(!has(&national, d(2024, 4, 21), "San Jacinto Day"));
    }

    #[test]
    fn window_is_inclusive_and_empty_when_reversed() {
        let cal = calendar();
        let day = d(2024, 12, 25);
        let events = cal.holidays_between("DE", None, day, day);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Christmas Day");
        assert!(cal.holidays_between("DE", None, d(2025, 1, 1), d(2024, 1, 1)).is_empty());
    }

    #[test]
    fn unsupported_country_yields_nothing() {
        let cal = calendar();
        assert!(cal.holidays_between("ZZ", None, d(2024, 1, 1), d(2024, 12, 31)).is_empty());
        assert!(cal.upcoming_holidays("ZZ", None, 52, d(2024, 1, 1)).is_empty());
    }

    #[test]
    fn upcoming_names_are_unique_and_ordered() {
        let cal = calendar();
        let names = cal.upcoming_holidays("US", None, 8, d(2024, 11, 1));
        assert_eq!(names, vec!["Veterans Day", "Thanksgiving", "Christmas Day"]);

        // Two years of Christmas still yields one name.
        let names = cal.upcoming_holidays("DE", None, 110, d(2024, 12, 1));
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn invalid_tables_are_config_errors() {
        static COUNTRIES_BAD: &[CountryEntry] = &[
            CountryEntry {
                code: "AA",
                name: "Alpha",
                aliases: &["shared"],
            },
            CountryEntry {
                code: "BB",
                name: "Beta",
                aliases: &["shared"],
            },
        ];
        static RULES: &[HolidayRule] = &[HolidayRule {
            name: "Day",
            rule: DateRule::Fixed { month: 1, day: 1 },
            observance: Observance::None,
            since: None,
        }];
        static NATIONAL_OK: &[(&str, &[HolidayRule])] = &[("AA", RULES), ("BB", RULES)];
        let err = HolidayCalendar::from_tables(COUNTRIES_BAD, &[], NATIONAL_OK, &[]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        static ORPHAN_REGION: &[RegionEntry] = &[RegionEntry {
            country: "ZZ",
            code: "X1",
            name: "Nowhere",
        }];
        static US_ONLY: &[CountryEntry] = COUNTRIES.split_at(1).0;
        static US_RULES: &[(&str, &[HolidayRule])] = NATIONAL.split_at(1).0;
        let err = HolidayCalendar::from_tables(US_ONLY, ORPHAN_REGION, US_RULES, &[]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let err = HolidayCalendar::from_tables(US_ONLY, &[], &[], &[]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
