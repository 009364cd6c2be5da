//! Holiday date rules and the per-country rule tables.
//!
//! Most dates are computed, so any year resolves without a lookup table going
//! stale. Lunisolar festivals (India) cannot be derived from the Gregorian
//! calendar alone and use per-year tables covering 2015-2030.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// How a holiday's date is derived for a given year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRule {
    /// Same month/day every year.
    Fixed { month: u32, day: u32 },
    /// The `n`-th (1-based) `weekday` of `month`.
    NthWeekday { month: u32, weekday: Weekday, n: u8 },
    /// The last `weekday` of `month`.
    LastWeekday { month: u32, weekday: Weekday },
    /// The last `weekday` strictly before `month`/`day` (e.g. Victoria Day).
    WeekdayBefore { month: u32, day: u32, weekday: Weekday },
    /// Offset in days from Western Easter Sunday.
    Easter { offset: i64 },
    /// Japanese vernal equinox day.
    VernalEquinox,
    /// Japanese autumnal equinox day.
    AutumnalEquinox,
    /// Hard-coded `(year, month, day)` dates; years outside the table have none.
    Listed { dates: &'static [(i32, u32, u32)] },
}

/// Weekend handling for a holiday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observance {
    /// Stays on its date.
    None,
    /// Saturday is observed on Friday, Sunday on Monday (US).
    NearestWeekday,
    /// Weekend dates move to the next free weekday (GB/AU substitute days).
    NextFreeWeekday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HolidayRule {
    pub name: &'static str,
    pub rule: DateRule,
    pub observance: Observance,
    /// First year the holiday exists, if it is recent.
    pub since: Option<i32>,
}

impl HolidayRule {
    /// Actual date of the holiday in `year`, if it exists that year.
    pub fn date_in(&self, year: i32) -> Option<NaiveDate> {
        if self.since.is_some_and(|first| year < first) {
            return None;
        }
        self.rule.date_in(year)
    }
}

impl DateRule {
    pub fn date_in(&self, year: i32) -> Option<NaiveDate> {
        match *self {
            DateRule::Fixed { month, day } => NaiveDate::from_ymd_opt(year, month, day),
            DateRule::NthWeekday { month, weekday, n } => NaiveDate::from_weekday_of_month_opt(year, month, weekday, n),
            DateRule::LastWeekday { month, weekday } => last_weekday(year, month, weekday),
            DateRule::WeekdayBefore { month, day, weekday } => {
                let anchor = NaiveDate::from_ymd_opt(year, month, day)?;
                let back = (anchor.weekday().num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7;
                let back = if back == 0 { 7 } else { back };
                anchor.checked_sub_days(Days::new(u64::from(back)))
            }
            DateRule::Easter { offset } => {
                let easter = easter_sunday(year)?;
                if offset >= 0 {
                    easter.checked_add_days(Days::new(offset.unsigned_abs()))
                } else {
                    easter.checked_sub_days(Days::new(offset.unsigned_abs()))
                }
            }
            DateRule::VernalEquinox => equinox_day(year, 20.8431),
            DateRule::AutumnalEquinox => equinox_day(year, 23.2488),
            DateRule::Listed { dates } => dates
                .iter()
                .find(|(y, _, _)| *y == year)
                .and_then(|&(y, month, day)| NaiveDate::from_ymd_opt(y, month, day)),
        }
    }
}

impl Observance {
    /// Observed date for `date`, or `None` when no shift is needed.
    ///
    /// `taken` holds the dates already occupied by holidays in the same year.
    pub fn shift(self, date: NaiveDate, taken: &BTreeSet<NaiveDate>) -> Option<NaiveDate> {
        match self {
            Observance::None => None,
            Observance::NearestWeekday => match date.weekday() {
                Weekday::Sat => date.pred_opt(),
                Weekday::Sun => date.succ_opt(),
                _ => None,
            },
            Observance::NextFreeWeekday => {
                if !is_weekend(date) {
                    return None;
                }
                let mut candidate = date.succ_opt()?;
                while is_weekend(candidate) || taken.contains(&candidate) {
                    candidate = candidate.succ_opt()?;
                }
                Some(candidate)
            }
        }
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = first_of_next.pred_opt()?;
    let back = (last.weekday().num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7;
    last.checked_sub_days(Days::new(u64::from(back)))
}

/// Western Easter Sunday (anonymous Gregorian algorithm).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
}

/// Equinox day using the almanac approximation valid for 1980-2099.
fn equinox_day(year: i32, base: f64) -> Option<NaiveDate> {
    if !(1980..=2099).contains(&year) {
        return None;
    }
    let y = f64::from(year - 1980);
    let day = (base + 0.242194 * y - (y / 4.0).floor()).floor();
    let month = if base < 22.0 { 3 } else { 9 };
    NaiveDate::from_ymd_opt(year, month, day as u32)
}

const fn fixed(name: &'static str, month: u32, day: u32) -> HolidayRule {
    HolidayRule {
        name,
        rule: DateRule::Fixed { month, day },
        observance: Observance::None,
        since: None,
    }
}

const fn listed(name: &'static str, dates: &'static [(i32, u32, u32)]) -> HolidayRule {
    HolidayRule {
        name,
        rule: DateRule::Listed { dates },
        observance: Observance::None,
        since: None,
    }
}

const fn nth(name: &'static str, month: u32, weekday: Weekday, n: u8) -> HolidayRule {
    HolidayRule {
        name,
        rule: DateRule::NthWeekday { month, weekday, n },
        observance: Observance::None,
        since: None,
    }
}

const fn last(name: &'static str, month: u32, weekday: Weekday) -> HolidayRule {
    HolidayRule {
        name,
        rule: DateRule::LastWeekday { month, weekday },
        observance: Observance::None,
        since: None,
    }
}

const fn easter(name: &'static str, offset: i64) -> HolidayRule {
    HolidayRule {
        name,
        rule: DateRule::Easter { offset },
        observance: Observance::None,
        since: None,
    }
}

const fn observed(rule: HolidayRule, observance: Observance) -> HolidayRule {
    HolidayRule { observance, ..rule }
}

const fn us(name: &'static str, month: u32, day: u32) -> HolidayRule {
    observed(fixed(name, month, day), Observance::NearestWeekday)
}

const fn substitute(name: &'static str, month: u32, day: u32) -> HolidayRule {
    observed(fixed(name, month, day), Observance::NextFreeWeekday)
}

const VICTORIA_DAY: HolidayRule = HolidayRule {
    name: "Victoria Day",
    rule: DateRule::WeekdayBefore {
        month: 5,
        day: 25,
        weekday: Weekday::Mon,
    },
    observance: Observance::None,
    since: None,
};

const US: &[HolidayRule] = &[
    us("New Year's Day", 1, 1),
    nth("Martin Luther King Jr. Day", 1, Weekday::Mon, 3),
    nth("Washington's Birthday", 2, Weekday::Mon, 3),
    last("Memorial Day", 5, Weekday::Mon),
    HolidayRule {
        since: Some(2021),
        ..us("Juneteenth National Independence Day", 6, 19)
    },
    us("Independence Day", 7, 4),
    nth("Labor Day", 9, Weekday::Mon, 1),
    nth("Columbus Day", 10, Weekday::Mon, 2),
    us("Veterans Day", 11, 11),
    nth("Thanksgiving", 11, Weekday::Thu, 4),
    us("Christmas Day", 12, 25),
];

// Gazetted dates as announced; later years are astronomical estimates.
const HOLI: &[(i32, u32, u32)] = &[
    (2015, 3, 6),
    (2016, 3, 24),
    (2017, 3, 13),
    (2018, 3, 2),
    (2019, 3, 21),
    (2020, 3, 10),
    (2021, 3, 29),
    (2022, 3, 18),
    (2023, 3, 8),
    (2024, 3, 25),
    (2025, 3, 14),
    (2026, 3, 4),
    (2027, 3, 22),
    (2028, 3, 11),
    (2029, 3, 1),
    (2030, 3, 20),
];

const EID_AL_FITR: &[(i32, u32, u32)] = &[
    (2015, 7, 18),
    (2016, 7, 7),
    (2017, 6, 26),
    (2018, 6, 16),
    (2019, 6, 5),
    (2020, 5, 25),
    (2021, 5, 14),
    (2022, 5, 3),
    (2023, 4, 22),
    (2024, 4, 11),
    (2025, 3, 31),
    (2026, 3, 21),
    (2027, 3, 10),
    (2028, 2, 27),
    (2029, 2, 15),
    (2030, 2, 5),
];

const EID_AL_ADHA: &[(i32, u32, u32)] = &[
    (2015, 9, 25),
    (2016, 9, 13),
    (2017, 9, 2),
    (2018, 8, 22),
    (2019, 8, 12),
    (2020, 8, 1),
    (2021, 7, 21),
    (2022, 7, 10),
    (2023, 6, 29),
    (2024, 6, 17),
    (2025, 6, 7),
    (2026, 5, 27),
    (2027, 5, 17),
    (2028, 5, 6),
    (2029, 4, 24),
    (2030, 4, 14),
];

const DUSSEHRA: &[(i32, u32, u32)] = &[
    (2015, 10, 22),
    (2016, 10, 11),
    (2017, 9, 30),
    (2018, 10, 19),
    (2019, 10, 8),
    (2020, 10, 25),
    (2021, 10, 15),
    (2022, 10, 5),
    (2023, 10, 24),
    (2024, 10, 12),
    (2025, 10, 2),
    (2026, 10, 20),
    (2027, 10, 9),
    (2028, 9, 27),
    (2029, 10, 16),
    (2030, 10, 6),
];

const DIWALI: &[(i32, u32, u32)] = &[
    (2015, 11, 11),
    (2016, 10, 30),
    (2017, 10, 19),
    (2018, 11, 7),
    (2019, 10, 27),
    (2020, 11, 14),
    (2021, 11, 4),
    (2022, 10, 24),
    (2023, 11, 12),
    (2024, 11, 1),
    (2025, 10, 20),
    (2026, 11, 8),
    (2027, 10, 29),
    (2028, 10, 17),
    (2029, 11, 5),
    (2030, 10, 26),
];

const IN: &[HolidayRule] = &[
    fixed("Republic Day", 1, 26),
    listed("Holi", HOLI),
    listed("Eid al-Fitr", EID_AL_FITR),
    fixed("Labour Day", 5, 1),
    listed("Eid al-Adha", EID_AL_ADHA),
    fixed("Independence Day", 8, 15),
    fixed("Gandhi Jayanti", 10, 2),
    listed("Dussehra", DUSSEHRA),
    listed("Diwali", DIWALI),
    fixed("Christmas", 12, 25),
];

const GB: &[HolidayRule] = &[
    substitute("New Year's Day", 1, 1),
    easter("Good Friday", -2),
    easter("Easter Monday", 1),
    nth("May Day", 5, Weekday::Mon, 1),
    last("Spring Bank Holiday", 5, Weekday::Mon),
    last("Late Summer Bank Holiday", 8, Weekday::Mon),
    substitute("Christmas Day", 12, 25),
    substitute("Boxing Day", 12, 26),
];

const CA: &[HolidayRule] = &[
    fixed("New Year's Day", 1, 1),
    easter("Good Friday", -2),
    VICTORIA_DAY,
    fixed("Canada Day", 7, 1),
    nth("Labour Day", 9, Weekday::Mon, 1),
    nth("Thanksgiving", 10, Weekday::Mon, 2),
    fixed("Christmas Day", 12, 25),
];

const AU: &[HolidayRule] = &[
    substitute("New Year's Day", 1, 1),
    substitute("Australia Day", 1, 26),
    easter("Good Friday", -2),
    easter("Easter Saturday", -1),
    easter("Easter Monday", 1),
    fixed("ANZAC Day", 4, 25),
    substitute("Christmas Day", 12, 25),
    substitute("Boxing Day", 12, 26),
];

const DE: &[HolidayRule] = &[
    fixed("New Year's Day", 1, 1),
    easter("Good Friday", -2),
    easter("Easter Monday", 1),
    fixed("Labour Day", 5, 1),
    easter("Ascension Day", 39),
    easter("Whit Monday", 50),
    fixed("German Unity Day", 10, 3),
    fixed("Christmas Day", 12, 25),
    fixed("Second Day of Christmas", 12, 26),
];

const FR: &[HolidayRule] = &[
    fixed("New Year's Day", 1, 1),
    easter("Easter Monday", 1),
    fixed("Labour Day", 5, 1),
    fixed("Victory in Europe Day", 5, 8),
    easter("Ascension Day", 39),
    easter("Whit Monday", 50),
    fixed("Bastille Day", 7, 14),
    fixed("Assumption Day", 8, 15),
    fixed("All Saints' Day", 11, 1),
    fixed("Armistice Day", 11, 11),
    fixed("Christmas Day", 12, 25),
];

const JP: &[HolidayRule] = &[
    fixed("New Year's Day", 1, 1),
    nth("Coming of Age Day", 1, Weekday::Mon, 2),
    fixed("Foundation Day", 2, 11),
    HolidayRule {
        since: Some(2020),
        ..fixed("Emperor's Birthday", 2, 23)
    },
    HolidayRule {
        name: "Vernal Equinox Day",
        rule: DateRule::VernalEquinox,
        observance: Observance::None,
        since: None,
    },
    fixed("Showa Day", 4, 29),
    fixed("Constitution Day", 5, 3),
    fixed("Greenery Day", 5, 4),
    fixed("Children's Day", 5, 5),
    nth("Marine Day", 7, Weekday::Mon, 3),
    HolidayRule {
        since: Some(2016),
        ..fixed("Mountain Day", 8, 11)
    },
    nth("Respect for the Aged Day", 9, Weekday::Mon, 3),
    HolidayRule {
        name: "Autumnal Equinox Day",
        rule: DateRule::AutumnalEquinox,
        observance: Observance::None,
        since: None,
    },
    nth("Sports Day", 10, Weekday::Mon, 2),
    fixed("Culture Day", 11, 3),
    fixed("Labor Thanksgiving Day", 11, 23),
];

const BR: &[HolidayRule] = &[
    fixed("Universal Fraternization Day", 1, 1),
    easter("Carnival Tuesday", -47),
    easter("Good Friday", -2),
    fixed("Tiradentes' Day", 4, 21),
    fixed("Worker's Day", 5, 1),
    fixed("Independence Day", 9, 7),
    fixed("Our Lady of Aparecida", 10, 12),
    fixed("All Souls' Day", 11, 2),
    fixed("Republic Proclamation Day", 11, 15),
    fixed("Christmas Day", 12, 25),
];

const MX: &[HolidayRule] = &[
    fixed("New Year's Day", 1, 1),
    nth("Constitution Day", 2, Weekday::Mon, 1),
    nth("Benito Juárez's Birthday", 3, Weekday::Mon, 3),
    fixed("Labor Day", 5, 1),
    fixed("Independence Day", 9, 16),
    nth("Revolution Day", 11, Weekday::Mon, 3),
    fixed("Christmas Day", 12, 25),
];

/// National rules, keyed by country code.
pub const NATIONAL: &[(&str, &[HolidayRule])] = &[
    ("US", US),
    ("IN", IN),
    ("GB", GB),
    ("CA", CA),
    ("AU", AU),
    ("DE", DE),
    ("FR", FR),
    ("JP", JP),
    ("BR", BR),
    ("MX", MX),
];

/// Extra subdivision rules, keyed by `(country, subdivision)`.
///
/// Subdivisions without an entry use the national calendar only.
pub const REGIONAL: &[(&str, &str, &[HolidayRule])] = &[
    ("US", "CA", &[us("Cesar Chavez Day", 3, 31)]),
    ("US", "HI", &[us("Prince Jonah Kuhio Kalanianaole Day", 3, 26), us("Kamehameha Day", 6, 11)]),
    ("US", "IL", &[us("Lincoln's Birthday", 2, 12)]),
    ("US", "MA", &[nth("Patriots' Day", 4, Weekday::Mon, 3)]),
    ("US", "ME", &[nth("Patriots' Day", 4, Weekday::Mon, 3)]),
    ("US", "NY", &[us("Lincoln's Birthday", 2, 12)]),
    ("US", "TX", &[fixed("Texas Independence Day", 3, 2), fixed("San Jacinto Day", 4, 21)]),
    ("US", "VT", &[nth("Town Meeting Day", 3, Weekday::Tue, 1), us("Bennington Battle Day", 8, 16)]),
    ("IN", "MH", &[fixed("Maharashtra Day", 5, 1)]),
    ("IN", "KA", &[fixed("Karnataka Rajyotsava", 11, 1)]),
    ("IN", "TN", &[fixed("Pongal", 1, 14)]),
    ("IN", "GJ", &[fixed("Gujarat Day", 5, 1)]),
    ("IN", "WB", &[fixed("Netaji Subhas Chandra Bose Jayanti", 1, 23)]),
    ("IN", "RJ", &[fixed("Rajasthan Day", 3, 30)]),
    ("IN", "UP", &[fixed("UP Formation Day", 1, 24)]),
    ("IN", "MP", &[fixed("Madhya Pradesh Foundation Day", 11, 1)]),
    ("IN", "BR", &[fixed("Bihar Day", 3, 22)]),
    ("IN", "OR", &[fixed("Odisha Day", 4, 1)]),
    (
        "CA",
        "ON",
        &[
            nth("Family Day", 2, Weekday::Mon, 3),
            nth("Civic Holiday", 8, Weekday::Mon, 1),
            fixed("Boxing Day", 12, 26),
        ],
    ),
    ("CA", "QC", &[fixed("Saint Jean Baptiste Day", 6, 24)]),
    (
        "CA",
        "BC",
        &[
            nth("Family Day", 2, Weekday::Mon, 3),
            nth("British Columbia Day", 8, Weekday::Mon, 1),
            fixed("Remembrance Day", 11, 11),
        ],
    ),
    (
        "CA",
        "AB",
        &[
            nth("Family Day", 2, Weekday::Mon, 3),
            nth("Heritage Day", 8, Weekday::Mon, 1),
            fixed("Remembrance Day", 11, 11),
        ],
    ),
    (
        "CA",
        "MB",
        &[
            nth("Louis Riel Day", 2, Weekday::Mon, 3),
            nth("Civic Holiday", 8, Weekday::Mon, 1),
            fixed("Remembrance Day", 11, 11),
        ],
    ),
    (
        "CA",
        "SK",
        &[
            nth("Family Day", 2, Weekday::Mon, 3),
            nth("Saskatchewan Day", 8, Weekday::Mon, 1),
            fixed("Remembrance Day", 11, 11),
        ],
    ),
    (
        "CA",
        "NS",
        &[nth("Heritage Day", 2, Weekday::Mon, 3), fixed("Remembrance Day", 11, 11)],
    ),
    (
        "CA",
        "NB",
        &[
            nth("Family Day", 2, Weekday::Mon, 3),
            nth("New Brunswick Day", 8, Weekday::Mon, 1),
            fixed("Remembrance Day", 11, 11),
        ],
    ),
    ("CA", "NL", &[fixed("Remembrance Day", 11, 11)]),
    (
        "CA",
        "PE",
        &[nth("Islander Day", 2, Weekday::Mon, 3), fixed("Remembrance Day", 11, 11)],
    ),
];
