//! Static country / subdivision tables.
//!
//! These tables are plain data; `HolidayCalendar::new` validates them and
//! builds the lookup indexes.

/// A supported country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryEntry {
    /// ISO 3166-1 alpha-2 code.
    pub code: &'static str,
    pub name: &'static str,
    /// Extra lowercase names accepted on input.
    pub aliases: &'static [&'static str],
}

/// A supported first-level subdivision (state, province, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionEntry {
    pub country: &'static str,
    pub code: &'static str,
    pub name: &'static str,
}

pub const COUNTRIES: &[CountryEntry] = &[
    CountryEntry {
        code: "US",
        name: "United States",
        aliases: &["usa", "america", "united states of america"],
    },
    CountryEntry {
        code: "IN",
        name: "India",
        aliases: &[],
    },
    CountryEntry {
        code: "GB",
        name: "United Kingdom",
        aliases: &["uk", "britain", "great britain"],
    },
    CountryEntry {
        code: "CA",
        name: "Canada",
        aliases: &[],
    },
    CountryEntry {
        code: "AU",
        name: "Australia",
        aliases: &[],
    },
    CountryEntry {
        code: "DE",
        name: "Germany",
        aliases: &[],
    },
    CountryEntry {
        code: "FR",
        name: "France",
        aliases: &[],
    },
    CountryEntry {
        code: "JP",
        name: "Japan",
        aliases: &[],
    },
    CountryEntry {
        code: "BR",
        name: "Brazil",
        aliases: &[],
    },
    CountryEntry {
        code: "MX",
        name: "Mexico",
        aliases: &[],
    },
];

const fn region(country: &'static str, code: &'static str, name: &'static str) -> RegionEntry {
    RegionEntry { country, code, name }
}

pub const REGIONS: &[RegionEntry] = &[
    // United States
    region("US", "AL", "Alabama"),
    region("US", "AK", "Alaska"),
    region("US", "AZ", "Arizona"),
    region("US", "AR", "Arkansas"),
    region("US", "CA", "California"),
    region("US", "CO", "Colorado"),
    region("US", "CT", "Connecticut"),
    region("US", "DE", "Delaware"),
    region("US", "DC", "District of Columbia"),
    region("US", "FL", "Florida"),
    region("US", "GA", "Georgia"),
    region("US", "HI", "Hawaii"),
    region("US", "ID", "Idaho"),
    region("US", "IL", "Illinois"),
    region("US", "IN", "Indiana"),
    region("US", "IA", "Iowa"),
    region("US", "KS", "Kansas"),
    region("US", "KY", "Kentucky"),
    region("US", "LA", "Louisiana"),
    region("US", "ME", "Maine"),
    region("US", "MD", "Maryland"),
    region("US", "MA", "Massachusetts"),
    region("US", "MI", "Michigan"),
    region("US", "MN", "Minnesota"),
    region("US", "MS", "Mississippi"),
    region("US", "MO", "Missouri"),
    region("US", "MT", "Montana"),
    region("US", "NE", "Nebraska"),
    region("US", "NV", "Nevada"),
    region("US", "NH", "New Hampshire"),
    region("US", "NJ", "New Jersey"),
    region("US", "NM", "New Mexico"),
    region("US", "NY", "New York"),
    region("US", "NC", "North Carolina"),
    region("US", "ND", "North Dakota"),
    region("US", "OH", "Ohio"),
    region("US", "OK", "Oklahoma"),
    region("US", "OR", "Oregon"),
    region("US", "PA", "Pennsylvania"),
    region("US", "RI", "Rhode Island"),
    region("US", "SC", "South Carolina"),
    region("US", "SD", "South Dakota"),
    region("US", "TN", "Tennessee"),
    region("US", "TX", "Texas"),
    region("US", "UT", "Utah"),
    region("US", "VT", "Vermont"),
    region("US", "VA", "Virginia"),
    region("US", "WA", "Washington"),
    region("US", "WV", "West Virginia"),
    region("US", "WI", "Wisconsin"),
    region("US", "WY", "Wyoming"),
    // India
    region("IN", "MH", "Maharashtra"),
    region("IN", "KA", "Karnataka"),
    region("IN", "TN", "Tamil Nadu"),
    region("IN", "GJ", "Gujarat"),
    region("IN", "WB", "West Bengal"),
    region("IN", "RJ", "Rajasthan"),
    region("IN", "UP", "Uttar Pradesh"),
    region("IN", "MP", "Madhya Pradesh"),
    region("IN", "BR", "Bihar"),
    region("IN", "OR", "Odisha"),
    // Canada
    region("CA", "ON", "Ontario"),
    region("CA", "QC", "Quebec"),
    region("CA", "BC", "British Columbia"),
    region("CA", "AB", "Alberta"),
    region("CA", "MB", "Manitoba"),
    region("CA", "SK", "Saskatchewan"),
    region("CA", "NS", "Nova Scotia"),
    region("CA", "NB", "New Brunswick"),
    region("CA", "NL", "Newfoundland and Labrador"),
    region("CA", "PE", "Prince Edward Island"),
];
