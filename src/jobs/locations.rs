// src/jobs/locations.rs
//! Countries and cities offered by the search form

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Country {
    pub code: &'static str,
    pub name: &'static str,
    #[serde(skip)]
    pub aliases: &'static [&'static str],
    #[serde(skip)]
    pub cities: &'static [&'static str],
}

/// Job boards the Morocco search mode is restricted to
pub const MOROCCO_JOB_BOARDS: &[&str] = &[
    "anapec",
    "dreamjob",
    "emploi.ma",
    "marocannonces",
    "rekrute",
];

pub const COUNTRIES: &[Country] = &[
    Country {
        code: "AT",
        name: "Austria",
        aliases: &["österreich", "osterreich"],
        cities: &["Vienna", "Graz", "Linz", "Salzburg", "Innsbruck"],
    },
    Country {
        code: "BE",
        name: "Belgium",
        aliases: &["belgique", "belgië"],
        cities: &["Brussels", "Antwerp", "Ghent", "Liège"],
    },
    Country {
        code: "CH",
        name: "Switzerland",
        aliases: &["schweiz", "suisse"],
        cities: &["Zurich", "Geneva", "Basel", "Bern", "Lausanne"],
    },
    Country {
        code: "DE",
        name: "Germany",
        aliases: &["deutschland", "allemagne"],
        cities: &[
            "Berlin",
            "Hamburg",
            "Munich",
            "Cologne",
            "Frankfurt",
            "Stuttgart",
            "Düsseldorf",
            "Leipzig",
            "Dresden",
            "Nuremberg",
        ],
    },
    Country {
        code: "ES",
        name: "Spain",
        aliases: &["españa", "espana", "espagne"],
        cities: &["Madrid", "Barcelona", "Valencia", "Seville", "Málaga"],
    },
    Country {
        code: "FR",
        name: "France",
        aliases: &["frankreich"],
        cities: &["Paris", "Lyon", "Marseille", "Toulouse", "Lille", "Bordeaux", "Nantes"],
    },
    Country {
        code: "GB",
        name: "United Kingdom",
        aliases: &["uk", "great britain", "england"],
        cities: &["London", "Manchester", "Birmingham", "Edinburgh", "Bristol"],
    },
    Country {
        code: "MA",
        name: "Morocco",
        aliases: &["maroc", "marokko"],
        cities: &[
            "Casablanca",
            "Rabat",
            "Marrakech",
            "Tangier",
            "Fes",
            "Agadir",
            "Kenitra",
        ],
    },
    Country {
        code: "NL",
        name: "Netherlands",
        aliases: &["nederland", "holland", "pays-bas"],
        cities: &["Amsterdam", "Rotterdam", "Utrecht", "The Hague", "Eindhoven"],
    },
    Country {
        code: "US",
        name: "United States",
        aliases: &["usa", "united states of america", "america"],
        cities: &["New York", "San Francisco", "Seattle", "Austin", "Boston", "Chicago"],
    },
];

/// Resolve an ISO code, English name or alias, case-insensitively
pub fn resolve_country(input: &str) -> Option<&'static Country> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    COUNTRIES.iter().find(|c| {
        c.code.eq_ignore_ascii_case(&needle)
            || c.name.to_lowercase() == needle
            || c.aliases.iter().any(|a| *a == needle)
    })
}

pub fn cities(country: &str) -> Option<&'static [&'static str]> {
    resolve_country(country).map(|c| c.cities)
}

pub fn country_for_city(city: &str) -> Option<&'static Country> {
    let needle = city.trim().to_lowercase();
    COUNTRIES
        .iter()
        .find(|c| c.cities.iter().any(|known| known.to_lowercase() == needle))
}
