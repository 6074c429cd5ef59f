//! Client-side search, filter and sort over a fetched listing array.
//!
//! [`transform`] is pure: it clones the matching listings into a new vector
//! and never touches the input. Steps run in a fixed order (text search, type
//! filter, stable sort), so identical input and query always give identical
//! output, and running the result through the same query again is a no-op.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::types::{CropType, Interest, Listing};

/// Type facet of the query. `All` passes everything through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Only(CropType),
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(TypeFilter::All);
        }
        s.parse().map(TypeFilter::Only)
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeFilter::All => f.write_str("all"),
            TypeFilter::Only(t) => f.write_str(t.as_str()),
        }
    }
}

/// Sort order of the query.
///
/// Keys arrive as strings from a select box; anything unrecognised is kept
/// as `Unknown` and leaves the filtered order untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    PriceLow,
    PriceHigh,
    QuantityLow,
    QuantityHigh,
    NameAsc,
    NameDesc,
    Unknown(String),
}

impl SortKey {
    pub fn parse(key: &str) -> Self {
        match key {
            "newest" => SortKey::Newest,
            "oldest" => SortKey::Oldest,
            "price-low" => SortKey::PriceLow,
            "price-high" => SortKey::PriceHigh,
            "quantity-low" => SortKey::QuantityLow,
            "quantity-high" => SortKey::QuantityHigh,
            "name-asc" => SortKey::NameAsc,
            "name-desc" => SortKey::NameDesc,
            other => SortKey::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SortKey::Newest => "newest",
            SortKey::Oldest => "oldest",
            SortKey::PriceLow => "price-low",
            SortKey::PriceHigh => "price-high",
            SortKey::QuantityLow => "quantity-low",
            SortKey::QuantityHigh => "quantity-high",
            SortKey::NameAsc => "name-asc",
            SortKey::NameDesc => "name-desc",
            SortKey::Unknown(key) => key,
        }
    }

    fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        match self {
            SortKey::Newest => b.created_at.cmp(&a.created_at),
            SortKey::Oldest => a.created_at.cmp(&b.created_at),
            SortKey::PriceLow => a.price_per_unit.total_cmp(&b.price_per_unit),
            SortKey::PriceHigh => b.price_per_unit.total_cmp(&a.price_per_unit),
            SortKey::QuantityLow => a.quantity.total_cmp(&b.quantity),
            SortKey::QuantityHigh => b.quantity.total_cmp(&a.quantity),
            SortKey::NameAsc => locale_cmp(&a.name, &b.name),
            SortKey::NameDesc => locale_cmp(&b.name, &a.name),
            SortKey::Unknown(_) => Ordering::Equal,
        }
    }
}

/// Search, filter and sort parameters. `Query::default()` is the cleared
/// state: no search text, all types, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    pub search_text: String,
    pub type_filter: TypeFilter,
    pub sort: SortKey,
}

impl Query {
    pub fn is_default(&self) -> bool {
        *self == Query::default()
    }

    /// True when the result may be a strict subset of the input.
    pub fn is_filtering(&self) -> bool {
        !self.search_text.trim().is_empty() || self.type_filter != TypeFilter::All
    }

    pub fn clear(&mut self) {
        *self = Query::default();
    }
}

/// Produces the derived, ordered view of `listings` for `query`.
pub fn transform(listings: &[Listing], query: &Query) -> Vec<Listing> {
    let needle = query.search_text.to_lowercase();
    let search = !query.search_text.trim().is_empty();

    let mut result: Vec<Listing> = listings
        .iter()
        .filter(|l| !search || matches_text(l, &needle))
        .filter(|l| match query.type_filter {
            TypeFilter::All => true,
            TypeFilter::Only(t) => l.crop_type == t,
        })
        .cloned()
        .collect();

    if !matches!(query.sort, SortKey::Unknown(_)) {
        result.sort_by(|a, b| query.sort.compare(a, b));
    }
    result
}

fn matches_text(listing: &Listing, needle: &str) -> bool {
    [
        listing.name.as_str(),
        listing.crop_type.as_str(),
        listing.location.as_str(),
        listing.description.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Collation in three passes, the way browsers order Latin names: base
/// letters with accents and case folded, then accents (plain before
/// accented), then case (lowercase first).
fn locale_cmp(a: &str, b: &str) -> Ordering {
    let base = |s: &str| -> Vec<char> {
        s.nfd()
            .filter(|c| !is_combining_mark(*c))
            .flat_map(char::to_lowercase)
            .collect()
    };
    let accented = |s: &str| -> Vec<char> { s.nfd().flat_map(char::to_lowercase).collect() };
    base(a)
        .cmp(&base(b))
        .then_with(|| accented(a).cmp(&accented(b)))
        .then_with(|| b.nfd().cmp(a.nfd()))
}

/// Listings owned by `email`, input order preserved.
pub fn owned_by<'a>(listings: &'a [Listing], email: &str) -> Vec<&'a Listing> {
    listings.iter().filter(|l| l.is_owned_by(email)).collect()
}

/// Interests keyed by the listing they target. Order within each group
/// follows the input.
pub fn group_by_listing(interests: &[Interest]) -> HashMap<String, Vec<Interest>> {
    let mut grouped: HashMap<String, Vec<Interest>> = HashMap::new();
    for interest in interests {
        grouped
            .entry(interest.crop_id.clone())
            .or_default()
            .push(interest.clone());
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InterestStatus, Owner, Unit};
    use chrono::{TimeZone, Utc};

    fn listing(id: &str, name: &str, crop_type: CropType, price: f64, qty: f64, day: u32) -> Listing {
        Listing {
            id: id.to_string(),
            name: name.to_string(),
            crop_type,
            price_per_unit: price,
            unit: Unit::Kg,
            quantity: qty,
            description: format!("Fresh {name}"),
            location: "Dhaka".to_string(),
            image: None,
            owner: Owner {
                owner_email: format!("{id}@example.com"),
                owner_name: id.to_string(),
            },
            created_at: Utc.with_ymd_and_hms(2025, 3, day, 8, 0, 0).unwrap(),
        }
    }

    fn sample() -> Vec<Listing> {
        vec![
            listing("a", "Rice", CropType::Grain, 10.0, 300.0, 1),
            listing("b", "Wheat", CropType::Grain, 30.0, 100.0, 3),
            listing("c", "Corn", CropType::Grain, 20.0, 200.0, 2),
        ]
    }

    fn names(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.name.as_str()).collect()
    }

    fn query(search: &str, filter: TypeFilter, sort: &str) -> Query {
        Query {
            search_text: search.to_string(),
            type_filter: filter,
            sort: SortKey::parse(sort),
        }
    }

    #[test]
    fn price_low_orders_ascending() {
        let out = transform(&sample(), &query("", TypeFilter::All, "price-low"));
        assert_eq!(names(&out), ["Rice", "Corn", "Wheat"]);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let out = transform(&sample(), &query("ric", TypeFilter::All, "newest"));
        assert_eq!(names(&out), ["Rice"]);
        let out = transform(&sample(), &query("RIC", TypeFilter::All, "newest"));
        assert_eq!(names(&out), ["Rice"]);
    }

    #[test]
    fn search_covers_type_location_and_description() {
        let mut input = sample();
        input.push(listing("d", "Mango", CropType::Fruit, 80.0, 50.0, 4));
        input[3].location = "Rajshahi".to_string();

        assert_eq!(names(&transform(&input, &query("fruit", TypeFilter::All, "newest"))), ["Mango"]);
        assert_eq!(names(&transform(&input, &query("rajsh", TypeFilter::All, "newest"))), ["Mango"]);
        assert_eq!(names(&transform(&input, &query("fresh wheat", TypeFilter::All, "newest"))), ["Wheat"]);
    }

    #[test]
    fn whitespace_search_passes_everything() {
        let out = transform(&sample(), &query("   ", TypeFilter::All, "oldest"));
        assert_eq!(names(&out), ["Rice", "Corn", "Wheat"]);
    }

    #[test]
    fn type_filter_is_exact() {
        let mut input = sample();
        input.push(listing("d", "Mango", CropType::Fruit, 80.0, 50.0, 4));
        let out = transform(&input, &query("", TypeFilter::Only(CropType::Fruit), "newest"));
        assert_eq!(names(&out), ["Mango"]);
        let out = transform(&input, &query("", TypeFilter::Only(CropType::Spice), "newest"));
        assert!(out.is_empty());
    }

    #[test]
    fn default_query_is_newest_first() {
        let out = transform(&sample(), &Query::default());
        assert_eq!(names(&out), ["Wheat", "Corn", "Rice"]);

        let mut q = query("corn", TypeFilter::Only(CropType::Grain), "price-high");
        assert!(!q.is_default());
        q.clear();
        assert!(q.is_default());
        assert!(!q.is_filtering());
    }

    #[test]
    fn unknown_sort_key_is_identity() {
        let out = transform(&sample(), &query("", TypeFilter::All, "popularity"));
        assert_eq!(names(&out), ["Rice", "Wheat", "Corn"]);
        assert_eq!(SortKey::parse("popularity").as_str(), "popularity");
    }

    #[test]
    fn price_directions_are_exact_reverses() {
        let low = transform(&sample(), &query("", TypeFilter::All, "price-low"));
        let mut high = transform(&sample(), &query("", TypeFilter::All, "price-high"));
        high.reverse();
        assert_eq!(low, high);
    }

    #[test]
    fn quantity_sorts() {
        let out = transform(&sample(), &query("", TypeFilter::All, "quantity-low"));
        assert_eq!(names(&out), ["Wheat", "Corn", "Rice"]);
        let out = transform(&sample(), &query("", TypeFilter::All, "quantity-high"));
        assert_eq!(names(&out), ["Rice", "Corn", "Wheat"]);
    }

    #[test]
    fn name_sort_ignores_case() {
        let mut input = sample();
        input.push(listing("d", "barley", CropType::Grain, 15.0, 10.0, 5));
        let out = transform(&input, &query("", TypeFilter::All, "name-asc"));
        assert_eq!(names(&out), ["barley", "Corn", "Rice", "Wheat"]);
        let out = transform(&input, &query("", TypeFilter::All, "name-desc"));
        assert_eq!(names(&out), ["Wheat", "Rice", "Corn", "barley"]);
    }

    #[test]
    fn name_sort_folds_accents() {
        let input = vec![
            listing("a", "Okra", CropType::Vegetable, 40.0, 1.0, 1),
            listing("b", "Ñame", CropType::Vegetable, 40.0, 1.0, 2),
            listing("c", "Fig", CropType::Fruit, 40.0, 1.0, 3),
            listing("d", "Éclair bean", CropType::Pulse, 40.0, 1.0, 4),
            listing("e", "Zucchini", CropType::Vegetable, 40.0, 1.0, 5),
        ];
        let out = transform(&input, &query("", TypeFilter::All, "name-asc"));
        assert_eq!(names(&out), ["Éclair bean", "Fig", "Ñame", "Okra", "Zucchini"]);
    }

    #[test]
    fn locale_cmp_orders_plain_before_accented_before_case() {
        assert_eq!(locale_cmp("Ñame", "Okra"), Ordering::Less);
        assert_eq!(locale_cmp("Éclair", "Fig"), Ordering::Less);
        assert_eq!(locale_cmp("cafe", "café"), Ordering::Less);
        assert_eq!(locale_cmp("café", "cafe"), Ordering::Greater);
        assert_eq!(locale_cmp("rice", "Rice"), Ordering::Less);
        assert_eq!(locale_cmp("Rice", "Rice"), Ordering::Equal);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let input = vec![
            listing("a", "Okra", CropType::Vegetable, 40.0, 1.0, 1),
            listing("b", "Bean", CropType::Vegetable, 40.0, 1.0, 1),
            listing("c", "Leek", CropType::Vegetable, 40.0, 1.0, 1),
        ];
        for key in ["price-low", "price-high", "newest", "quantity-high"] {
            let out = transform(&input, &query("", TypeFilter::All, key));
            assert_eq!(names(&out), ["Okra", "Bean", "Leek"], "{key}");
        }
    }

    #[test]
    fn transform_is_idempotent_and_never_invents() {
        let input = sample();
        let q = query("r", TypeFilter::Only(CropType::Grain), "name-desc");
        let once = transform(&input, &q);
        let twice = transform(&once, &q);
        assert_eq!(once, twice);
        assert!(once.iter().all(|l| input.contains(l)));
        assert_eq!(names(&input), ["Rice", "Wheat", "Corn"], "input untouched");
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(transform(&[], &query("rice", TypeFilter::All, "price-low")).is_empty());
    }

    #[test]
    fn type_filter_parses_select_values() {
        assert_eq!("all".parse::<TypeFilter>().unwrap(), TypeFilter::All);
        assert_eq!(
            "Pulse".parse::<TypeFilter>().unwrap(),
            TypeFilter::Only(CropType::Pulse)
        );
        assert!("Nuts".parse::<TypeFilter>().is_err());
        assert_eq!(TypeFilter::Only(CropType::Oilseed).to_string(), "Oilseed");
    }

    #[test]
    fn owned_by_keeps_input_order() {
        let mut input = sample();
        input[2].owner.owner_email = "a@example.com".to_string();
        let mine = owned_by(&input, "a@example.com");
        let ids: Vec<&str> = mine.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn groups_interests_by_listing() {
        let interest = |id: &str, crop: &str| Interest {
            id: id.to_string(),
            crop_id: crop.to_string(),
            user_email: "buyer@example.com".to_string(),
            user_name: "buyer".to_string(),
            quantity: 5,
            message: String::new(),
            status: InterestStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            crop_details: None,
        };
        let grouped = group_by_listing(&[
            interest("1", "x"),
            interest("2", "y"),
            interest("3", "x"),
        ]);
        let x: Vec<&str> = grouped["x"].iter().map(|i| i.id.as_str()).collect();
        assert_eq!(x, ["1", "3"]);
        assert_eq!(grouped["y"].len(), 1);
    }
}
