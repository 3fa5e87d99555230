//! Conservation Category and Taxonomic Order Label Maps
//!
//! Static lookups from short codes to human-readable names:
//! - IUCN Red List category codes (CR, EN, ...) → full status names
//! - Mammal taxonomic order codes (CARNIVORA, ...) → common names
//!
//! Unmapped codes resolve to `None`; no lookup in this module can fail.

use serde::Serialize;

// ============================================================================
// Red List Categories
// ============================================================================

/// IUCN Red List conservation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    CriticallyEndangered,
    Endangered,
    Extinct,
    LeastConcern,
    Vulnerable,
    NearThreatened,
    DataDeficient,
    ExtinctInTheWild,
}

/// All categories, in legend order.
pub const ALL_CATEGORIES: [Category; 8] = [
    Category::CriticallyEndangered,
    Category::Endangered,
    Category::Extinct,
    Category::LeastConcern,
    Category::Vulnerable,
    Category::NearThreatened,
    Category::DataDeficient,
    Category::ExtinctInTheWild,
];

/// Fallback map colour for unknown or uncoloured categories
pub const DEFAULT_CATEGORY_COLOR: &str = "gray";

impl Category {
    /// Parse a short status code ("CR", "EN", ...). Surrounding whitespace is ignored.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "CR" => Some(Category::CriticallyEndangered),
            "EN" => Some(Category::Endangered),
            "EX" => Some(Category::Extinct),
            "LC" => Some(Category::LeastConcern),
            "VU" => Some(Category::Vulnerable),
            "NT" => Some(Category::NearThreatened),
            "DD" => Some(Category::DataDeficient),
            "EW" => Some(Category::ExtinctInTheWild),
            _ => None,
        }
    }

    /// Parse a full status name ("Least Concern", ...).
    pub fn from_full_name(name: &str) -> Option<Self> {
        let name = name.trim();
        ALL_CATEGORIES.into_iter().find(|c| c.full_name() == name)
    }

    pub fn code(self) -> &'static str {
        match self {
            Category::CriticallyEndangered => "CR",
            Category::Endangered => "EN",
            Category::Extinct => "EX",
            Category::LeastConcern => "LC",
            Category::Vulnerable => "VU",
            Category::NearThreatened => "NT",
            Category::DataDeficient => "DD",
            Category::ExtinctInTheWild => "EW",
        }
    }

    pub fn full_name(self) -> &'static str {
        match self {
            Category::CriticallyEndangered => "Critically Endangered",
            Category::Endangered => "Endangered",
            Category::Extinct => "Extinct",
            Category::LeastConcern => "Least Concern",
            Category::Vulnerable => "Vulnerable",
            Category::NearThreatened => "Near Threatened",
            Category::DataDeficient => "Data Deficient",
            Category::ExtinctInTheWild => "Extinct in the Wild",
        }
    }

    /// CR, EN and VU count towards the threat ratio.
    pub fn is_threatened(self) -> bool {
        matches!(
            self,
            Category::CriticallyEndangered | Category::Endangered | Category::Vulnerable
        )
    }

    /// Fill/stroke colour of range polygons on the map
    pub fn map_color(self) -> &'static str {
        match self {
            Category::LeastConcern => "green",
            Category::NearThreatened => "#FFFF00",
            Category::Vulnerable => "#FFA500",
            Category::Endangered => "#FF0000D8",
            Category::CriticallyEndangered => "#FF0000",
            Category::DataDeficient => "gray",
            Category::Extinct => "black",
            Category::ExtinctInTheWild => DEFAULT_CATEGORY_COLOR,
        }
    }
}

/// Full status name for a short code, `None` when the code is unmapped.
pub fn category_full_name(code: &str) -> Option<&'static str> {
    Category::from_code(code).map(Category::full_name)
}

/// True when the code is one of CR, EN, VU.
pub fn is_threatened_code(code: &str) -> bool {
    Category::from_code(code).is_some_and(Category::is_threatened)
}

/// Map colour for a geometry row's category.
///
/// Range rows carry either the short code or the full name; both resolve.
pub fn category_color(category: &str) -> &'static str {
    Category::from_code(category)
        .or_else(|| Category::from_full_name(category))
        .map(Category::map_color)
        .unwrap_or(DEFAULT_CATEGORY_COLOR)
}

// ============================================================================
// Taxonomic Orders
// ============================================================================

static ORDER_NAMES: &[(&str, &str)] = &[
    ("SIRENIA", "Sea Cows and Manatees"),
    ("PROBOSCIDEA", "Elephants"),
    ("PHOLIDOTA", "Pangolins"),
    ("PERISSODACTYLA", "Odd-toed Ungulates (e.g., Horses)"),
    ("PRIMATES", "Primates (Monkeys and Apes)"),
    ("MONOTREMATA", "Egg-laying Mammals (Platypus, Echidna)"),
    ("PAUCITUBERCULATA", "Shrew Opossums"),
    ("PERAMELEMORPHIA", "Bandicoots"),
    ("ARTIODACTYLA", "Even-toed Ungulates (Deer, Cattle)"),
    ("DIPROTODONTIA", "Kangaroos and Possums"),
    ("AFROSORICIDA", "Tenrecs and Golden Moles"),
    ("CARNIVORA", "Carnivores (Cats, Dogs, Bears)"),
    ("LAGOMORPHA", "Rabbits and Hares"),
    ("PILOSA", "Sloths and Anteaters"),
    ("CHIROPTERA", "Bats"),
    ("EULIPOTYPHLA", "Shrews, Moles, Hedgehogs"),
    ("DASYUROMORPHIA", "Australian Carnivores (Tasmanian Devil)"),
    ("RODENTIA", "Rodents (Mice, Rats, Squirrels)"),
    ("MACROSCELIDEA", "Elephant Shrews"),
    ("CINGULATA", "Armadillos"),
    ("SCANDENTIA", "Tree Shrews"),
    ("DIDELPHIMORPHIA", "Opossums"),
    ("HYRACOIDEA", "Hyraxes"),
    ("DERMOPTERA", "Colugos"),
    ("NOTORYCTEMORPHIA", "Marsupial Moles"),
    ("MICROBIOTHERIA", "Monito del Monte"),
    ("TUBULIDENTATA", "Aardvarks"),
];

/// Common name of a taxonomic order.
///
/// Codes are matched after trimming and upper-casing, so "Carnivora",
/// " carnivora" and "CARNIVORA" all resolve.
pub fn order_common_name(code: &str) -> Option<&'static str> {
    let key = code.trim().to_uppercase();
    ORDER_NAMES
        .iter()
        .find(|(order, _)| *order == key)
        .map(|(_, name)| *name)
}
