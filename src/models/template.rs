//! Starter category sets for new projects

use std::fmt;
use std::str::FromStr;

use super::project::{Category, Subcategory};
use crate::error::BudgetError;

/// Built-in project templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectTemplate {
    Empty,
    PersonalBudget,
    Wedding,
    Travel,
    Renovation,
    Event,
}

type Outline = &'static [(&'static str, &'static [&'static str])];

impl ProjectTemplate {
    /// Get all templates in display order
    pub fn all() -> &'static [Self] {
        &[
            Self::Empty,
            Self::PersonalBudget,
            Self::Wedding,
            Self::Travel,
            Self::Renovation,
            Self::Event,
        ]
    }

    /// Identifier stored in the project record
    pub fn id(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::PersonalBudget => "personal-budget",
            Self::Wedding => "wedding",
            Self::Travel => "travel",
            Self::Renovation => "renovation",
            Self::Event => "event",
        }
    }

    fn outline(&self) -> Outline {
        match self {
            Self::Empty => &[],
            Self::PersonalBudget => &[
                ("Housing", &["Rent", "Utilities", "Insurance"]),
                ("Daily life", &["Groceries", "Transport", "Health"]),
                ("Leisure", &["Dining out", "Outings", "Subscriptions"]),
                ("Savings", &["Emergency fund", "Projects"]),
            ],
            Self::Wedding => &[
                ("Ceremony", &["Venue", "Officiant", "Decoration"]),
                ("Reception", &["Catering", "Drinks", "Music"]),
                ("Attire", &["Dress", "Suit", "Accessories"]),
                ("Guests", &["Invitations", "Gifts", "Accommodation"]),
            ],
            Self::Travel => &[
                ("Transport", &["Flights", "Local transport", "Car rental"]),
                ("Accommodation", &["Hotels"]),
                ("On site", &["Meals", "Activities", "Souvenirs"]),
            ],
            Self::Renovation => &[
                ("Materials", &["Flooring", "Paint", "Fixtures"]),
                ("Labour", &["Contractors", "Electrician", "Plumber"]),
                ("Permits", &["Fees"]),
            ],
            Self::Event => &[
                ("Venue", &["Rental", "Equipment"]),
                ("Food", &["Catering", "Drinks"]),
                ("Communication", &["Printing", "Advertising"]),
            ],
        }
    }

    /// Build the initial category tree; every amount starts at zero
    pub fn categories(&self) -> Vec<Category> {
        self.outline()
            .iter()
            .map(|(name, subs)| {
                let mut category = Category::new(*name);
                category.subcategories = subs.iter().map(|s| Subcategory::new(*s)).collect();
                category
            })
            .collect()
    }
}

impl fmt::Display for ProjectTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProjectTemplate {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|t| t.id() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = Self::all().iter().map(|t| t.id()).collect();
                BudgetError::Validation(format!(
                    "Unknown template '{}' (available: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}
