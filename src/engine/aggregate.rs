//! Bottom-up aggregation of the budget tree
//!
//! Lines are read-only inputs. A subcategory with lines takes their sum, a
//! category with subcategories takes the sum of their *current* amounts, and
//! the project aggregate is the sum of category amounts. Nodes without
//! children keep whatever was last entered for them.

use tracing::debug;

use crate::models::{Category, Money, Project, Subcategory};

/// Recompute a subcategory from its lines
///
/// With no lines the manually entered amount is returned unchanged.
pub fn recompute_subcategory_total(subcategory: &mut Subcategory) -> Money {
    if !subcategory.lines.is_empty() {
        subcategory.amount = subcategory.lines.iter().map(|line| line.amount).sum();
    }
    subcategory.amount
}

/// Recompute a category from the amounts its subcategories currently hold
///
/// Subcategories are not recomputed here: run [`recompute_subcategory_total`]
/// on each of them first, or use [`recompute_category_tree`].
pub fn recompute_category_total(category: &mut Category) -> Money {
    if !category.subcategories.is_empty() {
        category.amount = category.subcategories.iter().map(|s| s.amount).sum();
    }
    category.amount
}

/// Recompute one category and its subcategories, children first
pub fn recompute_category_tree(category: &mut Category) -> Money {
    for subcategory in &mut category.subcategories {
        recompute_subcategory_total(subcategory);
    }
    recompute_category_total(category)
}

/// Sum of the category amounts
///
/// Feeds the reconciliation policy; it is never written to the total budget
/// directly.
pub fn recompute_project_total(categories: &[Category]) -> Money {
    categories.iter().map(|c| c.amount).sum()
}

/// Run a full pass over the project tree and return the computed aggregate
pub fn recompute_tree(project: &mut Project) -> Money {
    for category in &mut project.categories {
        recompute_category_tree(category);
    }
    let total = recompute_project_total(&project.categories);

    debug!(
        project = %project.id,
        categories = project.categories.len(),
        computed = %total,
        "recomputed budget tree"
    );

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExpenseLine;
    use chrono::NaiveDate;

    fn euros(text: &str) -> Money {
        Money::parse_lenient(text)
    }

    fn sub_with_lines(name: &str, amounts: &[&str]) -> Subcategory {
        let mut sub = Subcategory::new(name);
        sub.lines = amounts
            .iter()
            .enumerate()
            .map(|(i, a)| ExpenseLine::new(format!("line {}", i + 1), euros(a)))
            .collect();
        sub
    }

    #[test]
    fn test_subcategory_sums_lines() {
        let mut sub = sub_with_lines("S1", &["€ 10,00", "€ 5,25", "€ 0,75"]);
        assert_eq!(recompute_subcategory_total(&mut sub), euros("€ 16,00"));
        assert_eq!(sub.amount, euros("€ 16,00"));
    }

    #[test]
    fn test_subcategory_without_lines_keeps_manual_amount() {
        let mut sub = Subcategory::with_amount("Manual", euros("€ 120,00"));
        assert_eq!(recompute_subcategory_total(&mut sub), euros("€ 120,00"));
        assert_eq!(sub.amount, euros("€ 120,00"));
    }

    #[test]
    fn test_category_sums_current_subcategory_amounts() {
        let mut category = Category::new("A");
        category.subcategories = vec![
            Subcategory::with_amount("x", euros("€ 100,00")),
            Subcategory::with_amount("y", euros("€ 50,50")),
        ];
        assert_eq!(recompute_category_total(&mut category), euros("€ 150,50"));

        category.subcategories.reverse();
        assert_eq!(recompute_category_total(&mut category), euros("€ 150,50"));
    }

    #[test]
    fn test_empty_category_keeps_manual_amount() {
        let mut category = Category::with_amount("Lump sum", euros("€ 900,00"));
        assert_eq!(recompute_category_tree(&mut category), euros("€ 900,00"));
    }

    #[test]
    fn test_category_before_subcategories_is_stale() {
        let mut category = Category::new("A");
        let mut sub = sub_with_lines("S1", &["€ 10,00", "€ 5,00"]);
        sub.amount = euros("€ 1,00");
        category.subcategories.push(sub);

        // Wrong order: the category only sees the stale subcategory amount
        assert_eq!(recompute_category_total(&mut category), euros("€ 1,00"));

        // Children first gives the real total
        assert_eq!(recompute_category_tree(&mut category), euros("€ 15,00"));
        assert_eq!(category.subcategories[0].amount, euros("€ 15,00"));
    }

    #[test]
    fn test_negative_lines() {
        let mut sub = sub_with_lines("Refunds", &["€ 40,00", "-€ 15,00"]);
        assert_eq!(recompute_subcategory_total(&mut sub), euros("€ 25,00"));
    }

    #[test]
    fn test_full_pass_is_idempotent() {
        let mut project = Project::new("P", NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        let mut a = Category::new("A");
        a.subcategories.push(sub_with_lines("S1", &["€ 10,00", "€ 5,00"]));
        a.subcategories
            .push(Subcategory::with_amount("S2", euros("€ 7,00")));
        project.categories.push(a);
        project
            .categories
            .push(Category::with_amount("B", euros("€ 3,00")));

        let first = recompute_tree(&mut project);
        let snapshot = project.clone();
        let second = recompute_tree(&mut project);

        assert_eq!(first, euros("€ 25,00"));
        assert_eq!(first, second);
        assert_eq!(project, snapshot);
    }

    #[test]
    fn test_project_total_of_no_categories_is_zero() {
        assert!(recompute_project_total(&[]).is_zero());
    }
}
