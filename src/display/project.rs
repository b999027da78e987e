//! Project display formatting
//!
//! Formats projects for terminal output: the list view, the details view
//! and the budget tree. All amounts go through the resolved currency symbol.

use crate::audit::AuditEntry;
use crate::config::settings::Settings;
use crate::engine::Reconciliation;
use crate::models::{resolve_currency_symbol, Money, NodePath, Project};
use crate::services::ProjectListing;

fn symbol<'a>(project: &'a Project, settings: &'a Settings) -> &'a str {
    resolve_currency_symbol(None, project.currency.as_deref(), Some(settings))
}

/// Format a table of projects
pub fn format_project_list(listings: &[ProjectListing], settings: &Settings) -> String {
    if listings.is_empty() {
        return "No projects found.\n\nRun 'budgetplan project create <name>' to start one."
            .to_string();
    }

    let name_width = listings
        .iter()
        .map(|l| l.project.name.chars().count())
        .max()
        .unwrap_or(7)
        .max(7);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<width$}  {:>14}  {:<11}  {:<10}  {}\n",
        "Project",
        "Total",
        "Status",
        "Start",
        "ID",
        width = name_width
    ));
    output.push_str(&format!(
        "{:-<width$}  {:->14}  {:-<11}  {:-<10}  {:-<8}\n",
        "",
        "",
        "",
        "",
        "",
        width = name_width
    ));

    for listing in listings {
        let project = &listing.project;
        let legacy = if listing.location.is_primary() {
            ""
        } else {
            " (legacy)"
        };

        output.push_str(&format!(
            "{:<width$}  {:>14}  {:<11}  {:<10}  {}{}\n",
            project.name,
            project
                .total_budget
                .format_with_symbol(symbol(project, settings)),
            project.status.to_string(),
            project.start_date.format("%Y-%m-%d").to_string(),
            project.id.short(),
            legacy,
            width = name_width
        ));
    }

    output
}

/// Format the budget tree with one-based node paths
pub fn format_project_tree(project: &Project, settings: &Settings) -> String {
    let sym = symbol(project, settings);
    let fmt = |m: Money| m.format_with_symbol(sym);

    let mut output = format!("{}  [{}]\n", project.name, fmt(project.total_budget));

    if project.categories.is_empty() {
        output.push_str("  (no categories)\n");
        return output;
    }

    for (c, category) in project.categories.iter().enumerate() {
        let last_cat = c == project.categories.len() - 1;
        let (branch, indent) = if last_cat {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };

        output.push_str(&format!(
            "{}{} {}  {}\n",
            branch,
            NodePath::Category(c),
            category.name,
            fmt(category.amount)
        ));

        for (s, sub) in category.subcategories.iter().enumerate() {
            let last_sub = s == category.subcategories.len() - 1;
            let (sub_branch, sub_indent) = if last_sub {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };

            output.push_str(&format!(
                "{}{}{} {}  {}\n",
                indent,
                sub_branch,
                NodePath::Subcategory(c, s),
                sub.name,
                fmt(sub.amount)
            ));

            for (l, line) in sub.lines.iter().enumerate() {
                let line_branch = if l == sub.lines.len() - 1 {
                    "└── "
                } else {
                    "├── "
                };
                output.push_str(&format!(
                    "{}{}{}{} {}  {}\n",
                    indent,
                    sub_indent,
                    line_branch,
                    NodePath::Line(c, s, l),
                    line.name,
                    fmt(line.amount)
                ));
            }
        }
    }

    output
}

/// Format project details
pub fn format_project_details(project: &Project, settings: &Settings) -> String {
    let sym = symbol(project, settings);
    let mut output = String::new();

    output.push_str(&format!("Project: {}\n", project.name));
    output.push_str(&format!("  ID:           {}\n", project.id));
    output.push_str(&format!("  Status:       {}\n", project.status));
    output.push_str(&format!(
        "  Start:        {}\n",
        project.start_date.format("%Y-%m-%d")
    ));
    if let Some(end) = project.end_date {
        output.push_str(&format!("  End:          {}\n", end.format("%Y-%m-%d")));
    }
    if let Some(template) = &project.template {
        output.push_str(&format!("  Template:     {}\n", template));
    }
    output.push_str(&format!(
        "  Total budget: {}\n",
        project.total_budget.format_with_symbol(sym)
    ));
    output.push_str(&format!("  Categories:   {}\n", project.categories.len()));
    output.push_str(&format!("  Lines:        {}\n", project.line_count()));

    output.push('\n');
    output.push_str(&format_project_tree(project, settings));

    output.push('\n');
    output.push_str(&format!(
        "  Created:  {}\n",
        project.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    output.push_str(&format!(
        "  Modified: {}\n",
        project.updated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    output
}

/// One-line summary of a recomputation pass
pub fn format_reconciliation(
    project: &Project,
    outcome: &Reconciliation,
    settings: &Settings,
) -> String {
    format!(
        "Total budget: {} ({})",
        outcome.total.format_with_symbol(symbol(project, settings)),
        outcome.source
    )
}

/// Format audit entries, oldest first
pub fn format_history(entries: &[AuditEntry]) -> String {
    if entries.is_empty() {
        return "No history recorded.".to_string();
    }

    entries
        .iter()
        .map(AuditEntry::format_human_readable)
        .collect::<Vec<_>>()
        .join("\n")
}
