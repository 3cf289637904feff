//! Output formatting for coverage reports

use eyre::Result;
use guardrail_api::{
    ApiCoverageStatus, ApiDiagnostic, ApiReport, ApiRoot, ApiRuleCoverage, ApiSpecStatus,
    ApiSummary,
};
use owo_colors::OwoColorize;

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            "markdown" | "md" => Some(Self::Markdown),
            _ => None,
        }
    }
}

/// Render a report in the specified format.
///
/// With `per_root`, text and markdown output get one section per root in
/// addition to the combined view. JSON always carries both.
pub fn render_report(report: &ApiReport, format: OutputFormat, per_root: bool) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report, per_root)),
        OutputFormat::Json => render_json(report),
        OutputFormat::Markdown => Ok(render_markdown(report, per_root)),
    }
}

fn coverage_label(status: ApiCoverageStatus) -> &'static str {
    match status {
        ApiCoverageStatus::Covered => "covered",
        ApiCoverageStatus::Partial => "partial",
        ApiCoverageStatus::NotCovered => "not covered",
        ApiCoverageStatus::NotApplicable => "not applicable",
    }
}

fn spec_label(status: ApiSpecStatus) -> &'static str {
    match status {
        ApiSpecStatus::Done => "done",
        ApiSpecStatus::Todo => "todo",
        ApiSpecStatus::Partial => "partial",
        ApiSpecStatus::NotApplicable => "n/a",
    }
}

fn colored_percent(percent: f64) -> String {
    let percent_str = format!("{:.1}%", percent);
    if percent >= 80.0 {
        percent_str.green().to_string()
    } else if percent >= 50.0 {
        percent_str.yellow().to_string()
    } else {
        percent_str.red().to_string()
    }
}

fn render_text(report: &ApiReport, per_root: bool) -> String {
    let mut output = String::new();

    output.push('\n');
    let scope = if report.roots.len() == 1 {
        report.roots[0].display_name.clone()
    } else {
        format!("{} roots", report.roots.len())
    };
    output.push_str(&format!(
        "{} Guardrail Coverage: {}\n",
        "##".bold(),
        scope.cyan().bold()
    ));
    if let Some(primary) = &report.primary_root {
        output.push_str(&format!("   rules shared from {}\n", primary.dimmed()));
    }
    output.push('\n');

    text_summary(&mut output, &report.flat.summary);
    output.push('\n');

    if !report.diagnostics.is_empty() {
        output.push_str(&format!(
            "{} Diagnostics ({}):\n",
            "!".yellow().bold(),
            report.diagnostics.len()
        ));
        for diagnostic in &report.diagnostics {
            text_diagnostic(&mut output, diagnostic);
        }
        output.push('\n');
    }

    for rule in &report.flat.rules {
        text_rule(&mut output, rule);
    }

    if per_root && report.roots.len() > 1 {
        for root in &report.roots {
            text_root(&mut output, root);
        }
    }

    output
}

fn text_summary(output: &mut String, summary: &ApiSummary) {
    output.push_str(&format!(
        "Coverage: {} ({}/{} applicable rules covered)\n",
        colored_percent(summary.coverage_percent),
        summary.covered,
        summary.covered + summary.partial + summary.not_covered
    ));
    output.push_str(&format!(
        "  {}\n",
        format!(
            "{} partial, {} not covered, {} not applicable, {} disabled",
            summary.partial, summary.not_covered, summary.not_applicable, summary.disabled
        )
        .dimmed()
    ));
}

fn text_diagnostic(output: &mut String, diagnostic: &ApiDiagnostic) {
    output.push_str(&format!("  {} {}\n", "-".yellow(), diagnostic.message));
}

fn text_rule(output: &mut String, coverage: &ApiRuleCoverage) {
    let rule = &coverage.rule;
    let title = format!("{}. {}", rule.id, rule.name);
    if !rule.enabled {
        output.push_str(&format!(
            "  {} {} {}\n",
            "·".dimmed(),
            title.dimmed(),
            "(disabled)".dimmed()
        ));
        return;
    }

    let (icon, status) = match coverage.overall_status {
        ApiCoverageStatus::Covered => (
            "✓".green().to_string(),
            coverage_label(coverage.overall_status).green().to_string(),
        ),
        ApiCoverageStatus::Partial => (
            "~".yellow().to_string(),
            coverage_label(coverage.overall_status).yellow().to_string(),
        ),
        ApiCoverageStatus::NotCovered => (
            "✗".red().to_string(),
            coverage_label(coverage.overall_status).red().to_string(),
        ),
        ApiCoverageStatus::NotApplicable => (
            "-".dimmed().to_string(),
            coverage_label(coverage.overall_status).dimmed().to_string(),
        ),
    };
    output.push_str(&format!(
        "  {} {} [{}] {}\n",
        icon,
        title,
        rule.severity.as_str().dimmed(),
        status
    ));

    for spec in &coverage.spec_coverage {
        let justification = spec
            .justification
            .as_deref()
            .map(|text| format!(" - {text}"))
            .unwrap_or_default();
        output.push_str(&format!(
            "      {}: {}{}\n",
            spec.spec_name.dimmed(),
            spec_label(spec.status),
            justification.dimmed()
        ));
    }
}

fn text_root(output: &mut String, root: &ApiRoot) {
    output.push('\n');
    output.push_str(&format!(
        "{} {} {}\n",
        "##".bold(),
        root.display_name.cyan().bold(),
        format!("({})", root.path).dimmed()
    ));
    if let Some(preset) = &root.preset {
        output.push_str(&format!("   preset: {}\n", preset));
    }
    if !root.config_issues.is_empty() {
        output.push_str(&format!(
            "   {} configuration rejected, using baseline rules\n",
            "!".red().bold()
        ));
        for issue in &root.config_issues {
            output.push_str(&format!("     {} {}: {}\n", "-".red(), issue.field, issue.message));
        }
    }
    text_summary(output, &root.summary);
    for rule in &root.coverage {
        text_rule(output, rule);
    }
}

fn render_json(report: &ApiReport) -> Result<String> {
    facet_json::to_string_pretty(report)
        .map_err(|e| eyre::eyre!("JSON serialization failed: {e}"))
}

fn render_markdown(report: &ApiReport, per_root: bool) -> String {
    let mut output = String::new();

    output.push_str("# Guardrail Coverage\n\n");
    markdown_summary(&mut output, &report.flat.summary);

    if !report.diagnostics.is_empty() {
        output.push_str("## Diagnostics\n\n");
        for diagnostic in &report.diagnostics {
            output.push_str(&format!("- {}\n", diagnostic.message));
        }
        output.push('\n');
    }

    output.push_str("## Rules\n\n");
    markdown_table(&mut output, &report.flat.rules);

    if per_root && report.roots.len() > 1 {
        for root in &report.roots {
            output.push_str(&format!("## {} (`{}`)\n\n", root.display_name, root.path));
            if !root.config_issues.is_empty() {
                output.push_str("Configuration rejected, using baseline rules:\n\n");
                for issue in &root.config_issues {
                    output.push_str(&format!("- `{}`: {}\n", issue.field, issue.message));
                }
                output.push('\n');
            }
            markdown_summary(&mut output, &root.summary);
            markdown_table(&mut output, &root.coverage);
        }
    }

    output
}

fn markdown_summary(output: &mut String, summary: &ApiSummary) {
    output.push_str(&format!(
        "**Coverage:** {:.1}% ({}/{} applicable rules covered)\n\n",
        summary.coverage_percent,
        summary.covered,
        summary.covered + summary.partial + summary.not_covered
    ));
}

fn markdown_table(output: &mut String, rules: &[ApiRuleCoverage]) {
    output.push_str("| Rule | Severity | Status | Specifications |\n");
    output.push_str("|------|----------|--------|----------------|\n");
    for coverage in rules {
        let rule = &coverage.rule;
        let status = if rule.enabled {
            coverage_label(coverage.overall_status).to_string()
        } else {
            "disabled".to_string()
        };
        let specs: Vec<String> = coverage
            .spec_coverage
            .iter()
            .map(|spec| format!("{} ({})", spec.spec_name, spec_label(spec.status)))
            .collect();
        output.push_str(&format!(
            "| {}. {} | {} | {} | {} |\n",
            rule.id,
            rule.name,
            rule.severity.as_str(),
            status,
            specs.join(", ")
        ));
    }
    output.push('\n');
}
