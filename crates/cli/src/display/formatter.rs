use gazelle_js_core::RuleResult;
use gazelle_js_core::pnpm::ProjectInfo;
use std::fmt::Write;

/// Render resolved rules as BUILD-file style attribute listings.
pub fn format_rule_results(results: &[RuleResult]) -> String {
    let mut out = String::new();

    for result in results {
        let _ = writeln!(out, "{} ({})", result.label, kind_name(result));
        if result.deps.is_empty() {
            let _ = writeln!(out, "    {} = []", result.attr);
        } else {
            let _ = writeln!(out, "    {} = [", result.attr);
            for dep in &result.deps {
                let _ = writeln!(out, "        \"{dep}\",");
            }
            let _ = writeln!(out, "    ]");
        }

        for unresolved in &result.unresolved {
            let _ = writeln!(
                out,
                "    ⚠️  unresolved {:?} from {}",
                unresolved.import_path, unresolved.source_path
            );
        }
    }

    out
}

fn kind_name(result: &RuleResult) -> String {
    serde_json::to_value(result.kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Render the pnpm projects of a workspace, one per line.
pub fn format_projects(projects: &[ProjectInfo]) -> String {
    let mut out = String::new();

    for project in projects {
        let dir = if project.project.is_empty() { "." } else { project.project.as_str() };
        let marker = if project.referenced { "🔗" } else { "📦" };
        let _ = writeln!(
            out,
            "{marker} {dir} ({} packages, lockfile {})",
            project.packages, project.lockfile
        );
    }

    out
}
