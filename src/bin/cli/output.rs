//! Output formatting for CLI operations.

use assetshift::{PackageListing, PathPatcher, Relocation};
use serde_json::json;

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats the outcome of a relocation
    fn format_relocation(&self, relocation: &Relocation) -> String;

    /// Formats a package listing, optionally previewing relocated destinations
    fn format_listing(&self, listing: &PackageListing, preview: Option<&PathPatcher>) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_relocation(&self, relocation: &Relocation) -> String {
        let mut output = String::new();

        if relocation.is_relocated() {
            output.push_str(&format!(
                "Relocated {} entries into {}\n",
                relocation.entries,
                relocation.path.display()
            ));
        } else {
            output.push_str("Relocation failed, falling back to the original package:\n");
            output.push_str(&format!("  {}\n", relocation.path.display()));
            if let Some(diag) = &relocation.diagnostic {
                output.push_str(&format!("\n{} during {}: {}\n", diag.kind, diag.phase, diag.message));
                for cause in &diag.causes {
                    output.push_str(&format!("  caused by: {}\n", cause));
                }
            }
        }

        output
    }

    fn format_listing(&self, listing: &PackageListing, preview: Option<&PathPatcher>) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{:>10} {:<5} {:<34} {}\n",
            "Size", "Files", "GUID", "Destination"
        ));
        output.push_str(&"-".repeat(90));
        output.push('\n');

        for asset in &listing.assets {
            let size_str = if asset.has_asset {
                humanize_bytes(asset.asset_size)
            } else {
                String::new()
            };
            let flags = format!(
                "{}{}{}",
                if asset.has_asset { "A" } else { "-" },
                if asset.has_meta { "M" } else { "-" },
                if asset.has_preview { "P" } else { "-" },
            );
            let destination = match (preview, &asset.destination) {
                (Some(patcher), Some(_)) => match asset.relocated_destination(patcher) {
                    Some(Ok(relocated)) => relocated,
                    Some(Err(e)) => format!("<{}>", e),
                    None => "-".to_string(),
                },
                (_, Some(destination)) => destination.clone(),
                (_, None) => "-".to_string(),
            };

            output.push_str(&format!(
                "{:>10} {:<5} {:<34} {}\n",
                size_str, flags, asset.guid, destination
            ));
        }

        output.push_str(&"-".repeat(90));
        output.push('\n');
        output.push_str(&format!(
            "{} assets, {} entries",
            listing.assets.len(),
            listing.entries
        ));
        let incomplete = listing.incomplete();
        if incomplete > 0 {
            output.push_str(&format!(", {} incomplete", incomplete));
        }
        output.push('\n');

        output
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_relocation(&self, relocation: &Relocation) -> String {
        let error = relocation.diagnostic.as_ref().map(|diag| {
            json!({
                "kind": diag.kind.to_string(),
                "phase": diag.phase.label(),
                "message": diag.message,
                "causes": diag.causes,
            })
        });
        let obj = json!({
            "relocated": relocation.is_relocated(),
            "path": relocation.path.display().to_string(),
            "entries": relocation.entries,
            "error": error,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_listing(&self, listing: &PackageListing, preview: Option<&PathPatcher>) -> String {
        let assets: Vec<_> = listing
            .assets
            .iter()
            .map(|a| {
                let relocated = preview
                    .and_then(|patcher| a.relocated_destination(patcher))
                    .and_then(|r| r.ok());
                json!({
                    "guid": a.guid,
                    "destination": a.destination,
                    "relocated_destination": relocated,
                    "has_asset": a.has_asset,
                    "has_meta": a.has_meta,
                    "has_preview": a.has_preview,
                    "asset_size": a.asset_size,
                })
            })
            .collect();
        let obj = json!({
            "entries": listing.entries,
            "assets": assets,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Creates the appropriate formatter based on output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Converts bytes to a human-readable string
pub fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
