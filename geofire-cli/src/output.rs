//! Terminal rendering of query results

use colored::Colorize;
use geofire_query::Business;
use std::fmt::Write;

/// Render one business as a single line.
pub fn business_line(business: &Business) -> String {
    let mut line = format!("{}", business.name.bold());
    if let Some(category) = &business.category {
        let _ = write!(line, " [{}]", category.dimmed());
    }
    match business.distance {
        Some(d) => {
            let _ = write!(line, "  {:.2} mi / {:.2} km", d.distance_mi, d.distance_km);
        }
        None => {
            let _ = write!(line, "  {}", "distance unknown".yellow());
        }
    }
    let _ = write!(line, "  ({})", business.id.dimmed());
    line
}

/// Render a full result listing.
pub fn render_businesses(businesses: &[Business], elapsed_ms: Option<u64>) -> String {
    let mut out = String::new();
    for business in businesses {
        out.push_str(&business_line(business));
        out.push('\n');
    }

    let summary = format!("{} businesses", businesses.len());
    match elapsed_ms {
        Some(ms) => {
            let _ = writeln!(out, "{} in {ms} ms", summary.green());
        }
        None => {
            let _ = writeln!(out, "{}", summary.green());
        }
    }
    out
}
