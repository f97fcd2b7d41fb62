//! Request path generation: `{prefix}/{version}/{category}/{table}/{name}`.

/// URL segment for a category code. Unknown or absent categories map to `general`.
pub fn category_segment(category_id: Option<&str>) -> &'static str {
    match category_id.map(str::trim) {
        Some("BASIC_DATA") => "basic",
        Some("BUSINESS_DATA") => "business",
        Some("STATISTICAL_DATA") => "statistics",
        Some("REFERENCE_DATA") => "reference",
        Some("TRANSACTION_DATA") => "transaction",
        Some("MARKET_DATA") => "market",
        Some("RISK_DATA") => "risk",
        Some("COMPLIANCE_DATA") => "compliance",
        _ => "general",
    }
}

/// Lower-cased table name without `t_`/`tb_`/`table_` prefix, underscores as hyphens. A schema qualifier is dropped.
pub fn table_segment(table_name: &str) -> String {
    let bare = table_name.rsplit('.').next().unwrap_or(table_name).to_lowercase();
    let stripped = ["table_", "tb_", "t_"]
        .iter()
        .find_map(|p| bare.strip_prefix(p))
        .unwrap_or(&bare);
    stripped.replace('_', "-")
}

/// Lower-cased name; characters outside `[a-z0-9_-]` become `-`, runs collapse, ends are trimmed.
pub fn name_segment(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' {
            c
        } else {
            '-'
        };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Leading `/`, no empty segments, no trailing `/`.
pub fn normalize(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.trim().is_empty()).collect();
    format!("/{}", segments.join("/"))
}

pub fn generate(prefix: &str, version: &str, category_id: Option<&str>, table_name: &str, name: &str) -> String {
    normalize(&format!(
        "{}/{}/{}/{}/{}",
        prefix,
        version,
        category_segment(category_id),
        table_segment(table_name),
        name_segment(name)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_full_path() {
        assert_eq!(
            generate("/api/data", "v1", Some("MARKET_DATA"), "t_spot_price", "Spot Price (hourly)"),
            "/api/data/v1/market/spot-price/spot-price-hourly"
        );
        assert_eq!(
            generate("/api/data/", "v1", None, "ods.tb_load_curve", "load_curve"),
            "/api/data/v1/general/load-curve/load_curve"
        );
    }

    #[test]
    fn name_segment_falls_back_to_unknown() {
        assert_eq!(name_segment("负荷"), "unknown");
        assert_eq!(name_segment("--A  b--"), "a-b");
    }

    #[test]
    fn normalize_collapses_slashes() {
        assert_eq!(normalize("api//data/x/"), "/api/data/x");
        assert_eq!(normalize(""), "/");
    }
}
