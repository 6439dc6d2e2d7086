use std::collections::BTreeMap;

/// Issue names sorted by descending priority weight (unlisted issues weigh 0).
/// Equal weights fall back to ascending name so the order is reproducible.
pub fn order_issues<'a>(names: impl IntoIterator<Item = &'a str>, priority: &BTreeMap<String, i64>) -> Vec<String> {
    let weight = |name: &str| priority.get(name).copied().unwrap_or(0);
    let mut out: Vec<&str> = names.into_iter().collect();
    out.sort_by(|a, b| weight(b).cmp(&weight(a)).then_with(|| a.cmp(b)));
    out.into_iter().map(str::to_string).collect()
}
