use rss_collector::metrics::ARTICLES_GAUGE;

/// Value of `rss_articles_total{target="<target>"}` in an exposition, if present.
pub fn articles_in_exposition(text: &str, target: &str) -> Option<f64> {
    let prefix = format!("{ARTICLES_GAUGE}{{target=\"{target}\"}} ");
    text.lines()
        .find_map(|l| l.strip_prefix(prefix.as_str()))
        .and_then(|v| v.trim().parse().ok())
}
