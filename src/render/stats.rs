//! Entity statistics table, cache performance and latency panels.

use chrono::{DateTime, NaiveDate, Utc};

use crate::source::{EntityStats, LatencySample, ProviderMetrics};

/// Samples considered by the sparklines and the latency chart.
pub const MAX_LATENCY_POINTS: usize = 10;

const SPARKLINE_CHARS: [char; 7] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇'];

const CHART_HEIGHT: f64 = 4.0;

#[derive(Debug, Clone, Copy)]
pub struct StatsOptions {
    pub tty: bool,
    /// Reference time for "Last updated", in ms since the epoch.
    pub now_ms: u64,
}

/// Render the full stats panel.
pub fn render_stats(stats: &EntityStats, metrics: &ProviderMetrics, opts: &StatsOptions) -> String {
    let mut lines = entity_table(stats, opts.tty);
    lines.push(String::new());
    lines.extend(cache_performance(metrics, opts.tty));
    lines.push(String::new());
    lines.extend(latency_panel(metrics, opts.tty));

    if let Some(updated) = &stats.last_updated {
        lines.push(String::new());
        lines.push(format!("Last updated: {}", time_ago(updated, opts.now_ms)));
    }

    lines.join("\n")
}

struct TableGlyphs {
    rule: char,
    column: char,
    cross: char,
}

fn entity_table(stats: &EntityStats, tty: bool) -> Vec<String> {
    let g = if tty {
        TableGlyphs { rule: '─', column: '│', cross: '┼' }
    } else {
        TableGlyphs { rule: '-', column: '|', cross: '+' }
    };
    let rule = |n: usize| g.rule.to_string().repeat(n);
    let separator = format!("{}{}{}{}{}", rule(14), g.cross, rule(7), g.cross, rule(8));
    let row = |name: &str, count: &str, pct: &str| {
        format!(" {name:<13}{col} {count:>5} {col} {pct:>6}", col = g.column)
    };

    let mut sorted: Vec<_> = stats.categories.iter().collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));

    let mut lines = vec![
        "Entity Statistics".to_string(),
        rule(37),
        row("Category", "Count", "%"),
        separator.clone(),
    ];
    for cat in sorted {
        lines.push(row(&cat.name, &cat.count.to_string(), &format!("{:.1}%", cat.pct)));
    }
    lines.push(separator);
    lines.push(row("TOTAL", &stats.total_entities.to_string(), "100%"));
    lines
}

fn cache_performance(metrics: &ProviderMetrics, tty: bool) -> Vec<String> {
    let mut lines = vec!["Cache Performance".to_string()];
    if !metrics.provider_available {
        lines.push(" [OFFLINE] No metrics available".to_string());
        return lines;
    }

    let hit = format!("{:.1}", metrics.cache_hit_rate * 100.0);
    let miss = format!("{:.1}", 100.0 - metrics.cache_hit_rate * 100.0);

    if tty {
        lines.push(format!(
            " Hit Rate: {hit:>5}% {}",
            sparkline(&metrics.latency_log, true)
        ));
        lines.push(format!(
            " Misses:  {miss:>5}% {}",
            sparkline(&metrics.latency_log, false)
        ));
    } else {
        lines.push(format!(" Hit Rate: {hit}%"));
        lines.push(format!(" Misses:  {miss}%"));
    }
    lines
}

/// Quantize the recent hit (or miss) durations onto a 7-level ramp.
///
/// Samples of the other kind read as zero; a zero duration reads as one so
/// the operation still shows.
pub fn sparkline(log: &[LatencySample], hits: bool) -> String {
    if log.is_empty() {
        return String::new();
    }
    let start = log.len().saturating_sub(MAX_LATENCY_POINTS);
    let values: Vec<f64> = log[start..]
        .iter()
        .map(|s| {
            if s.is_cache_hit == hits {
                if s.duration_ms > 0.0 { s.duration_ms } else { 1.0 }
            } else {
                0.0
            }
        })
        .collect();

    let max = values.iter().cloned().fold(1.0, f64::max);
    let top = SPARKLINE_CHARS.len() - 1;

    values
        .iter()
        .map(|v| {
            let idx = ((v / max) * top as f64).round() as usize;
            SPARKLINE_CHARS[idx.min(top)]
        })
        .collect()
}

fn latency_panel(metrics: &ProviderMetrics, tty: bool) -> Vec<String> {
    if !metrics.provider_available {
        return vec!["Latency".to_string(), " [OFFLINE] No latency data".to_string()];
    }
    let recent = metrics.recent_latency(MAX_LATENCY_POINTS);
    if recent.is_empty() {
        return vec!["Latency".to_string(), " No operations recorded".to_string()];
    }

    let series: Vec<f64> = recent.iter().map(|s| s.duration_ms.max(0.0)).collect();
    let glyphs = if tty { &UNICODE_CHART } else { &ASCII_CHART };

    let mut lines = vec![format!("Latency (last {} operations)", recent.len())];
    lines.extend(line_chart(&series, glyphs));
    lines
}

struct ChartGlyphs {
    axis: char,
    origin: char,
    flat: char,
    vertical: char,
    /// At the lower end of a rising segment.
    rise_from: char,
    /// At the upper end of a rising segment.
    rise_to: char,
    /// At the upper end of a falling segment.
    fall_from: char,
    /// At the lower end of a falling segment.
    fall_to: char,
}

const UNICODE_CHART: ChartGlyphs = ChartGlyphs {
    axis: '┤',
    origin: '┼',
    flat: '─',
    vertical: '│',
    rise_from: '╯',
    rise_to: '╭',
    fall_from: '╮',
    fall_to: '╰',
};

const ASCII_CHART: ChartGlyphs = ChartGlyphs {
    axis: '|',
    origin: '+',
    flat: '-',
    vertical: '|',
    rise_from: '+',
    rise_to: '+',
    fall_from: '+',
    fall_to: '+',
};

/// A small labelled line chart, `CHART_HEIGHT` rows tall for varying data.
fn line_chart(series: &[f64], g: &ChartGlyphs) -> Vec<String> {
    let min = series.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = series.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    // Ranges too small to scale (including subnormals) plot flat.
    let ratio = if range.is_finite() && range >= f64::EPSILON {
        CHART_HEIGHT / range
    } else {
        1.0
    };

    let min_level = (min * ratio).round() as i64;
    let rows = ((max * ratio).round() as i64)
        .saturating_sub(min_level)
        .clamp(0, CHART_HEIGHT as i64) as usize;
    let level = |v: f64| {
        ((v * ratio).round() as i64)
            .saturating_sub(min_level)
            .clamp(0, rows as i64) as usize
    };

    let mut grid = vec![vec![' '; series.len()]; rows + 1];
    for row in grid.iter_mut() {
        row[0] = g.axis;
    }
    grid[rows - level(series[0])][0] = g.origin;

    for (x, pair) in series.windows(2).enumerate() {
        let col = x + 1;
        let (y0, y1) = (level(pair[0]), level(pair[1]));
        if y0 == y1 {
            grid[rows - y0][col] = g.flat;
            continue;
        }
        if y1 > y0 {
            grid[rows - y0][col] = g.rise_from;
            grid[rows - y1][col] = g.rise_to;
        } else {
            grid[rows - y0][col] = g.fall_from;
            grid[rows - y1][col] = g.fall_to;
        }
        for y in y0.min(y1) + 1..y0.max(y1) {
            grid[rows - y][col] = g.vertical;
        }
    }

    grid.into_iter()
        .enumerate()
        .map(|(r, cells)| {
            let label = if rows > 0 {
                max - r as f64 * range / rows as f64
            } else {
                max
            };
            let plot: String = cells.into_iter().collect();
            format!("{label:>8.1} {}", plot.trim_end())
        })
        .collect()
}

/// Relative age of a timestamp: `Ns ago`, `Nm ago`, `Nh ago` or `Nd ago`.
///
/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC). Unparsable or
/// future timestamps give `unknown`.
pub fn time_ago(raw: &str, now_ms: u64) -> String {
    let then = DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        });
    let Some(then) = then else {
        return "unknown".to_string();
    };

    let diff_ms = now_ms as i64 - then.timestamp_millis();
    if diff_ms < 0 {
        return "unknown".to_string();
    }

    let seconds = diff_ms / 1000;
    if seconds < 60 {
        return format!("{seconds}s ago");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CategoryCount, CircuitState};

    const NOW: u64 = 1_768_471_200_000; // 2026-01-15T10:00:00Z

    fn stats() -> EntityStats {
        EntityStats {
            total_entities: 4,
            categories: vec![
                CategoryCount { name: "agents".into(), count: 1, pct: 25.0 },
                CategoryCount { name: "tasks".into(), count: 3, pct: 75.0 },
            ],
            last_updated: None,
            version: None,
            timestamp: 0,
        }
    }

    fn online(log: Vec<LatencySample>) -> ProviderMetrics {
        ProviderMetrics {
            cache_hits: 8,
            cache_misses: 2,
            cache_hit_rate: 0.8,
            circuit_breaker_state: CircuitState::Closed,
            circuit_breaker_failures: 0,
            latency_log: log,
            provider_available: true,
            active_provider: Some("code-graph".into()),
            timestamp: 0,
        }
    }

    fn opts(tty: bool) -> StatsOptions {
        StatsOptions { tty, now_ms: NOW }
    }

    #[test]
    fn test_entity_table_sorted_by_count() {
        let lines = entity_table(&stats(), true);
        assert_eq!(lines[0], "Entity Statistics");
        assert_eq!(lines[1].chars().count(), 37);
        assert_eq!(lines[2], " Category     │ Count │      %");
        assert_eq!(lines[3], "──────────────┼───────┼────────");
        assert_eq!(lines[4], " tasks        │     3 │  75.0%");
        assert_eq!(lines[5], " agents       │     1 │  25.0%");
        assert_eq!(lines[7], " TOTAL        │     4 │   100%");
    }

    #[test]
    fn test_plain_table_is_ascii() {
        let lines = entity_table(&stats(), false);
        assert_eq!(lines[3], "--------------+-------+--------");
        assert!(lines.iter().all(|l| l.is_ascii()));
    }

    #[test]
    fn test_offline_placeholders() {
        let out = render_stats(&stats(), &ProviderMetrics::offline(0), &opts(true));
        assert!(out.contains(" [OFFLINE] No metrics available"));
        assert!(out.contains(" [OFFLINE] No latency data"));
        assert!(!out.contains("Last updated"));
    }

    #[test]
    fn test_cache_rates_and_sparklines() {
        let log = vec![LatencySample::new(10.0, true), LatencySample::new(5.0, false)];
        let lines = cache_performance(&online(log.clone()), true);
        assert_eq!(lines[1], " Hit Rate:  80.0% ▇▁");
        assert_eq!(lines[2], " Misses:   20.0% ▁▇");

        let plain = cache_performance(&online(log), false);
        assert_eq!(plain[1], " Hit Rate: 80.0%");
    }

    #[test]
    fn test_sparkline_uses_last_ten_and_zero_duration_counts() {
        let mut log: Vec<_> = (0..12).map(|_| LatencySample::new(100.0, false)).collect();
        log.push(LatencySample::new(0.0, true));
        let hits = sparkline(&log, true);
        assert_eq!(hits.chars().count(), MAX_LATENCY_POINTS);
        assert!(hits.ends_with('▇'));
        assert!(sparkline(&[], true).is_empty());
    }

    #[test]
    fn test_latency_panel() {
        let empty = latency_panel(&online(vec![]), true);
        assert_eq!(empty[1], " No operations recorded");

        let log = vec![
            LatencySample::new(10.0, true),
            LatencySample::new(30.0, false),
            LatencySample::new(20.0, true),
        ];
        let lines = latency_panel(&online(log), true);
        assert_eq!(lines[0], "Latency (last 3 operations)");
        assert_eq!(lines.len(), 1 + 5);
        assert!(lines[1].starts_with("    30.0"));
        assert!(lines[5].starts_with("    10.0 ┼"));
    }

    #[test]
    fn test_flat_latency_is_single_row() {
        let log = vec![LatencySample::new(7.0, true); 3];
        let lines = latency_panel(&online(log), false);
        assert_eq!(lines[1], "     7.0 +--");
    }

    #[test]
    fn test_subnormal_spread_plots_flat() {
        let lines = line_chart(&[0.0, 5e-324], &ASCII_CHART);
        assert_eq!(lines, vec!["     0.0 +-".to_string()]);

        let log = vec![LatencySample::new(0.0, true), LatencySample::new(5e-324, false)];
        let lines = latency_panel(&online(log), true);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_time_ago_thresholds() {
        assert_eq!(time_ago("2026-01-15T09:59:30Z", NOW), "30s ago");
        assert_eq!(time_ago("2026-01-15T09:55:00Z", NOW), "5m ago");
        assert_eq!(time_ago("2026-01-15T07:00:00Z", NOW), "3h ago");
        assert_eq!(time_ago("2026-01-12", NOW), "3d ago");
        assert_eq!(time_ago("2026-01-16T00:00:00Z", NOW), "unknown");
        assert_eq!(time_ago("not a date", NOW), "unknown");
    }

    #[test]
    fn test_last_updated_line() {
        let mut s = stats();
        s.last_updated = Some("2026-01-15T09:00:00Z".into());
        let out = render_stats(&s, &online(vec![]), &opts(false));
        assert!(out.ends_with("\n\nLast updated: 1h ago"));
    }
}
