//! Provider status block.

use super::ansi::{GREEN, RED, RESET, YELLOW};
use crate::source::{CircuitState, ProviderMetrics};

/// Failures before the provider's circuit breaker opens.
pub const CB_FAILURE_THRESHOLD: u32 = 5;

pub fn render_status(metrics: &ProviderMetrics, tty: bool) -> String {
    let rule = if tty { "─" } else { "-" }.repeat(27);

    let provider = match (tty, metrics.provider_available) {
        (true, true) => format!("{GREEN}● ACTIVE{RESET}"),
        (true, false) => format!("{RED}○ OFFLINE{RESET}"),
        (false, true) => "[ACTIVE]".to_string(),
        (false, false) => "[OFFLINE]".to_string(),
    };

    let state = metrics.circuit_breaker_state;
    let breaker = if tty && state == CircuitState::HalfOpen {
        format!("{YELLOW}{state}{RESET}")
    } else {
        state.to_string()
    };

    [
        "Provider Status".to_string(),
        rule,
        format!(" Code Graph MCP: {provider}"),
        format!(" Circuit Breaker: {breaker}"),
        format!(
            " Failures: {}/{CB_FAILURE_THRESHOLD}",
            metrics.circuit_breaker_failures
        ),
        format!(
            " Cache Entries: {}",
            metrics.cache_hits.saturating_add(metrics.cache_misses)
        ),
        " Uptime: session".to_string(),
    ]
    .join("\n")
}
