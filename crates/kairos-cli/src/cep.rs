//! Brazilian postal-code (CEP) lookup raced across two providers.
//!
//! Both providers are queried concurrently under one parent context. Every
//! branch is bounded by the same budget, and the fastest usable answer wins.

use std::sync::OnceLock;
use std::time::Duration;

use kairos_core::{CallContext, CallSpec, RaceOrchestrator, RaceResult};
use regex::Regex;

use crate::error::{CliError, CliResult};

/// Default per-provider budget.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(1);

/// Label of the ViaCEP branch.
pub const VIACEP: &str = "ViaCEP";

/// Label of the BrasilAPI branch.
pub const BRASILAPI: &str = "BrasilAPI";

fn cep_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{5}-?\d{3}$").expect("valid regex"))
}

/// Checks `cep` against `NNNNN-NNN` / `NNNNNNNN` and returns it trimmed.
pub fn validate_cep(cep: &str) -> CliResult<&str> {
    let cep = cep.trim();
    if cep_pattern().is_match(cep) {
        Ok(cep)
    } else {
        Err(CliError::InvalidCep(cep.to_string()))
    }
}

/// ViaCEP lookup URL.
pub fn viacep_url(cep: &str) -> String {
    format!("http://viacep.com.br/ws/{cep}/json")
}

/// BrasilAPI lookup URL.
pub fn brasilapi_url(cep: &str) -> String {
    format!("https://brasilapi.com.br/api/cep/v1/{cep}")
}

/// One text-payload call per provider, in declaration order.
pub fn cep_specs(cep: &str, timeout: Duration) -> Vec<CallSpec<String>> {
    vec![
        CallSpec::text(VIACEP, viacep_url(cep), timeout),
        CallSpec::text(BRASILAPI, brasilapi_url(cep), timeout),
    ]
}

/// Validates `cep`, then races both providers under `ctx`.
///
/// An invalid CEP fails before any request is made.
pub async fn race_cep(
    orchestrator: &RaceOrchestrator,
    ctx: &CallContext,
    cep: &str,
    timeout: Duration,
) -> CliResult<RaceResult<String>> {
    let cep = validate_cep(cep)?;
    let result = orchestrator.race(ctx, cep_specs(cep, timeout)).await?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_both_shapes() {
        assert_eq!(validate_cep("01001-000").unwrap(), "01001-000");
        assert_eq!(validate_cep("01001000").unwrap(), "01001000");
        assert_eq!(validate_cep(" 01001000 ").unwrap(), "01001000");
    }

    #[test]
    fn test_rejects_malformed() {
        for cep in ["", "0100-1000", "01001-00", "010010000", "abcde-fgh", "01001--000"] {
            assert!(
                matches!(validate_cep(cep), Err(CliError::InvalidCep(_))),
                "{cep:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_specs_target_both_providers() {
        let specs = cep_specs("01001000", Duration::from_millis(500));
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].label(), VIACEP);
        assert_eq!(specs[0].target(), "http://viacep.com.br/ws/01001000/json");
        assert_eq!(specs[1].label(), BRASILAPI);
        assert_eq!(specs[1].target(), "https://brasilapi.com.br/api/cep/v1/01001000");
        assert!(specs.iter().all(|s| s.timeout() == Duration::from_millis(500)));
    }

    #[test]
    fn test_empty_body_is_not_usable() {
        let specs = cep_specs("01001000", DEFAULT_QUERY_TIMEOUT);
        assert!(specs[0].decode(b"").is_err());
        assert_eq!(specs[0].decode(b"{}").unwrap(), "{}");
    }
}
