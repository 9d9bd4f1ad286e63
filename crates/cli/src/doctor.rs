// doctor: resolved oracle settings and key source (never the key itself)

use std::path::Path;

use prodmatch_config::ai::{ResolvedOracleConfig, KEY_ENV_VARS};
use prodmatch_config::settings::Settings;

use crate::exit_codes::EXIT_ORACLE_MISSING_KEY;
use crate::CliError;

pub fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), CliError> {
    let (settings, used) = Settings::load(config).map_err(CliError::config)?;
    let resolved = ResolvedOracleConfig::from_settings(&settings.oracle);
    let keychain = cfg!(feature = "keychain");
    let settings_file = used
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(defaults)".to_string());
    let key = if resolved.api_key.is_some() { "present" } else { "missing" };

    if json {
        let report = serde_json::json!({
            "schema_version": 1,
            "status": resolved.status.as_str(),
            "blocking_reason": resolved.blocking_reason,
            "settings_file": used,
            "model": resolved.model,
            "base_url": resolved.base_url,
            "timeout_secs": resolved.timeout_secs,
            "key": key,
            "key_source": resolved.key_source.as_str(),
            "keychain": if keychain { "enabled" } else { "not built" },
            "env_vars": KEY_ENV_VARS,
            "output_dir": settings.output_dir,
            "rate_limit_ms": settings.rate_limit_ms,
            "retry_failed": settings.retry_failed,
        });
        let text = serde_json::to_string_pretty(&report).map_err(|e| CliError::general(e.to_string()))?;
        println!("{}", text);
    } else {
        println!("Oracle Doctor");
        println!("-------------");
        println!("status:          {}", resolved.status.as_str());
        if let Some(reason) = &resolved.blocking_reason {
            println!("blocking_reason: {}", reason);
        }
        println!("settings_file:   {}", settings_file);
        println!("model:           {}", resolved.model);
        println!("base_url:        {}", resolved.base_url);
        println!("timeout_secs:    {}", resolved.timeout_secs);
        println!("key:             {}", key);
        println!("key_source:      {}", resolved.key_source.as_str());
        println!("keychain:        {}", if keychain { "enabled" } else { "not built" });
        println!("output_dir:      {}", settings.output_dir.display());
        println!("rate_limit_ms:   {}", settings.rate_limit_ms);
        println!("retry_failed:    {}", settings.retry_failed);
    }

    if !resolved.status.is_ready() {
        // Report already printed; exit code only.
        return Err(CliError::new(EXIT_ORACLE_MISSING_KEY, ""));
    }
    Ok(())
}
