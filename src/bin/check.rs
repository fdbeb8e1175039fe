//! tabsync-check - validate a tab list configuration and show which group
//! each given server resolves to.
//!
//! Usage: `tabsync-check [config.toml] [server...]`

use tabsync::Settings;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("TABSYNC_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "tabsync.toml".to_string());

    let settings = Settings::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        path = %config_path,
        groups = settings.groups.len(),
        fallback = settings.fallback_enabled,
        show_all = settings.show_all_players_from_all_groups,
        "Configuration is valid"
    );
    for group in &settings.groups {
        info!(
            group = %group.name,
            servers = ?group.servers,
            refresh_ms = group.header_footer_update_rate_ms,
            default = group.is_default(&settings),
            "Group"
        );
    }

    for server in args {
        match settings.group_for_server(&server) {
            Some(group) => info!(server = %server, group = %group.name, "Resolved"),
            None => warn!(server = %server, "Server is excluded from tab lists"),
        }
    }
    Ok(())
}
