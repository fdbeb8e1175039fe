//! Configuration reload without disturbing connected players, and the
//! periodic header/footer refresh that follows the reloaded rates.

mod common;

use common::Harness;
use std::fs;
use tabsync::{ConfigGroupRegistry, GroupRegistry, ProxyPlayer};

const INITIAL: &str = r#"
fallback_enabled = false

[[groups]]
name = "lobby"
servers = ["lobby-*"]
headers = ["Welcome %username%"]
footers = ["%group%"]
header_footer_update_rate_ms = 0

[[groups]]
name = "survival"
servers = ["survival"]
headers = ["Survival"]
header_footer_update_rate_ms = 0
"#;

fn harness_over(path: &std::path::Path) -> Harness {
    let registry = ConfigGroupRegistry::load(path).expect("initial config loads");
    Harness::with_registry(registry)
}

#[tokio::test(start_paused = true)]
async fn reload_rerenders_headers_without_moving_players() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tabsync.toml");
    fs::write(&path, INITIAL).unwrap();

    let h = harness_over(&path);
    let alice = h.connect_loaded("alice", "lobby-1").await;
    let bob = h.connect_loaded("bob", "survival").await;
    assert_eq!(alice.header_footer(), ("Welcome alice".into(), "lobby".into()));

    fs::write(&path, INITIAL.replace("Welcome %username%", "Hello %username%")).unwrap();
    h.reload().await;

    assert_eq!(alice.header_footer().0, "Hello alice");
    assert_eq!(bob.header_footer().0, "Survival");
    assert_eq!(h.directory().group_of(alice.uuid()).as_deref(), Some("lobby"));
    assert_eq!(h.directory().group_of(bob.uuid()).as_deref(), Some("survival"));
    assert!(h.is_loaded(&alice) && h.is_loaded(&bob));
}

#[tokio::test(start_paused = true)]
async fn failed_reload_keeps_previous_groups() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tabsync.toml");
    fs::write(&path, INITIAL).unwrap();

    let h = harness_over(&path);
    let alice = h.connect_loaded("alice", "lobby-1").await;

    // Two groups claiming the same server is rejected as a whole.
    let clashing = INITIAL.replace(r#"servers = ["survival"]"#, r#"servers = ["lobby-*"]"#);
    fs::write(&path, clashing).unwrap();
    h.reload().await;

    assert_eq!(h.registry.settings().groups.len(), 2);
    assert_eq!(
        h.registry.resolve("survival").map(|g| g.name.clone()).as_deref(),
        Some("survival")
    );
    assert_eq!(alice.header_footer().0, "Welcome alice");
}

#[tokio::test(start_paused = true)]
async fn reload_moves_no_one_into_new_groups() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tabsync.toml");
    fs::write(&path, INITIAL).unwrap();

    let h = harness_over(&path);
    let alice = h.connect_loaded("alice", "lobby-1").await;

    // lobby-1 now belongs to a new group, but only a join moves players.
    let regrouped = format!(
        "{}{}",
        INITIAL.replace(r#"servers = ["lobby-*"]"#, r#"servers = ["lobby-2"]"#),
        r#"
[[groups]]
name = "hub"
servers = ["lobby-1"]
header_footer_update_rate_ms = 0
"#
    );
    fs::write(&path, regrouped).unwrap();
    h.reload().await;

    assert_eq!(h.directory().group_of(alice.uuid()).as_deref(), Some("lobby"));
    assert!(h.directory().members("hub").is_empty());
}

#[tokio::test(start_paused = true)]
async fn periodic_refresh_follows_reloaded_rate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tabsync.toml");
    let ticking = INITIAL
        .replace("footers = [\"%group%\"]", "footers = [\"%server%\"]")
        .replacen("header_footer_update_rate_ms = 0", "header_footer_update_rate_ms = 1000", 1);
    fs::write(&path, &ticking).unwrap();

    let h = harness_over(&path);
    let alice = h.connect_loaded("alice", "lobby-1").await;
    h.coordinator.start_refreshers();
    assert_eq!(h.coordinator.refresher_count(), 1);

    // Server changes without a join event reach the footer on the next tick.
    alice.set_server(Some("lobby-9"));
    h.advance(999).await;
    assert_eq!(alice.header_footer().1, "lobby-1");
    h.advance(2).await;
    assert_eq!(alice.header_footer().1, "lobby-9");

    // Disabling the rate stops the refresh after a reload.
    let disabled = ticking.replace(
        "header_footer_update_rate_ms = 1000",
        "header_footer_update_rate_ms = 0",
    );
    fs::write(&path, disabled).unwrap();
    h.reload().await;
    assert_eq!(h.coordinator.refresher_count(), 0);

    alice.set_server(Some("lobby-3"));
    // The reload itself re-rendered once.
    assert_eq!(alice.header_footer().1, "lobby-9");
    h.advance(5_000).await;
    assert_eq!(alice.header_footer().1, "lobby-9");

    h.coordinator.shutdown();
}
