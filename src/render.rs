//! Rendering collaborator.
//!
//! Markup and placeholder engines live outside this crate. The engine asks a
//! [`TabRenderer`] for finished text and only decides when to send it.

use crate::config::Group;
use crate::proxy::{ProxyPlayer, Text};

/// Produces the text a client should display.
pub trait TabRenderer: Send + Sync {
    /// Header and footer for `player` while in `group`.
    fn header_footer(&self, player: &dyn ProxyPlayer, group: &Group) -> (Text, Text);

    /// How `target` is named on `viewer`'s tab list, using `group`'s format.
    fn display_name(&self, viewer: &dyn ProxyPlayer, target: &dyn ProxyPlayer, group: &Group)
    -> Text;
}

/// Verbatim templates with `%username%`, `%group%` and `%server%` substituted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl PlainRenderer {
    fn substitute(template: &str, player: &dyn ProxyPlayer, group: &Group) -> Text {
        template
            .replace("%username%", &player.username())
            .replace("%group%", &group.name)
            .replace("%server%", &player.current_server().unwrap_or_default())
    }
}

impl TabRenderer for PlainRenderer {
    fn header_footer(&self, player: &dyn ProxyPlayer, group: &Group) -> (Text, Text) {
        (
            Self::substitute(group.header_template(), player, group),
            Self::substitute(group.footer_template(), player, group),
        )
    }

    fn display_name(
        &self,
        _viewer: &dyn ProxyPlayer,
        target: &dyn ProxyPlayer,
        group: &Group,
    ) -> Text {
        format!(
            "{}{}{}",
            group.nametag.prefix,
            Self::substitute(&group.format, target, group),
            group.nametag.suffix
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::MemoryPlayer;
    use uuid::Uuid;

    #[test]
    fn substitutes_known_placeholders() {
        let player = MemoryPlayer::new(Uuid::new_v4(), "alice");
        player.set_server(Some("lobby-1"));
        let group = Group::new("lobby", &["lobby-*"])
            .unwrap()
            .with_header_footer("Hi %username%", "%group% @ %server% %ping%");

        let (header, footer) = PlainRenderer.header_footer(&player, &group);
        assert_eq!(header, "Hi alice");
        assert_eq!(footer, "lobby @ lobby-1 %ping%");
    }

    #[test]
    fn display_name_wraps_format_with_nametag() {
        let viewer = MemoryPlayer::new(Uuid::new_v4(), "bob");
        let target = MemoryPlayer::new(Uuid::new_v4(), "alice");
        let mut group = Group::new("lobby", &[]).unwrap();
        group.nametag.prefix = "[L] ".into();
        group.format = "%username%!".into();

        assert_eq!(
            PlainRenderer.display_name(&viewer, &target, &group),
            "[L] alice!"
        );
    }
}
