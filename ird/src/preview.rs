//! Drives Preview.app through System Events.

use std::process::{Command, Stdio};

use irhid::{button::Direction, dispatch::ActionSink};
use log::{debug, warn};

const OSASCRIPT: &str = "/usr/bin/osascript";
const ACTIVATE: &str = r#"tell application "Preview" to activate"#;

fn click_go_menu_item(item: &str) -> String {
    format!(
        r#"tell application "System Events" to click menu item "{item}" of menu "Go" of menu bar item "Go" of menu bar 1 of application process "Preview""#
    )
}

/// Forwards next/previous presses to Preview.app via `osascript`.
///
/// Invocation problems are logged, never fatal; a missed slide transition is
/// not worth tearing the event loop down for.
pub struct PreviewSink;

impl PreviewSink {
    pub fn new() -> Self {
        Self
    }
}

impl ActionSink for PreviewSink {
    fn forward(&mut self, direction: Direction) {
        let item = match direction {
            Direction::Next => "Next Item",
            Direction::Previous => "Previous Item",
        };
        debug!("clicking \"{item}\" in Preview's Go menu");

        let result = Command::new(OSASCRIPT)
            .arg("-e")
            .arg(ACTIVATE)
            .arg("-e")
            .arg(click_go_menu_item(item))
            .stdout(Stdio::null())
            .status();

        match result {
            Ok(status) if !status.success() => {
                warn!("osascript exited with {status}");
            }
            Ok(_) => {}
            Err(err) => warn!("could not run {OSASCRIPT}: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_clicks_target_previews_go_menu() {
        let script = click_go_menu_item("Next Item");
        assert!(script.contains(r#"click menu item "Next Item""#));
        assert!(script.contains(r#"menu "Go""#));
        assert!(script.contains(r#"application process "Preview""#));
    }
}
