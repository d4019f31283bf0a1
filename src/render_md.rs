//! Markdown rendering of a fetched snapshot, used by `betterhist get`.
//!
//! A single fenced ```shell block containing the user view then the
//! command view, so it pastes cleanly into chat or an issue comment.

/// Format a snapshot's two views as the fenced block `get` prints.
pub fn format_snapshot_markdown(user_view: &str, command_view: &str) -> String {
    format!("```shell\n{user_view}\n{command_view}\n```")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_both_views_in_one_fenced_block() {
        let out = format_snapshot_markdown("ls", "a b c");
        assert_eq!(out, "```shell\nls\na b c\n```");
    }
}
