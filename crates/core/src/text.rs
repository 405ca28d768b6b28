//! Notification text utilities: highlight-keyword matching and mention
//! substitution.

use regex::RegexBuilder;

use crate::message::Mention;

/// Whether any of the user's highlight keywords occurs in the text as a
/// whole word, case-insensitively.
///
/// Keywords are matched literally (regex metacharacters are escaped), so a
/// keyword like `c++` still matches.
pub fn contains_highlight(text: &str, highlights: &[String]) -> bool {
    highlights.iter().any(|keyword| {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return false;
        }
        let pattern = format!(r"(^|\W)({})($|\W)", regex::escape(keyword));
        RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map(|re| re.is_match(text))
            .unwrap_or(false)
    })
}

/// Replace each `@username` mention in the text with the user's full display
/// name, for servers configured to show real names.
///
/// Mentions without a known display name (including the `@all` / `@here`
/// sentinels) are left as-is.
pub fn replace_mentions_with_names(text: &str, mentions: &[Mention]) -> String {
    let mut out = text.to_string();
    for mention in mentions {
        if let Some(name) = &mention.name {
            let at_username = format!("@{}", mention.username);
            out = out.replace(&at_username, name);
        }
    }
    out
}
