//! IRCv3 line parsing for Twitch chat.
//!
//! Twitch chat speaks IRC with message tags:
//!
//! ```text
//! @display-name=Foo;user-id=1234 :foo!foo@foo.tmi.twitch.tv PRIVMSG #foo :hello world
//! ```

use std::collections::HashMap;

/// One parsed IRC line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IrcMessage {
    /// IRCv3 tags with escapes resolved.
    pub tags: HashMap<String, String>,
    /// Source prefix without the leading `:`.
    pub prefix: Option<String>,
    /// Command or numeric reply.
    pub command: String,
    /// Middle params followed by the trailing param, if any.
    pub params: Vec<String>,
}

impl IrcMessage {
    /// Parse a single line (with or without the `\r\n`).
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);
        if rest.is_empty() {
            return None;
        }

        let mut msg = Self::default();

        if let Some(tagged) = rest.strip_prefix('@') {
            let (raw_tags, after) = tagged.split_once(' ')?;
            msg.tags = parse_tags(raw_tags);
            rest = after.trim_start();
        }

        if let Some(prefixed) = rest.strip_prefix(':') {
            let (prefix, after) = prefixed.split_once(' ')?;
            msg.prefix = Some(prefix.to_string());
            rest = after.trim_start();
        }

        let (command, mut params) = match rest.split_once(' ') {
            Some((command, params)) => (command, params),
            None => (rest, ""),
        };
        if command.is_empty() {
            return None;
        }
        msg.command = command.to_string();

        while !params.is_empty() {
            if let Some(trailing) = params.strip_prefix(':') {
                msg.params.push(trailing.to_string());
                break;
            }
            match params.split_once(' ') {
                Some((param, after)) => {
                    if !param.is_empty() {
                        msg.params.push(param.to_string());
                    }
                    params = after;
                }
                None => {
                    msg.params.push(params.to_string());
                    break;
                }
            }
        }

        Some(msg)
    }

    /// Tag value, if present.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Nickname portion of the prefix (`nick!user@host`).
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split_once('!').map_or(prefix, |(nick, _)| nick))
    }

    /// Last param (usually the message text).
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }
}

fn parse_tags(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), unescape_tag_value(value)),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

/// Resolve IRCv3 tag value escapes.
fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
