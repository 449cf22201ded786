//! Extraction of the member leaderboard from raw page text.
//!
//! The page is scanned with patterns instead of being parsed as a document.
//! Callers only see [`LeaderboardExtractor`], so the strategy can be replaced
//! without touching the rest of the crate.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use leaderboard_scraping_utils::regex;
use log::{debug, trace};
use regex::Regex;
use url::Url;

use crate::schema::{UserRecord, MAX_ENTRIES};

pub trait LeaderboardExtractor {
    /// Returns at most [`MAX_ENTRIES`] records ranked `1..=N` in page order.
    fn extract(&self, html: &str, fetched_at: DateTime<Utc>) -> Vec<UserRecord>;
}

pub struct PatternExtractor {
    site_origin: Url,
}

impl PatternExtractor {
    pub fn new(site_origin: Url) -> Self {
        Self { site_origin }
    }
}

impl LeaderboardExtractor for PatternExtractor {
    fn extract(&self, html: &str, fetched_at: DateTime<Utc>) -> Vec<UserRecord> {
        let blocks = split_blocks(html);
        debug!("Found {} candidate blocks", blocks.len());
        let mut seen = HashSet::new();
        let mut records = vec![];
        for block in blocks {
            if records.len() >= MAX_ENTRIES {
                break;
            }
            let Some(entry) = parse_block(block) else {
                trace!("Skipping block without username or post count");
                continue;
            };
            if !seen.insert(entry.username.clone()) {
                debug!("Skipping duplicated user {:?}", entry.username);
                continue;
            }
            records.push(UserRecord {
                rank: records.len() as u32 + 1,
                username: entry.username,
                user_title: entry.user_title,
                post_count: entry.post_count,
                media_count: entry.media_count,
                avatar_url: entry
                    .avatar_src
                    .map(|src| normalize_avatar_url(&src, &self.site_origin))
                    .unwrap_or_default(),
                daily_increase: 0,
                timestamp: fetched_at,
            });
        }
        records
    }
}

/// Whether the server answered with a login form instead of the member list.
pub fn looks_like_login_page(html: &str) -> bool {
    regex!(r#"(?i)<form\b[^>]*login"#).is_match(html)
        && regex!(r#"(?i)type\s*=\s*["']password["']"#).is_match(html)
}

/// Cuts the page at every element whose class list contains `block-row`.
///
/// A block runs until the next such element, so containers nested inside a row
/// stay with that row while a nested row starts a new block.
pub fn split_blocks(html: &str) -> Vec<&str> {
    let starts = regex!(r#"<[A-Za-z][^>]*?\bclass\s*=\s*["'](?:[^"']*\s)?block-row["'\s]"#)
        .find_iter(html)
        .map(|m| m.start())
        .collect::<Vec<_>>();
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(html.len());
            &html[start..end]
        })
        .collect()
}

#[derive(Debug)]
struct BlockEntry {
    username: String,
    user_title: String,
    post_count: u64,
    media_count: u64,
    avatar_src: Option<String>,
}

fn parse_block(block: &str) -> Option<BlockEntry> {
    let username = capture(
        regex!(
            r#"\bclass\s*=\s*["'](?:[^"']*\s)?username[^"']*["'][^>]*>(?:\s*<[^>]+>)*\s*([^<]*?)\s*<"#
        ),
        block,
    )
    .map(decode_entities)
    .filter(|name| !name.is_empty())?;
    let post_count = [
        regex!(r#"(?i)\b(?:posts|messages)\s*:\s*(?:<[^>]+>\s*)*(\d[\d,]*)"#),
        regex!(r#"(?i)<dt>\s*(?:posts|messages)\s*</dt>\s*<dd[^>]*>\s*(?:<[^>]+>\s*)*(\d[\d,]*)"#),
        regex!(
            r#"\bclass\s*=\s*["'][^"']*contentRow-extra[^"']*["'][^>]*>\s*(?:<[^>]+>\s*)*(\d[\d,]*)"#
        ),
    ]
    .into_iter()
    .find_map(|pattern| capture(pattern, block).and_then(parse_count))?;
    let user_title = capture(
        regex!(r#"\bclass\s*=\s*["'](?:[^"']*\s)?userTitle["'\s][^>]*>\s*([^<]*?)\s*<"#),
        block,
    )
    .map(decode_entities)
    .unwrap_or_default();
    let media_count = [
        regex!(r#"(?i)\bmedia\s*:\s*(?:<[^>]+>\s*)*(\d[\d,]*)"#),
        regex!(r#"(?i)<dt>\s*media\s*</dt>\s*<dd[^>]*>\s*(?:<[^>]+>\s*)*(\d[\d,]*)"#),
    ]
    .into_iter()
    .find_map(|pattern| capture(pattern, block).and_then(parse_count))
    .unwrap_or(0);
    let avatar_src = capture(regex!(r#"<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#), block)
        .map(decode_entities);
    Some(BlockEntry {
        username,
        user_title,
        post_count,
        media_count,
        avatar_src,
    })
}

fn capture<'a>(pattern: &Regex, text: &'a str) -> Option<&'a str> {
    Some(pattern.captures(text)?.get(1)?.as_str())
}

/// `"1,234"` → `1234`.
fn parse_count(text: &str) -> Option<u64> {
    text.chars()
        .filter(|&c| c != ',' && !c.is_whitespace())
        .collect::<String>()
        .parse()
        .ok()
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_owned()
}

pub fn normalize_avatar_url(src: &str, site_origin: &Url) -> String {
    if let Some(rest) = src.strip_prefix("//") {
        format!("https://{rest}")
    } else if src.starts_with('/') {
        format!("{}{src}", site_origin.origin().ascii_serialization())
    } else {
        src.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{TimeZone, Utc};
    use itertools::Itertools;
    use url::Url;

    use super::{
        looks_like_login_page, normalize_avatar_url, split_blocks, LeaderboardExtractor,
        PatternExtractor,
    };

    fn extractor() -> PatternExtractor {
        PatternExtractor::new(Url::parse("https://forum.example.com").unwrap())
    }

    fn extract(html: &str) -> Vec<crate::schema::UserRecord> {
        extractor().extract(html, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn minimal_block() {
        let records = extract(
            r#"<div class="block-row"><span class="username">Alice</span>Posts: 1,234</div>"#,
        );
        assert_eq!(records.len(), 1);
        let alice = &records[0];
        assert_eq!(alice.rank, 1);
        assert_eq!(alice.username, "Alice");
        assert_eq!(alice.user_title, "");
        assert_eq!(alice.post_count, 1234);
        assert_eq!(alice.media_count, 0);
        assert_eq!(alice.avatar_url, "");
        assert_eq!(alice.daily_increase, 0);
    }

    #[test]
    fn forum_member_list_markup() {
        let html = r#"
<ol class="block-body">
  <li class="block-row block-row--separated">
    <div class="contentRow">
      <div class="contentRow-figure">
        <a href="/members/bob.2/" class="avatar avatar--s" data-user-id="2">
          <img src="/data/avatars/s/0/2.jpg?1700000000" alt="Bob" class="avatar-u2-s" width="48" height="48" />
        </a>
      </div>
      <div class="contentRow-main">
        <div class="contentRow-extra contentRow-extra--largest">12,345</div>
        <h3 class="contentRow-header"><a href="/members/bob.2/" class="username " dir="auto" data-user-id="2"><span class="username--style3">Bob &amp; Co</span></a></h3>
        <div class="contentRow-lesser"><span class="userTitle" dir="auto">Well-known member</span></div>
        <div class="contentRow-minor">
          <ul class="listInline listInline--bullet">
            <li><dl class="pairs pairs--inline"><dt>Messages</dt> <dd>12,345</dd></dl></li>
            <li><dl class="pairs pairs--inline"><dt>Media</dt> <dd>1,002</dd></dl></li>
          </ul>
        </div>
      </div>
    </div>
  </li>
  <li class="block-row block-row--separated">
    <div class="contentRow">
      <div class="contentRow-figure">
        <a href="/members/carol.3/" class="avatar avatar--s" data-user-id="3">
          <img src="//cdn.example.net/avatars/3.png" alt="Carol" />
        </a>
      </div>
      <div class="contentRow-main">
        <h3 class="contentRow-header"><a href="/members/carol.3/" class="username " dir="auto">Carol</a></h3>
        <ul class="listInline"><li><dl class="pairs pairs--inline"><dt>Messages</dt> <dd>9,999</dd></dl></li></ul>
      </div>
    </div>
  </li>
</ol>"#;
        let records = extract(html);
        assert_eq!(records.len(), 2);
        let bob = &records[0];
        assert_eq!(bob.rank, 1);
        assert_eq!(bob.username, "Bob & Co");
        assert_eq!(bob.user_title, "Well-known member");
        assert_eq!(bob.post_count, 12345);
        assert_eq!(bob.media_count, 1002);
        assert_eq!(
            bob.avatar_url,
            "https://forum.example.com/data/avatars/s/0/2.jpg?1700000000"
        );
        let carol = &records[1];
        assert_eq!(carol.rank, 2);
        assert_eq!(carol.username, "Carol");
        assert_eq!(carol.post_count, 9999);
        assert_eq!(carol.media_count, 0);
        assert_eq!(carol.avatar_url, "https://cdn.example.net/avatars/3.png");
    }

    #[test]
    fn incomplete_blocks_do_not_take_a_rank() {
        let html = r#"
<div class="block-row"><span class="username">NoPosts</span></div>
<div class="block-row">Posts: 10</div>
<div class="block-row"><span class="username">Dave</span>Posts: 50</div>
<div class="block-row"><span class="username">Eve</span>Posts: 40 Media: 3</div>"#;
        let records = extract(html);
        assert_eq!(
            records.iter().map(|r| (r.rank, &r.username[..])).collect_vec(),
            [(1, "Dave"), (2, "Eve")]
        );
        assert_eq!(records[1].media_count, 3);
    }

    #[test]
    fn duplicated_users_are_dropped() {
        let html = r#"
<div class="block-row"><span class="username">Dave</span>Posts: 50</div>
<div class="block-row"><span class="username">Dave</span>Posts: 49</div>
<div class="block-row"><span class="username">Eve</span>Posts: 40</div>"#;
        let records = extract(html);
        assert_eq!(
            records.iter().map(|r| (r.rank, &r.username[..], r.post_count)).collect_vec(),
            [(1, "Dave", 50), (2, "Eve", 40)]
        );
    }

    #[test]
    fn capped_at_one_hundred() {
        let html = (0..150)
            .map(|i| {
                format!(
                    r#"<div class="block-row"><span class="username">user{i}</span>Posts: {}</div>"#,
                    1000 - i
                )
            })
            .join("\n");
        let records = extract(&html);
        assert_eq!(records.len(), 100);
        assert!(records
            .iter()
            .enumerate()
            .all(|(i, r)| r.rank as usize == i + 1));
        assert_eq!(
            records.iter().map(|r| &r.username).collect::<HashSet<_>>().len(),
            100
        );
        assert_eq!(records[99].username, "user99");
    }

    #[test]
    fn nothing_to_extract() {
        assert!(extract("<html><body>Maintenance</body></html>").is_empty());
        assert!(split_blocks("<div class=\"block-rows\">x</div>").is_empty());
    }

    #[test]
    fn blocks_are_cut_at_each_row() {
        let html = r#"<li class="block-row"><div>a</div></li><li class="x block-row y">b</li>"#;
        assert_eq!(
            split_blocks(html),
            [
                r#"<li class="block-row"><div>a</div></li>"#,
                r#"<li class="x block-row y">b</li>"#
            ]
        );
    }

    #[test]
    fn avatar_normalization() {
        let origin = Url::parse("https://forum.example.com/").unwrap();
        assert_eq!(
            normalize_avatar_url("/data/avatars/1.jpg", &origin),
            "https://forum.example.com/data/avatars/1.jpg"
        );
        assert_eq!(
            normalize_avatar_url("//cdn.example/1.jpg", &origin),
            "https://cdn.example/1.jpg"
        );
        assert_eq!(
            normalize_avatar_url("https://other.example/1.jpg", &origin),
            "https://other.example/1.jpg"
        );
        assert_eq!(normalize_avatar_url("", &origin), "");
    }

    #[test]
    fn login_page_detection() {
        let login = r#"<form action="/login/login" method="post" class="block"><input type="password" name="password" /></form>"#;
        assert!(looks_like_login_page(login));
        assert!(!looks_like_login_page(
            r#"<form action="/login/login"><input type="text" /></form>"#
        ));
        assert!(!looks_like_login_page(
            r#"<div class="block-row"><span class="username">Alice</span>Posts: 1</div>"#
        ));
    }
}
