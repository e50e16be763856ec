use chrono::{DateTime, Utc};
use serde_json::Value;
use url::Url;

use crate::domain::RawPost;
use crate::scraper::ScraperConfig;

/// Builds the in-page extraction script and turns its output into posts
pub struct PostExtractor {
    config: ScraperConfig,
}

impl PostExtractor {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    /// Generate JavaScript that collects `{author, content, link, time}`
    /// for every post element on the page
    pub fn extraction_script(&self) -> String {
        let post_selector = js_string(&self.config.post_selector);
        let author_selector = js_string(&self.config.author_selector);
        let content_selector = js_string(&self.config.content_selector);
        let permalink_selector = js_string(&self.config.permalink_selector);

        format!(
            r#"
            (() => {{
                const posts = [];
                document.querySelectorAll({post_selector}).forEach(elem => {{
                    const authorEl = elem.querySelector({author_selector});
                    const author = authorEl ? authorEl.textContent.trim() : '';

                    let content = '';
                    for (const div of elem.querySelectorAll({content_selector})) {{
                        const text = div.textContent.trim();
                        // Skip the author line and bare dates like "12 March"
                        if (text && text !== author && !/^\d{{1,2}} [A-Za-z]+$/.test(text)) {{
                            content = text;
                            break;
                        }}
                    }}

                    const linkEl = elem.querySelector({permalink_selector});
                    const time = linkEl ? linkEl.textContent.trim() : '';
                    const link = linkEl ? (linkEl.getAttribute('href') || '') : '';

                    posts.push({{ author, content, link, time }});
                }});
                return posts;
            }})()
            "#
        )
    }

    /// Script scrolling to the bottom so lazily loaded posts render
    pub fn scroll_script(&self) -> &'static str {
        "window.scrollTo({ top: document.body.scrollHeight, behavior: 'instant' }); true"
    }

    /// Convert the extraction script's result into posts.
    ///
    /// Anything other than an array yields no posts; missing or non-string
    /// fields become empty strings.
    pub fn parse_records(&self, value: &Value, now: DateTime<Utc>) -> Vec<RawPost> {
        let Some(records) = value.as_array() else {
            return Vec::new();
        };

        records
            .iter()
            .map(|record| {
                let field = |name: &str| record[name].as_str().unwrap_or("").trim().to_string();
                self.build_post(field("author"), field("content"), &field("link"), field("time"), now)
            })
            .collect()
    }

    fn build_post(
        &self,
        author: String,
        content: String,
        raw_link: &str,
        label: String,
        now: DateTime<Utc>,
    ) -> RawPost {
        let link = self.absolutize_link(raw_link);
        let id = self
            .post_id_from_link(&link)
            .unwrap_or_else(|| RawPost::content_hash_id(&author, &content));
        let timestamp = label_to_timestamp(&label, now);

        RawPost {
            id,
            author,
            content,
            link,
            recency_label: label,
            timestamp,
        }
    }

    /// Resolve a relative permalink against the configured base URL
    pub fn absolutize_link(&self, link: &str) -> String {
        if link.is_empty() {
            return String::new();
        }
        if let Ok(url) = Url::parse(link) {
            return url.to_string();
        }
        Url::parse(&self.config.base_url)
            .and_then(|base| base.join(link))
            .map(|url| url.to_string())
            .unwrap_or_else(|_| link.to_string())
    }

    /// The path segment following the permalink marker, if any
    pub fn post_id_from_link(&self, link: &str) -> Option<String> {
        let marker = self.config.permalink_marker.as_str();
        if marker.is_empty() {
            return None;
        }
        let start = link.find(marker)? + marker.len();
        let id: String = link[start..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect();
        (!id.is_empty()).then_some(id)
    }
}

/// Turn a relative label like "5m", "3h" or "2d" into epoch milliseconds.
pub fn label_to_timestamp(label: &str, now: DateTime<Utc>) -> Option<i64> {
    let label = label.trim().to_lowercase();
    let (amount, unit_ms): (&str, i64) = if let Some(minutes) = label.strip_suffix('m') {
        (minutes, 60_000)
    } else if let Some(hours) = label.strip_suffix('h') {
        (hours, 3_600_000)
    } else if let Some(days) = label.strip_suffix('d') {
        (days, 86_400_000)
    } else {
        return None;
    };

    let amount: i64 = amount.trim().parse().ok()?;
    if amount < 0 {
        return None;
    }
    // Oversized labels give no timestamp rather than a wrapped one
    amount
        .checked_mul(unit_ms)
        .and_then(|ago| now.timestamp_millis().checked_sub(ago))
}

fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "''".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn extractor() -> PostExtractor {
        PostExtractor::new(ScraperConfig::default())
    }

    #[test]
    fn test_extraction_script_generation() {
        let script = extractor().extraction_script();
        assert!(script.contains(r#""div[role=\"article\"]""#));
        assert!(script.contains(r#""a[aria-label][href*=\"/posts/\"]""#));
        assert!(script.contains("posts.push"));
    }

    #[test]
    fn test_post_id_from_link() {
        let ex = extractor();
        assert_eq!(
            ex.post_id_from_link("https://www.facebook.com/groups/9/posts/12345/?comment_id=1"),
            Some("12345".to_string())
        );
        assert_eq!(
            ex.post_id_from_link("https://www.facebook.com/page/posts/pfbid02abc"),
            Some("pfbid02abc".to_string())
        );
        assert_eq!(ex.post_id_from_link("https://www.facebook.com/photo?id=1"), None);
        assert_eq!(ex.post_id_from_link("https://www.facebook.com/posts/"), None);
    }

    #[test]
    fn test_absolutize_link() {
        let ex = extractor();
        assert_eq!(
            ex.absolutize_link("/groups/9/posts/1"),
            "https://www.facebook.com/groups/9/posts/1"
        );
        assert_eq!(
            ex.absolutize_link("https://m.facebook.com/posts/1"),
            "https://m.facebook.com/posts/1"
        );
        assert_eq!(ex.absolutize_link(""), "");
    }

    #[test]
    fn test_label_to_timestamp() {
        let t = now().timestamp_millis();
        assert_eq!(label_to_timestamp("5m", now()), Some(t - 5 * 60_000));
        assert_eq!(label_to_timestamp("3h", now()), Some(t - 3 * 3_600_000));
        assert_eq!(label_to_timestamp("2d", now()), Some(t - 2 * 86_400_000));
        assert_eq!(label_to_timestamp(" 1H ", now()), Some(t - 3_600_000));
        assert_eq!(label_to_timestamp("Just now", now()), None);
        assert_eq!(label_to_timestamp("12 March", now()), None);
        assert_eq!(label_to_timestamp("m", now()), None);
        assert_eq!(label_to_timestamp("", now()), None);
    }

    #[test]
    fn test_parse_records() {
        let value = json!([
            {
                "author": "Alice",
                "content": "Selling a bike",
                "link": "/groups/9/posts/111/",
                "time": "3m"
            },
            {
                "author": "Bob",
                "content": "No permalink here",
                "link": "",
                "time": "1h"
            }
        ]);

        let posts = extractor().parse_records(&value, now());
        assert_eq!(posts.len(), 2);

        assert_eq!(posts[0].id, "111");
        assert_eq!(posts[0].link, "https://www.facebook.com/groups/9/posts/111/");
        assert_eq!(posts[0].recency_label, "3m");
        assert_eq!(posts[0].timestamp, Some(now().timestamp_millis() - 3 * 60_000));

        assert_eq!(posts[1].id, RawPost::content_hash_id("Bob", "No permalink here"));
        assert_eq!(posts[1].link, "");
    }

    #[test]
    fn test_parse_records_malformed_fields_default_to_empty() {
        let value = json!([{ "author": null, "content": 42 }]);
        let posts = extractor().parse_records(&value, now());
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "");
        assert_eq!(posts[0].author, "");
        assert_eq!(posts[0].recency_label, "");
        assert_eq!(posts[0].timestamp, None);
    }

    #[test]
    fn test_parse_records_non_array() {
        assert!(extractor().parse_records(&json!(null), now()).is_empty());
        assert!(extractor().parse_records(&json!({"posts": []}), now()).is_empty());
    }

    #[test]
    fn test_oversized_label_has_no_timestamp() {
        assert_eq!(label_to_timestamp("999999999999999m", now()), None);
        assert_eq!(label_to_timestamp("9223372036854775807d", now()), None);

        let value = json!([{ "link": "/groups/1/posts/9", "time": "999999999999999m" }]);
        let posts = extractor().parse_records(&value, now());
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "9");
        assert_eq!(posts[0].timestamp, None);
    }
}
