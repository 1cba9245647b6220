//! Record extraction from page units.
//!
//! Rendered listing pages and the JSON API expose the same logical fields
//! under different shapes, so each path has its own fallback chains:
//!
//! | field     | rendered HTML                                  | JSON API                     |
//! |-----------|------------------------------------------------|------------------------------|
//! | name      | `data-player_name` → `img[alt]` → href slug    | `title` → `path` slug        |
//! | player_id | last href segment → `data-player_id`           | `nid` → last `path` segment  |
//! | image_url | `img[src]` → `img[data-src]`                   | `image`                      |
//!
//! Candidates without a resolvable name are dropped.

use std::sync::LazyLock;

use harvest_common::PlayerRecord;
use player_api_client::{PlayerItem, PlayersPage};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Anchors the listing page renders for each player card.
pub const PLAYER_ANCHOR_SELECTOR: &str = r#"a[onclick="click_player(this)"]"#;

static PLAYER_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(PLAYER_ANCHOR_SELECTOR).expect("valid selector"));
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").expect("valid selector"));

// --- Page units ---

/// One fetched or rendered increment of source content.
#[derive(Debug, Clone)]
pub enum PageUnit {
    /// Rendered DOM snapshot of the listing page.
    Html(String),
    /// One decoded page of the players API.
    Api(PlayersPage),
}

impl PageUnit {
    pub fn extract(&self, base: &Url) -> Vec<PlayerRecord> {
        match self {
            PageUnit::Html(html) => extract_from_html(html, base),
            PageUnit::Api(page) => extract_from_api(page, base),
        }
    }
}

// --- URL helpers ---

/// Resolve a raw link against `base`, returning an absolute http(s) URL with
/// the fragment stripped. Empty, unresolvable or non-http input yields `None`.
pub fn resolve_url(raw: &str, base: &Url) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let mut parsed = if raw.starts_with("http://") || raw.starts_with("https://") {
        Url::parse(raw).ok()?
    } else {
        base.join(raw).ok()?
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed.set_fragment(None);
    Some(parsed.to_string())
}

/// Last non-empty path segment of an absolute link.
pub fn player_id_from_link(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

/// Human name derived from the link slug: `/players/virat-kohli` → `Virat Kohli`.
/// Segments with no letters (numeric ids) are not names.
pub fn name_from_slug(link: &str) -> Option<String> {
    let slug = player_id_from_link(link)?;
    if !slug.chars().any(char::is_alphabetic) {
        return None;
    }
    let name = slug
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");
    Some(name).filter(|n| !n.is_empty())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// --- Rendered HTML ---

/// Extract candidate records from a rendered listing page, in document order.
pub fn extract_from_html(html: &str, base: &Url) -> Vec<PlayerRecord> {
    let document = Html::parse_document(html);
    document
        .select(&PLAYER_ANCHOR)
        .filter_map(|anchor| record_from_anchor(anchor, base))
        .collect()
}

fn record_from_anchor(anchor: ElementRef, base: &Url) -> Option<PlayerRecord> {
    let attrs = anchor.value();
    let img = anchor.select(&IMG).next();
    let alt = img.and_then(|i| non_empty(i.value().attr("alt")));
    let link = attrs.attr("href").and_then(|href| resolve_url(href, base));

    let name = non_empty(attrs.attr("data-player_name"))
        .or(alt)
        .map(str::to_string)
        .or_else(|| link.as_deref().and_then(name_from_slug));
    let Some(name) = name else {
        debug!(href = attrs.attr("href").unwrap_or(""), "Skipping player anchor without a name");
        return None;
    };

    let player_id = link
        .as_deref()
        .and_then(player_id_from_link)
        .or_else(|| non_empty(attrs.attr("data-player_id")).map(str::to_string));

    let image_url = img.and_then(|i| {
        non_empty(i.value().attr("src"))
            .or_else(|| non_empty(i.value().attr("data-src")))
            .and_then(|src| resolve_url(src, base))
    });

    let mut record = PlayerRecord::new(name);
    record.link = link;
    record.player_id = player_id;
    record.image_url = image_url;
    record.alt_text = alt.map(str::to_string);
    record.extra = attrs
        .attrs()
        .filter(|(key, _)| key.starts_with("data-"))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    Some(record)
}

// --- JSON API ---

/// Extract candidate records from one API page, in item order.
pub fn extract_from_api(page: &PlayersPage, base: &Url) -> Vec<PlayerRecord> {
    page.players
        .iter()
        .filter_map(|item| record_from_item(item, base))
        .collect()
}

fn record_from_item(item: &PlayerItem, base: &Url) -> Option<PlayerRecord> {
    let link = item.path.as_deref().and_then(|path| resolve_url(path, base));

    let name = non_empty(item.title.as_deref())
        .map(str::to_string)
        .or_else(|| link.as_deref().and_then(name_from_slug));
    let Some(name) = name else {
        debug!(nid = ?item.nid, "Skipping API item without a name");
        return None;
    };

    let mut record = PlayerRecord::new(name);
    record.player_id = item
        .nid_string()
        .or_else(|| link.as_deref().and_then(player_id_from_link));
    record.link = link;
    record.image_url = item
        .image
        .as_deref()
        .and_then(|src| resolve_url(src, base));
    record.extra = item
        .extra
        .iter()
        .filter_map(|(key, value)| scalar_string(value).map(|v| (key.clone(), v)))
        .collect();
    Some(record)
}

/// Scalars only; nested objects and arrays do not fit a flat record.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.bcci.tv").unwrap()
    }

    // --- URL helpers ---

    #[test]
    fn relative_urls_resolve_against_base() {
        assert_eq!(
            resolve_url("/players/virat-kohli", &base()).as_deref(),
            Some("https://www.bcci.tv/players/virat-kohli")
        );
        assert_eq!(
            resolve_url("//cdn.bcci.tv/img/1.png", &base()).as_deref(),
            Some("https://cdn.bcci.tv/img/1.png")
        );
    }

    #[test]
    fn absolute_urls_are_kept_without_fragment() {
        assert_eq!(
            resolve_url("  https://img.example.com/a.png#top ", &base()).as_deref(),
            Some("https://img.example.com/a.png")
        );
    }

    #[test]
    fn non_http_schemes_are_rejected() {
        assert_eq!(resolve_url("javascript:void(0)", &base()), None);
        assert_eq!(resolve_url("mailto:team@bcci.tv", &base()), None);
        assert_eq!(resolve_url("data:image/png;base64,AAAA", &base()), None);
    }

    #[test]
    fn script_href_falls_back_to_data_player_id() {
        let html = r#"<a href="javascript:void(0)" onclick="click_player(this)"
                        data-player_name="Rinku Singh" data-player_id="5087"></a>"#;
        let records = extract_from_html(html, &base());
        assert_eq!(records[0].link, None);
        assert_eq!(records[0].player_id.as_deref(), Some("5087"));
    }

    #[test]
    fn empty_url_is_none() {
        assert_eq!(resolve_url("   ", &base()), None);
    }

    #[test]
    fn player_id_ignores_trailing_slash() {
        assert_eq!(
            player_id_from_link("https://www.bcci.tv/players/164/").as_deref(),
            Some("164")
        );
        assert_eq!(player_id_from_link("https://www.bcci.tv/"), None);
    }

    #[test]
    fn slug_becomes_title_cased_name() {
        assert_eq!(
            name_from_slug("https://www.bcci.tv/players/virat-kohli").as_deref(),
            Some("Virat Kohli")
        );
        assert_eq!(
            name_from_slug("https://www.bcci.tv/players/ravindra_jadeja/").as_deref(),
            Some("Ravindra Jadeja")
        );
        assert_eq!(name_from_slug("https://www.bcci.tv/players/164"), None);
    }

    // --- HTML ---

    #[test]
    fn anchor_with_all_fields() {
        let html = r#"
            <div class="players">
              <a href="/international/men/players/virat-kohli/164" onclick="click_player(this)"
                 data-player_name=" Virat Kohli " data-player_role="Batter">
                <img src="/images/164.png" alt="Virat Kohli Portrait">
              </a>
            </div>
        "#;
        let records = extract_from_html(html, &base());
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.name, "Virat Kohli");
        assert_eq!(
            r.link.as_deref(),
            Some("https://www.bcci.tv/international/men/players/virat-kohli/164")
        );
        assert_eq!(r.player_id.as_deref(), Some("164"));
        assert_eq!(r.image_url.as_deref(), Some("https://www.bcci.tv/images/164.png"));
        assert_eq!(r.alt_text.as_deref(), Some("Virat Kohli Portrait"));
        assert_eq!(r.extra.get("data-player_role").map(String::as_str), Some("Batter"));
        assert!(r.extra.contains_key("data-player_name"));
        assert!(!r.extra.contains_key("onclick"));
    }

    #[test]
    fn name_falls_back_to_image_alt() {
        let html = r#"<a href="/p/11" onclick="click_player(this)"><img src="a.png" alt="Rishabh Pant"></a>"#;
        let records = extract_from_html(html, &base());
        assert_eq!(records[0].name, "Rishabh Pant");
    }

    #[test]
    fn name_falls_back_to_href_slug() {
        let html = r#"<a href="/players/hardik-pandya" onclick="click_player(this)"><img src="a.png"></a>"#;
        let records = extract_from_html(html, &base());
        assert_eq!(records[0].name, "Hardik Pandya");
        assert_eq!(records[0].alt_text, None);
    }

    #[test]
    fn anchor_without_any_name_is_dropped() {
        let html = r#"
            <a href="/players/42" onclick="click_player(this)"><img src="a.png" alt="  "></a>
            <a onclick="click_player(this)" data-player_name="">No link</a>
            <a href="/players/axar-patel" onclick="click_player(this)" data-player_name="Axar Patel"></a>
        "#;
        let records = extract_from_html(html, &base());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Axar Patel");
    }

    #[test]
    fn player_id_falls_back_to_data_attribute() {
        let html = r#"<a onclick="click_player(this)" data-player_name="Mohammed Siraj" data-player_id="3840"></a>"#;
        let records = extract_from_html(html, &base());
        assert_eq!(records[0].link, None);
        assert_eq!(records[0].player_id.as_deref(), Some("3840"));
    }

    #[test]
    fn lazy_image_source_is_used() {
        let html = r#"<a onclick="click_player(this)" data-player_name="Kuldeep Yadav"><img data-src="/lazy/k.png"></a>"#;
        let records = extract_from_html(html, &base());
        assert_eq!(records[0].image_url.as_deref(), Some("https://www.bcci.tv/lazy/k.png"));
    }

    #[test]
    fn unrelated_anchors_are_ignored() {
        let html = r#"<a href="/news/1">News</a><a href="/p/1" onclick="other()">Other</a>"#;
        assert!(extract_from_html(html, &base()).is_empty());
    }

    // --- API ---

    fn api_page(json: &str) -> PlayersPage {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn api_item_fields_map_to_record() {
        let page = api_page(
            r#"{"players": [{"title": "Shubman Gill", "nid": 3761, "path": "/players/shubman-gill",
                "image": "/img/gill.png", "team": "India", "tags": ["a"]}], "has_more": false}"#,
        );
        let records = extract_from_api(&page, &base());
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.name, "Shubman Gill");
        assert_eq!(r.player_id.as_deref(), Some("3761"));
        assert_eq!(r.link.as_deref(), Some("https://www.bcci.tv/players/shubman-gill"));
        assert_eq!(r.image_url.as_deref(), Some("https://www.bcci.tv/img/gill.png"));
        assert_eq!(r.extra.get("team").map(String::as_str), Some("India"));
        assert!(!r.extra.contains_key("tags"));
    }

    #[test]
    fn api_fallbacks_use_path() {
        let page = api_page(r#"{"players": [{"path": "/players/yashasvi-jaiswal/4470"}, {"title": "", "path": "/players/99"}]}"#);
        // numeric last segments are ids, not slugs
        assert!(extract_from_api(&page, &base()).is_empty());

        let page = api_page(r#"{"players": [{"title": " ", "path": "/players/yashasvi-jaiswal"}]}"#);
        let records = extract_from_api(&page, &base());
        assert_eq!(records[0].name, "Yashasvi Jaiswal");
        assert_eq!(records[0].player_id.as_deref(), Some("yashasvi-jaiswal"));
    }

    #[test]
    fn page_unit_dispatches_by_shape() {
        let html = PageUnit::Html(r#"<a onclick="click_player(this)" data-player_name="A"></a>"#.into());
        let api = PageUnit::Api(api_page(r#"{"players": [{"title": "B"}]}"#));
        assert_eq!(html.extract(&base())[0].name, "A");
        assert_eq!(api.extract(&base())[0].name, "B");
    }
}
