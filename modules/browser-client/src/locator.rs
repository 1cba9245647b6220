use std::fmt;

/// How to find an element on the live page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Standard CSS selector, first match wins.
    Css(String),
    /// First `tag` element whose text content contains `text`.
    Text { tag: String, text: String },
}

impl Locator {
    pub fn css(selector: &str) -> Self {
        Locator::Css(selector.to_string())
    }

    pub fn text(tag: &str, text: &str) -> Self {
        Locator::Text {
            tag: tag.to_string(),
            text: text.to_string(),
        }
    }

    /// JS expression that evaluates to the located element or `null`.
    pub(crate) fn element_expr(&self) -> String {
        match self {
            Locator::Css(selector) => {
                format!("document.querySelector({})", js_string(selector))
            }
            Locator::Text { tag, text } => format!(
                "Array.from(document.getElementsByTagName({})).find(el => (el.textContent || '').includes({})) || null",
                js_string(tag),
                js_string(text)
            ),
        }
    }

    /// Script returning `true` when the element exists and is rendered.
    pub(crate) fn visibility_script(&self) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return false; \
             const style = window.getComputedStyle(el); \
             if (style.visibility === 'hidden' || style.display === 'none') return false; \
             return !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length); }})()",
            self.element_expr()
        )
    }

    /// Script that scrolls the element into view and clicks it. Returns
    /// `false` when the element has disappeared.
    pub(crate) fn click_script(&self) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return false; \
             el.scrollIntoView(true); el.click(); return true; }})()",
            self.element_expr()
        )
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "css:{selector}"),
            Locator::Text { tag, text } => write!(f, "text:{tag}[{text}]"),
        }
    }
}

/// Script counting elements that match a CSS selector.
pub(crate) fn count_script(selector: &str) -> String {
    format!("document.querySelectorAll({}).length", js_string(selector))
}

/// Quote a value as a JS string literal. JSON string syntax is valid JS.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_selector_is_quoted() {
        let expr = Locator::css("button[onclick*='load']").element_expr();
        assert_eq!(expr, r#"document.querySelector("button[onclick*='load']")"#);
    }

    #[test]
    fn text_locator_escapes_quotes() {
        let expr = Locator::text("a", r#"Load "More""#).element_expr();
        assert!(expr.contains(r#"getElementsByTagName("a")"#));
        assert!(expr.contains(r#"includes("Load \"More\"")"#));
    }

    #[test]
    fn count_script_uses_query_selector_all() {
        assert_eq!(
            count_script(r#"a[onclick="click_player(this)"]"#),
            r#"document.querySelectorAll("a[onclick=\"click_player(this)\"]").length"#
        );
    }

    #[test]
    fn display_names_the_strategy() {
        assert_eq!(Locator::css("#load-more").to_string(), "css:#load-more");
        assert_eq!(Locator::text("button", "Load More").to_string(), "text:button[Load More]");
    }
}
