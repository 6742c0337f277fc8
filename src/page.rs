const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");
const TRANSLATED_SLOT: &str = "{{translated}}";

/// Renders the translator page around an optional translation result
#[derive(Debug, Clone)]
pub struct IndexPage {
    template: String,
}

impl Default for IndexPage {
    fn default() -> Self {
        Self::new(INDEX_TEMPLATE)
    }
}

impl IndexPage {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn render(&self, translated_text: Option<&str>) -> String {
        let block = match translated_text {
            Some(text) => format!(
                "<section><h2>Translation</h2><p id=\"translatedText\">{}</p></section>",
                escape_html(text)
            ),
            None => String::new(),
        };
        self.template.replace(TRANSLATED_SLOT, &block)
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
