//! Structural (HTML) Feature Extraction
//!
//! Tag counts and link ratios over fetched markup. html5ever recovers from
//! malformed markup, so every input yields a feature set; an empty document
//! yields all zeros.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

use super::record::UrlRecord;
use super::url::ratio;
use super::vector::{FeatureExtractor, FeatureSet};

/// Names written by [`HtmlFeatures`]
pub const HTML_FEATURES: &[&str] = &[
    "iframe_count",
    "num_img_tags",
    "num_script_tags",
    "num_meta_tags",
    "has_favicon",
    "num_external_links",
    "PctExtHyperlinks",
    "PctExtResourceUrls",
    "PctExtNullSelfRedirectHyperlinks",
    "eval_present",
    "base64_scripts",
    "has_title",
    "MissingTitle",
    "ImagesOnlyInForm",
    "RelativeFormAction",
    "ExtFormAction",
    "AbnormalFormAction",
];

/// `href` values that go nowhere
const NULL_SELF_TARGETS: &[&str] = &["#", "/", "", "javascript:void(0)", "javascript:;"];

/// Elements whose text is never visible
const HIDDEN_TEXT_PARENTS: &[&str] = &["script", "style", "noscript", "template"];

// Selectors are compile-time constants; parse() only fails on invalid syntax.
static IFRAME: Lazy<Selector> = Lazy::new(|| selector("iframe"));
static IMG: Lazy<Selector> = Lazy::new(|| selector("img"));
static SCRIPT: Lazy<Selector> = Lazy::new(|| selector("script"));
static META: Lazy<Selector> = Lazy::new(|| selector("meta"));
static LINK_REL: Lazy<Selector> = Lazy::new(|| selector("link[rel]"));
static ANCHOR_HREF: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static RESOURCES: Lazy<Selector> = Lazy::new(|| selector("img, script, link"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static FORM: Lazy<Selector> = Lazy::new(|| selector("form"));
static INPUT: Lazy<Selector> = Lazy::new(|| selector("input"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid static selector")
}

fn is_external(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

// ============================================================================
// VISIBLE TEXT
// ============================================================================

/// Text nodes outside script/style/noscript/template, joined with one space
pub fn visible_text(markup: &str) -> String {
    if markup.is_empty() {
        return String::new();
    }

    let document = Html::parse_document(markup);
    let mut parts: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node.ancestors().any(|a| match a.value() {
                Node::Element(el) => HIDDEN_TEXT_PARENTS.contains(&el.name()),
                _ => false,
            });
            if !hidden {
                parts.push(&**text);
            }
        }
    }

    parts.join(" ")
}

// ============================================================================
// STRUCTURAL ANALYSIS
// ============================================================================

/// Structural counts of one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HtmlStats {
    /// False for empty markup
    pub document: bool,
    pub iframes: usize,
    pub images: usize,
    pub scripts: usize,
    pub metas: usize,
    pub has_favicon: bool,
    pub anchors: usize,
    pub external_anchors: usize,
    pub null_self_anchors: usize,
    pub resources: usize,
    pub external_resources: usize,
    pub eval_present: bool,
    pub base64_scripts: usize,
    pub has_title: bool,
    pub images_only_forms: usize,
    pub relative_form_actions: usize,
    pub external_form_actions: usize,
    pub abnormal_form_actions: usize,
}

impl HtmlStats {
    pub fn analyze(markup: &str) -> Self {
        if markup.is_empty() {
            return Self::default();
        }

        let document = Html::parse_document(markup);
        let mut stats = Self {
            document: true,
            iframes: document.select(&IFRAME).count(),
            images: document.select(&IMG).count(),
            scripts: document.select(&SCRIPT).count(),
            metas: document.select(&META).count(),
            has_favicon: document.select(&LINK_REL).any(is_favicon),
            eval_present: markup.contains("eval("),
            base64_scripts: markup.matches("eval(").count() + markup.matches("base64,").count(),
            has_title: document
                .select(&TITLE)
                .next()
                .map(|t| !t.text().collect::<String>().is_empty())
                .unwrap_or(false),
            ..Self::default()
        };

        for anchor in document.select(&ANCHOR_HREF) {
            let href = anchor.value().attr("href").unwrap_or("").trim();
            stats.anchors += 1;
            if is_external(href) {
                stats.external_anchors += 1;
            }
            if NULL_SELF_TARGETS.contains(&href) {
                stats.null_self_anchors += 1;
            }
        }

        for tag in document.select(&RESOURCES) {
            stats.resources += 1;
            if tag.value().attr("src").map(is_external).unwrap_or(false) {
                stats.external_resources += 1;
            }
        }

        for form in document.select(&FORM) {
            stats.classify_form(form);
        }

        stats
    }

    fn classify_form(&mut self, form: ElementRef<'_>) {
        let inputs: Vec<ElementRef<'_>> = form.select(&INPUT).collect();
        let only_images = inputs
            .iter()
            .filter_map(|i| i.value().attr("type"))
            .all(|t| t == "image");
        if only_images && !inputs.is_empty() {
            self.images_only_forms += 1;
        }

        let action = form.value().attr("action").unwrap_or("").trim();
        if action.starts_with('/') {
            self.relative_form_actions += 1;
        } else if is_external(action) {
            self.external_form_actions += 1;
        } else if action.is_empty()
            || action.contains('?')
            || action.to_lowercase().contains("javascript")
        {
            self.abnormal_form_actions += 1;
        }
    }

    pub fn write(&self, out: &mut FeatureSet) {
        out.insert_count("iframe_count", self.iframes);
        out.insert_count("num_img_tags", self.images);
        out.insert_count("num_script_tags", self.scripts);
        out.insert_count("num_meta_tags", self.metas);
        out.insert_flag("has_favicon", self.has_favicon);
        out.insert_count("num_external_links", self.external_anchors);
        out.insert("PctExtHyperlinks", ratio(self.external_anchors, self.anchors.max(1)) as f32);
        out.insert(
            "PctExtResourceUrls",
            ratio(self.external_resources, self.resources.max(1)) as f32,
        );
        out.insert(
            "PctExtNullSelfRedirectHyperlinks",
            ratio(self.null_self_anchors, self.anchors.max(1)) as f32,
        );
        out.insert_flag("eval_present", self.eval_present);
        out.insert_count("base64_scripts", self.base64_scripts);
        out.insert_flag("has_title", self.has_title);
        out.insert_flag("MissingTitle", self.document && !self.has_title);
        out.insert_count("ImagesOnlyInForm", self.images_only_forms);
        out.insert_count("RelativeFormAction", self.relative_form_actions);
        out.insert_count("ExtFormAction", self.external_form_actions);
        out.insert_count("AbnormalFormAction", self.abnormal_form_actions);
    }
}

fn is_favicon(link: ElementRef<'_>) -> bool {
    link.value()
        .attr("rel")
        .map(|rel| rel.split_ascii_whitespace().any(|t| t.eq_ignore_ascii_case("icon")))
        .unwrap_or(false)
}

// ============================================================================
// EXTRACTOR
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlFeatures;

impl FeatureExtractor for HtmlFeatures {
    fn id(&self) -> &'static str {
        "html"
    }

    fn feature_names(&self) -> Vec<String> {
        HTML_FEATURES.iter().map(|s| s.to_string()).collect()
    }

    fn requires_content(&self) -> bool {
        true
    }

    fn extract(&self, record: &UrlRecord, out: &mut FeatureSet) {
        HtmlStats::analyze(record.content().unwrap_or("")).write(out);
    }
}

// ============================================================================
// TESTS
// ============================================================================
