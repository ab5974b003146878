//! Integration Tests for Feature Extraction Modules
//!
//! Kiểm tra các feature extractor hoạt động đúng khi kết hợp với nhau.
//! Every case runs through the full schema of the shipped classifier.

#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;

    use crate::logic::features::{
        assembler::FeaturePipeline,
        html::HTML_FEATURES,
        keywords::KeywordLists,
        layout::{FeatureSchema, SELECTED_FEATURES},
        record::UrlRecord,
        text::TEXT_FEATURES,
        tfidf::{LexicalVocabulary, TFIDF_PREFIX},
        trust::TrustedDomainSet,
        url::URL_FEATURES,
    };
    use crate::logic::fetch::{ContentFetcher, StaticFetcher};

    /// Vocabulary containing every `tfidf_*` term of the shipped schema
    fn shipped_vocabulary() -> LexicalVocabulary {
        let terms: Vec<&str> = SELECTED_FEATURES
            .iter()
            .filter_map(|n| n.strip_prefix(TFIDF_PREFIX))
            .collect();
        let doc = terms.join(" ");
        LexicalVocabulary::fit([doc.as_str(), "unrelated filler words"], 300)
    }

    fn pipeline(trusted: &[&str]) -> FeaturePipeline {
        FeaturePipeline::new(
            Arc::new(FeatureSchema::selected()),
            Arc::new(TrustedDomainSet::new(trusted).unwrap()),
            Arc::new(shipped_vocabulary()),
            Arc::new(KeywordLists::default()),
        )
        .unwrap()
    }

    fn record(fetcher: &dyn ContentFetcher, url: &str) -> UrlRecord {
        let record = UrlRecord::new(url).unwrap();
        let content = fetcher.fetch(record.url());
        record.with_content(content)
    }

    fn is_content_feature(name: &str) -> bool {
        name.starts_with(TFIDF_PREFIX) || HTML_FEATURES.contains(&name) || TEXT_FEATURES.contains(&name)
    }

    const PAGE: &str = r#"<html><head><title>Login</title><link rel="icon" href="/favicon.ico"></head>
        <body><p>Read the latest news and privacy policy</p><a href="/home">Home</a></body></html>"#;

    #[test]
    fn test_shipped_schema_is_producible() {
        let p = pipeline(&[]);
        assert_eq!(p.schema().len(), SELECTED_FEATURES.len());
        for name in URL_FEATURES.iter().filter(|n| SELECTED_FEATURES.contains(n)) {
            assert!(p.schema().index_of(name).is_some());
        }
    }

    /// Known brand on its own domain, page with a favicon
    #[test]
    fn test_trusted_site_with_favicon() {
        let url = "https://example-trusted.com/login";
        let p = pipeline(&["example-trusted.com"]);
        let v = p.extract(&record(&StaticFetcher::with_page(url, PAGE), url));
        let s = p.schema();

        assert_eq!(v.get_by_name(s, "is_known_brand"), Some(1.0));
        assert_eq!(v.get_by_name(s, "brand_domain_mismatch"), Some(0.0));
        assert_eq!(v.get_by_name(s, "has_favicon"), Some(1.0));
        assert!(v.get_by_name(s, "tfidf_news").unwrap() > 0.0);
        assert!(v.get_by_name(s, "text_length").unwrap() > 0.0);
    }

    /// Brand name on somebody else's registrable domain
    #[test]
    fn test_brand_impersonation() {
        let url = "http://paypal-secure-login.verify-account.ru";
        let p = pipeline(&["paypal", "paypal.com"]);
        let v = p.extract(&record(&StaticFetcher::default(), url));
        let s = p.schema();

        assert_eq!(v.get_by_name(s, "brand_in_path"), Some(1.0));
        assert_eq!(v.get_by_name(s, "is_known_brand"), Some(0.0));
        assert_eq!(v.get_by_name(s, "brand_domain_mismatch"), Some(1.0));
        assert_eq!(v.get_by_name(s, "prefix_suffix_in_domain"), Some(1.0));
        assert_eq!(v.get_by_name(s, "NoHttps"), Some(1.0));
    }

    /// Fetch failure: content slots at 0, URL and trust slots still computed
    #[test]
    fn test_fetch_failure_yields_complete_vector() {
        let url = "https://example-trusted.com/login";
        let p = pipeline(&["example-trusted.com"]);
        // No page registered: the fetcher degrades to empty content
        let v = p.extract(&record(&StaticFetcher::default(), url));
        let s = p.schema();

        assert_eq!(v.len(), s.len());
        for (name, value) in s.names().zip(v.as_slice()) {
            if is_content_feature(name) {
                assert_eq!(*value, 0.0, "{name}");
            }
        }
        assert_eq!(v.get_by_name(s, "url_length"), Some(33.0));
        assert_eq!(v.get_by_name(s, "has_https"), Some(1.0));
        assert_eq!(v.get_by_name(s, "is_known_brand"), Some(1.0));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let url = "https://news.example.org/world/2025?id=12";
        let p = pipeline(&["example.org", "facebook.com"]);
        let fetcher = StaticFetcher::with_page(url, PAGE);

        let first = p.extract(&record(&fetcher, url));
        let second = p.extract(&record(&fetcher, url));
        let first_bits: Vec<u32> = first.values.iter().map(|v| v.to_bits()).collect();
        let second_bits: Vec<u32> = second.values.iter().map(|v| v.to_bits()).collect();
        assert_eq!(first_bits, second_bits);
        assert_eq!(first.layout_hash, second.layout_hash);
    }

    #[test]
    fn test_malformed_page_does_not_abort() {
        let url = "http://broken.example";
        let p = pipeline(&[]);
        let fetcher = StaticFetcher::with_page(url, "<html><body><a href=\"#\"<div><iframe");
        let v = p.extract(&record(&fetcher, url));
        assert_eq!(v.len(), SELECTED_FEATURES.len());
        assert!(v.values.iter().all(|x| x.is_finite()));
    }
}
