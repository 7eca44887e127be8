use super::*;

#[test]
fn extract_asin_from_dp_path() {
    assert_eq!(
        extract_asin("https://www.amazon.es/Cafetera-Espresso/dp/B08XYZ1234/ref=sr_1_1?keywords=x"),
        Some("B08XYZ1234".to_owned())
    );
}

#[test]
fn extract_asin_from_gp_product_path() {
    assert_eq!(
        extract_asin("https://www.amazon.com/gp/product/b07abc9876"),
        Some("B07ABC9876".to_owned())
    );
}

#[test]
fn extract_asin_from_mobile_path() {
    assert_eq!(
        extract_asin("https://www.amazon.de/gp/aw/d/B000000001?th=1"),
        Some("B000000001".to_owned())
    );
}

#[test]
fn extract_asin_from_query_parameter() {
    assert_eq!(
        extract_asin("https://www.amazon.es/s?k=cafe&asin=B012345678"),
        Some("B012345678".to_owned())
    );
}

#[test]
fn extract_asin_rejects_too_short_identifier() {
    assert_eq!(extract_asin("https://www.amazon.es/dp/B0123"), None);
}

#[test]
fn extract_asin_none_for_search_page() {
    assert_eq!(extract_asin("https://www.amazon.es/s?k=auriculares"), None);
}

#[test]
fn is_valid_asin_requires_uppercase_alphanumerics() {
    assert!(is_valid_asin("B08XYZ1234"));
    assert!(!is_valid_asin("b08xyz1234"));
    assert!(!is_valid_asin("B08XYZ123"));
    assert!(!is_valid_asin("B08-YZ1234"));
}

#[test]
fn parse_accepts_marketplace_hosts() {
    for url in [
        "https://www.amazon.es/dp/B08XYZ1234",
        "https://amazon.com/dp/B08XYZ1234",
        "https://www.amazon.co.uk/dp/B08XYZ1234",
        "http://smile.amazon.de/dp/B08XYZ1234",
    ] {
        let link = ProductLink::parse(url).unwrap_or_else(|e| panic!("{url}: {e}"));
        assert_eq!(link.asin(), "B08XYZ1234");
    }
}

#[test]
fn parse_rejects_non_amazon_host() {
    let err = ProductLink::parse("https://www.example.com/dp/B08XYZ1234").unwrap_err();
    assert_eq!(
        err,
        LinkError::UnsupportedHost {
            host: "www.example.com".to_owned()
        }
    );
}

#[test]
fn parse_rejects_lookalike_host() {
    let err = ProductLink::parse("https://amazon-deals.example/dp/B08XYZ1234").unwrap_err();
    assert!(matches!(err, LinkError::UnsupportedHost { .. }));
}

#[test]
fn parse_rejects_short_links() {
    let err = ProductLink::parse("https://amzn.to/3abcDEF").unwrap_err();
    assert!(matches!(err, LinkError::ShortLink { .. }));
}

#[test]
fn parse_rejects_non_http_scheme() {
    let err = ProductLink::parse("ftp://www.amazon.es/dp/B08XYZ1234").unwrap_err();
    assert!(matches!(err, LinkError::InvalidUrl { .. }));
}

#[test]
fn parse_rejects_garbage() {
    let err = ProductLink::parse("not a url").unwrap_err();
    assert!(matches!(err, LinkError::InvalidUrl { .. }));
}

#[test]
fn parse_requires_asin() {
    let err = ProductLink::parse("https://www.amazon.es/gp/bestsellers").unwrap_err();
    assert!(matches!(err, LinkError::MissingAsin { .. }));
}

#[test]
fn canonical_url_drops_tracking_parameters() {
    let link =
        ProductLink::parse("https://www.amazon.es/Some-Product/dp/B08XYZ1234/ref=abc?psc=1&tag=x-21")
            .unwrap();
    assert_eq!(link.canonical_url(), "https://www.amazon.es/dp/B08XYZ1234");
}

#[test]
fn affiliate_url_appends_tag() {
    let link = ProductLink::parse("https://www.amazon.es/dp/B08XYZ1234").unwrap();
    assert_eq!(
        link.affiliate_url("mitienda-21").unwrap(),
        "https://www.amazon.es/dp/B08XYZ1234?tag=mitienda-21"
    );
}

#[test]
fn affiliate_url_rejects_bad_tags() {
    let link = ProductLink::parse("https://www.amazon.es/dp/B08XYZ1234").unwrap();
    assert_eq!(link.affiliate_url(""), Err(LinkError::InvalidTag(String::new())));
    assert!(link.affiliate_url("tag&evil=1").is_err());
}

#[test]
fn from_asin_uppercases_and_validates() {
    let link = ProductLink::from_asin("WWW.Amazon.es", "b08xyz1234").unwrap();
    assert_eq!(link.canonical_url(), "https://www.amazon.es/dp/B08XYZ1234");
    assert!(ProductLink::from_asin("www.amazon.es", "short").is_err());
}

#[test]
fn resolve_accepts_bare_asin_on_default_host() {
    let link = ProductLink::resolve(" b07xyz1234 ", "www.amazon.es").unwrap();
    assert_eq!(link.canonical_url(), "https://www.amazon.es/dp/B07XYZ1234");
}

#[test]
fn resolve_keeps_host_of_full_url() {
    let link = ProductLink::resolve("https://www.amazon.de/dp/B07XYZ1234?th=1", "www.amazon.es")
        .unwrap();
    assert_eq!(link.host(), "www.amazon.de");
}

#[test]
fn resolve_rejects_word_that_is_not_an_asin() {
    assert!(ProductLink::resolve("not-a-url", "www.amazon.es").is_err());
}
