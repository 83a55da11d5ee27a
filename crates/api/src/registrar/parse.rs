//! Response decoding for the registrar's XML and `key=value` text formats.
//!
//! XML bodies are read into a small element tree first; lookups then follow
//! element paths the way the registrar documents them (`RRPCode` under the
//! root, `namespin/domains/domain` anywhere below it).

use std::collections::{BTreeMap, HashMap};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use hostdeck_core::TldList;

use super::RegistrarError;
use super::types::{AvailabilityCheck, KeywordSuggestion, SpinSuggestion};

// =============================================================================
// Element tree
// =============================================================================

#[derive(Debug, Default)]
struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, RegistrarError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| RegistrarError::Parse(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| RegistrarError::Parse(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Trimmed text of the first direct child called `name`.
    fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.trim())
    }

    /// All elements matching `path` whose first step is any descendant.
    fn find_all<'a>(&'a self, path: &[&str], out: &mut Vec<&'a Self>) {
        for child in &self.children {
            child.collect_path(path, out);
            child.find_all(path, out);
        }
    }

    fn collect_path<'a>(&'a self, path: &[&str], out: &mut Vec<&'a Self>) {
        match path {
            [] => {}
            [last] => {
                if self.name == *last {
                    out.push(self);
                }
            }
            [first, rest @ ..] => {
                if self.name == *first {
                    for child in &self.children {
                        child.collect_path(rest, out);
                    }
                }
            }
        }
    }

    fn find_first_text(&self, path: &[&str]) -> Option<&str> {
        let mut found = Vec::new();
        self.find_all(path, &mut found);
        found.first().map(|e| e.text.trim())
    }
}

/// Parse a complete XML document into its root element.
fn parse_document(xml: &str) -> Result<XmlElement, RegistrarError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                if root.is_some() {
                    return Err(RegistrarError::Parse("content after root element".into()));
                }
                stack.push(XmlElement::from_start(&start)?);
            }
            Ok(Event::Empty(start)) => {
                let element = XmlElement::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| RegistrarError::Parse("unexpected closing tag".into()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(text)) => {
                let value = text
                    .unescape()
                    .map_err(|e| RegistrarError::Parse(e.to_string()))?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&value),
                    None if value.trim().is_empty() => {}
                    None => {
                        return Err(RegistrarError::Parse("text outside root element".into()));
                    }
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(RegistrarError::Parse(e.to_string())),
        }
    }

    if !stack.is_empty() {
        return Err(RegistrarError::Parse("unclosed element at end of document".into()));
    }
    root.ok_or_else(|| RegistrarError::Parse("no root element".into()))
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), RegistrarError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(RegistrarError::Parse("multiple root elements".into()));
    }
    *root = Some(element);
    Ok(())
}

/// Fail with the registrar's own message when it reports errors.
fn check_err_count(root: &XmlElement, default_message: &str) -> Result<(), RegistrarError> {
    let count = match root.child_text("ErrCount") {
        None | Some("") => 0,
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| RegistrarError::Parse(format!("invalid ErrCount {raw:?}")))?,
    };
    if count > 0 {
        let message = root
            .find_first_text(&["errors", "Err1"])
            .filter(|m| !m.is_empty())
            .unwrap_or(default_message);
        return Err(RegistrarError::Upstream(message.to_owned()));
    }
    Ok(())
}

// =============================================================================
// Availability check
// =============================================================================

/// Decode a `check` response.
///
/// # Errors
///
/// Returns [`RegistrarError::Parse`] for malformed XML and
/// [`RegistrarError::Upstream`] when the registrar reports errors.
pub fn parse_check(xml: &str) -> Result<AvailabilityCheck, RegistrarError> {
    let root = parse_document(xml)?;
    check_err_count(&root, "Domain check failed")?;

    let code = root.child_text("RRPCode").unwrap_or_default().to_owned();
    let text = root.child_text("RRPText").unwrap_or_default().to_owned();
    Ok(AvailabilityCheck::from_code(code, text))
}

// =============================================================================
// Spinner suggestions
// =============================================================================

/// Decode a `NameSpinner` response into one suggestion per (label, requested
/// extension), sorted by score descending.
///
/// Availability is the extension attribute equal to `y` (any case). Scores
/// come from the `{ext}score` attribute; missing or malformed scores are 0.
/// Ties keep the registrar's order.
///
/// # Errors
///
/// Returns [`RegistrarError::Parse`] for malformed XML and
/// [`RegistrarError::Upstream`] when the registrar reports errors.
pub fn parse_spin(xml: &str, requested: &TldList) -> Result<Vec<SpinSuggestion>, RegistrarError> {
    let root = parse_document(xml)?;
    check_err_count(&root, "NameSpinner failed")?;

    let mut domains = Vec::new();
    root.find_all(&["namespin", "domains", "domain"], &mut domains);

    let mut suggestions = Vec::with_capacity(domains.len() * requested.len());
    for domain in domains {
        let sld = domain.attr("name").unwrap_or_default().trim().to_lowercase();
        if sld.is_empty() {
            continue;
        }
        for tld in requested.iter() {
            let available = domain
                .attr(tld)
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("y"));
            let score = domain
                .attr(&format!("{tld}score"))
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(0);
            suggestions.push(SpinSuggestion {
                domain: format!("{sld}.{tld}"),
                sld: sld.clone(),
                tld: tld.to_owned(),
                available,
                score,
            });
        }
    }

    // Vec::sort_by is stable.
    suggestions.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(suggestions)
}

// =============================================================================
// Keyword suggestions
// =============================================================================

/// Split a text response into `key -> value`, both trimmed.
///
/// Lines without `=` are ignored; later duplicates replace earlier ones.
fn parse_pairs(body: &str) -> HashMap<String, String> {
    body.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_owned(), v.trim().to_owned()))
        .collect()
}

/// Collect a sparse indexed series such as `Sld0`, `Sld1`, `Sld7`.
///
/// Only keys whose suffix after `prefix` is all ASCII digits count.
fn indexed_series(pairs: &HashMap<String, String>, prefix: &str) -> BTreeMap<u32, String> {
    pairs
        .iter()
        .filter_map(|(key, value)| {
            let suffix = key.strip_prefix(prefix)?;
            if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let index = suffix.parse::<u32>().ok()?;
            Some((index, value.clone()))
        })
        .collect()
}

fn coerce_score(raw: Option<&String>) -> f64 {
    raw.map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|f| f.is_finite())
        .unwrap_or(0.0)
}

/// Decode a `GetNameSuggestions` text response.
///
/// Records exist only for indices present in both the `Sld` and `Tld`
/// series and come out in ascending index order. Scores that are missing or
/// not finite numbers become `0.0`.
///
/// # Errors
///
/// Returns [`RegistrarError::Upstream`] when the body reports `ErrCount > 0`,
/// and [`RegistrarError::Parse`] if `ErrCount` is not a number.
pub fn parse_keyword(body: &str) -> Result<Vec<KeywordSuggestion>, RegistrarError> {
    let pairs = parse_pairs(body);

    if let Some(raw) = pairs.get("ErrCount").filter(|v| !v.is_empty()) {
        let count = raw
            .parse::<u32>()
            .map_err(|_| RegistrarError::Parse(format!("invalid ErrCount {raw:?}")))?;
        if count > 0 {
            let message = pairs
                .get("Err1")
                .filter(|m| !m.is_empty())
                .map_or("GetNameSuggestions failed", String::as_str);
            return Err(RegistrarError::Upstream(message.to_owned()));
        }
    }

    let slds = indexed_series(&pairs, "Sld");
    let tlds = indexed_series(&pairs, "Tld");
    let scores = indexed_series(&pairs, "Score");

    Ok(slds
        .iter()
        .filter_map(|(index, sld)| {
            let tld = tlds.get(index)?;
            let sld = sld.to_lowercase();
            let tld = tld.to_lowercase().trim_start_matches('.').to_owned();
            Some(KeywordSuggestion {
                domain: format!("{sld}.{tld}"),
                sld,
                tld,
                score: coerce_score(scores.get(index)),
            })
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CHECK_AVAILABLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<interface-response>
  <DomainName>example.com</DomainName>
  <RRPCode>210</RRPCode>
  <RRPText> Domain available </RRPText>
  <Command>CHECK</Command>
  <ErrCount>0</ErrCount>
  <Done>true</Done>
</interface-response>"#;

    const SPIN: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<interface-response>
  <namespin>
    <spincount>3</spincount>
    <domains>
      <domain name="CoffeeHub" com="n" comscore="700" net="Y" netscore="910" tv="y" tvscore="oops"/>
      <domain name="coffeelab" com="y" comscore="910" net="n" netscore="500"/>
      <domain name="brewbar" com="y" comscore="850" net="y"/>
    </domains>
  </namespin>
  <ErrCount>0</ErrCount>
</interface-response>"#;

    #[test]
    fn test_check_available() {
        let check = parse_check(CHECK_AVAILABLE).unwrap();
        assert!(check.available);
        assert_eq!(check.code, "210");
        assert_eq!(check.text, "Domain available");
    }

    #[test]
    fn test_check_taken_passes_code_through() {
        let xml = "<interface-response><RRPCode>211</RRPCode><RRPText>Domain not available</RRPText></interface-response>";
        let check = parse_check(xml).unwrap();
        assert!(!check.available);
        assert_eq!(check.code, "211");
        assert_eq!(check.text, "Domain not available");
    }

    #[test]
    fn test_check_missing_code_is_unavailable() {
        let check = parse_check("<interface-response/>").unwrap();
        assert!(!check.available);
        assert_eq!(check.code, "");
    }

    #[test]
    fn test_check_reports_registrar_error() {
        let xml = "<interface-response><ErrCount>1</ErrCount><errors><Err1>TLD not supported</Err1></errors></interface-response>";
        match parse_check(xml) {
            Err(RegistrarError::Upstream(msg)) => assert_eq!(msg, "TLD not supported"),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        for body in [
            "",
            "not xml at all",
            "<interface-response><RRPCode>210</RRPCode>",
            "<a></b>",
            "<a/><b/>",
        ] {
            assert!(
                matches!(parse_check(body), Err(RegistrarError::Parse(_))),
                "expected parse error for {body:?}"
            );
        }
    }

    #[test]
    fn test_spin_fans_out_requested_extensions() {
        let tlds = TldList::parse("net,com").unwrap();
        let out = parse_spin(SPIN, &tlds).unwrap();

        // Three labels times two requested extensions.
        assert_eq!(out.len(), 6);
        assert!(out.iter().all(|s| s.tld == "com" || s.tld == "net"));

        let hub_net = out.iter().find(|s| s.domain == "coffeehub.net").unwrap();
        assert!(hub_net.available);
        assert_eq!(hub_net.score, 910);

        let brew_net = out.iter().find(|s| s.domain == "brewbar.net").unwrap();
        assert_eq!(brew_net.score, 0);
    }

    #[test]
    fn test_spin_sorted_descending_and_stable() {
        let tlds = TldList::parse("net,com").unwrap();
        let out = parse_spin(SPIN, &tlds).unwrap();
        let order: Vec<_> = out.iter().map(|s| (s.domain.as_str(), s.score)).collect();
        assert_eq!(
            order,
            vec![
                ("coffeehub.net", 910),
                ("coffeelab.com", 910),
                ("brewbar.com", 850),
                ("coffeehub.com", 700),
                ("coffeelab.net", 500),
                ("brewbar.net", 0),
            ]
        );
    }

    #[test]
    fn test_spin_malformed_score_is_zero() {
        let tlds = TldList::parse("tv").unwrap();
        let out = parse_spin(SPIN, &tlds).unwrap();
        let hub_tv = out.iter().find(|s| s.sld == "coffeehub").unwrap();
        assert!(hub_tv.available);
        assert_eq!(hub_tv.score, 0);
        let lab_tv = out.iter().find(|s| s.sld == "coffeelab").unwrap();
        assert!(!lab_tv.available);
    }

    #[test]
    fn test_spin_error_count() {
        let xml = "<interface-response><ErrCount>2</ErrCount></interface-response>";
        match parse_spin(xml, &TldList::parse("com").unwrap()) {
            Err(RegistrarError::Upstream(msg)) => assert_eq!(msg, "NameSpinner failed"),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[test]
    fn test_keyword_drops_misaligned_indices() {
        let body = "\
Sld0=Coffee
Tld0=.COM
Score0=0.93
Sld1=brew
Tld1=net
Score1=abc
Sld2=orphan
Tld3=io
Score3=1
SldX=ignored
ErrCount=0
";
        let out = parse_keyword(body).unwrap();
        assert_eq!(out.len(), 2);

        assert_eq!(out[0].sld, "coffee");
        assert_eq!(out[0].tld, "com");
        assert_eq!(out[0].domain, "coffee.com");
        assert!((out[0].score - 0.93).abs() < f64::EPSILON);

        assert_eq!(out[1].domain, "brew.net");
        assert!(out[1].score.abs() < f64::EPSILON);
    }

    #[test]
    fn test_keyword_ascending_index_order_without_resorting() {
        let body = "Sld10=ten\nTld10=com\nScore10=9\nSld2=two\nTld2=com\nScore2=1\n";
        let out = parse_keyword(body).unwrap();
        let names: Vec<_> = out.iter().map(|s| s.sld.as_str()).collect();
        assert_eq!(names, vec!["two", "ten"]);
    }

    #[test]
    fn test_keyword_non_finite_score_is_zero() {
        let body = "Sld0=a\nTld0=com\nScore0=NaN\nSld1=b\nTld1=com\nScore1=inf\nSld2=c\nTld2=com\n";
        let out = parse_keyword(body).unwrap();
        assert!(out.iter().all(|s| s.score.abs() < f64::EPSILON));
    }

    #[test]
    fn test_keyword_value_may_contain_equals() {
        let out = parse_keyword("Sld0 = a=b \nTld0=com").unwrap();
        assert_eq!(out[0].sld, "a=b");
    }

    #[test]
    fn test_keyword_error_count() {
        match parse_keyword("ErrCount=1\nErr1=Bad search term") {
            Err(RegistrarError::Upstream(msg)) => assert_eq!(msg, "Bad search term"),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }
}
