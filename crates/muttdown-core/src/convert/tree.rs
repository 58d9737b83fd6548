//! Recursive walk over the part tree.

use super::charset::resolve;
use super::leaf::Conversion;
use super::relocate::relocate;
use super::Converter;
use crate::render::{MarkdownRenderer, StyleInliner};
use muttdown_mime::{Body, ContentType, Part};
use std::sync::Arc;

/// Content types of detached signatures inside `multipart/signed`.
const SIGNATURE_TYPES: [&str; 3] = [
    "application/pgp-signature",
    "application/pkcs7-signature",
    "application/x-pkcs7-signature",
];

enum Shape {
    Leaf,
    Signed,
    Container,
}

impl Shape {
    fn of(part: &Part) -> Self {
        match &part.body {
            Body::Single(_) => Self::Leaf,
            Body::Multipart(_) if part.content_type().is("multipart", "signed") => Self::Signed,
            Body::Multipart(_) => Self::Container,
        }
    }
}

impl<R: MarkdownRenderer, I: StyleInliner> Converter<R, I> {
    /// Transforms the subtree rooted at `part`.
    ///
    /// Returns the new subtree and whether anything in it was converted.
    /// With `wrap`, a converted leaf becomes a `multipart/alternative` of the
    /// original and its HTML; without it, only the HTML part is returned.
    pub fn transform(
        &self,
        part: Arc<Part>,
        inherited: Option<&str>,
        wrap: bool,
    ) -> (Arc<Part>, bool) {
        match Shape::of(&part) {
            Shape::Leaf => self.transform_leaf(part, inherited, wrap),
            Shape::Signed => self.transform_signed(part, inherited),
            Shape::Container => self.transform_container(part, inherited),
        }
    }

    fn transform_leaf(
        &self,
        mut part: Arc<Part>,
        inherited: Option<&str>,
        wrap: bool,
    ) -> (Arc<Part>, bool) {
        let html = match self.convert_leaf(&part, inherited) {
            Conversion::Converted(html) => Arc::new(html),
            Conversion::NotApplicable(reason) => {
                tracing::debug!(%reason, "Leaf left unchanged");
                if part.headers.contains("bcc") {
                    Arc::make_mut(&mut part).headers.remove("bcc");
                }
                return (part, false);
            }
        };
        tracing::debug!(wrap, "Leaf converted to HTML");

        if !wrap {
            return (html, true);
        }

        let mut container = Part::multipart(&ContentType::multipart("alternative"), Vec::new());
        relocate(Arc::make_mut(&mut part), &mut container);
        container.body = Body::Multipart(vec![part, html]);
        (Arc::new(container), true)
    }

    fn transform_signed(
        &self,
        mut signed: Arc<Part>,
        inherited: Option<&str>,
    ) -> (Arc<Part>, bool) {
        let protocol = signed
            .content_type()
            .parameter("protocol")
            .map(str::to_ascii_lowercase);
        let charset = resolve(&signed, inherited);

        let mut container = Part::multipart(&ContentType::multipart("alternative"), Vec::new());
        // Headers of the signed container itself are outside the signature.
        relocate(Arc::make_mut(&mut signed), &mut container);
        container.preamble.clone_from(&signed.preamble);

        let mut alternatives = Vec::new();
        let mut converted = false;
        for child in signed.children() {
            if is_signature(child, protocol.as_deref()) {
                continue;
            }
            let (result, did_convert) =
                self.transform(Arc::clone(child), charset.as_deref(), false);
            if did_convert {
                alternatives.push(result);
                converted = true;
            }
        }

        tracing::debug!(converted, "Wrapped signed container");
        alternatives.push(signed);
        container.body = Body::Multipart(alternatives);
        (Arc::new(container), converted)
    }

    fn transform_container(
        &self,
        mut part: Arc<Part>,
        inherited: Option<&str>,
    ) -> (Arc<Part>, bool) {
        let mut content_type = ContentType::multipart(part.content_type().sub_type);
        for (key, value) in &part.content_type().parameters {
            if key != "boundary" {
                content_type.set_parameter(key.as_str(), value.as_str());
            }
        }
        let charset = resolve(&part, inherited);

        let mut container = Part::multipart(&content_type, Vec::new());
        let source = Arc::make_mut(&mut part);
        relocate(source, &mut container);
        container.preamble.clone_from(&source.preamble);

        let mut converted = false;
        let children = source
            .children()
            .iter()
            .map(|child| {
                let (result, did_convert) =
                    self.transform(Arc::clone(child), charset.as_deref(), true);
                converted |= did_convert;
                result
            })
            .collect();

        container.body = Body::Multipart(children);
        (Arc::new(container), converted)
    }
}

fn is_signature(part: &Part, protocol: Option<&str>) -> bool {
    let essence = part.content_type().essence();
    protocol == Some(essence.as_str()) || SIGNATURE_TYPES.contains(&essence.as_str())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::convert::ConvertOptions;

    fn converter() -> Converter {
        Converter::new(ConvertOptions::default())
    }

    fn parse(raw: &str) -> Arc<Part> {
        Arc::new(Part::parse(raw.as_bytes()).unwrap())
    }

    #[test]
    fn unconverted_leaf_is_shared() {
        let part = parse("Subject: hi\n\nplain text\n");
        let (result, converted) = converter().transform(Arc::clone(&part), None, true);
        assert!(!converted);
        assert!(Arc::ptr_eq(&part, &result));
    }

    #[test]
    fn converted_leaf_is_wrapped() {
        let part = parse("Subject: hi\nContent-Type: text/plain\n\n!m *x*\n");
        let (result, converted) = converter().transform(part, None, true);
        assert!(converted);
        assert!(result.content_type().is("multipart", "alternative"));
        assert_eq!(result.headers.get("subject"), Some("hi"));

        let children = result.children();
        assert_eq!(children.len(), 2);
        assert!(children[0].content_type().is("text", "plain"));
        assert!(!children[0].headers.contains("subject"));
        assert!(children[1].content_type().is("text", "html"));
    }

    #[test]
    fn converted_leaf_without_wrap_is_html_only() {
        let part = parse("Content-Type: text/plain\n\n!m *x*\n");
        let (result, converted) = converter().transform(part, None, false);
        assert!(converted);
        assert!(result.content_type().is("text", "html"));
    }

    #[test]
    fn container_keeps_subtype_parameters_and_preamble() {
        let raw = concat!(
            "Content-Type: multipart/related; type=\"text/plain\"; charset=koi8-r; boundary=b\n",
            "\n",
            "preamble text\n",
            "--b\n",
            "\n",
            "!m hi\n",
            "--b--\n"
        );
        let (result, _) = converter().transform(parse(raw), None, true);
        let content_type = result.content_type();
        assert!(content_type.is("multipart", "related"));
        assert_eq!(content_type.charset(), Some("koi8-r"));
        assert_eq!(content_type.parameter("type"), Some("text/plain"));
        assert_eq!(content_type.boundary(), None);
        assert_eq!(result.preamble.as_deref(), Some(&b"preamble text"[..]));
    }

    #[test]
    fn signature_detection() {
        let sig = parse("Content-Type: application/pgp-signature\n\nsig\n");
        assert!(is_signature(&sig, None));
        let custom = parse("Content-Type: application/x-custom-sig\n\nsig\n");
        assert!(is_signature(&custom, Some("application/x-custom-sig")));
        assert!(!is_signature(&custom, None));
    }
}
