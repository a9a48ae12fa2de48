//! Tolerant extraction of product data from labeled analysis text.
//!
//! The analysis model is asked for `Label: value` sections (see
//! [`crate::prompts::analyze_prompt`]) but does not always comply. Parsing
//! never fails: a missing or empty field falls back to its placeholder and
//! is reported in [`ParsedAnalysis::degraded`].

use std::sync::LazyLock;

use chrono::Utc;
use clab_models::{ProductData, NOT_FOUND, NO_DESCRIPTION, NO_VISUAL_FEATURES};
use regex::Regex;

/// A field of the analysis format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Description,
    VisualFeatures,
    TargetAudience,
    SellingPoints,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Name,
        Field::Description,
        Field::VisualFeatures,
        Field::TargetAudience,
        Field::SellingPoints,
    ];

    /// Label as it appears before the colon.
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Description => "Description",
            Field::VisualFeatures => "Visual Features",
            Field::TargetAudience => "Target Audience",
            Field::SellingPoints => "Selling Points",
        }
    }

    fn from_label(label: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.label() == label)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Known labels at the start of a line, optionally after heading or quote
/// markers and wrapped in bold. List-marked lines are never labels.
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t>#]*(?:\*\*)?(Name|Description|Visual Features|Target Audience|Selling Points)\**[ \t]*:\**",
    )
    .unwrap()
});

static LIST_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•]|\d+[.)])\s*").unwrap());

/// Parsed product data and the fields that fell back to a placeholder.
#[derive(Debug, Clone)]
pub struct ParsedAnalysis {
    pub product: ProductData,
    pub degraded: Vec<Field>,
}

impl ParsedAnalysis {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Byte range of each label's value: from just after the first occurrence of
/// the label to the start of the next label (or end of text). Selling Points
/// always runs to the end of the text.
fn sections(text: &str) -> Vec<(Field, &str)> {
    let matches: Vec<_> = LABEL_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let field = Field::from_label(caps.get(1)?.as_str())?;
            Some((field, whole.start(), whole.end()))
        })
        .collect();

    let mut out: Vec<(Field, &str)> = Vec::new();
    for (i, (field, _, value_start)) in matches.iter().enumerate() {
        if out.iter().any(|(f, _)| f == field) {
            continue;
        }
        let end = match field {
            Field::SellingPoints => text.len(),
            _ => matches
                .get(i + 1)
                .map(|(_, start, _)| *start)
                .unwrap_or(text.len()),
        };
        out.push((*field, &text[*value_start..end]));
    }
    out
}

fn clean(value: &str) -> String {
    value.trim().trim_matches('*').trim().to_string()
}

fn single_line(section: Option<&str>) -> Option<String> {
    section?
        .lines()
        .map(clean)
        .find(|line| !line.is_empty())
}

fn multi_line(section: Option<&str>) -> Option<String> {
    let value = clean(section?);
    (!value.is_empty()).then_some(value)
}

fn list_items(section: &str) -> Vec<String> {
    section
        .lines()
        .map(|line| LIST_MARKER_RE.replace(line.trim(), "").trim().to_string())
        .map(|line| clean(&line))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Parse analysis `text` for the product at `url`.
pub fn parse_analysis(url: &str, text: &str) -> ParsedAnalysis {
    let sections = sections(text);
    let find = |field: Field| {
        sections
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, s)| *s)
    };
    let mut degraded = Vec::new();
    let mut or_placeholder = |value: Option<String>, field: Field, placeholder: &str| {
        value.unwrap_or_else(|| {
            degraded.push(field);
            placeholder.to_string()
        })
    };

    let name = or_placeholder(single_line(find(Field::Name)), Field::Name, NOT_FOUND);
    let description = or_placeholder(
        multi_line(find(Field::Description)),
        Field::Description,
        NO_DESCRIPTION,
    );
    let visual_features = or_placeholder(
        multi_line(find(Field::VisualFeatures)),
        Field::VisualFeatures,
        NO_VISUAL_FEATURES,
    );
    let target_audience = or_placeholder(
        single_line(find(Field::TargetAudience)),
        Field::TargetAudience,
        NOT_FOUND,
    );

    let selling_points = find(Field::SellingPoints)
        .map(list_items)
        .unwrap_or_default();
    if selling_points.is_empty() {
        degraded.push(Field::SellingPoints);
    }

    ParsedAnalysis {
        product: ProductData {
            url: url.to_string(),
            name,
            description,
            visual_features,
            target_audience,
            selling_points,
            reference_images: Vec::new(),
            created_at: Utc::now(),
        },
        degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://shop.example/mug";

    const WELL_FORMED: &str = "Name: Thermo Mug\n\
        Description: A steel mug.\nKeeps drinks hot.\n\
        Visual Features: Matte black, 450ml\n\
        Target Audience: Commuters\n\
        Selling Points:\n- Durable\n- Cheap\n";

    #[test]
    fn test_well_formed_text() {
        let parsed = parse_analysis(URL, WELL_FORMED);
        let p = &parsed.product;
        assert_eq!(p.url, URL);
        assert_eq!(p.name, "Thermo Mug");
        assert_eq!(p.description, "A steel mug.\nKeeps drinks hot.");
        assert_eq!(p.visual_features, "Matte black, 450ml");
        assert_eq!(p.target_audience, "Commuters");
        assert_eq!(p.selling_points, vec!["Durable", "Cheap"]);
        assert!(!parsed.is_degraded());
    }

    #[test]
    fn test_missing_target_audience_only_affects_that_field() {
        let text = WELL_FORMED.replace("Target Audience: Commuters\n", "");
        let parsed = parse_analysis(URL, &text);
        let p = &parsed.product;
        assert_eq!(p.target_audience, NOT_FOUND);
        assert_eq!(p.visual_features, "Matte black, 450ml");
        assert_eq!(p.name, "Thermo Mug");
        assert_eq!(p.selling_points, vec!["Durable", "Cheap"]);
        assert_eq!(parsed.degraded, vec![Field::TargetAudience]);
    }

    #[test]
    fn test_field_table() {
        // (input, field, expected value)
        let cases: &[(&str, Field, &str)] = &[
            ("", Field::Name, NOT_FOUND),
            ("", Field::Description, NO_DESCRIPTION),
            ("", Field::VisualFeatures, NO_VISUAL_FEATURES),
            ("Name:   \nDescription: x", Field::Name, NOT_FOUND),
            ("**Name:** Mug", Field::Name, "Mug"),
            ("## Name: Mug", Field::Name, "Mug"),
            ("**Name**: Mug", Field::Name, "Mug"),
            ("- Name: Mug", Field::Name, NOT_FOUND),
            ("Description: lid\n- Visual Features: red", Field::Description, "lid\n- Visual Features: red"),
            ("Description: only text", Field::Description, "only text"),
            ("Visual Features: red\nblue", Field::VisualFeatures, "red\nblue"),
            ("Description:\n\nVisual Features: red", Field::Description, NO_DESCRIPTION),
            ("Target Audience: Moms\nSelling Points:\n- a", Field::TargetAudience, "Moms"),
        ];

        for (input, field, expected) in cases {
            let p = parse_analysis(URL, input).product;
            let actual = match field {
                Field::Name => p.name,
                Field::Description => p.description,
                Field::VisualFeatures => p.visual_features,
                Field::TargetAudience => p.target_audience,
                Field::SellingPoints => unreachable!(),
            };
            assert_eq!(&actual, expected, "input {:?}", input);
        }
    }

    #[test]
    fn test_selling_point_markers() {
        let cases: &[(&str, &[&str])] = &[
            ("Selling Points:\n- a\n- b", &["a", "b"]),
            ("Selling Points:\n* a\n• b", &["a", "b"]),
            ("Selling Points:\n1. a\n2) b\n\n", &["a", "b"]),
            ("Selling Points:\n  -   spaced  \n", &["spaced"]),
            ("Selling Points: inline\n- next", &["inline", "next"]),
            ("Selling Points:", &[]),
            ("Name: x", &[]),
        ];

        for (input, expected) in cases {
            let parsed = parse_analysis(URL, input);
            assert_eq!(parsed.product.selling_points, *expected, "input {:?}", input);
        }
    }

    #[test]
    fn test_selling_points_run_to_end_of_text() {
        let text = "Selling Points:\n- a\nName: Mug\n- b";
        let p = parse_analysis(URL, text).product;
        assert_eq!(p.selling_points, vec!["a", "Name: Mug", "b"]);
        assert_eq!(p.name, "Mug");
    }

    #[test]
    fn test_list_marked_labels_stay_selling_points() {
        let text = "Name: Mug\nSelling Points:\n- Description: leak-proof lid\n* Target Audience: everyone";
        let parsed = parse_analysis(URL, text);
        let p = &parsed.product;
        assert_eq!(
            p.selling_points,
            vec!["Description: leak-proof lid", "Target Audience: everyone"]
        );
        assert_eq!(p.description, NO_DESCRIPTION);
        assert_eq!(p.target_audience, NOT_FOUND);
        assert!(parsed.degraded.contains(&Field::Description));
    }

    #[test]
    fn test_out_of_order_sections() {
        let text = "Visual Features: round\nName: Ball\nDescription: bouncy";
        let p = parse_analysis(URL, text).product;
        assert_eq!(p.visual_features, "round");
        assert_eq!(p.name, "Ball");
        assert_eq!(p.description, "bouncy");
    }

    #[test]
    fn test_garbage_never_fails() {
        let parsed = parse_analysis(URL, "I could not find that product, sorry.");
        assert_eq!(parsed.degraded.len(), 5);
        assert_eq!(parsed.product.name, NOT_FOUND);
    }
}
