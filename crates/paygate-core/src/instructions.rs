//! Extraction instructions sent to the model.
//!
//! The text is rendered entirely from a [`SchemaDefinition`], so it is a pure
//! function of the schema version: the same version always produces the same
//! bytes, and the field mapping, row rules and output shape the model is told
//! about are exactly the ones the normalizer enforces afterwards.

use std::fmt::Write;

use crate::schema::{FieldKind, FieldSpec, SchemaDefinition, Section};

/// Build the instruction text for a schema version.
pub fn build_instructions(schema: &SchemaDefinition) -> String {
    let mut out = String::new();

    out.push_str(
        "You are extracting data from an AIA G702/G703 construction pay application.\n",
    );
    let _ = writeln!(out, "Extraction contract: {}", schema.version);
    out.push('\n');

    out.push_str("DOCUMENT LAYOUT:\n");
    out.push_str(schema.preamble);
    out.push_str("\n\n");

    write_mapping(&mut out, schema);
    write_row_rules(&mut out, schema);
    write_formatting_rules(&mut out);
    write_shape(&mut out, schema);

    out
}

fn write_mapping(out: &mut String, schema: &SchemaDefinition) {
    out.push_str("FIELD MAPPING:\n");
    for section in schema
        .scalar_sections()
        .into_iter()
        .chain(std::iter::once(Section::LineItems))
    {
        let fields: Vec<&FieldSpec> = schema.section_fields(section).collect();
        if fields.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{}:", section_heading(section));
        for spec in fields {
            let _ = writeln!(
                out,
                "- {} -> \"{}\" ({}, {})",
                spec.source,
                spec.key,
                kind_label(spec.kind),
                if spec.required { "required" } else { "optional" }
            );
        }
    }
    out.push('\n');
}

fn write_row_rules(out: &mut String, schema: &SchemaDefinition) {
    let rules = &schema.rows;
    out.push_str("ROW RULES:\n");
    out.push_str("- Extract each line item row of the continuation sheet in document order.\n");

    if !rules.summary_rows.is_empty() {
        let _ = writeln!(
            out,
            "- Skip totals and header rows, such as rows labelled: {}.",
            rules.summary_rows.join(", ")
        );
    }

    if !rules.excluded_keywords.is_empty() {
        let _ = writeln!(
            out,
            "- EXCLUDE any row whose description contains one of these words, even if it has an amount: {}.",
            rules.excluded_keywords.join(", ")
        );
    }

    if let Some(field) = rules.min_nonzero {
        let key = schema
            .line_field(field)
            .map(|s| s.key)
            .unwrap_or_else(|| field.name());
        let _ = writeln!(
            out,
            "- ONLY include rows where \"{}\" is greater than zero. Rows showing 0.00 or \"-\" are not included.",
            key
        );
    }
    out.push('\n');
}

fn write_formatting_rules(out: &mut String) {
    out.push_str(
        "FORMATTING RULES:\n\
         - Currency values are bare numbers: no \"$\", no thousands separators (1234.56, not $1,234.56).\n\
         - Negative amounts use a leading \"-\" (-500.00), never parentheses.\n\
         - Percentages are bare numbers without \"%\" (45.5).\n\
         - Dates use YYYY-MM-DD.\n\
         - Use null for any value you cannot read. Never use 0 as a placeholder.\n\
         - Respond ONLY with the JSON object below. No markdown, no explanations.\n\n",
    );
}

fn write_shape(out: &mut String, schema: &SchemaDefinition) {
    out.push_str("OUTPUT FORMAT:\n{\n");

    let mut sections: Vec<String> = Vec::new();
    for section in schema.scalar_sections() {
        let members: Vec<String> = schema
            .section_fields(section)
            .map(|spec| format!("    \"{}\": {}", spec.key, placeholder(spec.kind)))
            .collect();
        sections.push(format!(
            "  \"{}\": {{\n{}\n  }}",
            section.key(),
            members.join(",\n")
        ));
    }

    let members: Vec<String> = schema
        .line_fields()
        .map(|spec| format!("      \"{}\": {}", spec.key, placeholder(spec.kind)))
        .collect();
    sections.push(format!(
        "  \"{}\": [\n    {{\n{}\n    }}\n  ]",
        Section::LineItems.key(),
        members.join(",\n")
    ));

    out.push_str(&sections.join(",\n"));
    out.push_str("\n}\n");
}

fn section_heading(section: Section) -> &'static str {
    match section {
        Section::ProjectInfo => "Project information (\"projectInfo\")",
        Section::G702Totals => "G702 summary totals (\"g702Totals\")",
        Section::LineItems => "G703 line items, one object per row (\"lineItems\")",
    }
}

fn kind_label(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Date => "date YYYY-MM-DD",
        FieldKind::Currency => "number",
        FieldKind::Percent => "percent number",
        FieldKind::Text => "text",
        FieldKind::Boolean => "true/false",
    }
}

fn placeholder(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Date => "\"YYYY-MM-DD\"",
        FieldKind::Currency => "12500.00",
        FieldKind::Percent => "45.5",
        FieldKind::Text => "\"string\"",
        FieldKind::Boolean => "false",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaRegistry, SchemaVersion};

    fn instructions(version: SchemaVersion) -> String {
        build_instructions(SchemaRegistry::global().get(version).unwrap())
    }

    #[test]
    fn test_deterministic_per_version() {
        for def in SchemaRegistry::global().definitions() {
            assert_eq!(build_instructions(def), build_instructions(def));
        }
    }

    #[test]
    fn test_versions_differ() {
        let v1 = instructions(SchemaVersion::V1Full);
        let v2 = instructions(SchemaVersion::V2G703);
        let v3 = instructions(SchemaVersion::V3Billable);
        assert_ne!(v1, v2);
        assert_ne!(v2, v3);
        assert_ne!(v1, v3);
    }

    #[test]
    fn test_contract_tag() {
        let text = instructions(SchemaVersion::V2G703);
        assert!(text.contains("Extraction contract: v2-g703"));
    }

    #[test]
    fn test_mapping_uses_version_wire_keys() {
        let v1 = instructions(SchemaVersion::V1Full);
        assert!(v1.contains("\"workCompleted\" (number, optional)"));
        assert!(v1.contains("\"g702Totals\""));

        let v3 = instructions(SchemaVersion::V3Billable);
        assert!(v3.contains("\"workCompletedThisPeriod\" (number, required)"));
        assert!(!v3.contains("g702Totals"));
    }

    #[test]
    fn test_row_rules_rendered() {
        let v3 = instructions(SchemaVersion::V3Billable);
        assert!(v3.contains("GENERAL CONDITIONS"));
        assert!(v3.contains("RETAINAGE"));
        assert!(v3.contains("ONLY include rows where \"workCompletedThisPeriod\" is greater than zero"));

        let v2 = instructions(SchemaVersion::V2G703);
        assert!(!v2.contains("EXCLUDE"));
        assert!(!v2.contains("ONLY include rows"));
    }

    #[test]
    fn test_formatting_rules_present() {
        let text = instructions(SchemaVersion::V1Full);
        assert!(text.contains("YYYY-MM-DD"));
        assert!(text.contains("Never use 0 as a placeholder"));
    }

    #[test]
    fn test_shape_lists_fields_in_order() {
        let text = instructions(SchemaVersion::V3Billable);
        let shape = &text[text.find("OUTPUT FORMAT:").unwrap()..];
        let desc = shape.find("\"description\"").unwrap();
        let amount = shape.find("\"workCompletedThisPeriod\"").unwrap();
        let flag = shape.find("\"needsVerification\": false").unwrap();
        assert!(desc < amount && amount < flag);
    }
}
