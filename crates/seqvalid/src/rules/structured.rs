//! Structured comments: `##Core-START##` / `##Core-END##` framed user
//! objects checked against a registry of known templates.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::Scope;
use super::descr::STRUCTURED_COMMENT_KIND;
use crate::config::Options;
use crate::diag::{ErrorCode, FindingSink, Severity};
use crate::error::Result;
use crate::model::UserObject;

pub const PREFIX_FIELD: &str = "StructuredCommentPrefix";
pub const SUFFIX_FIELD: &str = "StructuredCommentSuffix";

/// Requirement level of a template field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRequirement {
    Mandatory,
    Optional,
}

/// One field of a structured-comment template.
#[derive(Debug, Clone)]
pub struct TemplateField {
    pub name: String,
    pub requirement: FieldRequirement,
    /// Value pattern, anchored.
    pub format: Option<Regex>,
    /// Closed vocabulary, compared case-insensitively.
    pub values: Vec<String>,
}

impl TemplateField {
    pub fn new(name: impl Into<String>, requirement: FieldRequirement) -> Self {
        Self {
            name: name.into(),
            requirement,
            format: None,
            values: Vec::new(),
        }
    }

    pub fn with_format(mut self, pattern: &str) -> Self {
        self.format = Regex::new(pattern).ok();
        self
    }

    pub fn with_values(mut self, values: &[&str]) -> Self {
        self.values = values.iter().map(|v| v.to_string()).collect();
        self
    }

    /// Whether `value` fits the field's format and vocabulary.
    pub fn accepts(&self, value: &str) -> bool {
        if let Some(format) = &self.format {
            if !format.is_match(value) {
                return false;
            }
        }
        self.values.is_empty() || self.values.iter().any(|v| v.eq_ignore_ascii_case(value))
    }
}

/// Known structured-comment templates, keyed by prefix core.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<String, Vec<TemplateField>>,
}

impl TemplateRegistry {
    pub fn builtin() -> Self {
        let mut registry = Self {
            templates: HashMap::new(),
        };
        registry.load_assembly_templates();
        registry.load_mixs_templates();
        registry
    }

    fn load_assembly_templates(&mut self) {
        let assembly_method = || {
            TemplateField::new("Assembly Method", FieldRequirement::Mandatory)
                .with_format(r"^\S.* v\. \S+")
        };
        let sequencing = || TemplateField::new("Sequencing Technology", FieldRequirement::Mandatory);
        self.templates.insert(
            "Genome-Assembly-Data".to_string(),
            vec![
                assembly_method(),
                TemplateField::new("Genome Representation", FieldRequirement::Optional)
                    .with_values(&["Full", "Partial"]),
                TemplateField::new("Genome Coverage", FieldRequirement::Mandatory)
                    .with_format(r"^\d+(\.\d+)?x$"),
                sequencing(),
            ],
        );
        self.templates.insert(
            "Assembly-Data".to_string(),
            vec![assembly_method(), sequencing()],
        );
    }

    fn load_mixs_templates(&mut self) {
        let common = || {
            vec![
                TemplateField::new("project_name", FieldRequirement::Mandatory),
                TemplateField::new("collection_date", FieldRequirement::Mandatory),
                TemplateField::new("lat_lon", FieldRequirement::Mandatory),
                TemplateField::new("geo_loc_name", FieldRequirement::Mandatory),
            ]
        };
        let mut migs = vec![
            TemplateField::new("investigation_type", FieldRequirement::Mandatory).with_values(&[
                "bacteria_archaea",
                "eukaryote",
                "plasmid",
                "virus",
                "organelle",
            ]),
        ];
        migs.extend(common());
        self.templates.insert("MIGS-Data".to_string(), migs);

        let mut mims = vec![
            TemplateField::new("investigation_type", FieldRequirement::Mandatory)
                .with_values(&["metagenome", "mimarks-survey"]),
        ];
        mims.extend(common());
        self.templates.insert("MIMS-Data".to_string(), mims);
    }

    pub fn fields(&self, core: &str) -> Option<&[TemplateField]> {
        self.templates.get(core).map(Vec::as_slice)
    }
}

static REGISTRY: Lazy<TemplateRegistry> = Lazy::new(TemplateRegistry::builtin);

static FRAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^##(.+)-(START|END)##$").unwrap());

/// Core name of a `##Core-START##` prefix or `##Core-END##` suffix.
pub fn frame_core<'v>(value: &'v str, start: bool) -> Option<&'v str> {
    let caps = FRAME.captures(value.trim())?;
    let want = if start { "START" } else { "END" };
    (caps.get(2)?.as_str() == want).then(|| caps.get(1).map(|m| m.as_str()))?
}

pub fn check(user: &UserObject, scope: &Scope<'_, '_>, out: &mut FindingSink) -> Result<()> {
    if !user.is_kind(STRUCTURED_COMMENT_KIND) {
        return Ok(());
    }
    let prefix = user.field(PREFIX_FIELD).and_then(|f| f.as_str());
    let suffix = user.field(SUFFIX_FIELD).and_then(|f| f.as_str());
    let payload: Vec<(&str, &str)> = user
        .data
        .iter()
        .filter_map(|f| Some((f.label_str()?, f.as_str().unwrap_or(""))))
        .filter(|(label, _)| *label != PREFIX_FIELD && *label != SUFFIX_FIELD)
        .collect();

    if payload.is_empty() {
        scope.post(
            out,
            Severity::Error,
            ErrorCode::UserObjectProblem,
            "Structured comment has no fields",
        );
    }

    let frame = |message: String| (Severity::Warning, ErrorCode::StrucCommMissingPrefixOrSuffix, message);
    let mut problems = Vec::new();
    let start_core = match prefix {
        None => {
            problems.push(frame("Structured Comment lacks prefix".to_string()));
            None
        }
        Some(p) => {
            let core = frame_core(p, true);
            if core.is_none() {
                problems.push(frame(format!("Structured Comment prefix {} is malformed", p)));
            }
            core
        }
    };
    let end_core = match suffix {
        None => {
            problems.push(frame("Structured Comment lacks suffix".to_string()));
            None
        }
        Some(s) => {
            let core = frame_core(s, false);
            if core.is_none() {
                problems.push(frame(format!("Structured Comment suffix {} is malformed", s)));
            }
            core
        }
    };
    if let (Some(a), Some(b)) = (start_core, end_core) {
        if a != b {
            problems.push(frame(format!(
                "Structured Comment prefix {} does not match suffix {}",
                a, b
            )));
        }
    }
    for (severity, code, message) in problems {
        scope.post(out, severity, code, message);
    }

    if let Some(core) = start_core {
        if let Some(fields) = REGISTRY.fields(core) {
            check_template(core, fields, &payload, scope, out);
        }
    }
    Ok(())
}

fn check_template(
    core: &str,
    fields: &[TemplateField],
    payload: &[(&str, &str)],
    scope: &Scope<'_, '_>,
    out: &mut FindingSink,
) {
    let severity = if scope.option(Options::GENOME_SUBMISSION) {
        Severity::Error
    } else {
        Severity::Warning
    };
    for field in fields {
        let value = payload.iter().find(|(label, _)| *label == field.name).map(|(_, v)| v.trim());
        match value {
            None | Some("") if field.requirement == FieldRequirement::Mandatory => {
                scope.post(
                    out,
                    severity,
                    ErrorCode::BadStrucCommMissingField,
                    format!("Required field {} is missing when using {}", field.name, core),
                );
            }
            Some(v) if !v.is_empty() && !field.accepts(v) => {
                scope.post(
                    out,
                    severity,
                    ErrorCode::BadStrucCommInvalidFieldValue,
                    format!("{} is not a valid value for {}", v, field.name),
                );
            }
            _ => {}
        }
    }
}
