//! Backfill of documents written before a field existed
//!
//! Each [`Backfill`] pairs a predicate with a fixup. Every rule runs on every
//! load, in order; a document that already satisfies a rule is left alone,
//! so normalizing twice is the same as normalizing once.

use crate::document::{PersonalDetails, ResumeDocument, Section, SectionVisibility};
use crate::{Error, Result};
use serde_json::{Map, Value};

type Object = Map<String, Value>;

pub struct Backfill {
    pub name: &'static str,
    needed: fn(&Object) -> bool,
    fixup: fn(&mut Object),
}

fn is_missing_object(doc: &Object, key: &str) -> bool {
    !matches!(doc.get(key), Some(Value::Object(_)))
}

fn default_value<T: serde::Serialize + Default>() -> Value {
    serde_json::to_value(T::default()).unwrap_or(Value::Null)
}

/// The rules applied by [`normalize`], in order
pub fn default_rules() -> Vec<Backfill> {
    vec![
        Backfill {
            name: "personalDetails",
            needed: |doc| is_missing_object(doc, "personalDetails"),
            fixup: |doc| {
                doc.insert("personalDetails".into(), default_value::<PersonalDetails>());
            },
        },
        Backfill {
            name: "sectionVisibility",
            needed: |doc| is_missing_object(doc, "sectionVisibility"),
            fixup: |doc| {
                doc.insert("sectionVisibility".into(), default_value::<SectionVisibility>());
            },
        },
        Backfill {
            name: "sectionVisibility keys",
            needed: |doc| match doc.get("sectionVisibility") {
                Some(Value::Object(flags)) => Section::all()
                    .iter()
                    .any(|s| !matches!(flags.get(s.as_str()), Some(Value::Bool(_)))),
                _ => false,
            },
            fixup: |doc| {
                if let Some(Value::Object(flags)) = doc.get_mut("sectionVisibility") {
                    for section in Section::all() {
                        if !matches!(flags.get(section.as_str()), Some(Value::Bool(_))) {
                            flags.insert(section.as_str().into(), Value::Bool(true));
                        }
                    }
                }
            },
        },
    ]
}

/// Apply `rules` in place, returning the names of the rules that fired.
pub fn apply(rules: &[Backfill], document: &mut Value) -> Result<Vec<&'static str>> {
    let Value::Object(doc) = document else {
        return Err(Error::Backend("stored document is not a JSON object".into()));
    };
    let mut fired = Vec::new();
    for rule in rules {
        if (rule.needed)(doc) {
            (rule.fixup)(doc);
            fired.push(rule.name);
        }
    }
    Ok(fired)
}

/// Backfill and type a stored document
pub fn normalize(rules: &[Backfill], mut document: Value) -> Result<ResumeDocument> {
    let fired = apply(rules, &mut document)?;
    if !fired.is_empty() {
        tracing::debug!("backfilled stored document: {}", fired.join(", "));
    }
    Ok(serde_json::from_value(document)?)
}
