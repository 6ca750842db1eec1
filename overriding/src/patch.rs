//! Generic structural merge of a patch document onto a base document.
//!
//! Both documents are generic [`Document`] trees; the [`PatchMeta`] table
//! tells, for every typed field, whether it is merged recursively, merged
//! by key, or replaced. Rules:
//!
//! - keyed lists: an element whose key exists in the base is merged into it
//!   in place; other elements are appended after the existing ones in patch
//!   order; base elements absent from the patch are kept.
//! - replace fields are swapped wholesale.
//! - maps merge key-wise, with patch values taking precedence.
//! - a `null` patch value removes the field from the base; `null` entries
//!   inside a subtree the base does not have are dropped.
//! - unlisted lists and scalars are replaced.
//!
//! A typed field whose patch value does not have the shape of the base value
//! (a map patched with a scalar, a keyed list patched with a map, ...) is a
//! [`SchemaMismatch`](EngineError::SchemaMismatch). Free-form fields never
//! mismatch; they are simply replaced.
//!
//! # Example
//!
//! ```
//! use devtemplate_core::PatchMeta;
//! use devtemplate_overriding::patch_document;
//! use serde_json::json;
//!
//! let mut base = json!({
//!     "commands": [
//!         {"id": "build", "exec": {"commandLine": "make", "args": ["-j4"]}},
//!         {"id": "test", "exec": {"commandLine": "make test"}}
//!     ]
//! });
//! let patch = json!({
//!     "commands": [
//!         {"id": "build", "exec": {"args": ["-j8"]}},
//!         {"id": "lint", "exec": {"commandLine": "make lint"}}
//!     ]
//! });
//!
//! let stats = patch_document(&PatchMeta::template_content(), &mut base, patch).unwrap();
//! assert_eq!(stats.merged, 1);
//! assert_eq!(stats.appended, 1);
//! assert_eq!(base["commands"][0]["exec"], json!({"commandLine": "make", "args": ["-j8"]}));
//! assert_eq!(base["commands"][2]["id"], "lint");
//! ```

use std::collections::BTreeMap;

use devtemplate_core::{
    Document, DocumentMap, FieldMeta, FieldPath, PatchMeta, PatchStrategy, PathSegment, kind_of,
};

use crate::error::{EngineError, Result};

/// What a patch did to the keyed lists of its base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
    /// Patch elements merged into an existing base element.
    pub merged: usize,
    /// Patch elements appended because their key was not in the base.
    pub appended: usize,
}

/// Applies `patch` onto `base`, whose root has type [`PatchMeta::ROOT`].
///
/// # Errors
///
/// Returns [`EngineError::SchemaMismatch`] if a typed field of the patch
/// does not have the shape of the base field, or a keyed list element has
/// no string key. `base` may be partially patched when an error is
/// returned.
pub fn patch_document(meta: &PatchMeta, base: &mut Document, patch: Document) -> Result<PatchStats> {
    let mut patcher = Patcher {
        meta,
        path: FieldPath::root(),
        stats: PatchStats::default(),
    };
    match (base, patch) {
        (Document::Object(base), Document::Object(patch)) => {
            patcher.merge_object(Some(PatchMeta::ROOT), base, patch)?;
        }
        (base, patch) => {
            return Err(patcher.mismatch(format!(
                "cannot patch a {} with a {}",
                kind_of(base),
                kind_of(&patch)
            )));
        }
    }
    Ok(patcher.stats)
}

struct Patcher<'a> {
    meta: &'a PatchMeta,
    path: FieldPath,
    stats: PatchStats,
}

impl Patcher<'_> {
    fn mismatch(&self, detail: String) -> EngineError {
        EngineError::SchemaMismatch {
            path: self.path.clone(),
            detail,
        }
    }

    fn merge_object(
        &mut self,
        type_name: Option<&str>,
        base: &mut DocumentMap,
        patch: DocumentMap,
    ) -> Result<()> {
        for (field, value) in patch {
            if value.is_null() {
                base.remove(&field);
                continue;
            }
            let meta = type_name.and_then(|ty| self.meta.field(ty, &field));
            self.path.push(PathSegment::Field(field.clone()));
            match base.get_mut(&field) {
                Some(existing) => self.merge_field(meta, existing, value)?,
                None => {
                    base.insert(field, without_nulls(value));
                }
            }
            self.path.pop();
        }
        Ok(())
    }

    fn merge_field(
        &mut self,
        meta: Option<FieldMeta>,
        base: &mut Document,
        patch: Document,
    ) -> Result<()> {
        let type_name = meta.and_then(|m| m.type_name);
        match meta.map(|m| m.strategy) {
            Some(PatchStrategy::Replace) => {
                *base = without_nulls(patch);
                Ok(())
            }
            Some(PatchStrategy::MergeByKey { key }) => match (base, patch) {
                (Document::Array(base), Document::Array(patch)) => {
                    self.merge_keyed(key, type_name, base, patch)
                }
                (base, patch) => Err(self.mismatch(format!(
                    "keyed list patched as {} over {}",
                    kind_of(&patch),
                    kind_of(base)
                ))),
            },
            Some(PatchStrategy::Merge) | None => match patch {
                Document::Object(patch) => match base {
                    Document::Object(base) => self.merge_object(type_name, base, patch),
                    other if type_name.is_some() => Err(self.mismatch(format!(
                        "map patched over {}",
                        kind_of(other)
                    ))),
                    other => {
                        *other = without_nulls(Document::Object(patch));
                        Ok(())
                    }
                },
                patch => {
                    if type_name.is_some() && base.is_object() {
                        return Err(self.mismatch(format!(
                            "{} patched over map",
                            kind_of(&patch)
                        )));
                    }
                    *base = without_nulls(patch);
                    Ok(())
                }
            },
        }
    }

    fn merge_keyed(
        &mut self,
        key: &str,
        type_name: Option<&str>,
        base: &mut Vec<Document>,
        patch: Vec<Document>,
    ) -> Result<()> {
        let mut positions: BTreeMap<String, usize> = BTreeMap::new();
        for (idx, element) in base.iter().enumerate() {
            if let Some(k) = element.get(key).and_then(Document::as_str) {
                positions.entry(k.to_string()).or_insert(idx);
            }
        }

        for (idx, element) in patch.into_iter().enumerate() {
            self.path.push(PathSegment::Index(idx));
            let element = match element {
                Document::Object(map) => map,
                other => {
                    return Err(self.mismatch(format!(
                        "keyed list element is a {}",
                        kind_of(&other)
                    )));
                }
            };
            let Some(element_key) = element.get(key).and_then(Document::as_str) else {
                return Err(self.mismatch(format!("keyed list element has no string `{key}`")));
            };
            let element_key = element_key.to_string();
            self.path.pop();
            self.path.push(PathSegment::Key(element_key.clone()));

            match positions.get(&element_key).copied() {
                Some(pos) => match &mut base[pos] {
                    Document::Object(existing) => {
                        self.merge_object(type_name, existing, element)?;
                        self.stats.merged += 1;
                    }
                    other => {
                        return Err(self.mismatch(format!(
                            "base element is a {}",
                            kind_of(other)
                        )));
                    }
                },
                None => {
                    positions.insert(element_key, base.len());
                    base.push(without_nulls(Document::Object(element)));
                    self.stats.appended += 1;
                }
            }
            self.path.pop();
        }
        Ok(())
    }
}

/// Drops `null` map entries at every depth of a subtree that has no base
/// counterpart. Array items are kept as they are.
fn without_nulls(value: Document) -> Document {
    match value {
        Document::Object(map) => Document::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, without_nulls(v)))
                .collect(),
        ),
        Document::Array(items) => Document::Array(items.into_iter().map(without_nulls).collect()),
        other => other,
    }
}
