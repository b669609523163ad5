//! Expression compiler: filter tree + index choice -> request descriptor.
//!
//! Every condition occurrence gets its own name and value placeholders
//! (`#n0`, `:v0`, ...); nothing is deduplicated, so compiling the same tree
//! twice yields identical text and maps. Key-condition placeholders are
//! allocated first.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;
use tracing::{debug, trace};

use crate::catalog::TableSchema;
use crate::error::{Result, UsageError};
use crate::types::AttributeValue;

use super::condition::{Condition, Operator};
use super::filter::{AttributePath, Entry, FilterTree, TermId};
use super::index::{self, IndexDescriptor, KeyTerms};
use super::request::{IndexChoice, Order, RequestDescriptor, SearchOptions, Select};

// ---------------------------------------------------------------------------
// Placeholders
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Placeholders {
    names: BTreeMap<String, String>,
    values: BTreeMap<String, AttributeValue>,
}

impl Placeholders {
    fn name(&mut self, attribute: &str) -> String {
        let placeholder = format!("#n{}", self.names.len());
        self.names.insert(placeholder.clone(), attribute.to_string());
        placeholder
    }

    fn value(&mut self, value: &Value) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values
            .insert(placeholder.clone(), AttributeValue::from_json(value));
        placeholder
    }

    /// `#n0.#n1` for a nested path; the root resolves through the schema.
    fn path(&mut self, schema: &TableSchema, path: &AttributePath) -> String {
        let mut out = Vec::with_capacity(path.segments().len());
        for (i, segment) in path.segments().iter().enumerate() {
            let attribute = if i == 0 {
                schema.attribute_name(segment)
            } else {
                segment.as_str()
            };
            out.push(self.name(attribute));
        }
        out.join(".")
    }
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

fn render_condition(
    placeholders: &mut Placeholders,
    schema: &TableSchema,
    path: &AttributePath,
    condition: &Condition,
) -> String {
    let name = placeholders.path(schema, path);
    let operands = condition.operands();
    let op = condition.operator();
    match op {
        Operator::Eq | Operator::Ne | Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => {
            let v = placeholders.value(&operands[0]);
            format!("{name} {} {v}", op.as_str())
        }
        Operator::Between => {
            let low = placeholders.value(&operands[0]);
            let high = placeholders.value(&operands[1]);
            format!("{name} BETWEEN {low} AND {high}")
        }
        Operator::In => {
            let values: Vec<String> = operands.iter().map(|v| placeholders.value(v)).collect();
            format!("{name} IN ({})", values.join(", "))
        }
        Operator::BeginsWith | Operator::Contains => {
            let v = placeholders.value(&operands[0]);
            format!("{}({name}, {v})", op.as_str())
        }
        Operator::Exists | Operator::NotExists => format!("{}({name})", op.as_str()),
    }
}

// ---------------------------------------------------------------------------
// Key condition
// ---------------------------------------------------------------------------

fn root_term<'t>(tree: &'t FilterTree, id: TermId) -> Option<(&'t AttributePath, &'t Condition)> {
    match tree.entries().get(id.entry)? {
        Entry::Group(group) => group.conditions.get(id.condition).map(|(p, c)| (p, c)),
        _ => None,
    }
}

fn compile_key_condition(
    placeholders: &mut Placeholders,
    schema: &TableSchema,
    tree: &FilterTree,
    keys: &KeyTerms,
) -> Option<String> {
    let hash = root_term(tree, keys.hash?)?;
    let mut parts = vec![render_condition(placeholders, schema, hash.0, hash.1)];
    if let Some((path, condition)) = keys.range.and_then(|id| root_term(tree, id)) {
        parts.push(render_condition(placeholders, schema, path, condition));
    }
    Some(parts.join(" AND "))
}

// ---------------------------------------------------------------------------
// Filter expression
// ---------------------------------------------------------------------------

/// Render a tree level. `consumed` holds root-level terms already expressed
/// by the key condition; it is only consulted at the root.
fn compile_filter(
    placeholders: &mut Placeholders,
    schema: &TableSchema,
    tree: &FilterTree,
    consumed: &HashSet<TermId>,
    is_root: bool,
) -> Option<String> {
    let mut out = String::new();
    let mut pending_or = false;

    for (entry_idx, entry) in tree.entries().iter().enumerate() {
        let piece = match entry {
            Entry::Or => {
                pending_or = true;
                continue;
            }
            Entry::Group(group) => {
                let parts: Vec<String> = group
                    .conditions
                    .iter()
                    .enumerate()
                    .filter(|(cond_idx, _)| {
                        let id = TermId {
                            entry: entry_idx,
                            condition: *cond_idx,
                        };
                        !(is_root && consumed.contains(&id))
                    })
                    .map(|(_, (path, condition))| {
                        render_condition(placeholders, schema, path, condition)
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(format!("({})", parts.join(" AND ")))
                }
            }
            Entry::Nested(child) => compile_filter(placeholders, schema, child, consumed, false)
                .map(|inner| format!("({inner})")),
        };

        if let Some(piece) = piece {
            if !out.is_empty() {
                out.push_str(if pending_or { " OR " } else { " AND " });
            }
            out.push_str(&piece);
        }
        pending_or = false;
    }

    (!out.is_empty()).then_some(out)
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Each name is an attribute path like a filter path, so `address.city`
/// projects the nested attribute.
fn compile_projection(
    placeholders: &mut Placeholders,
    schema: &TableSchema,
    names: &[String],
) -> std::result::Result<Option<String>, UsageError> {
    let mut seen = HashSet::new();
    let mut parts = Vec::new();
    for name in names {
        let path = AttributePath::parse(name)?;
        let mut resolved = vec![schema.attribute_name(path.root()).to_string()];
        resolved.extend(path.segments()[1..].iter().cloned());
        if seen.insert(resolved) {
            parts.push(placeholders.path(schema, &path));
        }
    }
    Ok((!parts.is_empty()).then(|| parts.join(", ")))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Resolve the index and compile the full request.
pub fn compile(
    tree: &FilterTree,
    schema: &TableSchema,
    options: &SearchOptions,
) -> Result<RequestDescriptor> {
    tree.for_each_condition(&mut |_, condition| condition.validate())?;

    let (descriptor, keys) = resolve(tree, schema, &options.index)?;
    match &descriptor {
        Some(d) => debug!(
            table = %schema.name,
            index = d.name.as_deref().unwrap_or("<primary>"),
            has_key = keys.hash.is_some(),
            "index resolved"
        ),
        None => debug!(table = %schema.name, "no usable index, scanning"),
    }

    let mut placeholders = Placeholders::default();
    let key_condition = compile_key_condition(&mut placeholders, schema, tree, &keys);

    if key_condition.is_none() && options.order.is_some() {
        return Err(UsageError::ScanOrdering.into());
    }

    let consumed: HashSet<TermId> = if key_condition.is_some() {
        keys.hash.into_iter().chain(keys.range).collect()
    } else {
        HashSet::new()
    };
    let filter = compile_filter(&mut placeholders, schema, tree, &consumed, true);

    // A count request cannot declare a projection.
    let (projection, select) = if options.count {
        (None, Some(Select::Count))
    } else {
        let projection = compile_projection(&mut placeholders, schema, &options.projection)?;
        let select = projection.as_ref().map(|_| Select::SpecificAttributes);
        (projection, select)
    };

    let request = RequestDescriptor {
        table_name: schema.name.clone(),
        index_name: descriptor
            .as_ref()
            .and_then(|d| d.index_name().map(str::to_string)),
        consistent_read: options.consistent_read.then_some(true),
        key_condition_expression: key_condition,
        filter_expression: filter,
        expression_attribute_names: placeholders.names,
        expression_attribute_values: placeholders.values,
        projection_expression: projection,
        select,
        limit: options.limit,
        exclusive_start_key: options.start_key.clone(),
        scan_index_forward: options.order.map(|o| o == Order::Ascending),
    };
    trace!(
        key_condition = request.key_condition_expression.as_deref().unwrap_or(""),
        filter = request.filter_expression.as_deref().unwrap_or(""),
        "compiled request"
    );
    Ok(request)
}

fn resolve(
    tree: &FilterTree,
    schema: &TableSchema,
    choice: &IndexChoice,
) -> Result<(Option<IndexDescriptor>, KeyTerms)> {
    Ok(match choice {
        IndexChoice::Auto => match index::select_index(tree, schema) {
            Some(selection) => (Some(selection.descriptor), selection.keys),
            None => (None, KeyTerms::default()),
        },
        IndexChoice::Named(name) => {
            let descriptor = index::resolve_index(schema, name)?;
            let keys = index::match_keys(tree, schema, &descriptor);
            (Some(descriptor), keys)
        }
        IndexChoice::Descriptor(descriptor) => {
            let keys = index::match_keys(tree, schema, descriptor);
            (Some(descriptor.clone()), keys)
        }
    })
}
