use serde_json::Value;
use thiserror::Error;

use crate::types::{FieldKind, MetricField, PresentedRow, PresentedTable, RankedNamespace};

#[derive(Debug, Error, PartialEq)]
pub enum PresentError {
    #[error("namespace '{namespace}' has no value for {field}")]
    MissingField { namespace: String, field: MetricField },
    #[error("namespace '{namespace}' has a non-numeric {field}: {value}")]
    NotNumeric {
        namespace: String,
        field: MetricField,
        value: String,
    },
}

/// Ratio to a two-decimal percentage, `0.8743` -> `87.43%`. Rounds the
/// same way as [`format_currency`].
pub fn format_percentage(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

/// Two-decimal dollar amount, `123.456` -> `$123.46`.
///
/// Rounding is to nearest from the exact binary value. A value that sits
/// exactly halfway rounds half to even (`0.125` -> `$0.12`, `0.375` ->
/// `$0.38`). Decimal inputs like `2.675` are stored slightly below the
/// halfway point and round down.
pub fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}

pub fn format_field(field: MetricField, value: f64) -> String {
    match field.kind() {
        FieldKind::Ratio => format_percentage(value),
        FieldKind::Currency => format_currency(value),
    }
}

/// Format every configured field of one namespace. Any missing or
/// non-numeric value fails the whole row.
pub fn present_row(entry: &RankedNamespace, fields: &[MetricField]) -> Result<PresentedRow, PresentError> {
    let mut cells = Vec::with_capacity(fields.len());
    for field in fields {
        let value = match entry.metric.get(*field) {
            None | Some(Value::Null) => {
                return Err(PresentError::MissingField {
                    namespace: entry.namespace.clone(),
                    field: *field,
                })
            }
            Some(v) => v.as_f64().ok_or_else(|| PresentError::NotNumeric {
                namespace: entry.namespace.clone(),
                field: *field,
                value: v.to_string(),
            })?,
        };
        cells.push((*field, format_field(*field, value)));
    }
    Ok(PresentedRow {
        namespace: entry.namespace.clone(),
        cells,
        metric: entry.metric.clone(),
    })
}

/// Present a ranked list. Nothing is returned unless every row formats.
pub fn present(
    title: impl Into<String>,
    ranked: &[RankedNamespace],
    fields: &[MetricField],
) -> Result<PresentedTable, PresentError> {
    let rows = ranked
        .iter()
        .map(|entry| present_row(entry, fields))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PresentedTable {
        title: title.into(),
        fields: fields.to_vec(),
        rows,
    })
}
