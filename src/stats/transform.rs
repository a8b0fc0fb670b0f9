use super::*;
use serde_json::{Map, Value};

pub const BY_LOGIN_KEY: &str = "byLogin";
pub const CONTRIBUTORS_COLUMNS_KEY: &str = "contributorsColumns";

/// Orders contributors by count, highest first. Equal counts keep the order
/// in which they appear in `by_login`.
pub fn rank(by_login: &Map<String, Value>) -> Result<Vec<ContributionRecord>, TransformError> {
    let mut records = by_login
        .iter()
        .map(|(login, count)| {
            count
                .as_u64()
                .map(|count| ContributionRecord::new(login.as_str(), count))
                .ok_or_else(|| TransformError::InvalidCount {
                    login: login.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    // sort_by is stable
    records.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(records)
}

/// Rebuilds the login map in rank order.
pub fn sorted_mapping(records: &[ContributionRecord]) -> Map<String, Value> {
    records
        .iter()
        .map(|record| (record.login.clone(), Value::from(record.count)))
        .collect()
}

/// Deals ranked records into columns of the given sizes, left to right.
/// Columns past the end of the records come out short or empty; records past
/// the total capacity are dropped.
pub fn columns(records: &[ContributionRecord], sizes: &[usize]) -> Vec<Vec<ContributionRecord>> {
    let mut remaining = records;
    sizes
        .iter()
        .map(|&size| {
            let (column, rest) = remaining.split_at(size.min(remaining.len()));
            remaining = rest;
            column.to_vec()
        })
        .collect()
}

/// Replaces `byLogin` with its ranked form and attaches `contributorsColumns`.
/// Every other field passes through untouched.
pub fn transform(raw: Value, column_sizes: &[usize]) -> Result<Value, TransformError> {
    let Value::Object(mut object) = raw else {
        return Err(TransformError::NotAnObject);
    };

    let by_login = object
        .get(BY_LOGIN_KEY)
        .ok_or(TransformError::MissingByLogin)?
        .as_object()
        .ok_or(TransformError::ByLoginNotAnObject)?;

    let records = rank(by_login)?;
    let grouped = columns(&records, column_sizes);

    let sorted = Value::Object(sorted_mapping(&records));
    let grouped = Value::Array(
        grouped
            .iter()
            .map(|column| Value::Array(column.iter().map(Value::from).collect()))
            .collect(),
    );

    // Existing keys keep their position when overwritten.
    object.insert(BY_LOGIN_KEY.to_string(), sorted);
    object.insert(CONTRIBUTORS_COLUMNS_KEY.to_string(), grouped);

    Ok(Value::Object(object))
}
