//! Dot-path extraction over JSON values, used to unwrap response envelopes.
//!
//! Paths look like `listisosresponse.iso[0]` or `security_group.rules.0`;
//! a leading `$.` is accepted and ignored.

use serde_json::Value;

enum Step<'p> {
    Key(&'p str),
    Index(usize),
}

fn steps(path: &str) -> Option<Vec<Step<'_>>> {
    let path = path.trim();
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() {
        return None;
    }
    let mut out = Vec::new();
    for part in path.split('.') {
        let (key, mut rest) = match part.find('[') {
            Some(pos) => (&part[..pos], &part[pos..]),
            None => (part, ""),
        };
        if !key.is_empty() {
            match key.parse::<usize>() {
                Ok(i) => out.push(Step::Index(i)),
                Err(_) => out.push(Step::Key(key)),
            }
        } else if rest.is_empty() {
            return None;
        }
        while let Some(inner) = rest.strip_prefix('[') {
            let close = inner.find(']')?;
            out.push(Step::Index(inner[..close].trim().parse().ok()?));
            rest = &inner[close + 1..];
        }
        if !rest.is_empty() {
            return None;
        }
    }
    Some(out)
}

/// Value at `path`, or `None` when any step is missing or the path is malformed.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    steps(path)?
        .into_iter()
        .try_fold(root, |current, step| match (step, current) {
            (Step::Key(k), Value::Object(map)) => map.get(k),
            (Step::Index(i), Value::Array(items)) => items.get(i),
            (Step::Index(i), Value::Object(map)) => map.get(&i.to_string()),
            _ => None,
        })
}

/// String at `path`; non-string values are rendered as JSON text.
pub fn get_string(root: &Value, path: &str) -> Option<String> {
    get_path(root, path).map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Descend through up to `depth` single-key objects.
pub fn descend(mut value: Value, depth: usize) -> Value {
    for _ in 0..depth {
        match value {
            Value::Object(map) if map.len() == 1 => {
                value = map.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null);
            }
            other => return other,
        }
    }
    value
}
