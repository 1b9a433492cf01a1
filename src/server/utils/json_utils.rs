use serde_json::Value;

/// outcome of decoding a portal body that may or may not be json
///
/// portals love to put a BOM, php warnings or a whole html page in front of the payload, so
/// nothing here ever fails hard, callers just match on the tag
#[derive(Debug, Clone, PartialEq)]
pub enum LenientJson {
    Parsed(Value),
    Unparsable(String),
}

impl LenientJson {
    pub fn decode(raw: &str) -> Self {
        let trimmed = raw.trim_start_matches('\u{feff}').trim();

        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return Self::Parsed(value);
        }

        // outermost braces first, then the `{"js"` marker in case junk before it had a brace
        let candidates = [trimmed.find('{'), trimmed.find("{\"js\"")];
        for start in candidates.into_iter().flatten() {
            let Some(end) = trimmed.rfind('}') else {
                break;
            };
            if end <= start {
                continue;
            }
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                return Self::Parsed(value);
            }
        }

        Self::Unparsable(raw.to_string())
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Parsed(value) => Some(value),
            Self::Unparsable(_) => None,
        }
    }

    /// the `js` envelope every load.php response is wrapped in
    pub fn js(&self) -> Option<&Value> {
        self.value().and_then(|v| v.get("js")).filter(|v| !v.is_null())
    }
}

/// strings and numbers both show up for the same field depending on the portal
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// non-empty string form of `object[key]`
pub fn field_string(object: &Value, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(value_to_string)
        .filter(|s| !s.trim().is_empty())
}
