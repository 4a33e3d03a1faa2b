//! Dashboard widget records carried by a section's `layout` array.

use crate::error::PatchError;
use serde_json::{Map, Number, Value as Json};

/// Key under which dashboard widgets are stored.
pub const LAYOUT_KEY: &str = "layout";

#[derive(Debug, Clone, PartialEq)]
/// One validated widget entry.
pub struct Widget {
    pub widget: String,
    pub width: Number,
    pub enabled: bool,
    pub config: Option<Map<String, Json>>,
}

impl Widget {
    /// Validate one `layout` entry. `index` only feeds the error.
    pub fn from_json(index: usize, value: &Json) -> Result<Self, PatchError> {
        let invalid = |reason: &str| PatchError::InvalidWidget {
            index,
            reason: reason.to_string(),
        };
        let obj = value
            .as_object()
            .ok_or_else(|| invalid("entry is not an object"))?;
        let widget = match obj.get("widget") {
            Some(Json::String(s)) => s.clone(),
            Some(_) => return Err(invalid("'widget' must be a string")),
            None => return Err(invalid("missing 'widget'")),
        };
        let width = match obj.get("width") {
            Some(Json::Number(n)) => n.clone(),
            Some(_) => return Err(invalid("'width' must be a number")),
            None => return Err(invalid("missing 'width'")),
        };
        let enabled = match obj.get("enabled") {
            Some(Json::Bool(b)) => *b,
            Some(_) => return Err(invalid("'enabled' must be a boolean")),
            None => return Err(invalid("missing 'enabled'")),
        };
        let config = match obj.get("config") {
            None | Some(Json::Null) => None,
            Some(Json::Object(m)) => Some(m.clone()),
            Some(_) => return Err(invalid("'config' must be an object")),
        };
        Ok(Widget {
            widget,
            width,
            enabled,
            config,
        })
    }

    /// Config entries worth emitting; an empty config is treated as absent.
    pub fn non_empty_config(&self) -> Option<&Map<String, Json>> {
        self.config.as_ref().filter(|m| !m.is_empty())
    }
}

/// Validate every entry of a `layout` array. Non-array layouts are not
/// widget arrays and pass through untouched.
pub fn validate_layout(layout: &Json) -> Result<Vec<Widget>, PatchError> {
    match layout {
        Json::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| Widget::from_json(i, v))
            .collect(),
        _ => Ok(Vec::new()),
    }
}
