//! Depth-first walk over decoded JSON values.

use serde_json::Value;

enum Frame<'a> {
    Object(serde_json::map::Iter<'a>),
    Array(std::slice::Iter<'a, Value>),
}

impl<'a> Frame<'a> {
    fn of(value: &'a Value) -> Option<Self> {
        match value {
            Value::Object(map) if !map.is_empty() => Some(Self::Object(map.iter())),
            Value::Array(items) if !items.is_empty() => Some(Self::Array(items.iter())),
            _ => None,
        }
    }
}

/// Lazy iterator over every `(key, value)` pair found in any object at any depth.
///
/// Pairs are yielded in pre-order: a pair comes before the pairs nested in its value,
/// and objects inside arrays are visited in array order.
pub struct Walk<'a> {
    stack: Vec<Frame<'a>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            match frame {
                Frame::Object(iter) => match iter.next() {
                    Some((key, value)) => {
                        if let Some(child) = Frame::of(value) {
                            self.stack.push(child);
                        }
                        return Some((key.as_str(), value));
                    }
                    None => {
                        self.stack.pop();
                    }
                },
                Frame::Array(iter) => match iter.next() {
                    Some(item) => {
                        if let Some(child) = Frame::of(item) {
                            self.stack.push(child);
                        }
                    }
                    None => {
                        self.stack.pop();
                    }
                },
            }
        }
    }
}

/// Walk all `(key, value)` pairs in `value`.
///
/// Scalars and empty containers yield nothing.
#[must_use]
pub fn walk(value: &Value) -> Walk<'_> {
    Walk {
        stack: Frame::of(value).into_iter().collect(),
    }
}
