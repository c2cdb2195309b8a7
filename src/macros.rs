/// Builds a [`JsonValue`](crate::JsonValue) from JSON-like syntax.
///
/// Object keys must be string literals. Any other expression is converted
/// through its `serde::Serialize` implementation.
///
/// ```rust
/// use jsonbind::{json, JsonValue};
///
/// let value = json!({"id": 7, "tags": ["x", null], "nested": {}});
/// assert_eq!(value.get("id"), Some(&JsonValue::from(7)));
/// ```
#[macro_export]
macro_rules! json {
    (null) => {
        $crate::JsonValue::Null
    };

    (true) => {
        $crate::JsonValue::Bool(true)
    };

    (false) => {
        $crate::JsonValue::Bool(false)
    };

    ([]) => {
        $crate::JsonValue::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::JsonValue::Array(vec![$($crate::json!($elem)),*])
    };

    ({}) => {
        $crate::JsonValue::Object($crate::JsonObject::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::JsonObject::new();
        $(
            object.insert($key, $crate::json!($value));
        )*
        $crate::JsonValue::Object(object)
    }};

    ($s:expr) => {{
        $crate::to_value(&$s).unwrap_or($crate::JsonValue::Null)
    }};
}
