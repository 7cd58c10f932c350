use serde_json::{Map, Value};

/// A single flat table row: column name to value.
pub type Row = Map<String, Value>;

/// Collapses one level of nesting into `outer_inner` column names.
///
/// Objects directly under a top-level key are spread into one column per
/// inner key and the outer key disappears. Everything else, arrays included,
/// is copied through untouched, and objects nested two levels down stay as
/// objects. Column order follows the input.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use weather_etl::flatten_record;
///
/// let record = json!({"name": "Paris", "main": {"temp": 15, "humidity": 80}});
/// let row = flatten_record(record.as_object().unwrap());
///
/// assert_eq!(row["name"], "Paris");
/// assert_eq!(row["main_temp"], 15);
/// assert_eq!(row["main_humidity"], 80);
/// assert!(!row.contains_key("main"));
/// ```
pub fn flatten_record(record: &Map<String, Value>) -> Row {
    let mut row = Row::with_capacity(record.len());
    for (key, value) in record {
        match value {
            Value::Object(inner) => {
                for (sub_key, sub_value) in inner {
                    row.insert(format!("{key}_{sub_key}"), sub_value.clone());
                }
            }
            other => {
                row.insert(key.clone(), other.clone());
            }
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flatten(value: Value) -> Row {
        flatten_record(value.as_object().unwrap())
    }

    #[test]
    fn test_flat_input_is_unchanged() {
        let input = json!({"id": 7, "name": "Paris", "visibility": 10000, "cod": null});
        assert_eq!(Value::Object(flatten(input.clone())), input);
    }

    #[test]
    fn test_nested_object_is_spread() {
        let row = flatten(json!({
            "coord": {"lon": 2.35, "lat": 48.85},
            "wind": {"speed": 3.6, "deg": 240},
            "name": "Paris"
        }));
        let columns: Vec<_> = row.keys().map(String::as_str).collect();
        assert_eq!(
            columns,
            ["coord_lon", "coord_lat", "wind_speed", "wind_deg", "name"]
        );
        assert!(!row.contains_key("coord"));
        assert_eq!(row["wind_deg"], 240);
    }

    #[test]
    fn test_arrays_pass_through() {
        let weather = json!([{"id": 800, "main": "Clear"}]);
        let row = flatten(json!({"weather": weather.clone()}));
        assert_eq!(row["weather"], weather);
    }

    #[test]
    fn test_only_one_level_is_flattened() {
        let row = flatten(json!({"a": {"b": {"c": 1}}}));
        assert_eq!(row["a_b"], json!({"c": 1}));
        assert_eq!(row.len(), 1);
    }

    #[test]
    fn test_empty_nested_object_emits_nothing() {
        let row = flatten(json!({"rain": {}, "dt": 1}));
        assert_eq!(row.len(), 1);
        assert!(row.contains_key("dt"));
    }
}
