//! IO helper: strict JSON parsing and safe file read/write

use std::{fmt, fs::File, io::BufReader, path::Path};

use serde::de::{self, DeserializeOwned, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::model::data_core::AppError;

/// 与 `Value` 相同，但反序列化时拒绝同一对象内的重复键（否则两个节点会得到相同路径）
struct StrictValue(Value);

impl<'de> Deserialize<'de> for StrictValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(StrictVisitor)
    }
}

struct StrictVisitor;

impl<'de> Visitor<'de> for StrictVisitor {
    type Value = StrictValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any valid JSON value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<StrictValue, E>
    where
        E: de::Error,
    {
        Ok(StrictValue(Value::Bool(v)))
    }

    fn visit_i64<E>(self, v: i64) -> Result<StrictValue, E>
    where
        E: de::Error,
    {
        Ok(StrictValue(Value::from(v)))
    }

    fn visit_u64<E>(self, v: u64) -> Result<StrictValue, E>
    where
        E: de::Error,
    {
        Ok(StrictValue(Value::from(v)))
    }

    fn visit_f64<E>(self, v: f64) -> Result<StrictValue, E>
    where
        E: de::Error,
    {
        Ok(StrictValue(Number::from_f64(v).map_or(Value::Null, Value::Number)))
    }

    fn visit_str<E>(self, v: &str) -> Result<StrictValue, E>
    where
        E: de::Error,
    {
        Ok(StrictValue(Value::String(v.to_owned())))
    }

    fn visit_string<E>(self, v: String) -> Result<StrictValue, E>
    where
        E: de::Error,
    {
        Ok(StrictValue(Value::String(v)))
    }

    fn visit_unit<E>(self) -> Result<StrictValue, E>
    where
        E: de::Error,
    {
        Ok(StrictValue(Value::Null))
    }

    fn visit_none<E>(self) -> Result<StrictValue, E>
    where
        E: de::Error,
    {
        Ok(StrictValue(Value::Null))
    }

    fn visit_some<D>(self, deserializer: D) -> Result<StrictValue, D::Error>
    where
        D: Deserializer<'de>,
    {
        StrictValue::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<StrictValue, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(StrictValue(v)) = seq.next_element()? {
            items.push(v);
        }
        Ok(StrictValue(Value::Array(items)))
    }

    fn visit_map<A>(self, mut access: A) -> Result<StrictValue, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = Map::new();
        while let Some(key) = access.next_key::<String>()? {
            if map.contains_key(&key) {
                return Err(de::Error::custom(format_args!("duplicate key `{}`", key)));
            }
            let StrictValue(v) = access.next_value()?;
            map.insert(key, v);
        }
        Ok(StrictValue(Value::Object(map)))
    }
}

/// 解析 JSON 文本（拒绝重复键）
pub fn parse_json_strict(text: &str) -> Result<Value, AppError> {
    let StrictValue(v) = serde_json::from_str(text)?;
    Ok(v)
}

/// 从文件读取JSON数据
pub fn read_json_file(p: &Path) -> Result<Value, AppError> {
    let f = File::open(p)?;
    let rdr = BufReader::new(f);
    let StrictValue(v) = serde_json::from_reader(rdr)?;
    Ok(v)
}

/// 读取 JSON 格式的配置文件，缺省字段使用默认值
pub fn read_config_file<T: DeserializeOwned>(p: &Path) -> Result<T, AppError> {
    let f = File::open(p)?;
    serde_json::from_reader(BufReader::new(f)).map_err(|e| AppError::Config(e.to_string()))
}

/// 将数据保存到文件（格式化输出）
pub fn write_json_file<T: Serialize + ?Sized>(p: &Path, value: &T) -> Result<(), AppError> {
    let f = File::create(p)?;
    serde_json::to_writer_pretty(f, value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_preserves_key_order() {
        let v = parse_json_strict(r#"{"z": 1, "a": [true, null, 1.5, -3], "m": {"k": "v"}}"#).unwrap();
        let keys: Vec<&str> = v.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "m"], "键顺序应与原文一致");
        assert_eq!(v["a"], json!([true, null, 1.5, -3]));
        assert_eq!(v["m"]["k"], json!("v"));
    }

    #[test]
    fn test_parse_rejects_duplicate_keys() {
        let err = parse_json_strict(r#"{"a": 1, "b": {"x": 1, "x": 2}}"#).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
        assert!(err.to_string().contains("duplicate key `x`"), "错误信息: {}", err);

        // 不同对象中的同名键合法
        assert!(parse_json_strict(r#"{"a": {"x": 1}, "b": {"x": 2}}"#).is_ok());
    }

    #[test]
    fn test_parse_rejects_malformed_text() {
        assert!(matches!(parse_json_strict("{\"a\": json}"), Err(AppError::Parse(_))));
        assert!(matches!(parse_json_strict(""), Err(AppError::Parse(_))));
        assert!(matches!(parse_json_strict("[1, 2] trailing"), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_read_and_write_roundtrip_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"user": {"name": "test"}}"#).unwrap();
        let v = read_json_file(file.path()).unwrap();
        assert_eq!(v["user"]["name"], json!("test"));

        let out = NamedTempFile::new().unwrap();
        write_json_file(out.path(), &v).unwrap();
        assert_eq!(read_json_file(out.path()).unwrap(), v);
    }

    #[test]
    fn test_read_config_file() {
        use crate::model::data_core::ViewerConfig;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"layout": {"node_width": 200}, "interaction": {"clear_delay_ms": 800}}"#)
            .unwrap();
        let cfg: ViewerConfig = read_config_file(file.path()).unwrap();
        assert_eq!(cfg.layout.node_width, 200.0);
        assert_eq!(cfg.layout.node_height, 48.0, "缺省字段使用默认值");
        assert_eq!(cfg.interaction.clear_delay_ms, 800);

        let mut bad = NamedTempFile::new().unwrap();
        bad.write_all(br#"{"layout": {"node_width": "wide"}}"#).unwrap();
        let err = read_config_file::<ViewerConfig>(bad.path()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let err = read_json_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
