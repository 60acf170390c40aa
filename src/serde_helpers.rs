pub mod field_as_string {
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;

    pub fn serialize<T, S>(t: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: ToString,
        S: Serializer,
    {
        t.to_string().serialize(serializer)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        D: Deserializer<'de>,
        <T as FromStr>::Err: std::fmt::Debug,
    {
        let s: String = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|e| de::Error::custom(format!("Parse error: {:?}", e)))
    }
}

pub mod option_field_as_string {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<T, S>(t: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: ToString,
        S: Serializer,
    {
        match t {
            Some(value) => serializer.serialize_str(&value.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: FromStr,
        D: Deserializer<'de>,
        <T as FromStr>::Err: std::fmt::Debug,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        match s {
            Some(s) => s
                .parse()
                .map(Some)
                .map_err(|e| de::Error::custom(format!("Parse error: {:?}", e))),
            None => Ok(None),
        }
    }
}
