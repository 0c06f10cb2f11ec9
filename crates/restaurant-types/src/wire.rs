//! Lenient serde helpers for the remote API's JSON.
//!
//! The API is not strict about scalar types: `createdAt` arrives as epoch
//! milliseconds or RFC 3339 text, `is_favorite` as a boolean or the strings
//! `"true"`/`"false"`, and ids and ratings sometimes as numeric strings.
//! These helpers normalise all of them so that the typed records in
//! [`crate::types`] stay strict.

/// `createdAt` as epoch milliseconds on the way out; milliseconds, numeric
/// text or RFC 3339 on the way in.
pub mod timestamp {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    use crate::millis::{from_unix_millis, to_unix_millis};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Float(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(at: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(to_unix_millis(*at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<OffsetDateTime, D::Error> {
        let millis = match Raw::deserialize(deserializer)? {
            Raw::Millis(ms) => ms,
            Raw::Float(ms) => ms as i64,
            Raw::Text(text) => {
                let text = text.trim();
                match text.parse::<i64>() {
                    Ok(ms) => ms,
                    Err(_) => {
                        return OffsetDateTime::parse(text, &Rfc3339).map_err(|e| {
                            D::Error::custom(format!("invalid timestamp {text:?}: {e}"))
                        });
                    }
                }
            }
        };
        from_unix_millis(millis)
            .ok_or_else(|| D::Error::custom(format!("timestamp {millis} out of range")))
    }
}

/// Booleans that may be sent as `"true"` / `"false"`.
pub mod lenient_bool {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => Ok(b),
            Raw::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(D::Error::custom(format!("expected a boolean, got {other:?}"))),
            },
        }
    }
}

/// Integers that may be sent as numeric strings.
pub mod lenient_int {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<i64>,
    {
        let value = match Raw::deserialize(deserializer)? {
            Raw::Int(v) => v,
            Raw::Text(text) => text.trim().parse::<i64>().map_err(|_| {
                D::Error::custom(format!("expected an integer, got {text:?}"))
            })?,
        };
        T::try_from(value).map_err(|_| D::Error::custom(format!("integer {value} out of range")))
    }
}

/// A star rating, leniently typed but always within
/// [`MIN_RATING`](crate::MIN_RATING)..=[`MAX_RATING`](crate::MAX_RATING).
pub mod lenient_rating {
    use serde::Deserializer;
    use serde::de::Error as _;

    use crate::types::{MAX_RATING, MIN_RATING};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
        let rating: i64 = super::lenient_int::deserialize(deserializer)?;
        if !(i64::from(MIN_RATING)..=i64::from(MAX_RATING)).contains(&rating) {
            return Err(D::Error::custom(format!(
                "rating {rating} outside {MIN_RATING}..={MAX_RATING}"
            )));
        }
        // In range, so the narrowing cannot fail.
        u8::try_from(rating).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Restaurant, Review};

    const RESTAURANT: &str = r#"{
        "name": "Mission Chinese Food",
        "neighborhood": "Manhattan",
        "photograph": "1",
        "address": "171 E Broadway, New York, NY 10002",
        "latlng": { "lat": 40.713829, "lng": -73.989667 },
        "cuisine_type": "Asian",
        "operating_hours": { "Monday": "5:30 pm - 11:00 pm" },
        "createdAt": 1504095563444,
        "updatedAt": "2018-06-10T14:08:39.000Z",
        "id": 1,
        "is_favorite": "false"
    }"#;

    #[test]
    fn test_restaurant_with_string_favorite() {
        let r: Restaurant = serde_json::from_str(RESTAURANT).unwrap();
        assert_eq!(r.id, 1);
        assert!(!r.is_favorite);
        assert_eq!(r.photograph.as_deref(), Some("1"));
        assert_eq!(crate::to_unix_millis(r.created_at), 1_504_095_563_444);
    }

    #[test]
    fn test_restaurant_missing_favorite_defaults_false() {
        let json = RESTAURANT.replace(r#""is_favorite": "false""#, r#""extra": 1"#);
        let r: Restaurant = serde_json::from_str(&json).unwrap();
        assert!(!r.is_favorite);
    }

    #[test]
    fn test_review_with_string_ids_and_rfc3339() {
        let json = r#"{
            "id": 31,
            "restaurant_id": "4",
            "name": "Ana",
            "rating": "5",
            "comments": "Lovely",
            "createdAt": "2018-06-10T14:08:39Z"
        }"#;
        let review: Review = serde_json::from_str(json).unwrap();
        assert_eq!(review.restaurant_id, 4);
        assert_eq!(review.rating, 5);
        assert_eq!(review.created_at.unix_timestamp(), 1_528_639_719);
    }

    #[test]
    fn test_review_rejects_bad_rating_text() {
        let json = r#"{"id": 1, "restaurant_id": 1, "name": "x", "rating": "lots",
                       "comments": "", "createdAt": 0}"#;
        assert!(serde_json::from_str::<Review>(json).is_err());
    }

    #[test]
    fn test_review_rejects_rating_out_of_range() {
        for rating in ["0", "9", "\"6\"", "300", "-1"] {
            let json = format!(
                r#"{{"id": 1, "restaurant_id": 1, "name": "x", "rating": {rating},
                     "comments": "", "createdAt": 0}}"#
            );
            assert!(
                serde_json::from_str::<Review>(&json).is_err(),
                "rating {rating} was accepted"
            );
        }
    }

    #[test]
    fn test_review_accepts_rating_bounds() {
        for rating in ["1", "5", "\"3\""] {
            let json = format!(
                r#"{{"id": 1, "restaurant_id": 1, "name": "x", "rating": {rating},
                     "comments": "", "createdAt": 0}}"#
            );
            assert!(serde_json::from_str::<Review>(&json).is_ok(), "rating {rating}");
        }
    }

    #[test]
    fn test_review_serializes_millis() {
        let json = r#"{"id": 2, "restaurant_id": 1, "name": "x", "rating": 3,
                       "comments": "ok", "createdAt": 1504095567183}"#;
        let review: Review = serde_json::from_str(json).unwrap();
        let value = serde_json::to_value(&review).unwrap();
        assert_eq!(value["createdAt"], 1_504_095_567_183_i64);
    }
}
