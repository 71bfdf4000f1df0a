//! Translation between domain objects and node property bags

use graphrepo_core::{Error, PropertyBag, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// Converts domain objects to and from the property bags stored on nodes
///
/// Implementations must round-trip: `from_storage(to_storage(x))` should give
/// back `x` for any object that came out of storage. NaN and infinite floats
/// have no JSON form and are rejected with [`Error::Mapping`] when a row is
/// built, so they never come back out.
pub trait Mapper<T>: Send + Sync {
    /// Domain object to stored properties
    fn to_storage(&self, object: &T) -> Result<PropertyBag>;

    /// Stored properties to domain object
    fn from_storage(&self, bag: PropertyBag) -> Result<T>;
}

/// Mapper for services whose domain type is the property bag itself
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl Mapper<PropertyBag> for IdentityMapper {
    fn to_storage(&self, object: &PropertyBag) -> Result<PropertyBag> {
        Ok(object.clone())
    }

    fn from_storage(&self, bag: PropertyBag) -> Result<PropertyBag> {
        Ok(bag)
    }
}

/// Mapper for any serde-compatible struct whose fields are scalars or lists
///
/// `None` fields are stored as null, which the database drops on create.
/// serde_json turns NaN and infinite `f64` fields into null as well.
pub struct SerdeMapper<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeMapper<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SerdeMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SerdeMapper<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SerdeMapper<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerdeMapper")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Mapper<T> for SerdeMapper<T>
where
    T: Serialize + DeserializeOwned,
{
    fn to_storage(&self, object: &T) -> Result<PropertyBag> {
        let value = serde_json::to_value(object).map_err(|e| {
            Error::mapping(format!(
                "Failed to serialize {}: {e}",
                std::any::type_name::<T>()
            ))
        })?;
        PropertyBag::from_json(value)
    }

    fn from_storage(&self, bag: PropertyBag) -> Result<T> {
        serde_json::from_value(bag.to_json()?).map_err(|e| {
            Error::mapping(format!(
                "Failed to deserialize {}: {e}",
                std::any::type_name::<T>()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphrepo_core::PropertyValue;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Person {
        name: String,
        age: i64,
        tags: Vec<String>,
    }

    #[test]
    fn test_identity_round_trip() {
        let bag = PropertyBag::new()
            .with("name", "ada")
            .with("score", 1.5f64)
            .with("tags", vec!["x", "y"]);
        let mapper = IdentityMapper;
        let stored = mapper.to_storage(&bag).unwrap();
        assert_eq!(mapper.from_storage(stored).unwrap(), bag);
    }

    #[test]
    fn test_serde_mapper_round_trip() {
        let person = Person {
            name: "ada".to_string(),
            age: 36,
            tags: vec!["math".to_string()],
        };
        let mapper = SerdeMapper::<Person>::new();
        let bag = mapper.to_storage(&person).unwrap();
        assert_eq!(bag.get("age"), Some(&PropertyValue::Integer(36)));
        assert_eq!(mapper.from_storage(bag).unwrap(), person);
    }

    #[test]
    fn test_serde_mapper_reports_missing_fields() {
        let mapper = SerdeMapper::<Person>::new();
        let err = mapper
            .from_storage(PropertyBag::new().with("name", "ada"))
            .unwrap_err();
        assert!(matches!(err, Error::Mapping(_)));
    }

    #[test]
    fn test_serde_mapper_rejects_nested_structs() {
        #[derive(Serialize, Deserialize)]
        struct Nested {
            inner: Person,
        }
        let mapper = SerdeMapper::<Nested>::new();
        let nested = Nested {
            inner: Person {
                name: "ada".to_string(),
                age: 1,
                tags: vec![],
            },
        };
        assert!(mapper.to_storage(&nested).is_err());
    }
}
