use core::any::{Any, type_name};
use std::collections::HashMap;
use std::rc::Rc;

use crate::meta::AccessError;

// -----------------------------------------------------------------------------
// FieldValues

/// Staging area for reconstructed field values of one composite instance.
///
/// During deserialization the composite rule resolves every referenced field
/// into this map, then hands it to the registered build function, which moves
/// the values out by name.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use ogx_value::FieldValues;
///
/// let mut values = FieldValues::new();
/// values.insert("firstName", Rc::new(String::from("John"))).unwrap();
///
/// let name: String = values.take("firstName").unwrap();
/// assert_eq!(name, "John");
/// assert!(values.take::<String>("firstName").is_err());
/// ```
#[derive(Default)]
pub struct FieldValues {
    values: HashMap<String, Rc<dyn Any>>,
}

impl FieldValues {
    /// Creates an empty staging map.
    #[inline]
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Stages a resolved value under a field name.
    ///
    /// A second value for the same name is rejected; duplicate field elements
    /// in a document are malformed input, not a last-write-wins case.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: Rc<dyn Any>,
    ) -> Result<(), AccessError> {
        let name = name.into();
        if self.values.contains_key(&name) {
            return Err(AccessError::DuplicateField { field: name });
        }
        self.values.insert(name, value);
        Ok(())
    }

    /// Moves an owned value out of the staging map.
    ///
    /// Fails if the field is absent, has the wrong type, or is still shared
    /// (an owned field's value is referenced exactly once in a well-formed
    /// document).
    pub fn take<T: Any>(&mut self, name: &str) -> Result<T, AccessError> {
        let value = self.remove(name)?;
        let typed = value
            .downcast::<T>()
            .map_err(|_| AccessError::WrongInstanceType {
                expected: type_name::<T>(),
            })?;
        Rc::try_unwrap(typed).map_err(|_| AccessError::SharedValue {
            context: format!("field `{name}`"),
        })
    }

    /// Moves a shared handle out of the staging map.
    ///
    /// The returned [`Rc`] may alias other fields resolved from the same
    /// object element; that aliasing is the point.
    pub fn take_shared<T: Any>(&mut self, name: &str) -> Result<Rc<T>, AccessError> {
        let value = self.remove(name)?;
        value
            .downcast::<T>()
            .map_err(|_| AccessError::WrongInstanceType {
                expected: type_name::<T>(),
            })
    }

    /// Whether a value is staged under the given name.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of staged values.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the staging map is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn remove(&mut self, name: &str) -> Result<Rc<dyn Any>, AccessError> {
        self.values
            .remove(name)
            .ok_or_else(|| AccessError::MissingField {
                field: name.to_string(),
            })
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::FieldValues;
    use crate::meta::AccessError;
    use std::rc::Rc;

    #[test]
    fn take_moves_the_value_out() {
        let mut values = FieldValues::new();
        values.insert("age", Rc::new(33_u32)).unwrap();

        assert_eq!(values.take::<u32>("age").unwrap(), 33);
        assert!(values.is_empty());
    }

    #[test]
    fn take_rejects_wrong_type() {
        let mut values = FieldValues::new();
        values.insert("age", Rc::new(33_u32)).unwrap();

        assert!(matches!(
            values.take::<String>("age"),
            Err(AccessError::WrongInstanceType { .. })
        ));
    }

    #[test]
    fn missing_field_is_an_error() {
        let mut values = FieldValues::new();
        assert!(matches!(
            values.take::<u32>("age"),
            Err(AccessError::MissingField { .. })
        ));
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut values = FieldValues::new();
        values.insert("age", Rc::new(33_u32)).unwrap();
        assert!(matches!(
            values.insert("age", Rc::new(34_u32)),
            Err(AccessError::DuplicateField { .. })
        ));
    }

    #[test]
    fn take_shared_preserves_aliasing() {
        let shared: Rc<String> = Rc::new(String::from("x"));
        let mut values = FieldValues::new();
        values.insert("a", shared.clone()).unwrap();

        let out = values.take_shared::<String>("a").unwrap();
        assert!(Rc::ptr_eq(&out, &shared));
    }
}
