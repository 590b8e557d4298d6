use crate::ast::{Document, Field, FieldValue};
use serde::Serialize;
use std::collections::BTreeMap;

/// Plain data view of a document, for handing to serde formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Boolean(bool),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

pub(crate) fn field_to_value(field: &Field) -> Value {
    match &field.value {
        FieldValue::String(s) => Value::String(s.clone()),
        FieldValue::Bool(b) => Value::Boolean(*b),
        FieldValue::List(list) => Value::Array(list.items().iter().map(field_to_value).collect()),
        integer => Value::Integer(integer.as_int().unwrap_or_default()),
    }
}

/// Sectors become objects of sections, sections objects of fields.
/// Dynfields sit next to the sectors under their `%name%` key.
pub(crate) fn to_value(doc: &Document) -> Value {
    let mut map = BTreeMap::new();
    for sector in doc.sectors() {
        let mut sections = BTreeMap::new();
        for section in sector.sections() {
            let fields = section
                .fields()
                .iter()
                .map(|field| (field.name.clone(), field_to_value(field)))
                .collect();
            sections.insert(section.name.clone(), Value::Object(fields));
        }
        map.insert(sector.name.clone(), Value::Object(sections));
    }
    for dynfield in doc.dynfields() {
        map.insert(format!("%{}%", dynfield.name), field_to_value(dynfield));
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FieldType, List};

    #[test]
    fn test_field_values() {
        let mut list = List::new(FieldType::U32);
        list.push(FieldValue::U32(7)).unwrap();
        assert_eq!(
            field_to_value(&Field::new("l", FieldValue::List(list))),
            Value::Array(vec![Value::Integer(7)])
        );
        assert_eq!(
            field_to_value(&Field::new("n", FieldValue::I8(-3))),
            Value::Integer(-3)
        );
    }

    #[test]
    fn test_dynfields_use_percent_keys() {
        let mut doc = Document::new();
        doc.add_dynfield(Field::new("d", FieldValue::Bool(false))).unwrap();
        let Value::Object(map) = to_value(&doc) else {
            panic!("expected an object");
        };
        assert_eq!(map.get("%d%"), Some(&Value::Boolean(false)));
    }
}
