//! Field descriptor lookup used to resolve canonical names.
use std::collections::HashMap;

use crate::{
    error::{PayloadError, PayloadResult},
    types::FieldType,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub fid: u16,
    pub name: String,
    pub field_type: FieldType,
}

/// Source of field descriptors, queried by fid or by name.
pub trait FieldDictionary {
    fn descriptor_by_fid(&self, fid: u16) -> Option<&FieldDescriptor>;
    fn descriptor_by_name(&self, name: &str) -> Option<&FieldDescriptor>;
}

/// In-memory dictionary built once and queried read-only.
#[derive(Debug, Clone, Default)]
pub struct StaticDictionary {
    descriptors: Vec<FieldDescriptor>,
    by_fid: HashMap<u16, usize>,
    by_name: HashMap<String, usize>,
}

impl StaticDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. Fids (when nonzero) and names must be unique.
    pub fn insert(&mut self, descriptor: FieldDescriptor) -> PayloadResult<()> {
        if descriptor.fid == 0 && descriptor.name.is_empty() {
            return Err(PayloadError::NullArgument);
        }
        if descriptor.fid != 0 && self.by_fid.contains_key(&descriptor.fid) {
            return Err(PayloadError::invalid(format!(
                "fid {} is already registered",
                descriptor.fid
            )));
        }
        if !descriptor.name.is_empty() && self.by_name.contains_key(&descriptor.name) {
            return Err(PayloadError::invalid(format!(
                "field name {:?} is already registered",
                descriptor.name
            )));
        }

        let index = self.descriptors.len();
        if descriptor.fid != 0 {
            self.by_fid.insert(descriptor.fid, index);
        }
        if !descriptor.name.is_empty() {
            self.by_name.insert(descriptor.name.clone(), index);
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.descriptors.iter()
    }
}

impl FieldDictionary for StaticDictionary {
    fn descriptor_by_fid(&self, fid: u16) -> Option<&FieldDescriptor> {
        self.by_fid.get(&fid).map(|&i| &self.descriptors[i])
    }

    fn descriptor_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&i| &self.descriptors[i])
    }
}

impl FromIterator<FieldDescriptor> for StaticDictionary {
    /// Later duplicates are ignored.
    fn from_iter<I: IntoIterator<Item = FieldDescriptor>>(iter: I) -> Self {
        let mut dict = Self::new();
        for descriptor in iter {
            let _ = dict.insert(descriptor);
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(fid: u16, name: &str) -> FieldDescriptor {
        FieldDescriptor {
            fid,
            name: name.to_string(),
            field_type: FieldType::I64,
        }
    }

    #[test]
    fn lookup_by_fid_and_name() {
        let dict: StaticDictionary = [descriptor(1, "bid"), descriptor(2, "ask")]
            .into_iter()
            .collect();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.descriptor_by_fid(2).unwrap().name, "ask");
        assert_eq!(dict.descriptor_by_name("bid").unwrap().fid, 1);
        assert!(dict.descriptor_by_fid(3).is_none());
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut dict = StaticDictionary::new();
        dict.insert(descriptor(1, "bid")).unwrap();
        assert!(dict.insert(descriptor(1, "other")).is_err());
        assert!(dict.insert(descriptor(5, "bid")).is_err());
        assert!(matches!(
            dict.insert(descriptor(0, "")),
            Err(PayloadError::NullArgument)
        ));
        assert_eq!(dict.len(), 1);
    }
}
