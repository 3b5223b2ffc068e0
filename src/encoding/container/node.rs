// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! In-memory node tree of a container file.

use crate::core::{ArrayData, AttrValue, Attributes, CodecError, Result};

/// Node record op codes.
pub const OP_GROUP: u8 = 0x01;
pub const OP_DATASET: u8 = 0x02;

/// Attribute value tags.
pub const TAG_BOOL: u8 = 1;
pub const TAG_INT: u8 = 2;
pub const TAG_FLOAT: u8 = 3;
pub const TAG_STRING: u8 = 4;
pub const TAG_ARRAY: u8 = 5;
pub const TAG_LIST: u8 = 6;
pub const TAG_MAP: u8 = 7;

/// Dataset compression codes.
pub const COMPRESSION_NONE: u8 = 0;
pub const COMPRESSION_ZSTD: u8 = 1;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Group(Group),
    Dataset(Dataset),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Group(g) => &g.name,
            Node::Dataset(d) => &d.name,
        }
    }
}

/// Named container of ordered child nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    pub name: String,
    pub attrs: Attributes,
    pub children: Vec<Node>,
}

/// Named array with attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub attrs: Attributes,
    pub data: ArrayData,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn push_group(&mut self, group: Group) {
        self.children.push(Node::Group(group));
    }

    pub fn push_dataset(&mut self, name: impl Into<String>, attrs: Attributes, data: ArrayData) {
        self.children.push(Node::Dataset(Dataset {
            name: name.into(),
            attrs,
            data,
        }));
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name() == name)
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        match self.child(name) {
            Some(Node::Group(g)) => Some(g),
            _ => None,
        }
    }

    pub fn dataset(&self, name: &str) -> Option<&Dataset> {
        match self.child(name) {
            Some(Node::Dataset(d)) => Some(d),
            _ => None,
        }
    }

    /// Child group that must exist.
    pub fn require_group(&self, name: &str) -> Result<&Group> {
        self.group(name).ok_or_else(|| {
            CodecError::malformed("container", format!("group '{}' has no '{name}' group", self.name))
        })
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.children.iter().filter_map(|c| match c {
            Node::Group(g) => Some(g),
            Node::Dataset(_) => None,
        })
    }

    pub fn datasets(&self) -> impl Iterator<Item = &Dataset> {
        self.children.iter().filter_map(|c| match c {
            Node::Dataset(d) => Some(d),
            Node::Group(_) => None,
        })
    }

    /// String attribute, if present and a string.
    pub fn str_attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(AttrValue::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_lookup() {
        let mut root = Group::new("/");
        root.push_group(Group::new("coordinates"));
        root.push_dataset("time", Attributes::new(), ArrayData::vector(vec![1.0f64]));

        assert!(root.group("coordinates").is_some());
        assert!(root.dataset("time").is_some());
        assert!(root.group("time").is_none());
        assert!(root.require_group("missing").is_err());
        assert_eq!(root.groups().count(), 1);
        assert_eq!(root.datasets().count(), 1);
    }
}
