// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Conversion of relative paths to and from their text form, as described by OPC UA Part 4,
//! Appendix A, e.g. `/Objects/2:MyDevices.2:MyVariable1`.

use std::fmt;

use regex::Regex;

use crate::types::{
    node_id::{Identifier, NodeId},
    node_ids::ReferenceTypeId,
    qualified_name::QualifiedName,
    service_types::{RelativePath, RelativePathElement},
    status_code::StatusCode,
    string::UAString,
};

/// Browse names of the standard reference types a path may name between `<` and `>`.
const STANDARD_REFERENCE_TYPES: &[(&str, ReferenceTypeId)] = &[
    ("References", ReferenceTypeId::References),
    ("NonHierarchicalReferences", ReferenceTypeId::NonHierarchicalReferences),
    ("HierarchicalReferences", ReferenceTypeId::HierarchicalReferences),
    ("HasChild", ReferenceTypeId::HasChild),
    ("Organizes", ReferenceTypeId::Organizes),
    ("HasEventSource", ReferenceTypeId::HasEventSource),
    ("HasModellingRule", ReferenceTypeId::HasModellingRule),
    ("HasTypeDefinition", ReferenceTypeId::HasTypeDefinition),
    ("Aggregates", ReferenceTypeId::Aggregates),
    ("HasSubtype", ReferenceTypeId::HasSubtype),
    ("HasProperty", ReferenceTypeId::HasProperty),
    ("HasComponent", ReferenceTypeId::HasComponent),
    ("HasNotifier", ReferenceTypeId::HasNotifier),
];

/// Reserved characters in the browse name which must be escaped with a &
const BROWSE_NAME_RESERVED_CHARS: &str = "&/.<>:#!";

impl RelativePath {
    /// The maximum size in chars of any path element.
    const MAX_TOKEN_LEN: usize = 256;
    /// The maximum number of elements in total.
    const MAX_ELEMENTS: usize = 32;

    /// Parses a relative path. The `node_resolver` turns the namespace and browse name written
    /// between `<` and `>` into a reference type id. Unusually long strings, or ones with too many
    /// elements, are rejected.
    pub fn from_str<CB>(path: &str, node_resolver: &CB) -> Result<RelativePath, StatusCode>
    where
        CB: Fn(u16, &str) -> Option<NodeId>,
    {
        let mut elements = Vec::new();
        let mut token = String::with_capacity(path.len());
        let mut escaped_char = false;
        for c in path.chars() {
            if escaped_char {
                escaped_char = false;
            } else if c == '&' {
                escaped_char = true;
            } else if matches!(c, '/' | '.' | '<') && !token.is_empty() {
                // The start of the next element ends the previous one
                Self::push_element(&mut elements, &token, node_resolver)?;
                token.clear();
            }
            token.push(c);
            if token.len() > Self::MAX_TOKEN_LEN {
                error!("Path segment seems unusually long and has been rejected");
                return Err(StatusCode::BadBrowseNameInvalid);
            }
        }
        if !token.is_empty() {
            Self::push_element(&mut elements, &token, node_resolver)?;
        }
        Ok(RelativePath { elements })
    }

    fn push_element<CB>(
        elements: &mut Vec<RelativePathElement>,
        token: &str,
        node_resolver: &CB,
    ) -> Result<(), StatusCode>
    where
        CB: Fn(u16, &str) -> Option<NodeId>,
    {
        if elements.len() == Self::MAX_ELEMENTS {
            error!("Number of elements in relative path is too long, rejecting it");
            Err(StatusCode::BadTooManyOperations)
        } else {
            elements.push(RelativePathElement::from_str(token, node_resolver)?);
            Ok(())
        }
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.elements.iter().try_for_each(|e| write!(f, "{}", e))
    }
}

impl RelativePathElement {
    /// Resolves a reference type name against the standard reference types. A name that is not
    /// standard becomes a string node id in the supplied namespace.
    pub fn default_node_resolver(namespace: u16, browse_name: &str) -> Option<NodeId> {
        let standard = if namespace == 0 {
            STANDARD_REFERENCE_TYPES
                .iter()
                .find(|(name, _)| *name == browse_name)
                .map(|(_, id)| NodeId::from(id))
        } else {
            None
        };
        Some(standard.unwrap_or_else(|| NodeId::new(namespace, UAString::from(browse_name))))
    }

    /// The inverse of `default_node_resolver`, the name used to write a reference type.
    pub fn default_browse_name_resolver(node_id: &NodeId) -> Option<String> {
        match &node_id.identifier {
            Identifier::String(browse_name) => Some(browse_name.as_ref().to_string()),
            Identifier::Numeric(id) if node_id.namespace == 0 => STANDARD_REFERENCE_TYPES
                .iter()
                .find(|(_, r)| *r as u32 == *id)
                .map(|(name, _)| name.to_string()),
            _ => None,
        }
    }

    /// Parse a relative path element according to the OPC UA Part 4 Appendix A BNF
    ///
    /// `<relative-path> ::= <reference-type> <browse-name> [relative-path]`
    /// `<reference-type> ::= '/' | '.' | '<' ['#'] ['!'] <browse-name> '>'`
    /// `<browse-name> ::= [<namespace-index> ':'] <name>`
    ///
    /// e.g. `/foo`, `/0:foo`, `.bar`, `<!NonHierarchicalReferences>foo` or `<#!2:MyReftype>2:blah`
    pub fn from_str<CB>(path: &str, node_resolver: &CB) -> Result<RelativePathElement, StatusCode>
    where
        CB: Fn(u16, &str) -> Option<NodeId>,
    {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"^(?P<reftype>/|\.|(<(?P<flags>#|!|#!)?((?P<nsidx>[0-9]+):)?(?P<name>[^#!>](&>|[^>])*)>))(?P<target>.*)$").unwrap();
        }

        let captures = RE.captures(path).ok_or_else(|| {
            error!("Path {} does not match a relative path", path);
            StatusCode::BadBrowseNameInvalid
        })?;
        let target_name = target_name(captures.name("target").map_or("", |m| m.as_str()))?;

        let (reference_type_id, include_subtypes, is_inverse) =
            match captures.name("reftype").map(|m| m.as_str()) {
                Some("/") => (ReferenceTypeId::HierarchicalReferences.into(), true, false),
                Some(".") => (ReferenceTypeId::Aggregates.into(), true, false),
                _ => {
                    let (include_subtypes, is_inverse) =
                        match captures.name("flags").map(|m| m.as_str()) {
                            Some("#") => (false, false),
                            Some("!") => (true, true),
                            Some("#!") => (false, true),
                            _ => (true, false),
                        };
                    let namespace = match captures.name("nsidx") {
                        Some(ns) => ns.as_str().parse::<u16>().map_err(|_| {
                            error!("Namespace {} is out of range", ns.as_str());
                            StatusCode::BadBrowseNameInvalid
                        })?,
                        None => 0,
                    };
                    let browse_name =
                        unescape_browse_name(captures.name("name").map_or("", |m| m.as_str()));
                    let reference_type_id =
                        node_resolver(namespace, &browse_name).ok_or_else(|| {
                            error!("Unable to resolve a reference type from {}", path);
                            StatusCode::BadReferenceTypeIdInvalid
                        })?;
                    (reference_type_id, include_subtypes, is_inverse)
                }
            };
        Ok(RelativePathElement {
            reference_type_id,
            is_inverse,
            include_subtypes,
            target_name,
        })
    }
}

impl fmt::Display for RelativePathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hierarchical: NodeId = ReferenceTypeId::HierarchicalReferences.into();
        let aggregates: NodeId = ReferenceTypeId::Aggregates.into();
        if self.include_subtypes && !self.is_inverse && self.reference_type_id == hierarchical {
            write!(f, "/")?;
        } else if self.include_subtypes && !self.is_inverse && self.reference_type_id == aggregates
        {
            write!(f, ".")?;
        } else {
            write!(f, "<")?;
            if !self.include_subtypes {
                write!(f, "#")?;
            }
            if self.is_inverse {
                write!(f, "!")?;
            }
            let browse_name = Self::default_browse_name_resolver(&self.reference_type_id)
                .unwrap_or_else(|| self.reference_type_id.to_string());
            if self.reference_type_id.namespace != 0 {
                write!(f, "{}:", self.reference_type_id.namespace)?;
            }
            write!(f, "{}>", escape_browse_name(&browse_name))?;
        }
        if !self.target_name.name.is_null() {
            write!(
                f,
                "{}:{}",
                self.target_name.namespace_index,
                escape_browse_name(self.target_name.name.as_ref())
            )?;
        }
        Ok(())
    }
}

fn escape_browse_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for c in name.chars() {
        if BROWSE_NAME_RESERVED_CHARS.contains(c) {
            result.push('&');
        }
        result.push(c);
    }
    result
}

fn unescape_browse_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        match c {
            '&' => {
                if let Some(c) = chars.next() {
                    result.push(c);
                }
            }
            c => result.push(c),
        }
    }
    result
}

/// Parse a target name into a qualified name, either `nsidx:name` or just `name`. An empty
/// target gives a null name.
fn target_name(target_name: &str) -> Result<QualifiedName, StatusCode> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"^((?P<nsidx>[0-9]+):)?(?P<name>.*)$").unwrap();
    }
    let captures = match RE.captures(target_name) {
        Some(captures) => captures,
        None => return Ok(QualifiedName::null()),
    };
    let namespace = match captures.name("nsidx") {
        Some(ns) => ns.as_str().parse::<u16>().map_err(|_| {
            error!("Namespace {} for target name is out of range", ns.as_str());
            StatusCode::BadBrowseNameInvalid
        })?,
        None => 0,
    };
    let name = match captures.name("name").map(|m| m.as_str()) {
        Some(name) if !name.is_empty() => UAString::from(unescape_browse_name(name)),
        _ => UAString::null(),
    };
    Ok(QualifiedName::new(namespace, name))
}
