//! Structural checks for logic tree documents.
//!
//! The rule table is built on first use and shared by every builder in the
//! process. It is never mutated afterwards.

use std::str::FromStr;
use std::sync::OnceLock;

use logictree_core::{SourceType, UncertaintyType};

use crate::document::Element;

static SCHEMA: OnceLock<Schema> = OnceLock::new();

/// Returns the process-wide logic tree schema.
pub fn schema() -> &'static Schema {
    SCHEMA.get_or_init(Schema::logic_tree)
}

/// A schema violation: the element line and a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub line: u64,
    pub message: String,
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

#[derive(Debug)]
struct ChildRule {
    tag: &'static str,
    min: usize,
    max: Option<usize>,
}

#[derive(Debug)]
struct ElementRule {
    tag: &'static str,
    required: &'static [&'static str],
    optional: &'static [&'static str],
    children: Vec<ChildRule>,
}

/// Element nesting, attributes, cardinalities and attribute vocabularies.
#[derive(Debug)]
pub struct Schema {
    root: &'static str,
    rules: Vec<ElementRule>,
}

const FILTER_ATTRIBUTES: &[&str] = &[
    "applyToBranches",
    "applyToSources",
    "applyToSourceType",
    "applyToTectonicRegionType",
];

fn one(tag: &'static str) -> ChildRule {
    ChildRule {
        tag,
        min: 1,
        max: Some(1),
    }
}

fn at_least_one(tag: &'static str) -> ChildRule {
    ChildRule {
        tag,
        min: 1,
        max: None,
    }
}

impl Schema {
    fn logic_tree() -> Self {
        let rules = vec![
            ElementRule {
                tag: "nrml",
                required: &[],
                optional: &[],
                children: vec![one("logicTree")],
            },
            ElementRule {
                tag: "logicTree",
                required: &["logicTreeID"],
                optional: &[],
                children: vec![at_least_one("logicTreeBranchingLevel")],
            },
            ElementRule {
                tag: "logicTreeBranchingLevel",
                required: &["branchingLevelID"],
                optional: &[],
                children: vec![at_least_one("logicTreeBranchSet")],
            },
            ElementRule {
                tag: "logicTreeBranchSet",
                required: &["branchSetID", "uncertaintyType"],
                optional: FILTER_ATTRIBUTES,
                children: vec![at_least_one("logicTreeBranch")],
            },
            ElementRule {
                tag: "logicTreeBranch",
                required: &["branchID"],
                optional: &[],
                children: vec![one("uncertaintyModel"), one("uncertaintyWeight")],
            },
            ElementRule {
                tag: "uncertaintyModel",
                required: &[],
                optional: &[],
                children: Vec::new(),
            },
            ElementRule {
                tag: "uncertaintyWeight",
                required: &[],
                optional: &[],
                children: Vec::new(),
            },
        ];
        Self {
            root: "nrml",
            rules,
        }
    }

    /// Checks a whole document, reporting the first violation found in
    /// document order.
    pub fn validate(&self, root: &Element) -> Result<(), SchemaViolation> {
        if root.tag() != self.root {
            return Err(violation(
                root,
                format!("root element must be <{}>, found <{}>", self.root, root.tag()),
            ));
        }
        self.validate_element(root)
    }

    fn validate_element(&self, element: &Element) -> Result<(), SchemaViolation> {
        let Some(rule) = self.rules.iter().find(|r| r.tag == element.tag()) else {
            return Err(violation(
                element,
                format!("unexpected element <{}>", element.tag()),
            ));
        };

        for name in rule.required {
            if element.attr(name).is_none() {
                return Err(violation(
                    element,
                    format!("<{}> lacks required attribute {:?}", rule.tag, name),
                ));
            }
        }
        for (name, _) in element.attrs() {
            let known = rule.required.contains(&name.as_str())
                || rule.optional.contains(&name.as_str())
                || name == "xmlns"
                || name.starts_with("xmlns:");
            if !known {
                return Err(violation(
                    element,
                    format!("attribute {:?} is not allowed on <{}>", name, rule.tag),
                ));
            }
        }
        self.validate_vocabulary(element)?;

        for child in element.children() {
            if !rule.children.iter().any(|c| c.tag == child.tag()) {
                return Err(violation(
                    child,
                    format!("<{}> is not allowed inside <{}>", child.tag(), rule.tag),
                ));
            }
        }
        for child_rule in &rule.children {
            let count = element.children_named(child_rule.tag).count();
            let too_many = child_rule.max.is_some_and(|max| count > max);
            if count < child_rule.min || too_many {
                return Err(violation(
                    element,
                    format!(
                        "<{}> must contain {} <{}> element(s), found {}",
                        rule.tag,
                        cardinality(child_rule),
                        child_rule.tag,
                        count
                    ),
                ));
            }
        }

        element
            .children()
            .iter()
            .try_for_each(|child| self.validate_element(child))
    }

    fn validate_vocabulary(&self, element: &Element) -> Result<(), SchemaViolation> {
        if element.tag() != "logicTreeBranchSet" {
            return Ok(());
        }
        if let Some(ut) = element.attr("uncertaintyType") {
            UncertaintyType::from_str(ut).map_err(|msg| violation(element, msg))?;
        }
        if let Some(st) = element.attr("applyToSourceType") {
            SourceType::from_str(st).map_err(|msg| violation(element, msg))?;
        }
        Ok(())
    }
}

fn cardinality(rule: &ChildRule) -> String {
    match rule.max {
        Some(max) if max == rule.min => format!("exactly {max}"),
        Some(max) => format!("{}..{}", rule.min, max),
        None => format!("at least {}", rule.min),
    }
}

fn violation(element: &Element, message: impl Into<String>) -> SchemaViolation {
    SchemaViolation {
        line: element.line(),
        message: message.into(),
    }
}
