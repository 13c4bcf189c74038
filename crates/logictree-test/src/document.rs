//! Builders for logic tree documents.
//!
//! # Example
//!
//! ```
//! use logictree_test::{BranchSetXml, LogicTreeXml};
//!
//! let xml = LogicTreeXml::new()
//!     .level([BranchSetXml::new("bs1", "sourceModel").branch("b1", "sm.xml", "1.0")])
//!     .to_xml();
//! assert!(xml.contains("branchingLevelID=\"bl1\""));
//! ```

use std::fmt::Write;

/// One `logicTreeBranchSet` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSetXml {
    id: String,
    uncertainty_type: String,
    attrs: Vec<(String, String)>,
    branches: Vec<(String, String, String)>,
}

impl BranchSetXml {
    pub fn new(id: impl Into<String>, uncertainty_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uncertainty_type: uncertainty_type.into(),
            attrs: Vec::new(),
            branches: Vec::new(),
        }
    }

    /// Adds an attribute such as `applyToSources` or `applyToBranches`.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Adds a branch; `weight` is written verbatim.
    pub fn branch(
        mut self,
        id: impl Into<String>,
        value: impl Into<String>,
        weight: impl Into<String>,
    ) -> Self {
        self.branches.push((id.into(), value.into(), weight.into()));
        self
    }

    fn write_to(&self, out: &mut String) {
        let _ = write!(
            out,
            "      <logicTreeBranchSet branchSetID=\"{}\" uncertaintyType=\"{}\"",
            self.id, self.uncertainty_type
        );
        for (name, value) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape(value));
        }
        out.push_str(">\n");
        for (id, value, weight) in &self.branches {
            let _ = writeln!(out, "        <logicTreeBranch branchID=\"{id}\">");
            let _ = writeln!(
                out,
                "          <uncertaintyModel>{}</uncertaintyModel>",
                escape(value)
            );
            let _ = writeln!(out, "          <uncertaintyWeight>{weight}</uncertaintyWeight>");
            out.push_str("        </logicTreeBranch>\n");
        }
        out.push_str("      </logicTreeBranchSet>\n");
    }
}

/// A whole logic tree document; levels get ids `bl1`, `bl2`, ...
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicTreeXml {
    levels: Vec<Vec<BranchSetXml>>,
}

impl LogicTreeXml {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a branching level holding the given branchsets.
    pub fn level(mut self, branchsets: impl IntoIterator<Item = BranchSetXml>) -> Self {
        self.levels.push(branchsets.into_iter().collect());
        self
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::from(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <nrml xmlns=\"http://openquake.org/xmlns/nrml/0.4\">\n  \
             <logicTree logicTreeID=\"lt1\">\n",
        );
        for (n, level) in self.levels.iter().enumerate() {
            let _ = writeln!(
                out,
                "    <logicTreeBranchingLevel branchingLevelID=\"bl{}\">",
                n + 1
            );
            for branchset in level {
                branchset.write_to(&mut out);
            }
            out.push_str("    </logicTreeBranchingLevel>\n");
        }
        out.push_str("  </logicTree>\n</nrml>\n");
        out
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}
