//! Source model documents and sources for filter and uncertainty tests.

use std::fmt::Write;

use logictree_core::{GutenbergRichterMfd, SeismicSource, SourceType, TruncatedGrMfd};

/// Renders a source model document with one element per
/// `(id, source type, tectonic region)` entry.
///
/// Each source gets a small geometry and distribution subtree so scanning
/// has something to skip.
pub fn source_model_xml(sources: &[(&str, SourceType, &str)]) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <nrml xmlns:gml=\"http://www.opengis.net/gml\" \
         xmlns=\"http://openquake.org/xmlns/nrml/0.4\">\n  \
         <sourceModel name=\"test source model\">\n",
    );
    for (id, source_type, trt) in sources {
        let tag = source_type.tag();
        let _ = writeln!(
            out,
            "    <{tag} id=\"{id}\" name=\"source {id}\" tectonicRegion=\"{trt}\">"
        );
        out.push_str("      <geometry><gml:pos>-122.0 38.0</gml:pos></geometry>\n");
        out.push_str(
            "      <truncGutenbergRichterMFD aValue=\"-3.5\" bValue=\"1.0\" minMag=\"5.0\" maxMag=\"6.5\"/>\n",
        );
        let _ = writeln!(out, "    </{tag}>");
    }
    out.push_str("  </sourceModel>\n</nrml>\n");
    out
}

/// A seismic source with an optional truncated Gutenberg-Richter
/// distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSource {
    pub id: String,
    pub source_type: SourceType,
    pub trt: String,
    pub mfd: Option<TruncatedGrMfd>,
}

impl TestSource {
    /// Source with `a = 3.5`, `b = 1.0` and magnitudes 5.0 to 6.5.
    pub fn new(id: impl Into<String>, source_type: SourceType, trt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_type,
            trt: trt.into(),
            mfd: Some(TruncatedGrMfd::new(5.0, 6.5, 0.1, 3.5, 1.0)),
        }
    }

    /// Source whose distribution is not of the Gutenberg-Richter family.
    pub fn without_gr(mut self) -> Self {
        self.mfd = None;
        self
    }
}

impl SeismicSource for TestSource {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn tectonic_region_type(&self) -> &str {
        &self.trt
    }

    fn gutenberg_richter_mut(&mut self) -> Option<&mut dyn GutenbergRichterMfd> {
        self.mfd.as_mut().map(|mfd| mfd as &mut dyn GutenbergRichterMfd)
    }
}
