//! Streaming scan of source model documents.
//!
//! Only the identity of each source is needed: id, typology and tectonic
//! region. Source elements are recognised by their tag and their subtrees
//! are skipped with a reused buffer, so memory stays flat however many
//! sources a document holds.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use logictree_core::SourceType;

/// Opens source model documents referenced by a source model logic tree.
pub trait SourceModelLoader {
    fn open(&self, name: &str) -> io::Result<Box<dyn BufRead + '_>>;
}

/// Reads source models from files relative to a base directory.
#[derive(Debug, Clone)]
pub struct FileSystemLoader {
    basepath: PathBuf,
}

impl FileSystemLoader {
    pub fn new(basepath: impl Into<PathBuf>) -> Self {
        Self {
            basepath: basepath.into(),
        }
    }
}

impl SourceModelLoader for FileSystemLoader {
    fn open(&self, name: &str) -> io::Result<Box<dyn BufRead + '_>> {
        let file = File::open(self.basepath.join(name))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// In-memory source models keyed by file name.
impl SourceModelLoader for HashMap<String, String> {
    fn open(&self, name: &str) -> io::Result<Box<dyn BufRead + '_>> {
        let content = self.get(name).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no source model named {name:?}"),
            )
        })?;
        Ok(Box::new(content.as_bytes()))
    }
}

/// Source identities collected from every scanned source model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceModelData {
    pub source_ids: BTreeSet<String>,
    pub source_types: BTreeSet<SourceType>,
    pub tectonic_region_types: BTreeSet<String>,
}

impl SourceModelData {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, id: String, source_type: SourceType, trt: String) {
        self.source_ids.insert(id);
        self.source_types.insert(source_type);
        self.tectonic_region_types.insert(trt);
    }
}

/// Scans one source model document, adding its sources to `data`.
///
/// Returns the number of sources found.
pub fn scan_source_model<R: BufRead>(input: R, data: &mut SourceModelData) -> Result<usize, String> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();
    let mut found = 0;
    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| format!("{} (at byte {})", e, reader.error_position()))?;
        match event {
            Event::Start(e) => {
                if let Some((id, source_type, trt)) = source_identity(&e)? {
                    let end = e.to_end().into_owned();
                    reader
                        .read_to_end_into(end.name(), &mut skip_buf)
                        .map_err(|err| err.to_string())?;
                    skip_buf.clear();
                    data.record(id, source_type, trt);
                    found += 1;
                }
            }
            Event::Empty(e) => {
                if let Some((id, source_type, trt)) = source_identity(&e)? {
                    data.record(id, source_type, trt);
                    found += 1;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(found)
}

fn source_identity(e: &BytesStart<'_>) -> Result<Option<(String, SourceType, String)>, String> {
    let tag = std::str::from_utf8(e.local_name().as_ref())
        .map_err(|err| err.to_string())?
        .to_string();
    let Some(source_type) = SourceType::from_tag(&tag) else {
        return Ok(None);
    };

    let mut id = None;
    let mut trt = None;
    for attr in e.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        let value = attr.unescape_value().map_err(|err| err.to_string())?;
        match attr.key.local_name().as_ref() {
            b"id" => id = Some(value.into_owned()),
            b"tectonicRegion" => trt = Some(value.into_owned()),
            _ => {}
        }
    }
    let id = id.ok_or_else(|| format!("<{tag}> lacks attribute \"id\""))?;
    let trt = trt.ok_or_else(|| format!("<{tag}> {id:?} lacks attribute \"tectonicRegion\""))?;
    Ok(Some((id, source_type, trt)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<nrml xmlns:gml="http://www.opengis.net/gml" xmlns="http://openquake.org/xmlns/nrml/0.4">
  <sourceModel name="test">
    <pointSource id="1" name="point" tectonicRegion="Active Shallow Crust">
      <pointGeometry><gml:Point><gml:pos>-122.0 38.0</gml:pos></gml:Point></pointGeometry>
      <truncGutenbergRichterMFD aValue="-3.5" bValue="1.0" minMag="5.0" maxMag="6.5"/>
    </pointSource>
    <areaSource id="2" name="area" tectonicRegion="Stable Continental">
      <areaGeometry/>
      <pointSource id="nested" tectonicRegion="ignored"/>
    </areaSource>
    <simpleFaultSource id="3" name="fault" tectonicRegion="Active Shallow Crust"/>
  </sourceModel>
</nrml>"#;

    #[test]
    fn test_scan_collects_identities() {
        let mut data = SourceModelData::new();
        let found = scan_source_model(MODEL.as_bytes(), &mut data).unwrap();

        assert_eq!(found, 3);
        assert!(data.source_ids.contains("2"));
        // subtrees of sources are skipped, not searched
        assert!(!data.source_ids.contains("nested"));
        assert_eq!(
            data.source_types.iter().copied().collect::<Vec<_>>(),
            vec![SourceType::Point, SourceType::Area, SourceType::SimpleFault]
        );
        assert_eq!(data.tectonic_region_types.len(), 2);
    }

    #[test]
    fn test_missing_region_is_reported() {
        let model = "<nrml><sourceModel><pointSource id=\"p1\"/></sourceModel></nrml>";
        let err = scan_source_model(model.as_bytes(), &mut SourceModelData::new()).unwrap_err();
        assert!(err.contains("tectonicRegion"));
        assert!(err.contains("p1"));
    }

    #[test]
    fn test_malformed_model() {
        let model = "<nrml><sourceModel></nrml>";
        assert!(scan_source_model(model.as_bytes(), &mut SourceModelData::new()).is_err());
    }

    #[test]
    fn test_memory_loader() {
        let mut models = HashMap::new();
        models.insert("sm.xml".to_string(), MODEL.to_string());
        assert!(models.open("sm.xml").is_ok());
        assert_eq!(
            models.open("other.xml").err().map(|e| e.kind()),
            Some(io::ErrorKind::NotFound)
        );
    }
}
