//! Source model and GMPE trees built together, the way a hazard run pairs
//! them.

use std::collections::{BTreeMap, HashMap};

use logictree::prelude::*;
use logictree::Realization;
use logictree_test::{registry, source_model_xml, BranchSetXml, LogicTreeXml};
use rust_decimal::Decimal;

const ACTIVE: &str = "Active Shallow Crust";
const STABLE: &str = "Stable Continental";

fn source_model_tree() -> SourceModelLogicTree {
    let mut models = HashMap::new();
    models.insert(
        "sm1.xml".to_string(),
        source_model_xml(&[("a", SourceType::Point, ACTIVE), ("b", SourceType::Area, STABLE)]),
    );
    models.insert(
        "sm2.xml".to_string(),
        source_model_xml(&[("c", SourceType::ComplexFault, ACTIVE)]),
    );
    let xml = LogicTreeXml::new()
        .level([BranchSetXml::new("bs1", "sourceModel")
            .branch("sm1", "sm1.xml", "0.5")
            .branch("sm2", "sm2.xml", "0.5")])
        .level([BranchSetXml::new("bs2", "maxMagGRRelative")
            .attr("applyToSourceType", "point")
            .branch("mmax+", "0.2", "0.25")
            .branch("mmax0", "0.0", "0.5")
            .branch("mmax-", "-0.2", "0.25")])
        .to_xml();
    SourceModelLogicTree::with_loader(&xml, ".", "smlt.xml", &models, BuildOptions::default())
        .unwrap()
}

fn gmpe_xml() -> String {
    LogicTreeXml::new()
        .level([BranchSetXml::new("g1", "gmpeModel")
            .attr("applyToTectonicRegionType", ACTIVE)
            .branch("ba08", "BooreAtkinson2008", "0.5")
            .branch("cy08", "ChiouYoungs2008", "0.5")])
        .level([BranchSetXml::new("g2", "gmpeModel")
            .attr("applyToTectonicRegionType", STABLE)
            .branch("t02", "ToroEtAl2002", "1.0")])
        .level([BranchSetXml::new("g3", "gmpeModel")
            .attr("applyToTectonicRegionType", "Volcanic")
            .branch("s97", "SadighEtAl1997", "1.0")])
        .to_xml()
}

#[test]
fn test_gmpe_tree_covers_source_model_regions() {
    let sm = source_model_tree();
    let gmpe = GmpeLogicTree::new(
        sm.tectonic_region_types().iter().cloned(),
        &registry(),
        &gmpe_xml(),
        ".",
        "gmpelt.xml",
        BuildOptions::default(),
    )
    .unwrap();

    assert_eq!(sm.tree().num_paths(), 6);
    assert_eq!(gmpe.tree().num_paths(), 2);

    let mut total = Decimal::ZERO;
    for source in sm.realizations(RealizationMode::Enumerate) {
        for gsims in gmpe.realizations(RealizationMode::Enumerate) {
            let gsims = gsims.unwrap();
            total += source.weight.unwrap() * gsims.weight.unwrap();
        }
    }
    assert_eq!(total, Decimal::ONE);
}

#[test]
fn test_flat_tree_matches_gmpe_tree() {
    let sm = source_model_tree();
    let keys: Vec<String> = sm.tectonic_region_types().iter().cloned().collect();

    let flat = GsimLogicTree::new(&gmpe_xml(), "gmpelt.xml", keys.clone()).unwrap();
    let gmpe = GmpeLogicTree::new(
        keys,
        &registry(),
        &gmpe_xml(),
        ".",
        "gmpelt.xml",
        BuildOptions::default(),
    )
    .unwrap();

    let from_flat: Vec<Realization<BTreeMap<String, String>>> = flat.iter().collect();
    let from_tree: Vec<Realization<BTreeMap<String, String>>> = gmpe
        .realizations(RealizationMode::Enumerate)
        .map(|r| {
            r.unwrap().map(|mapping| {
                mapping
                    .into_iter()
                    .map(|(trt, gsim)| (trt, gsim.name().to_string()))
                    .collect()
            })
        })
        .collect();
    assert_eq!(from_flat, from_tree);
}

#[test]
fn test_sampled_run_is_reproducible() {
    let config = LogicTreeConfig::new().with_sampling(8, 2024);
    let sm = source_model_tree();

    let first: Vec<Vec<String>> = sm
        .realizations(config.realization_mode())
        .map(|r| r.lt_path)
        .collect();
    let second: Vec<Vec<String>> = sm
        .realizations(config.realization_mode())
        .map(|r| r.lt_path)
        .collect();
    assert_eq!(first.len(), 8);
    assert_eq!(first, second);
}
