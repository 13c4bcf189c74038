//! Tests for core node types.

use super::*;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
struct Source {
    id: &'static str,
    source_type: SourceType,
    trt: &'static str,
    mfd: Option<TruncatedGrMfd>,
}

impl Source {
    fn gr(id: &'static str, source_type: SourceType, trt: &'static str) -> Self {
        Self {
            id,
            source_type,
            trt,
            mfd: Some(TruncatedGrMfd::new(5.0, 7.0, 0.1, 3.5, 1.0)),
        }
    }
}

impl SeismicSource for Source {
    fn source_id(&self) -> &str {
        self.id
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn tectonic_region_type(&self) -> &str {
        self.trt
    }

    fn gutenberg_richter_mut(&mut self) -> Option<&mut dyn GutenbergRichterMfd> {
        self.mfd.as_mut().map(|mfd| mfd as &mut dyn GutenbergRichterMfd)
    }
}

fn w(text: &str) -> Weight {
    weight::parse_weight(text).unwrap()
}

mod uncertainty_types {
    use super::*;

    #[test]
    fn test_round_trip_spelling() {
        for ut in UncertaintyType::ALL {
            assert_eq!(ut.as_str().parse::<UncertaintyType>().unwrap(), ut);
        }
        assert!("maxMagGrRelative".parse::<UncertaintyType>().is_err());
    }

    #[test]
    fn test_absolute_types() {
        assert!(UncertaintyType::AbGrAbsolute.is_absolute());
        assert!(UncertaintyType::MaxMagGrAbsolute.is_absolute());
        assert!(!UncertaintyType::BGrRelative.is_absolute());
        assert!(!UncertaintyType::SourceModel.is_gutenberg_richter());
        assert!(!UncertaintyType::GmpeModel.is_gutenberg_richter());
        assert!(UncertaintyType::BGrRelative.is_gutenberg_richter());
    }

    #[test]
    fn test_filter_attribute_names() {
        assert_eq!(
            FilterKind::from_attribute("applyToSources"),
            Some(FilterKind::Sources)
        );
        assert_eq!(FilterKind::from_attribute("applyToBranches"), None);
        assert_eq!(
            Filters::new()
                .with_sources(["a"])
                .with_tectonic_region_type("Active Shallow Crust")
                .len(),
            2
        );
    }

    #[test]
    fn test_source_type_tags() {
        assert_eq!(SourceType::from_tag("areaSource"), Some(SourceType::Area));
        assert_eq!(SourceType::from_tag("pointSources"), None);
        assert_eq!("simpleFault".parse::<SourceType>().unwrap(), SourceType::SimpleFault);
    }
}

mod weights {
    use super::*;

    #[test]
    fn test_exact_parse() {
        assert_eq!(w("0.1") + w("0.2"), w("0.3"));
        assert_eq!(w("1.0"), Decimal::ONE);
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            weight::parse_weight("-0.1"),
            Err(weight::WeightParseError::OutOfRange(_))
        ));
        assert!(matches!(
            weight::parse_weight("0.5.1"),
            Err(weight::WeightParseError::Malformed(_))
        ));
    }

    #[test]
    fn test_thirds_do_not_sum_to_one() {
        let third = w("0.333");
        assert!(!weight::sums_to_one([&third, &third, &third]));
        let rest = w("0.334");
        assert!(weight::sums_to_one([&third, &third, &rest]));
    }

    #[test]
    fn test_product() {
        assert_eq!(weight::product([w("0.3"), w("0.4")]), w("0.12"));
        assert_eq!(weight::product(std::iter::empty()), Decimal::ONE);
    }
}

mod branchset {
    use super::*;

    fn branchset(ut: UncertaintyType, filters: Filters) -> BranchSet {
        BranchSet::new("bs1", ut, filters)
    }

    #[test]
    fn test_branch_lookup() {
        let mut bs = branchset(UncertaintyType::BGrRelative, Filters::new());
        bs.push_branch(Branch::new("b1", w("0.4"), UncertaintyValue::Float(0.1)));
        bs.push_branch(Branch::new("b2", w("0.6"), UncertaintyValue::Float(-0.1)));

        assert_eq!(bs.branch("b2").unwrap().weight(), w("0.6"));
        assert!(bs.branch("b3").is_none());
        assert_eq!(bs.total_weight(), Decimal::ONE);
    }

    #[test]
    fn test_no_filters_accepts_everything() {
        let bs = branchset(UncertaintyType::BGrRelative, Filters::new());
        assert!(bs.filter_source(&Source::gr("1", SourceType::Area, "Stable Continental")));
    }

    #[test]
    fn test_tectonic_region_filter() {
        let bs = branchset(
            UncertaintyType::BGrRelative,
            Filters::new().with_tectonic_region_type("Active Shallow Crust"),
        );
        assert!(bs.filter_source(&Source::gr("1", SourceType::Point, "Active Shallow Crust")));
        assert!(!bs.filter_source(&Source::gr("1", SourceType::Point, "Subduction Interface")));
    }

    #[test]
    fn test_point_filter_rejects_area_sources() {
        let bs = branchset(
            UncertaintyType::MaxMagGrRelative,
            Filters::new().with_source_type(SourceType::Point),
        );
        assert!(bs.filter_source(&Source::gr("1", SourceType::Point, "x")));
        assert!(!bs.filter_source(&Source::gr("1", SourceType::Area, "x")));
    }

    #[test]
    fn test_sources_filter() {
        let bs = branchset(
            UncertaintyType::BGrRelative,
            Filters::new().with_sources(["src_a", "src_b"]),
        );
        assert!(bs.filter_source(&Source::gr("src_b", SourceType::Point, "x")));
        assert!(!bs.filter_source(&Source::gr("src_c", SourceType::Point, "x")));
    }

    #[test]
    fn test_apply_ab_absolute() {
        let bs = branchset(
            UncertaintyType::AbGrAbsolute,
            Filters::new().with_sources(["src_a"]),
        );
        let mut source = Source::gr("src_a", SourceType::Point, "x");
        bs.apply_uncertainty(&UncertaintyValue::FloatPair(4.2, 0.9), &mut source);

        let mfd = source.mfd.unwrap();
        assert_eq!(mfd.a_val, 4.2);
        assert_eq!(mfd.b_val, 0.9);
    }

    #[test]
    fn test_apply_relative_and_absolute_max_mag() {
        let mut source = Source::gr("src_a", SourceType::Point, "x");

        branchset(UncertaintyType::BGrRelative, Filters::new())
            .apply_uncertainty(&UncertaintyValue::Float(0.25), &mut source);
        branchset(UncertaintyType::MaxMagGrRelative, Filters::new())
            .apply_uncertainty(&UncertaintyValue::Float(0.5), &mut source);
        assert_eq!(source.mfd.unwrap().b_val, 1.25);
        assert_eq!(source.mfd.unwrap().max_mag, 7.5);

        branchset(UncertaintyType::MaxMagGrAbsolute, Filters::new())
            .apply_uncertainty(&UncertaintyValue::Float(6.8), &mut source);
        assert_eq!(source.mfd.unwrap().max_mag, 6.8);
    }

    #[test]
    fn test_filtered_out_source_is_untouched() {
        let bs = branchset(
            UncertaintyType::BGrRelative,
            Filters::new().with_tectonic_region_type("Active Shallow Crust"),
        );
        let mut source = Source::gr("src_a", SourceType::Point, "Stable Continental");
        let before = source.mfd;
        bs.apply_uncertainty(&UncertaintyValue::Float(0.3), &mut source);
        assert_eq!(source.mfd, before);
    }

    #[test]
    fn test_non_gutenberg_richter_source_is_a_no_op() {
        let bs = branchset(UncertaintyType::BGrRelative, Filters::new());
        let mut source = Source {
            mfd: None,
            ..Source::gr("src_a", SourceType::Point, "x")
        };
        bs.apply_uncertainty(&UncertaintyValue::Float(0.3), &mut source);
        assert!(source.mfd.is_none());
    }

    #[test]
    fn test_child_link() {
        let mut branch = Branch::new("b1", Decimal::ONE, UncertaintyValue::Float(0.0));
        assert!(branch.is_leaf());
        branch.set_child_branchset(BranchSetId(3));
        assert_eq!(branch.child_branchset(), Some(BranchSetId(3)));
    }
}

mod gsims {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let registry = GsimRegistry::from_names(["SadighEtAl1997", "ChiouYoungs2008"]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("SadighEtAl1997").unwrap().name(), "SadighEtAl1997");
        assert_eq!(registry.names(), vec!["ChiouYoungs2008", "SadighEtAl1997"]);
    }

    #[test]
    fn test_gsim_values_compare_by_name() {
        let registry = GsimRegistry::from_names(["SadighEtAl1997"]);
        let a = UncertaintyValue::Gsim(registry.get("SadighEtAl1997").unwrap());
        let b = UncertaintyValue::Gsim(std::sync::Arc::new(NamedGsim::new("SadighEtAl1997")));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "SadighEtAl1997");
    }
}

mod errors {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validation_message_is_one_line() {
        let err = LogicTreeError::Validation {
            basepath: PathBuf::from("/models"),
            filename: "lt.xml".to_string(),
            line: 12,
            message: "branchID \"b1\" is not unique".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("lt.xml"));
        assert!(text.contains("line 12"));
        assert!(!text.contains('\n'));
        assert!(err.is_validation());
        assert_eq!(err.message(), "branchID \"b1\" is not unique");
    }

    #[test]
    fn test_realization_map() {
        let r = Realization::new(1, None, vec!["b1".to_string()]);
        let mapped = r.map(|v| v + 1);
        assert_eq!(mapped.value, 2);
        assert_eq!(mapped.lt_path, vec!["b1"]);
    }
}
