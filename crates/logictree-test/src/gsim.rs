//! Ground-motion-model registry fixture.

use logictree_core::GsimRegistry;

/// Models registered by [`registry`].
pub const GSIM_NAMES: [&str; 5] = [
    "AkkarBommer2010",
    "BooreAtkinson2008",
    "ChiouYoungs2008",
    "SadighEtAl1997",
    "ToroEtAl2002",
];

/// A registry holding every model in [`GSIM_NAMES`].
pub fn registry() -> GsimRegistry {
    GsimRegistry::from_names(GSIM_NAMES)
}
