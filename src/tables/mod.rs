//! Static reference tables consumed by synonym cleaning and expansion.
//!
//! These are data, not logic: noise markers harvested from ontology comment
//! fields, character-equivalence sets for Greek letters, and anatomy
//! region-qualifier phrases.

pub(crate) mod anatomy;
pub(crate) mod greek;
pub(crate) mod noise;
