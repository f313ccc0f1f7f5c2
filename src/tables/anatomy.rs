//! Region-qualifier phrases for anatomy terms.
//!
//! Tissue synonyms resolved from the anatomy ontology are often generic
//! ("cartilage"), while publications qualify the region ("articular
//! cartilage"). Keyed on the lower-cased resolved synonym.

pub(crate) const ANATOMY_QUALIFIERS: &[(&str, &[&str])] = &[
    (
        "cartilage",
        &[
            "articular cartilage",
            "hyaline cartilage",
            "elastic cartilage",
            "fibrocartilage",
            "cartilage tissue",
        ],
    ),
    (
        "bone",
        &[
            "cortical bone",
            "trabecular bone",
            "subchondral bone",
            "bone tissue",
        ],
    ),
    (
        "brain",
        &[
            "cerebral cortex",
            "hippocampus",
            "cerebellum",
            "brain tissue",
            "grey matter",
            "white matter",
        ],
    ),
    (
        "kidney",
        &["renal cortex", "renal medulla", "kidney tissue", "nephron"],
    ),
    (
        "liver",
        &["hepatic tissue", "liver parenchyma", "hepatocyte"],
    ),
    (
        "skin",
        &["epidermis", "dermis", "cutaneous tissue", "skin tissue"],
    ),
    (
        "heart",
        &["myocardium", "cardiac muscle", "heart tissue", "cardiac tissue"],
    ),
    (
        "lung",
        &["pulmonary tissue", "lung parenchyma", "alveolar tissue"],
    ),
    (
        "muscle",
        &["skeletal muscle", "smooth muscle", "muscle tissue", "myofiber"],
    ),
    (
        "blood",
        &["whole blood", "peripheral blood", "plasma", "serum"],
    ),
    (
        "joint",
        &["synovial joint", "synovium", "synovial membrane", "synovial fluid"],
    ),
    (
        "tendon",
        &["tendon tissue", "tenocyte"],
    ),
];

/// Qualifier phrases for a resolved synonym, if any.
pub(crate) fn qualifiers_for(synonym: &str) -> Option<&'static [&'static str]> {
    let lower = synonym.to_lowercase();
    ANATOMY_QUALIFIERS
        .iter()
        .find(|(key, _)| *key == lower)
        .map(|(_, quals)| *quals)
}
