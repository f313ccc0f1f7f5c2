//! Conversion of raw API payloads into domain records.

pub(crate) mod document;
